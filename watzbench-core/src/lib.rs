// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! WatzBench Core Library
//!
//! Storage benchmark harness. Provides the storage backend contract, the
//! benchmark lifecycle harness, the standard workload catalog, the
//! registry and YAML configuration.

pub mod backend;
pub mod benchmark;
pub mod catalog;
pub mod config;
pub mod context;
pub mod error;
pub mod handle;
pub mod harness;
pub mod logging;
pub mod params;
pub mod registry;
pub mod state;
pub mod types;

// Re-export commonly used types
pub use backend::{
    BackendUsage, DirectoryBackend, FileHandle, MemoryBackend, MemoryLimits, StorageBackend,
};
pub use benchmark::{Benchmark, Workload, WorkloadKind};
pub use config::{Config, ConfigLoader, FailurePolicy, SuiteEntry, SuitePlan, WorkloadConfig};
pub use context::{BenchContext, SuiteFailure, SuiteOutcome};
pub use error::{
    BenchError, BenchResult, ConfigurationError, HardValidationError, OperationFailed, PhaseError,
};
pub use handle::{BackendHandle, BackendOps};
pub use harness::{Clock, Harness, ManualClock, MonotonicClock, TimingRecord};
pub use params::WorkloadParameters;
pub use registry::Registry;
pub use state::RunState;
pub use types::{EntityId, EntryName, Operation, Phase};
