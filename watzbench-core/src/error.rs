// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Custom error types for WatzBench.
//!
//! Errors are explicit enums. Backends report every failure through the
//! single [`OperationFailed`] channel; phases wrap it in [`PhaseError`]; the
//! harness surfaces a failed phase as [`BenchError::PhaseFailed`].

use std::path::PathBuf;

use thiserror::Error;

use crate::types::{EntityId, Operation, Phase};

/// A backend call could not complete.
///
/// Missing entries, exhausted space and invalid handles all collapse into
/// this one kind.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{op} failed on {target}: {reason}")]
pub struct OperationFailed {
    pub op: Operation,
    pub target: String,
    pub reason: String,
}

impl OperationFailed {
    pub fn new(op: Operation, target: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            op,
            target: target.into(),
            reason: reason.into(),
        }
    }

    /// Wrap an I/O error raised while performing `op` on `target`.
    pub fn io(op: Operation, target: impl Into<String>, err: &std::io::Error) -> Self {
        Self::new(op, target, err.to_string())
    }
}

/// Result type for backend operations.
pub type BackendResult<T> = Result<T, OperationFailed>;

/// Failure returned by a benchmark phase.
#[derive(Debug, Error)]
pub enum PhaseError {
    #[error(transparent)]
    Operation(#[from] OperationFailed),

    #[error("Read-back of {target} failed: crc {actual:#010x}, expected {expected:#010x}")]
    Verification {
        target: String,
        expected: u32,
        actual: u32,
    },

    #[error("Workload parameters missing: {what}")]
    MissingParameters { what: &'static str },
}

/// Result type for benchmark phases.
pub type PhaseResult<T> = Result<T, PhaseError>;

/// Programming-contract violations. These are never retried.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("Benchmark {benchmark} is already bound to backend {backend}")]
    AlreadyBound {
        benchmark: EntityId,
        backend: EntityId,
    },

    #[error("Backend {0} has not been initialized")]
    BackendNotInitialized(EntityId),

    #[error("Backend not registered: {0}")]
    UnknownBackend(String),

    #[error("Benchmark not registered: {0}")]
    UnknownBenchmark(String),

    #[error("Backend already registered: {0}")]
    DuplicateBackend(EntityId),

    #[error("Benchmark already registered: {0}")]
    DuplicateBenchmark(EntityId),

    #[error("Invalid {workload} workload: {reason}")]
    InvalidWorkload {
        workload: &'static str,
        reason: String,
    },
}

/// State transition errors for the benchmark run state machine.
#[derive(Debug, Error)]
pub enum StateTransitionError {
    #[error("Cannot transition from {from} to {to} for benchmark {benchmark}")]
    InvalidTransition {
        benchmark: EntityId,
        from: &'static str,
        to: &'static str,
    },
}

/// Hard validation errors reject a configuration before anything runs.
#[derive(Debug, Error)]
pub enum HardValidationError {
    #[error("Invalid field value: {field} = {value} - {reason}")]
    InvalidFieldValue {
        field: &'static str,
        value: String,
        reason: String,
    },

    #[error("Duplicate {kind} id: {id}")]
    DuplicateId { kind: &'static str, id: String },

    #[error("Schema validation failed: {message}")]
    SchemaValidation { message: String },
}

/// Top-level error type for WatzBench.
#[derive(Debug, Error)]
pub enum BenchError {
    #[error("Benchmark {benchmark} failed in {phase} phase: {source}")]
    PhaseFailed {
        benchmark: EntityId,
        phase: Phase,
        #[source]
        source: PhaseError,
    },

    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("Invalid state transition: {0}")]
    InvalidStateTransition(#[from] StateTransitionError),

    #[error("Hard validation error: {0}")]
    HardValidation(#[from] HardValidationError),

    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: PathBuf },

    #[error("Configuration parse error: {message}")]
    ConfigParse { message: String },

    #[error("IO error: {context} - {source}")]
    Io {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },
}

impl BenchError {
    /// The phase that failed, for phase failures.
    pub fn failed_phase(&self) -> Option<Phase> {
        match self {
            Self::PhaseFailed { phase, .. } => Some(*phase),
            _ => None,
        }
    }
}

/// Result type alias using BenchError.
pub type BenchResult<T> = Result<T, BenchError>;
