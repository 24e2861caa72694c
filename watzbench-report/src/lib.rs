// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! WatzBench Reporting
//!
//! Turns the timing records of a suite sweep into aggregated, serializable
//! reports.
//!
//! # Report Contents
//!
//! - **Latency**: min/max/mean/percentiles over repeated elapsed times
//! - **Throughput**: bytes per second for workloads that move data
//! - **System**: host and storage device information
//!
//! # Data Output
//!
//! Reports are written as timestamped JSON files.

pub mod metrics;
pub mod reporter;

pub use metrics::{
    BenchmarkReport, BenchmarkResult, DiskInfo, FailedRun, LatencyMetrics, SystemInfo,
    ThroughputMetrics,
};
pub use reporter::{JsonReporter, ReporterError};
