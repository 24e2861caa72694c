// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Benchmark context: a registry plus the harness that runs its entries.
//!
//! This is the driver-facing surface. Everything a run needs is reached
//! through the context; there is no process-wide state.

use crate::backend::StorageBackend;
use crate::benchmark::Benchmark;
use crate::catalog;
use crate::config::{Config, FailurePolicy, SuitePlan};
use crate::error::{BenchError, BenchResult, ConfigurationError};
use crate::handle::BackendHandle;
use crate::harness::{Harness, TimingRecord};
use crate::registry::{Registry, ShutdownSummary};
use crate::types::EntityId;

/// A run the suite could not complete.
#[derive(Debug)]
pub struct SuiteFailure {
    pub backend: EntityId,
    pub benchmark: EntityId,
    /// Zero-based repetition index.
    pub repetition: u32,
    pub error: BenchError,
}

/// Everything a suite sweep produced.
#[derive(Debug, Default)]
pub struct SuiteOutcome {
    pub records: Vec<TimingRecord>,
    pub failures: Vec<SuiteFailure>,
}

impl SuiteOutcome {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Registry and harness bundled together.
#[derive(Default)]
pub struct BenchContext {
    registry: Registry,
    harness: Harness,
}

impl BenchContext {
    pub fn new(harness: Harness) -> Self {
        Self {
            registry: Registry::new(),
            harness,
        }
    }

    /// Build a context holding every configured backend and the full catalog.
    pub fn from_config(config: &Config) -> BenchResult<Self> {
        let mut ctx = Self::default();
        for backend in &config.backends {
            ctx.registry.register_backend(backend.build())?;
        }
        for benchmark in catalog::standard(&config.workload)? {
            ctx.registry.register_benchmark(benchmark)?;
        }
        Ok(ctx)
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn register_backend(
        &mut self,
        id: EntityId,
        backend: impl StorageBackend + 'static,
    ) -> BenchResult<()> {
        self.register_handle(BackendHandle::new(id, backend))
    }

    pub fn register_handle(&mut self, handle: BackendHandle) -> BenchResult<()> {
        Ok(self.registry.register_backend(handle)?)
    }

    pub fn register_benchmark(&mut self, benchmark: Benchmark) -> BenchResult<()> {
        Ok(self.registry.register_benchmark(benchmark)?)
    }

    /// Run one benchmark once against one backend.
    pub fn run_benchmark(&mut self, backend: &str, benchmark: &str) -> BenchResult<TimingRecord> {
        let (handle, bench) = self.registry.pair_mut(backend, benchmark)?;
        self.harness.run(handle, bench)
    }

    /// Run every entry of `plan` in order.
    ///
    /// All ids are checked before the first run starts. Under
    /// [`FailurePolicy::Abort`] the first failed run ends the sweep and its
    /// error is returned.
    pub fn run_suite(&mut self, plan: &SuitePlan) -> BenchResult<SuiteOutcome> {
        for entry in &plan.entries {
            if !self.registry.contains_backend(entry.backend.as_str()) {
                return Err(ConfigurationError::UnknownBackend(entry.backend.to_string()).into());
            }
            if let Some(missing) = entry
                .benchmarks
                .iter()
                .find(|id| !self.registry.contains_benchmark(id.as_str()))
            {
                return Err(ConfigurationError::UnknownBenchmark(missing.to_string()).into());
            }
        }

        let mut outcome = SuiteOutcome::default();
        for entry in &plan.entries {
            for benchmark in &entry.benchmarks {
                for repetition in 0..entry.repetitions {
                    match self.run_benchmark(entry.backend.as_str(), benchmark.as_str()) {
                        Ok(record) => outcome.records.push(record),
                        Err(error) => match plan.failure_policy {
                            FailurePolicy::Abort => {
                                tracing::error!(
                                    backend = %entry.backend,
                                    benchmark = %benchmark,
                                    repetition,
                                    "Suite aborted"
                                );
                                return Err(error);
                            }
                            FailurePolicy::Continue => {
                                tracing::warn!(
                                    backend = %entry.backend,
                                    benchmark = %benchmark,
                                    repetition,
                                    error = %error,
                                    "Run failed, continuing"
                                );
                                outcome.failures.push(SuiteFailure {
                                    backend: entry.backend.clone(),
                                    benchmark: benchmark.clone(),
                                    repetition,
                                    error,
                                });
                            }
                        },
                    }
                }
            }
        }

        tracing::info!(
            runs = outcome.records.len(),
            failures = outcome.failures.len(),
            "Suite finished"
        );
        Ok(outcome)
    }

    /// Release every registered backend and benchmark.
    pub fn shutdown(&mut self) -> ShutdownSummary {
        self.registry.shutdown()
    }
}

impl std::fmt::Debug for BenchContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BenchContext")
            .field("registry", &self.registry)
            .finish()
    }
}
