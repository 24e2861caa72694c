// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Benchmark harness: drives one run through its lifecycle.
//!
//! Only the run phase is timed. A failed phase aborts the run, the harness
//! cleans up what it can, and no [`TimingRecord`] is produced.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::backend::BackendUsage;
use crate::benchmark::{Benchmark, WorkloadKind};
use crate::error::{BenchError, BenchResult, PhaseError};
use crate::handle::{BackendHandle, BackendOps};
use crate::state::RunState;
use crate::types::{EntityId, Phase};

/// Source of run timestamps, in nanoseconds.
pub trait Clock: Send + Sync {
    fn now_ns(&self) -> u64;
}

/// Monotonic clock counting from its creation.
#[derive(Debug)]
pub struct MonotonicClock {
    epoch: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now_ns(&self) -> u64 {
        self.epoch.elapsed().as_nanos() as u64
    }
}

/// Clock that advances a fixed step every time it is read.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicU64,
    step: u64,
}

impl ManualClock {
    pub fn new(start_ns: u64, step_ns: u64) -> Self {
        Self {
            now: AtomicU64::new(start_ns),
            step: step_ns,
        }
    }

    pub fn advance(&self, ns: u64) {
        self.now.fetch_add(ns, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ns(&self) -> u64 {
        self.now.fetch_add(self.step, Ordering::SeqCst)
    }
}

/// Outcome of a successful run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimingRecord {
    pub benchmark: EntityId,
    pub title: String,
    pub backend: EntityId,
    pub kind: WorkloadKind,
    /// Clock reading when the run phase started
    pub start_ns: u64,
    /// Clock reading when the run phase returned
    pub completion_ns: u64,
    /// `completion_ns - start_ns`
    pub elapsed_ns: u64,
    /// Bytes moved by the run phase
    pub bytes: u64,
    /// Wall-clock time the run phase started
    pub started_at: DateTime<Utc>,
}

impl TimingRecord {
    pub fn elapsed(&self) -> Duration {
        Duration::from_nanos(self.elapsed_ns)
    }
}

/// Drives benchmarks against backends.
pub struct Harness {
    clock: Box<dyn Clock>,
}

impl Harness {
    /// Create a harness timed by a [`MonotonicClock`].
    pub fn new() -> Self {
        Self::with_clock(MonotonicClock::new())
    }

    pub fn with_clock(clock: impl Clock + 'static) -> Self {
        Self {
            clock: Box::new(clock),
        }
    }

    /// Run `benchmark` once against `handle`.
    pub fn run(
        &self,
        handle: &BackendHandle,
        benchmark: &mut Benchmark,
    ) -> BenchResult<TimingRecord> {
        benchmark.bind(handle)?;

        match self.drive(handle, benchmark) {
            Ok((record, usage_before)) => {
                let usage_after = handle.usage();
                if usage_after != usage_before {
                    tracing::warn!(
                        benchmark = %record.benchmark,
                        backend = %record.backend,
                        before = ?usage_before,
                        after = ?usage_after,
                        "Backend usage changed across run"
                    );
                }
                tracing::info!(
                    benchmark = %record.benchmark,
                    backend = %record.backend,
                    start_ns = record.start_ns,
                    completion_ns = record.completion_ns,
                    elapsed_ns = record.elapsed_ns,
                    "{}",
                    record.title
                );
                Ok(record)
            }
            Err(err) => {
                if let Some(phase) = err.failed_phase() {
                    tracing::error!(
                        benchmark = %benchmark.id(),
                        backend = %handle.id(),
                        %phase,
                        "error in {} phase: {}",
                        phase,
                        err
                    );
                }
                self.abandon(handle, benchmark, err.failed_phase());
                Err(err)
            }
        }
    }

    /// Run every phase of a bound benchmark. Also returns the backend usage
    /// observed right after initialization.
    fn drive(
        &self,
        handle: &BackendHandle,
        benchmark: &mut Benchmark,
    ) -> BenchResult<(TimingRecord, BackendUsage)> {
        let id = benchmark.id().clone();
        let failed = |phase: Phase| {
            let benchmark = id.clone();
            move |source: PhaseError| BenchError::PhaseFailed {
                benchmark,
                phase,
                source,
            }
        };

        handle
            .initialize()
            .map_err(|e| failed(Phase::Init)(e.into()))?;
        let ops = handle.ops()?;
        let usage_before = ops.usage();

        benchmark
            .setup_phase(&ops)
            .map_err(failed(Phase::Setup))?;
        benchmark.transition_to(RunState::Prepared)?;

        benchmark.transition_to(RunState::Measuring)?;
        let started_at = Utc::now();
        let start_ns = self.clock.now_ns();
        let outcome = benchmark.run_phase(&ops);
        let completion_ns = self.clock.now_ns().max(start_ns);
        benchmark.record_start(start_ns);
        benchmark.record_completion(completion_ns);
        outcome.map_err(failed(Phase::Run))?;

        benchmark
            .teardown_phase(&ops)
            .map_err(failed(Phase::Teardown))?;
        benchmark.transition_to(RunState::TornDown)?;
        self.release(&ops, benchmark);

        let record = TimingRecord {
            benchmark: benchmark.id().clone(),
            title: benchmark.title().to_string(),
            backend: handle.id().clone(),
            kind: benchmark.kind(),
            start_ns,
            completion_ns,
            elapsed_ns: completion_ns - start_ns,
            bytes: benchmark.bytes_per_run(),
            started_at,
        };
        benchmark.unbind()?;
        Ok((record, usage_before))
    }

    /// Drop the run's parameters, reversing anything teardown left behind.
    fn release(&self, ops: &BackendOps<'_>, benchmark: &mut Benchmark) {
        if let Some(params) = benchmark.take_params() {
            let summary = params.release(ops);
            if !summary.is_clean() {
                tracing::warn!(
                    benchmark = %benchmark.id(),
                    handles_closed = summary.handles_closed,
                    entries_removed = summary.entries_removed,
                    failures = summary.failures.len(),
                    "Released resources left over by teardown"
                );
            }
        }
    }

    /// Best-effort cleanup of a failed run, then back to Idle.
    fn abandon(&self, handle: &BackendHandle, benchmark: &mut Benchmark, failed: Option<Phase>) {
        if let Ok(ops) = handle.ops() {
            if failed == Some(Phase::Run) {
                if let Err(e) = benchmark.teardown_phase(&ops) {
                    tracing::warn!(
                        benchmark = %benchmark.id(),
                        error = %e,
                        "Teardown after failed run also failed"
                    );
                }
            }
            self.release(&ops, benchmark);
        }
        benchmark.abandon();
    }
}

impl Default for Harness {
    fn default() -> Self {
        Self::new()
    }
}
