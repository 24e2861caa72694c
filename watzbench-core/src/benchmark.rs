// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Benchmarks: a named workload plus the bookkeeping of its current run.

use serde::{Deserialize, Serialize};

use crate::error::{ConfigurationError, PhaseResult, StateTransitionError};
use crate::handle::{BackendHandle, BackendOps};
use crate::params::WorkloadParameters;
use crate::state::{RunState, RunStateMachine};
use crate::types::EntityId;

/// Shape of a workload, used to group results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkloadKind {
    /// Bulk entry creation and deletion
    Metadata,
    /// Fixed-size transfers at advancing offsets
    SequentialThroughput,
    /// Transfers at precomputed random offsets
    RandomThroughput,
    /// Read-back integrity checks
    Verification,
}

impl std::fmt::Display for WorkloadKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WorkloadKind::Metadata => write!(f, "metadata"),
            WorkloadKind::SequentialThroughput => write!(f, "sequential"),
            WorkloadKind::RandomThroughput => write!(f, "random"),
            WorkloadKind::Verification => write!(f, "verification"),
        }
    }
}

/// The three phases of a benchmark.
///
/// Phases only touch storage through `ops` and only keep state in
/// `params`. Setup must record what it creates in `params` so an
/// abandoned run can be cleaned up.
pub trait Workload: Send + Sync {
    fn kind(&self) -> WorkloadKind;

    /// Bytes moved by one measured phase, zero for metadata workloads.
    fn bytes_per_run(&self) -> u64 {
        0
    }

    fn setup(&self, ops: &BackendOps<'_>, params: &mut WorkloadParameters) -> PhaseResult<()>;

    /// The measured phase.
    fn run(&self, ops: &BackendOps<'_>, params: &mut WorkloadParameters) -> PhaseResult<()>;

    /// Release resources and reverse the persistent state setup created.
    fn teardown(&self, ops: &BackendOps<'_>, params: &mut WorkloadParameters) -> PhaseResult<()>;
}

/// A registered benchmark.
pub struct Benchmark {
    id: EntityId,
    title: String,
    workload: Box<dyn Workload>,
    state: RunStateMachine,
    bound_backend: Option<EntityId>,
    params: Option<WorkloadParameters>,
    start_ns: Option<u64>,
    completion_ns: Option<u64>,
}

impl Benchmark {
    pub fn new(id: EntityId, title: impl Into<String>, workload: impl Workload + 'static) -> Self {
        Self::from_boxed(id, title, Box::new(workload))
    }

    pub fn from_boxed(id: EntityId, title: impl Into<String>, workload: Box<dyn Workload>) -> Self {
        let state = RunStateMachine::new(id.clone());
        Self {
            id,
            title: title.into(),
            workload,
            state,
            bound_backend: None,
            params: None,
            start_ns: None,
            completion_ns: None,
        }
    }

    pub fn id(&self) -> &EntityId {
        &self.id
    }

    /// Human-readable title.
    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn kind(&self) -> WorkloadKind {
        self.workload.kind()
    }

    pub fn bytes_per_run(&self) -> u64 {
        self.workload.bytes_per_run()
    }

    pub fn state(&self) -> RunState {
        self.state.state()
    }

    pub fn completed_runs(&self) -> u64 {
        self.state.completed_runs()
    }

    pub fn bound_backend(&self) -> Option<&EntityId> {
        self.bound_backend.as_ref()
    }

    /// Whether workload parameters are attached. False whenever Idle.
    pub fn has_params(&self) -> bool {
        self.params.is_some()
    }

    /// Start timestamp of the most recent measured phase.
    pub fn start_ns(&self) -> Option<u64> {
        self.start_ns
    }

    /// Completion timestamp of the most recent measured phase.
    pub fn completion_ns(&self) -> Option<u64> {
        self.completion_ns
    }

    /// Attach to `handle`. Only an Idle benchmark can be bound.
    pub fn bind(&mut self, handle: &BackendHandle) -> Result<(), ConfigurationError> {
        if let Some(backend) = &self.bound_backend {
            return Err(ConfigurationError::AlreadyBound {
                benchmark: self.id.clone(),
                backend: backend.clone(),
            });
        }
        self.state
            .transition_to(RunState::Bound)
            .map_err(|_| ConfigurationError::AlreadyBound {
                benchmark: self.id.clone(),
                backend: handle.id().clone(),
            })?;
        self.bound_backend = Some(handle.id().clone());
        self.start_ns = None;
        self.completion_ns = None;
        Ok(())
    }

    pub(crate) fn transition_to(&mut self, target: RunState) -> Result<(), StateTransitionError> {
        self.state.transition_to(target)
    }

    pub(crate) fn setup_phase(&mut self, ops: &BackendOps<'_>) -> PhaseResult<()> {
        let params = self.params.get_or_insert_with(WorkloadParameters::new);
        self.workload.setup(ops, params)
    }

    pub(crate) fn run_phase(&mut self, ops: &BackendOps<'_>) -> PhaseResult<()> {
        let params = self.params.get_or_insert_with(WorkloadParameters::new);
        self.workload.run(ops, params)
    }

    pub(crate) fn teardown_phase(&mut self, ops: &BackendOps<'_>) -> PhaseResult<()> {
        let params = self.params.get_or_insert_with(WorkloadParameters::new);
        self.workload.teardown(ops, params)
    }

    pub(crate) fn record_start(&mut self, ns: u64) {
        self.start_ns = Some(ns);
    }

    pub(crate) fn record_completion(&mut self, ns: u64) {
        self.completion_ns = Some(ns);
    }

    pub(crate) fn take_params(&mut self) -> Option<WorkloadParameters> {
        self.params.take()
    }

    /// Clear the binding after a completed run.
    pub(crate) fn unbind(&mut self) -> Result<(), StateTransitionError> {
        self.state.transition_to(RunState::Idle)?;
        self.bound_backend = None;
        Ok(())
    }

    /// Force the benchmark back to Idle after a failed run.
    pub(crate) fn abandon(&mut self) {
        self.state.abandon();
        self.bound_backend = None;
        self.params = None;
    }
}

impl std::fmt::Debug for Benchmark {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Benchmark")
            .field("id", &self.id)
            .field("title", &self.title)
            .field("kind", &self.kind())
            .field("state", &self.state())
            .field("bound_backend", &self.bound_backend)
            .finish()
    }
}
