// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Benchmark run state machine with typed state transitions.
//!
//! Implements the run lifecycle: Idle → Bound → Prepared → Measuring →
//! TornDown → Idle. Any non-Idle state may also fall back to Idle when a
//! run is abandoned. Invalid transitions result in StateTransitionError.

use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::error::StateTransitionError;
use crate::types::EntityId;

/// Run lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunState {
    /// No run in flight; no workload parameters attached.
    Idle,

    /// Attached to a backend, nothing prepared yet.
    Bound,

    /// Setup finished; parameters are attached.
    Prepared,

    /// The measured phase is executing.
    Measuring,

    /// Teardown finished; binding not yet cleared.
    TornDown,
}

impl RunState {
    /// Get the state name for error messages.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::Bound => "Bound",
            Self::Prepared => "Prepared",
            Self::Measuring => "Measuring",
            Self::TornDown => "TornDown",
        }
    }

    /// Check if transition to the target state is valid.
    pub fn can_transition_to(&self, target: RunState) -> bool {
        matches!(
            (self, target),
            (Self::Idle, Self::Bound)
                | (Self::Bound, Self::Prepared)
                | (Self::Prepared, Self::Measuring)
                | (Self::Measuring, Self::TornDown)
                // Normal completion and abandonment both end in Idle
                | (Self::Bound, Self::Idle)
                | (Self::Prepared, Self::Idle)
                | (Self::Measuring, Self::Idle)
                | (Self::TornDown, Self::Idle)
        )
    }
}

impl std::fmt::Display for RunState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// State machine for one benchmark's run lifecycle.
#[derive(Debug)]
pub struct RunStateMachine {
    benchmark: EntityId,
    current_state: RunState,
    last_transition: Instant,
    transition_count: u64,
    completed_runs: u64,
}

impl RunStateMachine {
    pub fn new(benchmark: EntityId) -> Self {
        Self {
            benchmark,
            current_state: RunState::Idle,
            last_transition: Instant::now(),
            transition_count: 0,
            completed_runs: 0,
        }
    }

    pub fn state(&self) -> RunState {
        self.current_state
    }

    pub fn is_idle(&self) -> bool {
        self.current_state == RunState::Idle
    }

    pub fn transition_count(&self) -> u64 {
        self.transition_count
    }

    /// Number of runs that reached Idle through TornDown.
    pub fn completed_runs(&self) -> u64 {
        self.completed_runs
    }

    pub fn time_in_current_state(&self) -> std::time::Duration {
        self.last_transition.elapsed()
    }

    /// Attempt to transition to a new state.
    pub fn transition_to(&mut self, target: RunState) -> Result<(), StateTransitionError> {
        if !self.current_state.can_transition_to(target) {
            return Err(StateTransitionError::InvalidTransition {
                benchmark: self.benchmark.clone(),
                from: self.current_state.name(),
                to: target.name(),
            });
        }

        tracing::debug!(
            benchmark = %self.benchmark,
            from = self.current_state.name(),
            to = target.name(),
            "State transition"
        );

        if self.current_state == RunState::TornDown && target == RunState::Idle {
            self.completed_runs += 1;
        }
        self.current_state = target;
        self.last_transition = Instant::now();
        self.transition_count += 1;

        Ok(())
    }

    /// Return to Idle from wherever the run stopped.
    pub fn abandon(&mut self) {
        if self.current_state != RunState::Idle {
            tracing::debug!(
                benchmark = %self.benchmark,
                from = self.current_state.name(),
                "Run abandoned"
            );
            self.current_state = RunState::Idle;
            self.last_transition = Instant::now();
            self.transition_count += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn machine() -> RunStateMachine {
        RunStateMachine::new(EntityId::new("seq_read").unwrap())
    }

    #[test]
    fn test_initial_state() {
        let sm = machine();
        assert_eq!(sm.state(), RunState::Idle);
        assert_eq!(sm.transition_count(), 0);
        assert!(sm.is_idle());
    }

    #[test]
    fn test_full_lifecycle() {
        let mut sm = machine();
        for target in [
            RunState::Bound,
            RunState::Prepared,
            RunState::Measuring,
            RunState::TornDown,
            RunState::Idle,
        ] {
            sm.transition_to(target).unwrap();
            assert_eq!(sm.state(), target);
        }
        assert_eq!(sm.transition_count(), 5);
        assert_eq!(sm.completed_runs(), 1);
    }

    #[test]
    fn test_invalid_transitions() {
        let mut sm = machine();
        assert!(sm.transition_to(RunState::Measuring).is_err());
        assert!(sm.transition_to(RunState::Idle).is_err());
        assert_eq!(sm.state(), RunState::Idle);

        sm.transition_to(RunState::Bound).unwrap();
        assert!(sm.transition_to(RunState::Bound).is_err());
        assert!(sm.transition_to(RunState::TornDown).is_err());
    }

    #[test]
    fn test_abandon_does_not_count_as_completed() {
        let mut sm = machine();
        sm.transition_to(RunState::Bound).unwrap();
        sm.transition_to(RunState::Prepared).unwrap();
        sm.abandon();
        assert!(sm.is_idle());
        assert_eq!(sm.completed_runs(), 0);
    }
}
