// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Registry of backends and benchmarks.
//!
//! Built once, torn down once. Mutation requires `&mut self`, so nothing can
//! be registered or removed while a run borrows an entry.

use std::collections::HashMap;

use crate::benchmark::Benchmark;
use crate::error::ConfigurationError;
use crate::handle::BackendHandle;
use crate::state::RunState;
use crate::types::EntityId;

/// What [`Registry::shutdown`] released.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShutdownSummary {
    pub backends: Vec<EntityId>,
    pub benchmarks: Vec<EntityId>,
    /// Benchmarks that were still bound and had to be forced back to Idle.
    pub abandoned: Vec<EntityId>,
}

/// Owns every registered backend and benchmark.
#[derive(Debug, Default)]
pub struct Registry {
    backends: HashMap<EntityId, BackendHandle>,
    benchmarks: HashMap<EntityId, Benchmark>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a backend. Fails if the id is taken.
    pub fn register_backend(&mut self, handle: BackendHandle) -> Result<(), ConfigurationError> {
        let id = handle.id().clone();
        if self.backends.contains_key(&id) {
            return Err(ConfigurationError::DuplicateBackend(id));
        }
        tracing::debug!(backend = %id, kind = handle.kind(), "Registered backend");
        self.backends.insert(id, handle);
        Ok(())
    }

    /// Register a benchmark. Fails if the id is taken.
    pub fn register_benchmark(&mut self, benchmark: Benchmark) -> Result<(), ConfigurationError> {
        let id = benchmark.id().clone();
        if self.benchmarks.contains_key(&id) {
            return Err(ConfigurationError::DuplicateBenchmark(id));
        }
        tracing::debug!(benchmark = %id, title = benchmark.title(), "Registered benchmark");
        self.benchmarks.insert(id, benchmark);
        Ok(())
    }

    pub fn unregister_backend(&mut self, id: &str) -> Result<BackendHandle, ConfigurationError> {
        self.backends
            .remove(id)
            .ok_or_else(|| ConfigurationError::UnknownBackend(id.to_string()))
    }

    pub fn unregister_benchmark(&mut self, id: &str) -> Result<Benchmark, ConfigurationError> {
        self.benchmarks
            .remove(id)
            .ok_or_else(|| ConfigurationError::UnknownBenchmark(id.to_string()))
    }

    pub fn backend(&self, id: &str) -> Option<&BackendHandle> {
        self.backends.get(id)
    }

    pub fn benchmark(&self, id: &str) -> Option<&Benchmark> {
        self.benchmarks.get(id)
    }

    /// Borrow a backend and a benchmark together for one run.
    pub fn pair_mut(
        &mut self,
        backend: &str,
        benchmark: &str,
    ) -> Result<(&BackendHandle, &mut Benchmark), ConfigurationError> {
        let handle = self
            .backends
            .get(backend)
            .ok_or_else(|| ConfigurationError::UnknownBackend(backend.to_string()))?;
        let bench = self
            .benchmarks
            .get_mut(benchmark)
            .ok_or_else(|| ConfigurationError::UnknownBenchmark(benchmark.to_string()))?;
        Ok((handle, bench))
    }

    pub fn contains_backend(&self, id: &str) -> bool {
        self.backends.contains_key(id)
    }

    pub fn contains_benchmark(&self, id: &str) -> bool {
        self.benchmarks.contains_key(id)
    }

    /// Registered backend ids, sorted.
    pub fn backend_ids(&self) -> Vec<EntityId> {
        let mut ids: Vec<_> = self.backends.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Registered benchmark ids, sorted.
    pub fn benchmark_ids(&self) -> Vec<EntityId> {
        let mut ids: Vec<_> = self.benchmarks.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Total number of registered entities.
    pub fn len(&self) -> usize {
        self.backends.len() + self.benchmarks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.backends.is_empty() && self.benchmarks.is_empty()
    }

    /// Release every registered entity.
    pub fn shutdown(&mut self) -> ShutdownSummary {
        let mut summary = ShutdownSummary::default();

        for (id, mut benchmark) in self.benchmarks.drain() {
            if benchmark.state() != RunState::Idle {
                tracing::warn!(
                    benchmark = %id,
                    state = %benchmark.state(),
                    "Benchmark not idle at shutdown"
                );
                benchmark.abandon();
                summary.abandoned.push(id.clone());
            }
            summary.benchmarks.push(id);
        }
        summary.backends.extend(self.backends.drain().map(|(id, _)| id));

        summary.backends.sort();
        summary.benchmarks.sort();
        summary.abandoned.sort();

        tracing::info!(
            backends = summary.backends.len(),
            benchmarks = summary.benchmarks.len(),
            "Registry shut down"
        );
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryBackend;
    use crate::catalog;
    use crate::config::WorkloadConfig;

    fn memory(id: &str) -> BackendHandle {
        BackendHandle::new(EntityId::new(id).unwrap(), MemoryBackend::new())
    }

    fn bench(id: &str) -> Benchmark {
        catalog::build(id, &WorkloadConfig::default()).unwrap()
    }

    #[test]
    fn test_register_and_lookup() {
        let mut registry = Registry::new();
        registry.register_backend(memory("ram")).unwrap();
        registry.register_benchmark(bench(catalog::SEQ_READ)).unwrap();

        assert_eq!(registry.len(), 2);
        assert!(registry.backend("ram").is_some());
        assert!(registry.benchmark("seq_read").is_some());
        assert!(registry.backend("disk").is_none());
    }

    #[test]
    fn test_duplicate_registration() {
        let mut registry = Registry::new();
        registry.register_backend(memory("ram")).unwrap();
        assert!(matches!(
            registry.register_backend(memory("ram")),
            Err(ConfigurationError::DuplicateBackend(_))
        ));

        registry.register_benchmark(bench(catalog::SEQ_READ)).unwrap();
        assert!(matches!(
            registry.register_benchmark(bench(catalog::SEQ_READ)),
            Err(ConfigurationError::DuplicateBenchmark(_))
        ));
    }

    #[test]
    fn test_unregister() {
        let mut registry = Registry::new();
        registry.register_backend(memory("ram")).unwrap();

        let handle = registry.unregister_backend("ram").unwrap();
        assert_eq!(handle.id().as_str(), "ram");
        assert!(registry.is_empty());
        assert!(matches!(
            registry.unregister_backend("ram"),
            Err(ConfigurationError::UnknownBackend(_))
        ));
        assert!(registry.unregister_benchmark("seq_read").is_err());
    }

    #[test]
    fn test_pair_mut_unknown() {
        let mut registry = Registry::new();
        registry.register_backend(memory("ram")).unwrap();

        assert!(matches!(
            registry.pair_mut("ram", "seq_read"),
            Err(ConfigurationError::UnknownBenchmark(_))
        ));
        assert!(matches!(
            registry.pair_mut("disk", "seq_read"),
            Err(ConfigurationError::UnknownBackend(_))
        ));
    }

    #[test]
    fn test_ids_sorted() {
        let mut registry = Registry::new();
        for id in ["zeta", "alpha", "mid"] {
            registry.register_backend(memory(id)).unwrap();
        }
        let ids: Vec<_> = registry.backend_ids().iter().map(|id| id.to_string()).collect();
        assert_eq!(ids, vec!["alpha", "mid", "zeta"]);
    }

    #[test]
    fn test_shutdown_releases_everything() {
        let mut registry = Registry::new();
        registry.register_backend(memory("ram")).unwrap();
        registry.register_benchmark(bench(catalog::SEQ_READ)).unwrap();
        registry.register_benchmark(bench(catalog::SEQ_WRITE)).unwrap();

        let (handle, benchmark) = registry.pair_mut("ram", "seq_write").unwrap();
        benchmark.bind(handle).unwrap();

        let summary = registry.shutdown();
        assert_eq!(summary.backends.len(), 1);
        assert_eq!(summary.benchmarks.len(), 2);
        assert_eq!(summary.abandoned, vec![EntityId::new("seq_write").unwrap()]);
        assert!(registry.is_empty());
    }
}
