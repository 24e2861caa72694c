// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Bulk entry creation, deletion and open workloads.

use crate::benchmark::{Workload, WorkloadKind};
use crate::error::{ConfigurationError, PhaseResult};
use crate::handle::BackendOps;
use crate::params::WorkloadParameters;
use crate::types::EntryName;

/// Operation exercised by the measured phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetadataOp {
    Create,
    Delete,
    Open,
}

/// Entries the workload operates on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Dir,
}

/// Creates, deletes or opens `count` entries named `0..count`.
///
/// Only files can be opened.
#[derive(Debug, Clone)]
pub struct MetadataWorkload {
    op: MetadataOp,
    entry: EntryKind,
    count: usize,
}

impl MetadataWorkload {
    pub fn new(
        op: MetadataOp,
        entry: EntryKind,
        count: usize,
    ) -> Result<Self, ConfigurationError> {
        if op == MetadataOp::Open && entry == EntryKind::Dir {
            return Err(ConfigurationError::InvalidWorkload {
                workload: "metadata",
                reason: "directories cannot be opened".to_string(),
            });
        }
        Ok(Self { op, entry, count })
    }

    fn create_all(&self, ops: &BackendOps<'_>, params: &mut WorkloadParameters) -> PhaseResult<()> {
        for i in 0..params.count {
            let name = EntryName::index(i);
            match self.entry {
                EntryKind::File => params.create_file(ops, name)?,
                EntryKind::Dir => params.create_dir(ops, name)?,
            }
        }
        Ok(())
    }

    fn delete_all(&self, ops: &BackendOps<'_>, params: &mut WorkloadParameters) -> PhaseResult<()> {
        for i in 0..params.count {
            let name = EntryName::index(i);
            match self.entry {
                EntryKind::File => params.delete_file(ops, &name)?,
                EntryKind::Dir => params.delete_dir(ops, &name)?,
            }
        }
        Ok(())
    }
}

impl Workload for MetadataWorkload {
    fn kind(&self) -> WorkloadKind {
        WorkloadKind::Metadata
    }

    fn setup(&self, ops: &BackendOps<'_>, params: &mut WorkloadParameters) -> PhaseResult<()> {
        params.count = self.count;
        params.reserve_entries(self.count);
        match self.op {
            MetadataOp::Create => Ok(()),
            MetadataOp::Delete | MetadataOp::Open => self.create_all(ops, params),
        }
    }

    fn run(&self, ops: &BackendOps<'_>, params: &mut WorkloadParameters) -> PhaseResult<()> {
        match self.op {
            MetadataOp::Create => self.create_all(ops, params),
            MetadataOp::Delete => self.delete_all(ops, params),
            MetadataOp::Open => {
                for i in 0..params.count {
                    let handle = ops.open(&EntryName::index(i))?;
                    ops.close(handle)?;
                }
                Ok(())
            }
        }
    }

    fn teardown(&self, ops: &BackendOps<'_>, params: &mut WorkloadParameters) -> PhaseResult<()> {
        match self.op {
            MetadataOp::Create | MetadataOp::Open => self.delete_all(ops, params),
            MetadataOp::Delete => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryBackend;
    use crate::handle::BackendHandle;
    use crate::types::{EntityId, Operation};

    fn ready(backend: MemoryBackend) -> BackendHandle {
        let handle = BackendHandle::new(EntityId::new("memory").unwrap(), backend);
        handle.initialize().unwrap();
        handle
    }

    fn lifecycle(workload: &MetadataWorkload, handle: &BackendHandle) -> WorkloadParameters {
        let ops = handle.ops().unwrap();
        let mut params = WorkloadParameters::new();
        workload.setup(&ops, &mut params).unwrap();
        workload.run(&ops, &mut params).unwrap();
        workload.teardown(&ops, &mut params).unwrap();
        params
    }

    #[test]
    fn test_create_files() {
        let handle = ready(MemoryBackend::new());
        let workload = MetadataWorkload::new(MetadataOp::Create, EntryKind::File, 5).unwrap();
        let ops = handle.ops().unwrap();
        let mut params = WorkloadParameters::new();

        workload.setup(&ops, &mut params).unwrap();
        assert_eq!(ops.usage().files, 0);
        workload.run(&ops, &mut params).unwrap();
        assert_eq!(ops.usage().files, 5);
        assert_eq!(params.tracked_entries(), 5);
        workload.teardown(&ops, &mut params).unwrap();
        assert_eq!(ops.usage().files, 0);
        assert!(params.release(&ops).is_clean());
    }

    #[test]
    fn test_delete_dirs() {
        let handle = ready(MemoryBackend::new());
        let workload = MetadataWorkload::new(MetadataOp::Delete, EntryKind::Dir, 8).unwrap();
        let ops = handle.ops().unwrap();
        let mut params = WorkloadParameters::new();

        workload.setup(&ops, &mut params).unwrap();
        assert_eq!(ops.usage().dirs, 8);
        workload.run(&ops, &mut params).unwrap();
        assert_eq!(ops.usage().dirs, 0);
        assert_eq!(params.tracked_entries(), 0);
    }

    #[test]
    fn test_open_leaves_no_handles() {
        let handle = ready(MemoryBackend::new());
        let workload = MetadataWorkload::new(MetadataOp::Open, EntryKind::File, 4).unwrap();
        let params = lifecycle(&workload, &handle);
        assert_eq!(params.open_handles(), 0);
        assert_eq!(handle.usage(), Default::default());
    }

    #[test]
    fn test_open_dirs_rejected() {
        let err = MetadataWorkload::new(MetadataOp::Open, EntryKind::Dir, 4).unwrap_err();
        assert!(matches!(
            err,
            ConfigurationError::InvalidWorkload { workload: "metadata", .. }
        ));
    }

    #[test]
    fn test_partial_run_is_released() {
        let backend = MemoryBackend::with_limits(crate::backend::MemoryLimits {
            max_entries: Some(3),
            max_bytes: None,
        });
        let handle = ready(backend);
        let workload = MetadataWorkload::new(MetadataOp::Create, EntryKind::File, 5).unwrap();
        let ops = handle.ops().unwrap();
        let mut params = WorkloadParameters::new();

        workload.setup(&ops, &mut params).unwrap();
        assert!(workload.run(&ops, &mut params).is_err());
        assert_eq!(params.tracked_entries(), 3);

        let summary = params.release(&ops);
        assert_eq!(summary.entries_removed, 3);
        assert_eq!(ops.usage().files, 0);
    }

    #[test]
    fn test_open_failure_propagates() {
        let backend = MemoryBackend::new();
        backend.fail_next(Operation::Open);
        let handle = ready(backend);
        let workload = MetadataWorkload::new(MetadataOp::Open, EntryKind::File, 2).unwrap();
        let ops = handle.ops().unwrap();
        let mut params = WorkloadParameters::new();

        workload.setup(&ops, &mut params).unwrap();
        let err = workload.run(&ops, &mut params).unwrap_err();
        assert!(err.to_string().contains("open"));
    }
}
