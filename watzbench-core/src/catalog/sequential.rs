// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Chunked sequential throughput workloads.

use crate::benchmark::{Workload, WorkloadKind};
use crate::error::{ConfigurationError, PhaseResult};
use crate::handle::BackendOps;
use crate::params::{chunk_plan, WorkloadParameters};

use super::data_file;

/// Transfer direction of a throughput workload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Read,
    Write,
}

/// Moves `transfer_bytes` through one file in `chunk_bytes` transfers.
///
/// Chunk `i` covers `buffer[offset_i..offset_i + len_i]`, so after a write
/// run the file holds exactly the buffer.
#[derive(Debug, Clone)]
pub struct SequentialWorkload {
    direction: Direction,
    transfer_bytes: usize,
    chunk_bytes: usize,
}

impl SequentialWorkload {
    /// A non-empty transfer needs a positive chunk size.
    pub fn new(
        direction: Direction,
        transfer_bytes: usize,
        chunk_bytes: usize,
    ) -> Result<Self, ConfigurationError> {
        if chunk_bytes == 0 && transfer_bytes > 0 {
            return Err(ConfigurationError::InvalidWorkload {
                workload: "sequential",
                reason: "chunk size must be positive".to_string(),
            });
        }
        Ok(Self {
            direction,
            transfer_bytes,
            chunk_bytes,
        })
    }
}

impl Workload for SequentialWorkload {
    fn kind(&self) -> WorkloadKind {
        WorkloadKind::SequentialThroughput
    }

    fn bytes_per_run(&self) -> u64 {
        self.transfer_bytes as u64
    }

    fn setup(&self, ops: &BackendOps<'_>, params: &mut WorkloadParameters) -> PhaseResult<()> {
        let name = data_file();
        params.create_file(ops, name.clone())?;
        params.open(ops, &name)?;
        params.file = Some(name);

        params.fill_buffer(self.transfer_bytes);
        let (offsets, sizes) = chunk_plan(self.transfer_bytes, self.chunk_bytes)
            .into_iter()
            .map(|chunk| (chunk.offset, chunk.len))
            .unzip();
        params.offsets = offsets;
        params.sizes = sizes;

        if self.direction == Direction::Read {
            let view = params.io_view()?;
            let len = view.buffer.len();
            ops.write_at(view.handle, 0, len, view.buffer)?;
        }
        Ok(())
    }

    fn run(&self, ops: &BackendOps<'_>, params: &mut WorkloadParameters) -> PhaseResult<()> {
        let view = params.io_view()?;
        for (&offset, &len) in view.offsets.iter().zip(view.sizes) {
            let start = offset as usize;
            match self.direction {
                Direction::Write => {
                    ops.write_at(view.handle, offset, len, &view.buffer[start..])?
                }
                Direction::Read => {
                    ops.read_at(view.handle, offset, len, &mut view.buffer[start..])?
                }
            }
        }
        Ok(())
    }

    fn teardown(&self, ops: &BackendOps<'_>, params: &mut WorkloadParameters) -> PhaseResult<()> {
        params.close_all(ops)?;
        let name = params.primary_file()?.clone();
        params.delete_file(ops, &name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryBackend;
    use crate::handle::BackendHandle;
    use crate::params::pattern;
    use crate::types::EntityId;
    use std::sync::Arc;

    fn shared() -> (Arc<MemoryBackend>, BackendHandle) {
        let backend = Arc::new(MemoryBackend::new());
        let handle = BackendHandle::new(EntityId::new("memory").unwrap(), Arc::clone(&backend));
        handle.initialize().unwrap();
        (backend, handle)
    }

    #[test]
    fn test_write_stores_buffer() {
        let (backend, handle) = shared();
        let ops = handle.ops().unwrap();
        let workload = SequentialWorkload::new(Direction::Write, 512, 128).unwrap();
        let mut params = WorkloadParameters::new();

        workload.setup(&ops, &mut params).unwrap();
        assert_eq!(params.offsets, vec![0, 128, 256, 384]);
        workload.run(&ops, &mut params).unwrap();

        let stored = backend.contents(&data_file()).unwrap();
        assert_eq!(stored.len(), 512);
        assert_eq!(stored, pattern(512));

        workload.teardown(&ops, &mut params).unwrap();
        assert!(backend.contents(&data_file()).is_none());
        assert!(params.release(&ops).is_clean());
    }

    #[test]
    fn test_write_remainder_chunk() {
        let (backend, handle) = shared();
        let ops = handle.ops().unwrap();
        let workload = SequentialWorkload::new(Direction::Write, 300, 128).unwrap();
        let mut params = WorkloadParameters::new();

        workload.setup(&ops, &mut params).unwrap();
        assert_eq!(params.sizes, vec![128, 128, 44]);
        workload.run(&ops, &mut params).unwrap();
        assert_eq!(backend.contents(&data_file()).unwrap().len(), 300);
    }

    #[test]
    fn test_read_round_trip() {
        let (_backend, handle) = shared();
        let ops = handle.ops().unwrap();
        let workload = SequentialWorkload::new(Direction::Read, 1000, 256).unwrap();
        let mut params = WorkloadParameters::new();

        workload.setup(&ops, &mut params).unwrap();
        params.buffer.iter_mut().for_each(|b| *b = 0);
        workload.run(&ops, &mut params).unwrap();
        assert_eq!(params.buffer, pattern(1000));

        workload.teardown(&ops, &mut params).unwrap();
        assert_eq!(ops.usage(), Default::default());
    }

    #[test]
    fn test_bytes_per_run() {
        let workload = SequentialWorkload::new(Direction::Read, 4096, 128).unwrap();
        assert_eq!(workload.bytes_per_run(), 4096);
    }

    #[test]
    fn test_zero_chunk_rejected() {
        assert!(SequentialWorkload::new(Direction::Write, 512, 0).is_err());
    }
}
