// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Write/read-back integrity check.

use crate::benchmark::{Workload, WorkloadKind};
use crate::error::{PhaseError, PhaseResult};
use crate::handle::BackendOps;
use crate::params::WorkloadParameters;

use super::data_file;

/// Writes a patterned file in setup and checks its CRC32 on read-back.
#[derive(Debug, Clone)]
pub struct VerifyWorkload {
    bytes: usize,
}

impl VerifyWorkload {
    pub fn new(bytes: usize) -> Self {
        Self { bytes }
    }
}

impl Workload for VerifyWorkload {
    fn kind(&self) -> WorkloadKind {
        WorkloadKind::Verification
    }

    fn bytes_per_run(&self) -> u64 {
        self.bytes as u64
    }

    fn setup(&self, ops: &BackendOps<'_>, params: &mut WorkloadParameters) -> PhaseResult<()> {
        let name = data_file();
        params.create_file(ops, name.clone())?;
        params.open(ops, &name)?;
        params.file = Some(name);

        params.fill_buffer(self.bytes);
        let view = params.io_view()?;
        let len = view.buffer.len();
        ops.write_at(view.handle, 0, len, view.buffer)?;
        let checksum = crc32fast::hash(view.buffer);
        view.buffer.fill(0);
        params.checksum = Some(checksum);
        Ok(())
    }

    fn run(&self, ops: &BackendOps<'_>, params: &mut WorkloadParameters) -> PhaseResult<()> {
        let expected = params
            .checksum
            .ok_or(PhaseError::MissingParameters { what: "expected checksum" })?;
        let view = params.io_view()?;
        let len = view.buffer.len();
        ops.read_at(view.handle, 0, len, view.buffer)?;

        let actual = crc32fast::hash(view.buffer);
        if actual != expected {
            return Err(PhaseError::Verification {
                target: params.primary_file()?.to_string(),
                expected,
                actual,
            });
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
    use crate::types::EntityId;

    fn ready() -> BackendHandle {
        let handle = BackendHandle::new(EntityId::new("memory").unwrap(), MemoryBackend::new());
        handle.initialize().unwrap();
        handle
    }

    #[test]
    fn test_round_trip_passes() {
        let handle = ready();
        let ops = handle.ops().unwrap();
        let workload = VerifyWorkload::new(4096);
        let mut params = WorkloadParameters::new();

        workload.setup(&ops, &mut params).unwrap();
        assert!(params.buffer.iter().all(|&b| b == 0));
        workload.run(&ops, &mut params).unwrap();
        workload.teardown(&ops, &mut params).unwrap();
        assert_eq!(ops.usage(), Default::default());
    }

    #[test]
    fn test_corruption_detected() {
        let handle = ready();
        let ops = handle.ops().unwrap();
        let workload = VerifyWorkload::new(256);
        let mut params = WorkloadParameters::new();

        workload.setup(&ops, &mut params).unwrap();
        ops.write_at(params.primary_handle().unwrap(), 10, 1, &[0xFF]).unwrap();

        let err = workload.run(&ops, &mut params).unwrap_err();
        match err {
            PhaseError::Verification { expected, actual, .. } => assert_ne!(expected, actual),
            other => panic!("unexpected error: {other}"),
        }
    }
}
