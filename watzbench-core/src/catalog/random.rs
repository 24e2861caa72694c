// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Random-offset throughput workloads.

use crate::benchmark::{Workload, WorkloadKind};
use crate::config::WorkloadConfig;
use crate::error::{ConfigurationError, PhaseResult};
use crate::handle::BackendOps;
use crate::params::{random_offsets, WorkloadParameters};

use super::{data_file, Direction};

/// Replays a seeded sequence of fixed-size accesses over one file.
#[derive(Debug, Clone)]
pub struct RandomWorkload {
    direction: Direction,
    file_bytes: usize,
    access_bytes: usize,
    ops: usize,
    seed: u64,
}

impl RandomWorkload {
    /// Every access must be non-empty and fit inside the file.
    pub fn new(
        direction: Direction,
        file_bytes: usize,
        access_bytes: usize,
        ops: usize,
        seed: u64,
    ) -> Result<Self, ConfigurationError> {
        let reason = if access_bytes == 0 {
            Some("access size must be positive".to_string())
        } else if access_bytes > file_bytes {
            Some(format!(
                "access of {} bytes exceeds file of {} bytes",
                access_bytes, file_bytes
            ))
        } else {
            None
        };
        if let Some(reason) = reason {
            return Err(ConfigurationError::InvalidWorkload {
                workload: "random",
                reason,
            });
        }
        Ok(Self {
            direction,
            file_bytes,
            access_bytes,
            ops,
            seed,
        })
    }

    pub fn from_config(
        direction: Direction,
        config: &WorkloadConfig,
    ) -> Result<Self, ConfigurationError> {
        Self::new(
            direction,
            config.random_file_bytes,
            config.random_access_bytes,
            config.random_ops,
            config.seed,
        )
    }
}

impl Workload for RandomWorkload {
    fn kind(&self) -> WorkloadKind {
        WorkloadKind::RandomThroughput
    }

    fn bytes_per_run(&self) -> u64 {
        (self.ops * self.access_bytes) as u64
    }

    fn setup(&self, ops: &BackendOps<'_>, params: &mut WorkloadParameters) -> PhaseResult<()> {
        let name = data_file();
        params.create_file(ops, name.clone())?;
        params.open(ops, &name)?;
        params.file = Some(name);

        // Populate the whole file so every offset is readable
        params.fill_buffer(self.file_bytes);
        {
            let view = params.io_view()?;
            let len = view.buffer.len();
            ops.write_at(view.handle, 0, len, view.buffer)?;
        }

        params.offsets = random_offsets(
            self.seed,
            self.ops,
            self.file_bytes as u64,
            self.access_bytes as u64,
        );
        params.sizes = vec![self.access_bytes; params.offsets.len()];
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
