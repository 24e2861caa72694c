// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Scratch state for a single benchmark run.
//!
//! [`WorkloadParameters`] is created when setup starts and dropped once
//! teardown finishes. It also tracks every entry the workload created and
//! every handle it holds, so [`WorkloadParameters::release`] can reverse
//! them when a run is abandoned part way.

use std::collections::VecDeque;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::backend::FileHandle;
use crate::error::{OperationFailed, PhaseError, PhaseResult};
use crate::handle::BackendOps;
use crate::types::EntryName;

/// Kind of entry a workload created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreatedEntry {
    File(EntryName),
    Dir(EntryName),
}

impl CreatedEntry {
    pub fn name(&self) -> &EntryName {
        match self {
            Self::File(name) | Self::Dir(name) => name,
        }
    }
}

/// What [`WorkloadParameters::release`] had to clean up.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReleaseSummary {
    pub handles_closed: usize,
    pub entries_removed: usize,
    pub failures: Vec<OperationFailed>,
}

impl ReleaseSummary {
    pub fn is_clean(&self) -> bool {
        self.handles_closed == 0 && self.entries_removed == 0 && self.failures.is_empty()
    }
}

/// Mutable state threaded from setup through run into teardown.
#[derive(Debug, Default)]
pub struct WorkloadParameters {
    /// Number of entries for metadata workloads.
    pub count: usize,
    /// Transfer buffer.
    pub buffer: Vec<u8>,
    /// Primary file of throughput workloads.
    pub file: Option<EntryName>,
    /// Precomputed offsets for random workloads.
    pub offsets: Vec<u64>,
    /// Transfer sizes, parallel to `offsets`.
    pub sizes: Vec<usize>,
    /// Expected checksum for verification workloads.
    pub checksum: Option<u32>,
    handles: Vec<FileHandle>,
    created: VecDeque<CreatedEntry>,
}

/// Borrowed view for issuing transfers: the handle, the buffer and the plan.
#[derive(Debug)]
pub struct IoView<'a> {
    pub handle: &'a FileHandle,
    pub buffer: &'a mut [u8],
    pub offsets: &'a [u64],
    pub sizes: &'a [usize],
}

impl WorkloadParameters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a `len`-byte buffer filled with the verification pattern.
    pub fn fill_buffer(&mut self, len: usize) {
        self.buffer = pattern(len);
    }

    /// Make room for `additional` tracked entries ahead of a measured phase.
    pub fn reserve_entries(&mut self, additional: usize) {
        self.created.reserve(additional);
    }

    /// Create a file and remember it for cleanup.
    pub fn create_file(&mut self, ops: &BackendOps<'_>, name: EntryName) -> PhaseResult<()> {
        ops.create_file(&name)?;
        self.created.push_back(CreatedEntry::File(name));
        Ok(())
    }

    /// Create a directory and remember it for cleanup.
    pub fn create_dir(&mut self, ops: &BackendOps<'_>, name: EntryName) -> PhaseResult<()> {
        ops.create_dir(&name)?;
        self.created.push_back(CreatedEntry::Dir(name));
        Ok(())
    }

    /// Delete a tracked file.
    pub fn delete_file(&mut self, ops: &BackendOps<'_>, name: &EntryName) -> PhaseResult<()> {
        ops.delete_file(name)?;
        self.forget(name);
        Ok(())
    }

    /// Delete a tracked directory.
    pub fn delete_dir(&mut self, ops: &BackendOps<'_>, name: &EntryName) -> PhaseResult<()> {
        ops.delete_dir(name)?;
        self.forget(name);
        Ok(())
    }

    /// Record an entry created outside these helpers.
    pub fn track(&mut self, entry: CreatedEntry) {
        self.created.push_back(entry);
    }

    /// Stop tracking `name`, e.g. after a measured phase removed it.
    ///
    /// Removing in creation order or in reverse creation order is O(1).
    pub fn forget(&mut self, name: &EntryName) {
        if self.created.front().map(CreatedEntry::name) == Some(name) {
            self.created.pop_front();
        } else if self.created.back().map(CreatedEntry::name) == Some(name) {
            self.created.pop_back();
        } else if let Some(index) = self.created.iter().rposition(|entry| entry.name() == name) {
            self.created.remove(index);
        }
    }

    pub fn created(&self) -> impl Iterator<Item = &CreatedEntry> {
        self.created.iter()
    }

    pub fn tracked_entries(&self) -> usize {
        self.created.len()
    }

    /// Open `name` and keep the handle.
    pub fn open(&mut self, ops: &BackendOps<'_>, name: &EntryName) -> PhaseResult<()> {
        let handle = ops.open(name)?;
        self.handles.push(handle);
        Ok(())
    }

    /// The first handle opened by setup.
    pub fn primary_handle(&self) -> PhaseResult<&FileHandle> {
        self.handles
            .first()
            .ok_or(PhaseError::MissingParameters { what: "open file handle" })
    }

    /// The primary file name.
    pub fn primary_file(&self) -> PhaseResult<&EntryName> {
        self.file
            .as_ref()
            .ok_or(PhaseError::MissingParameters { what: "file name" })
    }

    /// Split borrow for transfer loops.
    pub fn io_view(&mut self) -> PhaseResult<IoView<'_>> {
        let handle = self
            .handles
            .first()
            .ok_or(PhaseError::MissingParameters { what: "open file handle" })?;
        Ok(IoView {
            handle,
            buffer: &mut self.buffer,
            offsets: &self.offsets,
            sizes: &self.sizes,
        })
    }

    pub fn open_handles(&self) -> usize {
        self.handles.len()
    }

    /// Close every held handle, newest first.
    pub fn close_all(&mut self, ops: &BackendOps<'_>) -> PhaseResult<()> {
        while let Some(handle) = self.handles.pop() {
            ops.close(handle)?;
        }
        Ok(())
    }

    /// Close remaining handles and remove remaining tracked entries.
    ///
    /// Entries are removed newest first so files go before the directories
    /// holding them. Failures are collected, not returned; every resource is
    /// attempted.
    pub fn release(mut self, ops: &BackendOps<'_>) -> ReleaseSummary {
        let mut summary = ReleaseSummary::default();

        while let Some(handle) = self.handles.pop() {
            match ops.close(handle) {
                Ok(()) => summary.handles_closed += 1,
                Err(e) => summary.failures.push(e),
            }
        }

        while let Some(entry) = self.created.pop_back() {
            let result = match &entry {
                CreatedEntry::File(name) => ops.delete_file(name),
                CreatedEntry::Dir(name) => ops.delete_dir(name),
            };
            match result {
                Ok(()) => summary.entries_removed += 1,
                Err(e) => summary.failures.push(e),
            }
        }

        for failure in &summary.failures {
            tracing::warn!(error = %failure, "Cleanup step failed");
        }
        summary
    }
}

/// Deterministic byte pattern used to fill transfer buffers.
pub fn pattern(len: usize) -> Vec<u8> {
    // 251 is prime, so the pattern does not line up with power-of-two chunks.
    (0..len).map(|i| (i % 251) as u8).collect()
}

/// One transfer of a chunked sequential workload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunk {
    pub offset: u64,
    pub len: usize,
}

/// Split `total` bytes into `chunk`-sized transfers at advancing offsets.
///
/// The last transfer carries exactly the remainder.
pub fn chunk_plan(total: usize, chunk: usize) -> Vec<Chunk> {
    if chunk == 0 {
        return Vec::new();
    }
    (0..total)
        .step_by(chunk)
        .map(|start| Chunk {
            offset: start as u64,
            len: chunk.min(total - start),
        })
        .collect()
}

/// Seeded offsets for random-access workloads.
///
/// Every offset satisfies `0 <= offset <= file_size - access_size`. Returns
/// an empty sequence when the access does not fit in the file.
pub fn random_offsets(seed: u64, count: usize, file_size: u64, access_size: u64) -> Vec<u64> {
    if access_size > file_size {
        return Vec::new();
    }
    let max_offset = file_size - access_size;
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..count).map(|_| rng.random_range(0..=max_offset)).collect()
}
