// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Storage backend contract.
//!
//! Every storage technology under test implements [`StorageBackend`]. The
//! harness never talks to a backend directly; it goes through a
//! [`BackendHandle`](crate::handle::BackendHandle).
//!
//! `open` never creates an entry. A workload that needs a file calls
//! `create_file` first.

mod directory;
mod memory;

pub use directory::{DirectoryBackend, FORMAT_MARKER};
pub use memory::{MemoryBackend, MemoryLimits, MAX_FILE_BYTES};

use serde::Serialize;

use crate::error::BackendResult;
use crate::types::EntryName;

/// Opaque reference to an open file.
///
/// Handles are move-only: `close` consumes the handle, so a handle cannot
/// be closed twice.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct FileHandle(u32);

impl FileHandle {
    /// Wrap a backend-specific handle number.
    pub fn new(raw: u32) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for FileHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "fd#{}", self.0)
    }
}

/// Snapshot of what a backend currently holds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BackendUsage {
    pub files: usize,
    pub dirs: usize,
    pub open_handles: usize,
}

/// The operation set a storage technology must provide.
///
/// Transfers return the number of bytes actually moved; the caller decides
/// whether a short transfer is a failure.
pub trait StorageBackend: Send + Sync {
    /// Short label for logs.
    fn kind(&self) -> &'static str;

    /// One-time preparation, e.g. formatting the device.
    fn init(&self) -> BackendResult<()>;

    fn create_file(&self, name: &EntryName) -> BackendResult<()>;

    fn delete_file(&self, name: &EntryName) -> BackendResult<()>;

    fn create_dir(&self, name: &EntryName) -> BackendResult<()>;

    fn delete_dir(&self, name: &EntryName) -> BackendResult<()>;

    /// Open an existing file for reading and writing.
    fn open(&self, name: &EntryName) -> BackendResult<FileHandle>;

    /// Position at `offset` and write all of `bytes`.
    fn write_at(&self, handle: &FileHandle, offset: u64, bytes: &[u8]) -> BackendResult<usize>;

    /// Position at `offset` and fill as much of `bytes` as the file holds.
    fn read_at(&self, handle: &FileHandle, offset: u64, bytes: &mut [u8]) -> BackendResult<usize>;

    fn close(&self, handle: FileHandle) -> BackendResult<()>;

    /// Current entry and handle counts.
    fn usage(&self) -> BackendUsage;
}

/// Shared backends, so a caller can keep inspecting a backend it registered.
impl<B: StorageBackend + ?Sized> StorageBackend for std::sync::Arc<B> {
    fn kind(&self) -> &'static str {
        (**self).kind()
    }

    fn init(&self) -> BackendResult<()> {
        (**self).init()
    }

    fn create_file(&self, name: &EntryName) -> BackendResult<()> {
        (**self).create_file(name)
    }

    fn delete_file(&self, name: &EntryName) -> BackendResult<()> {
        (**self).delete_file(name)
    }

    fn create_dir(&self, name: &EntryName) -> BackendResult<()> {
        (**self).create_dir(name)
    }

    fn delete_dir(&self, name: &EntryName) -> BackendResult<()> {
        (**self).delete_dir(name)
    }

    fn open(&self, name: &EntryName) -> BackendResult<FileHandle> {
        (**self).open(name)
    }

    fn write_at(&self, handle: &FileHandle, offset: u64, bytes: &[u8]) -> BackendResult<usize> {
        (**self).write_at(handle, offset, bytes)
    }

    fn read_at(&self, handle: &FileHandle, offset: u64, bytes: &mut [u8]) -> BackendResult<usize> {
        (**self).read_at(handle, offset, bytes)
    }

    fn close(&self, handle: FileHandle) -> BackendResult<()> {
        (**self).close(handle)
    }

    fn usage(&self) -> BackendUsage {
        (**self).usage()
    }
}
