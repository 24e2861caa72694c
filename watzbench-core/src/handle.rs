// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Backend handles: the uniform surface benchmarks run against.
//!
//! A [`BackendHandle`] owns one backend and guarantees its `init` runs
//! exactly once. Benchmarks never see the backend itself; they receive a
//! [`BackendOps`] view, which is only handed out after initialization and
//! which enforces the exact-length transfer contract.

use std::sync::{Mutex, PoisonError};

use crate::backend::{BackendUsage, FileHandle, StorageBackend};
use crate::error::{BackendResult, ConfigurationError, OperationFailed};
use crate::types::{EntityId, EntryName, Operation};

/// A registered backend.
pub struct BackendHandle {
    id: EntityId,
    backend: Box<dyn StorageBackend>,
    initialized: Mutex<bool>,
}

impl BackendHandle {
    pub fn new(id: EntityId, backend: impl StorageBackend + 'static) -> Self {
        Self::from_boxed(id, Box::new(backend))
    }

    pub fn from_boxed(id: EntityId, backend: Box<dyn StorageBackend>) -> Self {
        Self {
            id,
            backend,
            initialized: Mutex::new(false),
        }
    }

    pub fn id(&self) -> &EntityId {
        &self.id
    }

    /// Label of the underlying storage technology.
    pub fn kind(&self) -> &'static str {
        self.backend.kind()
    }

    /// Run the backend's `init` if it has not run yet.
    ///
    /// Returns `true` when this call performed the initialization. A failed
    /// `init` leaves the handle uninitialized.
    pub fn initialize(&self) -> BackendResult<bool> {
        let mut initialized = self.initialized.lock().unwrap_or_else(PoisonError::into_inner);
        if *initialized {
            return Ok(false);
        }

        tracing::debug!(backend = %self.id, kind = self.kind(), "Initializing backend");
        self.backend.init()?;
        *initialized = true;
        Ok(true)
    }

    pub fn is_initialized(&self) -> bool {
        *self.initialized.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Operation view for benchmark phases.
    pub fn ops(&self) -> Result<BackendOps<'_>, ConfigurationError> {
        if !self.is_initialized() {
            return Err(ConfigurationError::BackendNotInitialized(self.id.clone()));
        }
        Ok(BackendOps {
            id: &self.id,
            backend: self.backend.as_ref(),
        })
    }

    pub fn usage(&self) -> BackendUsage {
        self.backend.usage()
    }
}

impl std::fmt::Debug for BackendHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendHandle")
            .field("id", &self.id)
            .field("kind", &self.kind())
            .field("initialized", &self.is_initialized())
            .finish()
    }
}

/// Checked operation set of an initialized backend.
#[derive(Clone, Copy)]
pub struct BackendOps<'a> {
    id: &'a EntityId,
    backend: &'a dyn StorageBackend,
}

impl<'a> BackendOps<'a> {
    pub fn backend_id(&self) -> &'a EntityId {
        self.id
    }

    pub fn create_file(&self, name: &EntryName) -> BackendResult<()> {
        tracing::trace!(backend = %self.id, %name, "create_file");
        self.backend.create_file(name)
    }

    pub fn delete_file(&self, name: &EntryName) -> BackendResult<()> {
        tracing::trace!(backend = %self.id, %name, "delete_file");
        self.backend.delete_file(name)
    }

    pub fn create_dir(&self, name: &EntryName) -> BackendResult<()> {
        tracing::trace!(backend = %self.id, %name, "create_dir");
        self.backend.create_dir(name)
    }

    pub fn delete_dir(&self, name: &EntryName) -> BackendResult<()> {
        tracing::trace!(backend = %self.id, %name, "delete_dir");
        self.backend.delete_dir(name)
    }

    pub fn open(&self, name: &EntryName) -> BackendResult<FileHandle> {
        tracing::trace!(backend = %self.id, %name, "open");
        self.backend.open(name)
    }

    /// Write exactly `length` bytes from the front of `bytes` at `offset`.
    pub fn write_at(
        &self,
        handle: &FileHandle,
        offset: u64,
        length: usize,
        bytes: &[u8],
    ) -> BackendResult<()> {
        let op = Operation::WriteAt;
        check_length(op, handle, length, bytes.len())?;
        let written = self.backend.write_at(handle, offset, &bytes[..length])?;
        check_transfer(op, handle, length, written)
    }

    /// Read exactly `length` bytes at `offset` into the front of `bytes`.
    pub fn read_at(
        &self,
        handle: &FileHandle,
        offset: u64,
        length: usize,
        bytes: &mut [u8],
    ) -> BackendResult<()> {
        let op = Operation::ReadAt;
        check_length(op, handle, length, bytes.len())?;
        let read = self.backend.read_at(handle, offset, &mut bytes[..length])?;
        check_transfer(op, handle, length, read)
    }

    pub fn close(&self, handle: FileHandle) -> BackendResult<()> {
        tracing::trace!(backend = %self.id, %handle, "close");
        self.backend.close(handle)
    }

    pub fn usage(&self) -> BackendUsage {
        self.backend.usage()
    }
}

impl std::fmt::Debug for BackendOps<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendOps")
            .field("id", self.id)
            .field("kind", &self.backend.kind())
            .finish()
    }
}

fn check_length(
    op: Operation,
    handle: &FileHandle,
    length: usize,
    capacity: usize,
) -> BackendResult<()> {
    if length > capacity {
        return Err(OperationFailed::new(
            op,
            handle.to_string(),
            format!("length {} exceeds buffer of {} bytes", length, capacity),
        ));
    }
    Ok(())
}

fn check_transfer(
    op: Operation,
    handle: &FileHandle,
    expected: usize,
    actual: usize,
) -> BackendResult<()> {
    if actual != expected {
        return Err(OperationFailed::new(
            op,
            handle.to_string(),
            format!("short transfer: {} of {} bytes", actual, expected),
        ));
    }
    Ok(())
}
