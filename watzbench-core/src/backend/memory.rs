// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! In-memory storage backend.
//!
//! Files are byte vectors in a map keyed by entry name. Optional limits
//! emulate the scarce entry table and flash space of a small device, and
//! injected faults let tests exercise the failure paths of the harness.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::{BackendUsage, FileHandle, StorageBackend};
use crate::error::{BackendResult, OperationFailed};
use crate::types::{EntryName, Operation};

/// Largest file a [`MemoryBackend`] will hold, whatever its limits.
pub const MAX_FILE_BYTES: usize = 1 << 30;

/// Capacity limits for a [`MemoryBackend`]. `None` means unbounded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemoryLimits {
    /// Maximum number of files plus directories.
    pub max_entries: Option<usize>,
    /// Maximum total file bytes.
    pub max_bytes: Option<usize>,
}

#[derive(Debug, Default)]
struct MemoryState {
    files: HashMap<EntryName, Vec<u8>>,
    dirs: HashSet<EntryName>,
    open: HashMap<u32, EntryName>,
    next_handle: u32,
    init_count: u32,
}

impl MemoryState {
    fn entry_count(&self) -> usize {
        self.files.len() + self.dirs.len()
    }

    fn stored_bytes(&self) -> usize {
        self.files.values().map(Vec::len).sum()
    }

    fn exists(&self, name: &EntryName) -> bool {
        self.files.contains_key(name) || self.dirs.contains(name)
    }

    fn parent_exists(&self, name: &EntryName) -> bool {
        name.parent().map_or(true, |parent| self.dirs.contains(&parent))
    }

    fn handle_target(&self, op: Operation, handle: &FileHandle) -> BackendResult<EntryName> {
        self.open
            .get(&handle.raw())
            .cloned()
            .ok_or_else(|| OperationFailed::new(op, handle.to_string(), "invalid handle"))
    }
}

/// Map-backed [`StorageBackend`].
#[derive(Debug, Default)]
pub struct MemoryBackend {
    state: RwLock<MemoryState>,
    limits: MemoryLimits,
    faults: Mutex<Vec<Operation>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limits(limits: MemoryLimits) -> Self {
        Self {
            limits,
            ..Self::default()
        }
    }

    /// Make the next call of `op` fail. Faults queue up and are consumed in order.
    pub fn fail_next(&self, op: Operation) {
        self.faults
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(op);
    }

    /// Names of all stored files, sorted.
    pub fn file_names(&self) -> Vec<EntryName> {
        let mut names: Vec<_> = self.read().files.keys().cloned().collect();
        names.sort();
        names
    }

    /// Names of all directories, sorted.
    pub fn dir_names(&self) -> Vec<EntryName> {
        let mut names: Vec<_> = self.read().dirs.iter().cloned().collect();
        names.sort();
        names
    }

    /// Copy of a file's bytes.
    pub fn contents(&self, name: &EntryName) -> Option<Vec<u8>> {
        self.read().files.get(name).cloned()
    }

    /// How many times `init` has run.
    pub fn init_count(&self) -> u32 {
        self.read().init_count
    }

    fn read(&self) -> RwLockReadGuard<'_, MemoryState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, MemoryState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn check_fault(&self, op: Operation, target: &str) -> BackendResult<()> {
        let mut faults = self.faults.lock().unwrap_or_else(PoisonError::into_inner);
        match faults.iter().position(|f| *f == op) {
            Some(index) => {
                faults.remove(index);
                Err(OperationFailed::new(op, target, "injected fault"))
            }
            None => Ok(()),
        }
    }

    fn check_entry_capacity(
        &self,
        op: Operation,
        state: &MemoryState,
        name: &EntryName,
    ) -> BackendResult<()> {
        match self.limits.max_entries {
            Some(max) if state.entry_count() >= max => Err(OperationFailed::new(
                op,
                name.as_str(),
                format!("entry table full ({} entries)", max),
            )),
            _ => Ok(()),
        }
    }

    fn create_entry(&self, op: Operation, name: &EntryName, is_dir: bool) -> BackendResult<()> {
        self.check_fault(op, name.as_str())?;
        let mut state = self.write();

        if state.exists(name) {
            return Err(OperationFailed::new(op, name.as_str(), "entry already exists"));
        }
        if !state.parent_exists(name) {
            return Err(OperationFailed::new(op, name.as_str(), "parent directory missing"));
        }
        self.check_entry_capacity(op, &state, name)?;

        if is_dir {
            state.dirs.insert(name.clone());
        } else {
            state.files.insert(name.clone(), Vec::new());
        }
        Ok(())
    }
}

impl StorageBackend for MemoryBackend {
    fn kind(&self) -> &'static str {
        "memory"
    }

    fn init(&self) -> BackendResult<()> {
        self.check_fault(Operation::Init, "memory")?;
        let mut state = self.write();
        state.files.clear();
        state.dirs.clear();
        state.open.clear();
        state.init_count += 1;
        Ok(())
    }

    fn create_file(&self, name: &EntryName) -> BackendResult<()> {
        self.create_entry(Operation::CreateFile, name, false)
    }

    fn delete_file(&self, name: &EntryName) -> BackendResult<()> {
        let op = Operation::DeleteFile;
        self.check_fault(op, name.as_str())?;
        let mut state = self.write();

        if state.open.values().any(|open| open == name) {
            return Err(OperationFailed::new(op, name.as_str(), "file is open"));
        }
        state
            .files
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| OperationFailed::new(op, name.as_str(), "no such file"))
    }

    fn create_dir(&self, name: &EntryName) -> BackendResult<()> {
        self.create_entry(Operation::CreateDir, name, true)
    }

    fn delete_dir(&self, name: &EntryName) -> BackendResult<()> {
        let op = Operation::DeleteDir;
        self.check_fault(op, name.as_str())?;
        let mut state = self.write();

        if !state.dirs.contains(name) {
            return Err(OperationFailed::new(op, name.as_str(), "no such directory"));
        }
        let occupied = state
            .files
            .keys()
            .chain(state.dirs.iter())
            .any(|entry| entry.parent().as_ref() == Some(name));
        if occupied {
            return Err(OperationFailed::new(op, name.as_str(), "directory not empty"));
        }
        state.dirs.remove(name);
        Ok(())
    }

    fn open(&self, name: &EntryName) -> BackendResult<FileHandle> {
        let op = Operation::Open;
        self.check_fault(op, name.as_str())?;
        let mut state = self.write();

        if !state.files.contains_key(name) {
            return Err(OperationFailed::new(op, name.as_str(), "no such file"));
        }
        let raw = state.next_handle;
        state.next_handle = state.next_handle.wrapping_add(1);
        state.open.insert(raw, name.clone());
        Ok(FileHandle::new(raw))
    }

    fn write_at(&self, handle: &FileHandle, offset: u64, bytes: &[u8]) -> BackendResult<usize> {
        let op = Operation::WriteAt;
        self.check_fault(op, &handle.to_string())?;
        let mut state = self.write();
        let name = state.handle_target(op, handle)?;

        let end = usize::try_from(offset)
            .ok()
            .and_then(|start| start.checked_add(bytes.len()))
            .filter(|&end| end <= MAX_FILE_BYTES)
            .ok_or_else(|| OperationFailed::new(op, name.as_str(), "offset out of range"))?;
        let start = end - bytes.len();
        let current_len = state.files.get(&name).map_or(0, Vec::len);

        if let Some(max) = self.limits.max_bytes {
            let grown = end.saturating_sub(current_len);
            if state.stored_bytes() + grown > max {
                return Err(OperationFailed::new(
                    op,
                    name.as_str(),
                    format!("no space left ({} byte limit)", max),
                ));
            }
        }

        let file = state
            .files
            .get_mut(&name)
            .ok_or_else(|| OperationFailed::new(op, name.as_str(), "file vanished while open"))?;
        if file.len() < end {
            file.try_reserve(end - file.len())
                .map_err(|_| OperationFailed::new(op, name.as_str(), "out of memory"))?;
            file.resize(end, 0);
        }
        file[start..end].copy_from_slice(bytes);
        Ok(bytes.len())
    }

    fn read_at(&self, handle: &FileHandle, offset: u64, bytes: &mut [u8]) -> BackendResult<usize> {
        let op = Operation::ReadAt;
        self.check_fault(op, &handle.to_string())?;
        let state = self.read();
        let name = state.handle_target(op, handle)?;

        let file = state
            .files
            .get(&name)
            .ok_or_else(|| OperationFailed::new(op, name.as_str(), "file vanished while open"))?;
        let start = match usize::try_from(offset) {
            Ok(start) if start <= file.len() => start,
            _ => return Ok(0),
        };
        let available = (file.len() - start).min(bytes.len());
        bytes[..available].copy_from_slice(&file[start..start + available]);
        Ok(available)
    }

    fn close(&self, handle: FileHandle) -> BackendResult<()> {
        let op = Operation::Close;
        self.check_fault(op, &handle.to_string())?;
        self.write()
            .open
            .remove(&handle.raw())
            .map(|_| ())
            .ok_or_else(|| OperationFailed::new(op, handle.to_string(), "invalid handle"))
    }

    fn usage(&self) -> BackendUsage {
        let state = self.read();
        BackendUsage {
            files: state.files.len(),
            dirs: state.dirs.len(),
            open_handles: state.open.len(),
        }
    }
}
