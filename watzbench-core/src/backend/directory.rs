// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Host-directory storage backend.
//!
//! Entries live under a root directory on the host filesystem. `init`
//! formats the backend by wiping and recreating the root, but only a root
//! that is missing, empty, or carries the [`FORMAT_MARKER`] left by an
//! earlier `init`. Any other directory is refused untouched.

use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::{BackendUsage, FileHandle, StorageBackend};
use crate::error::{BackendResult, OperationFailed};
use crate::types::{EntryName, Operation};

/// File written into the root by `init`. The name is not a valid
/// [`EntryName`], so no benchmark entry can collide with it.
pub const FORMAT_MARKER: &str = "@watzbench";

#[derive(Debug, Default)]
struct HandleTable {
    next: u32,
    files: HashMap<u32, (EntryName, File)>,
}

/// [`StorageBackend`] rooted in a directory of the host filesystem.
#[derive(Debug)]
pub struct DirectoryBackend {
    root: PathBuf,
    handles: Mutex<HandleTable>,
}

impl DirectoryBackend {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            handles: Mutex::new(HandleTable::default()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_of(&self, name: &EntryName) -> PathBuf {
        self.root.join(name.as_str())
    }

    fn table(&self) -> MutexGuard<'_, HandleTable> {
        self.handles.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn with_file<T>(
        &self,
        op: Operation,
        handle: &FileHandle,
        f: impl FnOnce(&mut File) -> std::io::Result<T>,
    ) -> BackendResult<T> {
        let mut table = self.table();
        let (name, file) = table
            .files
            .get_mut(&handle.raw())
            .ok_or_else(|| OperationFailed::new(op, handle.to_string(), "invalid handle"))?;
        f(file).map_err(|e| OperationFailed::io(op, name.as_str(), &e))
    }

    /// Whether `init` may wipe the root: it is missing, empty, or ours.
    fn may_format(&self) -> std::io::Result<bool> {
        let mut entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(true),
            Err(e) => return Err(e),
        };
        if entries.next().is_none() {
            return Ok(true);
        }
        Ok(self.root.join(FORMAT_MARKER).is_file())
    }

    fn count_entries(dir: &Path, usage: &mut BackendUsage) {
        let Ok(entries) = fs::read_dir(dir) else {
            return;
        };
        for entry in entries.flatten() {
            if entry.file_name() == FORMAT_MARKER {
                continue;
            }
            let path = entry.path();
            if path.is_dir() {
                usage.dirs += 1;
                Self::count_entries(&path, usage);
            } else {
                usage.files += 1;
            }
        }
    }
}

impl StorageBackend for DirectoryBackend {
    fn kind(&self) -> &'static str {
        "directory"
    }

    fn init(&self) -> BackendResult<()> {
        let op = Operation::Init;
        let target = self.root.display().to_string();

        if self.root.parent().is_none() {
            return Err(OperationFailed::new(
                op,
                target,
                "refusing to format a filesystem root",
            ));
        }
        if !self.may_format().map_err(|e| OperationFailed::io(op, &target, &e))? {
            return Err(OperationFailed::new(
                op,
                target,
                "directory holds data not written by this backend",
            ));
        }

        self.table().files.clear();

        match fs::remove_dir_all(&self.root) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(OperationFailed::io(op, target, &e)),
        }
        fs::create_dir_all(&self.root).map_err(|e| OperationFailed::io(op, &target, &e))?;
        fs::write(self.root.join(FORMAT_MARKER), b"")
            .map_err(|e| OperationFailed::io(op, target, &e))
    }

    fn create_file(&self, name: &EntryName) -> BackendResult<()> {
        OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(self.path_of(name))
            .map(|_| ())
            .map_err(|e| OperationFailed::io(Operation::CreateFile, name.as_str(), &e))
    }

    fn delete_file(&self, name: &EntryName) -> BackendResult<()> {
        fs::remove_file(self.path_of(name))
            .map_err(|e| OperationFailed::io(Operation::DeleteFile, name.as_str(), &e))
    }

    fn create_dir(&self, name: &EntryName) -> BackendResult<()> {
        fs::create_dir(self.path_of(name))
            .map_err(|e| OperationFailed::io(Operation::CreateDir, name.as_str(), &e))
    }

    fn delete_dir(&self, name: &EntryName) -> BackendResult<()> {
        fs::remove_dir(self.path_of(name))
            .map_err(|e| OperationFailed::io(Operation::DeleteDir, name.as_str(), &e))
    }

    fn open(&self, name: &EntryName) -> BackendResult<FileHandle> {
        let op = Operation::Open;
        let path = self.path_of(name);

        // OpenOptions without `create` fails on a missing file.
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(&path)
            .map_err(|e| OperationFailed::io(op, name.as_str(), &e))?;
        if !file
            .metadata()
            .map_err(|e| OperationFailed::io(op, name.as_str(), &e))?
            .is_file()
        {
            return Err(OperationFailed::new(op, name.as_str(), "not a regular file"));
        }

        let mut table = self.table();
        let raw = table.next;
        table.next = table.next.wrapping_add(1);
        table.files.insert(raw, (name.clone(), file));
        Ok(FileHandle::new(raw))
    }

    fn write_at(&self, handle: &FileHandle, offset: u64, bytes: &[u8]) -> BackendResult<usize> {
        self.with_file(Operation::WriteAt, handle, |file| {
            file.seek(SeekFrom::Start(offset))?;
            file.write_all(bytes)?;
            Ok(bytes.len())
        })
    }

    fn read_at(&self, handle: &FileHandle, offset: u64, bytes: &mut [u8]) -> BackendResult<usize> {
        self.with_file(Operation::ReadAt, handle, |file| {
            file.seek(SeekFrom::Start(offset))?;
            let mut filled = 0;
            while filled < bytes.len() {
                match file.read(&mut bytes[filled..]) {
                    Ok(0) => break,
                    Ok(n) => filled += n,
                    Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                    Err(e) => return Err(e),
                }
            }
            Ok(filled)
        })
    }

    fn close(&self, handle: FileHandle) -> BackendResult<()> {
        self.table()
            .files
            .remove(&handle.raw())
            .map(|_| ())
            .ok_or_else(|| {
                OperationFailed::new(Operation::Close, handle.to_string(), "invalid handle")
            })
    }

    fn usage(&self) -> BackendUsage {
        let mut usage = BackendUsage {
            open_handles: self.table().files.len(),
            ..BackendUsage::default()
        };
        Self::count_entries(&self.root, &mut usage);
        usage
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn name(s: &str) -> EntryName {
        EntryName::new(s).unwrap()
    }

    fn backend() -> (TempDir, DirectoryBackend) {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let backend = DirectoryBackend::new(temp_dir.path().join("device"));
        backend.init().unwrap();
        (temp_dir, backend)
    }

    #[test]
    fn test_init_wipes_root() {
        let (_temp, backend) = backend();
        backend.create_file(&name("stale")).unwrap();
        backend.init().unwrap();
        assert_eq!(backend.usage(), BackendUsage::default());
    }

    #[test]
    fn test_init_refuses_foreign_directory() {
        let temp_dir = TempDir::new().unwrap();
        let precious = temp_dir.path().join("precious.txt");
        fs::write(&precious, b"keep me").unwrap();

        let backend = DirectoryBackend::new(temp_dir.path());
        let err = backend.init().unwrap_err();
        assert_eq!(err.op, Operation::Init);
        assert_eq!(fs::read(&precious).unwrap(), b"keep me");
        assert!(!temp_dir.path().join(FORMAT_MARKER).exists());
    }

    #[test]
    fn test_init_formats_empty_directory() {
        let temp_dir = TempDir::new().unwrap();
        let backend = DirectoryBackend::new(temp_dir.path());
        backend.init().unwrap();
        assert!(temp_dir.path().join(FORMAT_MARKER).is_file());
        assert_eq!(backend.usage(), BackendUsage::default());
        assert!(EntryName::new(FORMAT_MARKER).is_err());
    }

    #[test]
    fn test_create_delete_roundtrip() {
        let (_temp, backend) = backend();
        backend.create_file(&name("a")).unwrap();
        assert!(backend.root().join("a").exists());
        assert!(backend.create_file(&name("a")).is_err());

        backend.delete_file(&name("a")).unwrap();
        assert!(backend.delete_file(&name("a")).is_err());
        assert_eq!(backend.usage(), BackendUsage::default());
    }

    #[test]
    fn test_open_does_not_create() {
        let (_temp, backend) = backend();
        assert!(backend.open(&name("missing")).is_err());
        assert!(!backend.root().join("missing").exists());
    }

    #[test]
    fn test_write_read_roundtrip() {
        let (_temp, backend) = backend();
        backend.create_file(&name("f")).unwrap();
        let fd = backend.open(&name("f")).unwrap();

        let data = vec![0x5Au8; 300];
        assert_eq!(backend.write_at(&fd, 0, &data).unwrap(), 300);
        let mut out = vec![0u8; 300];
        assert_eq!(backend.read_at(&fd, 0, &mut out).unwrap(), 300);
        assert_eq!(out, data);

        let mut tail = [0u8; 50];
        assert_eq!(backend.read_at(&fd, 280, &mut tail).unwrap(), 20);

        assert_eq!(backend.usage().open_handles, 1);
        backend.close(fd).unwrap();
        assert_eq!(backend.usage().open_handles, 0);
    }

    #[test]
    fn test_directories() {
        let (_temp, backend) = backend();
        backend.create_dir(&name("logs")).unwrap();
        backend.create_file(&name("logs/1")).unwrap();
        assert!(backend.delete_dir(&name("logs")).is_err());

        let usage = backend.usage();
        assert_eq!((usage.files, usage.dirs), (1, 1));

        backend.delete_file(&name("logs/1")).unwrap();
        backend.delete_dir(&name("logs")).unwrap();
    }

    #[test]
    fn test_open_directory_fails() {
        let (_temp, backend) = backend();
        backend.create_dir(&name("d")).unwrap();
        assert!(backend.open(&name("d")).is_err());
    }
}
