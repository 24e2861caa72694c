// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Newtype wrappers for validated inputs.
//!
//! Registry identifiers and backend entry names validate their invariants at
//! creation time, so a name that reaches a backend is always well formed.

use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::HardValidationError;

/// Maximum length of a backend entry name, in bytes.
pub const MAX_ENTRY_NAME_LEN: usize = 32;

/// Maximum length of a registry identifier.
const MAX_ENTITY_ID_LEN: usize = 64;

/// Validated identifier for a registered backend or benchmark.
/// Must be non-empty, alphanumeric with hyphens/underscores, max 64 chars.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EntityId(String);

impl EntityId {
    /// Create a new EntityId with validation.
    pub fn new(id: impl Into<String>) -> Result<Self, HardValidationError> {
        let id = id.into();

        if id.is_empty() {
            return Err(HardValidationError::InvalidFieldValue {
                field: "id",
                value: id,
                reason: "Identifier cannot be empty".to_string(),
            });
        }

        if id.len() > MAX_ENTITY_ID_LEN {
            return Err(HardValidationError::InvalidFieldValue {
                field: "id",
                value: id.clone(),
                reason: format!(
                    "Identifier too long: {} chars (max {})",
                    id.len(),
                    MAX_ENTITY_ID_LEN
                ),
            });
        }

        if !id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(HardValidationError::InvalidFieldValue {
                field: "id",
                value: id,
                reason: "Identifier must contain only alphanumeric characters, hyphens, and underscores".to_string(),
            });
        }

        Ok(Self(id))
    }

    /// Get the inner string value.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Borrow<str> for EntityId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for EntityId {
    type Error = HardValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<EntityId> for String {
    fn from(id: EntityId) -> Self {
        id.0
    }
}

/// Validated path-like name of a file or directory on a backend.
///
/// Segments are separated by `/` and may contain ASCII alphanumerics,
/// `-`, `_` and `.`. The whole name is at most [`MAX_ENTRY_NAME_LEN`] bytes.
/// Empty segments and the `.`/`..` segments are rejected.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EntryName(String);

impl EntryName {
    /// Create a new EntryName with validation.
    pub fn new(name: impl Into<String>) -> Result<Self, HardValidationError> {
        let name = name.into();

        if name.is_empty() {
            return Err(Self::invalid(name, "Entry name cannot be empty".to_string()));
        }

        if name.len() > MAX_ENTRY_NAME_LEN {
            let reason = format!(
                "Entry name too long: {} bytes (max {})",
                name.len(),
                MAX_ENTRY_NAME_LEN
            );
            return Err(Self::invalid(name, reason));
        }

        for segment in name.split('/') {
            if segment.is_empty() || segment == "." || segment == ".." {
                return Err(Self::invalid(
                    name.clone(),
                    format!("Invalid path segment: {:?}", segment),
                ));
            }
            if !segment
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
            {
                return Err(Self::invalid(
                    name.clone(),
                    "Entry names may only contain alphanumerics, '-', '_', '.' and '/'"
                        .to_string(),
                ));
            }
        }

        Ok(Self(name))
    }

    /// Decimal name for the `index`-th entry of a metadata workload.
    pub fn index(index: usize) -> Self {
        // A usize has at most 20 decimal digits, well under the length bound.
        Self(index.to_string())
    }

    /// Name that is a valid literal in this crate.
    pub(crate) fn fixed(name: &'static str) -> Self {
        debug_assert!(Self::new(name).is_ok(), "invalid fixed entry name {name}");
        Self(name.to_string())
    }

    /// Name of `child` inside this directory.
    pub fn join(&self, child: &str) -> Result<Self, HardValidationError> {
        Self::new(format!("{}/{}", self.0, child))
    }

    /// Parent directory, if the name has more than one segment.
    pub fn parent(&self) -> Option<EntryName> {
        self.0
            .rsplit_once('/')
            .map(|(parent, _)| Self(parent.to_string()))
    }

    /// Get the inner string value.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn invalid(value: String, reason: String) -> HardValidationError {
        HardValidationError::InvalidFieldValue {
            field: "entry_name",
            value,
            reason,
        }
    }
}

impl fmt::Display for EntryName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for EntryName {
    type Error = HardValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for EntryName {
    type Error = HardValidationError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<EntryName> for String {
    fn from(name: EntryName) -> Self {
        name.0
    }
}

/// The operations every storage backend exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Init,
    CreateFile,
    DeleteFile,
    CreateDir,
    DeleteDir,
    Open,
    WriteAt,
    ReadAt,
    Close,
}

impl Operation {
    /// Get the operation name for diagnostics.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::CreateFile => "create_file",
            Self::DeleteFile => "delete_file",
            Self::CreateDir => "create_dir",
            Self::DeleteDir => "delete_dir",
            Self::Open => "open",
            Self::WriteAt => "write_at",
            Self::ReadAt => "read_at",
            Self::Close => "close",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A step of a benchmark run that can fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// One-time backend preparation.
    Init,
    Setup,
    /// The measured phase.
    Run,
    Teardown,
}

impl Phase {
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::Setup => "setup",
            Self::Run => "run",
            Self::Teardown => "teardown",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_id_valid() {
        let id = EntityId::new("metadata_create").unwrap();
        assert_eq!(id.as_str(), "metadata_create");
        assert_eq!(id.to_string(), "metadata_create");
    }

    #[test]
    fn test_entity_id_invalid() {
        assert!(EntityId::new("").is_err());
        assert!(EntityId::new("has space").is_err());
        assert!(EntityId::new("a".repeat(65)).is_err());
    }

    #[test]
    fn test_entry_name_bounds() {
        assert!(EntryName::new("a".repeat(MAX_ENTRY_NAME_LEN)).is_ok());
        assert!(EntryName::new("a".repeat(MAX_ENTRY_NAME_LEN + 1)).is_err());
        assert!(EntryName::new("").is_err());
    }

    #[test]
    fn test_entry_name_segments() {
        assert!(EntryName::new("logs/day.1").is_ok());
        assert!(EntryName::new("/abs").is_err());
        assert!(EntryName::new("trailing/").is_err());
        assert!(EntryName::new("a//b").is_err());
        assert!(EntryName::new("../escape").is_err());
        assert!(EntryName::new("bad*char").is_err());
    }

    #[test]
    fn test_entry_name_parent_and_join() {
        let dir = EntryName::new("logs").unwrap();
        let file = dir.join("7").unwrap();
        assert_eq!(file.as_str(), "logs/7");
        assert_eq!(file.parent(), Some(dir));
        assert_eq!(EntryName::index(42).parent(), None);
    }

    #[test]
    fn test_entry_name_index() {
        assert_eq!(EntryName::index(0).as_str(), "0");
        assert_eq!(EntryName::index(99).as_str(), "99");
    }

    #[test]
    fn test_entity_id_serde_roundtrip_rejects_invalid() {
        let id: Result<EntityId, _> = serde_yaml::from_str("\"bad id\"");
        assert!(id.is_err());
        let id: EntityId = serde_yaml::from_str("memory").unwrap();
        assert_eq!(id.as_str(), "memory");
    }
}
