// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! YAML configuration parser with strict schema validation.
//!
//! Workload sizes, backends and the suite to run are validated before any
//! benchmark starts. Any invalid field results in a HardValidationError.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::backend::{DirectoryBackend, MemoryBackend, MemoryLimits};
use crate::catalog;
use crate::error::{BenchError, BenchResult, HardValidationError};
use crate::handle::BackendHandle;
use crate::types::EntityId;

/// Upper bound on entries a metadata workload may create.
const MAX_FILE_COUNT: usize = 100_000;

/// Raw workload section as parsed from YAML (before validation).
#[derive(Debug, Deserialize)]
struct RawWorkloadConfig {
    #[serde(default = "default_file_count")]
    file_count: usize,
    #[serde(default = "default_transfer_bytes")]
    transfer_bytes: usize,
    #[serde(default = "default_chunk_bytes")]
    chunk_bytes: usize,
    #[serde(default = "default_random_access_bytes")]
    random_access_bytes: usize,
    #[serde(default = "default_random_file_bytes")]
    random_file_bytes: usize,
    #[serde(default = "default_random_ops")]
    random_ops: usize,
    #[serde(default = "default_seed")]
    seed: u64,
}

fn default_file_count() -> usize {
    100
}

fn default_transfer_bytes() -> usize {
    4096
}

fn default_chunk_bytes() -> usize {
    128
}

fn default_random_access_bytes() -> usize {
    128
}

fn default_random_file_bytes() -> usize {
    4096
}

fn default_random_ops() -> usize {
    32
}

fn default_seed() -> u64 {
    259
}

impl Default for RawWorkloadConfig {
    fn default() -> Self {
        Self {
            file_count: default_file_count(),
            transfer_bytes: default_transfer_bytes(),
            chunk_bytes: default_chunk_bytes(),
            random_access_bytes: default_random_access_bytes(),
            random_file_bytes: default_random_file_bytes(),
            random_ops: default_random_ops(),
            seed: default_seed(),
        }
    }
}

/// What the suite runner does after a failed run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Stop the sweep at the first failure.
    #[default]
    Abort,
    /// Record the failure and move on to the next run.
    Continue,
}

#[derive(Debug, Deserialize)]
struct RawHarnessConfig {
    #[serde(default)]
    failure_policy: FailurePolicy,
    #[serde(default = "default_debug_logging")]
    debug_logging: bool,
}

fn default_debug_logging() -> bool {
    true
}

impl Default for RawHarnessConfig {
    fn default() -> Self {
        Self {
            failure_policy: FailurePolicy::default(),
            debug_logging: default_debug_logging(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum RawBackendConfig {
    Memory {
        id: String,
        #[serde(default)]
        max_entries: Option<usize>,
        #[serde(default)]
        max_bytes: Option<usize>,
    },
    Directory {
        id: String,
        root: String,
    },
}

#[derive(Debug, Deserialize)]
struct RawSuiteEntry {
    backend: String,
    benchmarks: Vec<String>,
    #[serde(default = "default_repetitions")]
    repetitions: u32,
}

fn default_repetitions() -> u32 {
    1
}

/// Raw root configuration file.
#[derive(Debug, Deserialize)]
struct RawConfig {
    #[serde(default)]
    workload: RawWorkloadConfig,
    #[serde(default)]
    harness: RawHarnessConfig,
    #[serde(default)]
    backends: Vec<RawBackendConfig>,
    #[serde(default)]
    suite: Vec<RawSuiteEntry>,
}

/// Validated workload sizes shared by the benchmark catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkloadConfig {
    /// Entries created by metadata workloads.
    pub file_count: usize,
    /// Bytes moved by one sequential run.
    pub transfer_bytes: usize,
    /// Bytes per sequential transfer.
    pub chunk_bytes: usize,
    /// Bytes per random access.
    pub random_access_bytes: usize,
    /// Size of the file random workloads access.
    pub random_file_bytes: usize,
    /// Accesses per random run.
    pub random_ops: usize,
    /// Seed for the random offset sequence.
    pub seed: u64,
}

impl Default for WorkloadConfig {
    fn default() -> Self {
        let raw = RawWorkloadConfig::default();
        Self {
            file_count: raw.file_count,
            transfer_bytes: raw.transfer_bytes,
            chunk_bytes: raw.chunk_bytes,
            random_access_bytes: raw.random_access_bytes,
            random_file_bytes: raw.random_file_bytes,
            random_ops: raw.random_ops,
            seed: raw.seed,
        }
    }
}

/// Validated harness settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HarnessConfig {
    pub failure_policy: FailurePolicy,
    /// Emit debug-level diagnostics.
    pub debug_logging: bool,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            failure_policy: FailurePolicy::default(),
            debug_logging: default_debug_logging(),
        }
    }
}

/// Validated backend declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendConfig {
    Memory { id: EntityId, limits: MemoryLimits },
    Directory { id: EntityId, root: PathBuf },
}

impl BackendConfig {
    pub fn id(&self) -> &EntityId {
        match self {
            Self::Memory { id, .. } | Self::Directory { id, .. } => id,
        }
    }

    /// Construct the backend and wrap it in a handle.
    pub fn build(&self) -> BackendHandle {
        match self {
            Self::Memory { id, limits } => {
                BackendHandle::new(id.clone(), MemoryBackend::with_limits(*limits))
            }
            Self::Directory { id, root } => {
                BackendHandle::new(id.clone(), DirectoryBackend::new(root.clone()))
            }
        }
    }
}

/// One line of the suite: which benchmarks to run against which backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuiteEntry {
    pub backend: EntityId,
    pub benchmarks: Vec<EntityId>,
    pub repetitions: u32,
}

/// Ordered list of runs plus the failure policy for the sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SuitePlan {
    pub entries: Vec<SuiteEntry>,
    pub failure_policy: FailurePolicy,
}

/// Complete validated configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub workload: WorkloadConfig,
    pub harness: HarnessConfig,
    pub backends: Vec<BackendConfig>,
    pub suite: SuitePlan,
}

/// Configuration loader with strict validation.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load and validate configuration from a YAML file.
    pub fn load_file(path: impl AsRef<Path>) -> BenchResult<Config> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(BenchError::ConfigNotFound {
                path: path.to_path_buf(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| BenchError::Io {
            context: "reading config file",
            source: e,
        })?;

        Self::load_string(&content)
    }

    /// Load and validate configuration from a YAML string.
    pub fn load_string(content: &str) -> BenchResult<Config> {
        let raw: RawConfig =
            serde_yaml::from_str(content).map_err(|e| BenchError::ConfigParse {
                message: format!("YAML parse error: {}", e),
            })?;

        Ok(Self::validate(raw)?)
    }

    fn validate(raw: RawConfig) -> Result<Config, HardValidationError> {
        let workload = Self::validate_workload(raw.workload)?;
        let harness = HarnessConfig {
            failure_policy: raw.harness.failure_policy,
            debug_logging: raw.harness.debug_logging,
        };

        let mut backends = Vec::with_capacity(raw.backends.len());
        let mut seen_backends = HashSet::new();
        for raw_backend in raw.backends {
            let backend = Self::validate_backend(raw_backend)?;
            if !seen_backends.insert(backend.id().clone()) {
                return Err(HardValidationError::DuplicateId {
                    kind: "backend",
                    id: backend.id().to_string(),
                });
            }
            backends.push(backend);
        }

        if backends.is_empty() {
            backends.push(BackendConfig::Memory {
                id: EntityId::new("memory")?,
                limits: MemoryLimits::default(),
            });
        }

        let mut entries = Vec::with_capacity(raw.suite.len());
        for (index, raw_entry) in raw.suite.into_iter().enumerate() {
            entries.push(Self::validate_suite_entry(raw_entry, index, &backends)?);
        }

        Ok(Config {
            workload,
            harness,
            backends,
            suite: SuitePlan {
                entries,
                failure_policy: harness.failure_policy,
            },
        })
    }

    fn validate_workload(raw: RawWorkloadConfig) -> Result<WorkloadConfig, HardValidationError> {
        if raw.file_count == 0 || raw.file_count > MAX_FILE_COUNT {
            return Err(HardValidationError::InvalidFieldValue {
                field: "file_count",
                value: raw.file_count.to_string(),
                reason: format!("Must be between 1 and {}", MAX_FILE_COUNT),
            });
        }

        for (field, value) in [
            ("transfer_bytes", raw.transfer_bytes),
            ("chunk_bytes", raw.chunk_bytes),
            ("random_access_bytes", raw.random_access_bytes),
            ("random_file_bytes", raw.random_file_bytes),
            ("random_ops", raw.random_ops),
        ] {
            if value == 0 {
                return Err(HardValidationError::InvalidFieldValue {
                    field,
                    value: "0".to_string(),
                    reason: "Must be greater than 0".to_string(),
                });
            }
        }

        if raw.chunk_bytes > raw.transfer_bytes {
            return Err(HardValidationError::InvalidFieldValue {
                field: "chunk_bytes",
                value: raw.chunk_bytes.to_string(),
                reason: format!("Must not exceed transfer_bytes ({})", raw.transfer_bytes),
            });
        }

        if raw.random_access_bytes > raw.random_file_bytes {
            return Err(HardValidationError::InvalidFieldValue {
                field: "random_access_bytes",
                value: raw.random_access_bytes.to_string(),
                reason: format!(
                    "Must not exceed random_file_bytes ({})",
                    raw.random_file_bytes
                ),
            });
        }

        Ok(WorkloadConfig {
            file_count: raw.file_count,
            transfer_bytes: raw.transfer_bytes,
            chunk_bytes: raw.chunk_bytes,
            random_access_bytes: raw.random_access_bytes,
            random_file_bytes: raw.random_file_bytes,
            random_ops: raw.random_ops,
            seed: raw.seed,
        })
    }

    fn validate_backend(raw: RawBackendConfig) -> Result<BackendConfig, HardValidationError> {
        match raw {
            RawBackendConfig::Memory {
                id,
                max_entries,
                max_bytes,
            } => {
                if max_entries == Some(0) {
                    return Err(HardValidationError::InvalidFieldValue {
                        field: "max_entries",
                        value: "0".to_string(),
                        reason: "A backend must hold at least one entry".to_string(),
                    });
                }
                Ok(BackendConfig::Memory {
                    id: EntityId::new(id)?,
                    limits: MemoryLimits {
                        max_entries,
                        max_bytes,
                    },
                })
            }
            RawBackendConfig::Directory { id, root } => {
                if root.trim().is_empty() {
                    return Err(HardValidationError::InvalidFieldValue {
                        field: "root",
                        value: root,
                        reason: "Directory backend root cannot be empty".to_string(),
                    });
                }
                Ok(BackendConfig::Directory {
                    id: EntityId::new(id)?,
                    root: PathBuf::from(root),
                })
            }
        }
    }

    fn validate_suite_entry(
        raw: RawSuiteEntry,
        index: usize,
        backends: &[BackendConfig],
    ) -> Result<SuiteEntry, HardValidationError> {
        let backend = EntityId::new(raw.backend)?;
        if !backends.iter().any(|b| b.id() == &backend) {
            return Err(HardValidationError::InvalidFieldValue {
                field: "backend",
                value: backend.to_string(),
                reason: format!("Suite entry {} names an undeclared backend", index),
            });
        }

        if raw.benchmarks.is_empty() {
            return Err(HardValidationError::SchemaValidation {
                message: format!("Suite entry {} lists no benchmarks", index),
            });
        }

        let mut benchmarks = Vec::with_capacity(raw.benchmarks.len());
        for name in raw.benchmarks {
            if !catalog::IDS.contains(&name.as_str()) {
                return Err(HardValidationError::InvalidFieldValue {
                    field: "benchmarks",
                    value: name,
                    reason: format!("Unknown benchmark; expected one of {:?}", catalog::IDS),
                });
            }
            benchmarks.push(EntityId::new(name)?);
        }

        if raw.repetitions == 0 {
            return Err(HardValidationError::InvalidFieldValue {
                field: "repetitions",
                value: "0".to_string(),
                reason: "Must be at least 1".to_string(),
            });
        }

        Ok(SuiteEntry {
            backend,
            benchmarks,
            repetitions: raw.repetitions,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID_CONFIG: &str = r#"
workload:
  file_count: 5
  transfer_bytes: 512
  chunk_bytes: 128
  seed: 7

harness:
  failure_policy: continue
  debug_logging: false

backends:
  - kind: memory
    id: ram
    max_entries: 64
  - kind: directory
    id: scratch
    root: /tmp/watzbench

suite:
  - backend: ram
    benchmarks: [metadata_create, seq_write]
    repetitions: 3
"#;

    #[test]
    fn test_valid_config() {
        let config = ConfigLoader::load_string(VALID_CONFIG).unwrap();
        assert_eq!(config.workload.file_count, 5);
        assert_eq!(config.workload.seed, 7);
        assert_eq!(config.backends.len(), 2);
        assert_eq!(config.suite.entries[0].repetitions, 3);
        assert_eq!(config.suite.failure_policy, FailurePolicy::Continue);
        assert!(!config.harness.debug_logging);
    }

    #[test]
    fn test_defaults_applied() {
        let config = ConfigLoader::load_string("{}").unwrap();
        assert_eq!(config.workload, WorkloadConfig::default());
        assert_eq!(config.workload.file_count, 100);
        assert_eq!(config.workload.transfer_bytes, 4096);
        assert_eq!(config.harness.failure_policy, FailurePolicy::Abort);
        assert!(config.harness.debug_logging);
        assert_eq!(config.backends.len(), 1);
        assert_eq!(config.backends[0].id().as_str(), "memory");
        assert!(config.suite.entries.is_empty());
    }

    #[test]
    fn test_chunk_larger_than_transfer() {
        let yaml = r#"
workload:
  transfer_bytes: 64
  chunk_bytes: 128
"#;
        assert!(ConfigLoader::load_string(yaml).is_err());
    }

    #[test]
    fn test_access_larger_than_file() {
        let yaml = r#"
workload:
  random_access_bytes: 8192
  random_file_bytes: 4096
"#;
        assert!(ConfigLoader::load_string(yaml).is_err());
    }

    #[test]
    fn test_zero_file_count() {
        let yaml = "workload:\n  file_count: 0\n";
        assert!(ConfigLoader::load_string(yaml).is_err());
    }

    #[test]
    fn test_duplicate_backend_ids() {
        let yaml = r#"
backends:
  - kind: memory
    id: ram
  - kind: memory
    id: ram
"#;
        let err = ConfigLoader::load_string(yaml).unwrap_err();
        assert!(matches!(
            err,
            BenchError::HardValidation(HardValidationError::DuplicateId { .. })
        ));
    }

    #[test]
    fn test_unknown_benchmark() {
        let yaml = r#"
suite:
  - backend: memory
    benchmarks: [defragment]
"#;
        assert!(ConfigLoader::load_string(yaml).is_err());
    }

    #[test]
    fn test_undeclared_backend() {
        let yaml = r#"
suite:
  - backend: flash
    benchmarks: [seq_read]
"#;
        assert!(ConfigLoader::load_string(yaml).is_err());
    }

    #[test]
    fn test_zero_repetitions() {
        let yaml = r#"
suite:
  - backend: memory
    benchmarks: [seq_read]
    repetitions: 0
"#;
        assert!(ConfigLoader::load_string(yaml).is_err());
    }

    #[test]
    fn test_unknown_backend_kind() {
        let yaml = r#"
backends:
  - kind: nand
    id: chip
"#;
        let err = ConfigLoader::load_string(yaml).unwrap_err();
        assert!(matches!(err, BenchError::ConfigParse { .. }));
    }

    #[test]
    fn test_missing_file() {
        let err = ConfigLoader::load_file("/nonexistent/watzbench.yaml").unwrap_err();
        assert!(matches!(err, BenchError::ConfigNotFound { .. }));
    }
}
