// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! The standard benchmark catalog.
//!
//! Every workload here only touches storage through [`BackendOps`], so any
//! benchmark can run against any backend.
//!
//! [`BackendOps`]: crate::handle::BackendOps

mod metadata;
mod random;
mod sequential;
mod verify;

pub use metadata::{EntryKind, MetadataOp, MetadataWorkload};
pub use random::RandomWorkload;
pub use sequential::{Direction, SequentialWorkload};
pub use verify::VerifyWorkload;

use crate::benchmark::Benchmark;
use crate::config::WorkloadConfig;
use crate::error::{BenchResult, ConfigurationError};
use crate::types::{EntityId, EntryName};

pub const METADATA_CREATE: &str = "metadata_create";
pub const METADATA_DELETE: &str = "metadata_delete";
pub const METADATA_OPEN: &str = "metadata_open";
pub const DIR_CREATE: &str = "dir_create";
pub const DIR_DELETE: &str = "dir_delete";
pub const SEQ_READ: &str = "seq_read";
pub const SEQ_WRITE: &str = "seq_write";
pub const RAND_READ: &str = "rand_read";
pub const RAND_WRITE: &str = "rand_write";
pub const VERIFY_ROUND_TRIP: &str = "verify_round_trip";

/// Ids of every catalog benchmark, in suite order.
pub const IDS: [&str; 10] = [
    METADATA_CREATE,
    METADATA_DELETE,
    METADATA_OPEN,
    DIR_CREATE,
    DIR_DELETE,
    SEQ_READ,
    SEQ_WRITE,
    RAND_READ,
    RAND_WRITE,
    VERIFY_ROUND_TRIP,
];

/// Name of the single file used by throughput workloads.
pub(crate) const DATA_FILE: &str = "WATZ";

pub(crate) fn data_file() -> EntryName {
    EntryName::fixed(DATA_FILE)
}

/// Build the catalog benchmark named `id`.
pub fn build(id: &str, config: &WorkloadConfig) -> BenchResult<Benchmark> {
    let count = config.file_count;
    let (transfer, chunk) = (config.transfer_bytes, config.chunk_bytes);
    let bench = match id {
        METADATA_CREATE => Benchmark::new(
            EntityId::new(id)?,
            "File Metadata Create File Test",
            MetadataWorkload::new(MetadataOp::Create, EntryKind::File, count)?,
        ),
        METADATA_DELETE => Benchmark::new(
            EntityId::new(id)?,
            "File Metadata Delete File Test",
            MetadataWorkload::new(MetadataOp::Delete, EntryKind::File, count)?,
        ),
        METADATA_OPEN => Benchmark::new(
            EntityId::new(id)?,
            "File Metadata Open File Test",
            MetadataWorkload::new(MetadataOp::Open, EntryKind::File, count)?,
        ),
        DIR_CREATE => Benchmark::new(
            EntityId::new(id)?,
            "Directory Metadata Create Test",
            MetadataWorkload::new(MetadataOp::Create, EntryKind::Dir, count)?,
        ),
        DIR_DELETE => Benchmark::new(
            EntityId::new(id)?,
            "Directory Metadata Delete Test",
            MetadataWorkload::new(MetadataOp::Delete, EntryKind::Dir, count)?,
        ),
        SEQ_READ => Benchmark::new(
            EntityId::new(id)?,
            "Throughput Sequential Read Test",
            SequentialWorkload::new(Direction::Read, transfer, chunk)?,
        ),
        SEQ_WRITE => Benchmark::new(
            EntityId::new(id)?,
            "Throughput Sequential Write Test",
            SequentialWorkload::new(Direction::Write, transfer, chunk)?,
        ),
        RAND_READ => Benchmark::new(
            EntityId::new(id)?,
            "Throughput Random Read Test",
            RandomWorkload::from_config(Direction::Read, config)?,
        ),
        RAND_WRITE => Benchmark::new(
            EntityId::new(id)?,
            "Throughput Random Write Test",
            RandomWorkload::from_config(Direction::Write, config)?,
        ),
        VERIFY_ROUND_TRIP => Benchmark::new(
            EntityId::new(id)?,
            "Verify Write Read Round Trip Test",
            VerifyWorkload::new(transfer),
        ),
        other => return Err(ConfigurationError::UnknownBenchmark(other.to_string()).into()),
    };
    Ok(bench)
}

/// Every catalog benchmark, in [`IDS`] order.
pub fn standard(config: &WorkloadConfig) -> BenchResult<Vec<Benchmark>> {
    IDS.iter().map(|id| build(id, config)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::benchmark::WorkloadKind;
    use crate::error::BenchError;

    #[test]
    fn test_standard_catalog() {
        let benches = standard(&WorkloadConfig::default()).unwrap();
        assert_eq!(benches.len(), IDS.len());
        for (bench, id) in benches.iter().zip(IDS) {
            assert_eq!(bench.id().as_str(), id);
            assert!(!bench.title().is_empty());
        }
    }

    #[test]
    fn test_kinds() {
        let config = WorkloadConfig::default();
        assert_eq!(build(DIR_DELETE, &config).unwrap().kind(), WorkloadKind::Metadata);
        assert_eq!(
            build(SEQ_WRITE, &config).unwrap().kind(),
            WorkloadKind::SequentialThroughput
        );
        assert_eq!(
            build(RAND_READ, &config).unwrap().kind(),
            WorkloadKind::RandomThroughput
        );
        assert_eq!(
            build(VERIFY_ROUND_TRIP, &config).unwrap().kind(),
            WorkloadKind::Verification
        );
    }

    #[test]
    fn test_bytes_per_run() {
        let config = WorkloadConfig::default();
        assert_eq!(build(METADATA_CREATE, &config).unwrap().bytes_per_run(), 0);
        assert_eq!(build(SEQ_READ, &config).unwrap().bytes_per_run(), 4096);
        assert_eq!(build(RAND_WRITE, &config).unwrap().bytes_per_run(), 32 * 128);
    }

    #[test]
    fn test_out_of_range_random_access_rejected() {
        let config = WorkloadConfig {
            random_file_bytes: 64,
            random_access_bytes: 128,
            ..WorkloadConfig::default()
        };
        let err = build(RAND_READ, &config).unwrap_err();
        assert!(matches!(
            err,
            BenchError::Configuration(ConfigurationError::InvalidWorkload { .. })
        ));
        assert!(build(SEQ_READ, &config).is_ok());
    }

    #[test]
    fn test_unknown_id() {
        assert!(build("defragment", &WorkloadConfig::default()).is_err());
    }

    #[test]
    fn test_data_file_name() {
        assert_eq!(data_file().as_str(), DATA_FILE);
    }
}
