// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Report data types built from harness timing records.
//!
//! Repeated runs of one benchmark on one backend collapse into a single
//! [`BenchmarkResult`] with latency statistics over the elapsed times.

use std::collections::HashMap;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sysinfo::{Disks, System};
use watzbench_core::{EntityId, SuiteOutcome, TimingRecord, WorkloadKind};

/// Latency statistics over repeated elapsed times.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatencyMetrics {
    /// Minimum observed latency in nanoseconds
    pub min_ns: u64,
    /// Maximum observed latency in nanoseconds
    pub max_ns: u64,
    /// Arithmetic mean latency in nanoseconds
    pub mean_ns: f64,
    /// Median (p50) latency in nanoseconds
    pub median_ns: u64,
    /// 95th percentile latency in nanoseconds
    pub p95_ns: u64,
    /// 99th percentile latency in nanoseconds
    pub p99_ns: u64,
    /// Population standard deviation in nanoseconds
    pub std_dev_ns: f64,
    /// Raw samples in run order, if requested
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub samples: Option<Vec<u64>>,
}

impl LatencyMetrics {
    /// Compute statistics over `samples` (nanoseconds).
    pub fn from_samples(samples: &[u64], keep_raw: bool) -> Self {
        let raw = keep_raw.then(|| samples.to_vec());
        if samples.is_empty() {
            return Self {
                min_ns: 0,
                max_ns: 0,
                mean_ns: 0.0,
                median_ns: 0,
                p95_ns: 0,
                p99_ns: 0,
                std_dev_ns: 0.0,
                samples: raw,
            };
        }

        let mut sorted = samples.to_vec();
        sorted.sort_unstable();
        let len = sorted.len() as f64;

        let mean_ns = sorted.iter().map(|&x| x as f64).sum::<f64>() / len;
        let variance = sorted
            .iter()
            .map(|&x| {
                let diff = x as f64 - mean_ns;
                diff * diff
            })
            .sum::<f64>()
            / len;

        Self {
            min_ns: sorted[0],
            max_ns: sorted[sorted.len() - 1],
            mean_ns,
            median_ns: percentile(&sorted, 0.50),
            p95_ns: percentile(&sorted, 0.95),
            p99_ns: percentile(&sorted, 0.99),
            std_dev_ns: variance.sqrt(),
            samples: raw,
        }
    }

    /// Format latency in human-readable form (auto-selects ns/μs/ms).
    pub fn format_latency(ns: u64) -> String {
        if ns < 1_000 {
            format!("{}ns", ns)
        } else if ns < 1_000_000 {
            format!("{:.2}μs", ns as f64 / 1_000.0)
        } else if ns < 1_000_000_000 {
            format!("{:.2}ms", ns as f64 / 1_000_000.0)
        } else {
            format!("{:.2}s", ns as f64 / 1_000_000_000.0)
        }
    }
}

/// Nearest-rank percentile of an ascending, non-empty slice.
fn percentile(sorted: &[u64], p: f64) -> u64 {
    let rank = (p * sorted.len() as f64).ceil() as usize;
    sorted[rank.clamp(1, sorted.len()) - 1]
}

/// Data rate of throughput workloads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThroughputMetrics {
    /// Bytes moved per second of measured time
    pub bytes_per_sec: f64,
    /// Bytes moved across all runs
    pub total_bytes: u64,
    /// Measured time across all runs in nanoseconds
    pub duration_ns: u64,
}

impl ThroughputMetrics {
    /// Rate of `bytes` over `duration_ns`. A zero duration reports zero.
    pub fn calculate(bytes: u64, duration_ns: u64) -> Self {
        let bytes_per_sec = if duration_ns == 0 {
            0.0
        } else {
            bytes as f64 / (duration_ns as f64 / 1_000_000_000.0)
        };
        Self {
            bytes_per_sec,
            total_bytes: bytes,
            duration_ns,
        }
    }

    /// Format throughput in human-readable form.
    pub fn format_bytes_per_sec(bps: f64) -> String {
        if bps < 1_000.0 {
            format!("{:.2} B/s", bps)
        } else if bps < 1_000_000.0 {
            format!("{:.2} KB/s", bps / 1_000.0)
        } else if bps < 1_000_000_000.0 {
            format!("{:.2} MB/s", bps / 1_000_000.0)
        } else {
            format!("{:.2} GB/s", bps / 1_000_000_000.0)
        }
    }
}

/// One mounted storage device.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiskInfo {
    pub name: String,
    pub mount_point: PathBuf,
    pub total_bytes: u64,
    pub available_bytes: u64,
}

/// Host and device information captured at report time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemInfo {
    /// Operating system name
    pub os: String,
    /// OS version
    pub os_version: String,
    /// Kernel version (Linux)
    pub kernel_version: Option<String>,
    /// CPU model name
    pub cpu_model: String,
    /// Number of CPU cores
    pub cpu_cores: usize,
    /// Total system memory in bytes
    pub memory_bytes: u64,
    /// Hostname
    pub hostname: String,
    /// Storage devices visible to the host
    #[serde(default)]
    pub disks: Vec<DiskInfo>,
}

impl SystemInfo {
    /// Collect current system information.
    pub fn collect() -> Self {
        let mut sys = System::new_all();
        sys.refresh_all();

        let disks = Disks::new_with_refreshed_list()
            .iter()
            .map(|disk| DiskInfo {
                name: disk.name().to_string_lossy().into_owned(),
                mount_point: disk.mount_point().to_path_buf(),
                total_bytes: disk.total_space(),
                available_bytes: disk.available_space(),
            })
            .collect();

        Self {
            os: System::name().unwrap_or_else(|| "Unknown".to_string()),
            os_version: System::os_version().unwrap_or_else(|| "Unknown".to_string()),
            kernel_version: System::kernel_version(),
            cpu_model: sys
                .cpus()
                .first()
                .map(|cpu| cpu.brand().to_string())
                .unwrap_or_else(|| "Unknown".to_string()),
            cpu_cores: sys.cpus().len(),
            memory_bytes: sys.total_memory(),
            hostname: System::host_name().unwrap_or_else(|| "Unknown".to_string()),
            disks,
        }
    }
}

/// Aggregated runs of one benchmark on one backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkResult {
    pub backend: EntityId,
    pub benchmark: EntityId,
    /// Human-readable benchmark title
    pub title: String,
    pub category: WorkloadKind,
    pub latency: LatencyMetrics,
    /// Present for workloads that move data
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub throughput: Option<ThroughputMetrics>,
    /// Number of successful runs
    pub iterations: u64,
    /// Additional metadata specific to this benchmark
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl BenchmarkResult {
    /// Aggregate records that all belong to one (backend, benchmark) pair.
    ///
    /// Returns `None` for an empty slice.
    pub fn from_records(records: &[TimingRecord], keep_raw_samples: bool) -> Option<Self> {
        let first = records.first()?;
        let samples: Vec<u64> = records.iter().map(|r| r.elapsed_ns).collect();
        let total_bytes: u64 = records.iter().map(|r| r.bytes).sum();
        let duration_ns: u64 = samples.iter().sum();

        Some(Self {
            backend: first.backend.clone(),
            benchmark: first.benchmark.clone(),
            title: first.title.clone(),
            category: first.kind,
            latency: LatencyMetrics::from_samples(&samples, keep_raw_samples),
            throughput: (total_bytes > 0)
                .then(|| ThroughputMetrics::calculate(total_bytes, duration_ns)),
            iterations: records.len() as u64,
            metadata: HashMap::new(),
        })
    }

    /// Group records by (backend, benchmark), in order of first appearance.
    pub fn group(records: &[TimingRecord], keep_raw_samples: bool) -> Vec<Self> {
        let mut order: Vec<(&EntityId, &EntityId)> = Vec::new();
        let mut groups: HashMap<(&EntityId, &EntityId), Vec<TimingRecord>> = HashMap::new();
        for record in records {
            let key = (&record.backend, &record.benchmark);
            groups
                .entry(key)
                .or_insert_with(|| {
                    order.push(key);
                    Vec::new()
                })
                .push(record.clone());
        }

        order
            .into_iter()
            .filter_map(|key| {
                groups
                    .get(&key)
                    .and_then(|records| Self::from_records(records, keep_raw_samples))
            })
            .collect()
    }

    /// Add metadata to the result. Values that fail to serialize are stored as null.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Serialize) -> Self {
        let value = serde_json::to_value(value).unwrap_or(serde_json::Value::Null);
        self.metadata.insert(key.into(), value);
        self
    }
}

/// A run that produced no timing record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailedRun {
    pub backend: EntityId,
    pub benchmark: EntityId,
    pub repetition: u32,
    pub error: String,
}

/// Complete benchmark suite report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkReport {
    /// Suite identifier
    pub benchmark_suite: String,
    /// Framework version
    pub version: String,
    /// Timestamp when the report was created
    pub timestamp: DateTime<Utc>,
    /// System information
    pub system_info: SystemInfo,
    /// Individual benchmark results
    pub results: Vec<BenchmarkResult>,
    /// Runs that failed
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<FailedRun>,
}

impl BenchmarkReport {
    /// Create an empty report.
    pub fn new() -> Self {
        Self {
            benchmark_suite: "watzbench".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            timestamp: Utc::now(),
            system_info: SystemInfo::collect(),
            results: Vec::new(),
            failures: Vec::new(),
        }
    }

    /// Build a report from a finished suite sweep.
    pub fn from_outcome(outcome: &SuiteOutcome, keep_raw_samples: bool) -> Self {
        let mut report = Self::new();
        report.results = BenchmarkResult::group(&outcome.records, keep_raw_samples);
        report.failures = outcome
            .failures
            .iter()
            .map(|failure| FailedRun {
                backend: failure.backend.clone(),
                benchmark: failure.benchmark.clone(),
                repetition: failure.repetition,
                error: failure.error.to_string(),
            })
            .collect();
        report
    }

    /// Add a result to the report.
    pub fn add_result(&mut self, result: BenchmarkResult) {
        self.results.push(result);
    }

    /// Results for a single backend.
    pub fn results_for<'a>(
        &'a self,
        backend: &'a str,
    ) -> impl Iterator<Item = &'a BenchmarkResult> {
        self.results
            .iter()
            .filter(move |result| result.backend.as_str() == backend)
    }
}

impl Default for BenchmarkReport {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(backend: &str, benchmark: &str, elapsed_ns: u64, bytes: u64) -> TimingRecord {
        TimingRecord {
            benchmark: EntityId::new(benchmark).unwrap(),
            title: format!("{benchmark} title"),
            backend: EntityId::new(backend).unwrap(),
            kind: if bytes > 0 {
                WorkloadKind::SequentialThroughput
            } else {
                WorkloadKind::Metadata
            },
            start_ns: 0,
            completion_ns: elapsed_ns,
            elapsed_ns,
            bytes,
            started_at: Utc::now(),
        }
    }

    #[test]
    fn test_latency_metrics_from_samples() {
        let samples = [100, 200, 300, 400, 500, 600, 700, 800, 900, 1000];
        let metrics = LatencyMetrics::from_samples(&samples, false);

        assert_eq!(metrics.min_ns, 100);
        assert_eq!(metrics.max_ns, 1000);
        assert_eq!(metrics.median_ns, 500);
        assert_eq!(metrics.p95_ns, 1000);
        assert!((metrics.mean_ns - 550.0).abs() < 0.01);
        assert!(metrics.samples.is_none());
    }

    #[test]
    fn test_single_sample() {
        let metrics = LatencyMetrics::from_samples(&[42], true);
        assert_eq!(metrics.median_ns, 42);
        assert_eq!(metrics.p99_ns, 42);
        assert_eq!(metrics.std_dev_ns, 0.0);
        assert_eq!(metrics.samples, Some(vec![42]));
    }

    #[test]
    fn test_empty_samples() {
        let metrics = LatencyMetrics::from_samples(&[], false);
        assert_eq!(metrics.max_ns, 0);
        assert_eq!(metrics.mean_ns, 0.0);
    }

    #[test]
    fn test_latency_format() {
        assert_eq!(LatencyMetrics::format_latency(500), "500ns");
        assert_eq!(LatencyMetrics::format_latency(1500), "1.50μs");
        assert_eq!(LatencyMetrics::format_latency(1_500_000), "1.50ms");
        assert_eq!(LatencyMetrics::format_latency(1_500_000_000), "1.50s");
    }

    #[test]
    fn test_throughput_calculation() {
        let metrics = ThroughputMetrics::calculate(1_000_000, 1_000_000_000);
        assert!((metrics.bytes_per_sec - 1_000_000.0).abs() < 0.01);
        assert_eq!(ThroughputMetrics::calculate(10, 0).bytes_per_sec, 0.0);
        assert_eq!(ThroughputMetrics::format_bytes_per_sec(2_500_000.0), "2.50 MB/s");
    }

    #[test]
    fn test_group_by_backend_and_benchmark() {
        let records = vec![
            record("ram", "seq_write", 100, 512),
            record("ram", "metadata_create", 50, 0),
            record("ram", "seq_write", 300, 512),
            record("disk", "seq_write", 900, 512),
        ];
        let results = BenchmarkResult::group(&records, false);

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].benchmark.as_str(), "seq_write");
        assert_eq!(results[0].iterations, 2);
        assert_eq!(results[0].latency.max_ns, 300);
        let throughput = results[0].throughput.as_ref().unwrap();
        assert_eq!(throughput.total_bytes, 1024);
        assert_eq!(throughput.duration_ns, 400);

        assert!(results[1].throughput.is_none());
        assert_eq!(results[2].backend.as_str(), "disk");
    }

    #[test]
    fn test_system_info_collect() {
        let info = SystemInfo::collect();
        assert!(!info.os.is_empty());
        assert!(info.cpu_cores > 0);
        assert!(info.memory_bytes > 0);
    }

    #[test]
    fn test_benchmark_result_serialization() {
        let result = BenchmarkResult::from_records(&[record("ram", "seq_read", 10, 64)], false)
            .unwrap()
            .with_metadata("chunk_bytes", 128);

        let json = serde_json::to_string_pretty(&result).unwrap();
        assert!(json.contains("seq_read"));
        assert!(json.contains("sequential_throughput"));
        assert!(json.contains("chunk_bytes"));
    }

    #[test]
    fn test_report_from_outcome() {
        use watzbench_core::{
            catalog, BenchContext, FailurePolicy, MemoryBackend, Operation, SuiteEntry, SuitePlan,
            WorkloadConfig,
        };

        let backend = MemoryBackend::new();
        backend.fail_next(Operation::CreateDir);
        let mut ctx = BenchContext::default();
        ctx.register_backend(EntityId::new("ram").unwrap(), backend).unwrap();
        for bench in catalog::standard(&WorkloadConfig::default()).unwrap() {
            ctx.register_benchmark(bench).unwrap();
        }

        let plan = SuitePlan {
            entries: vec![SuiteEntry {
                backend: EntityId::new("ram").unwrap(),
                benchmarks: vec![
                    EntityId::new("dir_create").unwrap(),
                    EntityId::new("seq_read").unwrap(),
                ],
                repetitions: 2,
            }],
            failure_policy: FailurePolicy::Continue,
        };
        let outcome = ctx.run_suite(&plan).unwrap();
        let report = BenchmarkReport::from_outcome(&outcome, true);

        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].benchmark.as_str(), "dir_create");
        assert_eq!(report.results.len(), 2);
        assert_eq!(report.results[0].iterations, 1);
        assert_eq!(report.results[1].iterations, 2);
        assert_eq!(report.results_for("ram").count(), 2);
    }
}
