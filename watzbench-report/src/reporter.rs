// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! JSON report files.
//!
//! Reports are written as `<suite>_<timestamp>.json`. A second report in the
//! same second gets a numeric suffix instead of overwriting the first.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::metrics::BenchmarkReport;

/// Errors that can occur during report generation.
#[derive(Debug, Error)]
pub enum ReporterError {
    #[error("Report I/O failed on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to (de)serialize report: {0}")]
    Serialization(#[from] serde_json::Error),
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> ReporterError + '_ {
    move |source| ReporterError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// JSON reporter for benchmark results.
#[derive(Debug)]
pub struct JsonReporter {
    /// Output directory for benchmark data
    output_dir: PathBuf,
}

impl JsonReporter {
    /// Create a reporter writing into `output_dir`, creating it if needed.
    pub fn new(output_dir: impl AsRef<Path>) -> Result<Self, ReporterError> {
        let output_dir = output_dir.as_ref().to_path_buf();
        fs::create_dir_all(&output_dir).map_err(io_error(&output_dir))?;
        Ok(Self { output_dir })
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Save a report and return the path of the created file.
    pub fn save(&self, report: &BenchmarkReport) -> Result<PathBuf, ReporterError> {
        let stem = format!(
            "{}_{}",
            report.benchmark_suite,
            report.timestamp.format("%Y-%m-%dT%H-%M-%SZ")
        );

        let mut filepath = self.output_dir.join(format!("{}.json", stem));
        let mut suffix = 1;
        while filepath.exists() {
            filepath = self.output_dir.join(format!("{}-{}.json", stem, suffix));
            suffix += 1;
        }

        let file = File::create(&filepath).map_err(io_error(&filepath))?;
        serde_json::to_writer_pretty(BufWriter::new(file), report)?;

        tracing::info!(path = %filepath.display(), results = report.results.len(), "Report saved");
        Ok(filepath)
    }

    /// List all report files in the output directory, sorted by name.
    pub fn list_reports(&self) -> Result<Vec<PathBuf>, ReporterError> {
        let mut reports = Vec::new();
        for entry in fs::read_dir(&self.output_dir).map_err(io_error(&self.output_dir))? {
            let path = entry.map_err(io_error(&self.output_dir))?.path();
            if path.extension().is_some_and(|e| e == "json") {
                reports.push(path);
            }
        }
        reports.sort();
        Ok(reports)
    }

    /// Load an existing report from a file.
    pub fn load(path: impl AsRef<Path>) -> Result<BenchmarkReport, ReporterError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(io_error(path))?;
        Ok(serde_json::from_reader(BufReader::new(file))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::BenchmarkResult;
    use chrono::Utc;
    use tempfile::TempDir;
    use watzbench_core::{EntityId, TimingRecord, WorkloadKind};

    fn report() -> BenchmarkReport {
        let record = TimingRecord {
            benchmark: EntityId::new("seq_write").unwrap(),
            title: "Throughput Sequential Write Test".to_string(),
            backend: EntityId::new("ram").unwrap(),
            kind: WorkloadKind::SequentialThroughput,
            start_ns: 10,
            completion_ns: 110,
            elapsed_ns: 100,
            bytes: 4096,
            started_at: Utc::now(),
        };
        let mut report = BenchmarkReport::new();
        report.add_result(BenchmarkResult::from_records(&[record], false).unwrap());
        report
    }

    #[test]
    fn test_reporter_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let reporter = JsonReporter::new(temp_dir.path()).unwrap();

        let path = reporter.save(&report()).unwrap();
        assert!(path.exists());

        let loaded = JsonReporter::load(&path).unwrap();
        assert_eq!(loaded.results.len(), 1);
        assert_eq!(loaded.results[0].benchmark.as_str(), "seq_write");
        assert_eq!(loaded.results[0].latency.min_ns, 100);
    }

    #[test]
    fn test_same_timestamp_does_not_overwrite() {
        let temp_dir = TempDir::new().unwrap();
        let reporter = JsonReporter::new(temp_dir.path()).unwrap();
        let report = report();

        let first = reporter.save(&report).unwrap();
        let second = reporter.save(&report).unwrap();
        assert_ne!(first, second);
        assert_eq!(reporter.list_reports().unwrap().len(), 2);
    }

    #[test]
    fn test_creates_nested_output_dir() {
        let temp_dir = TempDir::new().unwrap();
        let nested = temp_dir.path().join("data").join("runs");
        let reporter = JsonReporter::new(&nested).unwrap();
        assert!(reporter.output_dir().is_dir());
        assert!(reporter.list_reports().unwrap().is_empty());
    }

    #[test]
    fn test_load_missing_file() {
        let err = JsonReporter::load("/nonexistent/report.json").unwrap_err();
        assert!(matches!(err, ReporterError::Io { .. }));
    }
}
