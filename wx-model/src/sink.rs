//! Destinations for metrics records.

use crate::error::Result;
use crate::evaluator::MetricsRecord;
use csv::{ReaderBuilder, WriterBuilder};
use log::info;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use wx_utils::paths::ensure_parent_dir;

pub const METRICS_COLUMNS: [&str; 3] = ["model", "mae", "rmse"];

/// Anything that accepts one record per evaluation.
pub trait MetricsSink {
    fn record(&mut self, record: &MetricsRecord) -> Result<()>;
}

/// Append-only CSV log; the header is written when the file is new or empty.
#[derive(Debug, Clone)]
pub struct CsvMetricsLog {
    path: PathBuf,
}

impl CsvMetricsLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Every record logged so far, oldest first.
    pub fn read_records(&self) -> Result<Vec<MetricsRecord>> {
        let mut rdr = ReaderBuilder::new().has_headers(true).from_path(&self.path)?;
        let records = rdr
            .deserialize()
            .collect::<std::result::Result<Vec<MetricsRecord>, csv::Error>>()?;
        Ok(records)
    }
}

impl MetricsSink for CsvMetricsLog {
    fn record(&mut self, record: &MetricsRecord) -> Result<()> {
        ensure_parent_dir(&self.path)?;
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let is_new = file.metadata()?.len() == 0;

        let mut wtr = WriterBuilder::new().has_headers(false).from_writer(file);
        if is_new {
            wtr.write_record(METRICS_COLUMNS)?;
        }
        wtr.write_record([
            record.model.clone(),
            format!("{:.3}", record.mae),
            format!("{:.3}", record.rmse),
        ])?;
        wtr.flush()?;
        info!(
            "Appended {} metrics to {}",
            record.model,
            self.path.display()
        );
        Ok(())
    }
}

/// Keeps records in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    records: Vec<MetricsRecord>,
}

impl MemorySink {
    pub fn records(&self) -> &[MetricsRecord] {
        &self.records
    }
}

impl MetricsSink for MemorySink {
    fn record(&mut self, record: &MetricsRecord) -> Result<()> {
        self.records.push(record.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn record(model: &str, mae: f64, rmse: f64) -> MetricsRecord {
        MetricsRecord {
            model: model.to_string(),
            mae,
            rmse,
        }
    }

    #[test]
    fn test_csv_log_writes_header_once() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("reports/metrics/metrics.csv");
        let mut log = CsvMetricsLog::new(&path);
        log.record(&record("naive", 2.0 / 3.0, 0.81649)).unwrap();
        log.record(&record("sarima", 1.5, 2.25)).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(
            text,
            "model,mae,rmse\nnaive,0.667,0.816\nsarima,1.500,2.250\n"
        );
    }

    #[test]
    fn test_csv_log_appends_to_existing_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("metrics.csv");
        fs::write(&path, "model,mae,rmse\nridge,1.000,1.000\n").unwrap();

        CsvMetricsLog::new(&path)
            .record(&record("naive", 3.0, 4.0))
            .unwrap();
        let records = CsvMetricsLog::new(&path).read_records().unwrap();
        assert_eq!(records, vec![record("ridge", 1.0, 1.0), record("naive", 3.0, 4.0)]);
    }

    #[test]
    fn test_memory_sink_keeps_order() {
        let mut sink = MemorySink::default();
        sink.record(&record("a", 1.0, 1.0)).unwrap();
        sink.record(&record("b", 2.0, 2.0)).unwrap();
        let models: Vec<&str> = sink.records().iter().map(|r| r.model.as_str()).collect();
        assert_eq!(models, vec!["a", "b"]);
    }
}
