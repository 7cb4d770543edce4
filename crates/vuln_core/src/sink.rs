use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::NaiveDate;
use log::debug;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// One stored indicator row. `value_norm` is never written by this
/// core; upserts must leave an existing value untouched.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Indicator {
    pub region: String,
    pub code: String,
    pub time_start: NaiveDate,
    pub time_end: NaiveDate,
    pub value_raw: f64,
    pub value_norm: Option<f64>,
    pub source: String,
}

/// Destination for computed indicators. Upserts are idempotent on
/// `(region, code, time_start, time_end)` and overwrite only
/// `value_raw` and `source`.
pub trait MetricSink {
    #[allow(clippy::too_many_arguments)]
    fn upsert_indicator(
        &mut self,
        region: &str,
        code: &str,
        time_start: NaiveDate,
        time_end: NaiveDate,
        value_raw: f64,
        source_text: &str,
    ) -> anyhow::Result<()>;
}

type IndicatorKey = (String, String, NaiveDate, NaiveDate);

/// In-memory sink for tests and dry runs.
#[derive(Debug, Default)]
pub struct MemorySink {
    rows: FxHashMap<IndicatorKey, Indicator>,
}

impl MemorySink {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(
        &self,
        region: &str,
        code: &str,
        time_start: NaiveDate,
        time_end: NaiveDate,
    ) -> Option<&Indicator> {
        self.rows
            .get(&(region.to_string(), code.to_string(), time_start, time_end))
    }
}

impl MetricSink for MemorySink {
    fn upsert_indicator(
        &mut self,
        region: &str,
        code: &str,
        time_start: NaiveDate,
        time_end: NaiveDate,
        value_raw: f64,
        source_text: &str,
    ) -> anyhow::Result<()> {
        let key = (region.to_string(), code.to_string(), time_start, time_end);
        let value_norm = self.rows.get(&key).and_then(|row| row.value_norm);
        self.rows.insert(
            key,
            Indicator {
                region: region.to_string(),
                code: code.to_string(),
                time_start,
                time_end,
                value_raw,
                value_norm,
                source: source_text.to_string(),
            },
        );
        Ok(())
    }
}

/// CSV-backed sink: the whole file is read, the matching row replaced
/// or appended, and the file rewritten.
#[derive(Debug)]
pub struct CsvSink {
    path: PathBuf,
}

impl CsvSink {
    pub fn new(path: &Path) -> Self {
        CsvSink {
            path: path.to_path_buf(),
        }
    }

    fn load(&self) -> anyhow::Result<Vec<Indicator>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let mut reader = csv::Reader::from_path(&self.path)
            .with_context(|| format!("Failed to open sink file {}", self.path.display()))?;

        let mut rows = Vec::new();
        for result in reader.deserialize() {
            let row: Indicator = result.context("Failed to parse indicator row")?;
            rows.push(row);
        }
        Ok(rows)
    }

    fn store(&self, rows: &[Indicator]) -> anyhow::Result<()> {
        let mut wtr = csv::Writer::from_path(&self.path)
            .with_context(|| format!("Failed to write sink file {}", self.path.display()))?;
        for row in rows {
            wtr.serialize(row)?;
        }
        wtr.flush()?;
        Ok(())
    }
}

impl MetricSink for CsvSink {
    fn upsert_indicator(
        &mut self,
        region: &str,
        code: &str,
        time_start: NaiveDate,
        time_end: NaiveDate,
        value_raw: f64,
        source_text: &str,
    ) -> anyhow::Result<()> {
        let mut rows = self.load()?;

        let existing = rows.iter_mut().find(|row| {
            row.region == region
                && row.code == code
                && row.time_start == time_start
                && row.time_end == time_end
        });

        match existing {
            Some(row) => {
                debug!("Overwriting indicator {}/{}", region, code);
                row.value_raw = value_raw;
                row.source = source_text.to_string();
            }
            None => rows.push(Indicator {
                region: region.to_string(),
                code: code.to_string(),
                time_start,
                time_end,
                value_raw,
                value_norm: None,
                source: source_text.to_string(),
            }),
        }

        self.store(&rows)
    }
}
