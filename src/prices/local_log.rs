//! Append-only CSV price log, one file per symbol

use rust_decimal::Decimal;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::common::errors::Result;
use crate::common::types::{validate_symbol, PricePoint};

const FILE_SUFFIX: &str = "_prices.csv";
const HEADER: [&str; 3] = ["timestamp", "price", "datetime"];

/// Durable local price sequence
///
/// Rows are appended in call order and never reordered on write. The
/// `datetime` column is informational and ignored when reading.
#[derive(Debug, Clone)]
pub struct LocalPriceLog {
    base_path: PathBuf,
}

impl LocalPriceLog {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    fn csv_path(&self, symbol: &str) -> Result<PathBuf> {
        validate_symbol(symbol)?;
        Ok(self
            .base_path
            .join(format!("{}{}", symbol.to_lowercase(), FILE_SUFFIX)))
    }

    /// Append one point, creating the file (with header) on first write
    pub fn append(&self, point: &PricePoint) -> Result<()> {
        let path = self.csv_path(&point.symbol)?;
        fs::create_dir_all(&self.base_path)?;
        let needs_header = fs::metadata(&path).map(|m| m.len() == 0).unwrap_or(true);

        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let mut writer = csv::Writer::from_writer(file);
        if needs_header {
            writer.write_record(HEADER)?;
        }

        let datetime = point
            .datetime()
            .map(|dt| dt.to_rfc3339())
            .unwrap_or_default();
        writer.write_record([
            point.timestamp_ms.to_string(),
            point.price.to_string(),
            datetime,
        ])?;
        writer.flush()?;
        Ok(())
    }

    /// All points for a symbol, in file order
    pub fn read_all(&self, symbol: &str) -> Result<Vec<PricePoint>> {
        let path = self.csv_path(symbol)?;
        if !path.exists() {
            return Ok(Vec::new());
        }
        Self::read_file(&path, symbol)
    }

    /// Points at or after `start_ms`, in file order
    pub fn read_since(&self, symbol: &str, start_ms: i64) -> Result<Vec<PricePoint>> {
        Ok(self
            .read_all(symbol)?
            .into_iter()
            .filter(|p| p.timestamp_ms >= start_ms)
            .collect())
    }

    /// Last appended point
    pub fn latest(&self, symbol: &str) -> Result<Option<PricePoint>> {
        Ok(self.read_all(symbol)?.pop())
    }

    /// Drop points older than `cutoff_ms` from every symbol file
    ///
    /// Each file is rewritten through a temporary sibling and renamed into
    /// place. Returns the number of points removed.
    pub fn prune_before(&self, cutoff_ms: i64) -> Result<usize> {
        if !self.base_path.exists() {
            return Ok(0);
        }

        let mut removed = 0;
        for entry in fs::read_dir(&self.base_path)? {
            let path = entry?.path();
            let Some(symbol) = path
                .file_name()
                .and_then(|n| n.to_str())
                .and_then(|n| n.strip_suffix(FILE_SUFFIX))
                .map(|s| s.to_uppercase())
            else {
                continue;
            };

            let points = Self::read_file(&path, &symbol)?;
            let (kept, dropped): (Vec<_>, Vec<_>) =
                points.into_iter().partition(|p| p.timestamp_ms >= cutoff_ms);
            if dropped.is_empty() {
                continue;
            }

            Self::rewrite(&path, &kept)?;
            debug!("Pruned {} points from {}", dropped.len(), path.display());
            removed += dropped.len();
        }
        Ok(removed)
    }

    fn rewrite(path: &Path, points: &[PricePoint]) -> Result<()> {
        let tmp_path = path.with_extension("csv.tmp");
        {
            let mut writer = csv::Writer::from_writer(File::create(&tmp_path)?);
            writer.write_record(HEADER)?;
            for point in points {
                let datetime = point
                    .datetime()
                    .map(|dt| dt.to_rfc3339())
                    .unwrap_or_default();
                writer.write_record([
                    point.timestamp_ms.to_string(),
                    point.price.to_string(),
                    datetime,
                ])?;
            }
            writer.flush()?;
        }
        fs::rename(&tmp_path, path)?;
        Ok(())
    }

    fn read_file(path: &Path, symbol: &str) -> Result<Vec<PricePoint>> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_path(path)?;

        let mut points = Vec::new();
        for (line, result) in rdr.records().enumerate() {
            let record = match result {
                Ok(record) => record,
                Err(e) => {
                    warn!("Skipping unreadable row {} in {}: {}", line + 2, path.display(), e);
                    continue;
                }
            };

            let timestamp = record.get(0).and_then(|v| v.trim().parse::<i64>().ok());
            let price = record.get(1).and_then(|v| v.trim().parse::<Decimal>().ok());
            match (timestamp, price) {
                (Some(timestamp_ms), Some(price)) => {
                    points.push(PricePoint::new(symbol, timestamp_ms, price))
                }
                _ => warn!("Skipping malformed row {} in {}", line + 2, path.display()),
            }
        }
        Ok(points)
    }
}
