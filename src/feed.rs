// src/feed.rs - Ordered alarm feed read from the alarm history table
use crate::config::FeedConfig;
use crate::device::{malformed, source_unavailable};
use crate::error::Result;
use crate::resolver::{ColumnResolver, Severity};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// One alarm row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlarmRecord {
    /// Joined against `DeviceRecord::name`
    pub device_name: String,
    /// Severity label exactly as exported
    pub severity_label: String,
    pub severity: Severity,
    pub signal_name: String,
}

impl AlarmRecord {
    /// `error_info` text this alarm puts on its device
    pub fn describe(&self, separator: &str) -> String {
        format!("{}{}{}", self.severity_label, separator, self.signal_name)
    }
}

/// Alarm records in table order.
///
/// Nothing is filtered, sorted or deduplicated: rows naming unknown devices are
/// kept and surface as unmatched steps during playback.
#[derive(Debug, Clone, Default)]
pub struct AlarmFeed {
    records: Vec<AlarmRecord>,
}

impl AlarmFeed {
    pub fn from_records(records: Vec<AlarmRecord>) -> Self {
        Self { records }
    }

    pub fn load(path: impl AsRef<Path>, config: &FeedConfig) -> Result<Self> {
        let path = path.as_ref();
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_path(path)
            .map_err(|e| source_unavailable(path, e))?;

        let headers: Vec<String> = reader
            .headers()
            .map_err(|e| malformed(path, e))?
            .iter()
            .map(|h| h.trim_start_matches('\u{feff}').to_string())
            .collect();

        let resolver = ColumnResolver::new(config);
        let columns = resolver.resolve(&headers, path)?;
        let vocabulary = resolver.vocabulary();

        let mut records = Vec::new();
        for result in reader.records() {
            let raw = result.map_err(|e| malformed(path, e))?;
            let cell = |index: usize| raw.get(index).unwrap_or("").to_string();
            let severity_label = cell(columns.severity);
            records.push(AlarmRecord {
                device_name: cell(columns.name),
                severity: vocabulary.classify(&severity_label),
                severity_label,
                signal_name: cell(columns.signal),
            });
        }

        debug!("Loaded {} alarms from {}", records.len(), path.display());
        Ok(Self { records })
    }

    pub fn records(&self) -> &[AlarmRecord] {
        &self.records
    }

    pub fn get(&self, index: usize) -> Option<&AlarmRecord> {
        self.records.get(index)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &AlarmRecord> {
        self.records.iter()
    }
}
