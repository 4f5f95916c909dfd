// src/resolver.rs - Alarm table column synonyms and severity vocabulary
//
// Alarm exports from the monitoring system use localized headers
// (`友好名称`, `告警等级`) where hand-written tables use `name` / `type`.
// This module maps both onto the same logical columns before any row is read.

use crate::config::FeedConfig;
use crate::device::DeviceStatus;
use crate::error::{Result, TopoError};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Canonical device name column of the alarm table
pub const NAME_COLUMN: &str = "name";
/// Canonical severity column of the alarm table
pub const SEVERITY_COLUMN: &str = "type";
/// Canonical signal name column of the alarm table
pub const SIGNAL_COLUMN: &str = "signal_name";

/// Positions of the logical columns inside a header row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedColumns {
    pub name: usize,
    pub severity: usize,
    pub signal: usize,
}

/// Maps header variants onto the logical alarm columns
#[derive(Debug, Clone, Copy)]
pub struct ColumnResolver<'a> {
    config: &'a FeedConfig,
}

impl<'a> ColumnResolver<'a> {
    pub fn new(config: &'a FeedConfig) -> Self {
        Self { config }
    }

    /// Locate every logical column. A canonical header always wins over its synonym.
    pub fn resolve<S: AsRef<str>>(&self, headers: &[S], path: &Path) -> Result<ResolvedColumns> {
        let name = locate(headers, NAME_COLUMN, &self.config.name_synonym).ok_or_else(|| {
            TopoError::MissingJoinColumn {
                path: path.to_path_buf(),
                canonical: NAME_COLUMN.to_string(),
                synonym: self.config.name_synonym.clone(),
            }
        })?;

        let severity = locate(headers, SEVERITY_COLUMN, &self.config.severity_synonym)
            .ok_or_else(|| TopoError::MissingSeverityColumn {
                path: path.to_path_buf(),
                canonical: SEVERITY_COLUMN.to_string(),
                synonym: self.config.severity_synonym.clone(),
            })?;

        let signal = locate(headers, SIGNAL_COLUMN, &self.config.signal_column).ok_or_else(|| {
            TopoError::MalformedSchema {
                path: path.to_path_buf(),
                reason: format!(
                    "missing '{}' or '{}' column",
                    SIGNAL_COLUMN, self.config.signal_column
                ),
            }
        })?;

        Ok(ResolvedColumns { name, severity, signal })
    }

    pub fn vocabulary(&self) -> SeverityVocabulary<'a> {
        SeverityVocabulary::new(self.config)
    }
}

fn locate<S: AsRef<str>>(headers: &[S], canonical: &str, synonym: &str) -> Option<usize> {
    let position = |wanted: &str| headers.iter().position(|h| h.as_ref().trim() == wanted);
    position(canonical).or_else(|| position(synonym))
}

/// Severity of an alarm record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Severity {
    /// High severity label, drives the device to `error`
    Critical,
    /// Medium severity label, drives the device to `warning`
    Major,
    /// Anything else; the record is still played back
    Unrecognized,
}

impl Severity {
    /// Status the device takes, `None` when the status is left alone
    pub fn status(&self) -> Option<DeviceStatus> {
        match self {
            Severity::Critical => Some(DeviceStatus::Error),
            Severity::Major => Some(DeviceStatus::Warning),
            Severity::Unrecognized => None,
        }
    }
}

/// The two recognized severity labels
#[derive(Debug, Clone, Copy)]
pub struct SeverityVocabulary<'a> {
    critical: &'a str,
    major: &'a str,
}

impl<'a> SeverityVocabulary<'a> {
    pub fn new(config: &'a FeedConfig) -> Self {
        Self {
            critical: config.critical_label.trim(),
            major: config.major_label.trim(),
        }
    }

    pub fn classify(&self, label: &str) -> Severity {
        match label.trim() {
            l if l == self.critical => Severity::Critical,
            l if l == self.major => Severity::Major,
            _ => Severity::Unrecognized,
        }
    }
}
