// src/device.rs - Device registry loaded from the inventory table
use crate::error::{Result, TopoError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

pub const ID_COLUMN: &str = "id";
pub const NAME_COLUMN: &str = "name";
pub const TYPE_COLUMN: &str = "type";
pub const NOTES_COLUMN: &str = "notes";
pub const STATUS_COLUMN: &str = "status";
pub const ERROR_INFO_COLUMN: &str = "error_info";

/// Derived device state shown by the visualizer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceStatus {
    #[default]
    Normal,
    Warning,
    Error,
}

impl DeviceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceStatus::Normal => "normal",
            DeviceStatus::Warning => "warning",
            DeviceStatus::Error => "error",
        }
    }
}

impl fmt::Display for DeviceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeviceStatus {
    type Err = String;

    /// An empty cell is a device nobody has flagged yet.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim() {
            "" | "normal" => Ok(DeviceStatus::Normal),
            "warning" => Ok(DeviceStatus::Warning),
            "error" => Ok(DeviceStatus::Error),
            other => Err(format!("unknown status '{}'", other)),
        }
    }
}

/// Selector for bulk lookups
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceField {
    Type,
    Notes,
}

/// One row of the device table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceRecord {
    pub id: String,
    pub name: String,
    pub device_type: String,
    pub notes: String,
    pub status: DeviceStatus,
    pub error_info: String,
    /// Columns the engine does not interpret, written back untouched
    pub extra: HashMap<String, String>,
}

impl DeviceRecord {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            device_type: String::new(),
            notes: String::new(),
            status: DeviceStatus::Normal,
            error_info: String::new(),
            extra: HashMap::new(),
        }
    }

    pub fn with_type(mut self, device_type: impl Into<String>) -> Self {
        self.device_type = device_type.into();
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }

    /// Cell value for a table column
    pub fn field(&self, column: &str) -> &str {
        match column {
            ID_COLUMN => &self.id,
            NAME_COLUMN => &self.name,
            TYPE_COLUMN => &self.device_type,
            NOTES_COLUMN => &self.notes,
            STATUS_COLUMN => self.status.as_str(),
            ERROR_INFO_COLUMN => &self.error_info,
            other => self.extra.get(other).map(String::as_str).unwrap_or(""),
        }
    }

    fn matches(&self, field: DeviceField, value: &str) -> bool {
        match field {
            DeviceField::Type => self.device_type == value,
            DeviceField::Notes => self.notes == value,
        }
    }
}

/// In-memory device table.
///
/// Row order and header order are those of the source file so snapshots come
/// out in the same shape. Rows are never added or removed after load.
#[derive(Debug, Clone)]
pub struct DeviceRegistry {
    columns: Vec<String>,
    records: Vec<DeviceRecord>,
}

impl DeviceRegistry {
    /// Build a registry from records, using the standard column layout
    pub fn from_records(records: Vec<DeviceRecord>) -> Self {
        let columns = [
            ID_COLUMN,
            NAME_COLUMN,
            TYPE_COLUMN,
            NOTES_COLUMN,
            STATUS_COLUMN,
            ERROR_INFO_COLUMN,
        ]
        .iter()
        .map(|c| c.to_string())
        .collect();
        Self { columns, records }
    }

    /// Parse a device table.
    ///
    /// `id` and `name` are required. Missing `status`/`error_info` columns are
    /// appended to the header so snapshots always carry them.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_path(path)
            .map_err(|e| source_unavailable(path, e))?;

        let mut columns: Vec<String> = reader
            .headers()
            .map_err(|e| malformed(path, e))?
            .iter()
            .map(|h| h.trim_start_matches('\u{feff}').to_string())
            .collect();

        for required in [ID_COLUMN, NAME_COLUMN] {
            if !columns.iter().any(|c| c == required) {
                return Err(TopoError::MalformedSchema {
                    path: path.to_path_buf(),
                    reason: format!("missing required column '{}'", required),
                });
            }
        }

        let mut records = Vec::new();
        for (row, result) in reader.records().enumerate() {
            let raw = result.map_err(|e| malformed(path, e))?;
            let mut record = DeviceRecord::new("", "");
            // Short rows leave their trailing cells empty
            for (i, column) in columns.iter().enumerate() {
                let value = raw.get(i).unwrap_or("");
                match column.as_str() {
                    ID_COLUMN => record.id = value.to_string(),
                    NAME_COLUMN => record.name = value.to_string(),
                    TYPE_COLUMN => record.device_type = value.to_string(),
                    NOTES_COLUMN => record.notes = value.to_string(),
                    STATUS_COLUMN => {
                        record.status = value.parse().map_err(|reason| {
                            TopoError::MalformedSchema {
                                path: path.to_path_buf(),
                                // +2: header line, 1-based rows
                                reason: format!("line {}: {}", row + 2, reason),
                            }
                        })?;
                    }
                    ERROR_INFO_COLUMN => record.error_info = value.to_string(),
                    other => {
                        record.extra.insert(other.to_string(), value.to_string());
                    }
                }
            }
            records.push(record);
        }

        for derived in [STATUS_COLUMN, ERROR_INFO_COLUMN] {
            if !columns.iter().any(|c| c == derived) {
                columns.push(derived.to_string());
            }
        }

        debug!("Loaded {} devices from {}", records.len(), path.display());
        Ok(Self { columns, records })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn records(&self) -> &[DeviceRecord] {
        &self.records
    }

    pub fn get(&self, index: usize) -> Option<&DeviceRecord> {
        self.records.get(index)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// First record whose `name` equals `name`
    pub fn find_by_name(&self, name: &str) -> Option<usize> {
        self.records.iter().position(|r| r.name == name)
    }

    /// Every record whose `field` equals `value` exactly
    pub fn find_by_predicate(&self, field: DeviceField, value: &str) -> Vec<usize> {
        self.records
            .iter()
            .enumerate()
            .filter(|(_, r)| r.matches(field, value))
            .map(|(i, _)| i)
            .collect()
    }

    pub fn set_status(
        &mut self,
        index: usize,
        status: DeviceStatus,
        error_info: impl Into<String>,
    ) {
        if let Some(record) = self.records.get_mut(index) {
            record.status = status;
            record.error_info = error_info.into();
        }
    }

    pub fn set_error_info(&mut self, index: usize, error_info: impl Into<String>) {
        if let Some(record) = self.records.get_mut(index) {
            record.error_info = error_info.into();
        }
    }

    /// Return every device to `normal` with no message
    pub fn reset_all(&mut self) {
        for record in &mut self.records {
            record.status = DeviceStatus::Normal;
            record.error_info.clear();
        }
    }

    /// `id -> status` for every device
    pub fn statuses(&self) -> HashMap<String, DeviceStatus> {
        self.records
            .iter()
            .map(|r| (r.id.clone(), r.status))
            .collect()
    }
}

/// Read a table verbatim as header -> cell maps, one per row.
///
/// Cells missing from short rows come back as empty strings.
pub fn read_rows(
    path: impl AsRef<Path>,
) -> Result<Vec<serde_json::Map<String, serde_json::Value>>> {
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

    let mut rows = Vec::new();
    for result in reader.records() {
        let raw = result.map_err(|e| malformed(path, e))?;
        let row = headers
            .iter()
            .enumerate()
            .map(|(i, h)| {
                let cell = raw.get(i).unwrap_or("");
                (h.clone(), serde_json::Value::String(cell.to_string()))
            })
            .collect();
        rows.push(row);
    }
    Ok(rows)
}

pub(crate) fn source_unavailable(path: &Path, err: impl fmt::Display) -> TopoError {
    TopoError::SourceUnavailable {
        path: PathBuf::from(path),
        reason: err.to_string(),
    }
}

pub(crate) fn malformed(path: &Path, err: impl fmt::Display) -> TopoError {
    TopoError::MalformedSchema {
        path: PathBuf::from(path),
        reason: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_table(dir: &TempDir, content: &str) -> PathBuf {
        let path = dir.path().join("devices.csv");
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_load_preserves_order_and_extra_columns() {
        let dir = TempDir::new().unwrap();
        let path = write_table(
            &dir,
            "id,name,type,rack,notes,status,error_info\n\
             1,UPS-A,高压输入,R1,,normal,\n\
             2,PDU-B,配电,R2,市电备路,warning,过载\n",
        );

        let registry = DeviceRegistry::load(&path).unwrap();
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.columns()[3], "rack");
        assert_eq!(registry.records()[0].name, "UPS-A");
        assert_eq!(registry.records()[1].status, DeviceStatus::Warning);
        assert_eq!(registry.records()[1].field("rack"), "R2");
        assert_eq!(registry.records()[1].field("error_info"), "过载");
    }

    #[test]
    fn test_missing_file_is_source_unavailable() {
        let dir = TempDir::new().unwrap();
        let err = DeviceRegistry::load(dir.path().join("absent.csv")).unwrap_err();
        assert!(matches!(err, TopoError::SourceUnavailable { .. }));
    }

    #[test]
    fn test_missing_identity_column_is_malformed() {
        let dir = TempDir::new().unwrap();
        let path = write_table(&dir, "id,type\n1,x\n");
        let err = DeviceRegistry::load(&path).unwrap_err();
        assert!(matches!(err, TopoError::MalformedSchema { .. }));
    }

    #[test]
    fn test_unknown_status_is_malformed() {
        let dir = TempDir::new().unwrap();
        let path = write_table(&dir, "id,name,status\n1,a,offline\n");
        let err = DeviceRegistry::load(&path).unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn test_derived_columns_appended() {
        let dir = TempDir::new().unwrap();
        let path = write_table(&dir, "id,name\n1,a\n");
        let registry = DeviceRegistry::load(&path).unwrap();
        assert_eq!(registry.columns(), ["id", "name", "status", "error_info"]);
        assert_eq!(registry.records()[0].status, DeviceStatus::Normal);
    }

    #[test]
    fn test_find_by_name_first_match_wins() {
        let registry = DeviceRegistry::from_records(vec![
            DeviceRecord::new("1", "dup"),
            DeviceRecord::new("2", "dup"),
        ]);
        assert_eq!(registry.find_by_name("dup"), Some(0));
        assert_eq!(registry.find_by_name("none"), None);
    }

    #[test]
    fn test_find_by_predicate() {
        let registry = DeviceRegistry::from_records(vec![
            DeviceRecord::new("1", "a").with_type("高压输入"),
            DeviceRecord::new("2", "b").with_notes("市电备路"),
            DeviceRecord::new("3", "c").with_type("高压输入"),
        ]);
        assert_eq!(registry.find_by_predicate(DeviceField::Type, "高压输入"), vec![0, 2]);
        assert_eq!(registry.find_by_predicate(DeviceField::Notes, "市电备路"), vec![1]);
        assert!(registry.find_by_predicate(DeviceField::Notes, "市电").is_empty());
    }

    #[test]
    fn test_reset_all() {
        let mut registry = DeviceRegistry::from_records(vec![
            DeviceRecord::new("1", "a"),
            DeviceRecord::new("2", "b"),
        ]);
        registry.set_status(0, DeviceStatus::Error, "boom");
        registry.set_error_info(1, "pinned");
        registry.reset_all();
        assert!(registry
            .records()
            .iter()
            .all(|r| r.status == DeviceStatus::Normal && r.error_info.is_empty()));
    }

    #[test]
    fn test_short_rows_fill_empty_cells() {
        let dir = TempDir::new().unwrap();
        let path = write_table(
            &dir,
            "id,name,type,notes,status,error_info,rack\n\
             1,A,高压输入,,normal,,R1\n\
             2,B,UPS\n",
        );

        let registry = DeviceRegistry::load(&path).unwrap();
        assert_eq!(registry.len(), 2);
        let short = &registry.records()[1];
        assert_eq!(short.device_type, "UPS");
        assert_eq!(short.status, DeviceStatus::Normal);
        assert_eq!(short.error_info, "");
        assert_eq!(short.field("rack"), "");
        assert_eq!(registry.find_by_predicate(DeviceField::Type, "高压输入"), vec![0]);

        let rows = read_rows(&path).unwrap();
        assert_eq!(rows[1].len(), 7);
        assert_eq!(rows[1]["type"], "UPS");
        assert_eq!(rows[1]["status"], "");
        assert_eq!(rows[1]["rack"], "");
    }

    #[test]
    fn test_read_rows_verbatim() {
        let dir = TempDir::new().unwrap();
        let path = write_table(&dir, "id,name,status\n7,x,\n");
        let rows = read_rows(&path).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["id"], "7");
        assert_eq!(rows[0]["status"], "");
    }
}
