// src/snapshot.rs - Registry snapshots written after every playback step
use crate::device::DeviceRegistry;
use crate::error::{Result, TopoError};
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;

/// Destination for registry snapshots
pub trait SnapshotSink {
    /// Persist the full registry. An error aborts the current run.
    fn write(&mut self, registry: &DeviceRegistry) -> Result<()>;
}

/// Writes the registry as CSV, replacing the destination atomically.
///
/// Content goes to a temporary file in the destination directory which is then
/// renamed over the destination, so readers of the device table only ever see
/// a complete file.
#[derive(Debug, Clone)]
pub struct CsvSnapshot {
    destination: PathBuf,
    written: usize,
}

impl CsvSnapshot {
    pub fn new(destination: impl Into<PathBuf>) -> Self {
        Self {
            destination: destination.into(),
            written: 0,
        }
    }

    pub fn destination(&self) -> &Path {
        &self.destination
    }

    /// Snapshots written so far
    pub fn written(&self) -> usize {
        self.written
    }
}

impl SnapshotSink for CsvSnapshot {
    fn write(&mut self, registry: &DeviceRegistry) -> Result<()> {
        write_snapshot(registry, &self.destination)?;
        self.written += 1;
        debug!(
            "Snapshot #{} written to {}",
            self.written,
            self.destination.display()
        );
        Ok(())
    }
}

/// Serialize `registry` to `destination`.
pub fn write_snapshot(registry: &DeviceRegistry, destination: &Path) -> Result<()> {
    let sink_err = |e: &dyn fmt::Display| TopoError::SinkUnavailable {
        path: destination.to_path_buf(),
        reason: e.to_string(),
    };

    let dir = match destination.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| sink_err(&e))?;

    {
        let mut writer = csv::Writer::from_writer(tmp.as_file_mut());
        writer
            .write_record(registry.columns())
            .map_err(|e| sink_err(&e))?;
        for record in registry.records() {
            writer
                .write_record(registry.columns().iter().map(|c| record.field(c)))
                .map_err(|e| sink_err(&e))?;
        }
        writer.flush().map_err(|e| sink_err(&e))?;
    }

    if let Some(permissions) = snapshot_permissions(destination).map_err(|e| sink_err(&e))? {
        tmp.as_file()
            .set_permissions(permissions)
            .map_err(|e| sink_err(&e))?;
    }
    tmp.as_file_mut().sync_all().map_err(|e| sink_err(&e))?;
    tmp.persist(destination).map_err(|e| sink_err(&e.error))?;
    Ok(())
}

/// Mode for the replacement file: that of the table being replaced, or 0644
/// for a new table instead of the owner-only mode of temporary files.
fn snapshot_permissions(destination: &Path) -> io::Result<Option<fs::Permissions>> {
    match fs::metadata(destination) {
        Ok(metadata) => Ok(Some(metadata.permissions())),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(new_table_permissions()),
        Err(e) => Err(e),
    }
}

#[cfg(unix)]
fn new_table_permissions() -> Option<fs::Permissions> {
    use std::os::unix::fs::PermissionsExt;
    Some(fs::Permissions::from_mode(0o644))
}

#[cfg(not(unix))]
fn new_table_permissions() -> Option<fs::Permissions> {
    None
}
