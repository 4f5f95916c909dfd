// src/config.rs - Process configuration for the viewer and the simulation engine

use crate::error::{Result, TopoError};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

// ============================================================================
// MAIN CONFIGURATION
// ============================================================================

/// Main topoview configuration
///
/// Loaded once at startup and shared read-only afterwards. Every section has
/// defaults, so an empty YAML document is a valid configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// HTTP server settings
    #[serde(default)]
    pub server: ServerConfig,

    /// File system layout
    #[serde(default)]
    pub paths: PathsConfig,

    /// Ordinary alarm playback
    #[serde(default)]
    pub playback: PlaybackConfig,

    /// Power-off scenario
    #[serde(default)]
    pub power_off: PowerOffConfig,

    /// Alarm table vocabulary
    #[serde(default)]
    pub feed: FeedConfig,
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            TopoError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_yaml(&text)
    }

    /// Parse configuration from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject vocabularies the engine cannot work with
    pub fn validate(&self) -> Result<()> {
        let feed = &self.feed;
        for (label, value) in [
            ("feed.name_synonym", &feed.name_synonym),
            ("feed.severity_synonym", &feed.severity_synonym),
            ("feed.signal_column", &feed.signal_column),
            ("feed.critical_label", &feed.critical_label),
            ("feed.major_label", &feed.major_label),
        ] {
            if value.trim().is_empty() {
                return Err(TopoError::Config(format!("{} must not be empty", label)));
            }
        }
        if feed.critical_label.trim() == feed.major_label.trim() {
            return Err(TopoError::Config(format!(
                "feed.critical_label and feed.major_label are both '{}'",
                feed.critical_label
            )));
        }
        if self.power_off.power_input_type.is_empty() {
            return Err(TopoError::Config(
                "power_off.power_input_type must not be empty".into(),
            ));
        }
        Ok(())
    }

    /// Resolve a configured path against `paths.root`
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.paths.root.join(path)
        }
    }

    pub fn device_csv(&self) -> PathBuf {
        self.resolve(&self.paths.device_csv)
    }

    pub fn alarm_csv(&self) -> PathBuf {
        self.resolve(&self.paths.alarm_csv)
    }

    pub fn saved_topology_dir(&self) -> PathBuf {
        self.resolve(&self.paths.saved_topology_dir)
    }

    /// Destination of ordinary playback snapshots.
    ///
    /// Without an explicit `playback.snapshot_path` this is the sibling of the
    /// device table with `_new` before the extension, so ordinary playback
    /// never rewrites its own input.
    pub fn playback_snapshot(&self) -> PathBuf {
        match &self.playback.snapshot_path {
            Some(path) => self.resolve(path),
            None => sibling_path(&self.device_csv(), "_new"),
        }
    }

    /// Power-off snapshots overwrite the device table in place.
    pub fn power_off_snapshot(&self) -> PathBuf {
        self.device_csv()
    }
}

/// `dir/name.ext` -> `dir/name{suffix}.ext`
pub fn sibling_path(path: &Path, suffix: &str) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let file_name = match path.extension() {
        Some(ext) => format!("{}{}.{}", stem, suffix, ext.to_string_lossy()),
        None => format!("{}{}", stem, suffix),
    };
    path.with_file_name(file_name)
}

// ============================================================================
// SERVER CONFIGURATION
// ============================================================================

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address to bind the HTTP listener
    #[serde(default = "default_bind")]
    pub bind: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { bind: default_bind() }
    }
}

// ============================================================================
// PATHS CONFIGURATION
// ============================================================================

/// File system layout. Relative entries are resolved against `root`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Directory served as static content
    #[serde(default = "default_root")]
    pub root: PathBuf,

    /// Page served for `/`
    #[serde(default = "default_index_html")]
    pub index_html: PathBuf,

    /// Directory holding saved topology JSON files
    #[serde(default = "default_saved_topology_dir")]
    pub saved_topology_dir: PathBuf,

    /// Device inventory table
    #[serde(default = "default_device_csv")]
    pub device_csv: PathBuf,

    /// Alarm history table
    #[serde(default = "default_alarm_csv")]
    pub alarm_csv: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            index_html: default_index_html(),
            saved_topology_dir: default_saved_topology_dir(),
            device_csv: default_device_csv(),
            alarm_csv: default_alarm_csv(),
        }
    }
}

// ============================================================================
// SCENARIO CONFIGURATION
// ============================================================================

/// Ordinary playback configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaybackConfig {
    /// Pause after each step in milliseconds
    #[serde(default = "default_playback_delay")]
    pub step_delay_ms: u64,

    /// Snapshot destination (defaults to `<device_csv>_new.csv`)
    #[serde(default)]
    pub snapshot_path: Option<PathBuf>,
}

impl PlaybackConfig {
    pub fn step_delay(&self) -> Duration {
        Duration::from_millis(self.step_delay_ms)
    }
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            step_delay_ms: default_playback_delay(),
            snapshot_path: None,
        }
    }
}

/// Power-off scenario configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PowerOffConfig {
    /// Pause after each step in milliseconds
    #[serde(default = "default_power_off_delay")]
    pub step_delay_ms: u64,

    /// `type` value of the power-input devices forced into error
    #[serde(default = "default_power_input_type")]
    pub power_input_type: String,

    /// `error_info` given to power-input devices
    #[serde(default = "default_power_input_message")]
    pub power_input_message: String,

    /// `notes` value marking the standby supply path
    #[serde(default = "default_standby_notes")]
    pub standby_notes: String,

    /// `error_info` given to standby-path devices
    #[serde(default = "default_standby_message")]
    pub standby_message: String,
}

impl PowerOffConfig {
    pub fn step_delay(&self) -> Duration {
        Duration::from_millis(self.step_delay_ms)
    }
}

impl Default for PowerOffConfig {
    fn default() -> Self {
        Self {
            step_delay_ms: default_power_off_delay(),
            power_input_type: default_power_input_type(),
            power_input_message: default_power_input_message(),
            standby_notes: default_standby_notes(),
            standby_message: default_standby_message(),
        }
    }
}

// ============================================================================
// ALARM FEED CONFIGURATION
// ============================================================================

/// Column synonyms and severity vocabulary of the alarm table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    /// Accepted in place of the `name` column
    #[serde(default = "default_name_synonym")]
    pub name_synonym: String,

    /// Accepted in place of the `type` (severity) column
    #[serde(default = "default_severity_synonym")]
    pub severity_synonym: String,

    /// Signal name column
    #[serde(default = "default_signal_column")]
    pub signal_column: String,

    /// Label that drives a device to `error`
    #[serde(default = "default_critical_label")]
    pub critical_label: String,

    /// Label that drives a device to `warning`
    #[serde(default = "default_major_label")]
    pub major_label: String,

    /// Placed between the severity label and the signal name in `error_info`
    #[serde(default = "default_info_separator")]
    pub info_separator: String,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            name_synonym: default_name_synonym(),
            severity_synonym: default_severity_synonym(),
            signal_column: default_signal_column(),
            critical_label: default_critical_label(),
            major_label: default_major_label(),
            info_separator: default_info_separator(),
        }
    }
}

// ============================================================================
// DEFAULT VALUE FUNCTIONS
// ============================================================================

fn default_bind() -> SocketAddr { SocketAddr::from(([0, 0, 0, 0], 3000)) }
fn default_root() -> PathBuf { PathBuf::from(".") }
fn default_index_html() -> PathBuf { PathBuf::from("static/index.html") }
fn default_saved_topology_dir() -> PathBuf { PathBuf::from("saved_topologies") }
fn default_device_csv() -> PathBuf { PathBuf::from("static/data/device_info.csv") }
fn default_alarm_csv() -> PathBuf { PathBuf::from("static/data/alarms.csv") }
fn default_playback_delay() -> u64 { 10_000 }
fn default_power_off_delay() -> u64 { 3_000 }
fn default_power_input_type() -> String { "高压输入".to_string() }
fn default_power_input_message() -> String { "市电停电".to_string() }
fn default_standby_notes() -> String { "市电备路".to_string() }
fn default_standby_message() -> String { "等待切换".to_string() }
fn default_name_synonym() -> String { "友好名称".to_string() }
fn default_severity_synonym() -> String { "告警等级".to_string() }
fn default_signal_column() -> String { "信号名称".to_string() }
fn default_critical_label() -> String { "严重告警".to_string() }
fn default_major_label() -> String { "主要告警".to_string() }
fn default_info_separator() -> String { "，信号名称：".to_string() }
