//! Configuration management.
//!
//! Settings come from an optional file (JSON or TOML, picked by extension)
//! and are folded together with `CODEXPOPCLIP_*` environment overrides into
//! one [`EffectiveSettings`] snapshot before anything starts. A missing or
//! malformed file, or a malformed individual value, falls back to defaults.

use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use tracing::{info, warn};

use crate::models::ExternalActionSpec;
use crate::utils::expand_path;

/// Quiet period before a burst of change notifications is evaluated.
pub const DEBOUNCE_QUIET: Duration = Duration::from_millis(120);
/// Delay before polling resumes after a popup closes.
pub const POLL_REARM_COOLDOWN: Duration = Duration::from_millis(300);
/// Focus-loss events this soon after showing are the popup's own doing.
pub const FOCUS_GRACE: Duration = Duration::from_millis(200);
/// Minimum gap between a popup closing and the next one opening.
pub const POPUP_COOLDOWN: Duration = Duration::from_millis(800);
/// Upper bound on one fallback reader invocation.
pub const FALLBACK_TIMEOUT: Duration = Duration::from_millis(200);

const APP_DIR: &str = "codexpopclip";
const ENV_PREFIX: &str = "CODEXPOPCLIP_";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("{path}: expected a top-level object")]
    NotAnObject { path: PathBuf },
}

/// Which side(s) the external fallback reader is asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackMode {
    /// Only the primary selection.
    Primary,
    /// Only the regular clipboard.
    Clipboard,
    Both,
}

impl FallbackMode {
    pub fn reads_clipboard(self) -> bool {
        self != FallbackMode::Primary
    }

    pub fn reads_selection(self) -> bool {
        self != FallbackMode::Clipboard
    }
}

impl FromStr for FallbackMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "primary" | "selection" => Ok(FallbackMode::Primary),
            "clipboard" => Ok(FallbackMode::Clipboard),
            "both" => Ok(FallbackMode::Both),
            other => Err(format!("unknown fallback reader mode '{}'", other)),
        }
    }
}

/// Minimum severity that reaches the log sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// `EnvFilter` directive for this level.
    pub fn filter_directive(self) -> String {
        let level = match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        };
        format!("codexpopclip={},warn", level)
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "debug" | "trace" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warning" | "warn" => Ok(LogLevel::Warn),
            "critical" | "error" | "fatal" => Ok(LogLevel::Error),
            other => Err(format!("unknown log level '{}'", other)),
        }
    }
}

/// Settings as found in the file; `None` means "not given or not usable".
#[derive(Debug, Default, Clone, PartialEq)]
pub struct SettingsFile {
    pub poll_enabled: Option<bool>,
    pub poll_interval_ms: Option<u64>,
    pub fallback_reader_enabled: Option<bool>,
    pub fallback_reader_mode: Option<FallbackMode>,
    pub actions_per_page: Option<usize>,
    pub log_level: Option<LogLevel>,
}

impl SettingsFile {
    /// Load settings from the default location, if a file exists there.
    pub fn load() -> Result<Option<(Self, PathBuf)>, ConfigError> {
        match first_existing(&config_dir(), "settings") {
            Some(path) => Self::from_file(&path).map(|s| Some((s, path))),
            None => Ok(None),
        }
    }

    /// Load settings from a specific file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let document = read_document(path)?;
        let object = document.as_object().ok_or_else(|| ConfigError::NotAnObject {
            path: path.to_path_buf(),
        })?;
        Ok(Self::from_object(object))
    }

    fn from_object(obj: &Map<String, Value>) -> Self {
        Self {
            poll_enabled: lookup(obj, &["poll", "poll_enabled"]).and_then(Value::as_bool),
            poll_interval_ms: lookup(obj, &["poll_ms", "poll_interval_ms"])
                .and_then(positive_number),
            fallback_reader_enabled: lookup(obj, &["wlpaste", "fallback_reader_enabled"])
                .and_then(Value::as_bool),
            fallback_reader_mode: lookup(obj, &["wlpaste_mode", "fallback_reader_mode"])
                .and_then(Value::as_str)
                .and_then(|s| s.parse().ok()),
            actions_per_page: lookup(obj, &["icons_per_row", "actions_per_page"])
                .and_then(positive_number)
                .map(|n| n as usize),
            log_level: lookup(obj, &["log_level"])
                .and_then(Value::as_str)
                .and_then(|s| s.parse().ok()),
        }
    }
}

/// The configuration every component runs with. Built once, never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct EffectiveSettings {
    pub poll_enabled: bool,
    pub poll_interval_ms: u64,
    pub fallback_reader_enabled: bool,
    pub fallback_reader_mode: FallbackMode,
    pub actions_per_page: usize,
    pub log_level: LogLevel,
    /// Log every poll read, not only changes.
    pub trace: bool,
}

impl Default for EffectiveSettings {
    fn default() -> Self {
        Self {
            poll_enabled: false,
            poll_interval_ms: 1500,
            fallback_reader_enabled: false,
            fallback_reader_mode: FallbackMode::Primary,
            actions_per_page: 10,
            log_level: LogLevel::Info,
            trace: false,
        }
    }
}

impl EffectiveSettings {
    /// Fold the file values and the process environment together.
    pub fn from_env(file: &SettingsFile) -> Self {
        Self::resolve(file, |name| std::env::var(name).ok())
    }

    /// Fold `file` and the variables visible through `env`; the environment wins.
    pub fn resolve(file: &SettingsFile, env: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let var = |name: &str| env(&format!("{}{}", ENV_PREFIX, name));

        let mut settings = Self {
            poll_enabled: file.poll_enabled.unwrap_or(defaults.poll_enabled),
            poll_interval_ms: file.poll_interval_ms.unwrap_or(defaults.poll_interval_ms),
            fallback_reader_enabled: file
                .fallback_reader_enabled
                .unwrap_or(defaults.fallback_reader_enabled),
            fallback_reader_mode: file
                .fallback_reader_mode
                .unwrap_or(defaults.fallback_reader_mode),
            actions_per_page: file.actions_per_page.unwrap_or(defaults.actions_per_page),
            log_level: file.log_level.unwrap_or(defaults.log_level),
            trace: defaults.trace,
        };

        if let Some(value) = var("POLL") {
            settings.poll_enabled = env_flag(&value);
        }
        if let Some(ms) = var("POLL_MS").and_then(|v| v.trim().parse::<u64>().ok()) {
            if ms > 0 {
                settings.poll_interval_ms = ms;
            }
        }
        if let Some(value) = var("WLPASTE") {
            settings.fallback_reader_enabled = env_flag(&value);
        }
        if let Some(mode) = var("WLPASTE_MODE").and_then(|v| v.parse().ok()) {
            settings.fallback_reader_mode = mode;
        }
        if let Some(n) = var("ACTIONS_PER_PAGE").and_then(|v| v.trim().parse::<usize>().ok()) {
            if n > 0 {
                settings.actions_per_page = n;
            }
        }
        if let Some(level) = var("LOG_LEVEL").and_then(|v| v.parse().ok()) {
            settings.log_level = level;
        }
        if let Some(value) = var("TRACE") {
            settings.trace = env_flag(&value);
        }

        settings
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Load external actions from the default location; none when absent.
pub fn load_actions() -> Result<Vec<ExternalActionSpec>, ConfigError> {
    match first_existing(&config_dir(), "actions") {
        Some(path) => load_actions_from(&path),
        None => {
            info!(dir = %config_dir().display(), "no external actions config");
            Ok(Vec::new())
        }
    }
}

/// Load external actions from a specific file, skipping unusable entries.
pub fn load_actions_from(path: &Path) -> Result<Vec<ExternalActionSpec>, ConfigError> {
    let document = read_document(path)?;
    let object = document.as_object().ok_or_else(|| ConfigError::NotAnObject {
        path: path.to_path_buf(),
    })?;

    let entries = object
        .get("actions")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();

    let mut actions = Vec::with_capacity(entries.len());
    for (position, entry) in entries.into_iter().enumerate() {
        let spec: ExternalActionSpec = match serde_json::from_value(entry) {
            Ok(spec) => spec,
            Err(e) => {
                warn!(position, error = %e, "skipping malformed action");
                continue;
            }
        };
        if spec.label.is_empty() || spec.command.is_empty() {
            warn!(position, "skipping action with missing label or command");
            continue;
        }
        actions.push(spec);
    }

    info!(path = %path.display(), count = actions.len(), "loaded external actions");
    Ok(actions)
}

/// Directory holding `settings.*` and `actions.*`.
pub fn config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from(expand_path("~/.config")))
        .join(APP_DIR)
}

fn first_existing(dir: &Path, stem: &str) -> Option<PathBuf> {
    ["json", "toml"]
        .iter()
        .map(|ext| dir.join(format!("{}.{}", stem, ext)))
        .find(|p| p.exists())
}

/// Read a JSON or TOML file into a JSON value tree.
fn read_document(path: &Path) -> Result<Value, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let parse_error = |message: String| ConfigError::Parse {
        path: path.to_path_buf(),
        message,
    };

    let is_toml = path.extension().and_then(|e| e.to_str()) == Some("toml");
    if is_toml {
        let value: toml::Value = toml::from_str(&content).map_err(|e| parse_error(e.to_string()))?;
        serde_json::to_value(value).map_err(|e| parse_error(e.to_string()))
    } else {
        serde_json::from_str(&content).map_err(|e| parse_error(e.to_string()))
    }
}

fn lookup<'a>(obj: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|k| obj.get(*k))
}

/// Accepts numbers and numeric strings; zero and negatives are unusable.
fn positive_number(value: &Value) -> Option<u64> {
    let n = match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    };
    n.filter(|n| *n > 0)
}

fn env_flag(value: &str) -> bool {
    !matches!(
        value.trim().to_lowercase().as_str(),
        "" | "0" | "false" | "no" | "off"
    )
}
