//! Menu actions and the user-defined command templates behind them.

use serde::Deserialize;
use std::path::PathBuf;

use super::ClipboardSlot;
use crate::utils::expand_path;

/// A user-defined command template, as declared in the actions file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ExternalActionSpec {
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub command: String,
    /// Argument tokens; any `{text}` inside a token is replaced at dispatch.
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

#[cfg(test)]
impl ExternalActionSpec {
    pub fn new(label: &str, command: &str, args: &[&str]) -> Self {
        Self {
            label: label.to_string(),
            command: command.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
            icon: None,
            enabled: true,
        }
    }
}

/// What an action does once chosen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionEffect {
    /// Write `text` into `slot` (suppressing the resulting echo).
    SetText { slot: ClipboardSlot, text: String },
    /// Start `command` detached with already-expanded arguments.
    Launch { command: String, args: Vec<String> },
}

/// One entry of the popup, bound to the captured text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuAction {
    pub label: String,
    pub effect: ActionEffect,
    pub enabled: bool,
    pub icon: Option<IconSpec>,
}

impl MenuAction {
    pub fn new(label: &str, effect: ActionEffect) -> Self {
        Self {
            label: label.to_string(),
            effect,
            enabled: true,
            icon: None,
        }
    }

    pub fn with_icon(mut self, icon: Option<IconSpec>) -> Self {
        self.icon = icon;
        self
    }
}

/// Where an action's icon comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IconSpec {
    /// A built-in standard icon, written `sp:<Name>`.
    Standard(String),
    /// An image on disk (`file:` URL, `~/...` or an absolute path).
    File(PathBuf),
    /// A name looked up in the desktop icon theme.
    Theme(String),
}

impl IconSpec {
    /// Parse an icon spec string. Empty strings carry no icon.
    pub fn parse(spec: &str) -> Option<Self> {
        let spec = spec.trim();
        if spec.is_empty() {
            return None;
        }
        if let Some(name) = spec.strip_prefix("sp:") {
            return Some(IconSpec::Standard(name.to_string()));
        }
        if let Some(path) = spec.strip_prefix("file://") {
            return Some(IconSpec::File(PathBuf::from(path)));
        }
        if let Some(path) = spec.strip_prefix("file:") {
            return Some(IconSpec::File(PathBuf::from(path)));
        }
        if spec.starts_with('~') || spec.starts_with('/') {
            return Some(IconSpec::File(PathBuf::from(expand_path(spec))));
        }
        Some(IconSpec::Theme(spec.to_string()))
    }
}
