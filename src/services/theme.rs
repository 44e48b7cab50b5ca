//! Popup colors, taken from the wallust palette when one is present.

use anyhow::Result;
use ratatui::style::Color;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// The subset of a wallust `colors-original.json` the popup uses.
#[derive(Debug, Clone, Deserialize)]
struct WallustColors {
    background: String,
    foreground: String,
    color3: String,
    color6: String,
    color8: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Theme {
    pub background: Color,
    pub foreground: Color,
    /// Border and icon color.
    pub accent: Color,
    /// Hints, disabled navigation, the status line.
    pub muted: Color,
    /// Background of the highlighted row.
    pub highlight: Color,
}

impl Theme {
    /// Load the wallust palette, falling back to terminal defaults.
    pub fn load() -> Self {
        let path = Self::colors_path();
        if path.exists() {
            Self::from_file(&path).unwrap_or_default()
        } else {
            Self::default()
        }
    }

    fn colors_path() -> PathBuf {
        dirs::cache_dir()
            .unwrap_or_else(|| PathBuf::from("/tmp"))
            .join("wallust")
            .join("colors-original.json")
    }

    fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let colors: WallustColors = serde_json::from_str(&content)?;
        Ok(Self {
            background: parse_hex(&colors.background),
            foreground: parse_hex(&colors.foreground),
            accent: parse_hex(&colors.color6),
            muted: parse_hex(&colors.color8),
            highlight: parse_hex(&colors.color3),
        })
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            background: Color::Reset,
            foreground: Color::White,
            accent: Color::Cyan,
            muted: Color::DarkGray,
            highlight: Color::DarkGray,
        }
    }
}

/// Parse "#RRGGBB" into a ratatui color.
fn parse_hex(hex: &str) -> Color {
    let hex = hex.trim_start_matches('#');
    if hex.len() != 6 || !hex.is_ascii() {
        return Color::White;
    }

    let r = u8::from_str_radix(&hex[0..2], 16).unwrap_or(255);
    let g = u8::from_str_radix(&hex[2..4], 16).unwrap_or(255);
    let b = u8::from_str_radix(&hex[4..6], 16).unwrap_or(255);

    Color::Rgb(r, g, b)
}
