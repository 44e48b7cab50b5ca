//! Small helpers shared across modules.

/// Expand ~ to home directory.
pub fn expand_path(path: &str) -> String {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest).to_string_lossy().to_string();
        }
    } else if path == "~" {
        if let Some(home) = dirs::home_dir() {
            return home.to_string_lossy().to_string();
        }
    }
    path.to_string()
}

const PREVIEW_CHARS: usize = 80;

/// Single-line, length-capped rendition of clipboard text for log lines.
pub fn preview_text(text: &str) -> String {
    let escaped = text.replace('\n', "\\n").replace('\r', "\\r");
    if escaped.chars().count() > PREVIEW_CHARS {
        let head: String = escaped.chars().take(PREVIEW_CHARS).collect();
        format!("{}...", head)
    } else {
        escaped
    }
}
