//! Idle view: what is being watched and what happened last.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};
use ratatui_garnish::{GarnishableWidget, Padding};
use std::sync::Arc;

use crate::config::{EffectiveSettings, FallbackMode};
use crate::services::Theme;
use crate::utils::preview_text;

/// Live counters shown under the static settings.
#[derive(Debug, Clone, Default)]
pub struct StatusSnapshot {
    pub polling: bool,
    pub popups_shown: u64,
    pub external_actions: usize,
    pub last_text: Option<String>,
}

pub struct StatusView {
    settings: Arc<EffectiveSettings>,
    theme: Arc<Theme>,
    selection_supported: bool,
}

impl StatusView {
    pub fn new(settings: Arc<EffectiveSettings>, theme: Arc<Theme>, selection_supported: bool) -> Self {
        Self {
            settings,
            theme,
            selection_supported,
        }
    }

    fn lines(&self, snapshot: &StatusSnapshot) -> Vec<Line<'static>> {
        let theme = &self.theme;
        let key = |text: &str| Span::styled(format!("{:<12}", text), Style::default().fg(theme.muted));
        let value = |text: String| Span::styled(text, Style::default().fg(theme.foreground));

        let watching = if self.selection_supported {
            "clipboard + selection"
        } else {
            "clipboard"
        };
        let polling = match (self.settings.poll_enabled, snapshot.polling) {
            (false, _) => "off".to_string(),
            (true, true) => format!("every {} ms", self.settings.poll_interval_ms),
            (true, false) => "paused".to_string(),
        };
        let fallback = if self.settings.fallback_reader_enabled {
            match self.settings.fallback_reader_mode {
                FallbackMode::Primary => "wl-paste (primary)",
                FallbackMode::Clipboard => "wl-paste (clipboard)",
                FallbackMode::Both => "wl-paste (both)",
            }
        } else {
            "off"
        };
        let last = snapshot
            .last_text
            .as_deref()
            .map(preview_text)
            .unwrap_or_else(|| "-".to_string());

        vec![
            Line::from(vec![key("Watching"), value(watching.to_string())]),
            Line::from(vec![key("Polling"), value(polling)]),
            Line::from(vec![key("Fallback"), value(fallback.to_string())]),
            Line::from(vec![
                key("Actions"),
                value(format!("5 built-in, {} external", snapshot.external_actions)),
            ]),
            Line::from(vec![key("Popups"), value(snapshot.popups_shown.to_string())]),
            Line::from(vec![key("Last"), value(last)]),
        ]
    }

    pub fn draw(&self, f: &mut Frame, area: Rect, snapshot: &StatusSnapshot) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(1)])
            .split(area);

        let block = Block::default()
            .borders(Borders::ALL)
            .title(Span::styled(
                " codexpopclip ",
                Style::default()
                    .fg(self.theme.accent)
                    .add_modifier(Modifier::BOLD),
            ))
            .border_style(Style::default().fg(self.theme.muted));
        let body = Paragraph::new(self.lines(snapshot))
            .block(block)
            .wrap(Wrap { trim: true });
        f.render_widget(body.garnish(Padding::horizontal(1)), chunks[0]);

        let hints = Paragraph::new(Line::from(vec![
            Span::raw(" "),
            Span::styled("copy or select text", Style::default().fg(self.theme.muted)),
            Span::raw(" │ "),
            Span::styled("q", Style::default().fg(self.theme.accent)),
            Span::styled(" Quit", Style::default().fg(self.theme.muted)),
        ]));
        f.render_widget(hints, chunks[1]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_of(lines: &[Line]) -> Vec<String> {
        lines
            .iter()
            .map(|line| line.spans.iter().map(|s| s.content.as_ref()).collect())
            .collect()
    }

    #[test]
    fn test_polling_line_reflects_state() {
        let settings = EffectiveSettings {
            poll_enabled: true,
            poll_interval_ms: 750,
            ..EffectiveSettings::default()
        };
        let view = StatusView::new(Arc::new(settings), Arc::new(Theme::default()), true);

        let running = text_of(&view.lines(&StatusSnapshot {
            polling: true,
            ..StatusSnapshot::default()
        }));
        assert!(running[1].ends_with("every 750 ms"));

        let paused = text_of(&view.lines(&StatusSnapshot::default()));
        assert!(paused[1].ends_with("paused"));
    }

    #[test]
    fn test_last_text_is_previewed() {
        let view = StatusView::new(
            Arc::new(EffectiveSettings::default()),
            Arc::new(Theme::default()),
            false,
        );
        let lines = text_of(&view.lines(&StatusSnapshot {
            last_text: Some("two\nlines".to_string()),
            external_actions: 3,
            ..StatusSnapshot::default()
        }));
        assert!(lines[0].ends_with("clipboard"));
        assert!(lines[1].ends_with("off"));
        assert!(lines[3].ends_with("5 built-in, 3 external"));
        assert!(lines[5].ends_with("two\\nlines"));
    }
}
