//! The action popup, drawn as an overlay at the mouse pointer.

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, MouseButton, MouseEvent, MouseEventKind};
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};
use ratatui_garnish::{shadow::HalfShadow, GarnishableWidget};
use std::sync::Arc;

use crate::menu::{PopupCommand, PopupState, PopupSurface};
use crate::models::{Bounds, IconSpec, MenuAction, Position};
use crate::services::Theme;

const MIN_WIDTH: u16 = 24;
const MAX_WIDTH: u16 = 64;
/// Hotkey, glyph and the spaces around them.
const ROW_DECORATION: usize = 6;

/// Terminal rendering of [`PopupState`].
pub struct TerminalPopup {
    theme: Arc<Theme>,
    pointer: Position,
    bounds: Bounds,
    area: Rect,
    /// Row of the current page under the cursor.
    highlight: usize,
    visible: bool,
}

impl TerminalPopup {
    pub fn new(theme: Arc<Theme>) -> Self {
        Self {
            theme,
            pointer: Position::default(),
            bounds: Bounds::default(),
            area: Rect::default(),
            highlight: 0,
            visible: false,
        }
    }

    #[cfg(test)]
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Area the popup covers, shadow included.
    #[cfg(test)]
    pub fn area(&self) -> Rect {
        self.area
    }

    pub fn track_pointer(&mut self, column: u16, row: u16) {
        self.pointer = Position::new(column, row);
    }

    /// The terminal was resized; later placements clamp to the new size.
    pub fn set_bounds(&mut self, width: u16, height: u16) {
        self.bounds = Bounds::new(0, 0, width, height);
    }

    fn place(&mut self, popup: &PopupState, at: Position) {
        let (width, height) = popup_size(popup, self.bounds);
        let origin = self.bounds.place(at, width, height);
        self.area = Rect::new(origin.x, origin.y, width, height);
    }

    /// Translate a key press into a popup command.
    pub fn map_key(&mut self, key: KeyEvent, popup: &PopupState) -> Option<PopupCommand> {
        if key.kind != KeyEventKind::Press {
            return None;
        }
        let on_page = popup.page_entries().count();
        match key.code {
            KeyCode::Esc => Some(PopupCommand::Cancel),
            KeyCode::Char(c) if c.is_ascii_digit() => {
                let row = match c.to_digit(10)? {
                    0 => 9,
                    n => n as usize - 1,
                };
                popup
                    .page_entries()
                    .nth(row)
                    .map(|(index, _)| PopupCommand::Select(index))
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.highlight = if self.highlight == 0 {
                    on_page.saturating_sub(1)
                } else {
                    self.highlight - 1
                };
                None
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.highlight = if self.highlight + 1 >= on_page {
                    0
                } else {
                    self.highlight + 1
                };
                None
            }
            KeyCode::Enter => popup
                .page_entries()
                .nth(self.highlight)
                .map(|(index, _)| PopupCommand::Select(index)),
            KeyCode::Left | KeyCode::Char('h') => Some(PopupCommand::PreviousPage),
            KeyCode::Right | KeyCode::Char('l') => Some(PopupCommand::NextPage),
            _ => None,
        }
    }

    /// Pointer tracking, plus clicks while the popup is up.
    pub fn map_mouse(&mut self, mouse: MouseEvent, popup: &PopupState) -> Option<PopupCommand> {
        self.track_pointer(mouse.column, mouse.row);
        if !self.visible || mouse.kind != MouseEventKind::Down(MouseButton::Left) {
            return None;
        }

        let inner = self.inner();
        let inside = mouse.column >= inner.x
            && mouse.column < inner.x + inner.width
            && mouse.row >= inner.y
            && mouse.row < inner.y + inner.height;
        if !inside {
            return Some(PopupCommand::Cancel);
        }

        let row = (mouse.row - inner.y) as usize;
        let layout = popup.layout();
        if let Some((index, _)) = popup.page_entries().nth(row) {
            return Some(PopupCommand::Select(index));
        }
        if layout.needs_paging() {
            let page_size = layout.slots_per_page() - 2;
            if row == page_size {
                return Some(PopupCommand::PreviousPage);
            }
            if row == page_size + 1 {
                return Some(PopupCommand::NextPage);
            }
        }
        None
    }

    /// Rows area inside the border, excluding the shadow.
    fn inner(&self) -> Rect {
        Rect::new(
            self.area.x + 1,
            self.area.y + 1,
            self.area.width.saturating_sub(3),
            self.area.height.saturating_sub(3),
        )
    }

    pub fn draw(&self, f: &mut Frame, popup: &PopupState) {
        if !self.visible || !popup.is_visible() {
            return;
        }
        let area = self.area.intersection(f.area());
        if area.is_empty() {
            return;
        }

        let theme = &self.theme;
        let mut lines: Vec<Line> = Vec::new();
        for (row, (_, action)) in popup.page_entries().enumerate() {
            let hotkey = match row {
                0..=8 => char::from(b'1' + row as u8),
                9 => '0',
                _ => ' ',
            };
            let style = if row == self.highlight {
                Style::default()
                    .fg(theme.foreground)
                    .bg(theme.highlight)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(theme.foreground)
            };
            lines.push(Line::from(vec![
                Span::styled(format!(" {} ", hotkey), Style::default().fg(theme.muted)),
                Span::styled(format!("{} ", glyph(action)), Style::default().fg(theme.accent)),
                Span::styled(action.label.clone(), style),
            ]));
        }

        let layout = popup.layout();
        if layout.needs_paging() {
            while lines.len() < layout.slots_per_page() - 2 {
                lines.push(Line::default());
            }
            let nav = |enabled: bool| {
                if enabled {
                    Style::default().fg(theme.accent)
                } else {
                    Style::default().fg(theme.muted)
                }
            };
            lines.push(Line::from(Span::styled(
                "   ‹ Previous  (h)",
                nav(popup.has_previous()),
            )));
            lines.push(Line::from(Span::styled(
                format!(
                    "   Next ›  (l)   {}/{}",
                    popup.current_page() + 1,
                    layout.page_count()
                ),
                nav(popup.has_next()),
            )));
        }

        let block = Block::default()
            .borders(Borders::ALL)
            .title(title(popup.text()))
            .border_style(Style::default().fg(theme.accent));
        let menu = Paragraph::new(lines)
            .block(block)
            .style(Style::default().bg(theme.background));

        f.render_widget(Clear, area);
        f.render_widget(menu.garnish(HalfShadow::default()), area);
    }
}

impl PopupSurface for TerminalPopup {
    fn show(&mut self, popup: &PopupState) {
        self.visible = true;
        self.highlight = 0;
        self.place(popup, self.pointer);
    }

    fn refresh(&mut self, popup: &PopupState) {
        self.highlight = 0;
        self.place(popup, Position::new(self.area.x, self.area.y));
    }

    fn dismiss(&mut self) -> bool {
        std::mem::replace(&mut self.visible, false)
    }
}

/// Width and height including border and shadow, capped to `bounds`.
fn popup_size(popup: &PopupState, bounds: Bounds) -> (u16, u16) {
    let layout = popup.layout();
    let widest = popup
        .actions()
        .iter()
        .filter(|a| a.enabled)
        .map(|a| a.label.chars().count() + ROW_DECORATION)
        .max()
        .unwrap_or(0)
        .max(title(popup.text()).chars().count());
    let width = (widest as u16 + 3).clamp(MIN_WIDTH, MAX_WIDTH);
    let height = layout.rows() as u16 + 3;
    (width.min(bounds.width), height.min(bounds.height))
}

fn title(text: &str) -> String {
    let flat: String = text
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let short: String = flat.chars().take(32).collect();
    if short.chars().count() < flat.chars().count() {
        format!(" {}… ", short)
    } else {
        format!(" {} ", short)
    }
}

/// A one-cell stand-in for the action's icon.
fn glyph(action: &MenuAction) -> &'static str {
    if let Some(IconSpec::Standard(name)) = &action.icon {
        match name.as_str() {
            "SP_ArrowUp" => return "↑",
            "SP_ArrowDown" => return "↓",
            "SP_FileDialogDetailedView" => return "≡",
            "SP_BrowserReload" => return "↻",
            "SP_DialogOpenButton" => return "⎘",
            "SP_FileIcon" => return "▤",
            "SP_DirIcon" => return "▣",
            "SP_TrashIcon" => return "✗",
            _ => {}
        }
    }
    keyword_glyph(&action.label)
}

fn keyword_glyph(label: &str) -> &'static str {
    let label = label.to_lowercase();
    let has = |words: &[&str]| words.iter().any(|w| label.contains(w));
    if has(&["search", "find", "google"]) {
        "⌕"
    } else if has(&["translate"]) {
        "⇄"
    } else if has(&["speak", "say", "read"]) {
        "♪"
    } else if has(&["open", "browse", "url", "web"]) {
        "↗"
    } else if has(&["copy"]) {
        "⎘"
    } else if has(&["upper"]) {
        "↑"
    } else if has(&["lower"]) {
        "↓"
    } else {
        "•"
    }
}
