//! Popup state, paging, and the contract a rendering surface implements.

use std::ops::Range;

use crate::models::MenuAction;

/// How N actions split into pages of P.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLayout {
    total: usize,
    page_size: usize,
}

impl PageLayout {
    pub fn new(total: usize, page_size: usize) -> Self {
        Self {
            total,
            page_size: page_size.max(1),
        }
    }

    /// Rows the popup needs: every entry, or a full page plus navigation.
    pub fn rows(&self) -> usize {
        if self.needs_paging() {
            self.slots_per_page()
        } else {
            self.total
        }
    }

    /// True when previous/next controls are shown.
    pub fn needs_paging(&self) -> bool {
        self.total > self.page_size
    }

    pub fn page_count(&self) -> usize {
        if self.needs_paging() {
            self.total.div_ceil(self.page_size)
        } else {
            1
        }
    }

    /// Action slots plus the two navigation slots when paging.
    pub fn slots_per_page(&self) -> usize {
        self.page_size + if self.needs_paging() { 2 } else { 0 }
    }

    pub fn clamp_page(&self, page: usize) -> usize {
        page.min(self.page_count() - 1)
    }

    /// Positions (in the visible list) shown on `page`.
    pub fn page_range(&self, page: usize) -> Range<usize> {
        let page = self.clamp_page(page);
        let start = (page * self.page_size).min(self.total);
        let end = (start + self.page_size).min(self.total);
        start..end
    }

    pub fn has_previous(&self, page: usize) -> bool {
        self.needs_paging() && page > 0
    }

    pub fn has_next(&self, page: usize) -> bool {
        self.needs_paging() && page + 1 < self.page_count()
    }
}

/// Why a popup went away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DismissReason {
    /// Escape or an equivalent cancel gesture.
    Cancelled,
    FocusLost,
    /// An action was chosen and has run.
    ActionChosen,
}

/// What the user asked the popup to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PopupCommand {
    /// Run the action at this index of the full action list.
    Select(usize),
    NextPage,
    PreviousPage,
    Cancel,
}

/// Everything needed to render the popup. Owned by the controller.
#[derive(Debug, Clone, Default)]
pub struct PopupState {
    visible: bool,
    current_page: usize,
    text: String,
    actions: Vec<MenuAction>,
    /// Indices into `actions` of the enabled entries, in order.
    shown: Vec<usize>,
    page_size: usize,
}

impl PopupState {
    pub fn open(text: &str, actions: Vec<MenuAction>, page_size: usize) -> Self {
        let shown = actions
            .iter()
            .enumerate()
            .filter(|(_, action)| action.enabled)
            .map(|(index, _)| index)
            .collect();
        Self {
            visible: true,
            current_page: 0,
            text: text.to_string(),
            actions,
            shown,
            page_size: page_size.max(1),
        }
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn close(&mut self) {
        *self = Self::default();
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn actions(&self) -> &[MenuAction] {
        &self.actions
    }

    /// Enabled action at `index` of the full list.
    pub fn action(&self, index: usize) -> Option<&MenuAction> {
        self.actions.get(index).filter(|action| action.enabled)
    }

    pub fn layout(&self) -> PageLayout {
        PageLayout::new(self.shown.len(), self.page_size)
    }

    /// `(index in the full list, action)` for each entry on the current page.
    pub fn page_entries(&self) -> impl Iterator<Item = (usize, &MenuAction)> + '_ {
        self.shown[self.layout().page_range(self.current_page)]
            .iter()
            .map(move |&index| (index, &self.actions[index]))
    }

    pub fn has_previous(&self) -> bool {
        self.layout().has_previous(self.current_page)
    }

    pub fn has_next(&self) -> bool {
        self.layout().has_next(self.current_page)
    }

    /// Returns true when the page changed.
    pub fn next_page(&mut self) -> bool {
        if !self.has_next() {
            return false;
        }
        self.current_page += 1;
        true
    }

    /// Returns true when the page changed.
    pub fn previous_page(&mut self) -> bool {
        if !self.has_previous() {
            return false;
        }
        self.current_page -= 1;
        true
    }
}

/// A rendering delegate for [`PopupState`].
///
/// The surface decides where the popup appears (at the pointer, clamped to
/// the visible screen area) and how it looks. It never owns the state and
/// reports user input back as [`PopupCommand`]s.
pub trait PopupSurface {
    fn show(&mut self, popup: &PopupState);

    /// The page of `popup` changed.
    fn refresh(&mut self, popup: &PopupState);

    /// Hide the popup. Returns false if it was not showing.
    fn dismiss(&mut self) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ActionEffect, ClipboardSlot};

    fn actions(n: usize) -> Vec<MenuAction> {
        (0..n)
            .map(|i| {
                MenuAction::new(
                    &format!("action {}", i),
                    ActionEffect::SetText {
                        slot: ClipboardSlot::Clipboard,
                        text: i.to_string(),
                    },
                )
            })
            .collect()
    }

    #[test]
    fn test_single_page_has_no_navigation() {
        for n in 0..=5 {
            let layout = PageLayout::new(n, 5);
            assert!(!layout.needs_paging());
            assert_eq!(layout.page_count(), 1);
            assert_eq!(layout.slots_per_page(), 5);
            assert!(!layout.has_previous(0));
            assert!(!layout.has_next(0));
            assert_eq!(layout.page_range(0), 0..n);
        }
    }

    #[test]
    fn test_pagination_invariant() {
        for page_size in 1..=6 {
            for n in (page_size + 1)..=20 {
                let layout = PageLayout::new(n, page_size);
                let pages = (n + page_size - 1) / page_size;
                assert_eq!(layout.page_count(), pages, "n={} p={}", n, page_size);
                assert_eq!(layout.slots_per_page(), page_size + 2);
                assert!(!layout.has_previous(0));
                assert!(layout.has_next(0));
                assert!(layout.has_previous(pages - 1));
                assert!(!layout.has_next(pages - 1));

                let covered: usize = (0..pages).map(|p| layout.page_range(p).len()).sum();
                assert_eq!(covered, n);
                assert!((0..pages).all(|p| layout.page_range(p).len() <= page_size));
            }
        }
    }

    #[test]
    fn test_rows_stay_stable_across_pages() {
        assert_eq!(PageLayout::new(3, 10).rows(), 3);
        assert_eq!(PageLayout::new(11, 10).rows(), 12);
    }

    #[test]
    fn test_zero_page_size_is_treated_as_one() {
        let layout = PageLayout::new(3, 0);
        assert_eq!(layout.page_count(), 3);
    }

    #[test]
    fn test_page_entries_report_original_indices() {
        let mut list = actions(7);
        list[1].enabled = false;
        list[4].enabled = false;
        let mut popup = PopupState::open("text", list, 2);

        let first: Vec<usize> = popup.page_entries().map(|(i, _)| i).collect();
        assert_eq!(first, vec![0, 2]);
        assert!(popup.next_page());
        let second: Vec<usize> = popup.page_entries().map(|(i, _)| i).collect();
        assert_eq!(second, vec![3, 5]);
        assert!(popup.next_page());
        let third: Vec<usize> = popup.page_entries().map(|(i, _)| i).collect();
        assert_eq!(third, vec![6]);
        assert!(!popup.next_page());
        assert!(popup.previous_page());
        assert_eq!(popup.current_page(), 1);
    }

    #[test]
    fn test_disabled_actions_cannot_be_looked_up() {
        let mut list = actions(2);
        list[0].enabled = false;
        let popup = PopupState::open("text", list, 10);
        assert!(popup.action(0).is_none());
        assert!(popup.action(1).is_some());
        assert!(popup.action(2).is_none());
    }

    #[test]
    fn test_close_resets_state() {
        let mut popup = PopupState::open("text", actions(3), 1);
        popup.next_page();
        popup.close();
        assert!(!popup.is_visible());
        assert_eq!(popup.current_page(), 0);
        assert!(popup.actions().is_empty());
    }
}
