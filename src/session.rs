// 🪟 Session - per-front-end view context
//
// Which group is open, which split mode is selected, and the history panel's
// expand/collapse flags. Passed explicitly by the caller; the engine itself
// holds no ambient state. Never persisted with ledger data.

use crate::history::HistoryView;
use crate::split::SplitMode;

#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    viewer: String,
    current_group: Option<String>,
    split_mode: SplitMode,
    history: HistoryView,
}

impl Session {
    pub fn new(viewer: impl Into<String>) -> Self {
        Session {
            viewer: viewer.into(),
            current_group: None,
            split_mode: SplitMode::default(),
            history: HistoryView::new(),
        }
    }

    pub fn viewer(&self) -> &str {
        &self.viewer
    }

    pub fn current_group(&self) -> Option<&str> {
        self.current_group.as_deref()
    }

    /// Switch groups. Closes the history panel of the previous group.
    pub fn open_group(&mut self, name: impl Into<String>) {
        self.current_group = Some(name.into());
        self.history.close();
    }

    pub fn close_group(&mut self) {
        self.current_group = None;
        self.history.close();
    }

    pub fn split_mode(&self) -> SplitMode {
        self.split_mode
    }

    pub fn set_split_mode(&mut self, mode: SplitMode) {
        self.split_mode = mode;
    }

    pub fn cycle_split_mode(&mut self) -> SplitMode {
        self.split_mode = self.split_mode.next();
        self.split_mode
    }

    pub fn history(&self) -> &HistoryView {
        &self.history
    }

    pub fn history_mut(&mut self) -> &mut HistoryView {
        &mut self.history
    }

    /// Open the history panel with everything collapsed
    pub fn open_history(&mut self) {
        self.history.open();
    }

    pub fn close_history(&mut self) {
        self.history.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::HistorySide;

    #[test]
    fn test_new_session() {
        let session = Session::new("User");
        assert_eq!(session.viewer(), "User");
        assert_eq!(session.current_group(), None);
        assert_eq!(session.split_mode(), SplitMode::Equal);
        assert!(!session.history().is_open());
    }

    #[test]
    fn test_reopening_history_collapses_everything() {
        let mut session = Session::new("User");
        session.open_group("Trip to Goa");
        session.open_history();
        session.history_mut().toggle(HistorySide::OwesYou, "Alice");
        assert!(session.history().is_expanded(HistorySide::OwesYou, "Alice"));

        session.close_history();
        session.open_history();
        assert!(!session.history().is_expanded(HistorySide::OwesYou, "Alice"));
    }

    #[test]
    fn test_switching_group_closes_history() {
        let mut session = Session::new("User");
        session.open_group("Trip to Goa");
        session.open_history();

        session.open_group("Flatmates");
        assert_eq!(session.current_group(), Some("Flatmates"));
        assert!(!session.history().is_open());
    }

    #[test]
    fn test_split_mode_cycles() {
        let mut session = Session::new("User");
        assert_eq!(session.cycle_split_mode(), SplitMode::Exact);
        assert_eq!(session.cycle_split_mode(), SplitMode::Percent);
        assert_eq!(session.cycle_split_mode(), SplitMode::Equal);

        session.set_split_mode(SplitMode::Percent);
        assert_eq!(session.split_mode(), SplitMode::Percent);
    }
}
