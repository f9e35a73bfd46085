//! Selection UI state machine
//!
//! All hierarchy, selection and filter logic lives here as a plain state
//! transition: [`SelectionState::handle`] takes one [`UiEvent`] and returns
//! the [`UiCommand`] the event loop should carry out. Nothing in this module
//! touches the terminal.

use crate::app::models::Region;
use crate::app::processor::{BatchSummary, ProcessingUpdate};
use crate::app::progress::ProgressAggregator;
use crate::app::tree::{filter_regions, LocationFocus, RegionTree, RowKind, VisibleRow};
use crate::constants::ui;

/// Key press, independent of the terminal backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyInput {
    Char(char),
    Ctrl(char),
    Enter,
    Esc,
    Backspace,
    Up,
    Down,
    PageUp,
    PageDown,
    Home,
    End,
    Other,
}

/// Input to the state machine
#[derive(Debug)]
pub enum UiEvent {
    Key(KeyInput),
    Resize(u16, u16),
    Progress(ProcessingUpdate),
    BatchFinished(BatchSummary),
}

/// Side effect requested by the state machine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiCommand {
    None,
    StartBatch(Vec<Region>),
    CancelBatch,
    Quit,
}

/// Top-level UI mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Browsing,
    Filtering,
    Processing,
    Quitting,
}

/// One row as the renderer should draw it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowView {
    pub label: String,
    pub level: usize,
    /// Leaves only
    pub selected: Option<bool>,
    /// Groups only
    pub expanded: Option<bool>,
    pub is_cursor: bool,
}

/// Everything the selection UI knows
#[derive(Debug)]
pub struct SelectionState {
    regions: Vec<Region>,
    tree: RegionTree,
    rows: Vec<VisibleRow>,
    selected: Vec<bool>,
    mode: Mode,
    query: String,
    filtered: Vec<usize>,
    tree_cursor: usize,
    filter_cursor: usize,
    status: String,
    size: (u16, u16),
    progress: ProgressAggregator,
    batch_size: usize,
    summary: Option<BatchSummary>,
}

impl SelectionState {
    /// Create the state over `regions` arranged as `tree`
    ///
    /// The cursor starts on the focus target if it is visible.
    pub fn new(regions: Vec<Region>, tree: RegionTree, focus: LocationFocus) -> Self {
        let rows = tree.flatten();
        let tree_cursor = focus
            .target_leaf
            .as_deref()
            .and_then(|target| {
                rows.iter()
                    .position(|row| row.region().map(|i| regions[i].id.as_str()) == Some(target))
            })
            .unwrap_or(0);
        let status = focus
            .message
            .unwrap_or_else(|| format!("Loaded {} regions", regions.len()));

        Self {
            selected: vec![false; regions.len()],
            filtered: (0..regions.len()).collect(),
            regions,
            tree,
            rows,
            mode: Mode::Browsing,
            query: String::new(),
            tree_cursor,
            filter_cursor: 0,
            status,
            size: ui::DEFAULT_SIZE,
            progress: ProgressAggregator::new(),
            batch_size: 0,
            summary: None,
        }
    }

    /// Apply one event
    pub fn handle(&mut self, event: UiEvent) -> UiCommand {
        match event {
            UiEvent::Resize(width, height) => {
                self.size = (width, height);
                UiCommand::None
            }
            UiEvent::Progress(update) => {
                self.progress.apply(update);
                UiCommand::None
            }
            UiEvent::BatchFinished(summary) => {
                if self.mode == Mode::Processing {
                    self.mode = Mode::Browsing;
                }
                self.status = summary.headline();
                self.summary = Some(summary);
                UiCommand::None
            }
            UiEvent::Key(key) => match self.mode {
                Mode::Browsing => self.handle_browsing_key(key),
                Mode::Filtering => self.handle_filter_key(key),
                Mode::Processing => self.handle_processing_key(key),
                Mode::Quitting => UiCommand::Quit,
            },
        }
    }

    fn handle_browsing_key(&mut self, key: KeyInput) -> UiCommand {
        match key {
            KeyInput::Char('q') | KeyInput::Esc | KeyInput::Ctrl('c') => self.quit(),
            KeyInput::Char('k') | KeyInput::Up => self.move_cursor(-1),
            KeyInput::Char('j') | KeyInput::Down => self.move_cursor(1),
            KeyInput::PageUp => self.move_cursor(-(self.visible_count() as isize)),
            KeyInput::PageDown => self.move_cursor(self.visible_count() as isize),
            KeyInput::Home => self.move_cursor(isize::MIN),
            KeyInput::End => self.move_cursor(isize::MAX),
            KeyInput::Char('/') => {
                self.mode = Mode::Filtering;
                self.refilter();
                UiCommand::None
            }
            KeyInput::Char(' ') => {
                self.toggle_selection_at_cursor();
                UiCommand::None
            }
            KeyInput::Enter => self.activate(),
            _ => UiCommand::None,
        }
    }

    fn handle_filter_key(&mut self, key: KeyInput) -> UiCommand {
        match key {
            KeyInput::Ctrl('c') => self.quit(),
            KeyInput::Esc | KeyInput::Enter | KeyInput::Char('/') => {
                self.mode = Mode::Browsing;
                UiCommand::None
            }
            KeyInput::Up => self.move_cursor(-1),
            KeyInput::Down => self.move_cursor(1),
            KeyInput::PageUp => self.move_cursor(-(self.visible_count() as isize)),
            KeyInput::PageDown => self.move_cursor(self.visible_count() as isize),
            KeyInput::Home => self.move_cursor(isize::MIN),
            KeyInput::End => self.move_cursor(isize::MAX),
            KeyInput::Char(' ') => {
                self.toggle_selection_at_cursor();
                UiCommand::None
            }
            KeyInput::Backspace => {
                self.query.pop();
                self.refilter();
                UiCommand::None
            }
            KeyInput::Char(c) if !c.is_control() => {
                self.query.push(c);
                self.refilter();
                UiCommand::None
            }
            _ => UiCommand::None,
        }
    }

    fn handle_processing_key(&mut self, key: KeyInput) -> UiCommand {
        match key {
            KeyInput::Char('q') | KeyInput::Esc | KeyInput::Ctrl('c') => {
                self.mode = Mode::Quitting;
                self.status = "Cancelling...".to_string();
                UiCommand::CancelBatch
            }
            _ => UiCommand::None,
        }
    }

    fn quit(&mut self) -> UiCommand {
        self.mode = Mode::Quitting;
        UiCommand::Quit
    }

    /// Enter in the tree: expand/collapse a group, or start the batch on a leaf
    fn activate(&mut self) -> UiCommand {
        let Some(row) = self.rows.get(self.tree_cursor) else {
            return UiCommand::None;
        };

        match &row.kind {
            RowKind::Group { path, .. } => {
                let path = path.clone();
                self.tree.toggle(&path);
                self.rows = self.tree.flatten();
                self.clamp_cursor();
                UiCommand::None
            }
            RowKind::Leaf { .. } => {
                let batch = self.selected_regions();
                if batch.is_empty() {
                    self.status = "No regions selected".to_string();
                    return UiCommand::None;
                }
                self.mode = Mode::Processing;
                self.batch_size = batch.len();
                self.progress.reset();
                self.status = format!("Processing {} region(s)...", batch.len());
                UiCommand::StartBatch(batch)
            }
        }
    }

    fn toggle_selection_at_cursor(&mut self) {
        if let Some(index) = self.region_at_cursor() {
            self.selected[index] = !self.selected[index];
        }
    }

    fn refilter(&mut self) {
        self.filtered = filter_regions(&self.regions, &self.query);
        self.clamp_cursor();
    }

    fn list_len(&self) -> usize {
        match self.mode {
            Mode::Filtering => self.filtered.len(),
            _ => self.rows.len(),
        }
    }

    fn cursor_mut(&mut self) -> &mut usize {
        match self.mode {
            Mode::Filtering => &mut self.filter_cursor,
            _ => &mut self.tree_cursor,
        }
    }

    /// Current cursor position in the active list
    pub fn cursor(&self) -> usize {
        match self.mode {
            Mode::Filtering => self.filter_cursor,
            _ => self.tree_cursor,
        }
    }

    fn move_cursor(&mut self, delta: isize) -> UiCommand {
        let len = self.list_len();
        let cursor = self.cursor_mut();
        *cursor = if len == 0 {
            0
        } else {
            let target = (*cursor as isize).saturating_add(delta);
            target.clamp(0, len as isize - 1) as usize
        };
        UiCommand::None
    }

    fn clamp_cursor(&mut self) {
        let len = self.list_len();
        let cursor = self.cursor_mut();
        *cursor = (*cursor).min(len.saturating_sub(1));
    }

    /// Region index under the cursor, if the cursor is on a leaf
    pub fn region_at_cursor(&self) -> Option<usize> {
        match self.mode {
            Mode::Filtering => self.filtered.get(self.filter_cursor).copied(),
            _ => self.rows.get(self.tree_cursor).and_then(VisibleRow::region),
        }
    }

    /// Selected regions in catalog order
    pub fn selected_regions(&self) -> Vec<Region> {
        self.regions
            .iter()
            .zip(&self.selected)
            .filter(|(_, selected)| **selected)
            .map(|(region, _)| region.clone())
            .collect()
    }

    pub fn selected_count(&self) -> usize {
        self.selected.iter().filter(|s| **s).count()
    }

    pub fn is_selected(&self, index: usize) -> bool {
        self.selected.get(index).copied().unwrap_or(false)
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn is_quitting(&self) -> bool {
        self.mode == Mode::Quitting
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn progress(&self) -> &ProgressAggregator {
        &self.progress
    }

    /// Outcome of the last finished batch
    pub fn last_summary(&self) -> Option<&BatchSummary> {
        self.summary.as_ref()
    }

    /// Take the outcome of the last finished batch
    pub fn take_summary(&mut self) -> Option<BatchSummary> {
        self.summary.take()
    }

    /// Regions in the running or last batch
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Number of list rows that fit on screen
    pub fn visible_count(&self) -> usize {
        let available = self.size.1.saturating_sub(ui::RESERVED_LINES) as usize;
        available.clamp(ui::MIN_VISIBLE_ITEMS, ui::MAX_VISIBLE_ITEMS)
    }

    /// Half-open range of list rows to draw, centred on the cursor
    pub fn viewport(&self) -> (usize, usize) {
        let len = self.list_len();
        let visible = self.visible_count();
        if len <= visible {
            return (0, len);
        }
        let start = self
            .cursor()
            .saturating_sub(visible / 2)
            .min(len - visible);
        (start, start + visible)
    }

    /// Status text with the viewport position appended when scrolling
    pub fn status_line(&self) -> String {
        let len = self.list_len();
        let (start, end) = self.viewport();
        let mut line = self.status.clone();
        if self.selected_count() > 0 && self.mode != Mode::Processing {
            line.push_str(&format!(" | {} selected", self.selected_count()));
        }
        if len > end - start {
            line.push_str(&format!(" | Showing {}-{} of {} items", start + 1, end, len));
        }
        line
    }

    /// Rows inside the viewport
    pub fn visible_rows(&self) -> Vec<RowView> {
        let (start, end) = self.viewport();
        let cursor = self.cursor();

        (start..end)
            .filter_map(|position| {
                let is_cursor = position == cursor;
                match self.mode {
                    Mode::Filtering => {
                        let index = *self.filtered.get(position)?;
                        let region = &self.regions[index];
                        Some(RowView {
                            label: format!("{} [{}]", region.name, region.id),
                            level: 0,
                            selected: Some(self.selected[index]),
                            expanded: None,
                            is_cursor,
                        })
                    }
                    _ => {
                        let row = self.rows.get(position)?;
                        let (selected, expanded) = match &row.kind {
                            RowKind::Leaf { region } => (Some(self.selected[*region]), None),
                            RowKind::Group { expanded, .. } => (None, Some(*expanded)),
                        };
                        Some(RowView {
                            label: row.label.clone(),
                            level: row.level,
                            selected,
                            expanded,
                            is_cursor,
                        })
                    }
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::tree::Geography;

    fn regions() -> Vec<Region> {
        vec![
            Region::new("andorra", "Andorra").with_parent("europe"),
            Region::new("bayern", "Bayern (Germany)").with_parent("germany"),
            Region::new("berlin", "Berlin (Germany)").with_parent("germany"),
            Region::new("us/texas", "Texas (United States of America)").with_parent("us"),
        ]
    }

    fn geography() -> Geography {
        Geography::default()
            .with_continent("north-america", "NA", 1)
            .with_continent("europe", "EU", 2)
            .with_country("us", "north-america")
            .with_country("germany", "europe")
    }

    fn state() -> SelectionState {
        let regions = regions();
        let tree = RegionTree::build(&regions, &geography());
        SelectionState::new(regions, tree, LocationFocus::default())
    }

    fn press(state: &mut SelectionState, keys: &[KeyInput]) -> UiCommand {
        let mut last = UiCommand::None;
        for key in keys {
            last = state.handle(UiEvent::Key(*key));
        }
        last
    }

    fn type_text(state: &mut SelectionState, text: &str) {
        for c in text.chars() {
            state.handle(UiEvent::Key(KeyInput::Char(c)));
        }
    }

    /// Expand North America and its `us` group, leaving the cursor on Texas
    fn open_texas(state: &mut SelectionState) {
        press(
            state,
            &[KeyInput::Enter, KeyInput::Down, KeyInput::Enter, KeyInput::Down],
        );
    }

    #[test]
    fn test_enter_toggles_groups() {
        let mut state = state();
        assert_eq!(state.visible_rows().len(), 2);

        press(&mut state, &[KeyInput::Enter]);
        assert_eq!(state.visible_rows().len(), 3);
        assert_eq!(state.visible_rows()[0].expanded, Some(true));

        press(&mut state, &[KeyInput::Enter]);
        assert_eq!(state.visible_rows().len(), 2);
    }

    #[test]
    fn test_enter_on_leaf_without_selection_is_noop() {
        let mut state = state();
        open_texas(&mut state);
        assert_eq!(state.region_at_cursor(), Some(3));

        assert_eq!(press(&mut state, &[KeyInput::Enter]), UiCommand::None);
        assert_eq!(state.mode(), Mode::Browsing);
        assert!(state.status_line().starts_with("No regions selected"));
    }

    #[test]
    fn test_selection_toggles_back() {
        let mut state = state();
        open_texas(&mut state);

        press(&mut state, &[KeyInput::Char(' ')]);
        assert!(state.is_selected(3));
        press(&mut state, &[KeyInput::Char(' ')]);
        assert!(!state.is_selected(3));
        assert_eq!(state.selected_count(), 0);
    }

    #[test]
    fn test_selection_survives_filter_round_trip() {
        let mut state = state();
        open_texas(&mut state);
        press(&mut state, &[KeyInput::Char(' ')]);

        press(&mut state, &[KeyInput::Char('/')]);
        assert_eq!(state.mode(), Mode::Filtering);
        type_text(&mut state, "berl");
        assert_eq!(state.visible_rows().len(), 1);
        press(&mut state, &[KeyInput::Char(' ')]);
        assert!(state.is_selected(2));

        press(&mut state, &[KeyInput::Enter]);
        assert_eq!(state.mode(), Mode::Browsing);
        assert_eq!(state.region_at_cursor(), Some(3));
        assert!(state.is_selected(3));
        assert!(state.is_selected(2));
    }

    #[test]
    fn test_filter_editing() {
        let mut state = state();
        press(&mut state, &[KeyInput::Char('/')]);
        type_text(&mut state, "GERMANYx");
        assert!(state.visible_rows().is_empty());
        assert_eq!(state.region_at_cursor(), None);

        press(&mut state, &[KeyInput::Backspace]);
        assert_eq!(state.query(), "GERMANY");
        let labels: Vec<String> = state.visible_rows().into_iter().map(|r| r.label).collect();
        assert_eq!(
            labels,
            vec!["Bayern (Germany) [bayern]", "Berlin (Germany) [berlin]"]
        );

        // q is text while filtering, Esc leaves the filter
        type_text(&mut state, "q");
        assert_eq!(state.mode(), Mode::Filtering);
        press(&mut state, &[KeyInput::Esc]);
        assert_eq!(state.mode(), Mode::Browsing);
    }

    #[test]
    fn test_start_and_finish_batch() {
        let mut state = state();
        open_texas(&mut state);
        press(&mut state, &[KeyInput::Char(' ')]);

        let command = press(&mut state, &[KeyInput::Enter]);
        match command {
            UiCommand::StartBatch(batch) => {
                assert_eq!(batch.len(), 1);
                assert_eq!(batch[0].id, "us/texas");
            }
            other => panic!("unexpected command {:?}", other),
        }
        assert_eq!(state.mode(), Mode::Processing);

        // Navigation is ignored while processing
        press(&mut state, &[KeyInput::Up]);
        assert_eq!(state.region_at_cursor(), Some(3));

        state.handle(UiEvent::Progress(ProcessingUpdate::for_batch(
            "Texas",
            1,
            1,
            "Completed region 1/1: Texas",
        )));
        assert_eq!(state.progress().overall(), 100.0);

        let summary = BatchSummary {
            total: 1,
            succeeded: vec![Region::new("us/texas", "Texas")],
            ..Default::default()
        };
        state.handle(UiEvent::BatchFinished(summary));
        assert_eq!(state.mode(), Mode::Browsing);
        assert_eq!(state.last_summary().map(|s| s.succeeded.len()), Some(1));
        assert!(state
            .status_line()
            .starts_with("Batch processing complete! ✅ 1 succeeded, ❌ 0 failed"));
    }

    #[test]
    fn test_cancel_while_processing_quits() {
        let mut state = state();
        open_texas(&mut state);
        press(&mut state, &[KeyInput::Char(' '), KeyInput::Enter]);

        assert_eq!(press(&mut state, &[KeyInput::Ctrl('c')]), UiCommand::CancelBatch);
        assert!(state.is_quitting());
    }

    #[test]
    fn test_quit_keys() {
        for key in [KeyInput::Char('q'), KeyInput::Esc, KeyInput::Ctrl('c')] {
            let mut state = state();
            assert_eq!(press(&mut state, &[key]), UiCommand::Quit);
            assert!(state.is_quitting());
        }

        let mut state = state();
        press(&mut state, &[KeyInput::Char('/')]);
        assert_eq!(press(&mut state, &[KeyInput::Ctrl('c')]), UiCommand::Quit);
    }

    #[test]
    fn test_focus_places_cursor() {
        let regions = regions();
        let mut tree = RegionTree::build(&regions, &geography());
        tree.toggle(&[1]);
        tree.toggle(&[1, 1]);
        let focus = LocationFocus {
            target_leaf: Some("berlin".to_string()),
            message: Some("📍 Opened Germany regions for you".to_string()),
        };

        let state = SelectionState::new(regions, tree, focus);
        assert_eq!(state.region_at_cursor(), Some(2));
        assert!(state.status_line().starts_with("📍 Opened Germany"));
    }

    #[test]
    fn test_viewport_is_clamped_and_centred() {
        let regions: Vec<Region> = (0..200)
            .map(|i| Region::new(format!("r{:03}", i), format!("Region {:03}", i)))
            .collect();
        let tree = RegionTree::build(&regions, &Geography::default());
        let mut state = SelectionState::new(regions, tree, LocationFocus::default());
        press(&mut state, &[KeyInput::Char('/')]);

        // Tiny terminal still shows the minimum
        state.handle(UiEvent::Resize(80, 5));
        assert_eq!(state.visible_count(), 10);

        // Huge terminal is capped
        state.handle(UiEvent::Resize(80, 500));
        assert_eq!(state.visible_count(), 50);

        state.handle(UiEvent::Resize(80, 30));
        assert_eq!(state.visible_count(), 20);
        assert_eq!(state.viewport(), (0, 20));

        press(&mut state, &[KeyInput::PageDown, KeyInput::PageDown, KeyInput::PageDown]);
        assert_eq!(state.cursor(), 60);
        assert_eq!(state.viewport(), (50, 70));
        assert!(state.status_line().ends_with(" | Showing 51-70 of 200 items"));

        press(&mut state, &[KeyInput::End]);
        assert_eq!(state.viewport(), (180, 200));
        press(&mut state, &[KeyInput::Home]);
        assert_eq!(state.cursor(), 0);
    }
}
