use crate::config::Config;
use crate::scoring::{ScoreTable, ScoredEntity, ScoringError, ScoringSession, WeightConfig};
use crate::table::{provinces_in, regions, HeatGradient, RegionFilter};
use crate::tui::theme::{Theme, ThemeColors};
use std::collections::VecDeque;
use std::time::Instant;

const MAX_UNDO: usize = 50;

/// Shown when an apply is rejected because the weights don't total 1
pub const WEIGHT_SUM_WARNING: &str = "Please adjust the weights so that their total equals 1.";

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum View {
    Table,
    Rankings,
    Map,
}

impl View {
    pub const ALL: [View; 3] = [View::Table, View::Rankings, View::Map];

    pub fn title(&self) -> &'static str {
        match self {
            View::Table => "Table",
            View::Rankings => "Rankings",
            View::Map => "Map",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum InputMode {
    Normal,
    WeightEditor,
    ProvincePicker,
    Help,
    ScoreBreakdown,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FlashLevel {
    Info,
    Warning,
}

pub struct App {
    pub session: ScoringSession,
    /// Weights being edited; they reach the scores only through `apply_weights`
    pub pending: WeightConfig,
    pub selected_weight: usize,
    pub table_state: ratatui::widgets::TableState,
    pub current_view: View,
    pub input_mode: InputMode,
    pub region_filter: RegionFilter,
    pub picker_cursor: usize,
    pub picker_selection: Vec<String>,
    pub flash_message: Option<(String, Instant, FlashLevel)>,
    /// Previously applied weights, most recent first
    pub undo_stack: VecDeque<WeightConfig>,
    pub top_n: usize,
    pub gradient: HeatGradient,
    pub colors: ThemeColors,
    pub should_quit: bool,
}

impl App {
    pub fn new(session: ScoringSession, config: &Config) -> Self {
        let region_filter =
            RegionFilter::default_for(session.scores(), config.default_region.as_deref());
        let pending = session.applied_weights().clone();

        let mut app = Self {
            session,
            pending,
            selected_weight: 0,
            table_state: ratatui::widgets::TableState::default(),
            current_view: View::Table,
            input_mode: InputMode::Normal,
            region_filter,
            picker_cursor: 0,
            picker_selection: Vec::new(),
            flash_message: None,
            undo_stack: VecDeque::new(),
            top_n: config.top_n,
            gradient: HeatGradient::default(),
            colors: ThemeColors::dark(),
            should_quit: false,
        };
        app.clamp_selection();
        app
    }

    pub fn with_theme(mut self, theme: Theme) -> Self {
        self.colors = ThemeColors::for_theme(theme);
        self
    }

    pub fn scores(&self) -> &ScoreTable {
        self.session.scores()
    }

    /// Rows of the table view after the region/province filter
    pub fn visible_rows(&self) -> Vec<&ScoredEntity> {
        self.region_filter.apply(self.session.scores())
    }

    pub fn next_row(&mut self) {
        let len = self.visible_rows().len();
        if len == 0 {
            return;
        }
        let i = match self.table_state.selected() {
            Some(i) if i + 1 < len => i + 1,
            _ => 0,
        };
        self.table_state.select(Some(i));
    }

    pub fn previous_row(&mut self) {
        let len = self.visible_rows().len();
        if len == 0 {
            return;
        }
        let i = match self.table_state.selected() {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        self.table_state.select(Some(i));
    }

    pub fn selected_entity(&self) -> Option<&ScoredEntity> {
        let i = self.table_state.selected()?;
        self.visible_rows().get(i).copied()
    }

    /// Keep the table selection inside the visible rows
    fn clamp_selection(&mut self) {
        let len = self.visible_rows().len();
        if len == 0 {
            self.table_state.select(None);
        } else {
            match self.table_state.selected() {
                Some(selected) if selected >= len => self.table_state.select(Some(len - 1)),
                None => self.table_state.select(Some(0)),
                _ => {}
            }
        }
    }

    // Weight editor

    pub fn start_weight_editor(&mut self) {
        if !self.pending.is_empty() {
            self.input_mode = InputMode::WeightEditor;
        }
    }

    pub fn stop_weight_editor(&mut self) {
        self.input_mode = InputMode::Normal;
    }

    pub fn next_weight(&mut self) {
        if !self.pending.is_empty() {
            self.selected_weight = (self.selected_weight + 1) % self.pending.len();
        }
    }

    pub fn previous_weight(&mut self) {
        if !self.pending.is_empty() {
            self.selected_weight = self
                .selected_weight
                .checked_sub(1)
                .unwrap_or(self.pending.len() - 1);
        }
    }

    pub fn nudge_selected_weight(&mut self, delta: f64) {
        self.pending.nudge(self.selected_weight, delta);
    }

    /// True when the editor holds weights that haven't been applied yet
    pub fn has_pending_changes(&self) -> bool {
        &self.pending != self.session.applied_weights()
    }

    /// Validate the pending weights and recompute. A rejected apply keeps the
    /// previous scores and leaves the pending weights as they are.
    pub fn apply_weights(&mut self) {
        let previous = self.session.applied_weights().clone();
        let result = self.session.apply(&self.pending).map(|_| ());
        match result {
            Ok(_) => {
                self.push_undo(previous);
                self.clamp_selection();
                self.show_flash("Weights applied (z to undo)".to_string());
            }
            Err(ScoringError::InvalidWeightSum { .. }) => {
                self.show_warning(WEIGHT_SUM_WARNING.to_string());
            }
            Err(e) => self.show_warning(format!("Weights not applied: {}", e)),
        }
    }

    pub fn normalize_pending(&mut self) {
        if self.pending.sum() > 0.0 {
            self.pending.normalize();
            self.show_flash("Weights normalized (a to apply)".to_string());
        } else {
            self.show_warning("All weights are zero, nothing to normalize".to_string());
        }
    }

    pub fn reset_pending(&mut self) {
        self.pending = self.session.default_weights().clone();
        self.show_flash("Default weights restored (a to apply)".to_string());
    }

    fn push_undo(&mut self, weights: WeightConfig) {
        self.undo_stack.push_front(weights);
        if self.undo_stack.len() > MAX_UNDO {
            self.undo_stack.pop_back();
        }
    }

    /// Re-apply the weights that were active before the last successful apply
    pub fn undo_last(&mut self) {
        let previous = match self.undo_stack.pop_front() {
            Some(weights) => weights,
            None => {
                self.show_flash("Nothing to undo".to_string());
                return;
            }
        };

        let result = self.session.apply(&previous).map(|_| ());
        match result {
            Ok(_) => {
                self.pending = previous;
                self.clamp_selection();
                self.show_flash("Restored previous weights".to_string());
            }
            Err(e) => self.show_warning(format!("Undo failed: {}", e)),
        }
    }

    // Filters

    /// Move the filter to the next region, wrapping around. Clears the province selection.
    pub fn cycle_region(&mut self) {
        let available: Vec<String> = regions(self.session.scores())
            .into_iter()
            .map(String::from)
            .collect();
        if available.is_empty() {
            return;
        }
        let next = match &self.region_filter.region {
            Some(current) => available
                .iter()
                .position(|r| r == current)
                .map(|i| (i + 1) % available.len())
                .unwrap_or(0),
            None => 0,
        };
        self.region_filter.region = Some(available[next].clone());
        self.region_filter.provinces.clear();
        self.table_state.select(None);
        self.clamp_selection();
    }

    /// Provinces offered by the picker (those of the filtered region)
    pub fn picker_provinces(&self) -> Vec<&str> {
        match &self.region_filter.region {
            Some(region) => provinces_in(self.session.scores(), region),
            None => Vec::new(),
        }
    }

    pub fn open_province_picker(&mut self) {
        if self.picker_provinces().is_empty() {
            self.show_warning("No provinces to pick from".to_string());
            return;
        }
        // Every province starts checked when the filter covers the whole region
        self.picker_selection = if self.region_filter.provinces.is_empty() {
            self.picker_provinces().into_iter().map(String::from).collect()
        } else {
            self.region_filter.provinces.clone()
        };
        self.picker_cursor = 0;
        self.input_mode = InputMode::ProvincePicker;
    }

    pub fn picker_next(&mut self) {
        let len = self.picker_provinces().len();
        if len > 0 {
            self.picker_cursor = (self.picker_cursor + 1) % len;
        }
    }

    pub fn picker_previous(&mut self) {
        let len = self.picker_provinces().len();
        if len > 0 {
            self.picker_cursor = self.picker_cursor.checked_sub(1).unwrap_or(len - 1);
        }
    }

    pub fn picker_toggle(&mut self) {
        let province = match self.picker_provinces().get(self.picker_cursor) {
            Some(p) => p.to_string(),
            None => return,
        };
        if let Some(pos) = self.picker_selection.iter().position(|p| *p == province) {
            self.picker_selection.remove(pos);
        } else {
            self.picker_selection.push(province);
        }
    }

    /// Store the checked provinces. All checked means no province filter;
    /// none checked is refused and the picker stays open.
    pub fn confirm_province_picker(&mut self) {
        if self.picker_selection.is_empty() {
            self.show_warning("Select at least one province".to_string());
            return;
        }
        let offered: Vec<String> = self
            .picker_provinces()
            .into_iter()
            .map(String::from)
            .collect();
        let selection = std::mem::take(&mut self.picker_selection);
        self.region_filter.provinces = if offered.iter().all(|p| selection.contains(p)) {
            Vec::new()
        } else {
            offered.into_iter().filter(|p| selection.contains(p)).collect()
        };
        self.input_mode = InputMode::Normal;
        self.table_state.select(None);
        self.clamp_selection();
    }

    pub fn cancel_province_picker(&mut self) {
        self.picker_selection.clear();
        self.input_mode = InputMode::Normal;
    }

    /// Cycle Table → Rankings → Map
    pub fn toggle_view(&mut self) {
        self.current_view = match self.current_view {
            View::Table => View::Rankings,
            View::Rankings => View::Map,
            View::Map => View::Table,
        };
    }

    /// Show help overlay
    pub fn show_help(&mut self) {
        self.input_mode = InputMode::Help;
    }

    /// Dismiss help overlay
    pub fn dismiss_help(&mut self) {
        self.input_mode = InputMode::Normal;
    }

    /// Show score breakdown overlay
    pub fn show_score_breakdown(&mut self) {
        if self.current_view == View::Table && self.selected_entity().is_some() {
            self.input_mode = InputMode::ScoreBreakdown;
        }
    }

    /// Dismiss score breakdown overlay
    pub fn dismiss_score_breakdown(&mut self) {
        self.input_mode = InputMode::Normal;
    }

    pub fn update_flash(&mut self) {
        if let Some((_, timestamp, _)) = self.flash_message {
            if timestamp.elapsed().as_secs() >= 3 {
                self.flash_message = None;
            }
        }
    }

    pub fn show_flash(&mut self, msg: String) {
        self.flash_message = Some((msg, Instant::now(), FlashLevel::Info));
    }

    pub fn show_warning(&mut self, msg: String) {
        self.flash_message = Some((msg, Instant::now(), FlashLevel::Warning));
    }
}
