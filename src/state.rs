use std::collections::VecDeque;
use std::time::SystemTime;

use crate::filter::{PlayerFilter, SortKey};
use crate::pipeline::PlayerTable;
use crate::players::{Player, Position};

pub const EMPTY_RESULT_MESSAGE: &str = "No players found. Try lowering the Minutes filter.";

const PRICE_STEP: f64 = 0.5;
const MINUTES_STEP: u32 = 50;

#[derive(Debug, Clone, PartialEq)]
pub enum LoadStatus {
    Loading,
    Ready,
    Failed(String),
}

/// Filter control that `←`/`→` currently adjust.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterFocus {
    PriceMin,
    PriceMax,
    MinMinutes,
}

impl FilterFocus {
    pub fn next(self) -> Self {
        match self {
            FilterFocus::PriceMin => FilterFocus::PriceMax,
            FilterFocus::PriceMax => FilterFocus::MinMinutes,
            FilterFocus::MinMinutes => FilterFocus::PriceMin,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            FilterFocus::PriceMin => "Min price",
            FilterFocus::PriceMax => "Max price",
            FilterFocus::MinMinutes => "Min minutes",
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppState {
    pub table: Option<PlayerTable>,
    pub table_updated: Option<SystemTime>,
    pub status: LoadStatus,
    pub filter: PlayerFilter,
    pub focus: FilterFocus,
    pub sort: SortKey,
    pub selected: usize,
    pub logs: VecDeque<String>,
    pub help_overlay: bool,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(PlayerFilter::default())
    }
}

impl AppState {
    pub fn new(filter: PlayerFilter) -> Self {
        Self {
            table: None,
            table_updated: None,
            status: LoadStatus::Loading,
            filter,
            focus: FilterFocus::PriceMin,
            sort: SortKey::default(),
            selected: 0,
            logs: VecDeque::with_capacity(200),
            help_overlay: false,
        }
    }

    /// Filtered, then sorted by the active key.
    pub fn visible_players(&self) -> Vec<&Player> {
        let Some(table) = &self.table else {
            return Vec::new();
        };
        self.filter.select(&table.players, self.sort)
    }

    pub fn selected_player(&self) -> Option<&Player> {
        self.visible_players().get(self.selected).copied()
    }

    /// Blocking error only when there is nothing to show.
    pub fn blocking_error(&self) -> Option<&str> {
        match (&self.status, &self.table) {
            (LoadStatus::Failed(msg), None) => Some(msg.as_str()),
            _ => None,
        }
    }

    pub fn toggle_position(&mut self, position: Position) {
        self.filter.toggle_position(position);
        self.clamp_selection();
    }

    pub fn cycle_focus(&mut self) {
        self.focus = self.focus.next();
    }

    pub fn cycle_sort(&mut self) {
        self.sort = self.sort.next();
        self.selected = 0;
    }

    /// Nudge the focused control by one step in `direction` (+1 / -1).
    pub fn adjust_focused(&mut self, direction: i8) {
        let bounds = self.table.as_ref().and_then(|t| t.price_bounds);
        match self.focus {
            FilterFocus::PriceMin => {
                self.filter.price_min =
                    (self.filter.price_min + PRICE_STEP * f64::from(direction)).max(0.0);
                if self.filter.price_min > self.filter.price_max {
                    self.filter.price_min = self.filter.price_max;
                }
            }
            FilterFocus::PriceMax => {
                self.filter.price_max =
                    (self.filter.price_max + PRICE_STEP * f64::from(direction)).max(0.0);
                if self.filter.price_max < self.filter.price_min {
                    self.filter.price_max = self.filter.price_min;
                }
            }
            FilterFocus::MinMinutes => {
                self.filter.min_minutes = if direction >= 0 {
                    self.filter.min_minutes.saturating_add(MINUTES_STEP)
                } else {
                    self.filter.min_minutes.saturating_sub(MINUTES_STEP)
                };
            }
        }
        self.filter = self.filter.clamped_to(bounds);
        self.clamp_selection();
    }

    pub fn select_next(&mut self) {
        let total = self.visible_players().len();
        if total == 0 {
            self.selected = 0;
            return;
        }
        self.selected = (self.selected + 1).min(total - 1);
    }

    pub fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn clamp_selection(&mut self) {
        let total = self.visible_players().len();
        if total == 0 {
            self.selected = 0;
        } else if self.selected >= total {
            self.selected = total - 1;
        }
    }

    pub fn push_log(&mut self, msg: impl Into<String>) {
        const MAX_LOGS: usize = 200;
        self.logs.push_back(msg.into());
        while self.logs.len() > MAX_LOGS {
            self.logs.pop_front();
        }
    }
}

#[derive(Debug, Clone)]
pub enum Delta {
    SetTable(Box<PlayerTable>),
    FetchFailed(String),
    Log(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderCommand {
    /// `force` bypasses the memoized payloads.
    Refresh { force: bool },
}

pub fn apply_delta(state: &mut AppState, delta: Delta) {
    match delta {
        Delta::SetTable(table) => {
            let first_load = state.table.is_none();
            if !table.report.is_clean() {
                state.push_log(format!("[WARN] {}", table.report.summary()));
            } else {
                state.push_log(format!("[INFO] {}", table.report.summary()));
            }
            let table = *table;
            if first_load {
                state.filter = state.filter.clamped_to(table.price_bounds);
            }
            state.table = Some(table);
            state.table_updated = Some(SystemTime::now());
            state.status = LoadStatus::Ready;
            state.clamp_selection();
        }
        Delta::FetchFailed(msg) => {
            state.push_log(format!("[ERROR] {msg}"));
            state.status = LoadStatus::Failed(msg);
        }
        Delta::Log(msg) => state.push_log(msg),
    }
}
