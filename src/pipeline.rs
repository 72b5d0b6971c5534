use crate::error::NormalizeReport;
use crate::payload::RawPayloads;
use crate::players::{Player, normalize_players};
use crate::schedule::{ScheduleOptions, TeamSchedule, build_team_schedule};
use crate::teams::TeamDirectory;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceBounds {
    pub min: f64,
    pub max: f64,
}

/// Normalized table produced by one pipeline run.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerTable {
    pub players: Vec<Player>,
    pub report: NormalizeReport,
    pub price_bounds: Option<PriceBounds>,
    pub schedule: TeamSchedule,
}

impl PlayerTable {
    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }
}

/// Raw payloads to normalized table. Pure: identical inputs give identical
/// output, so callers may memoize it separately from filtering.
pub fn build_player_table(raw: &RawPayloads, opts: &ScheduleOptions) -> PlayerTable {
    let teams = TeamDirectory::from_teams(&raw.bootstrap.teams);
    let schedule = build_team_schedule(&raw.fixtures, &teams, opts);
    let (players, report) = normalize_players(&raw.bootstrap.elements, &teams, &schedule);
    let price_bounds = price_bounds(&players);

    tracing::debug!(
        teams = teams.len(),
        fixtures = raw.fixtures.len(),
        players = players.len(),
        "player table built"
    );

    PlayerTable {
        players,
        report,
        price_bounds,
        schedule,
    }
}

pub fn price_bounds(players: &[Player]) -> Option<PriceBounds> {
    let mut prices = players.iter().filter_map(|p| p.price);
    let first = prices.next()?;
    let (min, max) = prices.fold((first, first), |(lo, hi), p| (lo.min(p), hi.max(p)));
    Some(PriceBounds { min, max })
}
