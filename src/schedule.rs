use std::collections::BTreeMap;
use std::fmt;
use std::ops::RangeInclusive;

use chrono::DateTime;

use crate::payload::Fixture;
use crate::teams::TeamDirectory;

pub const DEFAULT_HORIZON: usize = 5;
pub const UNKNOWN_OPPONENT: &str = "Unknown";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Venue {
    Home,
    Away,
}

impl Venue {
    pub fn tag(self) -> &'static str {
        match self {
            Venue::Home => "H",
            Venue::Away => "A",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Opponent {
    pub short_name: String,
    pub venue: Venue,
    /// Difficulty rating from this team's side of the fixture.
    pub difficulty: Option<u8>,
}

impl fmt::Display for Opponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.short_name, self.venue.tag())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixtureOrder {
    /// Trust the upstream list order.
    Source,
    /// Stable sort by gameweek then kickoff; undated fixtures go last.
    Chronological,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleOptions {
    pub horizon: usize,
    pub order: FixtureOrder,
    pub team_ids: RangeInclusive<u32>,
}

impl Default for ScheduleOptions {
    fn default() -> Self {
        Self {
            horizon: DEFAULT_HORIZON,
            order: FixtureOrder::Chronological,
            team_ids: 1..=20,
        }
    }
}

/// Upcoming opponents per team, already truncated to the horizon.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TeamSchedule {
    teams: BTreeMap<u32, Vec<Opponent>>,
}

impl TeamSchedule {
    pub fn opponents(&self, team_id: u32) -> Option<&[Opponent]> {
        self.teams.get(&team_id).map(Vec::as_slice)
    }

    /// `"AVL (H), CHE (A)"`; empty for teams with no upcoming fixtures or
    /// ids outside the schedule.
    pub fn fixtures_string(&self, team_id: u32) -> String {
        self.opponents(team_id)
            .map(|list| {
                list.iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(", ")
            })
            .unwrap_or_default()
    }

    pub fn average_difficulty(&self, team_id: u32) -> Option<f64> {
        let ratings: Vec<f64> = self
            .opponents(team_id)?
            .iter()
            .filter_map(|o| o.difficulty)
            .map(f64::from)
            .collect();
        if ratings.is_empty() {
            return None;
        }
        Some(ratings.iter().sum::<f64>() / ratings.len() as f64)
    }

    pub fn team_ids(&self) -> impl Iterator<Item = u32> + '_ {
        self.teams.keys().copied()
    }
}

pub fn build_team_schedule(
    fixtures: &[Fixture],
    teams: &TeamDirectory,
    opts: &ScheduleOptions,
) -> TeamSchedule {
    let mut upcoming: Vec<&Fixture> = fixtures.iter().filter(|f| !f.finished).collect();
    if opts.order == FixtureOrder::Chronological {
        upcoming.sort_by_key(|f| chronological_key(f));
    }

    let mut schedule: BTreeMap<u32, Vec<Opponent>> =
        opts.team_ids.clone().map(|id| (id, Vec::new())).collect();

    for fixture in upcoming {
        if let Some(list) = schedule.get_mut(&fixture.home_team_id) {
            list.push(Opponent {
                short_name: short_or_unknown(teams, fixture.away_team_id),
                venue: Venue::Home,
                difficulty: fixture.home_difficulty,
            });
        }
        if let Some(list) = schedule.get_mut(&fixture.away_team_id) {
            list.push(Opponent {
                short_name: short_or_unknown(teams, fixture.home_team_id),
                venue: Venue::Away,
                difficulty: fixture.away_difficulty,
            });
        }
    }

    for list in schedule.values_mut() {
        list.truncate(opts.horizon);
    }

    TeamSchedule { teams: schedule }
}

fn short_or_unknown(teams: &TeamDirectory, id: u32) -> String {
    teams.short_name(id).unwrap_or(UNKNOWN_OPPONENT).to_string()
}

// (undated, gameweek, kickoff seconds). Unparseable kickoffs rank after
// parseable ones within the same gameweek.
fn chronological_key(f: &Fixture) -> (bool, u32, i64) {
    let kickoff = f
        .kickoff_time
        .as_deref()
        .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
        .map(|dt| dt.timestamp());
    let undated = f.event.is_none() && kickoff.is_none();
    (
        undated,
        f.event.unwrap_or(u32::MAX),
        kickoff.unwrap_or(i64::MAX),
    )
}
