use std::fmt;
use std::str::FromStr;

use serde_json::Value;

use crate::error::{Issue, LookupKind, NormalizeReport};
use crate::schedule::TeamSchedule;
use crate::teams::TeamDirectory;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Position {
    Gkp,
    Def,
    Mid,
    Fwd,
}

impl Position {
    pub const ALL: [Position; 4] = [Position::Gkp, Position::Def, Position::Mid, Position::Fwd];

    pub fn from_element_type(element_type: u64) -> Option<Self> {
        match element_type {
            1 => Some(Position::Gkp),
            2 => Some(Position::Def),
            3 => Some(Position::Mid),
            4 => Some(Position::Fwd),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Position::Gkp => "GKP",
            Position::Def => "DEF",
            Position::Mid => "MID",
            Position::Fwd => "FWD",
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Position {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Position::ALL
            .into_iter()
            .find(|p| p.label().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown position {s:?}"))
    }
}

/// One analysis-ready row. Rebuilt from scratch on every pipeline run.
#[derive(Debug, Clone, PartialEq)]
pub struct Player {
    pub name: String,
    pub team_name: Option<String>,
    pub position: Option<Position>,
    pub price: Option<f64>,
    pub minutes: Option<u32>,
    pub total_points: Option<i32>,
    pub expected_goal_involvements: Option<f64>,
    pub xgi_per_90: f64,
    pub next_5_fixtures: String,
    /// Mean difficulty rating over the same upcoming fixtures.
    pub fixture_difficulty: Option<f64>,
    pub chance_of_playing_next_round: Option<u8>,
}

pub fn normalize_players(
    elements: &[Value],
    teams: &TeamDirectory,
    schedule: &TeamSchedule,
) -> (Vec<Player>, NormalizeReport) {
    let mut report = NormalizeReport {
        records_seen: elements.len(),
        ..NormalizeReport::default()
    };
    let mut out = Vec::with_capacity(elements.len());

    for element in elements {
        match normalize_player(element, teams, schedule, &mut report) {
            Some(player) => out.push(player),
            None => report.record(Issue::MalformedRecord),
        }
    }

    report.records_kept = out.len();
    (out, report)
}

fn normalize_player(
    v: &Value,
    teams: &TeamDirectory,
    schedule: &TeamSchedule,
    report: &mut NormalizeReport,
) -> Option<Player> {
    let obj = v.as_object()?;
    let name = obj
        .get("web_name")
        .and_then(|x| x.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())?
        .to_string();

    let team_id = obj.get("team").and_then(|x| x.as_u64());
    let team_name = team_id
        .and_then(|id| u32::try_from(id).ok())
        .and_then(|id| teams.name(id))
        .map(|s| s.to_string());
    if team_name.is_none() {
        report.record(Issue::LookupMiss {
            kind: LookupKind::Team,
        });
    }

    let position = obj
        .get("element_type")
        .and_then(|x| x.as_u64())
        .and_then(Position::from_element_type);
    if position.is_none() {
        report.record(Issue::LookupMiss {
            kind: LookupKind::Position,
        });
    }

    let price = coerce_field(obj.get("now_cost"), "now_cost", report).map(|cost| cost / 10.0);
    let minutes = coerce_field(obj.get("minutes"), "minutes", report).and_then(|m| {
        if (0.0..=f64::from(u32::MAX)).contains(&m) {
            Some(m.round() as u32)
        } else {
            report.record(Issue::Coercion { field: "minutes" });
            None
        }
    });
    // Validated for the report only; not part of the projected row.
    coerce_field(obj.get("expected_goals"), "expected_goals", report);
    coerce_field(obj.get("expected_assists"), "expected_assists", report);
    let xgi = coerce_field(
        obj.get("expected_goal_involvements"),
        "expected_goal_involvements",
        report,
    );
    let total_points = coerce_field(obj.get("total_points"), "total_points", report)
        .map(|p| p.round() as i32);
    let chance_of_playing_next_round = coerce_field(
        obj.get("chance_of_playing_next_round"),
        "chance_of_playing_next_round",
        report,
    )
    .map(|c| c.clamp(0.0, 100.0).round() as u8);

    let schedule_id = team_id.and_then(|id| u32::try_from(id).ok());
    let next_5_fixtures = schedule_id
        .map(|id| schedule.fixtures_string(id))
        .unwrap_or_default();
    let fixture_difficulty = schedule_id.and_then(|id| schedule.average_difficulty(id));

    Some(Player {
        name,
        team_name,
        position,
        price,
        minutes,
        total_points,
        expected_goal_involvements: xgi,
        xgi_per_90: xgi_per_90(xgi, minutes),
        next_5_fixtures,
        fixture_difficulty,
        chance_of_playing_next_round,
    })
}

/// xGI scaled to 90 minutes. Zero minutes, missing inputs, or any
/// non-finite or negative result resolve to `0.0`.
pub fn xgi_per_90(xgi: Option<f64>, minutes: Option<u32>) -> f64 {
    let (Some(xgi), Some(minutes)) = (xgi, minutes) else {
        return 0.0;
    };
    if minutes == 0 {
        return 0.0;
    }
    let rate = xgi / f64::from(minutes) * 90.0;
    if rate.is_finite() && rate > 0.0 {
        rate
    } else {
        0.0
    }
}

/// Accepts JSON numbers and numeric strings (the API sends xG as `"1.23"`).
/// Absent and `null` fields are `None` without an issue; anything else that
/// fails to parse is recorded as a coercion issue.
fn coerce_field(
    v: Option<&Value>,
    field: &'static str,
    report: &mut NormalizeReport,
) -> Option<f64> {
    let v = v?;
    if v.is_null() {
        return None;
    }
    let parsed = coerce_number(v);
    if parsed.is_none() {
        report.record(Issue::Coercion { field });
    }
    parsed
}

fn coerce_number(v: &Value) -> Option<f64> {
    let n = match v {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    n.is_finite().then_some(n)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn coerce_number_handles_strings_and_numbers() {
        assert_eq!(coerce_number(&json!("1.25")), Some(1.25));
        assert_eq!(coerce_number(&json!(" 7 ")), Some(7.0));
        assert_eq!(coerce_number(&json!(450)), Some(450.0));
        assert_eq!(coerce_number(&json!("n/a")), None);
        assert_eq!(coerce_number(&json!("NaN")), None);
        assert_eq!(coerce_number(&json!(true)), None);
    }

    #[test]
    fn xgi_per_90_zero_minutes_is_zero() {
        assert_eq!(xgi_per_90(Some(1.2), Some(0)), 0.0);
        assert_eq!(xgi_per_90(Some(0.0), Some(0)), 0.0);
        assert_eq!(xgi_per_90(None, Some(900)), 0.0);
        assert_eq!(xgi_per_90(Some(1.0), None), 0.0);
        assert_eq!(xgi_per_90(Some(-1.0), Some(90)), 0.0);
    }

    #[test]
    fn xgi_per_90_scales_to_ninety_minutes() {
        let rate = xgi_per_90(Some(4.5), Some(900));
        assert!((rate - 0.45).abs() < 1e-12);
    }

    #[test]
    fn position_round_trips_labels() {
        for pos in Position::ALL {
            assert_eq!(pos.label().parse::<Position>(), Ok(pos));
        }
        assert_eq!(Position::from_element_type(5), None);
        assert!("WB".parse::<Position>().is_err());
    }

    fn normalize_one(element: Value) -> (Player, NormalizeReport) {
        let (mut players, report) = normalize_players(
            &[element],
            &TeamDirectory::default(),
            &TeamSchedule::default(),
        );
        (players.remove(0), report)
    }

    #[test]
    fn negative_minutes_are_counted_as_coercion() {
        let (player, report) = normalize_one(json!({"web_name": "Odd", "minutes": -5}));
        assert_eq!(player.minutes, None);
        assert_eq!(report.count(Issue::Coercion { field: "minutes" }), 1);
    }

    #[test]
    fn chance_of_playing_accepts_numeric_strings() {
        let (player, report) = normalize_one(json!({
            "web_name": "Doubt",
            "chance_of_playing_next_round": "75",
        }));
        assert_eq!(player.chance_of_playing_next_round, Some(75));
        assert_eq!(
            report.count(Issue::Coercion {
                field: "chance_of_playing_next_round"
            }),
            0
        );

        let (player, report) = normalize_one(json!({
            "web_name": "Doubt",
            "chance_of_playing_next_round": "soon",
        }));
        assert_eq!(player.chance_of_playing_next_round, None);
        assert_eq!(
            report.count(Issue::Coercion {
                field: "chance_of_playing_next_round"
            }),
            1
        );

        let (player, _) = normalize_one(json!({
            "web_name": "Fit",
            "chance_of_playing_next_round": 140,
        }));
        assert_eq!(player.chance_of_playing_next_round, Some(100));
    }
}
