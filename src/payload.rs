use serde::Deserialize;
use serde_json::Value;

/// Decoded bootstrap-static payload. Players stay as raw JSON so a single
/// malformed element cannot fail the whole batch.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Bootstrap {
    #[serde(default)]
    pub teams: Vec<RawTeam>,
    #[serde(default)]
    pub elements: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RawTeam {
    pub id: u32,
    pub name: String,
    pub short_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fixture {
    pub id: Option<u32>,
    pub event: Option<u32>,
    pub kickoff_time: Option<String>,
    pub home_team_id: u32,
    pub away_team_id: u32,
    pub home_difficulty: Option<u8>,
    pub away_difficulty: Option<u8>,
    pub finished: bool,
}

/// Both payloads of one fetch. Immutable once built.
#[derive(Debug, Clone, Default)]
pub struct RawPayloads {
    pub bootstrap: Bootstrap,
    pub fixtures: Vec<Fixture>,
}

pub fn parse_bootstrap_json(raw: &str) -> Result<Bootstrap, serde_json::Error> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Ok(Bootstrap::default());
    }
    serde_json::from_str(trimmed)
}

pub fn parse_fixtures_json(raw: &str) -> Result<Vec<Fixture>, serde_json::Error> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Ok(Vec::new());
    }
    let items: Vec<Value> = serde_json::from_str(trimmed)?;
    Ok(items.iter().filter_map(parse_fixture).collect())
}

fn parse_fixture(v: &Value) -> Option<Fixture> {
    let home_team_id = as_u32(v.get("team_h")?)?;
    let away_team_id = as_u32(v.get("team_a")?)?;

    let finished = v
        .get("finished")
        .and_then(|x| x.as_bool())
        .unwrap_or(false);
    let kickoff_time = v
        .get("kickoff_time")
        .and_then(|x| x.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string());

    Some(Fixture {
        id: v.get("id").and_then(as_u32),
        event: v.get("event").and_then(as_u32),
        kickoff_time,
        home_team_id,
        away_team_id,
        home_difficulty: v.get("team_h_difficulty").and_then(as_u8),
        away_difficulty: v.get("team_a_difficulty").and_then(as_u8),
        finished,
    })
}

fn as_u32(v: &Value) -> Option<u32> {
    v.as_u64().and_then(|n| u32::try_from(n).ok())
}

fn as_u8(v: &Value) -> Option<u8> {
    v.as_u64().and_then(|n| u8::try_from(n).ok())
}
