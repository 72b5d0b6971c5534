use criterion::{Criterion, criterion_group, criterion_main};
use serde_json::{Value, json};
use std::hint::black_box;

use fpl_moneyball::filter::{PlayerFilter, SortKey, sort_players};
use fpl_moneyball::payload::{
    Bootstrap, RawPayloads, RawTeam, parse_bootstrap_json, parse_fixtures_json,
};
use fpl_moneyball::pipeline::build_player_table;
use fpl_moneyball::players::Position;
use fpl_moneyball::schedule::{FixtureOrder, ScheduleOptions, build_team_schedule};
use fpl_moneyball::teams::TeamDirectory;

fn season_sized_payloads() -> RawPayloads {
    let teams: Vec<RawTeam> = (1..=20u32)
        .map(|id| RawTeam {
            id,
            name: format!("Team {id}"),
            short_name: format!("T{id:02}"),
        })
        .collect();

    let elements: Vec<Value> = (0..700u32)
        .map(|idx| {
            let chance = if idx % 9 == 0 { json!(50) } else { Value::Null };
            json!({
                "web_name": format!("Player {idx}"),
                "team": idx % 20 + 1,
                "element_type": idx % 4 + 1,
                "now_cost": 40 + (idx % 90),
                "minutes": (idx * 37) % 3200,
                "expected_goals": format!("{:.2}", f64::from(idx % 17) * 0.6),
                "expected_assists": format!("{:.2}", f64::from(idx % 11) * 0.4),
                "expected_goal_involvements": format!("{:.2}", f64::from(idx % 23) * 0.7),
                "total_points": idx % 220,
                "chance_of_playing_next_round": chance,
            })
        })
        .collect();

    let mut fixtures = Vec::new();
    for event in 1..=38u32 {
        for pair in 0..10u32 {
            let home = (pair + event) % 20 + 1;
            let away = (pair + event + 10) % 20 + 1;
            fixtures.push(json!({
                "id": event * 10 + pair,
                "event": event,
                "kickoff_time": format!("2025-{:02}-{:02}T15:00:00Z", 8 + event / 5, 1 + event % 27),
                "team_h": home,
                "team_a": away,
                "team_h_difficulty": 1 + pair % 5,
                "team_a_difficulty": 1 + (pair + 2) % 5,
                "finished": event < 8,
            }));
        }
    }
    let fixtures_raw = Value::Array(fixtures).to_string();

    RawPayloads {
        bootstrap: Bootstrap { teams, elements },
        fixtures: parse_fixtures_json(&fixtures_raw).expect("generated fixtures parse"),
    }
}

fn bench_bootstrap_parse(c: &mut Criterion) {
    c.bench_function("bootstrap_parse", |b| {
        b.iter(|| {
            let bootstrap = parse_bootstrap_json(black_box(BOOTSTRAP_JSON)).unwrap();
            black_box(bootstrap.elements.len());
        })
    });
}

fn bench_schedule_build(c: &mut Criterion) {
    let raw = season_sized_payloads();
    let teams = TeamDirectory::from_teams(&raw.bootstrap.teams);
    let chronological = ScheduleOptions::default();
    let source = ScheduleOptions {
        order: FixtureOrder::Source,
        ..ScheduleOptions::default()
    };

    c.bench_function("schedule_build_chronological", |b| {
        b.iter(|| {
            let schedule = build_team_schedule(black_box(&raw.fixtures), &teams, &chronological);
            black_box(schedule.fixtures_string(1).len());
        })
    });
    c.bench_function("schedule_build_source", |b| {
        b.iter(|| {
            let schedule = build_team_schedule(black_box(&raw.fixtures), &teams, &source);
            black_box(schedule.fixtures_string(1).len());
        })
    });
}

fn bench_player_table(c: &mut Criterion) {
    let raw = season_sized_payloads();
    let opts = ScheduleOptions::default();

    c.bench_function("player_table_build", |b| {
        b.iter(|| {
            let table = build_player_table(black_box(&raw), &opts);
            black_box(table.players.len());
        })
    });
}

fn bench_filter_and_sort(c: &mut Criterion) {
    let table = build_player_table(&season_sized_payloads(), &ScheduleOptions::default());
    let narrow = PlayerFilter::default().clamped_to(table.price_bounds);
    let wide = PlayerFilter {
        positions: Position::ALL.into_iter().collect(),
        price_min: 0.0,
        price_max: 20.0,
        min_minutes: 0,
    };

    c.bench_function("filter_sort_default", |b| {
        b.iter(|| {
            let mut rows = narrow.apply(black_box(&table.players));
            sort_players(&mut rows, SortKey::XgiPer90);
            black_box(rows.len());
        })
    });
    c.bench_function("filter_sort_all_by_points", |b| {
        b.iter(|| {
            let mut rows = wide.apply(black_box(&table.players));
            sort_players(&mut rows, SortKey::Points);
            black_box(rows.len());
        })
    });
}

criterion_group!(
    perf,
    bench_bootstrap_parse,
    bench_schedule_build,
    bench_player_table,
    bench_filter_and_sort
);
criterion_main!(perf);

static BOOTSTRAP_JSON: &str = include_str!("../tests/fixtures/bootstrap_static.json");
