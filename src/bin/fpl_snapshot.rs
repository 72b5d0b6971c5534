use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use tracing_subscriber::EnvFilter;

use fpl_moneyball::config::{AppConfig, parse_positions};
use fpl_moneyball::export;
use fpl_moneyball::feed::load_player_table;
use fpl_moneyball::fetch::HttpSource;
use fpl_moneyball::filter::SortKey;
use fpl_moneyball::schedule::FixtureOrder;
use fpl_moneyball::state::EMPTY_RESULT_MESSAGE;

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut cfg = AppConfig::from_env();
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let export_path = apply_args(&mut cfg, &args)?;

    let source = HttpSource::new(&cfg);
    let table = load_player_table(&source, &cfg.schedule).context("failed to load FPL data")?;
    let filter = &cfg.default_filter;
    let rows = filter.select(&table.players, SortKey::XgiPer90);

    println!("FPL Moneyball snapshot");
    println!("Filter: {}", filter.describe());
    if let Some(bounds) = table.price_bounds {
        println!("Price range in data: £{:.1}m - £{:.1}m", bounds.min, bounds.max);
    }
    println!("Normalized: {}", table.report.summary());
    println!();

    if rows.is_empty() {
        println!("{EMPTY_RESULT_MESSAGE}");
        return Ok(());
    }

    println!(
        "{:<18} {:<16} {:<4} {:>5} {:>5} {:>4} {:>6} {:>7} {:>4}  {}",
        "Player", "Team", "Pos", "£m", "Mins", "Pts", "xGI", "xGI/90", "FDR", "Next 5"
    );
    for p in &rows {
        println!(
            "{:<18} {:<16} {:<4} {:>5} {:>5} {:>4} {:>6} {:>7.2} {:>4}  {}",
            truncate(&p.name, 18),
            truncate(p.team_name.as_deref().unwrap_or("-"), 16),
            p.position.map(|pos| pos.label()).unwrap_or("-"),
            p.price.map(|v| format!("{v:.1}")).unwrap_or_else(|| "-".to_string()),
            p.minutes.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string()),
            p.total_points
                .map(|v| v.to_string())
                .unwrap_or_else(|| "-".to_string()),
            p.expected_goal_involvements
                .map(|v| format!("{v:.2}"))
                .unwrap_or_else(|| "-".to_string()),
            p.xgi_per_90,
            p.fixture_difficulty
                .map(|v| format!("{v:.1}"))
                .unwrap_or_else(|| "-".to_string()),
            p.next_5_fixtures
        );
    }

    if let Some(path) = export_path {
        let n = export::export_players_xlsx(&path, &rows)?;
        println!();
        println!("Exported {n} players to {}", path.display());
    }
    Ok(())
}

/// Applies command-line overrides on top of the env config. Returns the
/// export path when `--export` was given.
fn apply_args(cfg: &mut AppConfig, args: &[String]) -> Result<Option<PathBuf>> {
    let mut export_path = None;
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        let (flag, inline) = match arg.split_once('=') {
            Some((flag, value)) => (flag, Some(value.to_string())),
            None => (arg.as_str(), None),
        };
        let mut value = |name: &str| -> Result<String> {
            inline
                .clone()
                .or_else(|| iter.next().cloned())
                .ok_or_else(|| anyhow!("{name} needs a value"))
        };
        match flag {
            "--positions" => {
                let set = parse_positions(&value(flag)?);
                if set.is_empty() {
                    return Err(anyhow!("--positions needs at least one of GKP,DEF,MID,FWD"));
                }
                cfg.default_filter.positions = set;
            }
            "--price-min" => {
                cfg.default_filter.price_min =
                    value(flag)?.parse().context("--price-min must be a number")?;
            }
            "--price-max" => {
                cfg.default_filter.price_max =
                    value(flag)?.parse().context("--price-max must be a number")?;
            }
            "--min-minutes" => {
                cfg.default_filter.min_minutes =
                    value(flag)?.parse().context("--min-minutes must be an integer")?;
            }
            "--export" => {
                let raw = value(flag)?;
                export_path = Some(if raw.trim().is_empty() {
                    export::default_export_path()
                } else {
                    PathBuf::from(raw)
                });
            }
            "--source-order" => cfg.schedule.order = FixtureOrder::Source,
            other => return Err(anyhow!("unknown argument {other}")),
        }
    }
    if cfg.default_filter.price_min > cfg.default_filter.price_max {
        return Err(anyhow!("--price-min is greater than --price-max"));
    }
    Ok(export_path)
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    s.chars().take(max.saturating_sub(1)).chain(['…']).collect()
}
