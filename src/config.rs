use std::collections::BTreeSet;
use std::env;
use std::time::Duration;

use crate::filter::PlayerFilter;
use crate::players::Position;
use crate::schedule::{FixtureOrder, ScheduleOptions};

pub const DEFAULT_BOOTSTRAP_URL: &str = "https://fantasy.premierleague.com/api/bootstrap-static/";
pub const DEFAULT_FIXTURES_URL: &str = "https://fantasy.premierleague.com/api/fixtures/";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bootstrap_url: String,
    pub fixtures_url: String,
    pub http_timeout: Duration,
    pub cache_ttl: Duration,
    pub disk_cache: bool,
    pub schedule: ScheduleOptions,
    pub default_filter: PlayerFilter,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bootstrap_url: DEFAULT_BOOTSTRAP_URL.to_string(),
            fixtures_url: DEFAULT_FIXTURES_URL.to_string(),
            http_timeout: Duration::from_secs(10),
            cache_ttl: Duration::from_secs(300),
            disk_cache: false,
            schedule: ScheduleOptions::default(),
            default_filter: PlayerFilter::default(),
        }
    }
}

impl AppConfig {
    /// Reads `FPL_*` variables. Unset or malformed values fall back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let http_timeout = non_empty("FPL_HTTP_TIMEOUT_SECS")
            .and_then(|val| val.trim().parse::<u64>().ok())
            .unwrap_or(10)
            .clamp(2, 120);
        let cache_ttl = non_empty("FPL_CACHE_TTL_SECS")
            .and_then(|val| val.trim().parse::<u64>().ok())
            .unwrap_or(300)
            .min(86_400);
        let horizon = non_empty("FPL_FIXTURE_HORIZON")
            .and_then(|val| val.trim().parse::<usize>().ok())
            .unwrap_or(defaults.schedule.horizon)
            .clamp(1, 38);
        let order = match non_empty("FPL_FIXTURE_ORDER")
            .map(|val| val.trim().to_ascii_lowercase())
            .as_deref()
        {
            Some("source") => FixtureOrder::Source,
            _ => FixtureOrder::Chronological,
        };
        let disk_cache = non_empty("FPL_DISK_CACHE")
            .map(|val| matches!(val.trim(), "1" | "true" | "yes"))
            .unwrap_or(false);

        let base = defaults.default_filter;
        let positions = non_empty("FPL_DEFAULT_POSITIONS")
            .map(|val| parse_positions(&val))
            .filter(|set| !set.is_empty())
            .unwrap_or(base.positions);
        let price_min = parse_f64(non_empty("FPL_DEFAULT_PRICE_MIN")).unwrap_or(base.price_min);
        let price_max = parse_f64(non_empty("FPL_DEFAULT_PRICE_MAX")).unwrap_or(base.price_max);
        let (price_min, price_max) = if price_min <= price_max {
            (price_min, price_max)
        } else {
            (price_max, price_min)
        };
        let min_minutes = non_empty("FPL_DEFAULT_MIN_MINUTES")
            .and_then(|val| val.trim().parse::<u32>().ok())
            .unwrap_or(base.min_minutes)
            .min(PlayerFilter::MAX_MIN_MINUTES);

        Self {
            bootstrap_url: non_empty("FPL_BOOTSTRAP_URL").unwrap_or(defaults.bootstrap_url),
            fixtures_url: non_empty("FPL_FIXTURES_URL").unwrap_or(defaults.fixtures_url),
            http_timeout: Duration::from_secs(http_timeout),
            cache_ttl: Duration::from_secs(cache_ttl),
            disk_cache,
            schedule: ScheduleOptions {
                horizon,
                order,
                ..defaults.schedule
            },
            default_filter: PlayerFilter {
                positions,
                price_min,
                price_max,
                min_minutes,
            },
        }
    }
}

/// Comma/space separated position labels; unknown labels are ignored.
pub fn parse_positions(raw: &str) -> BTreeSet<Position> {
    raw.split(|c: char| c == ',' || c.is_whitespace())
        .filter_map(|part| part.parse::<Position>().ok())
        .collect()
}

fn parse_f64(raw: Option<String>) -> Option<f64> {
    raw.and_then(|val| val.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite() && *v >= 0.0)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(pairs: &[(&str, &str)]) -> AppConfig {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn empty_environment_uses_dashboard_defaults() {
        let cfg = config_from(&[]);
        assert_eq!(cfg.bootstrap_url, DEFAULT_BOOTSTRAP_URL);
        assert_eq!(cfg.cache_ttl, Duration::from_secs(300));
        assert_eq!(cfg.schedule.horizon, 5);
        assert_eq!(cfg.schedule.order, FixtureOrder::Chronological);
        assert_eq!(cfg.default_filter.min_minutes, 400);
        assert_eq!(
            cfg.default_filter.positions,
            BTreeSet::from([Position::Mid, Position::Fwd])
        );
    }

    #[test]
    fn malformed_values_fall_back_and_ranges_clamp() {
        let cfg = config_from(&[
            ("FPL_HTTP_TIMEOUT_SECS", "nope"),
            ("FPL_FIXTURE_HORIZON", "99"),
            ("FPL_DEFAULT_MIN_MINUTES", "9000"),
            ("FPL_DEFAULT_PRICE_MIN", "11"),
            ("FPL_DEFAULT_PRICE_MAX", "6.5"),
            ("FPL_DEFAULT_POSITIONS", "xyz"),
            ("FPL_FIXTURE_ORDER", "SOURCE"),
        ]);
        assert_eq!(cfg.http_timeout, Duration::from_secs(10));
        assert_eq!(cfg.schedule.horizon, 38);
        assert_eq!(cfg.schedule.order, FixtureOrder::Source);
        assert_eq!(cfg.default_filter.min_minutes, 3000);
        assert_eq!(cfg.default_filter.price_min, 6.5);
        assert_eq!(cfg.default_filter.price_max, 11.0);
        assert_eq!(cfg.default_filter.positions.len(), 2);
    }

    #[test]
    fn positions_parse_case_insensitively() {
        let set = parse_positions("gkp, Def  fwd,bogus");
        assert_eq!(
            set,
            BTreeSet::from([Position::Gkp, Position::Def, Position::Fwd])
        );
    }
}
