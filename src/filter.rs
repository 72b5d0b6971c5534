use std::cmp::Ordering;
use std::collections::BTreeSet;

use crate::pipeline::PriceBounds;
use crate::players::{Player, Position};

#[derive(Debug, Clone, PartialEq)]
pub struct PlayerFilter {
    pub positions: BTreeSet<Position>,
    /// Inclusive lower price bound.
    pub price_min: f64,
    /// Inclusive upper price bound.
    pub price_max: f64,
    pub min_minutes: u32,
}

impl Default for PlayerFilter {
    fn default() -> Self {
        Self {
            positions: BTreeSet::from([Position::Mid, Position::Fwd]),
            price_min: 5.0,
            price_max: 12.0,
            min_minutes: 400,
        }
    }
}

impl PlayerFilter {
    pub const MAX_MIN_MINUTES: u32 = 3000;

    /// Rows with a missing position, price or minutes never match.
    pub fn matches(&self, player: &Player) -> bool {
        let Some(position) = player.position else {
            return false;
        };
        let Some(price) = player.price else {
            return false;
        };
        let Some(minutes) = player.minutes else {
            return false;
        };
        self.positions.contains(&position)
            && self.price_min <= price
            && price <= self.price_max
            && minutes >= self.min_minutes
    }

    /// An empty result is a valid outcome, not an error.
    pub fn apply<'a>(&self, players: &'a [Player]) -> Vec<&'a Player> {
        players.iter().filter(|p| self.matches(p)).collect()
    }

    /// `apply` then `sort_players`. The filter is used exactly as given.
    pub fn select<'a>(&self, players: &'a [Player], key: SortKey) -> Vec<&'a Player> {
        let mut rows = self.apply(players);
        sort_players(&mut rows, key);
        rows
    }

    /// Keeps the price range inside the data-derived bounds, the way a slider
    /// would, and caps the minutes threshold. Only for seeding interactive
    /// controls; an explicit query must not go through this.
    pub fn clamped_to(&self, bounds: Option<PriceBounds>) -> Self {
        let mut out = self.clone();
        out.min_minutes = out.min_minutes.min(Self::MAX_MIN_MINUTES);
        let Some(bounds) = bounds else {
            return out;
        };
        out.price_min = out.price_min.clamp(bounds.min, bounds.max);
        out.price_max = out.price_max.clamp(bounds.min, bounds.max);
        if out.price_min > out.price_max {
            std::mem::swap(&mut out.price_min, &mut out.price_max);
        }
        out
    }

    pub fn toggle_position(&mut self, position: Position) {
        if !self.positions.remove(&position) {
            self.positions.insert(position);
        }
    }

    pub fn describe(&self) -> String {
        let positions = if self.positions.is_empty() {
            "-".to_string()
        } else {
            self.positions
                .iter()
                .map(|p| p.label())
                .collect::<Vec<_>>()
                .join(",")
        };
        format!(
            "{positions} | £{:.1}-{:.1}m | ≥{} min",
            self.price_min, self.price_max, self.min_minutes
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    #[default]
    XgiPer90,
    Xgi,
    Price,
    Points,
    Minutes,
}

impl SortKey {
    pub fn next(self) -> Self {
        match self {
            SortKey::XgiPer90 => SortKey::Xgi,
            SortKey::Xgi => SortKey::Price,
            SortKey::Price => SortKey::Points,
            SortKey::Points => SortKey::Minutes,
            SortKey::Minutes => SortKey::XgiPer90,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SortKey::XgiPer90 => "xGI/90",
            SortKey::Xgi => "xGI",
            SortKey::Price => "PRICE",
            SortKey::Points => "PTS",
            SortKey::Minutes => "MINS",
        }
    }

    fn value(self, p: &Player) -> Option<f64> {
        match self {
            SortKey::XgiPer90 => Some(p.xgi_per_90),
            SortKey::Xgi => p.expected_goal_involvements,
            SortKey::Price => p.price,
            SortKey::Points => p.total_points.map(f64::from),
            SortKey::Minutes => p.minutes.map(f64::from),
        }
    }
}

/// Descending by `key`; stable, missing values last.
pub fn sort_players(players: &mut [&Player], key: SortKey) {
    players.sort_by(|a, b| match (key.value(a), key.value(b)) {
        (Some(x), Some(y)) => y.partial_cmp(&x).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
}
