use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rust_xlsxwriter::{Workbook, Worksheet};

use crate::players::Player;

const HEADERS: [&str; 11] = [
    "Player",
    "Team",
    "Position",
    "Price (£m)",
    "Minutes",
    "Total Points",
    "xGI",
    "xGI/90",
    "Upcoming Fixtures",
    "Upcoming Fixture Difficulty",
    "Chance of Playing (%)",
];

enum Cell {
    Text(String),
    Number(f64),
    Empty,
}

pub fn default_export_path() -> PathBuf {
    let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    PathBuf::from(format!("fpl_moneyball_{stamp}.xlsx"))
}

/// Writes rows in the given order to a single `Players` sheet.
pub fn export_players_xlsx(path: &Path, players: &[&Player]) -> Result<usize> {
    let mut workbook = Workbook::new();
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Players")?;
        for (col_idx, title) in HEADERS.iter().enumerate() {
            sheet
                .write_string(0, col_idx as u16, *title)
                .with_context(|| format!("write header {title}"))?;
        }
        for (idx, player) in players.iter().enumerate() {
            write_row(sheet, idx as u32 + 1, &player_cells(player))?;
        }
    }

    workbook
        .save(path)
        .with_context(|| format!("failed writing workbook to {}", path.display()))?;
    Ok(players.len())
}

fn player_cells(p: &Player) -> Vec<Cell> {
    let opt_num = |v: Option<f64>| v.map(Cell::Number).unwrap_or(Cell::Empty);
    vec![
        Cell::Text(p.name.clone()),
        p.team_name.clone().map(Cell::Text).unwrap_or(Cell::Empty),
        p.position
            .map(|pos| Cell::Text(pos.label().to_string()))
            .unwrap_or(Cell::Empty),
        opt_num(p.price),
        opt_num(p.minutes.map(f64::from)),
        opt_num(p.total_points.map(f64::from)),
        opt_num(p.expected_goal_involvements),
        Cell::Number(p.xgi_per_90),
        Cell::Text(p.next_5_fixtures.clone()),
        opt_num(p.fixture_difficulty),
        opt_num(p.chance_of_playing_next_round.map(f64::from)),
    ]
}

fn write_row(worksheet: &mut Worksheet, row: u32, cells: &[Cell]) -> Result<()> {
    for (col_idx, cell) in cells.iter().enumerate() {
        let col = col_idx as u16;
        match cell {
            Cell::Text(value) => {
                worksheet.write_string(row, col, value)?;
            }
            Cell::Number(value) => {
                worksheet.write_number(row, col, *value)?;
            }
            Cell::Empty => {}
        }
    }
    Ok(())
}
