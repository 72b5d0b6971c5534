use std::collections::HashMap;

use crate::payload::RawTeam;

/// Lookup tables from team id to display name and short code.
#[derive(Debug, Clone, Default)]
pub struct TeamDirectory {
    names: HashMap<u32, String>,
    short_names: HashMap<u32, String>,
}

impl TeamDirectory {
    /// Duplicate ids are not an error; the last record wins.
    pub fn from_teams(teams: &[RawTeam]) -> Self {
        let mut dir = Self {
            names: HashMap::with_capacity(teams.len()),
            short_names: HashMap::with_capacity(teams.len()),
        };
        for team in teams {
            dir.names.insert(team.id, team.name.clone());
            dir.short_names.insert(team.id, team.short_name.clone());
        }
        dir
    }

    pub fn name(&self, id: u32) -> Option<&str> {
        self.names.get(&id).map(String::as_str)
    }

    pub fn short_name(&self, id: u32) -> Option<&str> {
        self.short_names.get(&id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn team(id: u32, name: &str, short: &str) -> RawTeam {
        RawTeam {
            id,
            name: name.to_string(),
            short_name: short.to_string(),
        }
    }

    #[test]
    fn resolves_names_and_short_codes() {
        let dir = TeamDirectory::from_teams(&[team(1, "Arsenal", "ARS"), team(2, "Aston Villa", "AVL")]);
        assert_eq!(dir.name(2), Some("Aston Villa"));
        assert_eq!(dir.short_name(1), Some("ARS"));
        assert_eq!(dir.name(99), None);
        assert_eq!(dir.len(), 2);
    }

    #[test]
    fn duplicate_ids_last_write_wins() {
        let dir = TeamDirectory::from_teams(&[team(3, "Old", "OLD"), team(3, "New", "NEW")]);
        assert_eq!(dir.name(3), Some("New"));
        assert_eq!(dir.short_name(3), Some("NEW"));
        assert_eq!(dir.len(), 1);
    }
}
