use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PlayerRole {
    Goalkeeper,
    Defender,
    Midfielder,
    Forward,
}

/// Per-player counters. `shots` counts every shot event including goals,
/// which also increment `goals`.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct PlayerStats {
    pub goals: u16,
    pub shots: u16,
    pub fouls: u16,
    pub yellow_cards: u16,
    pub red_cards: u16,
    pub saves: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Player {
    pub number: u8,
    pub name: String,
    pub role: PlayerRole,
    #[serde(default)]
    pub stats: PlayerStats,
}

impl Player {
    pub fn new(number: u8, name: impl Into<String>, role: PlayerRole) -> Self {
        Self { number, name: name.into(), role, stats: PlayerStats::default() }
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum RosterError {
    #[error("duplicate shirt number {0} in roster")]
    DuplicateNumber(u8),
}

/// Ordered roster with shirt numbers unique within the side.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(transparent)]
pub struct Roster(Vec<Player>);

impl Roster {
    pub fn new(players: Vec<Player>) -> Result<Self, RosterError> {
        let mut seen = std::collections::HashSet::new();
        for player in &players {
            if !seen.insert(player.number) {
                return Err(RosterError::DuplicateNumber(player.number));
            }
        }
        Ok(Self(players))
    }

    pub fn player(&self, number: u8) -> Option<&Player> {
        self.0.iter().find(|p| p.number == number)
    }

    pub fn player_mut(&mut self, number: u8) -> Option<&mut Player> {
        self.0.iter_mut().find(|p| p.number == number)
    }

    pub fn contains(&self, number: u8) -> bool {
        self.player(number).is_some()
    }

    /// Swap `off` out for `on`, keeping `on` at the departing player's
    /// slot. Returns the removed player, or `None` when the swap is
    /// invalid (off absent, or on's number already taken).
    pub fn substitute(&mut self, off: u8, on: Player) -> Option<Player> {
        if self.contains(on.number) {
            return None;
        }
        let slot = self.0.iter().position(|p| p.number == off)?;
        Some(std::mem::replace(&mut self.0[slot], on))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Player> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roster() -> Roster {
        Roster::new(vec![
            Player::new(1, "Keeper", PlayerRole::Goalkeeper),
            Player::new(4, "Back", PlayerRole::Defender),
            Player::new(9, "Striker", PlayerRole::Forward),
        ])
        .unwrap()
    }

    #[test]
    fn rejects_duplicate_numbers() {
        let result = Roster::new(vec![
            Player::new(7, "A", PlayerRole::Midfielder),
            Player::new(7, "B", PlayerRole::Forward),
        ]);
        assert_eq!(result.unwrap_err(), RosterError::DuplicateNumber(7));
    }

    #[test]
    fn substitute_swaps_in_place() {
        let mut r = roster();
        let off = r.substitute(4, Player::new(15, "Sub", PlayerRole::Defender)).unwrap();
        assert_eq!(off.number, 4);
        assert!(r.contains(15));
        assert!(!r.contains(4));
        assert_eq!(r.len(), 3);
    }

    #[test]
    fn substitute_rejects_missing_or_taken_numbers() {
        let mut r = roster();
        assert!(r.substitute(99, Player::new(15, "Sub", PlayerRole::Defender)).is_none());
        assert!(r.substitute(4, Player::new(9, "Clash", PlayerRole::Forward)).is_none());
        assert!(r.contains(4));
    }
}
