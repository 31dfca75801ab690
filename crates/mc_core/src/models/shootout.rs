use serde::{Deserialize, Serialize};

use super::snapshot::Team;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AttemptOutcome {
    Scored,
    Saved,
    Missed,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PenaltyAttempt {
    pub team: Team,
    pub player_number: u8,
    pub outcome: AttemptOutcome,
}

/// Penalty shootout sub-state. Attempts strictly alternate between the
/// sides; the score invariant (`home_score` equals the count of scored
/// home attempts, likewise away) is maintained by the engine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PenaltyShootoutRecord {
    pub attempts: Vec<PenaltyAttempt>,
    pub home_score: u8,
    pub away_score: u8,
    pub next_taker: Team,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub winner: Option<Team>,
}

impl PenaltyShootoutRecord {
    pub fn new(first_taker: Team) -> Self {
        Self {
            attempts: Vec::new(),
            home_score: 0,
            away_score: 0,
            next_taker: first_taker,
            winner: None,
        }
    }

    /// Number of kicks taken by one side.
    pub fn taken(&self, team: Team) -> usize {
        self.attempts.iter().filter(|a| a.team == team).count()
    }

    pub fn score(&self, team: Team) -> u8 {
        match team {
            Team::Home => self.home_score,
            Team::Away => self.away_score,
        }
    }
}
