use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::events::DomainEvent;
use super::player::Roster;
use super::shootout::PenaltyShootoutRecord;

/// Snapshot format version for forward-compat rejection on load.
pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Team {
    Home,
    Away,
}

impl Team {
    pub fn opponent(self) -> Team {
        match self {
            Team::Home => Team::Away,
            Team::Away => Team::Home,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum MatchPeriod {
    FirstHalf,
    HalfTime,
    SecondHalf,
    FullTime,
    ExtraTimeFirstHalf,
    ExtraTimeHalfTime,
    ExtraTimeSecondHalf,
    PenaltyShootout,
}

impl MatchPeriod {
    /// Whether `next` is an adjacent transition in the period machine.
    ///
    /// `FullTime -> ExtraTimeFirstHalf` is the optional extra-time branch;
    /// `ExtraTimeSecondHalf` forks to either `FullTime` or `PenaltyShootout`.
    pub fn can_transition_to(self, next: MatchPeriod) -> bool {
        use MatchPeriod::*;
        matches!(
            (self, next),
            (FirstHalf, HalfTime)
                | (HalfTime, SecondHalf)
                | (SecondHalf, FullTime)
                | (FullTime, ExtraTimeFirstHalf)
                | (ExtraTimeFirstHalf, ExtraTimeHalfTime)
                | (ExtraTimeHalfTime, ExtraTimeSecondHalf)
                | (ExtraTimeSecondHalf, FullTime)
                | (ExtraTimeSecondHalf, PenaltyShootout)
                | (PenaltyShootout, FullTime)
        )
    }
}

/// Aggregate counters for one side, incrementally maintained by the engine
/// and always re-derivable from the event log.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct TeamStats {
    pub goals: u16,
    pub fouls: u16,
    pub yellow_cards: u16,
    pub red_cards: u16,
    pub shots_on_target: u16,
    pub shots_off_target: u16,
    pub saves: u16,
    pub corners: u16,
    pub offsides: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TeamSide {
    pub name: String,
    pub roster: Roster,
    pub stats: TeamStats,
}

impl TeamSide {
    pub fn new(name: impl Into<String>, roster: Roster) -> Self {
        Self { name: name.into(), roster, stats: TeamStats::default() }
    }
}

/// `{home, away, draw}` triple from the analysis service.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct WinProbability {
    pub home: f32,
    pub away: f32,
    pub draw: f32,
}

impl Default for WinProbability {
    fn default() -> Self {
        Self { home: 1.0 / 3.0, away: 1.0 / 3.0, draw: 1.0 / 3.0 }
    }
}

impl WinProbability {
    /// Scale the triple so it sums to 1.0. A degenerate all-zero triple
    /// falls back to the uniform prior.
    pub fn normalized(self) -> Self {
        let sum = self.home + self.away + self.draw;
        if !sum.is_finite() || sum <= f32::EPSILON {
            return Self::default();
        }
        Self { home: self.home / sum, away: self.away / sum, draw: self.draw / sum }
    }

    pub fn for_team(&self, team: Team) -> f32 {
        match team {
            Team::Home => self.home,
            Team::Away => self.away,
        }
    }
}

/// Active injury stoppage. At most one exists at a time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InjuryStoppageRecord {
    pub team: Team,
    pub player_number: u8,
    /// Match clock seconds when play stopped.
    pub started_at: u32,
    /// Event that logged the injury; annotated with the stoppage
    /// duration on resume.
    pub event_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PollOption {
    pub label: String,
    pub votes: u32,
}

/// Fan poll overlay state.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PollRecord {
    pub question: String,
    pub options: Vec<PollOption>,
    pub open: bool,
}

/// VAR check in progress or resolved.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VarRecord {
    pub incident: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis: Option<String>,
    pub resolved: bool,
}

/// Canonical match state. Exactly one snapshot exists per device at a time;
/// it is mutated exclusively through engine commands.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MatchSnapshot {
    pub version: u32,
    pub home: TeamSide,
    pub away: TeamSide,
    /// Match clock in seconds. Monotonically non-decreasing while running.
    pub clock_seconds: u32,
    pub clock_running: bool,
    pub period: MatchPeriod,
    /// Injury-time minutes shown for the current period. Reset on every
    /// period transition.
    pub injury_time_mins: u8,
    /// Append-only domain event log; the source of truth for aggregates.
    pub events: Vec<DomainEvent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shootout: Option<PenaltyShootoutRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub injury_stoppage: Option<InjuryStoppageRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub poll: Option<PollRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub var_check: Option<VarRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub win_probability: Option<WinProbability>,
    /// Snapshots created from a shared seed token reject all mutation.
    #[serde(default)]
    pub view_only: bool,
}

impl MatchSnapshot {
    pub fn new(home: TeamSide, away: TeamSide) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            home,
            away,
            clock_seconds: 0,
            clock_running: false,
            period: MatchPeriod::FirstHalf,
            injury_time_mins: 0,
            events: Vec::new(),
            shootout: None,
            injury_stoppage: None,
            poll: None,
            var_check: None,
            win_probability: None,
            view_only: false,
        }
    }

    pub fn side(&self, team: Team) -> &TeamSide {
        match team {
            Team::Home => &self.home,
            Team::Away => &self.away,
        }
    }

    pub fn side_mut(&mut self, team: Team) -> &mut TeamSide {
        match team {
            Team::Home => &mut self.home,
            Team::Away => &mut self.away,
        }
    }

    pub fn score(&self) -> (u16, u16) {
        (self.home.stats.goals, self.away.stats.goals)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn period_machine_accepts_only_adjacent_transitions() {
        use MatchPeriod::*;
        assert!(FirstHalf.can_transition_to(HalfTime));
        assert!(ExtraTimeSecondHalf.can_transition_to(FullTime));
        assert!(ExtraTimeSecondHalf.can_transition_to(PenaltyShootout));
        assert!(PenaltyShootout.can_transition_to(FullTime));

        assert!(!FirstHalf.can_transition_to(SecondHalf));
        assert!(!HalfTime.can_transition_to(FirstHalf));
        assert!(!FullTime.can_transition_to(PenaltyShootout));
        assert!(!SecondHalf.can_transition_to(ExtraTimeFirstHalf));
    }

    #[test]
    fn win_probability_normalizes_to_unit_sum() {
        let p = WinProbability { home: 2.0, away: 1.0, draw: 1.0 }.normalized();
        assert!((p.home + p.away + p.draw - 1.0).abs() < 1e-6);
        assert!((p.home - 0.5).abs() < 1e-6);

        let degenerate = WinProbability { home: 0.0, away: 0.0, draw: 0.0 }.normalized();
        assert!((degenerate.home - 1.0 / 3.0).abs() < 1e-6);
    }
}
