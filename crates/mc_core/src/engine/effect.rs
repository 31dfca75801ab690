use crate::models::{DomainEvent, MatchSnapshot, Team, WinProbability};

/// Deferred side effects emitted alongside a transition. The engine never
/// performs I/O itself; an effect runner executes these and feeds results
/// back in as follow-up commands.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Ask the analysis service for a fresh probability triple and derive
    /// the goal-impact delta for the scoring team against `pre_goal`.
    RequestGoalImpact {
        scoring_team: Team,
        pre_goal: WinProbability,
    },
    /// Ask the analysis service for commentary on the appended event.
    RequestCommentary { event: DomainEvent },
    /// Capture the current replay window as a labeled highlight.
    CaptureHighlight { label: String },
    /// Persist the new snapshot.
    PersistSnapshot,
}

/// Result of applying one command: the successor snapshot plus pending
/// effects. A rejected command returns the input snapshot unchanged and
/// no effects.
#[derive(Debug, Clone)]
pub struct Transition {
    pub snapshot: MatchSnapshot,
    pub effects: Vec<Effect>,
}

impl Transition {
    pub(crate) fn unchanged(snapshot: MatchSnapshot) -> Self {
        Self { snapshot, effects: Vec::new() }
    }
}
