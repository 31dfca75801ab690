use serde::{Deserialize, Serialize};

use crate::models::{
    AttemptOutcome, EventDetails, EventType, MatchPeriod, Player, Team, WinProbability,
};

/// The closed command set accepted by [`Engine::apply`](super::Engine::apply).
///
/// Commands carry everything a transition needs; the engine itself holds
/// no hidden inputs, so replaying a command sequence reproduces the same
/// snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Command {
    SetClock {
        seconds: u32,
        running: bool,
    },
    ApplyDomainEvent {
        event_type: EventType,
        team: Team,
        #[serde(skip_serializing_if = "Option::is_none")]
        player_number: Option<u8>,
        #[serde(skip_serializing_if = "Option::is_none")]
        details: Option<EventDetails>,
    },
    SubstitutePlayer {
        team: Team,
        off: u8,
        on: Player,
    },
    SetMatchPeriod {
        period: MatchPeriod,
    },
    AddInjuryTime {
        minutes: u8,
    },
    LogInjury {
        team: Team,
        player_number: u8,
    },
    ResumeFromInjury,
    StartPenaltyShootout {
        first_taker: Team,
    },
    LogPenaltyAttempt {
        player_number: u8,
        outcome: AttemptOutcome,
    },
    StartVarCheck {
        incident: String,
    },
    SetVarAnalysis {
        analysis: String,
    },
    StartPoll {
        question: String,
        options: Vec<String>,
    },
    VotePoll {
        option_index: usize,
    },
    ClosePoll,
    SetWinProbability {
        probability: WinProbability,
    },
}
