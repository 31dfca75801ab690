use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::shootout::AttemptOutcome;
use super::snapshot::{MatchPeriod, Team};

/// A discrete logged occurrence. Immutable once appended, with one
/// exception: resuming from an injury stoppage writes the elapsed
/// duration into the originating injury event's details.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DomainEvent {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub event_type: EventType,
    pub team: Team,
    /// Match clock seconds when the event occurred.
    pub match_time: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub player_number: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<EventDetails>,
}

impl DomainEvent {
    pub fn new(event_type: EventType, team: Team, match_time: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            event_type,
            team,
            match_time,
            player_number: None,
            details: None,
        }
    }

    pub fn with_player(mut self, number: u8) -> Self {
        self.player_number = Some(number);
        self
    }

    pub fn with_details(mut self, details: EventDetails) -> Self {
        self.details = Some(details);
        self
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    Goal,
    Foul,
    YellowCard,
    RedCard,
    ShotOnTarget,
    ShotOffTarget,
    Save,
    Corner,
    Offside,
    Substitution,
    Injury,
    PenaltyAttempt,
    PeriodChange,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct EventDetails {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Injury stoppage length in seconds, written when play resumes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stoppage_secs: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub substitution: Option<SubstitutionDetails>,
    /// New period for `PeriodChange` events.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub period: Option<MatchPeriod>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attempt_outcome: Option<AttemptOutcome>,
}

/// Substitution metadata. Names are included here so the timeline stays
/// readable after the departing player leaves the roster.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SubstitutionDetails {
    pub off_number: u8,
    pub off_name: String,
    pub on_number: u8,
    pub on_name: String,
}
