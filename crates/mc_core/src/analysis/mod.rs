//! Commentary and win-probability service contract.
//!
//! The engine talks to an external analysis service through
//! [`AnalysisService`]. Calls can fail or time out; callers fall back to
//! [`describe_event`], a locally derived plain description, and never
//! block the primary state transition on a response.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{DomainEvent, EventType, MatchPeriod, MatchSnapshot, WinProbability};

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("analysis service unavailable: {0}")]
    Unavailable(String),

    #[error("analysis request timed out")]
    Timeout,

    #[error("malformed analysis response: {0}")]
    Malformed(String),
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ExcitementLevel {
    Calm,
    Elevated,
    Electric,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Commentary {
    pub text: String,
    pub excitement: ExcitementLevel,
}

/// Reduced snapshot shipped with analysis requests.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MatchSummary {
    pub home_name: String,
    pub away_name: String,
    pub home_goals: u16,
    pub away_goals: u16,
    pub clock_seconds: u32,
    pub period: MatchPeriod,
}

impl MatchSummary {
    pub fn of(snapshot: &MatchSnapshot) -> Self {
        Self {
            home_name: snapshot.home.name.clone(),
            away_name: snapshot.away.name.clone(),
            home_goals: snapshot.home.stats.goals,
            away_goals: snapshot.away.stats.goals,
            clock_seconds: snapshot.clock_seconds,
            period: snapshot.period,
        }
    }
}

#[async_trait]
pub trait AnalysisService: Send + Sync {
    /// Free-text commentary plus an excitement classification for one
    /// event.
    async fn commentary(
        &self,
        event: &DomainEvent,
        summary: &MatchSummary,
    ) -> Result<Commentary, AnalysisError>;

    /// `{home, away, draw}` triple for the current match state. The
    /// caller normalizes it; services need not return an exact unit sum.
    async fn win_probability(
        &self,
        summary: &MatchSummary,
    ) -> Result<WinProbability, AnalysisError>;
}

/// Locally derived fallback description used when the service is down.
pub fn describe_event(event: &DomainEvent, snapshot: &MatchSnapshot) -> String {
    let side = snapshot.side(event.team);
    let who = event
        .player_number
        .and_then(|n| side.roster.player(n))
        .map(|p| format!("{} ({})", p.name, p.number))
        .unwrap_or_else(|| side.name.clone());
    let minute = event.match_time / 60 + 1;

    let what = match event.event_type {
        EventType::Goal => "scores",
        EventType::Foul => "commits a foul",
        EventType::YellowCard => "is shown a yellow card",
        EventType::RedCard => "is shown a red card",
        EventType::ShotOnTarget => "forces a save with a shot on target",
        EventType::ShotOffTarget => "shoots wide",
        EventType::Save => "makes a save",
        EventType::Corner => "wins a corner",
        EventType::Offside => "is caught offside",
        EventType::Substitution => "makes a substitution",
        EventType::Injury => "is down injured",
        EventType::PenaltyAttempt => "steps up for a penalty",
        EventType::PeriodChange => "hears the whistle",
    };
    format!("{minute}' {who} {what}")
}
