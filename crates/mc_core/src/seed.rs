//! Shareable match-configuration seed.
//!
//! A reduced, stat-free team/match configuration encoded as one opaque
//! token (MessagePack, then URL-safe base64). Another device decodes the
//! token into a fresh snapshot, optionally view-only.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{
    MatchPeriod, MatchSnapshot, Player, PlayerRole, Roster, RosterError, TeamSide,
};

#[derive(Error, Debug)]
pub enum SeedError {
    #[error("seed token is not valid base64")]
    Token(#[from] base64::DecodeError),

    #[error("seed payload malformed: {0}")]
    Payload(#[from] rmp_serde::decode::Error),

    #[error("seed serialization failed: {0}")]
    Encode(#[from] rmp_serde::encode::Error),

    #[error(transparent)]
    Roster(#[from] RosterError),
}

/// Roster entry without accumulated stats.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SeedPlayer {
    pub number: u8,
    pub name: String,
    pub role: PlayerRole,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MatchSeed {
    pub home_name: String,
    pub away_name: String,
    pub home_roster: Vec<SeedPlayer>,
    pub away_roster: Vec<SeedPlayer>,
    pub period: MatchPeriod,
    pub clock_seconds: u32,
    pub view_only: bool,
}

impl MatchSeed {
    /// Strip a snapshot down to its shareable configuration.
    pub fn from_snapshot(snapshot: &MatchSnapshot, view_only: bool) -> Self {
        let strip = |side: &TeamSide| -> Vec<SeedPlayer> {
            side.roster
                .iter()
                .map(|p| SeedPlayer { number: p.number, name: p.name.clone(), role: p.role })
                .collect()
        };
        Self {
            home_name: snapshot.home.name.clone(),
            away_name: snapshot.away.name.clone(),
            home_roster: strip(&snapshot.home),
            away_roster: strip(&snapshot.away),
            period: snapshot.period,
            clock_seconds: snapshot.clock_seconds,
            view_only,
        }
    }

    pub fn encode(&self) -> Result<String, SeedError> {
        let payload = rmp_serde::to_vec_named(self)?;
        Ok(URL_SAFE_NO_PAD.encode(payload))
    }

    pub fn decode(token: &str) -> Result<Self, SeedError> {
        let payload = URL_SAFE_NO_PAD.decode(token)?;
        Ok(rmp_serde::from_slice(&payload)?)
    }

    /// Build a fresh snapshot from this seed, honoring the view-only
    /// flag.
    pub fn into_snapshot(self) -> Result<MatchSnapshot, SeedError> {
        let build = |players: Vec<SeedPlayer>| -> Result<Roster, RosterError> {
            Roster::new(
                players.into_iter().map(|p| Player::new(p.number, p.name, p.role)).collect(),
            )
        };
        let home = TeamSide::new(self.home_name, build(self.home_roster)?);
        let away = TeamSide::new(self.away_name, build(self.away_roster)?);

        let mut snapshot = MatchSnapshot::new(home, away);
        snapshot.period = self.period;
        snapshot.clock_seconds = self.clock_seconds;
        snapshot.view_only = self.view_only;
        Ok(snapshot)
    }
}
