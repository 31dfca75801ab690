//! Domain data model: the match snapshot, its rosters and sub-records,
//! and the append-only domain event log.

pub mod events;
pub mod player;
pub mod shootout;
pub mod snapshot;

pub use events::{DomainEvent, EventDetails, EventType, SubstitutionDetails};
pub use player::{Player, PlayerRole, PlayerStats, Roster, RosterError};
pub use shootout::{AttemptOutcome, PenaltyAttempt, PenaltyShootoutRecord};
pub use snapshot::{
    InjuryStoppageRecord, MatchPeriod, MatchSnapshot, PollOption, PollRecord, Team, TeamSide,
    TeamStats, VarRecord, WinProbability, SNAPSHOT_VERSION,
};
