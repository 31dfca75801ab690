//! # mc_core - Live Match Broadcast Engine
//!
//! The engine behind a live-event broadcasting tool: it tracks the
//! unfolding state of a sporting match, keeps a rolling window of live
//! media for instant replay, and persists match data and recordings
//! on-device, encrypted, with an offline-friendly upload queue.
//!
//! ## Structure
//! - `engine` - the match state machine: `apply(snapshot, command)`
//!   returns a successor snapshot plus deferred effects
//! - `capture` - trailing-window / full-capture media buffer
//! - `store` - encrypted persistence and the sync queue
//! - `runtime` - session loop, scheduler timers, effect runner
//! - `analysis` - external commentary / win-probability contract
//! - `seed` - shareable match-configuration tokens

pub mod analysis;
pub mod capture;
pub mod engine;
pub mod models;
pub mod runtime;
pub mod seed;
pub mod store;

// Re-export the command surface
pub use engine::{goal_impact, recompute_team_stats, Command, Effect, Engine, Transition};

// Re-export the domain model
pub use models::{
    AttemptOutcome, DomainEvent, EventDetails, EventType, MatchPeriod, MatchSnapshot, Player,
    PlayerRole, Roster, Team, TeamSide, TeamStats, WinProbability,
};

// Re-export capture types
pub use capture::{
    BufferState, CaptureConfig, CaptureError, CapturedMedia, MediaChunk, MediaEncoding,
    ReplayBuffer, DEFAULT_REPLAY_WINDOW,
};

// Re-export persistence
pub use store::{
    ConnectivityProbe, MatchStore, MediaRecord, MediaUploader, StoreError, SyncQueueItem,
    SyncWorker,
};

// Re-export runtime surface
pub use runtime::{Session, SessionConfig, SessionHandle, SessionNotice};

// Re-export analysis contract
pub use analysis::{AnalysisError, AnalysisService, Commentary, ExcitementLevel, MatchSummary};

// Re-export seed tokens
pub use seed::{MatchSeed, SeedError, SeedPlayer};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
