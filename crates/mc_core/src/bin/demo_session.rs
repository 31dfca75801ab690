//! End-to-end driver: wires a session against a scratch store with stub
//! collaborators and walks through a short match.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;

use mc_core::analysis::{AnalysisError, AnalysisService, Commentary, ExcitementLevel, MatchSummary};
use mc_core::store::{AlwaysOnline, MediaUploader, SyncQueueItem, SyncWorker, UploadError};
use mc_core::{
    Command, DomainEvent, EventType, MatchSnapshot, MatchStore, MediaChunk, MediaEncoding, Player,
    PlayerRole, Roster, Session, SessionConfig, Team, TeamSide, WinProbability,
};

struct CannedAnalysis;

#[async_trait]
impl AnalysisService for CannedAnalysis {
    async fn commentary(
        &self,
        event: &DomainEvent,
        _summary: &MatchSummary,
    ) -> Result<Commentary, AnalysisError> {
        Ok(Commentary {
            text: format!("Big moment: {:?}!", event.event_type),
            excitement: ExcitementLevel::Elevated,
        })
    }

    async fn win_probability(
        &self,
        summary: &MatchSummary,
    ) -> Result<WinProbability, AnalysisError> {
        let lead = summary.home_goals as f32 - summary.away_goals as f32;
        Ok(WinProbability { home: 0.35 + 0.15 * lead, away: 0.35 - 0.15 * lead, draw: 0.3 }
            .normalized())
    }
}

struct PrintingUploader;

#[async_trait]
impl MediaUploader for PrintingUploader {
    async fn upload(&self, item: &SyncQueueItem, payload: &[u8]) -> Result<(), UploadError> {
        println!("  uploading {} ({} bytes)", item.label, payload.len());
        Ok(())
    }
}

fn roster() -> Roster {
    Roster::new(vec![
        Player::new(1, "Keeper", PlayerRole::Goalkeeper),
        Player::new(4, "Back", PlayerRole::Defender),
        Player::new(9, "Striker", PlayerRole::Forward),
    ])
    .expect("static roster is valid")
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let dir = std::env::temp_dir().join("matchcast-demo");
    let store = Arc::new(MatchStore::open(&dir)?);
    store.start_new_match()?;

    let snapshot = MatchSnapshot::new(
        TeamSide::new("Home FC", roster()),
        TeamSide::new("Away United", roster()),
    );

    let sync = Arc::new(SyncWorker::new(
        store.clone(),
        Arc::new(PrintingUploader),
        Arc::new(AlwaysOnline),
    ));
    let config = SessionConfig {
        clock_tick: Duration::from_millis(50),
        auto_save_every: Duration::from_millis(500),
        sync_poll_every: Duration::from_millis(800),
        ..SessionConfig::default()
    };
    let handle =
        Session::spawn(config, snapshot, store.clone(), Arc::new(CannedAnalysis), sync.clone());
    let mut notices = handle.subscribe_notices();

    println!("kick off");
    handle.dispatch(Command::SetClock { seconds: 0, running: true }).await;
    handle.start_buffering(MediaEncoding::H264).await;
    for s in 0..20 {
        handle
            .push_chunk(MediaChunk {
                offset: Duration::from_millis(s * 100),
                data: Bytes::from(vec![0u8; 256]),
            })
            .await;
    }

    println!("goal for the home side");
    handle
        .dispatch(Command::ApplyDomainEvent {
            event_type: EventType::Goal,
            team: Team::Home,
            player_number: Some(9),
            details: None,
        })
        .await;

    tokio::time::sleep(Duration::from_secs(2)).await;

    while let Ok(notice) = notices.try_recv() {
        println!("  notice: {notice:?}");
    }

    let snap = handle.snapshot();
    println!("score: {} {} - {} {}", snap.home.name, snap.home.stats.goals, snap.away.stats.goals, snap.away.name);
    println!("events logged: {}", snap.events.len());
    println!("recordings on device: {}", store.list_media()?.len());
    println!("uploads pending: {}", sync.pending()?);

    handle.shutdown().await;

    match store.load_snapshot()? {
        Some(persisted) => println!("persisted snapshot at {}s", persisted.clock_seconds),
        None => println!("no snapshot persisted"),
    }
    Ok(())
}
