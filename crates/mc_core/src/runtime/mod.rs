//! Session runtime.
//!
//! A [`Session`] owns the snapshot, the capture buffer, and the store,
//! and processes messages on a single logical task so commands apply in
//! strict dispatch order. A scheduler owns every interval (the 1 Hz
//! match clock, periodic auto-save, the sync-queue poll) and feeds
//! messages into the same channel instead of touching state directly.
//! Deferred effects run asynchronously and report back as follow-up
//! commands; a clock tick never waits on them.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::analysis::{describe_event, AnalysisService, ExcitementLevel, MatchSummary};
use crate::capture::{CaptureConfig, CaptureError, MediaChunk, MediaEncoding, ReplayBuffer};
use crate::engine::{goal_impact, Command, Effect, Engine};
use crate::models::{MatchSnapshot, Team, WinProbability};
use crate::store::{MatchStore, SyncWorker};

const CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub clock_tick: Duration,
    pub auto_save_every: Duration,
    pub sync_poll_every: Duration,
    /// Broadcast enhancement: request goal-impact values on goals.
    pub goal_impact_enabled: bool,
    pub capture: CaptureConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            clock_tick: Duration::from_secs(1),
            auto_save_every: Duration::from_secs(10),
            sync_poll_every: Duration::from_secs(30),
            goal_impact_enabled: true,
            capture: CaptureConfig::default(),
        }
    }
}

/// Presentation-facing notifications that are not part of the snapshot.
#[derive(Debug, Clone)]
pub enum SessionNotice {
    /// Win-probability swing attributable to a goal, in percentage
    /// points for the scoring team.
    GoalImpact { team: Team, percentage_points: f32 },
    /// Commentary for an event; `fallback` marks the locally derived
    /// text used when the analysis service was unreachable.
    Commentary { event_id: Uuid, text: String, excitement: ExcitementLevel, fallback: bool },
    /// A capture operation failed in a user-actionable way.
    CaptureFailed { error: String },
}

enum Msg {
    Engine(Command),
    Chunk(MediaChunk),
    StartBuffering(MediaEncoding),
    StartFullCapture(MediaEncoding),
    /// Stop the capture session; a label makes the result a user-visible
    /// recording that also enters the upload queue.
    StopCapture { label: Option<String> },
    ClockTick,
    AutoSave,
    SyncPoll,
    Shutdown,
}

/// Handle held by the presentation layer: dispatch intent, read state,
/// subscribe to changes. Dropping the handle without `shutdown` leaves
/// timers running until the runtime is dropped.
pub struct SessionHandle {
    tx: mpsc::Sender<Msg>,
    snapshot_rx: watch::Receiver<MatchSnapshot>,
    notice_tx: broadcast::Sender<SessionNotice>,
    timer_tasks: Vec<JoinHandle<()>>,
    loop_task: JoinHandle<()>,
}

impl SessionHandle {
    pub async fn dispatch(&self, command: Command) {
        if self.tx.send(Msg::Engine(command)).await.is_err() {
            warn!("session loop gone, command dropped");
        }
    }

    pub async fn push_chunk(&self, chunk: MediaChunk) {
        let _ = self.tx.send(Msg::Chunk(chunk)).await;
    }

    pub async fn start_buffering(&self, encoding: MediaEncoding) {
        let _ = self.tx.send(Msg::StartBuffering(encoding)).await;
    }

    pub async fn start_full_capture(&self, encoding: MediaEncoding) {
        let _ = self.tx.send(Msg::StartFullCapture(encoding)).await;
    }

    pub async fn stop_capture(&self, label: Option<String>) {
        let _ = self.tx.send(Msg::StopCapture { label }).await;
    }

    /// Current snapshot. Presentation never mutates it directly.
    pub fn snapshot(&self) -> MatchSnapshot {
        self.snapshot_rx.borrow().clone()
    }

    pub fn subscribe_snapshot(&self) -> watch::Receiver<MatchSnapshot> {
        self.snapshot_rx.clone()
    }

    pub fn subscribe_notices(&self) -> broadcast::Receiver<SessionNotice> {
        self.notice_tx.subscribe()
    }

    /// Tear the session down: cancel every timer this session owns and
    /// wait for the loop to drain.
    pub async fn shutdown(self) {
        for task in &self.timer_tasks {
            task.abort();
        }
        let _ = self.tx.send(Msg::Shutdown).await;
        let _ = self.loop_task.await;
    }
}

pub struct Session {
    engine: Engine,
    snapshot: MatchSnapshot,
    buffer: ReplayBuffer,
    store: Arc<MatchStore>,
    analysis: Arc<dyn AnalysisService>,
    sync: Arc<SyncWorker>,
    snapshot_tx: watch::Sender<MatchSnapshot>,
    notice_tx: broadcast::Sender<SessionNotice>,
    self_tx: mpsc::Sender<Msg>,
}

impl Session {
    /// Spawn the session loop and its scheduler timers.
    pub fn spawn(
        config: SessionConfig,
        snapshot: MatchSnapshot,
        store: Arc<MatchStore>,
        analysis: Arc<dyn AnalysisService>,
        sync: Arc<SyncWorker>,
    ) -> SessionHandle {
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        let (snapshot_tx, snapshot_rx) = watch::channel(snapshot.clone());
        let (notice_tx, _) = broadcast::channel(CHANNEL_CAPACITY);

        let session = Session {
            engine: Engine::new().with_goal_impact(config.goal_impact_enabled),
            snapshot,
            buffer: ReplayBuffer::new(config.capture.clone()),
            store,
            analysis,
            sync,
            snapshot_tx,
            notice_tx: notice_tx.clone(),
            self_tx: tx.clone(),
        };

        let timer_tasks = vec![
            spawn_timer(tx.clone(), config.clock_tick, || Msg::ClockTick),
            spawn_timer(tx.clone(), config.auto_save_every, || Msg::AutoSave),
            spawn_timer(tx.clone(), config.sync_poll_every, || Msg::SyncPoll),
        ];
        let loop_task = tokio::spawn(session.run(rx));

        SessionHandle { tx, snapshot_rx, notice_tx, timer_tasks, loop_task }
    }

    async fn run(mut self, mut rx: mpsc::Receiver<Msg>) {
        info!("session started");
        while let Some(msg) = rx.recv().await {
            match msg {
                Msg::Engine(command) => self.apply(command),
                Msg::ClockTick => {
                    if self.snapshot.clock_running {
                        let seconds = self.snapshot.clock_seconds + 1;
                        self.apply(Command::SetClock { seconds, running: true });
                    }
                }
                Msg::Chunk(chunk) => self.buffer.push_chunk(chunk),
                Msg::StartBuffering(encoding) => {
                    if let Err(err) = self.buffer.start_buffering(encoding) {
                        self.capture_failed(err);
                    }
                }
                Msg::StartFullCapture(encoding) => {
                    if let Err(err) = self.buffer.start_full_capture(encoding) {
                        self.capture_failed(err);
                    }
                }
                Msg::StopCapture { label } => self.stop_capture(label),
                Msg::AutoSave => {
                    if let Err(err) = self.store.save_snapshot(&self.snapshot) {
                        warn!(%err, "auto-save failed");
                    }
                }
                Msg::SyncPoll => {
                    // The cycle runs off-loop; its guard skips overlap.
                    let sync = self.sync.clone();
                    tokio::spawn(async move {
                        if let Err(err) = sync.run_cycle().await {
                            warn!(%err, "sync cycle failed");
                        }
                    });
                }
                Msg::Shutdown => break,
            }
        }
        // Release the media source along with the session.
        if self.buffer.state() != crate::capture::BufferState::Idle {
            let _ = self.buffer.stop();
        }
        info!("session stopped");
    }

    fn apply(&mut self, command: Command) {
        let transition = self.engine.apply(&self.snapshot, command);
        let effects = transition.effects;
        self.snapshot = transition.snapshot;
        self.snapshot_tx.send_replace(self.snapshot.clone());
        for effect in effects {
            self.run_effect(effect);
        }
    }

    fn run_effect(&mut self, effect: Effect) {
        match effect {
            Effect::PersistSnapshot => {
                if let Err(err) = self.store.save_snapshot(&self.snapshot) {
                    warn!(%err, "snapshot persist failed");
                }
            }
            Effect::CaptureHighlight { label } => match self.buffer.replay_snapshot() {
                Some(media) => match self.store.save_media(&media.data, Some(&label)) {
                    Ok(record) => debug!(id = %record.id, %label, "highlight captured"),
                    Err(err) => warn!(%err, "highlight save failed"),
                },
                None => debug!(%label, "no replay buffer active, highlight skipped"),
            },
            Effect::RequestCommentary { event } => {
                let analysis = self.analysis.clone();
                let summary = MatchSummary::of(&self.snapshot);
                let fallback = describe_event(&event, &self.snapshot);
                let notice_tx = self.notice_tx.clone();
                tokio::spawn(async move {
                    let notice = match analysis.commentary(&event, &summary).await {
                        Ok(commentary) => SessionNotice::Commentary {
                            event_id: event.id,
                            text: commentary.text,
                            excitement: commentary.excitement,
                            fallback: false,
                        },
                        Err(err) => {
                            debug!(%err, "commentary fell back to local description");
                            SessionNotice::Commentary {
                                event_id: event.id,
                                text: fallback,
                                excitement: ExcitementLevel::Calm,
                                fallback: true,
                            }
                        }
                    };
                    let _ = notice_tx.send(notice);
                });
            }
            Effect::RequestGoalImpact { scoring_team, pre_goal } => {
                let analysis = self.analysis.clone();
                let summary = MatchSummary::of(&self.snapshot);
                let notice_tx = self.notice_tx.clone();
                let self_tx = self.self_tx.clone();
                tokio::spawn(async move {
                    match analysis.win_probability(&summary).await {
                        Ok(probability) => {
                            report_goal_impact(
                                scoring_team,
                                pre_goal,
                                probability,
                                &notice_tx,
                                &self_tx,
                            )
                            .await;
                        }
                        // Failure never blocks or corrupts the primary
                        // transition; the pre-goal triple stands.
                        Err(err) => warn!(%err, "goal impact request failed"),
                    }
                });
            }
        }
    }

    fn stop_capture(&mut self, label: Option<String>) {
        match self.buffer.stop() {
            Ok(media) => match self.store.save_media(&media.data, label.as_deref()) {
                Ok(record) => {
                    info!(id = %record.id, label = ?record.label, duration = ?media.duration, "capture stored");
                }
                Err(err) => warn!(%err, "capture save failed"),
            },
            Err(err) => self.capture_failed(err),
        }
    }

    fn capture_failed(&self, error: CaptureError) {
        warn!(%error, "capture operation failed");
        let _ = self.notice_tx.send(SessionNotice::CaptureFailed { error: error.to_string() });
    }
}

async fn report_goal_impact(
    scoring_team: Team,
    pre_goal: WinProbability,
    post_goal: WinProbability,
    notice_tx: &broadcast::Sender<SessionNotice>,
    self_tx: &mpsc::Sender<Msg>,
) {
    let points = goal_impact(pre_goal, post_goal, scoring_team);
    let _ = notice_tx.send(SessionNotice::GoalImpact {
        team: scoring_team,
        percentage_points: points,
    });
    // Feed the refreshed triple back in as a follow-up command.
    let _ = self_tx
        .send(Msg::Engine(Command::SetWinProbability { probability: post_goal }))
        .await;
}

fn spawn_timer(
    tx: mpsc::Sender<Msg>,
    period: Duration,
    make: impl Fn() -> Msg + Send + 'static,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        // The immediate first tick would double-fire alongside creation.
        interval.tick().await;
        loop {
            interval.tick().await;
            if tx.send(make()).await.is_err() {
                break;
            }
        }
    })
}
