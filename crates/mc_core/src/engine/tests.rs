use super::*;
use crate::models::{Player, PlayerRole, Roster, TeamSide};

fn roster(numbers: &[u8]) -> Roster {
    Roster::new(
        numbers
            .iter()
            .map(|&n| {
                let role = if n == 1 { PlayerRole::Goalkeeper } else { PlayerRole::Forward };
                Player::new(n, format!("Player {n}"), role)
            })
            .collect(),
    )
    .unwrap()
}

fn snapshot() -> MatchSnapshot {
    MatchSnapshot::new(
        TeamSide::new("Home FC", roster(&[1, 4, 9])),
        TeamSide::new("Away United", roster(&[1, 4, 9])),
    )
}

fn engine() -> Engine {
    Engine::new()
}

fn apply_all(engine: &Engine, start: MatchSnapshot, commands: Vec<Command>) -> MatchSnapshot {
    commands
        .into_iter()
        .fold(start, |snap, cmd| engine.apply(&snap, cmd).snapshot)
}

#[test]
fn goal_updates_team_and_player_stats_and_log() {
    let engine = engine();
    let mut snap = snapshot();
    snap.clock_seconds = 125;
    snap.clock_running = true;

    let transition = engine.apply(
        &snap,
        Command::ApplyDomainEvent {
            event_type: EventType::Goal,
            team: Team::Home,
            player_number: Some(9),
            details: None,
        },
    );

    let next = &transition.snapshot;
    assert_eq!(next.home.stats.goals, 1);
    let scorer = next.home.roster.player(9).unwrap();
    assert_eq!(scorer.stats.goals, 1);
    assert_eq!(scorer.stats.shots, 1);

    let event = next.events.last().unwrap();
    assert_eq!(event.event_type, EventType::Goal);
    assert_eq!(event.match_time, 125);
    assert_eq!(event.player_number, Some(9));

    assert!(transition
        .effects
        .iter()
        .any(|e| matches!(e, Effect::RequestGoalImpact { scoring_team: Team::Home, .. })));
    assert!(transition.effects.iter().any(|e| matches!(e, Effect::CaptureHighlight { .. })));
    assert!(transition.effects.iter().any(|e| matches!(e, Effect::RequestCommentary { .. })));
}

#[test]
fn goal_impact_request_suppressed_when_disabled() {
    let engine = Engine::new().with_goal_impact(false);
    let transition = engine.apply(
        &snapshot(),
        Command::ApplyDomainEvent {
            event_type: EventType::Goal,
            team: Team::Away,
            player_number: None,
            details: None,
        },
    );
    assert!(!transition
        .effects
        .iter()
        .any(|e| matches!(e, Effect::RequestGoalImpact { .. })));
}

#[test]
fn event_for_unknown_player_still_counts_for_team() {
    let engine = engine();
    let next = engine
        .apply(
            &snapshot(),
            Command::ApplyDomainEvent {
                event_type: EventType::Corner,
                team: Team::Away,
                player_number: Some(42),
                details: None,
            },
        )
        .snapshot;
    assert_eq!(next.away.stats.corners, 1);
    assert_eq!(next.events.len(), 1);
}

#[test]
fn injury_pauses_clock_and_resume_annotates_duration() {
    let engine = engine();
    let mut snap = snapshot();
    snap.clock_seconds = 600;
    snap.clock_running = true;

    let stopped = engine
        .apply(&snap, Command::LogInjury { team: Team::Away, player_number: 4 })
        .snapshot;
    assert!(!stopped.clock_running);
    let stoppage = stopped.injury_stoppage.as_ref().unwrap();
    assert_eq!(stoppage.started_at, 600);
    assert_eq!(stoppage.team, Team::Away);

    // Clock corrected forward while paused, then play resumes.
    let mut later = engine
        .apply(&stopped, Command::SetClock { seconds: 650, running: false })
        .snapshot;
    later = engine.apply(&later, Command::ResumeFromInjury).snapshot;

    assert!(later.clock_running);
    assert!(later.injury_stoppage.is_none());
    let injury_event = later
        .events
        .iter()
        .find(|e| e.event_type == EventType::Injury)
        .unwrap();
    assert_eq!(injury_event.details.as_ref().unwrap().stoppage_secs, Some(50));
}

#[test]
fn second_injury_and_stray_resume_are_no_ops() {
    let engine = engine();
    let snap = snapshot();

    let resumed = engine.apply(&snap, Command::ResumeFromInjury);
    assert_eq!(resumed.snapshot, snap);
    assert!(resumed.effects.is_empty());

    let stopped = engine
        .apply(&snap, Command::LogInjury { team: Team::Home, player_number: 9 })
        .snapshot;
    let double = engine.apply(&stopped, Command::LogInjury { team: Team::Away, player_number: 4 });
    assert_eq!(double.snapshot, stopped);
}

#[test]
fn period_transitions_pause_clock_and_reset_injury_time() {
    let engine = engine();
    let mut snap = snapshot();
    snap.clock_running = true;
    snap.injury_time_mins = 3;

    let next = engine
        .apply(&snap, Command::SetMatchPeriod { period: MatchPeriod::HalfTime })
        .snapshot;
    assert_eq!(next.period, MatchPeriod::HalfTime);
    assert!(!next.clock_running);
    assert_eq!(next.injury_time_mins, 0);
    assert_eq!(next.events.last().unwrap().event_type, EventType::PeriodChange);
}

#[test]
fn non_adjacent_period_transition_is_a_no_op() {
    let engine = engine();
    let snap = snapshot();
    let skipped = engine.apply(&snap, Command::SetMatchPeriod { period: MatchPeriod::FullTime });
    assert_eq!(skipped.snapshot, snap);

    // The shootout period is only reachable through its dedicated command.
    let mut extra = snapshot();
    extra.period = MatchPeriod::ExtraTimeSecondHalf;
    let direct =
        engine.apply(&extra, Command::SetMatchPeriod { period: MatchPeriod::PenaltyShootout });
    assert_eq!(direct.snapshot, extra);
}

#[test]
fn clock_never_moves_backwards_while_running() {
    let engine = engine();
    let mut snap = snapshot();
    snap.clock_seconds = 100;
    snap.clock_running = true;

    let rewound = engine.apply(&snap, Command::SetClock { seconds: 50, running: true });
    assert_eq!(rewound.snapshot.clock_seconds, 100);

    let paused = engine.apply(&snap, Command::SetClock { seconds: 100, running: false }).snapshot;
    let corrected = engine.apply(&paused, Command::SetClock { seconds: 50, running: false });
    assert_eq!(corrected.snapshot.clock_seconds, 50);
}

#[test]
fn substitution_replaces_player_and_logs_names() {
    let engine = engine();
    let next = engine
        .apply(
            &snapshot(),
            Command::SubstitutePlayer {
                team: Team::Home,
                off: 4,
                on: Player::new(15, "Fresh Legs", PlayerRole::Defender),
            },
        )
        .snapshot;

    assert!(next.home.roster.contains(15));
    assert!(!next.home.roster.contains(4));
    let event = next.events.last().unwrap();
    assert_eq!(event.event_type, EventType::Substitution);
    let sub = event.details.as_ref().unwrap().substitution.as_ref().unwrap();
    assert_eq!(sub.off_number, 4);
    assert_eq!(sub.on_name, "Fresh Legs");

    // Bringing on an already-rostered number is rejected.
    let clash = engine.apply(
        &next,
        Command::SubstitutePlayer {
            team: Team::Home,
            off: 9,
            on: Player::new(1, "Clash", PlayerRole::Forward),
        },
    );
    assert_eq!(clash.snapshot, next);
}

#[test]
fn shootout_alternates_and_declares_winner_once() {
    let engine = engine();
    let mut snap = snapshot();
    snap.period = MatchPeriod::ExtraTimeSecondHalf;

    let mut commands = vec![Command::StartPenaltyShootout { first_taker: Team::Home }];
    // Home scores three, away misses three: decided after away's third.
    for i in 0..3 {
        commands.push(Command::LogPenaltyAttempt {
            player_number: 10 + i,
            outcome: AttemptOutcome::Scored,
        });
        commands.push(Command::LogPenaltyAttempt {
            player_number: 20 + i,
            outcome: AttemptOutcome::Missed,
        });
    }
    let decided = apply_all(&engine, snap, commands);

    let record = decided.shootout.as_ref().unwrap();
    assert_eq!(record.home_score, 3);
    assert_eq!(record.away_score, 0);
    assert_eq!(record.winner, Some(Team::Home));
    assert_eq!(record.taken(Team::Home), 3);
    assert_eq!(record.taken(Team::Away), 3);

    // Further attempts are no-ops once decided.
    let frozen = engine.apply(
        &decided,
        Command::LogPenaltyAttempt { player_number: 30, outcome: AttemptOutcome::Scored },
    );
    assert_eq!(frozen.snapshot, decided);
}

#[test]
fn shootout_requires_the_right_period() {
    let engine = engine();
    let snap = snapshot();
    let rejected = engine.apply(&snap, Command::StartPenaltyShootout { first_taker: Team::Home });
    assert_eq!(rejected.snapshot, snap);

    let stray = engine.apply(
        &snap,
        Command::LogPenaltyAttempt { player_number: 9, outcome: AttemptOutcome::Scored },
    );
    assert_eq!(stray.snapshot, snap);
}

#[test]
fn shootout_score_matches_scored_attempt_count() {
    let engine = engine();
    let mut snap = snapshot();
    snap.period = MatchPeriod::ExtraTimeSecondHalf;
    snap = engine
        .apply(&snap, Command::StartPenaltyShootout { first_taker: Team::Away })
        .snapshot;

    let outcomes = [
        AttemptOutcome::Scored,
        AttemptOutcome::Saved,
        AttemptOutcome::Scored,
        AttemptOutcome::Scored,
        AttemptOutcome::Missed,
        AttemptOutcome::Scored,
    ];
    for (i, outcome) in outcomes.into_iter().enumerate() {
        snap = engine
            .apply(&snap, Command::LogPenaltyAttempt { player_number: i as u8 + 1, outcome })
            .snapshot;
    }

    let record = snap.shootout.as_ref().unwrap();
    let scored = |team| {
        record
            .attempts
            .iter()
            .filter(|a| a.team == team && a.outcome == AttemptOutcome::Scored)
            .count() as u8
    };
    assert_eq!(record.away_score, scored(Team::Away));
    assert_eq!(record.home_score, scored(Team::Home));
}

#[test]
fn poll_votes_and_var_flow() {
    let engine = engine();
    let mut snap = snapshot();

    snap = apply_all(
        &engine,
        snap,
        vec![
            Command::StartPoll {
                question: "Player of the half?".into(),
                options: vec!["#9".into(), "#4".into()],
            },
            Command::VotePoll { option_index: 0 },
            Command::VotePoll { option_index: 0 },
            Command::VotePoll { option_index: 1 },
        ],
    );
    let poll = snap.poll.as_ref().unwrap();
    assert_eq!(poll.options[0].votes, 2);
    assert_eq!(poll.options[1].votes, 1);

    let bad_vote = engine.apply(&snap, Command::VotePoll { option_index: 7 });
    assert_eq!(bad_vote.snapshot, snap);

    snap = engine.apply(&snap, Command::ClosePoll).snapshot;
    let closed_vote = engine.apply(&snap, Command::VotePoll { option_index: 0 });
    assert_eq!(closed_vote.snapshot, snap);

    let stray_analysis = engine.apply(&snap, Command::SetVarAnalysis { analysis: "n/a".into() });
    assert_eq!(stray_analysis.snapshot, snap);

    snap = apply_all(
        &engine,
        snap,
        vec![
            Command::StartVarCheck { incident: "possible offside".into() },
            Command::SetVarAnalysis { analysis: "onside by a boot".into() },
        ],
    );
    let var = snap.var_check.as_ref().unwrap();
    assert!(var.resolved);
    assert_eq!(var.analysis.as_deref(), Some("onside by a boot"));
}

#[test]
fn view_only_snapshots_reject_everything() {
    let engine = engine();
    let mut snap = snapshot();
    snap.view_only = true;

    let transition = engine.apply(
        &snap,
        Command::ApplyDomainEvent {
            event_type: EventType::Goal,
            team: Team::Home,
            player_number: Some(9),
            details: None,
        },
    );
    assert_eq!(transition.snapshot, snap);
    assert!(transition.effects.is_empty());
}

#[test]
fn win_probability_is_normalized_on_set() {
    let engine = engine();
    let next = engine
        .apply(
            &snapshot(),
            Command::SetWinProbability {
                probability: WinProbability { home: 2.0, away: 1.0, draw: 1.0 },
            },
        )
        .snapshot;
    let p = next.win_probability.unwrap();
    assert!((p.home + p.away + p.draw - 1.0).abs() < 1e-6);
}

#[test]
fn goal_impact_is_a_percentage_point_delta() {
    let pre = WinProbability { home: 0.4, away: 0.3, draw: 0.3 };
    let post = WinProbability { home: 0.6, away: 0.2, draw: 0.2 };
    let impact = goal_impact(pre, post, Team::Home);
    assert!((impact - 20.0).abs() < 1e-4);
}

#[test]
fn clock_tick_emits_no_persist_effect() {
    let engine = engine();
    let transition = engine.apply(&snapshot(), Command::SetClock { seconds: 1, running: true });
    assert!(transition.effects.is_empty());
}

mod properties {
    use super::*;
    use proptest::prelude::*;

    fn arb_event_type() -> impl Strategy<Value = EventType> {
        prop_oneof![
            Just(EventType::Goal),
            Just(EventType::Foul),
            Just(EventType::YellowCard),
            Just(EventType::RedCard),
            Just(EventType::ShotOnTarget),
            Just(EventType::ShotOffTarget),
            Just(EventType::Save),
            Just(EventType::Corner),
            Just(EventType::Offside),
        ]
    }

    fn arb_team() -> impl Strategy<Value = Team> {
        prop_oneof![Just(Team::Home), Just(Team::Away)]
    }

    proptest! {
        /// Recomputing aggregates from the event log always matches the
        /// incrementally maintained stats.
        #[test]
        fn recompute_matches_incremental(
            events in proptest::collection::vec((arb_event_type(), arb_team(), proptest::option::of(1u8..12)), 0..60)
        ) {
            let engine = engine();
            let mut snap = snapshot();
            for (event_type, team, player_number) in events {
                snap = engine
                    .apply(&snap, Command::ApplyDomainEvent { event_type, team, player_number, details: None })
                    .snapshot;
            }
            let (home, away) = recompute_team_stats(&snap);
            prop_assert_eq!(home, snap.home.stats);
            prop_assert_eq!(away, snap.away.stats);
        }

        /// Replaying an identical attempt sequence yields identical scores
        /// and winner, and a winner exists iff elimination has occurred.
        #[test]
        fn shootout_replay_is_deterministic(
            outcomes in proptest::collection::vec(
                prop_oneof![
                    Just(AttemptOutcome::Scored),
                    Just(AttemptOutcome::Saved),
                    Just(AttemptOutcome::Missed),
                ],
                0..16,
            )
        ) {
            let engine = engine();
            let mut base = snapshot();
            base.period = MatchPeriod::ExtraTimeSecondHalf;

            let run = |outcomes: &[AttemptOutcome]| {
                let mut snap = engine
                    .apply(&base, Command::StartPenaltyShootout { first_taker: Team::Home })
                    .snapshot;
                for (i, &outcome) in outcomes.iter().enumerate() {
                    snap = engine
                        .apply(&snap, Command::LogPenaltyAttempt { player_number: i as u8, outcome })
                        .snapshot;
                }
                snap.shootout.unwrap()
            };

            let first = run(&outcomes);
            let second = run(&outcomes);
            prop_assert_eq!(first.home_score, second.home_score);
            prop_assert_eq!(first.away_score, second.away_score);
            prop_assert_eq!(first.winner, second.winner);

            // Once decided, later attempts were ignored, so both sides'
            // kick counts differ by at most one.
            let diff = first.taken(Team::Home).abs_diff(first.taken(Team::Away));
            prop_assert!(diff <= 1);
        }
    }
}
