//! Fixed event-type-to-stat mappings and the from-scratch recompute used
//! to check the incremental aggregates.

use crate::models::{EventType, MatchSnapshot, PlayerStats, Team, TeamStats};

/// Apply one event to a side's aggregate counters. Returns `false` for
/// event types with no stat mapping (substitutions, injuries, period
/// changes, shootout attempts).
pub(crate) fn apply_team_stat(stats: &mut TeamStats, event_type: EventType) -> bool {
    match event_type {
        EventType::Goal => stats.goals += 1,
        EventType::Foul => stats.fouls += 1,
        EventType::YellowCard => stats.yellow_cards += 1,
        EventType::RedCard => stats.red_cards += 1,
        EventType::ShotOnTarget => stats.shots_on_target += 1,
        EventType::ShotOffTarget => stats.shots_off_target += 1,
        EventType::Save => stats.saves += 1,
        EventType::Corner => stats.corners += 1,
        EventType::Offside => stats.offsides += 1,
        EventType::Substitution
        | EventType::Injury
        | EventType::PenaltyAttempt
        | EventType::PeriodChange => return false,
    }
    true
}

/// Analogous per-player mapping. A goal also counts as a shot for the
/// scorer.
pub(crate) fn apply_player_stat(stats: &mut PlayerStats, event_type: EventType) {
    match event_type {
        EventType::Goal => {
            stats.goals += 1;
            stats.shots += 1;
        }
        EventType::ShotOnTarget | EventType::ShotOffTarget => stats.shots += 1,
        EventType::Foul => stats.fouls += 1,
        EventType::YellowCard => stats.yellow_cards += 1,
        EventType::RedCard => stats.red_cards += 1,
        EventType::Save => stats.saves += 1,
        EventType::Substitution
        | EventType::Injury
        | EventType::PenaltyAttempt
        | EventType::Corner
        | EventType::Offside
        | EventType::PeriodChange => {}
    }
}

/// Recompute both sides' aggregates from the event log alone. Must agree
/// with the incrementally maintained `TeamStats` for every reachable
/// snapshot.
pub fn recompute_team_stats(snapshot: &MatchSnapshot) -> (TeamStats, TeamStats) {
    let mut home = TeamStats::default();
    let mut away = TeamStats::default();
    for event in &snapshot.events {
        let stats = match event.team {
            Team::Home => &mut home,
            Team::Away => &mut away,
        };
        apply_team_stat(stats, event.event_type);
    }
    (home, away)
}
