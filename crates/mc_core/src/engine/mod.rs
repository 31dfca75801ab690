//! Match state engine.
//!
//! [`Engine::apply`] is a pure transition function: it takes the current
//! snapshot and one command and returns the successor snapshot plus the
//! deferred effects the command triggered. Invalid commands (wrong
//! sub-state, missing prerequisite) return the snapshot unchanged; the
//! engine never errors.

pub mod command;
pub mod effect;
mod shootout;
pub mod stats;

use tracing::debug;
use uuid::Uuid;

pub use command::Command;
pub use effect::{Effect, Transition};
pub use stats::recompute_team_stats;

use crate::models::{
    AttemptOutcome, DomainEvent, EventDetails, EventType, InjuryStoppageRecord, MatchPeriod,
    MatchSnapshot, PenaltyAttempt, PenaltyShootoutRecord, Player, PollOption, PollRecord, Team,
    VarRecord, WinProbability,
};

#[derive(Debug, Clone)]
pub struct Engine {
    /// Broadcast enhancement toggle: goal events request a win-probability
    /// refresh and a derived goal-impact value when enabled.
    goal_impact_enabled: bool,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    pub fn new() -> Self {
        Self { goal_impact_enabled: true }
    }

    pub fn with_goal_impact(mut self, enabled: bool) -> Self {
        self.goal_impact_enabled = enabled;
        self
    }

    /// Apply one command, producing the successor snapshot and any
    /// pending effects.
    pub fn apply(&self, snapshot: &MatchSnapshot, command: Command) -> Transition {
        if snapshot.view_only {
            debug!(?command, "command rejected: snapshot is view-only");
            return Transition::unchanged(snapshot.clone());
        }

        let mut next = snapshot.clone();
        let mut effects = Vec::new();

        // Clock ticks arrive every second; persisting them is the
        // auto-save timer's job, not the transition's.
        let is_clock_set = matches!(command, Command::SetClock { .. });

        let applied = match command {
            Command::SetClock { seconds, running } => self.set_clock(&mut next, seconds, running),
            Command::ApplyDomainEvent { event_type, team, player_number, details } => {
                self.apply_event(&mut next, &mut effects, event_type, team, player_number, details)
            }
            Command::SubstitutePlayer { team, off, on } => {
                self.substitute(&mut next, team, off, on)
            }
            Command::SetMatchPeriod { period } => self.set_period(&mut next, period),
            Command::AddInjuryTime { minutes } => {
                next.injury_time_mins = next.injury_time_mins.saturating_add(minutes);
                true
            }
            Command::LogInjury { team, player_number } => {
                self.log_injury(&mut next, team, player_number)
            }
            Command::ResumeFromInjury => self.resume_from_injury(&mut next),
            Command::StartPenaltyShootout { first_taker } => {
                self.start_shootout(&mut next, first_taker)
            }
            Command::LogPenaltyAttempt { player_number, outcome } => {
                self.log_penalty_attempt(&mut next, player_number, outcome)
            }
            Command::StartVarCheck { incident } => self.start_var_check(&mut next, incident),
            Command::SetVarAnalysis { analysis } => self.set_var_analysis(&mut next, analysis),
            Command::StartPoll { question, options } => self.start_poll(&mut next, question, options),
            Command::VotePoll { option_index } => self.vote_poll(&mut next, option_index),
            Command::ClosePoll => self.close_poll(&mut next),
            Command::SetWinProbability { probability } => {
                next.win_probability = Some(probability.normalized());
                true
            }
        };

        if !applied {
            return Transition::unchanged(snapshot.clone());
        }
        if !is_clock_set && next != *snapshot {
            effects.push(Effect::PersistSnapshot);
        }
        Transition { snapshot: next, effects }
    }

    fn set_clock(&self, next: &mut MatchSnapshot, seconds: u32, running: bool) -> bool {
        // The clock only moves forward while running; corrections are
        // allowed when paused.
        if next.clock_running && seconds < next.clock_seconds {
            debug!(seconds, current = next.clock_seconds, "clock set rejected: would move backwards");
            return false;
        }
        next.clock_seconds = seconds;
        next.clock_running = running;
        true
    }

    fn apply_event(
        &self,
        next: &mut MatchSnapshot,
        effects: &mut Vec<Effect>,
        event_type: EventType,
        team: Team,
        player_number: Option<u8>,
        details: Option<EventDetails>,
    ) -> bool {
        // Shootout attempts and period changes have dedicated commands;
        // routing them through here would corrupt the sub-state.
        if matches!(event_type, EventType::PenaltyAttempt | EventType::PeriodChange) {
            debug!(?event_type, "event rejected: use the dedicated command");
            return false;
        }

        let pre_goal = next.win_probability.unwrap_or_default();

        stats::apply_team_stat(&mut next.side_mut(team).stats, event_type);
        if let Some(number) = player_number {
            if let Some(player) = next.side_mut(team).roster.player_mut(number) {
                stats::apply_player_stat(&mut player.stats, event_type);
            }
        }

        let mut event = DomainEvent::new(event_type, team, next.clock_seconds);
        if let Some(number) = player_number {
            event = event.with_player(number);
        }
        if let Some(details) = details {
            event = event.with_details(details);
        }

        effects.push(Effect::RequestCommentary { event: event.clone() });
        if event_type == EventType::Goal {
            if self.goal_impact_enabled {
                effects.push(Effect::RequestGoalImpact { scoring_team: team, pre_goal });
            }
            effects.push(Effect::CaptureHighlight {
                label: format!("goal-{}-{}s", next.side(team).name, next.clock_seconds),
            });
        }

        next.events.push(event);
        true
    }

    fn substitute(&self, next: &mut MatchSnapshot, team: Team, off: u8, on: Player) -> bool {
        let on_number = on.number;
        let on_name = on.name.clone();
        let side = next.side_mut(team);
        let Some(departed) = side.roster.substitute(off, on) else {
            debug!(off, on = on_number, "substitution rejected");
            return false;
        };

        let details = EventDetails {
            substitution: Some(crate::models::SubstitutionDetails {
                off_number: departed.number,
                off_name: departed.name,
                on_number,
                on_name,
            }),
            ..EventDetails::default()
        };
        let event = DomainEvent::new(EventType::Substitution, team, next.clock_seconds)
            .with_player(on_number)
            .with_details(details);
        next.events.push(event);
        true
    }

    fn set_period(&self, next: &mut MatchSnapshot, period: MatchPeriod) -> bool {
        // The shootout period is entered via StartPenaltyShootout so the
        // sub-record always exists while in it.
        if period == MatchPeriod::PenaltyShootout || !next.period.can_transition_to(period) {
            debug!(from = ?next.period, to = ?period, "period transition rejected");
            return false;
        }
        self.enter_period(next, period);
        true
    }

    /// Shared period-entry bookkeeping: pause the clock, reset injury
    /// time, log the change.
    fn enter_period(&self, next: &mut MatchSnapshot, period: MatchPeriod) {
        next.period = period;
        next.clock_running = false;
        next.injury_time_mins = 0;
        let details = EventDetails { period: Some(period), ..EventDetails::default() };
        next.events.push(
            DomainEvent::new(EventType::PeriodChange, Team::Home, next.clock_seconds)
                .with_details(details),
        );
    }

    fn log_injury(&self, next: &mut MatchSnapshot, team: Team, player_number: u8) -> bool {
        if next.injury_stoppage.is_some() {
            debug!("injury rejected: a stoppage is already active");
            return false;
        }
        let event = DomainEvent::new(EventType::Injury, team, next.clock_seconds)
            .with_player(player_number);
        let event_id = event.id;
        next.events.push(event);
        next.clock_running = false;
        next.injury_stoppage = Some(InjuryStoppageRecord {
            team,
            player_number,
            started_at: next.clock_seconds,
            event_id,
        });
        true
    }

    fn resume_from_injury(&self, next: &mut MatchSnapshot) -> bool {
        let Some(stoppage) = next.injury_stoppage.take() else {
            debug!("resume rejected: no active stoppage");
            return false;
        };
        let elapsed = next.clock_seconds.saturating_sub(stoppage.started_at);
        annotate_stoppage(&mut next.events, stoppage.event_id, elapsed);
        next.clock_running = true;
        true
    }

    fn start_shootout(&self, next: &mut MatchSnapshot, first_taker: Team) -> bool {
        if next.shootout.is_some()
            || !next.period.can_transition_to(MatchPeriod::PenaltyShootout)
        {
            debug!(period = ?next.period, "shootout start rejected");
            return false;
        }
        next.shootout = Some(PenaltyShootoutRecord::new(first_taker));
        self.enter_period(next, MatchPeriod::PenaltyShootout);
        true
    }

    fn log_penalty_attempt(
        &self,
        next: &mut MatchSnapshot,
        player_number: u8,
        outcome: AttemptOutcome,
    ) -> bool {
        let clock = next.clock_seconds;
        let Some(record) = next.shootout.as_mut() else {
            debug!("penalty attempt rejected: no shootout active");
            return false;
        };
        if record.winner.is_some() {
            debug!("penalty attempt rejected: shootout already decided");
            return false;
        }

        let team = record.next_taker;
        record.attempts.push(PenaltyAttempt { team, player_number, outcome });
        if outcome == AttemptOutcome::Scored {
            match team {
                Team::Home => record.home_score += 1,
                Team::Away => record.away_score += 1,
            }
        }
        record.next_taker = team.opponent();
        record.winner = shootout::decide_winner(record);

        let details =
            EventDetails { attempt_outcome: Some(outcome), ..EventDetails::default() };
        next.events.push(
            DomainEvent::new(EventType::PenaltyAttempt, team, clock)
                .with_player(player_number)
                .with_details(details),
        );
        true
    }

    fn start_var_check(&self, next: &mut MatchSnapshot, incident: String) -> bool {
        if matches!(&next.var_check, Some(check) if !check.resolved) {
            debug!("VAR check rejected: one is already in progress");
            return false;
        }
        next.var_check = Some(VarRecord { incident, analysis: None, resolved: false });
        true
    }

    fn set_var_analysis(&self, next: &mut MatchSnapshot, analysis: String) -> bool {
        match next.var_check.as_mut() {
            Some(check) if !check.resolved => {
                check.analysis = Some(analysis);
                check.resolved = true;
                true
            }
            _ => {
                debug!("VAR analysis rejected: no check in progress");
                false
            }
        }
    }

    fn start_poll(&self, next: &mut MatchSnapshot, question: String, options: Vec<String>) -> bool {
        if options.is_empty() {
            debug!("poll rejected: no options");
            return false;
        }
        next.poll = Some(PollRecord {
            question,
            options: options.into_iter().map(|label| PollOption { label, votes: 0 }).collect(),
            open: true,
        });
        true
    }

    fn vote_poll(&self, next: &mut MatchSnapshot, option_index: usize) -> bool {
        match next.poll.as_mut() {
            Some(poll) if poll.open => match poll.options.get_mut(option_index) {
                Some(option) => {
                    option.votes += 1;
                    true
                }
                None => {
                    debug!(option_index, "vote rejected: no such option");
                    false
                }
            },
            _ => {
                debug!("vote rejected: no open poll");
                false
            }
        }
    }

    fn close_poll(&self, next: &mut MatchSnapshot) -> bool {
        match next.poll.as_mut() {
            Some(poll) if poll.open => {
                poll.open = false;
                true
            }
            _ => {
                debug!("close rejected: no open poll");
                false
            }
        }
    }
}

/// Write the stoppage duration into the originating injury event. The
/// one sanctioned mutation of an appended event.
fn annotate_stoppage(events: &mut [DomainEvent], event_id: Uuid, elapsed: u32) {
    if let Some(event) = events.iter_mut().find(|e| e.id == event_id) {
        let details = event.details.get_or_insert_with(EventDetails::default);
        details.stoppage_secs = Some(elapsed);
    }
}

/// Goal impact in percentage points: how much the scoring team's win
/// probability moved relative to the pre-goal triple.
pub fn goal_impact(pre_goal: WinProbability, post_goal: WinProbability, scoring_team: Team) -> f32 {
    (post_goal.normalized().for_team(scoring_team) - pre_goal.normalized().for_team(scoring_team))
        * 100.0
}

#[cfg(test)]
mod tests;
