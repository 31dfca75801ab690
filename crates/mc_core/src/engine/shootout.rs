//! Shootout winner decision: mathematical elimination, checked after
//! every attempt, under the best-of-5-then-sudden-death format.

use crate::models::{PenaltyShootoutRecord, Team};

const REGULATION_KICKS: usize = 5;

/// Decide the winner, if any, for the current shootout state.
///
/// During the first five kicks per side, a side is eliminated as soon as
/// its maximum possible final score (current score plus every remaining
/// guaranteed kick) cannot equal or exceed the opponent's score. Once
/// both sides have taken five, the shootout is in sudden death and a
/// winner exists only at pair boundaries with differing scores.
pub(crate) fn decide_winner(record: &PenaltyShootoutRecord) -> Option<Team> {
    let home_taken = record.taken(Team::Home);
    let away_taken = record.taken(Team::Away);
    let home = record.home_score as usize;
    let away = record.away_score as usize;

    if home_taken < REGULATION_KICKS || away_taken < REGULATION_KICKS {
        let home_max = home + (REGULATION_KICKS - home_taken.min(REGULATION_KICKS));
        let away_max = away + (REGULATION_KICKS - away_taken.min(REGULATION_KICKS));
        if home_max < away {
            return Some(Team::Away);
        }
        if away_max < home {
            return Some(Team::Home);
        }
        return None;
    }

    // Sudden death: decisions only when both sides have taken the same
    // number of kicks.
    if home_taken == away_taken && home != away {
        return Some(if home > away { Team::Home } else { Team::Away });
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AttemptOutcome, PenaltyAttempt};

    fn record_with(outcomes: &[(Team, AttemptOutcome)]) -> PenaltyShootoutRecord {
        let mut record = PenaltyShootoutRecord::new(Team::Home);
        for &(team, outcome) in outcomes {
            record.attempts.push(PenaltyAttempt { team, player_number: 10, outcome });
            if outcome == AttemptOutcome::Scored {
                match team {
                    Team::Home => record.home_score += 1,
                    Team::Away => record.away_score += 1,
                }
            }
        }
        record
    }

    fn alternating(home: &[bool], away: &[bool]) -> PenaltyShootoutRecord {
        let mut seq = Vec::new();
        let rounds = home.len().max(away.len());
        for i in 0..rounds {
            if let Some(&scored) = home.get(i) {
                let outcome = if scored { AttemptOutcome::Scored } else { AttemptOutcome::Missed };
                seq.push((Team::Home, outcome));
            }
            if let Some(&scored) = away.get(i) {
                let outcome = if scored { AttemptOutcome::Scored } else { AttemptOutcome::Saved };
                seq.push((Team::Away, outcome));
            }
        }
        record_with(&seq)
    }

    #[test]
    fn no_winner_while_both_can_still_draw() {
        // 2-2 after three kicks each: both can reach 4.
        let record = alternating(&[true, true, false], &[true, false, true]);
        assert_eq!(decide_winner(&record), None);
    }

    #[test]
    fn early_elimination_inside_regulation() {
        // Home has scored all four; away has missed three and can reach
        // at most two of five.
        let record = record_with(&[
            (Team::Home, AttemptOutcome::Scored),
            (Team::Away, AttemptOutcome::Missed),
            (Team::Home, AttemptOutcome::Scored),
            (Team::Away, AttemptOutcome::Missed),
            (Team::Home, AttemptOutcome::Scored),
            (Team::Away, AttemptOutcome::Missed),
            (Team::Home, AttemptOutcome::Scored),
        ]);
        assert_eq!(record.home_score, 4);
        assert_eq!(decide_winner(&record), Some(Team::Home));
    }

    #[test]
    fn opponent_max_equal_is_not_elimination() {
        // Home 3, away 2 with one away kick left: away can still equal.
        let record = alternating(&[true, true, true, false, false], &[true, true, false, false]);
        assert_eq!(record.home_score, 3);
        assert_eq!(record.away_score, 2);
        assert_eq!(decide_winner(&record), None);
    }

    #[test]
    fn regulation_ends_decided_after_five_each() {
        let record = alternating(&[true, true, true, false, true], &[true, false, false, true, false]);
        assert_eq!((record.home_score, record.away_score), (4, 2));
        assert_eq!(decide_winner(&record), Some(Team::Home));
    }

    #[test]
    fn sudden_death_waits_for_pair_boundary() {
        // 3-3 through five, home scores its sixth: not decided until the
        // away side answers.
        let mut record = alternating(&[true, true, true, false, false], &[true, false, true, true, false]);
        record.attempts.push(PenaltyAttempt {
            team: Team::Home,
            player_number: 7,
            outcome: AttemptOutcome::Scored,
        });
        record.home_score += 1;
        assert_eq!(decide_winner(&record), None);

        record.attempts.push(PenaltyAttempt {
            team: Team::Away,
            player_number: 8,
            outcome: AttemptOutcome::Saved,
        });
        assert_eq!(decide_winner(&record), Some(Team::Home));
    }
}
