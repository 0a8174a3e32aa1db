//! Match admission gate: whether match creation is offered for a tournament.
//!
//! The gate only decides what the client shows. The server re-validates every
//! match creation request on its own.

use crate::TournamentStatus;
use crate::roster::RosterStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockReason {
    TournamentCompleted,
    RosterIncomplete { missing: usize },
    RosterOverCapacity { excess: usize },
}

impl LockReason {
    pub fn describe(&self) -> String {
        match self {
            LockReason::TournamentCompleted => "tournament completed".to_string(),
            LockReason::RosterIncomplete { missing } => {
                format!("waiting for {missing} more player(s)")
            }
            LockReason::RosterOverCapacity { excess } => {
                format!("{excess} player(s) over capacity")
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    Locked(LockReason),
    Open,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateTransition {
    Opened,
    Closed(LockReason),
    Unchanged,
}

impl GateState {
    /// Open iff the roster is exactly at capacity and the tournament is not completed.
    pub fn evaluate(roster: RosterStatus, status: TournamentStatus) -> Self {
        if status == TournamentStatus::Completed {
            return GateState::Locked(LockReason::TournamentCompleted);
        }
        match roster {
            RosterStatus::Exact => GateState::Open,
            RosterStatus::Under { missing } => {
                GateState::Locked(LockReason::RosterIncomplete { missing })
            }
            RosterStatus::Over { excess } => {
                GateState::Locked(LockReason::RosterOverCapacity { excess })
            }
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self, GateState::Open)
    }

    /// Compare with the previously observed state. A first observation
    /// (`previous == None`) counts as a transition out of `Locked`.
    pub fn transition_from(&self, previous: Option<&GateState>) -> GateTransition {
        let was_open = previous.is_some_and(GateState::is_open);
        match (was_open, self) {
            (false, GateState::Open) => GateTransition::Opened,
            (true, GateState::Locked(reason)) => GateTransition::Closed(*reason),
            _ => GateTransition::Unchanged,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BRACKET_CAPACITY;

    const STATUSES: [TournamentStatus; 3] = [
        TournamentStatus::Upcoming,
        TournamentStatus::Active,
        TournamentStatus::Completed,
    ];

    #[test]
    fn open_iff_exact_and_not_completed() {
        for size in 0..=32 {
            let roster = RosterStatus::classify(size, BRACKET_CAPACITY);
            for status in STATUSES {
                let gate = GateState::evaluate(roster, status);
                let expected = size == 16 && status != TournamentStatus::Completed;
                assert_eq!(gate.is_open(), expected, "size {size}, status {status:?}");
            }
        }
    }

    #[test]
    fn completed_tournament_stays_locked_with_full_roster() {
        let gate = GateState::evaluate(RosterStatus::Exact, TournamentStatus::Completed);
        assert_eq!(gate, GateState::Locked(LockReason::TournamentCompleted));
    }

    #[test]
    fn reaching_capacity_opens_the_gate() {
        let before = GateState::evaluate(RosterStatus::classify(15, 16), TournamentStatus::Upcoming);
        let after = GateState::evaluate(RosterStatus::classify(16, 16), TournamentStatus::Upcoming);
        assert_eq!(after.transition_from(Some(&before)), GateTransition::Opened);
    }

    #[test]
    fn leaving_capacity_or_completing_closes_the_gate() {
        let open = GateState::Open;
        let over = GateState::evaluate(RosterStatus::classify(17, 16), TournamentStatus::Active);
        assert_eq!(
            over.transition_from(Some(&open)),
            GateTransition::Closed(LockReason::RosterOverCapacity { excess: 1 })
        );
        let done = GateState::evaluate(RosterStatus::Exact, TournamentStatus::Completed);
        assert_eq!(
            done.transition_from(Some(&open)),
            GateTransition::Closed(LockReason::TournamentCompleted)
        );
    }

    #[test]
    fn first_observation_of_open_gate_counts_as_opened() {
        assert_eq!(GateState::Open.transition_from(None), GateTransition::Opened);
        let locked = GateState::Locked(LockReason::RosterIncomplete { missing: 2 });
        assert_eq!(locked.transition_from(None), GateTransition::Unchanged);
    }
}
