use crate::{BRACKET_CAPACITY, PlayerId, RosterEntry, TournamentId};

/// Registration state of a roster relative to the bracket capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RosterStatus {
    Under { missing: usize },
    Exact,
    Over { excess: usize },
}

impl RosterStatus {
    /// Compare a roster size against `capacity`.
    ///
    /// `capacity` must be greater than zero; callers pass [`BRACKET_CAPACITY`].
    /// A zero capacity is caught by a debug assertion only.
    pub fn classify(roster_size: usize, capacity: usize) -> Self {
        debug_assert!(capacity > 0, "bracket capacity must be positive");
        match roster_size.cmp(&capacity) {
            std::cmp::Ordering::Less => RosterStatus::Under {
                missing: capacity - roster_size,
            },
            std::cmp::Ordering::Equal => RosterStatus::Exact,
            std::cmp::Ordering::Greater => RosterStatus::Over {
                excess: roster_size - capacity,
            },
        }
    }

    pub fn is_exact(&self) -> bool {
        matches!(self, RosterStatus::Exact)
    }

    /// One-line summary for the tournament card.
    pub fn summary(&self, roster_size: usize, capacity: usize) -> String {
        match self {
            RosterStatus::Under { missing } => {
                format!("{roster_size}/{capacity}, need {missing} more")
            }
            RosterStatus::Exact => format!("{roster_size}/{capacity}, roster complete"),
            RosterStatus::Over { excess } => {
                format!("{roster_size}/{capacity}, {excess} too many")
            }
        }
    }
}

/// Players registered to one tournament, in registration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Roster {
    pub tournament_id: TournamentId,
    pub entries: Vec<RosterEntry>,
}

impl Roster {
    pub fn new(tournament_id: TournamentId, entries: Vec<RosterEntry>) -> Self {
        Self { tournament_id, entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn status(&self) -> RosterStatus {
        RosterStatus::classify(self.len(), BRACKET_CAPACITY)
    }

    pub fn contains(&self, player_id: PlayerId) -> bool {
        self.entries.iter().any(|e| e.player.id == player_id)
    }

    /// The most recently registered entry. Timestamps win when the server
    /// sends them; otherwise the server's order is registration order.
    pub fn newest_entrant(&self) -> Option<&RosterEntry> {
        self.entries
            .iter()
            .enumerate()
            .max_by_key(|(idx, e)| (e.registered_at, *idx))
            .map(|(_, e)| e)
    }

    /// The single entry an administrator is offered to remove. Only an
    /// over-capacity roster has one.
    pub fn removal_candidate(&self) -> Option<&RosterEntry> {
        match self.status() {
            RosterStatus::Over { .. } => self.newest_entrant(),
            _ => None,
        }
    }

    /// How many one-at-a-time removals bring the roster back to capacity.
    pub fn removals_needed(&self) -> usize {
        self.len().saturating_sub(BRACKET_CAPACITY)
    }

    /// Drop an entry locally. Returns false when the player is not on the roster.
    pub fn remove(&mut self, player_id: PlayerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.player.id != player_id);
        self.entries.len() != before
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Player;
    use chrono::{TimeZone, Utc};

    fn roster_of(n: usize) -> Roster {
        let entries = (1..=n as u32)
            .map(|id| RosterEntry {
                player: Player {
                    id,
                    name: format!("Player {id}"),
                    ..Default::default()
                },
                registered_at: None,
            })
            .collect();
        Roster::new(7, entries)
    }

    #[test]
    fn classification_matches_capacity_for_all_small_sizes() {
        for r in 0..=40 {
            let status = RosterStatus::classify(r, BRACKET_CAPACITY);
            assert_eq!(matches!(status, RosterStatus::Under { .. }), r < 16, "size {r}");
            assert_eq!(status == RosterStatus::Exact, r == 16, "size {r}");
            assert_eq!(matches!(status, RosterStatus::Over { .. }), r > 16, "size {r}");
        }
    }

    #[test]
    fn under_reports_missing_count() {
        let status = RosterStatus::classify(15, 16);
        assert_eq!(status, RosterStatus::Under { missing: 1 });
        assert_eq!(status.summary(15, 16), "15/16, need 1 more");
    }

    #[test]
    fn over_capacity_offers_newest_player_for_removal() {
        let roster = roster_of(17);
        let candidate = roster.removal_candidate().expect("over-capacity roster has a candidate");
        assert_eq!(candidate.player.name, "Player 17");
    }

    #[test]
    fn exact_and_under_rosters_offer_no_removal() {
        assert!(roster_of(16).removal_candidate().is_none());
        assert!(roster_of(3).removal_candidate().is_none());
    }

    #[test]
    fn newest_entrant_prefers_registration_timestamps() {
        let mut roster = roster_of(3);
        roster.entries[0].registered_at = Some(Utc.with_ymd_and_hms(2025, 5, 3, 9, 0, 0).unwrap());
        roster.entries[1].registered_at = Some(Utc.with_ymd_and_hms(2025, 5, 1, 9, 0, 0).unwrap());
        roster.entries[2].registered_at = Some(Utc.with_ymd_and_hms(2025, 5, 2, 9, 0, 0).unwrap());
        assert_eq!(roster.newest_entrant().map(|e| e.player.id), Some(1));
    }

    #[test]
    fn repeated_removal_converges_after_exactly_excess_removals() {
        for n in 17..=24 {
            let mut roster = roster_of(n);
            let expected = roster.removals_needed();
            assert_eq!(expected, n - 16);

            let mut removals = 0;
            while let Some(candidate) = roster.removal_candidate() {
                let id = candidate.player.id;
                assert!(roster.remove(id));
                removals += 1;
            }
            assert_eq!(removals, expected, "roster of {n}");
            assert_eq!(roster.status(), RosterStatus::Exact);
        }
    }

    #[test]
    fn removing_unknown_player_is_a_no_op() {
        let mut roster = roster_of(4);
        assert!(!roster.remove(99));
        assert_eq!(roster.len(), 4);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "bracket capacity must be positive")]
    fn zero_capacity_is_rejected_in_debug_builds() {
        RosterStatus::classify(3, 0);
    }
}
