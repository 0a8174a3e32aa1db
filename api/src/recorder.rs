//! Client-side validation of a single match before it is submitted.
//!
//! Mirrors the server's checks so obviously broken drafts never leave the
//! client. The draft keeps raw form text; `validate` is the only way to get a
//! `NewMatch` out of it.

use crate::{MatchStatus, NewMatch, PlayerId, parse_timestamp};
use chrono::{DateTime, SecondsFormat, Utc};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftField {
    Phase,
    Player1,
    Player2,
    Referee,
    Date,
    CourtNumber,
    Winner,
}

impl DraftField {
    pub fn label(&self) -> &'static str {
        match self {
            DraftField::Phase => "phase",
            DraftField::Player1 => "player 1",
            DraftField::Player2 => "player 2",
            DraftField::Referee => "referee",
            DraftField::Date => "date",
            DraftField::CourtNumber => "court number",
            DraftField::Winner => "winner",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DraftError {
    Missing(DraftField),
    NotNumeric(DraftField),
    SamePlayer,
    WinnerNotParticipant,
    InvalidDate(String),
}

impl fmt::Display for DraftError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DraftError::Missing(field) => write!(f, "Missing {}", field.label()),
            DraftError::NotNumeric(field) => write!(f, "The {} must be a number", field.label()),
            DraftError::SamePlayer => write!(f, "A player cannot play against themselves"),
            DraftError::WinnerNotParticipant => {
                write!(f, "The winner must be one of the two players")
            }
            DraftError::InvalidDate(raw) => write!(f, "Unrecognised date: {raw}"),
        }
    }
}

impl std::error::Error for DraftError {}

/// Raw contents of the match form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchDraft {
    pub phase_id: String,
    pub player1_id: String,
    pub player2_id: String,
    pub referee_id: String,
    /// Empty means "now".
    pub match_date: String,
    pub court_number: String,
    pub score: String,
    pub winner_id: String,
}

impl MatchDraft {
    /// Validate the draft and build the creation request.
    ///
    /// `status` is the status the match is created with. A winner is required
    /// for completed matches and optional otherwise, but when given it must be
    /// one of the two participants.
    pub fn validate(&self, now: DateTime<Utc>, status: MatchStatus) -> Result<NewMatch, DraftError> {
        let player1 = parse_id(&self.player1_id, DraftField::Player1);
        let player2 = parse_id(&self.player2_id, DraftField::Player2);

        // Reported first: a self-match is wrong whatever else is filled in.
        if let (Ok(a), Ok(b)) = (&player1, &player2)
            && a == b
        {
            return Err(DraftError::SamePlayer);
        }

        let phase_id = parse_id(&self.phase_id, DraftField::Phase)?;
        let player1_id = player1?;
        let player2_id = player2?;
        let referee_id = parse_id(&self.referee_id, DraftField::Referee)?;

        let winner_id = match self.winner_id.trim() {
            "" if status == MatchStatus::Completed => {
                return Err(DraftError::Missing(DraftField::Winner));
            }
            "" => None,
            _ => {
                let winner = parse_id(&self.winner_id, DraftField::Winner)?;
                if winner != player1_id && winner != player2_id {
                    return Err(DraftError::WinnerNotParticipant);
                }
                Some(winner)
            }
        };

        let match_date = resolve_date(&self.match_date, now)?;
        let court_number = parse_id(&self.court_number, DraftField::CourtNumber)?;
        let score = Some(self.score.trim())
            .filter(|s| !s.is_empty())
            .map(ToString::to_string);

        Ok(NewMatch {
            phase_id,
            player1_id,
            player2_id,
            referee_id,
            match_date,
            court_number,
            score,
            winner_id,
            status,
        })
    }

    /// Participant ids that currently parse, for the winner control.
    pub fn participants(&self) -> Vec<PlayerId> {
        [&self.player1_id, &self.player2_id]
            .into_iter()
            .filter_map(|raw| raw.trim().parse::<PlayerId>().ok())
            .collect()
    }
}

fn parse_id(raw: &str, field: DraftField) -> Result<u32, DraftError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(DraftError::Missing(field));
    }
    raw.parse::<u32>().map_err(|_| DraftError::NotNumeric(field))
}

fn resolve_date(raw: &str, now: DateTime<Utc>) -> Result<String, DraftError> {
    let raw = raw.trim();
    let when = if raw.is_empty() {
        now
    } else {
        parse_timestamp(raw).ok_or_else(|| DraftError::InvalidDate(raw.to_string()))?
    };
    Ok(when.to_rfc3339_opts(SecondsFormat::Millis, true))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 14, 10, 30, 0).unwrap()
    }

    fn valid_draft() -> MatchDraft {
        MatchDraft {
            phase_id: "3".into(),
            player1_id: "5".into(),
            player2_id: "8".into(),
            referee_id: "2".into(),
            match_date: "2025-06-15 14:00".into(),
            court_number: "1".into(),
            score: "6-4 6-3".into(),
            winner_id: "8".into(),
        }
    }

    #[test]
    fn valid_draft_builds_request() {
        let m = valid_draft().validate(now(), MatchStatus::Completed).unwrap();
        assert_eq!(m.phase_id, 3);
        assert_eq!((m.player1_id, m.player2_id), (5, 8));
        assert_eq!(m.winner_id, Some(8));
        assert_eq!(m.court_number, 1);
        assert_eq!(m.match_date, "2025-06-15T14:00:00.000Z");
        assert_eq!(m.score.as_deref(), Some("6-4 6-3"));
        assert_eq!(m.status, MatchStatus::Completed);
    }

    #[test]
    fn same_player_is_rejected_regardless_of_other_fields() {
        let draft = MatchDraft {
            player1_id: "5".into(),
            player2_id: "5".into(),
            ..Default::default()
        };
        assert_eq!(draft.validate(now(), MatchStatus::Completed), Err(DraftError::SamePlayer));

        let mut full = valid_draft();
        full.player2_id = " 5 ".into();
        assert_eq!(full.validate(now(), MatchStatus::Completed), Err(DraftError::SamePlayer));
    }

    #[test]
    fn winner_must_be_a_participant() {
        let mut draft = valid_draft();
        draft.winner_id = "99".into();
        assert_eq!(
            draft.validate(now(), MatchStatus::Completed),
            Err(DraftError::WinnerNotParticipant)
        );
    }

    #[test]
    fn completed_match_needs_a_winner() {
        let mut draft = valid_draft();
        draft.winner_id.clear();
        assert_eq!(
            draft.validate(now(), MatchStatus::Completed),
            Err(DraftError::Missing(DraftField::Winner))
        );
        let scheduled = draft.validate(now(), MatchStatus::Scheduled).unwrap();
        assert_eq!(scheduled.winner_id, None);
    }

    #[test]
    fn missing_and_non_numeric_ids_are_reported() {
        let mut draft = valid_draft();
        draft.phase_id.clear();
        assert_eq!(
            draft.validate(now(), MatchStatus::Completed),
            Err(DraftError::Missing(DraftField::Phase))
        );

        let mut draft = valid_draft();
        draft.referee_id = "ref".into();
        assert_eq!(
            draft.validate(now(), MatchStatus::Completed),
            Err(DraftError::NotNumeric(DraftField::Referee))
        );

        let mut draft = valid_draft();
        draft.court_number = "centre".into();
        assert_eq!(
            draft.validate(now(), MatchStatus::Completed),
            Err(DraftError::NotNumeric(DraftField::CourtNumber))
        );
    }

    #[test]
    fn empty_date_defaults_to_now() {
        let mut draft = valid_draft();
        draft.match_date = "  ".into();
        let m = draft.validate(now(), MatchStatus::Completed).unwrap();
        assert_eq!(m.match_date, "2025-06-14T10:30:00.000Z");
    }

    #[test]
    fn garbage_date_is_rejected() {
        let mut draft = valid_draft();
        draft.match_date = "next tuesday".into();
        assert_eq!(
            draft.validate(now(), MatchStatus::Completed),
            Err(DraftError::InvalidDate("next tuesday".into()))
        );
    }

    #[test]
    fn empty_score_is_sent_as_none() {
        let mut draft = valid_draft();
        draft.score = " ".into();
        assert_eq!(draft.validate(now(), MatchStatus::Completed).unwrap().score, None);
    }

    #[test]
    fn participants_skip_unparsed_slots() {
        let draft = MatchDraft {
            player1_id: "4".into(),
            player2_id: String::new(),
            ..Default::default()
        };
        assert_eq!(draft.participants(), vec![4]);
    }
}
