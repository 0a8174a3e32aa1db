pub mod admission;
pub mod client;
pub mod phases;
pub mod recorder;
pub mod roster;
pub mod wire;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// Number of roster entries a tournament needs before bracket play can start.
pub const BRACKET_CAPACITY: usize = 16;

pub type TournamentId = u32;
pub type PlayerId = u32;
pub type RefereeId = u32;
pub type TeamId = u32;
pub type PhaseId = u32;
pub type MatchId = u32;

/// Parse the timestamps the server and the forms produce: RFC 3339, naive
/// `YYYY-MM-DD[ T]HH:MM[:SS[.fff]]` (taken as UTC), or a bare date at midnight.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    const NAIVE_FORMATS: [&str; 6] = [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M",
    ];
    if let Some(naive) = NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
    {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

// ---------------------------------------------------------------------------
// Domain types, independent of the server's wire format
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TournamentStatus {
    #[default]
    Upcoming,
    Active,
    Completed,
}

impl TournamentStatus {
    pub fn label(&self) -> &'static str {
        match self {
            TournamentStatus::Upcoming => "upcoming",
            TournamentStatus::Active => "active",
            TournamentStatus::Completed => "completed",
        }
    }

    /// Unknown or missing statuses are treated as not yet started.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "active" | "in_progress" | "ongoing" => TournamentStatus::Active,
            "completed" | "finished" | "closed" => TournamentStatus::Completed,
            _ => TournamentStatus::Upcoming,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tournament {
    pub id: TournamentId,
    pub name: String,
    pub edition: String,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub min_level: u8,
    pub min_referee_level: u8,
    pub court_type: String,
    pub status: TournamentStatus,
}

impl Tournament {
    pub fn is_completed(&self) -> bool {
        self.status == TournamentStatus::Completed
    }

    /// "2024-06-01 - 2024-06-08", with "?" for dates the server left out.
    pub fn date_range(&self) -> String {
        let fmt = |d: Option<DateTime<Utc>>| {
            d.map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_else(|| "?".to_string())
        };
        format!("{} - {}", fmt(self.start_date), fmt(self.end_date))
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub level: u8,
    pub score: i64,
    pub team_id: Option<TeamId>,
    pub team_name: Option<String>,
    pub ranking: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Referee {
    pub id: RefereeId,
    pub name: String,
    pub last_name: String,
    pub level: u8,
    pub score: i64,
    pub fiscal_code: String,
}

impl Referee {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.name, self.last_name).trim().to_string()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Team {
    pub id: TeamId,
    pub name: String,
    pub email: String,
    pub is_blocked: bool,
}

/// A player's registration to one tournament.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RosterEntry {
    pub player: Player,
    pub registered_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Phase {
    pub id: PhaseId,
    pub tournament_id: TournamentId,
    pub name: String,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    Scheduled,
    InProgress,
    #[default]
    Completed,
}

impl MatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchStatus::Scheduled => "scheduled",
            MatchStatus::InProgress => "in_progress",
            MatchStatus::Completed => "completed",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "scheduled" => Some(MatchStatus::Scheduled),
            "in_progress" | "live" => Some(MatchStatus::InProgress),
            "completed" | "final" => Some(MatchStatus::Completed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Match {
    pub id: MatchId,
    pub tournament_id: TournamentId,
    pub phase_id: PhaseId,
    pub phase_name: String,
    pub player1_id: PlayerId,
    pub player2_id: PlayerId,
    pub referee_id: RefereeId,
    pub match_date: Option<DateTime<Utc>>,
    pub court_number: u32,
    pub score: Option<String>,
    pub winner_id: Option<PlayerId>,
    pub status: MatchStatus,
}

impl Match {
    pub fn winner_is_participant(&self) -> bool {
        self.winner_id
            .is_none_or(|w| w == self.player1_id || w == self.player2_id)
    }
}

/// Matches of one phase, as grouped by the server.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PhaseMatches {
    pub phase_name: String,
    pub matches: Vec<Match>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TournamentMatches {
    pub tournament_id: TournamentId,
    pub tournament_name: String,
    /// Ordered by bracket progression (see `phases::phase_rank`).
    pub phases: Vec<PhaseMatches>,
}

impl TournamentMatches {
    pub fn total(&self) -> usize {
        self.phases.iter().map(|p| p.matches.len()).sum()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserType {
    #[default]
    Team,
    Referee,
    Admin,
}

impl UserType {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserType::Team => "team",
            UserType::Referee => "referee",
            UserType::Admin => "admin",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "team" => Some(UserType::Team),
            "referee" => Some(UserType::Referee),
            "admin" => Some(UserType::Admin),
            _ => None,
        }
    }
}

/// Result of a successful login.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Login {
    pub user_type: UserType,
    pub email: String,
    pub team_id: Option<TeamId>,
    pub referee_id: Option<RefereeId>,
    pub access_token: Option<String>,
}

/// Lightweight tournament card returned by the legacy search endpoint.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TournamentSummary {
    pub id: TournamentId,
    pub name: String,
    pub location: String,
    pub start_date: String,
    pub end_date: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchOutcome {
    pub tournaments: Vec<TournamentSummary>,
    /// True when the server was unreachable and the demo list was filtered instead.
    pub from_demo_data: bool,
}

// ---------------------------------------------------------------------------
// Outbound payloads
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NewTournament {
    pub name: String,
    pub edition: String,
    /// ISO-8601.
    pub start_date: String,
    /// ISO-8601.
    pub end_date: String,
    pub min_level: u8,
    pub min_referee_level: u8,
    pub court_type: String,
}

/// Body of a match creation request. Built only by `recorder::MatchDraft::validate`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewMatch {
    pub phase_id: PhaseId,
    pub player1_id: PlayerId,
    pub player2_id: PlayerId,
    pub referee_id: RefereeId,
    pub match_date: String,
    pub court_number: u32,
    pub score: Option<String>,
    pub winner_id: Option<PlayerId>,
    pub status: MatchStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TeamRegistration {
    pub team_id: TeamId,
    pub player_ids: Vec<PlayerId>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NewPlayer {
    pub name: String,
    pub level: u8,
    pub team_id: TeamId,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NewReferee {
    pub name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub fiscal_code: String,
    pub level: u8,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
    pub user_type: UserType,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TeamSignup {
    pub name: String,
    pub email: String,
    pub password: String,
}
