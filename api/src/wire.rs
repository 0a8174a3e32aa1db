/// Raw wire types for the Tennis Hub REST API.
/// These map to the clean domain types via the mapping functions in client.rs.
///
/// The server is loose about optional columns and the front ends it grew up
/// with disagree on casing (`is_blocked` vs `isBlocked`), so almost every
/// field is optional or aliased here.
use serde::Deserialize;
use std::collections::BTreeMap;

// ---------------------------------------------------------------------------
// Listings
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Default, Clone)]
pub struct TournamentRecord {
    pub id: u32,
    pub name: Option<String>,
    pub edition: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub min_level: Option<u8>,
    pub min_referee_level: Option<u8>,
    pub status: Option<String>,
    pub court_type: Option<String>,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct PlayerRecord {
    pub id: u32,
    pub name: Option<String>,
    pub level: Option<u8>,
    pub score: Option<i64>,
    #[serde(alias = "teamId")]
    pub team_id: Option<u32>,
    pub team_name: Option<String>,
    pub ranking: Option<u32>,
    /// Only present on `/tournaments/{id}/players`.
    #[serde(alias = "registered_at")]
    pub registration_date: Option<String>,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct TeamRecord {
    pub id: u32,
    pub name: Option<String>,
    pub email: Option<String>,
    #[serde(alias = "isBlocked")]
    pub is_blocked: Option<bool>,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct RefereeRecord {
    pub id: u32,
    pub name: Option<String>,
    pub last_name: Option<String>,
    pub level: Option<u8>,
    pub score: Option<i64>,
    pub fiscal_code: Option<String>,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct PhaseRecord {
    pub id: u32,
    pub tournament_id: Option<u32>,
    pub name: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

// ---------------------------------------------------------------------------
// Matches  (GET /api/tournaments/{id}/matches)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Default, Clone)]
pub struct TournamentMatchesResponse {
    pub tournament_id: Option<u32>,
    pub tournament_name: Option<String>,
    /// Keyed by phase name. The server does not guarantee bracket order.
    #[serde(default)]
    pub matches: BTreeMap<String, Vec<MatchRecord>>,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct MatchRecord {
    pub id: u32,
    pub tournament_id: Option<u32>,
    pub player1_id: Option<u32>,
    pub player2_id: Option<u32>,
    pub referee_id: Option<u32>,
    pub phase_id: Option<u32>,
    pub phase_name: Option<String>,
    pub winner_id: Option<u32>,
    #[serde(alias = "date")]
    pub match_date: Option<String>,
    pub court_number: Option<u32>,
    pub score: Option<String>,
    pub status: Option<String>,
}

// ---------------------------------------------------------------------------
// Auth
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Default, Clone)]
pub struct LoginResponse {
    pub access_token: Option<String>,
    pub user_type: Option<String>,
    pub email: Option<String>,
    pub team_id: Option<u32>,
    pub referee_id: Option<u32>,
}

/// FastAPI error body. `detail` is a string for HTTPException and a list of
/// objects for validation errors.
#[derive(Debug, Deserialize, Default, Clone)]
pub struct ErrorBody {
    pub detail: Option<serde_json::Value>,
}

impl ErrorBody {
    pub fn message(&self) -> Option<String> {
        match self.detail.as_ref()? {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Array(items) => {
                let msgs: Vec<String> = items
                    .iter()
                    .filter_map(|item| item.get("msg").and_then(|m| m.as_str()))
                    .map(ToString::to_string)
                    .collect();
                if msgs.is_empty() { None } else { Some(msgs.join("; ")) }
            }
            other => Some(other.to_string()),
        }
    }
}

// ---------------------------------------------------------------------------
// Legacy search  (GET /tournaments?search=)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(rename_all = "camelCase")]
pub struct SearchRecord {
    pub id: u32,
    pub name: Option<String>,
    pub location: Option<String>,
    #[serde(alias = "start_date")]
    pub start_date: Option<String>,
    #[serde(alias = "end_date")]
    pub end_date: Option<String>,
}
