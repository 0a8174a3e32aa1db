use crate::phases::order_groups;
use crate::wire::{
    ErrorBody, LoginResponse, MatchRecord, PhaseRecord, PlayerRecord, RefereeRecord, SearchRecord,
    TeamRecord, TournamentMatchesResponse, TournamentRecord,
};
use crate::{
    Credentials, Login, Match, MatchStatus, NewMatch, NewPlayer, NewReferee, NewTournament, Phase,
    PhaseMatches, Player, PlayerId, Referee, RefereeId, RosterEntry, SearchOutcome, Team, TeamId,
    TeamRegistration, TeamSignup, Tournament, TournamentId, TournamentMatches, TournamentStatus,
    TournamentSummary, parse_timestamp,
};
use log::{debug, warn};
use reqwest::{Client, Method, Response, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fmt;
use std::time::Duration;

pub type ApiResult<T> = Result<T, ApiError>;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP verb used for referee score updates. Deployments of the server
/// disagree on this one route.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ScoreMethod {
    #[default]
    Post,
    Put,
}

impl ScoreMethod {
    fn method(self) -> Method {
        match self {
            ScoreMethod::Post => Method::POST,
            ScoreMethod::Put => Method::PUT,
        }
    }
}

/// Client for the Tennis Hub REST API.
#[derive(Debug, Clone)]
pub struct TennisApi {
    client: Client,
    base_url: String,
    timeout: Duration,
    score_method: ScoreMethod,
}

impl Default for TennisApi {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

#[derive(Debug)]
pub enum ApiError {
    Network(reqwest::Error, String),
    Api {
        status: u16,
        url: String,
        detail: Option<String>,
    },
    Parsing(reqwest::Error, String),
    NotFound(String),
    Other(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Network(e, url) => write!(f, "Network error for {url}: {e}"),
            ApiError::Api {
                detail: Some(detail),
                ..
            } => write!(f, "{detail}"),
            ApiError::Api { status, url, .. } => write!(f, "API error {status} for {url}"),
            ApiError::Parsing(e, url) => write!(f, "Parse error for {url}: {e}"),
            ApiError::NotFound(msg) => write!(f, "Not found: {msg}"),
            ApiError::Other(msg) => write!(f, "Error: {msg}"),
        }
    }
}

impl std::error::Error for ApiError {}

impl TennisApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::builder()
                .user_agent("tennis-hub/0.1 (terminal client)")
                .build()
                .unwrap_or_default(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout: DEFAULT_TIMEOUT,
            score_method: ScoreMethod::default(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_score_method(mut self, score_method: ScoreMethod) -> Self {
        self.score_method = score_method;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // -- listings -----------------------------------------------------------

    pub async fn fetch_tournaments(&self) -> ApiResult<Vec<Tournament>> {
        let raw: Vec<TournamentRecord> = self.get("/api/tournaments").await?;
        Ok(raw.into_iter().map(map_tournament).collect())
    }

    pub async fn fetch_teams(&self) -> ApiResult<Vec<Team>> {
        let raw: Vec<TeamRecord> = self.get("/api/teams").await?;
        Ok(raw.into_iter().map(map_team).collect())
    }

    /// All players. With `with_ranking` the server sorts by score and fills
    /// in each player's ranking position.
    pub async fn fetch_players(&self, with_ranking: bool) -> ApiResult<Vec<Player>> {
        let path = if with_ranking {
            "/api/players?with_ranking=true"
        } else {
            "/api/players"
        };
        let raw: Vec<PlayerRecord> = self.get(path).await?;
        let mut players: Vec<Player> = raw.into_iter().map(map_player).collect();
        if with_ranking {
            rank_players(&mut players);
        }
        Ok(players)
    }

    pub async fn fetch_team_players(&self, team_id: TeamId) -> ApiResult<Vec<Player>> {
        let raw: Vec<PlayerRecord> = self.get(&format!("/api/teams/{team_id}/players")).await?;
        Ok(raw.into_iter().map(map_player).collect())
    }

    pub async fn fetch_referees(&self) -> ApiResult<Vec<Referee>> {
        let raw: Vec<RefereeRecord> = self.get("/api/referees").await?;
        Ok(raw.into_iter().map(map_referee).collect())
    }

    /// Registered players of a tournament, in registration order.
    pub async fn fetch_roster(&self, tournament_id: TournamentId) -> ApiResult<Vec<RosterEntry>> {
        let raw: Vec<PlayerRecord> = self
            .get(&format!("/api/tournaments/{tournament_id}/players"))
            .await?;
        Ok(raw.into_iter().map(map_roster_entry).collect())
    }

    pub async fn fetch_phases(&self, tournament_id: TournamentId) -> ApiResult<Vec<Phase>> {
        let raw: Vec<PhaseRecord> = self
            .get(&format!("/api/tournaments/{tournament_id}/phases"))
            .await?;
        Ok(raw
            .into_iter()
            .map(|p| map_phase(p, tournament_id))
            .collect())
    }

    /// Matches grouped by phase, in bracket order.
    pub async fn fetch_matches(&self, tournament_id: TournamentId) -> ApiResult<TournamentMatches> {
        let raw: TournamentMatchesResponse = self
            .get(&format!("/api/tournaments/{tournament_id}/matches"))
            .await?;
        Ok(map_matches(tournament_id, raw))
    }

    // -- tournaments & matches ---------------------------------------------

    pub async fn create_tournament(&self, tournament: &NewTournament) -> ApiResult<()> {
        self.send(Method::POST, "/api/tournaments", Some(tournament))
            .await
            .map(drop)
    }

    pub async fn remove_roster_entry(
        &self,
        tournament_id: TournamentId,
        player_id: PlayerId,
    ) -> ApiResult<()> {
        let path = format!("/api/tournaments/{tournament_id}/players/{player_id}");
        self.send::<()>(Method::DELETE, &path, None).await.map(drop)
    }

    pub async fn create_match(&self, tournament_id: TournamentId, new_match: &NewMatch) -> ApiResult<()> {
        let path = format!("/api/tournaments/{tournament_id}/matches");
        self.send(Method::POST, &path, Some(new_match)).await.map(drop)
    }

    pub async fn register_team_players(
        &self,
        tournament_id: TournamentId,
        registration: &TeamRegistration,
    ) -> ApiResult<()> {
        let path = format!("/api/tournaments/{tournament_id}/register-team");
        self.send(Method::POST, &path, Some(registration))
            .await
            .map(drop)
    }

    // -- teams & referees ---------------------------------------------------

    pub async fn block_team(&self, team_id: TeamId) -> ApiResult<()> {
        let path = format!("/api/teams/{team_id}/block");
        self.send::<()>(Method::POST, &path, None).await.map(drop)
    }

    pub async fn unblock_team(&self, team_id: TeamId) -> ApiResult<()> {
        let path = format!("/api/teams/{team_id}/unblock");
        self.send::<()>(Method::POST, &path, None).await.map(drop)
    }

    pub async fn set_referee_score(&self, referee_id: RefereeId, score: i64) -> ApiResult<()> {
        #[derive(Serialize)]
        struct ScoreBody {
            score: i64,
        }
        let path = format!("/api/referees/{referee_id}/score");
        self.send(self.score_method.method(), &path, Some(&ScoreBody { score }))
            .await
            .map(drop)
    }

    pub async fn delete_referee(&self, referee_id: RefereeId) -> ApiResult<()> {
        let path = format!("/api/referees/{referee_id}");
        self.send::<()>(Method::DELETE, &path, None).await.map(drop)
    }

    pub async fn add_player(&self, player: &NewPlayer) -> ApiResult<()> {
        self.send(Method::POST, "/api/players", Some(player))
            .await
            .map(drop)
    }

    pub async fn register_referee(&self, referee: &NewReferee) -> ApiResult<()> {
        self.send(Method::POST, "/api/referees/register", Some(referee))
            .await
            .map(drop)
    }

    // -- auth ----------------------------------------------------------------

    pub async fn login(&self, credentials: &Credentials) -> ApiResult<Login> {
        let url = self.url("/api/login");
        let response = self
            .client
            .post(&url)
            .form(credentials)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| ApiError::Network(e, url.clone()))?;
        let raw: LoginResponse = check_status(response, &url)
            .await?
            .json()
            .await
            .map_err(|e| ApiError::Parsing(e, url.clone()))?;
        Ok(map_login(raw, credentials))
    }

    pub async fn register_team(&self, signup: &TeamSignup) -> ApiResult<()> {
        let url = self.url("/api/teams/register");
        let response = self
            .client
            .post(&url)
            .form(signup)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| ApiError::Network(e, url.clone()))?;
        check_status(response, &url).await.map(drop)
    }

    // -- legacy search ------------------------------------------------------

    /// Search tournaments by name on the legacy endpoint. Never fails: when
    /// the server cannot answer, the built-in demo list is filtered instead
    /// and the outcome says so.
    pub async fn search_tournaments(&self, term: &str) -> SearchOutcome {
        match self.try_search(term).await {
            Ok(tournaments) => SearchOutcome {
                tournaments,
                from_demo_data: false,
            },
            Err(e) => {
                warn!("tournament search failed, showing demo data: {e}");
                SearchOutcome {
                    tournaments: filter_demo_tournaments(term),
                    from_demo_data: true,
                }
            }
        }
    }

    async fn try_search(&self, term: &str) -> ApiResult<Vec<TournamentSummary>> {
        let base = self.url("/tournaments");
        let url = Url::parse_with_params(&base, &[("search", term)])
            .map_err(|e| ApiError::Other(format!("invalid search url {base}: {e}")))?;
        let raw: Vec<SearchRecord> = self.get_url(url.as_str()).await?;
        Ok(raw.into_iter().map(map_search).collect())
    }

    // -- transport ----------------------------------------------------------

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        self.get_url(&self.url(path)).await
    }

    async fn get_url<T: DeserializeOwned>(&self, url: &str) -> ApiResult<T> {
        debug!("GET {url}");
        let response = self
            .client
            .get(url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| ApiError::Network(e, url.to_owned()))?;

        check_status(response, url)
            .await?
            .json::<T>()
            .await
            .map_err(|e| ApiError::Parsing(e, url.to_owned()))
    }

    async fn send<B: Serialize>(&self, method: Method, path: &str, body: Option<&B>) -> ApiResult<Response> {
        let url = self.url(path);
        debug!("{method} {url}");
        let mut request = self.client.request(method, &url).timeout(self.timeout);
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = request
            .send()
            .await
            .map_err(|e| ApiError::Network(e, url.clone()))?;
        check_status(response, &url).await
    }
}

/// Turn non-2xx responses into `ApiError`, extracting the server's `detail`
/// message when the body carries one.
async fn check_status(response: Response, url: &str) -> ApiResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let detail = response
        .text()
        .await
        .ok()
        .and_then(|body| serde_json::from_str::<ErrorBody>(&body).ok())
        .and_then(|body| body.message());
    if status == reqwest::StatusCode::NOT_FOUND {
        return Err(ApiError::NotFound(detail.unwrap_or_else(|| url.to_owned())));
    }
    Err(ApiError::Api {
        status: status.as_u16(),
        url: url.to_owned(),
        detail,
    })
}

// ---------------------------------------------------------------------------
// Mapping: wire types → clean domain types
// ---------------------------------------------------------------------------

fn map_tournament(t: TournamentRecord) -> Tournament {
    Tournament {
        id: t.id,
        name: t.name.unwrap_or_default(),
        edition: t.edition.unwrap_or_default(),
        start_date: t.start_date.as_deref().and_then(parse_timestamp),
        end_date: t.end_date.as_deref().and_then(parse_timestamp),
        min_level: t.min_level.unwrap_or_default(),
        min_referee_level: t.min_referee_level.unwrap_or_default(),
        court_type: t.court_type.unwrap_or_default(),
        status: t
            .status
            .as_deref()
            .map(TournamentStatus::parse)
            .unwrap_or_default(),
    }
}

fn map_player(p: PlayerRecord) -> Player {
    Player {
        id: p.id,
        name: p.name.unwrap_or_default(),
        level: p.level.unwrap_or_default(),
        score: p.score.unwrap_or_default(),
        team_id: p.team_id,
        team_name: p.team_name,
        ranking: p.ranking,
    }
}

fn map_roster_entry(mut p: PlayerRecord) -> RosterEntry {
    let registered_at = p.registration_date.take().as_deref().and_then(parse_timestamp);
    RosterEntry {
        player: map_player(p),
        registered_at,
    }
}

/// Sort by descending score and fill in positions the server left out.
fn rank_players(players: &mut [Player]) {
    players.sort_by(|a, b| b.score.cmp(&a.score).then_with(|| a.name.cmp(&b.name)));
    for (idx, player) in players.iter_mut().enumerate() {
        if player.ranking.is_none() {
            player.ranking = Some(idx as u32 + 1);
        }
    }
}

fn map_team(t: TeamRecord) -> Team {
    Team {
        id: t.id,
        name: t.name.unwrap_or_default(),
        email: t.email.unwrap_or_default(),
        is_blocked: t.is_blocked.unwrap_or(false),
    }
}

fn map_referee(r: RefereeRecord) -> Referee {
    Referee {
        id: r.id,
        name: r.name.unwrap_or_default(),
        last_name: r.last_name.unwrap_or_default(),
        level: r.level.unwrap_or_default(),
        score: r.score.unwrap_or_default(),
        fiscal_code: r.fiscal_code.unwrap_or_default(),
    }
}

fn map_phase(p: PhaseRecord, tournament_id: TournamentId) -> Phase {
    Phase {
        id: p.id,
        tournament_id: p.tournament_id.unwrap_or(tournament_id),
        name: p.name.unwrap_or_else(|| format!("Phase {}", p.id)),
        start_date: p.start_date.as_deref().and_then(parse_timestamp),
        end_date: p.end_date.as_deref().and_then(parse_timestamp),
    }
}

fn map_matches(tournament_id: TournamentId, raw: TournamentMatchesResponse) -> TournamentMatches {
    let tournament_id = raw.tournament_id.unwrap_or(tournament_id);
    let mut phases: Vec<PhaseMatches> = raw
        .matches
        .into_iter()
        .map(|(phase_name, records)| PhaseMatches {
            matches: records
                .into_iter()
                .map(|m| map_match(m, tournament_id, &phase_name))
                .collect(),
            phase_name,
        })
        .collect();
    order_groups(&mut phases);

    TournamentMatches {
        tournament_id,
        tournament_name: raw.tournament_name.unwrap_or_default(),
        phases,
    }
}

fn map_match(m: MatchRecord, tournament_id: TournamentId, phase_name: &str) -> Match {
    Match {
        id: m.id,
        tournament_id: m.tournament_id.unwrap_or(tournament_id),
        phase_id: m.phase_id.unwrap_or_default(),
        phase_name: m.phase_name.unwrap_or_else(|| phase_name.to_string()),
        player1_id: m.player1_id.unwrap_or_default(),
        player2_id: m.player2_id.unwrap_or_default(),
        referee_id: m.referee_id.unwrap_or_default(),
        match_date: m.match_date.as_deref().and_then(parse_timestamp),
        court_number: m.court_number.unwrap_or_default(),
        score: m.score.filter(|s| !s.trim().is_empty()),
        winner_id: m.winner_id,
        status: m
            .status
            .as_deref()
            .and_then(MatchStatus::parse)
            .unwrap_or_default(),
    }
}

/// The server echoes the role when it knows it; otherwise the role the user
/// logged in as is kept.
fn map_login(raw: LoginResponse, credentials: &Credentials) -> Login {
    Login {
        user_type: raw
            .user_type
            .as_deref()
            .and_then(crate::UserType::parse)
            .unwrap_or(credentials.user_type),
        email: raw.email.unwrap_or_else(|| credentials.email.clone()),
        team_id: raw.team_id,
        referee_id: raw.referee_id,
        access_token: raw.access_token,
    }
}

fn map_search(s: SearchRecord) -> TournamentSummary {
    TournamentSummary {
        id: s.id,
        name: s.name.unwrap_or_default(),
        location: s.location.unwrap_or_default(),
        start_date: s.start_date.unwrap_or_default(),
        end_date: s.end_date.unwrap_or_default(),
    }
}

fn demo_tournaments() -> Vec<TournamentSummary> {
    ["Roma", "Milano", "Napoli", "Palermo"]
        .into_iter()
        .zip(1..)
        .map(|(city, id)| TournamentSummary {
            id,
            name: format!("Torneo di {city}"),
            location: city.to_string(),
            start_date: "2024-01-01".to_string(),
            end_date: "2024-01-07".to_string(),
        })
        .collect()
}

/// Case-insensitive substring match on the tournament name.
fn filter_demo_tournaments(term: &str) -> Vec<TournamentSummary> {
    let needle = term.trim().to_lowercase();
    demo_tournaments()
        .into_iter()
        .filter(|t| t.name.to_lowercase().contains(&needle))
        .collect()
}
