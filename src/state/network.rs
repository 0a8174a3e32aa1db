use crate::state::messages::{
    FetchKey, Mutation, MutationOutcome, NetworkRequest, NetworkResponse, Payload,
};
use log::{debug, error};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tennis_api::client::{ApiResult, TennisApi};
use tokio::sync::mpsc;

const SPINNER_CHARS: [char; 10] = ['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧', '⠇', '⠏'];
pub const ERROR_CHAR: char = '!';

#[derive(Debug, Copy, Clone)]
pub struct LoadingState {
    pub is_loading: bool,
    pub spinner_char: char,
}

impl Default for LoadingState {
    fn default() -> Self {
        Self { is_loading: false, spinner_char: ' ' }
    }
}

/// Receives requests from the UI and runs each one on its own task, so a
/// slow roster fetch never holds up an unrelated list.
pub struct NetworkWorker {
    client: TennisApi,
    requests: mpsc::Receiver<NetworkRequest>,
    responses: mpsc::Sender<NetworkResponse>,
    in_flight: Arc<AtomicUsize>,
}

impl NetworkWorker {
    pub fn new(
        client: TennisApi,
        requests: mpsc::Receiver<NetworkRequest>,
        responses: mpsc::Sender<NetworkResponse>,
    ) -> Self {
        Self {
            client,
            requests,
            responses,
            in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub async fn run(mut self) {
        while let Some(request) = self.requests.recv().await {
            start_loading_animation(&self.in_flight, &self.responses).await;

            let client = self.client.clone();
            let responses = self.responses.clone();
            let in_flight = self.in_flight.clone();
            tokio::spawn(async move {
                let response = perform(&client, request).await;
                debug!("network request complete");
                stop_loading_animation(&in_flight, &responses, response_is_ok(&response)).await;

                if let Err(e) = responses.send(response).await {
                    error!("Failed to send network response: {e}");
                }
            });
        }
    }
}

async fn perform(client: &TennisApi, request: NetworkRequest) -> NetworkResponse {
    match request {
        NetworkRequest::Fetch { key, token } => {
            debug!("fetching {key:?}");
            let result = fetch(client, key).await.map_err(|e| e.to_string());
            NetworkResponse::Fetched { key, token, result }
        }
        NetworkRequest::Search { term, token } => {
            debug!("searching tournaments for {term:?}");
            let outcome = client.search_tournaments(&term).await;
            NetworkResponse::Fetched {
                key: FetchKey::Search,
                token,
                result: Ok(Payload::Search(outcome)),
            }
        }
        NetworkRequest::Mutate { mutation, generation } => {
            debug!("submitting {}", mutation.describe());
            let result = mutate(client, &mutation).await.map_err(|e| e.to_string());
            NetworkResponse::Mutated { mutation, generation, result }
        }
    }
}

async fn fetch(client: &TennisApi, key: FetchKey) -> ApiResult<Payload> {
    Ok(match key {
        FetchKey::Tournaments => Payload::Tournaments(client.fetch_tournaments().await?),
        FetchKey::Teams => Payload::Teams(client.fetch_teams().await?),
        FetchKey::Referees => Payload::Referees(client.fetch_referees().await?),
        FetchKey::Rankings => Payload::Players(client.fetch_players(true).await?),
        FetchKey::TeamPlayers(team_id) => {
            Payload::Players(client.fetch_team_players(team_id).await?)
        }
        FetchKey::Roster(id) => Payload::Roster(client.fetch_roster(id).await?),
        FetchKey::Phases(id) => Payload::Phases(client.fetch_phases(id).await?),
        FetchKey::Matches(id) => Payload::Matches(client.fetch_matches(id).await?),
        FetchKey::Search => Payload::Search(client.search_tournaments("").await),
    })
}

async fn mutate(client: &TennisApi, mutation: &Mutation) -> ApiResult<MutationOutcome> {
    match mutation {
        Mutation::Login(credentials) => {
            return client.login(credentials).await.map(MutationOutcome::LoggedIn);
        }
        Mutation::RegisterTeam(signup) => client.register_team(signup).await?,
        Mutation::RegisterReferee(referee) => client.register_referee(referee).await?,
        Mutation::CreateTournament(tournament) => client.create_tournament(tournament).await?,
        Mutation::RemoveRosterEntry { tournament_id, player_id } => {
            client.remove_roster_entry(*tournament_id, *player_id).await?
        }
        Mutation::CreateMatch { tournament_id, new_match } => {
            client.create_match(*tournament_id, new_match).await?
        }
        Mutation::RegisterTeamPlayers { tournament_id, registration } => {
            client.register_team_players(*tournament_id, registration).await?
        }
        Mutation::AddPlayer(player) => client.add_player(player).await?,
        Mutation::BlockTeam(team_id) => client.block_team(*team_id).await?,
        Mutation::UnblockTeam(team_id) => client.unblock_team(*team_id).await?,
        Mutation::SetRefereeScore { referee_id, score } => {
            client.set_referee_score(*referee_id, *score).await?
        }
        Mutation::DeleteReferee(referee_id) => client.delete_referee(*referee_id).await?,
    }
    Ok(MutationOutcome::Done)
}

fn response_is_ok(response: &NetworkResponse) -> bool {
    match response {
        NetworkResponse::Fetched { result, .. } => result.is_ok(),
        NetworkResponse::Mutated { result, .. } => result.is_ok(),
        NetworkResponse::LoadingStateChanged { .. } => true,
    }
}

/// The spinner runs while at least one request is in flight.
async fn start_loading_animation(in_flight: &Arc<AtomicUsize>, responses: &mpsc::Sender<NetworkResponse>) {
    if in_flight.fetch_add(1, Ordering::SeqCst) > 0 {
        return;
    }

    let mut loading_state = LoadingState { is_loading: true, spinner_char: SPINNER_CHARS[0] };
    let _ = responses
        .send(NetworkResponse::LoadingStateChanged { loading_state })
        .await;

    let responses = responses.clone();
    let in_flight = in_flight.clone();

    tokio::spawn(async move {
        let mut spinner_index = 1;
        let mut interval = tokio::time::interval(Duration::from_millis(33));
        loop {
            interval.tick().await;
            if in_flight.load(Ordering::SeqCst) == 0 {
                break;
            }
            loading_state.spinner_char = SPINNER_CHARS[spinner_index];
            spinner_index = (spinner_index + 1) % SPINNER_CHARS.len();
            let _ = responses
                .send(NetworkResponse::LoadingStateChanged { loading_state })
                .await;
        }
    });
}

async fn stop_loading_animation(
    in_flight: &Arc<AtomicUsize>,
    responses: &mpsc::Sender<NetworkResponse>,
    is_ok: bool,
) {
    if in_flight.fetch_sub(1, Ordering::SeqCst) > 1 {
        return;
    }
    tokio::time::sleep(Duration::from_millis(15)).await;

    let spinner_char = if is_ok { ' ' } else { ERROR_CHAR };
    let _ = responses
        .send(NetworkResponse::LoadingStateChanged {
            loading_state: LoadingState { is_loading: false, spinner_char },
        })
        .await;
}
