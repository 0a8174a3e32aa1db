use crate::state::network::LoadingState;
use crate::state::remote::RequestToken;
use crossterm::event::KeyEvent;
use tennis_api::{
    Credentials, Login, NewMatch, NewPlayer, NewReferee, NewTournament, Phase, Player, PlayerId,
    Referee, RefereeId, RosterEntry, SearchOutcome, Team, TeamId, TeamRegistration, TeamSignup,
    Tournament, TournamentId, TournamentMatches,
};

/// Identity of a list the UI can (re)load. Each key owns one result slot and
/// one request sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FetchKey {
    Tournaments,
    Teams,
    Referees,
    Rankings,
    TeamPlayers(TeamId),
    Roster(TournamentId),
    Phases(TournamentId),
    Matches(TournamentId),
    Search,
}

#[derive(Debug, Clone)]
pub enum NetworkRequest {
    Fetch { key: FetchKey, token: RequestToken },
    Search { term: String, token: RequestToken },
    /// `generation` is the session generation the mutation was issued in.
    Mutate { mutation: Mutation, generation: u64 },
}

/// Every state-changing call the client can make.
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    Login(Credentials),
    RegisterTeam(TeamSignup),
    RegisterReferee(NewReferee),
    CreateTournament(NewTournament),
    RemoveRosterEntry {
        tournament_id: TournamentId,
        player_id: PlayerId,
    },
    CreateMatch {
        tournament_id: TournamentId,
        new_match: NewMatch,
    },
    RegisterTeamPlayers {
        tournament_id: TournamentId,
        registration: TeamRegistration,
    },
    AddPlayer(NewPlayer),
    BlockTeam(TeamId),
    UnblockTeam(TeamId),
    SetRefereeScore {
        referee_id: RefereeId,
        score: i64,
    },
    DeleteReferee(RefereeId),
}

/// Two mutations with the same key are duplicates of each other; only one
/// may be in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MutationKey {
    Login,
    RegisterTeam,
    RegisterReferee,
    CreateTournament,
    RemoveRosterEntry(TournamentId),
    CreateMatch(TournamentId),
    RegisterTeamPlayers(TournamentId),
    AddPlayer,
    TeamBlock(TeamId),
    RefereeScore(RefereeId),
    DeleteReferee(RefereeId),
}

impl Mutation {
    pub fn key(&self) -> MutationKey {
        match self {
            Mutation::Login(_) => MutationKey::Login,
            Mutation::RegisterTeam(_) => MutationKey::RegisterTeam,
            Mutation::RegisterReferee(_) => MutationKey::RegisterReferee,
            Mutation::CreateTournament(_) => MutationKey::CreateTournament,
            Mutation::RemoveRosterEntry { tournament_id, .. } => {
                MutationKey::RemoveRosterEntry(*tournament_id)
            }
            Mutation::CreateMatch { tournament_id, .. } => MutationKey::CreateMatch(*tournament_id),
            Mutation::RegisterTeamPlayers { tournament_id, .. } => {
                MutationKey::RegisterTeamPlayers(*tournament_id)
            }
            Mutation::AddPlayer(_) => MutationKey::AddPlayer,
            Mutation::BlockTeam(id) | Mutation::UnblockTeam(id) => MutationKey::TeamBlock(*id),
            Mutation::SetRefereeScore { referee_id, .. } => MutationKey::RefereeScore(*referee_id),
            Mutation::DeleteReferee(id) => MutationKey::DeleteReferee(*id),
        }
    }

    /// Short label for logs and alert titles.
    pub fn describe(&self) -> &'static str {
        match self {
            Mutation::Login(_) => "Login",
            Mutation::RegisterTeam(_) => "Team registration",
            Mutation::RegisterReferee(_) => "Referee registration",
            Mutation::CreateTournament(_) => "Create tournament",
            Mutation::RemoveRosterEntry { .. } => "Remove player",
            Mutation::CreateMatch { .. } => "Create match",
            Mutation::RegisterTeamPlayers { .. } => "Register players",
            Mutation::AddPlayer(_) => "Add player",
            Mutation::BlockTeam(_) => "Block team",
            Mutation::UnblockTeam(_) => "Unblock team",
            Mutation::SetRefereeScore { .. } => "Referee score",
            Mutation::DeleteReferee(_) => "Delete referee",
        }
    }
}

#[derive(Debug)]
pub enum Payload {
    Tournaments(Vec<Tournament>),
    Teams(Vec<Team>),
    Referees(Vec<Referee>),
    Players(Vec<Player>),
    Roster(Vec<RosterEntry>),
    Phases(Vec<Phase>),
    Matches(TournamentMatches),
    Search(SearchOutcome),
}

#[derive(Debug)]
pub enum MutationOutcome {
    LoggedIn(Login),
    Done,
}

#[derive(Debug)]
pub enum NetworkResponse {
    LoadingStateChanged {
        loading_state: LoadingState,
    },
    Fetched {
        key: FetchKey,
        token: RequestToken,
        result: Result<Payload, String>,
    },
    Mutated {
        mutation: Mutation,
        generation: u64,
        result: Result<MutationOutcome, String>,
    },
}

#[derive(Debug, Clone)]
pub enum UiEvent {
    KeyPressed(KeyEvent),
    Resize,
    AppStarted,
}
