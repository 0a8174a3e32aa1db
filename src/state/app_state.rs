use crate::state::forms::Form;
use crate::state::messages::{Mutation, MutationKey};
use crate::state::remote::{Remote, RequestSequencer};
use crate::state::session::Session;
use std::collections::{BTreeSet, HashMap, HashSet};
use tennis_api::admission::GateState;
use tennis_api::phases::PhaseCatalog;
use tennis_api::roster::Roster;
use tennis_api::{
    Player, PlayerId, Referee, SearchOutcome, Team, Tournament, TournamentId, TournamentMatches,
};

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum MenuItem {
    #[default]
    Tournaments,
    Teams,
    Referees,
    Rankings,
    MyPlayers,
    Search,
    Help,
}

impl MenuItem {
    pub fn title(&self) -> &'static str {
        match self {
            MenuItem::Tournaments => "Tournaments",
            MenuItem::Teams => "Teams",
            MenuItem::Referees => "Referees",
            MenuItem::Rankings => "Rankings",
            MenuItem::MyPlayers => "My Players",
            MenuItem::Search => "Search",
            MenuItem::Help => "Help",
        }
    }
}

/// Tabs offered to each role, in tab-bar order.
pub fn tabs_for(session: &Session) -> &'static [MenuItem] {
    match session {
        Session::Guest => &[MenuItem::Search, MenuItem::Rankings],
        Session::Team { .. } => &[MenuItem::Tournaments, MenuItem::MyPlayers, MenuItem::Rankings],
        Session::Referee { .. } => &[MenuItem::Tournaments],
        Session::Admin { .. } => &[
            MenuItem::Tournaments,
            MenuItem::Teams,
            MenuItem::Referees,
            MenuItem::Rankings,
        ],
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Alert {
    pub title: String,
    pub message: String,
    pub is_error: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Confirm {
    pub prompt: String,
    pub mutation: Mutation,
}

/// A team choosing which of its players to enter into a tournament.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegistrationPicker {
    pub tournament_id: TournamentId,
    pub tournament_name: String,
    pub min_level: u8,
    pub cursor: usize,
    pub selected: BTreeSet<PlayerId>,
}

impl RegistrationPicker {
    pub fn toggle(&mut self, player_id: PlayerId) {
        if !self.selected.remove(&player_id) {
            self.selected.insert(player_id);
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListCursor {
    pub index: usize,
}

impl ListCursor {
    pub fn down(&mut self, len: usize) {
        if self.index + 1 < len {
            self.index += 1;
        }
    }

    pub fn up(&mut self) {
        self.index = self.index.saturating_sub(1);
    }

    pub fn clamp(&mut self, len: usize) {
        self.index = self.index.min(len.saturating_sub(1));
    }
}

#[derive(Debug, Default)]
pub struct Cursors {
    pub tournaments: ListCursor,
    pub teams: ListCursor,
    pub referees: ListCursor,
    pub rankings: ListCursor,
    pub players: ListCursor,
    pub search: ListCursor,
}

#[derive(Debug, Default)]
pub struct SearchState {
    pub term: String,
    pub editing: bool,
    pub results: Remote<SearchOutcome>,
}

/// Everything loaded for one tournament's detail view.
#[derive(Debug, Default)]
pub struct TournamentDetail {
    pub roster: Remote<Roster>,
    pub phases: Remote<PhaseCatalog>,
    pub matches: Remote<TournamentMatches>,
    /// Last evaluated admission state, `None` until a roster has loaded.
    pub gate: Option<GateState>,
}

impl TournamentDetail {
    /// Match entry is open but no phase list has loaded and none is on its way.
    pub fn needs_phases(&self) -> bool {
        self.gate.is_some_and(|g| g.is_open())
            && self.phases.value().is_none()
            && !self.phases.is_loading()
    }
}

#[derive(Debug, Default)]
pub struct AppState {
    pub active_tab: MenuItem,
    pub previous_tab: MenuItem,
    pub show_logs: bool,
    pub session: Session,

    pub tournaments: Remote<Vec<Tournament>>,
    pub teams: Remote<Vec<Team>>,
    pub referees: Remote<Vec<Referee>>,
    pub rankings: Remote<Vec<Player>>,
    pub team_players: Remote<Vec<Player>>,
    pub details: HashMap<TournamentId, TournamentDetail>,
    pub search: SearchState,
    pub cursors: Cursors,

    pub form: Option<Form>,
    pub alert: Option<Alert>,
    pub confirm: Option<Confirm>,
    pub picker: Option<RegistrationPicker>,

    pub pending: HashSet<MutationKey>,
    pub sequencer: RequestSequencer,
}

impl AppState {
    pub fn new(session: Session) -> Self {
        let active_tab = tabs_for(&session)[0];
        Self {
            active_tab,
            previous_tab: active_tab,
            session,
            ..Self::default()
        }
    }

    pub fn tabs(&self) -> &'static [MenuItem] {
        tabs_for(&self.session)
    }

    /// Tournaments in display order. Teams see upcoming tournaments first,
    /// then the completed ones.
    pub fn visible_tournaments(&self) -> Vec<&Tournament> {
        let Some(all) = self.tournaments.value() else {
            return Vec::new();
        };
        match self.session {
            Session::Team { .. } => all
                .iter()
                .filter(|t| !t.is_completed())
                .chain(all.iter().filter(|t| t.is_completed()))
                .collect(),
            _ => all.iter().collect(),
        }
    }

    pub fn selected_tournament(&self) -> Option<&Tournament> {
        self.visible_tournaments()
            .get(self.cursors.tournaments.index)
            .copied()
    }

    pub fn tournament(&self, id: TournamentId) -> Option<&Tournament> {
        self.tournaments.value()?.iter().find(|t| t.id == id)
    }

    pub fn detail(&self, id: TournamentId) -> Option<&TournamentDetail> {
        self.details.get(&id)
    }

    pub fn detail_mut(&mut self, id: TournamentId) -> &mut TournamentDetail {
        self.details.entry(id).or_default()
    }

    pub fn own_team(&self) -> Option<&Team> {
        let team_id = self.session.team_id()?;
        self.teams.value()?.iter().find(|t| t.id == team_id)
    }

    pub fn team_is_blocked(&self) -> bool {
        self.own_team().is_some_and(|t| t.is_blocked)
    }

    pub fn selected_team(&self) -> Option<&Team> {
        self.teams.value()?.get(self.cursors.teams.index)
    }

    pub fn selected_referee(&self) -> Option<&Referee> {
        self.referees.value()?.get(self.cursors.referees.index)
    }

    /// Whether a ranking row belongs to the logged-in team.
    pub fn is_own_player(&self, player: &Player) -> bool {
        let Some(team_id) = self.session.team_id() else {
            return false;
        };
        player.team_id == Some(team_id)
            || self
                .team_players
                .value()
                .is_some_and(|mine| mine.iter().any(|p| p.id == player.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tennis_api::TournamentStatus;

    fn tournament(id: TournamentId, status: TournamentStatus) -> Tournament {
        Tournament { id, name: format!("T{id}"), status, ..Default::default() }
    }

    #[test]
    fn teams_see_upcoming_before_completed() {
        let mut state = AppState::new(Session::Team { email: "t@x.it".into(), team_id: 1 });
        state.tournaments.finish(vec![
            tournament(1, TournamentStatus::Completed),
            tournament(2, TournamentStatus::Upcoming),
            tournament(3, TournamentStatus::Active),
        ]);
        let ids: Vec<TournamentId> = state.visible_tournaments().iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![2, 3, 1]);
    }

    #[test]
    fn admins_see_server_order() {
        let mut state = AppState::new(Session::Admin { email: "a@x.it".into() });
        state.tournaments.finish(vec![
            tournament(1, TournamentStatus::Completed),
            tournament(2, TournamentStatus::Upcoming),
        ]);
        let ids: Vec<TournamentId> = state.visible_tournaments().iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn own_players_are_recognised_by_team() {
        let mut state = AppState::new(Session::Team { email: "t@x.it".into(), team_id: 5 });
        let mine = Player { id: 1, team_id: Some(5), ..Default::default() };
        let listed = Player { id: 2, ..Default::default() };
        let other = Player { id: 3, team_id: Some(6), ..Default::default() };
        state.team_players.finish(vec![listed.clone()]);
        assert!(state.is_own_player(&mine));
        assert!(state.is_own_player(&listed));
        assert!(!state.is_own_player(&other));
    }

    #[test]
    fn cursor_stays_in_bounds() {
        let mut cursor = ListCursor::default();
        cursor.up();
        assert_eq!(cursor.index, 0);
        cursor.down(2);
        cursor.down(2);
        assert_eq!(cursor.index, 1);
        cursor.clamp(0);
        assert_eq!(cursor.index, 0);
    }
}
