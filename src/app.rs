use crate::state::app_settings::AppSettings;
use crate::state::app_state::{Alert, AppState, Confirm, MenuItem, RegistrationPicker};
use crate::state::forms::{Form, FormKind};
use crate::state::messages::{FetchKey, Mutation, MutationOutcome, NetworkRequest, Payload};
use crate::state::remote::{Remote, RequestToken};
use crate::state::session::Session;
use chrono::Utc;
use log::{debug, error, info, warn};
use tennis_api::admission::{GateState, GateTransition};
use tennis_api::phases::PhaseCatalog;
use tennis_api::roster::Roster;
use tennis_api::{TeamRegistration, TournamentId, TournamentStatus};

pub struct App {
    pub settings: AppSettings,
    pub state: AppState,
    /// Bumped on every session switch; mutation responses from an older
    /// generation are dropped.
    generation: u64,
}

impl App {
    pub fn new(settings: AppSettings, session: Session) -> Self {
        Self {
            state: AppState::new(session),
            settings,
            generation: 0,
        }
    }

    /// Requests for everything the current role's dashboard shows.
    pub fn load_dashboard(&mut self) -> Vec<NetworkRequest> {
        let mut requests = match self.state.session.clone() {
            Session::Guest => {
                vec![self.fetch(FetchKey::Rankings), self.search_request()]
            }
            Session::Team { team_id, .. } => vec![
                self.fetch(FetchKey::Tournaments),
                self.fetch(FetchKey::Teams),
                self.fetch(FetchKey::TeamPlayers(team_id)),
                self.fetch(FetchKey::Rankings),
            ],
            Session::Referee { .. } => vec![self.fetch(FetchKey::Tournaments)],
            Session::Admin { .. } => vec![
                self.fetch(FetchKey::Tournaments),
                self.fetch(FetchKey::Teams),
                self.fetch(FetchKey::Referees),
                self.fetch(FetchKey::Rankings),
            ],
        };
        requests.extend(self.detail_requests());
        requests
    }

    // -----------------------------------------------------------------------
    // Request bookkeeping
    // -----------------------------------------------------------------------

    /// Issue a fetch for `key`, marking its slot as loading.
    pub fn fetch(&mut self, key: FetchKey) -> NetworkRequest {
        let token = self.state.sequencer.issue(key);
        let state = &mut self.state;
        match key {
            FetchKey::Tournaments => state.tournaments.start(),
            FetchKey::Teams => state.teams.start(),
            FetchKey::Referees => state.referees.start(),
            FetchKey::Rankings => state.rankings.start(),
            FetchKey::TeamPlayers(_) => state.team_players.start(),
            FetchKey::Roster(id) => state.detail_mut(id).roster.start(),
            FetchKey::Phases(id) => state.detail_mut(id).phases.start(),
            FetchKey::Matches(id) => state.detail_mut(id).matches.start(),
            FetchKey::Search => state.search.results.start(),
        }
        NetworkRequest::Fetch { key, token }
    }

    fn search_request(&mut self) -> NetworkRequest {
        let token = self.state.sequencer.issue(FetchKey::Search);
        self.state.search.results.start();
        NetworkRequest::Search {
            term: self.state.search.term.trim().to_string(),
            token,
        }
    }

    /// Queue a mutation unless an identical one is still in flight.
    pub fn mutate(&mut self, mutation: Mutation) -> Option<NetworkRequest> {
        if !self.state.pending.insert(mutation.key()) {
            debug!("{} already in flight, ignoring duplicate", mutation.describe());
            return None;
        }
        Some(NetworkRequest::Mutate {
            mutation,
            generation: self.generation,
        })
    }

    // -----------------------------------------------------------------------
    // Network response handlers: called from main_ui_loop
    // -----------------------------------------------------------------------

    pub fn on_fetched(
        &mut self,
        key: FetchKey,
        token: RequestToken,
        result: Result<Payload, String>,
    ) -> Vec<NetworkRequest> {
        if !self.state.sequencer.is_current(key, token) {
            debug!("discarding stale response for {key:?}");
            return Vec::new();
        }

        let payload = match result {
            Ok(payload) => payload,
            Err(message) => {
                error!("Failed to load {key:?}: {message}");
                self.fail_slot(key, message);
                return Vec::new();
            }
        };

        let state = &mut self.state;
        match (key, payload) {
            (FetchKey::Tournaments, Payload::Tournaments(tournaments)) => {
                state.tournaments.finish(tournaments);
                let visible = state.visible_tournaments().len();
                state.cursors.tournaments.clamp(visible);
                let ids: Vec<TournamentId> = state.details.keys().copied().collect();
                let mut requests: Vec<NetworkRequest> =
                    ids.into_iter().flat_map(|id| self.reevaluate_gate(id)).collect();
                requests.extend(self.detail_requests());
                return requests;
            }
            (FetchKey::Teams, Payload::Teams(teams)) => {
                state.cursors.teams.clamp(teams.len());
                state.teams.finish(teams);
            }
            (FetchKey::Referees, Payload::Referees(referees)) => {
                state.cursors.referees.clamp(referees.len());
                state.referees.finish(referees);
            }
            (FetchKey::Rankings, Payload::Players(players)) => {
                state.cursors.rankings.clamp(players.len());
                state.rankings.finish(players);
            }
            (FetchKey::TeamPlayers(_), Payload::Players(players)) => {
                state.cursors.players.clamp(players.len());
                state.team_players.finish(players);
            }
            (FetchKey::Search, Payload::Search(outcome)) => {
                if outcome.from_demo_data {
                    warn!("search served from demo data");
                }
                state.cursors.search.clamp(outcome.tournaments.len());
                state.search.results.finish(outcome);
            }
            (FetchKey::Roster(id), Payload::Roster(entries)) => {
                state.detail_mut(id).roster.finish(Roster::new(id, entries));
                return self.reevaluate_gate(id);
            }
            (FetchKey::Phases(id), Payload::Phases(phases)) => {
                let detail = state.detail_mut(id);
                let previous = detail.phases.value().and_then(PhaseCatalog::selected_id);
                let mut catalog = PhaseCatalog::from_server(phases);
                if let Some(phase_id) = previous {
                    catalog.select(phase_id);
                }
                detail.phases.finish(catalog);
            }
            (FetchKey::Matches(id), Payload::Matches(matches)) => {
                state.detail_mut(id).matches.finish(matches);
            }
            (key, payload) => {
                warn!("unexpected payload for {key:?}: {payload:?}");
            }
        }
        Vec::new()
    }

    pub fn on_mutated(
        &mut self,
        mutation: Mutation,
        generation: u64,
        result: Result<MutationOutcome, String>,
    ) -> Vec<NetworkRequest> {
        if generation != self.generation {
            debug!("dropping {} result from a previous session", mutation.describe());
            return Vec::new();
        }
        self.state.pending.remove(&mutation.key());

        let outcome = match result {
            Ok(outcome) => outcome,
            Err(message) => {
                error!("{} failed: {message}", mutation.describe());
                self.alert_error(mutation.describe(), message);
                return Vec::new();
            }
        };
        info!("{} succeeded", mutation.describe());

        match (mutation, outcome) {
            (Mutation::Login(_), MutationOutcome::LoggedIn(login)) => {
                match Session::from_login(login) {
                    Ok(session) => return self.switch_session(session),
                    Err(message) => self.alert_error("Login", message),
                }
            }
            (Mutation::RegisterTeam(_), _) => {
                self.close_form_of(|kind| kind == FormKind::TeamSignup);
                self.alert_info("Team registered", "You can now log in with the new account.");
            }
            (Mutation::RegisterReferee(_), _) => {
                self.close_form_of(|kind| kind == FormKind::RefereeSignup);
                self.alert_info("Referee registered", "You can now log in as a referee.");
            }
            (Mutation::CreateTournament(new), _) => {
                self.close_form_of(|kind| kind == FormKind::CreateTournament);
                self.alert_info("Tournament created", format!("{} has been created.", new.name));
                return vec![self.fetch(FetchKey::Tournaments)];
            }
            (Mutation::RemoveRosterEntry { tournament_id, .. }, _) => {
                return vec![self.fetch(FetchKey::Roster(tournament_id))];
            }
            (Mutation::CreateMatch { tournament_id, .. }, _) => {
                self.close_form_of(|kind| kind == FormKind::RecordMatch { tournament_id });
                return vec![
                    self.fetch(FetchKey::Matches(tournament_id)),
                    self.fetch(FetchKey::Roster(tournament_id)),
                ];
            }
            (Mutation::RegisterTeamPlayers { tournament_id, registration }, _) => {
                if self
                    .state
                    .picker
                    .as_ref()
                    .is_some_and(|p| p.tournament_id == tournament_id)
                {
                    self.state.picker = None;
                }
                self.alert_info(
                    "Players registered",
                    format!("{} player(s) entered.", registration.player_ids.len()),
                );
                let mut requests = vec![self.fetch(FetchKey::Tournaments)];
                if self.state.detail(tournament_id).is_some() {
                    requests.push(self.fetch(FetchKey::Roster(tournament_id)));
                }
                return requests;
            }
            (Mutation::AddPlayer(player), _) => {
                self.close_form_of(|kind| matches!(kind, FormKind::AddPlayer { .. }));
                return vec![
                    self.fetch(FetchKey::TeamPlayers(player.team_id)),
                    self.fetch(FetchKey::Rankings),
                ];
            }
            (Mutation::BlockTeam(_) | Mutation::UnblockTeam(_), _) => {
                return vec![self.fetch(FetchKey::Teams)];
            }
            (Mutation::SetRefereeScore { referee_id, .. }, _) => {
                self.close_form_of(|kind| kind == FormKind::RefereeScore { referee_id });
                return vec![self.fetch(FetchKey::Referees)];
            }
            (Mutation::DeleteReferee(_), _) => {
                return vec![self.fetch(FetchKey::Referees)];
            }
            (mutation, outcome) => {
                warn!("unexpected outcome for {}: {outcome:?}", mutation.describe());
            }
        }
        Vec::new()
    }

    fn fail_slot(&mut self, key: FetchKey, message: String) {
        let state = &mut self.state;
        match key {
            FetchKey::Tournaments => state.tournaments.fail(message),
            FetchKey::Teams => state.teams.fail(message),
            FetchKey::Referees => state.referees.fail(message),
            FetchKey::Rankings => state.rankings.fail(message),
            FetchKey::TeamPlayers(_) => state.team_players.fail(message),
            FetchKey::Roster(id) => state.detail_mut(id).roster.fail(message),
            FetchKey::Phases(id) => state.detail_mut(id).phases.fail(message),
            FetchKey::Matches(id) => state.detail_mut(id).matches.fail(message),
            FetchKey::Search => state.search.results.fail(message),
        }
    }

    /// Re-classify a tournament's roster and act on gate transitions. While
    /// match entry is open and no phase list is loaded, phases are requested;
    /// an open match form is dropped when entry closes.
    fn reevaluate_gate(&mut self, id: TournamentId) -> Vec<NetworkRequest> {
        let status = self
            .state
            .tournament(id)
            .map(|t| t.status)
            .unwrap_or(TournamentStatus::Upcoming);
        let detail = self.state.detail_mut(id);
        let Some(roster) = detail.roster.value() else {
            return Vec::new();
        };
        let next = GateState::evaluate(roster.status(), status);
        let previous = detail.gate.replace(next);
        let needs_phases = detail.needs_phases();

        match next.transition_from(previous.as_ref()) {
            GateTransition::Opened => info!("match entry opened for tournament {id}"),
            GateTransition::Closed(reason) => {
                info!("match entry closed for tournament {id}: {}", reason.describe());
                self.close_form_of(|kind| kind == FormKind::RecordMatch { tournament_id: id });
            }
            GateTransition::Unchanged => {}
        }
        if needs_phases {
            return vec![self.fetch(FetchKey::Phases(id))];
        }
        Vec::new()
    }

    /// Loads the selected tournament's detail when it has never been fetched.
    fn detail_requests(&mut self) -> Vec<NetworkRequest> {
        if self.state.active_tab != MenuItem::Tournaments {
            return Vec::new();
        }
        let Some(tournament) = self.state.selected_tournament() else {
            return Vec::new();
        };
        let (id, completed) = (tournament.id, tournament.is_completed());
        let loaded = self.state.detail(id);
        let roster_idle = loaded.is_none_or(|d| matches!(d.roster, Remote::Idle));
        let matches_idle =
            loaded.is_none_or(|d| matches!(d.matches, Remote::Idle));

        let mut requests = Vec::new();
        match self.state.session {
            Session::Admin { .. } => {
                if roster_idle {
                    requests.push(self.fetch(FetchKey::Roster(id)));
                }
                if matches_idle {
                    requests.push(self.fetch(FetchKey::Matches(id)));
                }
            }
            Session::Team { .. } if completed && matches_idle => {
                requests.push(self.fetch(FetchKey::Matches(id)));
            }
            _ => {}
        }
        requests
    }

    fn switch_session(&mut self, session: Session) -> Vec<NetworkRequest> {
        let persisted = if session.is_guest() {
            Session::clear(&self.settings.session_file)
        } else {
            session.save(&self.settings.session_file)
        };
        if let Err(e) = persisted {
            warn!("session not persisted: {e}");
        }
        info!("session is now {}", session.label());

        let mut sequencer = std::mem::take(&mut self.state.sequencer);
        sequencer.invalidate_all();
        self.generation += 1;
        let show_logs = self.state.show_logs;
        self.state = AppState::new(session);
        self.state.sequencer = sequencer;
        self.state.show_logs = show_logs;
        self.load_dashboard()
    }

    // -----------------------------------------------------------------------
    // Tab management
    // -----------------------------------------------------------------------

    pub fn update_tab(&mut self, next: MenuItem) -> Vec<NetworkRequest> {
        if self.state.active_tab == next {
            return Vec::new();
        }
        if next != MenuItem::Help && !self.state.tabs().contains(&next) {
            return Vec::new();
        }
        self.state.previous_tab = self.state.active_tab;
        self.state.active_tab = next;
        self.detail_requests()
    }

    /// Switch to the role's n-th tab (0-based).
    pub fn select_tab(&mut self, index: usize) -> Vec<NetworkRequest> {
        match self.state.tabs().get(index) {
            Some(tab) => self.update_tab(*tab),
            None => Vec::new(),
        }
    }

    pub fn exit_help(&mut self) {
        if self.state.active_tab == MenuItem::Help {
            self.state.active_tab = self.state.previous_tab;
        }
    }

    pub fn toggle_show_logs(&mut self) {
        self.state.show_logs = !self.state.show_logs;
    }

    pub fn toggle_full_screen(&mut self) {
        self.settings.full_screen = !self.settings.full_screen;
    }

    pub fn move_selection(&mut self, down: bool) -> Vec<NetworkRequest> {
        let state = &mut self.state;
        let (cursor, len) = match state.active_tab {
            MenuItem::Tournaments => {
                let len = state.visible_tournaments().len();
                (&mut state.cursors.tournaments, len)
            }
            MenuItem::Teams => (
                &mut state.cursors.teams,
                state.teams.value().map_or(0, Vec::len),
            ),
            MenuItem::Referees => (
                &mut state.cursors.referees,
                state.referees.value().map_or(0, Vec::len),
            ),
            MenuItem::Rankings => (
                &mut state.cursors.rankings,
                state.rankings.value().map_or(0, Vec::len),
            ),
            MenuItem::MyPlayers => (
                &mut state.cursors.players,
                state.team_players.value().map_or(0, Vec::len),
            ),
            MenuItem::Search => (
                &mut state.cursors.search,
                state.search.results.value().map_or(0, |o| o.tournaments.len()),
            ),
            MenuItem::Help => return Vec::new(),
        };
        if down {
            cursor.down(len);
        } else {
            cursor.up();
        }
        self.detail_requests()
    }

    /// Re-fetch what the active tab shows.
    pub fn refresh(&mut self) -> Vec<NetworkRequest> {
        match self.state.active_tab {
            MenuItem::Tournaments => {
                let mut requests = vec![self.fetch(FetchKey::Tournaments)];
                if let Some(id) = self.state.selected_tournament().map(|t| t.id) {
                    if self.state.session.is_admin() {
                        requests.push(self.fetch(FetchKey::Roster(id)));
                        requests.push(self.fetch(FetchKey::Matches(id)));
                        if self.state.detail(id).is_some_and(|d| d.needs_phases()) {
                            requests.push(self.fetch(FetchKey::Phases(id)));
                        }
                    } else if self.state.detail(id).is_some() {
                        requests.push(self.fetch(FetchKey::Matches(id)));
                    }
                }
                requests
            }
            MenuItem::Teams => vec![self.fetch(FetchKey::Teams)],
            MenuItem::Referees => vec![self.fetch(FetchKey::Referees)],
            MenuItem::Rankings => vec![self.fetch(FetchKey::Rankings)],
            MenuItem::MyPlayers => match self.state.session.team_id() {
                Some(team_id) => vec![
                    self.fetch(FetchKey::TeamPlayers(team_id)),
                    self.fetch(FetchKey::Teams),
                ],
                None => Vec::new(),
            },
            MenuItem::Search => vec![self.search_request()],
            MenuItem::Help => Vec::new(),
        }
    }

    // -----------------------------------------------------------------------
    // Alerts & confirmation
    // -----------------------------------------------------------------------

    pub fn alert_error(&mut self, title: impl Into<String>, message: impl Into<String>) {
        self.state.alert = Some(Alert {
            title: title.into(),
            message: message.into(),
            is_error: true,
        });
    }

    pub fn alert_info(&mut self, title: impl Into<String>, message: impl Into<String>) {
        self.state.alert = Some(Alert {
            title: title.into(),
            message: message.into(),
            is_error: false,
        });
    }

    pub fn dismiss_alert(&mut self) {
        self.state.alert = None;
    }

    pub fn confirm(&mut self) -> Option<NetworkRequest> {
        let confirm = self.state.confirm.take()?;
        self.mutate(confirm.mutation)
    }

    pub fn cancel_confirm(&mut self) {
        self.state.confirm = None;
    }

    // -----------------------------------------------------------------------
    // Session actions
    // -----------------------------------------------------------------------

    pub fn open_login(&mut self) {
        if self.state.session.is_guest() {
            self.state.form = Some(Form::login());
        }
    }

    pub fn open_team_signup(&mut self) {
        if self.state.session.is_guest() {
            self.state.form = Some(Form::team_signup());
        }
    }

    pub fn open_referee_signup(&mut self) {
        if self.state.session.is_guest() {
            self.state.form = Some(Form::referee_signup());
        }
    }

    pub fn logout(&mut self) -> Vec<NetworkRequest> {
        if self.state.session.is_guest() {
            return Vec::new();
        }
        self.switch_session(Session::Guest)
    }

    // -----------------------------------------------------------------------
    // Forms
    // -----------------------------------------------------------------------

    pub fn close_form(&mut self) {
        self.state.form = None;
    }

    fn close_form_of(&mut self, is_kind: impl Fn(FormKind) -> bool) {
        if self.state.form.as_ref().is_some_and(|f| is_kind(f.kind)) {
            self.state.form = None;
        }
    }

    /// Validate the open form and turn it into a mutation. Validation errors
    /// stay on the form and nothing is sent.
    pub fn submit_form(&mut self) -> Option<NetworkRequest> {
        let form = self.state.form.as_ref()?;
        let kind = form.kind;
        if let FormKind::RecordMatch { tournament_id } = kind {
            return self.submit_match(tournament_id);
        }

        let mutation = match kind {
            FormKind::Login => form.credentials().map(Mutation::Login),
            FormKind::TeamSignup => form.team_signup_payload().map(Mutation::RegisterTeam),
            FormKind::RefereeSignup => form.new_referee().map(Mutation::RegisterReferee),
            FormKind::CreateTournament => form.new_tournament().map(Mutation::CreateTournament),
            FormKind::AddPlayer { team_id } => form.new_player(team_id).map(Mutation::AddPlayer),
            FormKind::RefereeScore { referee_id } => form
                .score()
                .map(|score| Mutation::SetRefereeScore { referee_id, score }),
            FormKind::RecordMatch { .. } => return None,
        };

        match mutation {
            Ok(mutation) => self.mutate(mutation),
            Err(e) => {
                debug!("form rejected: {e}");
                if let Some(form) = self.state.form.as_mut() {
                    form.error = Some(e.to_string());
                }
                None
            }
        }
    }

    fn submit_match(&mut self, tournament_id: TournamentId) -> Option<NetworkRequest> {
        let gate = self.state.detail(tournament_id).and_then(|d| d.gate);
        let draft = self.state.form.as_ref()?.match_draft();
        let result = match gate {
            Some(GateState::Open) => draft
                .validate(Utc::now(), self.settings.match_status)
                .map_err(|e| e.to_string()),
            Some(GateState::Locked(reason)) => Err(format!("Match entry is closed: {}", reason.describe())),
            None => Err("The roster has not been loaded yet".to_string()),
        };

        match result {
            Ok(new_match) => {
                if let Some(catalog) = self.state.detail_mut(tournament_id).phases.value_mut() {
                    catalog.select(new_match.phase_id);
                }
                self.mutate(Mutation::CreateMatch { tournament_id, new_match })
            }
            Err(message) => {
                warn!("match rejected: {message}");
                if let Some(form) = self.state.form.as_mut() {
                    form.error = Some(message);
                }
                None
            }
        }
    }

    // -----------------------------------------------------------------------
    // Admin actions
    // -----------------------------------------------------------------------

    pub fn open_create_tournament(&mut self) {
        if self.state.session.is_admin() {
            self.state.form = Some(Form::create_tournament());
        }
    }

    /// Only offered while the selected tournament's gate is open.
    pub fn open_record_match(&mut self) -> bool {
        if !self.state.session.is_admin() {
            return false;
        }
        let Some(id) = self.state.selected_tournament().map(|t| t.id) else {
            return false;
        };
        let Some(detail) = self.state.detail(id) else {
            return false;
        };
        if !detail.gate.is_some_and(|g| g.is_open()) {
            return false;
        }
        let (Some(catalog), Some(roster)) = (detail.phases.value(), detail.roster.value()) else {
            return false;
        };
        let referees = self.state.referees.value().map(Vec::as_slice).unwrap_or_default();
        self.state.form = Some(Form::record_match(id, catalog, roster, referees));
        true
    }

    /// Remove the newest entrant of an over-capacity roster: one player per action.
    pub fn remove_newest_entrant(&mut self) -> Option<NetworkRequest> {
        if !self.state.session.is_admin() {
            return None;
        }
        let id = self.state.selected_tournament()?.id;
        let candidate = self.state.detail(id)?.roster.value()?.removal_candidate()?;
        let player_id = candidate.player.id;
        info!("removing {} from tournament {id}", candidate.player.name);
        self.mutate(Mutation::RemoveRosterEntry { tournament_id: id, player_id })
    }

    pub fn toggle_team_block(&mut self) -> Option<NetworkRequest> {
        if !self.state.session.is_admin() {
            return None;
        }
        let team = self.state.selected_team()?;
        let mutation = if team.is_blocked {
            Mutation::UnblockTeam(team.id)
        } else {
            Mutation::BlockTeam(team.id)
        };
        self.mutate(mutation)
    }

    pub fn open_referee_score(&mut self) {
        if !self.state.session.is_admin() {
            return;
        }
        if let Some(referee) = self.state.selected_referee() {
            self.state.form = Some(Form::referee_score(referee));
        }
    }

    pub fn ask_delete_referee(&mut self) {
        if !self.state.session.is_admin() {
            return;
        }
        if let Some(referee) = self.state.selected_referee() {
            self.state.confirm = Some(Confirm {
                prompt: format!("Delete referee {}?", referee.full_name()),
                mutation: Mutation::DeleteReferee(referee.id),
            });
        }
    }

    // -----------------------------------------------------------------------
    // Team actions
    // -----------------------------------------------------------------------

    pub fn open_add_player(&mut self) {
        if let Some(team_id) = self.state.session.team_id() {
            self.state.form = Some(Form::add_player(team_id));
        }
    }

    /// Enter on a tournament. Teams open the registration picker for upcoming
    /// tournaments and load the results of completed ones.
    pub fn activate_tournament(&mut self) -> Vec<NetworkRequest> {
        let Some(tournament) = self.state.selected_tournament().cloned() else {
            return Vec::new();
        };
        match self.state.session {
            Session::Team { .. } if tournament.is_completed() => {
                vec![self.fetch(FetchKey::Matches(tournament.id))]
            }
            Session::Team { .. } => {
                if self.state.team_is_blocked() {
                    self.alert_error(
                        "Team blocked",
                        "Your team is blocked and cannot register players.",
                    );
                } else {
                    self.state.picker = Some(RegistrationPicker {
                        tournament_id: tournament.id,
                        tournament_name: tournament.name,
                        min_level: tournament.min_level,
                        ..Default::default()
                    });
                }
                Vec::new()
            }
            Session::Admin { .. } => vec![
                self.fetch(FetchKey::Roster(tournament.id)),
                self.fetch(FetchKey::Matches(tournament.id)),
            ],
            _ => Vec::new(),
        }
    }

    pub fn picker_move(&mut self, down: bool) {
        let len = self.state.team_players.value().map_or(0, Vec::len);
        if let Some(picker) = self.state.picker.as_mut() {
            if down {
                if picker.cursor + 1 < len {
                    picker.cursor += 1;
                }
            } else {
                picker.cursor = picker.cursor.saturating_sub(1);
            }
        }
    }

    pub fn picker_toggle(&mut self) {
        let Some(player_id) = self.state.picker.as_ref().and_then(|picker| {
            self.state
                .team_players
                .value()
                .and_then(|players| players.get(picker.cursor))
                .map(|p| p.id)
        }) else {
            return;
        };
        if let Some(picker) = self.state.picker.as_mut() {
            picker.toggle(player_id);
        }
    }

    pub fn close_picker(&mut self) {
        self.state.picker = None;
    }

    pub fn submit_picker(&mut self) -> Option<NetworkRequest> {
        let picker = self.state.picker.as_ref()?;
        let team_id = self.state.session.team_id()?;
        if picker.selected.is_empty() {
            self.alert_error("Register players", "Select at least one player.");
            return None;
        }
        let mutation = Mutation::RegisterTeamPlayers {
            tournament_id: picker.tournament_id,
            registration: TeamRegistration {
                team_id,
                player_ids: picker.selected.iter().copied().collect(),
            },
        };
        self.mutate(mutation)
    }

    // -----------------------------------------------------------------------
    // Guest search
    // -----------------------------------------------------------------------

    pub fn start_search_edit(&mut self) {
        if self.state.active_tab == MenuItem::Search {
            self.state.search.editing = true;
        }
    }

    pub fn stop_search_edit(&mut self) {
        self.state.search.editing = false;
    }

    /// The search runs on every keystroke; older answers are discarded.
    pub fn search_push(&mut self, c: char) -> NetworkRequest {
        self.state.search.term.push(c);
        self.search_request()
    }

    pub fn search_backspace(&mut self) -> NetworkRequest {
        self.state.search.term.pop();
        self.search_request()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::messages::MutationKey;
    use tennis_api::admission::LockReason;
    use tennis_api::recorder::DraftError;
    use tennis_api::roster::RosterStatus;
    use tennis_api::{Phase, Player, Referee, RosterEntry, Team, Tournament};

    const TID: TournamentId = 3;

    fn admin_app() -> App {
        let settings = AppSettings {
            session_file: std::env::temp_dir().join("tennis-hub-test-unused.json"),
            ..AppSettings::default()
        };
        App::new(settings, Session::Admin { email: "admin@hub.it".into() })
    }

    fn entries(n: u32) -> Vec<RosterEntry> {
        (1..=n)
            .map(|id| RosterEntry {
                player: Player { id, name: format!("Player {id}"), ..Default::default() },
                registered_at: None,
            })
            .collect()
    }

    fn tournament(status: TournamentStatus) -> Tournament {
        Tournament { id: TID, name: "Open".into(), status, ..Default::default() }
    }

    /// Deliver a response for `key` as the worker would, using a fresh token.
    fn deliver(app: &mut App, key: FetchKey, payload: Payload) -> Vec<NetworkRequest> {
        let token = app.state.sequencer.issue(key);
        app.on_fetched(key, token, Ok(payload))
    }

    fn load_tournament(app: &mut App, status: TournamentStatus) {
        deliver(app, FetchKey::Tournaments, Payload::Tournaments(vec![tournament(status)]));
    }

    fn requested_keys(requests: &[NetworkRequest]) -> Vec<FetchKey> {
        requests
            .iter()
            .filter_map(|r| match r {
                NetworkRequest::Fetch { key, .. } => Some(*key),
                _ => None,
            })
            .collect()
    }

    fn open_gate_with_phases(app: &mut App) {
        load_tournament(app, TournamentStatus::Upcoming);
        deliver(app, FetchKey::Roster(TID), Payload::Roster(entries(16)));
        deliver(
            app,
            FetchKey::Phases(TID),
            Payload::Phases(vec![Phase { id: 21, tournament_id: TID, name: "Round of 16".into(), ..Default::default() }]),
        );
        deliver(
            app,
            FetchKey::Referees,
            Payload::Referees(vec![Referee { id: 8, name: "Ada".into(), ..Default::default() }]),
        );
    }

    #[test]
    fn match_entry_absent_at_fifteen_and_offered_at_sixteen() {
        let mut app = admin_app();
        load_tournament(&mut app, TournamentStatus::Upcoming);

        deliver(&mut app, FetchKey::Roster(TID), Payload::Roster(entries(15)));
        let detail = app.state.detail(TID).unwrap();
        assert_eq!(
            detail.gate,
            Some(GateState::Locked(LockReason::RosterIncomplete { missing: 1 }))
        );
        assert!(!app.open_record_match());
        assert!(app.state.form.is_none());

        let follow_up = deliver(&mut app, FetchKey::Roster(TID), Payload::Roster(entries(16)));
        assert_eq!(app.state.detail(TID).unwrap().gate, Some(GateState::Open));
        assert_eq!(requested_keys(&follow_up), vec![FetchKey::Phases(TID)]);

        deliver(
            &mut app,
            FetchKey::Phases(TID),
            Payload::Phases(vec![Phase { id: 21, name: "Round of 16".into(), ..Default::default() }]),
        );
        assert!(app.open_record_match());
        assert!(matches!(
            app.state.form.as_ref().map(|f| f.kind),
            Some(FormKind::RecordMatch { tournament_id: TID })
        ));
    }

    #[test]
    fn over_capacity_offers_removal_of_newest_player_only() {
        let mut app = admin_app();
        load_tournament(&mut app, TournamentStatus::Upcoming);
        deliver(&mut app, FetchKey::Roster(TID), Payload::Roster(entries(17)));

        let roster = app.state.detail(TID).unwrap().roster.value().unwrap();
        assert_eq!(roster.status(), RosterStatus::Over { excess: 1 });
        assert_eq!(roster.removal_candidate().unwrap().player.name, "Player 17");

        let request = app.remove_newest_entrant().expect("removal request");
        match &request {
            NetworkRequest::Mutate {
                mutation: Mutation::RemoveRosterEntry { tournament_id, player_id },
                ..
            } => assert_eq!((*tournament_id, *player_id), (TID, 17)),
            other => panic!("unexpected request {other:?}"),
        }
        // A second press while the first is in flight sends nothing.
        assert!(app.remove_newest_entrant().is_none());

        let NetworkRequest::Mutate { mutation, generation } = request else {
            unreachable!()
        };
        let follow_up = app.on_mutated(mutation, generation, Ok(MutationOutcome::Done));
        assert_eq!(requested_keys(&follow_up), vec![FetchKey::Roster(TID)]);
        assert!(!app.state.pending.contains(&MutationKey::RemoveRosterEntry(TID)));
    }

    #[test]
    fn same_player_twice_is_rejected_before_any_request() {
        let mut app = admin_app();
        open_gate_with_phases(&mut app);
        assert!(app.open_record_match());

        let form = app.state.form.as_mut().unwrap();
        assert!(form.choose(crate::state::forms::PHASE, "21"));
        assert!(form.choose(crate::state::forms::PLAYER_1, "5"));
        assert!(form.choose(crate::state::forms::PLAYER_2, "5"));
        assert!(form.choose(crate::state::forms::REFEREE, "8"));
        form.set_text(crate::state::forms::COURT_NUMBER, "1");

        assert!(app.submit_form().is_none());
        assert!(app.state.pending.is_empty());
        let error = app.state.form.as_ref().and_then(|f| f.error.clone());
        assert_eq!(error, Some(DraftError::SamePlayer.to_string()));
    }

    #[test]
    fn valid_match_is_sent_with_configured_status() {
        let mut app = admin_app();
        app.settings.match_status = tennis_api::MatchStatus::Scheduled;
        open_gate_with_phases(&mut app);
        assert!(app.open_record_match());

        let form = app.state.form.as_mut().unwrap();
        form.choose(crate::state::forms::PHASE, "21");
        form.choose(crate::state::forms::PLAYER_1, "1");
        form.choose(crate::state::forms::PLAYER_2, "2");
        form.choose(crate::state::forms::REFEREE, "8");
        form.set_text(crate::state::forms::COURT_NUMBER, "4");

        let request = app.submit_form().expect("match request");
        let NetworkRequest::Mutate { mutation: Mutation::CreateMatch { tournament_id, new_match }, .. } = request else {
            panic!("expected a create-match request");
        };
        assert_eq!(tournament_id, TID);
        assert_eq!(new_match.status, tennis_api::MatchStatus::Scheduled);
        assert_eq!(new_match.winner_id, None);
        assert_eq!(
            app.state.detail(TID).unwrap().phases.value().unwrap().selected_id(),
            Some(21)
        );
    }

    #[test]
    fn completed_tournament_with_full_roster_stays_locked() {
        let mut app = admin_app();
        load_tournament(&mut app, TournamentStatus::Completed);
        let follow_up = deliver(&mut app, FetchKey::Roster(TID), Payload::Roster(entries(16)));
        assert!(follow_up.is_empty());
        assert_eq!(
            app.state.detail(TID).unwrap().gate,
            Some(GateState::Locked(LockReason::TournamentCompleted))
        );
        assert!(!app.open_record_match());
    }

    #[test]
    fn stale_roster_response_is_discarded() {
        let mut app = admin_app();
        load_tournament(&mut app, TournamentStatus::Upcoming);

        let NetworkRequest::Fetch { token: old, .. } = app.fetch(FetchKey::Roster(TID)) else {
            unreachable!()
        };
        let NetworkRequest::Fetch { token: new, .. } = app.fetch(FetchKey::Roster(TID)) else {
            unreachable!()
        };
        app.on_fetched(FetchKey::Roster(TID), new, Ok(Payload::Roster(entries(16))));
        app.on_fetched(FetchKey::Roster(TID), old, Ok(Payload::Roster(entries(15))));

        let roster = app.state.detail(TID).unwrap().roster.value().unwrap();
        assert_eq!(roster.len(), 16);
    }

    #[test]
    fn failed_reload_keeps_previous_list_and_does_not_alert() {
        let mut app = admin_app();
        deliver(
            &mut app,
            FetchKey::Teams,
            Payload::Teams(vec![Team { id: 1, name: "Circolo".into(), ..Default::default() }]),
        );
        let NetworkRequest::Fetch { token, .. } = app.fetch(FetchKey::Teams) else {
            unreachable!()
        };
        app.on_fetched(FetchKey::Teams, token, Err("timed out".into()));

        assert_eq!(app.state.teams.value().map(Vec::len), Some(1));
        assert_eq!(app.state.teams.error(), Some("timed out"));
        assert!(app.state.alert.is_none());
    }

    #[test]
    fn failed_mutation_alerts_and_keeps_the_form() {
        let mut app = admin_app();
        app.open_create_tournament();
        let mutation = Mutation::CreateTournament(Default::default());
        app.state.pending.insert(mutation.key());

        app.on_mutated(mutation, 0, Err("Tournament name already used".into()));
        let alert = app.state.alert.clone().expect("alert shown");
        assert!(alert.is_error);
        assert_eq!(alert.message, "Tournament name already used");
        assert!(app.state.form.is_some());
        assert!(app.state.pending.is_empty());
    }

    #[test]
    fn leaving_capacity_closes_an_open_match_form() {
        let mut app = admin_app();
        open_gate_with_phases(&mut app);
        assert!(app.open_record_match());

        deliver(&mut app, FetchKey::Roster(TID), Payload::Roster(entries(17)));
        assert!(app.state.form.is_none());
    }

    #[test]
    fn blocked_team_cannot_open_registration() {
        let mut app = team_app();
        load_tournament(&mut app, TournamentStatus::Upcoming);
        deliver(
            &mut app,
            FetchKey::Teams,
            Payload::Teams(vec![Team { id: 2, is_blocked: true, ..Default::default() }]),
        );

        assert!(app.activate_tournament().is_empty());
        assert!(app.state.picker.is_none());
        assert!(app.state.alert.as_ref().is_some_and(|a| a.is_error));
    }

    #[test]
    fn team_registration_requires_a_selection() {
        let mut app = team_app();
        load_tournament(&mut app, TournamentStatus::Upcoming);
        deliver(
            &mut app,
            FetchKey::TeamPlayers(2),
            Payload::Players(vec![Player { id: 40, team_id: Some(2), ..Default::default() }]),
        );
        app.activate_tournament();
        assert!(app.state.picker.is_some());

        assert!(app.submit_picker().is_none());
        app.dismiss_alert();

        app.picker_toggle();
        let request = app.submit_picker().expect("registration request");
        let NetworkRequest::Mutate { mutation: Mutation::RegisterTeamPlayers { registration, .. }, .. } = request else {
            panic!("expected a registration request");
        };
        assert_eq!(registration.team_id, 2);
        assert_eq!(registration.player_ids, vec![40]);
    }

    #[test]
    fn guests_only_get_guest_tabs() {
        let mut app = App::new(AppSettings::default(), Session::Guest);
        assert_eq!(app.state.active_tab, MenuItem::Search);
        assert!(app.update_tab(MenuItem::Teams).is_empty());
        assert_eq!(app.state.active_tab, MenuItem::Search);
        app.select_tab(1);
        assert_eq!(app.state.active_tab, MenuItem::Rankings);
    }

    fn team_app() -> App {
        let settings = AppSettings {
            session_file: std::env::temp_dir().join("tennis-hub-test-unused.json"),
            ..AppSettings::default()
        };
        App::new(settings, Session::Team { email: "t@x.it".into(), team_id: 2 })
    }

    #[test]
    fn registering_players_reloads_tournaments_and_known_roster() {
        let mut app = team_app();
        load_tournament(&mut app, TournamentStatus::Upcoming);
        let registration = || Mutation::RegisterTeamPlayers {
            tournament_id: TID,
            registration: TeamRegistration { team_id: 2, player_ids: vec![40, 41] },
        };

        let follow_up = app.on_mutated(registration(), 0, Ok(MutationOutcome::Done));
        assert_eq!(requested_keys(&follow_up), vec![FetchKey::Tournaments]);
        assert!(app.state.alert.as_ref().is_some_and(|a| !a.is_error));

        app.dismiss_alert();
        app.state.detail_mut(TID);
        let follow_up = app.on_mutated(registration(), 0, Ok(MutationOutcome::Done));
        assert_eq!(
            requested_keys(&follow_up),
            vec![FetchKey::Tournaments, FetchKey::Roster(TID)]
        );
    }

    #[test]
    fn failed_phase_load_is_retried_while_entry_is_open() {
        let mut app = admin_app();
        load_tournament(&mut app, TournamentStatus::Upcoming);
        let follow_up = deliver(&mut app, FetchKey::Roster(TID), Payload::Roster(entries(16)));
        let [NetworkRequest::Fetch { key: FetchKey::Phases(_), token }] = follow_up.as_slice() else {
            panic!("expected a phases request, got {follow_up:?}");
        };
        app.on_fetched(FetchKey::Phases(TID), *token, Err("timed out".into()));
        assert_eq!(app.state.detail(TID).unwrap().gate, Some(GateState::Open));
        assert!(!app.open_record_match());

        // A roster reload that leaves the gate open asks for phases again.
        let follow_up = deliver(&mut app, FetchKey::Roster(TID), Payload::Roster(entries(16)));
        assert_eq!(requested_keys(&follow_up), vec![FetchKey::Phases(TID)]);

        // So does an explicit refresh once that attempt fails too.
        let [NetworkRequest::Fetch { token, .. }] = follow_up.as_slice() else {
            unreachable!()
        };
        app.on_fetched(FetchKey::Phases(TID), *token, Err("timed out".into()));
        let refreshed = app.refresh();
        assert!(requested_keys(&refreshed).contains(&FetchKey::Phases(TID)));

        deliver(
            &mut app,
            FetchKey::Phases(TID),
            Payload::Phases(vec![Phase { id: 21, name: "Round of 16".into(), ..Default::default() }]),
        );
        assert!(app.open_record_match());
    }

    #[test]
    fn phases_are_not_requested_twice_while_loading() {
        let mut app = admin_app();
        load_tournament(&mut app, TournamentStatus::Upcoming);
        let first = deliver(&mut app, FetchKey::Roster(TID), Payload::Roster(entries(16)));
        assert_eq!(requested_keys(&first), vec![FetchKey::Phases(TID)]);

        let second = deliver(&mut app, FetchKey::Roster(TID), Payload::Roster(entries(16)));
        assert!(second.is_empty());
    }

    #[test]
    fn mutation_results_from_a_previous_session_are_dropped() {
        let mut app = admin_app();
        load_tournament(&mut app, TournamentStatus::Upcoming);
        deliver(&mut app, FetchKey::Roster(TID), Payload::Roster(entries(17)));
        let Some(NetworkRequest::Mutate { mutation, generation }) = app.remove_newest_entrant() else {
            panic!("expected a removal request");
        };

        app.logout();
        assert!(app.state.session.is_guest());
        assert!(app.state.pending.is_empty());

        let follow_up = app.on_mutated(mutation.clone(), generation, Ok(MutationOutcome::Done));
        assert!(follow_up.is_empty());
        assert!(app.state.detail(TID).is_none());

        let follow_up = app.on_mutated(mutation, generation, Err("gone".into()));
        assert!(follow_up.is_empty());
        assert!(app.state.alert.is_none());
    }
}
