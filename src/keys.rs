use crate::app::App;
use crate::state::app_state::MenuItem;
use crate::state::messages::NetworkRequest;
use crate::state::session::Session;
use crossterm::event::KeyCode::Char;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};

/// What a key press asks of the UI loop.
#[derive(Debug)]
pub enum KeyAction {
    Quit,
    Send(Vec<NetworkRequest>),
}

impl From<Vec<NetworkRequest>> for KeyAction {
    fn from(requests: Vec<NetworkRequest>) -> Self {
        KeyAction::Send(requests)
    }
}

impl From<Option<NetworkRequest>> for KeyAction {
    fn from(request: Option<NetworkRequest>) -> Self {
        KeyAction::Send(request.into_iter().collect())
    }
}

impl From<()> for KeyAction {
    fn from(_: ()) -> Self {
        KeyAction::Send(Vec::new())
    }
}

pub async fn handle_key_bindings(
    key_event: KeyEvent,
    app: &Arc<Mutex<App>>,
    network_requests: &mpsc::Sender<NetworkRequest>,
) {
    let mut guard = app.lock().await;
    let action = route_key(&mut guard, key_event);
    drop(guard);

    match action {
        KeyAction::Quit => {
            crate::cleanup_terminal();
            std::process::exit(0);
        }
        KeyAction::Send(requests) => {
            for request in requests {
                let _ = network_requests.send(request).await;
            }
        }
    }
}

/// Dispatch a key to whichever layer has focus: alert, confirmation, form,
/// registration picker, search box, then the active tab.
pub fn route_key(app: &mut App, key: KeyEvent) -> KeyAction {
    if let (Char('c'), KeyModifiers::CONTROL) = (key.code, key.modifiers) {
        return KeyAction::Quit;
    }

    if app.state.alert.is_some() {
        return match key.code {
            KeyCode::Enter | KeyCode::Esc | Char(' ') => app.dismiss_alert().into(),
            _ => ().into(),
        };
    }

    if app.state.confirm.is_some() {
        return match key.code {
            Char('y') | KeyCode::Enter => app.confirm().into(),
            Char('n') | KeyCode::Esc => app.cancel_confirm().into(),
            _ => ().into(),
        };
    }

    if app.state.form.is_some() {
        return form_key(app, key);
    }

    if app.state.picker.is_some() {
        return match key.code {
            KeyCode::Esc => app.close_picker().into(),
            Char('j') | KeyCode::Down => app.picker_move(true).into(),
            Char('k') | KeyCode::Up => app.picker_move(false).into(),
            Char(' ') => app.picker_toggle().into(),
            KeyCode::Enter => app.submit_picker().into(),
            _ => ().into(),
        };
    }

    if app.state.search.editing {
        return match key.code {
            KeyCode::Esc | KeyCode::Enter => app.stop_search_edit().into(),
            KeyCode::Backspace => vec![app.search_backspace()].into(),
            Char(c) => vec![app.search_push(c)].into(),
            _ => ().into(),
        };
    }

    normal_key(app, key)
}

fn form_key(app: &mut App, key: KeyEvent) -> KeyAction {
    if key.code == KeyCode::Enter {
        return app.submit_form().into();
    }
    if key.code == KeyCode::Esc {
        return app.close_form().into();
    }
    let Some(form) = app.state.form.as_mut() else {
        return ().into();
    };
    let on_choice = form.focused().is_some_and(|f| f.is_choice());
    match key.code {
        KeyCode::Tab | KeyCode::Down => form.next_field(),
        KeyCode::BackTab | KeyCode::Up => form.prev_field(),
        KeyCode::Right | Char(' ') if on_choice => form.cycle_choice(true),
        KeyCode::Left if on_choice => form.cycle_choice(false),
        KeyCode::Backspace => form.backspace(),
        Char(c) => form.push_char(c),
        _ => {}
    }
    ().into()
}

fn normal_key(app: &mut App, key: KeyEvent) -> KeyAction {
    let is_guest = app.state.session.is_guest();
    let is_admin = app.state.session.is_admin();
    let is_team = matches!(app.state.session, Session::Team { .. });

    match (app.state.active_tab, key.code, key.modifiers) {
        (_, Char('q'), _) => KeyAction::Quit,

        // Tab switching
        (_, Char(d @ '1'..='9'), _) => {
            let index = d.to_digit(10).map_or(0, |n| n as usize - 1);
            app.select_tab(index).into()
        }
        (_, Char('?'), _) => app.update_tab(MenuItem::Help).into(),
        (MenuItem::Help, KeyCode::Esc, _) => app.exit_help().into(),

        // Session
        (_, Char('L'), _) if is_guest => app.open_login().into(),
        (_, Char('L'), _) => app.logout().into(),
        (_, Char('T'), _) if is_guest => app.open_team_signup().into(),
        (_, Char('R'), _) if is_guest => app.open_referee_signup().into(),

        // Lists
        (_, Char('j') | KeyCode::Down, _) => app.move_selection(true).into(),
        (_, Char('k') | KeyCode::Up, _) => app.move_selection(false).into(),
        (_, Char('r'), _) => app.refresh().into(),
        (MenuItem::Tournaments, KeyCode::Enter, _) => app.activate_tournament().into(),

        // Admin
        (MenuItem::Tournaments, Char('n'), _) if is_admin => app.open_create_tournament().into(),
        (MenuItem::Tournaments, Char('m'), _) if is_admin => {
            if !app.open_record_match() {
                log::info!("match entry is not available for this tournament");
            }
            ().into()
        }
        (MenuItem::Tournaments, Char('x'), _) if is_admin => app.remove_newest_entrant().into(),
        (MenuItem::Teams, Char('b'), _) if is_admin => app.toggle_team_block().into(),
        (MenuItem::Referees, Char('e'), _) if is_admin => app.open_referee_score().into(),
        (MenuItem::Referees, Char('d'), _) if is_admin => app.ask_delete_referee().into(),

        // Team
        (MenuItem::MyPlayers, Char('a'), _) if is_team => app.open_add_player().into(),

        // Guest search
        (MenuItem::Search, Char('/'), _) => app.start_search_edit().into(),

        // Global
        (_, Char('f'), _) => app.toggle_full_screen().into(),
        (_, Char('"'), _) => app.toggle_show_logs().into(),

        _ => ().into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::app_settings::AppSettings;
    use crate::state::forms::FormKind;

    fn press(app: &mut App, code: KeyCode) -> KeyAction {
        route_key(app, KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn requests(action: KeyAction) -> Vec<NetworkRequest> {
        match action {
            KeyAction::Send(requests) => requests,
            KeyAction::Quit => panic!("unexpected quit"),
        }
    }

    fn guest() -> App {
        App::new(AppSettings::default(), Session::Guest)
    }

    #[test]
    fn letters_go_into_the_open_form_not_the_tab() {
        let mut app = guest();
        press(&mut app, Char('L'));
        assert_eq!(app.state.form.as_ref().map(|f| f.kind), Some(FormKind::Login));

        // 'q' is text while a form is open
        assert!(requests(press(&mut app, Char('q'))).is_empty());
        assert_eq!(app.state.form.as_ref().map(|f| f.value("Email")), Some("q"));

        press(&mut app, KeyCode::Esc);
        assert!(app.state.form.is_none());
        assert!(matches!(press(&mut app, Char('q')), KeyAction::Quit));
    }

    #[test]
    fn submitting_an_incomplete_form_sends_nothing() {
        let mut app = guest();
        press(&mut app, Char('L'));
        assert!(requests(press(&mut app, KeyCode::Enter)).is_empty());
        assert!(app.state.form.as_ref().is_some_and(|f| f.error.is_some()));
    }

    #[test]
    fn alert_swallows_keys_until_dismissed() {
        let mut app = guest();
        app.alert_error("Oops", "failed");
        assert!(requests(press(&mut app, Char('q'))).is_empty());
        press(&mut app, KeyCode::Enter);
        assert!(app.state.alert.is_none());
    }

    #[test]
    fn typing_in_search_issues_a_request_per_key() {
        let mut app = guest();
        press(&mut app, Char('/'));
        assert!(app.state.search.editing);
        let sent = requests(press(&mut app, Char('R')));
        assert!(matches!(
            sent.as_slice(),
            [NetworkRequest::Search { term, .. }] if term == "R"
        ));
        press(&mut app, KeyCode::Enter);
        assert!(!app.state.search.editing);
    }

    #[test]
    fn admin_keys_are_ignored_for_guests() {
        let mut app = guest();
        assert!(requests(press(&mut app, Char('x'))).is_empty());
        press(&mut app, Char('n'));
        assert!(app.state.form.is_none());
    }

    #[test]
    fn ctrl_c_quits_even_inside_a_form() {
        let mut app = guest();
        press(&mut app, Char('L'));
        let action = route_key(&mut app, KeyEvent::new(Char('c'), KeyModifiers::CONTROL));
        assert!(matches!(action, KeyAction::Quit));
    }
}
