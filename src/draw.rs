use std::collections::HashMap;
use std::ops::Range;

use log::error;
use tui::backend::Backend;
use tui::layout::{Alignment, Constraint, Layout, Rect};
use tui::style::{Color, Modifier, Style};
use tui::text::{Line, Span};
use tui::widgets::{Block, BorderType, Borders, Clear, Paragraph, Tabs, Wrap};
use tui::{Frame, Terminal};
use tui_logger::TuiLoggerWidget;

use crate::app::App;
use crate::components::form::FormView;
use crate::components::phase_board::PhaseBoard;
use crate::state::app_state::{MenuItem, TournamentDetail};
use crate::state::forms::FormKind;
use crate::state::messages::MutationKey;
use crate::state::network::{ERROR_CHAR, LoadingState};
use crate::state::remote::Remote;
use crate::state::session::Session;
use crate::ui::layout::{LayoutAreas, centered};
use tennis_api::admission::{GateState, LockReason};
use tennis_api::roster::RosterStatus;
use tennis_api::{BRACKET_CAPACITY, PlayerId, Tournament};

pub fn draw<B>(terminal: &mut Terminal<B>, app: &mut App, loading: LoadingState)
where
    B: Backend,
{
    let current_size = terminal.size().unwrap_or_default();
    if current_size.width <= 10 || current_size.height <= 10 {
        return;
    }

    let mut layout = LayoutAreas::new(current_size);

    let result = terminal.draw(|f| {
        layout.update(f.area(), app.settings.full_screen, app.state.show_logs);

        if !app.settings.full_screen {
            draw_tabs(f, layout.tab_bar, app);
        }

        match app.state.active_tab {
            MenuItem::Tournaments => match app.state.session {
                Session::Admin { .. } => draw_admin_tournaments(f, layout.main, app),
                Session::Team { .. } => draw_team_tournaments(f, layout.main, app),
                _ => draw_referee_tournaments(f, layout.main, app),
            },
            MenuItem::Teams => draw_teams(f, layout.main, app),
            MenuItem::Referees => draw_referees(f, layout.main, app),
            MenuItem::Rankings => draw_rankings(f, layout.main, app),
            MenuItem::MyPlayers => draw_my_players(f, layout.main, app),
            MenuItem::Search => draw_search(f, layout.main, app),
            MenuItem::Help => draw_help(f, layout.main, app),
        }

        if let Some(logs) = layout.logs {
            draw_logs(f, logs);
        }

        draw_picker(f, f.area(), app);
        if let Some(form) = app.state.form.as_ref() {
            let submitting = submitting(app);
            let area = centered(f.area(), 72, FormView::height(form));
            f.render_widget(FormView { form, submitting }, area);
        }
        draw_confirm(f, f.area(), app);
        draw_alert(f, f.area(), app);

        draw_loading_spinner(f, f.area(), app, loading);
    });

    if let Err(e) = result {
        error!("draw failed: {e}");
    }
}

pub fn default_border<'a>(color: Color) -> Block<'a> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(color))
}

fn draw_tabs(f: &mut Frame, tab_bar: [Rect; 2], app: &App) {
    let style = Style::default().fg(Color::White);
    let border_type = BorderType::Rounded;

    let tabs = app.state.tabs();
    let tab_index = tabs
        .iter()
        .position(|t| *t == app.state.active_tab)
        .unwrap_or(0);

    let titles: Vec<Line> = tabs
        .iter()
        .enumerate()
        .map(|(i, t)| Line::from(format!("{} {}", i + 1, t.title())))
        .collect();
    let tabs = Tabs::new(titles)
        .block(
            Block::default()
                .borders(Borders::LEFT | Borders::BOTTOM | Borders::TOP)
                .border_type(border_type),
        )
        .highlight_style(Style::default().add_modifier(Modifier::UNDERLINED))
        .select(tab_index)
        .style(style);
    f.render_widget(tabs, tab_bar[0]);

    let help = Paragraph::new(format!("{}  Help: ? ", app.state.session.label()))
        .alignment(Alignment::Right)
        .block(
            Block::default()
                .borders(Borders::RIGHT | Borders::BOTTOM | Borders::TOP)
                .border_type(border_type),
        )
        .style(style);
    f.render_widget(help, tab_bar[1]);
}

// ---------------------------------------------------------------------------
// Tournaments
// ---------------------------------------------------------------------------

fn draw_admin_tournaments(f: &mut Frame, area: Rect, app: &App) {
    let [list_area, detail_area] =
        Layout::horizontal([Constraint::Percentage(38), Constraint::Fill(1)]).areas(area);

    let block = default_border(Color::White).title(" Tournaments ");
    let inner = block.inner(list_area);
    f.render_widget(block, list_area);
    let [list, legend] =
        Layout::vertical([Constraint::Fill(1), Constraint::Length(1)]).areas(inner);

    if !draw_remote_notice(f, list, &app.state.tournaments, "tournaments") {
        let tournaments = app.state.visible_tournaments();
        let selected = app.state.cursors.tournaments.index;
        let lines = windowed(tournaments.len(), selected, list.height)
            .map(|i| {
                let t = tournaments[i];
                selectable_line(
                    i == selected,
                    format!("{} {} [{}]", t.name, t.edition, t.status.label()),
                    Style::default().fg(status_color(t)),
                )
            })
            .collect::<Vec<_>>();
        f.render_widget(Paragraph::new(lines), list);
    }
    f.render_widget(
        Paragraph::new("n=new  m=match  x=remove newest  Enter=reload")
            .style(Style::default().fg(Color::DarkGray)),
        legend,
    );

    let Some(tournament) = app.state.selected_tournament() else {
        draw_placeholder(f, detail_area, "Select a tournament");
        return;
    };
    draw_tournament_detail(f, detail_area, app, tournament);
}

fn draw_tournament_detail(f: &mut Frame, area: Rect, app: &App, tournament: &Tournament) {
    let block = default_border(Color::White).title(format!(" {} ", tournament.name));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let [info_area, board_area] =
        Layout::vertical([Constraint::Length(6), Constraint::Fill(1)]).areas(inner);

    let mut lines = vec![
        Line::from(format!(
            "Edition {}  |  {}  |  {} court",
            tournament.edition,
            tournament.date_range(),
            tournament.court_type
        )),
        Line::from(format!(
            "Min level {}  |  Min referee level {}  |  {}",
            tournament.min_level,
            tournament.min_referee_level,
            tournament.status.label()
        )),
    ];

    let detail = app.state.detail(tournament.id);
    match detail.and_then(|d| d.roster.value()) {
        Some(roster) => {
            let status = roster.status();
            lines.push(Line::from(format!(
                "Roster: {}",
                status.summary(roster.len(), BRACKET_CAPACITY)
            )));
            if let RosterStatus::Over { .. } = status
                && let Some(newest) = roster.removal_candidate()
            {
                lines.push(Line::from(Span::styled(
                    format!(
                        "Too many registrations! Newest entrant: {} (x to remove)",
                        newest.player.name
                    ),
                    Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
                )));
            }
        }
        None => lines.push(Line::from(Span::styled(
            remote_status_text(detail.map(|d| &d.roster), "roster"),
            Style::default().fg(Color::DarkGray),
        ))),
    }
    lines.push(gate_line(detail.and_then(|d| d.gate)));
    if let Some(err) = detail.and_then(|d| d.roster.error()) {
        lines.push(Line::from(Span::styled(
            format!("Roster refresh failed: {err}"),
            Style::default().fg(Color::Red),
        )));
    }
    f.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }), info_area);

    draw_matches(f, board_area, app, detail);
}

fn gate_line(gate: Option<GateState>) -> Line<'static> {
    match gate {
        Some(GateState::Open) => Line::from(Span::styled(
            "Match entry open (m to record a match)",
            Style::default().fg(Color::Green),
        )),
        Some(GateState::Locked(LockReason::TournamentCompleted)) => Line::from(Span::styled(
            "Tournament completed: no new matches",
            Style::default().fg(Color::DarkGray),
        )),
        Some(GateState::Locked(reason)) => Line::from(Span::styled(
            format!("Match entry locked: {}", reason.describe()),
            Style::default().fg(Color::Yellow),
        )),
        None => Line::from(""),
    }
}

fn draw_matches(f: &mut Frame, area: Rect, app: &App, detail: Option<&TournamentDetail>) {
    let Some(detail) = detail else {
        return;
    };
    let Some(matches) = detail.matches.value() else {
        let text = remote_status_text(Some(&detail.matches), "matches");
        f.render_widget(
            Paragraph::new(text).style(Style::default().fg(Color::DarkGray)),
            area,
        );
        return;
    };

    let names = player_names(app, detail);
    let highlight = detail
        .phases
        .value()
        .and_then(|c| c.selected())
        .map(|p| p.name.as_str());
    f.render_widget(
        PhaseBoard { phases: &matches.phases, names: &names, highlight },
        area,
    );
}

fn player_names(app: &App, detail: &TournamentDetail) -> HashMap<PlayerId, String> {
    let mut names: HashMap<PlayerId, String> = app
        .state
        .rankings
        .value()
        .into_iter()
        .flatten()
        .map(|p| (p.id, p.name.clone()))
        .collect();
    if let Some(roster) = detail.roster.value() {
        names.extend(roster.entries.iter().map(|e| (e.player.id, e.player.name.clone())));
    }
    names
}

fn draw_team_tournaments(f: &mut Frame, area: Rect, app: &App) {
    let [list_area, detail_area] =
        Layout::horizontal([Constraint::Percentage(40), Constraint::Fill(1)]).areas(area);

    let block = default_border(Color::White).title(" Tournaments ");
    let inner = block.inner(list_area);
    f.render_widget(block, list_area);

    if !draw_remote_notice(f, inner, &app.state.tournaments, "tournaments") {
        let tournaments = app.state.visible_tournaments();
        let selected = app.state.cursors.tournaments.index;
        let mut lines = Vec::new();
        let mut last_section = None;
        for (i, t) in tournaments.iter().enumerate() {
            let section = if t.is_completed() { "Completed" } else { "Upcoming" };
            if last_section != Some(section) {
                if last_section.is_some() {
                    lines.push(Line::from(""));
                }
                lines.push(Line::from(Span::styled(
                    section,
                    Style::default().fg(Color::Gray).add_modifier(Modifier::BOLD),
                )));
                last_section = Some(section);
            }
            lines.push(selectable_line(
                i == selected,
                format!("{} {}  {}", t.name, t.edition, t.date_range()),
                Style::default().fg(status_color(t)),
            ));
        }
        let scroll = selected.saturating_sub(inner.height.saturating_sub(4) as usize) as u16;
        f.render_widget(Paragraph::new(lines).scroll((scroll, 0)), inner);
    }

    let Some(tournament) = app.state.selected_tournament() else {
        draw_placeholder(f, detail_area, "No tournaments yet");
        return;
    };

    if tournament.is_completed() {
        let block = default_border(Color::White).title(format!(" {} results ", tournament.name));
        let inner = block.inner(detail_area);
        f.render_widget(block, detail_area);
        match app.state.detail(tournament.id) {
            Some(detail) => draw_matches(f, inner, app, Some(detail)),
            None => f.render_widget(
                Paragraph::new("Press Enter to load the results")
                    .style(Style::default().fg(Color::DarkGray)),
                inner,
            ),
        }
        return;
    }

    let mut lines = vec![
        Line::from(format!("{} {}", tournament.name, tournament.edition)),
        Line::from(tournament.date_range()),
        Line::from(format!("{} court", tournament.court_type)),
        Line::from(format!("Minimum player level: {}", tournament.min_level)),
        Line::from(""),
    ];
    if app.state.team_is_blocked() {
        lines.push(Line::from(Span::styled(
            "Your team is blocked: registrations are disabled.",
            Style::default().fg(Color::Red),
        )));
    } else {
        lines.push(Line::from(Span::styled(
            "Press Enter to register players",
            Style::default().fg(Color::Green),
        )));
    }
    let block = default_border(Color::White).title(" Details ");
    f.render_widget(Paragraph::new(lines).block(block), detail_area);
}

fn draw_referee_tournaments(f: &mut Frame, area: Rect, app: &App) {
    let block = default_border(Color::White).title(" Tournaments ");
    let inner = block.inner(area);
    f.render_widget(block, area);
    if draw_remote_notice(f, inner, &app.state.tournaments, "tournaments") {
        return;
    }

    let tournaments = app.state.visible_tournaments();
    let selected = app.state.cursors.tournaments.index;
    let lines: Vec<Line> = windowed(tournaments.len(), selected, inner.height)
        .map(|i| {
            let t = tournaments[i];
            selectable_line(
                i == selected,
                format!(
                    "{:<28} {:<8} {}  {:<6} referee level >= {}",
                    t.name,
                    t.edition,
                    t.date_range(),
                    t.court_type,
                    t.min_referee_level
                ),
                Style::default().fg(status_color(t)),
            )
        })
        .collect();
    f.render_widget(Paragraph::new(lines), inner);
}

fn status_color(t: &Tournament) -> Color {
    if t.is_completed() { Color::DarkGray } else { Color::White }
}

// ---------------------------------------------------------------------------
// Lists
// ---------------------------------------------------------------------------

fn draw_teams(f: &mut Frame, area: Rect, app: &App) {
    let block = default_border(Color::White).title(" Teams ");
    let inner = block.inner(area);
    f.render_widget(block, area);
    let [list, legend] =
        Layout::vertical([Constraint::Fill(1), Constraint::Length(1)]).areas(inner);
    f.render_widget(
        Paragraph::new("b=block/unblock  r=refresh").style(Style::default().fg(Color::DarkGray)),
        legend,
    );
    if draw_remote_notice(f, list, &app.state.teams, "teams") {
        return;
    }
    let Some(teams) = app.state.teams.value() else {
        return;
    };
    let selected = app.state.cursors.teams.index;
    let lines: Vec<Line> = windowed(teams.len(), selected, list.height)
        .map(|i| {
            let team = &teams[i];
            let pending = app.state.pending.contains(&MutationKey::TeamBlock(team.id));
            let (marker, style) = if team.is_blocked {
                ("BLOCKED", Style::default().fg(Color::Red))
            } else {
                ("active", Style::default().fg(Color::Green))
            };
            let mut line = selectable_line(
                i == selected,
                format!("{:<30} {:<32} ", team.name, team.email),
                Style::default(),
            );
            line.spans.push(Span::styled(marker, style));
            if pending {
                line.spans.push(Span::styled(" ...", Style::default().fg(Color::Cyan)));
            }
            line
        })
        .collect();
    f.render_widget(Paragraph::new(lines), list);
}

fn draw_referees(f: &mut Frame, area: Rect, app: &App) {
    let block = default_border(Color::White).title(" Referees ");
    let inner = block.inner(area);
    f.render_widget(block, area);
    let [list, legend] =
        Layout::vertical([Constraint::Fill(1), Constraint::Length(1)]).areas(inner);
    f.render_widget(
        Paragraph::new("e=set score  d=delete  r=refresh")
            .style(Style::default().fg(Color::DarkGray)),
        legend,
    );
    if draw_remote_notice(f, list, &app.state.referees, "referees") {
        return;
    }
    let Some(referees) = app.state.referees.value() else {
        return;
    };
    let selected = app.state.cursors.referees.index;
    let lines: Vec<Line> = windowed(referees.len(), selected, list.height)
        .map(|i| {
            let r = &referees[i];
            selectable_line(
                i == selected,
                format!(
                    "{:<30} level {:>2}  score {:>5}  {}",
                    r.full_name(),
                    r.level,
                    r.score,
                    r.fiscal_code
                ),
                Style::default(),
            )
        })
        .collect();
    f.render_widget(Paragraph::new(lines), list);
}

fn draw_rankings(f: &mut Frame, area: Rect, app: &App) {
    let block = default_border(Color::White).title(" Rankings ");
    let inner = block.inner(area);
    f.render_widget(block, area);
    if draw_remote_notice(f, inner, &app.state.rankings, "rankings") {
        return;
    }
    let Some(players) = app.state.rankings.value() else {
        return;
    };
    let selected = app.state.cursors.rankings.index;
    let lines: Vec<Line> = windowed(players.len(), selected, inner.height)
        .map(|i| {
            let p = &players[i];
            let style = if app.state.is_own_player(p) {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            let rank = p.ranking.map_or("-".to_string(), |r| r.to_string());
            selectable_line(
                i == selected,
                format!(
                    "{rank:>3}. {:<28} level {:>2}  {:>6} pts  {}",
                    p.name,
                    p.level,
                    p.score,
                    p.team_name.as_deref().unwrap_or("")
                ),
                style,
            )
        })
        .collect();
    f.render_widget(Paragraph::new(lines), inner);
}

fn draw_my_players(f: &mut Frame, area: Rect, app: &App) {
    let title = match app.state.own_team() {
        Some(team) => format!(" {} players ", team.name),
        None => " My players ".to_string(),
    };
    let block = default_border(Color::White).title(title);
    let inner = block.inner(area);
    f.render_widget(block, area);
    let [list, legend] =
        Layout::vertical([Constraint::Fill(1), Constraint::Length(1)]).areas(inner);
    f.render_widget(
        Paragraph::new("a=add player  r=refresh").style(Style::default().fg(Color::DarkGray)),
        legend,
    );
    if draw_remote_notice(f, list, &app.state.team_players, "players") {
        return;
    }
    let Some(players) = app.state.team_players.value() else {
        return;
    };
    if players.is_empty() {
        f.render_widget(
            Paragraph::new("No players yet. Press a to add one.")
                .style(Style::default().fg(Color::DarkGray)),
            list,
        );
        return;
    }
    let selected = app.state.cursors.players.index;
    let lines: Vec<Line> = windowed(players.len(), selected, list.height)
        .map(|i| {
            let p = &players[i];
            selectable_line(
                i == selected,
                format!("{:<30} level {:>2}  {:>6} pts", p.name, p.level, p.score),
                Style::default(),
            )
        })
        .collect();
    f.render_widget(Paragraph::new(lines), list);
}

fn draw_search(f: &mut Frame, area: Rect, app: &App) {
    let [input_area, results_area] =
        Layout::vertical([Constraint::Length(3), Constraint::Fill(1)]).areas(area);

    let search = &app.state.search;
    let (input, style) = if search.editing {
        (format!("{}_", search.term), Style::default().fg(Color::Yellow))
    } else if search.term.is_empty() {
        ("Press / to search tournaments".to_string(), Style::default().fg(Color::DarkGray))
    } else {
        (search.term.clone(), Style::default().fg(Color::White))
    };
    f.render_widget(
        Paragraph::new(input)
            .style(style)
            .block(default_border(Color::DarkGray).title(" Search ")),
        input_area,
    );

    let block = default_border(Color::White).title(" Tournaments ");
    let inner = block.inner(results_area);
    f.render_widget(block, results_area);
    if draw_remote_notice(f, inner, &search.results, "tournaments") {
        return;
    }
    let Some(outcome) = search.results.value() else {
        return;
    };

    let mut lines = Vec::new();
    if outcome.from_demo_data {
        lines.push(Line::from(Span::styled(
            "Server unreachable: showing demo data",
            Style::default().fg(Color::Yellow),
        )));
    }
    if outcome.tournaments.is_empty() {
        lines.push(Line::from(Span::styled(
            "No tournaments match",
            Style::default().fg(Color::DarkGray),
        )));
    }
    let selected = app.state.cursors.search.index;
    for (i, t) in outcome.tournaments.iter().enumerate() {
        lines.push(selectable_line(
            i == selected,
            format!("{:<28} {:<16} {} - {}", t.name, t.location, t.start_date, t.end_date),
            Style::default(),
        ));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "L=login  T=register team  R=register referee",
        Style::default().fg(Color::DarkGray),
    )));
    f.render_widget(Paragraph::new(lines), inner);
}

fn draw_help(f: &mut Frame, area: Rect, app: &App) {
    let mut text = vec![
        "q / Ctrl-C   quit",
        "1-9          switch tab",
        "j/k ↑/↓      move",
        "r            refresh",
        "f            toggle full screen",
        "\"            toggle log pane",
        "Esc          leave help",
        "",
    ];
    match app.state.session {
        Session::Guest => text.extend([
            "/            edit search",
            "L            login",
            "T            register a team",
            "R            register as referee",
        ]),
        Session::Team { .. } => text.extend([
            "Enter        register players / load results",
            "Space        toggle a player (registration)",
            "a            add a player (My Players)",
            "L            logout",
        ]),
        Session::Referee { .. } => text.extend(["L            logout"]),
        Session::Admin { .. } => text.extend([
            "n            new tournament",
            "m            record a match (roster must be complete)",
            "x            remove the newest entrant",
            "b            block / unblock team",
            "e / d        set referee score / delete referee",
            "L            logout",
        ]),
    }
    text.extend(["", "In forms: Tab/↑/↓ move, ←/→ choose, Enter submit, Esc cancel"]);

    let block = default_border(Color::DarkGray).title(" Help ");
    f.render_widget(Paragraph::new(text.join("\n")).block(block), area);
}

fn draw_logs(f: &mut Frame, area: Rect) {
    let logger = TuiLoggerWidget::default()
        .block(default_border(Color::DarkGray).title(" Logs "))
        .style_error(Style::default().fg(Color::Red))
        .style_warn(Style::default().fg(Color::Yellow))
        .style_info(Style::default().fg(Color::Cyan))
        .style_debug(Style::default().fg(Color::DarkGray));
    f.render_widget(logger, area);
}

// ---------------------------------------------------------------------------
// Overlays
// ---------------------------------------------------------------------------

fn submitting(app: &App) -> bool {
    let Some(form) = app.state.form.as_ref() else {
        return false;
    };
    let key = match form.kind {
        FormKind::Login => MutationKey::Login,
        FormKind::TeamSignup => MutationKey::RegisterTeam,
        FormKind::RefereeSignup => MutationKey::RegisterReferee,
        FormKind::CreateTournament => MutationKey::CreateTournament,
        FormKind::RecordMatch { tournament_id } => MutationKey::CreateMatch(tournament_id),
        FormKind::AddPlayer { .. } => MutationKey::AddPlayer,
        FormKind::RefereeScore { referee_id } => MutationKey::RefereeScore(referee_id),
    };
    app.state.pending.contains(&key)
}

fn draw_picker(f: &mut Frame, area: Rect, app: &App) {
    let Some(picker) = app.state.picker.as_ref() else {
        return;
    };
    let players = app.state.team_players.value().map(Vec::as_slice).unwrap_or_default();
    let height = (players.len() as u16 + 5).min(area.height);
    let popup = centered(area, 60, height.max(7));
    f.render_widget(Clear, popup);

    let block = default_border(Color::Yellow).title(format!(" Register for {} ", picker.tournament_name));
    let inner = block.inner(popup);
    f.render_widget(block, popup);

    let mut lines = Vec::new();
    if players.is_empty() {
        lines.push(Line::from(Span::styled(
            "Your team has no players yet",
            Style::default().fg(Color::DarkGray),
        )));
    }
    for (i, p) in players.iter().enumerate() {
        let check = if picker.selected.contains(&p.id) { "[x]" } else { "[ ]" };
        let style = if p.level < picker.min_level {
            Style::default().fg(Color::DarkGray)
        } else {
            Style::default()
        };
        lines.push(selectable_line(
            i == picker.cursor,
            format!("{check} {:<26} level {:>2}", p.name, p.level),
            style,
        ));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        format!("Minimum level {}  Space=toggle  Enter=register  Esc=cancel", picker.min_level),
        Style::default().fg(Color::DarkGray),
    )));
    let scroll = picker.cursor.saturating_sub(inner.height.saturating_sub(3) as usize) as u16;
    f.render_widget(Paragraph::new(lines).scroll((scroll, 0)), inner);
}

fn draw_confirm(f: &mut Frame, area: Rect, app: &App) {
    let Some(confirm) = app.state.confirm.as_ref() else {
        return;
    };
    let popup = centered(area, 50, 5);
    f.render_widget(Clear, popup);
    f.render_widget(
        Paragraph::new(format!("{}\n\ny = yes   n = no", confirm.prompt))
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .block(default_border(Color::Yellow).title(" Confirm ")),
        popup,
    );
}

fn draw_alert(f: &mut Frame, area: Rect, app: &App) {
    let Some(alert) = app.state.alert.as_ref() else {
        return;
    };
    let color = if alert.is_error { Color::Red } else { Color::Green };
    let popup = centered(area, 60, 7);
    f.render_widget(Clear, popup);
    f.render_widget(
        Paragraph::new(format!("{}\n\nEnter to close", alert.message))
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .block(default_border(color).title(format!(" {} ", alert.title))),
        popup,
    );
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn selectable_line(selected: bool, text: String, style: Style) -> Line<'static> {
    let (marker, style) = if selected {
        ("> ", style.add_modifier(Modifier::REVERSED))
    } else {
        ("  ", style)
    };
    Line::from(vec![Span::raw(marker), Span::styled(text, style)])
}

/// Indices of a list to show in `height` rows so that `selected` stays visible.
fn windowed(len: usize, selected: usize, height: u16) -> Range<usize> {
    let height = (height as usize).max(1);
    let start = selected.saturating_sub(height - 1).min(len.saturating_sub(1));
    start..len.min(start + height)
}

fn remote_status_text<T>(remote: Option<&Remote<T>>, what: &str) -> String {
    match remote {
        Some(r) if r.is_loading() => format!("Loading {what}..."),
        Some(r) => match r.error() {
            Some(error) => format!("Could not load {what}: {error}"),
            None => format!("No {what} loaded"),
        },
        None => format!("No {what} loaded"),
    }
}

/// Render loading/error text when a slot has nothing to show yet. Returns
/// true when it did so and the caller should not draw the list.
fn draw_remote_notice<T>(f: &mut Frame, area: Rect, remote: &Remote<T>, what: &str) -> bool {
    if remote.value().is_some() {
        if let Some(err) = remote.error()
            && area.height > 1
        {
            let bottom = Rect::new(area.x, area.y + area.height - 1, area.width, 1);
            f.render_widget(
                Paragraph::new(format!("Refresh failed: {err}")).style(Style::default().fg(Color::Red)),
                bottom,
            );
        }
        return false;
    }
    let color = if remote.error().is_some() { Color::Red } else { Color::DarkGray };
    f.render_widget(
        Paragraph::new(remote_status_text(Some(remote), what))
            .style(Style::default().fg(color))
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true }),
        area,
    );
    true
}

fn draw_placeholder(f: &mut Frame, area: Rect, msg: &str) {
    let block = default_border(Color::DarkGray);
    let inner = block.inner(area);
    f.render_widget(block, area);
    f.render_widget(
        Paragraph::new(msg)
            .style(Style::default().fg(Color::DarkGray))
            .alignment(Alignment::Center),
        inner,
    );
}

fn draw_loading_spinner(f: &mut Frame, area: Rect, app: &App, loading: LoadingState) {
    if !loading.is_loading && loading.spinner_char != ERROR_CHAR {
        return;
    }
    let style = match loading.spinner_char {
        ERROR_CHAR => Style::default().fg(Color::Red),
        _ => Style::default().fg(Color::White),
    };
    let spinner = Paragraph::new(loading.spinner_char.to_string())
        .alignment(Alignment::Right)
        .style(style);
    let area = if app.settings.full_screen {
        Rect::new(area.width.saturating_sub(3), area.height.saturating_sub(2), 1, 1)
    } else {
        Rect::new(area.width.saturating_sub(2), 0, 1, 1)
    };
    f.render_widget(spinner, area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_keeps_selection_visible() {
        assert_eq!(windowed(10, 0, 4), 0..4);
        assert_eq!(windowed(10, 6, 4), 3..7);
        assert_eq!(windowed(3, 2, 10), 0..3);
        assert_eq!(windowed(0, 0, 5), 0..0);
    }
}
