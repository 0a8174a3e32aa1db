//! Roster correction and match admission against a mocked server.

use chrono::{TimeZone, Utc};
use mockito::{Matcher, Server, ServerGuard};
use serde_json::{Value, json};
use tennis_api::admission::{GateState, GateTransition, LockReason};
use tennis_api::client::TennisApi;
use tennis_api::phases::PhaseCatalog;
use tennis_api::recorder::{DraftError, MatchDraft};
use tennis_api::roster::{Roster, RosterStatus};
use tennis_api::{MatchStatus, TournamentStatus};

const TOURNAMENT: u32 = 5;

fn roster_body(ids: std::ops::RangeInclusive<u32>) -> String {
    let players: Vec<Value> = ids
        .map(|id| {
            json!({
                "id": id,
                "name": format!("Player {id}"),
                "level": 5,
                "registration_date": format!("2024-05-01T10:{:02}:00", id),
            })
        })
        .collect();
    Value::Array(players).to_string()
}

async fn load_roster(api: &TennisApi) -> Roster {
    let entries = api.fetch_roster(TOURNAMENT).await.expect("roster fetch");
    Roster::new(TOURNAMENT, entries)
}

async fn mock_roster(server: &mut ServerGuard, ids: std::ops::RangeInclusive<u32>) -> mockito::Mock {
    server
        .mock("GET", "/api/tournaments/5/players")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(roster_body(ids))
        .expect(1)
        .create_async()
        .await
}

#[tokio::test]
async fn over_capacity_roster_is_corrected_then_match_is_recorded() {
    let mut server = Server::new_async().await;
    let api = TennisApi::new(server.url());

    // 17 entrants: gate locked, newest entrant offered for removal.
    let first = mock_roster(&mut server, 1..=17).await;
    let roster = load_roster(&api).await;
    first.assert_async().await;
    first.remove_async().await;

    assert_eq!(roster.status(), RosterStatus::Over { excess: 1 });
    let gate = GateState::evaluate(roster.status(), TournamentStatus::Upcoming);
    assert_eq!(gate, GateState::Locked(LockReason::RosterOverCapacity { excess: 1 }));
    let candidate = roster.removal_candidate().expect("removal offered");
    assert_eq!(candidate.player.name, "Player 17");

    let delete = server
        .mock("DELETE", "/api/tournaments/5/players/17")
        .with_status(204)
        .create_async()
        .await;
    api.remove_roster_entry(TOURNAMENT, candidate.player.id)
        .await
        .expect("removal accepted");
    delete.assert_async().await;

    // Re-fetch after the removal: exactly at capacity, gate opens.
    let second = mock_roster(&mut server, 1..=16).await;
    let corrected = load_roster(&api).await;
    second.assert_async().await;

    let reopened = GateState::evaluate(corrected.status(), TournamentStatus::Upcoming);
    assert_eq!(reopened.transition_from(Some(&gate)), GateTransition::Opened);
    assert!(corrected.removal_candidate().is_none());

    server
        .mock("GET", "/api/tournaments/5/phases")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!([{"id": 11, "name": "Round of 16"}, {"id": 12, "name": "Quarterfinal"}]).to_string())
        .create_async()
        .await;
    let mut catalog = PhaseCatalog::from_server(api.fetch_phases(TOURNAMENT).await.expect("phases"));
    assert!(catalog.select(11));

    let now = Utc.with_ymd_and_hms(2024, 5, 10, 9, 0, 0).unwrap();
    let draft = MatchDraft {
        phase_id: catalog.selected_id().map(|id| id.to_string()).unwrap_or_default(),
        player1_id: "1".into(),
        player2_id: "16".into(),
        referee_id: "3".into(),
        match_date: String::new(),
        court_number: "2".into(),
        score: "6-3 7-5".into(),
        winner_id: "16".into(),
    };
    let new_match = draft.validate(now, MatchStatus::Completed).expect("valid draft");

    let create = server
        .mock("POST", "/api/tournaments/5/matches")
        .match_body(Matcher::PartialJson(json!({
            "phase_id": 11,
            "player1_id": 1,
            "player2_id": 16,
            "winner_id": 16,
            "match_date": "2024-05-10T09:00:00.000Z",
            "status": "completed"
        })))
        .with_status(201)
        .with_body("{}")
        .create_async()
        .await;
    api.create_match(TOURNAMENT, &new_match).await.expect("match created");
    create.assert_async().await;
}

#[tokio::test]
async fn fifteen_entrants_keep_the_gate_locked() {
    let mut server = Server::new_async().await;
    let api = TennisApi::new(server.url());
    mock_roster(&mut server, 1..=15).await;

    let roster = load_roster(&api).await;
    assert_eq!(roster.status().summary(roster.len(), 16), "15/16, need 1 more");
    let gate = GateState::evaluate(roster.status(), TournamentStatus::Active);
    assert!(!gate.is_open());
    assert!(roster.removal_candidate().is_none());
}

#[tokio::test]
async fn self_match_never_reaches_the_server() {
    let mut server = Server::new_async().await;
    let api = TennisApi::new(server.url());
    let create = server
        .mock("POST", Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let draft = MatchDraft {
        phase_id: "1".into(),
        player1_id: "5".into(),
        player2_id: "5".into(),
        referee_id: "1".into(),
        court_number: "1".into(),
        winner_id: "5".into(),
        ..Default::default()
    };
    let result = draft.validate(Utc::now(), MatchStatus::Completed);
    assert_eq!(result, Err(DraftError::SamePlayer));
    if let Ok(new_match) = result {
        api.create_match(TOURNAMENT, &new_match).await.ok();
    }
    create.assert_async().await;
}

#[tokio::test]
async fn completed_tournament_with_full_roster_stays_locked() {
    let mut server = Server::new_async().await;
    let api = TennisApi::new(server.url());
    mock_roster(&mut server, 1..=16).await;

    let roster = load_roster(&api).await;
    assert!(roster.status().is_exact());
    let gate = GateState::evaluate(roster.status(), TournamentStatus::Completed);
    assert_eq!(gate, GateState::Locked(LockReason::TournamentCompleted));
}
