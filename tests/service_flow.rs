//! End-to-end runs against the in-memory store: the write actions feed
//! the change hub, the score service reacts, and the standings channel
//! is what the scoreboard would render.

use std::sync::Arc;

use chrono::{Duration, Utc};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use sss_ryder::actions::{self, MatchScoreForm};
use sss_ryder::constants::{
    DRINKS_UNLOCK_AT, SSS_TOURNAMENT_ID, TEAM_JORGE_ID, TEAM_JORGE_NAME, TEAM_YAGO_ID,
    TEAM_YAGO_NAME,
};
use sss_ryder::models::{
    DrinkType, EventType, Match, MatchResult, MatchStatus, NewEvent, Profile, Round, RoundFormat,
    Team, Tournament, UserRole,
};
use sss_ryder::realtime::{ChangeKind, TableChange, WatchedTable};
use sss_ryder::score_service::ScoreService;
use sss_ryder::session::Authenticator;
use sss_ryder::store::{MemoryStore, TournamentStore};

fn profile(name: &str, role: UserRole, team_id: Option<Uuid>) -> Profile {
    Profile {
        id: Uuid::new_v4(),
        display_name: name.to_string(),
        nickname: None,
        avatar_url: None,
        bio: None,
        role,
        team_id,
        secret_word: None,
        handicap: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

fn team(id: Uuid, name: &str, color: &str) -> Team {
    Team {
        id,
        tournament_id: SSS_TOURNAMENT_ID,
        name: name.to_string(),
        color: color.to_string(),
        logo_url: None,
        total_points: 0.0,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

fn fourball_round() -> Round {
    Round {
        id: Uuid::new_v4(),
        tournament_id: SSS_TOURNAMENT_ID,
        name: "Sábado mañana".to_string(),
        round_order: 2,
        format: RoundFormat::Fourball,
        date_time: None,
        is_completed: false,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

fn pending_match(round_id: Uuid) -> Match {
    Match {
        id: Uuid::new_v4(),
        round_id,
        team_a_players: vec![],
        team_b_players: vec![],
        team_a_id: Some(TEAM_JORGE_ID),
        team_b_id: Some(TEAM_YAGO_ID),
        status: MatchStatus::Pending,
        result: MatchResult::InProgress,
        score_display: "AS".to_string(),
        holes_played: 0,
        points_value: 1.0,
        team_a_points: 0.0,
        team_b_points: 0.0,
        team_a_strokes: 0,
        team_b_strokes: 0,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

fn seed_base(store: &MemoryStore) {
    store.seed_tournament(Tournament {
        id: SSS_TOURNAMENT_ID,
        name: "SSS Ryder".to_string(),
        start_date: None,
        end_date: None,
        location: Some("Valdecañas".to_string()),
        created_by: None,
        is_active: true,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    });
    store.seed_team(team(TEAM_JORGE_ID, TEAM_JORGE_NAME, "#DC2626"));
    store.seed_team(team(TEAM_YAGO_ID, TEAM_YAGO_NAME, "#2563EB"));
}

/// Lets every other task on the runtime make progress. All the store
/// calls resolve without timers, so a bounded number of yields is enough
/// to drain whatever the service has pending.
async fn settle() {
    for _ in 0..1000 {
        tokio::task::yield_now().await;
    }
}

async fn wait_until(mut check: impl FnMut() -> bool) {
    for _ in 0..10_000 {
        if check() {
            return;
        }
        tokio::task::yield_now().await;
    }
    panic!("condition not reached after yielding");
}

#[tokio::test]
async fn test_live_standings_follow_the_weekend() {
    let store = Arc::new(MemoryStore::new());
    seed_base(&store);
    let jorge = profile("Jorge", UserRole::Admin, Some(TEAM_JORGE_ID));
    let ana = profile("Ana", UserRole::Player, Some(TEAM_JORGE_ID));
    let yago = profile("Yago", UserRole::Player, Some(TEAM_YAGO_ID));
    store.seed_profile(jorge.clone());
    store.seed_profile(ana.clone());
    store.seed_profile(yago.clone());
    let round = fourball_round();
    let game = pending_match(round.id);
    store.seed_round(round.clone());
    store.seed_match(game.clone());

    let service = Arc::new(ScoreService::new(
        store.clone() as Arc<dyn TournamentStore>,
        store.change_hub(),
    ));
    let mut scores = service.subscribe_scores();
    let cancel = CancellationToken::new();
    let task = service.spawn(cancel.clone());

    scores.changed().await.unwrap();
    {
        let current = scores.borrow_and_update();
        assert_eq!(current.pimentonas.total, 0.0);
        assert_eq!(current.tabaqueras.total, 0.0);
    }

    // First login claims the secret word and carries the admin flag.
    let auth = Authenticator::new(store.clone() as Arc<dyn TournamentStore>);
    let captain = auth.login(jorge.id, "valdecañas").await.unwrap();
    assert!(captain.is_admin());

    actions::start_match(store.as_ref(), &captain.player, game.id, &round)
        .await
        .unwrap();
    scores.changed().await.unwrap();
    {
        let current = scores.borrow_and_update();
        assert_eq!(current.pimentonas.golf, 0.0, "a started match pays nothing");
    }

    actions::save_match_score(
        store.as_ref(),
        &captain.player,
        &game,
        &round,
        &MatchScoreForm {
            status: MatchStatus::Completed,
            result: MatchResult::TeamAWin,
            score_display: "3&2".to_string(),
            holes_played: 16,
            team_a_strokes: 0,
            team_b_strokes: 0,
        },
    )
    .await
    .unwrap();
    scores.changed().await.unwrap();
    {
        let current = scores.borrow_and_update();
        assert_eq!(current.pimentonas.golf, 1.0);
        assert_eq!(current.pimentonas.matches_won, 1);
        assert_eq!(current.tabaqueras.golf, 0.0);
    }

    actions::log_drink(
        store.as_ref(),
        &ana,
        DrinkType::Cerveza,
        3,
        *DRINKS_UNLOCK_AT + Duration::hours(1),
    )
    .await
    .unwrap();
    scores.changed().await.unwrap();
    {
        let current = scores.borrow_and_update();
        assert!((current.pimentonas.drinks - 0.3).abs() < 1e-9);
        assert_eq!(current.pimentonas.total_drinks, 3);
    }

    // An old unvalidated hidalgo confession costs the team a point.
    let confession_day = Utc::now().date_naive() - Duration::days(5);
    actions::submit_hidalgo_answer(store.as_ref(), &ana, true, confession_day)
        .await
        .unwrap();
    scores.changed().await.unwrap();
    {
        let current = scores.borrow_and_update();
        assert_eq!(current.pimentonas.hidalgo_penalty, 1.0);
        assert!((current.pimentonas.total - 0.3).abs() < 1e-9, "1.0 golf + 0.3 drinks - 1.0 penalty");
    }

    cancel.cancel();
    task.await.unwrap();
}

#[tokio::test]
async fn test_unwatched_tables_do_not_republish() {
    let store = Arc::new(MemoryStore::new());
    seed_base(&store);

    let service = Arc::new(ScoreService::new(
        store.clone() as Arc<dyn TournamentStore>,
        store.change_hub(),
    ));
    let mut scores = service.subscribe_scores();
    let cancel = CancellationToken::new();
    let task = service.spawn(cancel.clone());

    scores.changed().await.unwrap();
    let _ = scores.borrow_and_update();

    // Feed entries and team edits fly past the service without a refetch.
    store
        .insert_event(NewEvent {
            tournament_id: SSS_TOURNAMENT_ID,
            event_type: EventType::Drink,
            actor_user_id: None,
            payload: None,
        })
        .await
        .unwrap();
    store.change_hub().publish(TableChange {
        table: WatchedTable::Teams,
        kind: ChangeKind::Update,
        row: serde_json::Value::Null,
    });
    settle().await;
    assert!(
        !scores.has_changed().unwrap(),
        "events and team rows must not republish the standings"
    );

    store.change_hub().publish(TableChange {
        table: WatchedTable::Matches,
        kind: ChangeKind::Update,
        row: serde_json::Value::Null,
    });
    scores.changed().await.unwrap();

    cancel.cancel();
    task.await.unwrap();
}

#[tokio::test]
async fn test_outage_keeps_last_standings_until_recovery() {
    let store = Arc::new(MemoryStore::new());
    seed_base(&store);
    let round = fourball_round();
    let mut game = pending_match(round.id);
    game.status = MatchStatus::Completed;
    game.result = MatchResult::TeamAWin;
    store.seed_round(round);
    store.seed_match(game);

    let service = Arc::new(ScoreService::new(
        store.clone() as Arc<dyn TournamentStore>,
        store.change_hub(),
    ));
    let mut scores = service.subscribe_scores();
    let cancel = CancellationToken::new();
    let task = service.spawn(cancel.clone());

    scores.changed().await.unwrap();
    assert_eq!(scores.borrow_and_update().pimentonas.golf, 1.0);

    store.set_offline(true);
    store.change_hub().publish(TableChange {
        table: WatchedTable::Drinks,
        kind: ChangeKind::Insert,
        row: serde_json::Value::Null,
    });
    wait_until(|| service.last_error().is_some()).await;
    assert!(
        !scores.has_changed().unwrap(),
        "a failed refetch must leave the published standings alone"
    );
    assert_eq!(scores.borrow().pimentonas.golf, 1.0);

    store.set_offline(false);
    store.change_hub().publish(TableChange {
        table: WatchedTable::Drinks,
        kind: ChangeKind::Insert,
        row: serde_json::Value::Null,
    });
    scores.changed().await.unwrap();
    assert_eq!(scores.borrow().pimentonas.golf, 1.0);
    wait_until(|| service.last_error().is_none()).await;

    cancel.cancel();
    task.await.unwrap();
}
