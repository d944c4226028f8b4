//! Repository behaviour against PostgreSQL
//!
//! These tests start a container and are ignored by default. Run them with
//! `cargo test -p infra_db --test postgres_tests -- --ignored`.

use chrono::Timelike;
use core_kernel::{GameId, PlayerId};
use infra_db::{
    read_list_involving, Cursor, DatabaseError, GameFilter, GameStatus, Pagination, PgStore,
    PlayerFilter, PropertyFilter, Repository, Store, TradeRequestFilter, TradeStatus,
};
use test_utils::{
    assert_keys, assert_not_found, assert_type_mismatch, assert_unique_keys, db_test,
    BoardFixtures, GameBuilder, GameLogBuilder, PlayerBuilder, Repositories, TradeRequestBuilder,
};

async fn new_game(repos: &Repositories<PgStore>) -> GameId {
    let key = repos.games.create(&GameBuilder::new().build()).await.unwrap();
    GameId::from_uuid(key.get("id").unwrap())
}

db_test!(test_health_check, |db| {
    PgStore::new(db.pool().clone()).health_check().await.unwrap();
});

db_test!(test_sessions_report_application_name, |db| {
    let name: String = sqlx::query_scalar("SELECT current_setting('application_name')")
        .fetch_one(db.pool())
        .await
        .unwrap();
    assert_eq!(name, "monopoly-db");
});

db_test!(test_game_lifecycle, |db| {
    let repos = db.repositories();
    let key = repos
        .games
        .create(&GameBuilder::new().name("Lifecycle").build())
        .await
        .unwrap();

    let mut game = repos.games.read(&key).await.unwrap();
    assert_eq!(game.name, "Lifecycle");
    assert_eq!(game.status, GameStatus::Waiting);

    game.status = GameStatus::InProgress;
    game.current_player_id = Some(PlayerId::new());
    let updated_at = repos.games.update(&game).await.unwrap();

    let stored = repos.games.read(&key).await.unwrap();
    assert_eq!(stored.status, GameStatus::InProgress);
    assert_eq!(stored.current_player_id, game.current_player_id);
    assert_eq!(stored.metadata.updated_at, updated_at);

    let deleted_at = repos.games.delete(&key).await.unwrap();
    assert!(deleted_at > updated_at);
    assert_not_found(repos.games.read(&key).await);
    assert_not_found(repos.games.delete(&key).await);
    assert_not_found(repos.games.update(&stored).await);

    let still_stored: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM games WHERE deleted_at IS NOT NULL",
    )
    .fetch_one(db.pool())
    .await
    .unwrap();
    assert_eq!(still_stored, 1);
});

db_test!(test_nullable_columns_round_trip, |db| {
    let repos = db.repositories();
    let winner = PlayerId::new();
    let key = repos
        .games
        .create(&GameBuilder::new().winner(winner).build())
        .await
        .unwrap();

    let mut game = repos.games.read(&key).await.unwrap();
    assert_eq!(game.winner_id, Some(winner));
    assert_eq!(game.current_player_id, None);

    game.winner_id = None;
    repos.games.update(&game).await.unwrap();
    assert_eq!(repos.games.read(&key).await.unwrap().winner_id, None);
});

db_test!(test_pagination_walk, |db| {
    let repos = db.repositories();
    let mut keys = Vec::new();
    for _ in 0..5 {
        keys.push(repos.games.create(&GameBuilder::new().build()).await.unwrap());
    }
    let filter = GameFilter::default();

    let (first, next) = repos
        .games
        .read_list(&Pagination::first_page(2).unwrap(), &filter)
        .await
        .unwrap();
    assert_keys(&first, &keys[0..2]);
    assert_eq!(next, Some(Cursor::new(2)));

    let (second, next) = repos
        .games
        .read_list(&Pagination::after(Cursor::new(2), 2).unwrap(), &filter)
        .await
        .unwrap();
    assert_keys(&second, &keys[2..4]);
    assert_eq!(next, Some(Cursor::new(4)));

    let (last, next) = repos
        .games
        .read_list(&Pagination::after(Cursor::new(4), 2).unwrap(), &filter)
        .await
        .unwrap();
    assert_keys(&last, &keys[4..5]);
    assert_eq!(next, None);
});

db_test!(test_player_filters, |db| {
    let repos = db.repositories();
    let game_id = new_game(&repos).await;
    let other_game = new_game(&repos).await;

    let jailed = repos
        .players
        .create(&PlayerBuilder::new(game_id).jailed(1).build())
        .await
        .unwrap();
    let free = repos
        .players
        .create(&PlayerBuilder::new(game_id).build())
        .await
        .unwrap();
    repos
        .players
        .create(&PlayerBuilder::new(other_game).build())
        .await
        .unwrap();

    let page = Pagination::first_page(10).unwrap();
    let (players, _) = repos
        .players
        .read_list(&page, &PlayerFilter::in_game(game_id))
        .await
        .unwrap();
    assert_keys(&players, &[jailed.clone(), free.clone()]);

    let filter = PlayerFilter {
        in_jail: Some(false),
        ..PlayerFilter::in_game(game_id)
    };
    let (players, _) = repos.players.read_list(&page, &filter).await.unwrap();
    assert_keys(&players, &[free]);
});

db_test!(test_unowned_properties, |db| {
    let repos = db.repositories();
    let owner = PlayerId::new();
    let mut owned = Vec::new();
    let mut unowned = Vec::new();
    for (i, mut property) in BoardFixtures::all().into_iter().enumerate() {
        if i % 2 == 0 {
            property.owner_id = Some(owner);
            owned.push(repos.properties.create(&property).await.unwrap());
        } else {
            unowned.push(repos.properties.create(&property).await.unwrap());
        }
    }

    let page = Pagination::first_page(10).unwrap();
    let (properties, _) = repos
        .properties
        .read_list(&page, &PropertyFilter::unowned())
        .await
        .unwrap();
    assert_keys(&properties, &unowned);

    let (properties, _) = repos
        .properties
        .read_list(&page, &PropertyFilter::owned_by(owner))
        .await
        .unwrap();
    assert_keys(&properties, &owned);

    let nothing = PropertyFilter {
        ids: Some(Vec::new()),
        ..Default::default()
    };
    let (properties, _) = repos.properties.read_list(&page, &nothing).await.unwrap();
    assert!(properties.is_empty());
});

db_test!(test_trade_property_lists_and_involving, |db| {
    let repos = db.repositories();
    let game_id = new_game(&repos).await;
    let (p, q) = (PlayerId::new(), PlayerId::new());
    let boardwalk = repos
        .properties
        .create(&BoardFixtures::boardwalk())
        .await
        .unwrap();
    let boardwalk_id = boardwalk.get("id").unwrap();

    let offer = repos
        .trade_requests
        .create(
            &TradeRequestBuilder::new(game_id, p, q)
                .offering(200, vec![boardwalk_id])
                .build(),
        )
        .await
        .unwrap();
    repos
        .trade_requests
        .create(
            &TradeRequestBuilder::new(game_id, q, p)
                .status(TradeStatus::Rejected)
                .build(),
        )
        .await
        .unwrap();

    let stored = repos.trade_requests.read(&offer).await.unwrap();
    assert_eq!(stored.offering_properties, vec![boardwalk_id]);
    assert!(stored.requesting_properties.is_empty());

    let page = Pagination::first_page(10).unwrap();
    let pending = TradeRequestFilter {
        status: Some(TradeStatus::Pending),
        ..Default::default()
    };
    let result = read_list_involving(&repos.trade_requests, p, &pending, &page, &page)
        .await
        .unwrap();
    assert_keys(&result.items, &[offer]);

    let all = read_list_involving(
        &repos.trade_requests,
        p,
        &TradeRequestFilter::default(),
        &page,
        &page,
    )
    .await
    .unwrap();
    assert_eq!(all.items.len(), 2);
    assert_unique_keys(&all.items);
});

db_test!(test_game_logs_by_game, |db| {
    let repos = db.repositories();
    let game_id = new_game(&repos).await;
    let at = chrono::Utc::now().with_nanosecond(123_456_789).unwrap();
    let log = GameLogBuilder::new(game_id)
        .player(PlayerId::new())
        .action("buy")
        .at(at)
        .build();
    let key = repos.game_logs.create(&log).await.unwrap();

    let stored = repos.game_logs.read(&key).await.unwrap();
    assert_eq!(stored.action, "buy");
    assert_eq!(stored.timestamp, at.with_nanosecond(123_456_000).unwrap());
    assert_eq!(stored.player_id, log.player_id);
});

db_test!(test_foreign_key_violation, |db| {
    let repos = db.repositories();
    let orphan = PlayerBuilder::new(GameId::new()).build();
    let err = repos.players.create(&orphan).await.unwrap_err();
    assert!(err.is_constraint_violation(), "unexpected error: {:?}", err);
});

db_test!(test_column_type_drift_is_type_mismatch, |db| {
    let repos = db.repositories();
    let game_id = new_game(&repos).await;
    let key = repos
        .players
        .create(&PlayerBuilder::new(game_id).build())
        .await
        .unwrap();

    sqlx::query("ALTER TABLE players ALTER COLUMN balance TYPE TEXT")
        .execute(db.pool())
        .await
        .unwrap();

    assert_type_mismatch(repos.players.read(&key).await);
});

db_test!(test_statement_timeout, |db| {
    let store = PgStore::new(db.pool().clone())
        .with_statement_timeout(Some(std::time::Duration::from_millis(200)));
    let mut tx = db.pool().begin().await.unwrap();
    sqlx::query("LOCK TABLE games IN ACCESS EXCLUSIVE MODE")
        .execute(&mut *tx)
        .await
        .unwrap();

    let repos = Repositories::over(
        std::sync::Arc::new(store),
        std::sync::Arc::new(test_utils::SteppingClock::default()),
    );
    let result = repos
        .games
        .read_list(&Pagination::first_page(1).unwrap(), &GameFilter::default())
        .await;
    assert!(matches!(result, Err(DatabaseError::Timeout(_))));

    tx.rollback().await.unwrap();
});
