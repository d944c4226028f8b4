//! Property-based tests for paging and entity persistence

use core_kernel::GameId;
use infra_db::{
    Cursor, DatabaseError, GameFilter, PageRequest, Pagination, PlayerFilter, Repository,
    TradeRequestFilter,
};
use proptest::prelude::*;
use test_utils::{
    assert_keys, assert_unique_keys, game_status_strategy, offset_strategy, page_size_strategy,
    player_id_strategy, player_strategy, trade_status_strategy, GameBuilder, Repositories,
    TradeRequestBuilder,
};

fn block_on<F: std::future::Future>(future: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .build()
        .expect("Failed to build runtime")
        .block_on(future)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn cursor_tokens_decode_to_the_same_offset(offset in offset_strategy()) {
        let cursor = Cursor::new(offset);
        prop_assert_eq!(Cursor::decode_token(&cursor.encode_token()).unwrap(), cursor);
    }

    #[test]
    fn edited_cursor_bytes_never_decode(
        offset in offset_strategy(),
        position in 0usize..9,
        mask in 1u8..=255
    ) {
        let mut bytes = Cursor::new(offset).to_bytes();
        bytes[position] ^= mask;
        prop_assert!(matches!(
            Cursor::from_bytes(&bytes),
            Err(DatabaseError::TokenDecode(_))
        ));
    }

    #[test]
    fn page_size_is_clamped(size in 1u32..10_000, max in page_size_strategy()) {
        let size = size.to_string();
        let page = PageRequest::parse(None, Some(&size), max).unwrap();
        prop_assert!(page.limit() <= max);
        prop_assert!(page.limit() >= 1);
    }

    #[test]
    fn walking_pages_visits_every_row_once(count in 0usize..12, size in page_size_strategy()) {
        block_on(async {
            let repos = Repositories::in_memory();
            let mut created = Vec::new();
            for _ in 0..count {
                created.push(repos.games.create(&GameBuilder::new().build()).await.unwrap());
            }

            let filter = GameFilter::default();
            let mut seen = Vec::new();
            let mut pages = 0;
            let mut page = Pagination::first_page(size).unwrap();
            loop {
                let (games, next) = repos.games.read_list(&page, &filter).await.unwrap();
                pages += 1;
                assert!(games.len() <= size as usize);
                seen.extend(games);
                match next {
                    Some(cursor) => page = Pagination::after(cursor, size).unwrap(),
                    None => break,
                }
            }

            assert_unique_keys(&seen);
            let keys: Vec<_> = seen.iter().map(|g| g.key.clone()).collect();
            assert_eq!(keys, created);
            let expected_pages = count.div_ceil(size as usize).max(1);
            assert_eq!(pages, expected_pages);
        });
    }

    #[test]
    fn players_read_back_as_written(player in player_strategy()) {
        block_on(async {
            let repos = Repositories::in_memory();
            let key = repos.players.create(&player).await.unwrap();
            let stored = repos.players.read(&key).await.unwrap();

            let mut expected = player.clone().with_key(key);
            expected.metadata = stored.metadata;
            assert_eq!(stored, expected);
        });
    }

    #[test]
    fn jail_filter_partitions_players(players in prop::collection::vec(player_strategy(), 0..8)) {
        block_on(async {
            let repos = Repositories::in_memory();
            for player in &players {
                repos.players.create(player).await.unwrap();
            }

            let page = Pagination::first_page(50).unwrap();
            let mut total = 0;
            for in_jail in [true, false] {
                let filter = PlayerFilter {
                    in_jail: Some(in_jail),
                    ..Default::default()
                };
                let (found, _) = repos.players.read_list(&page, &filter).await.unwrap();
                assert!(found.iter().all(|p| p.in_jail == in_jail));
                total += found.len();
            }
            assert_eq!(total, players.len());
        });
    }

    #[test]
    fn game_status_filter_matches_stored_status(
        status in game_status_strategy(),
        wanted in game_status_strategy()
    ) {
        block_on(async {
            let repos = Repositories::in_memory();
            let key = repos
                .games
                .create(&GameBuilder::new().status(status).build())
                .await
                .unwrap();

            let filter = GameFilter {
                status: Some(wanted),
                ..Default::default()
            };
            let page = Pagination::first_page(5).unwrap();
            let (games, _) = repos.games.read_list(&page, &filter).await.unwrap();
            if status == wanted {
                assert_keys(&games, &[key]);
            } else {
                assert!(games.is_empty());
            }
        });
    }

    #[test]
    fn trade_filters_combine_with_and(
        sender in player_id_strategy(),
        receiver in player_id_strategy(),
        status in trade_status_strategy()
    ) {
        block_on(async {
            let repos = Repositories::in_memory();
            let trade = TradeRequestBuilder::new(GameId::new(), sender, receiver)
                .status(status)
                .build();
            let key = repos.trade_requests.create(&trade).await.unwrap();

            let page = Pagination::first_page(5).unwrap();
            let matching = TradeRequestFilter {
                sender_id: Some(sender),
                status: Some(status),
                ..Default::default()
            };
            let (found, _) = repos.trade_requests.read_list(&page, &matching).await.unwrap();
            assert_keys(&found, &[key]);

            let narrowed = TradeRequestFilter {
                game_id: Some(GameId::new()),
                ..matching
            };
            let (found, _) = repos.trade_requests.read_list(&page, &narrowed).await.unwrap();
            assert!(found.is_empty());
        });
    }
}
