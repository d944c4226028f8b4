//! Property-Based Test Generators
//!
//! Provides proptest strategies for identifiers, page parameters and
//! entities that satisfy the column schemas.

use core_kernel::{GameId, PlayerId};
use infra_db::{GameStatus, Player, TradeStatus};
use proptest::prelude::*;
use uuid::Uuid;

/// Strategy for arbitrary 128-bit identifiers, including nil and max
pub fn uuid_strategy() -> impl Strategy<Value = Uuid> {
    prop_oneof![
        1 => Just(Uuid::nil()),
        1 => Just(Uuid::from_u128(u128::MAX)),
        8 => any::<u128>().prop_map(Uuid::from_u128),
    ]
}

/// Strategy for game statuses
pub fn game_status_strategy() -> impl Strategy<Value = GameStatus> {
    prop_oneof![
        Just(GameStatus::Waiting),
        Just(GameStatus::InProgress),
        Just(GameStatus::Finished),
    ]
}

/// Strategy for trade statuses
pub fn trade_status_strategy() -> impl Strategy<Value = TradeStatus> {
    prop_oneof![
        Just(TradeStatus::Pending),
        Just(TradeStatus::Accepted),
        Just(TradeStatus::Rejected),
        Just(TradeStatus::Cancelled),
    ]
}

/// Strategy for valid page sizes
pub fn page_size_strategy() -> impl Strategy<Value = u32> {
    1u32..=50
}

/// Strategy for cursor offsets that leave room for one more page
pub fn offset_strategy() -> impl Strategy<Value = u32> {
    0u32..=(u32::MAX / 2)
}

/// Strategy for players with arbitrary game state
pub fn player_strategy() -> impl Strategy<Value = Player> {
    (
        "[A-Z][a-z]{1,11}",
        -5_000i64..20_000,
        0i64..40,
        any::<bool>(),
        0i64..3,
        any::<bool>(),
    )
        .prop_map(|(name, balance, position, in_jail, jail_turns, bankrupt)| {
            let mut player = Player::new(GameId::new(), name);
            player.balance = balance;
            player.position = position;
            player.in_jail = in_jail;
            player.jail_turns = jail_turns;
            player.bankrupt = bankrupt;
            player
        })
}

/// Strategy for typed player identifiers
pub fn player_id_strategy() -> impl Strategy<Value = PlayerId> {
    uuid_strategy().prop_map(PlayerId::from_uuid)
}
