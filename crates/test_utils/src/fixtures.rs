//! Pre-built Test Fixtures
//!
//! Provides board data, fixed instants and ready-wired repository sets.

use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use infra_db::{
    Clock, GameLogRepository, GameRepository, MemoryStore, PlayerRepository, Property,
    PropertyRepository, RentTable, Store, TradeRequestRepository,
};

use crate::clock::SteppingClock;

/// Fixture for temporal test data
pub struct TemporalFixtures;

impl TemporalFixtures {
    /// Start of the fixture game (Jan 1, 2024, 18:00 UTC)
    pub fn game_start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 18, 0, 0)
            .single()
            .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
    }

    /// An instant `minutes` into the fixture game
    pub fn minutes_in(minutes: i64) -> DateTime<Utc> {
        Self::game_start() + Duration::minutes(minutes)
    }
}

/// Fixture for classic board properties
pub struct BoardFixtures;

impl BoardFixtures {
    pub fn mediterranean_avenue() -> Property {
        Property::new("Mediterranean Avenue", "brown", 60)
            .with_building_prices(50, 50)
            .with_rent(RentTable {
                base: 2,
                color_set: 4,
                one_house: 10,
                two_houses: 30,
                three_houses: 90,
                four_houses: 160,
                hotel: 250,
            })
    }

    pub fn baltic_avenue() -> Property {
        Property::new("Baltic Avenue", "brown", 60)
            .with_building_prices(50, 50)
            .with_rent(RentTable {
                base: 4,
                color_set: 8,
                one_house: 20,
                two_houses: 60,
                three_houses: 180,
                four_houses: 320,
                hotel: 450,
            })
    }

    pub fn park_place() -> Property {
        Property::new("Park Place", "dark_blue", 350)
            .with_building_prices(200, 200)
            .with_rent(RentTable {
                base: 35,
                color_set: 70,
                one_house: 175,
                two_houses: 500,
                three_houses: 1100,
                four_houses: 1300,
                hotel: 1500,
            })
    }

    pub fn boardwalk() -> Property {
        Property::new("Boardwalk", "dark_blue", 400)
            .with_building_prices(200, 200)
            .with_rent(RentTable {
                base: 50,
                color_set: 100,
                one_house: 200,
                two_houses: 600,
                three_houses: 1400,
                four_houses: 1700,
                hotel: 2000,
            })
    }

    /// The four properties above, in board order
    pub fn all() -> Vec<Property> {
        vec![
            Self::mediterranean_avenue(),
            Self::baltic_avenue(),
            Self::park_place(),
            Self::boardwalk(),
        ]
    }
}

/// One repository per entity, sharing a store and a clock
pub struct Repositories<S: Store> {
    pub store: Arc<S>,
    pub games: GameRepository<S>,
    pub players: PlayerRepository<S>,
    pub properties: PropertyRepository<S>,
    pub trade_requests: TradeRequestRepository<S>,
    pub game_logs: GameLogRepository<S>,
}

impl<S: Store> Repositories<S> {
    /// Wires every repository to the given store and clock
    pub fn over(store: Arc<S>, clock: Arc<dyn Clock>) -> Self {
        Self {
            games: GameRepository::from_arc(Arc::clone(&store)).with_clock(Arc::clone(&clock)),
            players: PlayerRepository::from_arc(Arc::clone(&store)).with_clock(Arc::clone(&clock)),
            properties: PropertyRepository::from_arc(Arc::clone(&store))
                .with_clock(Arc::clone(&clock)),
            trade_requests: TradeRequestRepository::from_arc(Arc::clone(&store))
                .with_clock(Arc::clone(&clock)),
            game_logs: GameLogRepository::from_arc(Arc::clone(&store)).with_clock(clock),
            store,
        }
    }
}

impl Repositories<MemoryStore> {
    /// Repositories over a fresh in-memory store and a stepping clock
    pub fn in_memory() -> Self {
        Self::over(
            Arc::new(MemoryStore::new()),
            Arc::new(SteppingClock::default()),
        )
    }
}
