//! Test Data Builders
//!
//! Provides builder patterns for constructing entities with sensible
//! defaults. Names and descriptions are filled with fake data, so tests
//! only spell out the fields they assert on.

use chrono::{DateTime, Utc};
use core_kernel::{GameId, PlayerId};
use fake::faker::lorem::en::Sentence;
use fake::faker::name::en::Name;
use fake::Fake;
use infra_db::{
    GameLog, GameStatus, Player, Property, RentTable, TradeRequest, TradeStatus, Game,
};
use uuid::Uuid;

use crate::fixtures::TemporalFixtures;

/// Builder for games
#[derive(Debug, Clone)]
pub struct GameBuilder {
    game: Game,
}

impl Default for GameBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl GameBuilder {
    pub fn new() -> Self {
        let name: String = Sentence(2..4).fake();
        Self {
            game: Game::new(name),
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.game.name = name.into();
        self
    }

    pub fn status(mut self, status: GameStatus) -> Self {
        self.game.status = status;
        self
    }

    pub fn current_player(mut self, player_id: PlayerId) -> Self {
        self.game.current_player_id = Some(player_id);
        self
    }

    pub fn winner(mut self, player_id: PlayerId) -> Self {
        self.game.winner_id = Some(player_id);
        self.game.status = GameStatus::Finished;
        self
    }

    pub fn build(self) -> Game {
        self.game
    }
}

/// Builder for players
#[derive(Debug, Clone)]
pub struct PlayerBuilder {
    player: Player,
}

impl PlayerBuilder {
    /// Starts a player with a fake name in the given game
    pub fn new(game_id: GameId) -> Self {
        let name: String = Name().fake();
        Self {
            player: Player::new(game_id, name),
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.player.name = name.into();
        self
    }

    pub fn balance(mut self, balance: i64) -> Self {
        self.player.balance = balance;
        self
    }

    pub fn position(mut self, position: i64) -> Self {
        self.player.position = position;
        self
    }

    /// Sends the player to jail for the given number of turns
    pub fn jailed(mut self, turns: i64) -> Self {
        self.player.in_jail = true;
        self.player.jail_turns = turns;
        self
    }

    pub fn bankrupt(mut self) -> Self {
        self.player.bankrupt = true;
        self.player.balance = 0;
        self
    }

    pub fn build(self) -> Player {
        self.player
    }
}

/// Builder for properties
#[derive(Debug, Clone)]
pub struct PropertyBuilder {
    property: Property,
}

impl Default for PropertyBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl PropertyBuilder {
    /// Starts from a mid-priced orange property
    pub fn new() -> Self {
        Self {
            property: Property::new("St. James Place", "orange", 180)
                .with_building_prices(100, 100)
                .with_rent(RentTable {
                    base: 14,
                    color_set: 28,
                    one_house: 70,
                    two_houses: 200,
                    three_houses: 550,
                    four_houses: 750,
                    hotel: 950,
                }),
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.property.name = name.into();
        self
    }

    pub fn color_group(mut self, color_group: impl Into<String>) -> Self {
        self.property.color_group = color_group.into();
        self
    }

    pub fn owner(mut self, owner_id: PlayerId) -> Self {
        self.property.owner_id = Some(owner_id);
        self
    }

    pub fn houses(mut self, houses: i64) -> Self {
        self.property.houses = houses;
        self
    }

    pub fn hotel(mut self) -> Self {
        self.property.houses = 0;
        self.property.has_hotel = true;
        self
    }

    pub fn mortgaged(mut self) -> Self {
        self.property.mortgaged = true;
        self
    }

    pub fn build(self) -> Property {
        self.property
    }
}

/// Builder for trade requests
#[derive(Debug, Clone)]
pub struct TradeRequestBuilder {
    trade: TradeRequest,
}

impl TradeRequestBuilder {
    pub fn new(game_id: GameId, sender_id: PlayerId, receiver_id: PlayerId) -> Self {
        Self {
            trade: TradeRequest::new(game_id, sender_id, receiver_id),
        }
    }

    pub fn offering(mut self, money: i64, properties: Vec<Uuid>) -> Self {
        self.trade.offering_money = money;
        self.trade.offering_properties = properties;
        self
    }

    pub fn requesting(mut self, money: i64, properties: Vec<Uuid>) -> Self {
        self.trade.requesting_money = money;
        self.trade.requesting_properties = properties;
        self
    }

    pub fn status(mut self, status: TradeStatus) -> Self {
        self.trade.status = status;
        self
    }

    pub fn build(self) -> TradeRequest {
        self.trade
    }
}

/// Builder for game log entries
#[derive(Debug, Clone)]
pub struct GameLogBuilder {
    log: GameLog,
}

impl GameLogBuilder {
    /// Starts a player-less entry at the fixture game start time
    pub fn new(game_id: GameId) -> Self {
        let description: String = Sentence(3..8).fake();
        Self {
            log: GameLog::new(
                game_id,
                None,
                "event",
                description,
                TemporalFixtures::game_start(),
            ),
        }
    }

    pub fn player(mut self, player_id: PlayerId) -> Self {
        self.log.player_id = Some(player_id);
        self
    }

    pub fn action(mut self, action: impl Into<String>) -> Self {
        self.log.action = action.into();
        self
    }

    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.log.timestamp = timestamp;
        self
    }

    pub fn build(self) -> GameLog {
        self.log
    }
}
