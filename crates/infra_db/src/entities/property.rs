//! Properties
//!
//! A property row carries both the fixed board data (price and rent table)
//! and the mutable ownership state (owner, buildings, mortgage).

use core_kernel::{PlayerId, PropertyId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{id_key, key_id};
use crate::columns::{ColumnDef, ColumnKind, ColumnMap};
use crate::error::DatabaseError;
use crate::filter::{Condition, Filter, Query};
use crate::metadata::{CompositeKey, SoftDeleteMetadata};
use crate::repository::{Entity, EntityRepository, ID};
use crate::store::PgStore;

const NAME: &str = "name";
const COLOR_GROUP: &str = "color_group";
const PRICE: &str = "price";
const HOUSE_PRICE: &str = "house_price";
const HOTEL_PRICE: &str = "hotel_price";
const RENT: &str = "rent";
const RENT_WITH_COLOR_SET: &str = "rent_with_color_set";
const RENT_WITH_1_HOUSE: &str = "rent_with_1_house";
const RENT_WITH_2_HOUSES: &str = "rent_with_2_houses";
const RENT_WITH_3_HOUSES: &str = "rent_with_3_houses";
const RENT_WITH_4_HOUSES: &str = "rent_with_4_houses";
const RENT_WITH_HOTEL: &str = "rent_with_hotel";
const MORTGAGE_VALUE: &str = "mortgage_value";
const OWNER_ID: &str = "owner_id";
const HOUSES: &str = "houses";
const HAS_HOTEL: &str = "has_hotel";
const MORTGAGED: &str = "mortgaged";

const COLUMNS: &[ColumnDef] = &[
    ColumnDef::required(NAME, ColumnKind::Text),
    ColumnDef::required(COLOR_GROUP, ColumnKind::Text),
    ColumnDef::required(PRICE, ColumnKind::BigInt),
    ColumnDef::required(HOUSE_PRICE, ColumnKind::BigInt),
    ColumnDef::required(HOTEL_PRICE, ColumnKind::BigInt),
    ColumnDef::required(RENT, ColumnKind::BigInt),
    ColumnDef::required(RENT_WITH_COLOR_SET, ColumnKind::BigInt),
    ColumnDef::required(RENT_WITH_1_HOUSE, ColumnKind::BigInt),
    ColumnDef::required(RENT_WITH_2_HOUSES, ColumnKind::BigInt),
    ColumnDef::required(RENT_WITH_3_HOUSES, ColumnKind::BigInt),
    ColumnDef::required(RENT_WITH_4_HOUSES, ColumnKind::BigInt),
    ColumnDef::required(RENT_WITH_HOTEL, ColumnKind::BigInt),
    ColumnDef::required(MORTGAGE_VALUE, ColumnKind::BigInt),
    ColumnDef::nullable(OWNER_ID, ColumnKind::Uuid),
    ColumnDef::required(HOUSES, ColumnKind::BigInt),
    ColumnDef::required(HAS_HOTEL, ColumnKind::Bool),
    ColumnDef::required(MORTGAGED, ColumnKind::Bool),
];

/// Rent owed at each development level
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RentTable {
    pub base: i64,
    pub color_set: i64,
    pub one_house: i64,
    pub two_houses: i64,
    pub three_houses: i64,
    pub four_houses: i64,
    pub hotel: i64,
}

/// A purchasable board square
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Property {
    pub key: CompositeKey,
    pub metadata: SoftDeleteMetadata,
    pub name: String,
    pub color_group: String,
    pub price: i64,
    pub house_price: i64,
    pub hotel_price: i64,
    pub rent: RentTable,
    pub mortgage_value: i64,
    pub owner_id: Option<PlayerId>,
    pub houses: i64,
    pub has_hotel: bool,
    pub mortgaged: bool,
}

impl Property {
    /// An unowned, undeveloped property
    pub fn new(name: impl Into<String>, color_group: impl Into<String>, price: i64) -> Self {
        Self {
            key: CompositeKey::default(),
            metadata: SoftDeleteMetadata::default(),
            name: name.into(),
            color_group: color_group.into(),
            price,
            house_price: 0,
            hotel_price: 0,
            rent: RentTable::default(),
            mortgage_value: price / 2,
            owner_id: None,
            houses: 0,
            has_hotel: false,
            mortgaged: false,
        }
    }

    pub fn id(&self) -> PropertyId {
        PropertyId::from_uuid(key_id(&self.key))
    }

    pub fn with_key(mut self, key: CompositeKey) -> Self {
        self.key = key;
        self
    }

    pub fn with_rent(mut self, rent: RentTable) -> Self {
        self.rent = rent;
        self
    }

    pub fn with_building_prices(mut self, house_price: i64, hotel_price: i64) -> Self {
        self.house_price = house_price;
        self.hotel_price = hotel_price;
        self
    }
}

impl Entity for Property {
    const TABLE: &'static str = "properties";
    const NAME: &'static str = "property";

    fn columns() -> &'static [ColumnDef] {
        COLUMNS
    }

    fn key(&self) -> &CompositeKey {
        &self.key
    }

    fn metadata(&self) -> &SoftDeleteMetadata {
        &self.metadata
    }

    fn domain_columns(&self) -> ColumnMap {
        ColumnMap::new()
            .with(NAME, self.name.as_str())
            .with(COLOR_GROUP, self.color_group.as_str())
            .with(PRICE, self.price)
            .with(HOUSE_PRICE, self.house_price)
            .with(HOTEL_PRICE, self.hotel_price)
            .with(RENT, self.rent.base)
            .with(RENT_WITH_COLOR_SET, self.rent.color_set)
            .with(RENT_WITH_1_HOUSE, self.rent.one_house)
            .with(RENT_WITH_2_HOUSES, self.rent.two_houses)
            .with(RENT_WITH_3_HOUSES, self.rent.three_houses)
            .with(RENT_WITH_4_HOUSES, self.rent.four_houses)
            .with(RENT_WITH_HOTEL, self.rent.hotel)
            .with(MORTGAGE_VALUE, self.mortgage_value)
            .with(OWNER_ID, self.owner_id.map(Uuid::from))
            .with(HOUSES, self.houses)
            .with(HAS_HOTEL, self.has_hotel)
            .with(MORTGAGED, self.mortgaged)
    }

    fn from_parts(
        key: CompositeKey,
        metadata: SoftDeleteMetadata,
        columns: &ColumnMap,
    ) -> Result<Self, DatabaseError> {
        Ok(Self {
            key,
            metadata,
            name: columns.text(NAME)?,
            color_group: columns.text(COLOR_GROUP)?,
            price: columns.big_int(PRICE)?,
            house_price: columns.big_int(HOUSE_PRICE)?,
            hotel_price: columns.big_int(HOTEL_PRICE)?,
            rent: RentTable {
                base: columns.big_int(RENT)?,
                color_set: columns.big_int(RENT_WITH_COLOR_SET)?,
                one_house: columns.big_int(RENT_WITH_1_HOUSE)?,
                two_houses: columns.big_int(RENT_WITH_2_HOUSES)?,
                three_houses: columns.big_int(RENT_WITH_3_HOUSES)?,
                four_houses: columns.big_int(RENT_WITH_4_HOUSES)?,
                hotel: columns.big_int(RENT_WITH_HOTEL)?,
            },
            mortgage_value: columns.big_int(MORTGAGE_VALUE)?,
            owner_id: columns.opt_uuid(OWNER_ID)?.map(PlayerId::from_uuid),
            houses: columns.big_int(HOUSES)?,
            has_hotel: columns.bool(HAS_HOTEL)?,
            mortgaged: columns.bool(MORTGAGED)?,
        })
    }
}

/// Ownership constraint of a property listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ownership {
    /// Nobody owns the property (`owner_id IS NULL`)
    Unowned,
    OwnedBy(PlayerId),
}

/// Property listing filter
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PropertyFilter {
    pub ids: Option<Vec<Uuid>>,
    pub name: Option<String>,
    pub color_group: Option<String>,
    pub owner: Option<Ownership>,
    pub houses: Option<i64>,
    pub has_hotel: Option<bool>,
    pub mortgaged: Option<bool>,
}

impl PropertyFilter {
    pub fn owned_by(player_id: PlayerId) -> Self {
        Self {
            owner: Some(Ownership::OwnedBy(player_id)),
            ..Default::default()
        }
    }

    pub fn unowned() -> Self {
        Self {
            owner: Some(Ownership::Unowned),
            ..Default::default()
        }
    }
}

impl Filter for PropertyFilter {
    fn conditions(&self) -> Vec<Condition> {
        let query = Query::new()
            .in_list(ID, self.ids.as_deref())
            .eq_opt(NAME, self.name.clone())
            .eq_opt(COLOR_GROUP, self.color_group.clone());
        let query = match self.owner {
            Some(Ownership::Unowned) => query.is_null(OWNER_ID),
            Some(Ownership::OwnedBy(player_id)) => {
                query.and(Condition::eq(OWNER_ID, Uuid::from(player_id)))
            }
            None => query,
        };
        query
            .eq_opt(HOUSES, self.houses)
            .eq_opt(HAS_HOTEL, self.has_hotel)
            .eq_opt(MORTGAGED, self.mortgaged)
            .into_conditions()
    }
}

/// Repository of properties
pub type PropertyRepository<S = PgStore> = EntityRepository<Property, PropertyFilter, S>;

/// Key of an existing property
pub fn property_key(id: PropertyId) -> CompositeKey {
    id_key(id.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn boardwalk() -> Property {
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
            .with_key(property_key(PropertyId::new()))
    }

    #[test]
    fn test_round_trip() {
        let mut property = boardwalk();
        property.owner_id = Some(PlayerId::new());
        property.houses = 3;

        let columns = property.to_columns();
        assert_eq!(columns.len(), Property::schema().len());
        assert_eq!(Property::from_columns(&columns).unwrap(), property);
    }

    #[test]
    fn test_mortgage_value_defaults_to_half_price() {
        assert_eq!(boardwalk().mortgage_value, 200);
    }

    #[test]
    fn test_ownership_filter() {
        assert_eq!(
            PropertyFilter::unowned().conditions(),
            vec![Condition::is_null("owner_id")]
        );

        let owner = PlayerId::new();
        assert_eq!(
            PropertyFilter::owned_by(owner).conditions(),
            vec![Condition::eq("owner_id", Uuid::from(owner))]
        );
        assert!(PropertyFilter::default().conditions().is_empty());
    }

    #[test]
    fn test_ownership_from_json() {
        let owner = PlayerId::new();
        let json = serde_json::json!({ "owner": { "owned_by": owner } });
        let filter: PropertyFilter = serde_json::from_value(json).unwrap();
        assert_eq!(filter, PropertyFilter::owned_by(owner));

        let json = serde_json::json!({ "owner": "unowned", "houses": 0 });
        let filter: PropertyFilter = serde_json::from_value(json).unwrap();
        assert_eq!(filter.owner, Some(Ownership::Unowned));
        assert_eq!(filter.houses, Some(0));
    }
}
