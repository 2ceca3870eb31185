use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::schema::cart_items;

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Selectable, Identifiable)]
#[diesel(table_name = cart_items)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CartItem {
    pub id: Uuid,
    pub client_id: Uuid,
    pub product_id: Uuid,
    pub weight_grams: i32,
    pub quantity: i32,
    pub unit_price: BigDecimal,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = cart_items)]
pub struct NewCartItem {
    pub id: Uuid,
    pub client_id: Uuid,
    pub product_id: Uuid,
    pub weight_grams: i32,
    pub quantity: i32,
    pub unit_price: BigDecimal,
}
