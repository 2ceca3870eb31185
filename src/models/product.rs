use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::schema::{product_variants, products};

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Selectable, Identifiable)]
#[diesel(table_name = products)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub image: Option<String>,
    pub price: BigDecimal,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = products)]
pub struct NewProduct {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub image: Option<String>,
    pub price: BigDecimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Selectable, Identifiable, Associations)]
#[diesel(table_name = product_variants)]
#[diesel(belongs_to(Product))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ProductVariant {
    pub id: Uuid,
    pub product_id: Uuid,
    pub weight_grams: i32,
    pub price: BigDecimal,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = product_variants)]
pub struct NewProductVariant {
    pub id: Uuid,
    pub product_id: Uuid,
    pub weight_grams: i32,
    pub price: BigDecimal,
}
