use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::schema::order_details;

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Selectable, Identifiable, Associations)]
#[diesel(table_name = order_details)]
#[diesel(belongs_to(crate::models::order::Order))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OrderDetail {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = order_details)]
pub struct NewOrderDetail {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
}
