use actix_web::{web, HttpResponse};
use bigdecimal::BigDecimal;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::db::DbPool;
use crate::errors::AppError;
use crate::models::cart_item::{CartItem, NewCartItem};
use crate::schema::{cart_items, products};

// ── Request / response DTOs ──────────────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddToCartRequest {
    /// Absent for anonymous visitors; their cart lives client-side.
    pub client_id: Option<Uuid>,
    pub product_id: Uuid,
    pub weight_grams: i32,
    pub quantity: i32,
    /// Decimal price as a string to avoid floating-point issues, e.g. "12.50"
    pub unit_price: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateQuantityRequest {
    pub client_id: Uuid,
    pub quantity: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RemoveItemParams {
    pub client_id: Uuid,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartItemResponse {
    pub id: Uuid,
    pub product_id: Uuid,
    pub name: String,
    pub image: Option<String>,
    pub weight_grams: i32,
    pub quantity: i32,
    pub unit_price: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartResponse {
    pub items: Vec<CartItemResponse>,
    pub total: String,
    pub count: usize,
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// POST /api/cart/add
///
/// Adds a product to a client's cart. The cart is keyed by (client,
/// product, weight variant): an existing row gets its quantity
/// increased, otherwise a new row is inserted. Without a client id the
/// item is echoed back for client-side storage.
#[utoipa::path(
    post,
    path = "/api/cart/add",
    request_body = AddToCartRequest,
    responses(
        (status = 200, description = "Quantity increased, or anonymous item echoed back"),
        (status = 201, description = "Item added to the cart"),
        (status = 400, description = "Malformed price or quantity"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "cart"
)]
pub async fn add_to_cart(
    pool: web::Data<DbPool>,
    body: web::Json<AddToCartRequest>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();

    if body.quantity <= 0 {
        return Err(AppError::Validation("quantity must be positive".to_string()));
    }
    let unit_price = BigDecimal::from_str(&body.unit_price)
        .map_err(|e| AppError::Validation(format!("invalid unit_price '{}': {}", body.unit_price, e)))?;

    let Some(client_id) = body.client_id else {
        return Ok(HttpResponse::Ok().json(json!({
            "message": "item kept in local cart",
            "item": {
                "product_id": body.product_id,
                "weight_grams": body.weight_grams,
                "quantity": body.quantity,
                "unit_price": body.unit_price,
            }
        })));
    };

    let (created, cart_item_id) = web::block(move || {
        let mut conn = pool.get()?;

        let existing: Option<(Uuid, i32)> = cart_items::table
            .filter(cart_items::client_id.eq(client_id))
            .filter(cart_items::product_id.eq(body.product_id))
            .filter(cart_items::weight_grams.eq(body.weight_grams))
            .select((cart_items::id, cart_items::quantity))
            .first(&mut conn)
            .optional()?;

        match existing {
            Some((id, quantity)) => {
                diesel::update(cart_items::table.filter(cart_items::id.eq(id)))
                    .set(cart_items::quantity.eq(quantity + body.quantity))
                    .execute(&mut conn)?;
                Ok::<_, AppError>((false, id))
            }
            None => {
                let id = Uuid::new_v4();
                diesel::insert_into(cart_items::table)
                    .values(&NewCartItem {
                        id,
                        client_id,
                        product_id: body.product_id,
                        weight_grams: body.weight_grams,
                        quantity: body.quantity,
                        unit_price,
                    })
                    .execute(&mut conn)?;
                Ok::<_, AppError>((true, id))
            }
        }
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    let response = json!({
        "message": if created { "item added to cart" } else { "cart quantity updated" },
        "cart_item_id": cart_item_id,
    });
    if created {
        Ok(HttpResponse::Created().json(response))
    } else {
        Ok(HttpResponse::Ok().json(response))
    }
}

/// GET /api/cart/{client_id}
///
/// The client's cart joined with product names and images, plus the
/// running total.
#[utoipa::path(
    get,
    path = "/api/cart/{client_id}",
    params(
        ("client_id" = Uuid, Path, description = "Client UUID"),
    ),
    responses(
        (status = 200, description = "Cart contents", body = CartResponse),
        (status = 500, description = "Internal server error"),
    ),
    tag = "cart"
)]
pub async fn get_cart(
    pool: web::Data<DbPool>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let client_id = path.into_inner();

    let rows = web::block(move || {
        let mut conn = pool.get()?;

        let rows: Vec<(CartItem, String, Option<String>)> = cart_items::table
            .inner_join(products::table)
            .filter(cart_items::client_id.eq(client_id))
            .select((CartItem::as_select(), products::name, products::image))
            .load(&mut conn)?;

        Ok::<_, AppError>(rows)
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    let total = rows.iter().fold(BigDecimal::from(0), |acc, (item, _, _)| {
        acc + &item.unit_price * BigDecimal::from(item.quantity)
    });
    let items: Vec<CartItemResponse> = rows
        .into_iter()
        .map(|(item, name, image)| CartItemResponse {
            id: item.id,
            product_id: item.product_id,
            name,
            image,
            weight_grams: item.weight_grams,
            quantity: item.quantity,
            unit_price: item.unit_price.to_string(),
        })
        .collect();

    Ok(HttpResponse::Ok().json(CartResponse {
        count: items.len(),
        total: total.to_string(),
        items,
    }))
}

/// PUT /api/cart/{product_id}
///
/// Sets the quantity of one cart row.
#[utoipa::path(
    put,
    path = "/api/cart/{product_id}",
    params(
        ("product_id" = Uuid, Path, description = "Product UUID"),
    ),
    request_body = UpdateQuantityRequest,
    responses(
        (status = 200, description = "Quantity updated"),
        (status = 400, description = "Non-positive quantity"),
        (status = 404, description = "Item not in the cart"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "cart"
)]
pub async fn update_quantity(
    pool: web::Data<DbPool>,
    path: web::Path<Uuid>,
    body: web::Json<UpdateQuantityRequest>,
) -> Result<HttpResponse, AppError> {
    let product_id = path.into_inner();
    let body = body.into_inner();

    if body.quantity <= 0 {
        return Err(AppError::Validation("quantity must be positive".to_string()));
    }

    let updated = web::block(move || {
        let mut conn = pool.get()?;

        let updated = diesel::update(
            cart_items::table
                .filter(cart_items::product_id.eq(product_id))
                .filter(cart_items::client_id.eq(body.client_id)),
        )
        .set(cart_items::quantity.eq(body.quantity))
        .execute(&mut conn)?;

        Ok::<_, AppError>(updated)
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    if updated == 0 {
        return Err(AppError::NotFound("cart item".to_string()));
    }
    Ok(HttpResponse::Ok().json(json!({ "message": "quantity updated" })))
}

/// DELETE /api/cart/{product_id}?client_id=...
#[utoipa::path(
    delete,
    path = "/api/cart/{product_id}",
    params(
        ("product_id" = Uuid, Path, description = "Product UUID"),
        ("client_id" = Uuid, Query, description = "Client UUID"),
    ),
    responses(
        (status = 200, description = "Item removed"),
        (status = 404, description = "Item not in the cart"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "cart"
)]
pub async fn remove_item(
    pool: web::Data<DbPool>,
    path: web::Path<Uuid>,
    query: web::Query<RemoveItemParams>,
) -> Result<HttpResponse, AppError> {
    let product_id = path.into_inner();
    let client_id = query.into_inner().client_id;

    let deleted = web::block(move || {
        let mut conn = pool.get()?;

        let deleted = diesel::delete(
            cart_items::table
                .filter(cart_items::product_id.eq(product_id))
                .filter(cart_items::client_id.eq(client_id)),
        )
        .execute(&mut conn)?;

        Ok::<_, AppError>(deleted)
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    if deleted == 0 {
        return Err(AppError::NotFound("cart item".to_string()));
    }
    Ok(HttpResponse::Ok().json(json!({ "message": "item removed from cart" })))
}
