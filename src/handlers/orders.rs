use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::application::orders::OrderService;
use crate::auth::Claims;
use crate::domain::order::{OrderLineRequest, OrderView};
use crate::errors::AppError;
use crate::infrastructure::DieselOrderStore;

/// The concrete workflow wired into the HTTP layer.
pub type ShopOrderService = OrderService<DieselOrderStore>;

// ── Request / response DTOs ──────────────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
pub struct OrderLineDto {
    pub product_id: Uuid,
    pub quantity: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct PlaceOrderRequest {
    pub client_id: Uuid,
    pub lines: Vec<OrderLineDto>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PlaceOrderResponse {
    pub order_id: Uuid,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderDetailResponse {
    pub product_id: Uuid,
    pub quantity: i32,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderResponse {
    pub id: Uuid,
    pub client_id: Uuid,
    /// Decimal total as a string to avoid floating-point issues, e.g. "42.50"
    pub total: String,
    pub status: String,
    pub created_at: String,
    pub details: Vec<OrderDetailResponse>,
}

impl From<OrderView> for OrderResponse {
    fn from(order: OrderView) -> Self {
        Self {
            id: order.id,
            client_id: order.client_id,
            total: order.total.to_string(),
            status: order.status,
            created_at: order.created_at.to_rfc3339(),
            details: order
                .details
                .into_iter()
                .map(|d| OrderDetailResponse {
                    product_id: d.product_id,
                    quantity: d.quantity,
                })
                .collect(),
        }
    }
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// POST /api/orders
///
/// Submits an order. Every line is priced against the catalog before
/// anything is written; the order header and its detail rows are then
/// persisted, and a partial write is reported as such rather than
/// answered with a success.
#[utoipa::path(
    post,
    path = "/api/orders",
    request_body = PlaceOrderRequest,
    responses(
        (status = 201, description = "Order placed", body = PlaceOrderResponse),
        (status = 400, description = "Empty order, bad quantity, or unknown client"),
        (status = 404, description = "A referenced product does not exist"),
        (status = 500, description = "Store failure, or partial write (body lists failed lines)"),
    ),
    tag = "orders"
)]
pub async fn place_order(
    service: web::Data<ShopOrderService>,
    body: web::Json<PlaceOrderRequest>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();
    let lines: Vec<OrderLineRequest> = body
        .lines
        .into_iter()
        .map(|l| OrderLineRequest {
            product_id: l.product_id,
            quantity: l.quantity,
        })
        .collect();

    let placed = web::block(move || service.place_order(body.client_id, lines))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
        .map_err(AppError::from)?;

    Ok(HttpResponse::Created().json(PlaceOrderResponse {
        order_id: placed.order_id,
    }))
}

/// GET /api/orders
///
/// The authenticated client's orders, newest first, with their detail
/// rows.
#[utoipa::path(
    get,
    path = "/api/orders",
    responses(
        (status = 200, description = "The client's orders", body = [OrderResponse]),
        (status = 401, description = "Invalid or expired token"),
        (status = 403, description = "Missing token"),
        (status = 500, description = "Internal server error"),
    ),
    security(("bearer_token" = [])),
    tag = "orders"
)]
pub async fn list_my_orders(
    service: web::Data<ShopOrderService>,
    claims: Claims,
) -> Result<HttpResponse, AppError> {
    let client_id = claims.sub;

    let orders = web::block(move || service.orders_for_client(client_id))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
        .map_err(AppError::from)?;

    let items: Vec<OrderResponse> = orders.into_iter().map(OrderResponse::from).collect();
    Ok(HttpResponse::Ok().json(items))
}
