use actix_web::{web, HttpResponse};
use diesel::prelude::*;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::db::DbPool;
use crate::errors::AppError;
use crate::models::product::{Product, ProductVariant};
use crate::schema::{product_variants, products};

// ── Response DTOs ────────────────────────────────────────────────────────────

#[derive(Debug, Serialize, ToSchema)]
pub struct ProductResponse {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub image: Option<String>,
    /// Decimal price as a string to avoid floating-point issues, e.g. "9.99"
    pub price: String,
    pub created_at: String,
}

impl From<Product> for ProductResponse {
    fn from(p: Product) -> Self {
        Self {
            id: p.id,
            name: p.name,
            description: p.description,
            image: p.image,
            price: p.price.to_string(),
            created_at: p.created_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct VariantResponse {
    pub weight_grams: i32,
    pub price: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BestSellerResponse {
    pub product_id: Uuid,
    pub name: String,
    pub image: Option<String>,
    pub weight_grams: i32,
    pub price: String,
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// GET /api/products
#[utoipa::path(
    get,
    path = "/api/products",
    responses(
        (status = 200, description = "All products", body = [ProductResponse]),
        (status = 500, description = "Internal server error"),
    ),
    tag = "products"
)]
pub async fn list_products(pool: web::Data<DbPool>) -> Result<HttpResponse, AppError> {
    let rows = web::block(move || {
        let mut conn = pool.get()?;

        let rows = products::table
            .order(products::created_at.desc())
            .select(Product::as_select())
            .load(&mut conn)?;

        Ok::<_, AppError>(rows)
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    let items: Vec<ProductResponse> = rows.into_iter().map(ProductResponse::from).collect();
    Ok(HttpResponse::Ok().json(items))
}

/// GET /api/products/best-sellers
///
/// The storefront landing query: the first six (product, weight
/// variant) pairs.
#[utoipa::path(
    get,
    path = "/api/products/best-sellers",
    responses(
        (status = 200, description = "Best sellers", body = [BestSellerResponse]),
        (status = 500, description = "Internal server error"),
    ),
    tag = "products"
)]
pub async fn best_sellers(pool: web::Data<DbPool>) -> Result<HttpResponse, AppError> {
    let rows = web::block(move || {
        let mut conn = pool.get()?;

        let rows: Vec<(Product, ProductVariant)> = products::table
            .inner_join(product_variants::table)
            .limit(6)
            .select((Product::as_select(), ProductVariant::as_select()))
            .load(&mut conn)?;

        Ok::<_, AppError>(rows)
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    let items: Vec<BestSellerResponse> = rows
        .into_iter()
        .map(|(product, variant)| BestSellerResponse {
            product_id: product.id,
            name: product.name,
            image: product.image,
            weight_grams: variant.weight_grams,
            price: variant.price.to_string(),
        })
        .collect();
    Ok(HttpResponse::Ok().json(items))
}

/// GET /api/products/{id}
#[utoipa::path(
    get,
    path = "/api/products/{id}",
    params(
        ("id" = Uuid, Path, description = "Product UUID"),
    ),
    responses(
        (status = 200, description = "Product found", body = ProductResponse),
        (status = 404, description = "Product not found"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "products"
)]
pub async fn get_product(
    pool: web::Data<DbPool>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let product_id = path.into_inner();

    let product = web::block(move || {
        let mut conn = pool.get()?;

        let product = products::table
            .filter(products::id.eq(product_id))
            .select(Product::as_select())
            .first(&mut conn)
            .optional()?;

        Ok::<_, AppError>(product)
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    match product {
        Some(product) => Ok(HttpResponse::Ok().json(ProductResponse::from(product))),
        None => Err(AppError::NotFound(format!("product {product_id}"))),
    }
}

/// GET /api/products/{id}/variants
///
/// The weight variants of one product; an unknown product yields an
/// empty list.
#[utoipa::path(
    get,
    path = "/api/products/{id}/variants",
    params(
        ("id" = Uuid, Path, description = "Product UUID"),
    ),
    responses(
        (status = 200, description = "Weight variants", body = [VariantResponse]),
        (status = 500, description = "Internal server error"),
    ),
    tag = "products"
)]
pub async fn list_variants(
    pool: web::Data<DbPool>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let product_id = path.into_inner();

    let rows = web::block(move || {
        let mut conn = pool.get()?;

        let rows = product_variants::table
            .filter(product_variants::product_id.eq(product_id))
            .order(product_variants::weight_grams.asc())
            .select(ProductVariant::as_select())
            .load(&mut conn)?;

        Ok::<_, AppError>(rows)
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    let items: Vec<VariantResponse> = rows
        .into_iter()
        .map(|v| VariantResponse {
            weight_grams: v.weight_grams,
            price: v.price.to_string(),
        })
        .collect();
    Ok(HttpResponse::Ok().json(items))
}
