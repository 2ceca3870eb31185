pub mod application;
pub mod auth;
pub mod config;
pub mod db;
pub mod domain;
pub mod errors;
pub mod handlers;
pub mod infrastructure;
pub mod models;
pub mod schema;

use actix_web::{middleware::Logger, web, App, HttpServer};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use application::orders::OrderService;
use auth::AuthConfig;
use infrastructure::DieselOrderStore;

pub use config::Config;
pub use db::{create_pool, DbPool};
pub use handlers::orders::ShopOrderService;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Run any pending Diesel migrations against the pool's database.
pub fn run_migrations(pool: &DbPool) {
    let mut conn = pool
        .get()
        .expect("Failed to get DB connection for migrations");
    conn.run_pending_migrations(MIGRATIONS)
        .expect("Failed to run database migrations");
}

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_token",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::clients::register,
        handlers::clients::login,
        handlers::clients::change_password,
        handlers::products::list_products,
        handlers::products::best_sellers,
        handlers::products::get_product,
        handlers::products::list_variants,
        handlers::cart::add_to_cart,
        handlers::cart::get_cart,
        handlers::cart::update_quantity,
        handlers::cart::remove_item,
        handlers::orders::place_order,
        handlers::orders::list_my_orders,
    ),
    components(schemas(
        handlers::clients::RegisterRequest,
        handlers::clients::RegisterResponse,
        handlers::clients::LoginRequest,
        handlers::clients::LoginResponse,
        handlers::clients::ClientSummary,
        handlers::clients::ChangePasswordRequest,
        handlers::products::ProductResponse,
        handlers::products::VariantResponse,
        handlers::products::BestSellerResponse,
        handlers::cart::AddToCartRequest,
        handlers::cart::UpdateQuantityRequest,
        handlers::cart::CartItemResponse,
        handlers::cart::CartResponse,
        handlers::orders::OrderLineDto,
        handlers::orders::PlaceOrderRequest,
        handlers::orders::PlaceOrderResponse,
        handlers::orders::OrderDetailResponse,
        handlers::orders::OrderResponse,
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "clients", description = "Registration, login, password"),
        (name = "products", description = "Catalog reads"),
        (name = "cart", description = "Shopping cart"),
        (name = "orders", description = "Order placement and history"),
    )
)]
struct ApiDoc;

/// Build and return an actix-web `Server` bound to the configured
/// host and port.
///
/// The caller is responsible for `.await`-ing (or `tokio::spawn`-ing)
/// the returned server.
pub fn build_server(pool: DbPool, config: &Config) -> std::io::Result<actix_web::dev::Server> {
    let auth_config = web::Data::new(AuthConfig::new(
        config.jwt_secret.clone(),
        config.jwt_expires_secs,
    ));
    let order_service = web::Data::new(OrderService::new(
        DieselOrderStore::new(pool.clone()),
        config.allow_empty_orders,
    ));
    let host = config.host.clone();
    let port = config.port;

    Ok(HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(pool.clone()))
            .app_data(auth_config.clone())
            .app_data(order_service.clone())
            .wrap(Logger::default())
            .service(
                web::scope("/api")
                    .service(
                        web::scope("/clients")
                            .route("/register", web::post().to(handlers::clients::register))
                            .route("/login", web::post().to(handlers::clients::login))
                            .route(
                                "/{id}/password",
                                web::put().to(handlers::clients::change_password),
                            ),
                    )
                    .service(
                        web::scope("/products")
                            .route("", web::get().to(handlers::products::list_products))
                            .route(
                                "/best-sellers",
                                web::get().to(handlers::products::best_sellers),
                            )
                            .route("/{id}", web::get().to(handlers::products::get_product))
                            .route(
                                "/{id}/variants",
                                web::get().to(handlers::products::list_variants),
                            ),
                    )
                    .service(
                        web::scope("/cart")
                            .route("/add", web::post().to(handlers::cart::add_to_cart))
                            .route("/{client_id}", web::get().to(handlers::cart::get_cart))
                            .route(
                                "/{product_id}",
                                web::put().to(handlers::cart::update_quantity),
                            )
                            .route(
                                "/{product_id}",
                                web::delete().to(handlers::cart::remove_item),
                            ),
                    )
                    .service(
                        web::scope("/orders")
                            .route("", web::post().to(handlers::orders::place_order))
                            .route("", web::get().to(handlers::orders::list_my_orders)),
                    ),
            )
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-docs/openapi.json", ApiDoc::openapi()),
            )
    })
    .bind((host, port))?
    .run())
}
