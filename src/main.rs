// src/main.rs
use actix_web::{App, HttpResponse, HttpServer, Responder, web};
use dotenvy::dotenv;
use sqlx::PgPool;
use std::env;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use streamshop::{AppState, api, docs};

async fn index() -> impl Responder {
    HttpResponse::Ok().body("Service ready!")
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    env_logger::init();

    let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    // Sin valor por defecto: el servicio no arranca sin secreto.
    let jwt_secret = env::var("JWT_SECRET").expect("JWT_SECRET must be set");

    let pool = PgPool::connect(&database_url)
        .await
        .expect("Failed to connect to DB");

    sqlx::migrate!()
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());

    let state = web::Data::new(AppState { pool, jwt_secret });

    log::info!("starting server on {bind_addr}");

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .route("/", web::get().to(index))
            .service(
                SwaggerUi::new("/docs/{_:.*}")
                    .url("/api-docs/openapi.json", docs::ApiDoc::openapi()),
            )
            // Rutas públicas
            .service(
                web::scope("/api/auth")
                    .service(api::auth::register)
                    .service(api::auth::login),
            )
            .service(
                web::scope("/api/currency")
                    .service(api::currency::currency_rates)
                    .service(api::currency::convert_currency),
            )
            .service(
                web::scope("/api/services")
                    .service(api::services::list_services)
                    .service(api::services::get_service),
            )
            // Rutas protegidas
            .service(
                web::scope("/api")
                    .wrap(api::auth::JwtMiddleware)
                    .service(api::users::update_password)
                    .service(api::inventory::list_inventory)
                    .service(api::orders::create_order)
                    .service(api::orders::my_orders)
                    .service(api::orders::update_order)
                    .service(api::currency::add_currency)
                    .service(api::currency::update_currency_rate)
                    .service(api::currency::toggle_currency_active)
                    .service(api::services::create_service)
                    .service(api::services::update_service)
                    .service(api::services::delete_service)
                    .service(api::inventory::add_inventory)
                    .service(api::inventory::update_inventory)
                    .service(api::inventory::delete_inventory),
            )
    })
    .bind(bind_addr)?
    .run()
    .await
}
