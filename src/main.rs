mod config;
mod db;
mod dtos;
mod error;
mod handler;
mod middleware;
mod models;
mod routes;
mod service;
mod utils;

use std::sync::Arc;

use axum::http::{
    header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
    HeaderValue, Method,
};
use config::Config;
use db::{DBClient, Store};
use dotenv::dotenv;
use routes::create_router;
use service::{
    admin_service::AdminService, auth_service::AuthService, booking_service::BookingService,
    directory_service::DirectoryService, review_service::ReviewService, seed,
};
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone)]
pub struct AppState {
    pub env: Config,
    pub db_client: Arc<dyn Store>,
    pub auth_service: Arc<AuthService>,
    pub booking_service: Arc<BookingService>,
    pub review_service: Arc<ReviewService>,
    pub directory_service: Arc<DirectoryService>,
    pub admin_service: Arc<AdminService>,
}

impl AppState {
    pub fn new(env: Config, db_client: Arc<dyn Store>) -> Self {
        let auth_service = Arc::new(AuthService::new(
            db_client.clone(),
            env.session_max_age_hours,
        ));
        let booking_service = Arc::new(BookingService::new(db_client.clone()));
        let review_service = Arc::new(ReviewService::new(db_client.clone()));
        let directory_service = Arc::new(DirectoryService::new(db_client.clone()));
        let admin_service = Arc::new(AdminService::new(db_client.clone()));

        AppState {
            env,
            db_client,
            auth_service,
            booking_service,
            review_service,
            directory_service,
            admin_service,
        }
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
        return;
    }
    tracing::info!("shutdown signal received");
}

#[tokio::main]
async fn main() {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = match Config::init() {
        Ok(config) => config,
        Err(err) => {
            tracing::error!(error = %err, "invalid configuration");
            std::process::exit(1);
        }
    };

    let pool = match PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(&config.database_url)
        .await
    {
        Ok(pool) => {
            tracing::info!("connection to the database is successful");
            pool
        }
        Err(err) => {
            tracing::error!(error = %err, "failed to connect to the database");
            std::process::exit(1);
        }
    };

    if let Err(err) = sqlx::migrate!("./migrations").run(&pool).await {
        tracing::error!(error = %err, "failed to run database migrations");
        std::process::exit(1);
    }

    let db_client: Arc<dyn Store> = Arc::new(DBClient::new(pool));

    if let Err(err) = seed::seed_categories(db_client.as_ref()).await {
        tracing::error!(error = %err, "failed to seed service categories");
        std::process::exit(1);
    }

    if config.seed_demo_data {
        match seed::seed_demo_accounts(db_client.as_ref()).await {
            Ok(created) => tracing::info!(created, "demo data ready"),
            Err(err) => tracing::warn!(error = %err, "failed to seed demo data"),
        }
    }

    let allowed_origins: Vec<HeaderValue> = config
        .cors_allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed_origins))
        .allow_headers([AUTHORIZATION, ACCEPT, CONTENT_TYPE])
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE]);

    let app_state = AppState::new(config.clone(), db_client);

    let app = create_router(Arc::new(app_state)).layer(cors);

    let listener = match tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port)).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!(error = %err, port = config.port, "failed to bind listener");
            std::process::exit(1);
        }
    };

    tracing::info!("server is running on http://localhost:{}", config.port);

    if let Err(err) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!(error = %err, "server error");
    }
}
