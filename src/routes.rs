use std::sync::Arc;

use axum::{middleware, routing::get, Extension, Json, Router};
use serde_json::json;
use tower_http::trace::TraceLayer;

use crate::{
    handler::{
        admin::admin_handler, auth::auth_handler, bookings::bookings_handler,
        reviews::reviews_handler, services::services_handler,
    },
    middleware::session,
    AppState,
};

async fn health_check() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "message": "Server is running"
    }))
}

pub fn create_router(app_state: Arc<AppState>) -> Router {
    let api_route = Router::new()
        .nest("/auth", auth_handler())
        .nest("/bookings", bookings_handler())
        .nest("/services", services_handler())
        .nest("/reviews", reviews_handler())
        .nest("/admin", admin_handler())
        .layer(middleware::from_fn(session))
        .layer(TraceLayer::new_for_http())
        .layer(Extension(app_state));

    Router::new()
        .route("/health", get(health_check))
        .nest("/api", api_route)
}
