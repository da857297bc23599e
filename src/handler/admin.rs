use std::sync::Arc;

use axum::{
    extract::{Path, Request},
    http::StatusCode,
    middleware::{self, Next},
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dtos::providerdtos::CreateCategoryDto,
    error::HttpError,
    middleware::{role_check, SessionAuth},
    models::usermodel::UserRole,
    AppState,
};

pub fn admin_handler() -> Router {
    Router::new()
        .route("/stats", get(get_stats))
        .route("/users", get(get_users))
        .route("/providers", get(get_providers))
        .route("/users/:user_id/toggle-status", post(toggle_user_status))
        .route(
            "/providers/:provider_id/toggle-verification",
            post(toggle_provider_verification),
        )
        .route("/categories", post(create_category))
        .route("/categories/:category_id/toggle-status", post(toggle_category_status))
        .layer(middleware::from_fn(|req: Request, next: Next| {
            role_check(req, next, vec![UserRole::Admin])
        }))
}

pub async fn get_stats(
    Extension(app_state): Extension<Arc<AppState>>,
    auth: SessionAuth,
) -> Result<impl IntoResponse, HttpError> {
    let stats = app_state.admin_service.stats(&auth.caller).await?;
    Ok(Json(stats))
}

pub async fn get_users(
    Extension(app_state): Extension<Arc<AppState>>,
    auth: SessionAuth,
) -> Result<impl IntoResponse, HttpError> {
    let users = app_state.admin_service.list_users(&auth.caller).await?;
    Ok(Json(users))
}

pub async fn get_providers(
    Extension(app_state): Extension<Arc<AppState>>,
    auth: SessionAuth,
) -> Result<impl IntoResponse, HttpError> {
    let providers = app_state.admin_service.list_providers(&auth.caller).await?;
    Ok(Json(providers))
}

pub async fn toggle_user_status(
    Path(user_id): Path<Uuid>,
    Extension(app_state): Extension<Arc<AppState>>,
    auth: SessionAuth,
) -> Result<impl IntoResponse, HttpError> {
    let response = app_state
        .admin_service
        .toggle_user_status(&auth.caller, user_id)
        .await?;
    Ok(Json(response))
}

pub async fn toggle_provider_verification(
    Path(provider_id): Path<Uuid>,
    Extension(app_state): Extension<Arc<AppState>>,
    auth: SessionAuth,
) -> Result<impl IntoResponse, HttpError> {
    let response = app_state
        .admin_service
        .toggle_provider_verification(&auth.caller, provider_id)
        .await?;
    Ok(Json(response))
}

pub async fn create_category(
    Extension(app_state): Extension<Arc<AppState>>,
    auth: SessionAuth,
    Json(body): Json<CreateCategoryDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let category = app_state
        .admin_service
        .create_category(&auth.caller, body)
        .await?;
    Ok((StatusCode::CREATED, Json(category)))
}

pub async fn toggle_category_status(
    Path(category_id): Path<Uuid>,
    Extension(app_state): Extension<Arc<AppState>>,
    auth: SessionAuth,
) -> Result<impl IntoResponse, HttpError> {
    let response = app_state
        .admin_service
        .toggle_category_status(&auth.caller, category_id)
        .await?;
    Ok(Json(response))
}
