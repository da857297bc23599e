use std::sync::Arc;

use axum::{
    extract::{Path, Query},
    response::IntoResponse,
    routing::get,
    Extension, Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dtos::providerdtos::{ProviderSearchQueryDto, UpdateProviderProfileDto},
    error::HttpError,
    middleware::SessionAuth,
    AppState,
};

pub fn services_handler() -> Router {
    Router::new()
        .route("/categories", get(list_categories))
        .route("/providers", get(list_providers))
        .route(
            "/providers/profile",
            get(get_own_profile).put(update_own_profile),
        )
        .route("/providers/:provider_id", get(get_provider))
        .route("/providers/:provider_id/reviews", get(get_provider_reviews))
}

pub async fn list_categories(
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpError> {
    let categories = app_state.directory_service.list_categories().await?;
    Ok(Json(categories))
}

pub async fn list_providers(
    Query(query_params): Query<ProviderSearchQueryDto>,
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpError> {
    query_params.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let providers = app_state.directory_service.list_providers(query_params).await?;
    Ok(Json(providers))
}

pub async fn get_provider(
    Path(provider_id): Path<Uuid>,
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpError> {
    let provider = app_state.directory_service.get_provider(provider_id).await?;
    Ok(Json(provider))
}

pub async fn get_provider_reviews(
    Path(provider_id): Path<Uuid>,
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpError> {
    let reviews = app_state
        .review_service
        .list_provider_reviews(provider_id)
        .await?;
    Ok(Json(reviews))
}

pub async fn get_own_profile(
    Extension(app_state): Extension<Arc<AppState>>,
    auth: SessionAuth,
) -> Result<impl IntoResponse, HttpError> {
    let profile = app_state.directory_service.get_own_profile(&auth.caller).await?;
    Ok(Json(profile))
}

pub async fn update_own_profile(
    Extension(app_state): Extension<Arc<AppState>>,
    auth: SessionAuth,
    Json(body): Json<UpdateProviderProfileDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let profile = app_state
        .directory_service
        .update_own_profile(&auth.caller, body)
        .await?;
    Ok(Json(profile))
}
