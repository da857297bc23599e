use std::sync::Arc;

use axum::{
    extract::{Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Extension, Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dtos::reviewdtos::{CreateReviewDto, ReviewQueryDto, UpdateReviewDto},
    error::HttpError,
    middleware::SessionAuth,
    AppState,
};

pub fn reviews_handler() -> Router {
    Router::new()
        .route("/", get(list_reviews).post(create_review))
        .route(
            "/:review_id",
            get(get_review).put(update_review).delete(delete_review),
        )
        .route("/provider/:provider_id/stats", get(get_provider_stats))
}

pub async fn list_reviews(
    Query(query_params): Query<ReviewQueryDto>,
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpError> {
    let reviews = app_state.review_service.list_reviews(query_params).await?;
    Ok(Json(reviews))
}

pub async fn create_review(
    Extension(app_state): Extension<Arc<AppState>>,
    auth: SessionAuth,
    Json(body): Json<CreateReviewDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let review = app_state
        .review_service
        .create_review(&auth.caller, body)
        .await?;

    Ok((StatusCode::CREATED, Json(review)))
}

pub async fn get_review(
    Path(review_id): Path<Uuid>,
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpError> {
    let review = app_state.review_service.get_review(review_id).await?;
    Ok(Json(review))
}

pub async fn update_review(
    Path(review_id): Path<Uuid>,
    Extension(app_state): Extension<Arc<AppState>>,
    auth: SessionAuth,
    Json(body): Json<UpdateReviewDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let review = app_state
        .review_service
        .update_review(&auth.caller, review_id, body)
        .await?;

    Ok(Json(review))
}

pub async fn delete_review(
    Path(review_id): Path<Uuid>,
    Extension(app_state): Extension<Arc<AppState>>,
    auth: SessionAuth,
) -> Result<impl IntoResponse, HttpError> {
    app_state
        .review_service
        .delete_review(&auth.caller, review_id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_provider_stats(
    Path(provider_id): Path<Uuid>,
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpError> {
    let stats = app_state.review_service.get_provider_stats(provider_id).await?;
    Ok(Json(stats))
}
