use std::sync::Arc;

use axum::{
    extract::{Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, put},
    Extension, Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dtos::bookingdtos::{BookingQueryDto, CreateBookingDto, UpdateBookingDto, UpdateBookingStatusDto},
    error::HttpError,
    middleware::SessionAuth,
    AppState,
};

pub fn bookings_handler() -> Router {
    Router::new()
        .route("/", get(list_bookings).post(create_booking))
        .route(
            "/:booking_id",
            get(get_booking).put(update_booking).delete(delete_booking),
        )
        .route("/:booking_id/status", put(update_booking_status))
}

pub async fn list_bookings(
    Query(query_params): Query<BookingQueryDto>,
    Extension(app_state): Extension<Arc<AppState>>,
    auth: SessionAuth,
) -> Result<impl IntoResponse, HttpError> {
    let bookings = app_state
        .booking_service
        .list_bookings(&auth.caller, query_params)
        .await?;

    Ok(Json(bookings))
}

pub async fn create_booking(
    Extension(app_state): Extension<Arc<AppState>>,
    auth: SessionAuth,
    Json(body): Json<CreateBookingDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let booking = app_state
        .booking_service
        .create_booking(&auth.caller, body)
        .await?;

    Ok((StatusCode::CREATED, Json(booking)))
}

pub async fn get_booking(
    Path(booking_id): Path<Uuid>,
    Extension(app_state): Extension<Arc<AppState>>,
    auth: SessionAuth,
) -> Result<impl IntoResponse, HttpError> {
    let booking = app_state
        .booking_service
        .get_booking(&auth.caller, booking_id)
        .await?;

    Ok(Json(booking))
}

pub async fn update_booking(
    Path(booking_id): Path<Uuid>,
    Extension(app_state): Extension<Arc<AppState>>,
    auth: SessionAuth,
    Json(body): Json<UpdateBookingDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let booking = app_state
        .booking_service
        .update_booking(&auth.caller, booking_id, body)
        .await?;

    Ok(Json(booking))
}

pub async fn delete_booking(
    Path(booking_id): Path<Uuid>,
    Extension(app_state): Extension<Arc<AppState>>,
    auth: SessionAuth,
) -> Result<impl IntoResponse, HttpError> {
    app_state
        .booking_service
        .delete_booking(&auth.caller, booking_id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn update_booking_status(
    Path(booking_id): Path<Uuid>,
    Extension(app_state): Extension<Arc<AppState>>,
    auth: SessionAuth,
    Json(body): Json<UpdateBookingStatusDto>,
) -> Result<impl IntoResponse, HttpError> {
    let booking = app_state
        .booking_service
        .update_status(&auth.caller, booking_id, body)
        .await?;

    Ok(Json(booking))
}
