use std::sync::Arc;

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Extension, Json, Router,
};
use axum_extra::extract::cookie::{Cookie, SameSite};
use validator::Validate;

use crate::{
    config::Config,
    dtos::userdtos::{
        ChangePasswordDto, CurrentUserDto, FilterUserDto, LoginUserDto, MessageResponse,
        RegisterUserDto, UserResponseDto,
    },
    error::HttpError,
    middleware::SessionAuth,
    service::auth_service::AuthSession,
    AppState,
};

pub fn auth_handler() -> Router {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/me", get(get_me))
        .route("/change-password", post(change_password))
}

fn session_cookie(env: &Config, value: String, max_age: time::Duration) -> Cookie<'static> {
    Cookie::build((env.session_cookie_name.clone(), value))
        .path("/")
        .max_age(max_age)
        .http_only(true)
        .secure(env.cookie_secure)
        .same_site(SameSite::Lax)
        .build()
}

fn with_cookie(mut response: Response, cookie: Cookie<'static>) -> Result<Response, HttpError> {
    let value = HeaderValue::from_str(&cookie.to_string())
        .map_err(|e| HttpError::server_error(e.to_string()))?;
    response.headers_mut().append(header::SET_COOKIE, value);
    Ok(response)
}

fn signed_in(
    env: &Config,
    status: StatusCode,
    message: &str,
    session: AuthSession,
) -> Result<Response, HttpError> {
    let cookie = session_cookie(
        env,
        session.token,
        time::Duration::hours(env.session_max_age_hours),
    );

    let body = UserResponseDto {
        message: message.to_string(),
        user: FilterUserDto::filter_user(&session.user),
    };

    with_cookie((status, Json(body)).into_response(), cookie)
}

pub async fn register(
    Extension(app_state): Extension<Arc<AppState>>,
    Json(body): Json<RegisterUserDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let session = app_state.auth_service.register(body).await?;

    signed_in(
        &app_state.env,
        StatusCode::CREATED,
        "User registered successfully",
        session,
    )
}

pub async fn login(
    Extension(app_state): Extension<Arc<AppState>>,
    Json(body): Json<LoginUserDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let session = app_state.auth_service.login(body).await?;

    signed_in(&app_state.env, StatusCode::OK, "Login successful", session)
}

pub async fn logout(
    Extension(app_state): Extension<Arc<AppState>>,
    auth: Option<SessionAuth>,
) -> Result<impl IntoResponse, HttpError> {
    app_state
        .auth_service
        .logout(auth.as_ref().map(|auth| auth.token.as_str()))
        .await?;

    let cookie = session_cookie(&app_state.env, String::new(), time::Duration::ZERO);

    with_cookie(
        Json(MessageResponse::new("Logout successful")).into_response(),
        cookie,
    )
}

pub async fn get_me(
    Extension(app_state): Extension<Arc<AppState>>,
    auth: SessionAuth,
) -> Result<impl IntoResponse, HttpError> {
    let user = app_state.auth_service.current_user(&auth.caller).await?;

    Ok(Json(CurrentUserDto { user }))
}

pub async fn change_password(
    Extension(app_state): Extension<Arc<AppState>>,
    auth: SessionAuth,
    Json(body): Json<ChangePasswordDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    app_state
        .auth_service
        .change_password(&auth.caller, body)
        .await?;

    Ok(Json(MessageResponse::new("Password changed successfully")))
}
