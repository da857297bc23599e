use std::sync::Arc;

use axum::{
    async_trait,
    extract::{FromRequestParts, Request},
    http::{header, request::Parts, HeaderMap},
    middleware::Next,
    response::IntoResponse,
    Extension,
};
use axum_extra::extract::cookie::CookieJar;

use crate::{
    error::{ErrorMessage, HttpError},
    models::usermodel::{Caller, User, UserRole},
    AppState,
};

/// Identity bound to the request by [`session`].
#[derive(Debug, Clone)]
pub struct SessionAuth {
    pub user: User,
    pub caller: Caller,
    pub token: String,
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|auth_header| auth_header.to_str().ok())
        .and_then(|auth_value| auth_value.strip_prefix("Bearer "))
        .map(|token| token.trim().to_owned())
        .filter(|token| !token.is_empty())
}

/// Resolves the session cookie (or bearer token) to a user. Requests without
/// a valid session continue anonymously; handlers that need a caller extract
/// [`SessionAuth`] and reject with 401.
pub async fn session(
    cookie_jar: CookieJar,
    Extension(app_state): Extension<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<impl IntoResponse, HttpError> {
    let token = cookie_jar
        .get(&app_state.env.session_cookie_name)
        .map(|cookie| cookie.value().to_string())
        .filter(|value| !value.is_empty())
        .or_else(|| bearer_token(req.headers()));

    if let Some(token) = token {
        let user = app_state.auth_service.resolve_session(&token).await?;

        match user {
            Some(user) => {
                req.extensions_mut().insert(SessionAuth {
                    caller: Caller::from(&user),
                    user,
                    token,
                });
            }
            None => tracing::debug!("presented session did not resolve, continuing anonymously"),
        }
    }

    Ok(next.run(req).await)
}

#[async_trait]
impl<S> FromRequestParts<S> for SessionAuth
where
    S: Send + Sync,
{
    type Rejection = HttpError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<SessionAuth>()
            .cloned()
            .ok_or_else(|| HttpError::unauthorized(ErrorMessage::UserNotAuthenticated.to_string()))
    }
}

pub async fn role_check(
    req: Request,
    next: Next,
    required_roles: Vec<UserRole>,
) -> Result<impl IntoResponse, HttpError> {
    let auth = req
        .extensions()
        .get::<SessionAuth>()
        .ok_or_else(|| HttpError::unauthorized(ErrorMessage::UserNotAuthenticated.to_string()))?;

    if !required_roles.contains(&auth.user.role) {
        tracing::info!(user_id = %auth.user.id, role = auth.user.role.to_str(), "role check failed");
        return Err(HttpError::forbidden(ErrorMessage::PermissionDenied.to_string()));
    }

    Ok(next.run(req).await)
}
