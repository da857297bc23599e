use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::error::ServiceError;
use crate::{
    db::{providerdb::ProviderExt, sessiondb::SessionExt, userdb::UserExt, Store},
    dtos::userdtos::{ChangePasswordDto, CurrentUserData, FilterUserDto, LoginUserDto, RegisterUserDto},
    error::ErrorMessage,
    models::usermodel::{Caller, InitialSession, NewSession, NewUser, User, UserRole},
    utils::{password, token},
};

/// A signed-in user together with the raw token for the session cookie.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub user: User,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct AuthService {
    db_client: Arc<dyn Store>,
    session_max_age_hours: i64,
}

impl AuthService {
    pub fn new(db_client: Arc<dyn Store>, session_max_age_hours: i64) -> Self {
        Self {
            db_client,
            session_max_age_hours,
        }
    }

    pub async fn register(&self, body: RegisterUserDto) -> Result<AuthSession, ServiceError> {
        if body.role == UserRole::Admin {
            return Err(ServiceError::Forbidden(
                "Admin accounts cannot be self-registered".to_string(),
            ));
        }

        let username = body.username.trim().to_string();
        let email = body.email.trim().to_lowercase();

        if self.db_client.get_user(None, None, Some(&email)).await?.is_some() {
            return Err(ErrorMessage::EmailExist.into());
        }
        if self.db_client.get_user(None, Some(&username), None).await?.is_some() {
            return Err(ErrorMessage::UsernameExist.into());
        }

        let hashed_password = password::hash(&body.password)?;

        let profile = match body.role {
            UserRole::ServiceProvider => Some(body.provider_profile.unwrap_or_default().into()),
            _ => None,
        };

        let issued = token::issue_session_token(self.session_max_age_hours);

        let user = self
            .db_client
            .register_user(
                NewUser {
                    username,
                    email,
                    password: hashed_password,
                    full_name: body.full_name.trim().to_string(),
                    phone: body.phone,
                    location: body.location,
                    role: body.role,
                },
                profile,
                Some(InitialSession {
                    token_hash: issued.token_hash,
                    expires_at: issued.expires_at,
                }),
            )
            .await?;

        tracing::info!(user_id = %user.id, role = user.role.to_str(), "user registered");

        Ok(AuthSession {
            user,
            token: issued.token,
            expires_at: issued.expires_at,
        })
    }

    pub async fn login(&self, body: LoginUserDto) -> Result<AuthSession, ServiceError> {
        let email = body.email.trim().to_lowercase();

        let user = self
            .db_client
            .get_user(None, None, Some(&email))
            .await?
            .ok_or(ErrorMessage::WrongCredentials)?;

        if !password::compare(&body.password, &user.password)? {
            tracing::info!(user_id = %user.id, "login rejected: wrong password");
            return Err(ErrorMessage::WrongCredentials.into());
        }

        if !user.is_active {
            tracing::info!(user_id = %user.id, "login rejected: account deactivated");
            return Err(ErrorMessage::AccountDeactivated.into());
        }

        let purged = self
            .db_client
            .delete_expired_sessions(user.id, Utc::now())
            .await?;
        if purged > 0 {
            tracing::debug!(user_id = %user.id, purged, "purged expired sessions");
        }

        let issued = token::issue_session_token(self.session_max_age_hours);
        self.db_client
            .create_session(NewSession {
                token_hash: issued.token_hash,
                user_id: user.id,
                role: user.role,
                expires_at: issued.expires_at,
            })
            .await?;

        tracing::info!(user_id = %user.id, "user logged in");

        Ok(AuthSession {
            user,
            token: issued.token,
            expires_at: issued.expires_at,
        })
    }

    pub async fn logout(&self, session_token: Option<&str>) -> Result<(), ServiceError> {
        if let Some(session_token) = session_token {
            let removed = self
                .db_client
                .delete_session(&token::hash_token(session_token))
                .await?;
            tracing::debug!(removed, "session closed");
        }
        Ok(())
    }

    /// Maps a presented token to its caller. Unknown or expired tokens and
    /// deactivated accounts resolve to `None`.
    pub async fn resolve_session(&self, session_token: &str) -> Result<Option<User>, ServiceError> {
        let token_hash = token::hash_token(session_token);

        let Some(session) = self.db_client.get_session_by_token_hash(&token_hash).await? else {
            return Ok(None);
        };

        if session.is_expired(Utc::now()) {
            self.db_client.delete_session(&token_hash).await?;
            return Ok(None);
        }

        let user = self.db_client.get_user(Some(session.user_id), None, None).await?;
        match user {
            Some(user) if user.is_active => Ok(Some(user)),
            _ => {
                self.db_client.delete_session(&token_hash).await?;
                Ok(None)
            }
        }
    }

    pub async fn current_user(&self, caller: &Caller) -> Result<CurrentUserData, ServiceError> {
        let user = self.load_user(caller.user_id).await?;

        let provider_profile = if user.is_provider() {
            self.db_client.get_provider_by_user_id(user.id).await?
        } else {
            None
        };

        Ok(CurrentUserData {
            user: FilterUserDto::filter_user(&user),
            provider_profile,
        })
    }

    pub async fn change_password(
        &self,
        caller: &Caller,
        body: ChangePasswordDto,
    ) -> Result<(), ServiceError> {
        let user = self.load_user(caller.user_id).await?;

        if !password::compare(&body.current_password, &user.password)? {
            return Err(ServiceError::Unauthenticated(
                "Current password is incorrect".to_string(),
            ));
        }

        let hashed_password = password::hash(&body.new_password)?;
        self.db_client
            .update_user_password(user.id, hashed_password)
            .await?;

        tracing::info!(user_id = %user.id, "password changed");
        Ok(())
    }

    async fn load_user(&self, user_id: Uuid) -> Result<User, ServiceError> {
        self.db_client
            .get_user(Some(user_id), None, None)
            .await?
            .ok_or_else(|| ErrorMessage::UserNoLongerExist.into())
    }
}
