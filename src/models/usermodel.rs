use chrono::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Deserialize, Serialize, Clone, Copy, sqlx::Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "user_role", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Customer,
    ServiceProvider,
    Admin,
}

impl UserRole {
    pub fn to_str(&self) -> &str {
        match self {
            UserRole::Customer => "customer",
            UserRole::ServiceProvider => "service_provider",
            UserRole::Admin => "admin",
        }
    }
}

#[derive(Debug, Deserialize, Serialize, sqlx::FromRow, Clone)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub full_name: String,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub role: UserRole,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn is_provider(&self) -> bool {
        self.role == UserRole::ServiceProvider
    }
}

/// Public view of a user embedded in bookings, reviews and provider listings.
#[derive(Debug, Deserialize, Serialize, sqlx::FromRow, Clone, PartialEq)]
pub struct UserSummary {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub role: UserRole,
    pub is_active: bool,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        UserSummary {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            full_name: user.full_name.clone(),
            phone: user.phone.clone(),
            location: user.location.clone(),
            role: user.role,
            is_active: user.is_active,
        }
    }
}

/// Identity of the caller, resolved from the session and handed to every
/// service call that needs an authorization decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller {
    pub user_id: Uuid,
    pub role: UserRole,
}

impl Caller {
    pub fn new(user_id: Uuid, role: UserRole) -> Self {
        Caller { user_id, role }
    }

    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

impl From<&User> for Caller {
    fn from(user: &User) -> Self {
        Caller::new(user.id, user.role)
    }
}

/// Insert payload for a user row; `password` is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub role: UserRole,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Session {
    pub id: Uuid,
    pub token_hash: String,
    pub user_id: Uuid,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

#[derive(Debug, Clone)]
pub struct NewSession {
    pub token_hash: String,
    pub user_id: Uuid,
    pub role: UserRole,
    pub expires_at: DateTime<Utc>,
}

/// Session opened in the same transaction as a new account.
#[derive(Debug, Clone)]
pub struct InitialSession {
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
}
