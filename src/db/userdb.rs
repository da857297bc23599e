use async_trait::async_trait;
use sqlx::types::Json;
use uuid::Uuid;

use super::db::DBClient;
use crate::models::{
    providermodel::NewProviderProfile,
    usermodel::{InitialSession, NewUser, User},
};

#[async_trait]
pub trait UserExt {
    async fn get_user(
        &self,
        user_id: Option<Uuid>,
        username: Option<&str>,
        email: Option<&str>,
    ) -> Result<Option<User>, sqlx::Error>;

    async fn get_users(&self) -> Result<Vec<User>, sqlx::Error>;

    /// Creates the user, its provider profile and its first session, when
    /// given, in a single transaction.
    async fn register_user(
        &self,
        new_user: NewUser,
        profile: Option<NewProviderProfile>,
        session: Option<InitialSession>,
    ) -> Result<User, sqlx::Error>;

    async fn update_user_password(
        &self,
        user_id: Uuid,
        password: String,
    ) -> Result<User, sqlx::Error>;

    /// Flips `is_active`. Deactivation also drops every session of the user.
    async fn toggle_user_status(&self, user_id: Uuid) -> Result<Option<User>, sqlx::Error>;
}

#[async_trait]
impl UserExt for DBClient {
    async fn get_user(
        &self,
        user_id: Option<Uuid>,
        username: Option<&str>,
        email: Option<&str>,
    ) -> Result<Option<User>, sqlx::Error> {
        let mut user: Option<User> = None;

        if let Some(user_id) = user_id {
            user = sqlx::query_as::<_, User>(r#"SELECT * FROM users WHERE id = $1"#)
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?;
        } else if let Some(username) = username {
            user = sqlx::query_as::<_, User>(r#"SELECT * FROM users WHERE username = $1"#)
                .bind(username)
                .fetch_optional(&self.pool)
                .await?;
        } else if let Some(email) = email {
            user = sqlx::query_as::<_, User>(r#"SELECT * FROM users WHERE email = $1"#)
                .bind(email)
                .fetch_optional(&self.pool)
                .await?;
        }

        Ok(user)
    }

    async fn get_users(&self) -> Result<Vec<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(r#"SELECT * FROM users ORDER BY created_at DESC"#)
            .fetch_all(&self.pool)
            .await
    }

    async fn register_user(
        &self,
        new_user: NewUser,
        profile: Option<NewProviderProfile>,
        session: Option<InitialSession>,
    ) -> Result<User, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, email, password, full_name, phone, location, role)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(&new_user.username)
        .bind(&new_user.email)
        .bind(&new_user.password)
        .bind(&new_user.full_name)
        .bind(&new_user.phone)
        .bind(&new_user.location)
        .bind(new_user.role)
        .fetch_one(&mut *tx)
        .await?;

        if let Some(profile) = profile {
            sqlx::query(
                r#"
                INSERT INTO service_providers
                    (user_id, skills, hourly_rate, experience_years, description, availability)
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(user.id)
            .bind(Json(&profile.skills))
            .bind(profile.hourly_rate)
            .bind(profile.experience_years)
            .bind(&profile.description)
            .bind(Json(&profile.availability))
            .execute(&mut *tx)
            .await?;
        }

        if let Some(session) = session {
            sqlx::query(
                r#"
                INSERT INTO sessions (token_hash, user_id, role, expires_at)
                VALUES ($1, $2, $3, $4)
                "#,
            )
            .bind(session.token_hash)
            .bind(user.id)
            .bind(user.role)
            .bind(session.expires_at)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(user)
    }

    async fn update_user_password(
        &self,
        user_id: Uuid,
        password: String,
    ) -> Result<User, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET password = $1, updated_at = NOW()
            WHERE id = $2
            RETURNING *
            "#,
        )
        .bind(password)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
    }

    async fn toggle_user_status(&self, user_id: Uuid) -> Result<Option<User>, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET is_active = NOT is_active, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?;

        if let Some(user) = &user {
            if !user.is_active {
                sqlx::query(r#"DELETE FROM sessions WHERE user_id = $1"#)
                    .bind(user.id)
                    .execute(&mut *tx)
                    .await?;
            }
        }

        tx.commit().await?;

        Ok(user)
    }
}
