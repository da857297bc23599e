use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::db::DBClient;
use crate::models::usermodel::{NewSession, Session};

#[async_trait]
pub trait SessionExt {
    async fn create_session(&self, session: NewSession) -> Result<Session, sqlx::Error>;

    async fn get_session_by_token_hash(
        &self,
        token_hash: &str,
    ) -> Result<Option<Session>, sqlx::Error>;

    async fn delete_session(&self, token_hash: &str) -> Result<u64, sqlx::Error>;

    async fn delete_expired_sessions(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<u64, sqlx::Error>;
}

#[async_trait]
impl SessionExt for DBClient {
    async fn create_session(&self, session: NewSession) -> Result<Session, sqlx::Error> {
        sqlx::query_as::<_, Session>(
            r#"
            INSERT INTO sessions (token_hash, user_id, role, expires_at)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(session.token_hash)
        .bind(session.user_id)
        .bind(session.role)
        .bind(session.expires_at)
        .fetch_one(&self.pool)
        .await
    }

    async fn get_session_by_token_hash(
        &self,
        token_hash: &str,
    ) -> Result<Option<Session>, sqlx::Error> {
        sqlx::query_as::<_, Session>(r#"SELECT * FROM sessions WHERE token_hash = $1"#)
            .bind(token_hash)
            .fetch_optional(&self.pool)
            .await
    }

    async fn delete_session(&self, token_hash: &str) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(r#"DELETE FROM sessions WHERE token_hash = $1"#)
            .bind(token_hash)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    async fn delete_expired_sessions(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(r#"DELETE FROM sessions WHERE user_id = $1 AND expires_at <= $2"#)
            .bind(user_id)
            .bind(now)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
