use std::collections::HashMap;

use sqlx::{PgConnection, Pool, Postgres};
use uuid::Uuid;

use super::{
    admindb::AdminExt, bookingdb::BookingExt, providerdb::{CategoryExt, ProviderExt},
    reviewdb::ReviewExt, sessiondb::SessionExt, userdb::UserExt,
};
use crate::models::usermodel::UserSummary;

#[derive(Clone)]
pub struct DBClient {
    pub pool: Pool<Postgres>,
}

impl std::fmt::Debug for DBClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DBClient")
            .field("pool", &"Pool<Postgres>")
            .field("size", &self.pool.size())
            .finish()
    }
}

impl DBClient {
    pub fn new(pool: Pool<Postgres>) -> Self {
        DBClient { pool }
    }
}

/// Everything the services need from persistence.
pub trait Store:
    UserExt + SessionExt + ProviderExt + CategoryExt + BookingExt + ReviewExt + AdminExt
    + std::fmt::Debug + Send + Sync
{
}

impl<T> Store for T where
    T: UserExt + SessionExt + ProviderExt + CategoryExt + BookingExt + ReviewExt + AdminExt
        + std::fmt::Debug + Send + Sync
{
}

/// Builds an `ILIKE` pattern matching `term` anywhere, with wildcards in the
/// term itself escaped.
pub fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for ch in term.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}

const USER_SUMMARY_COLUMNS: &str =
    "id, username, email, full_name, phone, location, role, is_active";

/// Loads the summaries for `ids` in one round trip, keyed by user id.
pub(crate) async fn load_user_summaries(
    conn: &mut PgConnection,
    ids: &[Uuid],
) -> Result<HashMap<Uuid, UserSummary>, sqlx::Error> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }

    let users = sqlx::query_as::<_, UserSummary>(&format!(
        "SELECT {} FROM users WHERE id = ANY($1)",
        USER_SUMMARY_COLUMNS
    ))
    .bind(ids)
    .fetch_all(&mut *conn)
    .await?;

    Ok(users.into_iter().map(|user| (user.id, user)).collect())
}
