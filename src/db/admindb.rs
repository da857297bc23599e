use async_trait::async_trait;

use super::db::DBClient;
use crate::models::{adminmodel::PlatformCounts, bookingmodel::BookingStatus};

#[async_trait]
pub trait AdminExt {
    async fn get_platform_counts(&self) -> Result<PlatformCounts, sqlx::Error>;
}

#[async_trait]
impl AdminExt for DBClient {
    async fn get_platform_counts(&self) -> Result<PlatformCounts, sqlx::Error> {
        let (users, providers, bookings, categories): (i64, i64, i64, i64) = sqlx::query_as(
            r#"
            SELECT
                (SELECT COUNT(*) FROM users),
                (SELECT COUNT(*) FROM service_providers),
                (SELECT COUNT(*) FROM bookings),
                (SELECT COUNT(*) FROM service_categories)
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        let bookings_by_status: Vec<(BookingStatus, i64)> = sqlx::query_as(
            r#"
            SELECT status, COUNT(*)
            FROM bookings
            GROUP BY status
            ORDER BY status
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(PlatformCounts {
            users,
            providers,
            bookings,
            categories,
            bookings_by_status,
        })
    }
}
