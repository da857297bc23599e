use async_trait::async_trait;
use sqlx::{Connection, PgConnection};
use uuid::Uuid;

use super::db::{load_user_summaries, DBClient};
use crate::models::reviewmodel::{
    NewReview, RatingDistribution, RatingSummary, Review, ReviewChanges, ReviewDetails,
    ReviewFilter,
};

#[async_trait]
pub trait ReviewExt {
    async fn get_review(&self, review_id: Uuid) -> Result<Option<ReviewDetails>, sqlx::Error>;

    async fn get_review_by_booking(&self, booking_id: Uuid) -> Result<Option<Review>, sqlx::Error>;

    /// Newest first.
    async fn list_reviews(&self, filter: &ReviewFilter) -> Result<Vec<ReviewDetails>, sqlx::Error>;

    /// The review writes below refresh the provider's cached rating in the
    /// same transaction. A failed refresh is logged and does not undo the write.
    async fn create_review(&self, review: NewReview) -> Result<Review, sqlx::Error>;

    async fn update_review(
        &self,
        review_id: Uuid,
        changes: &ReviewChanges,
    ) -> Result<Option<Review>, sqlx::Error>;

    async fn delete_review(&self, review_id: Uuid) -> Result<Option<Review>, sqlx::Error>;

    async fn get_rating_distribution(
        &self,
        provider_id: Uuid,
    ) -> Result<RatingDistribution, sqlx::Error>;
}

async fn fetch_distribution(
    conn: &mut PgConnection,
    provider_id: Uuid,
) -> Result<RatingDistribution, sqlx::Error> {
    let rows: Vec<(i32, i64)> = sqlx::query_as(
        r#"
        SELECT rating, COUNT(*)
        FROM reviews
        WHERE provider_id = $1
        GROUP BY rating
        "#,
    )
    .bind(provider_id)
    .fetch_all(&mut *conn)
    .await?;

    let mut distribution = RatingDistribution::default();
    for (rating, count) in rows {
        distribution.record(rating, count);
    }
    Ok(distribution)
}

async fn refresh_provider_rating(
    conn: &mut PgConnection,
    provider_id: Uuid,
) -> Result<RatingSummary, sqlx::Error> {
    let summary = fetch_distribution(&mut *conn, provider_id).await?.summary();

    sqlx::query(
        r#"
        UPDATE service_providers
        SET rating = $2, total_reviews = $3, updated_at = NOW()
        WHERE user_id = $1
        "#,
    )
    .bind(provider_id)
    .bind(summary.rating)
    .bind(summary.total_reviews)
    .execute(&mut *conn)
    .await?;

    Ok(summary)
}

/// Runs the refresh under a savepoint so a failure only rolls back the refresh.
async fn refresh_rating_best_effort(conn: &mut PgConnection, provider_id: Uuid) {
    let result = async {
        let mut savepoint = conn.begin().await?;
        let summary = refresh_provider_rating(&mut savepoint, provider_id).await?;
        savepoint.commit().await?;
        Ok::<_, sqlx::Error>(summary)
    }
    .await;

    match result {
        Ok(summary) => tracing::debug!(
            provider_id = %provider_id,
            rating = summary.rating,
            total_reviews = summary.total_reviews,
            "provider rating refreshed"
        ),
        Err(err) => tracing::warn!(
            provider_id = %provider_id,
            error = %err,
            "provider rating refresh failed, keeping review write"
        ),
    }
}

async fn attach_customers(
    conn: &mut PgConnection,
    reviews: Vec<Review>,
) -> Result<Vec<ReviewDetails>, sqlx::Error> {
    let mut customer_ids: Vec<Uuid> = reviews.iter().map(|r| r.customer_id).collect();
    customer_ids.sort_unstable();
    customer_ids.dedup();

    let customers = load_user_summaries(conn, &customer_ids).await?;

    Ok(reviews
        .into_iter()
        .map(|review| ReviewDetails {
            customer: customers.get(&review.customer_id).cloned(),
            review,
        })
        .collect())
}

#[async_trait]
impl ReviewExt for DBClient {
    async fn get_review(&self, review_id: Uuid) -> Result<Option<ReviewDetails>, sqlx::Error> {
        let mut conn = self.pool.acquire().await?;

        let review = sqlx::query_as::<_, Review>(r#"SELECT * FROM reviews WHERE id = $1"#)
            .bind(review_id)
            .fetch_optional(&mut *conn)
            .await?;

        match review {
            Some(review) => Ok(attach_customers(&mut conn, vec![review]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn get_review_by_booking(&self, booking_id: Uuid) -> Result<Option<Review>, sqlx::Error> {
        sqlx::query_as::<_, Review>(r#"SELECT * FROM reviews WHERE booking_id = $1"#)
            .bind(booking_id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn list_reviews(&self, filter: &ReviewFilter) -> Result<Vec<ReviewDetails>, sqlx::Error> {
        let mut conn = self.pool.acquire().await?;

        let reviews = sqlx::query_as::<_, Review>(
            r#"
            SELECT * FROM reviews
            WHERE ($1::uuid IS NULL OR provider_id = $1)
              AND ($2::uuid IS NULL OR customer_id = $2)
              AND ($3::uuid IS NULL OR booking_id = $3)
            ORDER BY created_at DESC
            "#,
        )
        .bind(filter.provider_id)
        .bind(filter.customer_id)
        .bind(filter.booking_id)
        .fetch_all(&mut *conn)
        .await?;

        attach_customers(&mut conn, reviews).await
    }

    async fn create_review(&self, review: NewReview) -> Result<Review, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let review = sqlx::query_as::<_, Review>(
            r#"
            INSERT INTO reviews (customer_id, provider_id, booking_id, rating, comment)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(review.customer_id)
        .bind(review.provider_id)
        .bind(review.booking_id)
        .bind(review.rating)
        .bind(review.comment)
        .fetch_one(&mut *tx)
        .await?;

        refresh_rating_best_effort(&mut tx, review.provider_id).await;

        tx.commit().await?;

        Ok(review)
    }

    async fn update_review(
        &self,
        review_id: Uuid,
        changes: &ReviewChanges,
    ) -> Result<Option<Review>, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let review = sqlx::query_as::<_, Review>(
            r#"
            UPDATE reviews
            SET rating = COALESCE($2, rating),
                comment = COALESCE($3, comment),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(review_id)
        .bind(changes.rating)
        .bind(&changes.comment)
        .fetch_optional(&mut *tx)
        .await?;

        if let Some(review) = &review {
            refresh_rating_best_effort(&mut tx, review.provider_id).await;
        }

        tx.commit().await?;

        Ok(review)
    }

    async fn delete_review(&self, review_id: Uuid) -> Result<Option<Review>, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let review = sqlx::query_as::<_, Review>(r#"DELETE FROM reviews WHERE id = $1 RETURNING *"#)
            .bind(review_id)
            .fetch_optional(&mut *tx)
            .await?;

        if let Some(review) = &review {
            refresh_rating_best_effort(&mut tx, review.provider_id).await;
        }

        tx.commit().await?;

        Ok(review)
    }

    async fn get_rating_distribution(
        &self,
        provider_id: Uuid,
    ) -> Result<RatingDistribution, sqlx::Error> {
        let mut conn = self.pool.acquire().await?;
        fetch_distribution(&mut conn, provider_id).await
    }
}
