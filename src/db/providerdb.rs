use async_trait::async_trait;
use sqlx::{types::Json, PgConnection};
use uuid::Uuid;

use super::db::{like_pattern, load_user_summaries, DBClient};
use crate::models::{
    bookingmodel::compute_total_amount,
    providermodel::{
        NewCategory, ProviderFilter, ProviderListing, ProviderProfileChanges, ServiceCategory,
        ServiceProvider, DEFAULT_CATEGORIES,
    },
};

#[async_trait]
pub trait ProviderExt {
    /// Looks a profile up by its own id.
    async fn get_provider(&self, provider_id: Uuid) -> Result<Option<ProviderListing>, sqlx::Error>;

    async fn get_provider_by_user_id(
        &self,
        user_id: Uuid,
    ) -> Result<Option<ServiceProvider>, sqlx::Error>;

    /// Active providers matching `filter`, best rated first.
    async fn search_providers(
        &self,
        filter: &ProviderFilter,
    ) -> Result<Vec<ProviderListing>, sqlx::Error>;

    /// Every profile, including those whose owner is deactivated.
    async fn get_all_providers(&self) -> Result<Vec<ProviderListing>, sqlx::Error>;

    /// Creates the profile on first use, otherwise applies `changes`. A rate
    /// change reprices the provider's pending bookings in the same transaction.
    async fn save_provider_profile(
        &self,
        user_id: Uuid,
        changes: &ProviderProfileChanges,
    ) -> Result<ServiceProvider, sqlx::Error>;

    async fn toggle_provider_verification(
        &self,
        provider_id: Uuid,
    ) -> Result<Option<ServiceProvider>, sqlx::Error>;
}

#[async_trait]
pub trait CategoryExt {
    async fn get_categories(&self, active_only: bool) -> Result<Vec<ServiceCategory>, sqlx::Error>;

    async fn get_category(&self, category_id: Uuid) -> Result<Option<ServiceCategory>, sqlx::Error>;

    async fn create_category(&self, category: NewCategory) -> Result<ServiceCategory, sqlx::Error>;

    async fn toggle_category_status(
        &self,
        category_id: Uuid,
    ) -> Result<Option<ServiceCategory>, sqlx::Error>;

    /// Inserts the built-in categories that are missing. Returns how many were added.
    async fn seed_default_categories(&self) -> Result<u64, sqlx::Error>;
}

async fn attach_users(
    conn: &mut PgConnection,
    profiles: Vec<ServiceProvider>,
) -> Result<Vec<ProviderListing>, sqlx::Error> {
    let user_ids: Vec<Uuid> = profiles.iter().map(|p| p.user_id).collect();
    let mut users = load_user_summaries(conn, &user_ids).await?;

    Ok(profiles
        .into_iter()
        .filter_map(|profile| {
            users
                .remove(&profile.user_id)
                .map(|user| ProviderListing { profile, user })
        })
        .collect())
}

#[async_trait]
impl ProviderExt for DBClient {
    async fn get_provider(&self, provider_id: Uuid) -> Result<Option<ProviderListing>, sqlx::Error> {
        let mut conn = self.pool.acquire().await?;

        let profile = sqlx::query_as::<_, ServiceProvider>(
            r#"SELECT * FROM service_providers WHERE id = $1"#,
        )
        .bind(provider_id)
        .fetch_optional(&mut *conn)
        .await?;

        match profile {
            Some(profile) => Ok(attach_users(&mut conn, vec![profile]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn get_provider_by_user_id(
        &self,
        user_id: Uuid,
    ) -> Result<Option<ServiceProvider>, sqlx::Error> {
        sqlx::query_as::<_, ServiceProvider>(
            r#"SELECT * FROM service_providers WHERE user_id = $1"#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn search_providers(
        &self,
        filter: &ProviderFilter,
    ) -> Result<Vec<ProviderListing>, sqlx::Error> {
        let mut conn = self.pool.acquire().await?;

        let profiles = sqlx::query_as::<_, ServiceProvider>(
            r#"
            SELECT sp.*
            FROM service_providers sp
            JOIN users u ON u.id = sp.user_id
            WHERE u.is_active = TRUE
              AND ($1::text IS NULL OR EXISTS (
                    SELECT 1 FROM jsonb_array_elements_text(sp.skills) AS skill
                    WHERE skill ILIKE $1))
              AND ($2::text IS NULL OR u.location ILIKE $2)
              AND ($3::float8 IS NULL OR sp.rating >= $3)
              AND ($4::float8 IS NULL OR sp.hourly_rate <= $4)
              AND ($5::text IS NULL
                    OR u.full_name ILIKE $5
                    OR sp.description ILIKE $5
                    OR EXISTS (
                        SELECT 1 FROM jsonb_array_elements_text(sp.skills) AS skill
                        WHERE skill ILIKE $5))
            ORDER BY sp.rating DESC, sp.total_reviews DESC, sp.created_at ASC
            "#,
        )
        .bind(filter.category.as_deref().map(like_pattern))
        .bind(filter.location.as_deref().map(like_pattern))
        .bind(filter.min_rating)
        .bind(filter.max_rate)
        .bind(filter.search.as_deref().map(like_pattern))
        .fetch_all(&mut *conn)
        .await?;

        attach_users(&mut conn, profiles).await
    }

    async fn get_all_providers(&self) -> Result<Vec<ProviderListing>, sqlx::Error> {
        let mut conn = self.pool.acquire().await?;

        let profiles = sqlx::query_as::<_, ServiceProvider>(
            r#"SELECT * FROM service_providers ORDER BY created_at DESC"#,
        )
        .fetch_all(&mut *conn)
        .await?;

        attach_users(&mut conn, profiles).await
    }

    async fn save_provider_profile(
        &self,
        user_id: Uuid,
        changes: &ProviderProfileChanges,
    ) -> Result<ServiceProvider, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let previous_rate: Option<f64> = sqlx::query_scalar(
            r#"SELECT hourly_rate FROM service_providers WHERE user_id = $1 FOR UPDATE"#,
        )
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?;

        let profile = sqlx::query_as::<_, ServiceProvider>(
            r#"
            INSERT INTO service_providers
                (user_id, skills, hourly_rate, experience_years, description, availability)
            VALUES ($1, COALESCE($2, '[]'::jsonb), COALESCE($3, 0), $4, $5, COALESCE($6, '{}'::jsonb))
            ON CONFLICT (user_id) DO UPDATE SET
                skills = COALESCE($2, service_providers.skills),
                hourly_rate = COALESCE($3, service_providers.hourly_rate),
                experience_years = COALESCE($4, service_providers.experience_years),
                description = COALESCE($5, service_providers.description),
                availability = COALESCE($6, service_providers.availability),
                updated_at = NOW()
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(changes.skills.as_ref().map(Json))
        .bind(changes.hourly_rate)
        .bind(changes.experience_years)
        .bind(&changes.description)
        .bind(changes.availability.as_ref().map(Json))
        .fetch_one(&mut *tx)
        .await?;

        if previous_rate != Some(profile.hourly_rate) {
            let pending: Vec<(Uuid, Option<f64>)> = sqlx::query_as(
                r#"
                SELECT id, estimated_hours FROM bookings
                WHERE provider_id = $1 AND status = 'pending'
                FOR UPDATE
                "#,
            )
            .bind(user_id)
            .fetch_all(&mut *tx)
            .await?;

            let (ids, totals): (Vec<Uuid>, Vec<Option<f64>>) = pending
                .into_iter()
                .map(|(id, hours)| (id, compute_total_amount(hours, Some(profile.hourly_rate))))
                .unzip();

            if !ids.is_empty() {
                sqlx::query(
                    r#"
                    UPDATE bookings AS b
                    SET total_amount = v.total, updated_at = NOW()
                    FROM UNNEST($1::uuid[], $2::float8[]) AS v(id, total)
                    WHERE b.id = v.id
                    "#,
                )
                .bind(&ids)
                .bind(&totals)
                .execute(&mut *tx)
                .await?;

                tracing::info!(
                    provider_id = %user_id,
                    repriced = ids.len(),
                    hourly_rate = profile.hourly_rate,
                    "repriced pending bookings"
                );
            }
        }

        tx.commit().await?;

        Ok(profile)
    }

    async fn toggle_provider_verification(
        &self,
        provider_id: Uuid,
    ) -> Result<Option<ServiceProvider>, sqlx::Error> {
        sqlx::query_as::<_, ServiceProvider>(
            r#"
            UPDATE service_providers
            SET is_verified = NOT is_verified, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(provider_id)
        .fetch_optional(&self.pool)
        .await
    }
}

#[async_trait]
impl CategoryExt for DBClient {
    async fn get_categories(&self, active_only: bool) -> Result<Vec<ServiceCategory>, sqlx::Error> {
        sqlx::query_as::<_, ServiceCategory>(
            r#"
            SELECT * FROM service_categories
            WHERE is_active = TRUE OR $1 = FALSE
            ORDER BY name ASC
            "#,
        )
        .bind(active_only)
        .fetch_all(&self.pool)
        .await
    }

    async fn get_category(&self, category_id: Uuid) -> Result<Option<ServiceCategory>, sqlx::Error> {
        sqlx::query_as::<_, ServiceCategory>(r#"SELECT * FROM service_categories WHERE id = $1"#)
            .bind(category_id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn create_category(&self, category: NewCategory) -> Result<ServiceCategory, sqlx::Error> {
        sqlx::query_as::<_, ServiceCategory>(
            r#"
            INSERT INTO service_categories (name, description, icon)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(category.name)
        .bind(category.description)
        .bind(category.icon)
        .fetch_one(&self.pool)
        .await
    }

    async fn toggle_category_status(
        &self,
        category_id: Uuid,
    ) -> Result<Option<ServiceCategory>, sqlx::Error> {
        sqlx::query_as::<_, ServiceCategory>(
            r#"
            UPDATE service_categories
            SET is_active = NOT is_active
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(category_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn seed_default_categories(&self) -> Result<u64, sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        let mut inserted = 0;

        for &(name, description, icon) in DEFAULT_CATEGORIES {
            let result = sqlx::query(
                r#"
                INSERT INTO service_categories (name, description, icon)
                VALUES ($1, $2, $3)
                ON CONFLICT (name) DO NOTHING
                "#,
            )
            .bind(name)
            .bind(description)
            .bind(icon)
            .execute(&mut *tx)
            .await?;
            inserted += result.rows_affected();
        }

        tx.commit().await?;

        Ok(inserted)
    }
}
