use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::PgConnection;
use uuid::Uuid;

use super::db::{load_user_summaries, DBClient};
use crate::models::{
    bookingmodel::{
        Booking, BookingChanges, BookingDetails, BookingListFilter, BookingSide, BookingStatus,
        NewBooking,
    },
    providermodel::ServiceCategory,
};

#[async_trait]
pub trait BookingExt {
    async fn create_booking(&self, booking: NewBooking) -> Result<BookingDetails, sqlx::Error>;

    async fn get_booking(&self, booking_id: Uuid) -> Result<Option<Booking>, sqlx::Error>;

    async fn get_booking_details(
        &self,
        booking_id: Uuid,
    ) -> Result<Option<BookingDetails>, sqlx::Error>;

    /// Newest first.
    async fn list_bookings(
        &self,
        filter: &BookingListFilter,
    ) -> Result<Vec<BookingDetails>, sqlx::Error>;

    /// Applies `changes` and stores `total_amount` as given, but only while the
    /// booking is still pending. `None` means no pending booking matched.
    async fn update_booking(
        &self,
        booking_id: Uuid,
        changes: &BookingChanges,
        total_amount: Option<f64>,
    ) -> Result<Option<BookingDetails>, sqlx::Error>;

    /// Moves the booking to `to` only if it is still in `from`.
    async fn update_booking_status(
        &self,
        booking_id: Uuid,
        from: BookingStatus,
        to: BookingStatus,
    ) -> Result<Option<BookingDetails>, sqlx::Error>;

    async fn delete_pending_booking(&self, booking_id: Uuid) -> Result<bool, sqlx::Error>;
}

async fn load_categories(
    conn: &mut PgConnection,
    ids: &[Uuid],
) -> Result<HashMap<Uuid, ServiceCategory>, sqlx::Error> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }

    let categories = sqlx::query_as::<_, ServiceCategory>(
        r#"SELECT * FROM service_categories WHERE id = ANY($1)"#,
    )
    .bind(ids)
    .fetch_all(&mut *conn)
    .await?;

    Ok(categories.into_iter().map(|c| (c.id, c)).collect())
}

async fn attach_details(
    conn: &mut PgConnection,
    bookings: Vec<Booking>,
) -> Result<Vec<BookingDetails>, sqlx::Error> {
    let mut user_ids: Vec<Uuid> = bookings
        .iter()
        .flat_map(|b| [b.customer_id, b.provider_id])
        .collect();
    user_ids.sort_unstable();
    user_ids.dedup();

    let mut category_ids: Vec<Uuid> = bookings.iter().map(|b| b.category_id).collect();
    category_ids.sort_unstable();
    category_ids.dedup();

    let users = load_user_summaries(&mut *conn, &user_ids).await?;
    let categories = load_categories(&mut *conn, &category_ids).await?;

    Ok(bookings
        .into_iter()
        .map(|booking| BookingDetails {
            customer: users.get(&booking.customer_id).cloned(),
            provider: users.get(&booking.provider_id).cloned(),
            service_category: categories.get(&booking.category_id).cloned(),
            booking,
        })
        .collect())
}

async fn single_details(
    conn: &mut PgConnection,
    booking: Option<Booking>,
) -> Result<Option<BookingDetails>, sqlx::Error> {
    match booking {
        Some(booking) => Ok(attach_details(conn, vec![booking]).await?.pop()),
        None => Ok(None),
    }
}

#[async_trait]
impl BookingExt for DBClient {
    async fn create_booking(&self, booking: NewBooking) -> Result<BookingDetails, sqlx::Error> {
        let mut conn = self.pool.acquire().await?;

        let booking = sqlx::query_as::<_, Booking>(
            r#"
            INSERT INTO bookings
                (customer_id, provider_id, category_id, title, description,
                 scheduled_date, estimated_hours, total_amount, customer_location)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(booking.customer_id)
        .bind(booking.provider_id)
        .bind(booking.category_id)
        .bind(booking.title)
        .bind(booking.description)
        .bind(booking.scheduled_date)
        .bind(booking.estimated_hours)
        .bind(booking.total_amount)
        .bind(booking.customer_location)
        .fetch_one(&mut *conn)
        .await?;

        let details = single_details(&mut conn, Some(booking)).await?;
        details.ok_or(sqlx::Error::RowNotFound)
    }

    async fn get_booking(&self, booking_id: Uuid) -> Result<Option<Booking>, sqlx::Error> {
        sqlx::query_as::<_, Booking>(r#"SELECT * FROM bookings WHERE id = $1"#)
            .bind(booking_id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn get_booking_details(
        &self,
        booking_id: Uuid,
    ) -> Result<Option<BookingDetails>, sqlx::Error> {
        let mut conn = self.pool.acquire().await?;

        let booking = sqlx::query_as::<_, Booking>(r#"SELECT * FROM bookings WHERE id = $1"#)
            .bind(booking_id)
            .fetch_optional(&mut *conn)
            .await?;

        single_details(&mut conn, booking).await
    }

    async fn list_bookings(
        &self,
        filter: &BookingListFilter,
    ) -> Result<Vec<BookingDetails>, sqlx::Error> {
        let mut conn = self.pool.acquire().await?;

        let query = match filter.side {
            BookingSide::AsCustomer => {
                r#"
                SELECT * FROM bookings
                WHERE customer_id = $1 AND ($2::booking_status IS NULL OR status = $2)
                ORDER BY created_at DESC
                "#
            }
            BookingSide::AsProvider => {
                r#"
                SELECT * FROM bookings
                WHERE provider_id = $1 AND ($2::booking_status IS NULL OR status = $2)
                ORDER BY created_at DESC
                "#
            }
        };

        let bookings = sqlx::query_as::<_, Booking>(query)
            .bind(filter.user_id)
            .bind(filter.status)
            .fetch_all(&mut *conn)
            .await?;

        attach_details(&mut conn, bookings).await
    }

    async fn update_booking(
        &self,
        booking_id: Uuid,
        changes: &BookingChanges,
        total_amount: Option<f64>,
    ) -> Result<Option<BookingDetails>, sqlx::Error> {
        let mut conn = self.pool.acquire().await?;

        let booking = sqlx::query_as::<_, Booking>(
            r#"
            UPDATE bookings
            SET title = COALESCE($2, title),
                description = COALESCE($3, description),
                scheduled_date = COALESCE($4, scheduled_date),
                estimated_hours = COALESCE($5, estimated_hours),
                customer_location = COALESCE($6, customer_location),
                total_amount = $7,
                updated_at = NOW()
            WHERE id = $1 AND status = 'pending'
            RETURNING *
            "#,
        )
        .bind(booking_id)
        .bind(&changes.title)
        .bind(&changes.description)
        .bind(changes.scheduled_date)
        .bind(changes.estimated_hours)
        .bind(&changes.customer_location)
        .bind(total_amount)
        .fetch_optional(&mut *conn)
        .await?;

        single_details(&mut conn, booking).await
    }

    async fn update_booking_status(
        &self,
        booking_id: Uuid,
        from: BookingStatus,
        to: BookingStatus,
    ) -> Result<Option<BookingDetails>, sqlx::Error> {
        let mut conn = self.pool.acquire().await?;

        let booking = sqlx::query_as::<_, Booking>(
            r#"
            UPDATE bookings
            SET status = $3, updated_at = NOW()
            WHERE id = $1 AND status = $2
            RETURNING *
            "#,
        )
        .bind(booking_id)
        .bind(from)
        .bind(to)
        .fetch_optional(&mut *conn)
        .await?;

        single_details(&mut conn, booking).await
    }

    async fn delete_pending_booking(&self, booking_id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(r#"DELETE FROM bookings WHERE id = $1 AND status = 'pending'"#)
            .bind(booking_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
