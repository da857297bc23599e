use std::sync::Arc;

use uuid::Uuid;

use super::error::ServiceError;
use crate::{
    db::{bookingdb::BookingExt, providerdb::ProviderExt, reviewdb::ReviewExt, Store},
    dtos::reviewdtos::{CreateReviewDto, ReviewQueryDto, UpdateReviewDto},
    models::{
        bookingmodel::{BookingParty, BookingStatus},
        reviewmodel::{
            is_valid_rating, NewReview, ProviderRatingStats, Review, ReviewChanges, ReviewDetails,
            ReviewFilter,
        },
        usermodel::Caller,
    },
};

fn invalid_rating() -> ServiceError {
    ServiceError::BadRequest("Rating must be between 1 and 5".to_string())
}

#[derive(Debug, Clone)]
pub struct ReviewService {
    db_client: Arc<dyn Store>,
}

impl ReviewService {
    pub fn new(db_client: Arc<dyn Store>) -> Self {
        Self { db_client }
    }

    pub async fn create_review(
        &self,
        caller: &Caller,
        body: CreateReviewDto,
    ) -> Result<Review, ServiceError> {
        let booking = self
            .db_client
            .get_booking(body.booking_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Booking not found".to_string()))?;

        if booking.party_of(caller.user_id) != Some(BookingParty::Customer) {
            return Err(ServiceError::Forbidden(
                "Only the customer can review this booking".to_string(),
            ));
        }

        if booking.status != BookingStatus::Completed {
            return Err(ServiceError::InvalidState(
                "Can only review completed bookings".to_string(),
            ));
        }

        if self
            .db_client
            .get_review_by_booking(booking.id)
            .await?
            .is_some()
        {
            return Err(ServiceError::Conflict(
                "Review already exists for this booking".to_string(),
            ));
        }

        if !is_valid_rating(body.rating) {
            return Err(invalid_rating());
        }

        let review = self
            .db_client
            .create_review(NewReview {
                customer_id: caller.user_id,
                provider_id: booking.provider_id,
                booking_id: booking.id,
                rating: body.rating,
                comment: body.comment,
            })
            .await?;

        tracing::info!(
            review_id = %review.id,
            booking_id = %booking.id,
            provider_id = %booking.provider_id,
            rating = review.rating,
            "review created"
        );

        Ok(review)
    }

    pub async fn get_review(&self, review_id: Uuid) -> Result<ReviewDetails, ServiceError> {
        self.db_client
            .get_review(review_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Review not found".to_string()))
    }

    pub async fn list_reviews(&self, query: ReviewQueryDto) -> Result<Vec<ReviewDetails>, ServiceError> {
        let reviews = self.db_client.list_reviews(&ReviewFilter::from(query)).await?;
        Ok(reviews)
    }

    /// Reviews for the provider behind a profile id, newest first.
    pub async fn list_provider_reviews(
        &self,
        profile_id: Uuid,
    ) -> Result<Vec<ReviewDetails>, ServiceError> {
        let listing = self
            .db_client
            .get_provider(profile_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Provider not found".to_string()))?;

        let reviews = self
            .db_client
            .list_reviews(&ReviewFilter {
                provider_id: Some(listing.profile.user_id),
                ..Default::default()
            })
            .await?;

        Ok(reviews)
    }

    /// Computed live from the reviews table, so a stale cached rating on the
    /// profile never leaks into the stats.
    pub async fn get_provider_stats(
        &self,
        provider_id: Uuid,
    ) -> Result<ProviderRatingStats, ServiceError> {
        let distribution = self.db_client.get_rating_distribution(provider_id).await?;
        Ok(ProviderRatingStats::new(provider_id, &distribution))
    }

    pub async fn update_review(
        &self,
        caller: &Caller,
        review_id: Uuid,
        body: UpdateReviewDto,
    ) -> Result<Review, ServiceError> {
        self.authored_review(caller, review_id, "update").await?;

        let changes = ReviewChanges::from(body);
        if changes.rating.is_some_and(|rating| !is_valid_rating(rating)) {
            return Err(invalid_rating());
        }

        let review = self
            .db_client
            .update_review(review_id, &changes)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Review not found".to_string()))?;

        tracing::info!(review_id = %review_id, rating = review.rating, "review updated");

        Ok(review)
    }

    pub async fn delete_review(&self, caller: &Caller, review_id: Uuid) -> Result<(), ServiceError> {
        self.authored_review(caller, review_id, "delete").await?;

        let removed = self
            .db_client
            .delete_review(review_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Review not found".to_string()))?;

        tracing::info!(review_id = %review_id, provider_id = %removed.provider_id, "review deleted");
        Ok(())
    }

    async fn authored_review(
        &self,
        caller: &Caller,
        review_id: Uuid,
        action: &str,
    ) -> Result<ReviewDetails, ServiceError> {
        let details = self.get_review(review_id).await?;

        if details.review.customer_id != caller.user_id {
            return Err(ServiceError::Forbidden(format!(
                "Only the author can {} this review",
                action
            )));
        }

        Ok(details)
    }
}
