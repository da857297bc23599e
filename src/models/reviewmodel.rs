use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::usermodel::UserSummary;

pub const MIN_RATING: i32 = 1;
pub const MAX_RATING: i32 = 5;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, PartialEq)]
pub struct Review {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub provider_id: Uuid,
    pub booking_id: Uuid,
    pub rating: i32,
    pub comment: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewDetails {
    #[serde(flatten)]
    pub review: Review,
    pub customer: Option<UserSummary>,
}

#[derive(Debug, Clone)]
pub struct NewReview {
    pub customer_id: Uuid,
    pub provider_id: Uuid,
    pub booking_id: Uuid,
    pub rating: i32,
    pub comment: String,
}

#[derive(Debug, Clone, Default)]
pub struct ReviewChanges {
    pub rating: Option<i32>,
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ReviewFilter {
    pub provider_id: Option<Uuid>,
    pub customer_id: Option<Uuid>,
    pub booking_id: Option<Uuid>,
}

impl ReviewFilter {
    pub fn matches(&self, review: &Review) -> bool {
        self.provider_id.map_or(true, |id| review.provider_id == id)
            && self.customer_id.map_or(true, |id| review.customer_id == id)
            && self.booking_id.map_or(true, |id| review.booking_id == id)
    }
}

pub fn is_valid_rating(rating: i32) -> bool {
    (MIN_RATING..=MAX_RATING).contains(&rating)
}

/// Count of reviews per star value; index 0 holds one-star reviews.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RatingDistribution(pub [i64; 5]);

impl RatingDistribution {
    pub fn from_ratings<I: IntoIterator<Item = i32>>(ratings: I) -> Self {
        let mut distribution = RatingDistribution::default();
        for rating in ratings {
            distribution.record(rating, 1);
        }
        distribution
    }

    /// Adds `count` reviews with the given rating. Out-of-range ratings are
    /// ignored since the schema rejects them.
    pub fn record(&mut self, rating: i32, count: i64) {
        if is_valid_rating(rating) {
            self.0[(rating - MIN_RATING) as usize] += count;
        }
    }

    pub fn total(&self) -> i64 {
        self.0.iter().sum()
    }

    /// Mean rating rounded half-up to two decimals, 0 when there are no reviews.
    pub fn average(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        let weighted: i64 = self
            .0
            .iter()
            .enumerate()
            .map(|(idx, count)| (idx as i64 + MIN_RATING as i64) * count)
            .sum();
        // integer half-up rounding of weighted / total to hundredths
        let cents = (2 * weighted * 100 + total) / (2 * total);
        cents as f64 / 100.0
    }

    pub fn summary(&self) -> RatingSummary {
        RatingSummary {
            rating: self.average(),
            total_reviews: self.total() as i32,
        }
    }

    pub fn buckets(&self) -> BTreeMap<String, i64> {
        (MIN_RATING..=MAX_RATING)
            .map(|rating| (rating.to_string(), self.0[(rating - MIN_RATING) as usize]))
            .collect()
    }
}

/// Cached aggregate stored on the provider profile.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RatingSummary {
    pub rating: f64,
    pub total_reviews: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProviderRatingStats {
    pub provider_id: Uuid,
    pub average_rating: f64,
    pub total_reviews: i64,
    pub rating_distribution: BTreeMap<String, i64>,
}

impl ProviderRatingStats {
    pub fn new(provider_id: Uuid, distribution: &RatingDistribution) -> Self {
        ProviderRatingStats {
            provider_id,
            average_rating: distribution.average(),
            total_reviews: distribution.total(),
            rating_distribution: distribution.buckets(),
        }
    }
}
