use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::reviewmodel::{ReviewChanges, ReviewFilter};

#[derive(Validate, Debug, Clone, Serialize, Deserialize)]
pub struct CreateReviewDto {
    pub booking_id: Uuid,
    #[validate(range(min = 1, max = 5, message = "Rating must be between 1 and 5"))]
    pub rating: i32,
    #[serde(default)]
    #[validate(length(max = 2000, message = "Comment must be at most 2000 characters"))]
    pub comment: String,
}

#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
pub struct UpdateReviewDto {
    #[validate(range(min = 1, max = 5, message = "Rating must be between 1 and 5"))]
    pub rating: Option<i32>,
    #[validate(length(max = 2000, message = "Comment must be at most 2000 characters"))]
    pub comment: Option<String>,
}

impl From<UpdateReviewDto> for ReviewChanges {
    fn from(dto: UpdateReviewDto) -> Self {
        ReviewChanges {
            rating: dto.rating,
            comment: dto.comment,
        }
    }
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct ReviewQueryDto {
    pub provider_id: Option<Uuid>,
    pub customer_id: Option<Uuid>,
    pub booking_id: Option<Uuid>,
}

impl From<ReviewQueryDto> for ReviewFilter {
    fn from(query: ReviewQueryDto) -> Self {
        ReviewFilter {
            provider_id: query.provider_id,
            customer_id: query.customer_id,
            booking_id: query.booking_id,
        }
    }
}
