use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::bookingmodel::{BookingChanges, BookingStatus};

#[derive(Validate, Debug, Clone, Serialize, Deserialize)]
pub struct CreateBookingDto {
    pub provider_id: Uuid,

    #[serde(alias = "service_category_id")]
    pub category_id: Uuid,

    #[validate(length(min = 1, max = 200, message = "Title must be between 1-200 characters"))]
    pub title: String,

    #[validate(length(min = 1, max = 5000, message = "Description is required"))]
    pub description: String,

    pub scheduled_date: DateTime<Utc>,

    #[validate(range(min = 0.25, max = 1000.0, message = "Estimated hours must be between 0.25-1000"))]
    pub estimated_hours: Option<f64>,

    #[validate(length(min = 1, max = 200, message = "Customer location must be between 1-200 characters"))]
    pub customer_location: String,
}

#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
pub struct UpdateBookingDto {
    #[validate(length(min = 1, max = 200, message = "Title must be between 1-200 characters"))]
    pub title: Option<String>,

    #[validate(length(min = 1, max = 5000, message = "Description cannot be empty"))]
    pub description: Option<String>,

    pub scheduled_date: Option<DateTime<Utc>>,

    #[validate(range(min = 0.25, max = 1000.0, message = "Estimated hours must be between 0.25-1000"))]
    pub estimated_hours: Option<f64>,

    #[validate(length(min = 1, max = 200, message = "Customer location must be between 1-200 characters"))]
    pub customer_location: Option<String>,
}

impl From<UpdateBookingDto> for BookingChanges {
    fn from(dto: UpdateBookingDto) -> Self {
        BookingChanges {
            title: dto.title,
            description: dto.description,
            scheduled_date: dto.scheduled_date,
            estimated_hours: dto.estimated_hours,
            customer_location: dto.customer_location,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateBookingStatusDto {
    pub booking_id: Option<Uuid>,
    pub status: BookingStatus,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BookingRoleQuery {
    Customer,
    Provider,
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct BookingQueryDto {
    pub status: Option<BookingStatus>,
    pub role: Option<BookingRoleQuery>,
}
