use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{providermodel::ServiceCategory, usermodel::UserSummary};

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "booking_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    InProgress,
    Completed,
    Cancelled,
}

/// The side of a booking a user is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingParty {
    Customer,
    Provider,
}

impl BookingStatus {
    pub fn to_str(&self) -> &str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::InProgress => "in_progress",
            BookingStatus::Completed => "completed",
            BookingStatus::Cancelled => "cancelled",
        }
    }

    pub fn next_states(&self) -> &'static [BookingStatus] {
        match self {
            BookingStatus::Pending => &[BookingStatus::Confirmed, BookingStatus::Cancelled],
            BookingStatus::Confirmed => &[BookingStatus::InProgress, BookingStatus::Cancelled],
            BookingStatus::InProgress => &[BookingStatus::Completed, BookingStatus::Cancelled],
            BookingStatus::Completed | BookingStatus::Cancelled => &[],
        }
    }

    pub fn can_transition_to(&self, next: BookingStatus) -> bool {
        self.next_states().contains(&next)
    }

    pub fn is_terminal(&self) -> bool {
        self.next_states().is_empty()
    }

    /// Whether `party` may move a booking into this status. Only the
    /// provider drives work forward; either side may cancel.
    pub fn permits(&self, party: BookingParty) -> bool {
        match self {
            BookingStatus::Confirmed | BookingStatus::InProgress | BookingStatus::Completed => {
                party == BookingParty::Provider
            }
            BookingStatus::Cancelled | BookingStatus::Pending => true,
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, PartialEq)]
pub struct Booking {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub provider_id: Uuid,
    pub category_id: Uuid,
    pub title: String,
    pub description: String,
    pub scheduled_date: DateTime<Utc>,
    pub estimated_hours: Option<f64>,
    pub total_amount: Option<f64>,
    pub status: BookingStatus,
    pub customer_location: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    pub fn party_of(&self, user_id: Uuid) -> Option<BookingParty> {
        if user_id == self.customer_id {
            Some(BookingParty::Customer)
        } else if user_id == self.provider_id {
            Some(BookingParty::Provider)
        } else {
            None
        }
    }
}

/// Booking with its participants and category resolved.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingDetails {
    #[serde(flatten)]
    pub booking: Booking,
    pub customer: Option<UserSummary>,
    pub provider: Option<UserSummary>,
    pub service_category: Option<ServiceCategory>,
}

#[derive(Debug, Clone)]
pub struct NewBooking {
    pub customer_id: Uuid,
    pub provider_id: Uuid,
    pub category_id: Uuid,
    pub title: String,
    pub description: String,
    pub scheduled_date: DateTime<Utc>,
    pub estimated_hours: Option<f64>,
    pub total_amount: Option<f64>,
    pub customer_location: String,
}

/// Detail edits allowed while a booking is pending.
#[derive(Debug, Clone, Default)]
pub struct BookingChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub scheduled_date: Option<DateTime<Utc>>,
    pub estimated_hours: Option<f64>,
    pub customer_location: Option<String>,
}

impl BookingChanges {
    pub fn apply_to(&self, booking: &mut Booking) {
        if let Some(title) = &self.title {
            booking.title = title.clone();
        }
        if let Some(description) = &self.description {
            booking.description = description.clone();
        }
        if let Some(date) = self.scheduled_date {
            booking.scheduled_date = date;
        }
        if let Some(hours) = self.estimated_hours {
            booking.estimated_hours = Some(hours);
        }
        if let Some(location) = &self.customer_location {
            booking.customer_location = location.clone();
        }
    }
}

/// Which side of their bookings a user wants to list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingSide {
    AsCustomer,
    AsProvider,
}

#[derive(Debug, Clone, Copy)]
pub struct BookingListFilter {
    pub user_id: Uuid,
    pub side: BookingSide,
    pub status: Option<BookingStatus>,
}

/// Price of a booking: hours times the hourly rate, in whole cents.
pub fn compute_total_amount(estimated_hours: Option<f64>, hourly_rate: Option<f64>) -> Option<f64> {
    match (estimated_hours, hourly_rate) {
        (Some(hours), Some(rate)) => Some(round_currency(hours * rate)),
        _ => None,
    }
}

pub fn round_currency(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}
