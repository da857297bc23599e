use super::bookingmodel::BookingStatus;

/// Row counts backing the admin dashboard.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlatformCounts {
    pub users: i64,
    pub providers: i64,
    pub bookings: i64,
    pub categories: i64,
    pub bookings_by_status: Vec<(BookingStatus, i64)>,
}
