pub mod admin_service;
pub mod auth_service;
pub mod booking_service;
pub mod directory_service;
pub mod error;
#[cfg(test)]
pub mod fixtures;
pub mod review_service;
pub mod seed;
