use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct AdminStatsDto {
    pub total_users: i64,
    pub total_providers: i64,
    pub total_bookings: i64,
    pub total_categories: i64,
    pub bookings_by_status: BTreeMap<String, i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToggleUserStatusResponse {
    pub message: String,
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToggleVerificationResponse {
    pub message: String,
    pub is_verified: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToggleCategoryResponse {
    pub message: String,
    pub is_active: bool,
}
