use std::{collections::BTreeMap, sync::Arc};

use uuid::Uuid;

use super::error::ServiceError;
use crate::{
    db::{
        admindb::AdminExt,
        providerdb::{CategoryExt, ProviderExt},
        userdb::UserExt,
        Store,
    },
    dtos::{
        admindtos::{
            AdminStatsDto, ToggleCategoryResponse, ToggleUserStatusResponse,
            ToggleVerificationResponse,
        },
        providerdtos::CreateCategoryDto,
        userdtos::FilterUserDto,
    },
    models::{
        bookingmodel::BookingStatus,
        providermodel::{NewCategory, ProviderListing, ServiceCategory},
        usermodel::Caller,
    },
};

const ALL_STATUSES: [BookingStatus; 5] = [
    BookingStatus::Pending,
    BookingStatus::Confirmed,
    BookingStatus::InProgress,
    BookingStatus::Completed,
    BookingStatus::Cancelled,
];

fn ensure_admin(caller: &Caller) -> Result<(), ServiceError> {
    if !caller.is_admin() {
        return Err(ServiceError::Forbidden("Admin access required".to_string()));
    }
    Ok(())
}

fn flag_word(flag: bool, on: &'static str, off: &'static str) -> &'static str {
    if flag {
        on
    } else {
        off
    }
}

#[derive(Debug, Clone)]
pub struct AdminService {
    db_client: Arc<dyn Store>,
}

impl AdminService {
    pub fn new(db_client: Arc<dyn Store>) -> Self {
        Self { db_client }
    }

    pub async fn stats(&self, caller: &Caller) -> Result<AdminStatsDto, ServiceError> {
        ensure_admin(caller)?;

        let counts = self.db_client.get_platform_counts().await?;

        let mut bookings_by_status: BTreeMap<String, i64> = ALL_STATUSES
            .iter()
            .map(|status| (status.to_string(), 0))
            .collect();
        for (status, count) in counts.bookings_by_status {
            bookings_by_status.insert(status.to_string(), count);
        }

        Ok(AdminStatsDto {
            total_users: counts.users,
            total_providers: counts.providers,
            total_bookings: counts.bookings,
            total_categories: counts.categories,
            bookings_by_status,
        })
    }

    pub async fn list_users(&self, caller: &Caller) -> Result<Vec<FilterUserDto>, ServiceError> {
        ensure_admin(caller)?;
        let users = self.db_client.get_users().await?;
        Ok(FilterUserDto::filter_users(&users))
    }

    pub async fn list_providers(&self, caller: &Caller) -> Result<Vec<ProviderListing>, ServiceError> {
        ensure_admin(caller)?;
        let providers = self.db_client.get_all_providers().await?;
        Ok(providers)
    }

    pub async fn toggle_user_status(
        &self,
        caller: &Caller,
        user_id: Uuid,
    ) -> Result<ToggleUserStatusResponse, ServiceError> {
        ensure_admin(caller)?;

        if caller.user_id == user_id {
            return Err(ServiceError::BadRequest(
                "You cannot change your own account status".to_string(),
            ));
        }

        let user = self
            .db_client
            .toggle_user_status(user_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("User not found".to_string()))?;

        tracing::info!(
            admin_id = %caller.user_id,
            user_id = %user.id,
            is_active = user.is_active,
            "user status toggled"
        );

        Ok(ToggleUserStatusResponse {
            message: format!(
                "User {} successfully",
                flag_word(user.is_active, "activated", "deactivated")
            ),
            is_active: user.is_active,
        })
    }

    pub async fn toggle_provider_verification(
        &self,
        caller: &Caller,
        profile_id: Uuid,
    ) -> Result<ToggleVerificationResponse, ServiceError> {
        ensure_admin(caller)?;

        let profile = self
            .db_client
            .toggle_provider_verification(profile_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Provider not found".to_string()))?;

        tracing::info!(
            admin_id = %caller.user_id,
            profile_id = %profile.id,
            is_verified = profile.is_verified,
            "provider verification toggled"
        );

        Ok(ToggleVerificationResponse {
            message: format!(
                "Provider {} successfully",
                flag_word(profile.is_verified, "verified", "unverified")
            ),
            is_verified: profile.is_verified,
        })
    }

    pub async fn create_category(
        &self,
        caller: &Caller,
        body: CreateCategoryDto,
    ) -> Result<ServiceCategory, ServiceError> {
        ensure_admin(caller)?;

        let category = NewCategory::from(body);
        if category.name.is_empty() {
            return Err(ServiceError::BadRequest("Category name is required".to_string()));
        }

        let category = self.db_client.create_category(category).await?;
        tracing::info!(category_id = %category.id, name = %category.name, "category created");

        Ok(category)
    }

    pub async fn toggle_category_status(
        &self,
        caller: &Caller,
        category_id: Uuid,
    ) -> Result<ToggleCategoryResponse, ServiceError> {
        ensure_admin(caller)?;

        let category = self
            .db_client
            .toggle_category_status(category_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Category not found".to_string()))?;

        tracing::info!(
            category_id = %category.id,
            is_active = category.is_active,
            "category status toggled"
        );

        Ok(ToggleCategoryResponse {
            message: format!(
                "Category {} successfully",
                flag_word(category.is_active, "activated", "deactivated")
            ),
            is_active: category.is_active,
        })
    }
}
