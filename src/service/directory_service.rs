use std::sync::Arc;

use uuid::Uuid;

use super::error::ServiceError;
use crate::{
    db::{
        providerdb::{CategoryExt, ProviderExt},
        Store,
    },
    dtos::providerdtos::{ProviderSearchQueryDto, UpdateProviderProfileDto},
    models::{
        providermodel::{
            ProviderFilter, ProviderListing, ProviderProfileChanges, ServiceCategory,
            ServiceProvider,
        },
        usermodel::{Caller, UserRole},
    },
};

/// Public catalogue of categories and providers, plus a provider's own profile.
#[derive(Debug, Clone)]
pub struct DirectoryService {
    db_client: Arc<dyn Store>,
}

impl DirectoryService {
    pub fn new(db_client: Arc<dyn Store>) -> Self {
        Self { db_client }
    }

    pub async fn list_categories(&self) -> Result<Vec<ServiceCategory>, ServiceError> {
        let categories = self.db_client.get_categories(true).await?;
        Ok(categories)
    }

    pub async fn list_providers(
        &self,
        query: ProviderSearchQueryDto,
    ) -> Result<Vec<ProviderListing>, ServiceError> {
        let filter = ProviderFilter::from(query);
        let providers = self.db_client.search_providers(&filter).await?;

        tracing::debug!(
            results = providers.len(),
            category = ?filter.category,
            location = ?filter.location,
            "provider search"
        );

        Ok(providers)
    }

    pub async fn get_provider(&self, profile_id: Uuid) -> Result<ProviderListing, ServiceError> {
        self.db_client
            .get_provider(profile_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Provider not found".to_string()))
    }

    pub async fn get_own_profile(&self, caller: &Caller) -> Result<ServiceProvider, ServiceError> {
        ensure_provider(caller)?;

        self.db_client
            .get_provider_by_user_id(caller.user_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Provider profile not found".to_string()))
    }

    /// Creates the profile on first save.
    pub async fn update_own_profile(
        &self,
        caller: &Caller,
        body: UpdateProviderProfileDto,
    ) -> Result<ServiceProvider, ServiceError> {
        ensure_provider(caller)?;

        let changes = ProviderProfileChanges::from(body);
        let profile = self
            .db_client
            .save_provider_profile(caller.user_id, &changes)
            .await?;

        tracing::info!(
            user_id = %caller.user_id,
            profile_id = %profile.id,
            rate_changed = changes.hourly_rate.is_some(),
            "provider profile saved"
        );

        Ok(profile)
    }
}

fn ensure_provider(caller: &Caller) -> Result<(), ServiceError> {
    if caller.role != UserRole::ServiceProvider {
        return Err(ServiceError::Forbidden(
            "Only service providers have a provider profile".to_string(),
        ));
    }
    Ok(())
}
