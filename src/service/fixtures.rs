//! Shared builders for service and router tests.

use std::sync::{Arc, OnceLock};

use chrono::{Duration, Utc};
use uuid::Uuid;

use crate::{
    db::{
        bookingdb::BookingExt, memory::MemoryStore, providerdb::CategoryExt, userdb::UserExt,
        Store,
    },
    models::{
        bookingmodel::{BookingDetails, NewBooking},
        providermodel::{NewProviderProfile, ServiceCategory},
        usermodel::{Caller, NewUser, User, UserRole},
    },
    utils::password,
};

pub const PASSWORD: &str = "password123";

/// Hashing is slow in debug builds, so every fixture user shares one hash.
pub fn password_hash() -> String {
    static HASH: OnceLock<String> = OnceLock::new();
    HASH.get_or_init(|| password::hash(PASSWORD).unwrap()).clone()
}

pub fn memory_store() -> Arc<MemoryStore> {
    Arc::new(MemoryStore::new())
}

pub async fn user(store: &Arc<MemoryStore>, username: &str, role: UserRole) -> User {
    let profile = (role == UserRole::ServiceProvider).then(|| NewProviderProfile {
        skills: vec!["Plumbing".to_string()],
        hourly_rate: 800.0,
        ..Default::default()
    });
    user_with_profile(store, username, role, profile).await
}

pub async fn user_with_profile(
    store: &Arc<MemoryStore>,
    username: &str,
    role: UserRole,
    profile: Option<NewProviderProfile>,
) -> User {
    store
        .register_user(
            NewUser {
                username: username.to_string(),
                email: format!("{}@example.com", username),
                password: password_hash(),
                full_name: format!("{} Tester", username),
                phone: None,
                location: Some("Kathmandu".to_string()),
                role,
            },
            profile,
            None,
        )
        .await
        .unwrap()
}

pub async fn category(store: &Arc<MemoryStore>) -> ServiceCategory {
    store.seed_default_categories().await.unwrap();
    store
        .get_categories(true)
        .await
        .unwrap()
        .into_iter()
        .find(|c| c.name == "Plumber")
        .unwrap()
}

pub fn caller(user: &User) -> Caller {
    Caller::from(user)
}

pub fn as_store(store: &Arc<MemoryStore>) -> Arc<dyn Store> {
    store.clone()
}

/// Inserts a booking straight into the store, bypassing service checks.
pub async fn booking(
    store: &Arc<MemoryStore>,
    customer: &User,
    provider: &User,
    category_id: Uuid,
    estimated_hours: Option<f64>,
) -> BookingDetails {
    store
        .create_booking(NewBooking {
            customer_id: customer.id,
            provider_id: provider.id,
            category_id,
            title: "Fix kitchen sink".to_string(),
            description: "Water leaking under the sink".to_string(),
            scheduled_date: Utc::now() + Duration::days(2),
            estimated_hours,
            total_amount: estimated_hours.map(|h| h * 800.0),
            customer_location: "Thamel".to_string(),
        })
        .await
        .unwrap()
}
