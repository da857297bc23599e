use std::collections::BTreeMap;

use chrono::NaiveTime;

use super::error::ServiceError;
use crate::{
    db::{
        providerdb::{CategoryExt, ProviderExt},
        userdb::UserExt,
        Store,
    },
    models::{
        providermodel::{Availability, NewProviderProfile, TimeRange, Weekday},
        usermodel::{NewUser, UserRole},
    },
    utils::password,
};

const DEMO_PASSWORD: &str = "password123";

struct DemoAccount {
    username: &'static str,
    email: &'static str,
    full_name: &'static str,
    phone: &'static str,
    location: &'static str,
    role: UserRole,
    profile: Option<DemoProfile>,
}

struct DemoProfile {
    skills: &'static [&'static str],
    hourly_rate: f64,
    experience_years: i32,
    description: &'static str,
}

const DEMO_ACCOUNTS: &[DemoAccount] = &[
    DemoAccount {
        username: "customer_demo",
        email: "customer@demo.com",
        full_name: "Demo Customer",
        phone: "+977-9800000001",
        location: "Kathmandu",
        role: UserRole::Customer,
        profile: None,
    },
    DemoAccount {
        username: "provider_demo",
        email: "provider@demo.com",
        full_name: "Demo Provider",
        phone: "+977-9800000002",
        location: "Lalitpur",
        role: UserRole::ServiceProvider,
        profile: Some(DemoProfile {
            skills: &["Plumbing", "Electrical work"],
            hourly_rate: 800.0,
            experience_years: 5,
            description: "Experienced plumber and electrician serving the valley.",
        }),
    },
    DemoAccount {
        username: "cleaner_demo",
        email: "cleaner@demo.com",
        full_name: "Demo Cleaner",
        phone: "+977-9800000003",
        location: "Bhaktapur",
        role: UserRole::ServiceProvider,
        profile: Some(DemoProfile {
            skills: &["House cleaning", "Office cleaning"],
            hourly_rate: 500.0,
            experience_years: 3,
            description: "Thorough home and office cleaning.",
        }),
    },
    DemoAccount {
        username: "admin_demo",
        email: "admin@demo.com",
        full_name: "Demo Admin",
        phone: "+977-9800000000",
        location: "Kathmandu",
        role: UserRole::Admin,
        profile: None,
    },
];

/// Sunday to Friday, 09:00-17:00.
fn working_week() -> Availability {
    let hours = NaiveTime::from_hms_opt(9, 0, 0)
        .zip(NaiveTime::from_hms_opt(17, 0, 0))
        .and_then(|(start, end)| TimeRange::new(start, end).ok());

    let days = [
        Weekday::Sunday,
        Weekday::Monday,
        Weekday::Tuesday,
        Weekday::Wednesday,
        Weekday::Thursday,
        Weekday::Friday,
    ];

    Availability(
        hours
            .map(|range| days.into_iter().map(|day| (day, range)).collect())
            .unwrap_or_else(BTreeMap::new),
    )
}

/// Inserts the built-in service categories that are missing.
pub async fn seed_categories(db_client: &dyn Store) -> Result<u64, ServiceError> {
    let inserted = db_client.seed_default_categories().await?;
    if inserted > 0 {
        tracing::info!(inserted, "seeded default service categories");
    }
    Ok(inserted)
}

/// Creates the demo accounts that do not exist yet. Demo providers start
/// verified with no reviews.
pub async fn seed_demo_accounts(db_client: &dyn Store) -> Result<usize, ServiceError> {
    let hashed_password = password::hash(DEMO_PASSWORD)?;
    let mut created = 0;

    for account in DEMO_ACCOUNTS {
        if db_client
            .get_user(None, None, Some(account.email))
            .await?
            .is_some()
        {
            tracing::debug!(email = account.email, "demo account exists, skipping");
            continue;
        }

        let profile = account.profile.as_ref().map(|p| NewProviderProfile {
            skills: p.skills.iter().map(|s| s.to_string()).collect(),
            hourly_rate: p.hourly_rate,
            experience_years: Some(p.experience_years),
            description: Some(p.description.to_string()),
            availability: working_week(),
        });

        let user = db_client
            .register_user(
                NewUser {
                    username: account.username.to_string(),
                    email: account.email.to_string(),
                    password: hashed_password.clone(),
                    full_name: account.full_name.to_string(),
                    phone: Some(account.phone.to_string()),
                    location: Some(account.location.to_string()),
                    role: account.role,
                },
                profile,
                None,
            )
            .await?;

        if account.profile.is_some() {
            if let Some(profile) = db_client.get_provider_by_user_id(user.id).await? {
                if !profile.is_verified {
                    db_client.toggle_provider_verification(profile.id).await?;
                }
            }
        }

        tracing::info!(user_id = %user.id, username = %user.username, "demo account created");
        created += 1;
    }

    Ok(created)
}
