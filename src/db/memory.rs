//! In-memory `Store` used by service and router tests. Mirrors the constraints
//! the PostgreSQL schema enforces (unique keys, conditional updates).

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::error::{DatabaseError, ErrorKind};
use uuid::Uuid;

use super::{
    admindb::AdminExt,
    bookingdb::BookingExt,
    providerdb::{CategoryExt, ProviderExt},
    reviewdb::ReviewExt,
    sessiondb::SessionExt,
    userdb::UserExt,
};
use crate::models::{
    adminmodel::PlatformCounts,
    bookingmodel::{
        compute_total_amount, Booking, BookingChanges, BookingDetails, BookingListFilter,
        BookingSide, BookingStatus, NewBooking,
    },
    providermodel::{
        NewCategory, NewProviderProfile, ProviderFilter, ProviderListing, ProviderProfileChanges,
        ServiceCategory, ServiceProvider, DEFAULT_CATEGORIES,
    },
    reviewmodel::{NewReview, RatingDistribution, Review, ReviewChanges, ReviewDetails, ReviewFilter},
    usermodel::{InitialSession, NewSession, NewUser, Session, User, UserSummary},
};

#[derive(Debug)]
struct UniqueViolation {
    constraint: &'static str,
}

impl std::fmt::Display for UniqueViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "duplicate key value violates unique constraint \"{}\"", self.constraint)
    }
}

impl std::error::Error for UniqueViolation {}

impl DatabaseError for UniqueViolation {
    fn message(&self) -> &str {
        "duplicate key value violates unique constraint"
    }

    fn code(&self) -> Option<std::borrow::Cow<'_, str>> {
        Some("23505".into())
    }

    fn constraint(&self) -> Option<&str> {
        Some(self.constraint)
    }

    fn as_error(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
        self
    }

    fn as_error_mut(&mut self) -> &mut (dyn std::error::Error + Send + Sync + 'static) {
        self
    }

    fn into_error(self: Box<Self>) -> Box<dyn std::error::Error + Send + Sync + 'static> {
        self
    }

    fn kind(&self) -> ErrorKind {
        ErrorKind::UniqueViolation
    }
}

fn unique_violation(constraint: &'static str) -> sqlx::Error {
    sqlx::Error::Database(Box::new(UniqueViolation { constraint }))
}

#[derive(Debug, Default)]
struct Tables {
    users: Vec<User>,
    sessions: Vec<Session>,
    providers: Vec<ServiceProvider>,
    categories: Vec<ServiceCategory>,
    bookings: Vec<Booking>,
    reviews: Vec<Review>,
}

impl Tables {
    fn summaries(&self) -> HashMap<Uuid, UserSummary> {
        self.users.iter().map(|u| (u.id, UserSummary::from(u))).collect()
    }

    fn booking_details(&self, booking: Booking) -> BookingDetails {
        let find = |id: Uuid| self.users.iter().find(|u| u.id == id).map(UserSummary::from);
        BookingDetails {
            customer: find(booking.customer_id),
            provider: find(booking.provider_id),
            service_category: self
                .categories
                .iter()
                .find(|c| c.id == booking.category_id)
                .cloned(),
            booking,
        }
    }

    fn review_details(&self, review: Review) -> ReviewDetails {
        ReviewDetails {
            customer: self
                .users
                .iter()
                .find(|u| u.id == review.customer_id)
                .map(UserSummary::from),
            review,
        }
    }

    fn listings<'a, I>(&self, profiles: I) -> Vec<ProviderListing>
    where
        I: IntoIterator<Item = &'a ServiceProvider>,
    {
        let users = self.summaries();
        profiles
            .into_iter()
            .filter_map(|p| {
                users.get(&p.user_id).map(|user| ProviderListing {
                    profile: p.clone(),
                    user: user.clone(),
                })
            })
            .collect()
    }

    fn distribution(&self, provider_id: Uuid) -> RatingDistribution {
        RatingDistribution::from_ratings(
            self.reviews
                .iter()
                .filter(|r| r.provider_id == provider_id)
                .map(|r| r.rating),
        )
    }

    fn refresh_rating(&mut self, provider_id: Uuid) {
        let summary = self.distribution(provider_id).summary();
        if let Some(profile) = self.providers.iter_mut().find(|p| p.user_id == provider_id) {
            profile.rating = summary.rating;
            profile.total_reviews = summary.total_reviews;
            profile.updated_at = Utc::now();
        }
    }

    fn insert_profile(&mut self, user_id: Uuid, profile: NewProviderProfile) -> ServiceProvider {
        let now = Utc::now();
        let profile = ServiceProvider {
            id: Uuid::new_v4(),
            user_id,
            skills: profile.skills,
            hourly_rate: profile.hourly_rate,
            experience_years: profile.experience_years,
            description: profile.description,
            availability: profile.availability,
            rating: 0.0,
            total_reviews: 0,
            is_verified: false,
            created_at: now,
            updated_at: now,
        };
        self.providers.push(profile.clone());
        profile
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    fail_rating_refresh: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }

    /// Makes every following rating refresh fail, as a broken aggregate
    /// query would.
    pub fn fail_rating_refresh(&self, fail: bool) {
        self.fail_rating_refresh.store(fail, Ordering::SeqCst);
    }

    fn tables(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn refresh_rating(&self, tables: &mut Tables, provider_id: Uuid) {
        if self.fail_rating_refresh.load(Ordering::SeqCst) {
            tracing::warn!(provider_id = %provider_id, "provider rating refresh failed, keeping review write");
            return;
        }
        tables.refresh_rating(provider_id);
    }
}

#[async_trait]
impl UserExt for MemoryStore {
    async fn get_user(
        &self,
        user_id: Option<Uuid>,
        username: Option<&str>,
        email: Option<&str>,
    ) -> Result<Option<User>, sqlx::Error> {
        let tables = self.tables();
        let found = if let Some(user_id) = user_id {
            tables.users.iter().find(|u| u.id == user_id)
        } else if let Some(username) = username {
            tables.users.iter().find(|u| u.username == username)
        } else if let Some(email) = email {
            tables.users.iter().find(|u| u.email == email)
        } else {
            None
        };
        Ok(found.cloned())
    }

    async fn get_users(&self) -> Result<Vec<User>, sqlx::Error> {
        Ok(self.tables().users.iter().rev().cloned().collect())
    }

    async fn register_user(
        &self,
        new_user: NewUser,
        profile: Option<NewProviderProfile>,
        session: Option<InitialSession>,
    ) -> Result<User, sqlx::Error> {
        let mut tables = self.tables();

        if tables.users.iter().any(|u| u.username == new_user.username) {
            return Err(unique_violation("users_username_key"));
        }
        if tables.users.iter().any(|u| u.email == new_user.email) {
            return Err(unique_violation("users_email_key"));
        }
        if let Some(session) = &session {
            if tables.sessions.iter().any(|s| s.token_hash == session.token_hash) {
                return Err(unique_violation("sessions_token_hash_key"));
            }
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            username: new_user.username,
            email: new_user.email,
            password: new_user.password,
            full_name: new_user.full_name,
            phone: new_user.phone,
            location: new_user.location,
            role: new_user.role,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        tables.users.push(user.clone());

        if let Some(profile) = profile {
            tables.insert_profile(user.id, profile);
        }

        if let Some(session) = session {
            tables.sessions.push(Session {
                id: Uuid::new_v4(),
                token_hash: session.token_hash,
                user_id: user.id,
                role: user.role,
                created_at: now,
                expires_at: session.expires_at,
            });
        }

        Ok(user)
    }

    async fn update_user_password(
        &self,
        user_id: Uuid,
        password: String,
    ) -> Result<User, sqlx::Error> {
        let mut tables = self.tables();
        let user = tables
            .users
            .iter_mut()
            .find(|u| u.id == user_id)
            .ok_or(sqlx::Error::RowNotFound)?;
        user.password = password;
        user.updated_at = Utc::now();
        Ok(user.clone())
    }

    async fn toggle_user_status(&self, user_id: Uuid) -> Result<Option<User>, sqlx::Error> {
        let mut tables = self.tables();
        let Some(user) = tables.users.iter_mut().find(|u| u.id == user_id) else {
            return Ok(None);
        };
        user.is_active = !user.is_active;
        user.updated_at = Utc::now();
        let user = user.clone();

        if !user.is_active {
            tables.sessions.retain(|s| s.user_id != user_id);
        }
        Ok(Some(user))
    }
}

#[async_trait]
impl SessionExt for MemoryStore {
    async fn create_session(&self, session: NewSession) -> Result<Session, sqlx::Error> {
        let mut tables = self.tables();
        if tables.sessions.iter().any(|s| s.token_hash == session.token_hash) {
            return Err(unique_violation("sessions_token_hash_key"));
        }
        let session = Session {
            id: Uuid::new_v4(),
            token_hash: session.token_hash,
            user_id: session.user_id,
            role: session.role,
            created_at: Utc::now(),
            expires_at: session.expires_at,
        };
        tables.sessions.push(session.clone());
        Ok(session)
    }

    async fn get_session_by_token_hash(
        &self,
        token_hash: &str,
    ) -> Result<Option<Session>, sqlx::Error> {
        Ok(self
            .tables()
            .sessions
            .iter()
            .find(|s| s.token_hash == token_hash)
            .cloned())
    }

    async fn delete_session(&self, token_hash: &str) -> Result<u64, sqlx::Error> {
        let mut tables = self.tables();
        let before = tables.sessions.len();
        tables.sessions.retain(|s| s.token_hash != token_hash);
        Ok((before - tables.sessions.len()) as u64)
    }

    async fn delete_expired_sessions(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<u64, sqlx::Error> {
        let mut tables = self.tables();
        let before = tables.sessions.len();
        tables
            .sessions
            .retain(|s| !(s.user_id == user_id && s.is_expired(now)));
        Ok((before - tables.sessions.len()) as u64)
    }
}

#[async_trait]
impl ProviderExt for MemoryStore {
    async fn get_provider(&self, provider_id: Uuid) -> Result<Option<ProviderListing>, sqlx::Error> {
        let tables = self.tables();
        Ok(tables
            .listings(tables.providers.iter().filter(|p| p.id == provider_id))
            .pop())
    }

    async fn get_provider_by_user_id(
        &self,
        user_id: Uuid,
    ) -> Result<Option<ServiceProvider>, sqlx::Error> {
        Ok(self
            .tables()
            .providers
            .iter()
            .find(|p| p.user_id == user_id)
            .cloned())
    }

    async fn search_providers(
        &self,
        filter: &ProviderFilter,
    ) -> Result<Vec<ProviderListing>, sqlx::Error> {
        let tables = self.tables();
        let mut listings: Vec<ProviderListing> = tables
            .listings(tables.providers.iter())
            .into_iter()
            .filter(|l| filter.matches(&l.profile, &l.user))
            .collect();
        listings.sort_by(|a, b| {
            b.profile
                .rating
                .total_cmp(&a.profile.rating)
                .then(b.profile.total_reviews.cmp(&a.profile.total_reviews))
                .then(a.profile.created_at.cmp(&b.profile.created_at))
        });
        Ok(listings)
    }

    async fn get_all_providers(&self) -> Result<Vec<ProviderListing>, sqlx::Error> {
        let tables = self.tables();
        Ok(tables.listings(tables.providers.iter().rev()))
    }

    async fn save_provider_profile(
        &self,
        user_id: Uuid,
        changes: &ProviderProfileChanges,
    ) -> Result<ServiceProvider, sqlx::Error> {
        let mut tables = self.tables();

        let previous_rate = tables
            .providers
            .iter()
            .find(|p| p.user_id == user_id)
            .map(|p| p.hourly_rate);
        if previous_rate.is_none() {
            tables.insert_profile(user_id, NewProviderProfile::default());
        }

        let profile = tables
            .providers
            .iter_mut()
            .find(|p| p.user_id == user_id)
            .ok_or(sqlx::Error::RowNotFound)?;
        changes.apply_to(profile);
        profile.updated_at = Utc::now();
        let profile = profile.clone();

        if previous_rate != Some(profile.hourly_rate) {
            for booking in tables
                .bookings
                .iter_mut()
                .filter(|b| b.provider_id == user_id && b.status == BookingStatus::Pending)
            {
                booking.total_amount =
                    compute_total_amount(booking.estimated_hours, Some(profile.hourly_rate));
                booking.updated_at = Utc::now();
            }
        }

        Ok(profile)
    }

    async fn toggle_provider_verification(
        &self,
        provider_id: Uuid,
    ) -> Result<Option<ServiceProvider>, sqlx::Error> {
        let mut tables = self.tables();
        Ok(tables
            .providers
            .iter_mut()
            .find(|p| p.id == provider_id)
            .map(|p| {
                p.is_verified = !p.is_verified;
                p.updated_at = Utc::now();
                p.clone()
            }))
    }
}

#[async_trait]
impl CategoryExt for MemoryStore {
    async fn get_categories(&self, active_only: bool) -> Result<Vec<ServiceCategory>, sqlx::Error> {
        let mut categories: Vec<ServiceCategory> = self
            .tables()
            .categories
            .iter()
            .filter(|c| c.is_active || !active_only)
            .cloned()
            .collect();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories)
    }

    async fn get_category(&self, category_id: Uuid) -> Result<Option<ServiceCategory>, sqlx::Error> {
        Ok(self
            .tables()
            .categories
            .iter()
            .find(|c| c.id == category_id)
            .cloned())
    }

    async fn create_category(&self, category: NewCategory) -> Result<ServiceCategory, sqlx::Error> {
        let mut tables = self.tables();
        if tables.categories.iter().any(|c| c.name == category.name) {
            return Err(unique_violation("service_categories_name_key"));
        }
        let category = ServiceCategory {
            id: Uuid::new_v4(),
            name: category.name,
            description: category.description,
            icon: category.icon,
            is_active: true,
            created_at: Utc::now(),
        };
        tables.categories.push(category.clone());
        Ok(category)
    }

    async fn toggle_category_status(
        &self,
        category_id: Uuid,
    ) -> Result<Option<ServiceCategory>, sqlx::Error> {
        let mut tables = self.tables();
        Ok(tables
            .categories
            .iter_mut()
            .find(|c| c.id == category_id)
            .map(|c| {
                c.is_active = !c.is_active;
                c.clone()
            }))
    }

    async fn seed_default_categories(&self) -> Result<u64, sqlx::Error> {
        let mut tables = self.tables();
        let mut inserted = 0;
        for &(name, description, icon) in DEFAULT_CATEGORIES {
            if tables.categories.iter().any(|c| c.name == name) {
                continue;
            }
            tables.categories.push(ServiceCategory {
                id: Uuid::new_v4(),
                name: name.to_string(),
                description: Some(description.to_string()),
                icon: Some(icon.to_string()),
                is_active: true,
                created_at: Utc::now(),
            });
            inserted += 1;
        }
        Ok(inserted)
    }
}

#[async_trait]
impl BookingExt for MemoryStore {
    async fn create_booking(&self, booking: NewBooking) -> Result<BookingDetails, sqlx::Error> {
        let mut tables = self.tables();
        let now = Utc::now();
        let booking = Booking {
            id: Uuid::new_v4(),
            customer_id: booking.customer_id,
            provider_id: booking.provider_id,
            category_id: booking.category_id,
            title: booking.title,
            description: booking.description,
            scheduled_date: booking.scheduled_date,
            estimated_hours: booking.estimated_hours,
            total_amount: booking.total_amount,
            status: BookingStatus::Pending,
            customer_location: booking.customer_location,
            created_at: now,
            updated_at: now,
        };
        tables.bookings.push(booking.clone());
        Ok(tables.booking_details(booking))
    }

    async fn get_booking(&self, booking_id: Uuid) -> Result<Option<Booking>, sqlx::Error> {
        Ok(self
            .tables()
            .bookings
            .iter()
            .find(|b| b.id == booking_id)
            .cloned())
    }

    async fn get_booking_details(
        &self,
        booking_id: Uuid,
    ) -> Result<Option<BookingDetails>, sqlx::Error> {
        let tables = self.tables();
        Ok(tables
            .bookings
            .iter()
            .find(|b| b.id == booking_id)
            .cloned()
            .map(|b| tables.booking_details(b)))
    }

    async fn list_bookings(
        &self,
        filter: &BookingListFilter,
    ) -> Result<Vec<BookingDetails>, sqlx::Error> {
        let tables = self.tables();
        Ok(tables
            .bookings
            .iter()
            .rev()
            .filter(|b| match filter.side {
                BookingSide::AsCustomer => b.customer_id == filter.user_id,
                BookingSide::AsProvider => b.provider_id == filter.user_id,
            })
            .filter(|b| filter.status.map_or(true, |s| b.status == s))
            .cloned()
            .map(|b| tables.booking_details(b))
            .collect())
    }

    async fn update_booking(
        &self,
        booking_id: Uuid,
        changes: &BookingChanges,
        total_amount: Option<f64>,
    ) -> Result<Option<BookingDetails>, sqlx::Error> {
        let mut tables = self.tables();
        let updated = tables
            .bookings
            .iter_mut()
            .find(|b| b.id == booking_id && b.status == BookingStatus::Pending)
            .map(|b| {
                changes.apply_to(b);
                b.total_amount = total_amount;
                b.updated_at = Utc::now();
                b.clone()
            });
        Ok(updated.map(|b| tables.booking_details(b)))
    }

    async fn update_booking_status(
        &self,
        booking_id: Uuid,
        from: BookingStatus,
        to: BookingStatus,
    ) -> Result<Option<BookingDetails>, sqlx::Error> {
        let mut tables = self.tables();
        let updated = tables
            .bookings
            .iter_mut()
            .find(|b| b.id == booking_id && b.status == from)
            .map(|b| {
                b.status = to;
                b.updated_at = Utc::now();
                b.clone()
            });
        Ok(updated.map(|b| tables.booking_details(b)))
    }

    async fn delete_pending_booking(&self, booking_id: Uuid) -> Result<bool, sqlx::Error> {
        let mut tables = self.tables();
        let before = tables.bookings.len();
        tables
            .bookings
            .retain(|b| !(b.id == booking_id && b.status == BookingStatus::Pending));
        let deleted = tables.bookings.len() < before;
        if deleted {
            tables.reviews.retain(|r| r.booking_id != booking_id);
        }
        Ok(deleted)
    }
}

#[async_trait]
impl ReviewExt for MemoryStore {
    async fn get_review(&self, review_id: Uuid) -> Result<Option<ReviewDetails>, sqlx::Error> {
        let tables = self.tables();
        Ok(tables
            .reviews
            .iter()
            .find(|r| r.id == review_id)
            .cloned()
            .map(|r| tables.review_details(r)))
    }

    async fn get_review_by_booking(&self, booking_id: Uuid) -> Result<Option<Review>, sqlx::Error> {
        Ok(self
            .tables()
            .reviews
            .iter()
            .find(|r| r.booking_id == booking_id)
            .cloned())
    }

    async fn list_reviews(&self, filter: &ReviewFilter) -> Result<Vec<ReviewDetails>, sqlx::Error> {
        let tables = self.tables();
        Ok(tables
            .reviews
            .iter()
            .rev()
            .filter(|r| filter.matches(r))
            .cloned()
            .map(|r| tables.review_details(r))
            .collect())
    }

    async fn create_review(&self, review: NewReview) -> Result<Review, sqlx::Error> {
        let mut tables = self.tables();
        if tables.reviews.iter().any(|r| r.booking_id == review.booking_id) {
            return Err(unique_violation("reviews_booking_id_key"));
        }
        let now = Utc::now();
        let review = Review {
            id: Uuid::new_v4(),
            customer_id: review.customer_id,
            provider_id: review.provider_id,
            booking_id: review.booking_id,
            rating: review.rating,
            comment: review.comment,
            created_at: now,
            updated_at: now,
        };
        tables.reviews.push(review.clone());
        self.refresh_rating(&mut tables, review.provider_id);
        Ok(review)
    }

    async fn update_review(
        &self,
        review_id: Uuid,
        changes: &ReviewChanges,
    ) -> Result<Option<Review>, sqlx::Error> {
        let mut tables = self.tables();
        let updated = tables.reviews.iter_mut().find(|r| r.id == review_id).map(|r| {
            if let Some(rating) = changes.rating {
                r.rating = rating;
            }
            if let Some(comment) = &changes.comment {
                r.comment = comment.clone();
            }
            r.updated_at = Utc::now();
            r.clone()
        });
        if let Some(review) = &updated {
            self.refresh_rating(&mut tables, review.provider_id);
        }
        Ok(updated)
    }

    async fn delete_review(&self, review_id: Uuid) -> Result<Option<Review>, sqlx::Error> {
        let mut tables = self.tables();
        let position = tables.reviews.iter().position(|r| r.id == review_id);
        let removed = position.map(|idx| tables.reviews.remove(idx));
        if let Some(review) = &removed {
            self.refresh_rating(&mut tables, review.provider_id);
        }
        Ok(removed)
    }

    async fn get_rating_distribution(
        &self,
        provider_id: Uuid,
    ) -> Result<RatingDistribution, sqlx::Error> {
        Ok(self.tables().distribution(provider_id))
    }
}

#[async_trait]
impl AdminExt for MemoryStore {
    async fn get_platform_counts(&self) -> Result<PlatformCounts, sqlx::Error> {
        let tables = self.tables();
        let statuses = [
            BookingStatus::Pending,
            BookingStatus::Confirmed,
            BookingStatus::InProgress,
            BookingStatus::Completed,
            BookingStatus::Cancelled,
        ];
        let bookings_by_status = statuses
            .into_iter()
            .map(|status| {
                let count = tables.bookings.iter().filter(|b| b.status == status).count() as i64;
                (status, count)
            })
            .filter(|(_, count)| *count > 0)
            .collect();

        Ok(PlatformCounts {
            users: tables.users.len() as i64,
            providers: tables.providers.len() as i64,
            bookings: tables.bookings.len() as i64,
            categories: tables.categories.len() as i64,
            bookings_by_status,
        })
    }
}
