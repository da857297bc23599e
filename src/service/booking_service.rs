use std::sync::Arc;

use uuid::Uuid;

use super::error::ServiceError;
use crate::{
    db::{
        bookingdb::BookingExt, providerdb::{CategoryExt, ProviderExt}, userdb::UserExt, Store,
    },
    dtos::bookingdtos::{
        BookingQueryDto, BookingRoleQuery, CreateBookingDto, UpdateBookingDto, UpdateBookingStatusDto,
    },
    models::{
        bookingmodel::{
            compute_total_amount, Booking, BookingChanges, BookingDetails, BookingListFilter,
            BookingParty, BookingSide, BookingStatus, NewBooking,
        },
        usermodel::{Caller, UserRole},
    },
};

fn not_found() -> ServiceError {
    ServiceError::NotFound("Booking not found".to_string())
}

fn forbidden_target(status: BookingStatus) -> ServiceError {
    let message = match status {
        BookingStatus::Confirmed => "Only provider can confirm booking",
        BookingStatus::InProgress => "Only provider can start work",
        BookingStatus::Completed => "Only provider can mark as completed",
        BookingStatus::Cancelled | BookingStatus::Pending => "Access denied",
    };
    ServiceError::Forbidden(message.to_string())
}

#[derive(Debug, Clone)]
pub struct BookingService {
    db_client: Arc<dyn Store>,
}

impl BookingService {
    pub fn new(db_client: Arc<dyn Store>) -> Self {
        Self { db_client }
    }

    pub async fn create_booking(
        &self,
        caller: &Caller,
        body: CreateBookingDto,
    ) -> Result<BookingDetails, ServiceError> {
        if caller.user_id == body.provider_id {
            return Err(ServiceError::BadRequest("Cannot book yourself".to_string()));
        }

        let provider = self
            .db_client
            .get_user(Some(body.provider_id), None, None)
            .await?
            .filter(|p| p.role == UserRole::ServiceProvider && p.is_active)
            .ok_or_else(|| ServiceError::BadRequest("Invalid service provider".to_string()))?;

        self.db_client
            .get_category(body.category_id)
            .await?
            .filter(|c| c.is_active)
            .ok_or_else(|| ServiceError::BadRequest("Invalid service category".to_string()))?;

        let hourly_rate = self
            .db_client
            .get_provider_by_user_id(provider.id)
            .await?
            .map(|profile| profile.hourly_rate);

        let booking = self
            .db_client
            .create_booking(NewBooking {
                customer_id: caller.user_id,
                provider_id: provider.id,
                category_id: body.category_id,
                title: body.title.trim().to_string(),
                description: body.description,
                scheduled_date: body.scheduled_date,
                estimated_hours: body.estimated_hours,
                total_amount: compute_total_amount(body.estimated_hours, hourly_rate),
                customer_location: body.customer_location,
            })
            .await?;

        tracing::info!(
            booking_id = %booking.booking.id,
            customer_id = %caller.user_id,
            provider_id = %provider.id,
            total_amount = ?booking.booking.total_amount,
            "booking created"
        );

        Ok(booking)
    }

    pub async fn list_bookings(
        &self,
        caller: &Caller,
        query: BookingQueryDto,
    ) -> Result<Vec<BookingDetails>, ServiceError> {
        let side = match query.role {
            Some(BookingRoleQuery::Provider) => BookingSide::AsProvider,
            Some(BookingRoleQuery::Customer) => BookingSide::AsCustomer,
            None if caller.role == UserRole::ServiceProvider => BookingSide::AsProvider,
            None => BookingSide::AsCustomer,
        };

        let bookings = self
            .db_client
            .list_bookings(&BookingListFilter {
                user_id: caller.user_id,
                side,
                status: query.status,
            })
            .await?;

        Ok(bookings)
    }

    pub async fn get_booking(
        &self,
        caller: &Caller,
        booking_id: Uuid,
    ) -> Result<BookingDetails, ServiceError> {
        let details = self
            .db_client
            .get_booking_details(booking_id)
            .await?
            .ok_or_else(not_found)?;

        if details.booking.party_of(caller.user_id).is_none() {
            return Err(ServiceError::Forbidden("Access denied".to_string()));
        }

        Ok(details)
    }

    pub async fn update_booking(
        &self,
        caller: &Caller,
        booking_id: Uuid,
        body: UpdateBookingDto,
    ) -> Result<BookingDetails, ServiceError> {
        let booking = self.owned_pending_booking(caller, booking_id, "update").await?;
        let changes = BookingChanges::from(body);

        let total_amount = match changes.estimated_hours {
            Some(hours) => {
                let hourly_rate = self
                    .db_client
                    .get_provider_by_user_id(booking.provider_id)
                    .await?
                    .map(|profile| profile.hourly_rate);
                compute_total_amount(Some(hours), hourly_rate)
            }
            None => booking.total_amount,
        };

        let updated = self
            .db_client
            .update_booking(booking_id, &changes, total_amount)
            .await?
            .ok_or_else(|| ServiceError::InvalidState("Can only update pending bookings".to_string()))?;

        tracing::info!(booking_id = %booking_id, total_amount = ?total_amount, "booking updated");

        Ok(updated)
    }

    pub async fn delete_booking(&self, caller: &Caller, booking_id: Uuid) -> Result<(), ServiceError> {
        self.owned_pending_booking(caller, booking_id, "delete").await?;

        if !self.db_client.delete_pending_booking(booking_id).await? {
            return Err(ServiceError::InvalidState(
                "Can only delete pending bookings".to_string(),
            ));
        }

        tracing::info!(booking_id = %booking_id, "booking deleted");
        Ok(())
    }

    /// Applies a lifecycle transition. Participation and the actor rule for
    /// the target are checked before the edge itself.
    pub async fn update_status(
        &self,
        caller: &Caller,
        booking_id: Uuid,
        body: UpdateBookingStatusDto,
    ) -> Result<BookingDetails, ServiceError> {
        if body.booking_id.is_some_and(|id| id != booking_id) {
            return Err(ServiceError::BadRequest(
                "booking_id does not match the booking in the path".to_string(),
            ));
        }

        let booking = self
            .db_client
            .get_booking(booking_id)
            .await?
            .ok_or_else(not_found)?;

        let target = body.status;
        let party = booking.party_of(caller.user_id).ok_or_else(|| {
            ServiceError::Forbidden("Only customer or provider can change this booking".to_string())
        })?;

        if !target.permits(party) {
            return Err(forbidden_target(target));
        }

        if !booking.status.can_transition_to(target) {
            return Err(ServiceError::InvalidTransition {
                from: booking.status,
                to: target,
            });
        }

        let updated = self
            .db_client
            .update_booking_status(booking_id, booking.status, target)
            .await?
            .ok_or(ServiceError::InvalidTransition {
                from: booking.status,
                to: target,
            })?;

        tracing::info!(
            booking_id = %booking_id,
            from = %booking.status,
            to = %target,
            by = ?party,
            "booking status changed"
        );

        Ok(updated)
    }

    async fn owned_pending_booking(
        &self,
        caller: &Caller,
        booking_id: Uuid,
        action: &str,
    ) -> Result<Booking, ServiceError> {
        let booking = self
            .db_client
            .get_booking(booking_id)
            .await?
            .ok_or_else(not_found)?;

        if booking.party_of(caller.user_id) != Some(BookingParty::Customer) {
            return Err(ServiceError::Forbidden(format!(
                "Only customer can {} booking",
                action
            )));
        }

        if booking.status != BookingStatus::Pending {
            return Err(ServiceError::InvalidState(format!(
                "Can only {} pending bookings",
                action
            )));
        }

        Ok(booking)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use super::*;
    use crate::{
        db::memory::MemoryStore,
        models::{providermodel::ProviderProfileChanges, usermodel::User},
        service::fixtures,
    };

    struct World {
        store: Arc<MemoryStore>,
        service: BookingService,
        customer: User,
        provider: User,
        category_id: Uuid,
    }

    async fn world() -> World {
        let store = fixtures::memory_store();
        let customer = fixtures::user(&store, "sita", UserRole::Customer).await;
        let provider = fixtures::user(&store, "ram", UserRole::ServiceProvider).await;
        let category_id = fixtures::category(&store).await.id;
        World {
            service: BookingService::new(fixtures::as_store(&store)),
            store,
            customer,
            provider,
            category_id,
        }
    }

    fn create_dto(world: &World, hours: Option<f64>) -> CreateBookingDto {
        CreateBookingDto {
            provider_id: world.provider.id,
            category_id: world.category_id,
            title: "Fix kitchen sink".to_string(),
            description: "Water leaking under the sink".to_string(),
            scheduled_date: Utc::now() + Duration::days(1),
            estimated_hours: hours,
            customer_location: "Thamel".to_string(),
        }
    }

    fn status(status: BookingStatus) -> UpdateBookingStatusDto {
        UpdateBookingStatusDto {
            booking_id: None,
            status,
        }
    }

    #[tokio::test]
    async fn booking_total_uses_provider_rate() {
        let w = world().await;
        let booking = w
            .service
            .create_booking(&fixtures::caller(&w.customer), create_dto(&w, Some(2.0)))
            .await
            .unwrap();

        assert_eq!(booking.booking.total_amount, Some(1600.0));
        assert_eq!(booking.booking.status, BookingStatus::Pending);
        assert_eq!(booking.provider.as_ref().map(|p| p.id), Some(w.provider.id));
        assert_eq!(booking.service_category.as_ref().map(|c| c.name.as_str()), Some("Plumber"));

        let without_hours = w
            .service
            .create_booking(&fixtures::caller(&w.customer), create_dto(&w, None))
            .await
            .unwrap();
        assert_eq!(without_hours.booking.total_amount, None);
    }

    #[tokio::test]
    async fn creation_rejects_self_booking_and_invalid_references() {
        let w = world().await;

        let err = w
            .service
            .create_booking(&fixtures::caller(&w.provider), create_dto(&w, None))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::BadRequest(ref m) if m == "Cannot book yourself"));

        let mut dto = create_dto(&w, None);
        dto.provider_id = w.customer.id;
        let other = fixtures::user(&w.store, "hari", UserRole::Customer).await;
        let err = w
            .service
            .create_booking(&fixtures::caller(&other), dto)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::BadRequest(ref m) if m == "Invalid service provider"));

        let mut dto = create_dto(&w, None);
        dto.category_id = Uuid::new_v4();
        let err = w
            .service
            .create_booking(&fixtures::caller(&w.customer), dto)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::BadRequest(ref m) if m == "Invalid service category"));

        w.store.toggle_category_status(w.category_id).await.unwrap();
        let err = w
            .service
            .create_booking(&fixtures::caller(&w.customer), create_dto(&w, None))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::BadRequest(_)));
    }

    #[tokio::test]
    async fn deactivated_provider_cannot_be_booked() {
        let w = world().await;
        w.store.toggle_user_status(w.provider.id).await.unwrap();
        let err = w
            .service
            .create_booking(&fixtures::caller(&w.customer), create_dto(&w, Some(1.0)))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::BadRequest(_)));
    }

    #[tokio::test]
    async fn provider_confirms_and_customer_cannot_complete() {
        let w = world().await;
        let booking = w
            .service
            .create_booking(&fixtures::caller(&w.customer), create_dto(&w, Some(2.0)))
            .await
            .unwrap();
        let id = booking.booking.id;

        let confirmed = w
            .service
            .update_status(&fixtures::caller(&w.provider), id, status(BookingStatus::Confirmed))
            .await
            .unwrap();
        assert_eq!(confirmed.booking.status, BookingStatus::Confirmed);

        let err = w
            .service
            .update_status(&fixtures::caller(&w.customer), id, status(BookingStatus::Completed))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden(_)));

        let current = w.store.get_booking(id).await.unwrap().unwrap();
        assert_eq!(current.status, BookingStatus::Confirmed);
    }

    #[tokio::test]
    async fn customer_cannot_confirm_and_outsider_is_forbidden() {
        let w = world().await;
        let booking = fixtures::booking(&w.store, &w.customer, &w.provider, w.category_id, None).await;
        let id = booking.booking.id;

        let err = w
            .service
            .update_status(&fixtures::caller(&w.customer), id, status(BookingStatus::Confirmed))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden(ref m) if m == "Only provider can confirm booking"));

        let outsider = fixtures::user(&w.store, "hari", UserRole::ServiceProvider).await;
        let err = w
            .service
            .update_status(&fixtures::caller(&outsider), id, status(BookingStatus::Cancelled))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden(_)));

        let err = w
            .service
            .get_booking(&fixtures::caller(&outsider), id)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden(_)));
    }

    #[tokio::test]
    async fn walk_to_completion_then_everything_is_terminal() {
        let w = world().await;
        let booking = fixtures::booking(&w.store, &w.customer, &w.provider, w.category_id, None).await;
        let id = booking.booking.id;
        let provider = fixtures::caller(&w.provider);

        for next in [BookingStatus::Confirmed, BookingStatus::InProgress, BookingStatus::Completed] {
            let updated = w.service.update_status(&provider, id, status(next)).await.unwrap();
            assert_eq!(updated.booking.status, next);
        }

        for next in [
            BookingStatus::Pending,
            BookingStatus::Confirmed,
            BookingStatus::InProgress,
            BookingStatus::Completed,
            BookingStatus::Cancelled,
        ] {
            let err = w.service.update_status(&provider, id, status(next)).await.unwrap_err();
            assert!(
                matches!(err, ServiceError::InvalidTransition { from: BookingStatus::Completed, .. }),
                "{:?}",
                next
            );
        }

        let current = w.store.get_booking(id).await.unwrap().unwrap();
        assert_eq!(current.status, BookingStatus::Completed);
    }

    #[tokio::test]
    async fn skipping_a_state_is_an_invalid_transition() {
        let w = world().await;
        let booking = fixtures::booking(&w.store, &w.customer, &w.provider, w.category_id, None).await;

        let err = w
            .service
            .update_status(
                &fixtures::caller(&w.provider),
                booking.booking.id,
                status(BookingStatus::Completed),
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::InvalidTransition {
                from: BookingStatus::Pending,
                to: BookingStatus::Completed
            }
        ));
    }

    #[tokio::test]
    async fn either_party_may_cancel() {
        let w = world().await;
        let first = fixtures::booking(&w.store, &w.customer, &w.provider, w.category_id, None).await;
        let second = fixtures::booking(&w.store, &w.customer, &w.provider, w.category_id, None).await;

        let cancelled = w
            .service
            .update_status(&fixtures::caller(&w.customer), first.booking.id, status(BookingStatus::Cancelled))
            .await
            .unwrap();
        assert_eq!(cancelled.booking.status, BookingStatus::Cancelled);

        let cancelled = w
            .service
            .update_status(&fixtures::caller(&w.provider), second.booking.id, status(BookingStatus::Cancelled))
            .await
            .unwrap();
        assert_eq!(cancelled.booking.status, BookingStatus::Cancelled);
    }

    #[tokio::test]
    async fn status_body_must_match_path() {
        let w = world().await;
        let booking = fixtures::booking(&w.store, &w.customer, &w.provider, w.category_id, None).await;

        let err = w
            .service
            .update_status(
                &fixtures::caller(&w.provider),
                booking.booking.id,
                UpdateBookingStatusDto {
                    booking_id: Some(Uuid::new_v4()),
                    status: BookingStatus::Confirmed,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::BadRequest(_)));

        let ok = w
            .service
            .update_status(
                &fixtures::caller(&w.provider),
                booking.booking.id,
                UpdateBookingStatusDto {
                    booking_id: Some(booking.booking.id),
                    status: BookingStatus::Confirmed,
                },
            )
            .await
            .unwrap();
        assert_eq!(ok.booking.status, BookingStatus::Confirmed);
    }

    #[tokio::test]
    async fn changing_hours_recomputes_total() {
        let w = world().await;
        let booking = w
            .service
            .create_booking(&fixtures::caller(&w.customer), create_dto(&w, Some(2.0)))
            .await
            .unwrap();

        let updated = w
            .service
            .update_booking(
                &fixtures::caller(&w.customer),
                booking.booking.id,
                UpdateBookingDto {
                    estimated_hours: Some(3.5),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.booking.estimated_hours, Some(3.5));
        assert_eq!(updated.booking.total_amount, Some(2800.0));

        let renamed = w
            .service
            .update_booking(
                &fixtures::caller(&w.customer),
                booking.booking.id,
                UpdateBookingDto {
                    title: Some("Replace kitchen tap".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(renamed.booking.title, "Replace kitchen tap");
        assert_eq!(renamed.booking.total_amount, Some(2800.0));
    }

    #[tokio::test]
    async fn rate_change_reprices_only_pending_bookings() {
        let w = world().await;
        let customer = fixtures::caller(&w.customer);
        let pending = w.service.create_booking(&customer, create_dto(&w, Some(2.0))).await.unwrap();
        let confirmed = w.service.create_booking(&customer, create_dto(&w, Some(2.0))).await.unwrap();
        w.service
            .update_status(&fixtures::caller(&w.provider), confirmed.booking.id, status(BookingStatus::Confirmed))
            .await
            .unwrap();

        w.store
            .save_provider_profile(
                w.provider.id,
                &ProviderProfileChanges {
                    hourly_rate: Some(1000.0),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let pending = w.store.get_booking(pending.booking.id).await.unwrap().unwrap();
        let confirmed = w.store.get_booking(confirmed.booking.id).await.unwrap().unwrap();
        assert_eq!(pending.total_amount, Some(2000.0));
        assert_eq!(confirmed.total_amount, Some(1600.0));
    }

    #[tokio::test]
    async fn only_customer_edits_and_only_while_pending() {
        let w = world().await;
        let booking = fixtures::booking(&w.store, &w.customer, &w.provider, w.category_id, Some(1.0)).await;
        let id = booking.booking.id;

        let err = w
            .service
            .update_booking(&fixtures::caller(&w.provider), id, UpdateBookingDto::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden(_)));

        let err = w
            .service
            .delete_booking(&fixtures::caller(&w.provider), id)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden(_)));

        w.service
            .update_status(&fixtures::caller(&w.provider), id, status(BookingStatus::Confirmed))
            .await
            .unwrap();

        let err = w
            .service
            .update_booking(&fixtures::caller(&w.customer), id, UpdateBookingDto::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));

        let err = w
            .service
            .delete_booking(&fixtures::caller(&w.customer), id)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));
    }

    #[tokio::test]
    async fn customer_deletes_pending_booking() {
        let w = world().await;
        let booking = fixtures::booking(&w.store, &w.customer, &w.provider, w.category_id, None).await;

        w.service
            .delete_booking(&fixtures::caller(&w.customer), booking.booking.id)
            .await
            .unwrap();
        assert!(w.store.get_booking(booking.booking.id).await.unwrap().is_none());

        let err = w
            .service
            .get_booking(&fixtures::caller(&w.customer), booking.booking.id)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn listing_follows_role_and_status() {
        let w = world().await;
        let first = fixtures::booking(&w.store, &w.customer, &w.provider, w.category_id, None).await;
        let second = fixtures::booking(&w.store, &w.customer, &w.provider, w.category_id, None).await;
        w.service
            .update_status(&fixtures::caller(&w.provider), first.booking.id, status(BookingStatus::Confirmed))
            .await
            .unwrap();

        let as_customer = w
            .service
            .list_bookings(&fixtures::caller(&w.customer), BookingQueryDto::default())
            .await
            .unwrap();
        let ids: Vec<Uuid> = as_customer.iter().map(|b| b.booking.id).collect();
        assert_eq!(ids, vec![second.booking.id, first.booking.id]);

        let as_provider = w
            .service
            .list_bookings(
                &fixtures::caller(&w.provider),
                BookingQueryDto {
                    status: Some(BookingStatus::Confirmed),
                    role: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(as_provider.len(), 1);
        assert_eq!(as_provider[0].booking.id, first.booking.id);

        let provider_as_customer = w
            .service
            .list_bookings(
                &fixtures::caller(&w.provider),
                BookingQueryDto {
                    status: None,
                    role: Some(BookingRoleQuery::Customer),
                },
            )
            .await
            .unwrap();
        assert!(provider_as_customer.is_empty());
    }
}
