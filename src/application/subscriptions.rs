use crate::domain::{derive_status, SessionContext, SessionError, StatusInfo, Subscription, SubscriptionDraft};
use crate::infrastructure::{ListFilter, StoreError, SubscriptionStore};
use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;
use validator::{Validate, ValidationErrors};

#[derive(Error, Debug)]
pub enum SubscriptionError {
    #[error("Invalid subscription: {0}")]
    Invalid(#[from] ValidationErrors),
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
    #[error("Session error: {0}")]
    Session(#[from] SessionError),
}

/// A listed record together with its status as of the query date.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SubscriptionView {
    pub subscription: Subscription,
    pub status: StatusInfo,
    pub display_date: Option<NaiveDate>,
}

/// Manual add/edit/delete actions over the session's list.
pub struct SubscriptionService {
    default_currency: String,
}

impl SubscriptionService {
    pub fn new(default_currency: String) -> Self {
        Self { default_currency }
    }

    pub fn create(
        &self,
        session: &SessionContext,
        store: &mut SubscriptionStore,
        draft: SubscriptionDraft,
    ) -> Result<Subscription, SubscriptionError> {
        session.require_authenticated()?;

        let record = draft.into_subscription(Uuid::new_v4(), &session.profile.id, &self.default_currency);
        record.validate()?;
        store.add(record.clone())?;

        info!(id = %record.id, service = %record.service_name, "Subscription added");
        Ok(record)
    }

    /// Replaces the record in place; the detected-from-email marker survives edits.
    pub fn edit(
        &self,
        session: &SessionContext,
        store: &mut SubscriptionStore,
        id: Uuid,
        draft: SubscriptionDraft,
    ) -> Result<Subscription, SubscriptionError> {
        session.require_authenticated()?;

        let existing = store
            .get(id)
            .ok_or_else(|| StoreError::NotFound(format!("Subscription {}", id)))?;

        let mut record = draft.into_subscription(id, &existing.user_id, &self.default_currency);
        record.detected_from_email = existing.detected_from_email;
        record.validate()?;
        store.update(record.clone())?;

        info!(id = %record.id, service = %record.service_name, "Subscription updated");
        Ok(record)
    }

    /// Returns whether a record was removed; deleting twice is not an error.
    pub fn delete(
        &self,
        session: &SessionContext,
        store: &mut SubscriptionStore,
        id: Uuid,
    ) -> Result<bool, SubscriptionError> {
        session.require_authenticated()?;

        let removed = store.remove(id);
        if let Some(record) = &removed {
            info!(id = %id, service = %record.service_name, "Subscription deleted");
        }
        Ok(removed.is_some())
    }

    pub fn set_notifications(
        &self,
        session: &SessionContext,
        store: &mut SubscriptionStore,
        id: Uuid,
        enabled: bool,
    ) -> Result<(), SubscriptionError> {
        session.require_authenticated()?;
        store.set_notifications(id, enabled)?;
        info!(id = %id, enabled, "Notification preference updated");
        Ok(())
    }

    pub fn list(
        &self,
        session: &SessionContext,
        store: &SubscriptionStore,
        filter: &ListFilter,
        as_of: NaiveDate,
    ) -> Result<Vec<SubscriptionView>, SubscriptionError> {
        session.require_authenticated()?;

        Ok(store
            .list(filter)
            .map(|sub| {
                let status = derive_status(sub, as_of);
                SubscriptionView {
                    display_date: status.display_date(sub),
                    subscription: sub.clone(),
                    status,
                }
            })
            .collect())
    }
}
