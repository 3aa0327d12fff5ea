//! Activity use-case service.
//!
//! # Responsibility
//! - CRUD and search for calls, emails, meetings, tasks and notes.
//! - Time-based agenda reads: upcoming and overdue open activities.
//!
//! # Invariants
//! - Due dates are compared as ISO-8601 UTC text against the reference time.
//! - Completed activities never appear in agenda reads.

use crate::model::activity::{self, Activity, ActivityDraft, ActivityType};
use crate::model::record::{RecordId, StorageRecord};
use crate::notify::Notifier;
use crate::service::access::EntityAccess;
use crate::service::ServiceResult;
use crate::store::{Operator, RecordParams, RecordStore, SortType};
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;
use std::sync::Arc;

/// Page size of [`ActivityService::upcoming`] when the caller gives none.
pub const DEFAULT_UPCOMING_LIMIT: u32 = 10;

pub struct ActivityService<S: RecordStore> {
    access: EntityAccess<S>,
}

impl<S: RecordStore> ActivityService<S> {
    pub fn new(store: S, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            access: EntityAccess::new(store, notifier),
        }
    }

    /// Closed activity type set in canonical order.
    pub fn types() -> [ActivityType; 5] {
        ActivityType::ALL
    }

    pub fn list(&self) -> Vec<Activity> {
        self.access.list()
    }

    pub fn get(&self, id: RecordId) -> ServiceResult<Activity> {
        self.access.get(id)
    }

    pub fn create(&self, draft: &ActivityDraft) -> ServiceResult<Option<Activity>> {
        self.access.create(draft.to_record())
    }

    pub fn update(&self, id: RecordId, draft: &ActivityDraft) -> ServiceResult<Option<Activity>> {
        self.access.update(id, draft.to_record())
    }

    pub fn remove(&self, id: RecordId) -> bool {
        self.access.remove::<Activity>(id)
    }

    pub fn search(&self, query: &str) -> Vec<Activity> {
        self.access.search(query)
    }

    pub fn by_contact(&self, contact_id: RecordId) -> Vec<Activity> {
        self.access
            .fetch(&Self::select().filter(activity::CONTACT_ID, Operator::EqualTo, contact_id))
    }

    pub fn by_deal(&self, deal_id: RecordId) -> Vec<Activity> {
        self.access
            .fetch(&Self::select().filter(activity::DEAL_ID, Operator::EqualTo, deal_id))
    }

    /// Sets `completed` on activity `id`, leaving every other field as is.
    pub fn mark_completed(&self, id: RecordId) -> ServiceResult<Option<Activity>> {
        let mut record = StorageRecord::new();
        record.insert(activity::COMPLETED.into(), Value::from(true));
        self.access.update(id, record)
    }

    /// Open activities due now or later, soonest first, at most `limit`
    /// (default 10).
    pub fn upcoming(&self, limit: Option<u32>) -> Vec<Activity> {
        self.upcoming_as_of(Utc::now(), limit.unwrap_or(DEFAULT_UPCOMING_LIMIT))
    }

    pub fn upcoming_as_of(&self, now: DateTime<Utc>, limit: u32) -> Vec<Activity> {
        let params = Self::open()
            .filter(activity::DUE_DATE, Operator::GreaterThanOrEqualTo, iso(now))
            .order(activity::DUE_DATE, SortType::Asc)
            .page(limit, 0);
        self.access.fetch(&params)
    }

    /// Open activities whose due date has passed.
    pub fn overdue(&self) -> Vec<Activity> {
        self.overdue_as_of(Utc::now())
    }

    pub fn overdue_as_of(&self, now: DateTime<Utc>) -> Vec<Activity> {
        let params = Self::open().filter(activity::DUE_DATE, Operator::LessThan, iso(now));
        self.access.fetch(&params)
    }

    fn select() -> RecordParams {
        EntityAccess::<S>::select::<Activity>()
    }

    fn open() -> RecordParams {
        Self::select().filter(activity::COMPLETED, Operator::EqualTo, false)
    }
}

fn iso(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}
