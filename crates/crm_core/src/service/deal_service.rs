//! Deal use-case service.
//!
//! # Responsibility
//! - CRUD, search and relationship reads for deals.
//! - Stage transitions with the closed-stage probability rule.
//!
//! # Invariants
//! - Any stage may follow any other.
//! - Reaching `Closed Won` writes probability 100, `Closed Lost` writes 0;
//!   open stages leave the stored probability untouched.
//! - Unknown stage labels are rejected before the store is contacted.

use crate::model::deal::{self, Deal, DealDraft, DealStage};
use crate::model::record::{RecordId, StorageRecord};
use crate::notify::Notifier;
use crate::service::access::EntityAccess;
use crate::service::ServiceResult;
use crate::store::{Operator, RecordStore};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

pub struct DealService<S: RecordStore> {
    access: EntityAccess<S>,
}

impl<S: RecordStore> DealService<S> {
    pub fn new(store: S, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            access: EntityAccess::new(store, notifier),
        }
    }

    /// Closed stage set in pipeline order.
    pub fn stages() -> [DealStage; 6] {
        DealStage::ALL
    }

    pub fn list(&self) -> Vec<Deal> {
        self.access.list()
    }

    pub fn get(&self, id: RecordId) -> ServiceResult<Deal> {
        self.access.get(id)
    }

    pub fn create(&self, draft: &DealDraft) -> ServiceResult<Option<Deal>> {
        self.access.create(draft.to_record())
    }

    pub fn update(&self, id: RecordId, draft: &DealDraft) -> ServiceResult<Option<Deal>> {
        self.access.update(id, draft.to_record())
    }

    pub fn remove(&self, id: RecordId) -> bool {
        self.access.remove::<Deal>(id)
    }

    pub fn search(&self, query: &str) -> Vec<Deal> {
        self.access.search(query)
    }

    pub fn by_contact(&self, contact_id: RecordId) -> Vec<Deal> {
        self.filtered(deal::CONTACT_ID, contact_id)
    }

    pub fn by_company(&self, company_id: RecordId) -> Vec<Deal> {
        self.filtered(deal::COMPANY_ID, company_id)
    }

    /// Moves deal `id` to the stage labelled `stage`.
    ///
    /// # Errors
    /// - `InvalidStage` when `stage` is not an exact stage label; nothing is
    ///   sent to the store.
    /// - `Rejected` / `Store` when the store refuses or is unreachable.
    pub fn update_stage(&self, id: RecordId, stage: &str) -> ServiceResult<Option<Deal>> {
        let stage = stage.parse::<DealStage>().map_err(|err| {
            log::warn!("event=deal_stage module=service status=invalid id={id} stage={}", err.0);
            err
        })?;

        let mut record = StorageRecord::new();
        record.insert(deal::STAGE.into(), Value::from(stage.as_str()));
        if let Some(probability) = stage.forced_probability() {
            record.insert(deal::PROBABILITY.into(), Value::from(probability));
        }
        let updated = self.access.update(id, record)?;
        log::info!(
            "event=deal_stage module=service status={} id={id} stage={} closed={}",
            if updated.is_some() { "ok" } else { "empty" },
            stage.as_str(),
            stage.is_closed()
        );
        Ok(updated)
    }

    /// Deals grouped by stage. Every stage has an entry, empty ones included;
    /// a failed fetch yields an empty map.
    pub fn by_stage(&self) -> BTreeMap<DealStage, Vec<Deal>> {
        let Some(deals) = self.access.try_fetch::<Deal>(&EntityAccess::<S>::select::<Deal>())
        else {
            return BTreeMap::new();
        };
        let mut grouped: BTreeMap<DealStage, Vec<Deal>> =
            DealStage::ALL.into_iter().map(|stage| (stage, Vec::new())).collect();
        for deal in deals {
            grouped.entry(deal.stage).or_default().push(deal);
        }
        grouped
    }

    fn filtered(&self, field: &str, id: RecordId) -> Vec<Deal> {
        let params = EntityAccess::<S>::select::<Deal>().filter(field, Operator::EqualTo, id);
        self.access.fetch(&params)
    }
}
