//! CRM client lifecycle.
//!
//! # Responsibility
//! - Own one record store handle and one notifier for the process.
//! - Hand out entity services sharing that handle.
//!
//! # Invariants
//! - Services obtained from a client share its store; no per-call setup.
//! - After [`CrmClient::shutdown`] the client is consumed; services created
//!   earlier keep their own store reference until dropped.

use crate::config::StoreConfig;
use crate::notify::{LogNotifier, Notifier};
use crate::service::activity_service::ActivityService;
use crate::service::company_service::CompanyService;
use crate::service::contact_service::ContactService;
use crate::service::deal_service::DealService;
use crate::store::{HttpRecordStore, RecordStore, StoreResult};
use std::sync::Arc;
use std::time::Instant;

/// Entry point bundling a record store with a notification sink.
pub struct CrmClient<S: RecordStore> {
    store: Arc<S>,
    notifier: Arc<dyn Notifier>,
    started_at: Instant,
}

impl CrmClient<HttpRecordStore> {
    /// Connects to the remote record store; failures go to the log.
    pub fn connect(config: StoreConfig) -> StoreResult<Self> {
        let store = HttpRecordStore::try_new(config)?;
        Ok(Self::new(store, Arc::new(LogNotifier)))
    }
}

impl<S: RecordStore> CrmClient<S> {
    pub fn new(store: S, notifier: Arc<dyn Notifier>) -> Self {
        log::info!("event=client_start module=client status=ok");
        Self {
            store: Arc::new(store),
            notifier,
            started_at: Instant::now(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn contacts(&self) -> ContactService<Arc<S>> {
        ContactService::new(Arc::clone(&self.store), Arc::clone(&self.notifier))
    }

    pub fn companies(&self) -> CompanyService<Arc<S>> {
        CompanyService::new(Arc::clone(&self.store), Arc::clone(&self.notifier))
    }

    pub fn deals(&self) -> DealService<Arc<S>> {
        DealService::new(Arc::clone(&self.store), Arc::clone(&self.notifier))
    }

    pub fn activities(&self) -> ActivityService<Arc<S>> {
        ActivityService::new(Arc::clone(&self.store), Arc::clone(&self.notifier))
    }

    /// Ends the client lifecycle.
    pub fn shutdown(self) {
        log::info!(
            "event=client_stop module=client status=ok uptime_ms={} open_handles={}",
            self.started_at.elapsed().as_millis(),
            Arc::strong_count(&self.store)
        );
    }
}
