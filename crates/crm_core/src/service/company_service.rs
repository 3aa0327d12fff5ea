//! Company use-case service.

use crate::model::company::{Company, CompanyDraft};
use crate::model::record::RecordId;
use crate::notify::Notifier;
use crate::service::access::EntityAccess;
use crate::service::ServiceResult;
use crate::store::RecordStore;
use std::sync::Arc;

pub struct CompanyService<S: RecordStore> {
    access: EntityAccess<S>,
}

impl<S: RecordStore> CompanyService<S> {
    pub fn new(store: S, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            access: EntityAccess::new(store, notifier),
        }
    }

    pub fn list(&self) -> Vec<Company> {
        self.access.list()
    }

    pub fn get(&self, id: RecordId) -> ServiceResult<Company> {
        self.access.get(id)
    }

    pub fn create(&self, draft: &CompanyDraft) -> ServiceResult<Option<Company>> {
        self.access.create(draft.to_record())
    }

    pub fn update(&self, id: RecordId, draft: &CompanyDraft) -> ServiceResult<Option<Company>> {
        self.access.update(id, draft.to_record())
    }

    pub fn remove(&self, id: RecordId) -> bool {
        self.access.remove::<Company>(id)
    }

    /// Matches name, industry or size.
    pub fn search(&self, query: &str) -> Vec<Company> {
        self.access.search(query)
    }
}
