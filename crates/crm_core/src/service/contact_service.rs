//! Contact use-case service.
//!
//! # Responsibility
//! - CRUD, search and company lookups for contacts.
//! - Multi-record update/delete batches with partial-failure reports.
//! - CSV export of caller-supplied contacts.
//!
//! # Invariants
//! - Every write stamps `updatedAt`; creates also stamp `createdAt`.
//! - Bulk calls are one store round trip; an empty id list makes none.

use crate::model::company::Company;
use crate::model::contact::{self, Contact, ContactDraft, ContactPatch};
use crate::model::record::RecordId;
use crate::notify::Notifier;
use crate::service::access::{BulkReport, EntityAccess};
use crate::service::export::{write_contacts_csv, ExportSummary};
use crate::service::ServiceResult;
use crate::store::{Operator, RecordStore};
use chrono::Local;
use std::path::Path;
use std::sync::Arc;

pub struct ContactService<S: RecordStore> {
    access: EntityAccess<S>,
}

impl<S: RecordStore> ContactService<S> {
    pub fn new(store: S, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            access: EntityAccess::new(store, notifier),
        }
    }

    /// All contacts in store order; empty on failure.
    pub fn list(&self) -> Vec<Contact> {
        self.access.list()
    }

    pub fn get(&self, id: RecordId) -> ServiceResult<Contact> {
        self.access.get(id)
    }

    /// Creates a contact and returns the stored record, if the store sent it.
    pub fn create(&self, draft: &ContactDraft) -> ServiceResult<Option<Contact>> {
        self.access.create(draft.to_record())
    }

    /// Replaces every editable field of contact `id`.
    pub fn update(&self, id: RecordId, draft: &ContactDraft) -> ServiceResult<Option<Contact>> {
        self.access.update(id, draft.to_record())
    }

    pub fn remove(&self, id: RecordId) -> bool {
        self.access.remove::<Contact>(id)
    }

    /// Case-insensitive match on first name, last name, email or title.
    pub fn search(&self, query: &str) -> Vec<Contact> {
        self.access.search(query)
    }

    pub fn by_company(&self, company_id: RecordId) -> Vec<Contact> {
        let params = EntityAccess::<S>::select::<Contact>().filter(
            contact::COMPANY_ID,
            Operator::EqualTo,
            company_id,
        );
        self.access.fetch(&params)
    }

    /// Applies `patch` to each id. Per-record failures land in the report;
    /// a refused batch is an error.
    pub fn bulk_update(
        &self,
        ids: &[RecordId],
        patch: &ContactPatch,
    ) -> ServiceResult<BulkReport<Contact>> {
        self.access.bulk_update(ids, &patch.to_record())
    }

    /// Deletes each id; the report lists the deleted ids.
    pub fn bulk_delete(&self, ids: &[RecordId]) -> ServiceResult<BulkReport<RecordId>> {
        self.access.bulk_delete::<Contact>(ids)
    }

    /// Writes `contacts` as `contacts_export_<today>.csv` into `out_dir`.
    pub fn bulk_export(
        &self,
        contacts: &[Contact],
        companies: &[Company],
        out_dir: &Path,
    ) -> ServiceResult<ExportSummary> {
        write_contacts_csv(contacts, companies, out_dir, Local::now().date_naive())
    }
}
