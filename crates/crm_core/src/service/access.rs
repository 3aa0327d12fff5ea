//! Generic entity access over the record store.
//!
//! # Responsibility
//! - Run the shared request pattern for every entity: build params, submit,
//!   check `success`, map records, notify failures.
//! - Split write batches into succeeded records and per-record failures.
//!
//! # Invariants
//! - Reads never return `Err`; failures yield empty results plus a warning.
//! - Top-level write refusals are `ServiceError::Rejected`.
//! - Transport errors are always notified; reads as warnings, writes and
//!   single-record loads as errors.
//! - `success=true` without `results` on a write is reported as `None` and
//!   logged, never treated as a created record.

use crate::logging::{sanitize_message, MAX_STORE_MESSAGE_CHARS};
use crate::model::record::{as_record, RecordId, StorageMapping, StorageRecord, ID_FIELD};
use crate::notify::{NoticeLevel, Notifier};
use crate::service::{ServiceError, ServiceResult};
use crate::store::{Envelope, Operation, RecordParams, RecordResult, RecordStore};
use chrono::{SecondsFormat, Utc};
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;

pub(crate) const CREATED_AT_FIELD: &str = "createdAt_c";
pub(crate) const UPDATED_AT_FIELD: &str = "updatedAt_c";

const NO_RESULT_MESSAGE: &str = "no result returned for record";

/// Current time as an ISO-8601 UTC timestamp with millisecond precision.
pub fn now_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Per-record failure inside a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordFailure {
    /// Id the failure belongs to, when the batch addressed ids.
    pub id: Option<RecordId>,
    /// Field-label prefixed messages, then the record message.
    pub messages: Vec<String>,
}

/// Outcome of a multi-record batch that the store accepted.
#[derive(Debug, Clone, PartialEq)]
pub struct BulkReport<T> {
    pub succeeded: Vec<T>,
    pub errors: Vec<RecordFailure>,
    pub success_count: usize,
    pub error_count: usize,
}

impl<T> Default for BulkReport<T> {
    fn default() -> Self {
        Self {
            succeeded: Vec::new(),
            errors: Vec::new(),
            success_count: 0,
            error_count: 0,
        }
    }
}

impl<T> BulkReport<T> {
    fn push_success(&mut self, item: T) {
        self.succeeded.push(item);
        self.success_count += 1;
    }

    fn push_failure(&mut self, failure: RecordFailure) {
        self.errors.push(failure);
        self.error_count += 1;
    }

    /// Every record in the batch succeeded.
    pub fn is_complete(&self) -> bool {
        self.error_count == 0
    }
}

/// Shared request helper used by every entity service.
pub struct EntityAccess<S> {
    store: S,
    notifier: Arc<dyn Notifier>,
}

impl<S: RecordStore> EntityAccess<S> {
    pub fn new(store: S, notifier: Arc<dyn Notifier>) -> Self {
        Self { store, notifier }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Read params selecting every mapped field of `T`.
    pub fn select<T: StorageMapping>() -> RecordParams {
        RecordParams::select(T::FIELDS)
    }

    pub fn list<T: StorageMapping>(&self) -> Vec<T> {
        self.fetch(&Self::select::<T>())
    }

    /// OR-contains search across `T::SEARCH_FIELDS`. An empty query is sent
    /// as-is and matches every record.
    pub fn search<T: StorageMapping>(&self, query: &str) -> Vec<T> {
        self.fetch(&Self::select::<T>().any_contains(T::SEARCH_FIELDS, query))
    }

    /// Runs a fetch and maps the returned records; empty on failure.
    pub fn fetch<T: StorageMapping>(&self, params: &RecordParams) -> Vec<T> {
        self.try_fetch(params).unwrap_or_default()
    }

    /// Like [`fetch`](Self::fetch), but `None` when the store failed.
    ///
    /// Records that cannot be mapped are skipped and logged.
    pub fn try_fetch<T: StorageMapping>(&self, params: &RecordParams) -> Option<Vec<T>> {
        let started_at = Instant::now();
        let envelope = match self.store.submit(T::ENTITY, Operation::Fetch, params) {
            Ok(envelope) => envelope,
            Err(err) => {
                log::error!(
                    "event=entity_fetch module=service status=error entity={} error={err}",
                    T::ENTITY
                );
                self.notify(NoticeLevel::Warning, &err.to_string());
                return None;
            }
        };
        if !envelope.success {
            let message = envelope.message_or(&format!("Failed to load {} records", T::LABEL));
            log::warn!(
                "event=entity_fetch module=service status=rejected entity={} message={}",
                T::ENTITY,
                sanitize(&message)
            );
            self.notify(NoticeLevel::Warning, &message);
            return None;
        }

        let rows = match envelope.data {
            Some(Value::Array(rows)) => rows,
            Some(Value::Null) | None => Vec::new(),
            Some(other) => vec![other],
        };
        let total = rows.len();
        let items: Vec<T> = rows.iter().filter_map(|row| map_record::<T>(row)).collect();
        log::debug!(
            "event=entity_fetch module=service status=ok entity={} count={} skipped={} duration_ms={}",
            T::ENTITY,
            items.len(),
            total - items.len(),
            started_at.elapsed().as_millis()
        );
        Some(items)
    }

    /// Loads one record by id.
    pub fn get<T: StorageMapping>(&self, id: RecordId) -> ServiceResult<T> {
        let envelope = self
            .store
            .submit(T::ENTITY, Operation::GetById(id), &Self::select::<T>())
            .map_err(|err| {
                log::error!(
                    "event=entity_get module=service status=error entity={} id={id} error={err}",
                    T::ENTITY
                );
                self.notify(NoticeLevel::Error, &err.to_string());
                ServiceError::from(err)
            })?;
        if !envelope.success {
            let message = envelope.message_or("record not found");
            log::warn!(
                "event=entity_get module=service status=not_found entity={} id={id} message={}",
                T::ENTITY,
                sanitize(&message)
            );
            return Err(ServiceError::NotFound {
                entity: T::LABEL,
                id,
                message,
            });
        }
        let data = envelope.data.unwrap_or(Value::Null);
        if data.is_null() {
            return Err(ServiceError::NotFound {
                entity: T::LABEL,
                id,
                message: "store returned no record".to_string(),
            });
        }
        Ok(T::from_record(as_record(&data)?)?)
    }

    /// Creates one record, stamping `createdAt` (and `updatedAt` when `T`
    /// tracks it).
    pub fn create<T: StorageMapping>(&self, mut record: StorageRecord) -> ServiceResult<Option<T>> {
        record.remove(ID_FIELD);
        let now = now_iso();
        record.insert(CREATED_AT_FIELD.into(), Value::from(now.as_str()));
        if T::TRACKS_UPDATED_AT {
            record.insert(UPDATED_AT_FIELD.into(), Value::from(now));
        }
        self.write_one::<T>(Operation::Create, record)
    }

    /// Replaces the given fields of record `id`. `createdAt` is never sent.
    pub fn update<T: StorageMapping>(
        &self,
        id: RecordId,
        mut record: StorageRecord,
    ) -> ServiceResult<Option<T>> {
        record.remove(CREATED_AT_FIELD);
        record.insert(ID_FIELD.into(), Value::from(id));
        if T::TRACKS_UPDATED_AT {
            record.insert(UPDATED_AT_FIELD.into(), Value::from(now_iso()));
        }
        self.write_one::<T>(Operation::Update, record)
    }

    /// Deletes record `id`; `true` only when exactly one deletion succeeded.
    pub fn remove<T: StorageMapping>(&self, id: RecordId) -> bool {
        let params = RecordParams::delete(vec![id]);
        let Ok(envelope) = self.submit_batch::<T>(Operation::Delete, &params) else {
            return false;
        };
        let Some(results) = envelope.results else {
            log::warn!(
                "event=entity_delete module=service status=empty entity={} id={id}",
                T::ENTITY
            );
            return false;
        };
        self.notify_failures(&results);
        let succeeded = results.iter().filter(|result| result.success).count();
        log::info!(
            "event=entity_delete module=service status={} entity={} id={id}",
            if succeeded == 1 { "ok" } else { "failed" },
            T::ENTITY
        );
        succeeded == 1
    }

    /// Applies `patch` to every id in one update batch.
    pub fn bulk_update<T: StorageMapping>(
        &self,
        ids: &[RecordId],
        patch: &StorageRecord,
    ) -> ServiceResult<BulkReport<T>> {
        if ids.is_empty() {
            return Ok(BulkReport::default());
        }
        let stamp = T::TRACKS_UPDATED_AT.then(now_iso);
        let records = ids
            .iter()
            .map(|id| {
                let mut record = patch.clone();
                record.remove(CREATED_AT_FIELD);
                record.insert(ID_FIELD.into(), Value::from(*id));
                if let Some(stamp) = &stamp {
                    record.insert(UPDATED_AT_FIELD.into(), Value::from(stamp.as_str()));
                }
                record
            })
            .collect();
        let envelope = self.submit_batch::<T>(Operation::Update, &RecordParams::batch(records))?;
        let report = split_batch(ids, envelope.results, |_, result| {
            let data = result.data.as_ref().unwrap_or(&Value::Null);
            as_record(data)
                .and_then(T::from_record)
                .map_err(|err| err.to_string())
        });
        log_bulk::<T, _>(Operation::Update, &report);
        Ok(report)
    }

    /// Deletes every id in one batch; succeeded entries are the deleted ids.
    pub fn bulk_delete<T: StorageMapping>(
        &self,
        ids: &[RecordId],
    ) -> ServiceResult<BulkReport<RecordId>> {
        if ids.is_empty() {
            return Ok(BulkReport::default());
        }
        let envelope =
            self.submit_batch::<T>(Operation::Delete, &RecordParams::delete(ids.to_vec()))?;
        let report = split_batch(ids, envelope.results, |id, _| Ok(id));
        log_bulk::<T, _>(Operation::Delete, &report);
        Ok(report)
    }

    fn write_one<T: StorageMapping>(
        &self,
        operation: Operation,
        record: StorageRecord,
    ) -> ServiceResult<Option<T>> {
        let envelope = self.submit_batch::<T>(operation, &RecordParams::batch(vec![record]))?;
        let Some(results) = envelope.results else {
            log::warn!(
                "event=entity_{} module=service status=empty entity={} reason=no_results",
                operation.name(),
                T::ENTITY
            );
            return Ok(None);
        };
        self.notify_failures(&results);

        let Some(first) = results.iter().find(|result| result.success) else {
            log::warn!(
                "event=entity_{} module=service status=failed entity={} failed={}",
                operation.name(),
                T::ENTITY,
                results.len()
            );
            return Ok(None);
        };
        let Some(data) = first.data.as_ref().filter(|data| !data.is_null()) else {
            log::warn!(
                "event=entity_{} module=service status=empty entity={} reason=no_data",
                operation.name(),
                T::ENTITY
            );
            return Ok(None);
        };
        let item = T::from_record(as_record(data)?)?;
        log::info!(
            "event=entity_{} module=service status=ok entity={}",
            operation.name(),
            T::ENTITY
        );
        Ok(Some(item))
    }

    /// Submits a write batch and enforces the top-level `success` flag.
    fn submit_batch<T: StorageMapping>(
        &self,
        operation: Operation,
        params: &RecordParams,
    ) -> ServiceResult<Envelope> {
        let envelope = self
            .store
            .submit(T::ENTITY, operation, params)
            .map_err(|err| {
                log::error!(
                    "event=entity_{} module=service status=error entity={} error={err}",
                    operation.name(),
                    T::ENTITY
                );
                self.notify(NoticeLevel::Error, &err.to_string());
                ServiceError::from(err)
            })?;
        if envelope.success {
            return Ok(envelope);
        }
        let message = envelope.message_or(&format!("Failed to {} {}", operation.name(), T::LABEL));
        log::error!(
            "event=entity_{} module=service status=rejected entity={} message={}",
            operation.name(),
            T::ENTITY,
            sanitize(&message)
        );
        self.notify(NoticeLevel::Error, &message);
        Err(ServiceError::Rejected {
            entity: T::LABEL,
            message,
        })
    }

    fn notify_failures(&self, results: &[RecordResult]) {
        for result in results.iter().filter(|result| !result.success) {
            for message in result.failure_messages() {
                self.notify(NoticeLevel::Error, &message);
            }
        }
    }

    fn notify(&self, level: NoticeLevel, message: &str) {
        self.notifier.notify(level, message);
    }
}

fn map_record<T: StorageMapping>(row: &Value) -> Option<T> {
    match as_record(row).and_then(T::from_record) {
        Ok(item) => Some(item),
        Err(err) => {
            log::warn!(
                "event=record_map module=service status=skipped entity={} error={err}",
                T::ENTITY
            );
            None
        }
    }
}

/// Pairs batch results with the ids they were submitted for.
///
/// A missing `results` array, or a results array shorter than `ids`, counts
/// the unanswered ids as failures.
fn split_batch<T>(
    ids: &[RecordId],
    results: Option<Vec<RecordResult>>,
    mut on_success: impl FnMut(RecordId, &RecordResult) -> Result<T, String>,
) -> BulkReport<T> {
    let mut report = BulkReport::default();
    let results = results.unwrap_or_default();
    if results.len() > ids.len() {
        log::warn!(
            "event=batch_split module=service status=extra_results expected={} got={}",
            ids.len(),
            results.len()
        );
    }
    let mut answered = results.iter();
    for id in ids {
        let failure = |messages: Vec<String>| RecordFailure {
            id: Some(*id),
            messages,
        };
        match answered.next() {
            Some(result) if result.success => match on_success(*id, result) {
                Ok(item) => report.push_success(item),
                Err(message) => report.push_failure(failure(vec![message])),
            },
            Some(result) => {
                let mut messages = result.failure_messages();
                if messages.is_empty() {
                    messages.push("record rejected".to_string());
                }
                report.push_failure(failure(messages));
            }
            None => report.push_failure(failure(vec![NO_RESULT_MESSAGE.to_string()])),
        }
    }
    report
}

fn log_bulk<T: StorageMapping, U>(operation: Operation, report: &BulkReport<U>) {
    log::info!(
        "event=entity_bulk_{} module=service status={} entity={} success_count={} error_count={}",
        operation.name(),
        if report.is_complete() { "ok" } else { "partial" },
        T::ENTITY,
        report.success_count,
        report.error_count
    );
}

fn sanitize(message: &str) -> String {
    sanitize_message(message, MAX_STORE_MESSAGE_CHARS)
}
