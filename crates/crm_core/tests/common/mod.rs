#![allow(dead_code)]

use crm_core::store::{Envelope, Operation, RecordParams, RecordStore, StoreError, StoreResult};
use crm_core::{CrmClient, RecordingNotifier, SqliteRecordStore};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// One request seen by [`ScriptedStore`].
#[derive(Debug, Clone)]
pub struct Call {
    pub entity: String,
    pub operation: Operation,
    pub params: RecordParams,
}

/// Store answering with queued envelopes, recording every request.
#[derive(Default)]
pub struct ScriptedStore {
    replies: Mutex<VecDeque<Result<Envelope, u16>>>,
    calls: Mutex<Vec<Call>>,
}

impl ScriptedStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(self, envelope: Envelope) -> Self {
        self.replies.lock().unwrap().push_back(Ok(envelope));
        self
    }

    /// Queues a transport failure with the given HTTP status.
    pub fn fail_with_status(self, status: u16) -> Self {
        self.replies.lock().unwrap().push_back(Err(status));
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }
}

impl RecordStore for ScriptedStore {
    fn submit(
        &self,
        entity: &str,
        operation: Operation,
        params: &RecordParams,
    ) -> StoreResult<Envelope> {
        self.calls.lock().unwrap().push(Call {
            entity: entity.to_string(),
            operation,
            params: params.clone(),
        });
        match self.replies.lock().unwrap().pop_front() {
            Some(Ok(envelope)) => Ok(envelope),
            Some(Err(status)) => Err(StoreError::Status {
                status,
                body: "scripted failure".to_string(),
            }),
            None => Err(StoreError::Unavailable("no scripted reply left")),
        }
    }
}

pub fn scripted_client(store: ScriptedStore) -> (CrmClient<ScriptedStore>, Arc<RecordingNotifier>) {
    let notifier = Arc::new(RecordingNotifier::new());
    (CrmClient::new(store, notifier.clone()), notifier)
}

pub fn sqlite_client() -> (CrmClient<SqliteRecordStore>, Arc<RecordingNotifier>) {
    let notifier = Arc::new(RecordingNotifier::new());
    let store = SqliteRecordStore::in_memory().unwrap();
    (CrmClient::new(store, notifier.clone()), notifier)
}
