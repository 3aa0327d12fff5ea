//! Local record store backed by SQLite.
//!
//! # Responsibility
//! - Persist flat records of any entity type as JSON bodies.
//! - Answer the same envelope shapes as the remote store, including
//!   per-record failures inside write batches.
//!
//! # Invariants
//! - `Id` is assigned by SQLite and is never taken from a submitted body.
//! - A write batch runs in one transaction; per-record failures do not roll
//!   back the records that succeeded.
//! - Filters, ordering and paging are applied in that order.

use crate::db::{open_db, open_db_in_memory, DbError};
use crate::model::record::{read_id, RecordId, StorageRecord, ID_FIELD};
use crate::store::envelope::{Envelope, RecordResult};
use crate::store::params::{sort_cmp, RecordParams, SortType};
use crate::store::{Operation, RecordStore, StoreError, StoreResult};
use log::debug;
use rusqlite::{params, Connection, OptionalExtension, Transaction};
use serde_json::Value;
use std::path::Path;
use std::sync::Mutex;

/// SQLite-backed [`RecordStore`].
pub struct SqliteRecordStore {
    conn: Mutex<Connection>,
}

impl SqliteRecordStore {
    /// Opens (or creates) a store file and applies migrations.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        Ok(Self::from_connection(open_db(path)?))
    }

    /// Opens a private in-memory store.
    pub fn in_memory() -> StoreResult<Self> {
        Ok(Self::from_connection(open_db_in_memory()?))
    }

    /// Wraps an already migrated connection.
    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    fn fetch(conn: &Connection, entity: &str, params: &RecordParams) -> StoreResult<Envelope> {
        let mut records: Vec<StorageRecord> = load_all(conn, entity)?
            .into_iter()
            .filter(|record| params.matches(record))
            .collect();

        for order in params.order_by.iter().rev() {
            records.sort_by(|left, right| {
                let ordering = sort_cmp(left.get(&order.field_name), right.get(&order.field_name));
                match order.sort_type {
                    SortType::Asc => ordering,
                    SortType::Desc => ordering.reverse(),
                }
            });
        }

        let page: Vec<Value> = match params.paging {
            Some(paging) => records
                .into_iter()
                .skip(paging.offset as usize)
                .take(paging.limit as usize)
                .map(|record| project(record, params))
                .collect(),
            None => records
                .into_iter()
                .map(|record| project(record, params))
                .collect(),
        };
        Ok(Envelope::with_data(Value::Array(page)))
    }

    fn get(
        conn: &Connection,
        entity: &str,
        id: RecordId,
        params: &RecordParams,
    ) -> StoreResult<Envelope> {
        match load_one(conn, entity, id)? {
            Some(record) => Ok(Envelope::with_data(project(record, params))),
            None => Ok(Envelope::failure(format!(
                "Record with Id {id} does not exist"
            ))),
        }
    }

    fn create(tx: &Transaction<'_>, entity: &str, params: &RecordParams) -> StoreResult<Envelope> {
        let mut results = Vec::with_capacity(params.records.len());
        for record in &params.records {
            if record.contains_key(ID_FIELD) {
                results.push(RecordResult::rejected_field(
                    ID_FIELD,
                    "is assigned by the store and cannot be supplied",
                ));
                continue;
            }
            let body = serde_json::to_string(record)?;
            tx.execute(
                "INSERT INTO records (entity, body) VALUES (?1, ?2);",
                params![entity, body],
            )?;
            let mut stored = record.clone();
            stored.insert(ID_FIELD.into(), Value::from(tx.last_insert_rowid()));
            results.push(RecordResult::succeeded(Value::Object(stored)));
        }
        Ok(Envelope::with_results(results))
    }

    fn update(tx: &Transaction<'_>, entity: &str, params: &RecordParams) -> StoreResult<Envelope> {
        let mut results = Vec::with_capacity(params.records.len());
        for record in &params.records {
            let Ok(id) = read_id(record) else {
                results.push(RecordResult::rejected_field(ID_FIELD, "is required for update"));
                continue;
            };
            let Some(mut stored) = load_one(tx, entity, id)? else {
                results.push(RecordResult::failed(format!(
                    "Record with Id {id} does not exist"
                )));
                continue;
            };

            for (field, value) in record {
                if field != ID_FIELD {
                    stored.insert(field.clone(), value.clone());
                }
            }
            let mut body = stored.clone();
            body.remove(ID_FIELD);
            tx.execute(
                "UPDATE records
                 SET body = ?3, updated_at = (strftime('%s', 'now') * 1000)
                 WHERE entity = ?1 AND id = ?2;",
                params![entity, id, serde_json::to_string(&body)?],
            )?;
            results.push(RecordResult::succeeded(Value::Object(stored)));
        }
        Ok(Envelope::with_results(results))
    }

    fn delete(tx: &Transaction<'_>, entity: &str, params: &RecordParams) -> StoreResult<Envelope> {
        let mut results = Vec::with_capacity(params.record_ids.len());
        for id in &params.record_ids {
            let changed = tx.execute(
                "DELETE FROM records WHERE entity = ?1 AND id = ?2;",
                params![entity, id],
            )?;
            results.push(if changed == 0 {
                RecordResult::failed(format!("Record with Id {id} does not exist"))
            } else {
                let mut deleted = StorageRecord::new();
                deleted.insert(ID_FIELD.into(), Value::from(*id));
                RecordResult::succeeded(Value::Object(deleted))
            });
        }
        Ok(Envelope::with_results(results))
    }
}

impl RecordStore for SqliteRecordStore {
    fn submit(
        &self,
        entity: &str,
        operation: Operation,
        params: &RecordParams,
    ) -> StoreResult<Envelope> {
        if !is_valid_entity(entity) {
            return Ok(Envelope::failure(format!("Unknown entity type `{entity}`")));
        }

        let mut conn = self
            .conn
            .lock()
            .map_err(|_| StoreError::Unavailable("sqlite connection lock poisoned"))?;
        debug!(
            "event=store_submit module=store.sqlite entity={entity} op={}",
            operation.name()
        );

        match operation {
            Operation::Fetch => Self::fetch(&conn, entity, params),
            Operation::GetById(id) => Self::get(&conn, entity, id, params),
            Operation::Create | Operation::Update if params.records.is_empty() => {
                Ok(Envelope::failure("No records supplied"))
            }
            Operation::Delete if params.record_ids.is_empty() => {
                Ok(Envelope::failure("No record ids supplied"))
            }
            Operation::Create | Operation::Update | Operation::Delete => {
                let tx = conn.transaction()?;
                let envelope = match operation {
                    Operation::Create => Self::create(&tx, entity, params)?,
                    Operation::Update => Self::update(&tx, entity, params)?,
                    _ => Self::delete(&tx, entity, params)?,
                };
                tx.commit()?;
                Ok(envelope)
            }
        }
    }
}

fn is_valid_entity(entity: &str) -> bool {
    !entity.is_empty()
        && entity
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || ch == '_')
}

fn load_all(conn: &Connection, entity: &str) -> StoreResult<Vec<StorageRecord>> {
    let mut stmt = conn.prepare("SELECT id, body FROM records WHERE entity = ?1 ORDER BY id;")?;
    let mut rows = stmt.query([entity])?;
    let mut records = Vec::new();
    while let Some(row) = rows.next()? {
        records.push(decode_body(row.get(0)?, row.get(1)?)?);
    }
    Ok(records)
}

fn load_one(conn: &Connection, entity: &str, id: RecordId) -> StoreResult<Option<StorageRecord>> {
    let body: Option<String> = conn
        .query_row(
            "SELECT body FROM records WHERE entity = ?1 AND id = ?2;",
            params![entity, id],
            |row| row.get(0),
        )
        .optional()?;
    body.map(|body| decode_body(id, body)).transpose()
}

fn decode_body(id: RecordId, body: String) -> StoreResult<StorageRecord> {
    match serde_json::from_str::<Value>(&body)? {
        Value::Object(mut record) => {
            record.insert(ID_FIELD.into(), Value::from(id));
            Ok(record)
        }
        other => Err(DbError::CorruptRecord {
            id,
            reason: format!("expected object body, found `{other}`"),
        }
        .into()),
    }
}

/// Keeps `Id` plus the selected fields; no selection keeps everything.
fn project(record: StorageRecord, params: &RecordParams) -> Value {
    if params.fields.is_empty() {
        return Value::Object(record);
    }
    let mut projected = StorageRecord::new();
    if let Some(id) = record.get(ID_FIELD) {
        projected.insert(ID_FIELD.into(), id.clone());
    }
    for name in params.field_names() {
        if let Some(value) = record.get(name) {
            projected.insert(name.to_string(), value.clone());
        }
    }
    Value::Object(projected)
}

#[cfg(test)]
mod tests {
    use super::{is_valid_entity, SqliteRecordStore};
    use crate::store::params::{Operator, RecordParams, SortType};
    use crate::store::{Operation, RecordStore};
    use serde_json::{json, Value};

    fn record(value: Value) -> crate::model::record::StorageRecord {
        value.as_object().cloned().unwrap()
    }

    fn seed(store: &SqliteRecordStore, values: Vec<Value>) -> Vec<i64> {
        let envelope = store
            .submit(
                "item_c",
                Operation::Create,
                &RecordParams::batch(values.into_iter().map(record).collect()),
            )
            .unwrap();
        envelope
            .results
            .unwrap()
            .into_iter()
            .map(|result| result.data.unwrap()["Id"].as_i64().unwrap())
            .collect()
    }

    #[test]
    fn entity_names_are_restricted_to_identifiers() {
        assert!(is_valid_entity("contact_c"));
        assert!(!is_valid_entity(""));
        assert!(!is_valid_entity("contact; DROP"));
    }

    #[test]
    fn fetch_filters_orders_and_pages() {
        let store = SqliteRecordStore::in_memory().unwrap();
        seed(
            &store,
            vec![
                json!({"n_c": 3, "done_c": false}),
                json!({"n_c": 1, "done_c": false}),
                json!({"n_c": 2, "done_c": true}),
                json!({"n_c": 4, "done_c": false}),
            ],
        );

        let params = RecordParams::select(&["n_c"])
            .filter("done_c", Operator::EqualTo, false)
            .order("n_c", SortType::Asc)
            .page(2, 0);
        let envelope = store.submit("item_c", Operation::Fetch, &params).unwrap();
        let data = envelope.data.unwrap();
        let values: Vec<i64> = data
            .as_array()
            .unwrap()
            .iter()
            .map(|row| row["n_c"].as_i64().unwrap())
            .collect();
        assert_eq!(values, vec![1, 3]);
        assert!(data[0].get("done_c").is_none());
        assert!(data[0].get("Id").is_some());
    }

    #[test]
    fn entities_are_isolated() {
        let store = SqliteRecordStore::in_memory().unwrap();
        let ids = seed(&store, vec![json!({"n_c": 1})]);

        let other = store
            .submit("other_c", Operation::GetById(ids[0]), &RecordParams::default())
            .unwrap();
        assert!(!other.success);
    }

    #[test]
    fn update_merges_fields_and_reports_missing_rows() {
        let store = SqliteRecordStore::in_memory().unwrap();
        let ids = seed(&store, vec![json!({"a_c": "x", "b_c": "y"})]);

        let envelope = store
            .submit(
                "item_c",
                Operation::Update,
                &RecordParams::batch(vec![
                    record(json!({"Id": ids[0], "b_c": "z"})),
                    record(json!({"Id": 9999, "b_c": "z"})),
                ]),
            )
            .unwrap();
        let results = envelope.results.unwrap();
        assert!(results[0].success);
        assert_eq!(
            results[0].data.as_ref().unwrap(),
            &json!({"Id": ids[0], "a_c": "x", "b_c": "z"})
        );
        assert!(!results[1].success);
    }

    #[test]
    fn create_rejects_caller_supplied_ids_per_record() {
        let store = SqliteRecordStore::in_memory().unwrap();
        let envelope = store
            .submit(
                "item_c",
                Operation::Create,
                &RecordParams::batch(vec![record(json!({"Id": 5})), record(json!({"a_c": 1}))]),
            )
            .unwrap();
        assert!(envelope.success);
        let results = envelope.results.unwrap();
        assert_eq!(
            results[0].failure_messages()[0],
            "Id: is assigned by the store and cannot be supplied"
        );
        assert!(results[1].success);
    }

    #[test]
    fn empty_batches_fail_at_top_level() {
        let store = SqliteRecordStore::in_memory().unwrap();
        let envelope = store
            .submit("item_c", Operation::Delete, &RecordParams::delete(vec![]))
            .unwrap();
        assert!(!envelope.success);
        assert_eq!(envelope.message.as_deref(), Some("No record ids supplied"));
    }
}
