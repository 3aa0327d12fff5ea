//! Contact domain model.
//!
//! # Invariants
//! - `id` is assigned by the record store and never rewritten by callers.
//! - `company_id` is a weak reference; it is not checked against companies.

use crate::model::record::{
    read_id, read_opt_text, read_ref, read_text, ref_value, MappingError, RecordId, StorageMapping,
    StorageRecord,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub(crate) const FIRST_NAME: &str = "firstName_c";
pub(crate) const LAST_NAME: &str = "lastName_c";
pub(crate) const EMAIL: &str = "email_c";
pub(crate) const PHONE: &str = "phone_c";
pub(crate) const TITLE: &str = "title_c";
pub(crate) const NOTES: &str = "notes_c";
pub(crate) const COMPANY_ID: &str = "companyId_c";
pub(crate) const CREATED_AT: &str = "createdAt_c";
pub(crate) const UPDATED_AT: &str = "updatedAt_c";

/// Person tracked by the CRM.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    pub id: RecordId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub title: String,
    pub notes: String,
    pub company_id: Option<RecordId>,
    /// ISO-8601 creation timestamp.
    pub created_at: Option<String>,
    /// ISO-8601 timestamp of the last write.
    pub updated_at: Option<String>,
}

impl Contact {
    /// Returns `"First Last"` with surrounding whitespace removed.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }

    /// Projects the editable fields back into a draft.
    pub fn to_draft(&self) -> ContactDraft {
        ContactDraft {
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            email: self.email.clone(),
            phone: self.phone.clone(),
            title: self.title.clone(),
            notes: self.notes.clone(),
            company_id: self.company_id,
        }
    }
}

/// Caller-supplied contact fields for create and full update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactDraft {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub title: String,
    pub notes: String,
    pub company_id: Option<RecordId>,
}

impl ContactDraft {
    /// Maps domain fields to storage fields.
    pub fn to_record(&self) -> StorageRecord {
        let mut record = StorageRecord::new();
        record.insert(FIRST_NAME.into(), Value::from(self.first_name.as_str()));
        record.insert(LAST_NAME.into(), Value::from(self.last_name.as_str()));
        record.insert(EMAIL.into(), Value::from(self.email.as_str()));
        record.insert(PHONE.into(), Value::from(self.phone.as_str()));
        record.insert(TITLE.into(), Value::from(self.title.as_str()));
        record.insert(NOTES.into(), Value::from(self.notes.as_str()));
        record.insert(COMPANY_ID.into(), ref_value(self.company_id));
        record
    }
}

/// Partial contact update applied to every record of a bulk batch.
///
/// Only `Some` fields are written; everything else is left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactPatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub title: Option<String>,
    pub notes: Option<String>,
    /// `Some(None)` clears the company link.
    pub company_id: Option<Option<RecordId>>,
}

impl ContactPatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Maps the present fields to storage fields.
    pub fn to_record(&self) -> StorageRecord {
        let mut record = StorageRecord::new();
        let texts = [
            (FIRST_NAME, &self.first_name),
            (LAST_NAME, &self.last_name),
            (EMAIL, &self.email),
            (PHONE, &self.phone),
            (TITLE, &self.title),
            (NOTES, &self.notes),
        ];
        for (field, value) in texts {
            if let Some(value) = value {
                record.insert(field.into(), Value::from(value.as_str()));
            }
        }
        if let Some(company_id) = self.company_id {
            record.insert(COMPANY_ID.into(), ref_value(company_id));
        }
        record
    }
}

impl StorageMapping for Contact {
    const ENTITY: &'static str = "contact_c";
    const LABEL: &'static str = "contact";
    const FIELDS: &'static [&'static str] = &[
        FIRST_NAME, LAST_NAME, EMAIL, PHONE, TITLE, NOTES, COMPANY_ID, CREATED_AT, UPDATED_AT,
    ];
    const SEARCH_FIELDS: &'static [&'static str] = &[FIRST_NAME, LAST_NAME, EMAIL, TITLE];
    const TRACKS_UPDATED_AT: bool = true;

    fn from_record(record: &StorageRecord) -> Result<Self, MappingError> {
        Ok(Self {
            id: read_id(record)?,
            first_name: read_text(record, FIRST_NAME),
            last_name: read_text(record, LAST_NAME),
            email: read_text(record, EMAIL),
            phone: read_text(record, PHONE),
            title: read_text(record, TITLE),
            notes: read_text(record, NOTES),
            company_id: read_ref(record, COMPANY_ID)?,
            created_at: read_opt_text(record, CREATED_AT),
            updated_at: read_opt_text(record, UPDATED_AT),
        })
    }
}
