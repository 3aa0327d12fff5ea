//! Company domain model.

use crate::model::record::{
    read_id, read_opt_text, read_text, MappingError, RecordId, StorageMapping, StorageRecord,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

const NAME: &str = "name_c";
const INDUSTRY: &str = "industry_c";
const SIZE: &str = "size_c";
const WEBSITE: &str = "website_c";
const ADDRESS: &str = "address_c";
const NOTES: &str = "notes_c";
const CREATED_AT: &str = "createdAt_c";

/// Organization referenced by contacts and deals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Company {
    pub id: RecordId,
    pub name: String,
    pub industry: String,
    /// Free-form headcount bucket such as `"51-200"`.
    pub size: String,
    pub website: String,
    pub address: String,
    pub notes: String,
    pub created_at: Option<String>,
}

/// Caller-supplied company fields for create and full update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyDraft {
    pub name: String,
    pub industry: String,
    pub size: String,
    pub website: String,
    pub address: String,
    pub notes: String,
}

impl CompanyDraft {
    pub fn to_record(&self) -> StorageRecord {
        [
            (NAME, &self.name),
            (INDUSTRY, &self.industry),
            (SIZE, &self.size),
            (WEBSITE, &self.website),
            (ADDRESS, &self.address),
            (NOTES, &self.notes),
        ]
        .into_iter()
        .map(|(field, value)| (field.to_string(), Value::from(value.as_str())))
        .collect()
    }
}

impl StorageMapping for Company {
    const ENTITY: &'static str = "company_c";
    const LABEL: &'static str = "company";
    const FIELDS: &'static [&'static str] =
        &[NAME, INDUSTRY, SIZE, WEBSITE, ADDRESS, NOTES, CREATED_AT];
    const SEARCH_FIELDS: &'static [&'static str] = &[NAME, INDUSTRY, SIZE];

    fn from_record(record: &StorageRecord) -> Result<Self, MappingError> {
        Ok(Self {
            id: read_id(record)?,
            name: read_text(record, NAME),
            industry: read_text(record, INDUSTRY),
            size: read_text(record, SIZE),
            website: read_text(record, WEBSITE),
            address: read_text(record, ADDRESS),
            notes: read_text(record, NOTES),
            created_at: read_opt_text(record, CREATED_AT),
        })
    }
}
