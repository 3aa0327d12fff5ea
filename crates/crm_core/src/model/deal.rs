//! Deal domain model and pipeline stages.
//!
//! # Invariants
//! - `stage` is a closed enumeration; unknown stage text never reaches the
//!   record store through [`DealStage::from_str`].
//! - Closing a deal pins `probability`: 100 for won, 0 for lost.
//! - Any stage may transition to any other stage.

use crate::model::record::{
    opt_text_value, read_id, read_integer, read_number, read_opt_text, read_ref, read_text,
    ref_value, MappingError, RecordId, StorageMapping, StorageRecord,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

pub(crate) const TITLE: &str = "title_c";
pub(crate) const VALUE: &str = "value_c";
pub(crate) const STAGE: &str = "stage_c";
pub(crate) const PROBABILITY: &str = "probability_c";
pub(crate) const CLOSE_DATE: &str = "closeDate_c";
pub(crate) const NOTES: &str = "notes_c";
pub(crate) const CONTACT_ID: &str = "contactId_c";
pub(crate) const COMPANY_ID: &str = "companyId_c";
pub(crate) const CREATED_AT: &str = "createdAt_c";

/// Sales pipeline stage, in pipeline order.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum DealStage {
    #[default]
    Lead,
    Qualified,
    Proposal,
    Negotiation,
    #[serde(rename = "Closed Won")]
    ClosedWon,
    #[serde(rename = "Closed Lost")]
    ClosedLost,
}

impl DealStage {
    /// All stages in canonical pipeline order.
    pub const ALL: [DealStage; 6] = [
        Self::Lead,
        Self::Qualified,
        Self::Proposal,
        Self::Negotiation,
        Self::ClosedWon,
        Self::ClosedLost,
    ];

    /// Storage/display label.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Lead => "Lead",
            Self::Qualified => "Qualified",
            Self::Proposal => "Proposal",
            Self::Negotiation => "Negotiation",
            Self::ClosedWon => "Closed Won",
            Self::ClosedLost => "Closed Lost",
        }
    }

    pub fn is_closed(self) -> bool {
        matches!(self, Self::ClosedWon | Self::ClosedLost)
    }

    /// Probability implied by reaching this stage, if any.
    pub fn forced_probability(self) -> Option<i64> {
        match self {
            Self::ClosedWon => Some(100),
            Self::ClosedLost => Some(0),
            _ => None,
        }
    }
}

impl Display for DealStage {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stage label outside the closed [`DealStage`] set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidDealStage(pub String);

impl Display for InvalidDealStage {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid deal stage `{}`", self.0)
    }
}

impl Error for InvalidDealStage {}

impl FromStr for DealStage {
    type Err = InvalidDealStage;

    /// Parses exact stage labels (`"Closed Won"`, not `"closed won"`).
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|stage| stage.as_str() == value)
            .ok_or_else(|| InvalidDealStage(value.to_string()))
    }
}

/// Sales opportunity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deal {
    pub id: RecordId,
    pub title: String,
    pub value: f64,
    pub stage: DealStage,
    /// Win probability in percent.
    pub probability: i64,
    pub close_date: Option<String>,
    pub notes: String,
    pub contact_id: Option<RecordId>,
    pub company_id: Option<RecordId>,
    pub created_at: Option<String>,
}

/// Caller-supplied deal fields for create and full update.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DealDraft {
    pub title: String,
    pub value: f64,
    pub stage: DealStage,
    pub probability: i64,
    pub close_date: Option<String>,
    pub notes: String,
    pub contact_id: Option<RecordId>,
    pub company_id: Option<RecordId>,
}

impl DealDraft {
    pub fn to_record(&self) -> StorageRecord {
        let mut record = StorageRecord::new();
        record.insert(TITLE.into(), Value::from(self.title.as_str()));
        record.insert(VALUE.into(), Value::from(self.value));
        record.insert(STAGE.into(), Value::from(self.stage.as_str()));
        record.insert(PROBABILITY.into(), Value::from(self.probability));
        record.insert(CLOSE_DATE.into(), opt_text_value(self.close_date.as_deref()));
        record.insert(NOTES.into(), Value::from(self.notes.as_str()));
        record.insert(CONTACT_ID.into(), ref_value(self.contact_id));
        record.insert(COMPANY_ID.into(), ref_value(self.company_id));
        record
    }
}

impl StorageMapping for Deal {
    const ENTITY: &'static str = "deal_c";
    const LABEL: &'static str = "deal";
    const FIELDS: &'static [&'static str] = &[
        TITLE,
        VALUE,
        STAGE,
        PROBABILITY,
        CLOSE_DATE,
        NOTES,
        CREATED_AT,
        CONTACT_ID,
        COMPANY_ID,
    ];
    const SEARCH_FIELDS: &'static [&'static str] = &[TITLE, NOTES];

    fn from_record(record: &StorageRecord) -> Result<Self, MappingError> {
        let stage_text = read_text(record, STAGE);
        let stage = if stage_text.is_empty() {
            DealStage::default()
        } else {
            stage_text
                .parse::<DealStage>()
                .map_err(|_| MappingError::InvalidField {
                    field: STAGE,
                    value: stage_text.clone(),
                })?
        };

        Ok(Self {
            id: read_id(record)?,
            title: read_text(record, TITLE),
            value: read_number(record, VALUE)?,
            stage,
            probability: read_integer(record, PROBABILITY)?,
            close_date: read_opt_text(record, CLOSE_DATE),
            notes: read_text(record, NOTES),
            contact_id: read_ref(record, CONTACT_ID)?,
            company_id: read_ref(record, COMPANY_ID)?,
            created_at: read_opt_text(record, CREATED_AT),
        })
    }
}
