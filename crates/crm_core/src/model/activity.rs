//! Activity domain model.
//!
//! Activities are calls, emails, meetings, tasks and notes attached to a
//! contact and/or a deal. `due_date` is an ISO-8601 timestamp compared
//! lexicographically by the store for upcoming/overdue windows.

use crate::model::record::{
    opt_text_value, read_flag, read_id, read_opt_text, read_ref, read_text, ref_value,
    MappingError, RecordId, StorageMapping, StorageRecord,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt::{Display, Formatter};

pub(crate) const TYPE: &str = "type_c";
pub(crate) const SUBJECT: &str = "subject_c";
pub(crate) const DESCRIPTION: &str = "description_c";
pub(crate) const CONTACT_ID: &str = "contactId_c";
pub(crate) const DEAL_ID: &str = "dealId_c";
pub(crate) const DUE_DATE: &str = "dueDate_c";
pub(crate) const COMPLETED: &str = "completed_c";
pub(crate) const CREATED_AT: &str = "createdAt_c";

/// Kind of logged or planned interaction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActivityType {
    Call,
    Email,
    Meeting,
    #[default]
    Task,
    Note,
}

impl ActivityType {
    pub const ALL: [ActivityType; 5] = [
        Self::Call,
        Self::Email,
        Self::Meeting,
        Self::Task,
        Self::Note,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Call => "Call",
            Self::Email => "Email",
            Self::Meeting => "Meeting",
            Self::Task => "Task",
            Self::Note => "Note",
        }
    }

    fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == value)
    }
}

impl Display for ActivityType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub id: RecordId,
    #[serde(rename = "type")]
    pub kind: ActivityType,
    pub subject: String,
    pub description: String,
    pub contact_id: Option<RecordId>,
    pub deal_id: Option<RecordId>,
    pub due_date: Option<String>,
    pub completed: bool,
    pub created_at: Option<String>,
}

/// Caller-supplied activity fields for create and full update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityDraft {
    #[serde(rename = "type")]
    pub kind: ActivityType,
    pub subject: String,
    pub description: String,
    pub contact_id: Option<RecordId>,
    pub deal_id: Option<RecordId>,
    pub due_date: Option<String>,
    pub completed: bool,
}

impl ActivityDraft {
    pub fn to_record(&self) -> StorageRecord {
        let mut record = StorageRecord::new();
        record.insert(TYPE.into(), Value::from(self.kind.as_str()));
        record.insert(SUBJECT.into(), Value::from(self.subject.as_str()));
        record.insert(DESCRIPTION.into(), Value::from(self.description.as_str()));
        record.insert(CONTACT_ID.into(), ref_value(self.contact_id));
        record.insert(DEAL_ID.into(), ref_value(self.deal_id));
        record.insert(DUE_DATE.into(), opt_text_value(self.due_date.as_deref()));
        record.insert(COMPLETED.into(), Value::from(self.completed));
        record
    }
}

impl StorageMapping for Activity {
    const ENTITY: &'static str = "activity_c";
    const LABEL: &'static str = "activity";
    const FIELDS: &'static [&'static str] = &[
        TYPE,
        SUBJECT,
        DESCRIPTION,
        CONTACT_ID,
        DEAL_ID,
        DUE_DATE,
        COMPLETED,
        CREATED_AT,
    ];
    const SEARCH_FIELDS: &'static [&'static str] = &[SUBJECT, DESCRIPTION];

    fn from_record(record: &StorageRecord) -> Result<Self, MappingError> {
        let type_text = read_text(record, TYPE);
        let kind = if type_text.is_empty() {
            ActivityType::default()
        } else {
            ActivityType::parse(&type_text).ok_or(MappingError::InvalidField {
                field: TYPE,
                value: type_text.clone(),
            })?
        };

        Ok(Self {
            id: read_id(record)?,
            kind,
            subject: read_text(record, SUBJECT),
            description: read_text(record, DESCRIPTION),
            contact_id: read_ref(record, CONTACT_ID)?,
            deal_id: read_ref(record, DEAL_ID)?,
            due_date: read_opt_text(record, DUE_DATE),
            completed: read_flag(record, COMPLETED)?,
            created_at: read_opt_text(record, CREATED_AT),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{Activity, ActivityDraft, ActivityType};
    use crate::model::record::{MappingError, StorageMapping};
    use serde_json::json;

    #[test]
    fn draft_serializes_type_under_storage_name() {
        let draft = ActivityDraft {
            kind: ActivityType::Meeting,
            subject: "Kickoff".into(),
            ..ActivityDraft::default()
        };
        let record = draft.to_record();
        assert_eq!(record["type_c"], json!("Meeting"));
        assert_eq!(record["completed_c"], json!(false));
        assert!(record["dueDate_c"].is_null());
    }

    #[test]
    fn unknown_type_is_rejected_on_read() {
        let value = json!({"Id": 1, "type_c": "Fax"});
        let err = Activity::from_record(value.as_object().unwrap()).unwrap_err();
        assert!(matches!(err, MappingError::InvalidField { field: "type_c", .. }));
    }
}
