//! Record store request parameters.
//!
//! # Responsibility
//! - Model the wire shape of store requests: field selection, `where`
//!   predicates, OR/AND `whereGroups`, ordering, paging and write batches.
//! - Define predicate semantics shared by local adapters.
//!
//! # Invariants
//! - Serialized names match the remote protocol exactly (`FieldName`,
//!   `whereGroups`, `sorttype`, `RecordIds`, ...).
//! - Empty collections are omitted from the serialized request.

use crate::model::record::{RecordId, StorageRecord};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;

/// Comparison operator of one predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operator {
    EqualTo,
    NotEqualTo,
    Contains,
    GreaterThan,
    GreaterThanOrEqualTo,
    LessThan,
    LessThanOrEqualTo,
}

impl Operator {
    /// Returns whether `actual` satisfies this operator against any of
    /// `expected`.
    ///
    /// `Contains` is a case-insensitive substring match where `null` reads
    /// as empty text, so an empty needle matches every record.
    pub fn matches(self, actual: Option<&Value>, expected: &[Value]) -> bool {
        let actual = actual.unwrap_or(&Value::Null);
        match self {
            Self::EqualTo => expected.iter().any(|value| loose_eq(actual, value)),
            Self::NotEqualTo => !expected.iter().any(|value| loose_eq(actual, value)),
            Self::Contains => {
                let haystack = value_text(actual).to_lowercase();
                expected
                    .iter()
                    .any(|value| haystack.contains(&value_text(value).to_lowercase()))
            }
            Self::GreaterThan => any_ordering(actual, expected, |o| o == Ordering::Greater),
            Self::GreaterThanOrEqualTo => any_ordering(actual, expected, |o| o != Ordering::Less),
            Self::LessThan => any_ordering(actual, expected, |o| o == Ordering::Less),
            Self::LessThanOrEqualTo => any_ordering(actual, expected, |o| o != Ordering::Greater),
        }
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

fn loose_eq(left: &Value, right: &Value) -> bool {
    match (as_number(left), as_number(right)) {
        (Some(a), Some(b)) => a == b,
        _ => left == right,
    }
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

fn any_ordering(actual: &Value, expected: &[Value], accept: impl Fn(Ordering) -> bool) -> bool {
    expected
        .iter()
        .filter_map(|value| strict_cmp(actual, value))
        .any(accept)
}

/// Orders two values of the same kind; mixed kinds are incomparable.
fn strict_cmp(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

/// Total order used for `orderBy`: nulls first, then booleans, numbers, text.
pub fn sort_cmp(left: Option<&Value>, right: Option<&Value>) -> Ordering {
    fn rank(value: Option<&Value>) -> u8 {
        match value {
            None | Some(Value::Null) => 0,
            Some(Value::Bool(_)) => 1,
            Some(Value::Number(_)) => 2,
            Some(Value::String(_)) => 3,
            Some(_) => 4,
        }
    }
    match (left, right) {
        (Some(a), Some(b)) => strict_cmp(a, b).unwrap_or_else(|| rank(left).cmp(&rank(right))),
        _ => rank(left).cmp(&rank(right)),
    }
}

/// Top-level `where` predicate; all clauses are AND-combined.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct WhereClause {
    pub field_name: String,
    pub operator: Operator,
    pub values: Vec<Value>,
}

impl WhereClause {
    pub fn matches(&self, record: &StorageRecord) -> bool {
        self.operator
            .matches(record.get(&self.field_name), &self.values)
    }
}

/// Predicate inside a `whereGroups` sub-group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupCondition {
    pub field_name: String,
    pub operator: Operator,
    pub values: Vec<Value>,
}

/// AND-combined conditions of one sub-group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionSet {
    pub conditions: Vec<GroupCondition>,
}

impl ConditionSet {
    fn matches(&self, record: &StorageRecord) -> bool {
        self.conditions.iter().all(|condition| {
            condition
                .operator
                .matches(record.get(&condition.field_name), &condition.values)
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GroupOperator {
    #[serde(rename = "OR")]
    Or,
    #[serde(rename = "AND")]
    And,
}

/// Nested predicate group combining sub-groups with `operator`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WhereGroup {
    pub operator: GroupOperator,
    pub sub_groups: Vec<ConditionSet>,
}

impl WhereGroup {
    pub fn matches(&self, record: &StorageRecord) -> bool {
        match self.operator {
            GroupOperator::Or => self.sub_groups.iter().any(|group| group.matches(record)),
            GroupOperator::And => self.sub_groups.iter().all(|group| group.matches(record)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortType {
    #[serde(rename = "ASC")]
    Asc,
    #[serde(rename = "DESC")]
    Desc,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBy {
    #[serde(rename = "fieldName")]
    pub field_name: String,
    #[serde(rename = "sorttype")]
    pub sort_type: SortType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PagingInfo {
    pub limit: u32,
    pub offset: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldName {
    #[serde(rename = "Name")]
    pub name: String,
}

/// One selected column, serialized as `{"field": {"Name": "..."}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSelector {
    pub field: FieldName,
}

/// Parameters of one store request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordParams {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<FieldSelector>,
    #[serde(rename = "where", default, skip_serializing_if = "Vec::is_empty")]
    pub where_clauses: Vec<WhereClause>,
    #[serde(rename = "whereGroups", default, skip_serializing_if = "Vec::is_empty")]
    pub where_groups: Vec<WhereGroup>,
    #[serde(rename = "orderBy", default, skip_serializing_if = "Vec::is_empty")]
    pub order_by: Vec<OrderBy>,
    #[serde(rename = "pagingInfo", default, skip_serializing_if = "Option::is_none")]
    pub paging: Option<PagingInfo>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub records: Vec<StorageRecord>,
    #[serde(rename = "RecordIds", default, skip_serializing_if = "Vec::is_empty")]
    pub record_ids: Vec<RecordId>,
}

impl RecordParams {
    /// Read request selecting `fields`.
    pub fn select(fields: &[&str]) -> Self {
        Self {
            fields: fields
                .iter()
                .map(|name| FieldSelector {
                    field: FieldName {
                        name: (*name).to_string(),
                    },
                })
                .collect(),
            ..Self::default()
        }
    }

    /// Write batch carrying `records`.
    pub fn batch(records: Vec<StorageRecord>) -> Self {
        Self {
            records,
            ..Self::default()
        }
    }

    /// Delete batch addressing `ids`.
    pub fn delete(ids: Vec<RecordId>) -> Self {
        Self {
            record_ids: ids,
            ..Self::default()
        }
    }

    /// Adds an AND-combined `where` predicate.
    pub fn filter(mut self, field: &str, operator: Operator, value: impl Into<Value>) -> Self {
        self.where_clauses.push(WhereClause {
            field_name: field.to_string(),
            operator,
            values: vec![value.into()],
        });
        self
    }

    /// Adds an OR group of `Contains` predicates, one sub-group per field.
    pub fn any_contains(mut self, fields: &[&str], needle: &str) -> Self {
        self.where_groups.push(WhereGroup {
            operator: GroupOperator::Or,
            sub_groups: fields
                .iter()
                .map(|field| ConditionSet {
                    conditions: vec![GroupCondition {
                        field_name: (*field).to_string(),
                        operator: Operator::Contains,
                        values: vec![Value::from(needle)],
                    }],
                })
                .collect(),
        });
        self
    }

    pub fn order(mut self, field: &str, sort_type: SortType) -> Self {
        self.order_by.push(OrderBy {
            field_name: field.to_string(),
            sort_type,
        });
        self
    }

    pub fn page(mut self, limit: u32, offset: u32) -> Self {
        self.paging = Some(PagingInfo { limit, offset });
        self
    }

    /// Returns whether `record` satisfies every `where` clause and group.
    pub fn matches(&self, record: &StorageRecord) -> bool {
        self.where_clauses.iter().all(|clause| clause.matches(record))
            && self.where_groups.iter().all(|group| group.matches(record))
    }

    /// Selected field names, empty when every field is selected.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|selector| selector.field.name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::{Operator, RecordParams, SortType};
    use serde_json::{json, Value};

    #[test]
    fn params_serialize_with_protocol_names() {
        let params = RecordParams::select(&["name_c"])
            .filter("completed_c", Operator::EqualTo, false)
            .any_contains(&["name_c", "industry_c"], "ac")
            .order("dueDate_c", SortType::Asc)
            .page(10, 0);
        let json = serde_json::to_value(&params).unwrap();
        assert_eq!(
            json,
            json!({
                "fields": [{"field": {"Name": "name_c"}}],
                "where": [{"FieldName": "completed_c", "Operator": "EqualTo", "Values": [false]}],
                "whereGroups": [{
                    "operator": "OR",
                    "subGroups": [
                        {"conditions": [{"fieldName": "name_c", "operator": "Contains", "values": ["ac"]}]},
                        {"conditions": [{"fieldName": "industry_c", "operator": "Contains", "values": ["ac"]}]}
                    ]
                }],
                "orderBy": [{"fieldName": "dueDate_c", "sorttype": "ASC"}],
                "pagingInfo": {"limit": 10, "offset": 0}
            })
        );
    }

    #[test]
    fn delete_batch_uses_record_ids_key() {
        let json = serde_json::to_value(RecordParams::delete(vec![1, 2])).unwrap();
        assert_eq!(json, json!({"RecordIds": [1, 2]}));
    }

    #[test]
    fn contains_is_case_insensitive_and_empty_matches_null() {
        let needle = [Value::from("ACME")];
        assert!(Operator::Contains.matches(Some(&json!("acme corp")), &needle));
        assert!(Operator::Contains.matches(None, &[Value::from("")]));
        assert!(!Operator::Contains.matches(Some(&json!("globex")), &needle));
    }

    #[test]
    fn ordering_operators_compare_same_kinds_only() {
        let now = [Value::from("2026-01-01T00:00:00.000Z")];
        assert!(Operator::LessThan.matches(Some(&json!("2025-12-31T00:00:00.000Z")), &now));
        assert!(!Operator::LessThan.matches(Some(&json!(5)), &now));
        assert!(Operator::GreaterThanOrEqualTo.matches(Some(&json!(5)), &[json!(5)]));
    }

    #[test]
    fn equal_to_is_numeric_aware() {
        assert!(Operator::EqualTo.matches(Some(&json!(7)), &[json!("7")]));
        assert!(Operator::EqualTo.matches(Some(&json!(false)), &[json!(false)]));
        assert!(Operator::NotEqualTo.matches(Some(&json!(true)), &[json!(false)]));
    }
}
