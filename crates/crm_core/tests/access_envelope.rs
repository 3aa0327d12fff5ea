mod common;

use common::{scripted_client, ScriptedStore};
use crm_core::store::{Envelope, FieldError, Operation, RecordResult};
use crm_core::{NoticeLevel, ServiceError, StoreError};
use serde_json::json;

#[test]
fn failed_list_degrades_to_empty_with_warning() {
    let store = ScriptedStore::new().reply(Envelope::failure("Invalid project"));
    let (client, notifier) = scripted_client(store);

    assert!(client.contacts().list().is_empty());

    let notices = notifier.notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].level, NoticeLevel::Warning);
    assert_eq!(notices[0].message, "Invalid project");
}

#[test]
fn transport_failure_on_read_degrades_to_empty() {
    let store = ScriptedStore::new().fail_with_status(503);
    let (client, notifier) = scripted_client(store);

    assert!(client.companies().search("acme").is_empty());
    assert_eq!(notifier.notices().len(), 1);
}

#[test]
fn search_sends_or_contains_group_even_for_empty_query() {
    let store = ScriptedStore::new().reply(Envelope::with_data(json!([])));
    let (client, _) = scripted_client(store);

    client.contacts().search("");

    let calls = client.store().calls();
    let json = serde_json::to_value(&calls[0].params).unwrap();
    let groups = json["whereGroups"][0]["subGroups"].as_array().unwrap();
    let fields: Vec<&str> = groups
        .iter()
        .map(|group| group["conditions"][0]["fieldName"].as_str().unwrap())
        .collect();
    assert_eq!(fields, vec!["firstName_c", "lastName_c", "email_c", "title_c"]);
    assert_eq!(json["whereGroups"][0]["operator"], json!("OR"));
    assert_eq!(groups[0]["conditions"][0]["values"], json!([""]));
}

#[test]
fn unmappable_rows_are_skipped() {
    let store = ScriptedStore::new().reply(Envelope::with_data(json!([
        {"Id": 1, "name_c": "Acme"},
        {"name_c": "No id"},
        "not a record"
    ])));
    let (client, _) = scripted_client(store);

    let companies = client.companies().list();
    assert_eq!(companies.len(), 1);
    assert_eq!(companies[0].name, "Acme");
}

#[test]
fn get_failure_is_not_found_and_transport_failure_is_store_error() {
    let store = ScriptedStore::new()
        .reply(Envelope::failure("Record does not exist"))
        .fail_with_status(500);
    let (client, _) = scripted_client(store);

    assert!(matches!(
        client.deals().get(9),
        Err(ServiceError::NotFound { id: 9, .. })
    ));
    assert!(matches!(
        client.deals().get(9),
        Err(ServiceError::Store(StoreError::Status { status: 500, .. }))
    ));
    assert_eq!(client.store().calls()[0].operation, Operation::GetById(9));
}

#[test]
fn create_reports_per_record_failures_with_field_labels() {
    let store = ScriptedStore::new().reply(Envelope::with_results(vec![RecordResult {
        success: false,
        data: None,
        errors: vec![
            FieldError {
                field_label: "Email".to_string(),
                message: "must be unique".to_string(),
            },
            FieldError {
                field_label: "Phone".to_string(),
                message: "is too long".to_string(),
            },
        ],
        message: Some("Record rejected".to_string()),
    }]));
    let (client, notifier) = scripted_client(store);

    let created = client.contacts().create(&Default::default()).unwrap();

    assert!(created.is_none());
    assert_eq!(
        notifier.messages(),
        vec!["Email: must be unique", "Phone: is too long", "Record rejected"]
    );
    assert!(notifier
        .notices()
        .iter()
        .all(|notice| notice.level == NoticeLevel::Error));
}

#[test]
fn create_stamps_timestamps_and_never_sends_an_id() {
    let store = ScriptedStore::new().reply(Envelope::with_results(vec![
        RecordResult::succeeded(json!({"Id": 41, "subject_c": "Call back"})),
    ]));
    let (client, _) = scripted_client(store);

    let created = client
        .activities()
        .create(&Default::default())
        .unwrap()
        .unwrap();
    assert_eq!(created.id, 41);

    let calls = client.store().calls();
    assert_eq!(calls[0].operation, Operation::Create);
    let record = &calls[0].params.records[0];
    assert!(record.contains_key("createdAt_c"));
    assert!(!record.contains_key("updatedAt_c"));
    assert!(!record.contains_key("Id"));
}

#[test]
fn update_includes_id_and_omits_created_at() {
    let store = ScriptedStore::new().reply(Envelope::with_results(vec![
        RecordResult::succeeded(json!({"Id": 3, "name_c": "Initech"})),
    ]));
    let (client, _) = scripted_client(store);

    let updated = client
        .companies()
        .update(3, &Default::default())
        .unwrap()
        .unwrap();
    assert_eq!(updated.name, "Initech");

    let calls = client.store().calls();
    let record = &calls[0].params.records[0];
    assert_eq!(record["Id"], json!(3));
    assert!(!record.contains_key("createdAt_c"));
}

#[test]
fn write_success_without_results_is_an_explicit_none() {
    let store = ScriptedStore::new().reply(Envelope {
        success: true,
        ..Envelope::default()
    });
    let (client, notifier) = scripted_client(store);

    assert_eq!(client.deals().create(&Default::default()).unwrap(), None);
    assert!(notifier.notices().is_empty());
}

#[test]
fn refused_write_is_rejected_and_notified() {
    let store = ScriptedStore::new().reply(Envelope::failure("Insufficient permissions"));
    let (client, notifier) = scripted_client(store);

    let err = client.companies().create(&Default::default()).unwrap_err();

    assert!(matches!(err, ServiceError::Rejected { entity: "company", .. }));
    assert_eq!(notifier.messages(), vec!["Insufficient permissions"]);
}

#[test]
fn remove_is_true_only_for_exactly_one_success() {
    let store = ScriptedStore::new()
        .reply(Envelope::with_results(vec![RecordResult::succeeded(json!({"Id": 1}))]))
        .reply(Envelope::with_results(vec![RecordResult::failed("locked")]))
        .reply(Envelope::failure("offline"))
        .fail_with_status(502);
    let (client, notifier) = scripted_client(store);
    let contacts = client.contacts();

    assert!(contacts.remove(1));
    assert!(!contacts.remove(1));
    assert!(!contacts.remove(1));
    assert!(!contacts.remove(1));
    assert_eq!(
        notifier.messages(),
        vec!["locked", "offline", "store returned HTTP 502: scripted failure"]
    );
    assert_eq!(
        client.store().calls()[0].params.record_ids,
        vec![1],
        "delete sends a single-id batch"
    );
}

#[test]
fn transport_failures_are_notified_for_writes_and_reads() {
    let store = ScriptedStore::new()
        .fail_with_status(503)
        .fail_with_status(503)
        .fail_with_status(503)
        .fail_with_status(503)
        .fail_with_status(503);
    let (client, notifier) = scripted_client(store);
    let companies = client.companies();

    assert!(matches!(
        companies.create(&Default::default()),
        Err(ServiceError::Store(StoreError::Status { status: 503, .. }))
    ));
    assert!(!companies.remove(1));
    assert!(companies.list().is_empty());
    assert!(companies.get(1).is_err());
    assert!(client.contacts().bulk_delete(&[1, 2]).is_err());

    let notices = notifier.notices();
    assert_eq!(notices.len(), 5);
    assert!(notices
        .iter()
        .all(|notice| notice.message == "store returned HTTP 503: scripted failure"));
    assert_eq!(notices[0].level, NoticeLevel::Error);
    assert_eq!(notices[2].level, NoticeLevel::Warning);
    assert_eq!(notices[3].level, NoticeLevel::Error);
}
