mod common;

use common::{scripted_client, sqlite_client, ScriptedStore};
use crm_core::service::deal_service::DealService;
use crm_core::store::Envelope;
use crm_core::{DealDraft, DealStage, ServiceError, SqliteRecordStore};
use std::sync::Arc;

fn open_deal(deals: &DealService<Arc<SqliteRecordStore>>, probability: i64) -> i64 {
    deals
        .create(&DealDraft {
            title: "Pilot rollout".to_string(),
            value: 12_500.0,
            stage: DealStage::Proposal,
            probability,
            ..DealDraft::default()
        })
        .unwrap()
        .unwrap()
        .id
}

#[test]
fn closing_stages_force_probability() {
    let (client, _) = sqlite_client();
    let deals = client.deals();
    let id = open_deal(&deals, 40);

    let won = deals.update_stage(id, "Closed Won").unwrap().unwrap();
    assert_eq!(won.stage, DealStage::ClosedWon);
    assert_eq!(won.probability, 100);

    let lost = deals.update_stage(id, "Closed Lost").unwrap().unwrap();
    assert_eq!(lost.stage, DealStage::ClosedLost);
    assert_eq!(lost.probability, 0);
}

#[test]
fn open_stage_leaves_probability_untouched() {
    let (client, _) = sqlite_client();
    let deals = client.deals();
    let id = open_deal(&deals, 40);

    let moved = deals.update_stage(id, "Negotiation").unwrap().unwrap();
    assert_eq!(moved.stage, DealStage::Negotiation);
    assert_eq!(moved.probability, 40);
    assert_eq!(moved.title, "Pilot rollout");
}

#[test]
fn unknown_stage_is_rejected_before_any_store_call() {
    let (client, notifier) = scripted_client(ScriptedStore::new());

    let err = client.deals().update_stage(3, "Bogus").unwrap_err();

    assert!(matches!(err, ServiceError::InvalidStage(ref stage) if stage.0 == "Bogus"));
    assert!(client.store().calls().is_empty());
    assert!(notifier.notices().is_empty());
}

#[test]
fn unknown_stage_leaves_record_unchanged() {
    let (client, _) = sqlite_client();
    let deals = client.deals();
    let id = open_deal(&deals, 40);
    let before = deals.get(id).unwrap();

    assert!(deals.update_stage(id, "closed won").is_err());
    assert_eq!(deals.get(id).unwrap(), before);
}

#[test]
fn by_stage_lists_every_stage() {
    let (client, _) = sqlite_client();
    let deals = client.deals();
    let id = open_deal(&deals, 10);
    open_deal(&deals, 20);
    deals.update_stage(id, "Closed Won").unwrap();

    let grouped = deals.by_stage();
    assert_eq!(grouped.len(), DealStage::ALL.len());
    assert_eq!(grouped[&DealStage::Proposal].len(), 1);
    assert_eq!(grouped[&DealStage::ClosedWon][0].id, id);
    assert!(grouped[&DealStage::Lead].is_empty());
    assert_eq!(
        DealService::<Arc<SqliteRecordStore>>::stages()
            .iter()
            .map(|stage| stage.as_str())
            .collect::<Vec<_>>(),
        vec!["Lead", "Qualified", "Proposal", "Negotiation", "Closed Won", "Closed Lost"]
    );
}

#[test]
fn by_stage_is_empty_when_the_store_fails() {
    let store = ScriptedStore::new().reply(Envelope::failure("offline"));
    let (client, notifier) = scripted_client(store);

    assert!(client.deals().by_stage().is_empty());
    assert_eq!(notifier.messages(), vec!["offline"]);
}

#[test]
fn relationship_reads_filter_by_reference() {
    let (client, _) = sqlite_client();
    let deals = client.deals();
    deals
        .create(&DealDraft {
            title: "Renewal".to_string(),
            contact_id: Some(5),
            company_id: Some(9),
            ..DealDraft::default()
        })
        .unwrap();
    open_deal(&deals, 0);

    assert_eq!(deals.by_contact(5).len(), 1);
    assert_eq!(deals.by_company(9)[0].title, "Renewal");
    assert!(deals.by_company(5).is_empty());
    assert_eq!(deals.search("renew").len(), 1);
}
