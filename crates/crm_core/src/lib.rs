//! CRM record access core.
//! Contacts, companies, deals and activities over a generic record store.

pub mod client;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod notify;
pub mod service;
pub mod store;

pub use client::CrmClient;
pub use config::{ConfigError, StoreConfig};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::activity::{Activity, ActivityDraft, ActivityType};
pub use model::company::{Company, CompanyDraft};
pub use model::contact::{Contact, ContactDraft, ContactPatch};
pub use model::deal::{Deal, DealDraft, DealStage, InvalidDealStage};
pub use model::record::{MappingError, RecordId, StorageMapping};
pub use notify::{LogNotifier, Notice, NoticeLevel, Notifier, RecordingNotifier};
pub use service::access::{BulkReport, RecordFailure};
pub use service::activity_service::ActivityService;
pub use service::company_service::CompanyService;
pub use service::contact_service::ContactService;
pub use service::deal_service::DealService;
pub use service::export::{render_contacts_csv, ExportSummary};
pub use service::{parse_record_id, ServiceError, ServiceResult};
pub use store::{
    Envelope, HttpRecordStore, Operation, RecordParams, RecordStore, SqliteRecordStore,
    StoreError, StoreResult,
};

/// Minimal health-check API.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
