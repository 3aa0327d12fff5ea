//! Remote record store adapter over HTTP.
//!
//! # Responsibility
//! - Translate `submit(entity, operation, params)` into one POST request.
//! - Authenticate every request with the configured project id and key.
//!
//! # Invariants
//! - Endpoint layout is `{base_url}/v1/records/{entity}/{segment}` where
//!   segment is `query`, the record id, `create`, `update` or `delete`.
//! - Non-2xx responses surface as `StoreError::Status`; a 2xx body that is
//!   not an envelope surfaces as `StoreError::Json`.

use crate::config::StoreConfig;
use crate::store::{Envelope, Operation, RecordParams, RecordStore, StoreError, StoreResult};
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use std::time::{Duration, Instant};

const PROJECT_HEADER: &str = "x-project-id";
const REQUEST_ID_HEADER: &str = "x-request-id";

/// Record store reached through the remote records API.
#[derive(Debug, Clone)]
pub struct HttpRecordStore {
    config: StoreConfig,
    client: Client,
}

impl HttpRecordStore {
    /// Builds an authenticated blocking client from `config`.
    pub fn try_new(config: StoreConfig) -> StoreResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(PROJECT_HEADER, header_value(&config.project_id)?);
        let mut bearer = header_value(&format!("Bearer {}", config.public_key))?;
        bearer.set_sensitive(true);
        headers.insert(AUTHORIZATION, bearer);

        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        log::info!(
            "event=store_client_init module=store status=ok base_url={} timeout_secs={}",
            config.base_url,
            config.timeout_secs
        );
        Ok(Self { config, client })
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Absolute URL for one entity operation.
    pub fn endpoint(&self, entity: &str, operation: Operation) -> String {
        let segment = match operation {
            Operation::Fetch => "query".to_string(),
            Operation::GetById(id) => id.to_string(),
            Operation::Create => "create".to_string(),
            Operation::Update => "update".to_string(),
            Operation::Delete => "delete".to_string(),
        };
        format!("{}/v1/records/{entity}/{segment}", self.config.base_url)
    }
}

fn header_value(raw: &str) -> StoreResult<HeaderValue> {
    HeaderValue::from_str(raw)
        .map_err(|err| StoreError::InvalidRequest(format!("invalid header value: {err}")))
}

impl RecordStore for HttpRecordStore {
    fn submit(
        &self,
        entity: &str,
        operation: Operation,
        params: &RecordParams,
    ) -> StoreResult<Envelope> {
        let started_at = Instant::now();
        let request_id = uuid::Uuid::new_v4().to_string();
        let url = self.endpoint(entity, operation);

        let outcome = self
            .client
            .post(&url)
            .header(REQUEST_ID_HEADER, request_id.as_str())
            .json(params)
            .send()
            .map_err(StoreError::from)
            .and_then(|response| {
                let status = response.status();
                let body = response.text()?;
                if !status.is_success() {
                    return Err(StoreError::Status {
                        status: status.as_u16(),
                        body,
                    });
                }
                Ok(serde_json::from_str::<Envelope>(&body)?)
            });

        match &outcome {
            Ok(envelope) => log::debug!(
                "event=store_request module=store status=ok entity={entity} op={} request_id={request_id} success={} duration_ms={}",
                operation.name(),
                envelope.success,
                started_at.elapsed().as_millis()
            ),
            Err(err) => log::warn!(
                "event=store_request module=store status=error entity={entity} op={} request_id={request_id} duration_ms={} error={err}",
                operation.name(),
                started_at.elapsed().as_millis()
            ),
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::HttpRecordStore;
    use crate::config::StoreConfig;
    use crate::store::{Operation, StoreError};

    fn config(project_id: &str) -> StoreConfig {
        StoreConfig {
            base_url: "https://records.example.com".to_string(),
            project_id: project_id.to_string(),
            public_key: "pk".to_string(),
            timeout_secs: 5,
        }
    }

    #[test]
    fn endpoint_addresses_entity_and_operation() {
        let store = HttpRecordStore::try_new(config("p1")).unwrap();
        assert_eq!(
            store.endpoint("contact_c", Operation::Fetch),
            "https://records.example.com/v1/records/contact_c/query"
        );
        assert_eq!(
            store.endpoint("deal_c", Operation::GetById(42)),
            "https://records.example.com/v1/records/deal_c/42"
        );
        assert_eq!(
            store.endpoint("activity_c", Operation::Delete),
            "https://records.example.com/v1/records/activity_c/delete"
        );
    }

    #[test]
    fn header_unsafe_credentials_are_rejected() {
        let err = HttpRecordStore::try_new(config("p1\nX-Injected: 1")).unwrap_err();
        assert!(matches!(err, StoreError::InvalidRequest(_)));
    }
}
