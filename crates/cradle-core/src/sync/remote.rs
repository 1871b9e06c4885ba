//! Remote datastore access.
//!
//! One logical record per household, addressed by a shared key. The backing
//! store must provide at-most-one-row-per-key upsert semantics; concurrent
//! writers rely on that upsert atomicity to avoid a torn document. The
//! application-level race between two devices deciding what to write is
//! unresolved by design (last writer wins).

use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use url::Url;

use crate::config::SyncConfig;
use crate::error::SyncError;
use crate::sync::types::RemoteRecord;

/// Seam to the remote datastore. Implemented over HTTP in production and by
/// an in-memory fake in tests.
pub trait RemoteStore {
    /// Fetch the shared record. `Ok(None)` is the expected first-run
    /// condition, not an error.
    fn fetch(&self, shared_key: &str) -> Result<Option<RemoteRecord>, SyncError>;

    /// Upsert the shared record, replacing any existing row for the key.
    fn upsert(
        &self,
        shared_key: &str,
        document: &Value,
        updated_at: DateTime<Utc>,
    ) -> Result<(), SyncError>;
}

/// REST client for a Supabase-style table endpoint
/// (`<base>/rest/v1/tracker_state`, PostgREST conventions).
#[derive(Debug)]
pub struct HttpRemoteStore {
    client: reqwest::Client,
    runtime: tokio::runtime::Runtime,
    endpoint: Url,
    api_key: String,
}

const TABLE: &str = "tracker_state";

impl HttpRemoteStore {
    /// Build from configuration. Errors when no endpoint is configured.
    pub fn from_config(config: &SyncConfig) -> Result<Self, SyncError> {
        let base = config
            .endpoint_url
            .as_deref()
            .ok_or(SyncError::NotConfigured)?;
        // Url::join drops the last path segment without a trailing slash.
        let base = if base.ends_with('/') {
            base.to_string()
        } else {
            format!("{}/", base)
        };
        let endpoint = Url::parse(&base)
            .and_then(|u| u.join(&format!("rest/v1/{}", TABLE)))
            .map_err(|e| SyncError::InvalidEndpoint(e.to_string()))?;
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        Ok(Self {
            client: reqwest::Client::new(),
            runtime,
            endpoint,
            api_key: config.api_key.clone().unwrap_or_default(),
        })
    }

    fn fetch_url(&self, shared_key: &str) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("select", "document,updated_at")
            .append_pair("key", &format!("eq.{}", shared_key));
        url
    }
}

impl RemoteStore for HttpRemoteStore {
    fn fetch(&self, shared_key: &str) -> Result<Option<RemoteRecord>, SyncError> {
        let url = self.fetch_url(shared_key);
        let rows: Vec<Value> = self.runtime.block_on(async {
            self.client
                .get(url)
                .header("apikey", &self.api_key)
                .bearer_auth(&self.api_key)
                .send()
                .await?
                .error_for_status()?
                .json()
                .await
        })?;

        let Some(row) = rows.into_iter().next() else {
            return Ok(None);
        };
        let updated_at = row
            .get("updated_at")
            .and_then(Value::as_str)
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|t| t.with_timezone(&Utc))
            .ok_or_else(|| SyncError::RemoteApi("missing updated_at on record".into()))?;
        let document = row.get("document").cloned().unwrap_or(Value::Null);
        Ok(Some(RemoteRecord {
            document,
            updated_at,
        }))
    }

    fn upsert(
        &self,
        shared_key: &str,
        document: &Value,
        updated_at: DateTime<Utc>,
    ) -> Result<(), SyncError> {
        let row = json!({
            "key": shared_key,
            "document": document,
            "updated_at": updated_at.to_rfc3339(),
        });
        self.runtime.block_on(async {
            self.client
                .post(self.endpoint.clone())
                .header("apikey", &self.api_key)
                .bearer_auth(&self.api_key)
                .header("Prefer", "resolution=merge-duplicates")
                .json(&row)
                .send()
                .await?
                .error_for_status()?;
            Ok::<_, reqwest::Error>(())
        })?;
        tracing::debug!(%shared_key, %updated_at, "pushed state document");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_config_requires_an_endpoint() {
        let err = HttpRemoteStore::from_config(&SyncConfig::default()).unwrap_err();
        assert!(matches!(err, SyncError::NotConfigured));
    }

    #[test]
    fn fetch_url_filters_by_key() {
        let config = SyncConfig {
            endpoint_url: Some("https://db.example/".into()),
            api_key: Some("k".into()),
            ..SyncConfig::default()
        };
        let store = HttpRemoteStore::from_config(&config).unwrap();
        let url = store.fetch_url("household");
        assert_eq!(url.path(), "/rest/v1/tracker_state");
        assert!(url.query().unwrap().contains("key=eq.household"));
    }
}
