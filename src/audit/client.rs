use async_trait::async_trait;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use moka::future::Cache;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use super::api::{AuditApi, AuditApiError};
use super::types::{ApiEnvelope, AuditRecord, KeyExists, RecordPage, StorageStats};
use crate::config::AuditConfig;
use crate::observability::{audit_api_metrics, AuditEndpoint, CallOutcome};

/// Rate-limited HTTP client for the audit record persistence API
#[derive(Debug, Clone)]
pub struct HttpAuditApi {
    client: Client,
    base_url: String,
    rate_limiter: Arc<DefaultDirectRateLimiter>,
    // Records are immutable once created, so successful lookups can be reused.
    record_cache: Cache<String, AuditRecord>,
}

impl HttpAuditApi {
    pub fn new(settings: &AuditConfig) -> Result<Self, AuditApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_seconds))
            .build()
            .map_err(|e| AuditApiError::Transport(e.to_string()))?;

        let per_second =
            NonZeroU32::new(settings.rate_limit.requests_per_second).unwrap_or(NonZeroU32::MIN);
        let burst = NonZeroU32::new(settings.rate_limit.burst_capacity).unwrap_or(per_second);
        let rate_limiter = Arc::new(RateLimiter::direct(
            Quota::per_second(per_second).allow_burst(burst),
        ));

        let record_cache = Cache::builder()
            .max_capacity(settings.lookup_cache.max_capacity)
            .time_to_live(Duration::from_secs(settings.lookup_cache.ttl_seconds))
            .build();

        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            rate_limiter,
            record_cache,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Send a request and return the body of a 2xx response
    async fn execute(
        &self,
        request: RequestBuilder,
        endpoint: AuditEndpoint,
    ) -> Result<String, AuditApiError> {
        self.rate_limiter.until_ready().await;

        let call = audit_api_metrics().start(endpoint);

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                call.finish(CallOutcome::Failed);
                warn!(%endpoint, error = %e, "Audit API transport failure");
                return Err(AuditApiError::Transport(e.to_string()));
            }
        };

        let status = response.status();
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                call.finish(CallOutcome::Failed);
                return Err(AuditApiError::Transport(e.to_string()));
            }
        };
        call.finish(CallOutcome::from_status(status.as_u16()));

        if !status.is_success() {
            let message = serde_json::from_str::<serde_json::Value>(&body)
                .ok()
                .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
                .unwrap_or_else(|| format!("HTTP {}", status.as_u16()));
            debug!(%endpoint, status = status.as_u16(), %message, "Audit API returned error status");
            return Err(AuditApiError::Http {
                status: status.as_u16(),
                message,
            });
        }

        Ok(body)
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        path: &str,
        endpoint: AuditEndpoint,
    ) -> Result<T, AuditApiError> {
        let body = self.execute(self.client.get(self.url(path)), endpoint).await?;
        decode::<T>(&body)
    }
}

fn decode<T: DeserializeOwned>(body: &str) -> Result<T, AuditApiError> {
    serde_json::from_str::<ApiEnvelope<T>>(body)
        .map(|envelope| envelope.data)
        .map_err(|e| AuditApiError::Decode(e.to_string()))
}

#[async_trait]
impl AuditApi for HttpAuditApi {
    async fn create_record(&self, record: &AuditRecord) -> Result<(), AuditApiError> {
        let request = self.client.post(self.url("/audit-records")).json(record);
        self.execute(request, AuditEndpoint::CreateRecord).await?;
        Ok(())
    }

    async fn get_record(&self, key: &str) -> Result<AuditRecord, AuditApiError> {
        let metrics = audit_api_metrics();
        if let Some(cached) = self.record_cache.get(key).await {
            metrics.record_cache_hit();
            debug!(audit_key = %key, "Audit record cache hit");
            return Ok(cached);
        }
        metrics.record_cache_miss();

        let record: AuditRecord = self
            .fetch(&format!("/audit-records/{key}"), AuditEndpoint::GetRecord)
            .await?;
        self.record_cache.insert(key.to_string(), record.clone()).await;
        Ok(record)
    }

    async fn key_exists(&self, key: &str) -> Result<bool, AuditApiError> {
        let exists: KeyExists = self
            .fetch(&format!("/audit-records/{key}/exists"), AuditEndpoint::KeyExists)
            .await?;
        Ok(exists.exists)
    }

    async fn list_records(&self, limit: u32, offset: u32) -> Result<RecordPage, AuditApiError> {
        let request = self
            .client
            .get(self.url("/audit-records"))
            .query(&[("limit", limit), ("offset", offset)]);
        let body = self.execute(request, AuditEndpoint::ListRecords).await?;
        decode(&body)
    }

    async fn storage_stats(&self) -> Result<StorageStats, AuditApiError> {
        self.fetch("/audit-records/stats", AuditEndpoint::StorageStats).await
    }

    async fn health_check(&self) -> Result<(), AuditApiError> {
        self.execute(self.client.get(self.url("/health")), AuditEndpoint::Health)
            .await
            .map(|_| ())
    }
}
