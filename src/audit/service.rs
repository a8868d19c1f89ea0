//! Audit trail orchestration
//!
//! Creation is fail-soft: a key always comes back even when the record
//! could not be stored. Reads are fail-hard: anything except a clean
//! "not found" surfaces as [`AuditServiceError::Unavailable`].

use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use tracing::{error, info, warn};

use super::api::{AuditApi, AuditApiError};
use super::diagnostics::{AuditDiagnostics, DiagnosticEvent, DiagnosticEventType};
use super::key::{is_well_formed_key, normalize_key, AuditKeyGenerator};
use super::types::{AuditRecord, PathStep, RecordPage, StorageStats};
use crate::config::SchedulerConfig;
use crate::quid6::SymptomResult;
use crate::workflow::Provider;

#[derive(Debug, Clone, Error)]
pub enum AuditServiceError {
    #[error("{message}")]
    Unavailable {
        message: &'static str,
        #[source]
        source: AuditApiError,
    },
}

impl AuditServiceError {
    fn lookup(source: AuditApiError) -> Self {
        AuditServiceError::Unavailable {
            message: "Unable to retrieve audit record. Please check your connection and try again.",
            source,
        }
    }

    fn listing(source: AuditApiError) -> Self {
        AuditServiceError::Unavailable {
            message: "Unable to retrieve audit records. Please check your connection and try again.",
            source,
        }
    }

    fn stats(source: AuditApiError) -> Self {
        AuditServiceError::Unavailable {
            message: "Unable to retrieve storage statistics. Please check your connection and try again.",
            source,
        }
    }

    /// HTTP status behind the failure, if the service answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            AuditServiceError::Unavailable { source, .. } => source.status(),
        }
    }
}

pub struct AuditService {
    api: Arc<dyn AuditApi>,
    keys: AuditKeyGenerator,
    diagnostics: AuditDiagnostics,
}

impl AuditService {
    pub fn new(api: Arc<dyn AuditApi>) -> Self {
        Self {
            api,
            keys: AuditKeyGenerator::new(),
            diagnostics: AuditDiagnostics::disabled(),
        }
    }

    /// Service over the HTTP persistence API described by `settings`
    pub fn from_config(settings: &SchedulerConfig) -> Result<Self, AuditApiError> {
        let api = super::client::HttpAuditApi::new(&settings.audit)?;
        Ok(Self::new(Arc::new(api))
            .with_key_generator(AuditKeyGenerator::with_max_attempts(settings.audit.key_attempts))
            .with_diagnostics(AuditDiagnostics::new(settings.diagnostics_endpoint())))
    }

    pub fn with_key_generator(mut self, keys: AuditKeyGenerator) -> Self {
        self.keys = keys;
        self
    }

    pub fn with_diagnostics(mut self, diagnostics: AuditDiagnostics) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    /// Mint a key and try to persist the record under it.
    ///
    /// The key is returned even if persistence failed; durability is not
    /// guaranteed but the recommendation flow never blocks on it.
    pub async fn create_record(
        &self,
        path: &[PathStep],
        final_recommendation: Provider,
        symptom_result: Option<SymptomResult>,
    ) -> String {
        let api = Arc::clone(&self.api);
        let key = self
            .keys
            .generate_unique_key(|candidate| {
                let api = Arc::clone(&api);
                async move { api.key_exists(&candidate).await }
            })
            .await;

        let record = AuditRecord {
            key: key.clone(),
            created_at: Utc::now(),
            path: path.to_vec(),
            final_recommendation,
            symptom_result,
        };

        self.diagnostics.log(
            DiagnosticEvent::new(DiagnosticEventType::CreateAttempt)
                .with_key(&key)
                .with_recommendation(final_recommendation.to_string())
                .with_path_steps(path.len()),
        );

        match self.api.create_record(&record).await {
            Ok(()) => {
                info!(audit_key = %key, recommendation = %final_recommendation, "Audit record created");
                self.diagnostics.log(
                    DiagnosticEvent::new(DiagnosticEventType::CreateSuccess)
                        .with_key(&key)
                        .with_recommendation(final_recommendation.to_string())
                        .with_path_steps(path.len()),
                );
            }
            Err(e) => {
                warn!(audit_key = %key, error = %e, "Failed to store audit record, key still issued");
                self.diagnostics.log(
                    DiagnosticEvent::new(DiagnosticEventType::CreateFailure)
                        .with_key(&key)
                        .with_recommendation(final_recommendation.to_string())
                        .with_path_steps(path.len())
                        .with_error(e.to_string())
                        .with_http_status(e.status()),
                );
            }
        }

        key
    }

    /// `Ok(None)` means the key does not exist; errors mean the store could not be asked
    pub async fn lookup_record(&self, key: &str) -> Result<Option<AuditRecord>, AuditServiceError> {
        let key = normalize_key(key);
        self.diagnostics
            .log(DiagnosticEvent::new(DiagnosticEventType::LookupAttempt).with_key(&key));

        if !is_well_formed_key(&key) {
            self.diagnostics.log(
                DiagnosticEvent::new(DiagnosticEventType::LookupFailure)
                    .with_key(&key)
                    .with_error("Malformed audit key"),
            );
            return Ok(None);
        }

        match self.api.get_record(&key).await {
            Ok(record) => {
                self.diagnostics
                    .log(DiagnosticEvent::new(DiagnosticEventType::LookupSuccess).with_key(&key));
                Ok(Some(record))
            }
            Err(e) if e.is_not_found() => {
                self.diagnostics.log(
                    DiagnosticEvent::new(DiagnosticEventType::LookupFailure)
                        .with_key(&key)
                        .with_error("Audit key not found in database"),
                );
                Ok(None)
            }
            Err(e) => {
                error!(audit_key = %key, error = %e, "Failed to lookup audit record");
                self.diagnostics.log(
                    DiagnosticEvent::new(DiagnosticEventType::LookupFailure)
                        .with_key(&key)
                        .with_error(e.to_string())
                        .with_http_status(e.status()),
                );
                Err(AuditServiceError::lookup(e))
            }
        }
    }

    pub async fn list_records(&self, limit: u32, offset: u32) -> Result<RecordPage, AuditServiceError> {
        self.api.list_records(limit, offset).await.map_err(|e| {
            error!(error = %e, limit, offset, "Failed to list audit records");
            AuditServiceError::listing(e)
        })
    }

    pub async fn get_stats(&self) -> Result<StorageStats, AuditServiceError> {
        self.api.storage_stats().await.map_err(|e| {
            error!(error = %e, "Failed to get audit storage stats");
            AuditServiceError::stats(e)
        })
    }

    /// Liveness probe; never on the critical path
    pub async fn health_check(&self) -> bool {
        self.api.health_check().await.is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::api::MockAuditApi;
    use crate::audit::key::DEFAULT_MAX_ATTEMPTS;
    use crate::workflow::WorkflowGraph;
    use mockall::predicate::eq;

    fn result_path() -> Vec<PathStep> {
        let graph = WorkflowGraph::standard();
        let mut start = PathStep::new(graph.start_node().clone());
        start.selected_option_index = Some(0);
        vec![start, PathStep::new(graph.get("scheduleWithAPP").unwrap().clone())]
    }

    fn stored_record(key: &str) -> AuditRecord {
        AuditRecord {
            key: key.to_string(),
            created_at: Utc::now(),
            path: result_path(),
            final_recommendation: Provider::App,
            symptom_result: None,
        }
    }

    #[tokio::test]
    async fn test_create_record_persists_under_returned_key() {
        let mut api = MockAuditApi::new();
        api.expect_key_exists().times(1).returning(|_| Ok(false));
        api.expect_create_record()
            .times(1)
            .withf(|record| {
                record.final_recommendation == Provider::App
                    && record.path.len() == 2
                    && is_well_formed_key(&record.key)
            })
            .returning(|_| Ok(()));

        let service = AuditService::new(Arc::new(api));
        let key = service.create_record(&result_path(), Provider::App, None).await;
        assert!(is_well_formed_key(&key));
    }

    #[tokio::test]
    async fn test_create_record_survives_persistence_failure() {
        let mut api = MockAuditApi::new();
        api.expect_key_exists().returning(|_| Ok(false));
        api.expect_create_record()
            .times(1)
            .returning(|_| Err(AuditApiError::Transport("connection reset".to_string())));

        let service = AuditService::new(Arc::new(api));
        let key = service.create_record(&result_path(), Provider::App, None).await;
        assert!(is_well_formed_key(&key));
    }

    #[tokio::test]
    async fn test_create_record_fails_open_when_exists_check_errors() {
        let mut api = MockAuditApi::new();
        api.expect_key_exists()
            .times(1)
            .returning(|_| Err(AuditApiError::Transport("unreachable".to_string())));
        api.expect_create_record()
            .times(1)
            .returning(|_| Err(AuditApiError::Transport("unreachable".to_string())));

        let service = AuditService::new(Arc::new(api));
        let key = service.create_record(&result_path(), Provider::Guanzon, None).await;
        assert!(is_well_formed_key(&key));
    }

    #[tokio::test]
    async fn test_create_record_accepts_key_after_persistent_collisions() {
        let mut api = MockAuditApi::new();
        api.expect_key_exists()
            .times(DEFAULT_MAX_ATTEMPTS as usize)
            .returning(|_| Ok(true));
        api.expect_create_record().times(1).returning(|_| Ok(()));

        let service = AuditService::new(Arc::new(api));
        let key = service.create_record(&result_path(), Provider::App, None).await;
        assert!(is_well_formed_key(&key));
    }

    #[tokio::test]
    async fn test_lookup_normalizes_key() {
        let mut api = MockAuditApi::new();
        api.expect_get_record()
            .with(eq("ABCD2345"))
            .times(1)
            .returning(|key| Ok(stored_record(key)));

        let service = AuditService::new(Arc::new(api));
        let record = service.lookup_record(" abcd2345 ").await.unwrap().unwrap();
        assert_eq!(record.key, "ABCD2345");
    }

    #[tokio::test]
    async fn test_lookup_not_found_is_none() {
        let mut api = MockAuditApi::new();
        api.expect_get_record().returning(|_| {
            Err(AuditApiError::Http {
                status: 404,
                message: "Audit record not found".to_string(),
            })
        });

        let service = AuditService::new(Arc::new(api));
        assert_eq!(service.lookup_record("ABCD2345").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_lookup_server_error_is_unavailable() {
        let mut api = MockAuditApi::new();
        api.expect_get_record().returning(|_| {
            Err(AuditApiError::Http {
                status: 500,
                message: "boom".to_string(),
            })
        });

        let service = AuditService::new(Arc::new(api));
        let err = service.lookup_record("ABCD2345").await.unwrap_err();
        assert_eq!(err.status(), Some(500));
        assert!(err.to_string().contains("try again"));
    }

    #[tokio::test]
    async fn test_lookup_transport_error_is_unavailable() {
        let mut api = MockAuditApi::new();
        api.expect_get_record()
            .returning(|_| Err(AuditApiError::Transport("dns failure".to_string())));

        let service = AuditService::new(Arc::new(api));
        let err = service.lookup_record("ABCD2345").await.unwrap_err();
        assert!(matches!(err, AuditServiceError::Unavailable { .. }));
        assert_eq!(err.status(), None);
    }

    #[tokio::test]
    async fn test_malformed_key_skips_network() {
        let mut api = MockAuditApi::new();
        api.expect_get_record().never();

        let service = AuditService::new(Arc::new(api));
        assert_eq!(service.lookup_record("stats").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_list_and_stats_propagate_failures() {
        let mut api = MockAuditApi::new();
        api.expect_list_records()
            .with(eq(25), eq(50))
            .returning(|_, _| Err(AuditApiError::Transport("down".to_string())));
        api.expect_storage_stats().returning(|| {
            Err(AuditApiError::Http {
                status: 503,
                message: "maintenance".to_string(),
            })
        });

        let service = AuditService::new(Arc::new(api));
        assert!(service.list_records(25, 50).await.is_err());
        assert_eq!(service.get_stats().await.unwrap_err().status(), Some(503));
    }

    #[tokio::test]
    async fn test_health_check_maps_to_bool() {
        let mut api = MockAuditApi::new();
        api.expect_health_check()
            .returning(|| Err(AuditApiError::Transport("down".to_string())));

        let service = AuditService::new(Arc::new(api));
        assert!(!service.health_check().await);
    }
}
