//! Persistence API seam
//!
//! The audit service talks to the remote record store only through
//! [`AuditApi`], so tests can swap the HTTP client for an in-memory fake.

use async_trait::async_trait;
use thiserror::Error;

#[cfg(test)]
use mockall::automock;

use super::types::{AuditRecord, RecordPage, StorageStats};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuditApiError {
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },
    #[error("Network error occurred while contacting audit service: {0}")]
    Transport(String),
    #[error("Invalid response from audit service: {0}")]
    Decode(String),
}

impl AuditApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            AuditApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait AuditApi: Send + Sync {
    /// `POST /audit-records`
    async fn create_record(&self, record: &AuditRecord) -> Result<(), AuditApiError>;

    /// `GET /audit-records/{key}`; a missing record is `Http { status: 404 }`
    async fn get_record(&self, key: &str) -> Result<AuditRecord, AuditApiError>;

    /// `GET /audit-records/{key}/exists`
    async fn key_exists(&self, key: &str) -> Result<bool, AuditApiError>;

    /// `GET /audit-records?limit&offset`
    async fn list_records(&self, limit: u32, offset: u32) -> Result<RecordPage, AuditApiError>;

    /// `GET /audit-records/stats`
    async fn storage_stats(&self) -> Result<StorageStats, AuditApiError>;

    /// `GET /health`
    async fn health_check(&self) -> Result<(), AuditApiError>;
}
