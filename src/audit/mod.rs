// Audit trail subsystem
// Mints short human-transcribable keys and persists each completed
// decision path to the remote record store.

pub mod key;
pub mod types;
pub mod api;
pub mod client;
pub mod diagnostics;
pub mod service;

pub use key::{
    is_well_formed_key, normalize_key, AuditKeyGenerator, AUDIT_KEY_ALPHABET, AUDIT_KEY_LENGTH,
    DEFAULT_MAX_ATTEMPTS,
};
pub use types::{AuditRecord, PathStep, RecordPage, StorageStats};
pub use api::{AuditApi, AuditApiError};
pub use client::HttpAuditApi;
pub use diagnostics::{AuditDiagnostics, DiagnosticEvent, DiagnosticEventType};
pub use service::{AuditService, AuditServiceError};
