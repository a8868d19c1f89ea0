use thiserror::Error;

use crate::workflow::{GraphIntegrityError, Provider};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Active,
    /// Current node is a result node
    Completed { recommendation: Provider },
}

impl SessionState {
    pub fn is_completed(&self) -> bool {
        matches!(self, SessionState::Completed { .. })
    }
}

/// What the session can show for the current terminal occurrence's audit key
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuditStatus {
    NotRequested,
    Pending,
    Ready(String),
    /// The audit task could not run or did not finish; show a notice instead of a key
    Unavailable,
}

impl AuditStatus {
    pub fn key(&self) -> Option<&str> {
        match self {
            AuditStatus::Ready(key) => Some(key),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum SessionError {
    #[error("No option selected; choose an option before advancing")]
    NoSelection,
    #[error("Option {index} is not available at node '{node_id}' ({count} options)")]
    InvalidOption {
        node_id: String,
        index: usize,
        count: usize,
    },
    #[error("Node '{node_id}' is not a symptom assessment")]
    NotAtSymptomAssessment { node_id: String },
    #[error("Audit record creation is still in flight")]
    AuditInFlight,
    #[error(transparent)]
    GraphIntegrity(#[from] GraphIntegrityError),
}
