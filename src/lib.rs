// Clinic scheduling decision engine
// Workflow graph traversal, QUID-6 symptom scoring and an audit trail keyed
// by short human-readable codes.

pub mod audit;
pub mod cli;
pub mod config;
pub mod observability;
pub mod quid6;
pub mod session;
pub mod telemetry;
pub mod workflow;

pub use audit::{AuditRecord, AuditService, AuditServiceError, PathStep};
pub use config::{config, SchedulerConfig};
pub use quid6::{score, Diagnosis, SymptomAnswers, SymptomResult};
pub use session::{AuditStatus, SchedulingSession, SessionError, SessionState};
pub use workflow::{Provider, WorkflowEngine, WorkflowGraph, WorkflowNode};
