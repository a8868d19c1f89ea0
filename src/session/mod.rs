// Scheduling session - one user's traversal of the workflow
//
// Drives the engine forward and backward, folds QUID-6 results into the
// path and fires the audit record exactly once per terminal occurrence.

pub mod types;
pub mod state_machine;

pub use types::{AuditStatus, SessionError, SessionState};
pub use state_machine::{SchedulingSession, SessionEvent};
