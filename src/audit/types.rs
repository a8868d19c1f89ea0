use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::quid6::SymptomResult;
use crate::workflow::{Provider, WorkflowNode, WorkflowOption};

/// One visited node plus the option chosen when leaving it forward
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathStep {
    pub node: WorkflowNode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_option_index: Option<usize>,
}

impl PathStep {
    pub fn new(node: WorkflowNode) -> Self {
        Self {
            node,
            selected_option_index: None,
        }
    }

    pub fn selected_option(&self) -> Option<&WorkflowOption> {
        self.selected_option_index
            .and_then(|index| self.node.options().get(index))
    }
}

/// Persisted decision trail of one completed traversal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditRecord {
    pub key: String,
    pub created_at: DateTime<Utc>,
    pub path: Vec<PathStep>,
    pub final_recommendation: Provider,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symptom_result: Option<SymptomResult>,
}

impl AuditRecord {
    /// Human-readable trail, one line per step
    pub fn decision_trail(&self) -> Vec<String> {
        self.path
            .iter()
            .map(|step| match step.selected_option() {
                Some(option) => format!("{} → {}", step.node.prompt, option.text),
                None => step.node.prompt.clone(),
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordPage {
    pub records: Vec<AuditRecord>,
    pub total: u64,
    pub limit: u32,
    pub offset: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageStats {
    #[serde(rename = "recordCount")]
    pub record_count: u64,
    #[serde(rename = "estimatedSizeKB")]
    pub estimated_size_kb: u64,
}

/// `{message, data}` wrapper every persistence API response uses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiEnvelope<T> {
    #[serde(default)]
    pub message: Option<String>,
    pub data: T,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct KeyExists {
    pub exists: bool,
}
