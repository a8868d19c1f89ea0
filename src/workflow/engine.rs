// Pure transition function over a validated WorkflowGraph.
// No I/O and no backward movement; backtracking belongs to the session.

use std::sync::Arc;

use tracing::debug;

use super::graph::{symptom_route, GraphIntegrityError, WorkflowGraph, WorkflowNode};
use crate::quid6::Diagnosis;

#[derive(Debug, Clone)]
pub struct WorkflowEngine {
    graph: Arc<WorkflowGraph>,
}

impl WorkflowEngine {
    pub fn new(graph: Arc<WorkflowGraph>) -> Self {
        Self { graph }
    }

    /// Engine over the built-in scheduling workflow
    pub fn standard() -> Self {
        Self::new(WorkflowGraph::standard())
    }

    pub fn graph(&self) -> &WorkflowGraph {
        &self.graph
    }

    pub fn initial_node(&self) -> &WorkflowNode {
        self.graph.start_node()
    }

    pub fn node(&self, id: &str) -> Option<&WorkflowNode> {
        self.graph.get(id)
    }

    /// Follow option `option_index` out of `node_id`.
    ///
    /// Errors only on static-data defects, which graph construction already
    /// rules out for any index within the node's option count.
    pub fn transition(
        &self,
        node_id: &str,
        option_index: usize,
    ) -> Result<&WorkflowNode, GraphIntegrityError> {
        let node = self
            .graph
            .get(node_id)
            .ok_or_else(|| GraphIntegrityError::UnknownNode(node_id.to_string()))?;

        let options = node.options();
        let option = options
            .get(option_index)
            .ok_or_else(|| GraphIntegrityError::OptionOutOfRange {
                node_id: node_id.to_string(),
                index: option_index,
                count: options.len(),
            })?;

        let next = self.graph.get(&option.next_node_id).ok_or_else(|| {
            GraphIntegrityError::MissingTarget {
                node_id: node_id.to_string(),
                option_index,
                target: option.next_node_id.clone(),
            }
        })?;

        debug!(from = %node_id, option = option_index, to = %next.id, "Workflow transition");
        Ok(next)
    }

    /// Continue out of a symptom-assessment node using the scored diagnosis
    pub fn resolve_symptom_assessment(
        &self,
        diagnosis: Diagnosis,
    ) -> Result<&WorkflowNode, GraphIntegrityError> {
        let target = symptom_route(diagnosis);
        self.graph
            .get(target)
            .ok_or_else(|| GraphIntegrityError::UnknownNode(target.to_string()))
    }
}

impl Default for WorkflowEngine {
    fn default() -> Self {
        Self::standard()
    }
}
