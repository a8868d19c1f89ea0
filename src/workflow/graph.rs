use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;
use std::sync::{Arc, LazyLock};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::quid6::Diagnosis;

/// Result node reached by stress-dominant symptom assessments
pub const SURGEON_RESULT_NODE_ID: &str = "scheduleWithSurgeon";
/// Result node reached by everything else, including inconclusive assessments
pub const APP_RESULT_NODE_ID: &str = "scheduleWithAPP";

/// Provider a completed traversal recommends scheduling with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Provider {
    /// Advanced Practice Provider
    #[serde(rename = "APP")]
    App,
    Guanzon,
    Stewart,
}

impl Provider {
    pub fn display_name(self) -> &'static str {
        match self {
            Provider::App => "Advanced Practice Provider (APP)",
            Provider::Guanzon => "Dr. Guanzon",
            Provider::Stewart => "Dr. Stewart",
        }
    }

    /// Scheduling guidance shown alongside the recommendation
    pub fn guidance(self) -> &'static str {
        match self {
            Provider::App => {
                "Please schedule the patient with an Advanced Practice Provider. They are well-equipped to handle this type of case."
            }
            Provider::Guanzon => {
                "Please schedule the patient with Dr. Guanzon for surgical evaluation and treatment options."
            }
            Provider::Stewart => {
                "Please schedule the patient with Dr. Stewart for surgical evaluation and treatment options."
            }
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Provider::App => "APP",
            Provider::Guanzon => "Guanzon",
            Provider::Stewart => "Stewart",
        };
        write!(f, "{}", label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowOption {
    pub text: String,
    #[serde(rename = "nextNodeId")]
    pub next_node_id: String,
}

impl WorkflowOption {
    pub fn new(text: &str, next_node_id: &str) -> Self {
        Self {
            text: text.to_string(),
            next_node_id: next_node_id.to_string(),
        }
    }
}

/// Node kinds carry only the fields legal for that kind
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum NodeKind {
    Start { options: Vec<WorkflowOption> },
    Question { options: Vec<WorkflowOption> },
    Action { options: Vec<WorkflowOption> },
    Result {
        #[serde(rename = "result")]
        recommendation: Provider,
    },
    /// Resolved by the QUID-6 scorer instead of an option pick
    #[serde(rename = "quid6")]
    SymptomAssessment,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowNode {
    pub id: String,
    #[serde(rename = "text")]
    pub prompt: String,
    #[serde(flatten)]
    pub kind: NodeKind,
}

impl WorkflowNode {
    pub fn start(id: &str, prompt: &str, options: Vec<WorkflowOption>) -> Self {
        Self::with_kind(id, prompt, NodeKind::Start { options })
    }

    pub fn question(id: &str, prompt: &str, options: Vec<WorkflowOption>) -> Self {
        Self::with_kind(id, prompt, NodeKind::Question { options })
    }

    pub fn action(id: &str, prompt: &str, options: Vec<WorkflowOption>) -> Self {
        Self::with_kind(id, prompt, NodeKind::Action { options })
    }

    pub fn result(id: &str, prompt: &str, recommendation: Provider) -> Self {
        Self::with_kind(id, prompt, NodeKind::Result { recommendation })
    }

    pub fn symptom_assessment(id: &str, prompt: &str) -> Self {
        Self::with_kind(id, prompt, NodeKind::SymptomAssessment)
    }

    fn with_kind(id: &str, prompt: &str, kind: NodeKind) -> Self {
        Self {
            id: id.to_string(),
            prompt: prompt.to_string(),
            kind,
        }
    }

    /// Options in display order; empty for result and symptom-assessment nodes
    pub fn options(&self) -> &[WorkflowOption] {
        match &self.kind {
            NodeKind::Start { options }
            | NodeKind::Question { options }
            | NodeKind::Action { options } => options,
            NodeKind::Result { .. } | NodeKind::SymptomAssessment => &[],
        }
    }

    pub fn recommendation(&self) -> Option<Provider> {
        match self.kind {
            NodeKind::Result { recommendation } => Some(recommendation),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.kind, NodeKind::Result { .. })
    }

    pub fn is_symptom_assessment(&self) -> bool {
        matches!(self.kind, NodeKind::SymptomAssessment)
    }

    fn takes_options(&self) -> bool {
        matches!(
            self.kind,
            NodeKind::Start { .. } | NodeKind::Question { .. } | NodeKind::Action { .. }
        )
    }
}

/// Static-data defects in a workflow graph. These are programmer errors:
/// graph construction rejects them so traversal never has to handle them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphIntegrityError {
    #[error("Node id '{0}' is defined more than once")]
    DuplicateNode(String),
    #[error("Workflow has no start node")]
    MissingStart,
    #[error("Workflow has more than one start node: {0:?}")]
    MultipleStarts(Vec<String>),
    #[error("Node '{0}' requires at least one option")]
    NoOptions(String),
    #[error("Option {option_index} of node '{node_id}' points at missing node '{target}'")]
    MissingTarget {
        node_id: String,
        option_index: usize,
        target: String,
    },
    #[error("Symptom routing from '{node_id}' needs result node '{target}'")]
    MissingSymptomRoute { node_id: String, target: String },
    #[error("Node '{0}' is not reachable from the start node")]
    Unreachable(String),
    #[error("Unknown node '{0}'")]
    UnknownNode(String),
    #[error("Option index {index} is out of range for node '{node_id}' ({count} options)")]
    OptionOutOfRange {
        node_id: String,
        index: usize,
        count: usize,
    },
}

/// Maps a QUID-6 diagnosis to the result node the workflow continues at
pub fn symptom_route(diagnosis: Diagnosis) -> &'static str {
    match diagnosis {
        Diagnosis::StressIncontinence | Diagnosis::StressPredominantMixed => {
            SURGEON_RESULT_NODE_ID
        }
        Diagnosis::UrgeIncontinence
        | Diagnosis::UrgePredominantMixed
        | Diagnosis::Inconclusive => APP_RESULT_NODE_ID,
    }
}

/// Immutable, validated set of decision nodes keyed by id
#[derive(Debug, Clone)]
pub struct WorkflowGraph {
    nodes: Vec<WorkflowNode>,
    index: HashMap<String, usize>,
    start: usize,
}

static STANDARD_GRAPH: LazyLock<Arc<WorkflowGraph>> = LazyLock::new(|| {
    Arc::new(
        WorkflowGraph::new(standard_nodes())
            .expect("built-in scheduling workflow failed integrity validation"),
    )
});

impl WorkflowGraph {
    /// Build and validate a graph. Every check runs here, once.
    pub fn new(nodes: Vec<WorkflowNode>) -> Result<Self, GraphIntegrityError> {
        let mut index = HashMap::with_capacity(nodes.len());
        for (position, node) in nodes.iter().enumerate() {
            if index.insert(node.id.clone(), position).is_some() {
                return Err(GraphIntegrityError::DuplicateNode(node.id.clone()));
            }
        }

        let starts: Vec<usize> = nodes
            .iter()
            .enumerate()
            .filter(|(_, node)| matches!(node.kind, NodeKind::Start { .. }))
            .map(|(position, _)| position)
            .collect();
        let start = match starts.as_slice() {
            [] => return Err(GraphIntegrityError::MissingStart),
            [only] => *only,
            many => {
                return Err(GraphIntegrityError::MultipleStarts(
                    many.iter().map(|&i| nodes[i].id.clone()).collect(),
                ))
            }
        };

        let graph = Self {
            nodes,
            index,
            start,
        };
        graph.validate_edges()?;
        graph.validate_reachability()?;
        Ok(graph)
    }

    /// The process-wide scheduling workflow
    pub fn standard() -> Arc<WorkflowGraph> {
        Arc::clone(&STANDARD_GRAPH)
    }

    fn validate_edges(&self) -> Result<(), GraphIntegrityError> {
        for node in &self.nodes {
            if node.takes_options() && node.options().is_empty() {
                return Err(GraphIntegrityError::NoOptions(node.id.clone()));
            }

            for (option_index, option) in node.options().iter().enumerate() {
                if !self.index.contains_key(&option.next_node_id) {
                    return Err(GraphIntegrityError::MissingTarget {
                        node_id: node.id.clone(),
                        option_index,
                        target: option.next_node_id.clone(),
                    });
                }
            }

            if node.is_symptom_assessment() {
                for target in [SURGEON_RESULT_NODE_ID, APP_RESULT_NODE_ID] {
                    let resolves_to_result = self
                        .get(target)
                        .map(WorkflowNode::is_terminal)
                        .unwrap_or(false);
                    if !resolves_to_result {
                        return Err(GraphIntegrityError::MissingSymptomRoute {
                            node_id: node.id.clone(),
                            target: target.to_string(),
                        });
                    }
                }
            }
        }
        Ok(())
    }

    fn validate_reachability(&self) -> Result<(), GraphIntegrityError> {
        let mut seen = HashSet::new();
        let mut queue = VecDeque::from([self.start]);
        seen.insert(self.start);

        while let Some(position) = queue.pop_front() {
            for successor in self.successors(&self.nodes[position]) {
                if let Some(&next) = self.index.get(successor) {
                    if seen.insert(next) {
                        queue.push_back(next);
                    }
                }
            }
        }

        match self.nodes.iter().enumerate().find(|(i, _)| !seen.contains(i)) {
            Some((_, node)) => Err(GraphIntegrityError::Unreachable(node.id.clone())),
            None => Ok(()),
        }
    }

    fn successors<'a>(&self, node: &'a WorkflowNode) -> Vec<&'a str> {
        if node.is_symptom_assessment() {
            return vec![SURGEON_RESULT_NODE_ID, APP_RESULT_NODE_ID];
        }
        node.options()
            .iter()
            .map(|option| option.next_node_id.as_str())
            .collect()
    }

    pub fn start_node(&self) -> &WorkflowNode {
        &self.nodes[self.start]
    }

    pub fn get(&self, id: &str) -> Option<&WorkflowNode> {
        self.index.get(id).map(|&position| &self.nodes[position])
    }

    /// Nodes in definition order
    pub fn nodes(&self) -> impl Iterator<Item = &WorkflowNode> {
        self.nodes.iter()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

fn standard_nodes() -> Vec<WorkflowNode> {
    vec![
        WorkflowNode::start(
            "patientAge",
            "What is the patient's age?",
            vec![
                WorkflowOption::new("Under 30 or over 80", APP_RESULT_NODE_ID),
                WorkflowOption::new("30-80", "chiefComplaint"),
            ],
        ),
        WorkflowNode::question(
            "chiefComplaint",
            "What is the patient's chief complaint?",
            vec![
                WorkflowOption::new("Urinary Incontinence", "quid6Start"),
                WorkflowOption::new("Recurrent UTIs", APP_RESULT_NODE_ID),
                WorkflowOption::new("Pelvic Pain", "physicianReview"),
                WorkflowOption::new("Vaginal Dryness", APP_RESULT_NODE_ID),
                WorkflowOption::new("Fecal Incontinence", APP_RESULT_NODE_ID),
                WorkflowOption::new("Urinary Frequency", APP_RESULT_NODE_ID),
                WorkflowOption::new("Overactive Bladder", APP_RESULT_NODE_ID),
                WorkflowOption::new("Urinary Retention", "physicianReview"),
                WorkflowOption::new("Pelvic Organ Prolapse", SURGEON_RESULT_NODE_ID),
            ],
        ),
        WorkflowNode::action(
            "physicianReview",
            "This case requires physician review",
            vec![WorkflowOption::new("Continue", APP_RESULT_NODE_ID)],
        ),
        WorkflowNode::symptom_assessment("quid6Start", "QUID-6 Questionnaire"),
        WorkflowNode::result(
            SURGEON_RESULT_NODE_ID,
            "Schedule with a surgeon for evaluation.",
            Provider::Guanzon,
        ),
        WorkflowNode::result(
            APP_RESULT_NODE_ID,
            "Based on the information provided, the patient should be scheduled with an Advanced Practice Provider (APP)",
            Provider::App,
        ),
    ]
}
