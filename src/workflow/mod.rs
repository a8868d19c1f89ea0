// Scheduling workflow - static decision graph and its transition function
// The graph is validated once at construction; the engine never mutates it.

pub mod graph;
pub mod engine;

pub use graph::{
    symptom_route, GraphIntegrityError, NodeKind, Provider, WorkflowGraph, WorkflowNode,
    WorkflowOption, APP_RESULT_NODE_ID, SURGEON_RESULT_NODE_ID,
};
pub use engine::WorkflowEngine;
