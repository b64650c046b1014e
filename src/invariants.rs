use std::collections::HashSet;

use anyhow::anyhow;
use serde::Serialize;

use crate::error::{LibError, Result};
use crate::models::{Edge, Node};

/// A single violated structural invariant, with enough context to report
/// which entity broke it.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TreeInvariantViolation {
    DuplicateNodeId {
        node_id: String,
    },
    UnknownNodeReference {
        source: String,
        target: String,
        missing_node_id: String,
    },
    SelfLoop {
        node_id: String,
    },
}

impl TreeInvariantViolation {
    pub const fn error_code(&self) -> &'static str {
        match self {
            TreeInvariantViolation::DuplicateNodeId { .. } => "tree_duplicate_node_id",
            TreeInvariantViolation::UnknownNodeReference { .. } => "tree_unknown_node_reference",
            TreeInvariantViolation::SelfLoop { .. } => "tree_self_loop",
        }
    }

    pub const fn public_message(&self) -> &'static str {
        match self {
            TreeInvariantViolation::DuplicateNodeId { .. } => {
                "Node IDs must be unique within a tree"
            }
            TreeInvariantViolation::UnknownNodeReference { .. } => {
                "Edge references a node that does not exist"
            }
            TreeInvariantViolation::SelfLoop { .. } => "Self-loop edges are not allowed",
        }
    }
}

/// Collect every structural violation in the given node/edge sets. An empty
/// result means the sets satisfy all tree invariants.
pub fn tree_invariant_violations(nodes: &[Node], edges: &[Edge]) -> Vec<TreeInvariantViolation> {
    let mut node_ids: HashSet<&str> = HashSet::with_capacity(nodes.len());
    let mut violations = Vec::new();

    for node in nodes {
        if !node_ids.insert(node.id.as_str()) {
            violations.push(TreeInvariantViolation::DuplicateNodeId {
                node_id: node.id.clone(),
            });
        }
    }

    for edge in edges {
        if edge.source == edge.target {
            violations.push(TreeInvariantViolation::SelfLoop {
                node_id: edge.source.clone(),
            });
            continue;
        }
        if !node_ids.contains(edge.source.as_str()) {
            violations.push(TreeInvariantViolation::UnknownNodeReference {
                source: edge.source.clone(),
                target: edge.target.clone(),
                missing_node_id: edge.source.clone(),
            });
            continue;
        }
        if !node_ids.contains(edge.target.as_str()) {
            violations.push(TreeInvariantViolation::UnknownNodeReference {
                source: edge.source.clone(),
                target: edge.target.clone(),
                missing_node_id: edge.target.clone(),
            });
        }
    }

    violations
}

/// Fail with the first violation, classified under its specific error kind.
pub fn ensure_tree_invariants(nodes: &[Node], edges: &[Edge]) -> Result<()> {
    let violations = tree_invariant_violations(nodes, edges);
    if let Some(first) = violations.first() {
        let source = anyhow!("tree invariant validation failed: {:?}", violations);
        let public = first.public_message();
        return Err(match first {
            TreeInvariantViolation::DuplicateNodeId { .. } => {
                LibError::duplicate_node(public, source)
            }
            TreeInvariantViolation::UnknownNodeReference { .. } => {
                LibError::node_not_found(public, source)
            }
            TreeInvariantViolation::SelfLoop { .. } => LibError::self_loop(public, source),
        });
    }

    Ok(())
}
