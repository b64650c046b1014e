use std::fmt;
use std::str::FromStr;

use anyhow::anyhow;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::error::{LibError, Result};

/// Open key/value container used for node/edge payloads and tree metadata.
/// `serde_json`'s map preserves insertion order (`preserve_order`).
pub type DataMap = Map<String, Value>;

/// Repository-scoped identifier of a stored tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct TreeId(pub Uuid);

impl fmt::Display for TreeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TreeId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Uuid::from_str(s).map(Self)
    }
}

impl From<Uuid> for TreeId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

/// A node of a model-architecture tree. The `id` is caller-supplied and
/// immutable once the node has been added to a tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default)]
    pub data: DataMap,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<NaiveDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<NaiveDateTime>,
}

/// A directed edge between two nodes of the same tree, addressed by the
/// endpoint node ids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub source: String,
    pub target: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relation: Option<String>,
    #[serde(default)]
    pub data: DataMap,
}

/// A stored tree: ordered nodes, ordered edges and derived metadata.
///
/// "Tree" is the domain name for the structure; it is a general directed
/// graph and is not constrained to be acyclic. Insertion order of nodes and
/// edges is significant and survives removals. `meta` always carries
/// `node_count` and `edge_count`, recomputed by the mutation engine and never
/// settable by callers.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Tree {
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub edges: Vec<Edge>,
    #[serde(default)]
    pub meta: DataMap,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<NaiveDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<NaiveDateTime>,
}

impl Tree {
    /// Look up a node by id. Absence is not an error.
    pub fn get_node(&self, node_id: &str) -> Option<&Node> {
        self.nodes.iter().find(|node| node.id == node_id)
    }

    pub fn has_node(&self, node_id: &str) -> bool {
        self.nodes.iter().any(|node| node.id == node_id)
    }

    /// Every edge touching the node as source or target, in edge insertion
    /// order.
    pub fn get_edges_for_node(&self, node_id: &str) -> Vec<&Edge> {
        self.edges
            .iter()
            .filter(|edge| edge.source == node_id || edge.target == node_id)
            .collect()
    }

    /// Ids of nodes this node points to, in edge insertion order.
    pub fn get_children(&self, node_id: &str) -> Vec<&str> {
        self.edges
            .iter()
            .filter(|edge| edge.source == node_id)
            .map(|edge| edge.target.as_str())
            .collect()
    }

    /// Ids of nodes pointing to this node, in edge insertion order.
    pub fn get_parents(&self, node_id: &str) -> Vec<&str> {
        self.edges
            .iter()
            .filter(|edge| edge.target == node_id)
            .map(|edge| edge.source.as_str())
            .collect()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewNode {
    pub id: String,
    pub label: Option<String>,
    pub data: Option<DataMap>,
}

impl NewNode {
    /// Trim identifiers and labels; timestamps are left unset for the
    /// mutation engine to stamp.
    pub fn normalize(self) -> Result<Node> {
        let id = self.id.trim().to_string();
        if id.is_empty() {
            return Err(LibError::invalid(
                "Node ID is required",
                anyhow!("empty node id"),
            ));
        }

        Ok(Node {
            id,
            label: normalize_label(self.label),
            data: self.data.unwrap_or_default(),
            created_at: None,
            updated_at: None,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewEdge {
    pub source: String,
    pub target: String,
    pub relation: Option<String>,
    pub data: Option<DataMap>,
}

impl NewEdge {
    pub fn normalize(self) -> Result<Edge> {
        let source = self.source.trim().to_string();
        let target = self.target.trim().to_string();
        if source.is_empty() || target.is_empty() {
            return Err(LibError::invalid(
                "Edge source and target are required",
                anyhow!("empty edge endpoint"),
            ));
        }

        Ok(Edge {
            source,
            target,
            relation: normalize_label(self.relation),
            data: self.data.unwrap_or_default(),
        })
    }
}

/// Replacement payload for a node update. The node id is immutable; only
/// `label` and `data` can be replaced. A `None` field leaves the current
/// value in place.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateNodePayload {
    pub label: Option<String>,
    pub data: Option<DataMap>,
}

/// Generation spec for a baseline tree. `architecture` and `constraints` are
/// opaque to the core and carried through as tree metadata.
#[derive(Debug, Clone, Deserialize)]
pub struct CloneRequest {
    pub architecture: String,
    #[serde(default)]
    pub constraints: DataMap,
}

#[derive(Debug, Clone, Serialize)]
pub struct CloneResponse {
    pub tree_id: TreeId,
    pub tree: Tree,
}

#[derive(Debug, Clone, Serialize)]
pub struct CleanupResponse {
    pub removed: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct TreeListResponse {
    pub trees: Vec<TreeId>,
}

fn normalize_label(label: Option<String>) -> Option<String> {
    label
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
