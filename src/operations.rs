use std::collections::HashSet;
use std::sync::Arc;

use anyhow::anyhow;
use chrono::{NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::error::{LibError, Result};
use crate::invariants;
use crate::models::{
    CloneRequest, DataMap, Edge, NewEdge, NewNode, Node, Tree, TreeId, UpdateNodePayload,
};
use crate::repository::TreeRepository;

fn now() -> NaiveDateTime {
    Utc::now().naive_utc()
}

fn refresh_meta(tree: &mut Tree) {
    tree.meta
        .insert("node_count".to_string(), json!(tree.nodes.len()));
    tree.meta
        .insert("edge_count".to_string(), json!(tree.edges.len()));
}

fn touch(tree: &mut Tree) {
    tree.updated_at = Some(now());
}

/// Append a node. Fails if the id is already taken; the tree is untouched on
/// failure. Missing timestamps are stamped with the current time.
pub fn add_node(tree: &mut Tree, mut node: Node) -> Result<()> {
    if tree.has_node(&node.id) {
        return Err(LibError::duplicate_node(
            "Node ID already exists in tree",
            anyhow!("duplicate node id {}", node.id),
        ));
    }

    let stamp = now();
    node.created_at.get_or_insert(stamp);
    node.updated_at.get_or_insert(stamp);
    tree.nodes.push(node);
    refresh_meta(tree);
    touch(tree);
    Ok(())
}

/// Replace a node's `label` and/or `data` in place. The id is immutable.
pub fn update_node(tree: &mut Tree, node_id: &str, payload: UpdateNodePayload) -> Result<()> {
    let stamp = now();
    let node = tree
        .nodes
        .iter_mut()
        .find(|node| node.id == node_id)
        .ok_or_else(|| {
            LibError::node_not_found("Node not found", anyhow!("no node with id {}", node_id))
        })?;

    if let Some(label) = payload.label {
        let label = label.trim().to_string();
        node.label = (!label.is_empty()).then_some(label);
    }
    if let Some(data) = payload.data {
        node.data = data;
    }
    node.updated_at = Some(stamp);
    tree.updated_at = Some(stamp);
    Ok(())
}

/// Remove a node and, unconditionally and silently, every edge touching it.
pub fn remove_node(tree: &mut Tree, node_id: &str) -> Result<()> {
    if !tree.has_node(node_id) {
        return Err(LibError::node_not_found(
            "Node not found",
            anyhow!("no node with id {}", node_id),
        ));
    }

    tree.nodes.retain(|node| node.id != node_id);
    tree.edges
        .retain(|edge| edge.source != node_id && edge.target != node_id);
    refresh_meta(tree);
    touch(tree);
    Ok(())
}

/// Append an edge after validating both endpoints exist and the edge is not
/// a self-loop. The tree is untouched on failure.
pub fn add_edge(tree: &mut Tree, edge: Edge) -> Result<()> {
    if edge.source == edge.target {
        return Err(LibError::self_loop(
            "Self-loop edges are not allowed",
            anyhow!("edge {} -> {} is a self-loop", edge.source, edge.target),
        ));
    }
    if !tree.has_node(&edge.source) {
        return Err(LibError::node_not_found(
            "Edge source node not found",
            anyhow!("missing source node {}", edge.source),
        ));
    }
    if !tree.has_node(&edge.target) {
        return Err(LibError::node_not_found(
            "Edge target node not found",
            anyhow!("missing target node {}", edge.target),
        ));
    }

    tree.edges.push(edge);
    refresh_meta(tree);
    touch(tree);
    Ok(())
}

/// Remove every edge matching the endpoint pair. Parallel edges between the
/// same pair are not independently addressable, so all of them go. Returns
/// the number removed; fails if none matched.
pub fn remove_edge(tree: &mut Tree, source: &str, target: &str) -> Result<usize> {
    let before = tree.edges.len();
    tree.edges
        .retain(|edge| !(edge.source == source && edge.target == target));
    let removed = before - tree.edges.len();
    if removed == 0 {
        return Err(LibError::edge_not_found(
            "Edge not found",
            anyhow!("no edge {} -> {}", source, target),
        ));
    }

    refresh_meta(tree);
    touch(tree);
    Ok(removed)
}

/// Idempotent sweep removing every edge that references a missing node.
/// Returns the number removed; a consistent tree is left entirely untouched,
/// `updated_at` included.
pub fn cleanup_orphaned_edges(tree: &mut Tree) -> usize {
    let node_ids: HashSet<&str> = tree.nodes.iter().map(|node| node.id.as_str()).collect();
    let before = tree.edges.len();
    tree.edges.retain(|edge| {
        node_ids.contains(edge.source.as_str()) && node_ids.contains(edge.target.as_str())
    });
    let removed = before - tree.edges.len();
    if removed > 0 {
        tracing::debug!(removed, "removed orphaned edges");
        refresh_meta(tree);
        touch(tree);
    }
    removed
}

/// Produce a baseline tree for a generation spec. The spec itself is opaque
/// to the core and is carried through as metadata.
pub fn clone_tree(payload: CloneRequest) -> Tree {
    let stamp = now();
    let mut tree = Tree {
        created_at: Some(stamp),
        updated_at: Some(stamp),
        ..Default::default()
    };
    tree.meta
        .insert("architecture".to_string(), Value::String(payload.architecture));
    tree.meta
        .insert("constraints".to_string(), Value::Object(payload.constraints));
    refresh_meta(&mut tree);
    tree
}

/// Legacy serialized tree: nodes keyed by id, edges addressed by
/// `parent`/`child` instead of `source`/`target`.
#[derive(Debug, Clone, Deserialize)]
pub struct LegacyTree {
    #[serde(default)]
    pub nodes: DataMap,
    #[serde(default)]
    pub edges: Vec<LegacyEdge>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LegacyEdge {
    pub parent: String,
    pub child: String,
    pub relation: Option<String>,
    pub data: Option<DataMap>,
}

/// Convert a legacy representation into a canonical tree, validating the
/// whole result before accepting it. Nothing partially imported is ever
/// returned: the first violated invariant rejects the entire payload.
pub fn import_tree(legacy: LegacyTree) -> Result<Tree> {
    let stamp = now();
    let mut nodes = Vec::with_capacity(legacy.nodes.len());
    for (node_id, attributes) in legacy.nodes {
        let data = match attributes {
            Value::Object(map) => map,
            Value::Null => DataMap::new(),
            other => {
                return Err(LibError::import_validation(
                    "Legacy node attributes must be an object",
                    anyhow!("node {} carried non-object attributes: {}", node_id, other),
                ));
            }
        };
        nodes.push(Node {
            id: node_id,
            label: None,
            data,
            created_at: Some(stamp),
            updated_at: Some(stamp),
        });
    }

    let edges: Vec<Edge> = legacy
        .edges
        .into_iter()
        .map(|edge| Edge {
            source: edge.parent,
            target: edge.child,
            relation: edge.relation,
            data: edge.data.unwrap_or_default(),
        })
        .collect();

    let violations = invariants::tree_invariant_violations(&nodes, &edges);
    if let Some(first) = violations.first() {
        return Err(LibError::import_validation(
            first.public_message(),
            anyhow!("legacy import rejected: {:?}", violations),
        ));
    }

    let mut tree = Tree {
        nodes,
        edges,
        created_at: Some(stamp),
        updated_at: Some(stamp),
        ..Default::default()
    };
    refresh_meta(&mut tree);
    tracing::debug!(
        node_count = tree.nodes.len(),
        edge_count = tree.edges.len(),
        "imported legacy tree"
    );
    Ok(tree)
}

/// High-level tree actions over a repository, one method per operation the
/// transport layer exposes.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "operation", rename_all = "snake_case")]
pub enum TreeOperation {
    Clone {
        payload: CloneRequest,
    },
    Import {
        payload: LegacyTree,
    },
    Get {
        tree_id: TreeId,
    },
    List,
    Delete {
        tree_id: TreeId,
    },
    AddNode {
        tree_id: TreeId,
        payload: NewNode,
    },
    UpdateNode {
        tree_id: TreeId,
        node_id: String,
        payload: UpdateNodePayload,
    },
    RemoveNode {
        tree_id: TreeId,
        node_id: String,
    },
    AddEdge {
        tree_id: TreeId,
        payload: NewEdge,
    },
    RemoveEdge {
        tree_id: TreeId,
        source: String,
        target: String,
    },
    CleanupEdges {
        tree_id: TreeId,
    },
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum TreeOperationResult {
    Created { tree_id: TreeId, tree: Tree },
    Tree { tree: Tree },
    Trees { trees: Vec<TreeId> },
    Deleted,
    Cleanup { removed: usize },
}

#[derive(Clone)]
pub struct TreeOperations {
    repo: Arc<dyn TreeRepository>,
}

impl TreeOperations {
    pub fn new(repo: Arc<dyn TreeRepository>) -> Self {
        Self { repo }
    }

    pub fn repository(&self) -> Arc<dyn TreeRepository> {
        Arc::clone(&self.repo)
    }

    pub fn execute(&self, operation: TreeOperation) -> Result<TreeOperationResult> {
        match operation {
            TreeOperation::Clone { payload } => {
                let (tree_id, tree) = self.clone_tree(payload)?;
                Ok(TreeOperationResult::Created { tree_id, tree })
            }
            TreeOperation::Import { payload } => {
                let (tree_id, tree) = self.import_tree(payload)?;
                Ok(TreeOperationResult::Created { tree_id, tree })
            }
            TreeOperation::Get { tree_id } => {
                let tree = self.get_tree(tree_id)?;
                Ok(TreeOperationResult::Tree { tree })
            }
            TreeOperation::List => {
                let trees = self.list_trees()?;
                Ok(TreeOperationResult::Trees { trees })
            }
            TreeOperation::Delete { tree_id } => {
                self.delete_tree(tree_id)?;
                Ok(TreeOperationResult::Deleted)
            }
            TreeOperation::AddNode { tree_id, payload } => {
                let tree = self.add_node(tree_id, payload)?;
                Ok(TreeOperationResult::Tree { tree })
            }
            TreeOperation::UpdateNode {
                tree_id,
                node_id,
                payload,
            } => {
                let tree = self.update_node(tree_id, &node_id, payload)?;
                Ok(TreeOperationResult::Tree { tree })
            }
            TreeOperation::RemoveNode { tree_id, node_id } => {
                let tree = self.remove_node(tree_id, &node_id)?;
                Ok(TreeOperationResult::Tree { tree })
            }
            TreeOperation::AddEdge { tree_id, payload } => {
                let tree = self.add_edge(tree_id, payload)?;
                Ok(TreeOperationResult::Tree { tree })
            }
            TreeOperation::RemoveEdge {
                tree_id,
                source,
                target,
            } => {
                let tree = self.remove_edge(tree_id, &source, &target)?;
                Ok(TreeOperationResult::Tree { tree })
            }
            TreeOperation::CleanupEdges { tree_id } => {
                let removed = self.cleanup_edges(tree_id)?;
                Ok(TreeOperationResult::Cleanup { removed })
            }
        }
    }

    pub fn clone_tree(&self, payload: CloneRequest) -> Result<(TreeId, Tree)> {
        let tree = clone_tree(payload);
        let tree_id = self.repo.create(tree.clone())?;
        tracing::info!(%tree_id, "cloned baseline tree");
        Ok((tree_id, tree))
    }

    pub fn import_tree(&self, payload: LegacyTree) -> Result<(TreeId, Tree)> {
        let tree = import_tree(payload)?;
        let tree_id = self.repo.create(tree.clone())?;
        tracing::info!(%tree_id, "imported legacy tree");
        Ok((tree_id, tree))
    }

    pub fn get_tree(&self, tree_id: TreeId) -> Result<Tree> {
        self.repo.get(tree_id)
    }

    pub fn list_trees(&self) -> Result<Vec<TreeId>> {
        self.repo.list()
    }

    pub fn delete_tree(&self, tree_id: TreeId) -> Result<()> {
        self.repo.delete(tree_id)
    }

    pub fn add_node(&self, tree_id: TreeId, payload: NewNode) -> Result<Tree> {
        let node = payload.normalize()?;
        self.mutate(tree_id, |tree| add_node(tree, node))
    }

    pub fn update_node(
        &self,
        tree_id: TreeId,
        node_id: &str,
        payload: UpdateNodePayload,
    ) -> Result<Tree> {
        self.mutate(tree_id, |tree| update_node(tree, node_id, payload))
    }

    pub fn remove_node(&self, tree_id: TreeId, node_id: &str) -> Result<Tree> {
        self.mutate(tree_id, |tree| remove_node(tree, node_id))
    }

    pub fn add_edge(&self, tree_id: TreeId, payload: NewEdge) -> Result<Tree> {
        let edge = payload.normalize()?;
        self.mutate(tree_id, |tree| add_edge(tree, edge))
    }

    pub fn remove_edge(&self, tree_id: TreeId, source: &str, target: &str) -> Result<Tree> {
        self.mutate(tree_id, |tree| remove_edge(tree, source, target).map(|_| ()))
    }

    pub fn cleanup_edges(&self, tree_id: TreeId) -> Result<usize> {
        let mut tree = self.repo.get(tree_id)?;
        let removed = cleanup_orphaned_edges(&mut tree);
        if removed > 0 {
            self.repo.upsert(tree_id, tree)?;
        }
        Ok(removed)
    }

    fn mutate<F>(&self, tree_id: TreeId, op: F) -> Result<Tree>
    where
        F: FnOnce(&mut Tree) -> Result<()>,
    {
        let mut tree = self.repo.get(tree_id)?;
        op(&mut tree)?;
        self.repo.upsert(tree_id, tree.clone())?;
        Ok(tree)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::error::ErrorKind;
    use crate::repository::InMemoryRepository;

    fn node(id: &str) -> Node {
        Node {
            id: id.to_string(),
            label: None,
            data: Default::default(),
            created_at: None,
            updated_at: None,
        }
    }

    fn edge(source: &str, target: &str) -> Edge {
        Edge {
            source: source.to_string(),
            target: target.to_string(),
            relation: None,
            data: Default::default(),
        }
    }

    fn tree_with_edge() -> Tree {
        let mut tree = Tree::default();
        add_node(&mut tree, node("a")).expect("add a");
        add_node(&mut tree, node("b")).expect("add b");
        add_edge(&mut tree, edge("a", "b")).expect("add edge");
        tree
    }

    fn meta_count(tree: &Tree, key: &str) -> u64 {
        tree.meta
            .get(key)
            .and_then(Value::as_u64)
            .expect("count should be present")
    }

    #[test]
    fn add_node_stamps_timestamps_and_counts() {
        let mut tree = Tree::default();
        add_node(&mut tree, node("a")).expect("add should succeed");

        let stored = tree.get_node("a").expect("node should exist");
        assert!(stored.created_at.is_some());
        assert!(stored.updated_at.is_some());
        assert_eq!(meta_count(&tree, "node_count"), 1);
        assert_eq!(meta_count(&tree, "edge_count"), 0);
        assert!(tree.updated_at.is_some());
    }

    #[test]
    fn duplicate_add_node_fails_and_leaves_tree_unchanged() {
        let mut tree = tree_with_edge();
        let snapshot = tree.clone();

        let err = add_node(&mut tree, node("a")).expect_err("duplicate should fail");
        assert_eq!(err.kind, ErrorKind::DuplicateNode);
        assert_eq!(tree, snapshot);
    }

    #[test]
    fn remove_node_cascades_to_edges() {
        let mut tree = tree_with_edge();
        remove_node(&mut tree, "a").expect("remove should succeed");

        assert!(!tree.has_node("a"));
        assert!(tree.has_node("b"));
        assert!(tree.edges.is_empty());
        assert_eq!(meta_count(&tree, "node_count"), 1);
        assert_eq!(meta_count(&tree, "edge_count"), 0);
    }

    #[test]
    fn remove_missing_node_fails() {
        let mut tree = tree_with_edge();
        let err = remove_node(&mut tree, "ghost").expect_err("missing node should fail");
        assert_eq!(err.kind, ErrorKind::NodeNotFound);
    }

    #[test]
    fn self_loop_edge_is_rejected_without_mutation() {
        let mut tree = tree_with_edge();
        let snapshot = tree.clone();

        let err = add_edge(&mut tree, edge("a", "a")).expect_err("self-loop should fail");
        assert_eq!(err.kind, ErrorKind::SelfLoop);
        assert_eq!(tree, snapshot);
    }

    #[test]
    fn add_edge_requires_both_endpoints() {
        let mut tree = tree_with_edge();

        let err = add_edge(&mut tree, edge("ghost", "b")).expect_err("missing source");
        assert_eq!(err.kind, ErrorKind::NodeNotFound);
        assert_eq!(err.public, "Edge source node not found");

        let err = add_edge(&mut tree, edge("a", "ghost")).expect_err("missing target");
        assert_eq!(err.public, "Edge target node not found");
        assert_eq!(tree.edges.len(), 1);
    }

    #[test]
    fn remove_edge_removes_all_matching_pairs() {
        let mut tree = tree_with_edge();
        let mut parallel = edge("a", "b");
        parallel.relation = Some("refines".to_string());
        tree.edges.push(parallel);

        let removed = remove_edge(&mut tree, "a", "b").expect("remove should succeed");
        assert_eq!(removed, 2);
        assert!(tree.edges.is_empty());
        assert_eq!(meta_count(&tree, "edge_count"), 0);

        let err = remove_edge(&mut tree, "a", "b").expect_err("nothing left to remove");
        assert_eq!(err.kind, ErrorKind::EdgeNotFound);
    }

    #[test]
    fn update_node_replaces_label_and_data_only() {
        let mut tree = tree_with_edge();
        update_node(
            &mut tree,
            "a",
            UpdateNodePayload {
                label: Some("root".to_string()),
                data: json!({"depth": 0}).as_object().cloned(),
            },
        )
        .expect("update should succeed");

        let updated = tree.get_node("a").expect("node should exist");
        assert_eq!(updated.id, "a");
        assert_eq!(updated.label.as_deref(), Some("root"));
        assert_eq!(updated.data.get("depth"), Some(&json!(0)));

        let err = update_node(
            &mut tree,
            "ghost",
            UpdateNodePayload {
                label: None,
                data: None,
            },
        )
        .expect_err("unknown node should fail");
        assert_eq!(err.kind, ErrorKind::NodeNotFound);
    }

    #[test]
    fn cleanup_is_a_noop_on_consistent_trees() {
        let mut tree = tree_with_edge();
        let snapshot = tree.clone();

        assert_eq!(cleanup_orphaned_edges(&mut tree), 0);
        assert_eq!(tree, snapshot);
    }

    #[test]
    fn cleanup_sweeps_dangling_edges() {
        let mut tree = tree_with_edge();
        tree.edges.push(edge("b", "ghost"));
        tree.edges.push(edge("ghost", "a"));

        assert_eq!(cleanup_orphaned_edges(&mut tree), 2);
        assert_eq!(tree.edges.len(), 1);
        assert_eq!(meta_count(&tree, "edge_count"), 1);
        assert_eq!(cleanup_orphaned_edges(&mut tree), 0);
    }

    #[test]
    fn clone_tree_carries_spec_through_meta() {
        let tree = clone_tree(CloneRequest {
            architecture: "resnet50".to_string(),
            constraints: json!({"max_latency_ms": 20})
                .as_object()
                .cloned()
                .unwrap(),
        });

        assert_eq!(tree.meta.get("architecture"), Some(&json!("resnet50")));
        assert_eq!(
            tree.meta.get("constraints"),
            Some(&json!({"max_latency_ms": 20}))
        );
        assert_eq!(meta_count(&tree, "node_count"), 0);
        assert_eq!(meta_count(&tree, "edge_count"), 0);
        assert!(tree.created_at.is_some());
    }

    #[test]
    fn legacy_import_translates_parent_child_edges() {
        let legacy: LegacyTree = serde_json::from_value(json!({
            "nodes": {
                "node_1": {"kind": "conv"},
                "node_2": {"kind": "relu"}
            },
            "edges": [
                {"parent": "node_1", "child": "node_2"}
            ]
        }))
        .expect("legacy payload should deserialize");

        let tree = import_tree(legacy).expect("import should succeed");
        assert_eq!(meta_count(&tree, "node_count"), 2);
        assert_eq!(meta_count(&tree, "edge_count"), 1);
        assert_eq!(tree.nodes[0].id, "node_1");
        assert_eq!(tree.nodes[1].id, "node_2");
        assert_eq!(tree.edges[0].source, "node_1");
        assert_eq!(tree.edges[0].target, "node_2");
        assert_eq!(tree.nodes[0].data.get("kind"), Some(&json!("conv")));
    }

    #[test]
    fn legacy_import_rejects_dangling_edges_atomically() {
        let legacy: LegacyTree = serde_json::from_value(json!({
            "nodes": {"node_1": {}},
            "edges": [{"parent": "node_1", "child": "node_9"}]
        }))
        .expect("legacy payload should deserialize");

        let err = import_tree(legacy).expect_err("dangling edge should fail");
        assert_eq!(err.kind, ErrorKind::ImportValidation);
        assert_eq!(err.public, "Edge references a node that does not exist");
    }

    #[test]
    fn legacy_import_rejects_self_loops() {
        let legacy: LegacyTree = serde_json::from_value(json!({
            "nodes": {"node_1": {}},
            "edges": [{"parent": "node_1", "child": "node_1"}]
        }))
        .expect("legacy payload should deserialize");

        let err = import_tree(legacy).expect_err("self-loop should fail");
        assert_eq!(err.kind, ErrorKind::ImportValidation);
        assert_eq!(err.public, "Self-loop edges are not allowed");
    }

    #[test]
    fn legacy_import_rejects_non_object_attributes() {
        let legacy: LegacyTree = serde_json::from_value(json!({
            "nodes": {"node_1": 42},
            "edges": []
        }))
        .expect("legacy payload should deserialize");

        let err = import_tree(legacy).expect_err("scalar attributes should fail");
        assert_eq!(err.kind, ErrorKind::ImportValidation);
    }

    #[test]
    fn invariants_hold_across_an_operation_sequence() {
        let mut tree = Tree::default();
        for id in ["a", "b", "c", "d"] {
            add_node(&mut tree, node(id)).expect("add node");
        }
        add_edge(&mut tree, edge("a", "b")).expect("add edge");
        add_edge(&mut tree, edge("b", "c")).expect("add edge");
        add_edge(&mut tree, edge("c", "d")).expect("add edge");
        remove_node(&mut tree, "b").expect("remove node");
        remove_edge(&mut tree, "c", "d").expect("remove edge");

        assert!(invariants::tree_invariant_violations(&tree.nodes, &tree.edges).is_empty());
        assert_eq!(meta_count(&tree, "node_count"), tree.nodes.len() as u64);
        assert_eq!(meta_count(&tree, "edge_count"), tree.edges.len() as u64);
    }

    #[test]
    fn operations_round_trip_through_the_repository() {
        let ops = TreeOperations::new(Arc::new(InMemoryRepository::new()));
        let (tree_id, _) = ops
            .clone_tree(CloneRequest {
                architecture: "bert-base".to_string(),
                constraints: Default::default(),
            })
            .expect("clone should succeed");

        ops.add_node(
            tree_id,
            NewNode {
                id: "encoder".to_string(),
                label: None,
                data: None,
            },
        )
        .expect("add node should succeed");
        ops.add_node(
            tree_id,
            NewNode {
                id: "pooler".to_string(),
                label: None,
                data: None,
            },
        )
        .expect("add node should succeed");
        let tree = ops
            .add_edge(
                tree_id,
                NewEdge {
                    source: "encoder".to_string(),
                    target: "pooler".to_string(),
                    relation: Some("feeds".to_string()),
                    data: None,
                },
            )
            .expect("add edge should succeed");
        assert_eq!(tree.edges.len(), 1);

        // The stored copy reflects the mutation.
        let stored = ops.get_tree(tree_id).expect("tree should exist");
        assert_eq!(stored, tree);

        let removed = ops
            .remove_edge(tree_id, "encoder", "pooler")
            .expect("remove edge should succeed");
        assert!(removed.edges.is_empty());

        ops.delete_tree(tree_id).expect("delete should succeed");
        assert_eq!(
            ops.get_tree(tree_id).expect_err("tree is gone").kind,
            ErrorKind::NotFound
        );
    }

    #[test]
    fn failed_import_stores_nothing() {
        let ops = TreeOperations::new(Arc::new(InMemoryRepository::new()));
        let legacy: LegacyTree = serde_json::from_value(json!({
            "nodes": {"node_1": {}},
            "edges": [{"parent": "node_1", "child": "missing"}]
        }))
        .expect("legacy payload should deserialize");

        ops.import_tree(legacy).expect_err("import should fail");
        assert!(ops.list_trees().expect("list should succeed").is_empty());
    }

    #[test]
    fn execute_dispatches_tagged_operations() {
        let ops = TreeOperations::new(Arc::new(InMemoryRepository::new()));

        let operation: TreeOperation = serde_json::from_value(json!({
            "operation": "clone",
            "payload": {"architecture": "vit-b16"}
        }))
        .expect("operation should deserialize");
        let result = ops.execute(operation).expect("clone should succeed");
        let tree_id = match result {
            TreeOperationResult::Created { tree_id, .. } => tree_id,
            other => panic!("unexpected result: {other:?}"),
        };

        let operation: TreeOperation = serde_json::from_value(json!({
            "operation": "add_node",
            "tree_id": tree_id.to_string(),
            "payload": {"id": "stem"}
        }))
        .expect("operation should deserialize");
        let result = ops.execute(operation).expect("add node should succeed");
        match result {
            TreeOperationResult::Tree { tree } => assert!(tree.has_node("stem")),
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
