use std::collections::HashMap;

use anyhow::anyhow;
use parking_lot::RwLock;
use uuid::Uuid;

use crate::error::{LibError, Result};
use crate::models::{Tree, TreeId};

/// Storage contract for trees. The in-memory implementation below is the
/// only one shipped; a durable backend must offer the same operations with
/// the same error semantics (`NotFound` on `get`/`delete`/`upsert` of a
/// missing id) and preserve the structural invariants of stored trees.
pub trait TreeRepository: Send + Sync {
    fn create(&self, tree: Tree) -> Result<TreeId>;
    fn get(&self, tree_id: TreeId) -> Result<Tree>;
    fn upsert(&self, tree_id: TreeId, tree: Tree) -> Result<()>;
    fn delete(&self, tree_id: TreeId) -> Result<()>;
    fn list(&self) -> Result<Vec<TreeId>>;
}

/// Process-local tree store. The lock guards the id map against concurrent
/// create/delete; serializing mutations of any single tree is the caller's
/// responsibility.
#[derive(Default)]
pub struct InMemoryRepository {
    trees: RwLock<HashMap<TreeId, Tree>>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TreeRepository for InMemoryRepository {
    fn create(&self, tree: Tree) -> Result<TreeId> {
        let tree_id = TreeId(Uuid::new_v4());
        self.trees.write().insert(tree_id, tree);
        Ok(tree_id)
    }

    fn get(&self, tree_id: TreeId) -> Result<Tree> {
        self.trees.read().get(&tree_id).cloned().ok_or_else(|| {
            LibError::not_found("Tree not found", anyhow!("no tree with id {}", tree_id))
        })
    }

    fn upsert(&self, tree_id: TreeId, tree: Tree) -> Result<()> {
        let mut trees = self.trees.write();
        if !trees.contains_key(&tree_id) {
            return Err(LibError::not_found(
                "Tree not found",
                anyhow!("no tree with id {}", tree_id),
            ));
        }
        trees.insert(tree_id, tree);
        Ok(())
    }

    fn delete(&self, tree_id: TreeId) -> Result<()> {
        self.trees.write().remove(&tree_id).map(|_| ()).ok_or_else(|| {
            LibError::not_found("Tree not found", anyhow!("no tree with id {}", tree_id))
        })
    }

    fn list(&self) -> Result<Vec<TreeId>> {
        Ok(self.trees.read().keys().copied().collect())
    }
}
