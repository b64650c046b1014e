#[cfg(feature = "api")]
pub mod api;
pub mod error;
pub mod invariants;
pub mod models;
pub mod operations;
pub mod repository;

pub mod prelude {
    #[cfg(feature = "api")]
    pub use crate::api::{HasRepository, TreeApp};
    pub use crate::error::{ErrorKind, LibError, Result};
    pub use crate::invariants::{
        TreeInvariantViolation, ensure_tree_invariants, tree_invariant_violations,
    };
    pub use crate::models::{
        CloneRequest, CloneResponse, DataMap, Edge, NewEdge, NewNode, Node, Tree, TreeId,
        UpdateNodePayload,
    };
    pub use crate::operations::{
        LegacyEdge, LegacyTree, TreeOperation, TreeOperationResult, TreeOperations,
    };
    pub use crate::repository::{InMemoryRepository, TreeRepository};
}
