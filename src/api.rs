use std::sync::Arc;

use anyhow::anyhow;
use axum::{
    Json, Router,
    extract::{FromRequestParts, Path, State},
    http::{StatusCode, header, request::Parts},
    response::{IntoResponse, Response},
    routing::{get, post, put},
};

use crate::error::{ErrorKind, LibError};
use crate::models::{
    CleanupResponse, CloneRequest, CloneResponse, NewEdge, NewNode, TreeId, TreeListResponse,
    UpdateNodePayload,
};
use crate::operations::{LegacyTree, TreeOperations};
use crate::repository::TreeRepository;

#[derive(Debug)]
pub struct AppError(pub LibError);

impl From<LibError> for AppError {
    fn from(value: LibError) -> Self {
        Self(value)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self.0.kind {
            ErrorKind::DuplicateNode => StatusCode::CONFLICT,
            ErrorKind::NodeNotFound | ErrorKind::EdgeNotFound | ErrorKind::NotFound => {
                StatusCode::NOT_FOUND
            }
            ErrorKind::SelfLoop | ErrorKind::ImportValidation | ErrorKind::InvalidInput => {
                StatusCode::BAD_REQUEST
            }
            ErrorKind::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorKind::Unknown => StatusCode::INTERNAL_SERVER_ERROR,
        };

        tracing::error!(kind = ?self.0.kind, error = %self.0.source, "tree api request failed");
        (status, self.0.public).into_response()
    }
}

pub trait HasRepository {
    fn repository(&self) -> Arc<dyn TreeRepository>;
}

pub trait TreeApp: HasRepository {
    /// Bearer secret required on every route. `None` disables the check
    /// (local development).
    fn api_key(&self) -> Option<String> {
        None
    }
}

/// Extractor that enforces the app's bearer-token check before a handler
/// runs. Authentication policy stays out of the core; this only compares the
/// presented token against the app-configured secret.
pub struct RequireApiKey;

impl<S> FromRequestParts<S> for RequireApiKey
where
    S: TreeApp + Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Some(expected) = state.api_key() else {
            return Ok(Self);
        };

        let presented = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "));

        if presented == Some(expected.as_str()) {
            Ok(Self)
        } else {
            Err(AppError(LibError::unauthorized(
                "Missing or invalid API key",
                anyhow!("bearer token check failed"),
            )))
        }
    }
}

fn operations<S: TreeApp>(app: &S) -> TreeOperations {
    TreeOperations::new(app.repository())
}

async fn clone_tree_handler<S>(
    State(app): State<S>,
    _auth: RequireApiKey,
    Json(payload): Json<CloneRequest>,
) -> Result<impl IntoResponse, AppError>
where
    S: TreeApp + Clone + Send + Sync + 'static,
{
    let (tree_id, tree) = operations(&app).clone_tree(payload)?;
    Ok((StatusCode::CREATED, Json(CloneResponse { tree_id, tree })))
}

async fn import_tree_handler<S>(
    State(app): State<S>,
    _auth: RequireApiKey,
    Json(payload): Json<LegacyTree>,
) -> Result<impl IntoResponse, AppError>
where
    S: TreeApp + Clone + Send + Sync + 'static,
{
    let (tree_id, tree) = operations(&app).import_tree(payload)?;
    Ok((StatusCode::CREATED, Json(CloneResponse { tree_id, tree })))
}

async fn list_trees_handler<S>(
    State(app): State<S>,
    _auth: RequireApiKey,
) -> Result<impl IntoResponse, AppError>
where
    S: TreeApp + Clone + Send + Sync + 'static,
{
    let trees = operations(&app).list_trees()?;
    Ok(Json(TreeListResponse { trees }))
}

async fn get_tree_handler<S>(
    State(app): State<S>,
    _auth: RequireApiKey,
    Path(tree_id): Path<TreeId>,
) -> Result<impl IntoResponse, AppError>
where
    S: TreeApp + Clone + Send + Sync + 'static,
{
    let tree = operations(&app).get_tree(tree_id)?;
    Ok(Json(tree))
}

async fn delete_tree_handler<S>(
    State(app): State<S>,
    _auth: RequireApiKey,
    Path(tree_id): Path<TreeId>,
) -> Result<impl IntoResponse, AppError>
where
    S: TreeApp + Clone + Send + Sync + 'static,
{
    operations(&app).delete_tree(tree_id)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn cleanup_edges_handler<S>(
    State(app): State<S>,
    _auth: RequireApiKey,
    Path(tree_id): Path<TreeId>,
) -> Result<impl IntoResponse, AppError>
where
    S: TreeApp + Clone + Send + Sync + 'static,
{
    let removed = operations(&app).cleanup_edges(tree_id)?;
    Ok(Json(CleanupResponse { removed }))
}

async fn add_node_handler<S>(
    State(app): State<S>,
    _auth: RequireApiKey,
    Path(tree_id): Path<TreeId>,
    Json(payload): Json<NewNode>,
) -> Result<impl IntoResponse, AppError>
where
    S: TreeApp + Clone + Send + Sync + 'static,
{
    let tree = operations(&app).add_node(tree_id, payload)?;
    Ok((StatusCode::CREATED, Json(tree)))
}

async fn update_node_handler<S>(
    State(app): State<S>,
    _auth: RequireApiKey,
    Path((tree_id, node_id)): Path<(TreeId, String)>,
    Json(payload): Json<UpdateNodePayload>,
) -> Result<impl IntoResponse, AppError>
where
    S: TreeApp + Clone + Send + Sync + 'static,
{
    let tree = operations(&app).update_node(tree_id, &node_id, payload)?;
    Ok(Json(tree))
}

async fn remove_node_handler<S>(
    State(app): State<S>,
    _auth: RequireApiKey,
    Path((tree_id, node_id)): Path<(TreeId, String)>,
) -> Result<impl IntoResponse, AppError>
where
    S: TreeApp + Clone + Send + Sync + 'static,
{
    let tree = operations(&app).remove_node(tree_id, &node_id)?;
    Ok(Json(tree))
}

async fn add_edge_handler<S>(
    State(app): State<S>,
    _auth: RequireApiKey,
    Path(tree_id): Path<TreeId>,
    Json(payload): Json<NewEdge>,
) -> Result<impl IntoResponse, AppError>
where
    S: TreeApp + Clone + Send + Sync + 'static,
{
    let tree = operations(&app).add_edge(tree_id, payload)?;
    Ok((StatusCode::CREATED, Json(tree)))
}

async fn remove_edge_handler<S>(
    State(app): State<S>,
    _auth: RequireApiKey,
    Path((tree_id, source, target)): Path<(TreeId, String, String)>,
) -> Result<impl IntoResponse, AppError>
where
    S: TreeApp + Clone + Send + Sync + 'static,
{
    let tree = operations(&app).remove_edge(tree_id, &source, &target)?;
    Ok(Json(tree))
}

pub fn routes<S>() -> Router<S>
where
    S: TreeApp + Clone + Send + Sync + 'static,
{
    tracing::info!("Registering route /api/v1/trees [GET]");
    tracing::info!("Registering route /api/v1/trees/clone [POST]");
    tracing::info!("Registering route /api/v1/trees/import [POST]");
    tracing::info!("Registering route /api/v1/trees/{{tree_id}} [GET,DELETE]");
    tracing::info!("Registering route /api/v1/trees/{{tree_id}}/cleanup [POST]");
    tracing::info!("Registering route /api/v1/trees/{{tree_id}}/nodes [POST]");
    tracing::info!("Registering route /api/v1/trees/{{tree_id}}/nodes/{{node_id}} [PUT,DELETE]");
    tracing::info!("Registering route /api/v1/trees/{{tree_id}}/edges [POST]");
    tracing::info!(
        "Registering route /api/v1/trees/{{tree_id}}/edges/{{source}}/{{target}} [DELETE]"
    );

    Router::new()
        .route("/api/v1/trees", get(list_trees_handler::<S>))
        .route("/api/v1/trees/clone", post(clone_tree_handler::<S>))
        .route("/api/v1/trees/import", post(import_tree_handler::<S>))
        .route(
            "/api/v1/trees/{tree_id}",
            get(get_tree_handler::<S>).delete(delete_tree_handler::<S>),
        )
        .route(
            "/api/v1/trees/{tree_id}/cleanup",
            post(cleanup_edges_handler::<S>),
        )
        .route("/api/v1/trees/{tree_id}/nodes", post(add_node_handler::<S>))
        .route(
            "/api/v1/trees/{tree_id}/nodes/{node_id}",
            put(update_node_handler::<S>).delete(remove_node_handler::<S>),
        )
        .route("/api/v1/trees/{tree_id}/edges", post(add_edge_handler::<S>))
        .route(
            "/api/v1/trees/{tree_id}/edges/{source}/{target}",
            axum::routing::delete(remove_edge_handler::<S>),
        )
}
