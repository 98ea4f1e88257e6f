//! # API Endpoint Handlers
//!
//! This module implements the HTTP endpoint handlers.

use super::{
    AppState,
    types::{
        ErrorResponse, HashResponse, HealthResponse, KindsResponse, SaveResponse,
        ValidateResponse, WorkflowListResponse,
    },
};
use axum::{
    Json,
    extract::{Path, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use pathway_core::{
    ErrorCategory, PathwayError, PersistenceGateway, SaveOutcome, WorkflowId, blake3_hex,
    checksum, from_json_str, save_document, validate,
};

// =============================================================================
// ERROR MAPPING
// =============================================================================

/// A `PathwayError` rendered as an HTTP response.
#[derive(Debug)]
pub struct ApiError(pub PathwayError);

impl From<PathwayError> for ApiError {
    fn from(e: PathwayError) -> Self {
        Self(e)
    }
}

/// HTTP status for a model error.
pub fn status_for(error: &PathwayError) -> StatusCode {
    match error {
        PathwayError::WorkflowNotFound(_) => StatusCode::NOT_FOUND,
        PathwayError::InvalidWorkflowId(_) | PathwayError::DeserializationError(_) => {
            StatusCode::BAD_REQUEST
        }
        e if e.category() == ErrorCategory::Structural => StatusCode::UNPROCESSABLE_ENTITY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);
        if status.is_server_error() {
            tracing::error!(error = %self.0, "Request failed");
        } else {
            tracing::debug!(error = %self.0, "Request rejected");
        }
        (
            status,
            Json(ErrorResponse {
                error: self.0.to_string(),
            }),
        )
            .into_response()
    }
}

// =============================================================================
// HEALTH & REGISTRY
// =============================================================================

/// Health check endpoint.
pub async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse::default())
}

/// Node types, exercise kinds and condition kinds.
pub async fn kinds_handler() -> impl IntoResponse {
    Json(KindsResponse::from_registry())
}

// =============================================================================
// WORKFLOW HANDLERS
// =============================================================================

/// List stored workflow ids.
pub async fn list_handler(State(state): State<AppState>) -> Result<Response, ApiError> {
    let store = state.store.read().await;
    let workflows = store
        .list()?
        .into_iter()
        .map(|id| id.as_str().to_string())
        .collect();
    Ok(Json(WorkflowListResponse { workflows }).into_response())
}

/// Return a stored workflow exactly as persisted.
///
/// The document is not validated; `POST /validate` does that on request.
pub async fn get_workflow_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let id = WorkflowId::parse(&id)?;
    let text = state.store.read().await.load(&id)?;
    Ok(([(header::CONTENT_TYPE, "application/json")], text).into_response())
}

/// Replace a stored workflow.
///
/// - 400 if the body is not a loadable document
/// - 422 with the issue checklist if it fails validation (nothing stored)
/// - 200 once stored
pub async fn put_workflow_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: String,
) -> Result<Response, ApiError> {
    let id = WorkflowId::parse(&id)?;
    let document = from_json_str(&body)?;

    let mut store = state.store.write().await;
    let response = match save_document(&mut *store, &id, &document)? {
        SaveOutcome::Saved => {
            tracing::info!(workflow = %id, nodes = document.node_count(), "Workflow saved");
            (
                StatusCode::OK,
                Json(SaveResponse {
                    saved: true,
                    id: id.to_string(),
                    issues: Vec::new(),
                }),
            )
        }
        SaveOutcome::Blocked(issues) => {
            tracing::info!(workflow = %id, issues = issues.len(), "Save blocked by validation");
            (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(SaveResponse {
                    saved: false,
                    id: id.to_string(),
                    issues,
                }),
            )
        }
    };
    Ok(response.into_response())
}

/// Validate a posted document without storing it.
pub async fn validate_handler(body: String) -> Result<Response, ApiError> {
    let document = from_json_str(&body)?;
    let issues = validate(&document).into_issues();
    Ok(Json(ValidateResponse {
        valid: issues.is_empty(),
        issues,
    })
    .into_response())
}

/// Fingerprints of a stored workflow.
pub async fn hash_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let id = WorkflowId::parse(&id)?;
    let text = state.store.read().await.load(&id)?;
    let document = from_json_str(&text)?;

    Ok(Json(HashResponse {
        id: id.to_string(),
        checksum: format!("{:016x}", checksum(&document)?),
        blake3: blake3_hex(&document)?,
    })
    .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pathway_core::NodeId;

    #[test]
    fn errors_map_to_statuses() {
        assert_eq!(
            status_for(&PathwayError::WorkflowNotFound("x".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_for(&PathwayError::DeserializationError("bad".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_for(&PathwayError::NodeNotFound(NodeId::new("n"))),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            status_for(&PathwayError::IoError("disk".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
