//! Route group handlers: list, create, detail, replace, update, delete over one collection.
//!
//! Each handler translates only the storage errors its operation expects. Anything else
//! converts through `AppError::Store` and surfaces as a 500.

use crate::config::CollectionKind;
use crate::document::{is_handle, validate_key, Document, DocumentBody, FROM, TO};
use crate::error::{AppError, StoreError};
use crate::extractors::{IfMatch, JsonBody};
use crate::response::{created, listed, ok};
use crate::state::CollectionState;
use axum::{
    extract::{OriginalUri, Path, State},
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
};

fn not_found(err: StoreError) -> AppError {
    match err {
        err @ StoreError::NotFound { .. } => AppError::NotFound(err.to_string()),
        other => other.into(),
    }
}

fn duplicate(err: StoreError) -> AppError {
    match err {
        err @ StoreError::DuplicateKey { .. } => AppError::Conflict(err.to_string()),
        other => other.into(),
    }
}

fn not_found_or_conflict(err: StoreError) -> AppError {
    match err {
        err @ StoreError::NotFound { .. } => AppError::NotFound(err.to_string()),
        err @ StoreError::Conflict { .. } => AppError::Conflict(err.to_string()),
        other => other.into(),
    }
}

fn require_key(key: &str) -> Result<(), AppError> {
    if key.is_empty() {
        return Err(AppError::BadRequest("key is required".into()));
    }
    Ok(())
}

/// Edge endpoints must be `collection/key` handles; `required` on create and replace.
fn check_endpoints(body: &DocumentBody, kind: CollectionKind, required: bool) -> Result<(), AppError> {
    if kind != CollectionKind::Edge {
        return Ok(());
    }
    for (name, value) in [(FROM, &body.from), (TO, &body.to)] {
        match value {
            None if required => return Err(AppError::Validation(format!("{} is required", name))),
            None => {}
            Some(handle) if !is_handle(handle) => {
                return Err(AppError::Validation(format!(
                    "{} must be a document handle of the form collection/key",
                    name
                )))
            }
            Some(_) => {}
        }
    }
    Ok(())
}

/// Absolute URL of the detail route for `key`, relative when the request carries no Host.
fn detail_location(headers: &HeaderMap, collection_path: &str, key: &str) -> String {
    let path = format!(
        "{}/{}",
        collection_path.trim_end_matches('/'),
        urlencoding::encode(key)
    );
    let host = headers.get(header::HOST).and_then(|v| v.to_str().ok());
    match host {
        Some(host) => {
            let scheme = headers
                .get("x-forwarded-proto")
                .and_then(|v| v.to_str().ok())
                .unwrap_or("http");
            format!("{}://{}{}", scheme, host, path)
        }
        None => path,
    }
}

pub async fn list(State(state): State<CollectionState>) -> Result<impl IntoResponse, AppError> {
    let docs: Vec<Document> = state.collection.list_all().await?;
    Ok(listed(docs))
}

pub async fn create(
    State(state): State<CollectionState>,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
    JsonBody(body): JsonBody,
) -> Result<impl IntoResponse, AppError> {
    let kind = state.collection.kind();
    let body = DocumentBody::from_value(body, kind)?;
    if let Some(key) = &body.key {
        validate_key(key)?;
    }
    check_endpoints(&body, kind, true)?;
    state.spec.rules.check(&body.attributes)?;
    let doc = state.collection.insert(body).await.map_err(duplicate)?;
    tracing::debug!(collection = %state.collection.name(), key = %doc.key, "created");
    let location = detail_location(&headers, uri.path(), &doc.key);
    Ok(([(header::LOCATION, location)], created(doc)))
}

pub async fn detail(
    State(state): State<CollectionState>,
    Path(key): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    require_key(&key)?;
    let doc = state.collection.get(&key).await.map_err(not_found)?;
    Ok(ok(doc))
}

pub async fn replace(
    State(state): State<CollectionState>,
    Path(key): Path<String>,
    IfMatch(expected_rev): IfMatch,
    JsonBody(body): JsonBody,
) -> Result<impl IntoResponse, AppError> {
    require_key(&key)?;
    let kind = state.collection.kind();
    let mut body = DocumentBody::from_value(body, kind)?;
    body.key = None;
    check_endpoints(&body, kind, true)?;
    state.spec.rules.check(&body.attributes)?;
    let doc = state
        .collection
        .replace(&key, body, expected_rev.as_deref())
        .await
        .map_err(not_found_or_conflict)?;
    Ok(ok(doc))
}

pub async fn update(
    State(state): State<CollectionState>,
    Path(key): Path<String>,
    IfMatch(expected_rev): IfMatch,
    JsonBody(body): JsonBody,
) -> Result<impl IntoResponse, AppError> {
    require_key(&key)?;
    let kind = state.collection.kind();
    let mut patch = DocumentBody::from_value(body, kind)?;
    patch.key = None;
    check_endpoints(&patch, kind, false)?;
    state.spec.rules.check_present(&patch.attributes)?;
    state
        .collection
        .merge(&key, patch, expected_rev.as_deref())
        .await
        .map_err(not_found_or_conflict)?;
    let doc = state.collection.get(&key).await.map_err(not_found_or_conflict)?;
    Ok(ok(doc))
}

pub async fn delete(
    State(state): State<CollectionState>,
    Path(key): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    require_key(&key)?;
    state.collection.remove(&key).await.map_err(not_found)?;
    Ok(StatusCode::NO_CONTENT)
}
