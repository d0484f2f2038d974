use crate::config::Config;
use crate::db_storage::EntryStorage;
use crate::errors::AppError;
use crate::models::*;
use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    http::StatusCode,
    Json,
};
use std::sync::Arc;

/// Shared application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    /// Entry storage over the connection pool.
    pub storage: EntryStorage,
}

impl AppState {
    pub fn new(db: sqlx::PgPool, config: &Config) -> Self {
        Self {
            storage: EntryStorage::new(db, config.entries_table.clone()),
        }
    }
}

/// Query string as ordered key/value pairs, so repeated keys are not a rejection.
type QueryPairs = Result<Query<Vec<(String, String)>>, QueryRejection>;

/// First value given for `key`; later repeats are ignored.
fn first_value(query: QueryPairs, key: &str) -> Result<Option<String>, AppError> {
    let Query(pairs) = query.map_err(|rejection| AppError::Validation(rejection.body_text()))?;
    Ok(pairs.into_iter().find(|(k, _)| k == key).map(|(_, v)| v))
}

/// Returns the value of a required query parameter, rejecting missing or empty ones.
fn required_param(value: Option<String>, name: &str) -> Result<String, AppError> {
    match value {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(AppError::Validation(format!("{} parameter is required", name))),
    }
}

/// GET /
///
/// Liveness message for the intake form.
#[utoipa::path(
    get,
    path = "/",
    responses((status = 200, description = "Service is live", body = MessageResponse))
)]
pub async fn root() -> Json<MessageResponse> {
    Json(MessageResponse {
        message: "Service is running!".to_string(),
    })
}

/// GET /health
///
/// Probe endpoint; never touches the database.
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is live", body = HealthResponse))
)]
pub async fn health() -> (StatusCode, Json<HealthResponse>) {
    (
        StatusCode::OK,
        Json(HealthResponse {
            message: "Service is running!".to_string(),
            status: "healthy".to_string(),
            service: env!("CARGO_PKG_NAME").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }),
    )
}

/// GET /addresses?street=...
///
/// Partial, case-insensitive address search. JSON text columns are returned
/// exactly as stored.
#[utoipa::path(
    get,
    path = "/addresses",
    params(StreetQuery),
    responses(
        (status = 200, description = "Matching entries", body = MatchesResponse),
        (status = 400, description = "Missing street parameter", body = ErrorResponse),
        (status = 500, description = "Database error", body = ErrorResponse)
    )
)]
pub async fn search_addresses(
    State(state): State<Arc<AppState>>,
    query: QueryPairs,
) -> Result<Json<MatchesResponse>, AppError> {
    let street = required_param(first_value(query, "street")?, "Street")?;
    tracing::info!("GET /addresses - street: {:?}", street);

    let rows = state.storage.search_by_street(&street).await?;
    tracing::debug!("Address search matched {} entries", rows.len());

    Ok(Json(MatchesResponse {
        matches: rows
            .into_iter()
            .map(|row| row.into_view(Decoding::Raw))
            .collect(),
    }))
}

/// POST /submit
///
/// Stores the intake form on the row matching `address` and marks it accepted.
/// A body that does not parse is reported as a server error, like any other
/// failure on this route.
#[utoipa::path(
    post,
    path = "/submit",
    request_body = SubmitRequest,
    responses(
        (status = 200, description = "Row updated", body = MessageResponse),
        (status = 500, description = "Malformed body or database error", body = ErrorResponse)
    )
)]
pub async fn submit_entry(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<SubmitRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, AppError> {
    let Json(submission) = payload.map_err(|rejection| {
        tracing::error!("Unreadable submission body: {:?}", rejection);
        AppError::Internal(rejection.body_text())
    })?;

    tracing::info!("POST /submit - address: {:?}", submission.address);

    let address = submission.address.clone();
    let updated = state.storage.update_submission(submission).await?;

    if updated == 0 {
        tracing::debug!("Submission for {:?} matched no rows", address);
    } else {
        tracing::debug!("Submission for {:?} updated {} row(s)", address, updated);
    }

    Ok(Json(MessageResponse {
        message: "Row updated successfully".to_string(),
    }))
}

/// GET /get-by-address?address=...
///
/// Exact lookup. `income_details` is decoded; `what_we_can_do` stays as text.
#[utoipa::path(
    get,
    path = "/get-by-address",
    params(AddressQuery),
    responses(
        (status = 200, description = "The entry", body = EntryView),
        (status = 400, description = "Missing address parameter", body = ErrorResponse),
        (status = 404, description = "Address not found", body = ErrorResponse),
        (status = 500, description = "Database error", body = ErrorResponse)
    )
)]
pub async fn get_by_address(
    State(state): State<Arc<AppState>>,
    query: QueryPairs,
) -> Result<Json<EntryView>, AppError> {
    let address = required_param(first_value(query, "address")?, "Address")?;
    tracing::info!("GET /get-by-address - address: {:?}", address);

    let row = state
        .storage
        .find_by_address(&address)
        .await?
        .ok_or_else(|| AppError::NotFound("Address not found".to_string()))?;

    Ok(Json(row.into_view(Decoding::IncomeDetails)))
}

/// GET /qualified-entries
///
/// Entries accepted but not completed, with both JSON text columns decoded.
/// An empty result is reported as 404.
#[utoipa::path(
    get,
    path = "/qualified-entries",
    responses(
        (status = 200, description = "Qualified entries", body = QualifiedEntriesResponse),
        (status = 404, description = "No qualified entries", body = ErrorResponse),
        (status = 500, description = "Database error", body = ErrorResponse)
    )
)]
pub async fn qualified_entries(
    State(state): State<Arc<AppState>>,
) -> Result<Json<QualifiedEntriesResponse>, AppError> {
    tracing::info!("GET /qualified-entries");

    let rows = state.storage.list_qualified().await?;
    if rows.is_empty() {
        return Err(AppError::NotFound(
            "No qualified entries found".to_string(),
        ));
    }

    tracing::debug!("Found {} qualified entries", rows.len());

    Ok(Json(QualifiedEntriesResponse {
        qualified_entries: rows
            .into_iter()
            .map(|row| row.into_view(Decoding::All))
            .collect(),
    }))
}
