use axum::{http::StatusCode, response::IntoResponse, Json};
use utoipa::OpenApi;

use crate::models::{
    EntryView, ErrorResponse, HealthResponse, MatchesResponse, MessageResponse,
    QualifiedEntriesResponse, SubmitRequest,
};

/// OpenAPI document generated from the handler annotations.
#[derive(OpenApi)]
#[openapi(
    info(title = "GSK Records API", description = "Benefit eligibility entries keyed by address"),
    paths(
        crate::handlers::root,
        crate::handlers::health,
        crate::handlers::search_addresses,
        crate::handlers::submit_entry,
        crate::handlers::get_by_address,
        crate::handlers::qualified_entries,
    ),
    components(schemas(
        EntryView,
        MessageResponse,
        HealthResponse,
        MatchesResponse,
        QualifiedEntriesResponse,
        ErrorResponse,
        SubmitRequest,
    ))
)]
pub struct ApiDoc;

/// Serves the OpenAPI specification as JSON.
pub async fn serve_openapi_spec() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// Serves the Swagger UI HTML page.
///
/// The page loads Swagger UI from a CDN and points it at `serve_openapi_spec`.
pub async fn serve_swagger_ui() -> impl IntoResponse {
    let html = r#"
<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>GSK Records API - Swagger UI</title>
    <link rel="stylesheet" type="text/css" href="https://unpkg.com/swagger-ui-dist@5/swagger-ui.css">
    <style>
        body { margin: 0; padding: 0; }
    </style>
</head>
<body>
    <div id="swagger-ui"></div>
    <script src="https://unpkg.com/swagger-ui-dist@5/swagger-ui-bundle.js"></script>
    <script>
        window.onload = function() {
            window.ui = SwaggerUIBundle({
                url: "/api-docs/openapi.json",
                dom_id: '#swagger-ui',
                deepLinking: true
            });
        };
    </script>
</body>
</html>
"#;
    (
        StatusCode::OK,
        [(axum::http::header::CONTENT_TYPE, "text/html; charset=utf-8")],
        html,
    )
}
