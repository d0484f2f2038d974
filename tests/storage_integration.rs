use std::env;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use sqlx::PgPool;
use tower::ServiceExt;

use gsk_records_api::config::Config;
use gsk_records_api::db::Database;
use gsk_records_api::handlers::AppState;
use gsk_records_api::router::create_router;

async fn call(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(request)
        .await
        .expect("failed to make request");
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("failed to read response body");
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn submit(body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/submit")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn create_seeded_table(pool: &PgPool, table: &str) -> anyhow::Result<()> {
    sqlx::query(&format!(
        "CREATE TABLE {} (
            address TEXT NOT NULL,
            first_name TEXT,
            last_name TEXT,
            phone TEXT,
            email TEXT,
            eligibility_type TEXT,
            income_details TEXT,
            total_income NUMERIC,
            benefit_description TEXT,
            benefit_images TEXT[],
            what_we_can_do TEXT,
            accepted BOOLEAN NOT NULL DEFAULT false,
            completed BOOLEAN NOT NULL DEFAULT false
        )",
        table
    ))
    .execute(pool)
    .await?;

    for address in ["12 Elm St", "12 ELM STREET", "9 Oak Ave"] {
        sqlx::query(&format!("INSERT INTO {} (address) VALUES ($1)", table))
            .bind(address)
            .execute(pool)
            .await?;
    }

    // Stored before the service existed: text that is not JSON, NaN income
    sqlx::query(&format!(
        "UPDATE {} SET income_details = 'n/a', total_income = 'NaN', accepted = true, completed = true \
         WHERE address = '9 Oak Ave'",
        table
    ))
    .execute(pool)
    .await?;

    Ok(())
}

/// End-to-end contract check against a real Postgres.
/// Marked ignored to avoid running against production by accident; set TEST_DATABASE_URL to run.
#[tokio::test]
#[ignore]
async fn entry_lifecycle_round_trip() -> anyhow::Result<()> {
    let db_url = env::var("TEST_DATABASE_URL")
        .map_err(|_| anyhow::anyhow!("Set TEST_DATABASE_URL to run this test"))?;

    let nanos = SystemTime::now().duration_since(UNIX_EPOCH)?.subsec_nanos();
    let table = format!("gsk_test_{}_{}", std::process::id(), nanos);

    let config = Config {
        database_url: db_url,
        port: 8000,
        entries_table: table.clone(),
        db_max_connections: 4,
        db_acquire_timeout_secs: 5,
    };
    let db = Database::new(&config).await?;
    create_seeded_table(&db.pool, &table).await?;

    let app = create_router(Arc::new(AppState::new(db.pool.clone(), &config)));

    // Nothing accepted yet, and completed rows never qualify
    let (status, body) = call(&app, get("/qualified-entries")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "No qualified entries found");

    // Partial, case-insensitive search
    let (status, body) = call(&app, get("/addresses?street=Elm")).await;
    assert_eq!(status, StatusCode::OK);
    let matches: Vec<&str> = body["matches"]
        .as_array()
        .expect("matches should be an array")
        .iter()
        .filter_map(|m| m["address"].as_str())
        .collect();
    assert_eq!(matches.len(), 2);
    assert!(matches.contains(&"12 ELM STREET"));

    // Wildcards in the fragment are literal
    let (status, body) = call(&app, get("/addresses?street=%25")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["matches"], json!([]));

    // Unknown address
    let (status, _) = call(&app, get("/get-by-address?address=1%20Nowhere%20Rd")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Submit, then fetch
    let (status, body) = call(
        &app,
        submit(json!({
            "address": "12 Elm St",
            "first_name": "Ada",
            "income_details": [{"source": "job", "amount": 100}],
            "total_income": "12345.678901234567890",
            "benefit_images": "front.jpg",
            "qualifications": ["q1"]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Row updated successfully");

    let (status, body) = call(&app, get("/get-by-address?address=12%20Elm%20St")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["address"], "12 Elm St");
    assert_eq!(body["first_name"], "Ada");
    assert_eq!(
        body["income_details"],
        json!([{"source": "job", "amount": 100}])
    );
    assert!(body["total_income"].is_number());
    assert_eq!(body["benefit_images"], json!(["front.jpg"]));
    assert_eq!(body["what_we_can_do"], json!(r#"["q1"]"#));

    let accepted: bool = sqlx::query_scalar(&format!(
        "SELECT accepted FROM {} WHERE address = $1",
        table
    ))
    .bind("12 Elm St")
    .fetch_one(&db.pool)
    .await?;
    assert!(accepted);

    // Search leaves JSON text undecoded
    let (_, body) = call(&app, get("/addresses?street=12%20elm%20st")).await;
    let submitted = body["matches"]
        .as_array()
        .and_then(|m| m.iter().find(|e| e["address"] == "12 Elm St"))
        .expect("submitted entry should be found");
    assert!(submitted["income_details"].is_string());
    assert!(submitted["total_income"].is_number());

    // Submitted and not completed, so it qualifies
    let (status, body) = call(&app, get("/qualified-entries")).await;
    assert_eq!(status, StatusCode::OK);
    let entries = body["qualified_entries"].as_array().expect("array");
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["address"], "12 Elm St");
    assert_eq!(entries[0]["what_we_can_do"], json!(["q1"]));
    assert_eq!(
        entries[0]["income_details"],
        json!([{"source": "job", "amount": 100}])
    );
    assert_eq!(entries[0]["accepted"], json!(true));
    assert_eq!(entries[0]["completed"], json!(false));

    // Undecodable stored text comes back as-is
    let (status, body) = call(&app, get("/get-by-address?address=9%20Oak%20Ave")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["income_details"], "n/a");
    assert!(body["total_income"].is_null());

    // NaN income does not break listings that include the row
    let (status, _) = call(&app, get("/addresses?street=Oak")).await;
    assert_eq!(status, StatusCode::OK);

    // Unknown address on submit is a silent no-op
    let (status, _) = call(&app, submit(json!({"address": "1 Nowhere Rd"}))).await;
    assert_eq!(status, StatusCode::OK);
    let count: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", table))
        .fetch_one(&db.pool)
        .await?;
    assert_eq!(count, 3);

    sqlx::query(&format!("DROP TABLE {}", table))
        .execute(&db.pool)
        .await?;
    Ok(())
}
