//! GSK Records API Library
//!
//! HTTP service over the benefit-eligibility entries table: address search,
//! intake form submission, single-entry lookup and the review queue of
//! accepted but incomplete entries.
//!
//! # Modules
//!
//! - `config`: Configuration management.
//! - `db`: Database connection pool.
//! - `db_storage`: SQL statements over the entries table.
//! - `errors`: Error handling types.
//! - `handlers`: HTTP request handlers.
//! - `models`: Row, request and response models.
//! - `openapi`: OpenAPI document and Swagger UI.
//! - `router`: Route table and middleware.

pub mod config;
pub mod db;
pub mod db_storage;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod openapi;
pub mod router;
