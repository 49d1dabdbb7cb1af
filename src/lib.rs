// Blogsite Store - document store, services and read API for a blogging platform

// Core types and validation primitives
pub mod core;

// Storage infrastructure - document store, cache, TTL sweeper
pub mod infrastructure;

// Collection schemas, indexes and validation rules
pub mod ent_schema;
pub mod schemas;

// Domain documents and write services
pub mod models;
pub mod services;

// HTTP surface and its client
pub mod api;
pub mod client;

// Common utilities
pub mod app_state;
pub mod config;
pub mod data_seeder;
pub mod error;

// Re-exports for convenience
pub use app_state::AppState;
pub use config::Config;
pub use error::{AppError, AppResult};
