// Core infrastructure modules
pub mod database;          // Document store interface, queries and updates
pub mod sqlite_database;   // SQLite-backed document store
pub mod cache;             // LRU cache
pub mod id_generator;      // Document id generation
pub mod ttl_sweeper;       // Background expiry of TTL-indexed collections

// Re-export core infrastructure components
pub use database::{DocumentQuery, DocumentStore, Filter, Update, WriteOutcome};
pub use sqlite_database::SqliteDocumentStore;
pub use cache::Cache;
pub use id_generator::DocumentIdGenerator;
pub use ttl_sweeper::{SweepStats, TtlSweeper};
