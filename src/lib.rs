//! Melody Catalog Library
//!
//! Local cache of a music catalog and the reconciliation engine that merges
//! freshly fetched catalog data into it.

pub mod catalog_client;
pub mod catalog_store;
pub mod config;
pub mod ingestion;
pub mod reconciliation;
pub mod sqlite_persistence;

// Re-export commonly used types for convenience
pub use catalog_client::{CatalogClient, WebApiClient};
pub use catalog_store::{CatalogStore, SqliteCatalogStore};
pub use ingestion::Ingestor;
