mod error;
mod models;
mod resolver;
mod schema;
mod store;
mod trait_def;

pub use error::{StoreError, StoreResult};
pub use models::*;
pub use resolver::{resolve, Explicitness, Resolution};
pub use schema::CATALOG_SCHEMA;
pub use store::SqliteCatalogStore;
pub use trait_def::CatalogStore;
