//! Common test infrastructure
//!
//! Tests should only import from this module, not from internal submodules.
//!
//! # Example
//!
//! ```no_run
//! mod common;
//! use common::{album, FakeCatalog, TestStore};
//! use melody_catalog::catalog_store::AlbumType;
//!
//! #[test]
//! fn test_add_album() {
//!     let store = TestStore::new();
//!     let mut catalog = FakeCatalog::new();
//!     catalog.add_album(album("al-1", "Record", AlbumType::Album, "2020-01-01"), vec![]);
//!     // ... ingest through an Ingestor built on `store` and `catalog`
//! }
//! ```

mod constants;
mod fake_catalog;
mod fixtures;

// Public API - this is what tests import
pub use constants::*;
pub use fake_catalog::FakeCatalog;
#[allow(unused_imports)]
pub use fixtures::{album, album_by, artist, track, track_by, TestStore};
