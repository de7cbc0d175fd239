//! Ingestion workflows: fetch from the catalog, merge into the store.

mod ingestor;

pub use ingestor::{
    collect_pages, ArtistIngestion, IngestionConfig, IngestionError, IngestionResult, Ingestor,
};
