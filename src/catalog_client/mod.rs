//! Client side of the external catalog: the interface reconciliation and
//! ingestion depend on, plus the Web API implementation.

mod client;
mod error;
mod models;

pub use client::{Credentials, WebApiClient};
pub use error::{ClientError, ClientResult};
pub use models::{best_image_url, CatalogAlbum, Page};

use crate::catalog_store::{AlbumRecord, ArtistRecord, PlaylistRecord, TrackRecord};

/// Read access to the external catalog.
///
/// Every record returned is already validated and typed. Paginated calls
/// return at most `limit` items starting at `offset`; a page shorter than
/// `limit` is the last one.
pub trait CatalogClient {
    fn track(&self, id: &str) -> ClientResult<TrackRecord>;

    /// Unknown IDs are left out of the result.
    fn tracks(&self, ids: &[String]) -> ClientResult<Vec<TrackRecord>>;

    fn album(&self, id: &str) -> ClientResult<CatalogAlbum>;

    /// Unknown IDs are left out of the result.
    fn albums(&self, ids: &[String]) -> ClientResult<Vec<CatalogAlbum>>;

    fn album_tracks(&self, album: &AlbumRecord, limit: u32, offset: u32)
        -> ClientResult<Page<TrackRecord>>;

    fn artist(&self, id: &str) -> ClientResult<ArtistRecord>;

    /// Albums of every type the artist appears on.
    fn artist_albums(&self, id: &str, limit: u32, offset: u32) -> ClientResult<Page<AlbumRecord>>;

    /// Playlist metadata; `items` is left empty, see `playlist_items`.
    fn playlist(&self, id: &str) -> ClientResult<PlaylistRecord>;

    /// `None` marks entries without a catalog track (local files, episodes).
    fn playlist_items(
        &self,
        id: &str,
        limit: u32,
        offset: u32,
    ) -> ClientResult<Page<Option<TrackRecord>>>;
}
