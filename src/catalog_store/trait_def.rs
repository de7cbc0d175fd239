//! CatalogStore trait definition.
//!
//! Reconciliation and ingestion work against this trait so they can be
//! exercised without a database file.

use super::error::StoreResult;
use super::models::{
    Album, AlbumRecord, Artist, ArtistRecord, Playlist, PlaylistRecord, Track, TrackRecord,
};

/// Storage backend for the catalog cache.
pub trait CatalogStore {
    // =========================================================================
    // Basic Entity Retrieval
    // =========================================================================

    /// Get a track with its album and artists.
    fn get_track(&self, id: &str) -> StoreResult<Option<Track>>;

    /// Get an album with its artists.
    fn get_album(&self, id: &str) -> StoreResult<Option<Album>>;

    fn get_artist(&self, id: &str) -> StoreResult<Option<Artist>>;

    /// Get a playlist with its tracks in playlist order.
    fn get_playlist(&self, id: &str) -> StoreResult<Option<Playlist>>;

    // =========================================================================
    // Listings
    // =========================================================================

    /// All tracks, ordered by release date, album name and track number.
    fn get_all_tracks(&self) -> StoreResult<Vec<Track>>;

    fn get_all_albums(&self) -> StoreResult<Vec<Album>>;

    fn get_all_artists(&self) -> StoreResult<Vec<Artist>>;

    fn get_all_playlists(&self) -> StoreResult<Vec<Playlist>>;

    /// Tracks crediting the given artist, hidden ones included.
    fn get_artist_tracks(&self, artist_id: &str) -> StoreResult<Vec<Track>>;

    /// Tracks of one album in disc and track order.
    fn get_album_tracks(&self, album_id: &str) -> StoreResult<Vec<Track>>;

    /// Non-hidden tracks, i.e. what should be present in the local library.
    fn get_visible_tracks(&self) -> StoreResult<Vec<Track>>;

    /// Followed artists that are not hidden.
    fn get_followed_artists(&self) -> StoreResult<Vec<Artist>>;

    // =========================================================================
    // Counts
    // =========================================================================

    fn get_artists_count(&self) -> StoreResult<usize>;

    fn get_albums_count(&self) -> StoreResult<usize>;

    fn get_tracks_count(&self) -> StoreResult<usize>;

    fn get_playlists_count(&self) -> StoreResult<usize>;

    // =========================================================================
    // Write Operations
    // =========================================================================

    /// Insert a track (with its album and artists) or merge it into the
    /// stored one. Without `replace` the stored track wins, unless the
    /// incoming track is explicit and the stored one is not.
    fn upsert_track(&self, track: &TrackRecord, replace: bool) -> StoreResult<Track>;

    fn upsert_album(&self, album: &AlbumRecord, hidden: bool, replace: bool)
        -> StoreResult<Album>;

    fn upsert_artist(
        &self,
        artist: &ArtistRecord,
        hidden: bool,
        follow: bool,
        replace: bool,
    ) -> StoreResult<Artist>;

    /// Store the playlist and replace its full track list. Member tracks are
    /// upserted as non-explicit.
    fn upsert_playlist(&self, playlist: &PlaylistRecord) -> StoreResult<Playlist>;

    /// Hide the track, or delete it with its relationship rows when `delete`.
    /// Returns false if the track does not exist.
    fn remove_track(&self, id: &str, delete: bool) -> StoreResult<bool>;

    /// Hide the album and its tracks, or delete it when `delete`. Deletion
    /// is refused (false) while visible tracks still reference the album.
    fn remove_album(&self, id: &str, delete: bool) -> StoreResult<bool>;

    /// Delete the playlist when `delete`, otherwise hide the non-explicit
    /// tracks that no other playlist references.
    fn remove_playlist(&self, id: &str, delete: bool) -> StoreResult<bool>;
}
