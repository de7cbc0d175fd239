//! Ingestor - pulls catalog data through the client and merges it into the
//! store.
//!
//! Workflows:
//! - tracks: fetch in chunks, upsert each track.
//! - albums: fetch in chunks, page through each album's tracks, upsert them.
//! - playlists: fetch metadata, page through items, store the playlist.
//! - artists: follow the artist, gather every track of every album it
//!   appears on, reconcile against the cache, review, apply.

use crate::catalog_client::{CatalogAlbum, CatalogClient, ClientError, ClientResult, Page};
use crate::catalog_store::{
    Artist, CatalogStore, Playlist, PlaylistItem, StoreError, Track, TrackRecord,
};
use crate::reconciliation::{
    apply, reconcile_artist, AppliedTrack, Reconciliation, ReviewError, Reviewer,
};
use std::collections::HashSet;
use thiserror::Error;
use tracing::{debug, error, info};

/// Errors that can occur during ingestion.
#[derive(Debug, Error)]
pub enum IngestionError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Catalog error: {0}")]
    Client(#[from] ClientError),

    #[error("Review error: {0}")]
    Review(#[from] ReviewError),
}

pub type IngestionResult<T> = Result<T, IngestionError>;

/// Paging and batching limits for catalog requests.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IngestionConfig {
    /// Items per page for paginated listings.
    pub page_size: u32,
    /// Albums per batch album request.
    pub album_chunk_size: usize,
    /// Tracks per batch track request.
    pub track_chunk_size: usize,
}

impl Default for IngestionConfig {
    fn default() -> Self {
        Self {
            page_size: 50,
            album_chunk_size: 20,
            track_chunk_size: 50,
        }
    }
}

/// Result of ingesting one artist.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ArtistIngestion {
    NoNewTracks(Artist),
    Applied {
        artist: Artist,
        tracks: Vec<AppliedTrack>,
    },
}

impl ArtistIngestion {
    pub fn artist(&self) -> &Artist {
        match self {
            ArtistIngestion::NoNewTracks(artist) => artist,
            ArtistIngestion::Applied { artist, .. } => artist,
        }
    }
}

/// Fetch every page of a listing, stopping at the first short page.
pub fn collect_pages<T>(
    page_size: u32,
    mut fetch: impl FnMut(u32, u32) -> ClientResult<Page<T>>,
) -> ClientResult<Vec<T>> {
    let page_size = page_size.max(1);
    let mut items = Vec::new();
    let mut offset = 0;
    loop {
        let page = fetch(page_size, offset)?;
        let count = page.items.len();
        items.extend(page.items);
        if count < page_size as usize {
            break;
        }
        offset += page_size;
    }
    Ok(items)
}

/// Context object wiring a store and a catalog client together.
pub struct Ingestor<'a> {
    store: &'a dyn CatalogStore,
    client: &'a dyn CatalogClient,
    config: IngestionConfig,
}

impl<'a> Ingestor<'a> {
    pub fn new(
        store: &'a dyn CatalogStore,
        client: &'a dyn CatalogClient,
        config: IngestionConfig,
    ) -> Self {
        Self {
            store,
            client,
            config,
        }
    }

    // =========================================================================
    // Tracks & Albums
    // =========================================================================

    /// Store the given tracks. With `force`, an already cached track is
    /// overwritten, which also makes a hidden one visible again.
    pub fn ingest_tracks(&self, ids: &[String], force: bool) -> IngestionResult<Vec<Track>> {
        let mut tracks = Vec::new();
        for chunk in ids.chunks(self.config.track_chunk_size.max(1)) {
            for record in self.fetch_tracks(chunk)? {
                let track = self.store.upsert_track(&record, force)?;
                info!("Track {}", track.description(true));
                tracks.push(track);
            }
        }
        Ok(tracks)
    }

    /// Store every track of the given albums.
    pub fn ingest_albums(&self, ids: &[String]) -> IngestionResult<Vec<Track>> {
        let mut tracks = Vec::new();
        for chunk in ids.chunks(self.config.album_chunk_size.max(1)) {
            for catalog_album in self.fetch_albums(chunk)? {
                info!(
                    "Album {} ({})",
                    catalog_album.album.name, catalog_album.album.id
                );
                for record in self.album_tracks(catalog_album)? {
                    let track = self.store.upsert_track(&record, false)?;
                    debug!("  {}", track.description(false));
                    tracks.push(track);
                }
            }
        }
        Ok(tracks)
    }

    /// A lone ID goes through the single-item endpoint. Unknown IDs are left
    /// out either way.
    fn fetch_tracks(&self, ids: &[String]) -> ClientResult<Vec<TrackRecord>> {
        match ids {
            [id] => match self.client.track(id) {
                Ok(record) => Ok(vec![record]),
                Err(ClientError::NotFound { .. }) => Ok(Vec::new()),
                Err(e) => Err(e),
            },
            _ => self.client.tracks(ids),
        }
    }

    fn fetch_albums(&self, ids: &[String]) -> ClientResult<Vec<CatalogAlbum>> {
        match ids {
            [id] => match self.client.album(id) {
                Ok(catalog_album) => Ok(vec![catalog_album]),
                Err(ClientError::NotFound { .. }) => Ok(Vec::new()),
                Err(e) => Err(e),
            },
            _ => self.client.albums(ids),
        }
    }

    /// All tracks of an album: the embedded first page, then further pages
    /// until the total is reached or a page comes back short.
    fn album_tracks(&self, catalog_album: CatalogAlbum) -> ClientResult<Vec<TrackRecord>> {
        let page_size = self.config.page_size.max(1);
        let total = catalog_album.tracks.total as usize;
        let mut tracks = catalog_album.tracks.items;
        while tracks.len() < total {
            let page =
                self.client
                    .album_tracks(&catalog_album.album, page_size, tracks.len() as u32)?;
            let count = page.items.len();
            tracks.extend(page.items);
            if count < page_size as usize {
                break;
            }
        }
        Ok(tracks)
    }

    // =========================================================================
    // Playlists
    // =========================================================================

    /// Store the given playlists with their full track lists. Entries
    /// without a catalog track are dropped; positions stay contiguous.
    pub fn ingest_playlists(&self, ids: &[String]) -> IngestionResult<Vec<Playlist>> {
        let mut playlists = Vec::new();
        for id in ids {
            let mut record = self.client.playlist(id)?;
            let entries = collect_pages(self.config.page_size, |limit, offset| {
                self.client.playlist_items(id, limit, offset)
            })?;
            let skipped = entries.iter().filter(|e| e.is_none()).count();
            record.items = entries
                .into_iter()
                .flatten()
                .enumerate()
                .map(|(i, track)| PlaylistItem {
                    position: i as u32 + 1,
                    track,
                })
                .collect();
            if skipped > 0 {
                debug!("Skipped {} entries without a catalog track in {}", skipped, id);
            }
            playlists.push(self.store.upsert_playlist(&record)?);
        }
        Ok(playlists)
    }

    // =========================================================================
    // Artists
    // =========================================================================

    /// Follow an artist and bring its discography into the cache.
    pub fn ingest_artist(
        &self,
        id: &str,
        reviewer: &mut dyn Reviewer,
    ) -> IngestionResult<ArtistIngestion> {
        let record = self.client.artist(id)?;
        let artist = self.store.upsert_artist(&record, false, true, true)?;
        info!("Ingesting artist {} ({})", artist.name, artist.id);

        let existing = self.store.get_artist_tracks(&artist.id)?;

        let albums = collect_pages(self.config.page_size, |limit, offset| {
            self.client.artist_albums(&artist.id, limit, offset)
        })?;
        let mut seen = HashSet::new();
        let album_ids: Vec<String> = albums
            .into_iter()
            .map(|album| album.id)
            .filter(|id| seen.insert(id.clone()))
            .collect();
        debug!("Artist {} appears on {} albums", artist.id, album_ids.len());

        let mut candidates = Vec::new();
        for chunk in album_ids.chunks(self.config.album_chunk_size.max(1)) {
            for catalog_album in self.fetch_albums(chunk)? {
                candidates.extend(
                    self.album_tracks(catalog_album)?
                        .into_iter()
                        .filter(|t| t.has_artist(&artist.id)),
                );
            }
        }

        let plan = match reconcile_artist(&artist, candidates, &existing) {
            Reconciliation::NoNewTracks => {
                info!("No new tracks for {}", artist.name);
                return Ok(ArtistIngestion::NoNewTracks(artist));
            }
            Reconciliation::Plan(plan) => plan,
        };
        info!(
            "Proposed for {}: {} existing to modify, {} to add, {} to skip",
            artist.name,
            plan.existing.len(),
            plan.add.len(),
            plan.skip.len()
        );

        let decisions = reviewer.review(&plan)?;
        let tracks = apply(self.store, &plan, &decisions)?;
        info!("Applied {} track decisions for {}", tracks.len(), artist.name);

        Ok(ArtistIngestion::Applied { artist, tracks })
    }

    /// Re-ingest every followed, visible artist. A failing artist is logged
    /// and does not stop the others.
    pub fn refresh_followed_artists(
        &self,
        reviewer: &mut dyn Reviewer,
    ) -> IngestionResult<Vec<ArtistIngestion>> {
        let artists = self.store.get_followed_artists()?;
        info!("Refreshing {} followed artists", artists.len());

        let mut results = Vec::new();
        for artist in artists {
            match self.ingest_artist(&artist.id, reviewer) {
                Ok(result) => results.push(result),
                Err(e) => error!("Failed to refresh artist {} ({}): {}", artist.name, artist.id, e),
            }
        }
        Ok(results)
    }
}
