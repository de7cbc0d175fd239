//! In-memory catalog implementing `CatalogClient`.
//!
//! Enforces the Web API batch limits and records every request so tests can
//! check chunking and pagination.

use super::constants::*;
use melody_catalog::catalog_client::{CatalogAlbum, CatalogClient, ClientError, ClientResult, Page};
use melody_catalog::catalog_store::{AlbumRecord, ArtistRecord, PlaylistRecord, TrackRecord};
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};

const MAX_ALBUMS_PER_REQUEST: usize = 20;
const MAX_TRACKS_PER_REQUEST: usize = 50;

pub struct FakeCatalog {
    artists: HashMap<String, ArtistRecord>,
    albums: Vec<(AlbumRecord, Vec<TrackRecord>)>,
    playlists: HashMap<String, (PlaylistRecord, Vec<Option<TrackRecord>>)>,
    unavailable_artists: HashSet<String>,
    embedded_tracks: usize,
    requests: RefCell<Vec<String>>,
}

fn page<T: Clone>(items: &[T], limit: u32, offset: u32) -> Page<T> {
    let start = (offset as usize).min(items.len());
    let end = (start + limit as usize).min(items.len());
    Page {
        items: items[start..end].to_vec(),
        total: items.len() as u32,
    }
}

fn bad_request(url: &str) -> ClientError {
    ClientError::Status {
        url: url.to_string(),
        status: 400,
    }
}

impl FakeCatalog {
    pub fn new() -> Self {
        Self {
            artists: HashMap::new(),
            albums: Vec::new(),
            playlists: HashMap::new(),
            unavailable_artists: HashSet::new(),
            embedded_tracks: 50,
            requests: RefCell::new(Vec::new()),
        }
    }

    /// Limit how many tracks a full album response embeds.
    pub fn with_embedded_tracks(mut self, count: usize) -> Self {
        self.embedded_tracks = count;
        self
    }

    pub fn add_artist(&mut self, artist: ArtistRecord) {
        self.artists.insert(artist.id.clone(), artist);
    }

    /// Register an album with its tracks. Tracks are re-pointed to the album
    /// and `total_tracks` is set from their count.
    pub fn add_album(&mut self, album: AlbumRecord, tracks: Vec<TrackRecord>) {
        let album = AlbumRecord {
            total_tracks: tracks.len() as u32,
            ..album
        };
        let tracks: Vec<TrackRecord> = tracks
            .into_iter()
            .map(|t| TrackRecord {
                album: album.clone(),
                ..t
            })
            .collect();
        for artist in album.artists.iter().chain(tracks.iter().flat_map(|t| &t.artists)) {
            self.artists
                .entry(artist.id.clone())
                .or_insert_with(|| artist.clone());
        }
        self.albums.push((album, tracks));
    }

    pub fn add_playlist(&mut self, entries: Vec<Option<TrackRecord>>) {
        let record = PlaylistRecord {
            id: PLAYLIST_ID.to_string(),
            name: PLAYLIST_NAME.to_string(),
            artwork_url: None,
            items: Vec::new(),
        };
        self.playlists
            .insert(PLAYLIST_ID.to_string(), (record, entries));
    }

    /// Make `artist_albums` fail for the given artist.
    pub fn make_unavailable(&mut self, artist_id: &str) {
        self.unavailable_artists.insert(artist_id.to_string());
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.borrow().clone()
    }

    fn log(&self, request: String) {
        self.requests.borrow_mut().push(request);
    }

    fn find_album(&self, id: &str) -> Option<&(AlbumRecord, Vec<TrackRecord>)> {
        self.albums.iter().find(|(album, _)| album.id == id)
    }

    fn catalog_album(&self, id: &str) -> Option<CatalogAlbum> {
        self.find_album(id).map(|(album, tracks)| CatalogAlbum {
            album: album.clone(),
            tracks: page(tracks, self.embedded_tracks as u32, 0),
        })
    }

    fn find_track(&self, id: &str) -> Option<TrackRecord> {
        self.albums
            .iter()
            .flat_map(|(_, tracks)| tracks)
            .find(|t| t.id == id)
            .cloned()
    }
}

impl CatalogClient for FakeCatalog {
    fn track(&self, id: &str) -> ClientResult<TrackRecord> {
        self.log(format!("track {}", id));
        self.find_track(id).ok_or_else(|| ClientError::NotFound {
            kind: "track",
            id: id.to_string(),
        })
    }

    fn tracks(&self, ids: &[String]) -> ClientResult<Vec<TrackRecord>> {
        self.log(format!("tracks {}", ids.len()));
        if ids.len() > MAX_TRACKS_PER_REQUEST {
            return Err(bad_request("/tracks"));
        }
        Ok(ids.iter().filter_map(|id| self.find_track(id)).collect())
    }

    fn album(&self, id: &str) -> ClientResult<CatalogAlbum> {
        self.log(format!("album {}", id));
        self.catalog_album(id).ok_or_else(|| ClientError::NotFound {
            kind: "album",
            id: id.to_string(),
        })
    }

    fn albums(&self, ids: &[String]) -> ClientResult<Vec<CatalogAlbum>> {
        self.log(format!("albums {}", ids.len()));
        if ids.len() > MAX_ALBUMS_PER_REQUEST {
            return Err(bad_request("/albums"));
        }
        Ok(ids.iter().filter_map(|id| self.catalog_album(id)).collect())
    }

    fn album_tracks(
        &self,
        album: &AlbumRecord,
        limit: u32,
        offset: u32,
    ) -> ClientResult<Page<TrackRecord>> {
        self.log(format!("album_tracks {} {} {}", album.id, limit, offset));
        let (_, tracks) = self.find_album(&album.id).ok_or_else(|| ClientError::NotFound {
            kind: "album",
            id: album.id.clone(),
        })?;
        Ok(page(tracks, limit, offset))
    }

    fn artist(&self, id: &str) -> ClientResult<ArtistRecord> {
        self.log(format!("artist {}", id));
        self.artists.get(id).cloned().ok_or_else(|| ClientError::NotFound {
            kind: "artist",
            id: id.to_string(),
        })
    }

    fn artist_albums(&self, id: &str, limit: u32, offset: u32) -> ClientResult<Page<AlbumRecord>> {
        self.log(format!("artist_albums {} {} {}", id, limit, offset));
        if self.unavailable_artists.contains(id) {
            return Err(ClientError::RateLimited {
                retry_after: Some(30),
            });
        }
        let albums: Vec<AlbumRecord> = self
            .albums
            .iter()
            .filter(|(album, tracks)| {
                album.artists.iter().any(|a| a.id == id) || tracks.iter().any(|t| t.has_artist(id))
            })
            .map(|(album, _)| album.clone())
            .collect();
        Ok(page(&albums, limit, offset))
    }

    fn playlist(&self, id: &str) -> ClientResult<PlaylistRecord> {
        self.log(format!("playlist {}", id));
        self.playlists
            .get(id)
            .map(|(record, _)| record.clone())
            .ok_or_else(|| ClientError::NotFound {
                kind: "playlist",
                id: id.to_string(),
            })
    }

    fn playlist_items(
        &self,
        id: &str,
        limit: u32,
        offset: u32,
    ) -> ClientResult<Page<Option<TrackRecord>>> {
        self.log(format!("playlist_items {} {} {}", id, limit, offset));
        let (_, entries) = self.playlists.get(id).ok_or_else(|| ClientError::NotFound {
            kind: "playlist",
            id: id.to_string(),
        })?;
        Ok(page(entries, limit, offset))
    }
}
