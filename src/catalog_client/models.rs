//! Wire models for the catalog Web API.
//!
//! These types match the JSON returned by a Spotify-compatible Web API and
//! convert into the catalog store's typed records. Validation (album type,
//! release date precision, artist presence) happens here, once.

use super::error::{ClientError, ClientResult};
use crate::catalog_store::{
    AlbumRecord, AlbumType, ArtistRecord, ReleaseDate, ReleaseDatePrecision, TrackRecord,
};
use serde::{Deserialize, Serialize};

// =============================================================================
// Paging
// =============================================================================

/// One page of a paginated listing.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    #[serde(default)]
    pub total: u32,
}

impl<T> Page<T> {
    /// Convert every item, failing on the first invalid one.
    pub fn try_map<U>(self, f: impl FnMut(T) -> ClientResult<U>) -> ClientResult<Page<U>> {
        Ok(Page {
            items: self.items.into_iter().map(f).collect::<ClientResult<Vec<_>>>()?,
            total: self.total,
        })
    }
}

/// A full album together with the first page of its tracks.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CatalogAlbum {
    pub album: AlbumRecord,
    pub tracks: Page<TrackRecord>,
}

// =============================================================================
// Wire Types
// =============================================================================

#[derive(Clone, Debug, Deserialize)]
pub struct WireImage {
    pub url: String,
    pub height: Option<u32>,
    pub width: Option<u32>,
}

/// Highest resolution image wins; ties keep the first one listed.
pub fn best_image_url(images: &[WireImage]) -> Option<String> {
    let mut best: Option<&WireImage> = None;
    for image in images {
        let height = image.height.unwrap_or(0);
        if best.map_or(true, |b| height > b.height.unwrap_or(0)) {
            best = Some(image);
        }
    }
    best.map(|image| image.url.clone())
}

#[derive(Clone, Debug, Deserialize)]
pub struct WireArtist {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub images: Vec<WireImage>,
}

impl WireArtist {
    pub fn into_record(self) -> ArtistRecord {
        ArtistRecord {
            artwork_url: best_image_url(&self.images),
            id: self.id,
            name: self.name,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct WireAlbum {
    pub id: String,
    pub name: String,
    pub album_type: String,
    pub total_tracks: u32,
    pub release_date: String,
    pub release_date_precision: String,
    #[serde(default)]
    pub images: Vec<WireImage>,
    #[serde(default)]
    pub artists: Vec<WireArtist>,
    /// Only present on full album objects.
    pub tracks: Option<Page<WireTrack>>,
}

impl WireAlbum {
    pub fn into_record(self) -> ClientResult<AlbumRecord> {
        let invalid = |reason: String| ClientError::InvalidRecord {
            kind: "album",
            id: self.id.clone(),
            reason,
        };

        let album_type = AlbumType::from_db_str(&self.album_type.to_lowercase())
            .map_err(|e| invalid(e.to_string()))?;
        let precision = ReleaseDatePrecision::from_db_str(&self.release_date_precision)
            .map_err(|e| invalid(e.to_string()))?;
        let release_date =
            ReleaseDate::new(&self.release_date, precision).map_err(|e| invalid(e.to_string()))?;
        if self.artists.is_empty() {
            return Err(invalid("no artists".to_string()));
        }

        Ok(AlbumRecord {
            artwork_url: best_image_url(&self.images),
            id: self.id,
            name: self.name,
            album_type,
            total_tracks: self.total_tracks,
            release_date,
            artists: self.artists.into_iter().map(WireArtist::into_record).collect(),
        })
    }

    /// Convert a full album object, keeping its embedded first page of tracks.
    pub fn into_catalog_album(mut self) -> ClientResult<CatalogAlbum> {
        let tracks = self.tracks.take().unwrap_or(Page {
            items: Vec::new(),
            total: 0,
        });
        let album = self.into_record()?;
        let tracks = tracks.try_map(|track| track.into_record(Some(&album)))?;
        Ok(CatalogAlbum { album, tracks })
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct WireTrack {
    /// Null for local files in playlists.
    pub id: Option<String>,
    pub name: String,
    #[serde(default = "default_number")]
    pub disc_number: u32,
    #[serde(default = "default_number")]
    pub track_number: u32,
    #[serde(default = "default_explicit")]
    pub explicit: bool,
    #[serde(default)]
    pub artists: Vec<WireArtist>,
    /// Only present on full track objects.
    pub album: Option<WireAlbum>,
    #[serde(default)]
    pub is_local: bool,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

fn default_number() -> u32 {
    1
}

fn default_explicit() -> bool {
    true
}

impl WireTrack {
    /// Convert into a track record. Simplified tracks (album listings) carry
    /// no album and must be given the one they were listed under.
    pub fn into_record(self, album: Option<&AlbumRecord>) -> ClientResult<TrackRecord> {
        let id = self.id.ok_or_else(|| ClientError::InvalidRecord {
            kind: "track",
            id: self.name.clone(),
            reason: "missing id".to_string(),
        })?;
        if self.artists.is_empty() {
            return Err(ClientError::InvalidRecord {
                kind: "track",
                id,
                reason: "no artists".to_string(),
            });
        }
        let album = match (self.album, album) {
            (Some(wire), _) => wire.into_record()?,
            (None, Some(album)) => album.clone(),
            (None, None) => {
                return Err(ClientError::InvalidRecord {
                    kind: "track",
                    id,
                    reason: "no album".to_string(),
                })
            }
        };

        Ok(TrackRecord {
            id,
            name: self.name,
            disc_number: self.disc_number,
            track_number: self.track_number,
            explicit: self.explicit,
            hidden: false,
            album,
            artists: self.artists.into_iter().map(WireArtist::into_record).collect(),
        })
    }

    fn is_playable(&self) -> bool {
        !self.is_local && self.id.is_some() && self.kind.as_deref().map_or(true, |k| k == "track")
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct WirePlaylist {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub images: Option<Vec<WireImage>>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct WirePlaylistItem {
    pub track: Option<WireTrack>,
}

impl WirePlaylistItem {
    /// `None` for local files, episodes and removed tracks.
    pub fn into_record(self) -> ClientResult<Option<TrackRecord>> {
        match self.track {
            Some(track) if track.is_playable() => track.into_record(None).map(Some),
            _ => Ok(None),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct TracksResponse {
    pub tracks: Vec<Option<WireTrack>>,
}

#[derive(Debug, Deserialize)]
pub struct AlbumsResponse {
    pub albums: Vec<Option<WireAlbum>>,
}

#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default = "default_expiry")]
    pub expires_in: u64,
}

fn default_expiry() -> u64 {
    3600
}
