//! Catalog models.
//!
//! Two families of types live here:
//! - `*Record` types describe catalog data as it arrives from the catalog
//!   client, before it is merged into the store.
//! - `Artist`, `Album`, `Track` and `Playlist` are the stored entities, fully
//!   assembled with their relationships.

use super::error::{StoreError, StoreResult};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// Enumerations
// =============================================================================

/// Album type classification
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AlbumType {
    Album,
    Single,
    Compilation,
    AppearsOn,
}

impl AlbumType {
    /// Convert from database (and catalog) string representation
    pub fn from_db_str(s: &str) -> StoreResult<Self> {
        match s {
            "album" => Ok(AlbumType::Album),
            "single" => Ok(AlbumType::Single),
            "compilation" => Ok(AlbumType::Compilation),
            "appears_on" => Ok(AlbumType::AppearsOn),
            other => Err(StoreError::UnknownAlbumType(other.to_string())),
        }
    }

    /// Convert to database string representation
    pub fn to_db_str(&self) -> &'static str {
        match self {
            AlbumType::Album => "album",
            AlbumType::Single => "single",
            AlbumType::Compilation => "compilation",
            AlbumType::AppearsOn => "appears_on",
        }
    }

    /// Lower rank wins when the same track name recurs across release types.
    pub fn precedence_rank(&self) -> u8 {
        match self {
            AlbumType::Album => 0,
            AlbumType::Single => 1,
            AlbumType::Compilation => 2,
            AlbumType::AppearsOn => 3,
        }
    }

    /// Album and compilation releases supersede singles.
    pub fn is_full_release(&self) -> bool {
        matches!(self, AlbumType::Album | AlbumType::Compilation)
    }
}

impl fmt::Display for AlbumType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_db_str())
    }
}

/// Precision of a release date as reported by the catalog.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ReleaseDatePrecision {
    Day,
    Month,
    Year,
}

impl ReleaseDatePrecision {
    pub fn from_db_str(s: &str) -> StoreResult<Self> {
        match s {
            "day" => Ok(ReleaseDatePrecision::Day),
            "month" => Ok(ReleaseDatePrecision::Month),
            "year" => Ok(ReleaseDatePrecision::Year),
            other => Err(StoreError::UnknownPrecision(other.to_string())),
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            ReleaseDatePrecision::Day => "day",
            ReleaseDatePrecision::Month => "month",
            ReleaseDatePrecision::Year => "year",
        }
    }
}

/// Pads a release date to day precision: `2022-10` (month) becomes
/// `2022-10-01`, `2022` (year) becomes `2022-01-01`.
pub fn normalize_release_date(raw: &str, precision: ReleaseDatePrecision) -> StoreResult<String> {
    let padded = match precision {
        ReleaseDatePrecision::Day => raw.to_string(),
        ReleaseDatePrecision::Month => format!("{}-01", raw),
        ReleaseDatePrecision::Year => format!("{}-01-01", raw),
    };
    NaiveDate::parse_from_str(&padded, "%Y-%m-%d")
        .map(|date| date.format("%Y-%m-%d").to_string())
        .map_err(|_| StoreError::InvalidReleaseDate {
            value: raw.to_string(),
            precision: precision.to_db_str().to_string(),
        })
}

/// A release date already normalized to day precision (`YYYY-MM-DD`), so
/// that string order is chronological order.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ReleaseDate(String);

impl ReleaseDate {
    pub fn new(raw: &str, precision: ReleaseDatePrecision) -> StoreResult<Self> {
        normalize_release_date(raw, precision).map(ReleaseDate)
    }

    /// Wraps a value read back from the store, which is always day precision.
    pub(crate) fn from_stored(value: String) -> Self {
        ReleaseDate(value)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ReleaseDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// =============================================================================
// Incoming records
// =============================================================================

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ArtistRecord {
    pub id: String,
    pub name: String,
    pub artwork_url: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct AlbumRecord {
    pub id: String,
    pub name: String,
    pub album_type: AlbumType,
    pub total_tracks: u32,
    pub release_date: ReleaseDate,
    pub artwork_url: Option<String>,
    pub artists: Vec<ArtistRecord>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct TrackRecord {
    pub id: String,
    pub name: String,
    pub disc_number: u32,
    pub track_number: u32,
    pub explicit: bool,
    pub hidden: bool,
    pub album: AlbumRecord,
    pub artists: Vec<ArtistRecord>,
}

impl TrackRecord {
    pub fn has_artist(&self, artist_id: &str) -> bool {
        self.artists.iter().any(|a| a.id == artist_id)
    }

    pub fn has_album_artist(&self, artist_id: &str) -> bool {
        self.album.artists.iter().any(|a| a.id == artist_id)
    }

    /// `name by artists`, or `name from album (album artists) by artists`.
    pub fn description(&self, with_album: bool) -> String {
        describe(
            &self.name,
            &self.album.name,
            self.album.artists.iter().map(|a| a.name.as_str()),
            self.artists.iter().map(|a| a.name.as_str()),
            with_album,
        )
    }
}

/// A playlist entry; `position` is 1-based and unique within the playlist.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlaylistItem {
    pub position: u32,
    pub track: TrackRecord,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlaylistRecord {
    pub id: String,
    pub name: String,
    pub artwork_url: Option<String>,
    pub items: Vec<PlaylistItem>,
}

// =============================================================================
// Stored entities
// =============================================================================

/// Artist entity
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Artist {
    pub id: String,
    pub name: String,
    pub artwork_url: Option<String>,
    /// Followed artists are re-ingested by `refresh`.
    pub follow: bool,
    pub hidden: bool,
}

/// Album entity with its artists
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Album {
    pub id: String,
    pub name: String,
    pub album_type: AlbumType,
    pub total_tracks: u32,
    pub release_date: String,
    pub artwork_url: Option<String>,
    pub hidden: bool,
    pub artists: Vec<Artist>,
}

/// Track entity with its album and artists
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Track {
    pub id: String,
    pub name: String,
    pub disc_number: u32,
    pub track_number: u32,
    pub hidden: bool,
    pub explicit: bool,
    pub album: Album,
    pub artists: Vec<Artist>,
}

impl Track {
    pub fn has_artist(&self, artist_id: &str) -> bool {
        self.artists.iter().any(|a| a.id == artist_id)
    }

    pub fn description(&self, with_album: bool) -> String {
        describe(
            &self.name,
            &self.album.name,
            self.album.artists.iter().map(|a| a.name.as_str()),
            self.artists.iter().map(|a| a.name.as_str()),
            with_album,
        )
    }
}

/// Playlist entity; `tracks` is in playlist order.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Playlist {
    pub id: String,
    pub name: String,
    pub artwork_url: Option<String>,
    pub tracks: Vec<Track>,
}

// =============================================================================
// Conversions back to records
// =============================================================================

impl From<&Artist> for ArtistRecord {
    fn from(artist: &Artist) -> Self {
        ArtistRecord {
            id: artist.id.clone(),
            name: artist.name.clone(),
            artwork_url: artist.artwork_url.clone(),
        }
    }
}

impl From<&Album> for AlbumRecord {
    fn from(album: &Album) -> Self {
        AlbumRecord {
            id: album.id.clone(),
            name: album.name.clone(),
            album_type: album.album_type,
            total_tracks: album.total_tracks,
            release_date: ReleaseDate::from_stored(album.release_date.clone()),
            artwork_url: album.artwork_url.clone(),
            artists: album.artists.iter().map(ArtistRecord::from).collect(),
        }
    }
}

impl From<&Track> for TrackRecord {
    fn from(track: &Track) -> Self {
        TrackRecord {
            id: track.id.clone(),
            name: track.name.clone(),
            disc_number: track.disc_number,
            track_number: track.track_number,
            explicit: track.explicit,
            hidden: track.hidden,
            album: AlbumRecord::from(&track.album),
            artists: track.artists.iter().map(ArtistRecord::from).collect(),
        }
    }
}

fn describe<'a>(
    name: &str,
    album_name: &str,
    album_artists: impl Iterator<Item = &'a str>,
    artists: impl Iterator<Item = &'a str>,
    with_album: bool,
) -> String {
    let mut description = name.to_string();
    if with_album {
        let album_artists: Vec<&str> = album_artists.collect();
        description.push_str(&format!(" from {} ({})", album_name, album_artists.join("; ")));
    }
    let artists: Vec<&str> = artists.collect();
    description.push_str(&format!(" by {}", artists.join("; ")));
    description
}
