//! Record builders and a file-backed temporary store.

use super::constants::*;
use melody_catalog::catalog_store::{
    AlbumRecord, AlbumType, ArtistRecord, ReleaseDate, ReleaseDatePrecision, SqliteCatalogStore,
    TrackRecord,
};
use std::ops::Deref;
use std::path::PathBuf;
use tempfile::TempDir;

/// A catalog store in a temporary directory, removed on drop.
pub struct TestStore {
    store: SqliteCatalogStore,
    pub db_path: PathBuf,
    dir: TempDir,
}

impl TestStore {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let db_path = dir.path().join("catalog").join("melody.db");
        let store = SqliteCatalogStore::open(&db_path).unwrap();
        Self {
            store,
            db_path,
            dir,
        }
    }

    /// Close the database and open it again from disk.
    pub fn reopen(self) -> Self {
        let TestStore {
            store,
            db_path,
            dir,
        } = self;
        store.close().unwrap();
        let store = SqliteCatalogStore::open(&db_path).unwrap();
        Self {
            store,
            db_path,
            dir,
        }
    }
}

impl Deref for TestStore {
    type Target = SqliteCatalogStore;

    fn deref(&self) -> &Self::Target {
        &self.store
    }
}

pub fn artist(id: &str, name: &str) -> ArtistRecord {
    ArtistRecord {
        id: id.to_string(),
        name: name.to_string(),
        artwork_url: None,
    }
}

/// Album by the main test artist.
pub fn album(id: &str, name: &str, album_type: AlbumType, date: &str) -> AlbumRecord {
    album_by(id, name, album_type, date, &[artist(ARTIST_ID, ARTIST_NAME)])
}

pub fn album_by(
    id: &str,
    name: &str,
    album_type: AlbumType,
    date: &str,
    artists: &[ArtistRecord],
) -> AlbumRecord {
    AlbumRecord {
        id: id.to_string(),
        name: name.to_string(),
        album_type,
        total_tracks: 0,
        release_date: ReleaseDate::new(date, ReleaseDatePrecision::Day).unwrap(),
        artwork_url: Some(format!("https://img.test/{}", id)),
        artists: artists.to_vec(),
    }
}

/// Track by the main test artist.
pub fn track(id: &str, name: &str, album: &AlbumRecord, number: u32) -> TrackRecord {
    track_by(id, name, album, number, &[artist(ARTIST_ID, ARTIST_NAME)])
}

pub fn track_by(
    id: &str,
    name: &str,
    album: &AlbumRecord,
    number: u32,
    artists: &[ArtistRecord],
) -> TrackRecord {
    TrackRecord {
        id: id.to_string(),
        name: name.to_string(),
        disc_number: 1,
        track_number: number,
        explicit: false,
        hidden: false,
        album: album.clone(),
        artists: artists.to_vec(),
    }
}
