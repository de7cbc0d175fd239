//! SQLite-backed catalog store.
//!
//! One connection for the lifetime of the process. Every public write runs in
//! its own `BEGIN IMMEDIATE` transaction; the `*_inner` helpers take the
//! connection directly so that nested upserts (a track upserting its album
//! and artists) share the caller's transaction.

use super::error::{StoreError, StoreResult};
use super::models::*;
use super::resolver::{resolve, Resolution};
use super::schema::CATALOG_SCHEMA;
use super::trait_def::CatalogStore;
use rusqlite::types::Type;
use rusqlite::{params, Connection, Params};
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, info, warn};

const TRACK_LISTING_ORDER: &str =
    "ORDER BY al.release_date, al.name, t.track_number, t.disc_number, t.id";

pub struct SqliteCatalogStore {
    conn: Connection,
}

impl SqliteCatalogStore {
    /// Open (creating if needed) the catalog database at `db_path`.
    pub fn open<P: AsRef<Path>>(db_path: P) -> StoreResult<Self> {
        let db_path = db_path.as_ref();
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(db_path)?;
        let store = Self::from_connection(conn)?;
        info!(
            "Opened catalog at {}: {} artists, {} albums, {} tracks, {} playlists",
            db_path.display(),
            store.get_artists_count()?,
            store.get_albums_count()?,
            store.get_tracks_count()?,
            store.get_playlists_count()?
        );
        Ok(store)
    }

    pub fn open_in_memory() -> StoreResult<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> StoreResult<Self> {
        conn.pragma_update(None, "foreign_keys", true)?;
        CATALOG_SCHEMA.open(&conn).map_err(StoreError::Schema)?;
        Ok(Self { conn })
    }

    /// Close the underlying connection, surfacing any error SQLite reports.
    /// Dropping the store also closes it.
    pub fn close(self) -> StoreResult<()> {
        self.conn.close().map_err(|(_, e)| StoreError::Database(e))?;
        debug!("Catalog store closed");
        Ok(())
    }

    fn write<T>(&self, op: impl FnOnce(&Connection) -> StoreResult<T>) -> StoreResult<T> {
        self.conn.execute("BEGIN IMMEDIATE", [])?;
        match op(&self.conn) {
            Ok(value) => {
                self.conn.execute("COMMIT", [])?;
                Ok(value)
            }
            Err(e) => {
                let _ = self.conn.execute("ROLLBACK", []);
                Err(e)
            }
        }
    }

    fn count(&self, table: &str) -> StoreResult<usize> {
        let sql = format!("SELECT COUNT(*) FROM {}", table);
        let count: i64 = self.conn.query_row(&sql, [], |r| r.get(0))?;
        Ok(count as usize)
    }
}

// =============================================================================
// Row parsing
// =============================================================================

fn album_type_column(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<AlbumType> {
    let value: String = row.get(idx)?;
    AlbumType::from_db_str(&value)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn parse_artist_row(row: &rusqlite::Row) -> rusqlite::Result<Artist> {
    Ok(Artist {
        id: row.get(0)?,
        name: row.get(1)?,
        artwork_url: row.get(2)?,
        follow: row.get(3)?,
        hidden: row.get(4)?,
    })
}

fn parse_album_row(row: &rusqlite::Row) -> rusqlite::Result<Album> {
    Ok(Album {
        id: row.get(0)?,
        name: row.get(1)?,
        album_type: album_type_column(row, 2)?,
        total_tracks: row.get(3)?,
        release_date: row.get(4)?,
        artwork_url: row.get(5)?,
        hidden: row.get(6)?,
        artists: Vec::new(),
    })
}

fn missing_row() -> StoreError {
    StoreError::Database(rusqlite::Error::QueryReturnedNoRows)
}

// =============================================================================
// Reads
// =============================================================================

fn exists(conn: &Connection, table: &str, id: &str) -> StoreResult<bool> {
    let exists: bool = conn.query_row(
        &format!("SELECT EXISTS(SELECT 1 FROM {} WHERE id = ?1)", table),
        params![id],
        |r| r.get(0),
    )?;
    Ok(exists)
}

fn query_ids<P: Params>(conn: &Connection, sql: &str, params: P) -> StoreResult<Vec<String>> {
    let mut stmt = conn.prepare_cached(sql)?;
    let ids = stmt
        .query_map(params, |r| r.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(ids)
}

fn load_artists<P: Params>(conn: &Connection, sql: &str, params: P) -> StoreResult<Vec<Artist>> {
    let mut stmt = conn.prepare_cached(sql)?;
    let artists = stmt
        .query_map(params, parse_artist_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(artists)
}

fn load_artist(conn: &Connection, id: &str) -> StoreResult<Option<Artist>> {
    match conn.query_row(
        "SELECT id, name, artwork_url, follow, hidden FROM artists WHERE id = ?1",
        params![id],
        parse_artist_row,
    ) {
        Ok(artist) => Ok(Some(artist)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn load_album(conn: &Connection, id: &str) -> StoreResult<Option<Album>> {
    let mut album = match conn.query_row(
        "SELECT id, name, album_type, total_tracks, release_date, artwork_url, hidden
         FROM albums WHERE id = ?1",
        params![id],
        parse_album_row,
    ) {
        Ok(album) => album,
        Err(rusqlite::Error::QueryReturnedNoRows) => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    album.artists = load_artists(
        conn,
        "SELECT ar.id, ar.name, ar.artwork_url, ar.follow, ar.hidden
         FROM album_artists aa
         INNER JOIN artists ar ON ar.id = aa.artist_id
         WHERE aa.album_id = ?1
         ORDER BY aa.artist_index",
        params![id],
    )?;
    Ok(Some(album))
}

fn load_track(conn: &Connection, id: &str) -> StoreResult<Option<Track>> {
    let row = conn.query_row(
        "SELECT id, album_id, name, disc_number, track_number, hidden, explicit
         FROM tracks WHERE id = ?1",
        params![id],
        |r| {
            Ok((
                r.get::<_, String>(0)?,
                r.get::<_, String>(1)?,
                r.get::<_, String>(2)?,
                r.get::<_, u32>(3)?,
                r.get::<_, u32>(4)?,
                r.get::<_, bool>(5)?,
                r.get::<_, bool>(6)?,
            ))
        },
    );
    let (id, album_id, name, disc_number, track_number, hidden, explicit) = match row {
        Ok(row) => row,
        Err(rusqlite::Error::QueryReturnedNoRows) => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    let album = load_album(conn, &album_id)?.ok_or_else(missing_row)?;
    let artists = load_artists(
        conn,
        "SELECT ar.id, ar.name, ar.artwork_url, ar.follow, ar.hidden
         FROM track_artists ta
         INNER JOIN artists ar ON ar.id = ta.artist_id
         WHERE ta.track_id = ?1
         ORDER BY ta.artist_index",
        params![&id],
    )?;

    Ok(Some(Track {
        id,
        name,
        disc_number,
        track_number,
        hidden,
        explicit,
        album,
        artists,
    }))
}

fn load_tracks<P: Params>(conn: &Connection, sql: &str, params: P) -> StoreResult<Vec<Track>> {
    let mut tracks = Vec::new();
    for id in query_ids(conn, sql, params)? {
        if let Some(track) = load_track(conn, &id)? {
            tracks.push(track);
        }
    }
    Ok(tracks)
}

fn load_playlist(conn: &Connection, id: &str) -> StoreResult<Option<Playlist>> {
    let (id, name, artwork_url) = match conn.query_row(
        "SELECT id, name, artwork_url FROM playlists WHERE id = ?1",
        params![id],
        |r| {
            Ok((
                r.get::<_, String>(0)?,
                r.get::<_, String>(1)?,
                r.get::<_, Option<String>>(2)?,
            ))
        },
    ) {
        Ok(row) => row,
        Err(rusqlite::Error::QueryReturnedNoRows) => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    let tracks = load_tracks(
        conn,
        "SELECT track_id FROM playlist_tracks WHERE playlist_id = ?1 ORDER BY track_order",
        params![&id],
    )?;

    Ok(Some(Playlist {
        id,
        name,
        artwork_url,
        tracks,
    }))
}

// =============================================================================
// Writes
// =============================================================================

fn upsert_artist_inner(
    conn: &Connection,
    record: &ArtistRecord,
    hidden: bool,
    follow: bool,
    replace: bool,
) -> StoreResult<Artist> {
    let existing = load_artist(conn, &record.id)?;
    if resolve(existing.as_ref(), record, replace) == Resolution::Keep {
        if let Some(artist) = existing {
            return Ok(artist);
        }
    }

    conn.execute(
        "INSERT INTO artists (id, name, artwork_url, follow, hidden) VALUES (?1, ?2, ?3, ?4, ?5)
         ON CONFLICT(id) DO UPDATE SET
             name = excluded.name,
             artwork_url = COALESCE(excluded.artwork_url, artists.artwork_url),
             follow = excluded.follow,
             hidden = excluded.hidden",
        params![&record.id, &record.name, &record.artwork_url, follow, hidden],
    )?;
    debug!("Stored artist {} ({})", record.name, record.id);

    load_artist(conn, &record.id)?.ok_or_else(missing_row)
}

fn upsert_album_inner(
    conn: &Connection,
    record: &AlbumRecord,
    hidden: bool,
    replace: bool,
) -> StoreResult<Album> {
    let existing = load_album(conn, &record.id)?;
    if resolve(existing.as_ref(), record, replace) == Resolution::Keep {
        if let Some(album) = existing {
            return Ok(album);
        }
    }

    if record.artists.is_empty() {
        return Err(StoreError::MissingArtists {
            kind: "Album",
            id: record.id.clone(),
        });
    }
    for artist in &record.artists {
        upsert_artist_inner(conn, artist, false, false, false)?;
    }

    conn.execute(
        "INSERT INTO albums (id, name, album_type, total_tracks, release_date, artwork_url, hidden)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
         ON CONFLICT(id) DO UPDATE SET
             name = excluded.name,
             album_type = excluded.album_type,
             total_tracks = excluded.total_tracks,
             release_date = excluded.release_date,
             artwork_url = excluded.artwork_url,
             hidden = excluded.hidden",
        params![
            &record.id,
            &record.name,
            record.album_type.to_db_str(),
            record.total_tracks,
            record.release_date.as_str(),
            &record.artwork_url,
            hidden
        ],
    )?;

    conn.execute(
        "DELETE FROM album_artists WHERE album_id = ?1",
        params![&record.id],
    )?;
    for (index, artist) in record.artists.iter().enumerate() {
        conn.execute(
            "INSERT OR IGNORE INTO album_artists (album_id, artist_id, artist_index) VALUES (?1, ?2, ?3)",
            params![&record.id, &artist.id, index as i64],
        )?;
    }
    debug!("Stored album {} ({})", record.name, record.id);

    load_album(conn, &record.id)?.ok_or_else(missing_row)
}

/// `from_playlist` marks upserts made on behalf of a playlist. A track keeps
/// its `playlist_only` mark until any other upsert touches it.
fn upsert_track_inner(
    conn: &Connection,
    record: &TrackRecord,
    replace: bool,
    from_playlist: bool,
) -> StoreResult<Track> {
    let existing = load_track(conn, &record.id)?;
    if resolve(existing.as_ref(), record, replace) == Resolution::Keep {
        if let Some(track) = existing {
            if !from_playlist {
                conn.execute(
                    "UPDATE tracks SET playlist_only = 0 WHERE id = ?1",
                    params![&record.id],
                )?;
            }
            return Ok(track);
        }
    }

    if record.artists.is_empty() {
        return Err(StoreError::MissingArtists {
            kind: "Track",
            id: record.id.clone(),
        });
    }
    upsert_album_inner(conn, &record.album, false, false)?;
    for artist in &record.artists {
        upsert_artist_inner(conn, artist, false, false, false)?;
    }

    conn.execute(
        "INSERT INTO tracks
             (id, album_id, name, disc_number, track_number, hidden, explicit, playlist_only)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
         ON CONFLICT(id) DO UPDATE SET
             album_id = excluded.album_id,
             name = excluded.name,
             disc_number = excluded.disc_number,
             track_number = excluded.track_number,
             hidden = excluded.hidden,
             explicit = excluded.explicit,
             playlist_only = tracks.playlist_only AND excluded.playlist_only",
        params![
            &record.id,
            &record.album.id,
            &record.name,
            record.disc_number,
            record.track_number,
            record.hidden,
            record.explicit,
            from_playlist
        ],
    )?;

    conn.execute(
        "DELETE FROM track_artists WHERE track_id = ?1",
        params![&record.id],
    )?;
    for (index, artist) in record.artists.iter().enumerate() {
        conn.execute(
            "INSERT OR IGNORE INTO track_artists (track_id, artist_id, artist_index) VALUES (?1, ?2, ?3)",
            params![&record.id, &artist.id, index as i64],
        )?;
    }
    debug!(
        "Stored track {} ({}), hidden={}, explicit={}",
        record.name, record.id, record.hidden, record.explicit
    );

    load_track(conn, &record.id)?.ok_or_else(missing_row)
}

fn upsert_playlist_inner(conn: &Connection, record: &PlaylistRecord) -> StoreResult<Playlist> {
    let mut positions = HashSet::new();
    for item in &record.items {
        if !positions.insert(item.position) {
            return Err(StoreError::DuplicatePlaylistPosition {
                playlist_id: record.id.clone(),
                position: item.position,
            });
        }
    }

    for item in &record.items {
        let track = TrackRecord {
            explicit: false,
            ..item.track.clone()
        };
        upsert_track_inner(conn, &track, false, true)?;
    }

    conn.execute(
        "INSERT INTO playlists (id, name, artwork_url) VALUES (?1, ?2, ?3)
         ON CONFLICT(id) DO UPDATE SET
             name = excluded.name,
             artwork_url = excluded.artwork_url",
        params![&record.id, &record.name, &record.artwork_url],
    )?;
    conn.execute(
        "DELETE FROM playlist_tracks WHERE playlist_id = ?1",
        params![&record.id],
    )?;
    for item in &record.items {
        conn.execute(
            "INSERT INTO playlist_tracks (playlist_id, track_id, track_order) VALUES (?1, ?2, ?3)",
            params![&record.id, &item.track.id, item.position],
        )?;
    }

    load_playlist(conn, &record.id)?.ok_or_else(missing_row)
}

// =============================================================================
// CatalogStore
// =============================================================================

impl CatalogStore for SqliteCatalogStore {
    fn get_track(&self, id: &str) -> StoreResult<Option<Track>> {
        load_track(&self.conn, id)
    }

    fn get_album(&self, id: &str) -> StoreResult<Option<Album>> {
        load_album(&self.conn, id)
    }

    fn get_artist(&self, id: &str) -> StoreResult<Option<Artist>> {
        load_artist(&self.conn, id)
    }

    fn get_playlist(&self, id: &str) -> StoreResult<Option<Playlist>> {
        load_playlist(&self.conn, id)
    }

    fn get_all_tracks(&self) -> StoreResult<Vec<Track>> {
        load_tracks(
            &self.conn,
            &format!(
                "SELECT t.id FROM tracks t INNER JOIN albums al ON al.id = t.album_id {}",
                TRACK_LISTING_ORDER
            ),
            [],
        )
    }

    fn get_all_albums(&self) -> StoreResult<Vec<Album>> {
        let mut albums = Vec::new();
        for id in query_ids(&self.conn, "SELECT id FROM albums ORDER BY release_date, name", [])? {
            if let Some(album) = load_album(&self.conn, &id)? {
                albums.push(album);
            }
        }
        Ok(albums)
    }

    fn get_all_artists(&self) -> StoreResult<Vec<Artist>> {
        load_artists(
            &self.conn,
            "SELECT id, name, artwork_url, follow, hidden FROM artists ORDER BY name, id",
            [],
        )
    }

    fn get_all_playlists(&self) -> StoreResult<Vec<Playlist>> {
        let mut playlists = Vec::new();
        for id in query_ids(&self.conn, "SELECT id FROM playlists ORDER BY name, id", [])? {
            if let Some(playlist) = load_playlist(&self.conn, &id)? {
                playlists.push(playlist);
            }
        }
        Ok(playlists)
    }

    fn get_artist_tracks(&self, artist_id: &str) -> StoreResult<Vec<Track>> {
        load_tracks(
            &self.conn,
            &format!(
                "SELECT t.id FROM tracks t
                 INNER JOIN albums al ON al.id = t.album_id
                 INNER JOIN track_artists ta ON ta.track_id = t.id
                 WHERE ta.artist_id = ?1 {}",
                TRACK_LISTING_ORDER
            ),
            params![artist_id],
        )
    }

    fn get_album_tracks(&self, album_id: &str) -> StoreResult<Vec<Track>> {
        load_tracks(
            &self.conn,
            "SELECT id FROM tracks WHERE album_id = ?1 ORDER BY disc_number, track_number",
            params![album_id],
        )
    }

    fn get_visible_tracks(&self) -> StoreResult<Vec<Track>> {
        load_tracks(
            &self.conn,
            &format!(
                "SELECT t.id FROM tracks t INNER JOIN albums al ON al.id = t.album_id
                 WHERE t.hidden = 0 {}",
                TRACK_LISTING_ORDER
            ),
            [],
        )
    }

    fn get_followed_artists(&self) -> StoreResult<Vec<Artist>> {
        load_artists(
            &self.conn,
            "SELECT id, name, artwork_url, follow, hidden FROM artists
             WHERE follow = 1 AND hidden = 0 ORDER BY name, id",
            [],
        )
    }

    fn get_artists_count(&self) -> StoreResult<usize> {
        self.count("artists")
    }

    fn get_albums_count(&self) -> StoreResult<usize> {
        self.count("albums")
    }

    fn get_tracks_count(&self) -> StoreResult<usize> {
        self.count("tracks")
    }

    fn get_playlists_count(&self) -> StoreResult<usize> {
        self.count("playlists")
    }

    fn upsert_track(&self, track: &TrackRecord, replace: bool) -> StoreResult<Track> {
        self.write(|conn| upsert_track_inner(conn, track, replace, false))
    }

    fn upsert_album(
        &self,
        album: &AlbumRecord,
        hidden: bool,
        replace: bool,
    ) -> StoreResult<Album> {
        self.write(|conn| upsert_album_inner(conn, album, hidden, replace))
    }

    fn upsert_artist(
        &self,
        artist: &ArtistRecord,
        hidden: bool,
        follow: bool,
        replace: bool,
    ) -> StoreResult<Artist> {
        self.write(|conn| upsert_artist_inner(conn, artist, hidden, follow, replace))
    }

    fn upsert_playlist(&self, playlist: &PlaylistRecord) -> StoreResult<Playlist> {
        let stored = self.write(|conn| upsert_playlist_inner(conn, playlist))?;
        info!(
            "Stored playlist {} ({}) with {} tracks",
            stored.name,
            stored.id,
            stored.tracks.len()
        );
        Ok(stored)
    }

    fn remove_track(&self, id: &str, delete: bool) -> StoreResult<bool> {
        self.write(|conn| {
            if !exists(conn, "tracks", id)? {
                return Ok(false);
            }
            if delete {
                conn.execute("DELETE FROM tracks WHERE id = ?1", params![id])?;
                info!("Deleted track {}", id);
            } else {
                conn.execute("UPDATE tracks SET hidden = 1 WHERE id = ?1", params![id])?;
                info!("Hid track {}", id);
            }
            Ok(true)
        })
    }

    fn remove_album(&self, id: &str, delete: bool) -> StoreResult<bool> {
        self.write(|conn| {
            if !exists(conn, "albums", id)? {
                return Ok(false);
            }
            if !delete {
                conn.execute("UPDATE albums SET hidden = 1 WHERE id = ?1", params![id])?;
                let hidden = conn.execute(
                    "UPDATE tracks SET hidden = 1 WHERE album_id = ?1 AND hidden = 0",
                    params![id],
                )?;
                info!("Hid album {} and {} of its tracks", id, hidden);
                return Ok(true);
            }

            let visible: i64 = conn.query_row(
                "SELECT COUNT(*) FROM tracks WHERE album_id = ?1 AND hidden = 0",
                params![id],
                |r| r.get(0),
            )?;
            if visible > 0 {
                warn!(
                    "Refusing to delete album {}: {} visible tracks still reference it",
                    id, visible
                );
                return Ok(false);
            }
            conn.execute("DELETE FROM tracks WHERE album_id = ?1", params![id])?;
            conn.execute("DELETE FROM albums WHERE id = ?1", params![id])?;
            info!("Deleted album {}", id);
            Ok(true)
        })
    }

    fn remove_playlist(&self, id: &str, delete: bool) -> StoreResult<bool> {
        self.write(|conn| {
            if !exists(conn, "playlists", id)? {
                return Ok(false);
            }
            if delete {
                conn.execute("DELETE FROM playlists WHERE id = ?1", params![id])?;
                info!("Deleted playlist {}", id);
            } else {
                let hidden = conn.execute(
                    "UPDATE tracks SET hidden = 1
                     WHERE playlist_only = 1
                       AND id IN (SELECT track_id FROM playlist_tracks WHERE playlist_id = ?1)
                       AND id NOT IN (SELECT track_id FROM playlist_tracks WHERE playlist_id <> ?1)
                       AND id NOT IN (
                           SELECT ta.track_id FROM track_artists ta
                           INNER JOIN artists ar ON ar.id = ta.artist_id
                           WHERE ar.follow = 1
                       )",
                    params![id],
                )?;
                info!("Hid {} tracks only referenced by playlist {}", hidden, id);
            }
            Ok(true)
        })
    }
}
