//! SQLite schema definitions for the catalog cache.
//!
//! Entities are stored once, keyed by their catalog ID. Many-to-many
//! relationships live in junction tables; the position columns keep the
//! catalog's artist order and the playlist track order.

use crate::sqlite_column;
use crate::sqlite_persistence::{
    Column, ForeignKey, ForeignKeyOnChange, SqlType, Table, VersionedSchema,
};

// =============================================================================
// Foreign keys
// =============================================================================

const ARTIST_FK: ForeignKey = ForeignKey {
    foreign_table: "artists",
    foreign_column: "id",
    on_delete: ForeignKeyOnChange::Restrict,
};

const ALBUM_FK: ForeignKey = ForeignKey {
    foreign_table: "albums",
    foreign_column: "id",
    on_delete: ForeignKeyOnChange::Restrict,
};

const OWNING_ALBUM_FK: ForeignKey = ForeignKey {
    foreign_table: "albums",
    foreign_column: "id",
    on_delete: ForeignKeyOnChange::Cascade,
};

const OWNING_TRACK_FK: ForeignKey = ForeignKey {
    foreign_table: "tracks",
    foreign_column: "id",
    on_delete: ForeignKeyOnChange::Cascade,
};

const OWNING_PLAYLIST_FK: ForeignKey = ForeignKey {
    foreign_table: "playlists",
    foreign_column: "id",
    on_delete: ForeignKeyOnChange::Cascade,
};

// =============================================================================
// Core tables
// =============================================================================

const ARTISTS_TABLE: Table = Table {
    name: "artists",
    columns: &[
        sqlite_column!("id", &SqlType::Text, is_primary_key = true, non_null = true),
        sqlite_column!("name", &SqlType::Text, non_null = true),
        sqlite_column!("artwork_url", &SqlType::Text),
        sqlite_column!("follow", &SqlType::Integer, non_null = true, default_value = Some("0")),
        sqlite_column!("hidden", &SqlType::Integer, non_null = true, default_value = Some("0")),
    ],
    indices: &[],
    unique_constraints: &[],
};

const ALBUMS_TABLE: Table = Table {
    name: "albums",
    columns: &[
        sqlite_column!("id", &SqlType::Text, is_primary_key = true, non_null = true),
        sqlite_column!("name", &SqlType::Text, non_null = true),
        sqlite_column!("album_type", &SqlType::Text, non_null = true), // 'album', 'single', 'compilation', 'appears_on'
        sqlite_column!("total_tracks", &SqlType::Integer, non_null = true),
        sqlite_column!("release_date", &SqlType::Text, non_null = true), // always 'YYYY-MM-DD'
        sqlite_column!("artwork_url", &SqlType::Text),
        sqlite_column!("hidden", &SqlType::Integer, non_null = true, default_value = Some("0")),
    ],
    indices: &[],
    unique_constraints: &[],
};

const TRACKS_TABLE: Table = Table {
    name: "tracks",
    columns: &[
        sqlite_column!("id", &SqlType::Text, is_primary_key = true, non_null = true),
        sqlite_column!(
            "album_id",
            &SqlType::Text,
            non_null = true,
            foreign_key = Some(&ALBUM_FK)
        ),
        sqlite_column!("name", &SqlType::Text, non_null = true),
        sqlite_column!("disc_number", &SqlType::Integer, non_null = true),
        sqlite_column!("track_number", &SqlType::Integer, non_null = true),
        sqlite_column!("hidden", &SqlType::Integer, non_null = true, default_value = Some("0")),
        sqlite_column!("explicit", &SqlType::Integer, non_null = true, default_value = Some("0")),
        // 1 while the track has only ever been stored as a playlist member
        sqlite_column!(
            "playlist_only",
            &SqlType::Integer,
            non_null = true,
            default_value = Some("0")
        ),
    ],
    indices: &[("idx_tracks_album", "album_id"), ("idx_tracks_name", "name")],
    unique_constraints: &[],
};

const PLAYLISTS_TABLE: Table = Table {
    name: "playlists",
    columns: &[
        sqlite_column!("id", &SqlType::Text, is_primary_key = true, non_null = true),
        sqlite_column!("name", &SqlType::Text, non_null = true),
        sqlite_column!("artwork_url", &SqlType::Text),
    ],
    indices: &[],
    unique_constraints: &[],
};

// =============================================================================
// Junction tables
// =============================================================================

/// Album <-> Artist, `artist_index` is the catalog's credit order.
const ALBUM_ARTISTS_TABLE: Table = Table {
    name: "album_artists",
    columns: &[
        sqlite_column!(
            "album_id",
            &SqlType::Text,
            non_null = true,
            foreign_key = Some(&OWNING_ALBUM_FK)
        ),
        sqlite_column!(
            "artist_id",
            &SqlType::Text,
            non_null = true,
            foreign_key = Some(&ARTIST_FK)
        ),
        sqlite_column!("artist_index", &SqlType::Integer, non_null = true),
    ],
    indices: &[("idx_album_artists_artist", "artist_id")],
    unique_constraints: &[&["album_id", "artist_id"]],
};

/// Track <-> Artist, `artist_index` is the catalog's credit order.
const TRACK_ARTISTS_TABLE: Table = Table {
    name: "track_artists",
    columns: &[
        sqlite_column!(
            "track_id",
            &SqlType::Text,
            non_null = true,
            foreign_key = Some(&OWNING_TRACK_FK)
        ),
        sqlite_column!(
            "artist_id",
            &SqlType::Text,
            non_null = true,
            foreign_key = Some(&ARTIST_FK)
        ),
        sqlite_column!("artist_index", &SqlType::Integer, non_null = true),
    ],
    indices: &[("idx_track_artists_artist", "artist_id")],
    unique_constraints: &[&["track_id", "artist_id"]],
};

/// Playlist <-> Track with 1-based position.
const PLAYLIST_TRACKS_TABLE: Table = Table {
    name: "playlist_tracks",
    columns: &[
        sqlite_column!(
            "playlist_id",
            &SqlType::Text,
            non_null = true,
            foreign_key = Some(&OWNING_PLAYLIST_FK)
        ),
        sqlite_column!(
            "track_id",
            &SqlType::Text,
            non_null = true,
            foreign_key = Some(&OWNING_TRACK_FK)
        ),
        sqlite_column!("track_order", &SqlType::Integer, non_null = true),
    ],
    indices: &[("idx_playlist_tracks_track", "track_id")],
    unique_constraints: &[&["playlist_id", "track_order"]],
};

// =============================================================================
// Versioned Schema Definition
// =============================================================================

pub const CATALOG_SCHEMA: VersionedSchema = VersionedSchema {
    version: 0,
    tables: &[
        ARTISTS_TABLE,
        ALBUMS_TABLE,
        TRACKS_TABLE,
        PLAYLISTS_TABLE,
        ALBUM_ARTISTS_TABLE,
        TRACK_ARTISTS_TABLE,
        PLAYLIST_TRACKS_TABLE,
    ],
};
