use thiserror::Error;

/// Errors raised by the catalog store.
///
/// Read misses are not errors (`Ok(None)`), and integrity failures on removal
/// are reported as `Ok(false)`; what remains here are storage failures and
/// records that cannot be stored at all.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Schema error: {0}")]
    Schema(anyhow::Error),

    #[error("Invalid release date '{value}' for precision '{precision}'")]
    InvalidReleaseDate { value: String, precision: String },

    #[error("Unknown release date precision '{0}'")]
    UnknownPrecision(String),

    #[error("Unknown album type '{0}'")]
    UnknownAlbumType(String),

    #[error("{kind} '{id}' has no artists")]
    MissingArtists { kind: &'static str, id: String },

    #[error("Playlist '{playlist_id}' has more than one track at position {position}")]
    DuplicatePlaylistPosition { playlist_id: String, position: u32 },
}

pub type StoreResult<T> = Result<T, StoreError>;
