//! Shared constants for end-to-end tests

// ============================================================================
// Test Catalog IDs
// ============================================================================

/// The artist being ingested in most tests
pub const ARTIST_ID: &str = "artist-main";

pub const ARTIST_NAME: &str = "The Test Band";

/// An artist the main one collaborates with
pub const GUEST_ID: &str = "artist-guest";

pub const GUEST_NAME: &str = "Guest Singer";

// ============================================================================
// Playlist
// ============================================================================

pub const PLAYLIST_ID: &str = "playlist-1";

pub const PLAYLIST_NAME: &str = "Road Trip";
