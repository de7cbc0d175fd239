//! Artist reconciliation: classify every newly fetched track of an artist
//! against what the cache already holds.
//!
//! The output has three groups:
//! - `existing`: cached tracks whose visibility changes (singles superseded
//!   by an album release), carried with their new `hidden` flag.
//! - `add`: new tracks to store, each with its decided `hidden` flag.
//! - `skip`: new tracks that duplicate something already present.
//!
//! Duplicates are detected by exact track name. Unrelated songs sharing a
//! title collide; the review step exists to catch those.
//!
//! Album and compilation tracks hide cached visible singles, but within one
//! batch a single is decided before a compilation and keeps the compilation
//! track hidden. A single cached before its compilation is fetched ends up
//! hidden; the same pair fetched together keeps the single visible.

use crate::catalog_store::{AlbumType, Artist, Track, TrackRecord};
use std::cmp::Ordering;
use std::collections::HashSet;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReconciliationPlan {
    pub artist: Artist,
    pub existing: Vec<TrackRecord>,
    pub add: Vec<TrackRecord>,
    pub skip: Vec<TrackRecord>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Reconciliation {
    /// Every track of the artist is already cached.
    NoNewTracks,
    Plan(ReconciliationPlan),
}

/// Order used for precedence decisions: release type first, then release
/// date. Sorting with it must be stable so that ties keep catalog order.
fn precedence_order(a: &TrackRecord, b: &TrackRecord) -> Ordering {
    a.album
        .album_type
        .precedence_rank()
        .cmp(&b.album.album_type.precedence_rank())
        .then_with(|| a.album.release_date.cmp(&b.album.release_date))
}

/// Order used for presenting and listing tracks.
pub fn listing_order(a: &TrackRecord, b: &TrackRecord) -> Ordering {
    a.album
        .release_date
        .cmp(&b.album.release_date)
        .then_with(|| a.album.name.cmp(&b.album.name))
        .then_with(|| a.track_number.cmp(&b.track_number))
}

/// Tracks already cached for the artist plus the additions decided so far.
fn known<'a>(
    cached: &'a [TrackRecord],
    add: &'a [TrackRecord],
) -> impl Iterator<Item = &'a TrackRecord> {
    cached.iter().chain(add.iter())
}

/// Reconcile `candidates` (tracks of every album attributed to the artist)
/// against the artist's cached tracks.
pub fn reconcile_artist(
    artist: &Artist,
    candidates: Vec<TrackRecord>,
    existing: &[Track],
) -> Reconciliation {
    let mut cached: Vec<TrackRecord> = existing.iter().map(TrackRecord::from).collect();
    let cached_ids: HashSet<&str> = existing.iter().map(|t| t.id.as_str()).collect();

    let mut seen = HashSet::new();
    let (mut primary, mut other): (Vec<TrackRecord>, Vec<TrackRecord>) = candidates
        .into_iter()
        .filter(|t| t.has_artist(&artist.id) && !cached_ids.contains(t.id.as_str()))
        .filter(|t| seen.insert(t.id.clone()))
        .partition(|t| t.has_album_artist(&artist.id));

    if primary.is_empty() && other.is_empty() {
        return Reconciliation::NoNewTracks;
    }

    primary.sort_by(precedence_order);
    other.sort_by(precedence_order);

    let mut modified: Vec<usize> = Vec::new();
    let mut add: Vec<TrackRecord> = Vec::new();

    for mut track in primary {
        match track.album.album_type {
            AlbumType::Album | AlbumType::Compilation => {
                for (index, cached_track) in cached.iter_mut().enumerate() {
                    if cached_track.name == track.name
                        && cached_track.album.album_type == AlbumType::Single
                        && !cached_track.hidden
                    {
                        cached_track.hidden = true;
                        modified.push(index);
                    }
                }
                // A compilation never shadows a visible release of lower rank.
                if track.album.album_type == AlbumType::Compilation {
                    let rank = track.album.album_type.precedence_rank();
                    track.hidden = known(&cached, &add).any(|t| {
                        t.name == track.name
                            && !t.hidden
                            && t.album.album_type.precedence_rank() < rank
                    });
                }
            }
            AlbumType::Single => {
                let on_full_release = known(&cached, &add)
                    .any(|t| t.name == track.name && t.album.album_type.is_full_release());
                let earlier_single = known(&cached, &add)
                    .any(|t| t.name == track.name && t.album.album_type == AlbumType::Single);
                track.hidden = on_full_release || earlier_single;
            }
            AlbumType::AppearsOn => {}
        }
        add.push(track);
    }

    let mut skip: Vec<TrackRecord> = Vec::new();
    for track in other {
        if known(&cached, &add).any(|t| t.name == track.name) {
            skip.push(track);
        } else {
            add.push(track);
        }
    }

    let mut existing: Vec<TrackRecord> = modified.into_iter().map(|i| cached[i].clone()).collect();
    existing.sort_by(listing_order);
    add.sort_by(listing_order);
    skip.sort_by(listing_order);

    Reconciliation::Plan(ReconciliationPlan {
        artist: artist.clone(),
        existing,
        add,
        skip,
    })
}
