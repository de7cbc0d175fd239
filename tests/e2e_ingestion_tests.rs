//! End-to-end tests for ingestion
//!
//! Runs the ingestion workflows against an in-memory catalog and a
//! file-backed store: artist reconciliation, review, chunking and paging.

mod common;

use common::{
    album, album_by, artist, track, track_by, FakeCatalog, TestStore, ARTIST_ID, ARTIST_NAME,
    GUEST_ID, GUEST_NAME, PLAYLIST_ID,
};
use melody_catalog::catalog_client::ClientError;
use melody_catalog::catalog_store::{AlbumType, CatalogStore, TrackRecord};
use melody_catalog::ingestion::{ArtistIngestion, IngestionConfig, IngestionError, Ingestor};
use melody_catalog::reconciliation::{
    AcceptAll, Action, Decision, ReconciliationPlan, ReviewError, Reviewer,
};

/// Returns fixed decisions and keeps every plan it was shown.
struct ScriptedReviewer {
    decisions: Vec<Decision>,
    plans: Vec<ReconciliationPlan>,
}

impl ScriptedReviewer {
    fn new(decisions: Vec<Decision>) -> Self {
        Self {
            decisions,
            plans: Vec::new(),
        }
    }
}

impl Reviewer for ScriptedReviewer {
    fn review(&mut self, plan: &ReconciliationPlan) -> Result<Vec<Decision>, ReviewError> {
        self.plans.push(plan.clone());
        Ok(self.decisions.clone())
    }
}

struct AbortingReviewer;

impl Reviewer for AbortingReviewer {
    fn review(&mut self, _plan: &ReconciliationPlan) -> Result<Vec<Decision>, ReviewError> {
        Err(ReviewError::Aborted("editor exited with 1".to_string()))
    }
}

fn ids(tracks: &[TrackRecord]) -> Vec<&str> {
    tracks.iter().map(|t| t.id.as_str()).collect()
}

/// Catalog with a single, an album re-releasing it and a compilation.
fn best_of_catalog() -> FakeCatalog {
    let single = album("al-single", "Song", AlbumType::Single, "2019-03-01");
    let best_of = album("al-best", "Best Of", AlbumType::Album, "2020-06-01");
    let hits = album("al-hits", "Greatest Hits", AlbumType::Compilation, "2022-01-01");

    let mut catalog = FakeCatalog::new();
    catalog.add_album(single.clone(), vec![track("s-song", "Song", &single, 1)]);
    catalog.add_album(
        best_of.clone(),
        vec![
            track("b-song", "Song", &best_of, 1),
            track("b-new", "New", &best_of, 2),
        ],
    );
    catalog.add_album(hits.clone(), vec![track("c-new", "New", &hits, 1)]);
    catalog
}

// =============================================================================
// Artist Reconciliation
// =============================================================================

#[test]
fn test_best_of_supersedes_cached_single() {
    let store = TestStore::new();
    let catalog = best_of_catalog();
    let ingestor = Ingestor::new(&*store, &catalog, IngestionConfig::default());
    ingestor
        .ingest_tracks(&["s-song".to_string()], false)
        .unwrap();

    let result = ingestor.ingest_artist(ARTIST_ID, &mut AcceptAll).unwrap();

    let ArtistIngestion::Applied { artist, tracks } = result else {
        panic!("expected applied tracks");
    };
    assert!(artist.follow);
    assert_eq!(tracks.len(), 4);
    assert!(tracks.iter().any(|a| a.existing && a.track.id == "s-song"));

    assert!(store.get_track("s-song").unwrap().unwrap().hidden);
    assert!(!store.get_track("b-song").unwrap().unwrap().hidden);
    assert!(!store.get_track("b-new").unwrap().unwrap().hidden);
    assert!(store.get_track("c-new").unwrap().unwrap().hidden);

    let visible: Vec<String> = store
        .get_visible_tracks()
        .unwrap()
        .into_iter()
        .map(|t| t.id)
        .collect();
    assert_eq!(visible, vec!["b-song", "b-new"]);
}

#[test]
fn test_second_ingest_has_no_new_tracks() {
    let store = TestStore::new();
    let catalog = best_of_catalog();
    let ingestor = Ingestor::new(&*store, &catalog, IngestionConfig::default());

    ingestor.ingest_artist(ARTIST_ID, &mut AcceptAll).unwrap();
    let result = ingestor.ingest_artist(ARTIST_ID, &mut AcceptAll).unwrap();

    assert!(matches!(result, ArtistIngestion::NoNewTracks(_)));
    assert_eq!(result.artist().name, ARTIST_NAME);
}

#[test]
fn test_reviewer_sees_plan_and_only_confirmed_tracks_are_stored() {
    let store = TestStore::new();
    let catalog = best_of_catalog();
    let ingestor = Ingestor::new(&*store, &catalog, IngestionConfig::default());
    let mut reviewer = ScriptedReviewer::new(vec![
        Decision::new("b-new", Action::Hide),
        Decision::new("c-new", Action::Skip),
    ]);

    let result = ingestor.ingest_artist(ARTIST_ID, &mut reviewer).unwrap();

    assert_eq!(reviewer.plans.len(), 1);
    let plan = &reviewer.plans[0];
    assert!(plan.existing.is_empty());
    assert_eq!(ids(&plan.add), vec!["s-song", "b-song", "b-new", "c-new"]);
    assert!(plan.skip.is_empty());

    let ArtistIngestion::Applied { tracks, .. } = result else {
        panic!("expected applied tracks");
    };
    assert_eq!(tracks.len(), 1);
    assert!(store.get_track("b-new").unwrap().unwrap().hidden);
    assert_eq!(store.get_tracks_count().unwrap(), 1);
    // The artist is followed even when nothing else is confirmed.
    assert_eq!(store.get_followed_artists().unwrap().len(), 1);
}

#[test]
fn test_aborted_review_stores_nothing_but_the_artist() {
    let store = TestStore::new();
    let catalog = best_of_catalog();
    let ingestor = Ingestor::new(&*store, &catalog, IngestionConfig::default());

    let result = ingestor.ingest_artist(ARTIST_ID, &mut AbortingReviewer);

    assert!(matches!(
        result,
        Err(IngestionError::Review(ReviewError::Aborted(_)))
    ));
    assert_eq!(store.get_tracks_count().unwrap(), 0);
    assert!(store.get_artist(ARTIST_ID).unwrap().unwrap().follow);
}

#[test]
fn test_features_are_added_unless_already_known() {
    let store = TestStore::new();
    let own = album("al-own", "Own Record", AlbumType::Album, "2018-01-01");
    let guest = artist(GUEST_ID, GUEST_NAME);
    let main = artist(ARTIST_ID, ARTIST_NAME);
    let guest_album = album_by(
        "al-guest",
        "Guest Record",
        AlbumType::Album,
        "2019-01-01",
        &[guest.clone()],
    );

    let mut catalog = FakeCatalog::new();
    catalog.add_album(own.clone(), vec![track("o-song", "Song", &own, 1)]);
    catalog.add_album(
        guest_album.clone(),
        vec![
            track_by("g-duet", "Duet", &guest_album, 1, &[guest.clone(), main.clone()]),
            track_by("g-song", "Song", &guest_album, 2, &[guest.clone(), main]),
            track_by("g-solo", "Solo", &guest_album, 3, &[guest]),
        ],
    );
    let ingestor = Ingestor::new(&*store, &catalog, IngestionConfig::default());
    let mut reviewer = ScriptedReviewer::new(Vec::new());

    ingestor.ingest_artist(ARTIST_ID, &mut reviewer).unwrap();

    let plan = &reviewer.plans[0];
    assert_eq!(ids(&plan.add), vec!["o-song", "g-duet"]);
    assert_eq!(ids(&plan.skip), vec!["g-song"]);
}

#[test]
fn test_refresh_continues_past_unavailable_artist() {
    let store = TestStore::new();
    let mut catalog = best_of_catalog();
    let other = album_by(
        "al-guest",
        "Guest Record",
        AlbumType::Album,
        "2019-01-01",
        &[artist(GUEST_ID, GUEST_NAME)],
    );
    catalog.add_album(
        other.clone(),
        vec![track_by("g-1", "One", &other, 1, &[artist(GUEST_ID, GUEST_NAME)])],
    );
    {
        let ingestor = Ingestor::new(&*store, &catalog, IngestionConfig::default());
        ingestor.ingest_artist(ARTIST_ID, &mut AcceptAll).unwrap();
        ingestor.ingest_artist(GUEST_ID, &mut AcceptAll).unwrap();
    }

    catalog.make_unavailable(ARTIST_ID);
    let ingestor = Ingestor::new(&*store, &catalog, IngestionConfig::default());
    let results = ingestor.refresh_followed_artists(&mut AcceptAll).unwrap();

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].artist().id, GUEST_ID);
    assert!(matches!(results[0], ArtistIngestion::NoNewTracks(_)));
}

#[test]
fn test_unknown_artist_is_a_client_error() {
    let store = TestStore::new();
    let catalog = FakeCatalog::new();
    let ingestor = Ingestor::new(&*store, &catalog, IngestionConfig::default());

    let result = ingestor.ingest_artist("nobody", &mut AcceptAll);

    assert!(matches!(
        result,
        Err(IngestionError::Client(ClientError::NotFound { kind: "artist", .. }))
    ));
    assert_eq!(store.get_artists_count().unwrap(), 0);
}

// =============================================================================
// Chunking & Paging
// =============================================================================

#[test]
fn test_artist_ingestion_pages_and_chunks_requests() {
    let store = TestStore::new();
    let mut catalog = FakeCatalog::new().with_embedded_tracks(2);
    let long = album("al-long", "Long Record", AlbumType::Album, "2015-01-01");
    catalog.add_album(
        long.clone(),
        (1..=5)
            .map(|n| track(&format!("long-{}", n), &format!("Long {}", n), &long, n))
            .collect(),
    );
    for n in 1..=6 {
        let single = album(
            &format!("al-single-{}", n),
            &format!("Single {}", n),
            AlbumType::Single,
            &format!("2016-01-0{}", n),
        );
        catalog.add_album(
            single.clone(),
            vec![track(&format!("single-{}", n), &format!("Single {}", n), &single, 1)],
        );
    }
    let config = IngestionConfig {
        page_size: 3,
        album_chunk_size: 2,
        track_chunk_size: 50,
    };
    let ingestor = Ingestor::new(&*store, &catalog, config);

    ingestor.ingest_artist(ARTIST_ID, &mut AcceptAll).unwrap();

    assert_eq!(store.get_tracks_count().unwrap(), 11);
    let requests = catalog.requests();
    let album_pages: Vec<&String> = requests
        .iter()
        .filter(|r| r.starts_with("artist_albums"))
        .collect();
    assert_eq!(
        album_pages,
        vec![
            &format!("artist_albums {} 3 0", ARTIST_ID),
            &format!("artist_albums {} 3 3", ARTIST_ID),
            &format!("artist_albums {} 3 6", ARTIST_ID),
        ]
    );
    let batches: Vec<&String> = requests.iter().filter(|r| r.starts_with("albums ")).collect();
    assert_eq!(batches, vec!["albums 2", "albums 2", "albums 2", "albums 1"]);
    let track_pages: Vec<&String> = requests
        .iter()
        .filter(|r| r.starts_with("album_tracks"))
        .collect();
    assert_eq!(track_pages, vec!["album_tracks al-long 3 2"]);
}

#[test]
fn test_ingest_tracks_in_chunks_and_force_unhides() {
    let store = TestStore::new();
    let record = album("al-big", "Big Record", AlbumType::Album, "2020-01-01");
    let mut catalog = FakeCatalog::new();
    catalog.add_album(
        record.clone(),
        (1..=120)
            .map(|n| track(&format!("t-{}", n), &format!("Track {}", n), &record, n))
            .collect(),
    );
    let track_ids: Vec<String> = (1..=120).map(|n| format!("t-{}", n)).collect();
    let ingestor = Ingestor::new(&*store, &catalog, IngestionConfig::default());

    let stored = ingestor.ingest_tracks(&track_ids, false).unwrap();
    assert_eq!(stored.len(), 120);
    let batches: Vec<String> = catalog
        .requests()
        .into_iter()
        .filter(|r| r.starts_with("tracks"))
        .collect();
    assert_eq!(batches, vec!["tracks 50", "tracks 50", "tracks 20"]);

    store.remove_track("t-7", false).unwrap();
    let again = ingestor.ingest_tracks(&["t-7".to_string()], false).unwrap();
    assert!(again[0].hidden);
    let forced = ingestor.ingest_tracks(&["t-7".to_string()], true).unwrap();
    assert!(!forced[0].hidden);
    let singles = catalog
        .requests()
        .into_iter()
        .filter(|r| r == "track t-7")
        .count();
    assert_eq!(singles, 2);
}

#[test]
fn test_unknown_single_ids_are_left_out() {
    let store = TestStore::new();
    let catalog = FakeCatalog::new();
    let ingestor = Ingestor::new(&*store, &catalog, IngestionConfig::default());

    assert!(ingestor
        .ingest_tracks(&["missing".to_string()], false)
        .unwrap()
        .is_empty());
    assert!(ingestor
        .ingest_albums(&["missing".to_string()])
        .unwrap()
        .is_empty());
    assert_eq!(catalog.requests(), vec!["track missing", "album missing"]);
}

#[test]
fn test_ingest_albums_stores_every_page_of_tracks() {
    let store = TestStore::new();
    let record = album("al-1", "Record", AlbumType::Album, "2020-01-01");
    let mut catalog = FakeCatalog::new().with_embedded_tracks(2);
    catalog.add_album(
        record.clone(),
        (1..=7)
            .map(|n| track(&format!("t-{}", n), &format!("Track {}", n), &record, n))
            .collect(),
    );
    let config = IngestionConfig {
        page_size: 2,
        ..IngestionConfig::default()
    };
    let ingestor = Ingestor::new(&*store, &catalog, config);

    let tracks = ingestor.ingest_albums(&["al-1".to_string()]).unwrap();

    assert_eq!(tracks.len(), 7);
    assert_eq!(store.get_album_tracks("al-1").unwrap().len(), 7);
    assert_eq!(store.get_album("al-1").unwrap().unwrap().total_tracks, 7);
    let requests = catalog.requests();
    assert_eq!(requests[0], "album al-1");
    assert!(!requests.iter().any(|r| r.starts_with("albums ")));
}

// =============================================================================
// Playlists
// =============================================================================

#[test]
fn test_playlist_positions_skip_missing_entries() {
    let store = TestStore::new();
    let record = album("al-1", "Record", AlbumType::Album, "2020-01-01");
    let x = TrackRecord {
        explicit: true,
        ..track("t-x", "X", &record, 1)
    };
    let y = track("t-y", "Y", &record, 2);
    let mut catalog = FakeCatalog::new();
    catalog.add_album(record.clone(), vec![x.clone(), y.clone()]);
    catalog.add_playlist(vec![Some(y), None, Some(x)]);
    let config = IngestionConfig {
        page_size: 2,
        ..IngestionConfig::default()
    };
    let ingestor = Ingestor::new(&*store, &catalog, config);

    let playlists = ingestor
        .ingest_playlists(&[PLAYLIST_ID.to_string()])
        .unwrap();

    let ids: Vec<&str> = playlists[0].tracks.iter().map(|t| t.id.as_str()).collect();
    assert_eq!(ids, vec!["t-y", "t-x"]);
    assert!(playlists[0].tracks.iter().all(|t| !t.explicit));
    let pages: Vec<String> = catalog
        .requests()
        .into_iter()
        .filter(|r| r.starts_with("playlist_items"))
        .collect();
    assert_eq!(
        pages,
        vec![
            format!("playlist_items {} 2 0", PLAYLIST_ID),
            format!("playlist_items {} 2 2", PLAYLIST_ID),
        ]
    );
}
