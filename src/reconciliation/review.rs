//! Review and apply of a reconciliation plan.
//!
//! A `Reviewer` sees the proposed plan and answers with per-track decisions.
//! Only decisions that come back are applied; anything the reviewer drops is
//! left out of the store.

use super::plan::ReconciliationPlan;
use crate::catalog_store::{CatalogStore, StoreResult, Track, TrackRecord};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing::{debug, warn};
use unicode_width::UnicodeWidthStr;

#[derive(Debug, Error)]
pub enum ReviewError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Review aborted: {0}")]
    Aborted(String),
}

/// What to do with one track of the plan.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Action {
    /// Store visible.
    Add,
    /// Store hidden.
    Hide,
    /// Do not store.
    Skip,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Add => "add",
            Action::Hide => "hide",
            Action::Skip => "skip",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "add" => Ok(Action::Add),
            "hide" => Ok(Action::Hide),
            "skip" => Ok(Action::Skip),
            other => Err(format!("unknown action '{}'", other)),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Decision {
    pub track_id: String,
    pub action: Action,
}

impl Decision {
    pub fn new(track_id: &str, action: Action) -> Self {
        Self {
            track_id: track_id.to_string(),
            action,
        }
    }
}

/// Human (or automated) confirmation step between planning and storing.
pub trait Reviewer {
    fn review(&mut self, plan: &ReconciliationPlan) -> Result<Vec<Decision>, ReviewError>;
}

/// Confirms the plan exactly as proposed.
#[derive(Clone, Copy, Debug, Default)]
pub struct AcceptAll;

impl Reviewer for AcceptAll {
    fn review(&mut self, plan: &ReconciliationPlan) -> Result<Vec<Decision>, ReviewError> {
        Ok(proposed_decisions(plan))
    }
}

fn proposed_action(track: &TrackRecord) -> Action {
    if track.hidden {
        Action::Hide
    } else {
        Action::Add
    }
}

/// The decisions the plan itself proposes, in presentation order.
pub fn proposed_decisions(plan: &ReconciliationPlan) -> Vec<Decision> {
    plan.existing
        .iter()
        .chain(plan.add.iter())
        .map(|t| Decision::new(&t.id, proposed_action(t)))
        .chain(plan.skip.iter().map(|t| Decision::new(&t.id, Action::Skip)))
        .collect()
}

// =============================================================================
// Text rendering
// =============================================================================

fn plain_table(rows: &[Vec<String>]) -> String {
    let columns = rows.iter().map(Vec::len).max().unwrap_or(0);
    let mut widths = vec![0; columns];
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(cell.width());
        }
    }

    let mut out = String::new();
    for row in rows {
        let mut line = String::new();
        for (i, cell) in row.iter().enumerate() {
            if i > 0 {
                line.push_str("  ");
            }
            line.push_str(cell);
            if i + 1 < row.len() {
                line.push_str(&" ".repeat(widths[i] - cell.width()));
            }
        }
        out.push_str(line.trim_end());
        out.push('\n');
    }
    out
}

fn proposal_row(track: &TrackRecord, action: Action) -> Vec<String> {
    let join = |names: Vec<&str>| names.join("; ");
    vec![
        action.to_string(),
        track.id.clone(),
        track.name.clone(),
        join(track.artists.iter().map(|a| a.name.as_str()).collect()),
        track.track_number.to_string(),
        track.album.name.clone(),
        join(track.album.artists.iter().map(|a| a.name.as_str()).collect()),
        track.album.release_date.to_string(),
    ]
}

/// Render the plan as an editable text document: a comment header followed
/// by one line per track, `action id name artists track_number album
/// album_artists release_date`.
pub fn render_proposal(plan: &ReconciliationPlan) -> String {
    let mut out = String::new();
    out.push_str(&format!("# Tracks to download by {}\n", plan.artist.name));
    out.push_str("# List of actions:\n");
    out.push_str("#   add - adds track metadata and downloads\n");
    out.push_str("#   hide - adds track metadata but doesn't download\n");
    out.push_str("#   skip - ignores track and doesn't add metadata\n");
    out.push('\n');

    let groups = [
        ("Modify existing tracks:", &plan.existing, false),
        ("Add tracks:", &plan.add, false),
        ("Skip tracks:", &plan.skip, true),
    ];
    for (title, tracks, skipped) in groups {
        if tracks.is_empty() {
            continue;
        }
        let rows: Vec<Vec<String>> = tracks
            .iter()
            .map(|t| {
                let action = if skipped { Action::Skip } else { proposed_action(t) };
                proposal_row(t, action)
            })
            .collect();
        out.push_str(title);
        out.push('\n');
        out.push_str(&plain_table(&rows));
        out.push('\n');
    }
    out
}

/// Read decisions back from an edited proposal. Comment lines, group titles
/// and lines whose first field is not an action are ignored.
pub fn parse_decisions(text: &str) -> Vec<Decision> {
    text.lines()
        .filter(|line| !line.trim_start().starts_with('#'))
        .filter_map(|line| {
            let mut fields = line.split_whitespace();
            let action = fields.next()?.parse::<Action>().ok()?;
            let track_id = fields.next()?;
            Some(Decision::new(track_id, action))
        })
        .collect()
}

// =============================================================================
// Apply
// =============================================================================

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppliedTrack {
    pub track: Track,
    /// The track was already cached before this plan.
    pub existing: bool,
}

/// Store the confirmed decisions. `add` stores the track visible, `hide`
/// stores it hidden, `skip` stores nothing. A track is rewritten only when
/// its stored visibility differs from the decided one.
pub fn apply<S: CatalogStore + ?Sized>(
    store: &S,
    plan: &ReconciliationPlan,
    decisions: &[Decision],
) -> StoreResult<Vec<AppliedTrack>> {
    let mut proposed: HashMap<&str, (&TrackRecord, bool)> = HashMap::new();
    for track in &plan.skip {
        proposed.insert(track.id.as_str(), (track, false));
    }
    for track in &plan.add {
        proposed.insert(track.id.as_str(), (track, false));
    }
    for track in &plan.existing {
        proposed.insert(track.id.as_str(), (track, true));
    }

    let mut decided = HashSet::new();
    let mut applied = Vec::new();
    for decision in decisions {
        if !decided.insert(decision.track_id.as_str()) {
            debug!("Ignoring repeated decision for track {}", decision.track_id);
            continue;
        }
        let Some((record, existing)) = proposed.get(decision.track_id.as_str()) else {
            warn!("Ignoring decision for track {} outside the plan", decision.track_id);
            continue;
        };
        let hidden = match decision.action {
            Action::Add => false,
            Action::Hide => true,
            Action::Skip => continue,
        };

        let replace = store
            .get_track(&record.id)?
            .is_some_and(|stored| stored.hidden != hidden);
        let record = TrackRecord {
            hidden,
            ..(*record).clone()
        };
        let track = store.upsert_track(&record, replace)?;
        applied.push(AppliedTrack {
            track,
            existing: *existing,
        });
    }
    Ok(applied)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog_store::{AlbumType, SqliteCatalogStore};
    use crate::reconciliation::plan::tests::{album, target, track};
    use crate::reconciliation::{reconcile_artist, Reconciliation};

    fn best_of_plan(store: &SqliteCatalogStore) -> ReconciliationPlan {
        let single = album("Single", AlbumType::Single, "2020-01-01", "A");
        let best_of = album("Best Of", AlbumType::Album, "2021-01-01", "A");
        let compilation = album("Hits", AlbumType::Compilation, "2022-01-01", "A");
        store
            .upsert_track(&track("s-song", "Song", &single, 1), false)
            .unwrap();
        let existing = store.get_artist_tracks("A").unwrap();

        match reconcile_artist(
            &target(),
            vec![
                track("b-song", "Song", &best_of, 1),
                track("b-new", "New", &best_of, 2),
                track("c-new", "New", &compilation, 7),
            ],
            &existing,
        ) {
            Reconciliation::Plan(plan) => plan,
            Reconciliation::NoNewTracks => panic!("expected a plan"),
        }
    }

    #[test]
    fn test_render_and_parse_round_trip_proposed_decisions() {
        let store = SqliteCatalogStore::open_in_memory().unwrap();
        let plan = best_of_plan(&store);

        let text = render_proposal(&plan);
        assert!(text.starts_with("# Tracks to download by Artist A\n"));
        assert!(text.contains("Modify existing tracks:\nhide  s-song  Song"));
        assert!(text.contains("Add tracks:\n"));
        assert!(!text.contains("Skip tracks:"));

        assert_eq!(parse_decisions(&text), proposed_decisions(&plan));
    }

    #[test]
    fn test_parse_ignores_comments_and_unknown_actions() {
        let text = "# add commented-out\nAdd tracks:\nadd t1 Song\nmaybe t2 Other\nhide   t3\nskip\n";
        assert_eq!(
            parse_decisions(text),
            vec![Decision::new("t1", Action::Add), Decision::new("t3", Action::Hide)]
        );
    }

    #[test]
    fn test_plain_table_aligns_wide_characters() {
        let rows = vec![
            vec!["add".to_string(), "日本".to_string(), "x".to_string()],
            vec!["hide".to_string(), "ab".to_string(), "y".to_string()],
        ];
        assert_eq!(plain_table(&rows), "add   日本  x\nhide  ab    y\n");
    }

    #[test]
    fn test_apply_accept_all() {
        let store = SqliteCatalogStore::open_in_memory().unwrap();
        let plan = best_of_plan(&store);
        let decisions = AcceptAll.review(&plan).unwrap();

        let applied = apply(&store, &plan, &decisions).unwrap();
        assert_eq!(applied.len(), 4);
        assert!(store.get_track("s-song").unwrap().unwrap().hidden);
        assert!(!store.get_track("b-song").unwrap().unwrap().hidden);
        assert!(!store.get_track("b-new").unwrap().unwrap().hidden);
        assert!(store.get_track("c-new").unwrap().unwrap().hidden);
        assert!(applied.iter().any(|a| a.existing && a.track.id == "s-song"));
    }

    #[test]
    fn test_apply_only_confirmed_decisions() {
        let store = SqliteCatalogStore::open_in_memory().unwrap();
        let plan = best_of_plan(&store);
        let decisions = vec![
            Decision::new("b-song", Action::Hide),
            Decision::new("b-song", Action::Add),
            Decision::new("c-new", Action::Skip),
            Decision::new("unknown", Action::Add),
        ];

        let applied = apply(&store, &plan, &decisions).unwrap();
        assert_eq!(applied.len(), 1);
        assert!(store.get_track("b-song").unwrap().unwrap().hidden);
        assert!(store.get_track("b-new").unwrap().is_none());
        assert!(store.get_track("c-new").unwrap().is_none());
        assert!(store.get_track("unknown").unwrap().is_none());
        assert!(!store.get_track("s-song").unwrap().unwrap().hidden);
    }

    #[test]
    fn test_apply_can_keep_existing_track_visible() {
        let store = SqliteCatalogStore::open_in_memory().unwrap();
        let plan = best_of_plan(&store);

        apply(&store, &plan, &[Decision::new("s-song", Action::Add)]).unwrap();
        assert!(!store.get_track("s-song").unwrap().unwrap().hidden);
    }
}
