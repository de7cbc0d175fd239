//! Identity and visibility resolution applied by every upsert.
//!
//! Given what is already stored under an ID and what has just arrived, decide
//! whether the incoming data is written or the stored entity is kept as is.

use super::models::{Album, AlbumRecord, Artist, ArtistRecord, Track, TrackRecord};

/// Outcome of resolving an incoming record against the stored entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Resolution {
    /// Write the incoming record, overwriting any stored row.
    Insert,
    /// Leave the stored entity untouched.
    Keep,
}

/// Entities that carry an explicit flag. Only tracks do; an explicit track
/// is never downgraded by a later non-replace upsert.
pub trait Explicitness {
    fn explicit(&self) -> Option<bool> {
        None
    }
}

impl Explicitness for Track {
    fn explicit(&self) -> Option<bool> {
        Some(self.explicit)
    }
}

impl Explicitness for TrackRecord {
    fn explicit(&self) -> Option<bool> {
        Some(self.explicit)
    }
}

impl Explicitness for Album {}
impl Explicitness for AlbumRecord {}
impl Explicitness for Artist {}
impl Explicitness for ArtistRecord {}

pub fn resolve<E, I>(existing: Option<&E>, incoming: &I, replace: bool) -> Resolution
where
    E: Explicitness,
    I: Explicitness,
{
    let Some(existing) = existing else {
        return Resolution::Insert;
    };
    if replace {
        return Resolution::Insert;
    }
    if existing.explicit() == Some(false) && incoming.explicit() == Some(true) {
        return Resolution::Insert;
    }
    Resolution::Keep
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Flag(Option<bool>);

    impl Explicitness for Flag {
        fn explicit(&self) -> Option<bool> {
            self.0
        }
    }

    #[test]
    fn test_absent_entity_is_inserted() {
        assert_eq!(
            resolve::<Flag, Flag>(None, &Flag(Some(false)), false),
            Resolution::Insert
        );
        assert_eq!(resolve::<Flag, Flag>(None, &Flag(None), false), Resolution::Insert);
    }

    #[test]
    fn test_replace_always_overwrites() {
        assert_eq!(
            resolve(Some(&Flag(Some(true))), &Flag(Some(false)), true),
            Resolution::Insert
        );
        assert_eq!(resolve(Some(&Flag(None)), &Flag(None), true), Resolution::Insert);
    }

    #[test]
    fn test_explicit_upgrades_non_explicit_track() {
        assert_eq!(
            resolve(Some(&Flag(Some(false))), &Flag(Some(true)), false),
            Resolution::Insert
        );
    }

    #[test]
    fn test_explicit_is_never_downgraded_without_replace() {
        assert_eq!(
            resolve(Some(&Flag(Some(true))), &Flag(Some(false)), false),
            Resolution::Keep
        );
        assert_eq!(
            resolve(Some(&Flag(Some(true))), &Flag(Some(true)), false),
            Resolution::Keep
        );
    }

    #[test]
    fn test_non_track_entities_are_kept() {
        assert_eq!(resolve(Some(&Flag(None)), &Flag(None), false), Resolution::Keep);
    }

    #[test]
    fn test_same_non_explicit_track_is_kept() {
        assert_eq!(
            resolve(Some(&Flag(Some(false))), &Flag(Some(false)), false),
            Resolution::Keep
        );
    }
}
