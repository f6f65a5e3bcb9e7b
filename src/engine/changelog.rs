//! Ledger of source regions proven identical between input and output.
//!
//! Replacers record the prelude of every container they rebuild; the text
//! splicer consults the ledger to copy those bytes from the original source
//! instead of re-synthesizing them.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{trace, warn};

use crate::ast::{Pos, Region};

/// What the ledger does when a new region overlaps a recorded one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LedgerMode {
    /// Overlaps are rejected with `ChangelogError::Overlap`.
    #[default]
    Strict,
    /// Overlaps are merged into a single region and logged.
    Lenient,
}

impl LedgerMode {
    /// Parses a mode name, falling back to `Strict` on unknown input.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "strict" => LedgerMode::Strict,
            "lenient" => LedgerMode::Lenient,
            other => {
                warn!("Unknown ledger mode '{}', defaulting to strict", other);
                LedgerMode::Strict
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChangelogError {
    #[error("degenerate unchanged region {region}")]
    Degenerate { region: Region },
    #[error("unchanged region {region} overlaps recorded region {existing}")]
    Overlap { region: Region, existing: Region },
}

/// Append-only record of unchanged regions, kept sorted by start offset.
#[derive(Debug, Clone, Default)]
pub struct Changelog {
    mode: LedgerMode,
    unchanged: Vec<Region>,
}

impl Changelog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_mode(mode: LedgerMode) -> Self {
        Changelog { mode, unchanged: Vec::new() }
    }

    pub fn mode(&self) -> LedgerMode {
        self.mode
    }

    /// Records `[pos, end)` as reproducible verbatim from the original source.
    ///
    /// Empty regions carry no text and are ignored.
    pub fn unchanged(&mut self, pos: Pos, end: Pos) -> Result<(), ChangelogError> {
        let region = Region::new(pos, end);
        if region.is_degenerate() {
            return Err(ChangelogError::Degenerate { region });
        }
        if region.is_empty() {
            return Ok(());
        }

        let idx = self.unchanged.partition_point(|r| r.pos < region.pos);
        let neighbours = idx.saturating_sub(1)..(idx + 1).min(self.unchanged.len());
        let clash = self.unchanged[neighbours]
            .iter()
            .copied()
            .find(|existing| existing.overlaps(&region));

        match (clash, self.mode) {
            (None, _) => {
                trace!("unchanged {}", region);
                self.unchanged.insert(idx, region);
                Ok(())
            }
            (Some(existing), LedgerMode::Strict) => Err(ChangelogError::Overlap { region, existing }),
            (Some(existing), LedgerMode::Lenient) => {
                warn!("merging unchanged region {} into overlapping {}", region, existing);
                self.merge(region);
                Ok(())
            }
        }
    }

    fn merge(&mut self, region: Region) {
        let mut merged = region;
        self.unchanged.retain(|r| {
            if r.overlaps(&merged) {
                merged = merged.join(r);
                false
            } else {
                true
            }
        });
        let idx = self.unchanged.partition_point(|r| r.pos < merged.pos);
        self.unchanged.insert(idx, merged);
    }

    /// Whether `[pos, end)` lies entirely inside one recorded region.
    pub fn is_unchanged(&self, pos: Pos, end: Pos) -> bool {
        let query = Region::new(pos, end);
        if query.is_degenerate() {
            return false;
        }
        let idx = self.unchanged.partition_point(|r| r.pos <= query.pos);
        idx > 0 && self.unchanged[idx - 1].contains(&query)
    }

    /// Recorded regions in ascending source order.
    pub fn regions(&self) -> &[Region] {
        &self.unchanged
    }

    pub fn len(&self) -> usize {
        self.unchanged.len()
    }

    pub fn is_empty(&self) -> bool {
        self.unchanged.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_in_source_order() {
        let mut cl = Changelog::new();
        cl.unchanged(Pos(20), Pos(21)).unwrap();
        cl.unchanged(Pos(0), Pos(7)).unwrap();
        cl.unchanged(Pos(10), Pos(11)).unwrap();
        let starts: Vec<_> = cl.regions().iter().map(|r| r.pos.0).collect();
        assert_eq!(starts, vec![0, 10, 20]);
    }

    #[test]
    fn test_rejects_degenerate_region() {
        let mut cl = Changelog::new();
        let err = cl.unchanged(Pos(11), Pos(10)).unwrap_err();
        assert_eq!(err, ChangelogError::Degenerate { region: Region::new(Pos(11), Pos(10)) });
        assert!(cl.is_empty());
    }

    #[test]
    fn test_ignores_empty_region() {
        let mut cl = Changelog::new();
        cl.unchanged(Pos(4), Pos(4)).unwrap();
        assert!(cl.is_empty());
    }

    #[test]
    fn test_strict_rejects_overlap() {
        let mut cl = Changelog::new();
        cl.unchanged(Pos(0), Pos(8)).unwrap();
        let err = cl.unchanged(Pos(5), Pos(12)).unwrap_err();
        assert!(matches!(err, ChangelogError::Overlap { .. }));
        assert_eq!(cl.len(), 1);
    }

    #[test]
    fn test_adjacent_regions_do_not_overlap() {
        let mut cl = Changelog::new();
        cl.unchanged(Pos(0), Pos(8)).unwrap();
        cl.unchanged(Pos(8), Pos(9)).unwrap();
        assert_eq!(cl.len(), 2);
    }

    #[test]
    fn test_lenient_merges_overlap() {
        let mut cl = Changelog::with_mode(LedgerMode::Lenient);
        cl.unchanged(Pos(0), Pos(8)).unwrap();
        cl.unchanged(Pos(20), Pos(22)).unwrap();
        cl.unchanged(Pos(5), Pos(12)).unwrap();
        assert_eq!(cl.regions(), &[Region::new(Pos(0), Pos(12)), Region::new(Pos(20), Pos(22))]);
    }

    #[test]
    fn test_is_unchanged() {
        let mut cl = Changelog::new();
        cl.unchanged(Pos(3), Pos(10)).unwrap();
        assert!(cl.is_unchanged(Pos(3), Pos(10)));
        assert!(cl.is_unchanged(Pos(4), Pos(6)));
        assert!(!cl.is_unchanged(Pos(2), Pos(6)));
        assert!(!cl.is_unchanged(Pos(9), Pos(11)));
    }

    #[test]
    fn test_parse_mode() {
        assert_eq!(LedgerMode::parse("Lenient"), LedgerMode::Lenient);
        assert_eq!(LedgerMode::parse(" strict "), LedgerMode::Strict);
        assert_eq!(LedgerMode::parse("bogus"), LedgerMode::Strict);
    }
}
