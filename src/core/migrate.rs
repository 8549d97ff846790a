//! Migrate - Whole-document batch passes
//!
//! Both passes work in place on a loaded [`Document`]; the caller decides
//! where the result is written.

use tracing::debug;

use super::compat::{CompatibilityRecord, Compatibility};
use super::document::Document;
use super::note;

/// What a pass did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MigrationReport {
    /// Entries visited (both directions count)
    pub visited: usize,
    /// Entries whose content changed
    pub changed: usize,
}

/// Drop NoData values from every stored compatibility record
pub fn clean_compatibility(doc: &mut Document) -> MigrationReport {
    let mut report = MigrationReport::default();

    for (a, b, entry) in doc.entries_mut() {
        report.visited += 1;
        let cleaned = entry.compatibility.normalized();
        if cleaned != entry.compatibility {
            debug!(drug = a, other = b, "Cleaned compatibility record");
            entry.compatibility = cleaned;
            report.changed += 1;
        }
    }

    report
}

/// Recompute every note with the note generator
///
/// Each pair is handled once with its first drug in document order as the
/// subject, and the same note is written to every stored direction. A pair
/// stored under only one drug is still regenerated; its missing reverse is
/// left for `check --repair`.
pub fn regenerate_notes(doc: &mut Document) -> MigrationReport {
    let mut report = MigrationReport::default();

    for (a, b) in doc.unordered_pairs() {
        let Some(entry) = doc.find_pair(&a, &b) else {
            continue;
        };
        let record = if entry.compatibility.is_empty() {
            CompatibilityRecord::uniform(Compatibility::NoData)
        } else {
            entry.compatibility.clone()
        };
        let text = note::generate(&record, Some(&a));

        let mut changed = 0;
        report.visited += doc.update_pair(&a, &b, |entry| {
            if entry.notes != text {
                entry.notes = text.clone();
                changed += 1;
            }
        });
        report.changed += changed;
    }

    debug!(visited = report.visited, changed = report.changed, "Regenerated notes");
    report
}
