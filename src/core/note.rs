//! Note - Auto-generated clinical notes
//!
//! Turns a [`CompatibilityRecord`] into a prioritized safety note. The note is
//! built from three tiers, each selected by the first matching rule:
//!
//! 1. **Core** - headline driven by the Y-site value. A Y-site
//!    incompatibility always produces the separate-line statement, whatever
//!    the other routes say.
//! 2. **Modifiers** - one clause per route in the order solution, syringe,
//!    admixture. Solution always contributes; syringe and admixture stay
//!    silent when compatible.
//! 3. **Summary** - verdict over all four values; any incompatibility wins.
//!
//! An all-NoData record yields only the "no compatibility data" message.
//!
//! This is the only note generator in the crate. The entry workflow and the
//! `regen-notes` pass both call [`generate`].

use std::fmt;

use super::compat::{Compatibility, CompatibilityRecord, Route};

/// Label used in solution clauses when no subject drug is known
pub const DEFAULT_SUBJECT: &str = "this solution";

pub const NO_DATA_NOTE: &str = "No compatibility data available — use a dedicated line for safety.";

/// The three tiers of a generated note
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteParts {
    pub core: String,
    pub modifiers: Vec<String>,
    pub summary: Option<String>,
}

impl NoteParts {
    /// Evaluate all tiers for a record
    ///
    /// `subject` is the drug interpolated into the solution clause.
    pub fn build(record: &CompatibilityRecord, subject: Option<&str>) -> Self {
        if record.is_all_no_data() {
            return Self {
                core: NO_DATA_NOTE.to_string(),
                modifiers: Vec::new(),
                summary: None,
            };
        }

        let subject = subject
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_SUBJECT);

        let modifiers = [
            Some(solution_clause(record.get(Route::Solution), subject)),
            syringe_clause(record.get(Route::Syringe)),
            admixture_clause(record.get(Route::Admixture)),
        ]
        .into_iter()
        .flatten()
        .collect();

        Self {
            core: core_statement(record.get(Route::YSite)).to_string(),
            modifiers,
            summary: Some(overall_summary(&record.values()).to_string()),
        }
    }
}

impl fmt::Display for NoteParts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.core)?;
        if !self.modifiers.is_empty() {
            write!(f, " {}", self.modifiers.join(" "))?;
        }
        if let Some(summary) = &self.summary {
            write!(f, " {}", summary)?;
        }
        Ok(())
    }
}

/// Generate the note text for a record
pub fn generate(record: &CompatibilityRecord, subject: Option<&str>) -> String {
    NoteParts::build(record, subject).to_string()
}

fn core_statement(y_site: Compatibility) -> &'static str {
    match y_site {
        Compatibility::Compatible => {
            "Y-site compatible — co-administration may proceed if no precipitation is observed."
        }
        Compatibility::Incompatible => {
            "Y-site incompatible — MUST use a separate line regardless of other routes."
        }
        Compatibility::Variable => {
            "Y-site variable — co-administration requires close monitoring for precipitation or color change."
        }
        Compatibility::NoData => {
            "Y-site data unavailable — prefer a separate line unless other routes strongly support compatibility."
        }
    }
}

fn solution_clause(value: Compatibility, subject: &str) -> String {
    match value {
        Compatibility::Compatible => {
            format!("Solution: Compatible — this medication is compatible with {}.", subject)
        }
        Compatibility::Incompatible => format!(
            "Solution: Incompatible — do not prepare or infuse this medication in {}.",
            subject
        ),
        Compatibility::Variable => format!(
            "Solution: Variable — use caution when preparing this medication in {}.",
            subject
        ),
        Compatibility::NoData => {
            format!("Solution: No Data — compatibility with {} is not established.", subject)
        }
    }
}

fn syringe_clause(value: Compatibility) -> Option<String> {
    let text = match value {
        Compatibility::Compatible => return None,
        Compatibility::Incompatible => "Do not mix in syringe due to syringe-level incompatibility.",
        Compatibility::Variable => "Syringe compatibility is variable — avoid direct mixing.",
        Compatibility::NoData => "Syringe compatibility data is unavailable.",
    };
    Some(text.to_string())
}

fn admixture_clause(value: Compatibility) -> Option<String> {
    let text = match value {
        Compatibility::Compatible => return None,
        Compatibility::Incompatible => "Do not combine in admixture due to bag-level incompatibility.",
        Compatibility::Variable => "Admixture data is variable — avoid combining unless clearly indicated.",
        Compatibility::NoData => "Admixture compatibility data is lacking.",
    };
    Some(text.to_string())
}

fn overall_summary(values: &[Compatibility]) -> &'static str {
    use Compatibility::*;

    if values.contains(&Incompatible) {
        "Overall: At least one route is incompatible — separate-line administration is preferred."
    } else if values.iter().all(|v| *v == Compatible) {
        "Overall: All available routes show compatibility."
    } else if values.contains(&Variable) {
        "Overall: Mixed or variable evidence — monitor closely if co-administered."
    } else if values.iter().all(|v| matches!(v, Compatible | NoData)) {
        "Overall: Generally compatible, but missing data warrants caution."
    } else {
        "Overall: Limited or mixed information — safest to use a dedicated line."
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use Compatibility::*;

    const SEPARATE_LINE_SUMMARY: &str =
        "Overall: At least one route is incompatible — separate-line administration is preferred.";

    fn record(
        solution: Compatibility,
        y_site: Compatibility,
        syringe: Compatibility,
        admixture: Compatibility,
    ) -> CompatibilityRecord {
        CompatibilityRecord::new()
            .with(Route::Solution, solution)
            .with(Route::YSite, y_site)
            .with(Route::Syringe, syringe)
            .with(Route::Admixture, admixture)
    }

    #[test]
    fn test_all_no_data_is_fixed_message() {
        let rec = record(NoData, NoData, NoData, NoData);
        assert_eq!(generate(&rec, Some("Heparin")), NO_DATA_NOTE);
        // Empty record reads the same
        assert_eq!(generate(&CompatibilityRecord::new(), None), NO_DATA_NOTE);

        let parts = NoteParts::build(&rec, Some("Heparin"));
        assert!(parts.modifiers.is_empty());
        assert!(parts.summary.is_none());
    }

    #[test]
    fn test_incompatible_dominates_summary() {
        // Every record with at least one Incompatible
        for s in Compatibility::ALL {
            for y in Compatibility::ALL {
                for sy in Compatibility::ALL {
                    for a in Compatibility::ALL {
                        let values = [s, y, sy, a];
                        if !values.contains(&Incompatible) {
                            continue;
                        }
                        let parts = NoteParts::build(&record(s, y, sy, a), None);
                        assert_eq!(
                            parts.summary.as_deref(),
                            Some(SEPARATE_LINE_SUMMARY),
                            "{:?}",
                            values
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn test_y_site_incompatible_overrides_other_routes() {
        let rec = record(Compatible, Incompatible, Compatible, Compatible);
        let parts = NoteParts::build(&rec, None);
        assert_eq!(
            parts.core,
            "Y-site incompatible — MUST use a separate line regardless of other routes."
        );
        assert_eq!(parts.summary.as_deref(), Some(SEPARATE_LINE_SUMMARY));
    }

    #[test]
    fn test_tier_ordering_end_to_end() {
        let rec = record(Compatible, Incompatible, NoData, Variable);
        let parts = NoteParts::build(&rec, Some("Heparin"));

        assert_eq!(
            parts.core,
            "Y-site incompatible — MUST use a separate line regardless of other routes."
        );
        assert_eq!(
            parts.modifiers,
            vec![
                "Solution: Compatible — this medication is compatible with Heparin.".to_string(),
                "Syringe compatibility data is unavailable.".to_string(),
                "Admixture data is variable — avoid combining unless clearly indicated.".to_string(),
            ]
        );
        assert_eq!(parts.summary.as_deref(), Some(SEPARATE_LINE_SUMMARY));

        let expected = format!(
            "{} {} {}",
            parts.core,
            parts.modifiers.join(" "),
            SEPARATE_LINE_SUMMARY
        );
        assert_eq!(generate(&rec, Some("Heparin")), expected);
    }

    #[test]
    fn test_all_compatible() {
        let note = generate(&record(Compatible, Compatible, Compatible, Compatible), Some("NS"));
        assert_eq!(
            note,
            "Y-site compatible — co-administration may proceed if no precipitation is observed. \
             Solution: Compatible — this medication is compatible with NS. \
             Overall: All available routes show compatibility."
        );
    }

    #[test]
    fn test_variable_summary() {
        let parts = NoteParts::build(&record(Compatible, Variable, Compatible, NoData), None);
        assert!(parts.core.starts_with("Y-site variable"));
        assert_eq!(
            parts.summary.as_deref(),
            Some("Overall: Mixed or variable evidence — monitor closely if co-administered.")
        );
    }

    #[test]
    fn test_missing_data_summary() {
        let parts = NoteParts::build(&record(NoData, Compatible, NoData, Compatible), None);
        assert_eq!(
            parts.summary.as_deref(),
            Some("Overall: Generally compatible, but missing data warrants caution.")
        );
        assert_eq!(
            parts.modifiers,
            vec![
                "Solution: No Data — compatibility with this solution is not established.".to_string(),
                "Syringe compatibility data is unavailable.".to_string(),
            ]
        );
    }

    #[test]
    fn test_y_site_no_data_core() {
        let parts = NoteParts::build(&record(Compatible, NoData, NoData, NoData), None);
        assert_eq!(
            parts.core,
            "Y-site data unavailable — prefer a separate line unless other routes strongly support compatibility."
        );
    }

    #[test]
    fn test_blank_subject_falls_back() {
        let note = generate(&record(Variable, Compatible, Compatible, Compatible), Some("  "));
        assert!(note.contains("use caution when preparing this medication in this solution."));
    }

    #[test]
    fn test_deterministic() {
        let rec = record(Incompatible, Variable, NoData, Compatible);
        assert_eq!(generate(&rec, Some("D5W")), generate(&rec, Some("D5W")));
    }
}
