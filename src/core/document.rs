//! Document - The compatibility knowledge base
//!
//! One JSON document holds every drug pair plus a small metadata block. The
//! metadata lives next to the drug names as reserved top-level keys:
//!
//! ```json
//! {
//!     "Heparin": { "Vancomycin": { "compatibility": {...}, "notes": "...", "source": "..." } },
//!     "Vancomycin": { "Heparin": { ... } },
//!     "biDirectional": true,
//!     "compatibilityKeys": ["solution", "ySite", "syringe", "admixture"],
//!     "lastUpdate": "2025-01-31",
//!     "schemaVersion": 1.0
//! }
//! ```
//!
//! # Key Points
//! - Pairs are symmetric: `insert_pair` is the only way to write one and it
//!   writes both directions
//! - The shape is validated on load; unknown routes, unknown values and
//!   non-object drug entries are rejected
//! - Missing metadata keys are filled with defaults

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::warn;

use super::compat::{PairEntry, Route};

pub const SCHEMA_VERSION_KEY: &str = "schemaVersion";
pub const BI_DIRECTIONAL_KEY: &str = "biDirectional";
pub const COMPATIBILITY_KEYS_KEY: &str = "compatibilityKeys";
pub const LAST_UPDATE_KEY: &str = "lastUpdate";

/// Top-level keys that are metadata rather than drug names
pub const RESERVED_KEYS: [&str; 4] = [
    SCHEMA_VERSION_KEY,
    BI_DIRECTIONAL_KEY,
    COMPATIBILITY_KEYS_KEY,
    LAST_UPDATE_KEY,
];

/// Highest schema version this build understands
pub const SUPPORTED_SCHEMA_VERSION: f64 = 1.0;

/// Check whether a name collides with a metadata key
pub fn is_reserved(name: &str) -> bool {
    RESERVED_KEYS.contains(&name)
}

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("document root must be a JSON object")]
    NotAnObject,

    #[error("invalid metadata '{key}': {reason}")]
    Metadata { key: &'static str, reason: String },

    #[error("unsupported schema version {found} (supported: 1.0)")]
    UnsupportedSchema { found: f64 },

    #[error("invalid entries for drug '{drug}': {source}")]
    Drug {
        drug: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("drug name cannot be empty")]
    EmptyName,

    #[error("'{0}' is a reserved key and cannot be used as a drug name")]
    ReservedName(String),
}

/// Document metadata block
#[derive(Debug, Clone, PartialEq)]
pub struct Metadata {
    pub schema_version: f64,
    pub bi_directional: bool,
    pub compatibility_keys: Vec<String>,
    pub last_update: NaiveDate,
}

impl Default for Metadata {
    fn default() -> Self {
        Self {
            schema_version: SUPPORTED_SCHEMA_VERSION,
            bi_directional: true,
            compatibility_keys: Route::entry_keys(),
            last_update: chrono::Local::now().date_naive(),
        }
    }
}

/// A pair that breaks the symmetry invariant
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Asymmetry {
    /// `from` lists `to`, but `to` does not list `from`
    MissingReverse { from: String, to: String },
    /// Both directions exist with different entries
    Mismatch { a: String, b: String },
}

impl std::fmt::Display for Asymmetry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Asymmetry::MissingReverse { from, to } => {
                write!(f, "{} → {} has no reverse entry", from, to)
            }
            Asymmetry::Mismatch { a, b } => write!(f, "{} ↔ {} entries differ", a, b),
        }
    }
}

/// In-memory compatibility document
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    pub meta: Metadata,
    drugs: BTreeMap<String, BTreeMap<String, PairEntry>>,
}

impl Document {
    /// Fresh document with default metadata and no drugs
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a document from parsed JSON, validating its shape
    pub fn from_value(value: Value) -> Result<Self, DocumentError> {
        let Value::Object(map) = value else {
            return Err(DocumentError::NotAnObject);
        };

        let mut meta = Metadata::default();
        let missing: Vec<&str> = RESERVED_KEYS
            .iter()
            .copied()
            .filter(|k| !map.contains_key(*k))
            .collect();
        if !missing.is_empty() {
            warn!(keys = ?missing, "Document metadata incomplete, using defaults");
        }

        let mut drugs = BTreeMap::new();
        for (key, value) in map {
            match key.as_str() {
                SCHEMA_VERSION_KEY => {
                    let version = value.as_f64().ok_or_else(|| DocumentError::Metadata {
                        key: SCHEMA_VERSION_KEY,
                        reason: format!("expected a number, got {}", value),
                    })?;
                    if version > SUPPORTED_SCHEMA_VERSION {
                        return Err(DocumentError::UnsupportedSchema { found: version });
                    }
                    meta.schema_version = version;
                }
                BI_DIRECTIONAL_KEY => {
                    meta.bi_directional = value.as_bool().ok_or_else(|| DocumentError::Metadata {
                        key: BI_DIRECTIONAL_KEY,
                        reason: format!("expected a boolean, got {}", value),
                    })?;
                }
                COMPATIBILITY_KEYS_KEY => {
                    let keys: Vec<String> =
                        serde_json::from_value(value).map_err(|e| DocumentError::Metadata {
                            key: COMPATIBILITY_KEYS_KEY,
                            reason: e.to_string(),
                        })?;
                    if keys != Route::entry_keys() {
                        warn!(?keys, "Unexpected compatibilityKeys, resetting to defaults");
                    } else {
                        meta.compatibility_keys = keys;
                    }
                }
                LAST_UPDATE_KEY => {
                    let raw = value.as_str().ok_or_else(|| DocumentError::Metadata {
                        key: LAST_UPDATE_KEY,
                        reason: format!("expected a date string, got {}", value),
                    })?;
                    meta.last_update =
                        raw.parse().map_err(|e: chrono::ParseError| DocumentError::Metadata {
                            key: LAST_UPDATE_KEY,
                            reason: e.to_string(),
                        })?;
                }
                _ => {
                    let pairs: BTreeMap<String, PairEntry> = serde_json::from_value(value)
                        .map_err(|source| DocumentError::Drug {
                            drug: key.clone(),
                            source,
                        })?;
                    drugs.insert(key, pairs);
                }
            }
        }

        Ok(Self { meta, drugs })
    }

    /// Convert to JSON; `serde_json::Map` keeps keys sorted
    pub fn to_value(&self) -> Result<Value, serde_json::Error> {
        let mut map = Map::new();
        map.insert(SCHEMA_VERSION_KEY.to_string(), Value::from(self.meta.schema_version));
        map.insert(BI_DIRECTIONAL_KEY.to_string(), Value::Bool(self.meta.bi_directional));
        map.insert(
            COMPATIBILITY_KEYS_KEY.to_string(),
            Value::from(self.meta.compatibility_keys.clone()),
        );
        map.insert(
            LAST_UPDATE_KEY.to_string(),
            Value::String(self.meta.last_update.format("%Y-%m-%d").to_string()),
        );

        for (drug, pairs) in &self.drugs {
            let pairs = pairs
                .iter()
                .map(|(other, entry)| Ok((other.clone(), serde_json::to_value(entry)?)))
                .collect::<Result<Map<String, Value>, serde_json::Error>>()?;
            map.insert(drug.clone(), Value::Object(pairs));
        }

        Ok(Value::Object(map))
    }

    /// Known drug names in document (sorted) order
    pub fn drug_names(&self) -> Vec<&str> {
        self.drugs.keys().map(String::as_str).collect()
    }

    pub fn drug_count(&self) -> usize {
        self.drugs.len()
    }

    /// Number of distinct pairs, each symmetric pair counted once
    pub fn pair_count(&self) -> usize {
        self.unordered_pairs().len()
    }

    /// Exact-name lookup of a drug's partners
    pub fn partners(&self, drug: &str) -> Option<&BTreeMap<String, PairEntry>> {
        self.drugs.get(drug)
    }

    /// Case-insensitive lookup of a known drug name
    pub fn find_drug(&self, name: &str) -> Option<&str> {
        let name = name.trim();
        if let Some((key, _)) = self.drugs.get_key_value(name) {
            return Some(key.as_str());
        }
        self.drugs
            .keys()
            .find(|k| k.to_lowercase() == name.to_lowercase())
            .map(String::as_str)
    }

    pub fn get_pair(&self, a: &str, b: &str) -> Option<&PairEntry> {
        self.drugs.get(a).and_then(|pairs| pairs.get(b))
    }

    /// `a → b`, or `b → a` when only the reverse is stored
    pub fn find_pair(&self, a: &str, b: &str) -> Option<&PairEntry> {
        self.get_pair(a, b).or_else(|| self.get_pair(b, a))
    }

    /// Store an entry under both `a → b` and `b → a`
    ///
    /// Returns the entry previously stored under `a → b`, if any.
    pub fn insert_pair(
        &mut self,
        a: &str,
        b: &str,
        entry: PairEntry,
    ) -> Result<Option<PairEntry>, DocumentError> {
        for name in [a, b] {
            if name.trim().is_empty() {
                return Err(DocumentError::EmptyName);
            }
            if is_reserved(name) {
                return Err(DocumentError::ReservedName(name.to_string()));
            }
        }

        self.drugs
            .entry(b.to_string())
            .or_default()
            .insert(a.to_string(), entry.clone());
        let previous = self
            .drugs
            .entry(a.to_string())
            .or_default()
            .insert(b.to_string(), entry);

        Ok(previous)
    }

    /// Visit every stored entry (both directions)
    pub(crate) fn entries_mut(&mut self) -> impl Iterator<Item = (&str, &str, &mut PairEntry)> {
        self.drugs.iter_mut().flat_map(|(a, pairs)| {
            pairs
                .iter_mut()
                .map(move |(b, entry)| (a.as_str(), b.as_str(), entry))
        })
    }

    /// Each stored pair once, as `(first, second)` in document order
    ///
    /// A pair stored under only one of its drugs is still listed.
    pub fn unordered_pairs(&self) -> Vec<(String, String)> {
        let pairs: BTreeSet<(&str, &str)> = self
            .drugs
            .iter()
            .flat_map(|(a, partners)| {
                partners.keys().map(move |b| {
                    let (a, b) = (a.as_str(), b.as_str());
                    if a <= b {
                        (a, b)
                    } else {
                        (b, a)
                    }
                })
            })
            .collect();

        pairs
            .into_iter()
            .map(|(a, b)| (a.to_string(), b.to_string()))
            .collect()
    }

    /// Apply `update` to each stored direction of a pair
    ///
    /// Returns the number of entries visited (0, 1 or 2).
    pub fn update_pair(
        &mut self,
        a: &str,
        b: &str,
        mut update: impl FnMut(&mut PairEntry),
    ) -> usize {
        let mut visited = 0;
        let directions = if a == b { vec![(a, b)] } else { vec![(a, b), (b, a)] };
        for (from, to) in directions {
            if let Some(entry) = self.drugs.get_mut(from).and_then(|pairs| pairs.get_mut(to)) {
                update(entry);
                visited += 1;
            }
        }
        visited
    }

    /// Find pairs breaking the symmetry invariant
    pub fn asymmetries(&self) -> Vec<Asymmetry> {
        let mut found = Vec::new();

        for (a, pairs) in &self.drugs {
            for (b, entry) in pairs {
                match self.get_pair(b, a) {
                    None => found.push(Asymmetry::MissingReverse {
                        from: a.clone(),
                        to: b.clone(),
                    }),
                    Some(reverse) if reverse != entry && a < b => found.push(Asymmetry::Mismatch {
                        a: a.clone(),
                        b: b.clone(),
                    }),
                    Some(_) => {}
                }
            }
        }

        found
    }

    /// Copy forward entries into missing reverse slots
    ///
    /// Mismatched pairs are left alone. Returns the number of entries written.
    pub fn repair_missing_reverse(&mut self) -> usize {
        let missing: Vec<(String, String, PairEntry)> = self
            .asymmetries()
            .into_iter()
            .filter_map(|asym| match asym {
                Asymmetry::MissingReverse { from, to } => {
                    let entry = self.get_pair(&from, &to)?.clone();
                    Some((from, to, entry))
                }
                Asymmetry::Mismatch { .. } => None,
            })
            .collect();

        let count = missing.len();
        for (from, to, entry) in missing {
            self.drugs.entry(to).or_default().insert(from, entry);
        }
        count
    }

    /// Set `lastUpdate`
    pub fn touch(&mut self, date: NaiveDate) {
        self.meta.last_update = date;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::compat::{Compatibility, CompatibilityRecord};
    use serde_json::json;

    fn entry(note: &str) -> PairEntry {
        PairEntry::new(
            CompatibilityRecord::new().with(Route::YSite, Compatibility::Compatible),
            note,
            "Trissel",
        )
    }

    #[test]
    fn test_insert_pair_is_symmetric() {
        let mut doc = Document::new();
        doc.insert_pair("Heparin", "Vancomycin", entry("ok")).unwrap();

        assert_eq!(doc.get_pair("Heparin", "Vancomycin"), doc.get_pair("Vancomycin", "Heparin"));
        assert!(doc.get_pair("Heparin", "Vancomycin").is_some());
        assert!(doc.asymmetries().is_empty());
        assert_eq!(doc.drug_count(), 2);
        assert_eq!(doc.pair_count(), 1);
    }

    #[test]
    fn test_insert_pair_overwrites_both_directions() {
        let mut doc = Document::new();
        doc.insert_pair("Heparin", "Vancomycin", entry("first")).unwrap();
        let previous = doc.insert_pair("Vancomycin", "Heparin", entry("second")).unwrap();

        assert_eq!(previous.unwrap().notes, "first");
        assert_eq!(doc.get_pair("Heparin", "Vancomycin").unwrap().notes, "second");
        assert_eq!(doc.get_pair("Vancomycin", "Heparin").unwrap().notes, "second");
    }

    #[test]
    fn test_insert_pair_rejects_reserved_and_empty() {
        let mut doc = Document::new();
        assert!(matches!(
            doc.insert_pair("lastUpdate", "Heparin", entry("x")),
            Err(DocumentError::ReservedName(_))
        ));
        assert!(matches!(
            doc.insert_pair("  ", "Heparin", entry("x")),
            Err(DocumentError::EmptyName)
        ));
        assert_eq!(doc.drug_count(), 0);
    }

    #[test]
    fn test_self_pair() {
        let mut doc = Document::new();
        doc.insert_pair("Heparin", "Heparin", entry("same")).unwrap();
        assert_eq!(doc.drug_count(), 1);
        assert_eq!(doc.pair_count(), 1);
        assert!(doc.asymmetries().is_empty());
    }

    #[test]
    fn test_from_value_splits_metadata() {
        let value = json!({
            "schemaVersion": 1.0,
            "biDirectional": true,
            "compatibilityKeys": ["solution", "ySite", "syringe", "admixture"],
            "lastUpdate": "2025-03-01",
            "Heparin": {
                "Hespan": { "compatibility": {"ySite": "Variable"}, "notes": "n", "source": "s" }
            },
            "Hespan": {
                "Heparin": { "compatibility": {"ySite": "Variable"}, "notes": "n", "source": "s" }
            }
        });

        let doc = Document::from_value(value).unwrap();
        assert_eq!(doc.drug_names(), vec!["Heparin", "Hespan"]);
        assert_eq!(doc.meta.last_update, NaiveDate::from_ymd_opt(2025, 3, 1).unwrap());
        assert_eq!(
            doc.get_pair("Heparin", "Hespan").unwrap().compatibility.get(Route::YSite),
            Compatibility::Variable
        );
    }

    #[test]
    fn test_from_value_missing_metadata_uses_defaults() {
        let doc = Document::from_value(json!({ "Heparin": {} })).unwrap();
        assert_eq!(doc.meta.schema_version, SUPPORTED_SCHEMA_VERSION);
        assert!(doc.meta.bi_directional);
        assert_eq!(doc.drug_count(), 1);
    }

    #[test]
    fn test_from_value_rejects_bad_shapes() {
        assert!(matches!(Document::from_value(json!([1, 2])), Err(DocumentError::NotAnObject)));
        assert!(matches!(
            Document::from_value(json!({ "Heparin": "oops" })),
            Err(DocumentError::Drug { .. })
        ));
        assert!(matches!(
            Document::from_value(json!({
                "Heparin": { "Hespan": { "compatibility": {"iv": "Compatible"} } }
            })),
            Err(DocumentError::Drug { .. })
        ));
        assert!(matches!(
            Document::from_value(json!({ "schemaVersion": 2.0 })),
            Err(DocumentError::UnsupportedSchema { .. })
        ));
        assert!(matches!(
            Document::from_value(json!({ "lastUpdate": "yesterday" })),
            Err(DocumentError::Metadata { .. })
        ));
    }

    #[test]
    fn test_to_value_round_trip() {
        let mut doc = Document::new();
        doc.insert_pair("Heparin", "Vancomycin", entry("ok")).unwrap();
        doc.insert_pair("Heparin", "Dopamine", PairEntry::default()).unwrap();

        let restored = Document::from_value(doc.to_value().unwrap()).unwrap();
        assert_eq!(restored, doc);
    }

    #[test]
    fn test_asymmetries_and_repair() {
        let value = json!({
            "A": { "B": { "compatibility": {}, "notes": "x", "source": "" },
                   "C": { "compatibility": {}, "notes": "one", "source": "" } },
            "C": { "A": { "compatibility": {}, "notes": "two", "source": "" } }
        });
        let mut doc = Document::from_value(value).unwrap();

        let found = doc.asymmetries();
        assert_eq!(found.len(), 2);
        assert!(found.contains(&Asymmetry::MissingReverse { from: "A".into(), to: "B".into() }));
        assert!(found.contains(&Asymmetry::Mismatch { a: "A".into(), b: "C".into() }));

        assert_eq!(doc.repair_missing_reverse(), 1);
        assert_eq!(doc.get_pair("B", "A").unwrap().notes, "x");
        assert_eq!(doc.asymmetries(), vec![Asymmetry::Mismatch { a: "A".into(), b: "C".into() }]);
    }

    #[test]
    fn test_find_drug_case_insensitive() {
        let mut doc = Document::new();
        doc.insert_pair("Heparin", "Vancomycin", entry("ok")).unwrap();
        assert_eq!(doc.find_drug("heparin"), Some("Heparin"));
        assert_eq!(doc.find_drug(" VANCOMYCIN "), Some("Vancomycin"));
        assert_eq!(doc.find_drug("Insulin"), None);
    }

    #[test]
    fn test_pair_stored_under_later_drug_only() {
        let value = json!({
            "Vancomycin": {
                "Heparin": {
                    "compatibility": {"ySite": "Compatible"},
                    "notes": "stale",
                    "source": ""
                }
            }
        });
        let mut doc = Document::from_value(value).unwrap();

        assert_eq!(
            doc.unordered_pairs(),
            vec![("Heparin".to_string(), "Vancomycin".to_string())]
        );
        assert_eq!(doc.pair_count(), 1);
        assert_eq!(doc.find_pair("Heparin", "Vancomycin").unwrap().notes, "stale");

        let visited = doc.update_pair("Heparin", "Vancomycin", |e| e.notes = "fresh".to_string());
        assert_eq!(visited, 1);
        assert_eq!(doc.get_pair("Vancomycin", "Heparin").unwrap().notes, "fresh");
        assert!(doc.get_pair("Heparin", "Vancomycin").is_none());
    }

    #[test]
    fn test_update_pair_touches_both_directions() {
        let mut doc = Document::new();
        doc.insert_pair("Heparin", "Vancomycin", entry("old")).unwrap();
        doc.insert_pair("Heparin", "Heparin", entry("self")).unwrap();

        assert_eq!(doc.update_pair("Vancomycin", "Heparin", |e| e.notes = "new".into()), 2);
        assert_eq!(doc.get_pair("Heparin", "Vancomycin"), doc.get_pair("Vancomycin", "Heparin"));
        assert_eq!(doc.get_pair("Heparin", "Vancomycin").unwrap().notes, "new");

        assert_eq!(doc.update_pair("Heparin", "Heparin", |e| e.notes = "x".into()), 1);
        assert_eq!(doc.update_pair("Heparin", "Insulin", |e| e.notes = "x".into()), 0);
    }

    #[test]
    fn test_unordered_pairs_once() {
        let mut doc = Document::new();
        doc.insert_pair("B", "A", entry("1")).unwrap();
        doc.insert_pair("A", "C", entry("2")).unwrap();
        assert_eq!(
            doc.unordered_pairs(),
            vec![("A".to_string(), "B".to_string()), ("A".to_string(), "C".to_string())]
        );
    }
}
