//! Compatibility - routes, values and pair entries
//!
//! A pair of drugs is described by one categorical value per administration
//! route. Values serialize exactly as they appear in the stored document
//! (`"Compatible"`, `"Incompatible"`, `"Variable"`, `"No Data"`).
//!
//! # Key Points
//! - A route missing from a record reads as [`Compatibility::NoData`]
//! - Stored records are normalized: NoData entries are dropped, so an
//!   all-NoData record is stored as `{}`

use std::collections::BTreeMap;
use std::fmt;

use anyhow::bail;
use serde::{Deserialize, Serialize};

/// Administration route
///
/// Variants are declared in serialized-key order so that `Ord` matches the
/// sorted key order of the persisted document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Route {
    #[serde(rename = "admixture")]
    Admixture,
    #[serde(rename = "solution")]
    Solution,
    #[serde(rename = "syringe")]
    Syringe,
    #[serde(rename = "ySite")]
    YSite,
}

impl Route {
    /// Order in which routes are prompted for and listed
    pub const ENTRY_ORDER: [Route; 4] =
        [Route::Solution, Route::YSite, Route::Syringe, Route::Admixture];

    /// Key used in the persisted document
    pub fn key(&self) -> &'static str {
        match self {
            Route::Admixture => "admixture",
            Route::Solution => "solution",
            Route::Syringe => "syringe",
            Route::YSite => "ySite",
        }
    }

    /// Human label for prompts and review screens
    pub fn label(&self) -> &'static str {
        match self {
            Route::Admixture => "Admixture",
            Route::Solution => "Solution",
            Route::Syringe => "Syringe",
            Route::YSite => "Y-Site",
        }
    }

    /// Keys in entry order, as stored in the `compatibilityKeys` metadata
    pub fn entry_keys() -> Vec<String> {
        Self::ENTRY_ORDER.iter().map(|r| r.key().to_string()).collect()
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

/// Compatibility of a drug pair on one route
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub enum Compatibility {
    Compatible,
    Incompatible,
    Variable,
    #[default]
    #[serde(rename = "No Data")]
    NoData,
}

impl Compatibility {
    pub const ALL: [Compatibility; 4] = [
        Compatibility::Compatible,
        Compatibility::Incompatible,
        Compatibility::Variable,
        Compatibility::NoData,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Compatibility::Compatible => "Compatible",
            Compatibility::Incompatible => "Incompatible",
            Compatibility::Variable => "Variable",
            Compatibility::NoData => "No Data",
        }
    }
}

impl fmt::Display for Compatibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Compatibility {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "compatible" => Ok(Compatibility::Compatible),
            "incompatible" => Ok(Compatibility::Incompatible),
            "variable" => Ok(Compatibility::Variable),
            "no data" | "nodata" | "no_data" => Ok(Compatibility::NoData),
            _ => bail!("Unknown compatibility value: {}", s),
        }
    }
}

/// Per-route compatibility values for one drug pair
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CompatibilityRecord(BTreeMap<Route, Compatibility>);

impl CompatibilityRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record with every route set explicitly to `value`
    pub fn uniform(value: Compatibility) -> Self {
        Route::ENTRY_ORDER.iter().map(|r| (*r, value)).collect()
    }

    /// Value for a route, NoData when absent
    pub fn get(&self, route: Route) -> Compatibility {
        self.0.get(&route).copied().unwrap_or_default()
    }

    pub fn set(&mut self, route: Route, value: Compatibility) {
        self.0.insert(route, value);
    }

    pub fn with(mut self, route: Route, value: Compatibility) -> Self {
        self.set(route, value);
        self
    }

    /// Resolved values in entry order (solution, ySite, syringe, admixture)
    pub fn values(&self) -> [Compatibility; 4] {
        Route::ENTRY_ORDER.map(|r| self.get(r))
    }

    /// True when every route resolves to NoData (including the empty record)
    pub fn is_all_no_data(&self) -> bool {
        self.values().iter().all(|v| *v == Compatibility::NoData)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of explicitly stored routes
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Drop NoData entries; an all-NoData record becomes empty
    pub fn normalized(&self) -> Self {
        Self(
            self.0
                .iter()
                .filter(|(_, v)| **v != Compatibility::NoData)
                .map(|(r, v)| (*r, *v))
                .collect(),
        )
    }

    pub fn iter(&self) -> impl Iterator<Item = (Route, Compatibility)> + '_ {
        self.0.iter().map(|(r, v)| (*r, *v))
    }
}

impl FromIterator<(Route, Compatibility)> for CompatibilityRecord {
    fn from_iter<I: IntoIterator<Item = (Route, Compatibility)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Compatibility entry for one drug pair, stored under both drug names
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PairEntry {
    #[serde(default)]
    pub compatibility: CompatibilityRecord,

    #[serde(default)]
    pub notes: String,

    #[serde(default)]
    pub source: String,
}

impl PairEntry {
    pub fn new(
        compatibility: CompatibilityRecord,
        notes: impl Into<String>,
        source: impl Into<String>,
    ) -> Self {
        Self {
            compatibility,
            notes: notes.into(),
            source: source.into(),
        }
    }

    /// Same entry with its compatibility record normalized
    pub fn normalized(mut self) -> Self {
        self.compatibility = self.compatibility.normalized();
        self
    }
}
