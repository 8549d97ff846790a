//! Resolver - Drug name lookup
//!
//! Matches free-text input against the drug names already in the document.
//!
//! 1. Case-insensitive substring match, up to `max_suggestions` candidates
//!    in document order
//! 2. Only when stage 1 finds nothing: the closest name by normalized edit
//!    distance, if its similarity reaches `fuzzy_cutoff`
//!
//! Anything else is treated as a new drug name by the caller.

use std::ops::Range;

use crate::config::ResolverConfig;

/// Outcome of looking up a name
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    /// Known names containing the query
    Candidates(Vec<String>),
    /// Closest known name above the similarity cutoff
    Suggestion(String),
    /// Nothing similar is known
    NoMatch,
}

#[derive(Debug, Clone)]
pub struct Resolver {
    max_suggestions: usize,
    fuzzy_cutoff: f64,
}

impl Default for Resolver {
    fn default() -> Self {
        Self::new(&ResolverConfig::default())
    }
}

impl Resolver {
    pub fn new(config: &ResolverConfig) -> Self {
        Self {
            max_suggestions: config.max_suggestions.max(1),
            fuzzy_cutoff: config.fuzzy_cutoff.clamp(0.0, 1.0),
        }
    }

    /// Run both lookup stages
    pub fn lookup(&self, query: &str, names: &[&str]) -> Lookup {
        let query = query.trim();
        if query.is_empty() {
            return Lookup::NoMatch;
        }

        let candidates = self.substring_candidates(query, names);
        if !candidates.is_empty() {
            return Lookup::Candidates(candidates);
        }

        match self.fuzzy_match(query, names) {
            Some(name) => Lookup::Suggestion(name),
            None => Lookup::NoMatch,
        }
    }

    /// Names containing `query`, ignoring case
    pub fn substring_candidates(&self, query: &str, names: &[&str]) -> Vec<String> {
        let needle = query.to_lowercase();
        names
            .iter()
            .filter(|name| name.to_lowercase().contains(&needle))
            .take(self.max_suggestions)
            .map(|name| name.to_string())
            .collect()
    }

    /// Most similar name at or above the cutoff; ties keep document order
    pub fn fuzzy_match(&self, query: &str, names: &[&str]) -> Option<String> {
        let mut best: Option<(&str, f64)> = None;

        for name in names {
            let score = similarity(query, name);
            if score < self.fuzzy_cutoff {
                continue;
            }
            if best.map_or(true, |(_, s)| score > s) {
                best = Some((*name, score));
            }
        }

        best.map(|(name, _)| name.to_string())
    }
}

/// Known name equal to `input` ignoring case
pub fn canonical<'a>(input: &str, names: &[&'a str]) -> Option<&'a str> {
    let input = input.trim().to_lowercase();
    names.iter().copied().find(|name| name.to_lowercase() == input)
}

/// Byte range of the first case-insensitive occurrence of `query` in `name`
///
/// Returns `None` when lowercasing changes the byte length of `name`.
pub fn match_range(name: &str, query: &str) -> Option<Range<usize>> {
    let lower = name.to_lowercase();
    if lower.len() != name.len() || query.is_empty() {
        return None;
    }
    let needle = query.to_lowercase();
    let start = lower.find(&needle)?;
    let end = start + needle.len();
    (name.is_char_boundary(start) && name.is_char_boundary(end)).then_some(start..end)
}

/// Similarity in `[0, 1]`: `1 - levenshtein / longer length`, ignoring case
pub fn similarity(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.to_lowercase().chars().collect();
    let b: Vec<char> = b.to_lowercase().chars().collect();
    let longest = a.len().max(b.len());
    if longest == 0 {
        return 1.0;
    }
    1.0 - levenshtein(&a, &b) as f64 / longest as f64
}

fn levenshtein(a: &[char], b: &[char]) -> usize {
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    // Two DP rows: distances between `a[..i]` and `b[..j]`
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr: Vec<usize> = vec![0; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for j in 1..=b.len() {
            let cost = if *ca == b[j - 1] { 0 } else { 1 };
            let deletion = prev[j] + 1;
            let insertion = curr[j - 1] + 1;
            let substitution = prev[j - 1] + cost;
            curr[j] = deletion.min(insertion).min(substitution);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}
