//! Stats command - Show document statistics

use std::collections::BTreeMap;

use anyhow::Context;
use clap::Args;

use crate::config::Config;
use crate::core::compat::{Compatibility, Route};
use crate::core::document::Document;
use crate::core::store::DocumentStore;

/// Stats command arguments
#[derive(Args, Debug)]
pub struct StatsArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Value counts over every distinct pair
#[derive(Debug, Default, PartialEq)]
pub struct Stats {
    pub drugs: usize,
    pub pairs: usize,
    pub routes: BTreeMap<Route, BTreeMap<Compatibility, usize>>,
}

impl Stats {
    pub fn collect(doc: &Document) -> Self {
        let mut routes: BTreeMap<Route, BTreeMap<Compatibility, usize>> = BTreeMap::new();

        for (a, b) in doc.unordered_pairs() {
            let Some(entry) = doc.find_pair(&a, &b) else {
                continue;
            };
            for route in Route::ENTRY_ORDER {
                *routes
                    .entry(route)
                    .or_default()
                    .entry(entry.compatibility.get(route))
                    .or_default() += 1;
            }
        }

        Self {
            drugs: doc.drug_count(),
            pairs: doc.pair_count(),
            routes,
        }
    }

    pub fn count(&self, route: Route, value: Compatibility) -> usize {
        self.routes
            .get(&route)
            .and_then(|counts| counts.get(&value))
            .copied()
            .unwrap_or(0)
    }
}

/// Execute stats command
pub fn execute(args: StatsArgs, config: &Config) -> anyhow::Result<()> {
    let path = config.data_path();
    let doc = DocumentStore::new(&path)
        .load_strict()
        .with_context(|| format!("Cannot read {}", path.display()))?;
    let stats = Stats::collect(&doc);

    if args.json {
        let mut routes = serde_json::Map::new();
        for route in Route::ENTRY_ORDER {
            let counts: serde_json::Map<String, serde_json::Value> = Compatibility::ALL
                .iter()
                .map(|value| (value.as_str().to_string(), stats.count(route, *value).into()))
                .collect();
            routes.insert(route.key().to_string(), counts.into());
        }

        let json = serde_json::json!({
            "drugs": stats.drugs,
            "pairs": stats.pairs,
            "lastUpdate": doc.meta.last_update.format("%Y-%m-%d").to_string(),
            "routes": routes,
        });
        println!("{}", serde_json::to_string_pretty(&json)?);
    } else {
        println!("📊 Compatibility Document Statistics\n");
        println!("  Drugs:        {}", stats.drugs);
        println!("  Pairs:        {}", stats.pairs);
        println!("  Last update:  {}", doc.meta.last_update.format("%Y-%m-%d"));

        if stats.pairs > 0 {
            println!();
            println!(
                "  {:<10} {:>10} {:>12} {:>8} {:>8}",
                "Route", "Compatible", "Incompatible", "Variable", "No Data"
            );
            for route in Route::ENTRY_ORDER {
                println!(
                    "  {:<10} {:>10} {:>12} {:>8} {:>8}",
                    route.label(),
                    stats.count(route, Compatibility::Compatible),
                    stats.count(route, Compatibility::Incompatible),
                    stats.count(route, Compatibility::Variable),
                    stats.count(route, Compatibility::NoData),
                );
            }
        }

        println!("\n📁 Document: {}", path.display());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::compat::{CompatibilityRecord, PairEntry};

    #[test]
    fn test_collect_counts_each_pair_once() {
        let mut doc = Document::new();
        let record = CompatibilityRecord::new()
            .with(Route::YSite, Compatibility::Incompatible)
            .with(Route::Solution, Compatibility::Compatible);
        doc.insert_pair("Heparin", "Dopamine", PairEntry::new(record, "", ""))
            .unwrap();
        doc.insert_pair(
            "Heparin",
            "Insulin",
            PairEntry::new(CompatibilityRecord::uniform(Compatibility::Variable), "", ""),
        )
        .unwrap();

        let stats = Stats::collect(&doc);
        assert_eq!(stats.drugs, 3);
        assert_eq!(stats.pairs, 2);
        assert_eq!(stats.count(Route::YSite, Compatibility::Incompatible), 1);
        assert_eq!(stats.count(Route::YSite, Compatibility::Variable), 1);
        assert_eq!(stats.count(Route::Syringe, Compatibility::NoData), 1);
        assert_eq!(stats.count(Route::Admixture, Compatibility::Compatible), 0);
    }

    #[test]
    fn test_collect_pair_stored_one_way() {
        let value = serde_json::json!({
            "Vancomycin": { "Heparin": { "compatibility": {"ySite": "Variable"} } }
        });
        let doc = Document::from_value(value).unwrap();

        let stats = Stats::collect(&doc);
        assert_eq!(stats.pairs, 1);
        assert_eq!(stats.count(Route::YSite, Compatibility::Variable), 1);
    }

    #[test]
    fn test_collect_empty() {
        let stats = Stats::collect(&Document::new());
        assert_eq!(stats.drugs, 0);
        assert_eq!(stats.pairs, 0);
        assert!(stats.routes.is_empty());
    }
}
