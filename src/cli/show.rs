//! `ivcompat show` command
//!
//! # Usage
//! ```bash
//! ivcompat show heparin             # list Heparin's partners
//! ivcompat show heparin dopamine    # print the full pair entry
//! ```

use anyhow::{bail, Context, Result};
use clap::Args;
use colored::{ColoredString, Colorize};

use crate::config::Config;
use crate::core::compat::{Compatibility, PairEntry, Route};
use crate::core::document::Document;
use crate::core::resolver::{Lookup, Resolver};
use crate::core::store::DocumentStore;

#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Drug name (case-insensitive)
    pub drug: String,

    /// Partner drug; prints the full pair entry
    pub other: Option<String>,
}

pub fn run(args: ShowArgs, config: &Config) -> Result<()> {
    let path = config.data_path();
    let doc = DocumentStore::new(&path)
        .load_strict()
        .with_context(|| format!("Cannot read {}", path.display()))?;
    let resolver = Resolver::new(&config.resolver);

    let drug = resolve_known(&doc, &resolver, &args.drug)?;

    match args.other {
        Some(other) => {
            let other = resolve_known(&doc, &resolver, &other)?;
            match doc.get_pair(&drug, &other) {
                Some(entry) => print_pair(&drug, &other, entry),
                None => bail!("No entry recorded for {} + {}", drug, other),
            }
        }
        None => {
            let partners = doc.partners(&drug).map(|p| p.len()).unwrap_or(0);
            println!("💊 {} ({} partner(s))\n", drug.bold(), partners);
            for (partner, entry) in doc.partners(&drug).into_iter().flatten() {
                let routes: Vec<String> = Route::ENTRY_ORDER
                    .iter()
                    .map(|route| {
                        let value = entry.compatibility.get(*route);
                        format!("{}: {}", route.label(), paint(value))
                    })
                    .collect();
                println!("  {}", partner.cyan());
                println!("    {}", routes.join("  "));
            }
        }
    }

    Ok(())
}

/// Map user input to a stored drug name, with a hint when nothing matches
fn resolve_known(doc: &Document, resolver: &Resolver, input: &str) -> Result<String> {
    if let Some(name) = doc.find_drug(input) {
        return Ok(name.to_string());
    }

    let names = doc.drug_names();
    match resolver.lookup(input, &names) {
        Lookup::Candidates(found) => bail!(
            "Unknown drug: {}. Did you mean: {}?",
            input.trim(),
            found.join(", ")
        ),
        Lookup::Suggestion(name) => bail!("Unknown drug: {}. Did you mean {}?", input.trim(), name),
        Lookup::NoMatch => bail!("Unknown drug: {}", input.trim()),
    }
}

fn print_pair(a: &str, b: &str, entry: &PairEntry) {
    println!("💊 {} + {}\n", a.bold(), b.bold());
    for route in Route::ENTRY_ORDER {
        println!("  {:<10} {}", route.label(), paint(entry.compatibility.get(route)));
    }
    println!("\n  📝 {}", entry.notes);
    println!("  📚 {}", entry.source);
}

fn paint(value: Compatibility) -> ColoredString {
    match value {
        Compatibility::Compatible => value.as_str().green(),
        Compatibility::Incompatible => value.as_str().red(),
        Compatibility::Variable => value.as_str().yellow(),
        Compatibility::NoData => value.as_str().dimmed(),
    }
}
