//! ivcompat - IV drug compatibility knowledge base
//!
//! Keeps pairwise IV-compatibility data for drugs in one JSON document and
//! generates clinical notes from it.
//!
//! ## Key Concepts
//!
//! - **Routes**: solution, Y-site, syringe and admixture, each Compatible,
//!   Incompatible, Variable or No Data
//! - **Symmetric pairs**: every entry is stored under both drug names
//! - **Generated notes**: one rule-based generator shared by the entry
//!   workflow and the `regen-notes` pass
//! - **Whole-document saves**: the file is rewritten atomically on every save

pub mod cli;
pub mod config;
pub mod core;

pub use config::Config;
pub use core::compat::{Compatibility, CompatibilityRecord, PairEntry, Route};
pub use core::document::Document;
pub use core::note::{generate as generate_note, NoteParts};
pub use core::resolver::{Lookup, Resolver};
pub use core::store::DocumentStore;
