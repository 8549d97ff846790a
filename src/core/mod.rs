//! Core module - Business logic
//!
//! Compatibility model, the document and its store, name resolution, note
//! generation and the batch passes. Nothing here touches the terminal.

pub mod compat;
pub mod document;
pub mod migrate;
pub mod note;
pub mod resolver;
pub mod store;
