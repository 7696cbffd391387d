//! Card catalog and deck loaders
//!
//! Catalog records are JSON; every printed text is run through the effect
//! compiler at load time. Decks use a small line-oriented `.deck` format.

pub mod catalog;
pub mod database_async;
pub mod deck;

pub use catalog::{compile_record, parse_records, CardCatalog, CatalogRecord, CompileFailure, CompileReport};
pub use database_async::AsyncCardCatalog;
pub use deck::{DeckEntry, DeckList, DeckLoader, DeckSpec};
