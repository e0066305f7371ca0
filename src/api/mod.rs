//! Remote catalog source: capability trait, HTTP client, and wire types.

mod client;
pub mod types;

#[cfg(test)]
pub mod mock;

pub use client::{CatalogSource, PokeApiClient};
