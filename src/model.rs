//! Domain types, separate from the wire types in `api::types`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Catalog entry for list views. Overwritten whole on every re-sync of the
/// same id; never deleted (the store is a permanent offline cache).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
  pub id: i64,
  pub name: String,
  /// Comma-joined type names, derived from the detail record during sync.
  pub category: String,
  pub reference_url: String,
  pub image_url: String,
  pub fetched_at: DateTime<Utc>,
}

/// Full per-item payload, fetched lazily on first detail read and treated as
/// immutable thereafter. The three payload lists are stored as opaque JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemDetail {
  pub id: i64,
  pub name: String,
  pub height: i64,
  pub weight: i64,
  pub types_json: String,
  pub stats_json: String,
  pub abilities_json: String,
  pub image_url: String,
}

/// Filter applied to catalog reads.
///
/// An empty query means "no filter" and falls through to the unfiltered
/// paged list, not to "match nothing".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchFilter {
  NoFilter,
  ByName(String),
  ByCategory(String),
}

impl SearchFilter {
  /// Build a filter from raw search-box input.
  pub fn from_query(query: &str, by_category: bool) -> Self {
    let query = query.trim();
    if query.is_empty() {
      SearchFilter::NoFilter
    } else if by_category {
      SearchFilter::ByCategory(query.to_string())
    } else {
      SearchFilter::ByName(query.to_string())
    }
  }

  pub fn is_active(&self) -> bool {
    !matches!(self, SearchFilter::NoFilter)
  }
}
