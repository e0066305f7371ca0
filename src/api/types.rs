//! Serde-deserializable types matching the catalog API responses.
//!
//! These types are separate from domain types to allow clean deserialization
//! while keeping domain types focused on application needs. The payload lists
//! on the detail response derive `Serialize` as well because they are stored
//! verbatim as JSON blobs.

use serde::{Deserialize, Serialize};

/// One page of the paged list endpoint.
#[derive(Debug, Deserialize)]
pub struct PageResponse {
  /// Total number of entries upstream, across all pages.
  #[serde(default)]
  pub count: u64,
  pub next: Option<String>,
  pub previous: Option<String>,
  #[serde(default)]
  pub results: Vec<ApiSummary>,
}

/// Lightweight catalog entry returned by the paged list endpoint. The item id
/// is not a field; it is encoded as the trailing path segment of `url`.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiSummary {
  pub name: String,
  pub url: String,
}

/// Full per-item response from the detail endpoint.
#[derive(Debug, Deserialize)]
pub struct DetailResponse {
  pub id: i64,
  pub name: String,
  #[serde(default)]
  pub height: i64,
  #[serde(default)]
  pub weight: i64,
  #[serde(default)]
  pub types: Vec<ApiTypeSlot>,
  #[serde(default)]
  pub stats: Vec<ApiStatSlot>,
  #[serde(default)]
  pub abilities: Vec<ApiAbilitySlot>,
  #[serde(default)]
  pub sprites: ApiSprites,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiNamedResource {
  pub name: String,
  #[serde(default)]
  pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiTypeSlot {
  #[serde(default)]
  pub slot: u32,
  #[serde(rename = "type")]
  pub kind: ApiNamedResource,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiStatSlot {
  #[serde(default)]
  pub base_stat: i64,
  pub stat: ApiNamedResource,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiAbilitySlot {
  pub ability: ApiNamedResource,
  #[serde(default)]
  pub is_hidden: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct ApiSprites {
  pub front_default: Option<String>,
}
