//! The fetch-transform-upsert core.
//!
//! A sync cycle requests one page of summaries, resolves one detail record
//! per summary to derive the category label and image URL (one round-trip per
//! item, no batching), and commits the surviving batch to the store in a
//! single call. Per-item resolution failures drop that item and continue; a
//! failed page-list request aborts the whole cycle with nothing written.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, warn};
use url::Url;

use crate::api::types::{ApiSummary, DetailResponse};
use crate::api::CatalogSource;
use crate::error::{StoreError, SyncError};
use crate::model::{Item, ItemDetail};
use crate::store::ItemStore;

use super::state::SyncState;

/// Typed partial result of one sync cycle: the items that made it into the
/// store, plus how many summaries were dropped on the way.
#[derive(Debug)]
pub struct PageSyncOutcome {
  pub items: Vec<Item>,
  pub failed: usize,
}

pub struct SyncEngine<C, S> {
  source: C,
  store: Arc<S>,
  state: SyncState,
}

impl<C: CatalogSource, S: ItemStore> SyncEngine<C, S> {
  pub fn new(source: C, store: Arc<S>, initial_cursor: u32) -> Self {
    Self {
      source,
      store,
      state: SyncState::new(initial_cursor),
    }
  }

  /// Pagination cursor and in-flight guard; callers claim a cycle through
  /// [`SyncState::try_begin_cycle`] before invoking [`Self::sync_page`].
  pub fn state(&self) -> &SyncState {
    &self.state
  }

  pub fn store(&self) -> &S {
    &self.store
  }

  #[cfg(test)]
  pub(crate) fn source(&self) -> &C {
    &self.source
  }

  pub fn item_count(&self) -> Result<u32, StoreError> {
    self.store.get_item_count()
  }

  /// Fetch one page of summaries at the given window, enrich each with its
  /// detail record, and upsert the batch.
  ///
  /// The batch commits only after every per-item resolution has finished, so
  /// readers never observe a partial page mid-cycle. Applying the same page
  /// twice with identical upstream data leaves the store unchanged.
  pub async fn sync_page(&self, page_size: u32, offset: u32) -> Result<PageSyncOutcome, SyncError> {
    debug_assert!(page_size > 0);
    debug!(page_size, offset, "syncing catalog page");

    let page = self.source.list_page(page_size, offset).await?;

    let mut items = Vec::with_capacity(page.results.len());
    let mut failed = 0usize;
    for summary in &page.results {
      match self.resolve_summary(summary).await {
        Ok(item) => items.push(item),
        Err(e) => {
          // Drop this summary, keep the rest of the batch.
          warn!(name = %summary.name, error = %e, "dropping summary from batch");
          failed += 1;
        }
      }
    }

    self.store.upsert_items(&items)?;
    debug!(stored = items.len(), failed, "page committed");

    Ok(PageSyncOutcome { items, failed })
  }

  /// Detail read, store-first. On a miss the record is fetched, its payload
  /// lists serialized, and the result upserted before returning. Details are
  /// immutable once fetched; concurrent duplicate fetches are harmless
  /// because the upsert is last-write-wins with identical content.
  pub async fn get_or_fetch_detail(&self, id: i64) -> Result<ItemDetail, SyncError> {
    if let Some(detail) = self.store.get_detail(id)? {
      return Ok(detail);
    }

    let response = self.source.get_detail(id).await?;
    let detail = to_detail(response)?;
    self.store.upsert_detail(&detail)?;
    Ok(detail)
  }

  /// One summary -> one item, via a detail round-trip for the category label
  /// and image URL.
  async fn resolve_summary(&self, summary: &ApiSummary) -> Result<Item, SyncError> {
    let id = parse_item_id(&summary.url)?;
    let detail = self.source.get_detail(id).await?;

    let category = detail
      .types
      .iter()
      .map(|slot| slot.kind.name.as_str())
      .collect::<Vec<_>>()
      .join(", ");

    Ok(Item {
      id: detail.id,
      name: summary.name.clone(),
      category,
      reference_url: summary.url.clone(),
      image_url: detail.sprites.front_default.unwrap_or_default(),
      fetched_at: Utc::now(),
    })
  }
}

fn to_detail(response: DetailResponse) -> Result<ItemDetail, SyncError> {
  let types_json = serde_json::to_string(&response.types).map_err(StoreError::from)?;
  let stats_json = serde_json::to_string(&response.stats).map_err(StoreError::from)?;
  let abilities_json = serde_json::to_string(&response.abilities).map_err(StoreError::from)?;

  Ok(ItemDetail {
    id: response.id,
    name: response.name,
    height: response.height,
    weight: response.weight,
    types_json,
    stats_json,
    abilities_json,
    image_url: response.sprites.front_default.unwrap_or_default(),
  })
}

/// The list endpoint encodes the item id as the trailing path segment of the
/// reference URL (e.g. `.../pokemon/25/`).
fn parse_item_id(reference_url: &str) -> Result<i64, SyncError> {
  let parsed = Url::parse(reference_url).map_err(|e| SyncError::Transform {
    reason: format!("invalid reference url {}: {}", reference_url, e),
  })?;

  parsed
    .path_segments()
    .and_then(|segments| segments.rev().find(|s| !s.is_empty()))
    .and_then(|segment| segment.parse::<i64>().ok())
    .ok_or_else(|| SyncError::Transform {
      reason: format!("no item id in reference url {}", reference_url),
    })
}
