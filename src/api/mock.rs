//! Scripted in-memory catalog source for tests.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::error::SyncError;

use super::client::CatalogSource;
use super::types::{
  ApiNamedResource, ApiSprites, ApiStatSlot, ApiSummary, ApiTypeSlot, DetailResponse, PageResponse,
};

/// In-memory catalog with counters for verifying how many network round-trips
/// an operation performed.
pub struct MockSource {
  names: Vec<String>,
  fail_detail: Mutex<HashSet<i64>>,
  fail_list: AtomicBool,
  list_calls: AtomicUsize,
  detail_calls: AtomicUsize,
}

impl MockSource {
  /// Catalog of `n` items with ids `1..=n` named `item-1`, `item-2`, ...
  pub fn with_items(n: usize) -> Self {
    Self {
      names: (1..=n).map(|i| format!("item-{}", i)).collect(),
      fail_detail: Mutex::new(HashSet::new()),
      fail_list: AtomicBool::new(false),
      list_calls: AtomicUsize::new(0),
      detail_calls: AtomicUsize::new(0),
    }
  }

  /// Make detail lookups for the given ids fail with a network error.
  pub fn fail_detail_for(&self, ids: impl IntoIterator<Item = i64>) {
    self.fail_detail.lock().unwrap().extend(ids);
  }

  pub fn set_fail_list(&self, fail: bool) {
    self.fail_list.store(fail, Ordering::SeqCst);
  }

  pub fn list_calls(&self) -> usize {
    self.list_calls.load(Ordering::SeqCst)
  }

  pub fn detail_calls(&self) -> usize {
    self.detail_calls.load(Ordering::SeqCst)
  }

  fn summary(&self, id: i64) -> ApiSummary {
    ApiSummary {
      name: self.names[(id - 1) as usize].clone(),
      url: format!("https://pokeapi.co/api/v2/pokemon/{}/", id),
    }
  }
}

impl CatalogSource for MockSource {
  async fn list_page(&self, limit: u32, offset: u32) -> Result<PageResponse, SyncError> {
    self.list_calls.fetch_add(1, Ordering::SeqCst);

    if self.fail_list.load(Ordering::SeqCst) {
      return Err(SyncError::Network {
        reason: "connection refused".to_string(),
      });
    }

    let total = self.names.len();
    let start = (offset as usize).min(total);
    let end = (start + limit as usize).min(total);
    let results = (start..end).map(|i| self.summary(i as i64 + 1)).collect();

    Ok(PageResponse {
      count: total as u64,
      next: None,
      previous: None,
      results,
    })
  }

  async fn get_detail(&self, id: i64) -> Result<DetailResponse, SyncError> {
    self.detail_calls.fetch_add(1, Ordering::SeqCst);

    if self.fail_detail.lock().unwrap().contains(&id) {
      return Err(SyncError::Network {
        reason: "timed out".to_string(),
      });
    }
    if id < 1 || id as usize > self.names.len() {
      return Err(SyncError::NotFound { id });
    }

    Ok(DetailResponse {
      id,
      name: self.names[(id - 1) as usize].clone(),
      height: 7,
      weight: 69,
      types: vec![
        ApiTypeSlot {
          slot: 1,
          kind: ApiNamedResource {
            name: "grass".to_string(),
            url: String::new(),
          },
        },
        ApiTypeSlot {
          slot: 2,
          kind: ApiNamedResource {
            name: "poison".to_string(),
            url: String::new(),
          },
        },
      ],
      stats: vec![ApiStatSlot {
        base_stat: 45,
        stat: ApiNamedResource {
          name: "hp".to_string(),
          url: String::new(),
        },
      }],
      abilities: Vec::new(),
      sprites: ApiSprites {
        front_default: Some(format!("https://example.com/sprites/{}.png", id)),
      },
    })
  }
}
