//! Single read entry point for presentation.
//!
//! Resolves list, search, and detail queries against the store, invoking the
//! sync engine only on a cache miss or an explicit page load. State is
//! published through `watch` channels: the current item list, a loading flag,
//! and the last error message (cleared on the next successful operation).
//!
//! The unfiltered read contract: the visible list is every row synced so far,
//! `get_items(cursor, 0)`. Search reads only and never contends with the
//! sync guard; `load_more` and the background scheduler share the engine's
//! single in-flight guard, so a second load observes the guard and performs
//! no network call.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::debug;

use crate::api::CatalogSource;
use crate::error::SyncError;
use crate::model::{Item, ItemDetail, SearchFilter};
use crate::store::ItemStore;
use crate::sync::SyncEngine;

pub struct CatalogFacade<C, S> {
  engine: Arc<SyncEngine<C, S>>,
  items_tx: watch::Sender<Vec<Item>>,
  loading_tx: watch::Sender<bool>,
  error_tx: watch::Sender<Option<String>>,
  filter_tx: watch::Sender<SearchFilter>,
}

impl<C: CatalogSource, S: ItemStore> CatalogFacade<C, S> {
  pub fn new(engine: Arc<SyncEngine<C, S>>) -> Self {
    Self {
      engine,
      items_tx: watch::channel(Vec::new()).0,
      loading_tx: watch::channel(false).0,
      error_tx: watch::channel(None).0,
      filter_tx: watch::channel(SearchFilter::NoFilter).0,
    }
  }

  /// Current item list stream.
  pub fn items(&self) -> watch::Receiver<Vec<Item>> {
    self.items_tx.subscribe()
  }

  /// Loading flag stream.
  pub fn loading(&self) -> watch::Receiver<bool> {
    self.loading_tx.subscribe()
  }

  /// Last error message, cleared on the next successful operation.
  pub fn last_error(&self) -> watch::Receiver<Option<String>> {
    self.error_tx.subscribe()
  }

  /// First read at startup. If the store is empty, performs one blocking
  /// sync of the first page before reading; otherwise serves straight from
  /// the store. A failed first sync leaves the list empty with the error
  /// surfaced.
  pub async fn initial_load(&self, page_size: u32) -> Result<Vec<Item>, SyncError> {
    self.loading_tx.send_replace(true);
    let result = self.initial_load_inner(page_size).await;
    self.loading_tx.send_replace(false);
    self.publish(result)
  }

  async fn initial_load_inner(&self, page_size: u32) -> Result<Vec<Item>, SyncError> {
    if self.engine.item_count()? == 0 {
      // A concurrent cycle already filling the store means we just read
      // whatever it commits; otherwise sync the first page ourselves.
      if let Some(guard) = self.engine.state().try_begin_cycle() {
        self.engine.sync_page(page_size, 0).await?;
        guard.advance_cursor(page_size);
      }
    }

    let cursor = self.engine.state().cursor();
    Ok(self.engine.store().get_items(cursor, 0)?)
  }

  /// Resolve a search against the store. Never triggers a network fetch and
  /// never contends with the sync guard; `NoFilter` falls through to the
  /// unfiltered paged read.
  pub fn search(&self, filter: SearchFilter) -> Result<Vec<Item>, SyncError> {
    let items = match &filter {
      SearchFilter::NoFilter => {
        let cursor = self.engine.state().cursor();
        self.engine.store().get_items(cursor, 0)?
      }
      SearchFilter::ByName(q) => self.engine.store().find_by_name(q)?,
      SearchFilter::ByCategory(q) => self.engine.store().find_by_category(q)?,
    };

    self.filter_tx.send_replace(filter);
    self.publish(Ok(items))
  }

  /// Sync the next page and re-issue the unfiltered read. Returns `false`
  /// without touching the network when a load is already in progress or a
  /// filter is active. A failed load leaves the published list intact.
  pub async fn load_more(&self, page_size: u32) -> Result<bool, SyncError> {
    if self.filter_tx.borrow().is_active() {
      debug!("filter active, ignoring load_more");
      return Ok(false);
    }
    let Some(guard) = self.engine.state().try_begin_cycle() else {
      debug!("load already in progress, ignoring load_more");
      return Ok(false);
    };

    self.loading_tx.send_replace(true);
    let result = async {
      self.engine.sync_page(page_size, guard.cursor()).await?;
      guard.advance_cursor(page_size);
      Ok(self.engine.store().get_items(guard.cursor(), 0)?)
    }
    .await;
    self.loading_tx.send_replace(false);

    self.publish(result).map(|_| true)
  }

  /// Detail read, filled from the network on a store miss.
  pub async fn detail(&self, id: i64) -> Result<ItemDetail, SyncError> {
    self.loading_tx.send_replace(true);
    let result = self.engine.get_or_fetch_detail(id).await;
    self.loading_tx.send_replace(false);

    match &result {
      Ok(_) => {
        self.error_tx.send_replace(None);
      }
      Err(e) => {
        self.error_tx.send_replace(Some(e.to_string()));
      }
    }
    result
  }

  /// Rewind the cursor to zero and clear the published list. Explicit user
  /// action only; returns `false` while a cycle is in flight.
  pub fn reset(&self) -> bool {
    let Some(guard) = self.engine.state().try_begin_cycle() else {
      return false;
    };
    guard.reset_cursor();
    self.items_tx.send_replace(Vec::new());
    true
  }

  /// Publish a read result: success replaces the list and clears the error,
  /// failure surfaces the error and leaves the list as it was.
  fn publish(&self, result: Result<Vec<Item>, SyncError>) -> Result<Vec<Item>, SyncError> {
    match result {
      Ok(items) => {
        self.items_tx.send_replace(items.clone());
        self.error_tx.send_replace(None);
        Ok(items)
      }
      Err(e) => {
        self.error_tx.send_replace(Some(e.to_string()));
        Err(e)
      }
    }
  }
}
