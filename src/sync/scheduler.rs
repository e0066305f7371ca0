//! Recurring background refresh.
//!
//! The scheduler runs one sync cycle per interval, skipping ticks outright
//! when a cycle is already in flight (drop, not queue). Stopping flips a
//! watch channel observed at the top of the wait, so no new cycle starts
//! after stop; a cycle already executing runs to completion and its writes
//! are retained.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::api::CatalogSource;
use crate::store::ItemStore;

use super::engine::SyncEngine;

/// User-facing notification sink for background updates. The CLI prints to
/// the console; tests record invocations.
pub trait Notifier: Send + Sync + 'static {
  fn items_added(&self, added: usize, total: u32);
}

pub struct SyncScheduler<C, S> {
  engine: Arc<SyncEngine<C, S>>,
  notifier: Arc<dyn Notifier>,
  interval: Duration,
  page_size: u32,
  status_tx: watch::Sender<String>,
  error_tx: watch::Sender<Option<String>>,
  task: Option<(watch::Sender<bool>, JoinHandle<()>)>,
}

impl<C, S> SyncScheduler<C, S>
where
  C: CatalogSource + 'static,
  S: ItemStore + 'static,
{
  pub fn new(
    engine: Arc<SyncEngine<C, S>>,
    notifier: Arc<dyn Notifier>,
    interval: Duration,
    page_size: u32,
  ) -> Self {
    Self {
      engine,
      notifier,
      interval,
      page_size,
      status_tx: watch::channel("background sync disabled".to_string()).0,
      error_tx: watch::channel(None).0,
      task: None,
    }
  }

  /// Start the recurring loop. Idempotent: re-enabling an already-enabled
  /// loop only refreshes the status message.
  pub fn start(&mut self) {
    let status = format!("background sync enabled (every {:?})", self.interval);
    self.status_tx.send_replace(status);

    if self.task.is_some() {
      debug!("background sync already running");
      return;
    }

    let engine = Arc::clone(&self.engine);
    let notifier = Arc::clone(&self.notifier);
    let error_tx = self.error_tx.clone();
    let interval = self.interval;
    let page_size = self.page_size;
    let (stop_tx, mut stop_rx) = watch::channel(false);

    let handle = tokio::spawn(async move {
      let mut ticker = tokio::time::interval(interval);
      ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
      // The first tick completes immediately; consume it so the first cycle
      // runs one full interval after start.
      ticker.tick().await;

      loop {
        tokio::select! {
          _ = stop_rx.changed() => break,
          _ = ticker.tick() => run_cycle(&engine, notifier.as_ref(), &error_tx, page_size).await,
        }
      }
      debug!("background sync loop stopped");
    });

    info!(interval = ?self.interval, page_size = self.page_size, "background sync started");
    self.task = Some((stop_tx, handle));
  }

  /// Stop the recurring loop and wait for it to wind down. Idempotent.
  pub async fn stop(&mut self) {
    self.status_tx.send_replace("background sync disabled".to_string());

    let Some((stop_tx, handle)) = self.task.take() else {
      debug!("background sync already stopped");
      return;
    };

    let _ = stop_tx.send(true);
    let _ = handle.await;
    info!("background sync stopped");
  }

  pub fn is_running(&self) -> bool {
    self.task.is_some()
  }

  /// User-visible status message, updated on every start/stop.
  pub fn status(&self) -> watch::Receiver<String> {
    self.status_tx.subscribe()
  }

  /// Last cycle error; cleared by the next successful cycle.
  pub fn last_error(&self) -> watch::Receiver<Option<String>> {
    self.error_tx.subscribe()
  }
}

async fn run_cycle<C, S>(
  engine: &SyncEngine<C, S>,
  notifier: &dyn Notifier,
  error_tx: &watch::Sender<Option<String>>,
  page_size: u32,
) where
  C: CatalogSource,
  S: ItemStore,
{
  // Drop the tick entirely if a cycle is already in flight.
  let Some(guard) = engine.state().try_begin_cycle() else {
    debug!("sync cycle already in flight, skipping tick");
    return;
  };

  let offset = guard.cursor();
  match engine.sync_page(page_size, offset).await {
    Ok(outcome) => {
      guard.advance_cursor(page_size);
      let total = match engine.item_count() {
        Ok(n) => n,
        Err(e) => {
          warn!(error = %e, "periodic sync could not read store count");
          error_tx.send_replace(Some(e.to_string()));
          return;
        }
      };

      error_tx.send_replace(None);
      notifier.items_added(outcome.items.len(), total);
    }
    Err(e) => {
      // Silent to the user; observers see the error stream. The loop
      // retries naturally at the next interval.
      warn!(error = %e, offset, "periodic sync cycle failed");
      error_tx.send_replace(Some(e.to_string()));
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::api::mock::MockSource;
  use crate::store::SqliteStore;
  use std::sync::Mutex;

  struct RecordingNotifier {
    events: Mutex<Vec<(usize, u32)>>,
  }

  impl RecordingNotifier {
    fn new() -> Arc<Self> {
      Arc::new(Self {
        events: Mutex::new(Vec::new()),
      })
    }

    fn events(&self) -> Vec<(usize, u32)> {
      self.events.lock().unwrap().clone()
    }
  }

  impl Notifier for RecordingNotifier {
    fn items_added(&self, added: usize, total: u32) {
      self.events.lock().unwrap().push((added, total));
    }
  }

  fn engine_with(source: MockSource) -> Arc<SyncEngine<MockSource, SqliteStore>> {
    let store = Arc::new(SqliteStore::open_in_memory().unwrap());
    Arc::new(SyncEngine::new(source, store, 0))
  }

  #[tokio::test]
  async fn test_cycle_syncs_advances_cursor_and_notifies() {
    let engine = engine_with(MockSource::with_items(30));
    let notifier = RecordingNotifier::new();
    let mut scheduler =
      SyncScheduler::new(Arc::clone(&engine), notifier.clone(), Duration::from_millis(25), 10);

    scheduler.start();
    tokio::time::sleep(Duration::from_millis(40)).await;
    scheduler.stop().await;

    let events = notifier.events();
    assert!(!events.is_empty());
    assert_eq!(events[0], (10, 10));
    assert_eq!(engine.state().cursor() % 10, 0);
    assert!(engine.state().cursor() >= 10);
  }

  #[tokio::test]
  async fn test_stop_mid_wait_prevents_further_cycles() {
    let engine = engine_with(MockSource::with_items(30));
    let notifier = RecordingNotifier::new();
    let mut scheduler =
      SyncScheduler::new(Arc::clone(&engine), notifier.clone(), Duration::from_millis(80), 10);

    scheduler.start();
    tokio::time::sleep(Duration::from_millis(10)).await;
    scheduler.stop().await;

    // Well past the first interval: no cycle may have started.
    tokio::time::sleep(Duration::from_millis(150)).await;
    assert_eq!(engine.source().list_calls(), 0);
    assert_eq!(engine.state().cursor(), 0);
    assert!(notifier.events().is_empty());
  }

  #[tokio::test]
  async fn test_tick_skipped_while_cycle_in_flight() {
    let engine = engine_with(MockSource::with_items(30));
    let notifier = RecordingNotifier::new();
    let mut scheduler =
      SyncScheduler::new(Arc::clone(&engine), notifier.clone(), Duration::from_millis(20), 10);

    // Hold the guard as a concurrent on-demand load would.
    let guard = engine.state().try_begin_cycle().unwrap();
    scheduler.start();
    tokio::time::sleep(Duration::from_millis(70)).await;

    // Ticks fired, but every one of them was dropped without a network call.
    assert_eq!(engine.source().list_calls(), 0);

    drop(guard);
    tokio::time::sleep(Duration::from_millis(50)).await;
    scheduler.stop().await;
    assert!(engine.source().list_calls() >= 1);
  }

  #[tokio::test]
  async fn test_failed_cycle_records_error_and_keeps_looping() {
    let source = MockSource::with_items(30);
    source.set_fail_list(true);
    let engine = engine_with(source);
    let notifier = RecordingNotifier::new();
    let mut scheduler =
      SyncScheduler::new(Arc::clone(&engine), notifier.clone(), Duration::from_millis(20), 10);
    let error_rx = scheduler.last_error();

    scheduler.start();
    tokio::time::sleep(Duration::from_millis(50)).await;
    scheduler.stop().await;

    assert!(notifier.events().is_empty());
    assert!(error_rx.borrow().is_some());
    assert_eq!(engine.state().cursor(), 0, "failed cycles must not advance the cursor");
    assert!(engine.source().list_calls() >= 1, "loop continues after a failure");
  }

  #[tokio::test]
  async fn test_start_and_stop_are_idempotent() {
    let engine = engine_with(MockSource::with_items(10));
    let notifier = RecordingNotifier::new();
    let mut scheduler =
      SyncScheduler::new(engine, notifier, Duration::from_millis(500), 10);
    let status_rx = scheduler.status();

    scheduler.start();
    assert!(scheduler.is_running());
    scheduler.start();
    assert!(scheduler.is_running());
    assert!(status_rx.borrow().contains("enabled"));

    scheduler.stop().await;
    assert!(!scheduler.is_running());
    scheduler.stop().await;
    assert!(!scheduler.is_running());
    assert!(status_rx.borrow().contains("disabled"));
  }
}
