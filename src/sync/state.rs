//! Shared mutable state of the sync engine: the pagination cursor and the
//! in-flight cycle guard.
//!
//! The cursor counts how many summary records have been fetched-and-stored
//! cumulatively. The guard ensures at most one sync cycle (scheduled or
//! on-demand) is in flight at any time; it is not a queue - a caller finding
//! it held must skip or retry later.
//!
//! Observers read both through non-blocking snapshots; mutation goes through
//! a [`CycleGuard`], so only the owner of the current cycle can move the
//! cursor.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

#[derive(Debug)]
pub struct SyncState {
  cursor: AtomicU32,
  in_flight: AtomicBool,
}

impl SyncState {
  /// Start the cursor at the store's existing record count so a restarted
  /// process resumes instead of re-fetching from zero.
  pub fn new(initial_cursor: u32) -> Self {
    Self {
      cursor: AtomicU32::new(initial_cursor),
      in_flight: AtomicBool::new(false),
    }
  }

  /// Non-blocking cursor snapshot.
  pub fn cursor(&self) -> u32 {
    self.cursor.load(Ordering::Acquire)
  }

  /// Non-blocking guard snapshot.
  pub fn is_cycle_in_flight(&self) -> bool {
    self.in_flight.load(Ordering::Acquire)
  }

  /// Try to claim the in-flight guard. Returns `None` if a cycle is already
  /// running; the guard is released when the returned value is dropped.
  pub fn try_begin_cycle(&self) -> Option<CycleGuard<'_>> {
    self
      .in_flight
      .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
      .ok()
      .map(|_| CycleGuard { state: self })
  }
}

/// Exclusive handle on the current sync cycle. Holding it is the only way to
/// mutate the cursor.
#[derive(Debug)]
pub struct CycleGuard<'a> {
  state: &'a SyncState,
}

impl CycleGuard<'_> {
  pub fn cursor(&self) -> u32 {
    self.state.cursor()
  }

  /// Advance the cursor after a successful cycle.
  pub fn advance_cursor(&self, by: u32) {
    self.state.cursor.fetch_add(by, Ordering::AcqRel);
  }

  /// Rewind to zero. Only ever triggered by explicit user action, never by
  /// the periodic timer.
  pub fn reset_cursor(&self) {
    self.state.cursor.store(0, Ordering::Release);
  }
}

impl Drop for CycleGuard<'_> {
  fn drop(&mut self) {
    self.state.in_flight.store(false, Ordering::Release);
  }
}
