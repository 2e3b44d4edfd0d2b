//! Inbox synchronizer: the fetch/cache state machine behind the triage inbox.
//!
//! ```text
//!   Idle ──mount──▶ Loading ──ok──▶ Idle(ready)
//!                      └─fail─▶ Error ──next trigger──▶ Loading
//!   Idle(ready) ──refresh/focus/timer──▶ Refreshing ──ok──▶ Idle(ready)
//!                                            └─fail─▶ Idle(ready, stale) + warning
//! ```
//!
//! Every trigger goes through the fetch gate; a trigger that arrives while a
//! fetch is in flight is dropped, not queued.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tokio::sync::watch;

use crate::clock::{Clock, TokioClock};
use crate::config::SyncConfig;
use crate::error::SyncError;
use crate::notification::{LogNotifier, Notice, Notifier};
use crate::types::{FetchState, ItemPatch, Stats, SyncSnapshot};

use super::client::{HttpTransport, InboxTransport};
use super::gate::{FetchGate, GateRejection};
use super::retry::{self, RetryOutcome, RetryPolicy};
use super::store::ReconciliationStore;

/// Result of one `fetch_now` call.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    /// Dropped by the gate; nothing reached the network.
    Skipped(GateRejection),
    Updated { item_count: usize, attempts: u32 },
    /// 404 with cached data; the cache stays.
    KeptCache,
    /// Retries exhausted; cached data kept and a warning emitted.
    Stale(SyncError),
    Failed(SyncError),
    /// Settled after unmount; the result was thrown away.
    Discarded,
}

impl FetchOutcome {
    pub fn reached_network(&self) -> bool {
        !matches!(self, FetchOutcome::Skipped(_))
    }
}

/// Whether a UI is attached. Drives the refresh timer: it ticks while
/// `Mounted`, parks while `Detached`, and exits on `Closed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Detached,
    Mounted,
    Closed,
}

#[derive(Debug, Default)]
struct SyncStatus {
    state: FetchState,
    error: Option<SyncError>,
    last_updated: Option<DateTime<Utc>>,
    stale: bool,
}

pub struct InboxSync {
    config: SyncConfig,
    transport: Arc<dyn InboxTransport>,
    clock: Arc<dyn Clock>,
    notifier: Arc<dyn Notifier>,
    policy: RetryPolicy,
    gate: FetchGate,
    store: Mutex<ReconciliationStore>,
    status: Mutex<SyncStatus>,
    mounted: AtomicBool,
    detached: AtomicBool,
    revision: watch::Sender<u64>,
    lifecycle: watch::Sender<Lifecycle>,
}

impl InboxSync {
    pub fn new(
        config: SyncConfig,
        transport: Arc<dyn InboxTransport>,
        clock: Arc<dyn Clock>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let (revision, _) = watch::channel(0);
        let (lifecycle, _) = watch::channel(Lifecycle::Detached);
        Self {
            policy: RetryPolicy::from_config(&config),
            gate: FetchGate::new(config.min_interval()),
            store: Mutex::new(ReconciliationStore::init(config.tracked_statuses.clone())),
            status: Mutex::new(SyncStatus::default()),
            mounted: AtomicBool::new(false),
            detached: AtomicBool::new(false),
            revision,
            lifecycle,
            config,
            transport,
            clock,
            notifier,
        }
    }

    /// Production wiring: HTTP transport, tokio clock, log notifier.
    pub fn with_http(config: SyncConfig) -> Result<Self, SyncError> {
        config.validate()?;
        let transport = HttpTransport::new(&config)?;
        Ok(Self::new(
            config,
            Arc::new(transport),
            Arc::new(TokioClock),
            Arc::new(LogNotifier),
        ))
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    pub(crate) fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    /// Ask for a fetch. Rejected by the gate when a fetch is in flight or the
    /// minimum interval since the last attempt has not elapsed.
    pub async fn fetch_now(&self, force_refresh: bool) -> FetchOutcome {
        let permit = match self.gate.try_acquire(self.clock.now()) {
            Ok(permit) => permit,
            Err(rejection) => {
                log::debug!("Inbox sync: fetch skipped, {}", rejection);
                return FetchOutcome::Skipped(rejection);
            }
        };

        let has_cache = self.store.lock().has_data();
        let previous = self.state();
        self.set_state(if has_cache {
            FetchState::Refreshing
        } else {
            FetchState::Loading
        });

        let outcome = retry::execute_with_retry(
            self.transport.as_ref(),
            self.clock.as_ref(),
            &self.policy,
            force_refresh,
            has_cache,
        )
        .await;

        if self.detached.load(Ordering::SeqCst) {
            log::debug!("Inbox sync: discarding fetch result after unmount");
            self.status.lock().state = previous;
            return FetchOutcome::Discarded;
        }

        let result = self.apply(outcome);
        drop(permit);
        self.bump_revision();
        result
    }

    /// Settle a retry chain. Store and status are updated under both locks
    /// (store first, then status) so a snapshot never mixes old and new.
    fn apply(&self, outcome: RetryOutcome) -> FetchOutcome {
        let mut store = self.store.lock();
        let mut status = self.status.lock();

        // The store may have been cleared while the request was in flight.
        let outcome = match outcome {
            RetryOutcome::KeptCache if !store.has_data() => RetryOutcome::Failed {
                error: SyncError::NotFound,
                attempts: 1,
            },
            RetryOutcome::Stale { error, attempts } if !store.has_data() => {
                RetryOutcome::Failed { error, attempts }
            }
            other => other,
        };

        match outcome {
            RetryOutcome::Fresh { payload, attempts } => {
                let item_count = payload.items.len();
                store.replace_all(payload);
                status.state = FetchState::Idle;
                status.error = None;
                status.stale = false;
                status.last_updated = Some(Utc::now());
                log::info!(
                    "Inbox sync: loaded {} items in {} attempt(s)",
                    item_count,
                    attempts
                );
                FetchOutcome::Updated {
                    item_count,
                    attempts,
                }
            }
            RetryOutcome::KeptCache => {
                status.state = FetchState::Idle;
                status.error = None;
                FetchOutcome::KeptCache
            }
            RetryOutcome::Stale { error, .. } => {
                status.state = FetchState::Idle;
                status.error = None;
                status.stale = true;
                drop(status);
                drop(store);
                self.notifier
                    .notify(Notice::warning("Showing cached inbox", error.to_string()));
                FetchOutcome::Stale(error)
            }
            RetryOutcome::Failed { error, .. } => {
                status.state = FetchState::Error;
                status.error = Some(error.clone());
                drop(status);
                drop(store);
                self.notifier
                    .notify(Notice::error("Inbox unavailable", error.to_string()));
                FetchOutcome::Failed(error)
            }
        }
    }

    /// Mount trigger. Fetches once, and only when `fetchOnMount` is set.
    /// A closed synchronizer stays closed.
    pub async fn mount(&self) -> Option<FetchOutcome> {
        if *self.lifecycle.borrow() == Lifecycle::Closed {
            return None;
        }
        self.detached.store(false, Ordering::SeqCst);
        self.lifecycle.send_if_modified(|state| {
            let attach = *state == Lifecycle::Detached;
            if attach {
                *state = Lifecycle::Mounted;
            }
            attach
        });
        if !self.config.fetch_on_mount || self.mounted.swap(true, Ordering::SeqCst) {
            return None;
        }
        Some(self.fetch_now(false).await)
    }

    /// Manual refresh. Forces a backend recompute and confirms success.
    pub async fn refresh(&self) -> FetchOutcome {
        let outcome = self.fetch_now(true).await;
        if let FetchOutcome::Updated { item_count, .. } = &outcome {
            self.notifier.notify(Notice::success(
                "Inbox refreshed",
                format!("{} emails", item_count),
            ));
        }
        outcome
    }

    /// Window-focus trigger.
    pub async fn on_focus(&self) -> Option<FetchOutcome> {
        if !self.config.revalidate_on_focus || !self.gate.interval_elapsed(self.clock.now()) {
            return None;
        }
        Some(self.fetch_now(true).await)
    }

    /// Timer trigger, driven by `poller::run_refresh_timer`.
    pub async fn on_timer(&self) -> FetchOutcome {
        self.fetch_now(true).await
    }

    /// Detach from the UI: park the refresh timer and discard any fetch that
    /// settles from now on. `mount` re-attaches and the timer resumes.
    pub fn unmount(&self) {
        self.detached.store(true, Ordering::SeqCst);
        self.mounted.store(false, Ordering::SeqCst);
        self.lifecycle.send_if_modified(|state| {
            let detach = *state == Lifecycle::Mounted;
            if detach {
                *state = Lifecycle::Detached;
            }
            detach
        });
    }

    /// Unmount for good. The refresh timer exits and `mount` no longer
    /// re-attaches it.
    pub fn close(&self) {
        self.unmount();
        self.lifecycle.send_replace(Lifecycle::Closed);
    }

    pub fn is_detached(&self) -> bool {
        self.detached.load(Ordering::SeqCst)
    }

    pub fn lifecycle(&self) -> watch::Receiver<Lifecycle> {
        self.lifecycle.subscribe()
    }

    /// Optimistic local update. Never touches the network.
    pub fn patch_item_locally(&self, id: &str, fields: &ItemPatch) -> bool {
        let found = self.store.lock().patch_item(id, fields);
        if found {
            self.bump_revision();
        } else {
            log::debug!("Inbox sync: patch for unknown item {} ignored", id);
        }
        found
    }

    /// Send a partial update to the backend and, once it is accepted, apply
    /// the same fields locally.
    pub async fn update_item(&self, id: &str, fields: ItemPatch) -> Result<(), SyncError> {
        match self.transport.update_item(id, &fields).await {
            Ok(()) => {
                self.patch_item_locally(id, &fields);
                self.notifier
                    .notify(Notice::success("Email updated", format!("Saved changes to {}", id)));
                Ok(())
            }
            Err(e) => {
                log::warn!("Inbox sync: update of {} failed: {}", id, e);
                self.notifier
                    .notify(Notice::error("Could not update email", e.to_string()));
                Err(e)
            }
        }
    }

    pub fn snapshot(&self) -> SyncSnapshot {
        let store = self.store.lock();
        let status = self.status.lock();
        SyncSnapshot {
            items: store.items().to_vec(),
            stats: store.stats().clone(),
            state: status.state,
            is_loading: status.state == FetchState::Loading,
            is_refreshing: status.state == FetchState::Refreshing,
            error: status.error.clone(),
            last_updated: status.last_updated,
            stale: status.stale,
        }
    }

    pub fn state(&self) -> FetchState {
        self.status.lock().state
    }

    pub fn stats(&self) -> Stats {
        self.store.lock().stats().clone()
    }

    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.status.lock().last_updated
    }

    /// Bumped after every settled fetch and every local patch.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    /// Drop all cached items and counters, e.g. when switching mailboxes.
    pub fn clear(&self) {
        {
            let mut store = self.store.lock();
            let mut status = self.status.lock();
            store.clear();
            *status = SyncStatus::default();
        }
        self.bump_revision();
    }

    fn set_state(&self, state: FetchState) {
        self.status.lock().state = state;
        self.bump_revision();
    }

    fn bump_revision(&self) {
        self.revision.send_modify(|rev| *rev += 1);
    }
}
