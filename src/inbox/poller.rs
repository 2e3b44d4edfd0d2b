//! Background refresh timer for the inbox.
//!
//! Follows the poller pattern used for the other integrations: loop, sleep
//! for the configured interval, then hand a forced fetch to the gate. The
//! loop parks while the synchronizer is unmounted and resumes on the next
//! mount; it exits once the synchronizer is closed.

use std::sync::Arc;

use super::sync::{FetchOutcome, InboxSync, Lifecycle};

pub async fn run_refresh_timer(sync: Arc<InboxSync>) {
    let Some(interval) = sync.config().refresh_interval() else {
        log::info!("Inbox poller: refresh interval not set, timer disabled");
        return;
    };

    let mut lifecycle = sync.lifecycle();
    log::info!("Inbox poller: refreshing every {:?}", interval);

    loop {
        let current = *lifecycle.borrow_and_update();
        match current {
            Lifecycle::Closed => break,
            Lifecycle::Detached => {
                log::debug!("Inbox poller: parked until mount");
                if lifecycle.changed().await.is_err() {
                    break;
                }
                continue;
            }
            Lifecycle::Mounted => {}
        }

        tokio::select! {
            _ = sync.clock().sleep(interval) => {},
            changed = lifecycle.changed() => {
                if changed.is_err() {
                    break;
                }
                continue;
            }
        }

        if *lifecycle.borrow() != Lifecycle::Mounted {
            continue;
        }

        match sync.on_timer().await {
            FetchOutcome::Skipped(reason) => {
                log::debug!("Inbox poller: tick skipped, {}", reason)
            }
            FetchOutcome::Failed(e) => log::warn!("Inbox poller: refresh failed: {}", e),
            _ => {}
        }
    }

    log::info!("Inbox poller: stopped");
}
