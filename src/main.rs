//! propdesk inbox sync: headless driver for the inbox synchronizer.
//!
//! Usage: `propdesk [config.json]` (defaults to ~/.propdesk/config.json).
//! Mounts the synchronizer, starts the refresh timer if configured, logs the
//! per-status counts after every change, and exits on Ctrl-C.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use propdesk_lib::config::{default_config_path, load_config};
use propdesk_lib::inbox::poller::run_refresh_timer;
use propdesk_lib::InboxSync;

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let path = match std::env::args_os().nth(1) {
        Some(arg) => PathBuf::from(arg),
        None => match default_config_path() {
            Ok(path) => path,
            Err(e) => {
                log::error!("{}", e);
                return ExitCode::FAILURE;
            }
        },
    };

    let sync = match load_config(&path).and_then(InboxSync::with_http) {
        Ok(sync) => Arc::new(sync),
        Err(e) => {
            log::error!("{} ({})", e, e.recovery_suggestion());
            return ExitCode::FAILURE;
        }
    };

    let mut revisions = sync.subscribe();
    let reporter = {
        let sync = sync.clone();
        tokio::spawn(async move {
            while revisions.changed().await.is_ok() {
                let snap = sync.snapshot();
                if snap.is_loading || snap.is_refreshing {
                    continue;
                }
                match &snap.error {
                    Some(e) => log::warn!("Inbox: {}", e),
                    None => log::info!(
                        "Inbox: {} items {:?}{}",
                        snap.items.len(),
                        snap.stats,
                        if snap.stale { " (stale)" } else { "" }
                    ),
                }
            }
        })
    };

    let timer = tokio::spawn(run_refresh_timer(sync.clone()));
    sync.mount().await;

    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Failed to listen for Ctrl-C: {}", e);
    }

    sync.close();
    if let Err(e) = timer.await {
        log::warn!("Inbox poller: task failed: {}", e);
    }
    reporter.abort();
    ExitCode::SUCCESS
}
