//! Scripted collaborators shared by the inbox tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::Notify;

use crate::error::SyncError;
use crate::notification::{Notice, NoticeLevel, Notifier};
use crate::types::{InboxPayload, Item, ItemPatch};

use super::client::InboxTransport;

pub fn payload(items: &[(&str, &str)], stats: &[(&str, u64)]) -> InboxPayload {
    InboxPayload {
        items: items
            .iter()
            .map(|(id, status)| Item::new(*id, Some(*status)))
            .collect(),
        stats: stats.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
    }
}

pub fn patch(value: Value) -> ItemPatch {
    match value {
        Value::Object(map) => map,
        other => panic!("patch must be a JSON object, got {}", other),
    }
}

/// Answers fetches from a queue; once the queue is empty every further fetch
/// gets `fallback`.
pub struct ScriptedTransport {
    responses: Mutex<VecDeque<Result<InboxPayload, SyncError>>>,
    fallback: Result<InboxPayload, SyncError>,
    calls: AtomicUsize,
    forced: Mutex<Vec<bool>>,
    hold: Mutex<Option<Arc<Notify>>>,
    updates: Mutex<Vec<(String, ItemPatch)>>,
    update_result: Mutex<Result<(), SyncError>>,
}

impl ScriptedTransport {
    pub fn new(responses: Vec<Result<InboxPayload, SyncError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            fallback: Ok(InboxPayload::default()),
            calls: AtomicUsize::new(0),
            forced: Mutex::new(Vec::new()),
            hold: Mutex::new(None),
            updates: Mutex::new(Vec::new()),
            update_result: Mutex::new(Ok(())),
        }
    }

    pub fn failing(error: SyncError) -> Self {
        Self {
            fallback: Err(error),
            ..Self::new(Vec::new())
        }
    }

    pub fn push(&self, response: Result<InboxPayload, SyncError>) {
        self.responses.lock().push_back(response);
    }

    /// Make each fetch wait on the returned handle before answering.
    pub fn hold(&self) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        *self.hold.lock() = Some(notify.clone());
        notify
    }

    pub fn release(&self) {
        *self.hold.lock() = None;
    }

    pub fn fail_updates(&self, error: SyncError) {
        *self.update_result.lock() = Err(error);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn forced(&self) -> Vec<bool> {
        self.forced.lock().clone()
    }

    pub fn updates(&self) -> Vec<(String, ItemPatch)> {
        self.updates.lock().clone()
    }
}

#[async_trait]
impl InboxTransport for ScriptedTransport {
    async fn fetch(&self, force_refresh: bool) -> Result<InboxPayload, SyncError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.forced.lock().push(force_refresh);

        let hold = self.hold.lock().clone();
        if let Some(notify) = hold {
            notify.notified().await;
        }

        let next = self.responses.lock().pop_front();
        next.unwrap_or_else(|| self.fallback.clone())
    }

    async fn update_item(&self, id: &str, fields: &ItemPatch) -> Result<(), SyncError> {
        self.updates.lock().push((id.to_string(), fields.clone()));
        self.update_result.lock().clone()
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl RecordingNotifier {
    pub fn notices(&self) -> Vec<Notice> {
        self.notices.lock().clone()
    }

    pub fn levels(&self) -> Vec<NoticeLevel> {
        self.notices.lock().iter().map(|n| n.level).collect()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notice: Notice) {
        self.notices.lock().push(notice);
    }
}
