//! Local reconciliation store: the last-known-good item collection plus the
//! per-status counters derived from it.
//!
//! Counters only ever cover tracked statuses. The tracked set is the
//! configured statuses plus whatever keys the server last reported in
//! `stats`; when both are empty every status seen on an item is tracked.
//! After every `replace_all` or `patch_item`, `stats()` equals `recount()`.

use std::collections::{BTreeSet, HashMap};

use serde_json::Value;

use crate::types::{InboxPayload, Item, ItemPatch, Stats, STATUS_FIELD};

#[derive(Debug, Clone, Default)]
pub struct ReconciliationStore {
    items: Vec<Item>,
    index: HashMap<String, usize>,
    stats: Stats,
    configured: BTreeSet<String>,
    tracked: BTreeSet<String>,
    has_data: bool,
}

impl ReconciliationStore {
    pub fn init<I, S>(tracked_statuses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let configured: BTreeSet<String> = tracked_statuses.into_iter().map(Into::into).collect();
        let stats = count_by_status(&[], &configured);
        Self {
            tracked: configured.clone(),
            configured,
            stats,
            ..Self::default()
        }
    }

    /// Forget all items and counts. The configured status set is kept.
    pub fn clear(&mut self) {
        *self = Self::init(std::mem::take(&mut self.configured));
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    pub fn get(&self, id: &str) -> Option<&Item> {
        self.index.get(id).map(|&pos| &self.items[pos])
    }

    /// True once a payload has been accepted, even an empty one.
    pub fn has_data(&self) -> bool {
        self.has_data
    }

    /// Wholesale replacement after a successful fetch. The new collection,
    /// index and counters are built before anything is swapped in.
    pub fn replace_all(&mut self, payload: InboxPayload) {
        let InboxPayload {
            items,
            stats: server_stats,
        } = payload;

        let tracked: BTreeSet<String> = self
            .configured
            .iter()
            .chain(server_stats.keys())
            .cloned()
            .collect();

        let mut index = HashMap::with_capacity(items.len());
        for (pos, item) in items.iter().enumerate() {
            if index.insert(item.id.clone(), pos).is_some() {
                log::warn!("Inbox sync: duplicate item id {} in payload", item.id);
            }
        }

        let stats = count_by_status(&items, &tracked);
        if !server_stats.is_empty() && server_stats != stats {
            log::warn!(
                "Inbox sync: server stats {:?} disagree with items {:?}, using item counts",
                server_stats,
                stats
            );
        }

        self.items = items;
        self.index = index;
        self.tracked = tracked;
        self.stats = stats;
        self.has_data = true;
    }

    /// Shallow-merge `patch` into the item with `id`. Returns false (and
    /// changes nothing) when no such item exists. `id` in a patch is ignored;
    /// a `null` status clears it.
    pub fn patch_item(&mut self, id: &str, patch: &ItemPatch) -> bool {
        let Some(&pos) = self.index.get(id) else {
            return false;
        };

        let item = &mut self.items[pos];
        let old_status = item.status.clone();
        for (key, value) in patch {
            match key.as_str() {
                "id" => {}
                STATUS_FIELD => {
                    if let Some(status) = status_from_value(value) {
                        item.status = status;
                    }
                }
                _ => {
                    item.fields.insert(key.clone(), value.clone());
                }
            }
        }

        let new_status = item.status.clone();
        if new_status != old_status {
            self.move_count(old_status.as_deref(), new_status.as_deref());
        }
        true
    }

    /// Full scan of the collection. Always equal to `stats()`.
    pub fn recount(&self) -> Stats {
        count_by_status(&self.items, &self.tracked)
    }

    fn move_count(&mut self, from: Option<&str>, to: Option<&str>) {
        if let Some(old) = from.filter(|s| is_tracked(&self.tracked, s)) {
            if let Some(count) = self.stats.get_mut(old) {
                *count = count.saturating_sub(1);
                // Untracked-mode keys only exist while something carries them.
                if *count == 0 && self.tracked.is_empty() {
                    self.stats.remove(old);
                }
            }
        }
        if let Some(new) = to.filter(|s| is_tracked(&self.tracked, s)) {
            *self.stats.entry(new.to_string()).or_insert(0) += 1;
        }
    }
}

fn is_tracked(tracked: &BTreeSet<String>, status: &str) -> bool {
    tracked.is_empty() || tracked.contains(status)
}

fn count_by_status(items: &[Item], tracked: &BTreeSet<String>) -> Stats {
    let mut stats: Stats = tracked.iter().map(|s| (s.clone(), 0)).collect();
    for status in items.iter().filter_map(|i| i.status.as_deref()) {
        if is_tracked(tracked, status) {
            *stats.entry(status.to_string()).or_insert(0) += 1;
        }
    }
    stats
}

/// `None` when the value cannot be a status and the patch must leave it alone.
fn status_from_value(value: &Value) -> Option<Option<String>> {
    match value {
        Value::Null => Some(None),
        Value::String(s) => Some(Some(s.clone())),
        other => {
            log::debug!("Inbox store: ignoring non-string status {}", other);
            None
        }
    }
}
