//! User-facing notices
//!
//! The sync layer reports outcomes through a `Notifier` instead of talking to
//! any toast or desktop notification system directly. Delivery is
//! fire-and-forget: `notify` must not block or fail.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub title: String,
    pub body: String,
}

impl Notice {
    pub fn success(title: &str, body: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Success, title, body)
    }

    pub fn warning(title: &str, body: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Warning, title, body)
    }

    pub fn error(title: &str, body: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Error, title, body)
    }

    fn new(level: NoticeLevel, title: &str, body: impl Into<String>) -> Self {
        let body = body.into();
        let body = if body.chars().count() > 100 {
            let cut: String = body.chars().take(100).collect();
            format!("{}...", cut)
        } else {
            body
        };
        Self {
            level,
            title: title.to_string(),
            body,
        }
    }
}

pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);
}

/// Writes notices to the log. Used when no UI is attached.
#[derive(Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notice: Notice) {
        match notice.level {
            NoticeLevel::Success => log::info!("{}: {}", notice.title, notice.body),
            NoticeLevel::Warning => log::warn!("{}: {}", notice.title, notice.body),
            NoticeLevel::Error => log::error!("{}: {}", notice.title, notice.body),
        }
    }
}
