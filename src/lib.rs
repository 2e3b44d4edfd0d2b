pub mod clock;
pub mod config;
pub mod error;
pub mod inbox;
pub mod notification;
pub mod types;

pub use config::SyncConfig;
pub use error::SyncError;
pub use inbox::{FetchOutcome, InboxSync};
