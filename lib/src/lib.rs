pub mod browser;
pub mod config;
pub mod error;
pub mod local;
pub mod models;
pub mod poll;
pub mod reconcile;
pub mod remote;
pub mod session;
pub mod store;
pub mod sync;
pub mod utils;
pub mod validate;

// Re-export error types for convenience
pub use error::{Result, SyncError};
pub use sync::{BookmarkSync, SyncState};
