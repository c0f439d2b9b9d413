/// Manila - user-owned file hierarchy manager
///
/// Stores file and folder metadata in SQLite, blob payloads on disk,
/// and runs asynchronous pipelines for image thumbnails and welcome
/// notifications.

pub mod cache;
pub mod config;
pub mod context;
pub mod db;
pub mod error;
pub mod files;
pub mod jobs;
pub mod notify;
pub mod storage;

pub use config::Config;
pub use context::{AppContext, JobReceivers};
pub use error::{Error, Result};
