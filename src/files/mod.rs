/// File hierarchy: data model, persistence, and the operations surface
/// consumed by the transport layer.
pub mod model;
pub mod service;
pub mod store;

pub use model::{FileBody, FileId, FileKind, FileRecord, FileView, UserId};
pub use service::{CreateFileRequest, FileService};
pub use store::{FileStore, PAGE_SIZE};
