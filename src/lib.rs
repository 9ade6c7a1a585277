pub mod category;
pub mod config;
pub mod error;
pub mod media;
pub mod normalizer;
pub mod orchestrator;
pub mod routes;
pub mod storage;
pub mod stories;
pub mod transport;

pub use category::Category;
pub use error::{UploadError, UploadErrorKind};
pub use media::{MAX_UPLOAD_BYTES, StoredMedia, UploadOutcome, UploadRequest};
pub use orchestrator::{FallbackPolicy, UploadOrchestrator};
