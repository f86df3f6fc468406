pub mod config;
pub mod error;
pub mod services;
pub mod source;
pub mod utils;

pub use config::{DEFAULT_FIELDNAME, Resize, UploadOptions};
pub use error::IngestError;
pub use services::ingest::{IngestService, Ingested};
pub use services::storage::ContentRoot;
pub use source::{MemoryField, MemorySource, MultipartSource, RequestSource};
pub use utils::validation::{AllowList, UploadPredicate, ValidationPolicy};
