//! Per-frame object detections of a video, their archive format and the
//! checks an archive has to pass before release.

mod common;
pub mod archive;
pub mod check;
pub mod config;
pub mod convert;
pub mod error;
pub mod types;
pub mod vocabulary;
pub mod wire;

pub use archive::{load, save, ArchiveReader, Header};
pub use check::DetectionChecker;
pub use config::Config;
pub use error::{BBoxField, Error, SchemaError, ValidationError, Violation};
pub use types::*;
pub use vocabulary::Vocabulary;
