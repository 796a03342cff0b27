pub mod parser;
pub mod pipeline;
pub mod remote;

pub use parser::parse_choice_table;
pub use pipeline::ResolutionPipeline;
pub use remote::{ArchiveClient, ArchiveSource};

use thiserror::Error;

/// Failure of one resolution flow, caught at the flow boundary and mirrored
/// as an error event. Nothing inside the resolver escapes uncaught.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// Another resolution is in flight; the request was dropped, not queued.
    #[error("a resolution is already in progress")]
    Busy,

    /// Character detection was cancelled while retrying.
    #[error("character detection cancelled")]
    Cancelled,

    /// Capture or OCR produced nothing usable.
    #[error("text extraction failed: {0}")]
    Extraction(String),

    /// No catalog record matches the observed kind/title.
    #[error("no {kind} event matching title {title:?}")]
    NotFound { kind: &'static str, title: String },

    /// Archive fetch failed.
    #[error("remote fetch failed: {0}")]
    Remote(anyhow::Error),

    /// The archive page yielded no parseable choice rows.
    #[error("archive page {archive_id} had no parseable choice table")]
    Parse { archive_id: i64 },

    /// Catalog or settings write failed.
    #[error("persistence failed: {0}")]
    Persistence(anyhow::Error),
}
