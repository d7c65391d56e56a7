use std::path::PathBuf;
use thiserror::Error;

/// Failures tied to a single conversation record.
///
/// Everything else (file system, archive, config) is reported through
/// `eyre` with context; these carry enough to point at the offending record.
#[derive(Error, Debug)]
pub enum ConvertError {
    /// The record did not decode into the expected shape.
    #[error("conversation #{index}{} is malformed: {source}", display_id(.id))]
    InvalidRecord {
        index: usize,
        id: Option<String>,
        source: serde_json::Error,
    },

    /// Epoch value outside the range chrono can represent.
    #[error("invalid timestamp {value} in conversation #{index}")]
    InvalidTimestamp { index: usize, value: f64 },

    /// A system, user or assistant message has no `create_time`.
    #[error("message {node} in conversation {conversation} has no create_time")]
    MissingMessageTime { conversation: String, node: String },

    /// An attachment points at a file that does not exist.
    #[error("attachment source not found: {path:?}")]
    MissingAttachment { path: PathBuf },

    /// An attachment's target name would land outside the attachments directory.
    #[error("attachment filename must be a plain file name: {filename:?}")]
    UnsafeAttachmentName { filename: String },
}

fn display_id(id: &Option<String>) -> String {
    match id {
        Some(id) => format!(" ({id})"),
        None => String::new(),
    }
}
