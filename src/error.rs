/// Crate-level error types for paraprint diagnostics.
use std::path::PathBuf;

/// Every error carries enough context to produce a useful diagnostic without
/// a debugger. Duplicate selections and missing comment support are not
/// errors and never appear here.
#[allow(clippy::error_impl_error, reason = "crate-level error type re-exported as paraprint::Error")]
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The comment-owning list and the flat paragraph list disagree in length,
    /// so comments cannot be correlated by position.
    #[error("comment lists ({comment_lists}) do not line up with paragraphs ({paragraphs})")]
    CommentCorrelation {
        /// Number of per-paragraph comment lists the host returned.
        comment_lists: usize,
        /// Number of paragraphs in the flat list built by the last structure read.
        paragraphs: usize,
    },

    /// Two comments in one document share an identifier, so replies cannot be
    /// routed to a single thread.
    #[error("duplicate comment id: `{id}`")]
    DuplicateCommentId {
        /// The identifier used more than once.
        id: String,
    },

    /// A referenced document or config file does not exist on disk.
    #[error("file not found: {}", path.display())]
    FileNotFound {
        /// Path to the missing file.
        path: PathBuf,
    },

    /// A round trip to the document host failed or returned an unusable batch.
    #[error("host access failed during {operation}: {reason}")]
    HostAccess {
        /// The operation that was waiting on the host.
        operation: &'static str,
        /// Description of the failure.
        reason: String,
    },

    /// Underlying I/O error from the filesystem.
    #[error("io: {0}")]
    Io(
        /// The wrapped I/O error.
        #[from]
        std::io::Error,
    ),

    /// JSON (de)serialization failed.
    #[error("json: {0}")]
    Json(
        /// The wrapped JSON error.
        #[from]
        serde_json::Error,
    ),

    /// The paragraph count changed between the initial and verification loads.
    #[error("paragraph count changed during read: {initial} then {verified}")]
    ParagraphCountChanged {
        /// Paragraph count from the initial load.
        initial: usize,
        /// Paragraph count from the verification load.
        verified: usize,
    },

    /// A document snapshot exists but cannot be used as a host.
    #[error("snapshot corrupt: {}: {reason}", path.display())]
    SnapshotCorrupt {
        /// Snapshot file that failed validation.
        path: PathBuf,
        /// Description of the corruption.
        reason: String,
    },

    /// TOML deserialization failed.
    #[error("toml deserialize: {0}")]
    TomlDe(
        /// The wrapped TOML deserialization error.
        #[from]
        toml::de::Error,
    ),

    /// A requirement-set version string is not `major.minor`.
    #[error("unsupported api version: `{raw}`")]
    UnsupportedApiVersion {
        /// The version string as written.
        raw: String,
    },
}
