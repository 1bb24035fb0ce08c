//! Content-derived paragraph fingerprints for document review.
//!
//! A [`ReviewSession`] reads a host document's sections, gives every
//! paragraph an identifier hashed from its own text and its neighbours'
//! text, records which paragraph texts the user selected, correlates
//! comment threads by position, and narrows the result to the selection.

pub mod commands;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod fingerprint;
pub mod host;
pub mod report;
pub mod session;
pub mod snapshot;
pub mod stats;
pub mod telemetry;
pub mod types;

pub use error::Error;
pub use fingerprint::compute_paragraph_id;
pub use host::{ApiVersion, HostDocument, HostSession, LoadRequest, LoadResult};
pub use session::ReviewSession;
pub use snapshot::SnapshotDocument;
pub use types::{Comment, CommentReply, HostParagraph, ParagraphEntry, ParagraphId, SectionGroup};
