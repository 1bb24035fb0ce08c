/// Core domain types for paragraphs, identifiers, sections, and comments.
use std::fmt;

use serde::{Deserialize, Serialize};

/// A comment anchored to a paragraph, with its replies once they are loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    /// Display name of the comment author.
    #[serde(default)]
    pub author: String,
    /// Host-assigned comment identifier, used to request replies.
    pub id: String,
    /// Replies in thread order. Empty until the reply round trip completes.
    #[serde(default)]
    pub replies: Vec<CommentReply>,
    /// Whether the thread has been marked resolved.
    #[serde(default)]
    pub resolved: bool,
    /// Comment body.
    pub text: String,
}

/// A reply nested under a [`Comment`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentReply {
    /// Display name of the reply author.
    #[serde(default)]
    pub author: String,
    /// Host-assigned reply identifier.
    pub id: String,
    /// Reply body.
    pub text: String,
}

/// A paragraph as the host reports it at read time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostParagraph {
    /// Text content at the time of the read.
    pub text: String,
}

impl HostParagraph {
    /// Convenience constructor.
    pub fn new(text: impl Into<String>) -> Self {
        return Self { text: text.into() };
    }
}

/// A paragraph placed in the built structure, with its derived identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParagraphEntry {
    /// Position across all sections, used to correlate comments.
    pub global_ordinal: usize,
    /// Content-derived identifier, recomputed on every read.
    pub id: ParagraphId,
    /// Zero-based position within the owning section.
    pub ordinal_in_section: usize,
    /// Text the identifier was computed from.
    pub text: String,
}

/// A content-derived paragraph fingerprint of the form
/// `PID-{previous}-{own}-{next}-{index}`.
///
/// Never persisted: identical neighbour triples at the same ordinal yield the
/// same identifier, and any edit to the paragraph or a neighbour changes it.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParagraphId(
    /// The composite identifier string.
    pub String,
);

impl ParagraphId {
    /// Borrow the identifier string.
    pub fn as_str(&self) -> &str {
        return &self.0;
    }
}

impl fmt::Display for ParagraphId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        return f.write_str(&self.0);
    }
}

/// One host section's paragraphs. Sections without paragraphs are never built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SectionGroup {
    /// Position of the section in the host document, counting empty sections.
    pub index: usize,
    /// Paragraphs in document order.
    pub paragraphs: Vec<ParagraphEntry>,
}
