//! In-memory host backed by a document snapshot file (JSON or TOML).

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::host::{ApiVersion, HostDocument, LoadRequest, LoadResult};
use crate::types::{Comment, CommentReply, HostParagraph};

/// Requirement-set version assumed when a snapshot does not name one.
const DEFAULT_API_VERSION: &str = "1.4";

/// On-disk layout of a document snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentSnapshot {
    /// Requirement-set version the simulated host supports, e.g. `"1.4"`.
    #[serde(default = "default_api_version")]
    pub api_version: String,
    /// Rendering-layer paragraph texts; defaults to the host texts.
    #[serde(default)]
    pub rendered: Option<Vec<String>>,
    /// Sections in document order.
    #[serde(default)]
    pub sections: Vec<SnapshotSection>,
    /// Selection events in the order the user made them.
    #[serde(default)]
    pub selections: Vec<Vec<String>>,
}

/// Serde default for [`DocumentSnapshot::api_version`].
fn default_api_version() -> String {
    return DEFAULT_API_VERSION.to_string();
}

/// A host that answers requests from a fixed snapshot.
#[derive(Debug, Clone)]
pub struct SnapshotDocument {
    /// Parsed requirement-set version.
    api_version: ApiVersion,
    /// Index into `selections` of the current selection.
    current_selection: usize,
    /// Rendering-layer texts.
    rendered: Vec<String>,
    /// Paragraphs per section, comments attached.
    sections: Vec<SnapshotSection>,
    /// Recorded selection events.
    selections: Vec<Vec<String>>,
}

impl SnapshotDocument {
    /// Attach comments to the paragraph at `global_ordinal`. Out-of-range
    /// ordinals are ignored.
    #[must_use]
    pub fn with_comments(mut self, global_ordinal: usize, comments: Vec<Comment>) -> Self {
        if let Some(paragraph) = self
            .sections
            .iter_mut()
            .flat_map(|s| return s.paragraphs.iter_mut())
            .nth(global_ordinal)
        {
            paragraph.comments = comments;
        }
        return self;
    }

    /// Find a comment's replies anywhere in the document.
    fn replies_of(&self, comment_id: &str) -> Option<Vec<CommentReply>> {
        return self
            .sections
            .iter()
            .flat_map(|s| return s.paragraphs.iter())
            .flat_map(|p| return p.comments.iter())
            .find(|c| return c.id == comment_id)
            .map(|c| return c.replies.clone());
    }

    /// Build a host from per-section paragraph texts.
    pub fn from_texts(sections: &[&[&str]]) -> Self {
        let sections: Vec<SnapshotSection> = sections
            .iter()
            .map(|texts| {
                return SnapshotSection {
                    paragraphs: texts
                        .iter()
                        .map(|t| return SnapshotParagraph { comments: Vec::new(), text: (*t).to_string() })
                        .collect(),
                };
            })
            .collect();
        let rendered = flat_texts(&sections);
        return Self {
            api_version: crate::host::COMMENTS_MIN_VERSION,
            current_selection: 0,
            rendered,
            sections,
            selections: Vec::new(),
        };
    }

    /// Validate a deserialized snapshot and turn it into a host.
    ///
    /// # Errors
    ///
    /// Returns `Error::UnsupportedApiVersion` if the version string is malformed,
    /// or `Error::DuplicateCommentId` if two comments share an identifier.
    pub fn from_snapshot(snapshot: DocumentSnapshot) -> Result<Self, Error> {
        let api_version = snapshot.api_version.parse()?;
        enforce_unique_comment_ids(&snapshot.sections)?;
        let rendered = snapshot.rendered.unwrap_or_else(|| return flat_texts(&snapshot.sections));
        return Ok(Self {
            api_version,
            current_selection: 0,
            rendered,
            sections: snapshot.sections,
            selections: snapshot.selections,
        });
    }

    /// Comments anchored to a paragraph, replies withheld until requested.
    fn paragraph_comments(&self, global_ordinal: usize) -> Option<Vec<Comment>> {
        let paragraph = self
            .sections
            .iter()
            .flat_map(|s| return s.paragraphs.iter())
            .nth(global_ordinal)?;
        return Some(
            paragraph
                .comments
                .iter()
                .map(|c| return Comment { replies: Vec::new(), ..c.clone() })
                .collect(),
        );
    }

    /// Parse snapshot content. `is_toml` selects TOML, otherwise JSON.
    ///
    /// # Errors
    ///
    /// Returns `Error::Json` or `Error::TomlDe` for malformed content,
    /// `Error::UnsupportedApiVersion` for a malformed version string, or
    /// `Error::DuplicateCommentId` if two comments share an identifier.
    pub fn parse(content: &str, is_toml: bool) -> Result<Self, Error> {
        let snapshot: DocumentSnapshot = if is_toml {
            toml::from_str(content)?
        } else {
            serde_json::from_str(content)?
        };
        return Self::from_snapshot(snapshot);
    }

    /// Read and parse a snapshot from disk. `.toml` files are TOML, all
    /// others JSON.
    ///
    /// # Errors
    ///
    /// Returns `Error::FileNotFound` if the file doesn't exist, `Error::Io`
    /// for other read failures, or `Error::SnapshotCorrupt` if the content
    /// cannot be parsed.
    pub fn read(path: &Path) -> Result<Self, Error> {
        let content = match std::fs::read_to_string(path) {
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::FileNotFound { path: path.to_path_buf() });
            },
            Err(e) => return Err(Error::Io(e)),
            Ok(c) => c,
        };
        let is_toml = path.extension().is_some_and(|ext| return ext == "toml");
        return Self::parse(&content, is_toml).map_err(|e| return Error::SnapshotCorrupt {
            path: path.to_path_buf(),
            reason: e.to_string(),
        });
    }

    /// Make the selection event at `index` current. Returns false, leaving
    /// the selection unchanged, if there is no such event.
    pub fn select_event(&mut self, index: usize) -> bool {
        if index >= self.selections.len() {
            return false;
        }
        self.current_selection = index;
        return true;
    }

    /// Paragraphs covered by the current selection event.
    fn selection(&self) -> Vec<HostParagraph> {
        return self
            .selections
            .get(self.current_selection)
            .map(|texts| return texts.iter().map(|t| return HostParagraph::new(t.as_str())).collect())
            .unwrap_or_default();
    }

    /// Number of recorded selection events.
    pub fn selection_events(&self) -> usize {
        return self.selections.len();
    }

    /// Append a selection event.
    #[must_use]
    pub fn with_selection(mut self, texts: &[&str]) -> Self {
        self.selections.push(texts.iter().map(|t| return (*t).to_string()).collect());
        return self;
    }

    /// Override the rendering-layer texts.
    #[must_use]
    pub fn with_rendered(mut self, rendered: Vec<String>) -> Self {
        self.rendered = rendered;
        return self;
    }

    /// Override the requirement-set version.
    #[must_use]
    pub fn with_api_version(mut self, version: ApiVersion) -> Self {
        self.api_version = version;
        return self;
    }
}

impl HostDocument for SnapshotDocument {
    fn api_version(&self) -> ApiVersion {
        return self.api_version;
    }

    fn execute(&mut self, batch: &[LoadRequest]) -> Result<Vec<LoadResult>, Error> {
        let mut results = Vec::with_capacity(batch.len());
        for request in batch {
            let result = match request {
                LoadRequest::CommentReplies { comment_id } => {
                    let replies = self.replies_of(comment_id).ok_or_else(|| return Error::HostAccess {
                        operation: "snapshot",
                        reason: format!("no comment with id `{comment_id}`"),
                    })?;
                    LoadResult::CommentReplies(replies)
                },
                LoadRequest::ParagraphComments { global_ordinal } => {
                    let comments =
                        self.paragraph_comments(*global_ordinal).ok_or_else(|| return Error::HostAccess {
                            operation: "snapshot",
                            reason: format!("no paragraph at ordinal {global_ordinal}"),
                        })?;
                    LoadResult::ParagraphComments(comments)
                },
                LoadRequest::SectionParagraphs => LoadResult::SectionParagraphs(
                    self.sections
                        .iter()
                        .map(|s| {
                            return s.paragraphs.iter().map(|p| return HostParagraph::new(p.text.as_str())).collect();
                        })
                        .collect(),
                ),
                LoadRequest::SelectionParagraphs => LoadResult::SelectionParagraphs(self.selection()),
            };
            results.push(result);
        }
        return Ok(results);
    }

    fn rendered_paragraphs(&self) -> Vec<String> {
        return self.rendered.clone();
    }
}

/// One paragraph of a snapshot with the comments anchored to it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SnapshotParagraph {
    /// Comment threads, replies included.
    #[serde(default)]
    pub comments: Vec<Comment>,
    /// Paragraph text.
    pub text: String,
}

/// One section of a snapshot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SnapshotSection {
    /// Paragraphs in document order.
    #[serde(default)]
    pub paragraphs: Vec<SnapshotParagraph>,
}

/// Replies are requested by comment id, so ids must be unique document-wide.
///
/// # Errors
///
/// Returns `Error::DuplicateCommentId` naming the first repeated id.
fn enforce_unique_comment_ids(sections: &[SnapshotSection]) -> Result<(), Error> {
    let mut seen = HashSet::new();
    let comments = sections
        .iter()
        .flat_map(|s| return s.paragraphs.iter())
        .flat_map(|p| return p.comments.iter());
    for comment in comments {
        if !seen.insert(comment.id.as_str()) {
            return Err(Error::DuplicateCommentId { id: comment.id.clone() });
        }
    }
    return Ok(());
}

/// All paragraph texts across sections, in document order.
fn flat_texts(sections: &[SnapshotSection]) -> Vec<String> {
    return sections
        .iter()
        .flat_map(|s| return s.paragraphs.iter())
        .map(|p| return p.text.clone())
        .collect();
}

#[cfg(test)]
#[allow(clippy::missing_docs_in_private_items, clippy::indexing_slicing, reason = "tests")]
mod tests {
    use super::*;

    const JSON: &str = r#"{
        "api_version": "1.3",
        "sections": [
            { "paragraphs": [ { "text": "Intro" }, { "text": "Body", "comments": [
                { "id": "c1", "author": "Ana", "text": "Tighten this", "replies": [
                    { "id": "r1", "author": "Ben", "text": "Done" }
                ] }
            ] } ] },
            { "paragraphs": [] }
        ],
        "selections": [["Intro"], ["Body"]]
    }"#;

    #[test]
    fn parses_json_snapshot() {
        let doc = SnapshotDocument::parse(JSON, false).unwrap();
        assert_eq!(doc.api_version(), ApiVersion { major: 1, minor: 3 });
        assert_eq!(doc.selection_events(), 2);
        assert_eq!(doc.rendered_paragraphs(), vec!["Intro".to_string(), "Body".to_string()]);
    }

    #[test]
    fn parses_toml_snapshot() {
        let content = r#"
            selections = [["A"]]

            [[sections]]
            [[sections.paragraphs]]
            text = "A"
        "#;
        let doc = SnapshotDocument::parse(content, true).unwrap();
        assert_eq!(doc.rendered_paragraphs(), vec!["A".to_string()]);
        assert!(doc.api_version().supports_comments());
    }

    #[test]
    fn comments_come_without_replies_until_requested() {
        let mut doc = SnapshotDocument::parse(JSON, false).unwrap();
        let results = doc
            .execute(&[
                LoadRequest::ParagraphComments { global_ordinal: 1 },
                LoadRequest::CommentReplies { comment_id: "c1".to_string() },
            ])
            .unwrap();
        let LoadResult::ParagraphComments(comments) = &results[0] else {
            panic!("wrong kind");
        };
        assert_eq!(comments.len(), 1);
        assert!(comments[0].replies.is_empty());
        let LoadResult::CommentReplies(replies) = &results[1] else {
            panic!("wrong kind");
        };
        assert_eq!(replies[0].text, "Done");
    }

    #[test]
    fn shared_comment_ids_are_rejected() {
        let content = r#"{
            "sections": [ { "paragraphs": [
                { "text": "a", "comments": [ { "id": "1", "text": "x", "replies": [ { "id": "r", "text": "reply-on-a" } ] } ] },
                { "text": "b", "comments": [ { "id": "1", "text": "y", "replies": [ { "id": "r", "text": "reply-on-b" } ] } ] }
            ] } ]
        }"#;
        let err = SnapshotDocument::parse(content, false).unwrap_err();
        assert!(matches!(err, Error::DuplicateCommentId { ref id } if id == "1"));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.json");
        std::fs::write(&path, content).unwrap();
        let err = SnapshotDocument::read(&path).unwrap_err();
        assert!(matches!(err, Error::SnapshotCorrupt { ref reason, .. } if reason.contains("duplicate comment id")));
    }

    #[test]
    fn distinct_comment_ids_keep_their_own_replies() {
        let content = r#"{
            "sections": [ { "paragraphs": [
                { "text": "a", "comments": [ { "id": "1", "text": "x", "replies": [ { "id": "r1", "text": "reply-on-a" } ] } ] },
                { "text": "b", "comments": [ { "id": "2", "text": "y", "replies": [ { "id": "r2", "text": "reply-on-b" } ] } ] }
            ] } ]
        }"#;
        let mut doc = SnapshotDocument::parse(content, false).unwrap();
        let results = doc.execute(&[LoadRequest::CommentReplies { comment_id: "2".to_string() }]).unwrap();
        let LoadResult::CommentReplies(replies) = &results[0] else {
            panic!("wrong kind");
        };
        assert_eq!(replies[0].text, "reply-on-b");
    }

    #[test]
    fn unknown_ordinal_is_host_failure() {
        let mut doc = SnapshotDocument::from_texts(&[&["only"]]);
        let err = doc.execute(&[LoadRequest::ParagraphComments { global_ordinal: 5 }]).unwrap_err();
        assert!(matches!(err, Error::HostAccess { .. }));
    }

    #[test]
    fn select_event_moves_current_selection() {
        let mut doc = SnapshotDocument::from_texts(&[&["a", "b"]]).with_selection(&["a"]).with_selection(&["b"]);
        assert!(doc.select_event(1));
        assert!(!doc.select_event(2));
        assert_eq!(doc.selection(), vec![HostParagraph::new("b")]);
    }

    #[test]
    fn read_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = SnapshotDocument::read(&dir.path().join("missing.json")).unwrap_err();
        assert!(matches!(err, Error::FileNotFound { .. }));
    }

    #[test]
    fn read_wraps_parse_errors_with_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.json");
        std::fs::write(&path, "{ not json").unwrap();
        let err = SnapshotDocument::read(&path).unwrap_err();
        assert!(matches!(err, Error::SnapshotCorrupt { .. }));
    }
}
