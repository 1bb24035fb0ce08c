//! Host document access as an explicit two-phase protocol: queue load
//! requests, then flush them in a single `sync` round trip.

use std::fmt;
use std::str::FromStr;

use crate::error::Error;
use crate::types::{Comment, CommentReply, HostParagraph};

/// Oldest requirement-set version that can return comments and replies.
pub const COMMENTS_MIN_VERSION: ApiVersion = ApiVersion { major: 1, minor: 4 };

/// A host requirement-set version such as `1.4`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ApiVersion {
    /// Major version.
    pub major: u16,
    /// Minor version.
    pub minor: u16,
}

impl ApiVersion {
    /// Whether this version can serve comment threads.
    pub fn supports_comments(self) -> bool {
        return self >= COMMENTS_MIN_VERSION;
    }
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        return write!(f, "{}.{}", self.major, self.minor);
    }
}

impl FromStr for ApiVersion {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || return Error::UnsupportedApiVersion { raw: s.to_string() };
        let (major, minor) = s.trim().split_once('.').ok_or_else(invalid)?;
        return Ok(Self {
            major: major.parse().map_err(|_err| return invalid())?,
            minor: minor.parse().map_err(|_err| return invalid())?,
        });
    }
}

/// Read access to a structured document.
///
/// Everything except the rendered list and the version goes through
/// [`HostDocument::execute`], which answers a whole batch of requests in one
/// round trip. Implementations must return exactly one result per request,
/// in request order.
pub trait HostDocument {
    /// Requirement-set version the host supports.
    fn api_version(&self) -> ApiVersion;

    /// Answer a batch of queued requests.
    ///
    /// # Errors
    ///
    /// Returns `Error::HostAccess` if the host rejects or fails the batch.
    fn execute(&mut self, batch: &[LoadRequest]) -> Result<Vec<LoadResult>, Error>;

    /// The rendering layer's paragraph texts in document order, aligned by
    /// global ordinal with the host's own paragraph list.
    fn rendered_paragraphs(&self) -> Vec<String>;
}

/// Results of one `sync`, redeemed per [`Ticket`].
#[derive(Debug)]
pub struct LoadedBatch {
    /// Operation name used in error messages.
    operation: &'static str,
    /// One slot per request; emptied as tickets are redeemed.
    results: Vec<Option<LoadResult>>,
}

impl LoadedBatch {
    /// Take the replies of a comment.
    ///
    /// # Errors
    ///
    /// Returns `Error::HostAccess` if the ticket was already redeemed or the
    /// host answered with a different result kind.
    pub fn comment_replies(&mut self, ticket: Ticket) -> Result<Vec<CommentReply>, Error> {
        return match self.take(ticket)? {
            LoadResult::CommentReplies(replies) => Ok(replies),
            other => Err(self.mismatch("comment replies", &other)),
        };
    }

    /// Describe a result of the wrong kind.
    fn mismatch(&self, expected: &str, got: &LoadResult) -> Error {
        return Error::HostAccess {
            operation: self.operation,
            reason: format!("expected {expected}, host returned {}", got.kind()),
        };
    }

    /// Take the comments of one paragraph.
    ///
    /// # Errors
    ///
    /// Returns `Error::HostAccess` if the ticket was already redeemed or the
    /// host answered with a different result kind.
    pub fn paragraph_comments(&mut self, ticket: Ticket) -> Result<Vec<Comment>, Error> {
        return match self.take(ticket)? {
            LoadResult::ParagraphComments(comments) => Ok(comments),
            other => Err(self.mismatch("paragraph comments", &other)),
        };
    }

    /// Take the per-section paragraph lists.
    ///
    /// # Errors
    ///
    /// Returns `Error::HostAccess` if the ticket was already redeemed or the
    /// host answered with a different result kind.
    pub fn section_paragraphs(&mut self, ticket: Ticket) -> Result<Vec<Vec<HostParagraph>>, Error> {
        return match self.take(ticket)? {
            LoadResult::SectionParagraphs(sections) => Ok(sections),
            other => Err(self.mismatch("section paragraphs", &other)),
        };
    }

    /// Take the paragraphs covered by the current selection.
    ///
    /// # Errors
    ///
    /// Returns `Error::HostAccess` if the ticket was already redeemed or the
    /// host answered with a different result kind.
    pub fn selection_paragraphs(&mut self, ticket: Ticket) -> Result<Vec<HostParagraph>, Error> {
        return match self.take(ticket)? {
            LoadResult::SelectionParagraphs(paragraphs) => Ok(paragraphs),
            other => Err(self.mismatch("selection paragraphs", &other)),
        };
    }

    /// Move a result out of its slot.
    fn take(&mut self, ticket: Ticket) -> Result<LoadResult, Error> {
        let operation = self.operation;
        return self
            .results
            .get_mut(ticket.0)
            .and_then(Option::take)
            .ok_or_else(|| return Error::HostAccess {
                operation,
                reason: format!("no result for request #{}", ticket.0),
            });
    }
}

/// Something the caller wants populated at the next sync point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadRequest {
    /// Replies under one comment.
    CommentReplies {
        /// Host-assigned comment identifier.
        comment_id: String,
    },
    /// Comments anchored to the paragraph at a global ordinal.
    ParagraphComments {
        /// Position across all sections.
        global_ordinal: usize,
    },
    /// Every section's paragraphs, in document order.
    SectionParagraphs,
    /// Paragraphs touched by the user's current selection.
    SelectionParagraphs,
}

/// A host answer to one [`LoadRequest`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadResult {
    /// Answer to [`LoadRequest::CommentReplies`].
    CommentReplies(Vec<CommentReply>),
    /// Answer to [`LoadRequest::ParagraphComments`]; replies are not yet loaded.
    ParagraphComments(Vec<Comment>),
    /// Answer to [`LoadRequest::SectionParagraphs`].
    SectionParagraphs(Vec<Vec<HostParagraph>>),
    /// Answer to [`LoadRequest::SelectionParagraphs`].
    SelectionParagraphs(Vec<HostParagraph>),
}

impl LoadResult {
    /// Short name used in mismatch diagnostics.
    const fn kind(&self) -> &'static str {
        return match self {
            Self::CommentReplies(_) => "comment replies",
            Self::ParagraphComments(_) => "paragraph comments",
            Self::SectionParagraphs(_) => "section paragraphs",
            Self::SelectionParagraphs(_) => "selection paragraphs",
        };
    }
}

/// A batching context over one host. Requests queue up until `sync`.
pub struct HostSession<'h, H: HostDocument + ?Sized> {
    /// The host being read.
    host: &'h mut H,
    /// Operation name used in error messages and logs.
    operation: &'static str,
    /// Requests queued since the last sync.
    pending: Vec<LoadRequest>,
    /// Completed round trips.
    round_trips: u32,
}

impl<'h, H: HostDocument + ?Sized> HostSession<'h, H> {
    /// The host's requirement-set version. Does not cost a round trip.
    pub fn api_version(&self) -> ApiVersion {
        return self.host.api_version();
    }

    /// Queue a request; redeem the returned ticket after the next `sync`.
    pub fn load(&mut self, request: LoadRequest) -> Ticket {
        let ticket = Ticket(self.pending.len());
        self.pending.push(request);
        return ticket;
    }

    /// Open a session for one named operation.
    pub fn new(host: &'h mut H, operation: &'static str) -> Self {
        return Self {
            host,
            operation,
            pending: Vec::new(),
            round_trips: 0,
        };
    }

    /// The rendering layer's paragraph texts. Does not cost a round trip.
    pub fn rendered_paragraphs(&self) -> Vec<String> {
        return self.host.rendered_paragraphs();
    }

    /// Number of completed round trips.
    pub const fn round_trips(&self) -> u32 {
        return self.round_trips;
    }

    /// Flush every queued request in one round trip.
    ///
    /// # Errors
    ///
    /// Returns `Error::HostAccess` if the host fails, or answers with a
    /// different number of results than requests were queued.
    pub fn sync(&mut self) -> Result<LoadedBatch, Error> {
        let batch = std::mem::take(&mut self.pending);
        self.round_trips = self.round_trips.saturating_add(1);
        tracing::debug!(
            operation = self.operation,
            round_trip = self.round_trips,
            requests = batch.len(),
            "host sync"
        );

        let results = self.host.execute(&batch)?;
        if results.len() != batch.len() {
            return Err(Error::HostAccess {
                operation: self.operation,
                reason: format!("{} requests answered with {} results", batch.len(), results.len()),
            });
        }

        return Ok(LoadedBatch {
            operation: self.operation,
            results: results.into_iter().map(Some).collect(),
        });
    }
}

/// Handle to a queued request's slot in the next [`LoadedBatch`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket(
    /// Position of the request within its batch.
    usize,
);
