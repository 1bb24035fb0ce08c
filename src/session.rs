//! The paragraph fingerprint index: one review session's structure read,
//! selection record, comment correlation, and selection filter.
//!
//! A session is created per review, fed through
//! `build_structure -> record_selection -> attach_comments -> filter_to_selection`,
//! and then discarded. Nothing here is persisted; identifiers are recomputed
//! on every structure read.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::error::Error;
use crate::fingerprint::compute_paragraph_id;
use crate::host::{HostDocument, HostSession, LoadRequest};
use crate::report::ReviewReport;
use crate::telemetry::{DUPLICATE_SELECTION_EVENT, RENDERED_DIVERGENCE_EVENT, TelemetrySink};
use crate::types::{Comment, HostParagraph, ParagraphEntry, ParagraphId, SectionGroup};

/// Session-scoped state for one review cycle.
pub struct ReviewSession<T: TelemetrySink> {
    /// Comment threads keyed by owning paragraph.
    comments: BTreeMap<ParagraphId, Vec<Comment>>,
    /// Every built paragraph in document order.
    flat: Vec<ParagraphEntry>,
    /// Identifier lookup. Colliding identifiers keep the last paragraph written.
    paragraphs_by_id: HashMap<ParagraphId, ParagraphEntry>,
    /// Host text of each flat paragraph, by global ordinal.
    paragraph_texts: Vec<String>,
    /// Sections with at least one paragraph.
    sections: Vec<SectionGroup>,
    /// Exact paragraph texts the user has selected. Only ever grows.
    selected_texts: BTreeSet<String>,
    /// Destination for duplicate and divergence events.
    telemetry: T,
}

impl<T: TelemetrySink> ReviewSession<T> {
    /// Fetch every paragraph's comment threads, replies included, and key
    /// them by the identifier of the flat paragraph at the same position.
    ///
    /// Hosts below the comments requirement set leave the map empty.
    ///
    /// # Errors
    ///
    /// Returns `Error::HostAccess` on any failed round trip, or
    /// `Error::CommentCorrelation` if the host's paragraph count no longer
    /// matches the last structure read.
    pub fn attach_comments<H: HostDocument + ?Sized>(&mut self, host: &mut H) -> Result<(), Error> {
        self.comments.clear();
        let mut ctx = HostSession::new(host, "attach comments");
        let version = ctx.api_version();
        if !version.supports_comments() {
            tracing::debug!(%version, "host cannot serve comments, leaving comment map empty");
            return Ok(());
        }

        let sections_ticket = ctx.load(LoadRequest::SectionParagraphs);
        let sections = ctx.sync()?.section_paragraphs(sections_ticket)?;
        let paragraph_count = count_paragraphs(&sections);

        let comment_tickets: Vec<_> = (0..paragraph_count)
            .map(|global_ordinal| return ctx.load(LoadRequest::ParagraphComments { global_ordinal }))
            .collect();
        let mut batch = ctx.sync()?;
        let mut per_paragraph = Vec::with_capacity(comment_tickets.len());
        for ticket in comment_tickets {
            per_paragraph.push(batch.paragraph_comments(ticket)?);
        }

        let reply_tickets: Vec<Vec<_>> = per_paragraph
            .iter()
            .map(|comments| {
                return comments
                    .iter()
                    .map(|c| return ctx.load(LoadRequest::CommentReplies { comment_id: c.id.clone() }))
                    .collect();
            })
            .collect();
        let mut batch = ctx.sync()?;
        for (comments, tickets) in per_paragraph.iter_mut().zip(reply_tickets) {
            for (comment, ticket) in comments.iter_mut().zip(tickets) {
                comment.replies = batch.comment_replies(ticket)?;
            }
        }

        if per_paragraph.len() != self.flat.len() {
            return Err(Error::CommentCorrelation {
                comment_lists: per_paragraph.len(),
                paragraphs: self.flat.len(),
            });
        }
        for (entry, comments) in self.flat.iter().zip(per_paragraph) {
            self.comments.insert(entry.id.clone(), comments);
        }

        tracing::debug!(paragraphs = self.flat.len(), round_trips = ctx.round_trips(), "comments attached");
        return Ok(());
    }

    /// Read every section's paragraphs, verify the count held steady across a
    /// second load, and compute an identifier per paragraph.
    ///
    /// Replaces any previously built structure and comment map; the selection
    /// set is kept.
    ///
    /// # Errors
    ///
    /// Returns `Error::HostAccess` on any failed round trip, or
    /// `Error::ParagraphCountChanged` if the document changed between loads.
    /// Nothing is built in either case.
    pub fn build_structure<H: HostDocument + ?Sized>(&mut self, host: &mut H) -> Result<(), Error> {
        let mut ctx = HostSession::new(host, "build structure");

        let initial_ticket = ctx.load(LoadRequest::SectionParagraphs);
        let sections = ctx.sync()?.section_paragraphs(initial_ticket)?;
        let verify_ticket = ctx.load(LoadRequest::SectionParagraphs);
        let verified = ctx.sync()?.section_paragraphs(verify_ticket)?;

        let initial = count_paragraphs(&sections);
        let verified = count_paragraphs(&verified);
        if initial != verified {
            return Err(Error::ParagraphCountChanged { initial, verified });
        }

        self.check_rendered_alignment(&ctx.rendered_paragraphs(), &sections);

        self.sections.clear();
        self.flat.clear();
        self.paragraphs_by_id.clear();
        self.paragraph_texts.clear();
        self.comments.clear();

        let mut global_ordinal = 0_usize;
        for (index, section) in sections.iter().enumerate() {
            let mut group = SectionGroup { index, paragraphs: Vec::with_capacity(section.len()) };
            for (ordinal_in_section, paragraph) in section.iter().enumerate() {
                let entry = ParagraphEntry {
                    global_ordinal,
                    id: compute_paragraph_id(paragraph, ordinal_in_section, section),
                    ordinal_in_section,
                    text: paragraph.text.clone(),
                };
                self.paragraph_texts.push(paragraph.text.clone());
                if let Some(previous) = self.paragraphs_by_id.insert(entry.id.clone(), entry.clone()) {
                    tracing::debug!(
                        id = %entry.id,
                        first = previous.global_ordinal,
                        second = global_ordinal,
                        "paragraph identifier collision"
                    );
                }
                self.flat.push(entry.clone());
                group.paragraphs.push(entry);
                global_ordinal = global_ordinal.saturating_add(1);
            }
            if !group.paragraphs.is_empty() {
                self.sections.push(group);
            }
        }

        tracing::debug!(
            sections = self.sections.len(),
            paragraphs = self.flat.len(),
            round_trips = ctx.round_trips(),
            "structure built"
        );
        return Ok(());
    }

    /// Flag, without failing, a rendered list that does not line up with the
    /// host list by global ordinal.
    fn check_rendered_alignment(&self, rendered: &[String], sections: &[Vec<HostParagraph>]) {
        let host_texts: Vec<&str> = sections
            .iter()
            .flat_map(|s| return s.iter())
            .map(|p| return p.text.as_str())
            .collect();

        if rendered.len() != host_texts.len() {
            tracing::warn!(
                rendered = rendered.len(),
                host = host_texts.len(),
                "rendered paragraph count differs from host"
            );
            self.telemetry.track_event(RENDERED_DIVERGENCE_EVENT);
            return;
        }
        let first_mismatch = rendered
            .iter()
            .zip(&host_texts)
            .position(|(r, h)| return r.as_str() != *h);
        if let Some(ordinal) = first_mismatch {
            tracing::warn!(ordinal, "rendered paragraph text differs from host");
            self.telemetry.track_event(RENDERED_DIVERGENCE_EVENT);
        }
    }

    /// Comment threads keyed by paragraph identifier.
    pub const fn comments(&self) -> &BTreeMap<ParagraphId, Vec<Comment>> {
        return &self.comments;
    }

    /// Narrow the structure and comment map to selected paragraphs, dropping
    /// sections that end up empty. No host access and no rehashing.
    pub fn filter_to_selection(&mut self) {
        let comments = std::mem::take(&mut self.comments);
        self.comments = comments
            .into_iter()
            .filter(|(id, _)| return self.is_selected(id))
            .collect();

        let mut sections = std::mem::take(&mut self.sections);
        for section in &mut sections {
            section.paragraphs.retain(|p| return self.is_selected(&p.id));
        }
        sections.retain(|s| return !s.paragraphs.is_empty());
        self.sections = sections;
    }

    /// Every built paragraph in document order.
    pub fn flat_paragraphs(&self) -> &[ParagraphEntry] {
        return &self.flat;
    }

    /// Whether the paragraph behind `id` has selected text. Unknown
    /// identifiers are never selected.
    pub fn is_selected(&self, id: &ParagraphId) -> bool {
        return self
            .paragraph(id)
            .and_then(|entry| return self.paragraph_texts.get(entry.global_ordinal))
            .is_some_and(|text| return self.selected_texts.contains(text));
    }

    /// Start an empty session.
    pub fn new(telemetry: T) -> Self {
        return Self {
            comments: BTreeMap::new(),
            flat: Vec::new(),
            paragraphs_by_id: HashMap::new(),
            paragraph_texts: Vec::new(),
            sections: Vec::new(),
            selected_texts: BTreeSet::new(),
            telemetry,
        };
    }

    /// Look up a built paragraph by identifier.
    pub fn paragraph(&self, id: &ParagraphId) -> Option<&ParagraphEntry> {
        return self.paragraphs_by_id.get(id);
    }

    /// Add the text of every paragraph in the host's current selection to the
    /// selection set. A text already present is reported to telemetry and
    /// otherwise ignored.
    ///
    /// # Errors
    ///
    /// Returns `Error::HostAccess` if the selection cannot be read.
    pub fn record_selection<H: HostDocument + ?Sized>(&mut self, host: &mut H) -> Result<(), Error> {
        let mut ctx = HostSession::new(host, "record selection");
        let ticket = ctx.load(LoadRequest::SelectionParagraphs);
        let selected = ctx.sync()?.selection_paragraphs(ticket)?;

        for paragraph in selected {
            if self.selected_texts.contains(&paragraph.text) {
                self.telemetry.track_event(DUPLICATE_SELECTION_EVENT);
                continue;
            }
            self.selected_texts.insert(paragraph.text);
        }
        return Ok(());
    }

    /// Snapshot of the current structure, comments, and selection.
    pub fn report(&self) -> ReviewReport {
        return ReviewReport {
            comments: self.comments.clone(),
            sections: self.sections.clone(),
            selected_texts: self.selected_texts.iter().cloned().collect(),
        };
    }

    /// Sections with at least one paragraph.
    pub fn sections(&self) -> &[SectionGroup] {
        return &self.sections;
    }

    /// The selected paragraph texts, sorted.
    pub const fn selected_texts(&self) -> &BTreeSet<String> {
        return &self.selected_texts;
    }

    /// The telemetry sink this session reports to.
    pub const fn telemetry(&self) -> &T {
        return &self.telemetry;
    }
}

/// Total paragraphs across sections.
fn count_paragraphs(sections: &[Vec<HostParagraph>]) -> usize {
    return sections.iter().map(Vec::len).sum();
}

#[cfg(test)]
#[allow(clippy::missing_docs_in_private_items, clippy::indexing_slicing, reason = "tests")]
mod tests {
    use super::*;
    use crate::fingerprint::{SENTINEL, parse_paragraph_id, short_hash};
    use crate::host::{ApiVersion, LoadResult};
    use crate::snapshot::SnapshotDocument;
    use crate::telemetry::RecordingTelemetry;
    use crate::types::CommentReply;

    fn session() -> ReviewSession<RecordingTelemetry> {
        return ReviewSession::new(RecordingTelemetry::default());
    }

    fn comment(id: &str, text: &str) -> Comment {
        return Comment {
            author: "Ana".to_string(),
            id: id.to_string(),
            replies: vec![CommentReply { author: "Ben".to_string(), id: format!("{id}-r"), text: "ok".to_string() }],
            resolved: false,
            text: text.to_string(),
        };
    }

    /// Loses a paragraph between the initial and the verification load.
    struct ShrinkingHost {
        loads: usize,
    }

    impl HostDocument for ShrinkingHost {
        fn api_version(&self) -> ApiVersion {
            return ApiVersion { major: 1, minor: 4 };
        }

        fn execute(&mut self, batch: &[LoadRequest]) -> Result<Vec<LoadResult>, Error> {
            self.loads += 1;
            let texts: &[&str] = if self.loads == 1 { &["a", "b"] } else { &["a"] };
            return Ok(batch
                .iter()
                .map(|_| {
                    return LoadResult::SectionParagraphs(vec![
                        texts.iter().map(|t| return HostParagraph::new(*t)).collect(),
                    ]);
                })
                .collect());
        }

        fn rendered_paragraphs(&self) -> Vec<String> {
            return Vec::new();
        }
    }

    /// Counts round trips on the way through to a snapshot.
    struct CountingHost {
        inner: SnapshotDocument,
        syncs: usize,
    }

    impl HostDocument for CountingHost {
        fn api_version(&self) -> ApiVersion {
            return self.inner.api_version();
        }

        fn execute(&mut self, batch: &[LoadRequest]) -> Result<Vec<LoadResult>, Error> {
            self.syncs += 1;
            return self.inner.execute(batch);
        }

        fn rendered_paragraphs(&self) -> Vec<String> {
            return self.inner.rendered_paragraphs();
        }
    }

    /// Fails every round trip.
    struct UnreachableHost;

    impl HostDocument for UnreachableHost {
        fn api_version(&self) -> ApiVersion {
            return ApiVersion { major: 1, minor: 4 };
        }

        fn execute(&mut self, _batch: &[LoadRequest]) -> Result<Vec<LoadResult>, Error> {
            return Err(Error::HostAccess { operation: "test", reason: "host went away".to_string() });
        }

        fn rendered_paragraphs(&self) -> Vec<String> {
            return Vec::new();
        }
    }

    #[test]
    fn builds_ids_for_intro_body_conclusion() {
        let mut host = SnapshotDocument::from_texts(&[&["Intro", "Body", "Conclusion"]]);
        let mut s = session();
        s.build_structure(&mut host).unwrap();

        let flat = s.flat_paragraphs();
        assert_eq!(flat.len(), 3);
        let body = parse_paragraph_id(&flat[1].id).unwrap();
        assert_eq!(body.previous, short_hash("Intro"));
        assert_eq!(body.own, short_hash("Body"));
        assert_eq!(body.next, short_hash("Conclusion"));
        assert_eq!(body.index, 1);

        let intro = parse_paragraph_id(&flat[0].id).unwrap();
        assert_eq!(intro.previous, SENTINEL);
        assert_eq!(intro.next, short_hash("Body"));
        assert_eq!(intro.index, 0);
    }

    #[test]
    fn neighbours_never_cross_sections() {
        let mut host = SnapshotDocument::from_texts(&[&["end of one"], &["start of two", "more"]]);
        let mut s = session();
        s.build_structure(&mut host).unwrap();

        let second = &s.sections()[1].paragraphs[0];
        let parts = parse_paragraph_id(&second.id).unwrap();
        assert_eq!(parts.previous, SENTINEL);
        assert_eq!(parts.index, 0);
        assert_eq!(second.global_ordinal, 1);
        assert_eq!(second.ordinal_in_section, 0);
    }

    #[test]
    fn empty_sections_are_dropped() {
        let mut host = SnapshotDocument::from_texts(&[&[], &["only"], &[]]);
        let mut s = session();
        s.build_structure(&mut host).unwrap();
        assert_eq!(s.sections().len(), 1);
        assert_eq!(s.sections()[0].index, 1);
    }

    #[test]
    fn count_change_between_loads_fails_before_building() {
        let mut s = session();
        let err = s.build_structure(&mut ShrinkingHost { loads: 0 }).unwrap_err();
        assert!(matches!(err, Error::ParagraphCountChanged { initial: 2, verified: 1 }));
        assert!(s.sections().is_empty());
        assert!(s.flat_paragraphs().is_empty());
    }

    #[test]
    fn each_operation_uses_its_fixed_number_of_syncs() {
        let inner = SnapshotDocument::from_texts(&[&["a", "b"], &["c"]])
            .with_comments(1, vec![comment("c1", "on b")])
            .with_selection(&["a"]);
        let mut host = CountingHost { inner, syncs: 0 };
        let mut s = session();

        s.build_structure(&mut host).unwrap();
        assert_eq!(host.syncs, 2);

        host.syncs = 0;
        s.attach_comments(&mut host).unwrap();
        assert_eq!(host.syncs, 3);

        host.syncs = 0;
        s.record_selection(&mut host).unwrap();
        assert_eq!(host.syncs, 1);
    }

    #[test]
    fn old_hosts_skip_comment_round_trips() {
        let inner = SnapshotDocument::from_texts(&[&["a"]]).with_api_version(ApiVersion { major: 1, minor: 3 });
        let mut host = CountingHost { inner, syncs: 0 };
        let mut s = session();
        s.build_structure(&mut host).unwrap();
        host.syncs = 0;
        s.attach_comments(&mut host).unwrap();
        assert_eq!(host.syncs, 0);
    }

    #[test]
    fn paragraph_lookup_by_id() {
        let mut host = SnapshotDocument::from_texts(&[&["a", "b"]]);
        let mut s = session();
        s.build_structure(&mut host).unwrap();
        let id = s.flat_paragraphs()[1].id.clone();
        let entry = s.paragraph(&id).unwrap();
        assert_eq!(entry.text, "b");
        assert_eq!(entry.global_ordinal, 1);
        assert!(s.paragraph(&ParagraphId("PID-missing".to_string())).is_none());
    }

    #[test]
    fn host_failure_propagates() {
        let mut s = session();
        assert!(matches!(s.build_structure(&mut UnreachableHost), Err(Error::HostAccess { .. })));
        assert!(matches!(s.record_selection(&mut UnreachableHost), Err(Error::HostAccess { .. })));
    }

    #[test]
    fn duplicate_selection_fires_telemetry_once() {
        let mut host =
            SnapshotDocument::from_texts(&[&["Intro", "Body"]]).with_selection(&["Intro"]).with_selection(&["Intro"]);
        let mut s = session();
        s.record_selection(&mut host).unwrap();
        assert!(host.select_event(1));
        s.record_selection(&mut host).unwrap();

        assert_eq!(s.selected_texts().len(), 1);
        assert!(s.selected_texts().contains("Intro"));
        assert_eq!(s.telemetry().events(), vec![DUPLICATE_SELECTION_EVENT.to_string()]);
    }

    #[test]
    fn recording_same_selection_twice_keeps_set_size() {
        let mut host = SnapshotDocument::from_texts(&[&["a", "b", "c"]]).with_selection(&["a", "b"]);
        let mut s = session();
        s.record_selection(&mut host).unwrap();
        let once = s.selected_texts().len();
        s.record_selection(&mut host).unwrap();
        assert_eq!(s.selected_texts().len(), once);
    }

    #[test]
    fn identical_text_elsewhere_counts_as_selected() {
        let mut host = SnapshotDocument::from_texts(&[&["Signature", "Terms"], &["Signature"]])
            .with_selection(&["Signature"]);
        let mut s = session();
        s.build_structure(&mut host).unwrap();
        s.record_selection(&mut host).unwrap();
        s.filter_to_selection();

        let kept: Vec<usize> = s
            .sections()
            .iter()
            .flat_map(|sec| return sec.paragraphs.iter())
            .map(|p| return p.global_ordinal)
            .collect();
        assert_eq!(kept, vec![0, 2]);
    }

    #[test]
    fn comments_correlate_by_position() {
        let mut host = SnapshotDocument::from_texts(&[&["a"], &["b", "c"]])
            .with_comments(2, vec![comment("c1", "why?")]);
        let mut s = session();
        s.build_structure(&mut host).unwrap();
        s.attach_comments(&mut host).unwrap();

        let c_id = s.flat_paragraphs()[2].id.clone();
        let threads = &s.comments()[&c_id];
        assert_eq!(threads.len(), 1);
        assert_eq!(threads[0].replies.len(), 1);
        assert_eq!(s.comments().len(), 3);
        assert!(s.comments()[&s.flat_paragraphs()[0].id].is_empty());
    }

    #[test]
    fn old_hosts_leave_comment_map_empty() {
        let mut host = SnapshotDocument::from_texts(&[&["a"]])
            .with_comments(0, vec![comment("c1", "x")])
            .with_api_version(ApiVersion { major: 1, minor: 3 });
        let mut s = session();
        s.build_structure(&mut host).unwrap();
        s.attach_comments(&mut host).unwrap();
        assert!(s.comments().is_empty());
    }

    #[test]
    fn comments_without_structure_fail_correlation() {
        let mut host = SnapshotDocument::from_texts(&[&["a", "b"]]);
        let mut s = session();
        let err = s.attach_comments(&mut host).unwrap_err();
        assert!(matches!(err, Error::CommentCorrelation { comment_lists: 2, paragraphs: 0 }));
    }

    #[test]
    fn filter_keeps_a_subset_and_matching_comments() {
        let mut host = SnapshotDocument::from_texts(&[&["a", "b"], &["c"]])
            .with_comments(0, vec![comment("c1", "on a")])
            .with_comments(2, vec![comment("c2", "on c")])
            .with_selection(&["b", "c"]);
        let mut s = session();
        s.build_structure(&mut host).unwrap();
        s.attach_comments(&mut host).unwrap();
        s.record_selection(&mut host).unwrap();
        let before: Vec<ParagraphId> = s.flat_paragraphs().iter().map(|p| return p.id.clone()).collect();
        s.filter_to_selection();

        let kept: Vec<ParagraphId> = s
            .sections()
            .iter()
            .flat_map(|sec| return sec.paragraphs.iter())
            .map(|p| return p.id.clone())
            .collect();
        assert_eq!(kept, vec![before[1].clone(), before[2].clone()]);
        assert!(s.comments().keys().all(|id| return kept.contains(id)));
        assert_eq!(s.comments()[&before[2]][0].text, "on c");
    }

    #[test]
    fn filter_with_empty_selection_removes_everything() {
        let mut host = SnapshotDocument::from_texts(&[&["a"], &["b"]]);
        let mut s = session();
        s.build_structure(&mut host).unwrap();
        s.attach_comments(&mut host).unwrap();
        s.filter_to_selection();
        assert!(s.sections().is_empty());
        assert!(s.comments().is_empty());
    }

    #[test]
    fn rendered_divergence_is_flagged_not_fatal() {
        let mut host = SnapshotDocument::from_texts(&[&["a", "b"]]).with_rendered(vec!["a".to_string()]);
        let mut s = session();
        s.build_structure(&mut host).unwrap();
        assert_eq!(s.flat_paragraphs().len(), 2);
        assert_eq!(s.telemetry().events(), vec![RENDERED_DIVERGENCE_EVENT.to_string()]);
    }

    #[test]
    fn rebuild_keeps_selection() {
        let mut host = SnapshotDocument::from_texts(&[&["a"]]).with_selection(&["a"]);
        let mut s = session();
        s.record_selection(&mut host).unwrap();
        s.build_structure(&mut host).unwrap();
        s.build_structure(&mut host).unwrap();
        assert_eq!(s.flat_paragraphs().len(), 1);
        assert!(s.is_selected(&s.flat_paragraphs()[0].id));
        assert!(!s.is_selected(&ParagraphId("PID-unknown".to_string())));
    }
}
