//! Whole-document readers: body text, word count, and selected text.

use serde::Serialize;

use crate::error::Error;
use crate::host::{HostDocument, HostSession, LoadRequest};
use crate::types::HostParagraph;

/// Size summary of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DocumentStats {
    /// Paragraphs across all sections.
    pub paragraphs: usize,
    /// Sections, empty ones included.
    pub sections: usize,
    /// Whitespace-separated words in the body text.
    pub words: usize,
}

/// Body text: every paragraph in document order, newline separated.
///
/// # Errors
///
/// Returns `Error::HostAccess` if the host cannot be read.
pub fn document_text<H: HostDocument + ?Sized>(host: &mut H) -> Result<String, Error> {
    let sections = load_sections(host, "document text")?;
    return Ok(join_texts(sections.iter().flatten()));
}

/// Section, paragraph, and word counts in one round trip.
///
/// # Errors
///
/// Returns `Error::HostAccess` if the host cannot be read.
pub fn document_stats<H: HostDocument + ?Sized>(host: &mut H) -> Result<DocumentStats, Error> {
    let sections = load_sections(host, "document stats")?;
    let body = join_texts(sections.iter().flatten());
    return Ok(DocumentStats {
        paragraphs: sections.iter().map(Vec::len).sum(),
        sections: sections.len(),
        words: count_words(&body),
    });
}

/// Count non-empty whitespace-separated tokens.
pub fn count_words(text: &str) -> usize {
    return text.split_whitespace().count();
}

/// Join paragraph texts with newlines.
fn join_texts<'a>(paragraphs: impl Iterator<Item = &'a HostParagraph>) -> String {
    return paragraphs.map(|p| return p.text.as_str()).collect::<Vec<_>>().join("\n");
}

/// One round trip for every section's paragraphs.
fn load_sections<H: HostDocument + ?Sized>(
    host: &mut H,
    operation: &'static str,
) -> Result<Vec<Vec<HostParagraph>>, Error> {
    let mut ctx = HostSession::new(host, operation);
    let ticket = ctx.load(LoadRequest::SectionParagraphs);
    return ctx.sync()?.section_paragraphs(ticket);
}

/// Text of the current selection, paragraphs newline separated.
///
/// # Errors
///
/// Returns `Error::HostAccess` if the selection cannot be read.
pub fn selected_text<H: HostDocument + ?Sized>(host: &mut H) -> Result<String, Error> {
    let mut ctx = HostSession::new(host, "selected text");
    let ticket = ctx.load(LoadRequest::SelectionParagraphs);
    let selection = ctx.sync()?.selection_paragraphs(ticket)?;
    return Ok(join_texts(selection.iter()));
}

/// Body word count.
///
/// # Errors
///
/// Returns `Error::HostAccess` if the host cannot be read.
pub fn word_count<H: HostDocument + ?Sized>(host: &mut H) -> Result<usize, Error> {
    return Ok(count_words(&document_text(host)?));
}
