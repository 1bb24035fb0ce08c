//! Content-derived paragraph identifiers built from a paragraph's own text and
//! the text of its immediate neighbours within the same section.

use std::fmt::Write as _;

use sha2::{Digest as _, Sha256};

use crate::types::{HostParagraph, ParagraphId};

/// Delimiter between identifier components.
pub const DELIMITER: char = '-';

/// Placeholder for a neighbour slot when no neighbour exists.
pub const SENTINEL: &str = "NONENONE";

/// Number of digest bytes kept; rendered as twice as many hex characters.
const SHORT_HASH_BYTES: usize = 4;

/// Marks an identifier as position based rather than host assigned.
pub const TAG: &str = "PID";

/// The four components of a parsed [`ParagraphId`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdParts {
    /// Zero-based index within the section.
    pub index: usize,
    /// Short hash of the next sibling, or [`SENTINEL`].
    pub next: String,
    /// Short hash of the paragraph's own text.
    pub own: String,
    /// Short hash of the previous sibling, or [`SENTINEL`].
    pub previous: String,
}

/// Compute the identifier of `paragraph` sitting at `index` in `siblings`.
///
/// `siblings` is the ordered paragraph list of the paragraph's own section;
/// neighbours in other sections are never consulted. A neighbour slot holds
/// the sentinel when the index is at the section boundary or the sibling at
/// that position was not supplied.
pub fn compute_paragraph_id(
    paragraph: &HostParagraph,
    index: usize,
    siblings: &[HostParagraph],
) -> ParagraphId {
    let own = short_hash(&paragraph.text);
    let previous = index
        .checked_sub(1)
        .and_then(|i| return siblings.get(i))
        .map_or_else(|| return SENTINEL.to_string(), |p| return short_hash(&p.text));
    let next = index
        .checked_add(1)
        .and_then(|i| return siblings.get(i))
        .map_or_else(|| return SENTINEL.to_string(), |p| return short_hash(&p.text));

    return ParagraphId(format!(
        "{TAG}{DELIMITER}{previous}{DELIMITER}{own}{DELIMITER}{next}{DELIMITER}{index}"
    ));
}

/// Split an identifier back into its components.
/// Returns `None` for strings that were not produced by [`compute_paragraph_id`].
pub fn parse_paragraph_id(id: &ParagraphId) -> Option<IdParts> {
    let mut parts = id.as_str().splitn(5, DELIMITER);
    if parts.next()? != TAG {
        return None;
    }
    let previous = parts.next()?;
    let own = parts.next()?;
    let next = parts.next()?;
    let index = parts.next()?.parse().ok()?;

    let well_formed = [previous, own, next]
        .iter()
        .all(|s| return *s == SENTINEL || is_short_hash(s));
    if !well_formed || own == SENTINEL {
        return None;
    }

    return Some(IdParts {
        index,
        next: next.to_string(),
        own: own.to_string(),
        previous: previous.to_string(),
    });
}

/// Whether `s` looks like a [`short_hash`] output.
fn is_short_hash(s: &str) -> bool {
    return s.len() == SHORT_HASH_BYTES.saturating_mul(2)
        && s.chars().all(|c| return c.is_ascii_digit() || ('a'..='f').contains(&c));
}

/// First eight lowercase hex characters of the SHA-256 digest of `text`.
pub fn short_hash(text: &str) -> String {
    let digest = Sha256::digest(text.as_bytes());
    return digest
        .iter()
        .take(SHORT_HASH_BYTES)
        .fold(String::with_capacity(8), |mut out, byte| {
            // Writing to a String cannot fail.
            let _ = write!(out, "{byte:02x}");
            return out;
        });
}
