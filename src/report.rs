//! Review report: the serializable result of a review cycle and its plain
//! text rendering.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use serde::Serialize;

use crate::types::{Comment, ParagraphId, SectionGroup};

/// Longest paragraph preview shown in text output, in characters.
const PREVIEW_CHARS: usize = 60;

/// Structure, comments, and selection at the end of a review cycle.
#[derive(Debug, Clone, Serialize)]
pub struct ReviewReport {
    /// Comment threads keyed by paragraph identifier.
    pub comments: BTreeMap<ParagraphId, Vec<Comment>>,
    /// Sections with at least one paragraph.
    pub sections: Vec<SectionGroup>,
    /// Selected paragraph texts, sorted.
    pub selected_texts: Vec<String>,
}

impl ReviewReport {
    /// Total paragraphs across sections.
    pub fn paragraph_count(&self) -> usize {
        return self.sections.iter().map(|s| return s.paragraphs.len()).sum();
    }

    /// Render as a plain text listing, one block per section.
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        for section in &self.sections {
            let _ = writeln!(out, "## Section {}", section.index);
            for paragraph in &section.paragraphs {
                let _ = writeln!(out, "{}  {}", paragraph.id, preview(&paragraph.text));
                for comment in self.comments.get(&paragraph.id).into_iter().flatten() {
                    write_comment(&mut out, comment);
                }
            }
            out.push('\n');
        }
        let _ = writeln!(
            out,
            "{} paragraphs in {} sections, {} selected texts",
            self.paragraph_count(),
            self.sections.len(),
            self.selected_texts.len()
        );
        return out;
    }

    /// Render as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns `Error::Json` if serialization fails.
    pub fn to_json(&self) -> Result<String, crate::error::Error> {
        return Ok(serde_json::to_string_pretty(self)?);
    }
}

/// Shorten paragraph text to a single-line preview.
pub fn preview(text: &str) -> String {
    let single_line = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if single_line.chars().count() <= PREVIEW_CHARS {
        return single_line;
    }
    let mut cut: String = single_line.chars().take(PREVIEW_CHARS).collect();
    cut.push('…');
    return cut;
}

/// Append one comment thread, replies indented beneath it.
fn write_comment(out: &mut String, comment: &Comment) {
    let status = if comment.resolved { " (resolved)" } else { "" };
    let _ = writeln!(out, "    > {}: {}{status}", comment.author, comment.text);
    for reply in &comment.replies {
        let _ = writeln!(out, "      > {}: {}", reply.author, reply.text);
    }
}
