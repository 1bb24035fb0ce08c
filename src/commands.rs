//! CLI commands for paraprint: ids, review, stats.

use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::error;
use crate::report::preview;
use crate::session::ReviewSession;
use crate::snapshot::SnapshotDocument;
use crate::stats;
use crate::telemetry::{NullTelemetry, TelemetrySink, TracingTelemetry};

/// Print every paragraph's identifier, grouped by section.
///
/// # Errors
///
/// Returns errors from config loading, snapshot reading, or the structure read.
pub fn ids(file: &Path) -> Result<(), error::Error> {
    let config = Config::load(&PathBuf::from("."))?;
    let mut host = SnapshotDocument::read(file)?;
    let mut session = ReviewSession::new(telemetry_sink(&config));
    session.build_structure(&mut host)?;

    for section in session.sections() {
        for paragraph in &section.paragraphs {
            println!(
                "{}\t{}\t{}\t{}",
                section.index,
                paragraph.ordinal_in_section,
                paragraph.id,
                preview(&paragraph.text)
            );
        }
    }
    return Ok(());
}

/// Run a full review cycle over a snapshot: build the structure, replay
/// every selection event, attach comments, and narrow to the selection.
///
/// `all` skips the selection filter regardless of config.
///
/// # Errors
///
/// Returns errors from config loading, snapshot reading, or any host read.
pub fn review(file: &Path, all: bool, json: bool) -> Result<(), error::Error> {
    let config = Config::load(&PathBuf::from("."))?;
    let mut host = SnapshotDocument::read(file)?;
    let mut session = ReviewSession::new(telemetry_sink(&config));

    session.build_structure(&mut host)?;
    for event in 0..host.selection_events() {
        host.select_event(event);
        session.record_selection(&mut host)?;
    }
    if config.include_comments {
        session.attach_comments(&mut host)?;
    }
    if config.filter_to_selection && !all {
        session.filter_to_selection();
    }

    let report = session.report();
    if json {
        println!("{}", report.to_json()?);
    } else {
        print!("{}", report.render_text());
    }
    return Ok(());
}

/// Print section, paragraph, and word counts, plus the first selection.
///
/// # Errors
///
/// Returns errors from snapshot reading or host reads.
pub fn stats(file: &Path) -> Result<(), error::Error> {
    let mut host = SnapshotDocument::read(file)?;
    let summary = stats::document_stats(&mut host)?;
    let selected = stats::selected_text(&mut host)?;

    println!("Sections:   {}", summary.sections);
    println!("Paragraphs: {}", summary.paragraphs);
    println!("Words:      {}", summary.words);
    if selected.is_empty() {
        println!("Selection:  (none)");
    } else {
        println!("Selection:  {}", preview(&selected));
    }
    return Ok(());
}

/// Pick the telemetry sink the config asks for.
fn telemetry_sink(config: &Config) -> Box<dyn TelemetrySink> {
    if config.telemetry {
        return Box::new(TracingTelemetry);
    }
    return Box::new(NullTelemetry);
}
