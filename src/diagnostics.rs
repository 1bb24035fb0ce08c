use crate::config::CONFIG_FILE;
use crate::error::Error;
use crate::host::COMMENTS_MIN_VERSION;

const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

/// Render an error as markdown with bold headings and print to stderr.
pub fn print_error(e: &Error) {
    let md = render_error(e);
    for line in md.lines() {
        if line.starts_with('#') {
            eprintln!("{BOLD}{line}{RESET}");
        } else {
            eprintln!("{line}");
        }
    }
}

/// Render an error as a structured markdown diagnostic: what happened and,
/// where there is one, how to fix it.
pub fn render_error(e: &Error) -> String {
    match e {
        Error::ParagraphCountChanged { initial, verified } => render_count_changed(*initial, *verified),
        Error::CommentCorrelation { paragraphs, comment_lists } => {
            render_comment_correlation(*paragraphs, *comment_lists)
        },
        Error::HostAccess { operation, reason } => render_host_access(operation, reason),
        Error::SnapshotCorrupt { path, reason } => render_snapshot_corrupt(path, reason),
        Error::UnsupportedApiVersion { raw } => render_unsupported_api_version(raw),
        Error::TomlDe(inner) => render_config_corrupt(&inner.to_string()),
        _ => render_generic(e),
    }
}

fn render_generic(e: &Error) -> String {
    match e {
        Error::FileNotFound { path } => format!("\
# Error: File Not Found

`{}` does not exist.
", path.display()),

        Error::Io(inner) => format!("\
# Error: I/O

{inner}
"),

        Error::Json(inner) => format!("\
# Error: JSON

{inner}
"),

        // Already handled in render_error, but need exhaustive match.
        _ => format!("\
# Error

{e}
"),
    }
}

fn render_comment_correlation(paragraphs: usize, comment_lists: usize) -> String {
    format!("\
# Error: Comments Out Of Step

The host returned {comment_lists} comment lists for {paragraphs} paragraphs,
so comments cannot be matched to paragraphs by position.

## Fix

Build the structure again, then attach comments straight after it.
")
}

fn render_config_corrupt(reason: &str) -> String {
    format!("\
# Error: Config Corrupt

`{CONFIG_FILE}` could not be parsed: {reason}

## Valid keys

    include_comments = true
    filter_to_selection = true
    telemetry = true
")
}

fn render_count_changed(initial: usize, verified: usize) -> String {
    format!("\
# Error: Document Changed During Read

The document had {initial} paragraphs on the first load and {verified} on the
verification load. No structure was built.

## Fix

Wait for edits to settle and run the command again.
")
}

fn render_host_access(operation: &str, reason: &str) -> String {
    format!("\
# Error: Host Access Failed

The host failed while reading for `{operation}`: {reason}
")
}

fn render_snapshot_corrupt(path: &std::path::Path, reason: &str) -> String {
    format!("\
# Error: Snapshot Corrupt

`{}` is not a usable document snapshot: {reason}

## Expected shape

    {{
      \"api_version\": \"1.4\",
      \"sections\": [ {{ \"paragraphs\": [ {{ \"text\": \"...\", \"comments\": [] }} ] }} ],
      \"selections\": [ [\"...\"] ]
    }}
", path.display())
}

fn render_unsupported_api_version(raw: &str) -> String {
    format!("\
# Error: Unsupported API Version

`{raw}` is not a `major.minor` requirement-set version.
Comments need at least `{COMMENTS_MIN_VERSION}`.
")
}
