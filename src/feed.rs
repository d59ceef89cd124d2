//! Purpose: Pump engine notice streams into diagnostic messages with explicit, testable policies.
//! Exports: `ErrorPolicy`, `FeedConfig`, `FeedOutcome`, `FeedFailure`, `FeedError`, `feed`.
//! Role: Streaming engine used by the CLI; isolates line handling from main.
//! Invariants: Records are split on `\n` only; one trailing `\r` is stripped before parsing.
//! Invariants: Skip mode resumes at the next line boundary.
//! Invariants: Counters satisfy `lines == notices + skipped + failed`.

use std::io::{self, BufRead, BufReader, Read};

use bstr::ByteSlice;
use diagline::api::{DiagnosticMessage, Error, Notice};

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) enum ErrorPolicy {
    Stop,
    Skip,
}

#[derive(Copy, Clone, Debug)]
pub(crate) struct FeedConfig {
    pub errors: ErrorPolicy,
    pub max_snippet_bytes: usize,
}

#[derive(Copy, Clone, Debug, Default)]
pub(crate) struct FeedOutcome {
    pub lines: u64,
    pub notices: u64,
    pub skipped: u64,
    pub failed: u64,
}

/// One line that could not become a diagnostic message, reported under the
/// skip policy. `message` is the rendered cause chain for the line's error.
#[derive(Clone, Debug)]
pub(crate) struct FeedFailure {
    pub line: u64,
    pub message: String,
    pub snippet: Option<String>,
}

#[derive(Debug)]
pub(crate) enum FeedError {
    Io(io::Error),
    Notice { line: u64, error: Error },
}

pub(crate) fn feed<R, F, N>(
    reader: R,
    config: FeedConfig,
    mut on_message: F,
    mut on_failure: N,
) -> Result<FeedOutcome, FeedError>
where
    R: Read,
    F: FnMut(DiagnosticMessage) -> io::Result<()>,
    N: FnMut(FeedFailure),
{
    let mut lines = 0u64;
    let mut notices = 0u64;
    let mut skipped = 0u64;
    let mut failed = 0u64;

    let mut handle_failure =
        |line: u64, error: Error, snippet: Option<String>| -> Result<(), FeedError> {
            match config.errors {
                ErrorPolicy::Stop => Err(FeedError::Notice {
                    line,
                    error: error
                        .with_hint("Use --errors skip to continue past malformed lines."),
                }),
                ErrorPolicy::Skip => {
                    failed += 1;
                    tracing::debug!(line, "malformed line skipped");
                    on_failure(FeedFailure {
                        line,
                        message: error.descriptive_string(),
                        snippet,
                    });
                    Ok(())
                }
            }
        };

    let mut reader = BufReader::new(reader);
    let mut raw = Vec::new();
    let mut line_no = 0u64;
    loop {
        raw.clear();
        let read = reader
            .read_until(b'\n', &mut raw)
            .map_err(FeedError::Io)?;
        if read == 0 {
            break;
        }
        line_no += 1;
        let line = trim_line(&raw);
        if line.iter().all(|byte| byte.is_ascii_whitespace()) {
            continue;
        }
        lines += 1;

        let notice = match Notice::parse(line) {
            Ok(Some(notice)) => notice,
            Ok(None) => {
                skipped += 1;
                tracing::debug!(line = line_no, "line is not a notice; skipped");
                continue;
            }
            Err(err) => {
                handle_failure(
                    line_no,
                    err,
                    Some(truncate_bytes(line, config.max_snippet_bytes)),
                )?;
                continue;
            }
        };
        match notice.to_diagnostic_message() {
            Ok(message) => {
                on_message(message).map_err(FeedError::Io)?;
                notices += 1;
            }
            Err(err) => handle_failure(line_no, err, None)?,
        }
    }

    Ok(FeedOutcome {
        lines,
        notices,
        skipped,
        failed,
    })
}

fn trim_line(raw: &[u8]) -> &[u8] {
    let mut line = raw;
    if let Some(rest) = line.strip_suffix(b"\n") {
        line = rest;
    }
    if let Some(rest) = line.strip_suffix(b"\r") {
        line = rest;
    }
    line
}

fn truncate_snippet(input: &str, max: usize) -> String {
    let mut snippet = String::new();
    if input.len() <= max {
        snippet.push_str(input);
        return snippet;
    }
    let suffix = "...";
    if max <= suffix.len() {
        snippet.push_str(&suffix[..max]);
        return snippet;
    }
    let mut take = max - suffix.len();
    while !input.is_char_boundary(take) {
        take -= 1;
    }
    snippet.push_str(&input[..take]);
    snippet.push_str(suffix);
    snippet
}

fn truncate_bytes(input: &[u8], max: usize) -> String {
    let text = input.to_str_lossy();
    truncate_snippet(&text, max)
}
