use std::fmt;

use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::errors::FormatError;

// @module: SRT parsing and serialization

// @const: Single timestamp; hours are capped at three digits
static TIMESTAMP_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{1,3}):(\d{2}):(\d{2})[,.](\d{3})$").expect("timestamp regex is valid")
});

// @const: SRT time range line; tolerates '.' millis and trailing position coordinates
static TIME_RANGE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{1,3}:\d{2}:\d{2}[,.]\d{3})\s*-->\s*(\d{1,3}:\d{2}:\d{2}[,.]\d{3})(?:\s.*)?$")
        .expect("time range regex is valid")
});

// @const: Byte order mark as decoded text
const BOM: char = '\u{feff}';

/// Anything that can be written as one SRT block
pub trait TimedText {
    fn start_time_ms(&self) -> u64;
    fn end_time_ms(&self) -> u64;
    fn text(&self) -> &str;
}

// @struct: Single parsed subtitle entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubtitleEntry {
    // @field: 1-based ordinal in the source file, not the printed label
    pub seq_num: usize,

    // @field: Start time in ms
    pub start_time_ms: u64,

    // @field: End time in ms
    pub end_time_ms: u64,

    // @field: Caption text, lines joined with '\n'
    pub text: String,
}

impl SubtitleEntry {
    /// Creates a new subtitle entry
    pub fn new(seq_num: usize, start_time_ms: u64, end_time_ms: u64, text: impl Into<String>) -> Self {
        SubtitleEntry {
            seq_num,
            start_time_ms,
            end_time_ms,
            text: text.into(),
        }
    }
}

impl TimedText for SubtitleEntry {
    fn start_time_ms(&self) -> u64 {
        self.start_time_ms
    }

    fn end_time_ms(&self) -> u64 {
        self.end_time_ms
    }

    fn text(&self) -> &str {
        &self.text
    }
}

impl fmt::Display for SubtitleEntry {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write_block(f, self.seq_num, self)
    }
}

/// Parse an SRT timestamp (`HH:MM:SS,mmm`, `.` also accepted) to milliseconds
pub fn parse_timestamp(timestamp: &str) -> Result<u64, FormatError> {
    let invalid = || FormatError::InvalidTimestamp(timestamp.to_string());

    let caps = TIMESTAMP_REGEX.captures(timestamp.trim()).ok_or_else(invalid)?;
    let field = |idx: usize| -> Result<u64, FormatError> {
        caps.get(idx)
            .and_then(|m| m.as_str().parse().ok())
            .ok_or_else(invalid)
    };

    let (hours, minutes, seconds, millis) = (field(1)?, field(2)?, field(3)?, field(4)?);
    if minutes >= 60 || seconds >= 60 {
        return Err(invalid());
    }

    Ok(((hours * 60 + minutes) * 60 + seconds) * 1_000 + millis)
}

/// Format a timestamp in milliseconds to SRT format (HH:MM:SS,mmm)
pub fn format_timestamp(ms: u64) -> String {
    let hours = ms / 3_600_000;
    let minutes = (ms % 3_600_000) / 60_000;
    let seconds = (ms % 60_000) / 1_000;
    let millis = ms % 1_000;

    format!("{:02}:{:02}:{:02},{:03}", hours, minutes, seconds, millis)
}

/// Parse one block (lines between blank lines, already trimmed at the end).
///
/// `block` is the 1-based block number, used in error messages and as the
/// entry's `seq_num`.
pub fn parse_block(lines: &[&str], block: usize) -> Result<SubtitleEntry, FormatError> {
    let mut rest = lines;

    // The index label only marks a block boundary; its value is ignored
    if let Some(first) = rest.first() {
        if !first.is_empty() && first.chars().all(|c| c.is_ascii_digit()) {
            rest = &rest[1..];
        }
    }

    let time_line = rest
        .first()
        .copied()
        .ok_or(FormatError::MissingTimeRange { block })?;

    if !time_line.contains("-->") {
        return Err(FormatError::MissingTimeRange { block });
    }

    let (start_ms, end_ms) = parse_time_range(time_line, block)?;
    if end_ms < start_ms {
        return Err(FormatError::InvertedTimeRange {
            block,
            start_ms,
            end_ms,
        });
    }

    let text_lines = &rest[1..];
    if text_lines.is_empty() {
        return Err(FormatError::MissingText { block });
    }

    Ok(SubtitleEntry::new(block, start_ms, end_ms, text_lines.join("\n")))
}

fn parse_time_range(line: &str, block: usize) -> Result<(u64, u64), FormatError> {
    let invalid = || FormatError::InvalidTimeRange {
        block,
        line: line.to_string(),
    };

    let caps = TIME_RANGE_REGEX.captures(line).ok_or_else(invalid)?;
    let at = |idx: usize| -> Result<u64, FormatError> {
        let stamp = caps.get(idx).ok_or_else(invalid)?;
        parse_timestamp(stamp.as_str()).map_err(|_| invalid())
    };

    Ok((at(1)?, at(2)?))
}

/// Split text into blocks of non-blank lines with trailing whitespace removed
fn split_blocks(content: &str) -> Vec<Vec<&str>> {
    let content = content.strip_prefix(BOM).unwrap_or(content);

    let mut blocks = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for line in content.lines() {
        let line = line.trim_end();
        if line.trim().is_empty() {
            if !current.is_empty() {
                blocks.push(std::mem::take(&mut current));
            }
            continue;
        }
        current.push(line);
    }

    if !current.is_empty() {
        blocks.push(current);
    }

    blocks
}

/// Parse SRT text into entries in file order.
///
/// Malformed blocks are logged and skipped; text with no valid block at all
/// yields an empty vector. Deciding whether that is acceptable is up to the
/// caller.
pub fn parse(content: &str) -> Vec<SubtitleEntry> {
    let blocks = split_blocks(content);
    let mut entries = Vec::with_capacity(blocks.len());

    for (i, lines) in blocks.iter().enumerate() {
        match parse_block(lines, i + 1) {
            Ok(mut entry) => {
                entry.seq_num = entries.len() + 1;
                entries.push(entry);
            }
            Err(e) => warn!("Skipping SRT block {}: {}", i + 1, e),
        }
    }

    debug!(
        "Parsed {} subtitle entries from {} blocks",
        entries.len(),
        blocks.len()
    );

    entries
}

/// Reduce caption text to what survives a write and re-parse: trailing
/// whitespace is trimmed per line and blank lines are dropped.
pub fn normalize_text(text: &str) -> String {
    text.lines()
        .map(str::trim_end)
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn write_block<W: fmt::Write, T: TimedText + ?Sized>(out: &mut W, index: usize, item: &T) -> fmt::Result {
    writeln!(out, "{}", index)?;
    writeln!(
        out,
        "{} --> {}",
        format_timestamp(item.start_time_ms()),
        format_timestamp(item.end_time_ms())
    )?;
    writeln!(out, "{}", item.text())
}

/// Serialize items as SRT, numbering blocks from 1 in slice order
pub fn serialize<T: TimedText>(items: &[T]) -> String {
    let mut out = String::new();

    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        // Writing into a String cannot fail
        let _ = write_block(&mut out, i + 1, item);
    }

    out
}
