/*!
 * Tests for SRT parsing and serialization
 */

use subtrans::errors::FormatError;
use subtrans::srt::{self, SubtitleEntry};

use crate::common;

#[test]
fn test_parse_withSampleFile_shouldReadAllEntries() {
    let entries = srt::parse(common::SAMPLE_SRT);

    assert_eq!(entries.len(), 3);
    assert_eq!(
        entries[0],
        SubtitleEntry::new(1, 1000, 4000, "This is a test subtitle.")
    );
    assert_eq!(entries[2].start_time_ms, 10_000);
    assert_eq!(entries[2].end_time_ms, 14_000);
}

#[test]
fn test_parse_withCrlfAndBom_shouldMatchPlainInput() {
    let windows = format!("\u{feff}{}", common::SAMPLE_SRT.replace('\n', "\r\n"));
    assert_eq!(srt::parse(&windows), srt::parse(common::SAMPLE_SRT));
}

#[test]
fn test_parse_withMultilineText_shouldJoinLines() {
    let content = "1\n00:00:01,000 --> 00:00:02,000\nFirst line  \nSecond line\n";
    let entries = srt::parse(content);
    assert_eq!(entries[0].text, "First line\nSecond line");
}

#[test]
fn test_parse_withMalformedMiddleBlock_shouldSkipItAndRenumber() {
    common::init_logging();
    let content = "1\n00:00:01,000 --> 00:00:02,000\nOne\n\n\
                   2\n00:00:0x,000 --> 00:00:03,000\nBroken\n\n\
                   3\n00:00:04,000 --> 00:00:05,000\nThree\n";

    let entries = srt::parse(content);

    let texts: Vec<&str> = entries.iter().map(|e| e.text.as_str()).collect();
    assert_eq!(texts, vec!["One", "Three"]);
    assert_eq!(entries[1].seq_num, 2);
}

#[test]
fn test_parse_withIgnoredLabelsAndCoordinates_shouldUseFileOrder() {
    let content = "7\n00:00:01.000 --> 00:00:02.000 X1:10 X2:20 Y1:5 Y2:15\nA\n\n\
                   00:00:03,000 --> 00:00:04,000\nB\n";

    let entries = srt::parse(content);

    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].seq_num, 1);
    assert_eq!((entries[0].start_time_ms, entries[0].end_time_ms), (1000, 2000));
    assert_eq!(entries[1].text, "B");
}

#[test]
fn test_parse_withNoValidBlock_shouldReturnEmpty() {
    assert!(srt::parse("").is_empty());
    assert!(srt::parse("\n\n  \n").is_empty());
    assert!(srt::parse("Dear diary,\n\ntoday nothing happened.").is_empty());
}

#[test]
fn test_parseBlock_shouldReportSpecificErrors() {
    assert_eq!(
        srt::parse_block(&["1", "Hello"], 4),
        Err(FormatError::MissingTimeRange { block: 4 })
    );
    assert_eq!(
        srt::parse_block(&["1", "00:00:01,000 --> 00:00:02,000"], 2),
        Err(FormatError::MissingText { block: 2 })
    );
    assert_eq!(
        srt::parse_block(&["00:00:05,000 --> 00:00:01,000", "Back"], 1),
        Err(FormatError::InvertedTimeRange {
            block: 1,
            start_ms: 5000,
            end_ms: 1000
        })
    );
    assert!(matches!(
        srt::parse_block(&["00:61:00,000 --> 01:02:00,000", "Bad"], 3),
        Err(FormatError::InvalidTimeRange { block: 3, .. })
    ));
}

#[test]
fn test_parseBlock_withEqualStartAndEnd_shouldAccept() {
    let entry = srt::parse_block(&["00:00:01,000 --> 00:00:01,000", "Flash"], 1).unwrap();
    assert_eq!(entry.start_time_ms, entry.end_time_ms);
}

#[test]
fn test_timestamps_shouldFormatAndParse() {
    assert_eq!(srt::format_timestamp(0), "00:00:00,000");
    assert_eq!(srt::format_timestamp(3_723_004), "01:02:03,004");
    assert_eq!(srt::parse_timestamp("01:02:03,004").unwrap(), 3_723_004);
    assert_eq!(srt::parse_timestamp("00:00:01.500").unwrap(), 1500);
    assert!(srt::parse_timestamp("1:2").is_err());
    assert!(srt::parse_timestamp("00:00:01,5").is_err());
}

#[test]
fn test_serialize_shouldNumberFromOneAndSeparateBlocks() {
    let entries = vec![
        SubtitleEntry::new(5, 1000, 2500, "Hello"),
        SubtitleEntry::new(9, 3000, 4000, "Two\nlines"),
    ];

    assert_eq!(
        srt::serialize(&entries),
        "1\n00:00:01,000 --> 00:00:02,500\nHello\n\n2\n00:00:03,000 --> 00:00:04,000\nTwo\nlines\n"
    );
    assert_eq!(srt::serialize::<SubtitleEntry>(&[]), "");
}

#[test]
fn test_serialize_ofParsedSample_shouldReproduceIt() {
    let entries = srt::parse(common::SAMPLE_SRT);
    assert_eq!(srt::serialize(&entries), common::SAMPLE_SRT);
}

// @const: Largest time an SRT timestamp can carry: 999:59:59,999
const MAX_TIME_MS: u64 = 3_599_999_999;

fn generated_sequence(count: usize) -> Vec<SubtitleEntry> {
    const TEXTS: [&str; 5] = [
        "Hello",
        "Two\nlines",
        "Привет, мир",
        "- Who's there?\n- Me.\n- Third speaker",
        "Arrow --> inside text",
    ];

    (0..count)
        .map(|i| {
            let start = if i == 0 {
                0
            } else {
                (i as u64 * 7_919_013 + count as u64 * 104_729) % MAX_TIME_MS
            };
            let end = if i + 1 == count {
                MAX_TIME_MS
            } else {
                (start + (i as u64 % 3) * 1_250).min(MAX_TIME_MS)
            };
            SubtitleEntry::new(i + 1, start, end, TEXTS[(i + count) % TEXTS.len()])
        })
        .collect()
}

#[test]
fn test_roundTrip_withGeneratedSequences_shouldPreserveTimingsAndText() {
    for count in 0..=24 {
        let entries = generated_sequence(count);
        let serialized = srt::serialize(&entries);

        assert_eq!(srt::parse(&serialized), entries, "sequence of {} captions", count);
    }
}

#[test]
fn test_roundTrip_withBoundaryTimes_shouldKeepExtremes() {
    let entries = vec![
        SubtitleEntry::new(1, 0, 0, "Start"),
        SubtitleEntry::new(2, MAX_TIME_MS, MAX_TIME_MS, "End"),
    ];
    let serialized = srt::serialize(&entries);

    assert!(serialized.contains("00:00:00,000 --> 00:00:00,000"));
    assert!(serialized.contains("999:59:59,999 --> 999:59:59,999"));
    assert_eq!(srt::parse(&serialized), entries);
}
