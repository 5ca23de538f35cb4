/*!
 * Tests for source encoding conversion
 */

use subtrans::encoding::{convert, SourceEncoding};
use subtrans::errors::EncodingError;

fn utf16le(text: &str) -> Vec<u8> {
    text.encode_utf16().flat_map(|unit| unit.to_le_bytes()).collect()
}

fn utf16be(text: &str) -> Vec<u8> {
    text.encode_utf16().flat_map(|unit| unit.to_be_bytes()).collect()
}

#[test]
fn test_convert_withWindows1251_shouldDecodeCyrillic() {
    // "Привет"
    let bytes = [0xCF, 0xF0, 0xE8, 0xE2, 0xE5, 0xF2];
    assert_eq!(convert(&bytes, SourceEncoding::Windows1251).unwrap(), "Привет");
}

#[test]
fn test_convert_withIso8859_5_shouldDecodeCyrillic() {
    // "Да"
    let bytes = [0xB4, 0xD0];
    assert_eq!(convert(&bytes, SourceEncoding::Iso8859_5).unwrap(), "Да");
}

#[test]
fn test_convert_withShiftJis_shouldDecodeKanji() {
    // "日本"
    let bytes = [0x93, 0xFA, 0x96, 0x7B];
    assert_eq!(convert(&bytes, SourceEncoding::ShiftJis).unwrap(), "日本");
}

#[test]
fn test_convert_withUtf16_shouldDecodeBothByteOrders() {
    let text = "1\n00:00:01,000 --> 00:00:02,000\nÜber\n";
    assert_eq!(convert(&utf16le(text), SourceEncoding::Utf16Le).unwrap(), text);
    assert_eq!(convert(&utf16be(text), SourceEncoding::Utf16Be).unwrap(), text);
}

#[test]
fn test_convert_withTruncatedUtf16_shouldFail() {
    let mut bytes = utf16le("Hi");
    bytes.push(0x41);

    let result = convert(&bytes, SourceEncoding::Utf16Le);
    assert_eq!(
        result,
        Err(EncodingError::Malformed {
            encoding: SourceEncoding::Utf16Le
        })
    );
}

#[test]
fn test_convert_withWindows1252_shouldAcceptEveryByte() {
    let bytes: Vec<u8> = (0u8..=255).collect();
    let decoded = convert(&bytes, SourceEncoding::Windows1252).unwrap();
    assert_eq!(decoded.chars().count(), 256);
}

#[test]
fn test_convert_withAsciiInput_shouldMatchAcrossEncodings() {
    let text = "1\n00:00:01,000 --> 00:00:02,000\nHello\n";
    for encoding in [
        SourceEncoding::Utf8,
        SourceEncoding::Windows1250,
        SourceEncoding::Windows1251,
        SourceEncoding::Koi8R,
        SourceEncoding::Iso8859_2,
        SourceEncoding::ShiftJis,
        SourceEncoding::Gbk,
        SourceEncoding::EucKr,
    ] {
        assert_eq!(convert(text.as_bytes(), encoding).unwrap(), text, "{}", encoding);
    }
}

#[test]
fn test_parse_withLabels_shouldAcceptAliasesCaseInsensitively() {
    assert_eq!("UTF-8".parse::<SourceEncoding>().unwrap(), SourceEncoding::Utf8);
    assert_eq!("CP1251".parse::<SourceEncoding>().unwrap(), SourceEncoding::Windows1251);
    assert_eq!("latin1".parse::<SourceEncoding>().unwrap(), SourceEncoding::Windows1252);
    assert_eq!(" Shift_JIS ".parse::<SourceEncoding>().unwrap(), SourceEncoding::ShiftJis);
    assert!("ebcdic".parse::<SourceEncoding>().is_err());
    assert!("".parse::<SourceEncoding>().is_err());
}

#[test]
fn test_all_shouldRoundTripThroughLabels() {
    for encoding in SourceEncoding::all() {
        assert_eq!(encoding.as_str().parse::<SourceEncoding>().unwrap(), *encoding);
    }
    assert!(SourceEncoding::Utf8.is_canonical());
    assert!(!SourceEncoding::Koi8U.is_canonical());
}
