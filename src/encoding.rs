/*!
 * Conversion of uploaded subtitle bytes into canonical UTF-8 text.
 *
 * The set of accepted source encodings is closed: an identifier is parsed
 * once into [`SourceEncoding`] at the boundary and every later stage works
 * with the typed value.
 */

use std::fmt;
use std::str::FromStr;

use anyhow::{anyhow, Result};
use encoding_rs::Encoding;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::errors::EncodingError;

/// Supported encodings for uploaded subtitle files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "&'static str")]
pub enum SourceEncoding {
    Utf8,
    Utf16Le,
    Utf16Be,
    Windows1250,
    Windows1251,
    Windows1252,
    Koi8R,
    Koi8U,
    Iso8859_2,
    Iso8859_5,
    ShiftJis,
    EucJp,
    Gbk,
    Big5,
    EucKr,
}

impl SourceEncoding {
    /// Every supported encoding, canonical one first
    pub fn all() -> &'static [SourceEncoding] {
        &[
            Self::Utf8,
            Self::Utf16Le,
            Self::Utf16Be,
            Self::Windows1250,
            Self::Windows1251,
            Self::Windows1252,
            Self::Koi8R,
            Self::Koi8U,
            Self::Iso8859_2,
            Self::Iso8859_5,
            Self::ShiftJis,
            Self::EucJp,
            Self::Gbk,
            Self::Big5,
            Self::EucKr,
        ]
    }

    /// Canonical identifier, as shown to users and stored with documents
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Utf8 => "utf-8",
            Self::Utf16Le => "utf-16le",
            Self::Utf16Be => "utf-16be",
            Self::Windows1250 => "windows-1250",
            Self::Windows1251 => "windows-1251",
            Self::Windows1252 => "windows-1252",
            Self::Koi8R => "koi8-r",
            Self::Koi8U => "koi8-u",
            Self::Iso8859_2 => "iso-8859-2",
            Self::Iso8859_5 => "iso-8859-5",
            Self::ShiftJis => "shift_jis",
            Self::EucJp => "euc-jp",
            Self::Gbk => "gbk",
            Self::Big5 => "big5",
            Self::EucKr => "euc-kr",
        }
    }

    /// Whether bytes in this encoding are already canonical text
    pub fn is_canonical(&self) -> bool {
        *self == Self::Utf8
    }

    fn codec(&self) -> &'static Encoding {
        match self {
            Self::Utf8 => encoding_rs::UTF_8,
            Self::Utf16Le => encoding_rs::UTF_16LE,
            Self::Utf16Be => encoding_rs::UTF_16BE,
            Self::Windows1250 => encoding_rs::WINDOWS_1250,
            Self::Windows1251 => encoding_rs::WINDOWS_1251,
            Self::Windows1252 => encoding_rs::WINDOWS_1252,
            Self::Koi8R => encoding_rs::KOI8_R,
            Self::Koi8U => encoding_rs::KOI8_U,
            Self::Iso8859_2 => encoding_rs::ISO_8859_2,
            Self::Iso8859_5 => encoding_rs::ISO_8859_5,
            Self::ShiftJis => encoding_rs::SHIFT_JIS,
            Self::EucJp => encoding_rs::EUC_JP,
            Self::Gbk => encoding_rs::GBK,
            Self::Big5 => encoding_rs::BIG5,
            Self::EucKr => encoding_rs::EUC_KR,
        }
    }
}

impl fmt::Display for SourceEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SourceEncoding {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "utf-8" | "utf8" => Ok(Self::Utf8),
            "utf-16le" | "utf16le" | "utf-16" => Ok(Self::Utf16Le),
            "utf-16be" | "utf16be" => Ok(Self::Utf16Be),
            "windows-1250" | "cp1250" => Ok(Self::Windows1250),
            "windows-1251" | "cp1251" => Ok(Self::Windows1251),
            // WHATWG decodes latin1 labels as windows-1252
            "windows-1252" | "cp1252" | "iso-8859-1" | "latin1" => Ok(Self::Windows1252),
            "koi8-r" | "koi8r" => Ok(Self::Koi8R),
            "koi8-u" | "koi8u" => Ok(Self::Koi8U),
            "iso-8859-2" | "latin2" => Ok(Self::Iso8859_2),
            "iso-8859-5" => Ok(Self::Iso8859_5),
            "shift_jis" | "shift-jis" | "sjis" | "cp932" => Ok(Self::ShiftJis),
            "euc-jp" => Ok(Self::EucJp),
            "gbk" | "gb2312" | "cp936" => Ok(Self::Gbk),
            "big5" => Ok(Self::Big5),
            "euc-kr" | "cp949" => Ok(Self::EucKr),
            _ => Err(anyhow!("Unsupported encoding: {}", s)),
        }
    }
}

impl TryFrom<String> for SourceEncoding {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<SourceEncoding> for &'static str {
    fn from(encoding: SourceEncoding) -> Self {
        encoding.as_str()
    }
}

/// Convert raw bytes declared as `encoding` into a UTF-8 string.
///
/// UTF-8 input is validated and taken over as-is so already-valid text never
/// goes through a decode pass. Every other encoding is decoded with malformed
/// sequences treated as fatal.
pub fn convert(bytes: &[u8], encoding: SourceEncoding) -> Result<String, EncodingError> {
    if encoding.is_canonical() {
        return String::from_utf8(bytes.to_vec())
            .map_err(|_| EncodingError::Malformed { encoding });
    }

    let decoded = encoding
        .codec()
        .decode_without_bom_handling_and_without_replacement(bytes)
        .ok_or(EncodingError::Malformed { encoding })?;

    debug!(
        "Decoded {} bytes of {} into {} chars",
        bytes.len(),
        encoding,
        decoded.chars().count()
    );

    Ok(decoded.into_owned())
}
