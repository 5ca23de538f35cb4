/*!
 * Database entity models and DTOs.
 *
 * These structures map directly to database tables and provide
 * type-safe access to persisted data.
 */

use serde::{Deserialize, Serialize};

use crate::encoding::SourceEncoding;
use crate::srt::{SubtitleEntry, TimedText};

/// Fields needed to create a document; the store assigns id and timestamp
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewDocument {
    /// Display title, also used for the download filename
    pub title: String,
    /// Source language code
    pub source_language: String,
    /// Target language code
    pub target_language: String,
    /// Reference to the uploading user
    pub owner: String,
    /// Encoding the upload was declared in
    pub encoding: SourceEncoding,
    /// SHA256 hash of the decoded text
    pub content_hash: String,
}

/// Subtitle document record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRecord {
    /// Unique document identifier (UUID)
    pub id: String,
    pub title: String,
    pub source_language: String,
    pub target_language: String,
    pub owner: String,
    pub encoding: SourceEncoding,
    pub content_hash: String,
    /// Creation timestamp (ISO 8601)
    pub created_at: String,
    /// Number of captions stored for the document
    pub caption_count: i64,
}

/// Caption to be inserted for a document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCaption {
    /// 1-based position in the original file
    pub position: i64,
    pub start_time_ms: i64,
    pub end_time_ms: i64,
    pub text: String,
}

impl NewCaption {
    pub fn new(position: i64, start_time_ms: i64, end_time_ms: i64, text: String) -> Self {
        Self {
            position,
            start_time_ms,
            end_time_ms,
            text,
        }
    }
}

impl From<&SubtitleEntry> for NewCaption {
    fn from(entry: &SubtitleEntry) -> Self {
        Self::new(
            entry.seq_num as i64,
            entry.start_time_ms as i64,
            entry.end_time_ms as i64,
            entry.text.clone(),
        )
    }
}

/// Stored caption record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptionRecord {
    /// Database ID
    pub id: i64,
    /// Owning document
    pub document_id: String,
    /// 1-based position in the original file
    pub position: i64,
    pub start_time_ms: i64,
    pub end_time_ms: i64,
    pub text: String,
}

impl TimedText for CaptionRecord {
    fn start_time_ms(&self) -> u64 {
        self.start_time_ms.max(0) as u64
    }

    fn end_time_ms(&self) -> u64 {
        self.end_time_ms.max(0) as u64
    }

    fn text(&self) -> &str {
        &self.text
    }
}

/// User translation of a caption; append-only
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationRecord {
    /// Database ID, increasing in append order
    pub id: i64,
    pub caption_id: i64,
    pub text: String,
    /// Reference to the translating user
    pub author: String,
    /// Creation timestamp (ISO 8601)
    pub created_at: String,
}

/// Caption together with its translations in append order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptionWithTranslations {
    pub caption: CaptionRecord,
    pub translations: Vec<TranslationRecord>,
}

impl CaptionWithTranslations {
    pub fn new(caption: CaptionRecord, translations: Vec<TranslationRecord>) -> Self {
        Self {
            caption,
            translations,
        }
    }

    /// The translation used on export: the first one appended
    pub fn current_translation(&self) -> Option<&TranslationRecord> {
        self.translations.first()
    }
}
