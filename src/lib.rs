/*!
 * # subtrans - collaborative subtitle translation storage
 *
 * A Rust library for ingesting SRT subtitle files, storing their captions
 * and exporting them back with user-supplied translations.
 *
 * ## Features
 *
 * - Decode uploads from legacy single-byte and CJK encodings into UTF-8
 * - Tolerant SRT parsing; malformed blocks are skipped and logged
 * - SQLite storage of documents, captions and append-only translations
 * - Export with translations substituted, or with the original text
 * - ISO 639-1 and ISO 639-2 language code support
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `encoding`: Supported source encodings and byte-to-text conversion
 * - `srt`: SRT parsing and serialization
 * - `merge`: Selection between original text and translations on export
 * - `pipeline`: Upload validation, ingestion and export orchestration
 * - `database`: Document store contract and its SQLite implementation
 * - `app_config`: Configuration management
 * - `language_utils`: ISO language code utilities
 * - `errors`: Custom error types for the application
 */

// Global lints configuration
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod database;
pub mod encoding;
pub mod errors;
pub mod language_utils;
pub mod merge;
pub mod pipeline;
pub mod srt;

// Re-export main types for easier usage
pub use app_config::Config;
pub use database::{DocumentStore, Repository};
pub use encoding::SourceEncoding;
pub use errors::{EncodingError, FormatError, PipelineError, StoreError, ValidationErrors};
pub use merge::{ExportPolicy, ExportRecord};
pub use pipeline::{DocumentMetadata, DocumentPipeline, IngestLimits, IngestRequest, SrtDownload};
pub use srt::{SubtitleEntry, TimedText};
