/*!
 * Document ingestion and export.
 *
 * Ingestion validates an upload, decodes it, parses the SRT content and
 * stores the document with its captions. Export loads the captions back,
 * applies the translation policy and serializes them as SRT.
 *
 * The store is injected; nothing here reaches for a global registry.
 */

use std::sync::Arc;

use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::database::{
    CaptionWithTranslations, DocumentRecord, DocumentStore, NewCaption, NewDocument,
    TranslationRecord,
};
use crate::encoding::{self, SourceEncoding};
use crate::errors::{PipelineError, StoreError, ValidationErrors};
use crate::language_utils;
use crate::merge::{self, ExportPolicy, ExportRecord};
use crate::srt;

/// Default upload limit: 1 MiB
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 1024 * 1024;

/// Content type of exported files
pub const SRT_CONTENT_TYPE: &str = "text/srt";

/// Form fields submitted with an upload
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub title: String,
    pub source_language: String,
    pub target_language: String,
    /// Encoding identifier exactly as submitted
    pub encoding: String,
}

/// An upload as received at the boundary
#[derive(Debug, Clone, Default)]
pub struct IngestRequest {
    /// File contents; `None` when no file was attached
    pub file: Option<Vec<u8>>,
    pub metadata: DocumentMetadata,
}

impl IngestRequest {
    pub fn new(file: Option<Vec<u8>>, metadata: DocumentMetadata) -> Self {
        Self { file, metadata }
    }
}

/// Limits applied before any decoding happens
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestLimits {
    pub max_upload_bytes: usize,
}

impl Default for IngestLimits {
    fn default() -> Self {
        Self {
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

/// An exported subtitle file ready to be sent to the client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SrtDownload {
    /// `<document title>.srt`
    pub filename: String,
    pub content_type: &'static str,
    pub body: String,
}

impl SrtDownload {
    fn new(title: &str, body: String) -> Self {
        Self {
            filename: download_filename(title),
            content_type: SRT_CONTENT_TYPE,
            body,
        }
    }
}

/// Hex SHA-256 of decoded document text
pub fn content_hash(text: &str) -> String {
    format!("{:x}", Sha256::digest(text.as_bytes()))
}

/// Build `<title>.srt`, replacing characters that cannot appear in a filename
pub fn download_filename(title: &str) -> String {
    let cleaned: String = title
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | '"' | ':' | '*' | '?' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    if cleaned.is_empty() {
        "subtitles.srt".to_string()
    } else {
        format!("{}.srt", cleaned)
    }
}

fn describe_size(bytes: usize) -> String {
    const MIB: usize = 1024 * 1024;
    if bytes >= MIB && bytes % MIB == 0 {
        format!("{} MB", bytes / MIB)
    } else if bytes >= 1024 && bytes % 1024 == 0 {
        format!("{} KB", bytes / 1024)
    } else {
        format!("{} bytes", bytes)
    }
}

/// Validated form of an upload, produced only when every check passed
struct CheckedUpload<'a> {
    bytes: &'a [u8],
    encoding: SourceEncoding,
    source_language: String,
    target_language: String,
}

/// Orchestrates ingestion and export over an injected store
pub struct DocumentPipeline<S: DocumentStore + ?Sized> {
    store: Arc<S>,
    limits: IngestLimits,
}

impl<S: DocumentStore + ?Sized> Clone for DocumentPipeline<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            limits: self.limits,
        }
    }
}

impl<S: DocumentStore + ?Sized> DocumentPipeline<S> {
    pub fn new(store: Arc<S>, limits: IngestLimits) -> Self {
        Self { store, limits }
    }

    pub fn limits(&self) -> IngestLimits {
        self.limits
    }

    /// Run every boundary check and collect all violations
    fn check_upload<'a>(&self, request: &'a IngestRequest) -> Result<CheckedUpload<'a>, ValidationErrors> {
        let metadata = &request.metadata;
        let mut errors = ValidationErrors::new(Some(metadata.clone()));

        let bytes = match &request.file {
            None => {
                errors.push("Please select file to upload");
                None
            }
            Some(bytes) if bytes.len() > self.limits.max_upload_bytes => {
                errors.push(format!(
                    "File too big (Maximum size is {})",
                    describe_size(self.limits.max_upload_bytes)
                ));
                None
            }
            Some(bytes) => Some(bytes.as_slice()),
        };

        let encoding = if metadata.encoding.trim().is_empty() {
            errors.push("Select subtitles file encoding");
            None
        } else {
            match metadata.encoding.parse::<SourceEncoding>() {
                Ok(encoding) => Some(encoding),
                Err(_) => {
                    errors.push(format!("Unsupported file encoding: {}", metadata.encoding.trim()));
                    None
                }
            }
        };

        if metadata.title.trim().is_empty() {
            errors.push("Title is required");
        }

        let mut language = |code: &str, label: &str| -> Option<String> {
            if code.trim().is_empty() {
                errors.push(format!("Select {} language", label));
                return None;
            }
            match language_utils::normalize_to_part1_or_part2t(code) {
                Ok(normalized) => Some(normalized),
                Err(_) => {
                    errors.push(format!("Unknown {} language: {}", label, code.trim()));
                    None
                }
            }
        };
        let source_language = language(&metadata.source_language, "source");
        let target_language = language(&metadata.target_language, "target");

        match (bytes, encoding, source_language, target_language) {
            (Some(bytes), Some(encoding), Some(source_language), Some(target_language))
                if errors.is_empty() =>
            {
                Ok(CheckedUpload {
                    bytes,
                    encoding,
                    source_language,
                    target_language,
                })
            }
            _ => Err(errors),
        }
    }

    /// Map a store failure, logging backend detail that must not reach the caller
    fn store_failure(&self, operation: &str, error: StoreError) -> PipelineError {
        let mapped = PipelineError::from(error);
        if let PipelineError::Persistence(e) = &mapped {
            error!("Store failure during {}: {:#}", operation, e);
        }
        mapped
    }

    /// Validate, decode, parse and persist an uploaded subtitle file
    pub async fn ingest(&self, request: IngestRequest, owner: &str) -> Result<DocumentRecord, PipelineError> {
        let metadata = request.metadata.clone();
        let upload = self
            .check_upload(&request)
            .map_err(PipelineError::Validation)?;

        let text = encoding::convert(upload.bytes, upload.encoding).map_err(|e| {
            debug!("Rejecting upload: {}", e);
            PipelineError::Validation(ValidationErrors::single(
                "Invalid file encoding",
                Some(metadata.clone()),
            ))
        })?;

        let entries = srt::parse(&text);
        if entries.is_empty() {
            return Err(PipelineError::Validation(ValidationErrors::single(
                "Wrong subtitles file",
                Some(metadata.clone()),
            )));
        }

        let new_document = NewDocument {
            title: metadata.title.trim().to_string(),
            source_language: upload.source_language,
            target_language: upload.target_language,
            owner: owner.to_string(),
            encoding: upload.encoding,
            content_hash: content_hash(&text),
        };
        let captions: Vec<NewCaption> = entries.iter().map(NewCaption::from).collect();

        let mut document = match self.store.create_document(&new_document).await {
            Ok(document) => document,
            Err(StoreError::Validation { field, message }) => {
                return Err(PipelineError::Validation(ValidationErrors::single(
                    format!("Invalid {}: {}", field, message),
                    Some(metadata),
                )));
            }
            Err(e) => return Err(self.store_failure("document creation", e)),
        };

        if let Err(e) = self.store.create_captions(&document.id, &captions).await {
            error!(
                "Failed to store {} captions for document {}: {}",
                captions.len(),
                document.id,
                e
            );
            self.compensate(&document.id).await;
            return Err(PipelineError::Persistence(anyhow::Error::new(e)));
        }

        document.caption_count = captions.len() as i64;
        info!(
            "Ingested document {} ({}) with {} captions",
            document.id, document.title, document.caption_count
        );

        Ok(document)
    }

    /// Remove a document whose captions could not be written
    async fn compensate(&self, document_id: &str) {
        match self.store.delete_document(document_id).await {
            Ok(_) => warn!("Rolled back document {} after caption failure", document_id),
            Err(e) => error!(
                "Failed to roll back document {}; it has no captions and exports as not found: {}",
                document_id, e
            ),
        }
    }

    /// Load a document and its captions; missing or empty documents are not found
    async fn load_for_export(
        &self,
        document_id: &str,
    ) -> Result<(DocumentRecord, Vec<CaptionWithTranslations>), PipelineError> {
        let document = self
            .store
            .find_document(document_id)
            .await
            .map_err(|e| self.store_failure("document lookup", e))?
            .ok_or_else(|| PipelineError::NotFound(format!("document {}", document_id)))?;

        let captions = self
            .store
            .find_captions(document_id)
            .await
            .map_err(|e| self.store_failure("caption lookup", e))?;

        if captions.is_empty() {
            return Err(PipelineError::NotFound(format!(
                "captions of document {}",
                document_id
            )));
        }

        Ok((document, captions))
    }

    fn render(document: &DocumentRecord, records: &[ExportRecord]) -> SrtDownload {
        debug!(
            "Exporting {} captions of document {}",
            records.len(),
            document.id
        );
        SrtDownload::new(&document.title, srt::serialize(records))
    }

    /// Export a document, substituting translations according to `policy`
    pub async fn export(&self, document_id: &str, policy: ExportPolicy) -> Result<SrtDownload, PipelineError> {
        let (document, captions) = self.load_for_export(document_id).await?;
        let records = merge::merge_all(&captions, policy);
        Ok(Self::render(&document, &records))
    }

    /// Export a document with every caption's original text
    pub async fn export_original(&self, document_id: &str) -> Result<SrtDownload, PipelineError> {
        let (document, captions) = self.load_for_export(document_id).await?;
        let records = merge::originals(&captions);
        Ok(Self::render(&document, &records))
    }

    /// Append a user translation to a caption
    pub async fn append_translation(
        &self,
        caption_id: i64,
        text: &str,
        author: &str,
    ) -> Result<TranslationRecord, PipelineError> {
        // Blank lines would split the caption into separate SRT blocks on export
        let text = srt::normalize_text(text);
        if text.is_empty() {
            return Err(PipelineError::Validation(ValidationErrors::single(
                "Translation text is required",
                None,
            )));
        }

        self.store
            .append_translation(caption_id, &text, author)
            .await
            .map_err(|e| self.store_failure("translation append", e))
    }

    /// Fetch a document for display
    pub async fn document(&self, document_id: &str) -> Result<DocumentRecord, PipelineError> {
        self.store
            .find_document(document_id)
            .await
            .map_err(|e| self.store_failure("document lookup", e))?
            .ok_or_else(|| PipelineError::NotFound(format!("document {}", document_id)))
    }

    /// Captions of a document with their translations
    pub async fn captions(&self, document_id: &str) -> Result<Vec<CaptionWithTranslations>, PipelineError> {
        self.document(document_id).await?;
        self.store
            .find_captions(document_id)
            .await
            .map_err(|e| self.store_failure("caption lookup", e))
    }

    /// All documents, newest first
    pub async fn list_documents(&self) -> Result<Vec<DocumentRecord>, PipelineError> {
        self.store
            .list_documents()
            .await
            .map_err(|e| self.store_failure("document listing", e))
    }

    /// Delete a document together with its captions and translations
    pub async fn delete_document(&self, document_id: &str) -> Result<(), PipelineError> {
        let deleted = self
            .store
            .delete_document(document_id)
            .await
            .map_err(|e| self.store_failure("document deletion", e))?;

        if !deleted {
            return Err(PipelineError::NotFound(format!("document {}", document_id)));
        }

        info!("Deleted document {}", document_id);
        Ok(())
    }
}
