/*!
 * Database module for persistent storage of subtitle documents.
 *
 * This module provides SQLite-based persistence for:
 * - Documents created from uploaded subtitle files
 * - Captions, stored in original file order
 * - Append-only user translations of captions
 */

use async_trait::async_trait;

use crate::errors::StoreError;

pub mod schema;
pub mod connection;
pub mod repository;
pub mod models;

// Re-export main types
pub use connection::DatabaseConnection;
pub use models::{
    CaptionRecord, CaptionWithTranslations, DocumentRecord, NewCaption, NewDocument,
    TranslationRecord,
};
pub use repository::Repository;

/// Storage contract consumed by the document pipeline.
///
/// Implementations must keep captions in the order given by their position
/// and translations in append order.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Create a document and assign its id and creation time
    async fn create_document(&self, document: &NewDocument) -> Result<DocumentRecord, StoreError>;

    /// Insert all captions of a document; either every caption is written or none is
    async fn create_captions(&self, document_id: &str, captions: &[NewCaption]) -> Result<(), StoreError>;

    /// Look up a document by id
    async fn find_document(&self, document_id: &str) -> Result<Option<DocumentRecord>, StoreError>;

    /// Captions of a document ordered by position, each with its translations
    async fn find_captions(&self, document_id: &str) -> Result<Vec<CaptionWithTranslations>, StoreError>;

    /// Append a translation to a caption
    async fn append_translation(
        &self,
        caption_id: i64,
        text: &str,
        author: &str,
    ) -> Result<TranslationRecord, StoreError>;

    /// Delete a document with its captions and translations; false if it did not exist
    async fn delete_document(&self, document_id: &str) -> Result<bool, StoreError>;

    /// All documents, newest first
    async fn list_documents(&self) -> Result<Vec<DocumentRecord>, StoreError>;
}
