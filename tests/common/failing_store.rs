/*!
 * Document store that delegates to a real repository but can be told to
 * fail individual operations.
 */

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use anyhow::anyhow;
use async_trait::async_trait;

use subtrans::database::{
    CaptionWithTranslations, DocumentRecord, DocumentStore, NewCaption, NewDocument, Repository,
    TranslationRecord,
};
use subtrans::errors::StoreError;

pub struct FailingStore {
    pub inner: Repository,
    pub fail_captions: AtomicBool,
    pub fail_delete: AtomicBool,
    pub delete_calls: AtomicUsize,
}

impl FailingStore {
    pub fn new(inner: Repository) -> Self {
        Self {
            inner,
            fail_captions: AtomicBool::new(false),
            fail_delete: AtomicBool::new(false),
            delete_calls: AtomicUsize::new(0),
        }
    }

    pub fn failing_captions(inner: Repository) -> Self {
        let store = Self::new(inner);
        store.fail_captions.store(true, Ordering::SeqCst);
        store
    }
}

#[async_trait]
impl DocumentStore for FailingStore {
    async fn create_document(&self, document: &NewDocument) -> Result<DocumentRecord, StoreError> {
        self.inner.create_document(document).await
    }

    async fn create_captions(&self, document_id: &str, captions: &[NewCaption]) -> Result<(), StoreError> {
        if self.fail_captions.load(Ordering::SeqCst) {
            return Err(StoreError::Backend(anyhow!("disk full")));
        }
        self.inner.create_captions(document_id, captions).await
    }

    async fn find_document(&self, document_id: &str) -> Result<Option<DocumentRecord>, StoreError> {
        self.inner.find_document(document_id).await
    }

    async fn find_captions(&self, document_id: &str) -> Result<Vec<CaptionWithTranslations>, StoreError> {
        self.inner.find_captions(document_id).await
    }

    async fn append_translation(
        &self,
        caption_id: i64,
        text: &str,
        author: &str,
    ) -> Result<TranslationRecord, StoreError> {
        self.inner.append_translation(caption_id, text, author).await
    }

    async fn delete_document(&self, document_id: &str) -> Result<bool, StoreError> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_delete.load(Ordering::SeqCst) {
            return Err(StoreError::Backend(anyhow!("database is locked")));
        }
        self.inner.delete_document(document_id).await
    }

    async fn list_documents(&self) -> Result<Vec<DocumentRecord>, StoreError> {
        self.inner.list_documents().await
    }
}
