/*!
 * Integration tests for ingestion when the store fails part-way
 */

use std::sync::atomic::Ordering;
use std::sync::Arc;

use anyhow::Result;

use subtrans::database::{DocumentStore, Repository};
use subtrans::errors::PipelineError;
use subtrans::merge::ExportPolicy;
use subtrans::pipeline::{DocumentPipeline, IngestLimits};

use crate::common;
use crate::common::failing_store::FailingStore;

#[tokio::test]
async fn test_ingest_withCaptionFailure_shouldRemoveCreatedDocument() -> Result<()> {
    common::init_logging();
    let store = Arc::new(FailingStore::failing_captions(Repository::new_in_memory()?));
    let pipeline = DocumentPipeline::new(store.clone(), IngestLimits::default());

    let error = pipeline
        .ingest(common::utf8_request(common::SAMPLE_SRT.as_bytes()), "alice")
        .await
        .expect_err("caption failure must fail the ingest");

    assert!(matches!(error, PipelineError::Persistence(_)));
    assert_eq!(error.public_message(), "Server error");
    assert_eq!(store.delete_calls.load(Ordering::SeqCst), 1);
    assert!(store.list_documents().await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_ingest_withFailedCompensation_shouldLeaveDocumentUnexportable() -> Result<()> {
    common::init_logging();
    let store = Arc::new(FailingStore::failing_captions(Repository::new_in_memory()?));
    store.fail_delete.store(true, Ordering::SeqCst);
    let pipeline = DocumentPipeline::new(store.clone(), IngestLimits::default());

    let result = pipeline
        .ingest(common::utf8_request(common::SAMPLE_SRT.as_bytes()), "alice")
        .await;
    assert!(matches!(result, Err(PipelineError::Persistence(_))));

    let leftovers = store.list_documents().await?;
    assert_eq!(leftovers.len(), 1);
    assert_eq!(leftovers[0].caption_count, 0);

    let export = pipeline.export(&leftovers[0].id, ExportPolicy::default()).await;
    assert!(matches!(export, Err(PipelineError::NotFound(_))));
    Ok(())
}

#[tokio::test]
async fn test_ingest_afterStoreRecovers_shouldSucceed() -> Result<()> {
    common::init_logging();
    let store = Arc::new(FailingStore::failing_captions(Repository::new_in_memory()?));
    let pipeline = DocumentPipeline::new(store.clone(), IngestLimits::default());

    assert!(pipeline
        .ingest(common::utf8_request(common::SAMPLE_SRT.as_bytes()), "alice")
        .await
        .is_err());

    store.fail_captions.store(false, Ordering::SeqCst);
    let document = pipeline
        .ingest(common::utf8_request(common::SAMPLE_SRT.as_bytes()), "alice")
        .await?;

    let listed = store.list_documents().await?;
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, document.id);
    Ok(())
}
