/*!
 * Integration tests for a file-backed database
 */

use std::sync::Arc;

use anyhow::Result;

use subtrans::database::{DatabaseConnection, Repository};
use subtrans::merge::ExportPolicy;
use subtrans::pipeline::{content_hash, DocumentPipeline, IngestLimits};

use crate::common;

fn open_pipeline(path: &std::path::Path) -> Result<(Repository, DocumentPipeline<Repository>)> {
    let repository = Repository::new(DatabaseConnection::new(path)?);
    let pipeline = DocumentPipeline::new(Arc::new(repository.clone()), IngestLimits::default());
    Ok((repository, pipeline))
}

#[tokio::test]
async fn test_reopenDatabase_shouldKeepDocumentsAndTranslations() -> Result<()> {
    common::init_logging();
    let temp_dir = common::create_temp_dir()?;
    let db_path = temp_dir.path().join("nested").join("subtrans.db");

    let document_id = {
        let (_, pipeline) = open_pipeline(&db_path)?;
        let document = pipeline
            .ingest(common::utf8_request(common::SAMPLE_SRT.as_bytes()), "alice")
            .await?;
        let first = pipeline.captions(&document.id).await?[0].caption.id;
        pipeline.append_translation(first, "Это тестовый субтитр.", "bob").await?;
        document.id
    };

    let (repository, pipeline) = open_pipeline(&db_path)?;
    let download = pipeline.export(&document_id, ExportPolicy::new(true)).await?;
    assert_eq!(download.body, "1\n00:00:01,000 --> 00:00:04,000\nЭто тестовый субтитр.\n");

    let stats = repository.connection().stats()?;
    assert_eq!(stats.document_count, 1);
    assert_eq!(stats.caption_count, 3);
    assert_eq!(stats.translation_count, 1);
    assert_eq!(stats.translated_captions, 1);
    Ok(())
}

#[tokio::test]
async fn test_uploadFromDisk_shouldMatchInMemoryBytes() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let srt_path = common::create_test_file(temp_dir.path(), "movie.srt", common::SAMPLE_SRT.as_bytes())?;
    let (_, pipeline) = open_pipeline(&temp_dir.path().join("subtrans.db"))?;

    let bytes = std::fs::read(&srt_path)?;
    let document = pipeline.ingest(common::utf8_request(&bytes), "alice").await?;

    assert_eq!(document.content_hash, content_hash(common::SAMPLE_SRT));
    Ok(())
}
