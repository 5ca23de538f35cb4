/*!
 * Repository layer for database operations.
 *
 * This module provides a high-level API for all database operations,
 * abstracting away the SQL details and providing type-safe access.
 */

use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use log::debug;
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use super::connection::DatabaseConnection;
use super::models::{
    CaptionRecord, CaptionWithTranslations, DocumentRecord, NewCaption, NewDocument,
    TranslationRecord,
};
use super::DocumentStore;
use crate::errors::StoreError;

const SELECT_DOCUMENT: &str = r#"
    SELECT d.id, d.title, d.source_language, d.target_language, d.owner,
           d.encoding, d.content_hash, d.created_at,
           (SELECT COUNT(*) FROM captions c WHERE c.document_id = d.id)
    FROM documents d
"#;

/// Fixed-width UTC timestamp so text ordering matches time ordering
fn timestamp_now() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Micros, true)
}

/// Repository for database operations
#[derive(Clone)]
pub struct Repository {
    /// Database connection
    db: DatabaseConnection,
}

impl Repository {
    /// Create a new repository with the given database connection
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Create a repository with an in-memory database (for testing)
    pub fn new_in_memory() -> Result<Self> {
        let db = DatabaseConnection::new_in_memory()?;
        Ok(Self::new(db))
    }

    /// Underlying connection, for statistics and maintenance
    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }

    fn parse_document_row(row: &rusqlite::Row) -> rusqlite::Result<DocumentRecord> {
        Ok(DocumentRecord {
            id: row.get(0)?,
            title: row.get(1)?,
            source_language: row.get(2)?,
            target_language: row.get(3)?,
            owner: row.get(4)?,
            encoding: row.get::<_, String>(5)?.parse().map_err(|e: anyhow::Error| {
                rusqlite::Error::FromSqlConversionFailure(5, rusqlite::types::Type::Text, e.into())
            })?,
            content_hash: row.get(6)?,
            created_at: row.get(7)?,
            caption_count: row.get(8)?,
        })
    }

    fn get_document_sync(conn: &Connection, document_id: &str) -> Result<Option<DocumentRecord>> {
        let sql = format!("{} WHERE d.id = ?1", SELECT_DOCUMENT);
        let result = conn
            .query_row(&sql, [document_id], Self::parse_document_row)
            .optional()?;

        Ok(result)
    }

    fn get_captions_sync(conn: &Connection, document_id: &str) -> Result<Vec<CaptionWithTranslations>> {
        let mut stmt = conn.prepare(
            r#"
            SELECT t.id, t.caption_id, t.text, t.author, t.created_at
            FROM translations t
            JOIN captions c ON c.id = t.caption_id
            WHERE c.document_id = ?1
            ORDER BY t.caption_id, t.id
            "#,
        )?;

        let mut translations: HashMap<i64, Vec<TranslationRecord>> = HashMap::new();
        let rows = stmt.query_map([document_id], |row| {
            Ok(TranslationRecord {
                id: row.get(0)?,
                caption_id: row.get(1)?,
                text: row.get(2)?,
                author: row.get(3)?,
                created_at: row.get(4)?,
            })
        })?;
        for row in rows {
            let translation = row?;
            translations
                .entry(translation.caption_id)
                .or_default()
                .push(translation);
        }

        let mut stmt = conn.prepare(
            r#"
            SELECT id, document_id, position, start_time_ms, end_time_ms, text
            FROM captions
            WHERE document_id = ?1
            ORDER BY position
            "#,
        )?;

        let captions = stmt
            .query_map([document_id], |row| {
                Ok(CaptionRecord {
                    id: row.get(0)?,
                    document_id: row.get(1)?,
                    position: row.get(2)?,
                    start_time_ms: row.get(3)?,
                    end_time_ms: row.get(4)?,
                    text: row.get(5)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(captions
            .into_iter()
            .map(|caption| {
                let items = translations.remove(&caption.id).unwrap_or_default();
                CaptionWithTranslations::new(caption, items)
            })
            .collect())
    }

    /// Map a failed write to a store error, surfacing CHECK violations as validation errors
    fn classify_write_error(error: anyhow::Error, field: &str) -> StoreError {
        if let Some(rusqlite::Error::SqliteFailure(failure, message)) = error.downcast_ref::<rusqlite::Error>() {
            if failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_CHECK {
                return StoreError::Validation {
                    field: field.to_string(),
                    message: message
                        .clone()
                        .unwrap_or_else(|| "constraint failed".to_string()),
                };
            }
        }
        StoreError::Backend(error)
    }
}

#[async_trait]
impl DocumentStore for Repository {
    async fn create_document(&self, document: &NewDocument) -> Result<DocumentRecord, StoreError> {
        let record = DocumentRecord {
            id: Uuid::new_v4().to_string(),
            title: document.title.clone(),
            source_language: document.source_language.clone(),
            target_language: document.target_language.clone(),
            owner: document.owner.clone(),
            encoding: document.encoding,
            content_hash: document.content_hash.clone(),
            created_at: timestamp_now(),
            caption_count: 0,
        };
        let row = record.clone();

        self.db
            .execute_async(move |conn| {
                conn.execute(
                    r#"
                    INSERT INTO documents (
                        id, title, source_language, target_language, owner,
                        encoding, content_hash, created_at
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                    "#,
                    params![
                        row.id,
                        row.title,
                        row.source_language,
                        row.target_language,
                        row.owner,
                        row.encoding.as_str(),
                        row.content_hash,
                        row.created_at,
                    ],
                )?;
                Ok(())
            })
            .await
            .map_err(|e| Self::classify_write_error(e, "title"))?;

        debug!("Created document {} ({})", record.id, record.title);
        Ok(record)
    }

    async fn create_captions(&self, document_id: &str, captions: &[NewCaption]) -> Result<(), StoreError> {
        let document_id = document_id.to_string();
        let captions = captions.to_vec();
        let count = captions.len();

        self.db
            .transaction_async(move |tx| {
                let mut stmt = tx.prepare(
                    r#"
                    INSERT INTO captions (document_id, position, start_time_ms, end_time_ms, text)
                    VALUES (?1, ?2, ?3, ?4, ?5)
                    "#,
                )?;
                for caption in captions {
                    stmt.execute(params![
                        document_id,
                        caption.position,
                        caption.start_time_ms,
                        caption.end_time_ms,
                        caption.text,
                    ])?;
                }
                Ok(())
            })
            .await
            .map_err(|e| Self::classify_write_error(e, "captions"))?;

        debug!("Inserted {} captions", count);
        Ok(())
    }

    async fn find_document(&self, document_id: &str) -> Result<Option<DocumentRecord>, StoreError> {
        let document_id = document_id.to_string();

        Ok(self
            .db
            .execute_async(move |conn| Self::get_document_sync(conn, &document_id))
            .await?)
    }

    async fn find_captions(&self, document_id: &str) -> Result<Vec<CaptionWithTranslations>, StoreError> {
        let document_id = document_id.to_string();

        Ok(self
            .db
            .execute_async(move |conn| Self::get_captions_sync(conn, &document_id))
            .await?)
    }

    async fn append_translation(
        &self,
        caption_id: i64,
        text: &str,
        author: &str,
    ) -> Result<TranslationRecord, StoreError> {
        let text = text.to_string();
        let author = author.to_string();
        let created_at = timestamp_now();

        let inserted = self
            .db
            .transaction_async(move |tx| {
                let exists = tx
                    .query_row("SELECT 1 FROM captions WHERE id = ?1", [caption_id], |_| Ok(()))
                    .optional()?;
                if exists.is_none() {
                    return Ok(None);
                }

                tx.execute(
                    "INSERT INTO translations (caption_id, text, author, created_at) VALUES (?1, ?2, ?3, ?4)",
                    params![caption_id, text, author, created_at],
                )?;

                Ok(Some(TranslationRecord {
                    id: tx.last_insert_rowid(),
                    caption_id,
                    text,
                    author,
                    created_at,
                }))
            })
            .await
            .map_err(|e| Self::classify_write_error(e, "translation"))?;

        inserted.ok_or_else(|| StoreError::NotFound(format!("caption {}", caption_id)))
    }

    async fn delete_document(&self, document_id: &str) -> Result<bool, StoreError> {
        let document_id = document_id.to_string();

        let deleted = self
            .db
            .execute_async(move |conn| {
                // Captions and translations go with it through ON DELETE CASCADE
                Ok(conn.execute("DELETE FROM documents WHERE id = ?1", [&document_id])?)
            })
            .await?;

        Ok(deleted > 0)
    }

    async fn list_documents(&self) -> Result<Vec<DocumentRecord>, StoreError> {
        Ok(self
            .db
            .execute_async(|conn| {
                let sql = format!("{} ORDER BY d.created_at DESC, d.rowid DESC", SELECT_DOCUMENT);
                let mut stmt = conn.prepare(&sql)?;
                let documents = stmt
                    .query_map([], Self::parse_document_row)?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                Ok(documents)
            })
            .await?)
    }
}
