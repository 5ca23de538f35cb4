/*!
 * SQLite connection handle shared by the repository.
 *
 * One connection sits behind a mutex; async callers hop onto tokio's
 * blocking pool before touching it.
 */

use anyhow::{anyhow, Context, Result};
use log::{debug, info};
use rusqlite::{Connection, Transaction};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use super::schema;

// @const: Per-user data subdirectory and database file
const DATA_DIRNAME: &str = "subtrans";
const DATABASE_FILENAME: &str = "subtrans.db";

// @const: How long a write waits for another process holding the lock
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Where the database lives
#[derive(Debug, Clone, PartialEq, Eq)]
enum Location {
    File(PathBuf),
    Memory,
}

/// Cloneable handle to a single SQLite connection
#[derive(Clone)]
pub struct DatabaseConnection {
    location: Location,
    connection: Arc<Mutex<Connection>>,
}

impl DatabaseConnection {
    /// Open (or create) the database file at `db_path`, creating parent directories
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let db_path = db_path.as_ref().to_path_buf();

        match db_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create database directory: {}", parent.display()))?,
            _ => {}
        }

        info!("Opening database at {}", db_path.display());
        let conn = Connection::open(&db_path)
            .with_context(|| format!("Failed to open database: {}", db_path.display()))?;
        conn.busy_timeout(BUSY_TIMEOUT)?;

        Self::initialized(conn, Location::File(db_path))
    }

    /// Private in-memory database, used by tests
    pub fn new_in_memory() -> Result<Self> {
        debug!("Creating in-memory database");
        let conn = Connection::open_in_memory().context("Failed to create in-memory database")?;
        Self::initialized(conn, Location::Memory)
    }

    fn initialized(conn: Connection, location: Location) -> Result<Self> {
        schema::initialize_schema(&conn)?;
        Ok(Self {
            location,
            connection: Arc::new(Mutex::new(conn)),
        })
    }

    /// `subtrans/subtrans.db` under the platform's local data directory
    pub fn default_database_path() -> Result<PathBuf> {
        let base = dirs::data_local_dir()
            .or_else(dirs::data_dir)
            .ok_or_else(|| anyhow!("Could not determine a data directory for the database"))?;

        Ok(base.join(DATA_DIRNAME).join(DATABASE_FILENAME))
    }

    /// Database file, or `None` for an in-memory database
    pub fn path(&self) -> Option<&Path> {
        match &self.location {
            Location::File(path) => Some(path.as_path()),
            Location::Memory => None,
        }
    }

    fn lock(connection: &Mutex<Connection>) -> Result<MutexGuard<'_, Connection>> {
        connection
            .lock()
            .map_err(|e| anyhow!("Failed to acquire database lock: {}", e))
    }

    /// Run `f` against the connection on the current thread
    pub fn execute<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = Self::lock(&self.connection)?;
        f(&conn)
    }

    /// Run `f` against the connection on the blocking pool
    pub async fn execute_async<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let connection = Arc::clone(&self.connection);

        tokio::task::spawn_blocking(move || f(&*Self::lock(&connection)?))
            .await
            .context("Database task panicked")?
    }

    /// Run `f` inside a transaction on the blocking pool.
    ///
    /// Nothing `f` wrote survives if it returns an error.
    pub async fn transaction_async<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Transaction) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let connection = Arc::clone(&self.connection);

        tokio::task::spawn_blocking(move || {
            let mut conn = Self::lock(&connection)?;
            let tx = conn.transaction()?;
            let value = f(&tx)?;
            tx.commit()?;
            Ok(value)
        })
        .await
        .context("Database transaction task panicked")?
    }

    /// Row counts and on-disk size
    pub fn stats(&self) -> Result<DatabaseStats> {
        let (document_count, caption_count, translation_count, translated_captions): (i64, i64, i64, i64) =
            self.execute(|conn| {
                Ok(conn.query_row(
                    r#"
                    SELECT (SELECT COUNT(*) FROM documents),
                           (SELECT COUNT(*) FROM captions),
                           (SELECT COUNT(*) FROM translations),
                           (SELECT COUNT(DISTINCT caption_id) FROM translations)
                    "#,
                    [],
                    |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
                )?)
            })?;

        let file_size_bytes = self
            .path()
            .and_then(|path| std::fs::metadata(path).ok())
            .map_or(0, |meta| meta.len());

        Ok(DatabaseStats {
            document_count,
            caption_count,
            translation_count,
            translated_captions,
            file_size_bytes,
        })
    }
}

/// Database statistics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseStats {
    pub document_count: i64,
    pub caption_count: i64,
    pub translation_count: i64,
    /// Captions with at least one translation
    pub translated_captions: i64,
    /// Size of the main database file; 0 in memory
    pub file_size_bytes: u64,
}

impl std::fmt::Display for DatabaseStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Documents: {}, Captions: {} ({} translated), Translations: {}, Size: {} KB",
            self.document_count,
            self.caption_count,
            self.translated_captions,
            self.translation_count,
            self.file_size_bytes / 1024
        )
    }
}
