// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{anyhow, Context, Result};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use log::{debug, info, Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use subtrans::app_config::{self, Config};
use subtrans::database::{DatabaseConnection, Repository};
use subtrans::encoding::SourceEncoding;
use subtrans::language_utils;
use subtrans::merge::ExportPolicy;
use subtrans::pipeline::{DocumentMetadata, DocumentPipeline, IngestRequest};
use subtrans::PipelineError;

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Upload an SRT file and store its captions
    Ingest(IngestArgs),

    /// Export a document as SRT, substituting translations
    Export(ExportArgs),

    /// Append a translation to a caption
    Translate {
        /// Caption id as shown by `show`
        caption_id: i64,

        /// Translated text
        text: String,

        /// Author recorded with the translation
        #[arg(short, long)]
        author: Option<String>,
    },

    /// Show a document with its captions and translations
    Show {
        /// Document id
        document_id: String,
    },

    /// List stored documents, newest first
    List,

    /// Delete a document with its captions and translations
    Delete {
        /// Document id
        document_id: String,
    },

    /// List supported file encodings
    Encodings,

    /// Show database statistics
    Stats,

    /// Generate shell completions for subtrans
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Parser, Debug)]
struct IngestArgs {
    /// SRT file to upload
    #[arg(value_name = "FILE")]
    file: Option<PathBuf>,

    /// Document title
    #[arg(long, default_value = "")]
    title: String,

    /// Source language code (e.g., 'en', 'es', 'fr')
    #[arg(short, long, default_value = "")]
    source_language: String,

    /// Target language code (e.g., 'en', 'es', 'fr')
    #[arg(short, long, default_value = "")]
    target_language: String,

    /// Encoding of the uploaded file (see `encodings`)
    #[arg(short, long, default_value = "")]
    encoding: String,

    /// Owner recorded on the document
    #[arg(short, long)]
    owner: Option<String>,
}

#[derive(Parser, Debug)]
struct ExportArgs {
    /// Document id
    document_id: String,

    /// Write to this file or directory instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Export the original text, ignoring translations
    #[arg(long, conflicts_with = "skip_untranslated")]
    original: bool,

    /// Leave out captions that have no translation
    #[arg(long)]
    skip_untranslated: bool,
}

/// subtrans - collaborative subtitle translation storage
///
/// Stores uploaded SRT files caption by caption, collects translations
/// and exports translated subtitle files.
#[derive(Parser, Debug)]
#[command(name = "subtrans")]
#[command(version)]
#[command(about = "Subtitle upload, translation and export tool")]
#[command(long_about = "subtrans stores SRT subtitle files caption by caption and exports them with translations.

EXAMPLES:
    subtrans ingest movie.srt --title Movie -s en -t ru -e windows-1251
    subtrans show <DOCUMENT_ID>                  # List captions and their ids
    subtrans translate 42 \"Привет\" -a alice     # Translate caption 42
    subtrans export <DOCUMENT_ID> -o movie.ru.srt
    subtrans export <DOCUMENT_ID> --original     # Original text to stdout
    subtrans completions bash > subtrans.bash    # Generate bash completions

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config. If the config file doesn't exist, a default one
    will be created automatically.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json", global = true)]
    config_path: PathBuf,

    /// SQLite database file, overriding the configuration
    #[arg(short, long, global = true)]
    database: Option<PathBuf>,

    /// Set logging level
    #[arg(short, long, value_enum, global = true)]
    log_level: Option<CliLogLevel>,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @creates: New logger with specified level
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        log::set_boxed_logger(Box::new(CustomLogger::new(level)))?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: ANSI color and marker for a level
    fn style_for_level(level: Level) -> (&'static str, &'static str) {
        match level {
            Level::Error => ("1;31", "❌"),
            Level::Warn => ("1;33", "🚧"),
            Level::Info => ("1;32", " "),
            Level::Debug => ("1;36", "🔍"),
            Level::Trace => ("1;35", "📋"),
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let (color, marker) = Self::style_for_level(record.level());

            let mut stderr = std::io::stderr();
            let _ = writeln!(stderr, "\x1B[{}m{} {} {}\x1B[0m", color, now, marker, record.args());
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

/// Turn a pipeline failure into the message shown to the user
fn user_facing(error: PipelineError) -> anyhow::Error {
    debug!("{}", error);
    anyhow!(error.public_message())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logger accepts everything; the effective level is set through max_level
    CustomLogger::init(LevelFilter::Trace)?;
    log::set_max_level(LevelFilter::Info);

    let cli = CommandLineOptions::parse();

    if let Commands::Completions { shell } = cli.command {
        let mut cmd = CommandLineOptions::command();
        generate(shell, &mut cmd, "subtrans", &mut std::io::stdout());
        return Ok(());
    }

    if let Commands::Encodings = cli.command {
        for encoding in SourceEncoding::all() {
            println!("{}", encoding);
        }
        return Ok(());
    }

    let mut config = Config::load_or_create(&cli.config_path)?;
    if let Some(level) = cli.log_level.clone() {
        config.log_level = level.into();
    }
    if let Some(database) = cli.database.clone() {
        config.database_path = Some(database);
    }
    config.validate().context("Configuration validation failed")?;
    log::set_max_level(config.log_level.to_level_filter());

    let database_path = config.resolved_database_path()?;
    debug!("Using database at {}", database_path.display());
    let repository = Arc::new(Repository::new(DatabaseConnection::new(&database_path)?));
    let pipeline = DocumentPipeline::new(repository.clone(), config.ingest_limits());

    match cli.command {
        Commands::Ingest(args) => run_ingest(&pipeline, &config, args).await,
        Commands::Export(args) => run_export(&pipeline, &config, args).await,
        Commands::Translate {
            caption_id,
            text,
            author,
        } => {
            let author = author.unwrap_or_else(|| config.default_owner.clone());
            let translation = pipeline
                .append_translation(caption_id, &text, &author)
                .await
                .map_err(user_facing)?;
            info!("Added translation {} to caption {}", translation.id, caption_id);
            Ok(())
        }
        Commands::Show { document_id } => run_show(&pipeline, &document_id).await,
        Commands::List => {
            for document in pipeline.list_documents().await.map_err(user_facing)? {
                println!(
                    "{}  {}  {} -> {}  {} captions  {}",
                    document.id,
                    document.created_at,
                    document.source_language,
                    document.target_language,
                    document.caption_count,
                    document.title
                );
            }
            Ok(())
        }
        Commands::Delete { document_id } => {
            pipeline.delete_document(&document_id).await.map_err(user_facing)
        }
        Commands::Stats => {
            let stats = repository.connection().stats()?;
            println!("{}", stats);
            Ok(())
        }
        Commands::Encodings | Commands::Completions { .. } => Ok(()),
    }
}

async fn run_ingest(pipeline: &DocumentPipeline<Repository>, config: &Config, args: IngestArgs) -> Result<()> {
    let file = match &args.file {
        Some(path) => Some(
            std::fs::read(path).with_context(|| format!("Failed to read file: {}", path.display()))?,
        ),
        None => None,
    };

    let request = IngestRequest::new(
        file,
        DocumentMetadata {
            title: args.title,
            source_language: args.source_language,
            target_language: args.target_language,
            encoding: args.encoding,
        },
    );
    let owner = args.owner.unwrap_or_else(|| config.default_owner.clone());

    let document = pipeline.ingest(request, &owner).await.map_err(user_facing)?;
    println!("{}", document.id);
    Ok(())
}

async fn run_export(pipeline: &DocumentPipeline<Repository>, config: &Config, args: ExportArgs) -> Result<()> {
    let download = if args.original {
        pipeline.export_original(&args.document_id).await
    } else {
        let policy = if args.skip_untranslated {
            ExportPolicy::new(true)
        } else {
            config.export
        };
        pipeline.export(&args.document_id, policy).await
    }
    .map_err(user_facing)?;

    match args.output {
        Some(path) => {
            let path = if path.is_dir() {
                path.join(&download.filename)
            } else {
                path
            };
            std::fs::write(&path, &download.body)
                .with_context(|| format!("Failed to write file: {}", path.display()))?;
            info!("Exported {}", path.display());
        }
        None => print!("{}", download.body),
    }

    Ok(())
}

async fn run_show(pipeline: &DocumentPipeline<Repository>, document_id: &str) -> Result<()> {
    let document = pipeline.document(document_id).await.map_err(user_facing)?;
    let captions = pipeline.captions(document_id).await.map_err(user_facing)?;

    let language_name =
        |code: &str| language_utils::get_language_name(code).unwrap_or_else(|_| code.to_string());

    println!("{} ({})", document.title, document.id);
    println!(
        "{} -> {}, {}, uploaded by {} at {}",
        language_name(&document.source_language),
        language_name(&document.target_language),
        document.encoding,
        document.owner,
        document.created_at
    );

    for item in &captions {
        println!();
        println!("[{}] {}", item.caption.id, item.caption.text.replace('\n', " / "));
        for translation in &item.translations {
            println!("    {}: {}", translation.author, translation.text.replace('\n', " / "));
        }
    }

    Ok(())
}
