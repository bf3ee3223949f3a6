//! Text Translator CLI - Interactive live translation from the terminal.

mod interactive;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use text_translator_core::util::preview;
use text_translator_core::{
    create_cached_translator, open_history_or_temporary, AppConfig, Backend, HistorySnapshot,
    HistoryStore, Lang,
};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use crate::interactive::CliPresenter;

#[derive(Parser, Debug)]
#[command(name = "text-translate")]
#[command(author, version, about = "Translate text as you type", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// Source language code
    #[arg(short = 's', long)]
    source: Option<String>,

    /// Target language code
    #[arg(short = 't', long)]
    target: Option<String>,

    /// Translation backend (google, openai)
    #[arg(short, long)]
    backend: Option<String>,

    /// OpenAI API base URL
    #[arg(long, env = "OPENAI_API_BASE")]
    api_base: Option<String>,

    /// OpenAI API key
    #[arg(long, env = "OPENAI_API_KEY")]
    api_key: Option<String>,

    /// Model name for OpenAI-compatible API
    #[arg(long, env = "OPENAI_MODEL")]
    model: Option<String>,

    /// Quiet period after typing before translating, in milliseconds
    #[arg(long)]
    debounce_ms: Option<u64>,

    /// Provider call timeout in milliseconds (0 = none)
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// History store directory
    #[arg(long)]
    history: Option<PathBuf>,

    /// Config file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Disable caching
    #[arg(long)]
    no_cache: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Translate one text and exit
    Translate {
        /// Text to translate
        #[arg(required = true)]
        text: Vec<String>,
    },

    /// Show saved translations, newest first
    History {
        /// Maximum number of entries to show
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Delete a history entry by its position in `history` (1 = newest)
    Delete {
        position: usize,
    },

    /// Delete all history
    ClearHistory,

    /// Import a JSON history file from an older translator into an empty history
    Import {
        file: PathBuf,
    },
}

fn apply_overrides(config: &mut AppConfig, args: &Args) -> Result<()> {
    if let Some(source) = &args.source {
        config.source_lang = Lang::parse(source)?;
    }
    if let Some(target) = &args.target {
        config.target_lang = Lang::parse(target)?;
    }

    if let Some(backend) = &args.backend {
        config.translator.backend = backend.parse::<Backend>()?;
    }
    if let Some(api_base) = &args.api_base {
        config.translator.api_base.clone_from(api_base);
    }
    if args.api_key.is_some() {
        config.translator.api_key.clone_from(&args.api_key);
    }
    if let Some(model) = &args.model {
        config.translator.model.clone_from(model);
    }

    if let Some(debounce_ms) = args.debounce_ms {
        config.scheduler.debounce_ms = debounce_ms;
    }
    if let Some(timeout_ms) = args.timeout_ms {
        config.scheduler.timeout_ms = timeout_ms;
    }

    if let Some(path) = &args.history {
        config.history.path = Some(path.clone());
    }

    if args.no_cache {
        config.cache.enabled = false;
    }

    Ok(())
}

fn open_history(config: &AppConfig) -> Result<HistoryStore> {
    let path = config.history.resolved_path();
    HistoryStore::open(&path).context(format!("Failed to open history: {}", path.display()))
}

/// Render history entries with 1-based positions
pub(crate) fn format_history(snapshot: &HistorySnapshot) -> String {
    if snapshot.is_empty() {
        return "History is empty".to_string();
    }

    snapshot
        .iter()
        .enumerate()
        .map(|(i, record)| {
            format!(
                "{:>3}. [{}] {} -> {}: {} => {}",
                i + 1,
                record.timestamp.format("%Y-%m-%d %H:%M:%S"),
                record.source_lang,
                record.target_lang,
                preview(&record.source_text, 40),
                preview(&record.translated_text, 40),
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (before parsing args so env vars are available)
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Setup logging; stdout carries translations
    let log_level = match args.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    // Load or create config
    let mut config = if let Some(config_path) = &args.config {
        AppConfig::from_file(config_path).context("Failed to load config file")?
    } else {
        AppConfig::load()
    };

    apply_overrides(&mut config, &args)?;

    match &args.command {
        Some(Command::History { limit }) => {
            let store = open_history(&config)?;
            let snapshot = store.list(limit.unwrap_or(config.history.list_limit));

            #[allow(clippy::print_stdout)]
            {
                println!("{}", format_history(&snapshot));
            }
            return Ok(());
        }
        Some(Command::Delete { position }) => {
            let index = position
                .checked_sub(1)
                .context("Positions start at 1")?;
            let store = open_history(&config)?;
            let record = store.delete_at(index)?;

            #[allow(clippy::print_stdout)]
            {
                println!("Deleted: {}", preview(&record.source_text, 60));
            }
            return Ok(());
        }
        Some(Command::ClearHistory) => {
            open_history(&config)?.clear()?;

            #[allow(clippy::print_stdout)]
            {
                println!("History cleared");
            }
            return Ok(());
        }
        Some(Command::Import { file }) => {
            let store = open_history(&config)?;
            let imported = store
                .import_json(file)
                .context(format!("Failed to import {}", file.display()))?;

            #[allow(clippy::print_stdout)]
            {
                println!("Imported {imported} entries");
            }
            return Ok(());
        }
        Some(Command::Translate { .. }) | None => {}
    }

    let translator = create_cached_translator(&config.translator, &config.cache)
        .context("Failed to initialize translator")?;
    info!("Using {} translator ({})", translator.name(), config.language_pair());

    let (history, fallback) =
        open_history_or_temporary(&config.history).context("Failed to open any history store")?;
    if let Some(reason) = fallback {
        #[allow(clippy::print_stderr)]
        {
            eprintln!("History unavailable ({reason}); translations from this run will not be kept");
        }
    }

    if let Some(Command::Translate { text }) = args.command {
        let text = text.join(" ");
        return interactive::translate_once(translator, history, &config, text).await;
    }

    interactive::run(translator, history, CliPresenter::interactive(), &config).await
}
