//! # docstash CLI
//!
//! ```bash
//! docstash --config ./config/docstash.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `docstash init` | Create the SQLite database and schema |
//! | `docstash upload <image>` | Process an image; `--save` keeps the result |
//! | `docstash list` | List saved documents |
//! | `docstash show <id>` | Print one saved document |
//! | `docstash delete <id>` | Delete a saved document |
//! | `docstash language show\|set\|list` | Manage the target language |
//! | `docstash doctor` | Check the document index; `--fix` repairs it |

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use docstash::{
    config, delete, doctor_cmd, language_cmd, list, logging, migrate, show, upload,
};
use docstash_core::Language;

/// docstash: capture, process, and keep document scans.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/docstash.example.toml`.
#[derive(Parser)]
#[command(
    name = "docstash",
    about = "Capture, process, and keep document scans",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/docstash.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema. Safe to run repeatedly.
    Init,

    /// Upload an image to the processing endpoint and print the result.
    ///
    /// Without `--save` the result is discarded after printing.
    Upload {
        /// Image path or `file://` URI.
        image: String,

        /// Target language; defaults to the stored preference.
        #[arg(long, short)]
        language: Option<Language>,

        /// Save the image reference and result text.
        #[arg(long)]
        save: bool,
    },

    /// List saved documents in the order they were saved.
    List {
        #[arg(long)]
        newest_first: bool,

        /// Print JSON instead of a table.
        #[arg(long)]
        json: bool,
    },

    /// Print one saved document.
    Show { id: String },

    /// Delete a saved document.
    Delete {
        id: String,

        /// Skip the confirmation prompt.
        #[arg(long, short)]
        yes: bool,
    },

    /// Show, set, or list the target language.
    Language {
        #[command(subcommand)]
        action: LanguageAction,
    },

    /// Check that every indexed document still has its stored record.
    Doctor {
        /// Drop dangling and duplicate index entries.
        #[arg(long)]
        fix: bool,

        /// Print the report as JSON.
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum LanguageAction {
    /// Print the language uploads will use.
    Show,
    /// Store a new preferred language.
    Set { language: Language },
    /// Print every supported language tag.
    List,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Only the language list works without a config file.
    let load = || -> anyhow::Result<config::Config> {
        let cfg = config::load_config(&cli.config)?;
        logging::init(&cfg.logging.level);
        Ok(cfg)
    };

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&load()?).await?;
            println!("Database initialized successfully.");
        }
        Commands::Upload {
            image,
            language,
            save,
        } => {
            upload::run_upload(&load()?, &image, language, save).await?;
        }
        Commands::List { newest_first, json } => {
            list::run_list(&load()?, newest_first, json).await?;
        }
        Commands::Show { id } => {
            show::run_show(&load()?, &id).await?;
        }
        Commands::Delete { id, yes } => {
            delete::run_delete(&load()?, &id, yes).await?;
        }
        Commands::Language { action } => match action {
            LanguageAction::List => language_cmd::run_language_list(),
            LanguageAction::Show => language_cmd::run_language_show(&load()?).await?,
            LanguageAction::Set { language } => {
                language_cmd::run_language_set(&load()?, language).await?
            }
        },
        Commands::Doctor { fix, json } => {
            doctor_cmd::run_doctor(&load()?, fix, json).await?;
        }
    }

    Ok(())
}
