//! Command-line collaborator for the hearth core.
//!
//! # Responsibility
//! - Wire `Hearth` against the configured SQLite file.
//! - Own every user-facing message; the core only returns results.
//!
//! # Invariants
//! - Each invocation is its own process, so the active intention starts at
//!   the configured default and `--intention` switches it for this run only.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use hearth_core::{
    export_file_name, init_logging, ActiveChange, CardId, CardPatch, Hearth, HearthConfig,
    IntentionFilter,
};
use log::info;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "hearth")]
#[command(about = "Energy cards, intentions and continuity prompts")]
#[command(version)]
struct Cli {
    /// Intention to activate for this run (default: HEARTH_DEFAULT_INTENTION, else weaving)
    #[arg(short, long, global = true)]
    intention: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List cards of the active intention, or `all`, or another intention key
    List {
        /// `all` or an intention key
        filter: Option<String>,
    },
    /// Create a card under the active intention
    Add {
        /// Short description of the task
        essence: String,
        /// Optional longer notes
        details: Option<String>,
    },
    /// Replace card details
    Details { id: CardId, text: String },
    /// Toggle completion of one or more cards
    Toggle {
        #[arg(required = true)]
        ids: Vec<CardId>,
    },
    /// Mark every card done
    CheckAll,
    /// Mark every card pending
    UncheckAll,
    /// Delete a card
    Delete { id: CardId },
    /// Show the intention catalog and the active intention
    Intention,
    /// Print the intention context for a card
    Context { id: CardId },
    /// Track an artifact under the active intention
    Artifact {
        kind: String,
        name: String,
        purpose: String,
    },
    /// Print the continuity prompt
    Prompt,
    /// Write an export document
    Export {
        /// Target directory (default: the data directory)
        dir: Option<PathBuf>,
    },
    /// Replace cards from an export document
    Import { file: PathBuf },
    /// Print the core library version
    Version,
}

impl Commands {
    fn name(&self) -> &'static str {
        match self {
            Self::List { .. } => "list",
            Self::Add { .. } => "add",
            Self::Details { .. } => "details",
            Self::Toggle { .. } => "toggle",
            Self::CheckAll => "check-all",
            Self::UncheckAll => "uncheck-all",
            Self::Delete { .. } => "delete",
            Self::Intention => "intention",
            Self::Context { .. } => "context",
            Self::Artifact { .. } => "artifact",
            Self::Prompt => "prompt",
            Self::Export { .. } => "export",
            Self::Import { .. } => "import",
            Self::Version => "version",
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    if matches!(cli.command, Commands::Version) {
        print_version();
        return Ok(());
    }

    let config = HearthConfig::from_env().map_err(anyhow::Error::msg)?;
    if let Err(err) = init_logging(config.log_level, &config.log_dir) {
        eprintln!("logging disabled: {err}");
    }
    let mut hearth = Hearth::open(&config)
        .with_context(|| format!("cannot open `{}`", config.db_path().display()))?;
    run(&mut hearth, &config, cli)
}

fn run(hearth: &mut Hearth, config: &HearthConfig, cli: Cli) -> Result<()> {
    if let Some(key) = cli.intention.as_deref() {
        activate(hearth, key)?;
    }
    info!(
        "event=cli_command module=cli status=start command={} intention={}",
        cli.command.name(),
        hearth.intentions().active()
    );

    match cli.command {
        Commands::List { filter } => {
            let filter = filter
                .as_deref()
                .map(IntentionFilter::parse)
                .unwrap_or_else(|| IntentionFilter::Key(hearth.intentions().active().to_string()));
            let cards = hearth.list(&filter);
            if cards.is_empty() {
                println!("No energy cards yet");
            }
            for card in cards {
                let mark = if card.completed { "x" } else { " " };
                println!("[{mark}] {:>3} {} ({})", card.id, card.essence, card.intention);
            }
            print_progress(hearth);
        }
        Commands::Add { essence, details } => {
            let card = hearth.create_card(&essence, details.as_deref())?;
            println!("created card {} under {}", card.id, card.intention);
        }
        Commands::Details { id, text } => {
            match hearth.update_card(id, &CardPatch::details(text.as_str()))? {
                Some(_) => println!("updated card {id}"),
                None => println!("no card {id}"),
            }
        }
        Commands::Toggle { ids } => {
            let toggled = hearth.toggle_cards(&ids)?;
            println!("toggled {toggled} card(s)");
            print_progress(hearth);
        }
        Commands::CheckAll => {
            let changed = hearth.check_all()?;
            println!("completed {changed} card(s)");
        }
        Commands::UncheckAll => {
            let changed = hearth.uncheck_all()?;
            println!("reopened {changed} card(s)");
        }
        Commands::Delete { id } => match hearth.delete_card(id)? {
            Some(card) => println!("deleted card {} ({})", card.id, card.essence),
            None => println!("no card {id}"),
        },
        Commands::Intention => {
            let active = hearth.intentions().active();
            for descriptor in hearth.intentions().descriptors() {
                let marker = if descriptor.key == active { "*" } else { " " };
                println!("{marker} {:<18} {}", descriptor.key, descriptor.label());
            }
            println!("use --intention <key> for one run, or set HEARTH_DEFAULT_INTENTION");
        }
        Commands::Context { id } => {
            let context = hearth
                .task_context(id)
                .with_context(|| format!("no context for card {id}"))?;
            println!("{context}");
        }
        Commands::Artifact {
            kind,
            name,
            purpose,
        } => {
            let artifact = hearth.record_artifact(&kind, &name, &purpose)?;
            println!("tracked {} under {}", artifact.name, artifact.intention);
        }
        Commands::Prompt => println!("{}", hearth.continuity_prompt()),
        Commands::Export { dir } => {
            let dir = dir.unwrap_or_else(|| config.data_dir.clone());
            let path = dir.join(export_file_name(chrono::Utc::now().date_naive()));
            let body = hearth.export_json()?;
            std::fs::write(&path, body)
                .with_context(|| format!("cannot write `{}`", path.display()))?;
            println!("exported {} card(s) to {}", hearth.stats().total, path.display());
        }
        Commands::Import { file } => {
            let text = std::fs::read_to_string(&file)
                .with_context(|| format!("cannot read `{}`", file.display()))?;
            let summary = hearth.import_json(&text).context("import failed")?;
            println!("Successfully imported {} energy cards!", summary.imported);
        }
        Commands::Version => print_version(),
    }
    Ok(())
}

fn activate(hearth: &mut Hearth, key: &str) -> Result<()> {
    match hearth.set_intention(key) {
        ActiveChange::Changed { .. } | ActiveChange::Unchanged => Ok(()),
        ActiveChange::UnknownKey(key) => bail!(
            "unknown intention `{key}`, expected one of: {}",
            hearth.intentions().keys().join(", ")
        ),
    }
}

fn print_version() {
    println!("hearth_core version={}", hearth_core::core_version());
}

fn print_progress(hearth: &Hearth) {
    let stats = hearth.stats();
    println!(
        "{}/{} complete ({}%)",
        stats.completed, stats.total, stats.progress
    );
}
