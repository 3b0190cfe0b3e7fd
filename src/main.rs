//! transgene-scan CLI: transgene mention extraction and curation.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result};

use transgene_scan::allocator::TransgeneId;
use transgene_scan::config::RunConfig;
use transgene_scan::corpus::ManifestCorpus;
use transgene_scan::pipeline::Run;
use transgene_scan::store::{KnowledgeBase, VocabularyFilter};

#[derive(Parser)]
#[command(
    name = "transgene-scan",
    version,
    about = "Transgene mention extraction and knowledge-base reconciliation"
)]
struct Cli {
    /// Knowledge-base database file (overrides `db` in the config).
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Run configuration file (TOML).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log filter used when RUST_LOG is not set.
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Append logs to this file instead of stderr.
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the knowledge-base schema.
    Init {
        /// Also write the effective configuration to this path.
        #[arg(long)]
        write_config: Option<PathBuf>,
    },

    /// Scan the corpus and reconcile findings into the knowledge base.
    Run {
        /// Corpus manifest (corpus.toml).
        #[arg(long)]
        corpus: Option<PathBuf>,

        /// Only papers added on or after this date (YYYY-MM-DD or YYYYMMDD).
        #[arg(long)]
        from_date: Option<String>,

        /// Maximum number of papers to scan.
        #[arg(long)]
        max_num_papers: Option<usize>,

        /// Directory of processed-paper ledger files.
        #[arg(long)]
        ledger_dir: Option<PathBuf>,

        /// Extract and report without writing the store or the ledger.
        #[arg(long)]
        dry_run: bool,

        /// Print the run report as JSON.
        #[arg(long)]
        json: bool,
    },

    /// List the curated vocabulary used for matching.
    Vocab {
        /// Keep records whose public name is their WBTransgene id.
        #[arg(long)]
        include_id_names: bool,

        /// Keep records marked invalid.
        #[arg(long)]
        include_invalid: bool,

        /// Print as a JSON array.
        #[arg(long)]
        json: bool,
    },

    /// Show a transgene record by public name or WBTransgene id.
    Show {
        /// Public name or WBTransgene identifier.
        name_or_id: String,

        /// Print as JSON.
        #[arg(long)]
        json: bool,
    },
}

fn init_logging(level: &str, log_file: Option<&PathBuf>) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));
    match log_file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .into_diagnostic()?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(std::sync::Mutex::new(file))
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(3)
                .build(),
        )
    }))
    .ok(); // Ignore error if hook already set (e.g., in tests)

    let cli = Cli::parse();
    init_logging(&cli.log_level, cli.log_file.as_ref())?;

    let mut config = RunConfig::load_or_default(cli.config.as_deref())?;
    if let Some(db) = cli.db {
        config.db = db;
    }

    match cli.command {
        Commands::Init { write_config } => {
            KnowledgeBase::open(&config.db)?;
            println!("Initialized knowledge base at {}", config.db.display());
            if let Some(path) = write_config {
                config.save(&path)?;
                println!("Wrote configuration to {}", path.display());
            }
        }

        Commands::Run {
            corpus,
            from_date,
            max_num_papers,
            ledger_dir,
            dry_run,
            json,
        } => {
            if corpus.is_some() {
                config.corpus = corpus;
            }
            if from_date.is_some() {
                config.selection.from_date = from_date;
            }
            if max_num_papers.is_some() {
                config.selection.max_num_papers = max_num_papers;
            }
            if ledger_dir.is_some() {
                config.ledger_dir = ledger_dir;
            }
            config.dry_run |= dry_run;

            let mut corpus = ManifestCorpus::open(config.corpus_manifest()?)?;
            tracing::info!(
                manifest = %corpus.path().display(),
                listed = corpus.listed(),
                "opened corpus"
            );
            let mut kb = KnowledgeBase::open(&config.db)?;
            let report = Run::new(&mut kb, &mut corpus, &config).execute()?;

            if json {
                println!("{}", serde_json::to_string_pretty(&report).into_diagnostic()?);
            } else {
                println!("{report}");
            }
        }

        Commands::Vocab {
            include_id_names,
            include_invalid,
            json,
        } => {
            let kb = KnowledgeBase::open(&config.db)?;
            let filter = VocabularyFilter {
                exclude_id_used_as_name: config.vocabulary.exclude_id_used_as_name
                    && !include_id_names,
                exclude_invalid: config.vocabulary.exclude_invalid && !include_invalid,
            };
            let names = kb.curated_transgenes(filter)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&names).into_diagnostic()?);
            } else if names.is_empty() {
                println!("No curated transgenes.");
            } else {
                println!("Curated transgenes ({}):", names.len());
                for name in &names {
                    println!("  {name}");
                }
            }
        }

        Commands::Show { name_or_id, json } => {
            let kb = KnowledgeBase::open(&config.db)?;
            let record = match TransgeneId::parse(&name_or_id) {
                Some(id) => kb.record(id.number() as i64)?,
                None => kb.record_by_name(&name_or_id)?,
            };
            let Some(record) = record else {
                miette::bail!("no transgene record for \"{name_or_id}\"");
            };
            if json {
                println!("{}", serde_json::to_string_pretty(&record).into_diagnostic()?);
            } else {
                println!("{} / {}", record.identifier, record.public_name.as_deref().unwrap_or("-"));
                println!("  papers:  {}", record.papers.as_deref().unwrap_or("-"));
                println!("  curator: {}", record.curator.as_deref().unwrap_or("-"));
            }
        }
    }

    Ok(())
}
