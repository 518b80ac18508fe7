//! ontodeck CLI tool
//!
//! Inspects a directory of ontology class dumps (`*.json`, one array of classes per file)
//! through the same pipeline the flash-card viewer uses.
//!
//! ## Commands
//!
//! - `sources <dir>`: List the class dumps in a directory
//! - `show <dir> <file>`: Print the visible deck for a search/filter/sort combination
//! - `stats <dir> <file>`: Deck statistics and per-category counts
//! - `siblings <dir> <file> <class>`: Parent and siblings of one class
//! - `check <dir> <file>`: Integrity report for a class dump
//!
//! Viewer defaults (sort, shuffle, default file) are read from `--config`, or from the file
//! named by `ONTODECK_CONFIG`.

use clap::{Parser, Subcommand};
use ontodeck_core::{
    class::OntologyClass,
    config::{DeckConfig, DeckConfigProvider, TomlConfigProvider, CONFIG_ENV_VAR},
    event::ViewerEvent,
    query::{Facet, SortKey},
    session::ViewerSession,
    siblings,
    source::{ClassSource, JsonDirSource},
    viewer::Viewer,
    DeckError,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "ontodeck")]
#[command(author, version, about = "Browse ontology class dumps as a deck of cards", long_about = None)]
struct Cli {
    /// Configuration file path (defaults to $ONTODECK_CONFIG)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List class dumps in a directory
    Sources {
        /// Directory holding `*.json` class dumps
        dir: PathBuf,
    },

    /// Print the visible deck
    Show {
        dir: PathBuf,

        /// File name inside `dir` (defaults to the configured or first file)
        file: Option<String>,

        /// Case-insensitive search over labels and descriptions
        #[arg(short, long)]
        search: Option<String>,

        /// Category filter ("all" for none)
        #[arg(long)]
        category: Option<String>,

        /// Root class filter ("all" for none)
        #[arg(long)]
        root: Option<String>,

        /// Sort key: name, subclasses, properties, instances, depth
        #[arg(long)]
        sort: Option<SortKey>,

        /// Shuffle after sorting
        #[arg(long)]
        shuffle: bool,

        /// Seed for a reproducible shuffle
        #[arg(long)]
        seed: Option<u64>,

        /// Print the visible classes as JSON
        #[arg(long)]
        json: bool,
    },

    /// Deck statistics
    Stats { dir: PathBuf, file: Option<String> },

    /// Parent and siblings of a class (by label, id or local name)
    Siblings {
        dir: PathBuf,
        file: String,
        class: String,
    },

    /// Integrity report for a class dump
    Check { dir: PathBuf, file: String },
}

fn load_config(path: Option<PathBuf>) -> Result<DeckConfig, DeckError> {
    let path = path.or_else(|| std::env::var_os(CONFIG_ENV_VAR).map(PathBuf::from));
    match path {
        Some(path) => TomlConfigProvider::new(path).get_config(),
        None => Ok(DeckConfig::default()),
    }
}

/// Selects `file`, or lets the viewer pick the default one.
async fn open(viewer: &Viewer<JsonDirSource>, file: Option<String>) -> Result<(), DeckError> {
    match file {
        Some(file) => {
            viewer.select_source(&file).await;
        }
        None => {
            let files = viewer.list_sources().await?;
            if files.is_empty() {
                return Err(DeckError::NoSourceSelected);
            }
        }
    }
    match viewer.snapshot().error {
        Some(message) => Err(DeckError::Service(message)),
        None => Ok(()),
    }
}

fn print_class(position: usize, class: &OntologyClass) {
    println!(
        "{:>4}. {} [{}] ({} subclasses, {} properties, {} instances, depth {})",
        position,
        class.label,
        class.effective_category(),
        class.stats.subclasses_count,
        class.stats.properties_count,
        class.stats.instances_count,
        class.stats.hierarchy_depth
    );
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config)?;
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    match cli.command {
        Commands::Sources { dir } => {
            let files = runtime.block_on(JsonDirSource::new(dir).list_sources())?;
            if files.is_empty() {
                println!("No class dumps found");
            }
            for file in files {
                println!("{}", file.filename);
            }
        }

        Commands::Show {
            dir,
            file,
            search,
            category,
            root,
            sort,
            shuffle,
            seed,
            json,
        } => {
            let session = match seed {
                Some(seed) => ViewerSession::with_seed(&config, seed),
                None => ViewerSession::new(&config),
            };
            let viewer = Viewer::from_session(JsonDirSource::new(dir), session, &config);
            runtime.block_on(async {
                open(&viewer, file).await?;
                if let Some(sort) = sort {
                    viewer.dispatch(ViewerEvent::SortChanged(sort)).await;
                }
                if shuffle {
                    viewer.dispatch(ViewerEvent::SetShuffle(true)).await;
                }
                if let Some(category) = category {
                    viewer
                        .dispatch(ViewerEvent::CategoryFilterChanged(Facet::category(&category)))
                        .await;
                }
                if let Some(root) = root {
                    viewer
                        .dispatch(ViewerEvent::RootFilterChanged(Facet::root(&root)))
                        .await;
                }
                if let Some(search) = search {
                    viewer.dispatch(ViewerEvent::SearchChanged(search)).await;
                }
                Ok::<(), DeckError>(())
            })?;

            let visible = viewer.read(|s| s.visible().to_vec());
            if json {
                println!("{}", serde_json::to_string_pretty(&visible)?);
            } else if visible.is_empty() {
                println!("No classes match the current filters");
            } else {
                for (i, class) in visible.iter().enumerate() {
                    print_class(i + 1, class);
                }
            }
        }

        Commands::Stats { dir, file } => {
            let viewer = Viewer::new(JsonDirSource::new(dir), &config);
            runtime.block_on(open(&viewer, file))?;
            let (stats, counts) = viewer.read(|s| (s.stats(), s.category_counts()));
            match stats {
                Some(stats) => println!("{stats}"),
                None => println!("No classes"),
            }
            for (category, count) in counts {
                println!("  {} {:<14} {}", category.icon(), category.as_str(), count);
            }
        }

        Commands::Siblings { dir, file, class } => {
            let viewer = Viewer::new(JsonDirSource::new(dir), &config);
            runtime.block_on(async {
                open(&viewer, Some(file)).await?;
                viewer.dispatch(ViewerEvent::NavigateToName(class.clone())).await;
                Ok::<(), DeckError>(())
            })?;
            let found = viewer.read(|s| {
                s.current()
                    .filter(|c| c.answers_to(&class) || c.answers_to_ignore_case(&class))
                    .map(|c| (c.clone(), s.current_siblings()))
            });
            let Some((current, siblings)) = found else {
                eprintln!("Error: no class named '{class}'");
                std::process::exit(1);
            };
            match siblings::parent_of(&current) {
                Some(parent) => println!("{} (parent: {parent})", current.label),
                None => println!("{} has no parent", current.label),
            }
            for (i, sibling) in siblings.iter().enumerate() {
                let marker = if sibling.id == current.id { "*" } else { " " };
                println!("{marker} {:>3}. {}", i + 1, sibling.label);
            }
        }

        Commands::Check { dir, file } => {
            let viewer = Viewer::new(JsonDirSource::new(dir), &config);
            runtime.block_on(open(&viewer, Some(file)))?;
            let report = viewer.read(|s| s.repository().integrity().clone());
            println!("Checked {} classes", report.checked);
            for id in report.duplicate_ids.iter() {
                println!("  duplicate id: {id}");
            }
            for issue in report.issues.iter() {
                println!("  {issue}");
            }
            if !report.is_clean() {
                std::process::exit(2);
            }
        }
    }
    Ok(())
}
