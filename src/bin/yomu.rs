//! Command-line front-end for the Yomu client core.
//!
//! Catalog commands print the raw JSON payload. `plan` resolves a single
//! image and prints its segment plan. `library` and `history` operate on the
//! local user-state snapshot.

use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use tracing::debug;

use yomu::catalog::{Catalog, HttpCatalog};
use yomu::config::Config;
use yomu::reader::{MAX_SEGMENTS, MetricsResolver, ReaderPosition};
use yomu::store::Store;
use yomu::types::{BrowseKind, ReadingStatus};
use yomu::{Error, Result};

#[derive(Parser)]
#[command(name = "yomu", about = "Manga catalog, library and reader layout tool")]
#[command(version)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// User whose library and history to use
    #[arg(short, long, global = true, default_value = "local")]
    user: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the home feed
    Home(PageArgs),
    /// Search the catalog
    Search {
        query: String,
        #[command(flatten)]
        page: PageArgs,
    },
    /// Show series details
    Manga { slug: String },
    /// List chapters of a series
    Chapters { slug: String },
    /// List page images of a chapter
    Pages { manga: String, chapter: String },
    /// Browse by publication kind
    Browse {
        #[arg(short, long, default_value = "manga")]
        kind: BrowseKind,
        #[command(flatten)]
        page: PageArgs,
    },
    /// Browse by genre
    Genre {
        genre: String,
        #[command(flatten)]
        page: PageArgs,
    },
    /// Recommendations for a series, or for what to read after a chapter
    Recommend {
        manga: String,
        chapter: Option<String>,
    },
    /// Resolve an image and print its segment plan
    Plan(PlanArgs),
    /// Manage the local library
    #[command(subcommand)]
    Library(LibraryCommand),
    /// Show or clear search history
    History {
        #[arg(long)]
        clear: bool,
    },
}

#[derive(Args)]
struct PageArgs {
    /// Result page, starting at 1
    #[arg(short, long, default_value_t = 1)]
    page: u32,
}

#[derive(Args)]
struct PlanArgs {
    /// Image URL (http, https or file)
    uri: String,
    /// Viewport width in logical pixels
    #[arg(short, long)]
    width: f64,
    /// Override the configured maximum segment height
    #[arg(short, long)]
    max_segment: Option<f64>,
}

#[derive(Subcommand)]
enum LibraryCommand {
    /// Add a series, or move it to another shelf
    Add {
        slug: String,
        #[arg(short, long, default_value = "reading")]
        status: ReadingStatus,
    },
    /// Remove a series
    Remove { slug: String },
    /// Toggle the favourite flag
    Favorite { slug: String },
    /// List the library, optionally one shelf
    List {
        #[arg(short, long)]
        status: Option<ReadingStatus>,
    },
    /// Per-shelf counts
    Stats,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PlanReport<'a> {
    uri: &'a str,
    aspect: yomu::reader::ResolvedAspect,
    display_height: f64,
    instructions: Vec<yomu::reader::RenderInstruction>,
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn load_config(path: Option<&PathBuf>) -> Result<Config> {
    let config = match path {
        Some(path) => Config::load(path).await?,
        None => Config::default(),
    };
    config.apply_env()
}

async fn open_store(config: &Config) -> Result<Store> {
    match config.store.resolved_path() {
        Some(path) => Store::open(path).await,
        None => Ok(Store::in_memory()),
    }
}

fn catalog(config: &Config) -> Result<HttpCatalog> {
    HttpCatalog::from_config(config)
}

async fn run_plan(config: &Config, args: &PlanArgs) -> Result<()> {
    let max_segment = args.max_segment.unwrap_or(config.reader.max_segment_height);
    let resolver = MetricsResolver::from_config(config)?;
    let position = ReaderPosition::spawn(0, args.uri.as_str(), &resolver);

    let aspect = position
        .resolved()
        .await
        .ok_or_else(|| Error::not_found(format!("no metrics for {}", args.uri)))?;
    let plan = position
        .plan(args.width, max_segment)
        .ok_or_else(|| {
            Error::invalid_input(format!(
                "no plan: width and max segment must be positive and the page at most {MAX_SEGMENTS} segments"
            ))
        })?;

    print_json(&PlanReport {
        uri: &args.uri,
        aspect,
        display_height: plan.display_height(),
        instructions: plan.render_instructions(),
    })
}

async fn run_library(store: &Store, user: &str, command: &LibraryCommand) -> Result<()> {
    match command {
        LibraryCommand::Add { slug, status } => {
            let id = store.add_to_library(user, slug, *status);
            store.save().await?;
            print_json(&id)
        }
        LibraryCommand::Remove { slug } => {
            let removed = store.remove_from_library(user, slug);
            store.save().await?;
            print_json(&removed)
        }
        LibraryCommand::Favorite { slug } => {
            let favorite = store.toggle_favorite(user, slug);
            store.save().await?;
            print_json(&favorite)
        }
        LibraryCommand::List { status: Some(status) } => {
            print_json(&store.library_by_status(user, *status))
        }
        LibraryCommand::List { status: None } => print_json(&store.user_library(user)),
        LibraryCommand::Stats => print_json(&store.library_stats(user)),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    yomu::logging::init(cli.verbose);

    let config = load_config(cli.config.as_ref()).await?;
    debug!(?config, "configuration loaded");

    let payload = match &cli.command {
        Commands::Plan(args) => return run_plan(&config, args).await,
        Commands::Library(command) => {
            let store = open_store(&config).await?;
            return run_library(&store, &cli.user, command).await;
        }
        Commands::History { clear } => {
            let store = open_store(&config).await?;
            if *clear {
                store.clear_search_history(&cli.user);
                store.save().await?;
            }
            return print_json(&store.search_history(&cli.user));
        }
        Commands::Home(page) => catalog(&config)?.homepage(page.page).await?,
        Commands::Search { query, page } => {
            let store = open_store(&config).await?;
            store.add_to_search_history(&cli.user, query);
            store.save().await?;
            catalog(&config)?.search(query, page.page).await?
        }
        Commands::Manga { slug } => catalog(&config)?.manga_details(slug).await?,
        Commands::Chapters { slug } => catalog(&config)?.manga_chapters(slug).await?,
        Commands::Pages { manga, chapter } => {
            let payload = catalog(&config)?.chapter_images(manga, chapter).await?;
            serde_json::to_value(yomu::net::json::image_urls(&payload)?)?
        }
        Commands::Browse { kind, page } => catalog(&config)?.browse(*kind, page.page).await?,
        Commands::Genre { genre, page } => {
            catalog(&config)?.browse_by_genre(genre, page.page).await?
        }
        Commands::Recommend {
            manga,
            chapter: Some(chapter),
        } => {
            catalog(&config)?
                .chapter_recommendations(manga, chapter)
                .await?
        }
        Commands::Recommend {
            manga,
            chapter: None,
        } => catalog(&config)?.series_recommendations(manga).await?,
    };

    print_json(&payload)
}
