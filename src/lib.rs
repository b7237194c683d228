//! Yolodex: YOLO dataset ingestion and paginated annotation index.
//!
//! Yolodex ingests YOLO-format dataset archives (per-image bounding-box
//! label files paired with image files, organized into `train`/`valid`/`test`
//! splits), normalizes their layout, and exposes the resulting annotation
//! index for paginated retrieval.
//!
//! # Modules
//!
//! - [`archive`]: Zip extraction and top-level-directory normalization
//! - [`layout`]: Split layout validation
//! - [`index`]: Annotation index model and the indexer
//! - [`page`]: Pagination over an annotation index
//! - [`store`]: Dataset records and canonical image storage
//! - [`ingest`]: The end-to-end ingestion pipeline
//! - [`error`]: Error types for yolodex operations

pub mod archive;
pub mod error;
pub mod index;
pub mod ingest;
pub mod layout;
pub mod page;
pub mod store;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use error::YolodexError;

use ingest::IngestOptions;
use page::DEFAULT_PAGE_SIZE;
use store::{DatasetStore, JsonDatasetStore};

/// The yolodex CLI application.
#[derive(Parser)]
#[command(name = "yolodex")]
#[command(version, author, about)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Ingest a YOLO dataset archive.
    Ingest(IngestArgs),

    /// List ingested datasets.
    List(ListArgs),

    /// Show one page of a dataset's annotation index.
    Images(ImagesArgs),
}

/// Arguments for the ingest subcommand.
#[derive(clap::Args)]
struct IngestArgs {
    /// Path to the dataset archive (.zip).
    archive: PathBuf,

    /// Dataset name (defaults to the archive filename stem).
    #[arg(long)]
    name: Option<String>,

    /// Data directory for records and canonical image storage.
    #[arg(long, default_value = "datasets", env = "YOLODEX_DATA_DIR")]
    data_dir: PathBuf,
}

/// Arguments for the list subcommand.
#[derive(clap::Args)]
struct ListArgs {
    /// Data directory for records and canonical image storage.
    #[arg(long, default_value = "datasets", env = "YOLODEX_DATA_DIR")]
    data_dir: PathBuf,

    /// Output format ('text' or 'json').
    #[arg(long, default_value = "text")]
    output: String,
}

/// Arguments for the images subcommand.
#[derive(clap::Args)]
struct ImagesArgs {
    /// Dataset name.
    dataset: String,

    /// Page number (1-based).
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    page: u32,

    /// Images per page.
    #[arg(long, default_value_t = DEFAULT_PAGE_SIZE as u32, value_parser = clap::value_parser!(u32).range(1..))]
    page_size: u32,

    /// Data directory for records and canonical image storage.
    #[arg(long, default_value = "datasets", env = "YOLODEX_DATA_DIR")]
    data_dir: PathBuf,
}

/// Run the yolodex CLI.
///
/// This is the main entry point for the CLI, called from `main.rs`.
pub fn run() -> Result<(), YolodexError> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Ingest(args)) => run_ingest(args),
        Some(Commands::List(args)) => run_list(args),
        Some(Commands::Images(args)) => run_images(args),
        None => {
            println!("yolodex {}", env!("CARGO_PKG_VERSION"));
            println!();
            println!("YOLO dataset ingestion and paginated annotation index.");
            println!();
            println!("Run 'yolodex --help' for usage information.");
            Ok(())
        }
    }
}

fn meta_store(data_dir: &std::path::Path) -> JsonDatasetStore {
    JsonDatasetStore::new(data_dir.join("meta"))
}

/// Execute the ingest subcommand.
fn run_ingest(args: IngestArgs) -> Result<(), YolodexError> {
    let store = meta_store(&args.data_dir);
    let options = IngestOptions {
        data_dir: args.data_dir.clone(),
        name: args.name.clone(),
    };

    let record = ingest::ingest_archive(&args.archive, &options, &store)?;

    println!("Ingested dataset '{}'", record.name);
    println!("  status:       {}", record.status);
    println!("  total images: {}", record.total_images);
    println!("  indexed:      {}", record.images.len());
    Ok(())
}

/// Execute the list subcommand.
fn run_list(args: ListArgs) -> Result<(), YolodexError> {
    let store = meta_store(&args.data_dir);
    let summaries = store.list()?;

    match args.output.as_str() {
        "json" => {
            let json = serde_json::to_string_pretty(&summaries)
                .expect("summaries serialize to JSON");
            println!("{json}");
        }
        _ => {
            if summaries.is_empty() {
                println!("No datasets ingested yet.");
                return Ok(());
            }
            for summary in summaries {
                println!(
                    "{}  {}  {}  {} image(s)",
                    summary.name,
                    summary.status,
                    summary.created_at.format("%Y-%m-%d %H:%M:%S"),
                    summary.total_images
                );
            }
        }
    }

    Ok(())
}

/// Execute the images subcommand.
fn run_images(args: ImagesArgs) -> Result<(), YolodexError> {
    let store = meta_store(&args.data_dir);
    let record = store
        .get(&args.dataset)?
        .ok_or_else(|| YolodexError::DatasetNotFound {
            name: args.dataset.clone(),
        })?;

    let page = page::paginate(
        &record.images,
        args.page as usize,
        args.page_size as usize,
    )?;

    let json = serde_json::to_string_pretty(&page).expect("page serializes to JSON");
    println!("{json}");
    Ok(())
}
