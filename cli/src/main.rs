//! readorder CLI - reading-order review and export tool

mod server;

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use readorder::{
    JsonFormat, OrderSnapshot, PageSelection, ProducerOptions, ProducerRegistry,
    Readorder, RenderOptions, SaveRequest,
};

use server::{AppState, ServerConfig};

#[derive(Parser)]
#[command(name = "readorder")]
#[command(version)]
#[command(about = "Review and export the reading order of layout-analysed PDFs", long_about = None)]
struct Cli {
    /// Layout converter executable used for PDF input
    #[arg(long, global = true, env = "READORDER_DOCLING", default_value = "docling")]
    docling: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the flattened reading order and ownership of a document
    Order {
        /// Input PDF or document JSON
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Print the order state as JSON
        #[arg(long)]
        json: bool,
    },

    /// Apply edits and write complete_edited.json and complete_edited.md
    Export {
        /// Input PDF or document JSON
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Saved order (`{"order": [...], "texts": {...}}` or a snapshot)
        #[arg(short, long, value_name = "FILE")]
        edits: Option<PathBuf>,

        /// Output directory
        #[arg(short, long, value_name = "DIR", default_value = "output")]
        output: PathBuf,

        /// Output compact JSON
        #[arg(long)]
        compact: bool,

        /// Include YAML frontmatter
        #[arg(short, long)]
        frontmatter: bool,

        /// Table rendering mode
        #[arg(long, value_enum, default_value = "markdown")]
        table_mode: TableMode,
    },

    /// Render a document to Markdown as parsed, without edits
    #[command(alias = "md")]
    Markdown {
        /// Input PDF or document JSON
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Include YAML frontmatter
        #[arg(short, long)]
        frontmatter: bool,

        /// Table rendering mode
        #[arg(long, value_enum, default_value = "markdown")]
        table_mode: TableMode,

        /// Maximum heading level (1-6)
        #[arg(long, default_value = "6")]
        max_heading: u8,

        /// Page range (e.g., "1-10", "1,3,5")
        #[arg(long)]
        pages: Option<String>,

        /// Inline picture data URIs instead of placeholders
        #[arg(long)]
        embed_images: bool,
    },

    /// Print the bounding boxes of one page as JSON
    Boxes {
        /// Input PDF or document JSON
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Zero-based page number
        #[arg(short, long, default_value = "0")]
        page: u32,
    },

    /// Run the HTTP service for the editing UI
    Serve {
        /// Listen host
        #[arg(long, env = "READORDER_HOST", default_value = "127.0.0.1")]
        host: String,

        /// Listen port
        #[arg(long, env = "READORDER_PORT", default_value = "8000")]
        port: u16,

        /// Directory for exports and order snapshots
        #[arg(long, env = "READORDER_OUTPUT_DIR", default_value = "output")]
        output_dir: PathBuf,

        /// Directory of static editor assets served at `/`
        #[arg(long, env = "READORDER_STATIC_DIR")]
        static_dir: Option<PathBuf>,
    },

    /// Show version information
    Version,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum TableMode {
    /// Standard Markdown tables
    Markdown,
    /// HTML tables for merged cells
    Html,
}

impl From<TableMode> for readorder::TableFallback {
    fn from(mode: TableMode) -> Self {
        match mode {
            TableMode::Markdown => readorder::TableFallback::Markdown,
            TableMode::Html => readorder::TableFallback::Html,
        }
    }
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();
    let builder = Readorder::new().with_converter(&cli.docling);

    let result = match cli.command {
        Commands::Order { input, json } => cmd_order(&builder, &input, json),
        Commands::Export {
            input,
            edits,
            output,
            compact,
            frontmatter,
            table_mode,
        } => cmd_export(
            builder,
            &input,
            edits.as_deref(),
            &output,
            compact,
            frontmatter,
            table_mode,
        ),
        Commands::Markdown {
            input,
            output,
            frontmatter,
            table_mode,
            max_heading,
            pages,
            embed_images,
        } => cmd_markdown(
            &builder,
            &input,
            output.as_deref(),
            frontmatter,
            table_mode,
            max_heading,
            pages.as_deref(),
            embed_images,
        ),
        Commands::Boxes { input, page } => cmd_boxes(&builder, &input, page),
        Commands::Serve {
            host,
            port,
            output_dir,
            static_dir,
        } => cmd_serve(
            cli.docling,
            ServerConfig {
                host,
                port,
                output_dir,
                static_dir,
            },
        ),
        Commands::Version => {
            cmd_version();
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn cmd_order(builder: &Readorder, input: &Path, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let session = builder.load(input)?;
    let state = session.reading_order();

    if json {
        println!("{}", serde_json::to_string_pretty(state)?);
        return Ok(());
    }

    let doc = session.document();
    let tables = session.tables();
    let (groups, pictures, captioned_tables) = tables.counts();

    println!("{}", "Reading Order".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());
    for (position, id) in session.index().ids().enumerate() {
        let kind = doc.kind_of(id).map(|k| k.to_string()).unwrap_or_default();
        let line = format!("{:>4}  {:<16} {}", position, id, kind);
        match tables.owner(id) {
            Some(owner) => println!("{} {}", line.dimmed(), format!("(owned by {})", owner).dimmed()),
            None => println!("{}", line),
        }
    }

    println!();
    println!("{}", "Ownership".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());
    println!("{}: {}", "Groups".bold(), groups);
    println!("{}: {}", "Captioned pictures".bold(), pictures);
    println!("{}: {}", "Captioned tables".bold(), captioned_tables);
    println!("{}: {}", "Owned identifiers".bold(), tables.owned().count());

    let orphans = session.index().orphans(tables);
    if !orphans.is_empty() {
        println!(
            "{}: {}",
            "Unreachable".yellow().bold(),
            orphans.join(", ")
        );
    }

    let pruned = readorder::order::pruned_order(state, doc, tables);
    println!();
    println!("{}", "Export Order".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());
    println!("{}", pruned.join(" → "));

    Ok(())
}

fn load_edits(path: &Path) -> Result<SaveRequest, Box<dyn std::error::Error>> {
    let text = fs::read_to_string(path)?;
    // Snapshots written by `serve` carry a timestamp next to the order.
    if let Ok(snapshot) = serde_json::from_str::<OrderSnapshot>(&text) {
        return Ok(snapshot.to_save_request());
    }
    Ok(serde_json::from_str(&text)?)
}

fn cmd_export(
    builder: Readorder,
    input: &Path,
    edits: Option<&Path>,
    output: &Path,
    compact: bool,
    frontmatter: bool,
    table_mode: TableMode,
) -> Result<(), Box<dyn std::error::Error>> {
    let pb = ProgressBar::new(4);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {msg}")?
            .progress_chars("#>-"),
    );

    let format = if compact {
        JsonFormat::Compact
    } else {
        JsonFormat::Pretty
    };
    let mut builder = builder.with_json_format(format).with_table_fallback(table_mode.into());
    if frontmatter {
        builder = builder.with_frontmatter();
    }

    pb.set_message("Loading document...");
    let mut session = builder.load(input)?;
    pb.inc(1);

    pb.set_message("Applying edits...");
    if let Some(path) = edits {
        session.apply_save(load_edits(path)?);
    }
    pb.inc(1);

    pb.set_message("Reconstructing...");
    let report = session.reconstruct().report;
    let export = session.export(builder.export_options())?;
    pb.inc(1);

    pb.set_message("Writing files...");
    let paths = export.write_to(output)?;
    pb.inc(1);

    pb.finish_with_message("Done!");

    if !report.stale.is_empty() {
        println!(
            "{} {}",
            "Dropped unknown identifiers:".yellow(),
            report.stale.join(", ")
        );
    }
    if !report.duplicates.is_empty() {
        println!(
            "{} {}",
            "Dropped repeated identifiers:".yellow(),
            report.duplicates.join(", ")
        );
    }

    println!("\n{}", "Output files:".green().bold());
    println!("  {} {}", "├─".dimmed(), paths.json_path.display());
    println!("  {} {}", "└─".dimmed(), paths.markdown_path.display());

    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn cmd_markdown(
    builder: &Readorder,
    input: &Path,
    output: Option<&Path>,
    frontmatter: bool,
    table_mode: TableMode,
    max_heading: u8,
    pages: Option<&str>,
    embed_images: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let page_selection = if let Some(p) = pages {
        PageSelection::parse(p).map_err(|e| format!("Invalid page range: {}", e))?
    } else {
        PageSelection::All
    };

    let session = builder.load(input)?;

    let render_options = RenderOptions::new()
        .with_frontmatter(frontmatter)
        .with_table_fallback(table_mode.into())
        .with_max_heading(max_heading)
        .with_pages(page_selection)
        .with_embedded_images(embed_images);

    let markdown = readorder::render::to_markdown(session.document(), &render_options)?;

    if let Some(path) = output {
        fs::write(path, &markdown)?;
        println!("{} {}", "Saved to".green(), path.display());
    } else {
        println!("{}", markdown);
    }

    Ok(())
}

fn cmd_boxes(builder: &Readorder, input: &Path, page: u32) -> Result<(), Box<dyn std::error::Error>> {
    let session = builder.load(input)?;
    let boxes = session.page_boxes(page)?;
    println!("{}", serde_json::to_string_pretty(&boxes)?);
    Ok(())
}

fn cmd_serve(docling: PathBuf, config: ServerConfig) -> Result<(), Box<dyn std::error::Error>> {
    let registry = ProducerRegistry::with_defaults(ProducerOptions::new().with_executable(docling));
    let state = AppState::new(registry, config.output_dir.clone());

    println!(
        "{} http://{}",
        "Listening on".green().bold(),
        config.addr()
    );

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(server::run(state, config))?;
    Ok(())
}

fn cmd_version() {
    println!("{} {}", "readorder".cyan().bold(), env!("CARGO_PKG_VERSION"));
    println!("Reading-order review and export tool");
    println!();
    println!("Converter: set READORDER_DOCLING or pass --docling");
    println!("License: MIT");
}
