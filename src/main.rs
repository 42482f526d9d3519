// file: src/main.rs
// description: commandline application entry point with command handling
// reference: application bootstrap and orchestration

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use colored::*;
use paper_xplorer::utils::logging::{
    format_error, format_heading, format_info, format_success, format_warning,
};
use paper_xplorer::{
    Config, SearchMethod, SectionAddress, XplorerError, XplorerMcp, XplorerService,
};
use rmcp::{ServiceExt, transport::stdio};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};

#[derive(Parser)]
#[command(name = "paper_xplorer")]
#[command(author = "cipher")]
#[command(version = "0.1.0")]
#[command(about = "Search and read research papers from the terminal or over MCP", long_about = None)]
struct Cli {
    #[arg(
        short,
        long,
        value_name = "FILE",
        default_value = "config/default.toml"
    )]
    config: PathBuf,

    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    color: bool,

    #[arg(short, long, action = ArgAction::SetTrue)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse the source directory and rebuild the corpus snapshot
    Ingest,

    /// Start MCP (Model Context Protocol) server for agentic tool integration
    #[command(alias = "mcp")]
    Serve {
        #[arg(long, default_value = "stdio")]
        transport: String,
    },

    /// Search the corpus
    Search {
        /// Query text, or a paper id with --method similarity
        query: String,

        #[arg(short, long, default_value = "keyword")]
        method: SearchMethod,

        #[arg(short = 'n', long)]
        count: Option<usize>,

        #[arg(short, long)]
        page: Option<usize>,

        #[arg(short, long)]
        year: Option<i32>,
    },

    /// Show a paper's metadata and table of contents
    Metadata {
        paper_id: String,

        #[arg(long)]
        no_abstract: bool,
    },

    /// Read a section, addressed as 3 or 3.1
    Section {
        paper_id: String,

        section: SectionAddress,
    },

    /// Search for passages inside one paper
    Chunks {
        paper_id: String,

        query: String,

        #[arg(short = 'n', long)]
        count: Option<usize>,

        #[arg(short, long)]
        page: Option<usize>,
    },

    /// Resolve a citation marker to its bibliography entry
    Citation { paper_id: String, citation: String },

    /// Show a figure's caption and image urls
    Figure { paper_id: String, figure_id: String },

    Stats,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    paper_xplorer::utils::logging::init_logger(cli.color, cli.verbose);
    colored::control::set_override(cli.color);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", report(&e));
            ExitCode::FAILURE
        }
    }
}

fn report(err: &anyhow::Error) -> String {
    let message = format!("{:#}", err);
    match err.downcast_ref::<XplorerError>() {
        Some(e) => format_error(e.kind(), &message, e.is_retriable()),
        None => format_error("error", &message, false),
    }
}

async fn run(cli: Cli) -> Result<()> {
    info!("Paper Xplorer");
    info!("Loading configuration from: {}", cli.config.display());

    let config = if cli.config.exists() {
        Config::load(Some(cli.config.as_path())).context("Failed to load configuration")?
    } else {
        warn!(
            "Config file {} not found, using default configuration",
            cli.config.display()
        );
        Config::load(None).unwrap_or_else(|e| {
            warn!("Falling back to built-in defaults: {}", e);
            Config::default_config()
        })
    };

    let service = XplorerService::from_config(config).context("Failed to configure service")?;
    if !matches!(cli.command, Commands::Ingest) {
        service
            .load_or_ingest()
            .await
            .context("Failed to open paper corpus")?;
    }

    match cli.command {
        Commands::Ingest => {
            cmd_ingest(&service).await?;
        }
        Commands::Serve { transport } => {
            cmd_mcp(service, &transport).await?;
        }
        Commands::Search {
            query,
            method,
            count,
            page,
            year,
        } => {
            cmd_search(&service, &query, method, count, page, year).await?;
        }
        Commands::Metadata {
            paper_id,
            no_abstract,
        } => {
            cmd_metadata(&service, &paper_id, !no_abstract).await?;
        }
        Commands::Section { paper_id, section } => {
            cmd_section(&service, &paper_id, &section).await?;
        }
        Commands::Chunks {
            paper_id,
            query,
            count,
            page,
        } => {
            cmd_chunks(&service, &paper_id, &query, count, page).await?;
        }
        Commands::Citation { paper_id, citation } => {
            let entry = service.read_citation(&paper_id, &citation).await?;
            println!("{}", entry);
        }
        Commands::Figure {
            paper_id,
            figure_id,
        } => {
            let figure = service.get_figure(&paper_id, &figure_id).await?;
            println!("{}", format_heading(&figure.label));
            if let Some(section) = &figure.section {
                println!("Section: {}", section);
            }
            println!("{}", figure.caption);
            for url in &figure.url {
                println!("  {}", url.blue().underline());
            }
        }
        Commands::Stats => {
            let stats = service.stats();
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
    }

    Ok(())
}

async fn cmd_ingest(service: &XplorerService) -> Result<()> {
    info!("Starting ingestion pipeline");
    let start_time = Instant::now();

    let stats = service.ingest(true).await.context("Ingestion failed")?;

    println!();
    for line in stats.summary_lines() {
        println!("{}", line);
    }

    if stats.papers_failed > 0 {
        println!(
            "{}",
            format_warning(&format!(
                "{} papers failed to parse, see the log for details",
                stats.papers_failed
            ))
        );
    }

    info!(
        "Ingestion complete in {:.2}s",
        start_time.elapsed().as_secs_f64()
    );
    println!(
        "{}",
        format_success(&format!(
            "Snapshot written to {}",
            service.config().corpus.snapshot_path.display()
        ))
    );

    Ok(())
}

async fn cmd_mcp(service: XplorerService, transport: &str) -> Result<()> {
    info!("Starting MCP server (transport: {})", transport);

    if transport != "stdio" {
        error!("Only stdio transport is currently supported");
        return Err(anyhow::anyhow!("Unsupported transport: {}", transport));
    }

    let server = XplorerMcp::new(Arc::new(service));
    let running = server
        .serve(stdio())
        .await
        .context("Failed to start MCP server")?;

    info!("MCP server ready on stdio");
    running.waiting().await?;

    Ok(())
}

async fn cmd_search(
    service: &XplorerService,
    query: &str,
    method: SearchMethod,
    count: Option<usize>,
    page: Option<usize>,
    year: Option<i32>,
) -> Result<()> {
    info!("Searching for: {} ({})", query, method);

    let results = service.search(query, method, count, page, year).await?;

    if results.is_empty() {
        println!("\nNo results found for query: \"{}\"\n", query);
        println!("Try:");
        println!("  - Using different search terms");
        println!("  - Removing the year filter");
        println!("  - Running `paper_xplorer ingest` after adding papers");
        return Ok(());
    }

    println!("\nSearch Results for: \"{}\"\n", query);
    println!("{}", "=".repeat(80));

    for (idx, result) in results.iter().enumerate() {
        println!("\n{}. {}", idx + 1, result.title.bold());
        println!(
            "   {} | {} | {}",
            result.id.cyan(),
            result.first_author.as_deref().unwrap_or("unknown author"),
            result.date.as_deref().unwrap_or("undated")
        );
        if !result.abstract_snippet.is_empty() {
            println!("   {}", result.abstract_snippet);
        }
    }

    println!("\n{}", "=".repeat(80));
    Ok(())
}

async fn cmd_metadata(service: &XplorerService, paper_id: &str, show_abstract: bool) -> Result<()> {
    let metadata = service.read_paper_metadata(paper_id, show_abstract).await?;

    println!("{}", format_heading(&metadata.title));
    println!("{} {}", metadata.id.cyan(), metadata.date.as_deref().unwrap_or(""));
    println!("{}", metadata.authors.join(", "));

    if let Some(abstract_text) = &metadata.abstract_text {
        println!("\n{}", abstract_text);
    }

    println!("\n{}", metadata.table_of_contents);
    println!(
        "\n{}",
        format_info(&format!(
            "{} figure(s), citations {}",
            metadata.num_figures,
            if metadata.can_read_citation {
                "readable"
            } else {
                "unavailable"
            }
        ))
    );
    Ok(())
}

async fn cmd_section(
    service: &XplorerService,
    paper_id: &str,
    section: &SectionAddress,
) -> Result<()> {
    let view = service.read_section(paper_id, section).await?;

    println!("{}\n", format_heading(&view.title));
    println!("{}", view.text);
    for figure in &view.figures {
        println!("\n[{}] {}", figure.label.yellow(), figure.caption);
    }
    Ok(())
}

async fn cmd_chunks(
    service: &XplorerService,
    paper_id: &str,
    query: &str,
    count: Option<usize>,
    page: Option<usize>,
) -> Result<()> {
    let chunks = service.chunk_search(paper_id, query, count, page).await?;

    if chunks.is_empty() {
        println!("No passages on this page");
        return Ok(());
    }

    for (idx, chunk) in chunks.iter().enumerate() {
        println!("{}", format!("--- {} ---", idx + 1).dimmed());
        println!("{}\n", chunk);
    }
    Ok(())
}
