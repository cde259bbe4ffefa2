use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use flowboard_batch::{
    ApplierConfig, BatchApplier, BatchReport, InMemoryFacility, Notice, RecordingNotifier,
};
use flowboard_graph::LayerForest;
use flowboard_protocol::{command_schema, ErrorEnvelope};
use flowboard_search::{IndexCache, SearchError, SearchProfile, SearchResult};
use serde::Serialize;
use std::io;
use std::path::PathBuf;

mod files;
mod report;

#[derive(Parser)]
#[command(name = "flowboard")]
#[command(about = "Search workflow boards and apply copilot command batches", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors (stdout is reserved for JSON)
    #[arg(long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Full-text search over a board's nodes, pins, layers, comments and variables
    Search(SearchArgs),

    /// Apply a command batch to a board and report per-command outcomes
    Apply(ApplyArgs),

    /// Print layer breadcrumbs and report parent cycles
    Layers(LayersArgs),

    /// Print the JSON schema of a command batch
    Schema,
}

#[derive(Args)]
struct SearchArgs {
    /// Board JSON file
    #[arg(long)]
    board: PathBuf,

    /// Search profile JSON; unset keys fall back to the bundled board profile
    #[arg(long)]
    profile: Option<PathBuf>,

    /// Maximum number of results
    #[arg(short, long)]
    limit: Option<usize>,

    /// Output JSON
    #[arg(long)]
    json: bool,

    /// Search query
    query: String,
}

#[derive(Args)]
struct ApplyArgs {
    /// Board JSON file
    #[arg(long)]
    board: PathBuf,

    /// Node template catalog JSON file
    #[arg(long)]
    catalog: PathBuf,

    /// Command batch: a JSON array, `{"commands": [...]}`, or text with <commands> blocks
    #[arg(long)]
    commands: PathBuf,

    /// Write the resulting board here
    #[arg(long)]
    out: Option<PathBuf>,

    /// Output JSON
    #[arg(long)]
    json: bool,

    /// Skip settle delays between commands
    #[arg(long)]
    no_settle: bool,
}

#[derive(Args)]
struct LayersArgs {
    /// Board JSON file
    #[arg(long)]
    board: PathBuf,
}

#[derive(Serialize)]
struct SearchOutput {
    query: String,
    profile: String,
    results: Vec<SearchResult>,
}

#[derive(Serialize)]
struct ApplyOutput {
    report: BatchReport,
    notices: Vec<Notice>,
    board_version: (u32, u32, u32),
}

fn print_stdout(text: &str) -> Result<()> {
    use std::io::Write;

    let mut stdout = io::stdout().lock();
    if let Err(err) = stdout
        .write_all(text.as_bytes())
        .and_then(|_| stdout.write_all(b"\n"))
        .and_then(|_| stdout.flush())
    {
        if err.kind() == io::ErrorKind::BrokenPipe {
            return Ok(());
        }
        return Err(err.into());
    }
    Ok(())
}

pub async fn main_entry() -> Result<()> {
    let mut cli = Cli::parse();

    // Auto-enable quiet mode when --json is used (to keep stdout clean for JSON parsing)
    let json_output = match &cli.command {
        Commands::Search(args) => args.json,
        Commands::Apply(args) => args.json,
        _ => false,
    };
    if json_output {
        cli.quiet = true;
    }

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();

    let outcome = match cli.command {
        Commands::Search(args) => run_search(args),
        Commands::Apply(args) => run_apply(args).await,
        Commands::Layers(args) => run_layers(args),
        Commands::Schema => print_stdout(&serde_json::to_string_pretty(&command_schema())?),
    };

    match outcome {
        Err(err) if json_output => {
            let envelope = classify_error(&err);
            print_stdout(&serde_json::to_string_pretty(&envelope)?)?;
            std::process::exit(1);
        }
        other => other,
    }
}

fn run_search(args: SearchArgs) -> Result<()> {
    let board = files::load_board(&args.board)?;
    let mut profile = match &args.profile {
        Some(path) => {
            let name = path
                .file_stem()
                .and_then(|stem| stem.to_str())
                .unwrap_or("custom");
            SearchProfile::from_file(name, path)?
        }
        None => SearchProfile::board(),
    };
    if let Some(limit) = args.limit {
        profile = profile.with_limit(limit);
    }
    let profile_name = profile.name().to_string();

    let index = IndexCache::new(1, profile).get_or_build(&board)?;
    let results = index.search(&args.query)?;
    log::info!(
        "{} results for \"{}\" over {} documents",
        results.len(),
        args.query,
        index.len()
    );

    if args.json {
        let output = SearchOutput {
            query: args.query,
            profile: profile_name,
            results,
        };
        print_stdout(&serde_json::to_string_pretty(&output)?)?;
    } else {
        print_stdout(&report::render_search_results(&args.query, &results))?;
    }
    Ok(())
}

async fn run_apply(args: ApplyArgs) -> Result<()> {
    let board = files::load_board(&args.board)?;
    let catalog = files::load_catalog(&args.catalog)?;
    let commands = files::load_commands(&args.commands)?;
    let config = if args.no_settle {
        ApplierConfig::immediate()
    } else {
        ApplierConfig::from_env()
    };

    let facility = InMemoryFacility::new(board.clone());
    let notifier = RecordingNotifier::new();
    let batch = BatchApplier::new(&facility, &catalog, &notifier)
        .with_config(config)
        .apply(&board, commands)
        .await;
    let notices = notifier.notices();

    let result = facility.into_board();
    if let Some(out) = &args.out {
        files::write_board(out, &result)?;
        log::info!("Wrote board {} to {}", result.id, out.display());
    }

    if args.json {
        let output = ApplyOutput {
            report: batch,
            notices,
            board_version: result.version,
        };
        print_stdout(&serde_json::to_string_pretty(&output)?)?;
    } else {
        print_stdout(&report::render_batch_report(&batch, &notices))?;
    }
    Ok(())
}

fn run_layers(args: LayersArgs) -> Result<()> {
    let board = files::load_board(&args.board)?;
    let forest = LayerForest::new(&board);
    let cycles = forest.validate();

    print_stdout(&report::render_layers(&board, &forest, &cycles))?;
    if !cycles.is_empty() {
        anyhow::bail!("{} layer cycle(s) in board {}", cycles.len(), board.id);
    }
    Ok(())
}

fn classify_error(err: &anyhow::Error) -> ErrorEnvelope {
    let message = format!("{err:#}");

    if let Some(search) = err.downcast_ref::<SearchError>() {
        return match search {
            SearchError::EmptyQuery => ErrorEnvelope::new("empty_query", message)
                .with_hint("Pass a query with at least one letter or digit."),
            _ => ErrorEnvelope::new("search_failed", message),
        };
    }
    if err.chain().any(|cause| cause.is::<serde_json::Error>()) {
        return ErrorEnvelope::new("invalid_input", message)
            .with_hint("Check that the file is valid JSON of the expected shape.");
    }
    if err.chain().any(|cause| cause.is::<io::Error>()) {
        return ErrorEnvelope::new("io_error", message);
    }
    ErrorEnvelope::new("internal", message)
}
