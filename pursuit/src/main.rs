use std::io::BufReader;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use pursuit::exit_codes;
use pursuit::io::init::{InitOptions, PursuitPaths, init_workspace};
use pursuit::io::run_state::load_run_summary;
use pursuit::io::workspace::Workspace;
use pursuit::logging;
use pursuit::run::{DEFAULT_OBJECTIVE, RunOptions, run_session};

#[derive(Parser)]
#[command(
    name = "pursuit",
    version,
    about = "Autonomous objective pursuit loop with operator input"
)]
struct Cli {
    /// Project root holding `.pursuit/`.
    #[arg(long, global = true, default_value = ".")]
    root: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create `.pursuit/` with a default config and an empty queue.
    Init {
        /// Overwrite the config and empty the queue. Insights are kept.
        #[arg(short, long)]
        force: bool,
    },
    /// Pursue an objective until it is met, tasks run out, or the operator quits.
    ///
    /// Type a line to queue a task; `quit` or `exit` stops the run.
    Run {
        /// Path to the local model weights.
        #[arg(long)]
        model_path: PathBuf,
        #[arg(long, default_value = DEFAULT_OBJECTIVE)]
        objective: String,
        /// Override `max_iterations` from the config.
        #[arg(long)]
        max_iterations: Option<u32>,
        /// Enable debug tracing for pursuit (ignored when `RUST_LOG` is set).
        #[arg(long)]
        debug: bool,
    },
    /// Print the queue store: operator notes, then tasks in execution order.
    Queue,
    /// Print the insight log.
    Insights,
    /// Empty the queue store, recording what was dropped in the run log.
    Clear,
    /// Print the summary of the last run.
    Status,
}

fn main() {
    let cli = Cli::parse();
    let debug = matches!(cli.command, Command::Run { debug: true, .. });
    logging::init(debug);

    if let Err(err) = dispatch(cli) {
        eprintln!("{err:#}");
        std::process::exit(exit_codes::INVALID);
    }
    std::process::exit(exit_codes::OK);
}

fn dispatch(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Init { force } => cmd_init(&cli.root, force),
        Command::Run {
            model_path,
            objective,
            max_iterations,
            debug: _,
        } => cmd_run(
            &cli.root,
            RunOptions {
                objective,
                model_path,
                max_iterations,
            },
        ),
        Command::Queue => cmd_queue(&cli.root),
        Command::Insights => cmd_insights(&cli.root),
        Command::Clear => cmd_clear(&cli.root),
        Command::Status => cmd_status(&cli.root),
    }
}

fn cmd_init(root: &Path, force: bool) -> Result<()> {
    let paths = init_workspace(root, &InitOptions { force })?;
    println!("initialized {}", paths.state_dir.display());
    Ok(())
}

fn cmd_run(root: &Path, options: RunOptions) -> Result<()> {
    println!("Objective: {}", options.objective);
    let operator = BufReader::new(std::io::stdin());
    let summary = run_session(root, &options, operator, |event| println!("{event}"))?;
    println!(
        "Done ({}). Tasks completed: {} in {}/{} iterations.",
        summary.stop, summary.tasks_completed, summary.iterations, summary.max_iterations
    );
    Ok(())
}

fn cmd_queue(root: &Path) -> Result<()> {
    let workspace = Workspace::open(root)?;
    for entry in workspace.queue.memory_entries()? {
        println!("{entry}");
    }
    for (index, task) in workspace.queue.load()?.iter().enumerate() {
        println!("{}. {task}", index + 1);
    }
    Ok(())
}

fn cmd_insights(root: &Path) -> Result<()> {
    let workspace = Workspace::open(root)?;
    print!("{}", workspace.insights.read()?);
    Ok(())
}

fn cmd_clear(root: &Path) -> Result<()> {
    let workspace = Workspace::open(root)?;
    workspace.reset_queue()?;
    println!("cleared {}", workspace.queue.path().display());
    Ok(())
}

fn cmd_status(root: &Path) -> Result<()> {
    let paths = PursuitPaths::new(root);
    let summary = load_run_summary(&paths.last_run_path)
        .with_context(|| format!("no run recorded in {}", paths.state_dir.display()))?;
    println!("objective: {}", summary.objective);
    println!("stop: {}", summary.stop);
    println!("tasks completed: {}", summary.tasks_completed);
    println!(
        "iterations: {}/{}",
        summary.iterations, summary.max_iterations
    );
    println!("started: {}", summary.started_at);
    println!("ended: {}", summary.ended_at);
    Ok(())
}
