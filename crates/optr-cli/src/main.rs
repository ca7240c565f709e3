mod cmd;
mod output;
mod root;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "optr",
    about = "Worktree and plan tooling for OPTR task execution",
    version,
    propagate_version = true
)]
struct Cli {
    /// Repository root (default: auto-detect from .git/)
    #[arg(long, global = true, env = "OPTR_ROOT")]
    repo: Option<PathBuf>,

    /// State file name, relative to the repository root
    #[arg(long, global = true, default_value = optr_core::paths::STATE_FILE)]
    state: String,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List every worktree git knows about
    List,

    /// Analyze a plan file for worktree needs (exit 1 when recommended)
    Analyze { plan_file: PathBuf },

    /// Create an isolated worktree for a task
    Create {
        task_id: String,
        task_name: String,
        /// Base branch to create the task branch from
        #[arg(long, default_value = "main")]
        branch: String,
    },

    /// Remove a task's worktree
    Remove {
        task_id: String,
        #[arg(long)]
        force: bool,
    },

    /// Remove every tracked worktree
    Cleanup {
        #[arg(long)]
        force: bool,
    },

    /// Decide whether a task needs an isolated worktree
    ShouldUse {
        /// Task descriptor as JSON
        #[arg(long = "task")]
        task: String,
    },

    /// Discover available skills, agents, and commands for a plan
    Discover {
        /// Plan file (default: PLAN.md in the repository root)
        plan_file: Option<PathBuf>,
    },

    /// Match marketplace plugins against a plan
    Match {
        /// Plan file (default: PLAN.md in the repository root)
        plan_file: Option<PathBuf>,

        /// Minimum relevance score (0..=1)
        #[arg(long, default_value_t = 0.25)]
        threshold: f64,
    },

    /// Suggest structural improvements for a plan
    Optimize {
        /// Plan file (default: PLAN.md in the repository root)
        plan_file: Option<PathBuf>,
    },

    /// Synchronize project documentation after task completion
    SyncDocs {
        /// Changelog entries for README.md (repeatable)
        #[arg(long = "change")]
        changes: Vec<String>,
    },
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_target(false)
        .init();

    let root = root::resolve_root(cli.repo.as_deref());

    let mut exit_code = 0;
    let result = match cli.command {
        Commands::List => cmd::list::run(&root, &cli.state, cli.json),
        Commands::Analyze { plan_file } => cmd::analyze::run(&plan_file, cli.json)
            .map(|recommended| {
                if recommended {
                    exit_code = 1;
                }
            }),
        Commands::Create {
            task_id,
            task_name,
            branch,
        } => cmd::create::run(&root, &cli.state, &task_id, &task_name, &branch, cli.json),
        Commands::Remove { task_id, force } => {
            cmd::remove::run(&root, &cli.state, &task_id, force, cli.json)
        }
        Commands::Cleanup { force } => cmd::cleanup::run(&root, &cli.state, force, cli.json),
        Commands::ShouldUse { task } => cmd::should_use::run(&root, &cli.state, &task, cli.json),
        Commands::Discover { plan_file } => {
            cmd::discover::run(&root, plan_file.as_deref(), cli.json)
        }
        Commands::Match {
            plan_file,
            threshold,
        } => cmd::match_plugins::run(&root, plan_file.as_deref(), threshold),
        Commands::Optimize { plan_file } => {
            cmd::optimize::run(&root, plan_file.as_deref(), cli.json)
        }
        Commands::SyncDocs { changes } => cmd::sync_docs::run(&root, &changes, cli.json),
    };

    if let Err(e) = result {
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
    std::process::exit(exit_code);
}
