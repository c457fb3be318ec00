use anyhow::Result;
use clap::{Parser, Subcommand};
use morty::commands::{compile, init, job, reset, status};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "morty")]
#[command(about = "Plan-driven job scheduler for iterative development loops", long_about = None)]
#[command(version)]
struct Cli {
    /// Project root containing the .morty directory
    #[arg(long, global = true, default_value = ".")]
    root: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the .morty work and plan directories
    Init,

    /// Compile every plan into a fresh schedule
    Compile {
        /// Overwrite an existing schedule, discarding its progress
        #[arg(long)]
        force: bool,
    },

    /// Show the job that would be started next
    Next,

    /// Mark the next pending job as running
    Start,

    /// Mark the running job as completed
    Complete,

    /// Report a failed attempt for the running job
    Fail {
        /// Why the attempt failed
        #[arg(short, long)]
        reason: Option<String>,
    },

    /// Flag the running job as interrupted
    Interrupt,

    /// Clear the interrupted flag on the running job
    Resume,

    /// Block a job so it is skipped
    Block {
        /// Module name or display name
        #[arg(short, long)]
        module: String,

        /// Job name
        #[arg(short, long)]
        job: String,

        /// Why the job is blocked
        #[arg(short, long)]
        reason: Option<String>,
    },

    /// Return jobs to pending (all, one module, or one job)
    Reset {
        /// Module name or display name
        #[arg(short, long)]
        module: Option<String>,

        /// Job name within the module
        #[arg(short, long, requires = "module")]
        job: Option<String>,
    },

    /// Show schedule progress
    Status,
}

fn main() -> Result<()> {
    morty::logging::init();
    let cli = Cli::parse();
    let root = cli.root.as_path();

    match cli.command {
        Commands::Init => init::execute(root),
        Commands::Compile { force } => compile::execute(root, force),
        Commands::Next => job::next(root),
        Commands::Start => job::start(root),
        Commands::Complete => job::complete(root),
        Commands::Fail { reason } => job::fail(root, reason),
        Commands::Interrupt => job::interrupt(root),
        Commands::Resume => job::resume(root),
        Commands::Block {
            module,
            job: job_name,
            reason,
        } => job::block(root, &module, &job_name, reason),
        Commands::Reset { module, job } => reset::execute(root, module, job),
        Commands::Status => status::execute(root),
    }
}
