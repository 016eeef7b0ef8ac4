//! Logix CLI: inspect, export and push updates between L5X projects.

mod commands;
mod config;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::export::ExportKind;
use config::LogixConfig;

#[derive(Parser)]
#[command(name = "logix", version, about = "Inspect, export and synchronize L5X controller projects")]
struct Cli {
    /// Raise log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Summarize the contents of a project file
    Inspect {
        /// Project file (.L5X)
        file: PathBuf,
        /// Print a JSON summary
        #[arg(long)]
        json: bool,
    },
    /// Export one object and its dependencies as a standalone document
    Export {
        /// Project file (.L5X)
        file: PathBuf,
        /// Kind of object to export
        #[arg(long, value_enum)]
        kind: ExportKind,
        /// Object name
        #[arg(long)]
        name: String,
        /// Owning program (routines only)
        #[arg(long)]
        program: Option<String>,
        /// Output path; `.L5X` is appended when missing
        #[arg(long)]
        out: PathBuf,
    },
    /// Push updates from a master project into one or more targets
    Push {
        /// Master project file
        master: PathBuf,
        /// Target project files
        #[arg(required = true)]
        targets: Vec<PathBuf>,
        /// Directory for the merged targets (default: beside each target)
        #[arg(long)]
        out_dir: Option<PathBuf>,
        /// Match internal routines by exact name only
        #[arg(long)]
        no_similarity: bool,
        /// Minimum name similarity for internal routine matching
        #[arg(long)]
        threshold: Option<f64>,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = run(cli);
    if let Err(e) = result {
        eprintln!("error: {e:#}");
        process::exit(1);
    }
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let cwd = std::env::current_dir()?;
    let config = LogixConfig::find_and_load(&cwd)?
        .map(|(config, _)| config)
        .unwrap_or_default();

    match cli.command {
        Commands::Inspect { file, json } => commands::inspect::run(&file, json),

        Commands::Export {
            file,
            kind,
            name,
            program,
            out,
        } => commands::export::run(&file, kind, &name, program.as_deref(), &out, &config.export),

        Commands::Push {
            master,
            targets,
            out_dir,
            no_similarity,
            threshold,
        } => {
            let mut options = config.push;
            if no_similarity {
                options.use_similarity = false;
            }
            if let Some(threshold) = threshold {
                options.similarity_threshold = threshold;
            }
            commands::push::run(&master, &targets, out_dir.as_deref(), &options, &config.export)
        }
    }
}
