//! quizforge CLI — the user-facing command-line interface.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "quizforge", version, about = "Interactive exercise and exam engine")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate an exercise collection JSON file
    Validate {
        /// Path to the collection file
        #[arg(long)]
        exercises: PathBuf,
    },

    /// Run a timed exam over a collection
    Run {
        /// Path to the collection file
        #[arg(long)]
        exercises: PathBuf,

        /// Number of questions to draw
        #[arg(long, default_value = "10")]
        questions: usize,

        /// Time limit in minutes (0 disables the countdown)
        #[arg(long, default_value = "30")]
        time_limit: u32,

        /// Only include exercises of this difficulty (easy, medium, hard)
        #[arg(long)]
        difficulty: Option<String>,

        /// Comma-separated exercise kinds to include (default: all)
        #[arg(long)]
        kinds: Option<String>,

        /// Keep the authored exercise order instead of shuffling
        #[arg(long)]
        no_shuffle: bool,

        /// Reveal explanations when an answer is correct
        #[arg(long)]
        show_explanations: bool,

        /// Answer yes to confirmations (smaller pool, early finish)
        #[arg(long)]
        yes: bool,

        /// Directory for session snapshots (enables resume across runs)
        #[arg(long)]
        state_dir: Option<PathBuf>,

        /// Write a JSON exam report here
        #[arg(long)]
        report: Option<PathBuf>,
    },

    /// List or inspect catalog courses
    Catalog {
        /// Catalog directory holding per-course JSON files
        #[arg(long, default_value = "./exercises")]
        dir: PathBuf,

        /// Show one course's exercises (falls back to placeholders)
        #[arg(long)]
        course: Option<String>,
    },

    /// Create a starter exercise collection
    Init,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("quizforge=info".parse().unwrap()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Validate { exercises } => commands::validate::execute(exercises),
        Commands::Run {
            exercises,
            questions,
            time_limit,
            difficulty,
            kinds,
            no_shuffle,
            show_explanations,
            yes,
            state_dir,
            report,
        } => commands::run::execute(commands::run::RunArgs {
            exercises,
            questions,
            time_limit,
            difficulty,
            kinds,
            no_shuffle,
            show_explanations,
            yes,
            state_dir,
            report,
        }),
        Commands::Catalog { dir, course } => commands::catalog::execute(dir, course),
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
