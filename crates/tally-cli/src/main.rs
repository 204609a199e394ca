mod commands;
mod output;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use commands::parse::Backend;

#[derive(Parser)]
#[command(
    name = "tally",
    version,
    about = "Turn bank statement PDFs into a categorized ledger"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a statement PDF (or a saved vision-model JSON response)
    Parse {
        /// Path to a PDF statement or a .json vision response
        input_file: PathBuf,

        /// Output format: table (default) or json
        #[arg(short, long, default_value = "table")]
        output: String,

        /// Write the parsed statement to a JSON file
        #[arg(short = 'O', long = "out", value_name = "FILE")]
        out: Option<PathBuf>,

        /// Text extraction backend
        #[arg(short, long, value_enum, default_value_t = Backend::Lopdf)]
        backend: Backend,

        /// Give up on pdftotext after this many seconds
        #[arg(long, value_name = "SECS")]
        timeout: Option<u64>,

        /// Custom JSON category table
        #[arg(short, long, value_name = "FILE")]
        categories: Option<PathBuf>,

        /// Drop the account holder's name and mask the account number
        #[arg(long)]
        sanitize: bool,
    },
    /// Show which category a transaction description falls into
    Categorize {
        /// One or more descriptions
        #[arg(required = true)]
        descriptions: Vec<String>,

        /// Custom JSON category table
        #[arg(short, long, value_name = "FILE")]
        categories: Option<PathBuf>,
    },
    /// Inspect and validate category tables
    Categories {
        #[command(subcommand)]
        action: CategoriesAction,
    },
}

#[derive(Subcommand)]
enum CategoriesAction {
    /// List the built-in category table in match order
    List,
    /// Validate a custom category table
    Validate {
        /// Path to JSON category file
        file: PathBuf,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Parse {
            input_file,
            output,
            out,
            backend,
            timeout,
            categories,
            sanitize,
        } => commands::parse::run(commands::parse::ParseArgs {
            input_file,
            output_format: output,
            output_file: out,
            backend,
            timeout,
            categories,
            sanitize,
        }),
        Commands::Categorize {
            descriptions,
            categories,
        } => commands::categorize::run(&descriptions, categories.as_deref()),
        Commands::Categories { action } => match action {
            CategoriesAction::List => commands::categories::list(),
            CategoriesAction::Validate { file } => commands::categories::validate(&file),
        },
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
