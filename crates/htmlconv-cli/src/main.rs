//! htmlconv CLI - rewrite HTML attributes with declarative JSON rules.
//!
//! ```text
//! htmlconv input.html --rules rules.json -o output.html
//! cat input.html | htmlconv - --rules-json '{"img": {"attr": {"/^src$/": "data-src"}}}'
//! ```

mod error;

use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use error::CliError;
use htmlconv::RuleSet;

/// Rewrite HTML element attributes with declarative pattern rules.
#[derive(Parser)]
#[command(name = "htmlconv", version, about)]
struct Cli {
    /// Input HTML file, or `-` to read from stdin.
    input: String,

    /// Path to a JSON rule file.
    #[arg(long, conflicts_with = "rules_json")]
    rules: Option<PathBuf>,

    /// Inline JSON rule text.
    #[arg(long)]
    rules_json: Option<String>,

    /// Output file; stdout when omitted.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Enable info-level logging.
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();

    // --verbose enables INFO level, otherwise use RUST_LOG or stay quiet
    let filter = if cli.verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    if let Err(err) = run(cli) {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let input = if cli.input == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        buffer
    } else {
        fs::read_to_string(&cli.input)?
    };

    let rules = match (&cli.rules, &cli.rules_json) {
        (Some(path), _) => {
            let text = fs::read_to_string(path)?;
            let rules = RuleSet::from_json(&text).map_err(|source| CliError::Rules {
                path: path.display().to_string(),
                source,
            })?;
            Some(rules)
        }
        (None, Some(text)) => Some(RuleSet::from_json(text)?),
        (None, None) => None,
    };

    let output = htmlconv::convert(&input, rules.as_ref())?;

    match &cli.output {
        Some(path) => fs::write(path, output)?,
        None => io::stdout().write_all(output.as_bytes())?,
    }

    Ok(())
}
