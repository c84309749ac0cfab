use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use driftcheck::api::{
    verify, VerifyOptions, DEFAULT_MIGRATIONS_DIR, DEFAULT_MODULES_DIR, DEFAULT_MODULE_FILE,
    DEFAULT_TYPES_FILE,
};
use driftcheck::parser::PairingPolicy;
use driftcheck::report::{render_json, render_text, Check, ExitStatus};

#[derive(Parser)]
#[command(name = "driftcheck", version)]
#[command(
    about = "Detect drift between SQL migrations, generated types and data-access modules",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Directory of *.sql migrations, applied in file name order
    #[arg(long, global = true, env = "DRIFTCHECK_MIGRATIONS", default_value = DEFAULT_MIGRATIONS_DIR)]
    migrations: PathBuf,

    /// Generated type-description file
    #[arg(long, global = true, env = "DRIFTCHECK_TYPES", default_value = DEFAULT_TYPES_FILE)]
    types: PathBuf,

    /// Root of the data-access module tree
    #[arg(long, global = true, env = "DRIFTCHECK_MODULES", default_value = DEFAULT_MODULES_DIR)]
    modules: PathBuf,

    /// Only files with this name are scanned as modules
    #[arg(long, global = true, default_value = DEFAULT_MODULE_FILE)]
    module_file: String,

    /// How predicate columns are paired with tables (nearest, cross-product)
    #[arg(long, global = true, default_value = "nearest")]
    pairing: PairingPolicy,

    /// Only report tables matching this glob (repeatable)
    #[arg(long = "table", value_name = "GLOB", global = true)]
    tables: Vec<String>,

    /// Drop tables matching this glob from the report (repeatable)
    #[arg(long = "exclude-table", value_name = "GLOB", global = true)]
    exclude_tables: Vec<String>,

    #[arg(long, value_enum, global = true, default_value_t = Format::Text)]
    format: Format,

    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Subcommand, Clone, Copy, Debug, PartialEq, Eq)]
enum Commands {
    /// Run every comparison (default)
    Check,
    /// Compare the migration schema with the generated types
    Sync,
    /// Find columns used by modules that the schema does not define
    Usage,
    /// List foreign keys and join keys used without one (advisory)
    Relations,
}

impl From<Commands> for Check {
    fn from(command: Commands) -> Self {
        match command {
            Commands::Check => Check::All,
            Commands::Sync => Check::Sync,
            Commands::Usage => Check::Usage,
            Commands::Relations => Check::Relations,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Json,
}

impl Cli {
    fn options(&self) -> VerifyOptions {
        let check = self.command.map(Check::from).unwrap_or_default();
        VerifyOptions::new(&self.migrations, &self.types, &self.modules)
            .with_module_file_name(&self.module_file)
            .with_pairing(self.pairing)
            .with_include_tables(self.tables.clone())
            .with_exclude_tables(self.exclude_tables.clone())
            .with_check(check)
    }
}

pub fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Runs one verification and prints its report to stdout.
pub fn run(cli: &Cli) -> Result<ExitStatus> {
    let options = cli.options();
    tracing::debug!(?options, "starting verification");

    let result = verify(&options)?;
    let output = match cli.format {
        Format::Text => render_text(&result.report, result.check),
        Format::Json => {
            let mut json =
                render_json(&result.report, result.check).context("Failed to render JSON report")?;
            json.push('\n');
            json
        }
    };
    print!("{output}");

    Ok(result.status())
}
