//! gomig CLI
//!
//! `gomig generate <name> [columns...]` writes a new `.up.sql` file,
//! `gomig migrate` applies pending files and `gomig status` lists applied and pending ones.

use anyhow::{bail, Result};
use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use gomig::config::GomigConfig;
use gomig::migration::{generate_migration, ApplyMode, ApplyOrder, MigrationError, Runner};
use gomig::{connect, PostgresExecutor};
use std::path::{Path, PathBuf};
use std::process;

#[derive(Parser, Debug)]
#[command(name = "gomig")]
#[command(about = "Generate and apply SQL migrations")]
#[command(version)]
struct Cli {
    /// Database connection URL (falls back to GOMIG_DATABASE_URL, then DATABASE_URL)
    #[arg(long, global = true)]
    db: Option<String>,

    /// Migrations directory path [default: migrations]
    #[arg(long, global = true)]
    migrations_dir: Option<PathBuf>,

    /// Apply each migration without a surrounding transaction
    #[arg(long, global = true)]
    no_transaction: bool,

    /// Order in which pending migrations are applied
    #[arg(long, value_enum, global = true)]
    order: Option<OrderArg>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet output (errors only)
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate a new migration file
    Generate {
        /// Migration name as <action>_<table>, e.g. "create_users"
        name: String,

        /// Column descriptors as <column>:<type>, e.g. "email:varchar(255)"
        columns: Vec<String>,
    },

    /// Apply pending migrations
    Migrate {
        /// Show what would be applied without running anything
        #[arg(long)]
        dry_run: bool,
    },

    /// Show migration status (applied vs pending)
    Status,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OrderArg {
    /// Lexical file name order
    Filename,
    /// `-- Created at:` header order
    CreatedAt,
}

impl From<OrderArg> for ApplyOrder {
    fn from(order: OrderArg) -> Self {
        match order {
            OrderArg::Filename => ApplyOrder::Filename,
            OrderArg::CreatedAt => ApplyOrder::CreatedAt,
        }
    }
}

fn main() {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    // Initialize logging
    let default_filter = if cli.quiet {
        "error"
    } else if cli.verbose {
        "debug"
    } else {
        "info"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter)).init();

    if let Err(e) = run(&cli) {
        println!("{} {}", "❌ Error:".red(), e);
        process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<()> {
    let config = GomigConfig::load()?;
    let runner = build_runner(cli, &config);
    log::debug!(
        "Migrations directory: {} ({:?}, {:?} order)",
        runner.migrations_dir().display(),
        runner.mode(),
        runner.order()
    );

    match &cli.command {
        Commands::Generate { name, columns } => handle_generate(runner.migrations_dir(), name, columns),
        Commands::Migrate { dry_run } => {
            let executor = open_executor(cli, &config)?;
            handle_migrate(&runner, &executor, *dry_run)
        }
        Commands::Status => {
            let executor = open_executor(cli, &config)?;
            handle_status(&runner, &executor)
        }
    }
}

/// Command-line flags take precedence over `config/gomig.toml` and `GOMIG__*` settings.
fn build_runner(cli: &Cli, config: &GomigConfig) -> Runner {
    let mut runner = config.migrations.runner();
    if let Some(dir) = &cli.migrations_dir {
        runner = Runner::new(dir)
            .with_mode(runner.mode())
            .with_order(runner.order());
    }
    if cli.no_transaction {
        runner = runner.with_mode(ApplyMode::Direct);
    }
    if let Some(order) = cli.order {
        runner = runner.with_order(order.into());
    }
    runner
}

fn database_url(
    flag: Option<&str>,
    config: &GomigConfig,
    env: impl Fn(&str) -> Option<String>,
) -> Option<String> {
    flag.map(str::to_string)
        .or_else(|| config.database.url.clone())
        .or_else(|| env("GOMIG_DATABASE_URL"))
        .or_else(|| env("DATABASE_URL"))
}

fn open_executor(cli: &Cli, config: &GomigConfig) -> Result<PostgresExecutor> {
    let Some(url) = database_url(cli.db.as_deref(), config, |key| std::env::var(key).ok()) else {
        bail!("Database URL not provided. Use --db or set GOMIG_DATABASE_URL or DATABASE_URL environment variable.");
    };
    let client = connect(&url).map_err(MigrationError::from)?;
    Ok(PostgresExecutor::new(client))
}

fn handle_generate(migrations_dir: &Path, name: &str, columns: &[String]) -> Result<()> {
    let migration = generate_migration(migrations_dir, name, columns, Utc::now())?;

    for diagnostic in &migration.generated.diagnostics {
        println!("{} Skipped {}", "⚠".yellow(), diagnostic);
    }
    if migration.generated.is_comment_only() {
        println!(
            "{} No SQL statements generated for '{}'; the file only contains comments",
            "⚠".yellow(),
            name
        );
    }
    println!("{} Migration file created: {}", "✅".green(), migration.path.display());
    Ok(())
}

fn handle_migrate(runner: &Runner, executor: &PostgresExecutor, dry_run: bool) -> Result<()> {
    if dry_run {
        let pending = runner.pending(executor)?;
        if pending.is_empty() {
            println!("No pending migrations to apply");
            return Ok(());
        }

        println!("Would apply {} migration(s):", pending.len());
        for (i, file) in pending.iter().enumerate() {
            println!("  {}. {}", i + 1, file.filename);
        }
        return Ok(());
    }

    let report = runner.run(executor)?;
    if report.applied.is_empty() {
        println!("{} No migrations to apply", "✅".green());
    } else {
        for file in &report.applied {
            println!("  ✓ {file}");
        }
        println!("{} Successfully applied {} migration(s)", "✅".green(), report.applied_count());
    }
    Ok(())
}

fn handle_status(runner: &Runner, executor: &PostgresExecutor) -> Result<()> {
    let status = runner.status(executor)?;

    println!("\n📊 Migration Status\n");

    if status.applied.is_empty() {
        println!("✅ Applied Migrations: None");
    } else {
        println!("✅ Applied Migrations ({}):", status.applied_count());
        for record in &status.applied {
            println!(
                "  ✓ {} ({})",
                record.version,
                record.applied_at.format("%Y-%m-%d %H:%M:%S UTC")
            );
        }
    }

    println!();

    if status.pending.is_empty() {
        println!("⏳ Pending Migrations: None");
    } else {
        println!("⏳ Pending Migrations ({}):", status.pending_count());
        for file in &status.pending {
            println!("  ⏳ {}", file.filename);
        }
    }

    if !status.missing_files.is_empty() {
        println!();
        println!("{} Recorded but missing from {}:", "⚠".yellow(), runner.migrations_dir().display());
        for version in &status.missing_files {
            println!("  ? {version}");
        }
    }

    println!(
        "\n📈 Summary: {} applied, {} pending",
        status.applied_count(),
        status.pending_count()
    );
    Ok(())
}
