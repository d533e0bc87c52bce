//! Wiki Pages Sync CLI
//!
//! Publishes a GitHub wiki onto the gh-pages branch of its repository

use anyhow::Result;
use clap::{Parser, Subcommand};
use console::style;
use std::collections::HashMap;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use wiki_pages_sync::orchestration::exit_code;
use wiki_pages_sync::security::redact_url;
use wiki_pages_sync::{
    ConfigLoadOptions, ConfigLoader, PagesSync, SafeCommandExecutor, SyncConfigFile, SyncOutcome,
    SyncReport,
};

/// Publish wiki pages to a gh-pages branch
#[derive(Parser)]
#[command(name = "wiki-pages-sync")]
#[command(version = "0.1.0")]
#[command(about = "Publish wiki pages to a gh-pages branch", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Copy the wiki into the pages branch, commit and push
    Sync {
        /// Project path (defaults to current directory)
        #[arg(value_name = "PROJECT_PATH")]
        project_path: Option<PathBuf>,

        /// Wiki repository to read from
        #[arg(long)]
        source_repo: Option<String>,

        /// Repository to publish to (defaults to remote.origin.url)
        #[arg(long)]
        destination_repo: Option<String>,

        /// Scratch directory, recreated on every run
        #[arg(long)]
        workspace: Option<PathBuf>,

        /// Remove published pages that no longer exist in the wiki
        #[arg(long)]
        prune_stale: bool,

        /// Stage changes but skip commit and push
        #[arg(long)]
        dry_run: bool,

        /// Increase log verbosity (-v, -vv)
        #[arg(short, long, action = clap::ArgAction::Count)]
        verbose: u8,

        /// Only log errors
        #[arg(short, long, conflicts_with = "verbose")]
        quiet: bool,
    },

    /// Load and validate configuration
    Check {
        /// Project path (defaults to current directory)
        #[arg(value_name = "PROJECT_PATH")]
        project_path: Option<PathBuf>,
    },

    /// Write a default .pages-sync.yaml
    Init {
        /// Project path (defaults to current directory)
        #[arg(value_name = "PROJECT_PATH")]
        project_path: Option<PathBuf>,

        /// Force overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() {
    let result = run().await;

    match result {
        Ok(exit_code) => process::exit(exit_code),
        Err(e) => {
            eprintln!("\n❌ Error");
            eprintln!("{}", e);
            process::exit(1);
        }
    }
}

async fn run() -> Result<i32> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Sync {
            project_path,
            source_repo,
            destination_repo,
            workspace,
            prune_stale,
            dry_run,
            verbose,
            quiet,
        } => {
            setup_logging(verbose, quiet);

            let path = project_path.unwrap_or_else(|| PathBuf::from("."));
            let overrides = SyncConfigFile {
                source_repo,
                destination_repo,
                workspace,
                prune_stale: prune_stale.then_some(true),
                dry_run: dry_run.then_some(true),
                ..Default::default()
            };
            sync_command(path, overrides).await
        }
        Commands::Check { project_path } => {
            let path = project_path.unwrap_or_else(|| PathBuf::from("."));
            check_command(path).await
        }
        Commands::Init {
            project_path,
            force,
        } => {
            let path = project_path.unwrap_or_else(|| PathBuf::from("."));
            init_command(path, force).await
        }
    }
}

fn setup_logging(verbose: u8, quiet: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = match (quiet, verbose) {
            (true, _) => "error",
            (false, 0) => "info",
            (false, 1) => "debug",
            (false, _) => "trace",
        };
        EnvFilter::new(level)
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

async fn sync_command(project_path: PathBuf, overrides: SyncConfigFile) -> Result<i32> {
    println!("\n📚 wiki-pages-sync\n");

    let env: HashMap<String, String> = std::env::vars().collect();
    let config = ConfigLoader::load(ConfigLoadOptions {
        project_path,
        cli_args: Some(overrides),
        env: env.clone(),
    })
    .await?;

    let validation = ConfigLoader::validate(&config);
    if !validation.valid {
        eprintln!("{}", ConfigLoader::format_validation_result(&validation));
        return Ok(1);
    }
    for warning in &validation.warnings {
        eprintln!(
            "{}",
            style(format!("⚠️  [{}] {}", warning.field, warning.message)).yellow()
        );
    }

    let mut executor = SafeCommandExecutor::new();
    if let Some(secs) = config.command_timeout_secs {
        executor.set_timeout(Duration::from_secs(secs));
    }

    let sync = PagesSync::from_env(config, Arc::new(executor), &env);
    let result = sync.run().await;

    match &result {
        Ok(report) => print_report(report),
        Err(e) => {
            eprintln!(
                "\n{} [{}] {}",
                style("❌ Sync failed").red().bold(),
                e.code(),
                e
            );
            let actions = e.suggested_actions();
            if !actions.is_empty() {
                eprintln!("\n💡 Suggested actions:");
                for action in actions {
                    eprintln!("  - {}", action);
                }
            }
        }
    }

    Ok(exit_code(&result))
}

fn print_report(report: &SyncReport) {
    println!();
    println!("  Source:      {}", style(&report.source_repo).cyan());
    println!("  Destination: {}", style(&report.destination_repo).cyan());
    println!("  Pages:       {}", report.copied.len() + 1);
    if !report.pruned.is_empty() {
        println!("  Pruned:      {}", report.pruned.len());
    }

    match &report.outcome {
        SyncOutcome::Published => println!("\n✅ Wiki pages published"),
        SyncOutcome::NothingPublished { reason } => {
            println!("\nℹ️  Nothing published: {}", reason)
        }
        SyncOutcome::DryRun => println!("\n🧪 Dry run complete, changes left staged"),
    }
}

async fn check_command(project_path: PathBuf) -> Result<i32> {
    println!("\n🔍 Configuration Check\n");

    let config = ConfigLoader::load(ConfigLoadOptions {
        project_path,
        cli_args: None,
        env: std::env::vars().collect(),
    })
    .await?;

    let result = ConfigLoader::validate(&config);
    println!("{}", ConfigLoader::format_validation_result(&result));
    println!();

    println!(
        "  Source:      {} ({})",
        redact_url(&config.source_repo),
        config.source_branch
    );
    println!(
        "  Destination: {} ({})",
        config
            .destination_repo
            .as_deref()
            .map(redact_url)
            .unwrap_or_else(|| "remote.origin.url".to_string()),
        config.destination_branch
    );
    println!("  Workspace:   {}", config.workspace.display());
    println!();

    Ok(if result.valid { 0 } else { 1 })
}

async fn init_command(project_path: PathBuf, force: bool) -> Result<i32> {
    println!("\n🎯 Initialize wiki-pages-sync\n");

    let target = ConfigLoader::write_template(&project_path, force).await?;
    println!("✅ Created {}", target.display());

    Ok(0)
}
