//! vg_cli - CLI commands for vmgrep
//!
//! This crate provides:
//! - clap-based command definitions
//! - Command dispatch over the collect and query crates
//! - Table and SSH-command output formatting

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tracing::warn;
use vg_collect::{GcloudSource, ProjectSelector};
use vg_config::VmgrepConfig;
use vg_query::{OutputMode, QueryEngine, QueryOptions, QueryRow};
use vg_store::SnapshotStore;

pub mod table;

/// CLI errors
#[derive(Error, Debug)]
pub enum CliError {
    #[error("Command failed: {0}")]
    CommandFailed(String),

    #[error("Config error: {0}")]
    Config(#[from] vg_config::ConfigError),

    #[error("Store error: {0}")]
    Store(#[from] vg_store::StoreError),

    #[error("Collect error: {0}")]
    Collect(#[from] vg_collect::CollectError),

    #[error("Query error: {0}")]
    Query(#[from] vg_query::QueryError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Main CLI application
#[derive(Parser, Debug)]
#[command(name = "vmgrep")]
#[command(
    author,
    version,
    about = "Offline cache and fuzzy search for cloud VM inventory"
)]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Refresh cached snapshots from the cloud inventory
    #[command(alias = "u")]
    Update {
        /// Project to refresh: an explicit ID, or "all" to discover every
        /// accessible project. Defaults to the configured project list.
        #[arg(short, long)]
        project: Option<String>,
    },

    /// List cached VMs, fuzzy-matching projects and records
    #[command(alias = "l")]
    Ls {
        /// Fuzzy query against cached project names
        project: String,

        /// Free-text filter against name, status, networks and addresses
        filter: Option<String>,

        /// Print ready-to-run SSH commands instead of a table
        #[arg(short, long)]
        ssh: bool,
    },

    /// List projects with a cached snapshot
    Projects,

    /// Configuration management
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

/// Configuration subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Generate a starter configuration file
    Init {
        /// Output file path
        #[arg(short, long, default_value = "vmgrep.toml")]
        output: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        overwrite: bool,
    },

    /// Show the effective configuration
    Show,

    /// Show config file search paths
    Paths,
}

impl Cli {
    /// Run the CLI
    pub async fn run(self) -> Result<(), CliError> {
        let config = match &self.config {
            Some(path) => VmgrepConfig::load(path)?,
            None => VmgrepConfig::discover()?,
        };

        match self.command {
            Commands::Update { project } => run_update(&config, project.as_deref()).await,
            Commands::Ls {
                project,
                filter,
                ssh,
            } => run_ls(&config, &project, filter.as_deref().unwrap_or(""), ssh),
            Commands::Projects => run_projects(&config),
            Commands::Config { command } => run_config(&config, command),
        }
    }
}

async fn run_update(config: &VmgrepConfig, project_arg: Option<&str>) -> Result<(), CliError> {
    let store = SnapshotStore::open(&config.data_dir()?)?;
    let source = Arc::new(GcloudSource::from_config(config));
    let selector = ProjectSelector::from_arg(project_arg);

    let summary = match vg_collect::refresh(&selector, config, source, store).await {
        Ok(summary) => summary,
        Err(vg_collect::CollectError::NoConfiguredProjects) => {
            println!("No projects configured.");
            println!("Add projects to the config file or pass --project <id|all>.");
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    for outcome in &summary.outcomes {
        match &outcome.error {
            None => println!(
                "[done]   {} ({}ms)",
                outcome.project,
                outcome.duration.as_millis()
            ),
            Some(error) => println!("[failed] {}: {}", outcome.project, error),
        }
    }
    println!(
        "Updated {} of {} projects",
        summary.succeeded().count(),
        summary.outcomes.len()
    );

    if summary.all_failed() {
        return Err(CliError::CommandFailed(
            "every project fetch failed".to_string(),
        ));
    }
    Ok(())
}

fn run_ls(
    config: &VmgrepConfig,
    project_query: &str,
    filter: &str,
    ssh: bool,
) -> Result<(), CliError> {
    let store = SnapshotStore::open(&config.data_dir()?)?;
    let engine = QueryEngine::new(&store);
    let options = QueryOptions {
        mode: if ssh { OutputMode::Ssh } else { OutputMode::Table },
        ssh_user: config.ssh_user(),
    };

    let report = engine.run(project_query, filter, &options)?;

    if report.no_project_match() {
        println!("Did not find any matching projects");
        println!("Maybe add it to the config and run an update?");
        return Ok(());
    }
    println!("Checking {} matching projects", report.matched_projects.len());

    for result in &report.results {
        if let Some(warning) = &result.warning {
            warn!(project = %result.project, "{warning}");
            continue;
        }
        match options.mode {
            OutputMode::Ssh => {
                for row in &result.rows {
                    if let QueryRow::Ssh(command) = row {
                        println!("{command}");
                    }
                }
            }
            OutputMode::Table => {
                println!("Project: {}", result.project);
                let table_rows: Vec<Vec<String>> = result
                    .rows
                    .iter()
                    .filter_map(|row| match row {
                        QueryRow::Table(view) => Some(vec![
                            view.name.clone(),
                            view.status.clone(),
                            view.networks.clone(),
                            view.internal_addresses.clone(),
                            view.external_addresses.clone(),
                            view.zone.clone(),
                            view.tags.clone(),
                        ]),
                        QueryRow::Ssh(_) => None,
                    })
                    .collect();
                print!(
                    "{}",
                    table::render(
                        &["NAME", "STATUS", "NETWORKS", "INTERNAL", "EXTERNAL", "ZONE", "TAGS"],
                        &table_rows,
                    )
                );
            }
        }
    }
    Ok(())
}

fn run_projects(config: &VmgrepConfig) -> Result<(), CliError> {
    let store = SnapshotStore::open(&config.data_dir()?)?;
    let projects = store.projects()?;
    if projects.is_empty() {
        println!("No cached snapshots yet. Run `vmgrep update` first.");
        return Ok(());
    }
    for project in projects {
        println!("{project}");
    }
    Ok(())
}

fn run_config(config: &VmgrepConfig, command: ConfigCommands) -> Result<(), CliError> {
    match command {
        ConfigCommands::Init { output, overwrite } => {
            if output.exists() && !overwrite {
                return Err(CliError::CommandFailed(format!(
                    "File already exists: {}. Use --overwrite to replace.",
                    output.display()
                )));
            }
            std::fs::write(&output, VmgrepConfig::generate_default_toml())?;
            println!("Generated configuration: {}", output.display());
        }
        ConfigCommands::Show => {
            println!("{}", config.to_toml()?);
        }
        ConfigCommands::Paths => {
            println!("Config file search paths (in order of precedence):");
            for (i, path) in VmgrepConfig::config_paths().iter().enumerate() {
                let marker = if path.exists() { "*" } else { " " };
                println!("  {} {}. {}", marker, i + 1, path.display());
            }
        }
    }
    Ok(())
}
