//! vg_collect - Inventory fetching and refresh orchestration for vmgrep
//!
//! This crate provides:
//! - The InventorySource trait for pluggable inventory backends
//! - The gcloud-backed production source
//! - Per-project fetch-and-write with failure isolation
//! - The refresh orchestrator (one concurrent fetch per project)

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};
use vg_config::VmgrepConfig;
use vg_store::SnapshotStore;

pub mod source;

pub use source::GcloudSource;

/// Collection errors
#[derive(Error, Debug)]
pub enum CollectError {
    #[error("Command execution failed: {0}")]
    Exec(String),

    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    #[error("Tool not available: {0}")]
    ToolNotFound(String),

    #[error("No projects configured; pass --project or add projects to the config")]
    NoConfiguredProjects,

    #[error("Store error: {0}")]
    Store(#[from] vg_store::StoreError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Pluggable inventory backend.
///
/// The production implementation shells out to the cloud CLI; tests inject
/// a canned source so orchestration and failure isolation can be exercised
/// without the external tool.
#[async_trait]
pub trait InventorySource: Send + Sync {
    /// Raw structured instance listing for one project
    async fn list_instances(&self, project: &str) -> Result<String, CollectError>;

    /// All accessible project IDs (the "all" selector)
    async fn discover_projects(&self) -> Result<Vec<String>, CollectError>;
}

/// Which projects a refresh targets
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProjectSelector {
    /// A single explicit project ID
    Explicit(String),

    /// The project list from the config file
    Configured,

    /// Every accessible project, via the discovery call
    All,
}

impl ProjectSelector {
    /// Parse the CLI's optional --project value
    pub fn from_arg(arg: Option<&str>) -> Self {
        match arg {
            None => Self::Configured,
            Some("all") => Self::All,
            Some(id) => Self::Explicit(id.to_string()),
        }
    }
}

/// Outcome of one project's fetch-and-write
#[derive(Debug, Clone)]
pub struct FetchOutcome {
    pub project: String,
    pub fetched_at: DateTime<Utc>,
    pub duration: Duration,
    pub error: Option<String>,
}

impl FetchOutcome {
    pub fn ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Per-project outcomes of one refresh run
#[derive(Debug, Default)]
pub struct RefreshSummary {
    pub outcomes: Vec<FetchOutcome>,
}

impl RefreshSummary {
    pub fn succeeded(&self) -> impl Iterator<Item = &FetchOutcome> {
        self.outcomes.iter().filter(|o| o.ok())
    }

    pub fn failed(&self) -> impl Iterator<Item = &FetchOutcome> {
        self.outcomes.iter().filter(|o| !o.ok())
    }

    pub fn all_failed(&self) -> bool {
        !self.outcomes.is_empty() && self.outcomes.iter().all(|o| !o.ok())
    }
}

/// Resolve a selector into a concrete project list.
///
/// Duplicates are dropped, first occurrence wins. An empty configured list
/// is a user-facing configuration error, not a crash.
pub async fn resolve_projects(
    selector: &ProjectSelector,
    config: &VmgrepConfig,
    source: &dyn InventorySource,
) -> Result<Vec<String>, CollectError> {
    let projects = match selector {
        ProjectSelector::Explicit(id) => vec![id.clone()],
        ProjectSelector::Configured => {
            if config.projects.is_empty() {
                return Err(CollectError::NoConfiguredProjects);
            }
            config.projects.clone()
        }
        ProjectSelector::All => source.discover_projects().await?,
    };

    let mut seen = std::collections::HashSet::new();
    Ok(projects
        .into_iter()
        .filter(|p| seen.insert(p.clone()))
        .collect())
}

/// Fetch one project's inventory and replace its snapshot.
///
/// Every failure mode ends up in the returned outcome: a failing listing
/// tool, a timeout, or a snapshot write error affects this project only and
/// must never take down sibling fetches.
pub async fn fetch_project(
    source: &dyn InventorySource,
    store: &SnapshotStore,
    project: &str,
) -> FetchOutcome {
    let started = std::time::Instant::now();
    let fetched_at = Utc::now();
    info!(project, "Fetching inventory");

    let result = match source.list_instances(project).await {
        Ok(raw) => store.write_snapshot(project, &raw).map_err(CollectError::from),
        Err(e) => Err(e),
    };

    let error = match result {
        Ok(()) => {
            info!(project, "Snapshot updated");
            None
        }
        Err(e) => {
            warn!(project, error = %e, "Fetch failed, snapshot left untouched");
            Some(e.to_string())
        }
    };

    FetchOutcome {
        project: project.to_string(),
        fetched_at,
        duration: started.elapsed(),
        error,
    }
}

/// Run one concurrent fetch per project and wait for all of them.
///
/// This is a join barrier: the call returns only after every fetch has
/// completed, successfully or not. No ordering between fetches is
/// guaranteed; outcomes are reported in the input project order.
pub async fn refresh_projects(
    source: Arc<dyn InventorySource>,
    store: SnapshotStore,
    projects: Vec<String>,
) -> RefreshSummary {
    info!(count = projects.len(), "Refreshing projects");

    let tasks: Vec<_> = projects
        .into_iter()
        .map(|project| {
            let source = Arc::clone(&source);
            let store = store.clone();
            tokio::spawn(async move { fetch_project(source.as_ref(), &store, &project).await })
        })
        .collect();

    let mut outcomes = Vec::with_capacity(tasks.len());
    for (idx, joined) in join_all(tasks).await.into_iter().enumerate() {
        match joined {
            Ok(outcome) => outcomes.push(outcome),
            // A panicked fetch task is contained like any other failure
            Err(e) => outcomes.push(FetchOutcome {
                project: format!("<task {idx}>"),
                fetched_at: Utc::now(),
                duration: Duration::ZERO,
                error: Some(format!("fetch task aborted: {e}")),
            }),
        }
    }

    RefreshSummary { outcomes }
}

/// Resolve a selector and refresh every resolved project
pub async fn refresh(
    selector: &ProjectSelector,
    config: &VmgrepConfig,
    source: Arc<dyn InventorySource>,
    store: SnapshotStore,
) -> Result<RefreshSummary, CollectError> {
    let projects = resolve_projects(selector, config, source.as_ref()).await?;
    Ok(refresh_projects(source, store, projects).await)
}
