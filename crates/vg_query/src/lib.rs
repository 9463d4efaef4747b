//! vg_query - Fuzzy matching and query engine for vmgrep
//!
//! This crate provides:
//! - Approximate matching of free-text queries against VM records
//! - Derived display views (short zone, joined network attributes)
//! - The query engine driving snapshot loads and match evaluation

use serde::Serialize;
use thiserror::Error;
use tracing::warn;
use vg_store::{Instance, SnapshotStore, StoreError};

pub mod matcher;

pub use matcher::{fuzzy_match, fuzzy_score, rank_matches};

/// Query errors
#[derive(Error, Debug)]
pub enum QueryError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Per-record display fields, computed at query time and never persisted
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct InstanceView {
    pub name: String,
    pub status: String,
    /// Short network names across all interfaces, comma-joined in
    /// interface order
    pub networks: String,
    /// Internal addresses, comma-joined in interface order
    pub internal_addresses: String,
    /// External addresses, comma-joined in interface-then-accessConfig order
    pub external_addresses: String,
    /// Short zone name (final path segment of the stored resource path)
    pub zone: String,
    /// Comma-joined labels; displayed, never matched
    pub tags: String,
}

/// Final segment of a resource path
fn short_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

impl InstanceView {
    pub fn from_instance(vm: &Instance) -> Self {
        let mut networks = Vec::new();
        let mut internal = Vec::new();
        let mut external = Vec::new();
        for iface in &vm.network_interfaces {
            networks.push(short_name(&iface.network).to_string());
            internal.push(iface.network_ip.clone());
            for access in &iface.access_configs {
                external.push(access.nat_ip.clone());
            }
        }

        Self {
            name: vm.name.clone(),
            status: vm.status.clone(),
            networks: networks.join(","),
            internal_addresses: internal.join(","),
            external_addresses: external.join(","),
            zone: short_name(&vm.zone).to_string(),
            tags: vm.tags.items.join(","),
        }
    }

    /// The strings a free-text query is evaluated against. Tags are
    /// deliberately excluded: they are display-only.
    fn match_surface(&self) -> [&str; 5] {
        [
            &self.name,
            &self.status,
            &self.networks,
            &self.internal_addresses,
            &self.external_addresses,
        ]
    }
}

/// True when the record matches the free-text query on any candidate field.
/// An empty query matches every record.
pub fn record_matches(query: &str, view: &InstanceView) -> bool {
    if query.is_empty() {
        return true;
    }
    view.match_surface()
        .iter()
        .any(|candidate| fuzzy_match(query, candidate))
}

/// SSH command line for one matched record
pub fn ssh_command(user: &str, project: &str, view: &InstanceView) -> String {
    format!(
        "gcloud compute ssh {user}@{name} --project {project} --zone {zone}",
        name = view.name,
        zone = view.zone,
    )
}

/// Row output selection. An explicit call-time value, not ambient state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Table,
    Ssh,
}

/// Call-time query options
#[derive(Debug, Clone)]
pub struct QueryOptions {
    pub mode: OutputMode,
    pub ssh_user: String,
}

/// One emitted match
#[derive(Debug, Clone, PartialEq)]
pub enum QueryRow {
    Table(InstanceView),
    Ssh(String),
}

/// Per-project query result
#[derive(Debug)]
pub struct ProjectResult {
    pub project: String,
    pub rows: Vec<QueryRow>,
    /// Diagnostic for a missing or malformed snapshot; the project still
    /// yields an (empty) result instead of failing the query
    pub warning: Option<String>,
}

/// Result of one query run
#[derive(Debug)]
pub struct QueryReport {
    /// Projects whose names matched, in rank order
    pub matched_projects: Vec<String>,
    pub results: Vec<ProjectResult>,
}

impl QueryReport {
    /// Zero matched projects is a normal, user-facing empty state
    pub fn no_project_match(&self) -> bool {
        self.matched_projects.is_empty()
    }
}

/// Query engine over the snapshot store
pub struct QueryEngine<'a> {
    store: &'a SnapshotStore,
}

impl<'a> QueryEngine<'a> {
    pub fn new(store: &'a SnapshotStore) -> Self {
        Self { store }
    }

    /// Run a query: fuzzy-resolve projects, then filter each project's
    /// records.
    ///
    /// Matched projects are processed in descending match score, ties in
    /// store listing order. A project whose snapshot is missing or
    /// malformed is reported in its result's warning and contributes no
    /// rows; sibling projects are unaffected.
    pub fn run(
        &self,
        project_query: &str,
        filter: &str,
        options: &QueryOptions,
    ) -> Result<QueryReport, QueryError> {
        let available = self.store.projects()?;
        let matched_projects = rank_matches(project_query, &available);

        let mut results = Vec::with_capacity(matched_projects.len());
        for project in &matched_projects {
            results.push(self.query_project(project, filter, options));
        }

        Ok(QueryReport {
            matched_projects,
            results,
        })
    }

    fn query_project(&self, project: &str, filter: &str, options: &QueryOptions) -> ProjectResult {
        let records = match self.store.load_snapshot(project) {
            Ok(records) => records,
            Err(e) => {
                warn!(project, error = %e, "Skipping unreadable snapshot");
                return ProjectResult {
                    project: project.to_string(),
                    rows: vec![],
                    warning: Some(e.to_string()),
                };
            }
        };

        let rows = records
            .iter()
            .map(InstanceView::from_instance)
            .filter(|view| record_matches(filter, view))
            .map(|view| match options.mode {
                OutputMode::Table => QueryRow::Table(view),
                OutputMode::Ssh => QueryRow::Ssh(ssh_command(&options.ssh_user, project, &view)),
            })
            .collect();

        ProjectResult {
            project: project.to_string(),
            rows,
            warning: None,
        }
    }
}
