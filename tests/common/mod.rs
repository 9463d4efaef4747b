//! Common test utilities for vmgrep integration tests.
//!
//! This module provides:
//! - Tracing initialization for test output
//! - Canned inventory-tool JSON fixtures
//! - A canned InventorySource for driving refreshes without the real tool

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Once;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};
use vg_collect::{CollectError, InventorySource};

static INIT: Once = Once::new();

/// Initialize tracing once for integration tests.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        tracing_subscriber::registry()
            .with(fmt::layer())
            .with(filter)
            .init();
    });
}

// =============================================================================
// Inventory-tool JSON fixtures
// =============================================================================

/// Sample instances listing: one richly-populated record and one minimal one
pub const INSTANCES_FIXTURE: &str = r#"[
    {
        "name": "db1",
        "status": "RUNNING",
        "zone": "projects/fixture/zones/us-central1-a",
        "networkInterfaces": [
            {
                "network": "projects/fixture/global/networks/default",
                "networkIP": "10.0.0.2",
                "subnetwork": "projects/fixture/regions/us-central1/subnetworks/default",
                "accessConfigs": [
                    {"natIP": "1.1.1.1"},
                    {"natIP": "2.2.2.2"}
                ]
            },
            {
                "network": "projects/fixture/global/networks/dmz",
                "networkIP": "10.1.0.2",
                "subnetwork": "projects/fixture/regions/us-central1/subnetworks/dmz",
                "accessConfigs": [
                    {"natIP": "3.3.3.3"}
                ]
            }
        ],
        "tags": {"items": ["db", "prod"]}
    },
    {
        "name": "web1",
        "status": "TERMINATED",
        "zone": "projects/fixture/zones/europe-west1-b",
        "networkInterfaces": [
            {
                "network": "projects/fixture/global/networks/default",
                "networkIP": "10.0.0.9",
                "subnetwork": "projects/fixture/regions/europe-west1/subnetworks/default"
            }
        ]
    }
]"#;

/// Listing for a project with no instances
pub const EMPTY_FIXTURE: &str = "[]";

/// Canned inventory source keyed by project ID.
///
/// Unknown projects fail the way a bad credential or missing project does,
/// so partial-failure behavior can be exercised.
pub struct FixtureSource {
    listings: HashMap<String, String>,
}

impl FixtureSource {
    pub fn new(listings: &[(&str, &str)]) -> Self {
        Self {
            listings: listings
                .iter()
                .map(|(p, raw)| (p.to_string(), raw.to_string()))
                .collect(),
        }
    }
}

#[async_trait]
impl InventorySource for FixtureSource {
    async fn list_instances(&self, project: &str) -> Result<String, CollectError> {
        self.listings
            .get(project)
            .cloned()
            .ok_or_else(|| CollectError::Exec(format!("project not accessible: {project}")))
    }

    async fn discover_projects(&self) -> Result<Vec<String>, CollectError> {
        let mut projects: Vec<String> = self.listings.keys().cloned().collect();
        projects.sort();
        Ok(projects)
    }
}
