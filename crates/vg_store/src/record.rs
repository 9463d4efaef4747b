//! VM record types for snapshot content.
//!
//! The field layout mirrors the inventory tool's native JSON output and must
//! stay byte-compatible with it: snapshots are captured verbatim and parsed
//! only on the query path.

use serde::{Deserialize, Serialize};

/// One virtual machine, as listed by the inventory tool
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Instance {
    pub name: String,

    pub status: String,

    /// Full resource path; only the final segment is the short zone name
    pub zone: String,

    #[serde(rename = "networkInterfaces")]
    pub network_interfaces: Vec<NetworkInterface>,

    pub tags: Tags,
}

/// One network interface on an instance
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkInterface {
    /// Full resource path; only the final segment is the short network name
    pub network: String,

    /// Internal address
    #[serde(rename = "networkIP")]
    pub network_ip: String,

    /// Carried through for format compatibility, unused in matching
    pub subnetwork: String,

    /// Zero or more external address assignments
    #[serde(rename = "accessConfigs")]
    pub access_configs: Vec<AccessConfig>,
}

/// External address assignment on an interface
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccessConfig {
    #[serde(rename = "natIP")]
    pub nat_ip: String,
}

/// Free-form instance labels
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tags {
    pub items: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_uses_tool_field_names() {
        let raw = r#"{
            "name": "db1",
            "status": "RUNNING",
            "zone": "projects/p/zones/us-central1-a",
            "networkInterfaces": [
                {"network": "n", "networkIP": "10.0.0.2", "subnetwork": "s",
                 "accessConfigs": [{"natIP": "1.2.3.4"}]}
            ],
            "tags": {"items": ["db"]}
        }"#;
        let vm: Instance = serde_json::from_str(raw).unwrap();
        assert_eq!(vm.network_interfaces[0].network_ip, "10.0.0.2");
        assert_eq!(vm.network_interfaces[0].access_configs[0].nat_ip, "1.2.3.4");
    }

    #[test]
    fn test_missing_optional_blocks_default() {
        let vm: Instance = serde_json::from_str(r#"{"name": "bare"}"#).unwrap();
        assert_eq!(vm.name, "bare");
        assert!(vm.status.is_empty());
        assert!(vm.network_interfaces.is_empty());
        assert!(vm.tags.items.is_empty());
    }

    #[test]
    fn test_serialize_round_trip() {
        let vm = Instance {
            name: "web1".to_string(),
            status: "RUNNING".to_string(),
            zone: "projects/p/zones/z".to_string(),
            network_interfaces: vec![NetworkInterface {
                network: "projects/p/global/networks/default".to_string(),
                network_ip: "10.0.0.9".to_string(),
                subnetwork: "sub".to_string(),
                access_configs: vec![],
            }],
            tags: Tags::default(),
        };
        let json = serde_json::to_string(&vm).unwrap();
        let back: Instance = serde_json::from_str(&json).unwrap();
        assert_eq!(back, vm);
    }
}
