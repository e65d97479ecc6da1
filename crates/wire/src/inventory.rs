//! Fleet inventory: the controller's list of agents plus shared credentials.
//!
//! Format is YAML, per `spec.md` §6.3.

use std::path::Path;

use serde::{Deserialize, Serialize};

fn default_port() -> u16 {
    8081
}

/// One agent entry in the inventory.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClientEntry {
    pub name: String,
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl ClientEntry {
    /// Base URL for this agent, e.g. `http://host:port`.
    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}

/// The fleet inventory: a shared bearer token plus an ordered, name-unique
/// list of agents.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Inventory {
    pub token: String,
    pub clients: Vec<ClientEntry>,
}

/// Errors loading or validating an inventory file.
#[derive(Debug, thiserror::Error)]
pub enum InventoryError {
    #[error("failed to read inventory file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse inventory YAML: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("duplicate client name in inventory: {0}")]
    DuplicateName(String),
}

impl Inventory {
    /// Load and validate an inventory file from disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, InventoryError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| InventoryError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let inv: Inventory = serde_yaml::from_str(&raw)?;
        inv.validate()?;
        Ok(inv)
    }

    fn validate(&self) -> Result<(), InventoryError> {
        let mut seen = std::collections::HashSet::new();
        for client in &self.clients {
            if !seen.insert(client.name.as_str()) {
                return Err(InventoryError::DuplicateName(client.name.clone()));
            }
        }
        Ok(())
    }

    /// Restrict the inventory to the named clients, preserving inventory
    /// order. `spec.md` §4.2: "Inventory filter matching no clients prints a
    /// warning and performs no network calls" — the caller is responsible
    /// for that warning; this just returns the (possibly empty) filtered
    /// list.
    pub fn filtered(&self, names: Option<&str>) -> Vec<ClientEntry> {
        match names {
            None => self.clients.clone(),
            Some(list) => {
                let allowed: std::collections::HashSet<&str> =
                    list.split(',').map(str::trim).filter(|s| !s.is_empty()).collect();
                self.clients
                    .iter()
                    .filter(|c| allowed.contains(c.name.as_str()))
                    .cloned()
                    .collect()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(contents: &str) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        f
    }

    #[test]
    fn loads_inventory_with_default_port() {
        let f = write_temp(
            "token: secret\nclients:\n  - { name: rig-a, host: 10.0.0.1 }\n  - { name: rig-b, host: 10.0.0.2, port: 9000 }\n",
        );
        let inv = Inventory::load(f.path()).unwrap();
        assert_eq!(inv.token, "secret");
        assert_eq!(inv.clients[0].port, 8081);
        assert_eq!(inv.clients[1].port, 9000);
    }

    #[test]
    fn rejects_duplicate_names() {
        let f = write_temp(
            "token: secret\nclients:\n  - { name: rig-a, host: 10.0.0.1 }\n  - { name: rig-a, host: 10.0.0.2 }\n",
        );
        assert!(matches!(
            Inventory::load(f.path()),
            Err(InventoryError::DuplicateName(_))
        ));
    }

    #[test]
    fn filter_restricts_to_named_clients_preserving_order() {
        let inv = Inventory {
            token: "t".into(),
            clients: vec![
                ClientEntry { name: "a".into(), host: "h1".into(), port: 8081 },
                ClientEntry { name: "b".into(), host: "h2".into(), port: 8081 },
                ClientEntry { name: "c".into(), host: "h3".into(), port: 8081 },
            ],
        };
        let filtered = inv.filtered(Some("c,a"));
        let names: Vec<&str> = filtered.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["a", "c"]);
    }

    #[test]
    fn filter_none_returns_all() {
        let inv = Inventory {
            token: "t".into(),
            clients: vec![ClientEntry { name: "a".into(), host: "h1".into(), port: 8081 }],
        };
        assert_eq!(inv.filtered(None).len(), 1);
    }

    #[test]
    fn filter_matching_nothing_returns_empty() {
        let inv = Inventory {
            token: "t".into(),
            clients: vec![ClientEntry { name: "a".into(), host: "h1".into(), port: 8081 }],
        };
        assert!(inv.filtered(Some("zzz")).is_empty());
    }
}
