//! Stored server credentials.
//!
//! Servers live in a JSON object keyed by a friendly name, each entry holding
//! the base URL, username and password. The file is only ever readable by its
//! owner. A server the user chose not to save is held in memory as a
//! temporary credential for one session.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};
use std::path::{Path, PathBuf};

use crate::error::{PlayerError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerEntry {
    pub url: String,
    pub username: String,
    pub password: String,
}

pub struct ServerStore {
    path: PathBuf,
    servers: BTreeMap<String, ServerEntry>,
}

impl ServerStore {
    /// Load the store; a missing or unreadable file gives an empty store
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let servers = match fs::read_to_string(&path) {
            Ok(contents) => serde_json::from_str(&contents).unwrap_or_else(|e| {
                log::warn!("Ignoring unreadable server file {}: {e}", path.display());
                BTreeMap::new()
            }),
            Err(_) => BTreeMap::new(),
        };
        Self { path, servers }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(&self.servers)?;
        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(0o600)
            .open(&self.path)?;
        file.write_all(json.as_bytes())?;
        // mode() only applies on creation
        fs::set_permissions(&self.path, fs::Permissions::from_mode(0o600))?;

        log::info!("Saved {} server(s) to {}", self.servers.len(), self.path.display());
        Ok(())
    }

    pub fn add(&mut self, name: &str, entry: ServerEntry) -> Result<()> {
        if self.servers.contains_key(name) {
            return Err(PlayerError::Config(format!(
                "a server named '{name}' already exists"
            )));
        }
        self.servers.insert(name.to_string(), entry);
        Ok(())
    }

    pub fn remove(&mut self, name: &str) -> Option<ServerEntry> {
        self.servers.remove(name)
    }

    pub fn get(&self, name: &str) -> Option<&ServerEntry> {
        self.servers.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.servers.contains_key(name)
    }

    pub fn names(&self) -> Vec<String> {
        self.servers.keys().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ServerEntry)> {
        self.servers.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.servers.is_empty()
    }
}

/// Credentials for the current session
#[derive(Debug, Clone)]
pub enum Credentials {
    Saved { name: String, entry: ServerEntry },
    /// Not written to disk; dropped when the session ends
    Temporary(ServerEntry),
}

impl Credentials {
    pub fn entry(&self) -> &ServerEntry {
        match self {
            Credentials::Saved { entry, .. } | Credentials::Temporary(entry) => entry,
        }
    }

    pub fn display_name(&self) -> &str {
        match self {
            Credentials::Saved { name, .. } => name,
            Credentials::Temporary(_) => "temporary server",
        }
    }

    pub fn is_temporary(&self) -> bool {
        matches!(self, Credentials::Temporary(_))
    }

    /// End the session's hold on these credentials
    pub fn release(self) {
        if let Credentials::Temporary(entry) = self {
            log::info!("Released temporary credentials for {}", entry.url);
        }
    }
}
