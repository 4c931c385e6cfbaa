//! Credential store for djupload
//!
//! Maps a project name to the local directory it was last used from, the
//! base URL of its site and the API key used to authenticate uploads.
//! Persisted as one TOML table per project.

use crate::error::{Error, Result};
use dirs::home_dir;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Configuration directory name, relative to the home directory
const CONFIG_DIR: &str = ".djd";

/// Credentials file name
const CREDENTIALS_FILE: &str = "credentials";

/// Connection details recorded for one project
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialEntry {
    /// Working directory last associated with the project
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub src_path: Option<PathBuf>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

impl CredentialEntry {
    /// Stored base URL, if any. An empty string counts as absent.
    pub fn base_url(&self) -> Option<&str> {
        non_empty(self.base_url.as_deref())
    }

    /// Stored API key, if any. An empty string counts as absent.
    pub fn api_key(&self) -> Option<&str> {
        non_empty(self.api_key.as_deref())
    }

    pub fn src_path(&self) -> Option<&Path> {
        self.src_path
            .as_deref()
            .filter(|path| !path.as_os_str().is_empty())
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

/// All known projects, keyed by (case-sensitive) project name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CredentialStore {
    projects: BTreeMap<String, CredentialEntry>,
}

impl CredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, project: &str) -> Option<&CredentialEntry> {
        self.projects.get(project)
    }

    /// Entry for `project`, created empty if it does not exist yet.
    pub fn entry_mut(&mut self, project: &str) -> &mut CredentialEntry {
        self.projects.entry(project.to_string()).or_default()
    }

    pub fn insert(&mut self, project: impl Into<String>, entry: CredentialEntry) {
        self.projects.insert(project.into(), entry);
    }

    /// Projects in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &CredentialEntry)> {
        self.projects.iter().map(|(name, entry)| (name.as_str(), entry))
    }

    pub fn len(&self) -> usize {
        self.projects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
    }
}

/// Get the default credentials file path (`~/.djd/credentials`)
pub fn default_credentials_path() -> Result<PathBuf> {
    let home =
        home_dir().ok_or_else(|| Error::Config("Cannot determine home directory".to_string()))?;
    Ok(home.join(CONFIG_DIR).join(CREDENTIALS_FILE))
}

/// Load the credential store from `path`.
///
/// A missing file yields an empty store.
pub fn load_credentials(path: &Path) -> Result<CredentialStore> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "no credential file, starting empty");
        return Ok(CredentialStore::new());
    }

    let content = fs::read_to_string(path)?;

    let store: CredentialStore = toml::from_str(&content).map_err(|e| Error::InvalidConfig {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    tracing::debug!(path = %path.display(), projects = store.len(), "loaded credentials");
    Ok(store)
}

/// Save the credential store to `path`, creating the parent directory if missing
pub fn save_credentials(store: &CredentialStore, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        if !parent.exists() {
            fs::create_dir_all(parent).map_err(|e| {
                io::Error::new(
                    e.kind(),
                    format!("Failed to create directory {}: {}", parent.display(), e),
                )
            })?;
        }
    }

    let content = toml::to_string_pretty(store)?;

    fs::write(path, content).map_err(|e| {
        io::Error::new(
            e.kind(),
            format!("Failed to write credential file {}: {}", path.display(), e),
        )
    })?;

    // API keys live here: read/write for owner only
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = fs::metadata(path)?.permissions();
        perms.set_mode(0o600);
        fs::set_permissions(path, perms)?;
    }

    tracing::info!(path = %path.display(), "saved credentials");
    Ok(())
}

/// Dump the store at debug level, masking every `*_key` value.
pub fn log_credentials(store: &CredentialStore) {
    for (project, entry) in store.iter() {
        tracing::debug!("[{}]", project);
        let src_path = entry
            .src_path
            .as_ref()
            .map(|p| p.display().to_string());
        let fields = [
            ("src_path", src_path.as_deref()),
            ("base_url", entry.base_url.as_deref()),
            ("api_key", entry.api_key.as_deref()),
        ];
        for (key, value) in fields {
            if let Some(value) = value {
                tracing::debug!("{} = {}", key, mask_value(key, value));
            }
        }
    }
}

fn mask_value<'a>(key: &str, value: &'a str) -> &'a str {
    if key.ends_with("_key") {
        "*****"
    } else {
        value
    }
}
