//! Project resolution
//!
//! Works out which project the current directory belongs to, then the base
//! URL and API key used to reach it. Values come from explicit overrides
//! first, then the credential store, then the operator. Anything learned
//! from the operator is written back into the store, but a value already
//! present in the store is never replaced.

use crate::credentials::CredentialStore;
use crate::paths::same_directory;
use std::path::Path;

/// Domain under which projects are hosted by default
pub const DEFAULT_DOMAIN_SUFFIX: &str = "djaoapp.com";

/// Where operators can learn how to create an API key
const API_KEYS_HELP_URL: &str = "https://www.djaodjin.com/docs/faq/#api-keys";

/// Source of answers for values the resolver cannot find on its own.
pub trait Prompt {
    /// Ask a question and return the (possibly empty) answer.
    fn ask(&mut self, question: &str) -> String;

    /// Ask for a secret. The answer should not be echoed.
    fn ask_secret(&mut self, question: &str) -> String {
        self.ask(question)
    }
}

/// Values supplied explicitly on the command line
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides {
    pub project: Option<String>,
    pub base_url: Option<String>,
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedProject {
    pub name: String,
    pub updated: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedConnection {
    pub base_url: String,
    pub api_key: String,
    pub updated: bool,
}

/// Outcome of a full resolution. `updated` is set when the store was
/// modified and needs saving.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedConfig {
    pub name: String,
    pub base_url: String,
    pub api_key: String,
    pub updated: bool,
}

/// Resolve project name, base URL and API key for `cwd`.
pub fn resolve(
    store: &mut CredentialStore,
    overrides: &Overrides,
    cwd: &Path,
    prompt: &mut dyn Prompt,
) -> ResolvedConfig {
    let project = resolve_project(store, overrides.project.as_deref(), cwd, prompt);
    let connection = resolve_connection(
        store,
        &project.name,
        overrides.base_url.as_deref(),
        overrides.api_key.as_deref(),
        prompt,
    );

    ResolvedConfig {
        name: project.name,
        base_url: connection.base_url,
        api_key: connection.api_key,
        updated: project.updated || connection.updated,
    }
}

/// Determine the project name and make sure its `src_path` points at `cwd`.
pub fn resolve_project(
    store: &mut CredentialStore,
    project: Option<&str>,
    cwd: &Path,
    prompt: &mut dyn Prompt,
) -> ResolvedProject {
    let name = match project.filter(|name| !name.is_empty()) {
        Some(name) => name.to_string(),
        None => match project_at(store, cwd) {
            Some(name) => name,
            None => ask_project_name(cwd, prompt),
        },
    };

    let mut updated = false;
    let entry = store.entry_mut(&name);
    let up_to_date = entry
        .src_path()
        .map_or(false, |src_path| same_directory(src_path, cwd));
    if !up_to_date {
        tracing::debug!(project = %name, cwd = %cwd.display(), "recording source path");
        entry.src_path = Some(cwd.to_path_buf());
        updated = true;
    }

    ResolvedProject { name, updated }
}

/// Determine base URL and API key for `project`.
pub fn resolve_connection(
    store: &mut CredentialStore,
    project: &str,
    base_url: Option<&str>,
    api_key: Option<&str>,
    prompt: &mut dyn Prompt,
) -> ResolvedConnection {
    let mut updated = false;
    let entry = store.entry_mut(project);

    let base_url = match explicit(base_url).or(entry.base_url()) {
        Some(base_url) => base_url.to_string(),
        None => ask_base_url(project, prompt),
    };
    if entry.base_url().is_none() {
        entry.base_url = Some(base_url.clone());
        updated = true;
    }

    let api_key = match explicit(api_key).or(entry.api_key()) {
        Some(api_key) => api_key.to_string(),
        None => prompt.ask_secret(&format!(
            "Please enter an API Key for {}\n(see {} for help)",
            base_url, API_KEYS_HELP_URL
        )),
    };
    if entry.api_key().is_none() {
        entry.api_key = Some(api_key.clone());
        updated = true;
    }

    ResolvedConnection {
        base_url,
        api_key,
        updated,
    }
}

/// Base URL for a domain typed by the operator. Local addresses are reached
/// over plain http.
pub fn base_url_for_domain(domain: &str) -> String {
    if domain.starts_with("http://") || domain.starts_with("https://") {
        return domain.trim_end_matches('/').to_string();
    }
    if domain.contains("localhost") || domain.contains("127.0.0.1") {
        format!("http://{}", domain)
    } else {
        format!("https://{}", domain)
    }
}

fn explicit(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// First project (in name order) whose `src_path` is `cwd`.
fn project_at(store: &CredentialStore, cwd: &Path) -> Option<String> {
    let matches: Vec<&str> = store
        .iter()
        .filter(|(_, entry)| {
            entry
                .src_path()
                .map_or(false, |src_path| same_directory(src_path, cwd))
        })
        .map(|(name, _)| name)
        .collect();

    if matches.len() > 1 {
        tracing::warn!(
            "{} projects share source path {}: {}; using '{}'",
            matches.len(),
            cwd.display(),
            matches.join(", "),
            matches[0]
        );
    }
    matches.first().map(|name| name.to_string())
}

fn ask_project_name(cwd: &Path, prompt: &mut dyn Prompt) -> String {
    let default = cwd
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let answer = prompt.ask(&format!(
        "Please enter the name of the project.\n\
         By default a project is hosted at *project*.{}\n\
         (project defaults to {})",
        DEFAULT_DOMAIN_SUFFIX, default
    ));
    explicit(Some(answer.as_str())).map_or(default, str::to_string)
}

fn ask_base_url(project: &str, prompt: &mut dyn Prompt) -> String {
    let default = format!("{}.{}", project, DEFAULT_DOMAIN_SUFFIX);
    let answer = prompt.ask(&format!(
        "Please enter the domain for project '{}'\n(default to: {})",
        project, default
    ));
    let domain = explicit(Some(answer.as_str())).unwrap_or(default.as_str());
    base_url_for_domain(domain)
}
