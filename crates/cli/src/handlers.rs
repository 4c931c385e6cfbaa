//! Command handlers for djupload CLI

use crate::wizard::TerminalPrompt;
use anyhow::{Context, Result};
use djupload_core::{
    classify, default_credentials_path, load_credentials, log_credentials, resolve,
    save_credentials, upload_payload, HttpTransport, Overrides, UploadRequest,
};
use std::path::PathBuf;
use std::time::Duration;

/// Inputs of an upload, as parsed from the command line
#[derive(Debug)]
pub struct UploadArgs {
    pub paths: Vec<PathBuf>,
    pub overrides: Overrides,
    pub config: Option<PathBuf>,
    pub timeout: Option<Duration>,
}

/// Resolve the project for the current directory, then upload `paths`.
///
/// Paths are validated before anything is prompted for or saved, so a bad
/// invocation leaves the credential file untouched.
pub async fn handle_upload(args: UploadArgs) -> Result<()> {
    let cwd = std::env::current_dir().context("Cannot determine current directory")?;
    let config_path = match args.config {
        Some(path) => path,
        None => default_credentials_path()?,
    };

    println!("read configuration from {}", config_path.display());
    let mut store = load_credentials(&config_path)?;
    log_credentials(&store);

    let payload = classify(&args.paths, &cwd)?;

    let mut prompt = TerminalPrompt::new();
    let config = resolve(&mut store, &args.overrides, &cwd, &mut prompt);
    tracing::info!(project = %config.name, base_url = %config.base_url, "resolved project");

    if config.updated {
        save_credentials(&store, &config_path)?;
        println!("saved configuration in {}", config_path.display());
    }

    let transport = HttpTransport::new(args.timeout)?;
    let request = UploadRequest {
        paths: args.paths,
        prefix: Some(config.name),
        base_url: config.base_url,
        api_key: config.api_key,
    };
    let outcome = upload_payload(&request, &payload, &cwd, &transport).await?;

    println!("{}", outcome);
    if !outcome.is_success() {
        tracing::warn!("theme was not accepted by {}", request.themes_url());
    }
    Ok(())
}
