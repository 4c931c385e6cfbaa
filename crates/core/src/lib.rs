//! djupload-core - Core library for the djupload CLI
//!
//! This library resolves which project (base URL and API key) the current
//! directory belongs to, keeps those credentials on disk, and packages and
//! uploads theme archives to the project's site.

pub mod archive;
pub mod client;
pub mod credentials;
pub mod error;
pub mod paths;
pub mod resolver;
pub mod upload;

// Re-export commonly used types
pub use archive::{classify, package, probe_archive, ArchiveProbe, PackagedArchive, Payload};
pub use client::{HttpTransport, ThemeResponse, ThemeTransport};
pub use credentials::{
    default_credentials_path, load_credentials, log_credentials, save_credentials,
    CredentialEntry, CredentialStore,
};
pub use error::{Error, Result};
pub use resolver::{
    base_url_for_domain, resolve, resolve_connection, resolve_project, Overrides, Prompt,
    ResolvedConfig, ResolvedConnection, ResolvedProject,
};
pub use upload::{upload, upload_payload, UploadOutcome, UploadRequest};
