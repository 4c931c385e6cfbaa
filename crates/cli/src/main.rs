use clap::Parser;
use color_eyre::config::HookBuilder;
use console::style;
use djupload_core::Overrides;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

mod handlers;
mod wizard;

/// djupload - upload a theme package (or directories) for a project
#[derive(Parser, Debug)]
#[command(name = "djupload")]
#[command(version)]
#[command(about = "Upload a theme package (or directories) for a project", long_about = None)]
struct Cli {
    /// A single zip archive, or one or more directories
    #[arg(required = true, value_name = "FILES|DIRS")]
    paths: Vec<PathBuf>,

    /// Project being managed (defaults to the one recorded for this directory)
    #[arg(long, env = "DJD_PROJECT")]
    project: Option<String>,

    /// Base URL of the project site, e.g. https://mytheme.djaoapp.com
    #[arg(long, env = "DJD_BASE_URL")]
    base_url: Option<String>,

    /// API key used to authenticate the upload
    #[arg(long, env = "DJD_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Credentials file (default: ~/.djd/credentials)
    #[arg(long, env = "DJD_CONFIG", value_name = "PATH")]
    config: Option<PathBuf>,

    /// Give up on the upload after this many seconds
    #[arg(long, env = "DJD_TIMEOUT", value_name = "SECONDS")]
    timeout: Option<u64>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl From<Cli> for handlers::UploadArgs {
    fn from(cli: Cli) -> Self {
        handlers::UploadArgs {
            paths: cli.paths,
            overrides: Overrides {
                project: cli.project,
                base_url: cli.base_url,
                api_key: cli.api_key,
            },
            config: cli.config,
            timeout: cli.timeout.map(Duration::from_secs),
        }
    }
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    // Setup error handling
    if let Err(e) = HookBuilder::default().install() {
        eprintln!("Warning: Failed to install error handler: {}", e);
    }

    // Parse CLI arguments
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match handlers::handle_upload(cli.into()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{} {:#}", style("error:").red().bold(), err);
            eprintln!("usage: djupload [OPTIONS] <FILES|DIRS>...");
            ExitCode::FAILURE
        }
    }
}
