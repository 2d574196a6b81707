use cfimage::{ClientConfig, ImageApiClient, OperationResult, Overrides};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "cfimage")]
#[command(about = "Upload, replace and delete images on Cloudflare Images", long_about = None)]
struct Cli {
    /// Cloudflare API token (falls back to the settings file, then CLOUDFLARE_API_KEY)
    #[arg(long, global = true)]
    api_key: Option<String>,

    /// Cloudflare account ID (falls back to the settings file, then CLOUDFLARE_ACCOUNT_ID)
    #[arg(long, global = true)]
    account_id: Option<String>,

    /// Prefix of uploaded file names (falls back to the settings file, then APP_NAME)
    #[arg(long, global = true)]
    app_name: Option<String>,

    /// Settings file (default: CFIMAGE_CONFIG_PATH or ~/.config/cfimage/config.yaml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Request timeout in seconds
    #[arg(long, global = true, value_parser = clap::value_parser!(u64).range(1..))]
    timeout: Option<u64>,

    /// Log requests to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check that the API token is accepted
    Verify,
    /// Obtain a single-use direct upload URL
    UploadUrl,
    /// Upload an image
    Upload {
        /// Image file
        path: PathBuf,
        /// Display name (default: the file name)
        #[arg(short, long)]
        name: Option<String>,
    },
    /// Delete an image
    Delete {
        /// Image ID
        id: String,
    },
    /// Replace an image (delete, then upload)
    Update {
        /// Image ID to replace
        id: String,
        /// New image file
        path: PathBuf,
        /// Display name (default: the file name)
        #[arg(short, long)]
        name: Option<String>,
    },
    /// Show version information
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    // stdout carries the JSON result, logs go to stderr
    let filter = if cli.verbose {
        tracing_subscriber::EnvFilter::new("cfimage=debug")
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("error"))
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();

    if matches!(cli.command, Commands::Version) {
        println!("cfimage {}", env!("CARGO_PKG_VERSION"));
        return Ok(ExitCode::SUCCESS);
    }

    let overrides = Overrides {
        api_key: cli.api_key,
        account_id: cli.account_id,
        app_name: cli.app_name,
        timeout: cli.timeout.map(Duration::from_secs),
    };
    let config = ClientConfig::load(&overrides, cli.config.as_deref())?;
    let client = ImageApiClient::from_config(config)?;

    let (operation, result) = match cli.command {
        Commands::Verify => ("verify", client.verify_credentials().await),
        Commands::UploadUrl => ("upload-url", client.request_upload_target().await),
        Commands::Upload { path, name } => {
            let name = display_name(&path, name)?;
            ("upload", client.upload_image(path, &name).await)
        }
        Commands::Delete { id } => ("delete", client.delete_image(&id).await),
        Commands::Update { id, path, name } => {
            let name = display_name(&path, name)?;
            ("update", client.update_image(&id, path, &name).await)
        }
        // printed before the settings were loaded
        Commands::Version => return Ok(ExitCode::SUCCESS),
    };

    emit(operation, &result)?;

    if result.is_success() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}

/// Display name for an upload: explicit `--name`, else the file name
fn display_name(path: &Path, name: Option<String>) -> anyhow::Result<String> {
    if let Some(name) = name {
        return Ok(name);
    }

    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| anyhow::anyhow!("--name is required for {}", path.display()))
}

/// JSON body on stdout, one-line summary on stderr
fn emit(operation: &str, result: &OperationResult) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(&result.to_json())?);

    match result.error() {
        None => eprintln!(
            "{} {} ({})",
            "✓".green().bold(),
            operation,
            result.status()
        ),
        Some(message) => eprintln!(
            "{} {} failed ({}): {}",
            "✗".red().bold(),
            operation,
            result.status(),
            message.red()
        ),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name_defaults_to_file_name() {
        let name = display_name(Path::new("/tmp/photos/cat.jpg"), None).unwrap();
        assert_eq!(name, "cat.jpg");
    }

    #[test]
    fn test_display_name_explicit() {
        let name = display_name(Path::new("/tmp/cat.jpg"), Some("avatar.jpg".to_string())).unwrap();
        assert_eq!(name, "avatar.jpg");
    }

    #[test]
    fn test_display_name_requires_file_name() {
        assert!(display_name(Path::new("/"), None).is_err());
    }
}
