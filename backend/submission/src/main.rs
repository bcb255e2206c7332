//! Submission CLI entry point.
//!
//! Reads a JSON form file, runs it through the same pipeline the website
//! uses, and prints the resulting `ApiResponse` as JSON on stdout. The mock
//! or real backend is chosen from the environment (`USE_MOCK_API`).

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

use submission::errors::Result;
use submission::types::Attachment;
use submission::{ApiResponse, Config, RawContactForm, RawRegistrationForm, Services};

#[derive(Debug, Parser)]
#[command(name = "submission", version, about = "Submit hackathon forms to the backend")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Submit a contact form.
    Contact {
        /// JSON file with `name`, `email`, `subject` and `message`.
        file: PathBuf,
    },
    /// Submit a team registration.
    Register {
        /// JSON file with the registration form state.
        file: PathBuf,
        /// Supporting document to upload with the registration.
        #[arg(long)]
        attachment: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    // Load optional .env file (ignored if missing) before RUST_LOG is read.
    let _ = dotenvy::dotenv();

    // Logs go to stderr so stdout stays machine-readable.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::from_env().map_err(|e| anyhow::anyhow!("{e}"))?;
    let services = Services::from_config(&config)?;

    let success = match cli.command {
        Command::Contact { file } => {
            let form: RawContactForm = read_form(&file)
                .await
                .with_context(|| format!("loading {}", file.display()))?;
            print_response(&services.contact.submit(&form).await)?
        }
        Command::Register { file, attachment } => {
            let mut form: RawRegistrationForm = read_form(&file)
                .await
                .with_context(|| format!("loading {}", file.display()))?;
            if let Some(path) = attachment {
                let file = read_attachment(&path)
                    .await
                    .with_context(|| format!("reading {}", path.display()))?;
                form.attachment = Some(file);
            }
            print_response(&services.registration.submit(&form).await)?
        }
    };

    Ok(if success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

async fn read_form<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = tokio::fs::read_to_string(path).await?;
    Ok(serde_json::from_str(&raw)?)
}

async fn read_attachment(path: &Path) -> Result<Attachment> {
    let bytes = tokio::fs::read(path).await?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "attachment".to_string());
    info!("Attaching {file_name} ({} bytes)", bytes.len());
    Ok(Attachment {
        mime_type: mime_for(path).to_string(),
        file_name,
        bytes,
    })
}

/// MIME type from the file extension; unknown extensions are left for the
/// validator to reject.
fn mime_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "pdf" => "application/pdf",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        _ => "application/octet-stream",
    }
}

fn print_response<T: Serialize>(response: &ApiResponse<T>) -> anyhow::Result<bool> {
    println!("{}", serde_json::to_string_pretty(response)?);
    Ok(response.success)
}
