//! Main entry point for the bootconf CLI application.
//!
//! This binary provides a command-line interface for reading and replacing
//! the boot configuration (and its signing material) embedded in fixed-size
//! firmware release images.

use anyhow::{Context, Result, bail};
use clap::Parser;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::info;
use tracing_subscriber::EnvFilter;

use bootconf::image::{CONFIG_NAME, DIGEST_NAME, PUBKEY_NAME};
use bootconf::{BootHost, Cli, Command, Image, LocalHost, keys};

/// Application entry point.
///
/// Parses command-line arguments, sets up logging, and dispatches to the
/// handler for the selected subcommand.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Log to stderr so piped configuration output stays clean
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let host = LocalHost::new();

    match cli.command {
        Command::Show { output } => show(&host, output.as_deref()).await,
        Command::Extract { image, output } => extract(&image, output.as_deref()).await,
        Command::Write {
            config,
            signature,
            pubkey,
            image,
            output,
        } => {
            write(
                &config,
                signature.as_deref(),
                pubkey.as_deref(),
                &image,
                &output,
            )
            .await
        }
        Command::Apply { config } => {
            let text = tokio::fs::read(&config)
                .await
                .with_context(|| format!("failed to read {}", config.display()))?;
            apply(&host, &text).await
        }
        Command::Edit => edit(&host).await,
    }
}

/// Print the active configuration to stdout or a file.
async fn show(host: &impl BootHost, output: Option<&Path>) -> Result<()> {
    let active = host.read_active_config().await?;
    info!("configuration read from {}", active.source);
    emit(active.text.as_bytes(), output).await
}

/// Print the configuration embedded in a given image.
async fn extract(path: &Path, output: Option<&Path>) -> Result<()> {
    let image = load_image(path).await?;
    let payload = image.read_file(CONFIG_NAME)?;
    emit(payload, output).await
}

/// Build a new image for the `write` command.
///
/// The configuration section is always replaced; when signing material is
/// given (clap enforces that signature and public key come together), the
/// digest and key sections are replaced as well.
async fn write(
    config: &Path,
    signature: Option<&Path>,
    pubkey: Option<&Path>,
    image_path: &Path,
    output: &Path,
) -> Result<()> {
    let mut image = load_image(image_path).await?;

    let text = tokio::fs::read(config)
        .await
        .with_context(|| format!("failed to read {}", config.display()))?;
    image.update_file(CONFIG_NAME, &text)?;

    if let (Some(signature), Some(pubkey)) = (signature, pubkey) {
        let sig = tokio::fs::read(signature)
            .await
            .with_context(|| format!("failed to read {}", signature.display()))?;
        image.update_file(DIGEST_NAME, &sig)?;

        let pem = tokio::fs::read(pubkey)
            .await
            .with_context(|| format!("failed to read {}", pubkey.display()))?;
        let record = keys::import_public_key(&pem)?;
        image.update_file(PUBKEY_NAME, &record)?;
    }

    tokio::fs::write(output, image.as_bytes())
        .await
        .with_context(|| format!("failed to write {}", output.display()))?;
    info!("wrote {}", output.display());
    Ok(())
}

/// Replace the configuration in the latest release image, write the result
/// to a staging path, and hand it to the updater.
async fn apply(host: &impl BootHost, text: &[u8]) -> Result<()> {
    let source = host.resolve_latest_image().await?;
    let mut image = load_image(&source).await?;
    image.update_file(CONFIG_NAME, text)?;

    // The updater owns the staged file from here on; keep it next to the
    // source image so it is still there at next boot
    let staged = staging_path(&source);
    tokio::fs::write(&staged, image.as_bytes())
        .await
        .with_context(|| format!("failed to write {}", staged.display()))?;

    host.schedule_update(&staged).await
}

/// Edit the active configuration in the user's editor, then apply it.
async fn edit(host: &impl BootHost) -> Result<()> {
    let active = host.read_active_config().await?;
    info!("editing configuration from {}", active.source);

    let edited = edit_text(&active.text).await?;
    if edited == active.text {
        eprintln!("Configuration unchanged, nothing to do");
        return Ok(());
    }

    apply(host, edited.as_bytes()).await
}

/// Load and parse a firmware image from disk.
async fn load_image(path: &Path) -> Result<Image> {
    let data = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;
    Image::from_bytes(data).with_context(|| format!("invalid image {}", path.display()))
}

/// Write a payload to stdout or to a file.
async fn emit(payload: &[u8], output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            tokio::fs::write(path, payload)
                .await
                .with_context(|| format!("failed to write {}", path.display()))?;
        }
        None => {
            let mut stdout = tokio::io::stdout();
            stdout.write_all(payload).await?;
            stdout.flush().await?;
        }
    }
    Ok(())
}

/// Round-trip a text through `$EDITOR` (fallback `vi`) via a temp file.
async fn edit_text(text: &str) -> Result<String> {
    let editor = std::env::var("EDITOR").unwrap_or_else(|_| "vi".to_string());

    let file = tempfile::Builder::new()
        .prefix("bootconf-")
        .suffix(".txt")
        .tempfile()
        .context("failed to create temp file")?;
    tokio::fs::write(file.path(), text).await?;

    let status = tokio::process::Command::new(&editor)
        .arg(file.path())
        .status()
        .await
        .with_context(|| format!("failed to launch editor {editor}"))?;
    if !status.success() {
        bail!("editor {editor} exited with {status}");
    }

    Ok(tokio::fs::read_to_string(file.path()).await?)
}

/// Staging path for a finished image: the source path with a `.staged`
/// suffix appended to its file name.
fn staging_path(source: &Path) -> PathBuf {
    let mut name = source.file_name().unwrap_or_default().to_os_string();
    name.push(".staged");
    source.with_file_name(name)
}
