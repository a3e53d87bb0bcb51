//! The `sprig identify` command.

use anyhow::Context;
use clap::{Args, ValueEnum};
use serde::Serialize;
use sprig_core::{Config, ErrorPayload, IdentifyRequest, Identifier, UploadedImage};
use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Arguments for the `identify` command.
#[derive(Args, Debug)]
pub struct IdentifyArgs {
    /// Photos of the plant (JPEG, PNG, WebP, ...)
    #[arg(required = true)]
    pub images: Vec<PathBuf>,

    /// Organ shown in each photo, in photo order (repeatable)
    #[arg(long = "organ", value_enum)]
    pub organs: Vec<Organ>,

    /// Ask Pl@ntNet to return candidates even for non-plant photos
    #[arg(long)]
    pub no_reject: bool,

    /// Never run the captioning fallback
    #[arg(long)]
    pub no_boost: bool,

    /// Maximum concurrent caption requests
    #[arg(short, long)]
    pub parallel: Option<usize>,

    /// Write the result to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Pretty-print JSON output
    #[arg(long)]
    pub pretty: bool,
}

/// Plant organs understood by Pl@ntNet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Organ {
    Leaf,
    Flower,
    Fruit,
    Bark,
    Habit,
    Other,
    Auto,
}

impl fmt::Display for Organ {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Organ::Leaf => "leaf",
            Organ::Flower => "flower",
            Organ::Fruit => "fruit",
            Organ::Bark => "bark",
            Organ::Habit => "habit",
            Organ::Other => "other",
            Organ::Auto => "auto",
        };
        f.write_str(name)
    }
}

/// Execute the identify command.
pub async fn execute(args: IdentifyArgs, mut config: Config) -> anyhow::Result<()> {
    apply_overrides(&mut config, &args);
    let pretty = args.pretty || config.output.pretty;

    if args.organs.len() > args.images.len() {
        tracing::warn!(
            "{} organ tags given for {} photos; extra tags are ignored",
            args.organs.len(),
            args.images.len()
        );
    }

    let identifier = Identifier::from_config(&config)?;
    if !identifier.fallback_available() {
        tracing::debug!("Running without captioning fallback");
    }

    let uploads = load_uploads(&args.images).await?;
    let request = IdentifyRequest::new(uploads)
        .with_organs(args.organs.iter().map(Organ::to_string))
        .with_no_reject(args.no_reject);

    match identifier.identify(&request).await {
        Ok(result) => {
            write_json(&result, args.output.as_deref(), pretty)?;
            Ok(())
        }
        Err(e) => {
            let payload = ErrorPayload::from(&e);
            write_json(&payload, args.output.as_deref(), pretty)?;
            anyhow::bail!("Identification failed ({}): {e}", payload.status_code)
        }
    }
}

fn apply_overrides(config: &mut Config, args: &IdentifyArgs) {
    if args.no_boost {
        config.boost.enabled = false;
    }
    if let Some(parallel) = args.parallel {
        config.boost.parallel = parallel;
    }
}

/// Read every photo from disk, keeping argument order.
async fn load_uploads(paths: &[PathBuf]) -> anyhow::Result<Vec<UploadedImage>> {
    let mut uploads = Vec::with_capacity(paths.len());
    for path in paths {
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        uploads.push(UploadedImage::new(filename, bytes));
    }
    Ok(uploads)
}

fn write_json<T: Serialize>(value: &T, output: Option<&Path>, pretty: bool) -> anyhow::Result<()> {
    let json = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };

    match output {
        Some(path) => {
            std::fs::write(path, format!("{json}\n"))
                .with_context(|| format!("Failed to write {}", path.display()))?;
            tracing::info!("Result written to {}", path.display());
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            writeln!(stdout, "{json}")?;
        }
    }
    Ok(())
}
