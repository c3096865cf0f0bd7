use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use futures_util::future::join_all;
use serde_json::json;
use tracing::info;

use wado_loader::config::Config;
use wado_loader::{
    logging, DecodeOptions, HttpPixelDataFetcher, InMemoryMetadataStore, LoadHandle,
    RawFrameDecoder, WadoImageLoader,
};

/// Load image frames from a WADO-RS store
#[derive(Debug, Parser)]
#[command(name = "wado-load", version)]
struct Cli {
    /// Loader configuration (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// JSON object mapping imageIds to DICOM JSON metadata
    #[arg(short, long)]
    metadata: PathBuf,

    /// Decoder options as a JSON object
    #[arg(long)]
    options: Option<String>,

    /// Image identifiers, e.g. wadors:https://pacs/studies/.../frames/1
    #[arg(required = true)]
    image_ids: Vec<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => Config::default(),
    };
    logging::init(&config.logging)?;

    let store = InMemoryMetadataStore::new();
    let count = store
        .load_json_file(&cli.metadata)
        .with_context(|| format!("loading metadata {}", cli.metadata.display()))?;
    info!("Registered metadata for {} images", count);

    let options: DecodeOptions = match &cli.options {
        Some(raw) => serde_json::from_str(raw).context("parsing --options")?,
        None => DecodeOptions::default(),
    };

    let fetcher = HttpPixelDataFetcher::from_settings(&config.http)?;
    let loader = WadoImageLoader::new(
        Arc::new(store),
        Arc::new(fetcher),
        Arc::new(RawFrameDecoder::default()),
    )
    .with_settings(&config.loader);

    let handles: Vec<_> = cli
        .image_ids
        .iter()
        .map(|image_id| loader.load(image_id.clone(), options.clone()))
        .collect();
    let results = join_all(handles.into_iter().map(LoadHandle::result)).await;

    let mut failures = 0;
    for (image_id, result) in cli.image_ids.iter().zip(results) {
        let line = match result {
            Ok(loaded) => json!({
                "imageId": image_id,
                "transferSyntax": loaded.image.transfer_syntax,
                "compressed": loaded.image.compressed,
                "sizeInBytes": loaded.image.size_in_bytes,
                "loadTimeInMs": loaded.load_time_in_ms,
            }),
            Err(e) => {
                failures += 1;
                json!({ "imageId": image_id, "stage": e.stage(), "error": e.to_string() })
            }
        };
        println!("{}", line);
    }

    if failures > 0 {
        anyhow::bail!("{} of {} loads failed", failures, cli.image_ids.len());
    }
    Ok(())
}
