//! waveplot - command-line front end
//!
//! Generates waveplots from local audio files and syncs them with a
//! WavePlot registry. Results are printed to stdout as JSON; logs go to
//! stderr.

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use serde_json::json;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;
use waveplot::{decode, LinkContext, RegistryClient, WavePlot};
use waveplot_common::config::{ClientSettings, Overrides, TomlConfig};

#[derive(Debug, Parser)]
#[command(name = "waveplot", version, about = "Audio fingerprinting and WavePlot registry sync")]
struct Cli {
    /// Registry base URL
    #[arg(long, global = true)]
    server: Option<String>,

    /// Request timeout in seconds
    #[arg(long, global = true)]
    timeout: Option<u64>,

    /// Log filter (e.g. `debug`, `waveplot=trace`)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Generate a waveplot from an audio file
    Generate {
        file: PathBuf,
        /// Print the full summary as JSON
        #[arg(long)]
        json: bool,
    },
    /// Retrieve a waveplot from the registry
    Get { gid: Uuid },
    /// Generate a waveplot and register it
    Upload {
        file: PathBuf,
        /// Editor credential
        #[arg(long)]
        editor: Option<String>,
    },
    /// Link a registered waveplot to release, recording and track
    Link {
        gid: Uuid,
        #[arg(long)]
        release: Uuid,
        #[arg(long)]
        recording: Uuid,
        #[arg(long)]
        track: Uuid,
        #[arg(long)]
        artist_credit: i32,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let overrides = Overrides {
        server_url: cli.server.clone(),
        editor_key: match &cli.command {
            Command::Upload { editor, .. } => editor.clone(),
            _ => None,
        },
        timeout_secs: cli.timeout,
        log_level: cli.log_level.clone(),
    };
    let toml_config = TomlConfig::load_default().context("Failed to load config file")?;
    let settings = ClientSettings::resolve(&overrides, &toml_config)?;

    // RUST_LOG wins over the configured level
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&settings.log_level)
            .with_context(|| format!("Invalid log level: {}", settings.log_level))?,
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    info!("waveplot {}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Command::Generate { file, json } => generate(file, json),
        Command::Get { gid } => get(&settings, gid),
        Command::Upload { file, .. } => upload(&settings, file),
        Command::Link {
            gid,
            release,
            recording,
            track,
            artist_credit,
        } => link(
            &settings,
            gid,
            LinkContext {
                release_gid: release,
                recording_gid: recording,
                track_gid: track,
                artist_credit_id: artist_credit,
            },
        ),
    }
}

/// Generate and derive every local product
fn generate_all(file: &Path) -> Result<WavePlot> {
    let mut waveplot = WavePlot::new();
    waveplot.generate(decode::init(), file)?;
    waveplot.generate_preview()?;
    waveplot.generate_thumbnail()?;
    waveplot.generate_sonic_hash()?;
    Ok(waveplot)
}

fn generate(file: PathBuf, json: bool) -> Result<()> {
    let waveplot = generate_all(&file)?;
    let summary = waveplot.summary();

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!(
            "{}",
            serde_json::to_string_pretty(&json!({
                "path": summary.path,
                "version": summary.version,
                "dr_level": summary.dr_level,
                "columns": summary.columns,
                "content_hash": summary.content_hash,
                "sonic_hash": summary.sonic_hash,
            }))?
        );
    }
    Ok(())
}

fn get(settings: &ClientSettings, gid: Uuid) -> Result<()> {
    let client = RegistryClient::from_settings(settings)?;
    let mut waveplot = WavePlot::new();
    waveplot.get(&client, gid)?;
    waveplot.generate_preview()?;

    println!("{}", serde_json::to_string_pretty(&waveplot.summary())?);
    Ok(())
}

fn upload(settings: &ClientSettings, file: PathBuf) -> Result<()> {
    let editor_key = settings
        .editor_key
        .as_deref()
        .ok_or_else(|| anyhow!("No editor key: pass --editor or set WAVEPLOT_EDITOR_KEY"))?;

    let client = RegistryClient::from_settings(settings)?;
    let mut waveplot = generate_all(&file)?;
    let registration = waveplot.upload(&client, editor_key)?;

    println!(
        "{}",
        serde_json::to_string_pretty(&json!({
            "outcome": registration,
            "waveplot": waveplot.summary(),
        }))?
    );

    registration.into_result()?;
    Ok(())
}

fn link(settings: &ClientSettings, gid: Uuid, context: LinkContext) -> Result<()> {
    let client = RegistryClient::from_settings(settings)?;
    let mut waveplot = WavePlot::new();
    waveplot.get(&client, gid)?;
    waveplot.link(&client, &context)?;

    println!(
        "{}",
        serde_json::to_string_pretty(&json!({
            "linked": gid,
            "context": context,
        }))?
    );
    Ok(())
}
