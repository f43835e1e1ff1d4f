//! hooktrend - Hooktheory chord trend harvester
//!
//! Subcommands:
//! - `harvest`: collect songs for generated chord progressions into a CSV file
//! - `chords`: list base chord probabilities and their entropy
//! - `next`: show the most likely chords after a progression and songs using it

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::info;

use hooktrend::config::{resolve_credentials, Credentials, HarvestOverrides};
use hooktrend::output;
use hooktrend::services::page_fetch::classify;
use hooktrend::services::{
    chord_stats, HarvestSettings, Harvester, HooktheoryClient, PageResponse, Progressions,
    SongSource, TokioSleeper,
};
use hooktrend_common::config::{HarvestConfig, TomlConfig};
use hooktrend_common::logging::{init_tracing, log_config_source};

/// Command-line arguments for hooktrend
#[derive(Parser, Debug)]
#[command(name = "hooktrend")]
#[command(about = "Harvest chord progression trends and songs from the Hooktheory API")]
#[command(version)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Hooktheory username
    #[arg(long, global = true, env = "HOOKTHEORY_USERNAME")]
    username: Option<String>,

    /// Hooktheory password
    #[arg(long, global = true, env = "HOOKTHEORY_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Collect songs for generated progressions and write them to CSV
    Harvest(HarvestArgs),

    /// List base chords with their probabilities and the source entropy
    Chords,

    /// Show the most probable next chords after a progression
    Next {
        /// Progression as comma-separated chord ids, e.g. "4,1"
        progression: String,

        /// How many chords and songs to show
        #[arg(short, long, default_value = "3")]
        limit: usize,
    },
}

#[derive(Args, Debug)]
struct HarvestArgs {
    /// Stop after this many unique songs
    #[arg(long)]
    target: Option<usize>,

    /// Number of most probable chords used to build progressions
    #[arg(long)]
    top_n: Option<usize>,

    /// Stop after trying this many progressions
    #[arg(long)]
    max_progressions: Option<usize>,

    /// CSV output file
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = TomlConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    init_tracing(&config.logging).context("Failed to initialize logging")?;
    log_config_source(&config);

    info!("Starting hooktrend {}", env!("CARGO_PKG_VERSION"));

    let credentials = resolve_credentials(cli.username, cli.password, &config.credentials)?;

    match cli.command {
        Command::Harvest(args) => {
            let overrides = HarvestOverrides {
                target_song_count: args.target,
                top_n: args.top_n,
                max_progressions: args.max_progressions,
                output: args.output,
            };
            let harvest_config = overrides.apply(config.harvest)?;
            let client = connect(&config.api.base_url, &credentials).await?;
            harvest(client, harvest_config).await
        }
        Command::Chords => {
            let client = connect(&config.api.base_url, &credentials).await?;
            chords(&client).await
        }
        Command::Next { progression, limit } => {
            let client = connect(&config.api.base_url, &credentials).await?;
            next(&client, &progression, limit).await
        }
    }
}

/// Authenticate, aborting the run if credentials are rejected
async fn connect(base_url: &str, credentials: &Credentials) -> Result<HooktheoryClient> {
    let client =
        HooktheoryClient::authenticate(base_url, &credentials.username, &credentials.password)
            .await
            .context("Error during authentication")?;
    println!("Authentication successful. Retrieved Bearer token.\n");
    Ok(client)
}

async fn harvest(client: HooktheoryClient, config: HarvestConfig) -> Result<()> {
    let nodes = client
        .chord_nodes(None)
        .await
        .context("Error retrieving base chords")?;
    println!("Total base chords retrieved: {}", nodes.len());

    let top = chord_stats::top_chords(&nodes, config.top_n);
    println!("Using top {} chords for progression generation:", top.len());
    for chord in &top {
        println!(
            "  {} (ID: {}, p: {})",
            chord.display_name(),
            chord.chord_id,
            chord.probability
        );
    }
    println!();

    let candidates = chord_stats::chord_ids(&top);
    let progressions = Progressions::new(&candidates, config.progression_length);
    info!(
        candidates = candidates.len(),
        length = config.progression_length,
        total = ?progressions.total(),
        target = config.target_song_count,
        "Starting song retrieval from generated progressions"
    );

    let harvester = Harvester::new(client, TokioSleeper, HarvestSettings::from_config(&config));
    let report = harvester.run(progressions).await;

    if report.target_reached {
        println!("Target reached!");
    } else {
        println!("Finished trying all candidate progressions.");
    }
    println!("\nTotal progressions tried: {}", report.progressions_tried);
    println!(
        "Progressions stopped early: {}",
        report.progressions_stopped
    );
    println!(
        "Final total unique songs retrieved: {}",
        report.songs.len()
    );

    output::write_songs_csv(&config.output, report.songs.iter())
        .with_context(|| format!("Error writing to CSV file {}", config.output.display()))?;
    println!("\nSong data saved to {}", config.output.display());

    Ok(())
}

async fn chords(client: &HooktheoryClient) -> Result<()> {
    let nodes = client
        .chord_nodes(None)
        .await
        .context("Error retrieving base chords")?;

    println!("Total number of base chords: {}", nodes.len());
    println!("\nChord Probabilities:");
    for node in &nodes {
        println!("  {}: {}", node.display_name(), node.probability);
    }
    println!(
        "\nEntropy of the chord source: {:.4} bits",
        chord_stats::entropy(&nodes)
    );

    Ok(())
}

async fn next(client: &HooktheoryClient, progression: &str, limit: usize) -> Result<()> {
    let nodes = client
        .chord_nodes(Some(progression))
        .await
        .with_context(|| format!("Error retrieving chords after {}", progression))?;

    println!("Next chords after {}:", progression);
    for chord in chord_stats::top_chords(&nodes, limit) {
        println!("  {}: {:.1}%", chord.display_name(), chord.probability * 100.0);
    }

    println!("\nSongs with this progression:");
    match classify(progression, client.fetch_song_page(progression, 1).await) {
        PageResponse::Songs(songs) => {
            for song in songs.iter().take(limit) {
                println!("  {} - {} ({})", song.artist, song.title, song.section);
            }
        }
        PageResponse::Empty => println!("  (none)"),
        PageResponse::RateLimited { retry_after } => {
            anyhow::bail!("Rate limited by Hooktheory, retry after {:?}", retry_after)
        }
        PageResponse::Malformed(detail) | PageResponse::Failed(detail) => {
            anyhow::bail!("Song search failed: {}", detail)
        }
    }

    Ok(())
}
