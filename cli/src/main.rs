/*
    playlist-remix | Rust CLI tool to filter and merge Spotify playlists.
    Copyright (C) 2025  Israel Alberto Roldan Vega

    This program is free software: you can redistribute it and/or modify
    it under the terms of the GNU Affero General Public License as published
    by the Free Software Foundation, either version 3 of the License, or
    (at your option) any later version.

    This program is distributed in the hope that it will be useful,
    but WITHOUT ANY WARRANTY; without even the implied warranty of
    MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
    GNU Affero General Public License for more details.

    You should have received a copy of the GNU Affero General Public License
    along with this program.  If not, see <https://www.gnu.org/licenses/>.
*/

use anyhow::Context;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use clap::{Args, Parser, Subcommand};
use dotenvy::dotenv;
use log::warn;
use remix_core::{
    get_spotify_client, ConversionReport, FilterOptions, MusicService, PlaylistConverter,
    PlaylistCreationOptions, SpotifyService,
};
use serde::Serialize;
use std::error::Error;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process;

// Spotify rejects cover uploads above 256 KB of base64 payload.
const MAX_COVER_BASE64_BYTES: usize = 256 * 1024;

#[derive(Parser)]
#[command(name = "playlist-remix")]
#[command(about = "Derive new Spotify playlists by filtering and merging existing ones", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Lists all your playlists with their IDs
    List,
    /// Shows the artists and decades in one or more playlists, to help pick exclusions
    Inspect {
        /// Spotify playlist IDs or URIs
        #[arg(value_name = "PLAYLIST_ID", required = true)]
        playlist_ids: Vec<String>,
        /// Output the insights to a JSON file
        #[arg(long)]
        json: Option<String>,
    },
    /// Creates a filtered copy of a playlist
    Convert {
        /// The Spotify ID of the source playlist
        #[arg(value_name = "PLAYLIST_ID")]
        playlist_id: String,
        #[command(flatten)]
        target: TargetArgs,
    },
    /// Merges several playlists into a new one, removing duplicate tracks
    Merge {
        /// The Spotify IDs of the playlists to merge
        #[arg(value_name = "PLAYLIST_ID", num_args = 2.., required = true)]
        playlist_ids: Vec<String>,
        #[command(flatten)]
        target: TargetArgs,
    },
}

#[derive(Args)]
struct TargetArgs {
    /// Name of the playlist to create
    #[arg(long, short = 'n')]
    name: String,
    /// Description of the playlist to create
    #[arg(long, short = 'd')]
    description: Option<String>,
    /// Make the new playlist public (private by default)
    #[arg(long)]
    public: bool,
    /// Leave out tracks flagged as explicit
    #[arg(long)]
    exclude_explicit: bool,
    /// Leave out tracks by this artist ID (repeatable)
    #[arg(long = "exclude-artist", value_name = "ARTIST_ID")]
    exclude_artists: Vec<String>,
    /// Leave out tracks released in this decade, e.g. 1990s (repeatable)
    #[arg(long = "exclude-decade", value_name = "DECADE", value_parser = parse_decade)]
    exclude_decades: Vec<String>,
    /// JPEG file to use as the playlist cover
    #[arg(long, value_name = "FILE")]
    cover: Option<PathBuf>,
    /// Output the detailed report to a JSON file
    #[arg(long)]
    json: Option<String>,
}

impl TargetArgs {
    fn filters(&self) -> FilterOptions {
        FilterOptions::new()
            .exclude_explicit(self.exclude_explicit)
            .exclude_artists(self.exclude_artists.iter().cloned())
            .exclude_decades(self.exclude_decades.iter().cloned())
    }

    fn creation_options(&self) -> anyhow::Result<PlaylistCreationOptions> {
        let image_base64 = match &self.cover {
            Some(path) => Some(read_cover(path)?),
            None => None,
        };
        Ok(PlaylistCreationOptions {
            name: self.name.clone(),
            description: self.description.clone(),
            is_public: self.public,
            image_base64,
        })
    }
}

/// Accepts decade keys such as "1990s".
fn parse_decade(value: &str) -> Result<String, String> {
    let year = value
        .strip_suffix('s')
        .filter(|y| y.len() == 4 && y.chars().all(|c| c.is_ascii_digit()))
        .ok_or_else(|| format!("'{}' is not a decade like 1990s", value))?;
    if !year.ends_with('0') {
        return Err(format!("'{}' does not start on a decade boundary", value));
    }
    Ok(value.to_string())
}

fn read_cover(path: &Path) -> anyhow::Result<String> {
    let bytes = fs::read(path)
        .with_context(|| format!("Failed to read cover image '{}'", path.display()))?;
    let encoded = STANDARD.encode(bytes);
    if encoded.len() > MAX_COVER_BASE64_BYTES {
        anyhow::bail!(
            "Cover image '{}' is too large ({} bytes encoded, limit {})",
            path.display(),
            encoded.len(),
            MAX_COVER_BASE64_BYTES
        );
    }
    Ok(encoded)
}

#[tokio::main]
async fn main() {
    env_logger::init();

    if dotenv().is_err() {
        // Silently ignore
    }

    let cli = Cli::parse();

    match &cli.command {
        Commands::List => {
            handle_list().await;
        }
        Commands::Inspect { playlist_ids, json } => {
            handle_inspect(playlist_ids, json.as_deref()).await;
        }
        Commands::Convert {
            playlist_id,
            target,
        } => {
            handle_convert(playlist_id, target).await;
        }
        Commands::Merge {
            playlist_ids,
            target,
        } => {
            handle_merge(playlist_ids, target).await;
        }
    }
}

fn print_error_chain(context: &str, err: &dyn Error) {
    eprintln!();
    eprintln!("[ERROR] {}: {}", context, err);
    let mut source = err.source();
    while let Some(cause) = source {
        eprintln!("  caused by: {}", cause);
        source = cause.source();
    }
}

async fn get_converter() -> PlaylistConverter<SpotifyService> {
    let spotify = match get_spotify_client().await {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error initializing Spotify client: {}", e);
            process::exit(1);
        }
    };
    PlaylistConverter::new(SpotifyService::new(spotify))
}

/// Serializes before touching the file, so a failed report leaves no empty file behind.
fn write_json<T: Serialize>(value: &T, path: &str) -> anyhow::Result<()> {
    let json_content =
        serde_json::to_string_pretty(value).context("Failed to serialize report")?;
    let mut file =
        File::create(path).with_context(|| format!("Failed to create file '{}'", path))?;
    file.write_all(json_content.as_bytes())
        .context("Failed to write report to file")?;
    Ok(())
}

fn save_json<T: Serialize>(value: &T, path: &str) {
    match write_json(value, path) {
        Ok(()) => {
            println!();
            println!("[SAVED] Report saved to: {}", path);
        }
        Err(e) => {
            eprintln!();
            eprintln!("[ERROR] {:#}", e);
        }
    }
}

fn print_report(title: &str, report: &ConversionReport) {
    println!();
    println!("---------------------------------------------------");
    println!("{}", title);
    println!("---------------------------------------------------");
    println!("New Playlist:         {}", report.playlist.name);
    println!("Playlist ID:          {}", report.playlist.id);
    println!("Source Playlists:     {}", report.source_playlists.join(", "));
    println!("Tracks Fetched:       {}", report.tracks_fetched);
    println!("Unique Tracks:        {}", report.unique_tracks);
    println!("Filtered Out:         {}", report.tracks_filtered_out());
    println!("Tracks Added:         {}", report.tracks_added);
    println!("Batches Written:      {}", report.batches_written);
    println!(
        "Cover Uploaded:       {}",
        if report.cover_uploaded { "Yes" } else { "No" }
    );
    println!("---------------------------------------------------");
    if !report.playlist.external_url.is_empty() {
        println!("Open: {}", report.playlist.external_url);
    }
}

fn prepare(target: &TargetArgs) -> (FilterOptions, PlaylistCreationOptions) {
    let options = match target.creation_options() {
        Ok(o) => o,
        Err(e) => {
            eprintln!("[ERROR] {:#}", e);
            process::exit(1);
        }
    };
    let filters = target.filters();
    if filters.is_empty() {
        warn!("No filters given, the new playlist will contain every source track");
    }
    (filters, options)
}

async fn handle_convert(playlist_id: &str, target: &TargetArgs) {
    let (filters, options) = prepare(target);
    let converter = get_converter().await;

    println!("Converting Playlist ID: {} ...", playlist_id);

    match converter.convert(playlist_id, &filters, &options).await {
        Ok(report) => {
            print_report("CONVERSION COMPLETE", &report);
            if let Some(path) = target.json.as_deref() {
                save_json(&report, path);
            }
        }
        Err(e) => {
            print_error_chain("Conversion failed", &e);
            process::exit(1);
        }
    }
}

async fn handle_merge(playlist_ids: &[String], target: &TargetArgs) {
    let (filters, options) = prepare(target);
    let converter = get_converter().await;

    println!("Merging {} playlists ...", playlist_ids.len());

    match converter.merge(playlist_ids, &filters, &options).await {
        Ok(report) => {
            print_report("MERGE COMPLETE", &report);
            if let Some(path) = target.json.as_deref() {
                save_json(&report, path);
            }
        }
        Err(e) => {
            print_error_chain("Merge failed", &e);
            process::exit(1);
        }
    }
}

async fn handle_inspect(playlist_ids: &[String], json_path: Option<&str>) {
    let converter = get_converter().await;
    println!("Inspecting {} playlist(s) ...", playlist_ids.len());

    match converter.inspect(playlist_ids).await {
        Ok(insights) => {
            println!();
            println!("PLAYLIST INSIGHTS");
            println!("---------------------------------------------------");
            println!("Total Tracks:    {}", insights.total_tracks);
            println!("Unique Tracks:   {}", insights.unique_tracks);
            println!("Explicit Tracks: {}", insights.explicit_tracks);
            println!("---------------------------------------------------");
            println!("DECADES (use with --exclude-decade)");
            if insights.decades.is_empty() {
                println!("   (no release dates)");
            } else {
                println!("   {}", insights.decades.join(", "));
            }
            println!("---------------------------------------------------");
            println!("ARTISTS ({}) (use IDs with --exclude-artist)", insights.artists.len());
            for artist in &insights.artists {
                println!(
                    "   {:<24} {}",
                    artist.id.as_deref().unwrap_or("-"),
                    artist.name
                );
            }

            if let Some(path) = json_path {
                save_json(&insights, path);
            }
        }
        Err(e) => {
            print_error_chain("Inspection failed", &e);
            process::exit(1);
        }
    }
}

async fn handle_list() {
    let converter = get_converter().await;
    println!("Fetching your playlists...");

    match converter.service().list_playlists().await {
        Ok(playlists) => {
            println!();
            println!(
                "{:<25} | {:<30} | {:<20} | {:<6} | {:<5}",
                "ID", "Name", "Owner", "Tracks", "Collab"
            );
            println!(
                "{:-<25}-+-{:-<30}-+-{:-<20}-+-{:-<6}-+-{:-<5}",
                "", "", "", "", ""
            );

            for pl in playlists {
                let name = truncate(&pl.name, 28);
                let owner = truncate(&pl.owner_name, 18);
                let collab = if pl.is_collaborative { "Yes" } else { "No" };

                println!(
                    "{:<25} | {:<30} | {:<20} | {:<6} | {:<5}",
                    pl.id, name, owner, pl.total_tracks, collab
                );
            }
            println!();
            println!("Tip: Copy an ID and run 'playlist-remix convert <ID> --name <NAME>'");
        }
        Err(e) => {
            print_error_chain("Failed to list playlists", &e);
            process::exit(1);
        }
    }
}

fn truncate(value: &str, max_chars: usize) -> String {
    if value.chars().count() > max_chars {
        format!("{}..", value.chars().take(max_chars).collect::<String>())
    } else {
        value.to_string()
    }
}
