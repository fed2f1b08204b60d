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

use log::debug;
use rspotify::{prelude::*, scopes, AuthCodeSpotify, Config, Credentials, OAuth};
use std::env;
use std::path::PathBuf;
use thiserror::Error;

/// Overrides the location of the cached OAuth token.
pub const TOKEN_CACHE_ENV: &str = "REMIX_TOKEN_CACHE";

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Failed to initialize Spotify client: {0}")]
    ClientConfig(String),
    #[error("Spotify authentication failed: {0}")]
    Spotify(#[from] rspotify::ClientError),
}

/// Where the OAuth token is cached between runs.
///
/// `REMIX_TOKEN_CACHE` wins; otherwise the platform cache directory is used,
/// falling back to the working directory.
pub fn token_cache_path() -> PathBuf {
    if let Ok(path) = env::var(TOKEN_CACHE_ENV) {
        if !path.is_empty() {
            return PathBuf::from(path);
        }
    }
    dirs::cache_dir()
        .map(|dir| dir.join("playlist-remix").join("token.json"))
        .unwrap_or_else(|| PathBuf::from(".playlist-remix").join("token.json"))
}

/// Initializes and authenticates a Spotify client using the Authorization Code Flow.
///
/// Credentials come from `RSPOTIFY_CLIENT_ID`, `RSPOTIFY_CLIENT_SECRET` and
/// `RSPOTIFY_REDIRECT_URI`. If no valid token is cached, the user is asked
/// (via stdout) to visit the authorization URL.
pub async fn get_spotify_client() -> Result<AuthCodeSpotify, AuthError> {
    let creds = Credentials::from_env().ok_or_else(|| {
        AuthError::ClientConfig("Missing RSPOTIFY_CLIENT_ID or RSPOTIFY_CLIENT_SECRET".to_string())
    })?;

    // - playlist-read-*: source playlists.
    // - playlist-modify-*: create the derived playlist and add tracks.
    // - ugc-image-upload: custom cover images.
    let scopes = scopes!(
        "playlist-read-private",
        "playlist-read-collaborative",
        "playlist-modify-public",
        "playlist-modify-private",
        "ugc-image-upload"
    );

    let oauth = OAuth::from_env(scopes)
        .ok_or_else(|| AuthError::ClientConfig("Missing RSPOTIFY_REDIRECT_URI".to_string()))?;

    let cache_path = token_cache_path();
    if let Some(parent) = cache_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| {
                AuthError::ClientConfig(format!(
                    "Cannot create token cache directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }
    }
    debug!("Using token cache at {}", cache_path.display());

    let config = Config {
        token_cached: true,
        token_refreshing: true,
        cache_path,
        ..Default::default()
    };

    let spotify = AuthCodeSpotify::with_config(creds, oauth, config);

    let url = spotify.get_authorize_url(false)?;

    // Reuses the cached token when present, otherwise opens the browser and
    // reads the redirect URL back from stdin.
    spotify.prompt_for_token(&url).await?;

    Ok(spotify)
}
