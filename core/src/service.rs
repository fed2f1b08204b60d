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

use crate::models::{CreatedPlaylist, PlaylistSummary, TrackPage};
use async_trait::async_trait;
use thiserror::Error;

/// Spotify rejects add-items requests carrying more than 100 URIs.
pub const MAX_TRACKS_PER_ADD: usize = 100;

/// Largest page the playlist items endpoint returns.
pub const PLAYLIST_PAGE_SIZE: u32 = 100;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Spotify API error: {0}")]
    Spotify(#[from] rspotify::ClientError),
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Spotify returned status {status}: {body}")]
    Upstream { status: u16, body: String },
    #[error("Invalid Playlist ID: {0}")]
    InvalidId(String),
    #[error("Invalid Track URI: {0}")]
    InvalidTrackUri(String),
}

/// The music service operations the playlist pipeline depends on.
///
/// `SpotifyService` implements it against the Web API. Tests use an
/// in-memory implementation.
#[async_trait]
pub trait MusicService: Send + Sync {
    /// Fetches one page of a playlist's tracks.
    async fn fetch_playlist_tracks(
        &self,
        playlist_id: &str,
        limit: u32,
        offset: u32,
    ) -> Result<TrackPage, ServiceError>;

    /// Creates an empty playlist owned by the current user.
    async fn create_playlist(
        &self,
        name: &str,
        description: &str,
        is_public: bool,
    ) -> Result<CreatedPlaylist, ServiceError>;

    /// Appends tracks to a playlist. `uris` never exceeds
    /// [`MusicService::add_tracks_batch_limit`].
    async fn add_tracks(&self, playlist_id: &str, uris: &[String]) -> Result<(), ServiceError>;

    /// Replaces the playlist cover with a base64 encoded JPEG.
    async fn upload_cover_image(
        &self,
        playlist_id: &str,
        image_base64: &str,
    ) -> Result<(), ServiceError>;

    async fn list_playlists(&self) -> Result<Vec<PlaylistSummary>, ServiceError>;

    fn add_tracks_batch_limit(&self) -> usize {
        MAX_TRACKS_PER_ADD
    }
}
