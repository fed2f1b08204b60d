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

pub mod auth;
pub mod converter;
pub mod dedup;
pub mod filter;
pub mod models;
pub mod service;
pub mod spotify;

#[cfg(test)]
mod fixtures;

// Re-export key items for convenience
pub use auth::get_spotify_client;
pub use converter::{ConvertError, PlaylistConverter};
pub use models::{ConversionReport, FilterOptions, PlaylistCreationOptions};
pub use service::{MusicService, ServiceError};
pub use spotify::SpotifyService;
