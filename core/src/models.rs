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

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artist {
    pub id: Option<String>,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Album {
    pub id: Option<String>,
    pub name: String,
    pub release_date: Option<String>, // "YYYY", "YYYY-MM" or "YYYY-MM-DD"
}

/// A playable track as returned by the music service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    pub uri: String,
    pub id: Option<String>,
    pub name: String,
    pub duration_ms: u32,
    pub explicit: bool,
    pub popularity: u32,
    pub album: Album,
    pub artists: Vec<Artist>,
}

impl Track {
    pub fn artist_names(&self) -> String {
        self.artists
            .iter()
            .map(|a| a.name.as_str())
            .collect::<Vec<&str>>()
            .join(", ")
    }
}

impl fmt::Display for Track {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let explicit = if self.explicit { " [E]" } else { "" };
        write!(
            f,
            "{} - {}{} (Album: {})",
            self.name,
            self.artist_names(),
            explicit,
            self.album.name
        )
    }
}

/// A track entry inside a playlist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackItem {
    pub added_at: Option<DateTime<Utc>>,
    pub track: Track,
}

impl TrackItem {
    pub fn new(track: Track) -> Self {
        Self {
            added_at: None,
            track,
        }
    }

    pub fn uri(&self) -> &str {
        &self.track.uri
    }
}

/// One page of playlist entries.
#[derive(Debug, Clone, Default)]
pub struct TrackPage {
    pub items: Vec<TrackItem>,
    pub offset: u32,
    pub limit: u32,
    pub total: u32,
    pub has_more: bool,
}

/// Exclusion criteria applied when deriving a playlist.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterOptions {
    pub exclude_explicit: bool,
    pub exclude_artists: HashSet<String>, // artist ids
    pub exclude_decades: HashSet<String>, // e.g. "1980s"

    // Accepted but not evaluated by the filter engine.
    pub exclude_genres: HashSet<String>,
    pub min_energy: Option<f32>,
    pub max_energy: Option<f32>,
    pub min_danceability: Option<f32>,
    pub max_danceability: Option<f32>,
    pub min_valence: Option<f32>,
    pub max_valence: Option<f32>,
}

impl FilterOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn exclude_explicit(mut self, exclude: bool) -> Self {
        self.exclude_explicit = exclude;
        self
    }

    pub fn exclude_artists<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude_artists.extend(ids.into_iter().map(Into::into));
        self
    }

    pub fn exclude_decades<I, S>(mut self, decades: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude_decades
            .extend(decades.into_iter().map(Into::into));
        self
    }

    /// True when no evaluated predicate is configured.
    pub fn is_empty(&self) -> bool {
        !self.exclude_explicit && self.exclude_artists.is_empty() && self.exclude_decades.is_empty()
    }
}

/// Settings for the playlist being created.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlaylistCreationOptions {
    pub name: String,
    pub description: Option<String>,
    pub is_public: bool,
    #[serde(skip_serializing)]
    pub image_base64: Option<String>, // base64 encoded JPEG
}

impl PlaylistCreationOptions {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

/// A playlist freshly created on the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedPlaylist {
    pub id: String,
    pub name: String,
    pub description: String,
    pub is_public: bool,
    pub external_url: String,
}

/// Summary of a playlist for listing purposes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaylistSummary {
    pub id: String,
    pub name: String,
    pub total_tracks: u32,
    pub is_public: bool,
    pub is_collaborative: bool,
    pub owner_name: String,
}

/// Outcome of a convert or merge run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionReport {
    pub playlist: CreatedPlaylist,
    pub source_playlists: Vec<String>,
    pub tracks_fetched: usize,
    pub unique_tracks: usize,
    pub tracks_added: usize,
    pub batches_written: usize,
    pub cover_uploaded: bool,
}

impl ConversionReport {
    pub fn tracks_filtered_out(&self) -> usize {
        self.unique_tracks - self.tracks_added
    }
}

/// What a set of playlists contains, to help pick exclusions.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct PlaylistInsights {
    pub total_tracks: usize,
    pub unique_tracks: usize,
    pub explicit_tracks: usize,
    pub artists: Vec<Artist>,
    pub decades: Vec<String>,
}
