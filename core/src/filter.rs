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

use crate::models::{Artist, FilterOptions, Track, TrackItem};
use log::debug;
use std::collections::{BTreeSet, HashSet};

/// Derives the decade key ("1990s") from a release date such as
/// "1994-03-01", "1994-03" or "1994".
///
/// Returns `None` when the date does not start with a four digit year.
pub fn decade_key(release_date: &str) -> Option<String> {
    let year_str = release_date.get(0..4)?;
    if !year_str.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let year: u32 = year_str.parse().ok()?;
    Some(format!("{}s", year / 10 * 10))
}

fn is_excluded_explicit(track: &Track, options: &FilterOptions) -> bool {
    options.exclude_explicit && track.explicit
}

fn is_excluded_artist(track: &Track, options: &FilterOptions) -> bool {
    !options.exclude_artists.is_empty()
        && track
            .artists
            .iter()
            .filter_map(|a| a.id.as_deref())
            .any(|id| options.exclude_artists.contains(id))
}

fn is_excluded_decade(track: &Track, options: &FilterOptions) -> bool {
    if options.exclude_decades.is_empty() {
        return false;
    }
    track
        .album
        .release_date
        .as_deref()
        .and_then(decade_key)
        .is_some_and(|decade| options.exclude_decades.contains(&decade))
}

/// True when no configured predicate rejects the track.
pub fn passes(track: &Track, options: &FilterOptions) -> bool {
    !(is_excluded_explicit(track, options)
        || is_excluded_artist(track, options)
        || is_excluded_decade(track, options))
}

/// Drops every item rejected by at least one predicate, keeping order.
pub fn filter_tracks(items: Vec<TrackItem>, options: &FilterOptions) -> Vec<TrackItem> {
    if options.is_empty() {
        return items;
    }

    let before = items.len();
    let kept: Vec<TrackItem> = items
        .into_iter()
        .filter(|item| passes(&item.track, options))
        .collect();

    debug!("Filters kept {} of {} tracks", kept.len(), before);
    kept
}

/// Distinct artists by id, in order of first appearance.
pub fn unique_artists(items: &[TrackItem]) -> Vec<Artist> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut artists = Vec::new();

    for artist in items.iter().flat_map(|i| i.track.artists.iter()) {
        if let Some(id) = artist.id.as_deref() {
            if seen.insert(id) {
                artists.push(artist.clone());
            }
        }
    }
    artists
}

/// Sorted distinct decade keys present in the items.
pub fn decades(items: &[TrackItem]) -> Vec<String> {
    items
        .iter()
        .filter_map(|i| i.track.album.release_date.as_deref())
        .filter_map(decade_key)
        .collect::<BTreeSet<String>>()
        .into_iter()
        .collect()
}
