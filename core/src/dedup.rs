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

use crate::models::TrackItem;
use log::debug;
use std::collections::HashSet;

/// Keeps one entry per track URI. The first occurrence wins and the
/// relative order of the surviving entries is preserved.
pub fn remove_duplicate_tracks(items: Vec<TrackItem>) -> Vec<TrackItem> {
    let before = items.len();
    let mut seen: HashSet<String> = HashSet::with_capacity(before);

    let unique: Vec<TrackItem> = items
        .into_iter()
        .filter(|item| seen.insert(item.track.uri.clone()))
        .collect();

    if unique.len() < before {
        debug!("Dropped {} duplicate tracks", before - unique.len());
    }
    unique
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{numbered_items, track_item};

    #[test]
    fn test_empty_input_yields_empty_output() {
        assert!(remove_duplicate_tracks(Vec::new()).is_empty());
    }

    #[test]
    fn test_repeated_uri_kept_at_first_position() {
        let mut first = track_item("spotify:track:b", "1994-03-01", &["x"]);
        first.track.popularity = 10;
        let mut repeat = track_item("spotify:track:b", "1994-03-01", &["x"]);
        repeat.track.popularity = 99;

        let items = vec![
            track_item("spotify:track:a", "2000", &["x"]),
            first,
            track_item("spotify:track:c", "2000", &["x"]),
            repeat,
            track_item("spotify:track:a", "2000", &["x"]),
        ];

        let unique = remove_duplicate_tracks(items);
        let uris: Vec<&str> = unique.iter().map(|i| i.uri()).collect();

        assert_eq!(
            uris,
            vec!["spotify:track:a", "spotify:track:b", "spotify:track:c"]
        );
        assert_eq!(unique[1].track.popularity, 10);
    }

    #[test]
    fn test_distinct_input_untouched() {
        let items = numbered_items("t", 5);
        let unique = remove_duplicate_tracks(items.clone());
        assert_eq!(unique, items);
    }
}
