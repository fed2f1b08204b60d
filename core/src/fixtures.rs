//! Test builders shared by the unit tests.

use crate::models::{Album, Artist, Track, TrackItem};

pub fn track_item(uri: &str, release_date: &str, artist_ids: &[&str]) -> TrackItem {
    TrackItem::new(Track {
        uri: uri.to_string(),
        id: uri.rsplit(':').next().map(str::to_string),
        name: format!("Track {}", uri),
        duration_ms: 180_000,
        explicit: false,
        popularity: 50,
        album: Album {
            id: None,
            name: "Album".to_string(),
            release_date: Some(release_date.to_string()),
        },
        artists: artist_ids
            .iter()
            .map(|id| Artist {
                id: Some(id.to_string()),
                name: format!("Artist {}", id),
            })
            .collect(),
    })
}

/// `count` distinct tracks named `{prefix}{n}`.
pub fn numbered_items(prefix: &str, count: usize) -> Vec<TrackItem> {
    (0..count)
        .map(|n| track_item(&format!("spotify:track:{}{}", prefix, n), "2001-01-01", &["a"]))
        .collect()
}
