use crate::models::{
    Album, Artist, CreatedPlaylist, PlaylistSummary, Track, TrackItem, TrackPage,
};
use crate::service::{MusicService, ServiceError};
use async_trait::async_trait;
use futures::stream::TryStreamExt;
use log::{debug, info};
use rspotify::{
    model::{
        FullPlaylist, FullTrack, Market, PlayableId, PlayableItem, PlaylistId, PlaylistItem, TrackId,
    },
    prelude::*,
    AuthCodeSpotify,
};
use std::sync::Arc;

const API_BASE: &str = "https://api.spotify.com/v1";

/// `MusicService` backed by the Spotify Web API.
pub struct SpotifyService {
    spotify: Arc<AuthCodeSpotify>,
    http: reqwest::Client,
}

impl SpotifyService {
    pub fn new(spotify: AuthCodeSpotify) -> Self {
        Self {
            spotify: Arc::new(spotify),
            http: reqwest::Client::new(),
        }
    }

    fn playlist_id(playlist_id_str: &str) -> Result<PlaylistId<'_>, ServiceError> {
        PlaylistId::from_id_or_uri(playlist_id_str)
            .map_err(|_| ServiceError::InvalidId(playlist_id_str.to_string()))
    }
}

fn convert_track(track: FullTrack) -> Option<Track> {
    // Local files carry no id and cannot be re-added by URI.
    let id = track.id?;

    Some(Track {
        uri: id.uri(),
        id: Some(id.id().to_string()),
        name: track.name,
        duration_ms: track.duration.num_milliseconds().max(0) as u32,
        explicit: track.explicit,
        popularity: track.popularity,
        album: Album {
            id: track.album.id.map(|id| id.id().to_string()),
            name: track.album.name,
            release_date: track.album.release_date,
        },
        artists: track
            .artists
            .into_iter()
            .map(|a| Artist {
                id: a.id.map(|id| id.id().to_string()),
                name: a.name,
            })
            .collect(),
    })
}

/// Keeps playable tracks; episodes, unavailable entries and local files are dropped.
fn convert_item(item: PlaylistItem, playlist_id: &str) -> Option<TrackItem> {
    match item.track {
        Some(PlayableItem::Track(track)) => match convert_track(track) {
            Some(track) => Some(TrackItem {
                added_at: item.added_at,
                track,
            }),
            None => {
                debug!("Skipping local track in playlist {}", playlist_id);
                None
            }
        },
        Some(_) => {
            debug!("Skipping non-track item in playlist {}", playlist_id);
            None
        }
        None => {
            debug!("Skipping unavailable item in playlist {}", playlist_id);
            None
        }
    }
}

fn convert_playlist(pl: FullPlaylist) -> CreatedPlaylist {
    CreatedPlaylist {
        id: pl.id.id().to_string(),
        name: pl.name,
        description: pl.description.unwrap_or_default(),
        is_public: pl.public.unwrap_or(false),
        external_url: pl.external_urls.get("spotify").cloned().unwrap_or_default(),
    }
}

#[async_trait]
impl MusicService for SpotifyService {
    async fn fetch_playlist_tracks(
        &self,
        playlist_id: &str,
        limit: u32,
        offset: u32,
    ) -> Result<TrackPage, ServiceError> {
        let id = Self::playlist_id(playlist_id)?;
        let page = self
            .spotify
            .playlist_items_manual(id, None, Some(Market::FromToken), Some(limit), Some(offset))
            .await?;

        let items = page
            .items
            .into_iter()
            .filter_map(|item| convert_item(item, playlist_id))
            .collect();

        Ok(TrackPage {
            items,
            offset: page.offset,
            limit: page.limit,
            total: page.total,
            has_more: page.next.is_some(),
        })
    }

    async fn create_playlist(
        &self,
        name: &str,
        description: &str,
        is_public: bool,
    ) -> Result<CreatedPlaylist, ServiceError> {
        let user = self.spotify.me().await?;
        let playlist = self
            .spotify
            .user_playlist_create(user.id, name, Some(is_public), None, Some(description))
            .await?;

        info!("Created playlist '{}' ({})", playlist.name, playlist.id);
        Ok(convert_playlist(playlist))
    }

    async fn add_tracks(&self, playlist_id: &str, uris: &[String]) -> Result<(), ServiceError> {
        let id = Self::playlist_id(playlist_id)?;
        let items = uris
            .iter()
            .map(|uri| {
                TrackId::from_uri(uri)
                    .map(|t| PlayableId::Track(t.into_static()))
                    .map_err(|_| ServiceError::InvalidTrackUri(uri.clone()))
            })
            .collect::<Result<Vec<PlayableId<'static>>, ServiceError>>()?;

        self.spotify.playlist_add_items(id, items, None).await?;
        Ok(())
    }

    async fn upload_cover_image(
        &self,
        playlist_id: &str,
        image_base64: &str,
    ) -> Result<(), ServiceError> {
        let id = Self::playlist_id(playlist_id)?;
        let url = format!("{}/playlists/{}/images", API_BASE, id.id());

        // rspotify only speaks JSON bodies; this endpoint wants the raw base64 text.
        let mut request = self
            .http
            .put(url)
            .header("Content-Type", "image/jpeg")
            .body(image_base64.to_string());
        for (name, value) in self.spotify.auth_headers().await? {
            request = request.header(name, value);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ServiceError::Upstream {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }
        Ok(())
    }

    async fn list_playlists(&self) -> Result<Vec<PlaylistSummary>, ServiceError> {
        let mut playlists = Vec::new();
        let mut stream = self.spotify.current_user_playlists();

        while let Some(pl) = stream.try_next().await? {
            let owner_name = pl.owner.display_name.unwrap_or(pl.owner.id.to_string());

            playlists.push(PlaylistSummary {
                id: pl.id.id().to_string(),
                name: pl.name,
                total_tracks: pl.tracks.total,
                is_public: pl.public.unwrap_or(false),
                is_collaborative: pl.collaborative,
                owner_name,
            });
        }

        Ok(playlists)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn track_json(id: Value) -> Value {
        json!({
            "album": {
                "album_type": "album",
                "artists": [],
                "available_markets": [],
                "external_urls": {},
                "href": null,
                "id": "4aawyAB9vmqN3uQ7FjRGTy",
                "images": [],
                "name": "Global Warming",
                "release_date": "1994-03-01",
                "release_date_precision": "day"
            },
            "artists": [{
                "external_urls": {},
                "href": null,
                "id": "0OdUWJ0sBjDrqHygGUXeCF",
                "name": "Band of Horses",
                "type": "artist",
                "uri": "spotify:artist:0OdUWJ0sBjDrqHygGUXeCF"
            }],
            "available_markets": [],
            "disc_number": 1,
            "duration_ms": 1234,
            "explicit": true,
            "external_ids": {},
            "external_urls": {},
            "href": null,
            "id": id,
            "is_local": false,
            "name": "Funeral",
            "popularity": 7,
            "preview_url": null,
            "track_number": 1,
            "type": "track"
        })
    }

    fn full_track(id: Value) -> FullTrack {
        serde_json::from_value(track_json(id)).unwrap()
    }

    fn playlist_item(track: Value) -> PlaylistItem {
        serde_json::from_value(json!({
            "added_at": "2024-01-02T03:04:05Z",
            "added_by": null,
            "is_local": false,
            "track": track
        }))
        .unwrap()
    }

    #[test]
    fn test_convert_track_maps_fields() {
        let track = convert_track(full_track(json!("11dFghVXANMlKmJXsNCbNl"))).unwrap();

        assert_eq!(track.uri, "spotify:track:11dFghVXANMlKmJXsNCbNl");
        assert_eq!(track.id.as_deref(), Some("11dFghVXANMlKmJXsNCbNl"));
        assert_eq!(track.name, "Funeral");
        assert_eq!(track.duration_ms, 1234);
        assert_eq!(track.popularity, 7);
        assert!(track.explicit);
        assert_eq!(track.album.id.as_deref(), Some("4aawyAB9vmqN3uQ7FjRGTy"));
        assert_eq!(track.album.release_date.as_deref(), Some("1994-03-01"));
        assert_eq!(track.artists.len(), 1);
        assert_eq!(track.artists[0].id.as_deref(), Some("0OdUWJ0sBjDrqHygGUXeCF"));
        assert_eq!(track.artists[0].name, "Band of Horses");
    }

    #[test]
    fn test_convert_track_without_id_is_skipped() {
        assert!(convert_track(full_track(Value::Null)).is_none());
    }

    #[test]
    fn test_convert_item_keeps_added_at() {
        let item = convert_item(
            playlist_item(track_json(json!("11dFghVXANMlKmJXsNCbNl"))),
            "src",
        )
        .unwrap();

        assert_eq!(item.uri(), "spotify:track:11dFghVXANMlKmJXsNCbNl");
        assert_eq!(
            item.added_at.map(|t| t.to_rfc3339()).as_deref(),
            Some("2024-01-02T03:04:05+00:00")
        );
    }

    #[test]
    fn test_convert_item_skips_unavailable_and_local() {
        assert!(convert_item(playlist_item(Value::Null), "src").is_none());
        assert!(convert_item(playlist_item(track_json(Value::Null)), "src").is_none());
    }
}
