use crate::dedup::remove_duplicate_tracks;
use crate::filter::{decades, filter_tracks, unique_artists};
use crate::models::{
    ConversionReport, CreatedPlaylist, FilterOptions, PlaylistCreationOptions, PlaylistInsights,
    TrackItem,
};
use crate::service::{MusicService, ServiceError, PLAYLIST_PAGE_SIZE};
use log::{debug, error, info};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("Failed to convert playlist")]
    Convert(#[source] ServiceError),
    #[error("Failed to merge playlists")]
    Merge(#[source] ServiceError),
    #[error("Failed to inspect playlists")]
    Inspect(#[source] ServiceError),
    #[error("No source playlists given")]
    NoSources,
}

/// Derives new playlists from existing ones.
///
/// Every stage runs sequentially: fetch, merge, dedup, filter, create,
/// batch-write, then the optional cover upload. Nothing is retried and a
/// failure part way through leaves whatever was already written in place.
pub struct PlaylistConverter<S: MusicService> {
    service: S,
}

impl<S: MusicService> PlaylistConverter<S> {
    pub fn new(service: S) -> Self {
        Self { service }
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    /// Fetches every track of a playlist, page by page.
    pub async fn fetch_all_tracks(&self, playlist_id: &str) -> Result<Vec<TrackItem>, ServiceError> {
        let mut items = Vec::new();
        let mut offset = 0;

        loop {
            let page = self
                .service
                .fetch_playlist_tracks(playlist_id, PLAYLIST_PAGE_SIZE, offset)
                .await?;
            debug!(
                "Playlist {}: fetched {} items at offset {} (total {})",
                playlist_id,
                page.items.len(),
                page.offset,
                page.total
            );
            items.extend(page.items);

            if !page.has_more || page.limit == 0 {
                break;
            }
            offset = page.offset + page.limit;
        }

        Ok(items)
    }

    /// Creates a filtered copy of a single playlist.
    pub async fn convert(
        &self,
        playlist_id: &str,
        filters: &FilterOptions,
        options: &PlaylistCreationOptions,
    ) -> Result<ConversionReport, ConvertError> {
        info!("Converting playlist {}", playlist_id);
        self.run(&[playlist_id.to_string()], filters, options, false)
            .await
            .map_err(|e| {
                error!("Error converting playlist: {}", e);
                ConvertError::Convert(e)
            })
    }

    /// Merges several playlists into a new one, dropping duplicates by URI
    /// before filtering.
    ///
    /// An empty `playlist_ids` is rejected with [`ConvertError::NoSources`]
    /// before anything is created.
    pub async fn merge(
        &self,
        playlist_ids: &[String],
        filters: &FilterOptions,
        options: &PlaylistCreationOptions,
    ) -> Result<ConversionReport, ConvertError> {
        if playlist_ids.is_empty() {
            error!("Error merging playlists: no source playlists given");
            return Err(ConvertError::NoSources);
        }
        info!("Merging {} playlists", playlist_ids.len());
        self.run(playlist_ids, filters, options, true)
            .await
            .map_err(|e| {
                error!("Error merging playlists: {}", e);
                ConvertError::Merge(e)
            })
    }

    /// Summarizes the artists and decades found across the given playlists.
    pub async fn inspect(&self, playlist_ids: &[String]) -> Result<PlaylistInsights, ConvertError> {
        let all_tracks = self.fetch_sources(playlist_ids).await.map_err(|e| {
            error!("Error inspecting playlists: {}", e);
            ConvertError::Inspect(e)
        })?;
        let unique = remove_duplicate_tracks(all_tracks.clone());

        Ok(PlaylistInsights {
            total_tracks: all_tracks.len(),
            unique_tracks: unique.len(),
            explicit_tracks: unique.iter().filter(|i| i.track.explicit).count(),
            artists: unique_artists(&unique),
            decades: decades(&unique),
        })
    }

    async fn fetch_sources(&self, playlist_ids: &[String]) -> Result<Vec<TrackItem>, ServiceError> {
        let mut all_tracks = Vec::new();
        for id in playlist_ids {
            all_tracks.extend(self.fetch_all_tracks(id).await?);
        }
        Ok(all_tracks)
    }

    async fn run(
        &self,
        playlist_ids: &[String],
        filters: &FilterOptions,
        options: &PlaylistCreationOptions,
        dedup: bool,
    ) -> Result<ConversionReport, ServiceError> {
        let all_tracks = self.fetch_sources(playlist_ids).await?;
        let tracks_fetched = all_tracks.len();

        let unique = if dedup {
            remove_duplicate_tracks(all_tracks)
        } else {
            all_tracks
        };
        let unique_tracks = unique.len();

        let kept = filter_tracks(unique, filters);
        let uris: Vec<String> = kept.into_iter().map(|item| item.track.uri).collect();

        let playlist = self
            .service
            .create_playlist(
                &options.name,
                options.description.as_deref().unwrap_or_default(),
                options.is_public,
            )
            .await?;

        let batches_written = self.write_tracks(&playlist, &uris).await?;

        let cover_uploaded = match options.image_base64.as_deref() {
            Some(image) if !image.is_empty() => {
                self.service.upload_cover_image(&playlist.id, image).await?;
                true
            }
            _ => false,
        };

        info!(
            "Playlist '{}' written: {} tracks in {} batches",
            playlist.name,
            uris.len(),
            batches_written
        );

        Ok(ConversionReport {
            playlist,
            source_playlists: playlist_ids.to_vec(),
            tracks_fetched,
            unique_tracks,
            tracks_added: uris.len(),
            batches_written,
            cover_uploaded,
        })
    }

    /// Adds `uris` in chunks no larger than the service's batch ceiling,
    /// one call per chunk. Returns the number of calls made.
    async fn write_tracks(
        &self,
        playlist: &CreatedPlaylist,
        uris: &[String],
    ) -> Result<usize, ServiceError> {
        let batch_size = self.service.add_tracks_batch_limit().max(1);
        let mut batches = 0;

        for (i, chunk) in uris.chunks(batch_size).enumerate() {
            debug!(
                "Adding batch {} ({} tracks) to playlist {}",
                i,
                chunk.len(),
                playlist.id
            );
            self.service.add_tracks(&playlist.id, chunk).await?;
            batches += 1;
        }

        Ok(batches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{numbered_items, track_item};
    use crate::models::{PlaylistSummary, TrackPage};
    use crate::service::MAX_TRACKS_PER_ADD;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::error::Error as _;
    use std::sync::Mutex;

    /// In-memory music service that records every write.
    #[derive(Default)]
    struct FakeService {
        playlists: HashMap<String, Vec<TrackItem>>,
        page_size: Option<u32>,
        fail_on_add_call: Option<usize>,
        fetch_calls: Mutex<usize>,
        created: Mutex<Vec<(String, String, bool)>>,
        add_calls: Mutex<Vec<Vec<String>>>,
        covers: Mutex<Vec<(String, String)>>,
    }

    impl FakeService {
        fn with_playlist(mut self, id: &str, items: Vec<TrackItem>) -> Self {
            self.playlists.insert(id.to_string(), items);
            self
        }

        fn add_calls(&self) -> Vec<Vec<String>> {
            self.add_calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl MusicService for FakeService {
        async fn fetch_playlist_tracks(
            &self,
            playlist_id: &str,
            limit: u32,
            offset: u32,
        ) -> Result<TrackPage, ServiceError> {
            *self.fetch_calls.lock().unwrap() += 1;
            let items = self
                .playlists
                .get(playlist_id)
                .ok_or_else(|| ServiceError::InvalidId(playlist_id.to_string()))?;

            let limit = self.page_size.unwrap_or(limit);
            let start = (offset as usize).min(items.len());
            let end = (start + limit as usize).min(items.len());

            Ok(TrackPage {
                items: items[start..end].to_vec(),
                offset,
                limit,
                total: items.len() as u32,
                has_more: end < items.len(),
            })
        }

        async fn create_playlist(
            &self,
            name: &str,
            description: &str,
            is_public: bool,
        ) -> Result<CreatedPlaylist, ServiceError> {
            self.created
                .lock()
                .unwrap()
                .push((name.to_string(), description.to_string(), is_public));
            Ok(CreatedPlaylist {
                id: "new-playlist".to_string(),
                name: name.to_string(),
                description: description.to_string(),
                is_public,
                external_url: String::new(),
            })
        }

        async fn add_tracks(&self, _playlist_id: &str, uris: &[String]) -> Result<(), ServiceError> {
            assert!(uris.len() <= MAX_TRACKS_PER_ADD);
            let mut calls = self.add_calls.lock().unwrap();
            if self.fail_on_add_call == Some(calls.len()) {
                return Err(ServiceError::Upstream {
                    status: 500,
                    body: "boom".to_string(),
                });
            }
            calls.push(uris.to_vec());
            Ok(())
        }

        async fn upload_cover_image(
            &self,
            playlist_id: &str,
            image_base64: &str,
        ) -> Result<(), ServiceError> {
            self.covers
                .lock()
                .unwrap()
                .push((playlist_id.to_string(), image_base64.to_string()));
            Ok(())
        }

        async fn list_playlists(&self) -> Result<Vec<PlaylistSummary>, ServiceError> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn test_fetch_all_tracks_follows_pages() {
        let service = FakeService {
            page_size: Some(7),
            ..Default::default()
        }
        .with_playlist("src", numbered_items("p", 30));
        let converter = PlaylistConverter::new(service);

        let items = converter.fetch_all_tracks("src").await.unwrap();

        assert_eq!(items.len(), 30);
        assert_eq!(items[29].uri(), "spotify:track:p29");
        assert_eq!(*converter.service().fetch_calls.lock().unwrap(), 5);
    }

    #[tokio::test]
    async fn test_convert_applies_filters_and_creates_playlist() {
        let mut explicit = track_item("spotify:track:e", "2010", &["a2"]);
        explicit.track.explicit = true;
        let source = vec![
            track_item("spotify:track:1", "1994-03-01", &["a1"]),
            explicit,
            track_item("spotify:track:2", "2005", &["a3"]),
        ];
        let converter = PlaylistConverter::new(FakeService::default().with_playlist("src", source));

        let filters = FilterOptions::new()
            .exclude_explicit(true)
            .exclude_decades(["1990s"]);
        let mut options = PlaylistCreationOptions::new("Clean");
        options.is_public = true;

        let report = converter.convert("src", &filters, &options).await.unwrap();

        assert_eq!(report.playlist.name, "Clean");
        assert_eq!(report.tracks_fetched, 3);
        assert_eq!(report.tracks_added, 1);
        assert_eq!(report.tracks_filtered_out(), 2);
        assert!(!report.cover_uploaded);

        let service = converter.service();
        assert_eq!(
            *service.created.lock().unwrap(),
            vec![("Clean".to_string(), String::new(), true)]
        );
        assert_eq!(service.add_calls(), vec![vec!["spotify:track:2".to_string()]]);
    }

    #[tokio::test]
    async fn test_batch_count_is_ceiling_of_track_count() {
        for (count, expected) in [(0, 0), (1, 1), (100, 1), (101, 2), (250, 3)] {
            let converter = PlaylistConverter::new(
                FakeService::default().with_playlist("src", numbered_items("b", count)),
            );

            let report = converter
                .convert("src", &FilterOptions::new(), &PlaylistCreationOptions::new("Copy"))
                .await
                .unwrap();

            let calls = converter.service().add_calls();
            assert_eq!(calls.len(), expected, "{} tracks", count);
            assert_eq!(report.batches_written, expected);
            assert_eq!(calls.iter().map(Vec::len).sum::<usize>(), count);
        }
    }

    #[tokio::test]
    async fn test_merge_counts_uri_union() {
        let first = numbered_items("m", 120);
        let mut second = numbered_items("m", 60); // overlaps first
        second.extend(numbered_items("n", 40));

        let converter = PlaylistConverter::new(
            FakeService::default()
                .with_playlist("one", first)
                .with_playlist("two", second),
        );
        let ids = vec!["one".to_string(), "two".to_string()];

        let report = converter
            .merge(&ids, &FilterOptions::new(), &PlaylistCreationOptions::new("Both"))
            .await
            .unwrap();

        assert_eq!(report.tracks_fetched, 220);
        assert_eq!(report.unique_tracks, 160);
        assert_eq!(report.tracks_added, 160);

        let written: Vec<String> = converter.service().add_calls().concat();
        assert_eq!(written.len(), 160);
        assert_eq!(written[0], "spotify:track:m0");
        assert_eq!(written[120], "spotify:track:n0");
    }

    #[tokio::test]
    async fn test_convert_keeps_duplicates_within_single_playlist() {
        let source = vec![
            track_item("spotify:track:1", "2001", &["a"]),
            track_item("spotify:track:1", "2001", &["a"]),
        ];
        let converter = PlaylistConverter::new(FakeService::default().with_playlist("src", source));

        let report = converter
            .convert("src", &FilterOptions::new(), &PlaylistCreationOptions::new("Dup"))
            .await
            .unwrap();

        assert_eq!(report.tracks_added, 2);
    }

    #[tokio::test]
    async fn test_failed_batch_propagates_and_keeps_earlier_batches() {
        let service = FakeService {
            fail_on_add_call: Some(1),
            ..Default::default()
        }
        .with_playlist("src", numbered_items("f", 250));
        let converter = PlaylistConverter::new(service);

        let err = converter
            .convert("src", &FilterOptions::new(), &PlaylistCreationOptions::new("Partial"))
            .await
            .unwrap_err();

        assert!(matches!(err, ConvertError::Convert(ServiceError::Upstream { status: 500, .. })));
        assert!(err.source().is_some());
        // The first batch stays written and nothing after the failure is attempted.
        assert_eq!(converter.service().add_calls().len(), 1);
    }

    #[tokio::test]
    async fn test_merge_without_sources_creates_nothing() {
        let converter = PlaylistConverter::new(FakeService::default());

        let err = converter
            .merge(&[], &FilterOptions::new(), &PlaylistCreationOptions::new("Empty"))
            .await
            .unwrap_err();

        assert!(matches!(err, ConvertError::NoSources));
        let service = converter.service();
        assert_eq!(*service.fetch_calls.lock().unwrap(), 0);
        assert!(service.created.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_merge_unknown_playlist_creates_nothing() {
        let converter =
            PlaylistConverter::new(FakeService::default().with_playlist("one", numbered_items("x", 3)));
        let ids = vec!["one".to_string(), "missing".to_string()];

        let err = converter
            .merge(&ids, &FilterOptions::new(), &PlaylistCreationOptions::new("Nope"))
            .await
            .unwrap_err();

        assert!(matches!(err, ConvertError::Merge(ServiceError::InvalidId(_))));
        assert!(converter.service().created.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_cover_uploaded_after_tracks() {
        let converter =
            PlaylistConverter::new(FakeService::default().with_playlist("src", numbered_items("c", 2)));
        let mut options = PlaylistCreationOptions::new("Covered");
        options.description = Some("with art".to_string());
        options.image_base64 = Some("aGVsbG8=".to_string());

        let report = converter
            .convert("src", &FilterOptions::new(), &options)
            .await
            .unwrap();

        assert!(report.cover_uploaded);
        let service = converter.service();
        assert_eq!(
            *service.covers.lock().unwrap(),
            vec![("new-playlist".to_string(), "aGVsbG8=".to_string())]
        );
        assert_eq!(service.created.lock().unwrap()[0].1, "with art");
    }

    #[tokio::test]
    async fn test_inspect_reports_artists_and_decades() {
        let converter = PlaylistConverter::new(
            FakeService::default()
                .with_playlist(
                    "one",
                    vec![
                        track_item("spotify:track:1", "1994-03-01", &["a1"]),
                        track_item("spotify:track:2", "1975", &["a2", "a1"]),
                    ],
                )
                .with_playlist("two", vec![track_item("spotify:track:1", "1994-03-01", &["a1"])]),
        );
        let ids = vec!["one".to_string(), "two".to_string()];

        let insights = converter.inspect(&ids).await.unwrap();

        assert_eq!(insights.total_tracks, 3);
        assert_eq!(insights.unique_tracks, 2);
        assert_eq!(insights.decades, vec!["1970s", "1990s"]);
        assert_eq!(insights.artists.len(), 2);
        assert!(converter.service().created.lock().unwrap().is_empty());
    }
}
