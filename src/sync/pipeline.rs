//! Sync runs: fetch, clean, store, complete

use crate::config::SyncConfig;
use crate::core::entity::Entity;
use crate::core::error::{DashResult, SyncError, ValidationError};
use crate::models::{Album, AppUser, Artist, Playlist, Track};
use crate::storage::{LibraryItem, LibraryStore};
use crate::sync::clean::{
    SyncAlbum, SyncArtistRef, SyncTrack, clean_album, clean_artist, clean_playlist, clean_track,
};
use crate::sync::{LibrarySource, RemotePage, RemoteResource, TokenRefresher};
use chrono::{Duration, Utc};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Outcome of one resource sync
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct SyncReport {
    pub resource: String,
    /// Local id and display name of every stored record
    pub synced: Vec<(Uuid, String)>,
    /// Records rejected during cleaning
    pub skipped: usize,
}

impl SyncReport {
    fn new(resource: &RemoteResource) -> Self {
        Self {
            resource: resource.name().to_string(),
            ..Default::default()
        }
    }
}

/// Mirrors a user's remote library into the store
#[derive(Clone)]
pub struct SyncPipeline {
    store: LibraryStore,
    source: Arc<dyn LibrarySource>,
    refresher: Arc<dyn TokenRefresher>,
    config: SyncConfig,
}

impl SyncPipeline {
    pub fn new(
        store: LibraryStore,
        source: Arc<dyn LibrarySource>,
        refresher: Arc<dyn TokenRefresher>,
        config: SyncConfig,
    ) -> Self {
        Self {
            store,
            source,
            refresher,
            config,
        }
    }

    pub fn store(&self) -> &LibraryStore {
        &self.store
    }

    /// Sync playlists, albums, artists and tracks, in that order
    ///
    /// Stops at the first resource that fails; records stored by earlier
    /// resources stay in place.
    pub async fn sync_library(&self, user_id: Uuid) -> DashResult<Vec<SyncReport>> {
        info!(user = %user_id, "starting library sync");
        let reports = vec![
            self.sync_playlists(user_id).await?,
            self.sync_albums(user_id).await?,
            self.sync_artists(user_id).await?,
            self.sync_tracks(user_id).await?,
        ];
        info!(
            user = %user_id,
            synced = reports.iter().map(|r| r.synced.len()).sum::<usize>(),
            skipped = reports.iter().map(|r| r.skipped).sum::<usize>(),
            "library sync finished"
        );
        Ok(reports)
    }

    /// Saved and owned playlists
    pub async fn sync_playlists(&self, user_id: Uuid) -> DashResult<SyncReport> {
        let resource = RemoteResource::SavedPlaylists;
        let user = self.store.get_user(user_id)?;
        let raw = self.fetch_all(user_id, &resource).await?;
        let (playlists, mut report) = pre_sync(&resource, &raw, clean_playlist);

        for playlist in playlists {
            let owner = (playlist.owner_id == user.spotify_id).then_some(user_id);
            let stored = self.store.upsert(playlist.into_model(owner))?;
            self.complete::<Playlist>(user_id, &stored)?;
            report.synced.push((stored.id(), stored.name));
        }

        log_report(&report);
        Ok(report)
    }

    /// Tracks of one stored playlist, linked in remote order
    pub async fn sync_playlist_tracks(
        &self,
        user_id: Uuid,
        playlist_id: Uuid,
    ) -> DashResult<SyncReport> {
        let playlist: Playlist = self.store.require(playlist_id)?;
        let resource = RemoteResource::PlaylistTracks {
            playlist_id: playlist.spotify_id.clone(),
        };
        let raw = self.fetch_all(user_id, &resource).await?;
        let (tracks, mut report) = pre_sync(&resource, &raw, clean_track);

        for track in tracks {
            let stored = self.store_track(&track)?;
            self.store.link_playlist_track(playlist.id(), stored.id())?;
            self.store.mark_synced::<Track>(stored.id())?;
            report.synced.push((stored.id(), stored.name));
        }

        log_report(&report);
        Ok(report)
    }

    pub async fn sync_albums(&self, user_id: Uuid) -> DashResult<SyncReport> {
        let resource = RemoteResource::SavedAlbums;
        let raw = self.fetch_all(user_id, &resource).await?;
        let (albums, mut report) = pre_sync(&resource, &raw, clean_album);

        for album in albums {
            let stored = self.store.upsert(album.to_model())?;
            self.link_album(&stored, &album)?;
            self.complete::<Album>(user_id, &stored)?;
            report.synced.push((stored.id(), stored.name));
        }

        log_report(&report);
        Ok(report)
    }

    /// Followed artists
    pub async fn sync_artists(&self, user_id: Uuid) -> DashResult<SyncReport> {
        let resource = RemoteResource::FollowedArtists;
        let raw = self.fetch_all(user_id, &resource).await?;
        let (artists, mut report) = pre_sync(&resource, &raw, clean_artist);

        for artist in artists {
            let stored = self.store.upsert(artist.to_model())?;
            for genre in &artist.genres {
                let genre = self.store.upsert_genre(genre)?;
                self.store.link_artist_genre(stored.id(), genre.id())?;
            }
            self.complete::<Artist>(user_id, &stored)?;
            report.synced.push((stored.id(), stored.name));
        }

        log_report(&report);
        Ok(report)
    }

    /// Saved tracks
    pub async fn sync_tracks(&self, user_id: Uuid) -> DashResult<SyncReport> {
        let resource = RemoteResource::SavedTracks;
        let raw = self.fetch_all(user_id, &resource).await?;
        let (tracks, mut report) = pre_sync(&resource, &raw, clean_track);

        for track in tracks {
            let stored = self.store_track(&track)?;
            self.complete::<Track>(user_id, &stored)?;
            report.synced.push((stored.id(), stored.name));
        }

        log_report(&report);
        Ok(report)
    }

    /// Fetch every page of `resource`, honoring `max_items`
    pub async fn fetch_all(&self, user_id: Uuid, resource: &RemoteResource) -> DashResult<Vec<Value>> {
        let mut items = Vec::new();
        let mut cursor: Option<String> = None;
        let mut pages = 0usize;

        loop {
            let page = self.fetch_page(user_id, resource, cursor.as_deref()).await?;
            pages += 1;
            items.extend(page.items);

            if let Some(max) = self.config.max_items {
                if items.len() >= max {
                    items.truncate(max);
                    break;
                }
            }
            match page.next {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }

        debug!(%resource, pages, items = items.len(), "fetched remote records");
        Ok(items)
    }

    /// Fetch one page, refreshing the user's tokens once if they expired
    async fn fetch_page(
        &self,
        user_id: Uuid,
        resource: &RemoteResource,
        cursor: Option<&str>,
    ) -> DashResult<RemotePage> {
        let user = self.store.get_user(user_id)?;
        let limit = self.config.page_size;

        match self
            .source
            .fetch_page(resource, &user.access_token, cursor, limit)
            .await
        {
            Err(e) if e.is_expired_token() => {
                info!(user = %user_id, %resource, "access token expired, refreshing");
                let user = self.refresh_tokens(&user).await?;
                Ok(self
                    .source
                    .fetch_page(resource, &user.access_token, cursor, limit)
                    .await?)
            }
            result => Ok(result?),
        }
    }

    /// Exchange the user's refresh token and store the new tokens
    pub async fn refresh_tokens(&self, user: &AppUser) -> DashResult<AppUser> {
        let tokens = match self.refresher.refresh(&user.refresh_token).await {
            Ok(tokens) => tokens,
            Err(e) => {
                error!(user = %user.id(), "token refresh failed: {}", e);
                return Err(e.into());
            }
        };

        let Some(expiry) = Duration::try_seconds(tokens.expires_in)
            .and_then(|lifetime| Utc::now().checked_add_signed(lifetime))
        else {
            error!(
                user = %user.id(),
                expires_in = tokens.expires_in,
                "token refresh returned an unusable lifetime"
            );
            return Err(SyncError::RefreshFailed {
                message: format!("expires_in out of range: {}", tokens.expires_in),
            }
            .into());
        };

        self.store.update_user_tokens(
            user.id(),
            &tokens.access_token,
            tokens.refresh_token.as_deref(),
            expiry,
        )
    }

    fn complete<T: LibraryItem>(&self, user_id: Uuid, record: &T) -> DashResult<()> {
        self.store.mark_synced::<T>(record.id())?;
        self.store.add_to_library::<T>(user_id, record.id())?;
        Ok(())
    }

    /// Upsert a track with its album and artists
    fn store_track(&self, track: &SyncTrack) -> DashResult<Track> {
        let album_id = match &track.album {
            Some(album) => Some(self.ensure_album(album)?.id()),
            None => None,
        };
        let stored = self.store.upsert(track.to_model(album_id))?;
        for artist in &track.artists {
            let artist = self.ensure_artist(artist)?;
            self.store.link_track_artist(stored.id(), artist.id())?;
        }
        Ok(stored)
    }

    fn link_album(&self, album: &Album, synced: &SyncAlbum) -> DashResult<()> {
        for artist in &synced.artists {
            let artist = self.ensure_artist(artist)?;
            self.store.link_album_artist(album.id(), artist.id())?;
        }
        for genre in &synced.genres {
            let genre = self.store.upsert_genre(genre)?;
            self.store.link_album_genre(album.id(), genre.id())?;
        }
        Ok(())
    }

    /// Existing albums are left untouched; embedded albums carry less
    /// detail than saved ones
    fn ensure_album(&self, album: &SyncAlbum) -> DashResult<Album> {
        if let Some(existing) = self.store.find_by_spotify_id::<Album>(&album.spotify_id)? {
            return Ok(existing);
        }
        let stored = self.store.insert(album.to_model())?;
        self.link_album(&stored, album)?;
        Ok(stored)
    }

    fn ensure_artist(&self, artist: &SyncArtistRef) -> DashResult<Artist> {
        match self.store.find_by_spotify_id::<Artist>(&artist.spotify_id)? {
            Some(existing) => Ok(existing),
            None => self.store.insert(artist.clone().into_model()),
        }
    }
}

/// Clean every raw record, logging and counting the rejects
fn pre_sync<S>(
    resource: &RemoteResource,
    raw: &[Value],
    clean: impl Fn(&Value) -> Result<S, ValidationError>,
) -> (Vec<S>, SyncReport) {
    let mut report = SyncReport::new(resource);
    let mut valid = Vec::with_capacity(raw.len());

    for (position, record) in raw.iter().enumerate() {
        match clean(record) {
            Ok(record) => valid.push(record),
            Err(e) => {
                warn!(%resource, position, "skipping invalid record: {}", e);
                report.skipped += 1;
            }
        }
    }
    (valid, report)
}

fn log_report(report: &SyncReport) {
    info!(
        resource = %report.resource,
        synced = report.synced.len(),
        skipped = report.skipped,
        "sync complete"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::{DashError, SyncError};
    use crate::sync::TokenSet;
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Serves fixed pages and rejects every token except `valid_token`
    struct FakeSource {
        pages: HashMap<&'static str, Vec<Vec<Value>>>,
        valid_token: Mutex<String>,
        calls: AtomicUsize,
    }

    impl FakeSource {
        fn new(valid_token: &str) -> Self {
            Self {
                pages: HashMap::new(),
                valid_token: Mutex::new(valid_token.to_string()),
                calls: AtomicUsize::new(0),
            }
        }

        fn with_pages(mut self, resource: &'static str, pages: Vec<Vec<Value>>) -> Self {
            self.pages.insert(resource, pages);
            self
        }
    }

    #[async_trait]
    impl LibrarySource for FakeSource {
        async fn fetch_page(
            &self,
            resource: &RemoteResource,
            access_token: &str,
            cursor: Option<&str>,
            _limit: u32,
        ) -> Result<RemotePage, SyncError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if access_token != *self.valid_token.lock().unwrap() {
                return Err(SyncError::ExpiredToken);
            }
            let pages = self.pages.get(resource.name()).cloned().unwrap_or_default();
            let index: usize = cursor.map(|c| c.parse().unwrap()).unwrap_or(0);
            Ok(RemotePage {
                items: pages.get(index).cloned().unwrap_or_default(),
                next: (index + 1 < pages.len()).then(|| (index + 1).to_string()),
            })
        }
    }

    struct FakeRefresher {
        result: Result<TokenSet, SyncError>,
        calls: AtomicUsize,
    }

    impl FakeRefresher {
        fn issuing(access_token: &str) -> Self {
            Self {
                result: Ok(TokenSet {
                    access_token: access_token.to_string(),
                    refresh_token: Some("rotated".to_string()),
                    expires_in: 3600,
                }),
                calls: AtomicUsize::new(0),
            }
        }

        fn with_lifetime(mut self, expires_in: i64) -> Self {
            if let Ok(tokens) = &mut self.result {
                tokens.expires_in = expires_in;
            }
            self
        }

        fn failing() -> Self {
            Self {
                result: Err(SyncError::RefreshFailed {
                    message: "invalid_grant".to_string(),
                }),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl TokenRefresher for FakeRefresher {
        async fn refresh(&self, _refresh_token: &str) -> Result<TokenSet, SyncError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.result.clone()
        }
    }

    fn playlist(id: &str, owner: &str) -> Value {
        json!({
            "id": id,
            "name": format!("Playlist {id}"),
            "snapshot_id": "snap",
            "public": true,
            "collaborative": false,
            "owner": {"id": owner}
        })
    }

    fn setup(
        source: FakeSource,
        refresher: FakeRefresher,
        config: SyncConfig,
    ) -> (SyncPipeline, Arc<FakeSource>, Arc<FakeRefresher>, Uuid) {
        let store = LibraryStore::new();
        let user = store
            .insert_user(AppUser::new("me@example.com", "me", "token", "refresh"))
            .unwrap();
        let source = Arc::new(source);
        let refresher = Arc::new(refresher);
        let pipeline = SyncPipeline::new(store, source.clone(), refresher.clone(), config);
        (pipeline, source, refresher, user.id())
    }

    #[tokio::test]
    async fn test_fetch_all_follows_cursor() {
        let source = FakeSource::new("token").with_pages(
            "playlists",
            vec![vec![playlist("a", "me"), playlist("b", "me")], vec![playlist("c", "x")]],
        );
        let (pipeline, source, _, user_id) =
            setup(source, FakeRefresher::failing(), SyncConfig::default());

        let items = pipeline
            .fetch_all(user_id, &RemoteResource::SavedPlaylists)
            .await
            .unwrap();
        assert_eq!(items.len(), 3);
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_fetch_all_stops_at_max_items() {
        let source = FakeSource::new("token").with_pages(
            "playlists",
            vec![
                vec![playlist("a", "me"), playlist("b", "me")],
                vec![playlist("c", "me"), playlist("d", "me")],
                vec![playlist("e", "me")],
            ],
        );
        let config = SyncConfig {
            max_items: Some(3),
            ..Default::default()
        };
        let (pipeline, source, _, user_id) = setup(source, FakeRefresher::failing(), config);

        let items = pipeline
            .fetch_all(user_id, &RemoteResource::SavedPlaylists)
            .await
            .unwrap();
        assert_eq!(items.len(), 3);
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_expired_token_is_refreshed_once_and_retried() {
        let source =
            FakeSource::new("fresh").with_pages("playlists", vec![vec![playlist("a", "me")]]);
        let (pipeline, source, refresher, user_id) =
            setup(source, FakeRefresher::issuing("fresh"), SyncConfig::default());

        let report = pipeline.sync_playlists(user_id).await.unwrap();
        assert_eq!(report.synced.len(), 1);
        assert_eq!(refresher.calls.load(Ordering::SeqCst), 1);
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);

        let user = pipeline.store().get_user(user_id).unwrap();
        assert_eq!(user.access_token, "fresh");
        assert_eq!(user.refresh_token, "rotated");
        assert!(!user.token_expired(Utc::now()));
    }

    #[tokio::test]
    async fn test_refresh_failure_propagates() {
        let source = FakeSource::new("fresh");
        let (pipeline, source, refresher, user_id) =
            setup(source, FakeRefresher::failing(), SyncConfig::default());

        let err = pipeline.sync_playlists(user_id).await.unwrap_err();
        assert!(matches!(err, DashError::Sync(SyncError::RefreshFailed { .. })));
        assert_eq!(refresher.calls.load(Ordering::SeqCst), 1);
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_out_of_range_token_lifetime_fails_refresh() {
        let source = FakeSource::new("fresh");
        let refresher = FakeRefresher::issuing("fresh").with_lifetime(i64::MAX);
        let (pipeline, source, refresher, user_id) =
            setup(source, refresher, SyncConfig::default());

        let err = pipeline.sync_albums(user_id).await.unwrap_err();
        assert!(matches!(err, DashError::Sync(SyncError::RefreshFailed { .. })));
        assert_eq!(refresher.calls.load(Ordering::SeqCst), 1);
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);

        let user = pipeline.store().get_user(user_id).unwrap();
        assert_eq!(user.access_token, "token");
        assert_eq!(user.refresh_token, "refresh");
    }

    #[tokio::test]
    async fn test_second_expiry_is_not_retried_again() {
        // the refresher hands out a token the source still rejects
        let source = FakeSource::new("never");
        let (pipeline, source, refresher, user_id) =
            setup(source, FakeRefresher::issuing("stale"), SyncConfig::default());

        let err = pipeline.sync_playlists(user_id).await.unwrap_err();
        assert!(matches!(err, DashError::Sync(SyncError::ExpiredToken)));
        assert_eq!(refresher.calls.load(Ordering::SeqCst), 1);
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_sync_playlists_skips_invalid_and_completes_valid() {
        let mut no_owner = playlist("broken", "me");
        no_owner.as_object_mut().unwrap().remove("owner");
        let source = FakeSource::new("token").with_pages(
            "playlists",
            vec![vec![playlist("mine", "me"), no_owner, playlist("theirs", "someone")]],
        );
        let (pipeline, _, _, user_id) =
            setup(source, FakeRefresher::failing(), SyncConfig::default());

        let report = pipeline.sync_playlists(user_id).await.unwrap();
        assert_eq!(report.resource, "playlists");
        assert_eq!(report.synced.len(), 2);
        assert_eq!(report.skipped, 1);

        let store = pipeline.store();
        let mine = store.find_by_spotify_id::<Playlist>("mine").unwrap().unwrap();
        let theirs = store.find_by_spotify_id::<Playlist>("theirs").unwrap().unwrap();
        assert!(mine.is_synced);
        assert_eq!(mine.user_id, Some(user_id));
        assert_eq!(theirs.user_id, None);
        let tables = store.read().unwrap();
        assert!(tables.in_library::<Playlist>(user_id, mine.id()));
        assert!(tables.in_library::<Playlist>(user_id, theirs.id()));
    }

    #[tokio::test]
    async fn test_resync_keeps_ids() {
        let source =
            FakeSource::new("token").with_pages("playlists", vec![vec![playlist("a", "me")]]);
        let (pipeline, _, _, user_id) =
            setup(source, FakeRefresher::failing(), SyncConfig::default());

        let first = pipeline.sync_playlists(user_id).await.unwrap();
        let second = pipeline.sync_playlists(user_id).await.unwrap();
        assert_eq!(first.synced, second.synced);
        assert_eq!(pipeline.store().all::<Playlist>().count().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_sync_albums_links_artists_and_genres() {
        let album = json!({
            "album": {
                "id": "alb",
                "name": "Homogenic",
                "release_date": "1997-09-22",
                "artists": [{"id": "bjork", "name": "Björk"}],
                "genres": ["Art Pop"]
            }
        });
        let source = FakeSource::new("token").with_pages("albums", vec![vec![album]]);
        let (pipeline, _, _, user_id) =
            setup(source, FakeRefresher::failing(), SyncConfig::default());

        let report = pipeline.sync_albums(user_id).await.unwrap();
        assert_eq!(report.synced.len(), 1);

        let store = pipeline.store();
        let album = store.find_by_spotify_id::<Album>("alb").unwrap().unwrap();
        assert_eq!(album.release_year, 1997);
        let tables = store.read().unwrap();
        let artists: Vec<&str> = tables.album_artists(album.id()).map(|a| a.name.as_str()).collect();
        assert_eq!(artists, vec!["Björk"]);
        let genres: Vec<&str> = tables.album_genres(album.id()).map(|g| g.name.as_str()).collect();
        assert_eq!(genres, vec!["art pop"]);
        assert!(tables.in_library::<Album>(user_id, album.id()));
    }

    #[tokio::test]
    async fn test_sync_playlist_tracks_links_without_saving_to_library() {
        let track = json!({
            "track": {
                "id": "t1",
                "name": "Jóga",
                "duration_ms": 305_000,
                "album": {"id": "alb", "name": "Homogenic", "release_date": "1997"},
                "artists": [{"id": "bjork", "name": "Björk"}]
            }
        });
        let source = FakeSource::new("token")
            .with_pages("playlists", vec![vec![playlist("p", "me")]])
            .with_pages("playlist_tracks", vec![vec![track, json!({"track": null})]]);
        let (pipeline, _, _, user_id) =
            setup(source, FakeRefresher::failing(), SyncConfig::default());

        pipeline.sync_playlists(user_id).await.unwrap();
        let playlist_id = pipeline.store().find_by_spotify_id::<Playlist>("p").unwrap().unwrap().id();
        let report = pipeline.sync_playlist_tracks(user_id, playlist_id).await.unwrap();
        assert_eq!(report.resource, "playlist_tracks");
        assert_eq!(report.synced.len(), 1);
        assert_eq!(report.skipped, 1);

        let tables = pipeline.store().read().unwrap();
        let track = tables.playlist_tracks(playlist_id).next().unwrap();
        assert!(track.is_synced);
        assert_eq!(tables.album_of(track).unwrap().name, "Homogenic");
        assert_eq!(tables.track_artists(track.id()).count(), 1);
        assert!(!tables.in_library::<Track>(user_id, track.id()));
    }

    #[tokio::test]
    async fn test_sync_library_runs_every_resource() {
        let source = FakeSource::new("token")
            .with_pages("playlists", vec![vec![playlist("p", "me")]])
            .with_pages("artists", vec![vec![json!({"id": "a", "name": "Artist", "genres": ["dub"]})]])
            .with_pages("tracks", vec![vec![json!({"track": {"id": "t", "name": "Track"}})]]);
        let (pipeline, _, _, user_id) =
            setup(source, FakeRefresher::failing(), SyncConfig::default());

        let reports = pipeline.sync_library(user_id).await.unwrap();
        let summary: Vec<(&str, usize)> = reports
            .iter()
            .map(|r| (r.resource.as_str(), r.synced.len()))
            .collect();
        assert_eq!(
            summary,
            vec![("playlists", 1), ("albums", 0), ("artists", 1), ("tracks", 1)]
        );
    }
}
