//! Browse a synced library from the command line
//!
//! This demo:
//! - Syncs a small fixture library through the sync pipeline
//! - Recovers from an expired access token on the first request
//! - Runs a few filtered, sorted and paginated queries
//!
//! Run with `cargo run --example browse`, optionally passing a YAML config
//! path as the first argument.

use anyhow::Result;
use dashspot::prelude::*;
use serde_json::{Value, json};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Serves canned API responses; the first request sees an expired token
struct FixtureSource {
    expired: AtomicBool,
}

#[async_trait]
impl LibrarySource for FixtureSource {
    async fn fetch_page(
        &self,
        resource: &RemoteResource,
        _access_token: &str,
        cursor: Option<&str>,
        limit: u32,
    ) -> Result<RemotePage, SyncError> {
        if self.expired.swap(false, Ordering::SeqCst) {
            return Err(SyncError::ExpiredToken);
        }
        let items = fixture(resource);
        let start: usize = cursor.and_then(|c| c.parse().ok()).unwrap_or(0);
        let end = (start + limit as usize).min(items.len());
        Ok(RemotePage {
            items: items[start.min(end)..end].to_vec(),
            next: (end < items.len()).then(|| end.to_string()),
        })
    }
}

struct FixtureRefresher;

#[async_trait]
impl TokenRefresher for FixtureRefresher {
    async fn refresh(&self, _refresh_token: &str) -> Result<TokenSet, SyncError> {
        Ok(TokenSet {
            access_token: "fresh-token".to_string(),
            refresh_token: None,
            expires_in: 3600,
        })
    }
}

fn fixture(resource: &RemoteResource) -> Vec<Value> {
    match resource {
        RemoteResource::SavedPlaylists => vec![
            playlist("focus", "Deep Focus", "spotify", true),
            playlist("run", "Running Mix", "demo-user", true),
            playlist("late", "Late Night Drive", "demo-user", false),
            json!({"id": "broken", "name": "Missing owner", "snapshot_id": "s"}),
        ],
        RemoteResource::SavedAlbums => vec![
            album("kida", "Kid A", "2000-10-02", "Radiohead"),
            album("okc", "OK Computer", "1997-05-21", "Radiohead"),
            album("homo", "Homogenic", "1997-09-22", "Björk"),
            album("vesp", "Vespertine", "2001-08-27", "Björk"),
        ],
        RemoteResource::FollowedArtists => vec![
            json!({"id": "radiohead", "name": "Radiohead", "followers": {"total": 9_000_000u64}, "genres": ["art rock"]}),
            json!({"id": "bjork", "name": "Björk", "followers": {"total": 4_000_000u64}, "genres": ["art pop", "electronica"]}),
        ],
        RemoteResource::SavedTracks => vec![json!({
            "track": {
                "id": "idioteque",
                "name": "Idioteque",
                "duration_ms": 309_000,
                "artists": [{"id": "radiohead", "name": "Radiohead"}]
            }
        })],
        RemoteResource::PlaylistTracks { .. } => vec![],
    }
}

fn playlist(id: &str, name: &str, owner: &str, public: bool) -> Value {
    json!({
        "id": id,
        "name": name,
        "snapshot_id": format!("{id}-1"),
        "public": public,
        "collaborative": "",
        "owner": {"id": owner, "display_name": owner}
    })
}

fn album(id: &str, name: &str, date: &str, artist: &str) -> Value {
    json!({
        "album": {
            "id": id,
            "name": name,
            "album_type": "album",
            "release_date": date,
            "artists": [{"id": artist.to_lowercase(), "name": artist}]
        }
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = match std::env::args().nth(1) {
        Some(path) => AppConfig::from_yaml_file(path)?,
        None => AppConfig::default(),
    };
    init_tracing(&config.logging);

    println!("dashspot library browser");
    println!("========================\n");

    let store = LibraryStore::new();
    let user = store.insert_user(AppUser::new(
        "demo@example.com",
        "demo-user",
        "expired-token",
        "refresh-token",
    ))?;

    let pipeline = SyncPipeline::new(
        store.clone(),
        Arc::new(FixtureSource {
            expired: AtomicBool::new(true),
        }),
        Arc::new(FixtureRefresher),
        config.sync.clone(),
    );
    for report in pipeline.sync_library(user.id()).await? {
        println!(
            "synced {:<10} {:>2} stored, {} skipped",
            report.resource,
            report.synced.len(),
            report.skipped
        );
    }
    println!();

    let filters = FilterSets::new(&store, &config)?;
    let auth = AuthContext::from(Principal::from(&user));

    let queries = [
        ("playlists", "my_playlist=true&sort=name"),
        ("albums", "released_before=2000&sort=release_year,name"),
        ("albums", "artist=björk&sort=release_year&release_year_dir=desc"),
        ("artists", "genre=art%20pop"),
    ];
    for (resource, query) in queries {
        let params = ParameterSet::from_query_str(query);
        let request = PageRequest::from_params(&params, &config.pagination)?;
        let names: Vec<String> = match resource {
            "playlists" => filters
                .playlists
                .apply(&auth, &params, None)?
                .paginate(request)?
                .data
                .into_iter()
                .map(|p| p.name)
                .collect(),
            "albums" => filters
                .albums
                .apply(&auth, &params, None)?
                .paginate(request)?
                .data
                .into_iter()
                .map(|a| format!("{} ({})", a.name, a.release_year))
                .collect(),
            _ => filters
                .artists
                .apply(&auth, &params, None)?
                .paginate(request)?
                .data
                .into_iter()
                .map(|a| a.name)
                .collect(),
        };
        println!("GET /{resource}?{query}");
        for name in names {
            println!("   - {name}");
        }
    }

    let bad = ParameterSet::from_query_str("public=notabool");
    if let Err(e) = filters.playlists.apply(&auth, &bad, None) {
        println!("\nGET /playlists?public=notabool -> {} {}", e.status_code(), e.to_response().code);
    }

    Ok(())
}
