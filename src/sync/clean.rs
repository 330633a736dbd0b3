//! Raw remote records to validated sync records
//!
//! The remote API returns loosely shaped JSON. Each `clean_*` function reads
//! one record into a permissive raw shape, normalizes it, and validates the
//! result. A record that fails here is skipped by the pipeline; it never
//! reaches the store.

use crate::core::error::{FieldValidationError, ValidationError};
use crate::core::field::{parse_bool, release_year};
use crate::models::{Album, Artist, Playlist, Track};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, PartialEq, Validate)]
pub struct SyncPlaylist {
    #[validate(length(min = 1, message = "playlist has no id"))]
    pub spotify_id: String,
    #[validate(length(min = 1, message = "playlist has no name"))]
    pub name: String,
    #[validate(length(min = 1, message = "playlist has no snapshot id"))]
    pub version: String,
    #[validate(url(message = "image link is not a URL"))]
    pub image_url: Option<String>,
    pub public: bool,
    pub collaborative: bool,
    pub description: Option<String>,
    #[validate(length(min = 1, message = "playlist has no owner"))]
    pub owner_id: String,
    pub owner_name: Option<String>,
}

impl SyncPlaylist {
    /// `user_id` is the local owner, when the playlist belongs to the user
    /// being synced
    pub fn into_model(self, user_id: Option<Uuid>) -> Playlist {
        Playlist {
            version: Some(self.version),
            image_url: self.image_url,
            public: Some(self.public),
            shared: Some(self.collaborative),
            description: self.description,
            owner_name: self.owner_name,
            user_id,
            ..Playlist::new(self.spotify_id, self.name, self.owner_id)
        }
    }
}

/// An artist as referenced from an album or track
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncArtistRef {
    pub spotify_id: String,
    pub name: String,
}

impl SyncArtistRef {
    pub fn into_model(self) -> Artist {
        Artist::new(self.spotify_id, self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Validate)]
pub struct SyncAlbum {
    #[validate(length(min = 1, message = "album has no id"))]
    pub spotify_id: String,
    #[validate(length(min = 1, message = "album has no name"))]
    pub name: String,
    pub album_type: Option<String>,
    #[validate(url(message = "image link is not a URL"))]
    pub image_url: Option<String>,
    pub label: Option<String>,
    pub copyright: Option<String>,
    #[validate(range(min = 1000, max = 9999, message = "release date has no year"))]
    pub release_year: i32,
    pub artists: Vec<SyncArtistRef>,
    pub genres: Vec<String>,
}

impl SyncAlbum {
    pub fn to_model(&self) -> Album {
        Album {
            album_type: self.album_type.clone(),
            image_url: self.image_url.clone(),
            label: self.label.clone(),
            copyright: self.copyright.clone(),
            ..Album::new(self.spotify_id.clone(), self.name.clone(), self.release_year)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Validate)]
pub struct SyncArtist {
    #[validate(length(min = 1, message = "artist has no id"))]
    pub spotify_id: String,
    #[validate(length(min = 1, message = "artist has no name"))]
    pub name: String,
    #[validate(url(message = "image link is not a URL"))]
    pub image_url: Option<String>,
    pub follower_count: Option<u64>,
    pub genres: Vec<String>,
}

impl SyncArtist {
    pub fn to_model(&self) -> Artist {
        Artist {
            image_url: self.image_url.clone(),
            follower_count: self.follower_count,
            ..Artist::new(self.spotify_id.clone(), self.name.clone())
        }
    }
}

#[derive(Debug, Clone, PartialEq, Validate)]
pub struct SyncTrack {
    #[validate(length(min = 1, message = "track has no id"))]
    pub spotify_id: String,
    #[validate(length(min = 1, message = "track has no name"))]
    pub name: String,
    pub duration_ms: u64,
    /// Albums embedded in track records are partial; an embedded album that
    /// fails validation is dropped rather than rejecting the track
    pub album: Option<SyncAlbum>,
    pub artists: Vec<SyncArtistRef>,
}

impl SyncTrack {
    pub fn to_model(&self, album_id: Option<Uuid>) -> Track {
        Track {
            album_id,
            ..Track::new(self.spotify_id.clone(), self.name.clone(), self.duration_ms)
        }
    }
}

// --- raw shapes ---

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawImage {
    url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawOwner {
    id: Option<String>,
    display_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawPlaylist {
    id: Option<String>,
    name: Option<String>,
    snapshot_id: Option<String>,
    images: Option<Vec<RawImage>>,
    #[serde(deserialize_with = "loose_bool")]
    public: bool,
    #[serde(deserialize_with = "loose_bool")]
    collaborative: bool,
    description: Option<String>,
    owner: Option<RawOwner>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawArtistRef {
    id: Option<String>,
    name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawCopyright {
    text: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawAlbum {
    id: Option<String>,
    name: Option<String>,
    album_type: Option<String>,
    release_date: Option<String>,
    images: Option<Vec<RawImage>>,
    label: Option<String>,
    copyrights: Option<Vec<RawCopyright>>,
    artists: Option<Vec<RawArtistRef>>,
    genres: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawFollowers {
    total: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawArtist {
    id: Option<String>,
    name: Option<String>,
    images: Option<Vec<RawImage>>,
    followers: Option<RawFollowers>,
    genres: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawTrack {
    id: Option<String>,
    name: Option<String>,
    duration_ms: Option<u64>,
    album: Option<Value>,
    artists: Option<Vec<RawArtistRef>>,
}

/// The remote API reports unset flags as `null` or `""`
fn loose_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Bool(flag)) => flag,
        Some(Value::String(raw)) => parse_bool("flag", &raw).unwrap_or(false),
        _ => false,
    })
}

// --- cleaning ---

pub fn clean_playlist(raw: &Value) -> Result<SyncPlaylist, ValidationError> {
    let raw: RawPlaylist = read(raw)?;
    let owner = raw.owner.unwrap_or_default();

    let playlist = SyncPlaylist {
        spotify_id: text(raw.id),
        name: text(raw.name),
        version: text(raw.snapshot_id),
        image_url: first_image(raw.images),
        public: raw.public,
        collaborative: raw.collaborative,
        description: non_empty(raw.description),
        owner_id: text(owner.id),
        owner_name: non_empty(owner.display_name),
    };
    playlist.validate()?;
    Ok(playlist)
}

/// Accepts a bare album or a saved-album item (`{"album": {...}}`)
pub fn clean_album(raw: &Value) -> Result<SyncAlbum, ValidationError> {
    let raw: RawAlbum = read(unwrap_item(raw, "album"))?;

    let album = SyncAlbum {
        spotify_id: text(raw.id),
        name: text(raw.name),
        album_type: non_empty(raw.album_type),
        image_url: first_image(raw.images),
        label: non_empty(raw.label),
        copyright: raw
            .copyrights
            .unwrap_or_default()
            .into_iter()
            .find_map(|c| non_empty(c.text)),
        release_year: raw
            .release_date
            .as_deref()
            .and_then(release_year)
            .unwrap_or_default(),
        artists: artist_refs(raw.artists),
        genres: genres(raw.genres),
    };
    album.validate()?;
    Ok(album)
}

pub fn clean_artist(raw: &Value) -> Result<SyncArtist, ValidationError> {
    let raw: RawArtist = read(raw)?;

    let artist = SyncArtist {
        spotify_id: text(raw.id),
        name: text(raw.name),
        image_url: first_image(raw.images),
        follower_count: raw.followers.and_then(|f| f.total),
        genres: genres(raw.genres),
    };
    artist.validate()?;
    Ok(artist)
}

/// Accepts a bare track or a saved/playlist item (`{"track": {...}}`)
///
/// Items whose track is `null` (removed or local-only tracks) are invalid.
pub fn clean_track(raw: &Value) -> Result<SyncTrack, ValidationError> {
    let item = unwrap_item(raw, "track");
    if item.is_null() {
        return Err(ValidationError::MissingField {
            field: "track".to_string(),
        });
    }
    let raw: RawTrack = read(item)?;

    let album = match raw.album.as_ref() {
        Some(album) if !album.is_null() => match clean_album(album) {
            Ok(album) => Some(album),
            Err(e) => {
                tracing::debug!(error = %e, "dropping unusable embedded album");
                None
            }
        },
        _ => None,
    };

    let track = SyncTrack {
        spotify_id: text(raw.id),
        name: text(raw.name),
        duration_ms: raw.duration_ms.unwrap_or_default(),
        album,
        artists: artist_refs(raw.artists),
    };
    track.validate()?;
    Ok(track)
}

fn read<T: DeserializeOwned>(raw: &Value) -> Result<T, ValidationError> {
    T::deserialize(raw).map_err(|e| {
        ValidationError::FieldErrors(vec![FieldValidationError {
            field: "record".to_string(),
            message: e.to_string(),
        }])
    })
}

fn unwrap_item<'a>(raw: &'a Value, key: &str) -> &'a Value {
    raw.get(key).unwrap_or(raw)
}

fn text(value: Option<String>) -> String {
    value.map(|v| v.trim().to_string()).unwrap_or_default()
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn first_image(images: Option<Vec<RawImage>>) -> Option<String> {
    images
        .unwrap_or_default()
        .into_iter()
        .next()
        .and_then(|image| non_empty(image.url))
}

/// References without an id or name are dropped
fn artist_refs(artists: Option<Vec<RawArtistRef>>) -> Vec<SyncArtistRef> {
    artists
        .unwrap_or_default()
        .into_iter()
        .filter_map(|artist| {
            Some(SyncArtistRef {
                spotify_id: non_empty(artist.id)?,
                name: non_empty(artist.name)?,
            })
        })
        .collect()
}

fn genres(genres: Option<Vec<String>>) -> Vec<String> {
    let mut cleaned: Vec<String> = Vec::new();
    for genre in genres.unwrap_or_default() {
        let genre = genre.trim().to_lowercase();
        if !genre.is_empty() && !cleaned.contains(&genre) {
            cleaned.push(genre);
        }
    }
    cleaned
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn playlist_json() -> Value {
        json!({
            "id": "37i9dQZF1DX4sWSpwq3LiO",
            "name": "Peaceful Piano",
            "snapshot_id": "MTY4NjEyMzQ1Ng==",
            "images": [{"url": "https://i.scdn.co/image/ab67706f"}],
            "public": true,
            "collaborative": "",
            "description": "Relax and indulge",
            "owner": {"id": "spotify", "display_name": "Spotify"}
        })
    }

    fn field_names(err: ValidationError) -> Vec<String> {
        match err {
            ValidationError::FieldErrors(fields) => fields.into_iter().map(|f| f.field).collect(),
            other => panic!("expected field errors, got {other:?}"),
        }
    }

    #[test]
    fn test_clean_playlist() {
        let playlist = clean_playlist(&playlist_json()).unwrap();
        assert_eq!(playlist.spotify_id, "37i9dQZF1DX4sWSpwq3LiO");
        assert_eq!(playlist.version, "MTY4NjEyMzQ1Ng==");
        assert_eq!(playlist.owner_id, "spotify");
        assert_eq!(playlist.owner_name.as_deref(), Some("Spotify"));
        assert!(playlist.public);
        assert!(!playlist.collaborative);
        assert_eq!(
            playlist.image_url.as_deref(),
            Some("https://i.scdn.co/image/ab67706f")
        );
    }

    #[test]
    fn test_clean_playlist_null_flags_are_false() {
        let mut raw = playlist_json();
        raw["public"] = Value::Null;
        raw["collaborative"] = json!("");
        let playlist = clean_playlist(&raw).unwrap();
        assert!(!playlist.public);
        assert!(!playlist.collaborative);
    }

    #[test]
    fn test_clean_playlist_requires_owner_and_snapshot() {
        let mut raw = playlist_json();
        raw.as_object_mut().unwrap().remove("owner");
        raw["snapshot_id"] = Value::Null;
        let err = clean_playlist(&raw).unwrap_err();
        assert_eq!(field_names(err), vec!["owner_id", "version"]);
    }

    #[test]
    fn test_clean_playlist_without_images() {
        let mut raw = playlist_json();
        raw["images"] = json!([]);
        assert_eq!(clean_playlist(&raw).unwrap().image_url, None);
    }

    #[test]
    fn test_clean_playlist_rejects_bad_image_link() {
        let mut raw = playlist_json();
        raw["images"] = json!([{"url": "not a link"}]);
        let err = clean_playlist(&raw).unwrap_err();
        assert_eq!(field_names(err), vec!["image_url"]);
    }

    #[test]
    fn test_clean_album_from_saved_item() {
        let raw = json!({
            "added_at": "2024-01-01T00:00:00Z",
            "album": {
                "id": "1ATL5GLyefJaxhQzSPVrLX",
                "name": "Evermore",
                "album_type": "album",
                "release_date": "2020-12-11",
                "label": "Republic Records",
                "copyrights": [{"text": "© 2020 Taylor Swift", "type": "C"}],
                "artists": [{"id": "06HL4z0CvFAxyc27GXpf02", "name": "Taylor Swift"}, {"name": "nameless"}],
                "genres": ["Pop", " pop", ""]
            }
        });
        let album = clean_album(&raw).unwrap();
        assert_eq!(album.release_year, 2020);
        assert_eq!(album.copyright.as_deref(), Some("© 2020 Taylor Swift"));
        assert_eq!(album.artists.len(), 1);
        assert_eq!(album.genres, vec!["pop"]);
    }

    #[test]
    fn test_clean_album_year_precision() {
        for (date, year) in [("1997", 1997), ("1997-05", 1997), ("1997-05-21", 1997)] {
            let album = clean_album(&json!({"id": "a", "name": "A", "release_date": date})).unwrap();
            assert_eq!(album.release_year, year);
        }

        let err = clean_album(&json!({"id": "a", "name": "A", "release_date": "May 1997"}))
            .unwrap_err();
        assert_eq!(field_names(err), vec!["release_year"]);
    }

    #[test]
    fn test_clean_artist() {
        let raw = json!({
            "id": "4Z8W4fKeB5YxbusRsdQVPb",
            "name": "Radiohead",
            "followers": {"total": 9_000_000u64},
            "genres": ["art rock", "alternative rock"],
            "images": []
        });
        let artist = clean_artist(&raw).unwrap();
        assert_eq!(artist.follower_count, Some(9_000_000));
        assert_eq!(artist.genres.len(), 2);
        assert!(clean_artist(&json!({"id": "x"})).is_err());
    }

    #[test]
    fn test_clean_track_keeps_track_when_album_is_partial() {
        let raw = json!({
            "track": {
                "id": "3n3Ppam7vgaVa1iaRUc9Lp",
                "name": "Mr. Brightside",
                "duration_ms": 222_075,
                "album": {"id": "4OHNH3sDzIxnmUADXzv2kT", "name": "Hot Fuss"},
                "artists": [{"id": "0C0XlULifJtAgn6ZNCW2eu", "name": "The Killers"}]
            }
        });
        let track = clean_track(&raw).unwrap();
        assert_eq!(track.duration_ms, 222_075);
        assert_eq!(track.album, None);
        assert_eq!(track.artists[0].name, "The Killers");
    }

    #[test]
    fn test_clean_track_rejects_removed_track() {
        let err = clean_track(&json!({"added_at": "2024-01-01", "track": null})).unwrap_err();
        assert!(matches!(err, ValidationError::MissingField { .. }));
        assert!(clean_track(&json!({"track": {"id": null, "name": "local file"}})).is_err());
    }

    #[test]
    fn test_wrong_shape_is_a_record_error() {
        let err = clean_playlist(&json!({"id": 42})).unwrap_err();
        assert_eq!(field_names(err), vec!["record"]);
    }

    #[test]
    fn test_into_model() {
        let owner = Uuid::new_v4();
        let playlist = clean_playlist(&playlist_json()).unwrap().into_model(Some(owner));
        assert_eq!(playlist.user_id, Some(owner));
        assert_eq!(playlist.shared, Some(false));
        assert!(!playlist.is_synced);
    }
}
