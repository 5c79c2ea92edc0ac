//! Jellyfin HTTP client.
//!
//! Blocking `ureq` requests against the Jellyfin REST API. Authentication
//! uses the MediaBrowser authorization header and yields an access token that
//! every later request sends as `X-Emby-Token`.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{Album, Artist, Catalog, Genre, Track};
use crate::config::Config;
use crate::constants::{CLIENT_NAME, CLIENT_VERSION, UNKNOWN_ALBUM, UNKNOWN_ARTIST, UNKNOWN_TITLE};
use crate::error::{PlayerError, Result};
use crate::navigation::NavigationContext;
use crate::servers::ServerEntry;

/// Token and user id returned by a successful login
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSession {
    pub token: String,
    pub user_id: String,
}

#[derive(Serialize)]
struct AuthRequest<'a> {
    #[serde(rename = "Username")]
    username: &'a str,
    #[serde(rename = "Pw")]
    password: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AuthResponse {
    access_token: String,
    user: AuthUser,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AuthUser {
    id: String,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "PascalCase")]
struct ItemsResponse {
    #[serde(default)]
    items: Vec<BaseItem>,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "PascalCase")]
struct BaseItem {
    id: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    album: Option<String>,
    #[serde(default)]
    album_id: Option<String>,
    #[serde(default)]
    album_artist: Option<String>,
    #[serde(default)]
    artists: Vec<String>,
    #[serde(default)]
    index_number: Option<u32>,
}

impl BaseItem {
    fn display_name(&self, fallback: &str) -> String {
        self.name
            .clone()
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| fallback.to_string())
    }

    /// First credited artist, then album artist
    fn primary_artist(&self) -> String {
        self.artists
            .first()
            .cloned()
            .or_else(|| self.album_artist.clone())
            .filter(|a| !a.is_empty())
            .unwrap_or_else(|| UNKNOWN_ARTIST.to_string())
    }

    fn into_track(self) -> Track {
        Track {
            title: self.display_name(UNKNOWN_TITLE),
            artist: self.primary_artist(),
            album: self.album.clone().unwrap_or_else(|| UNKNOWN_ALBUM.to_string()),
            album_id: self.album_id.clone(),
            index: self.index_number,
            id: self.id,
        }
    }

    fn into_album(self) -> Album {
        Album {
            name: self.display_name(UNKNOWN_ALBUM),
            artist: self
                .album_artist
                .clone()
                .or_else(|| self.artists.first().cloned())
                .unwrap_or_else(|| UNKNOWN_ARTIST.to_string()),
            id: self.id,
        }
    }
}

fn authorization_header(device: &str, username: &str) -> String {
    format!(
        "MediaBrowser Client=\"{CLIENT_NAME}\", Device=\"{device}\", DeviceId=\"fzf-{username}\", Version=\"{CLIENT_VERSION}\""
    )
}

fn build_agent(timeout: Duration, verify_tls: bool) -> ureq::Agent {
    let config = ureq::Agent::config_builder()
        .timeout_global(Some(timeout))
        .tls_config(
            ureq::tls::TlsConfig::builder()
                .disable_verification(!verify_tls)
                .build(),
        )
        .build();
    config.into()
}

/// Log in with a username and password
pub fn authenticate(
    agent: &ureq::Agent,
    base_url: &str,
    username: &str,
    password: &str,
    device: &str,
) -> Result<AuthSession> {
    let url = format!("{}/Users/AuthenticateByName", base_url.trim_end_matches('/'));
    log::info!("Authenticating {username} against {base_url}");

    let resp = agent
        .post(&url)
        .header("X-Emby-Authorization", &authorization_header(device, username))
        .send_json(AuthRequest { username, password })?;
    let auth: AuthResponse = read_json(resp, "Users/AuthenticateByName")?;

    Ok(AuthSession {
        token: auth.access_token,
        user_id: auth.user.id,
    })
}

fn read_json<T: DeserializeOwned>(
    mut resp: ureq::http::Response<ureq::Body>,
    label: &str,
) -> Result<T> {
    let body = resp
        .body_mut()
        .read_to_string()
        .map_err(|e| PlayerError::Upstream(format!("read /{label} response body: {e}")))?;
    serde_json::from_str(&body)
        .map_err(|e| PlayerError::Upstream(format!("decode /{label} response: {e}")))
}

/// Query parameters selecting the tracks of a navigation context
fn track_query(context: &NavigationContext) -> Vec<(&'static str, String)> {
    let mut params = vec![
        ("IncludeItemTypes", "Audio".to_string()),
        ("Recursive", "true".to_string()),
        ("Fields", "AlbumArtist,Album,Artist,Artists".to_string()),
        ("SortBy", "Album,SortName".to_string()),
        ("SortOrder", "Ascending".to_string()),
    ];
    match context {
        NavigationContext::Album { album_id, .. } => {
            params.push(("ParentId", album_id.clone()));
        }
        NavigationContext::Artist { artist_id, .. } => {
            params.push(("ArtistIds", artist_id.clone()));
        }
        NavigationContext::ArtistAlbum {
            artist_id,
            album_id,
            ..
        } => {
            params.push(("ParentId", album_id.clone()));
            params.push(("ArtistIds", artist_id.clone()));
        }
        NavigationContext::Genre { genre_id, .. } => {
            params.push(("GenreIds", genre_id.clone()));
        }
        NavigationContext::SongSearch { query } => {
            params.push(("SearchTerm", query.clone()));
        }
    }
    params
}

fn album_query() -> Vec<(&'static str, String)> {
    vec![
        ("IncludeItemTypes", "MusicAlbum".to_string()),
        ("Recursive", "true".to_string()),
        ("Fields", "AlbumArtist,Album".to_string()),
        ("SortBy", "Album,SortName".to_string()),
        ("SortOrder", "Ascending".to_string()),
    ]
}

/// Authenticated Jellyfin catalog
pub struct JellyfinClient {
    agent: ureq::Agent,
    base_url: String,
    session: AuthSession,
    audio_bitrate: u32,
}

impl JellyfinClient {
    pub fn new(agent: ureq::Agent, base_url: &str, session: AuthSession, audio_bitrate: u32) -> Self {
        Self {
            agent,
            base_url: base_url.trim_end_matches('/').to_string(),
            session,
            audio_bitrate,
        }
    }

    /// Build an agent from config, log in, and return a ready client
    pub fn connect(config: &Config, server: &ServerEntry) -> Result<Self> {
        let agent = build_agent(config.request_timeout(), config.verify_tls);
        let session = authenticate(
            &agent,
            &server.url,
            &server.username,
            &server.password,
            &config.device_name,
        )?;
        log::info!("Logged in as user {}", session.user_id);
        Ok(Self::new(agent, &server.url, session, config.audio_bitrate))
    }

    fn user_path(&self) -> String {
        urlencoding::encode(&self.session.user_id).into_owned()
    }

    fn get_items(&self, path: &str, params: &[(&'static str, String)]) -> Result<Vec<BaseItem>> {
        let url = format!("{}/{}", self.base_url, path);
        let mut request = self
            .agent
            .get(&url)
            .header("X-Emby-Token", &self.session.token)
            .query("UserId", &self.session.user_id);
        for (key, value) in params {
            request = request.query(*key, value);
        }
        log::debug!("GET {url} {params:?}");
        let resp = request.call()?;
        let items: ItemsResponse = read_json(resp, path)?;
        Ok(items.items)
    }

    fn user_items(&self, params: &[(&'static str, String)]) -> Result<Vec<BaseItem>> {
        let path = format!("Users/{}/Items", self.user_path());
        self.get_items(&path, params)
    }
}

impl Catalog for JellyfinClient {
    fn albums(&self) -> Result<Vec<Album>> {
        Ok(self
            .user_items(&album_query())?
            .into_iter()
            .map(BaseItem::into_album)
            .collect())
    }

    fn artists(&self) -> Result<Vec<Artist>> {
        let params = [("SortBy", "SortName".to_string())];
        Ok(self
            .get_items("Artists/AlbumArtists", &params)?
            .into_iter()
            .map(|item| Artist {
                name: item.display_name(UNKNOWN_ARTIST),
                id: item.id,
            })
            .collect())
    }

    fn albums_by_artist(&self, artist_id: &str) -> Result<Vec<Album>> {
        let mut params = album_query();
        params.push(("AlbumArtistIds", artist_id.to_string()));
        Ok(self
            .user_items(&params)?
            .into_iter()
            .map(BaseItem::into_album)
            .collect())
    }

    fn genres(&self) -> Result<Vec<Genre>> {
        let params = [("SortBy", "SortName".to_string())];
        Ok(self
            .get_items("MusicGenres", &params)?
            .into_iter()
            .map(|item| Genre {
                name: item.display_name("Unknown Genre"),
                id: item.id,
            })
            .collect())
    }

    fn list_tracks(&self, context: &NavigationContext) -> Result<Vec<Track>> {
        Ok(self
            .user_items(&track_query(context))?
            .into_iter()
            .map(BaseItem::into_track)
            .collect())
    }

    fn stream_locator(&self, track_id: &str) -> Result<String> {
        Ok(stream_url(
            &self.base_url,
            &self.session,
            track_id,
            self.audio_bitrate,
        ))
    }
}

fn stream_url(base_url: &str, session: &AuthSession, track_id: &str, bitrate: u32) -> String {
    format!(
        "{base_url}/Audio/{}/stream?UserId={}&api_key={}&container=mp3&audioCodec=mp3&transcodingContainer=mp3&transcodingProtocol=ffmpeg&maxAudioChannels=2&audioBitRate={bitrate}&static=true",
        urlencoding::encode(track_id),
        urlencoding::encode(&session.user_id),
        urlencoding::encode(&session.token),
    )
}
