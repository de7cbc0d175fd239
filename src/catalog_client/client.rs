//! Blocking HTTP client for a Spotify-compatible Web API.

use super::error::{ClientError, ClientResult};
use super::models::{
    best_image_url, AlbumsResponse, CatalogAlbum, Page, TokenResponse, TracksResponse, WireAlbum,
    WireArtist, WirePlaylist, WirePlaylistItem, WireTrack,
};
use super::CatalogClient;
use crate::catalog_store::{AlbumRecord, ArtistRecord, PlaylistRecord, TrackRecord};
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use std::cell::RefCell;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Client-credentials pair for the token endpoint.
#[derive(Clone)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

struct AccessToken {
    value: String,
    expires_at: Instant,
}

/// Catalog client backed by the Web API.
pub struct WebApiClient {
    client: Client,
    base_url: String,
    token_url: String,
    credentials: Credentials,
    token: RefCell<Option<AccessToken>>,
}

impl WebApiClient {
    /// Create a new client.
    ///
    /// # Arguments
    /// * `base_url` - API root (e.g., "https://api.spotify.com/v1")
    /// * `token_url` - OAuth token endpoint
    /// * `timeout_sec` - Request timeout in seconds
    pub fn new(
        base_url: &str,
        token_url: &str,
        credentials: Credentials,
        timeout_sec: u64,
    ) -> ClientResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_sec))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token_url: token_url.to_string(),
            credentials,
            token: RefCell::new(None),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn access_token(&self) -> ClientResult<String> {
        if let Some(token) = self.token.borrow().as_ref() {
            if token.expires_at > Instant::now() {
                return Ok(token.value.clone());
            }
        }

        debug!("Requesting catalog API access token");
        let response = self
            .client
            .post(&self.token_url)
            .basic_auth(
                &self.credentials.client_id,
                Some(&self.credentials.client_secret),
            )
            .form(&[("grant_type", "client_credentials")])
            .send()?;
        let response = check_status(&self.token_url, response)?;
        let token: TokenResponse = Self::decode(&self.token_url, response)?;

        // Refresh a minute early so a token never expires mid-request.
        let lifetime = Duration::from_secs(token.expires_in.saturating_sub(60));
        *self.token.borrow_mut() = Some(AccessToken {
            value: token.access_token.clone(),
            expires_at: Instant::now() + lifetime,
        });
        Ok(token.access_token)
    }

    fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> ClientResult<T> {
        let url = format!("{}/{}", self.base_url, path);
        let token = self.access_token()?;
        let request: RequestBuilder = self.client.get(&url).bearer_auth(token).query(query);
        debug!("GET {} {:?}", url, query);

        let response = match check_status(&url, request.send()?) {
            Err(ClientError::Auth(status)) => {
                self.token.borrow_mut().take();
                return Err(ClientError::Auth(status));
            }
            other => other?,
        };
        Self::decode(&url, response)
    }

    fn decode<T: DeserializeOwned>(url: &str, response: Response) -> ClientResult<T> {
        let body = response.text()?;
        serde_json::from_str(&body).map_err(|source| ClientError::Decode {
            url: url.to_string(),
            source,
        })
    }

    fn get_by_id<T: DeserializeOwned>(
        &self,
        kind: &'static str,
        path: &str,
        id: &str,
    ) -> ClientResult<T> {
        match self.get(&format!("{}/{}", path, id), &[]) {
            Err(ClientError::Status { status: 404, .. }) => Err(ClientError::NotFound {
                kind,
                id: id.to_string(),
            }),
            other => other,
        }
    }
}

fn check_status(url: &str, response: Response) -> ClientResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            Err(ClientError::Auth(status.as_u16()))
        }
        StatusCode::TOO_MANY_REQUESTS => {
            let retry_after = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok());
            warn!("Rate limited by catalog API, retry after {:?}s", retry_after);
            Err(ClientError::RateLimited { retry_after })
        }
        _ => Err(ClientError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        }),
    }
}

fn page_query(limit: u32, offset: u32) -> [(&'static str, String); 2] {
    [("limit", limit.to_string()), ("offset", offset.to_string())]
}

impl CatalogClient for WebApiClient {
    fn track(&self, id: &str) -> ClientResult<TrackRecord> {
        let track: WireTrack = self.get_by_id("track", "tracks", id)?;
        track.into_record(None)
    }

    fn tracks(&self, ids: &[String]) -> ClientResult<Vec<TrackRecord>> {
        let response: TracksResponse = self.get("tracks", &[("ids", ids.join(","))])?;
        response
            .tracks
            .into_iter()
            .flatten()
            .map(|track| track.into_record(None))
            .collect()
    }

    fn album(&self, id: &str) -> ClientResult<CatalogAlbum> {
        let album: WireAlbum = self.get_by_id("album", "albums", id)?;
        album.into_catalog_album()
    }

    fn albums(&self, ids: &[String]) -> ClientResult<Vec<CatalogAlbum>> {
        let response: AlbumsResponse = self.get("albums", &[("ids", ids.join(","))])?;
        response
            .albums
            .into_iter()
            .flatten()
            .map(WireAlbum::into_catalog_album)
            .collect()
    }

    fn album_tracks(
        &self,
        album: &AlbumRecord,
        limit: u32,
        offset: u32,
    ) -> ClientResult<Page<TrackRecord>> {
        let page: Page<WireTrack> = self.get(
            &format!("albums/{}/tracks", album.id),
            &page_query(limit, offset),
        )?;
        page.try_map(|track| track.into_record(Some(album)))
    }

    fn artist(&self, id: &str) -> ClientResult<ArtistRecord> {
        let artist: WireArtist = self.get_by_id("artist", "artists", id)?;
        Ok(artist.into_record())
    }

    fn artist_albums(&self, id: &str, limit: u32, offset: u32) -> ClientResult<Page<AlbumRecord>> {
        let mut query = page_query(limit, offset).to_vec();
        query.push(("include_groups", "album,single,compilation,appears_on".to_string()));
        let page: Page<WireAlbum> = self.get(&format!("artists/{}/albums", id), &query)?;
        page.try_map(WireAlbum::into_record)
    }

    fn playlist(&self, id: &str) -> ClientResult<PlaylistRecord> {
        let playlist: WirePlaylist = self.get_by_id("playlist", "playlists", id)?;
        Ok(PlaylistRecord {
            artwork_url: playlist.images.as_deref().and_then(best_image_url),
            id: playlist.id,
            name: playlist.name,
            items: Vec::new(),
        })
    }

    fn playlist_items(
        &self,
        id: &str,
        limit: u32,
        offset: u32,
    ) -> ClientResult<Page<Option<TrackRecord>>> {
        let page: Page<WirePlaylistItem> =
            self.get(&format!("playlists/{}/tracks", id), &page_query(limit, offset))?;
        page.try_map(WirePlaylistItem::into_record)
    }
}
