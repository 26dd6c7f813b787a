use crate::config::SpotifyCredentials;
use crate::error::{Error, Result};
use crate::paging::collect_pages;
use crate::platform::{Destination, Match, Source, SourceItem};
use async_trait::async_trait;
use google_youtube3::{hyper_rustls, hyper_util, yup_oauth2};
use reqwest::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use tokio::sync::OnceCell;

const AUTH_URI: &str = "https://accounts.spotify.com/authorize";
const TOKEN_URI: &str = "https://accounts.spotify.com/api/token";
const DEFAULT_API_BASE: &str = "https://api.spotify.com/v1";

const SCOPES: &[&str] = &[
    "playlist-read-private",
    "playlist-read-collaborative",
    "playlist-modify-public",
    "playlist-modify-private",
];

/// Largest number of items the API accepts in one add request
pub const MAX_ADD_BATCH: usize = 100;

type Authenticator = yup_oauth2::authenticator::Authenticator<
    hyper_rustls::HttpsConnector<hyper_util::client::legacy::connect::HttpConnector>,
>;

#[derive(Deserialize, Debug)]
struct Page<T> {
    items: Vec<T>,
    next: Option<String>,
}

#[derive(Deserialize, Debug)]
struct PlaylistEntry {
    /// Null for tracks removed from the catalog
    track: Option<TrackObject>,
}

#[derive(Deserialize, Debug)]
struct TrackObject {
    #[serde(default)]
    name: String,
    uri: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    artists: Vec<ArtistObject>,
}

#[derive(Deserialize, Debug)]
struct ArtistObject {
    name: String,
}

#[derive(Deserialize, Debug)]
struct PlaylistObject {
    id: String,
    name: String,
}

#[derive(Deserialize, Debug)]
struct SearchResponse {
    tracks: Option<Page<TrackObject>>,
}

#[derive(Deserialize, Debug)]
struct UserObject {
    id: String,
}

impl TrackObject {
    fn is_track(&self) -> bool {
        self.kind.as_deref().is_none_or(|kind| kind == "track")
    }

    fn first_artist(&self) -> Option<&str> {
        self.artists.first().map(|artist| artist.name.as_str())
    }

    fn into_source_item(self) -> SourceItem {
        SourceItem::Track {
            artist: self.first_artist().map(str::to_string),
            title: self.name,
        }
    }

    fn into_match(self) -> Option<Match> {
        let label = match self.first_artist() {
            Some(artist) => format!("{} by {}", self.name, artist),
            None => self.name.clone(),
        };

        Some(Match {
            id: self.uri?,
            label,
        })
    }
}

pub struct SpotifyClient {
    http: Client,
    auth: Authenticator,
    api_base: String,
    user_id: OnceCell<String>,
}

impl SpotifyClient {
    pub async fn new(credentials: SpotifyCredentials) -> Result<Self> {
        let secret = yup_oauth2::ApplicationSecret {
            client_id: credentials.client_id,
            client_secret: credentials.client_secret,
            auth_uri: AUTH_URI.to_string(),
            token_uri: TOKEN_URI.to_string(),
            ..Default::default()
        };

        let token_cache_path = crate::config::config_dir()?.join("spotify_token_cache.json");

        let auth = yup_oauth2::InstalledFlowAuthenticator::builder(
            secret,
            yup_oauth2::InstalledFlowReturnMethod::HTTPPortRedirect(credentials.redirect_port),
        )
        .persist_tokens_to_disk(token_cache_path)
        .build()
        .await?;

        let client = Self {
            http: Client::new(),
            auth,
            api_base: std::env::var("SPOTIFY_API_BASE")
                .unwrap_or_else(|_| DEFAULT_API_BASE.to_string()),
            user_id: OnceCell::new(),
        };

        // Authenticate upfront so the browser prompt happens before any work starts
        client.access_token().await?;

        Ok(client)
    }

    async fn access_token(&self) -> Result<String> {
        let token = self.auth.token(SCOPES).await?;

        token
            .token()
            .map(str::to_string)
            .ok_or_else(|| "Spotify did not return an access token".into())
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str, query: &[(&str, &str)]) -> Result<T> {
        let response = self
            .http
            .get(url)
            .bearer_auth(self.access_token().await?)
            .query(query)
            .send()
            .await?;

        parse_response(response).await
    }

    async fn post_json<T: DeserializeOwned>(&self, url: &str, body: serde_json::Value) -> Result<T> {
        let response = self
            .http
            .post(url)
            .bearer_auth(self.access_token().await?)
            .json(&body)
            .send()
            .await?;

        parse_response(response).await
    }

    /// Collect every page, starting at `url` and following `next`
    async fn get_all<T: DeserializeOwned>(&self, url: &str, query: &[(&str, &str)]) -> Result<Vec<T>> {
        collect_pages(|next: Option<String>| async move {
            let page: Page<T> = match next {
                // `next` already carries the original query parameters
                Some(next) => self.get_json(&next, &[]).await?,
                None => self.get_json(url, query).await?,
            };
            Ok::<_, Error>((page.items, page.next))
        })
        .await
    }

    async fn current_user_id(&self) -> Result<&str> {
        let id = self
            .user_id
            .get_or_try_init(|| async {
                let user: UserObject = self
                    .get_json(&format!("{}/me", self.api_base), &[])
                    .await?;
                Ok::<_, Error>(user.id)
            })
            .await?;

        Ok(id.as_str())
    }

    pub async fn get_playlist_title(&self, playlist_id: &str) -> Result<String> {
        let playlist: PlaylistObject = self
            .get_json(
                &format!("{}/playlists/{}", self.api_base, playlist_id),
                &[("fields", "id,name")],
            )
            .await?;

        Ok(playlist.name)
    }

    async fn playlist_tracks(&self, playlist_id: &str, fields: &str) -> Result<Vec<TrackObject>> {
        let entries: Vec<PlaylistEntry> = self
            .get_all(
                &format!("{}/playlists/{}/tracks", self.api_base, playlist_id),
                &[("limit", "100"), ("fields", fields)],
            )
            .await?;

        Ok(entries
            .into_iter()
            .filter_map(|entry| entry.track)
            .filter(TrackObject::is_track)
            .collect())
    }
}

async fn parse_response<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let status = response.status();

    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(format!("Spotify API request failed: {} => {}", status, body).into());
    }

    Ok(response.json().await?)
}

#[async_trait]
impl Source for SpotifyClient {
    async fn list_items(&self, playlist_id: &str) -> Result<Vec<SourceItem>> {
        let tracks = self
            .playlist_tracks(playlist_id, "items(track(name,uri,type,artists(name))),next")
            .await?;

        Ok(tracks.into_iter().map(TrackObject::into_source_item).collect())
    }
}

#[async_trait]
impl Destination for SpotifyClient {
    async fn search(&self, query: &str) -> Result<Option<Match>> {
        let response: SearchResponse = self
            .get_json(
                &format!("{}/search", self.api_base),
                &[("q", query), ("type", "track"), ("limit", "1")],
            )
            .await?;

        Ok(response
            .tracks
            .and_then(|page| page.items.into_iter().next())
            .and_then(TrackObject::into_match))
    }

    async fn find_playlist(&self, name: &str) -> Result<Option<String>> {
        // Entries may be null for playlists the user can no longer access
        let playlists: Vec<Option<PlaylistObject>> = self
            .get_all(
                &format!("{}/me/playlists", self.api_base),
                &[("limit", "50")],
            )
            .await?;

        Ok(playlists
            .into_iter()
            .flatten()
            .find(|playlist| playlist.name.to_lowercase() == name.to_lowercase())
            .map(|playlist| playlist.id))
    }

    async fn create_playlist(&self, name: &str, description: &str) -> Result<String> {
        let user_id = self.current_user_id().await?;

        let playlist: PlaylistObject = self
            .post_json(
                &format!("{}/users/{}/playlists", self.api_base, user_id),
                json!({
                    "name": name,
                    "description": description,
                    "public": false,
                }),
            )
            .await?;

        Ok(playlist.id)
    }

    async fn playlist_item_ids(&self, playlist_id: &str) -> Result<Vec<String>> {
        let tracks = self
            .playlist_tracks(playlist_id, "items(track(uri,type)),next")
            .await?;

        Ok(tracks.into_iter().filter_map(|track| track.uri).collect())
    }

    async fn add_items(&self, playlist_id: &str, ids: &[String]) -> Result<Vec<String>> {
        let mut rejected = Vec::new();

        for (index, chunk) in ids.chunks(MAX_ADD_BATCH).enumerate() {
            let added: Result<serde_json::Value> = self
                .post_json(
                    &format!("{}/playlists/{}/tracks", self.api_base, playlist_id),
                    json!({ "uris": chunk }),
                )
                .await;

            match added {
                Ok(_) => {}
                Err(e) if index == 0 && chunk.len() == ids.len() => return Err(e),
                Err(_) => rejected.extend_from_slice(chunk),
            }
        }

        Ok(rejected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_playlist_page_skips_removed_tracks_and_episodes() {
        let page: Page<PlaylistEntry> = serde_json::from_value(json!({
            "items": [
                { "track": { "name": "Karma Police", "uri": "spotify:track:1", "type": "track",
                             "artists": [{ "name": "Radiohead" }, { "name": "Other" }] } },
                { "track": null },
                { "track": { "name": "Some Episode", "uri": "spotify:episode:2", "type": "episode" } }
            ],
            "next": "https://api.spotify.com/v1/playlists/abc/tracks?offset=100&limit=100"
        }))
        .unwrap();

        assert!(page.next.is_some());

        let items: Vec<SourceItem> = page
            .items
            .into_iter()
            .filter_map(|entry| entry.track)
            .filter(TrackObject::is_track)
            .map(TrackObject::into_source_item)
            .collect();

        assert_eq!(
            items,
            vec![SourceItem::Track {
                artist: Some("Radiohead".to_string()),
                title: "Karma Police".to_string(),
            }]
        );
    }

    #[test]
    fn test_track_without_artists() {
        let track: TrackObject = serde_json::from_value(json!({
            "name": "Local Demo",
            "uri": "spotify:local:::Local+Demo:0"
        }))
        .unwrap();

        assert!(track.is_track());
        assert_eq!(
            track.into_source_item(),
            SourceItem::Track {
                artist: None,
                title: "Local Demo".to_string(),
            }
        );
    }

    #[test]
    fn test_search_response_first_hit() {
        let response: SearchResponse = serde_json::from_value(json!({
            "tracks": {
                "items": [
                    { "name": "Hello", "uri": "spotify:track:hello", "type": "track",
                      "artists": [{ "name": "Adele" }] }
                ],
                "next": null
            }
        }))
        .unwrap();

        let hit = response
            .tracks
            .and_then(|page| page.items.into_iter().next())
            .and_then(TrackObject::into_match);

        assert_eq!(
            hit,
            Some(Match {
                id: "spotify:track:hello".to_string(),
                label: "Hello by Adele".to_string(),
            })
        );
    }

    #[test]
    fn test_track_without_uri_is_not_a_match() {
        let track: TrackObject = serde_json::from_value(json!({ "name": "Ghost" })).unwrap();
        assert_eq!(track.into_match(), None);
    }

    #[test]
    fn test_user_playlists_page_with_null_entries() {
        let page: Page<Option<PlaylistObject>> = serde_json::from_value(json!({
            "items": [null, { "id": "p1", "name": "YouTube" }],
            "next": null
        }))
        .unwrap();

        let found: Vec<String> = page.items.into_iter().flatten().map(|p| p.id).collect();
        assert_eq!(found, vec!["p1".to_string()]);
    }
}
