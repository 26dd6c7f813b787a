use crate::error::{Error, Result};
use crate::paging::collect_pages;
use crate::platform::{Destination, Match, Source, SourceItem};
use async_trait::async_trait;
use cliclack::log;
use google_youtube3::{
    YouTube,
    api::{Playlist, PlaylistItem, PlaylistItemSnippet, PlaylistSnippet, PlaylistStatus, ResourceId},
    hyper_rustls, hyper_util, yup_oauth2,
};
use std::future::Future;

/// Titles the API reports for playlist entries that can no longer be played
const UNAVAILABLE_TITLES: [&str; 2] = ["Deleted video", "Private video"];

const PAGE_SIZE: u32 = 50;

#[derive(Debug, Clone)]
pub struct VideoInfo {
    pub video_id: String,
    pub title: String,
}

pub struct YouTubeClient {
    hub: YouTube<hyper_rustls::HttpsConnector<hyper_util::client::legacy::connect::HttpConnector>>,
}

impl YouTubeClient {
    pub async fn new(oauth_json_path: &str) -> Result<Self> {
        // Read OAuth2 credentials from the provided JSON file
        let secret = yup_oauth2::read_application_secret(oauth_json_path).await?;

        let token_cache_path = crate::config::config_dir()?.join("youtube_token_cache.json");

        let auth = yup_oauth2::InstalledFlowAuthenticator::builder(
            secret,
            yup_oauth2::InstalledFlowReturnMethod::HTTPRedirect,
        )
        .persist_tokens_to_disk(token_cache_path)
        .build()
        .await?;

        // Authenticate upfront so the browser prompt happens before any work starts
        let scopes = &[
            "https://www.googleapis.com/auth/youtube.readonly",
            "https://www.googleapis.com/auth/youtube",
        ];
        let _ = auth.token(scopes).await?;

        let connector = hyper_rustls::HttpsConnectorBuilder::new()
            .with_native_roots()?
            .https_or_http()
            .enable_http1()
            .build();

        let hub = YouTube::new(
            hyper_util::client::legacy::Client::builder(hyper_util::rt::TokioExecutor::new())
                .build(connector),
            auth,
        );

        Ok(Self { hub })
    }

    pub async fn get_playlist_title(&self, playlist_id: &str) -> Result<String> {
        let result = self
            .hub
            .playlists()
            .list(&vec!["snippet".to_string()])
            .add_id(playlist_id)
            .doit()
            .await?;

        if let Some(items) = result.1.items {
            if let Some(playlist) = items.first() {
                if let Some(snippet) = &playlist.snippet {
                    return Ok(snippet.title.clone().unwrap_or_default());
                }
            }
        }

        Err(format!("YouTube playlist '{}' not found", playlist_id).into())
    }

    pub async fn get_playlist_items(&self, playlist_id: &str) -> Result<Vec<VideoInfo>> {
        collect_pages(|page_token: Option<String>| async move {
            let mut request = self
                .hub
                .playlist_items()
                .list(&vec!["snippet".to_string(), "contentDetails".to_string()])
                .playlist_id(playlist_id)
                .max_results(PAGE_SIZE);

            if let Some(token) = &page_token {
                request = request.page_token(token);
            }

            let result = request.doit().await?;

            let mut videos = Vec::new();
            for item in result.1.items.unwrap_or_default() {
                if let (Some(snippet), Some(content_details)) = (item.snippet, item.content_details) {
                    if let Some(video_id) = content_details.video_id {
                        videos.push(VideoInfo {
                            video_id,
                            title: snippet.title.unwrap_or_default(),
                        });
                    }
                }
            }

            Ok::<_, Error>((videos, result.1.next_page_token))
        })
        .await
    }

    pub async fn add_video_to_playlist(&self, playlist_id: &str, video_id: &str) -> Result<()> {
        let playlist_item = PlaylistItem {
            snippet: Some(PlaylistItemSnippet {
                playlist_id: Some(playlist_id.to_string()),
                resource_id: Some(ResourceId {
                    kind: Some("youtube#video".to_string()),
                    video_id: Some(video_id.to_string()),
                    ..Default::default()
                }),
                ..Default::default()
            }),
            ..Default::default()
        };

        self.hub
            .playlist_items()
            .insert(playlist_item)
            .add_part("snippet")
            .doit()
            .await?;

        Ok(())
    }
}

#[async_trait]
impl Source for YouTubeClient {
    async fn list_items(&self, playlist_id: &str) -> Result<Vec<SourceItem>> {
        let videos = self.get_playlist_items(playlist_id).await?;

        Ok(videos
            .into_iter()
            .filter(|video| !UNAVAILABLE_TITLES.contains(&video.title.as_str()))
            .map(|video| SourceItem::Video { title: video.title })
            .collect())
    }
}

#[async_trait]
impl Destination for YouTubeClient {
    async fn search(&self, query: &str) -> Result<Option<Match>> {
        let result = self
            .hub
            .search()
            .list(&vec!["snippet".to_string()])
            .q(query)
            .add_type("video")
            .max_results(1)
            .doit()
            .await?;

        let hit = result.1.items.unwrap_or_default().into_iter().find_map(|item| {
            let video_id = item.id?.video_id?;
            let label = item
                .snippet
                .and_then(|snippet| snippet.title)
                .unwrap_or_else(|| video_id.clone());

            Some(Match {
                id: video_id,
                label,
            })
        });

        Ok(hit)
    }

    async fn find_playlist(&self, name: &str) -> Result<Option<String>> {
        let playlists = collect_pages(|page_token: Option<String>| async move {
            let mut request = self
                .hub
                .playlists()
                .list(&vec!["snippet".to_string()])
                .mine(true)
                .max_results(PAGE_SIZE);

            if let Some(token) = &page_token {
                request = request.page_token(token);
            }

            let result = request.doit().await?;
            Ok::<_, Error>((result.1.items.unwrap_or_default(), result.1.next_page_token))
        })
        .await?;

        Ok(playlists.into_iter().find_map(|playlist| {
            let title = playlist.snippet.as_ref()?.title.as_deref()?;
            if title.to_lowercase() == name.to_lowercase() {
                playlist.id
            } else {
                None
            }
        }))
    }

    async fn create_playlist(&self, name: &str, description: &str) -> Result<String> {
        let playlist = Playlist {
            snippet: Some(PlaylistSnippet {
                title: Some(name.to_string()),
                description: Some(description.to_string()),
                ..Default::default()
            }),
            status: Some(PlaylistStatus {
                privacy_status: Some("private".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };

        let result = self
            .hub
            .playlists()
            .insert(playlist)
            .add_part("snippet")
            .add_part("status")
            .doit()
            .await?;

        result
            .1
            .id
            .ok_or_else(|| "YouTube did not return an ID for the new playlist".into())
    }

    async fn playlist_item_ids(&self, playlist_id: &str) -> Result<Vec<String>> {
        let videos = self.get_playlist_items(playlist_id).await?;

        Ok(videos.into_iter().map(|video| video.video_id).collect())
    }

    async fn add_items(&self, playlist_id: &str, ids: &[String]) -> Result<Vec<String>> {
        // The Data API only inserts one video per request
        let failures = insert_each(ids, |video_id| async move {
            self.add_video_to_playlist(playlist_id, &video_id).await
        })
        .await;

        let mut rejected = Vec::with_capacity(failures.len());
        for (video_id, e) in failures {
            log::warning(format!("Failed to add video {}: {}", video_id, e))?;
            rejected.push(video_id);
        }

        Ok(rejected)
    }
}

/// Try every insert in order and collect the ones that failed.
async fn insert_each<F, Fut>(video_ids: &[String], mut insert: F) -> Vec<(String, Error)>
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Result<()>>,
{
    let mut failures = Vec::new();

    for video_id in video_ids {
        if let Err(e) = insert(video_id.clone()).await {
            failures.push((video_id.clone(), e));
        }
    }

    failures
}
