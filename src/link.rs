use crate::error::Result;
use once_cell::sync::Lazy;
use regex::Regex;

static SPOTIFY_PLAYLIST: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"playlist[/:]([a-zA-Z0-9]+)").unwrap());

static YOUTUBE_LIST_PARAM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[?&]list=([A-Za-z0-9_-]+)").unwrap());

static BARE_SPOTIFY_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-zA-Z0-9]+$").unwrap());

static BARE_YOUTUBE_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").unwrap());

/// Extract a playlist ID from a Spotify playlist URL, a `spotify:playlist:` URI
/// or a bare ID.
pub fn spotify_playlist_id(input: &str) -> Result<String> {
    let input = input.trim();

    if let Some(caps) = SPOTIFY_PLAYLIST.captures(input) {
        return Ok(caps[1].to_string());
    }

    if BARE_SPOTIFY_ID.is_match(input) {
        return Ok(input.to_string());
    }

    Err(format!("Invalid Spotify playlist URL: '{}'", input).into())
}

/// Extract a playlist ID from a YouTube URL carrying a `list=` parameter or a
/// bare ID.
pub fn youtube_playlist_id(input: &str) -> Result<String> {
    let input = input.trim();

    if let Some(caps) = YOUTUBE_LIST_PARAM.captures(input) {
        return Ok(caps[1].to_string());
    }

    if BARE_YOUTUBE_ID.is_match(input) {
        return Ok(input.to_string());
    }

    Err(format!("Invalid YouTube playlist URL: '{}'", input).into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spotify_url() {
        assert_eq!(
            spotify_playlist_id("https://open.spotify.com/playlist/37i9dQZF1DXcBWIGoYBM5M?si=abc123")
                .unwrap(),
            "37i9dQZF1DXcBWIGoYBM5M"
        );
        assert_eq!(
            spotify_playlist_id("open.spotify.com/playlist/37i9dQZF1DXcBWIGoYBM5M").unwrap(),
            "37i9dQZF1DXcBWIGoYBM5M"
        );
    }

    #[test]
    fn test_spotify_uri_and_bare_id() {
        assert_eq!(
            spotify_playlist_id("spotify:playlist:37i9dQZF1DXcBWIGoYBM5M").unwrap(),
            "37i9dQZF1DXcBWIGoYBM5M"
        );
        assert_eq!(
            spotify_playlist_id("  37i9dQZF1DXcBWIGoYBM5M ").unwrap(),
            "37i9dQZF1DXcBWIGoYBM5M"
        );
    }

    #[test]
    fn test_spotify_rejects_other_links() {
        assert!(spotify_playlist_id("https://open.spotify.com/album/").is_err());
        assert!(spotify_playlist_id("not a playlist").is_err());
        assert!(spotify_playlist_id("").is_err());
    }

    #[test]
    fn test_youtube_url() {
        assert_eq!(
            youtube_playlist_id(
                "https://www.youtube.com/playlist?list=PLo2RLtsf-Zl3r5KoTWIzfFudBx_v0BZb6"
            )
            .unwrap(),
            "PLo2RLtsf-Zl3r5KoTWIzfFudBx_v0BZb6"
        );
        assert_eq!(
            youtube_playlist_id("https://www.youtube.com/watch?v=dQw4w9WgXcQ&list=PL123_abc&index=2")
                .unwrap(),
            "PL123_abc"
        );
    }

    #[test]
    fn test_youtube_bare_id() {
        assert_eq!(youtube_playlist_id("PL123_abc-XYZ").unwrap(), "PL123_abc-XYZ");
    }

    #[test]
    fn test_youtube_rejects_urls_without_list() {
        assert!(youtube_playlist_id("https://www.youtube.com/watch?v=dQw4w9WgXcQ").is_err());
        assert!(youtube_playlist_id("").is_err());
    }
}
