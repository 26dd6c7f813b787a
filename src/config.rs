use crate::error::Result;
use clap::Args;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

const APP_NAME: &str = "playshift";

pub const SPOTIFY_CLIENT_ID_ENV: &str = "SPOTIPY_CLIENT_ID";
pub const SPOTIFY_CLIENT_SECRET_ENV: &str = "SPOTIPY_CLIENT_SECRET";

const DEFAULT_REDIRECT_PORT: u16 = 8888;

#[derive(Args, Debug)]
pub struct ConfigArgs {
    /// Path to the Google OAuth2 client secrets JSON file
    #[clap(short = 'y', long, value_name = "PATH")]
    pub youtube_oauth2_json: Option<String>,

    /// Spotify application client ID
    #[clap(long, value_name = "CLIENT_ID")]
    pub spotify_client_id: Option<String>,

    /// Spotify application client secret
    #[clap(long, value_name = "CLIENT_SECRET")]
    pub spotify_client_secret: Option<String>,

    /// Local port Spotify redirects to after authorization
    #[clap(long, value_name = "PORT")]
    pub spotify_redirect_port: Option<u16>,

    /// Show the current configuration
    #[clap(short = 'l', long)]
    pub list: bool,

    /// Reset the configuration to default values
    #[clap(long)]
    pub reset: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    /// Path to the Google OAuth2 client secrets JSON file
    #[serde(skip_serializing_if = "Option::is_none")]
    pub youtube_oauth2_json: Option<String>,

    /// Spotify client ID, overridden by `SPOTIPY_CLIENT_ID`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spotify_client_id: Option<String>,

    /// Spotify client secret, overridden by `SPOTIPY_CLIENT_SECRET`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spotify_client_secret: Option<String>,

    pub spotify_redirect_port: u16,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpotifyCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_port: u16,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            youtube_oauth2_json: None,
            spotify_client_id: None,
            spotify_client_secret: None,
            spotify_redirect_port: DEFAULT_REDIRECT_PORT,
        }
    }
}

impl Config {
    /// Apply the values given on the command line. Returns whether anything changed.
    pub fn apply(&mut self, args: &ConfigArgs) -> bool {
        let before = self.clone();

        if let Some(path) = &args.youtube_oauth2_json {
            self.youtube_oauth2_json = Some(path.clone());
        }
        if let Some(id) = &args.spotify_client_id {
            self.spotify_client_id = Some(id.clone());
        }
        if let Some(secret) = &args.spotify_client_secret {
            self.spotify_client_secret = Some(secret.clone());
        }
        if let Some(port) = args.spotify_redirect_port {
            self.spotify_redirect_port = port;
        }

        *self != before
    }

    /// The YouTube client secrets path, or an error telling the user how to set it
    pub fn youtube_oauth2_json(&self) -> Result<&str> {
        self.youtube_oauth2_json.as_deref().ok_or_else(|| {
            "The path to the YouTube OAuth2 JSON file is not set. \
             Run `playshift config --youtube-oauth2-json <PATH>` first."
                .into()
        })
    }

    /// Spotify credentials from the environment, falling back to the stored values
    pub fn spotify_credentials(&self) -> Result<SpotifyCredentials> {
        self.spotify_credentials_with(|key| std::env::var(key).ok())
    }

    fn spotify_credentials_with(
        &self,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<SpotifyCredentials> {
        let client_id = env(SPOTIFY_CLIENT_ID_ENV)
            .filter(|v| !v.is_empty())
            .or_else(|| self.spotify_client_id.clone())
            .ok_or("Spotify client ID is not set")?;
        let client_secret = env(SPOTIFY_CLIENT_SECRET_ENV)
            .filter(|v| !v.is_empty())
            .or_else(|| self.spotify_client_secret.clone())
            .ok_or("Spotify client secret is not set")?;

        Ok(SpotifyCredentials {
            client_id,
            client_secret,
            redirect_port: self.spotify_redirect_port,
        })
    }

    /// Read the configuration from the file
    pub fn read() -> Result<Self> {
        let cfg: Config = confy::load(APP_NAME, None)?;

        Ok(cfg)
    }

    /// Write the configuration to the file
    pub fn write(&self) -> Result<()> {
        confy::store(APP_NAME, None, self)?;

        Ok(())
    }
}

/// Directory holding the configuration file, token caches and the resume cache
pub fn config_dir() -> Result<PathBuf> {
    let dir = confy::get_configuration_file_path(APP_NAME, None)?
        .parent()
        .ok_or("Failed to get config directory")?
        .to_path_buf();

    std::fs::create_dir_all(&dir)?;

    Ok(dir)
}
