use clap::{Parser, Subcommand};
use cliclack::{confirm, intro, log, note, outro};

mod cache;
mod config;
mod error;
mod link;
mod normalize;
mod paging;
mod platform;
mod spotify;
mod sync;
mod youtube;

use cache::ResumeCache;
use error::Result;
use platform::PlaylistTarget;
use spotify::SpotifyClient;
use sync::{MigrationPlan, Pacing, Report};
use youtube::YouTubeClient;

/// Videos are inserted one request at a time, so batches only pace the writes
const YOUTUBE_WRITE_BATCH: usize = 50;

#[derive(Parser, Debug)]
#[command(version, about = "Migrate playlists between Spotify and YouTube")]
struct Cli {
    /// The command to execute
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Manage credentials and settings
    Config(config::ConfigArgs),
    /// Copy a Spotify playlist into a YouTube playlist
    ToYoutube {
        /// Spotify playlist URL, URI or ID
        #[clap(value_name = "SPOTIFY_PLAYLIST")]
        spotify_playlist: String,
        /// Name of the YouTube playlist to create or reuse
        #[clap(short = 'n', long, default_value = "Spotify Playlist")]
        name: String,
        /// Description of a newly created YouTube playlist
        #[clap(long, default_value = "Migrated from Spotify")]
        description: String,
        /// Add to this existing YouTube playlist instead of looking one up by name
        #[clap(short = 'i', long = "playlist-id", value_name = "PLAYLIST_ID")]
        playlist_id: Option<String>,
        /// Search and report without changing anything
        #[clap(short = 'd', long)]
        dry_run: bool,
    },
    /// Copy a YouTube playlist into a Spotify playlist
    ToSpotify {
        /// YouTube playlist URL or ID
        #[clap(value_name = "YOUTUBE_PLAYLIST")]
        youtube_playlist: String,
        /// Name of the Spotify playlist to create or reuse
        #[clap(short = 'n', long, default_value = "youtube")]
        name: String,
        /// Add to this existing Spotify playlist instead of looking one up by name
        #[clap(short = 'i', long = "playlist-id", value_name = "PLAYLIST_ID")]
        playlist_id: Option<String>,
        /// Search again even if results from an earlier run are cached
        #[clap(short = 'f', long)]
        fresh: bool,
        /// Search and report without changing anything
        #[clap(short = 'd', long)]
        dry_run: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| "Failed to install rustls crypto provider")?;

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Config(args) => handle_config(args),
        Commands::ToYoutube {
            spotify_playlist,
            name,
            description,
            playlist_id,
            dry_run,
        } => {
            let target = match playlist_id {
                Some(id) => PlaylistTarget::Existing(id),
                None => PlaylistTarget::Named { name, description },
            };
            handle_to_youtube(&spotify_playlist, target, dry_run).await
        }
        Commands::ToSpotify {
            youtube_playlist,
            name,
            playlist_id,
            fresh,
            dry_run,
        } => {
            let target = match playlist_id {
                Some(id) => PlaylistTarget::Existing(id),
                None => PlaylistTarget::Named {
                    name,
                    description: "Migrated from YouTube".to_string(),
                },
            };
            handle_to_spotify(&youtube_playlist, target, fresh, dry_run).await
        }
    };

    if let Err(e) = &result {
        let _ = outro(format!("❌ {}", e));
    }

    result
}

fn handle_config(args: config::ConfigArgs) -> Result<()> {
    intro("📝 Configuration")?;

    let mut cfg = config::Config::read().unwrap_or_default();

    if args.reset {
        let confirmed = confirm("Are you sure you want to reset the configuration?").interact()?;

        if confirmed {
            config::Config::default().write()?;
            outro("✅ Configuration reset successfully")?;
        }
        return Ok(());
    }

    if cfg.apply(&args) {
        cfg.write()?;
        log::success("Configuration saved")?;
    }

    if args.list {
        note(
            "YouTube OAuth2 JSON path",
            cfg.youtube_oauth2_json.as_deref().unwrap_or("<not set>"),
        )?;
        note(
            "Spotify client ID",
            cfg.spotify_client_id.as_deref().unwrap_or("<not set>"),
        )?;
        note(
            "Spotify client secret",
            if cfg.spotify_client_secret.is_some() {
                "<set>"
            } else {
                "<not set>"
            },
        )?;
        note(
            "Spotify redirect port",
            cfg.spotify_redirect_port.to_string(),
        )?;
        note(
            "Data directory",
            config::config_dir()?.display().to_string(),
        )?;
    }

    outro("✅ Done")?;
    Ok(())
}

async fn handle_to_youtube(spotify_playlist: &str, target: PlaylistTarget, dry_run: bool) -> Result<()> {
    intro(if dry_run {
        "🔍 Spotify → YouTube (Dry Run)"
    } else {
        "🔄 Spotify → YouTube"
    })?;

    let source_playlist_id = link::spotify_playlist_id(spotify_playlist)?;
    let cfg = config::Config::read().unwrap_or_default();

    let spotify = SpotifyClient::new(cfg.spotify_credentials()?).await?;
    let youtube = YouTubeClient::new(cfg.youtube_oauth2_json()?).await?;

    let title = spotify.get_playlist_title(&source_playlist_id).await?;
    log::info(format!("Source playlist: {} (ID: {})", title, source_playlist_id))?;

    let plan = MigrationPlan {
        source_playlist_id,
        target,
        pacing: Pacing::with_batch_size(YOUTUBE_WRITE_BATCH),
        dry_run,
        fresh: false,
    };

    let report = sync::migrate(&spotify, &youtube, None, &plan).await?;
    summarize(&report, dry_run)
}

async fn handle_to_spotify(
    youtube_playlist: &str,
    target: PlaylistTarget,
    fresh: bool,
    dry_run: bool,
) -> Result<()> {
    intro(if dry_run {
        "🔍 YouTube → Spotify (Dry Run)"
    } else {
        "🔄 YouTube → Spotify"
    })?;

    let source_playlist_id = link::youtube_playlist_id(youtube_playlist)?;
    let cfg = config::Config::read().unwrap_or_default();

    let youtube = YouTubeClient::new(cfg.youtube_oauth2_json()?).await?;
    let spotify = SpotifyClient::new(cfg.spotify_credentials()?).await?;

    let title = youtube.get_playlist_title(&source_playlist_id).await?;
    log::info(format!("Source playlist: {} (ID: {})", title, source_playlist_id))?;

    let mut cache = ResumeCache::load(ResumeCache::default_path()?)?;
    if !fresh && cache.get(&source_playlist_id).is_some() {
        log::info(format!(
            "Found cached search results in {}",
            cache.path().display()
        ))?;
    }

    let plan = MigrationPlan {
        source_playlist_id,
        target,
        pacing: Pacing::with_batch_size(spotify::MAX_ADD_BATCH),
        dry_run,
        fresh,
    };

    let report = sync::migrate(&youtube, &spotify, Some(&mut cache), &plan).await?;
    summarize(&report, dry_run)
}

fn summarize(report: &Report, dry_run: bool) -> Result<()> {
    let mut lines = vec![format!("Source items: {}", report.listed)];

    if report.from_cache {
        lines.push("Search results: reused from cache".to_string());
    } else {
        lines.push(format!(
            "Matched: {} of {} searched",
            report.matched, report.searched
        ));
    }
    if report.skipped > 0 {
        lines.push(format!("Skipped (no searchable title): {}", report.skipped));
    }
    if !report.not_found.is_empty() {
        lines.push(format!("Not found: {}", report.not_found.len()));
    }
    if !report.failed_searches.is_empty() {
        lines.push(format!("Failed searches: {}", report.failed_searches.len()));
    }
    lines.push(format!("Already in playlist: {}", report.already_present));

    if dry_run {
        lines.push(format!("Would add: {}", report.queued.len()));
    } else {
        lines.push(format!("Added: {}", report.added));
        if report.failed_batches > 0 {
            lines.push(format!("Failed batches: {}", report.failed_batches));
        }
        if !report.failed_items.is_empty() {
            lines.push(format!("Not added: {}", report.failed_items.len()));
        }
    }

    if let Some(id) = &report.playlist_id {
        let state = if report.created_playlist { "created" } else { "existing" };
        lines.push(format!("Playlist: {} ({})", id, state));
    }

    note("Summary", lines.join("\n"))?;

    if !report.not_found.is_empty() {
        note("Not found", report.not_found.join("\n"))?;
    }

    outro(if dry_run {
        "✅ Dry run completed"
    } else if report.failed_batches > 0 {
        "⚠️ Migration completed with errors"
    } else {
        "✅ Migration completed"
    })?;

    Ok(())
}
