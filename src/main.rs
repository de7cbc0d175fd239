use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand};
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, ExitCode};
use tracing::{debug, info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use melody_catalog::catalog_client::WebApiClient;
use melody_catalog::catalog_store::{CatalogStore, SqliteCatalogStore};
use melody_catalog::config::{
    AppConfig, CliConfig, FileConfig, DEFAULT_API_BASE_URL, DEFAULT_TOKEN_URL,
};
use melody_catalog::ingestion::{ArtistIngestion, Ingestor};
use melody_catalog::reconciliation::{
    parse_decisions, render_proposal, AcceptAll, Decision, ReconciliationPlan, ReviewError,
    Reviewer,
};

mod cli_style;
use cli_style::{get_styles, print_error, print_success, print_warning};

fn parse_path(s: &str) -> Result<PathBuf> {
    let original_path = PathBuf::from(s);
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(original_path))
}

#[derive(Parser, Debug)]
#[command(name = "melody", version, styles = get_styles())]
/// Local cache of a music catalog, reconciled against the upstream Web API.
struct CliArgs {
    /// Path to a TOML config file. Its values override command line ones.
    #[clap(long, value_parser = parse_path)]
    pub config: Option<PathBuf>,

    /// Path to the SQLite catalog database file.
    #[clap(long, value_parser = parse_path, default_value = "melody.db")]
    pub db_path: PathBuf,

    /// Root of the catalog Web API.
    #[clap(long, default_value = DEFAULT_API_BASE_URL)]
    pub api_base_url: String,

    /// OAuth token endpoint used for client-credentials authentication.
    #[clap(long, default_value = DEFAULT_TOKEN_URL)]
    pub token_url: String,

    #[clap(long, env = "MELODY_CLIENT_ID")]
    pub client_id: Option<String>,

    #[clap(long, env = "MELODY_CLIENT_SECRET", hide_env_values = true)]
    pub client_secret: Option<String>,

    /// Timeout in seconds for catalog requests.
    #[clap(long, default_value_t = 30)]
    pub request_timeout_sec: u64,

    #[command(subcommand)]
    command: Entity,
}

impl CliArgs {
    fn cli_config(&self) -> CliConfig {
        CliConfig {
            db_path: self.db_path.clone(),
            api_base_url: self.api_base_url.clone(),
            token_url: self.token_url.clone(),
            client_id: self.client_id.clone(),
            client_secret: self.client_secret.clone(),
            request_timeout_sec: self.request_timeout_sec,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Entity {
    /// Cached tracks.
    #[command(subcommand)]
    Tracks(TrackCommand),

    /// Cached albums.
    #[command(subcommand)]
    Albums(AlbumCommand),

    /// Cached and followed artists.
    #[command(subcommand)]
    Artists(ArtistCommand),

    /// Cached playlists.
    #[command(subcommand)]
    Playlists(PlaylistCommand),
}

#[derive(Args, Debug)]
struct Ids {
    /// Catalog IDs, URIs (`spotify:track:...`) or share URLs.
    #[clap(required = true)]
    ids: Vec<String>,
}

#[derive(Args, Debug)]
struct ReviewArgs {
    /// Accept the proposed actions without opening an editor.
    #[clap(short, long)]
    yes: bool,
}

#[derive(Subcommand, Debug)]
enum TrackCommand {
    /// List tracks to keep in the library. Hidden tracks with --all.
    List {
        #[clap(long)]
        all: bool,
    },
    /// Fetch tracks and add them to the cache.
    Add {
        #[command(flatten)]
        ids: Ids,
        /// Overwrite cached tracks, making hidden ones visible again.
        #[clap(short, long)]
        force: bool,
    },
    /// Hide tracks, or delete them with --delete.
    Remove {
        #[command(flatten)]
        ids: Ids,
        #[clap(long)]
        delete: bool,
    },
}

#[derive(Subcommand, Debug)]
enum AlbumCommand {
    List,
    /// Fetch albums and add all their tracks to the cache.
    Add {
        #[command(flatten)]
        ids: Ids,
    },
    /// Hide albums and their tracks, or delete them with --delete.
    Remove {
        #[command(flatten)]
        ids: Ids,
        #[clap(long)]
        delete: bool,
    },
}

#[derive(Subcommand, Debug)]
enum ArtistCommand {
    List {
        /// Only followed artists.
        #[clap(long)]
        followed: bool,
    },
    /// Follow artists and reconcile their discographies into the cache.
    Add {
        #[command(flatten)]
        ids: Ids,
        #[command(flatten)]
        review: ReviewArgs,
    },
    /// Re-run reconciliation for every followed artist.
    Refresh {
        #[command(flatten)]
        review: ReviewArgs,
    },
}

#[derive(Subcommand, Debug)]
enum PlaylistCommand {
    /// Show one playlist, or list all of them.
    Get { id: Option<String> },
    /// Fetch playlists and store them with their tracks.
    Add {
        #[command(flatten)]
        ids: Ids,
    },
    /// Delete playlists with --delete, otherwise hide tracks only they
    /// reference.
    Remove {
        #[command(flatten)]
        ids: Ids,
        #[clap(long)]
        delete: bool,
    },
}

// =============================================================================
// Review in $EDITOR
// =============================================================================

/// Writes the proposal to a temporary file, opens it in the user's editor
/// and reads the decisions back once the editor exits.
struct EditorReviewer {
    command: Vec<String>,
}

impl EditorReviewer {
    fn from_env() -> Result<Self> {
        let raw = std::env::var("VISUAL")
            .or_else(|_| std::env::var("EDITOR"))
            .unwrap_or_else(|_| "vi".to_string());
        let command = shlex::split(&raw)
            .filter(|parts| !parts.is_empty())
            .ok_or_else(|| anyhow!("Cannot parse editor command: {:?}", raw))?;
        Ok(Self { command })
    }
}

impl Reviewer for EditorReviewer {
    fn review(&mut self, plan: &ReconciliationPlan) -> Result<Vec<Decision>, ReviewError> {
        let mut file = tempfile::Builder::new()
            .prefix("melody-review-")
            .suffix(".txt")
            .tempfile()?;
        file.write_all(render_proposal(plan).as_bytes())?;
        file.flush()?;

        debug!("Opening {:?} with {:?}", file.path(), self.command);
        let status = Command::new(&self.command[0])
            .args(&self.command[1..])
            .arg(file.path())
            .status()?;
        if !status.success() {
            return Err(ReviewError::Aborted(format!("editor exited with {}", status)));
        }

        // Editors may replace the file rather than write in place.
        let text = std::fs::read_to_string(file.path())?;
        Ok(parse_decisions(&text))
    }
}

fn reviewer(review: &ReviewArgs) -> Result<Box<dyn Reviewer>> {
    if review.yes {
        Ok(Box::new(AcceptAll))
    } else {
        Ok(Box::new(EditorReviewer::from_env()?))
    }
}

// =============================================================================
// Commands
// =============================================================================

/// Accept bare IDs as well as `spotify:<kind>:<id>` URIs and share URLs.
fn catalog_id(kind: &str, raw: &str) -> String {
    let raw = raw.trim();
    if let Some(id) = raw.strip_prefix(&format!("spotify:{}:", kind)) {
        return id.to_string();
    }
    if raw.starts_with("http://") || raw.starts_with("https://") {
        let path = raw.split(['?', '#']).next().unwrap_or(raw);
        let mut segments = path.rsplit('/').filter(|s| !s.is_empty());
        if let (Some(id), Some(segment_kind)) = (segments.next(), segments.next()) {
            if segment_kind == kind {
                return id.to_string();
            }
        }
    }
    raw.to_string()
}

fn catalog_ids(kind: &str, ids: &Ids) -> Vec<String> {
    ids.ids.iter().map(|raw| catalog_id(kind, raw)).collect()
}

fn print_artist_ingestion(result: &ArtistIngestion) {
    match result {
        ArtistIngestion::NoNewTracks(artist) => {
            print_warning(&format!("{}: no new tracks", artist.name));
        }
        ArtistIngestion::Applied { artist, tracks } => {
            print_success(&format!("{}: {} tracks updated", artist.name, tracks.len()));
            for applied in tracks {
                if !applied.existing && applied.track.hidden {
                    continue;
                }
                let marker = if applied.existing { "-" } else { "+" };
                println!("    {}{}", marker, applied.track.description(true));
            }
        }
    }
}

fn print_removal(kind: &str, id: &str, delete: bool, removed: bool) {
    let verb = if delete { "Deleted" } else { "Hid" };
    if removed {
        print_success(&format!("{} {} {}", verb, kind, id));
    } else {
        print_warning(&format!("{} {} was not removed", kind, id));
    }
}

fn run(command: &Entity, config: &AppConfig, store: &SqliteCatalogStore) -> Result<()> {
    let connect = || -> Result<WebApiClient> {
        let client = WebApiClient::new(
            &config.api_base_url,
            &config.token_url,
            config.credentials()?,
            config.request_timeout_sec,
        )
        .context("Failed to create catalog client")?;
        info!("Using catalog at {}", client.base_url());
        Ok(client)
    };

    match command {
        Entity::Tracks(TrackCommand::List { all }) => {
            let tracks = if *all {
                store.get_all_tracks()?
            } else {
                store.get_visible_tracks()?
            };
            cli_style::print_tracks(&tracks);
        }
        Entity::Tracks(TrackCommand::Add { ids, force }) => {
            let client = connect()?;
            let ingestor = Ingestor::new(store, &client, config.ingestion.clone());
            for track in ingestor.ingest_tracks(&catalog_ids("track", ids), *force)? {
                print_success(&track.description(true));
            }
        }
        Entity::Tracks(TrackCommand::Remove { ids, delete }) => {
            for id in catalog_ids("track", ids) {
                let removed = store.remove_track(&id, *delete)?;
                print_removal("track", &id, *delete, removed);
            }
        }
        Entity::Albums(AlbumCommand::List) => {
            cli_style::print_albums(&store.get_all_albums()?);
        }
        Entity::Albums(AlbumCommand::Add { ids }) => {
            let client = connect()?;
            let ingestor = Ingestor::new(store, &client, config.ingestion.clone());
            let tracks = ingestor.ingest_albums(&catalog_ids("album", ids))?;
            print_success(&format!("Stored {} tracks", tracks.len()));
        }
        Entity::Albums(AlbumCommand::Remove { ids, delete }) => {
            for id in catalog_ids("album", ids) {
                let removed = store.remove_album(&id, *delete)?;
                print_removal("album", &id, *delete, removed);
            }
        }
        Entity::Artists(ArtistCommand::List { followed }) => {
            let artists = if *followed {
                store.get_followed_artists()?
            } else {
                store.get_all_artists()?
            };
            cli_style::print_artists(&artists);
        }
        Entity::Artists(ArtistCommand::Add { ids, review }) => {
            let client = connect()?;
            let ingestor = Ingestor::new(store, &client, config.ingestion.clone());
            let mut reviewer = reviewer(review)?;
            for id in catalog_ids("artist", ids) {
                let result = ingestor.ingest_artist(&id, reviewer.as_mut())?;
                print_artist_ingestion(&result);
            }
        }
        Entity::Artists(ArtistCommand::Refresh { review }) => {
            let client = connect()?;
            let ingestor = Ingestor::new(store, &client, config.ingestion.clone());
            let mut reviewer = reviewer(review)?;
            for result in ingestor.refresh_followed_artists(reviewer.as_mut())? {
                print_artist_ingestion(&result);
            }
        }
        Entity::Playlists(PlaylistCommand::Get { id: Some(id) }) => {
            let id = catalog_id("playlist", id);
            match store.get_playlist(&id)? {
                Some(playlist) => cli_style::print_playlist(&playlist),
                None => print_warning(&format!("Playlist {} not found", id)),
            }
        }
        Entity::Playlists(PlaylistCommand::Get { id: None }) => {
            cli_style::print_playlists(&store.get_all_playlists()?);
        }
        Entity::Playlists(PlaylistCommand::Add { ids }) => {
            let client = connect()?;
            let ingestor = Ingestor::new(store, &client, config.ingestion.clone());
            for playlist in ingestor.ingest_playlists(&catalog_ids("playlist", ids))? {
                print_success(&format!(
                    "{} ({} tracks)",
                    playlist.name,
                    playlist.tracks.len()
                ));
            }
        }
        Entity::Playlists(PlaylistCommand::Remove { ids, delete }) => {
            for id in catalog_ids("playlist", ids) {
                let removed = store.remove_playlist(&id, *delete)?;
                print_removal("playlist", &id, *delete, removed);
            }
        }
    }
    Ok(())
}

fn try_main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()?;

    let file_config = cli_args
        .config
        .as_deref()
        .map(FileConfig::load)
        .transpose()?;
    let config = AppConfig::resolve(&cli_args.cli_config(), file_config)?;

    info!("Opening SQLite catalog database at {:?}...", config.db_path);
    let store = SqliteCatalogStore::open(&config.db_path)
        .with_context(|| format!("Failed to open catalog database {:?}", config.db_path))?;

    let result = run(&cli_args.command, &config, &store);
    let closed = store.close().context("Failed to close catalog database");
    result?;
    closed
}

fn main() -> ExitCode {
    match try_main() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            print_error(&format!("{:#}", e));
            ExitCode::FAILURE
        }
    }
}
