mod file_config;

pub use file_config::{FileConfig, IngestionFileConfig};

use crate::catalog_client::Credentials;
use crate::ingestion::IngestionConfig;
use anyhow::{bail, Result};
use std::path::PathBuf;

pub const DEFAULT_API_BASE_URL: &str = "https://api.spotify.com/v1";
pub const DEFAULT_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";

/// Largest page the Web API serves.
const MAX_PAGE_SIZE: u32 = 50;
/// Largest batch accepted by the several-albums endpoint.
const MAX_ALBUM_CHUNK: usize = 20;
/// Largest batch accepted by the several-tracks endpoint.
const MAX_TRACK_CHUNK: usize = 50;

/// CLI arguments that can be used for config resolution.
/// This struct mirrors the CLI arguments that can be overridden by TOML config.
#[derive(Debug, Clone)]
pub struct CliConfig {
    pub db_path: PathBuf,
    pub api_base_url: String,
    pub token_url: String,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub request_timeout_sec: u64,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("melody.db"),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            token_url: DEFAULT_TOKEN_URL.to_string(),
            client_id: None,
            client_secret: None,
            request_timeout_sec: 30,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub db_path: PathBuf,
    pub api_base_url: String,
    pub token_url: String,
    pub request_timeout_sec: u64,
    credentials: Option<Credentials>,

    pub ingestion: IngestionConfig,
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let db_path = file
            .db_path
            .map(PathBuf::from)
            .unwrap_or_else(|| cli.db_path.clone());
        if db_path.is_dir() {
            bail!("db_path is a directory: {:?}", db_path);
        }

        let api_base_url = file.api_base_url.unwrap_or_else(|| cli.api_base_url.clone());
        let token_url = file.token_url.unwrap_or_else(|| cli.token_url.clone());
        let credentials = match (
            file.client_id.or_else(|| cli.client_id.clone()),
            file.client_secret.or_else(|| cli.client_secret.clone()),
        ) {
            (Some(client_id), Some(client_secret)) => Some(Credentials {
                client_id,
                client_secret,
            }),
            _ => None,
        };

        let request_timeout_sec = file.request_timeout_sec.unwrap_or(cli.request_timeout_sec);
        if request_timeout_sec == 0 {
            bail!("request_timeout_sec must be greater than 0");
        }

        // Ingestion settings - merge file config with defaults
        let defaults = IngestionConfig::default();
        let ingestion_file = file.ingestion.unwrap_or_default();
        let ingestion = IngestionConfig {
            page_size: ingestion_file.page_size.unwrap_or(defaults.page_size),
            album_chunk_size: ingestion_file
                .album_chunk_size
                .unwrap_or(defaults.album_chunk_size),
            track_chunk_size: ingestion_file
                .track_chunk_size
                .unwrap_or(defaults.track_chunk_size),
        };
        if !(1..=MAX_PAGE_SIZE).contains(&ingestion.page_size) {
            bail!("page_size must be between 1 and {}", MAX_PAGE_SIZE);
        }
        if !(1..=MAX_ALBUM_CHUNK).contains(&ingestion.album_chunk_size) {
            bail!("album_chunk_size must be between 1 and {}", MAX_ALBUM_CHUNK);
        }
        if !(1..=MAX_TRACK_CHUNK).contains(&ingestion.track_chunk_size) {
            bail!("track_chunk_size must be between 1 and {}", MAX_TRACK_CHUNK);
        }

        Ok(Self {
            db_path,
            api_base_url,
            token_url,
            request_timeout_sec,
            credentials,
            ingestion,
        })
    }

    /// Client credentials, needed only by commands that reach the catalog.
    pub fn credentials(&self) -> Result<Credentials> {
        match &self.credentials {
            Some(credentials) => Ok(credentials.clone()),
            None => bail!(
                "client_id and client_secret must be specified via --client-id/--client-secret, \
                 MELODY_CLIENT_ID/MELODY_CLIENT_SECRET or in config file"
            ),
        }
    }
}
