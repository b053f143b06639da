//! Runtime configuration read from the environment (and `.env`, if present)

use std::path::PathBuf;
use std::str::FromStr;
use url::Url;

use crate::error::DrawerError;

const DEFAULT_CLIENT_ID: &str = "69facee09a274b808da670e7f93258c4";
const DEFAULT_REDIRECT_URI: &str = "http://127.0.0.1:8898/callback";
const DEFAULT_CACHE_DIR: &str = ".cache";
const DEFAULT_DEVICE_NAME: &str = "Music Drawer Player";
const DEFAULT_VOLUME: f32 = 0.5;
const DEFAULT_SEARCH_LIMIT: u32 = 5;

const TOKEN_FILE: &str = "spotify_token.json";
const FAVORITE_FILE: &str = "selected_song.json";

#[derive(Debug, Clone)]
pub struct Config {
    pub client_id: String,
    pub redirect_uri: Url,
    pub cache_dir: PathBuf,
    pub device_name: String,
    pub volume: f32,
    pub search_limit: u32,
}

impl Config {
    pub fn load() -> Result<Self, DrawerError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary variable source. Unset or blank
    /// variables fall back to their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, DrawerError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let redirect_raw = var("MUSIC_DRAWER_REDIRECT_URI")
            .unwrap_or_else(|| DEFAULT_REDIRECT_URI.to_string());
        let redirect_uri = Url::parse(&redirect_raw).map_err(|e| {
            DrawerError::Config(format!("MUSIC_DRAWER_REDIRECT_URI: {}", e))
        })?;

        let config = Self {
            client_id: var("MUSIC_DRAWER_CLIENT_ID")
                .unwrap_or_else(|| DEFAULT_CLIENT_ID.to_string()),
            redirect_uri,
            cache_dir: var("MUSIC_DRAWER_CACHE_DIR")
                .unwrap_or_else(|| DEFAULT_CACHE_DIR.to_string())
                .into(),
            device_name: var("MUSIC_DRAWER_DEVICE_NAME")
                .unwrap_or_else(|| DEFAULT_DEVICE_NAME.to_string()),
            volume: parse_or("MUSIC_DRAWER_VOLUME", var("MUSIC_DRAWER_VOLUME"), DEFAULT_VOLUME)?,
            search_limit: parse_or(
                "MUSIC_DRAWER_SEARCH_LIMIT",
                var("MUSIC_DRAWER_SEARCH_LIMIT"),
                DEFAULT_SEARCH_LIMIT,
            )?,
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), DrawerError> {
        if self.client_id.trim().is_empty() {
            return Err(DrawerError::Config("client id is empty".to_string()));
        }

        if !(0.0..=1.0).contains(&self.volume) {
            return Err(DrawerError::Config(format!(
                "volume must be between 0 and 1, got {}",
                self.volume
            )));
        }

        if self.search_limit == 0 || self.search_limit > 50 {
            return Err(DrawerError::Config(format!(
                "search limit must be between 1 and 50, got {}",
                self.search_limit
            )));
        }

        // The callback listener binds to this address, so it must be a local http port.
        let uri = &self.redirect_uri;
        let loopback = matches!(uri.host_str(), Some("127.0.0.1" | "localhost" | "[::1]"));
        if uri.scheme() != "http" || !loopback || uri.port().is_none() {
            return Err(DrawerError::Config(format!(
                "redirect uri must be http://<loopback>:<port>/..., got {}",
                uri
            )));
        }

        Ok(())
    }

    pub fn token_path(&self) -> PathBuf {
        self.cache_dir.join(TOKEN_FILE)
    }

    pub fn favorite_path(&self) -> PathBuf {
        self.cache_dir.join(FAVORITE_FILE)
    }

    pub fn librespot_cache_dir(&self) -> PathBuf {
        self.cache_dir.join("librespot")
    }
}

fn parse_or<T: FromStr>(name: &str, raw: Option<String>, default: T) -> Result<T, DrawerError>
where
    T::Err: std::fmt::Display,
{
    match raw {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|e| DrawerError::Config(format!("{}: {}", name, e))),
        None => Ok(default),
    }
}
