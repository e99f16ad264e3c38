use crate::tile::MIN_TILE_DEG;
use crate::{Error, Result};
use std::env;
use std::path::PathBuf;

pub const DEFAULT_UPSTREAM_URL: &str = "https://api.maptrip.de/v1";
const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_DATA_DIR: &str = "data";
const DEFAULT_STATIC_DIR: &str = ".";

/// Settings read from the environment. Values only one command needs are
/// kept raw and validated by that command.
#[derive(Clone, Debug)]
pub struct Conf {
    /// Bearer token for the upstream API, empty when not set
    pub token: String,
    pub upstream_url: String,
    pub host: String,
    pub data_dir: PathBuf,
    pub static_dir: PathBuf,
    port: Option<String>,
    tile_deg: Option<String>,
}

impl Conf {
    pub fn from_env() -> Conf {
        Conf::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Conf {
        let var = |key: &str| lookup(key).filter(|it| !it.trim().is_empty());
        Conf {
            token: var("MAPTRIP_TOKEN").unwrap_or_default(),
            upstream_url: var("MAPTRIP_BASE").unwrap_or(DEFAULT_UPSTREAM_URL.into()),
            host: var("HOST").unwrap_or(DEFAULT_HOST.into()),
            data_dir: var("DATA_DIR").unwrap_or(DEFAULT_DATA_DIR.into()).into(),
            static_dir: var("STATIC_DIR")
                .unwrap_or(DEFAULT_STATIC_DIR.into())
                .into(),
            port: var("PORT"),
            tile_deg: var("FETCH_TILE_DEG"),
        }
    }

    pub fn has_token(&self) -> bool {
        !self.token.is_empty()
    }

    pub fn port(&self) -> Result<u16> {
        match &self.port {
            Some(port) => port
                .trim()
                .parse()
                .map_err(|_| Error::Config(format!("Invalid PORT: {port}"))),
            None => Ok(DEFAULT_PORT),
        }
    }

    /// Tile edge in degrees, the fetcher uses whole regions when absent
    pub fn tile_deg(&self) -> Result<Option<f64>> {
        let Some(deg) = &self.tile_deg else {
            return Ok(None);
        };
        let parsed: f64 = deg
            .trim()
            .parse()
            .map_err(|_| Error::Config(format!("Invalid FETCH_TILE_DEG: {deg}")))?;
        if !parsed.is_finite() || parsed < MIN_TILE_DEG {
            Err(Error::Config(format!(
                "FETCH_TILE_DEG must be at least {MIN_TILE_DEG}, got {deg}"
            )))?
        }
        Ok(Some(parsed))
    }
}
