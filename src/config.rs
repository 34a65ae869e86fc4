//! Service configuration read from the environment.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use crate::Limits;
use crate::catalog::Catalog;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name}={value:?} is not valid: {reason}")]
    InvalidVar {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("failed to read catalog {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse catalog {}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub port: u16,
    pub log_file: PathBuf,
    pub sentry_dsn: Option<String>,
    pub catalog: Catalog,
    pub limits: Limits,
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the config from any variable source. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let mut catalog = match var("CATALOG_PATH") {
            Some(path) => load_catalog(PathBuf::from(path))?,
            None => Catalog::default(),
        };
        apply_catalog_overrides(&mut catalog, &var)?;

        let mut limits = Limits::default();
        if let Some(max) = parse::<usize, _>(&var, "MAX_PIECES")? {
            limits.max_pieces = max;
        }
        if let Some(ms) = parse::<u64, _>(&var, "TIME_LIMIT_MS")? {
            limits.time_limit = (ms > 0).then(|| Duration::from_millis(ms));
        }

        Ok(Self {
            port: parse(&var, "PORT")?.unwrap_or(3001),
            log_file: var("LOG_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("development.log")),
            sentry_dsn: var("SENTRY_DSN"),
            catalog,
            limits,
        })
    }
}

pub fn load_catalog(path: PathBuf) -> Result<Catalog, ConfigError> {
    let text = std::fs::read_to_string(&path).map_err(|source| ConfigError::Io {
        path: path.clone(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| ConfigError::Json { path, source })
}

fn apply_catalog_overrides<V>(catalog: &mut Catalog, var: &V) -> Result<(), ConfigError>
where
    V: Fn(&str) -> Option<String>,
{
    if let Some(kerf) = parse(var, "DEFAULT_KERF_MM")? {
        catalog.default_kerf_mm = kerf;
    }
    if let Some(width) = parse(var, "DEFAULT_BOARD_WIDTH_MM")? {
        catalog.default_board.width = width;
    }
    if let Some(length) = parse(var, "DEFAULT_BOARD_LENGTH_MM")? {
        catalog.default_board.length = length;
    }
    if let Some(price) = parse_price(var, "CUTTING_PRICE_PER_BOARD")? {
        catalog.cutting_price_per_board = price;
    }
    if let Some(price) = parse_price(var, "EDGING_PRICE_PER_METER")? {
        catalog.edging_price_per_meter = price;
    }
    if let Some(price) = parse_price(var, "CLIENT_EDGING_PRICE_PER_METER")? {
        catalog.client_edging_price_per_meter = price;
    }
    if let Some(rate) = parse_price(var, "TAX_RATE_PERCENT")? {
        catalog.tax_rate_percent = rate;
    }
    if let Some(name) = var("TAX_NAME") {
        catalog.tax_name = name;
    }
    if let Some(currency) = var("CURRENCY") {
        catalog.currency = currency;
    }
    Ok(())
}

fn parse<T, V>(var: &V, name: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    V: Fn(&str) -> Option<String>,
{
    var(name)
        .map(|value| {
            value.trim().parse::<T>().map_err(|e| ConfigError::InvalidVar {
                name,
                reason: e.to_string(),
                value,
            })
        })
        .transpose()
}

fn parse_price<V>(var: &V, name: &'static str) -> Result<Option<f64>, ConfigError>
where
    V: Fn(&str) -> Option<String>,
{
    match parse::<f64, V>(var, name)? {
        Some(v) if !v.is_finite() || v < 0.0 => Err(ConfigError::InvalidVar {
            name,
            value: v.to_string(),
            reason: "must be a non-negative number".to_string(),
        }),
        other => Ok(other),
    }
}
