//! Run configuration.
//!
//! Settings come from an optional TOML file and are overridden by command-line
//! flags or `MARSHAL_*` environment variables:
//!
//! ```toml
//! schema = "schema.yaml"
//! entity = "Article"
//! date_format = "dd/MM/yyyy"
//! time_zone = "Europe/Berlin"
//! mode = "strict"
//! ```

use anyhow::Context;
use chrono_tz::Tz;
use clap::Parser;
use marshal_json::{CoercionConfig, CoercionMode, DateFormat};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// File-level configuration. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct MarshalConfig {
    /// Schema file (YAML)
    #[serde(default)]
    pub schema: Option<PathBuf>,

    /// Entity of the root records
    #[serde(default)]
    pub entity: Option<String>,

    /// Date format, time zone and coercion mode
    #[serde(flatten)]
    pub coercion: CoercionConfig,
}

impl MarshalConfig {
    /// Load configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {path:?}"))?;
        Self::from_toml(&content).with_context(|| format!("Invalid config file {path:?}"))
    }

    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        toml::from_str(content).context("Failed to parse TOML configuration")
    }
}

/// Command-line and environment overrides.
#[derive(Parser, Debug, Clone, Default)]
pub struct MarshalOpts {
    /// TOML configuration file
    #[arg(long, env = "MARSHAL_CONFIG")]
    pub config: Option<PathBuf>,

    /// Schema file (YAML)
    #[arg(long, env = "MARSHAL_SCHEMA")]
    pub schema: Option<PathBuf>,

    /// Entity of the root records
    #[arg(long, env = "MARSHAL_ENTITY")]
    pub entity: Option<String>,

    /// Date format: rfc3339, epoch_seconds, epoch_millis, or a pattern
    /// such as "yyyy-MM-dd" or "%d/%m/%Y"
    #[arg(long, env = "MARSHAL_DATE_FORMAT")]
    pub date_format: Option<String>,

    /// IANA time zone for dates without an offset (e.g. "Europe/Berlin")
    #[arg(long, env = "MARSHAL_TIME_ZONE")]
    pub time_zone: Option<String>,

    /// Report malformed values as errors and fail the run
    #[arg(long, env = "MARSHAL_STRICT")]
    pub strict: bool,
}

impl MarshalOpts {
    /// Read the configuration file, if any, and apply the overrides.
    pub fn load(&self) -> anyhow::Result<MarshalConfig> {
        let base = match &self.config {
            Some(path) => MarshalConfig::from_file(path)?,
            None => MarshalConfig::default(),
        };
        self.apply(base)
    }

    /// Apply the overrides on top of `config`.
    pub fn apply(&self, config: MarshalConfig) -> anyhow::Result<MarshalConfig> {
        let mut coercion = config.coercion;

        if let Some(format) = &self.date_format {
            coercion = coercion.with_date_format(DateFormat::from(format.clone()));
        }
        if let Some(zone) = &self.time_zone {
            coercion = coercion.with_time_zone(parse_time_zone(zone)?);
        }
        if self.strict {
            coercion = coercion.with_mode(CoercionMode::Strict);
        }

        Ok(MarshalConfig {
            schema: self.schema.clone().or(config.schema),
            entity: self.entity.clone().or(config.entity),
            coercion,
        })
    }
}

/// Parse an IANA time zone name.
pub fn parse_time_zone(name: &str) -> anyhow::Result<Tz> {
    name.trim()
        .parse::<Tz>()
        .map_err(|e| anyhow::anyhow!("Invalid time zone '{name}': {e}"))
}
