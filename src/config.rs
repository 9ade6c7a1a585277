use std::env;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::normalizer::FormatNormalizer;
use crate::orchestrator::FallbackPolicy;
use crate::stories::DEFAULT_STORY_TTL_HOURS;
use crate::transport::primary::DEFAULT_SETTLE_DELAY;

/// Request bodies up to this size reach the upload handlers, so oversize
/// files get the transport's own rejection instead of a bare 413.
pub const DEFAULT_BODY_LIMIT: usize = 20 * 1024 * 1024;

#[derive(Clone, Debug)]
pub struct Config {
    pub bind_host: String,
    pub port: u16,
    pub public_dir: PathBuf,
    pub settle_delay: Duration,
    pub fallback_policy: FallbackPolicy,
    pub normalize_media_types: Vec<String>,
    pub story_ttl: chrono::Duration,
    pub body_limit: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_host: "0.0.0.0".to_string(),
            port: 3000,
            public_dir: PathBuf::from("public"),
            settle_delay: DEFAULT_SETTLE_DELAY,
            fallback_policy: FallbackPolicy::default(),
            normalize_media_types: vec!["image/avif".to_string()],
            story_ttl: chrono::Duration::hours(DEFAULT_STORY_TTL_HOURS),
            body_limit: DEFAULT_BODY_LIMIT,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds a config from any variable source. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let value = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
        let mut config = Self::default();

        if let Some(host) = value("BIND_HOST") {
            config.bind_host = host.trim().to_string();
        }
        if let Some(port) = value("PORT") {
            config.port = port.trim().parse().context("PORT must be a port number")?;
        }
        if let Some(dir) = value("PUBLIC_DIR") {
            config.public_dir = PathBuf::from(dir.trim());
        }
        if let Some(ms) = value("UPLOAD_SETTLE_MS") {
            let ms: u64 = ms
                .trim()
                .parse()
                .context("UPLOAD_SETTLE_MS must be a whole number of milliseconds")?;
            config.settle_delay = Duration::from_millis(ms);
        }
        if let Some(flag) = value("FALLBACK_ON_VALIDATION_ERROR") {
            config.fallback_policy.fallback_on_validation_error = parse_bool(&flag)
                .context("FALLBACK_ON_VALIDATION_ERROR must be true or false")?;
        }
        if let Some(types) = value("NORMALIZE_MEDIA_TYPES") {
            config.normalize_media_types = types
                .split(',')
                .map(|value| value.trim().to_lowercase())
                .filter(|value| !value.is_empty())
                .collect();
        }
        if let Some(hours) = value("STORY_TTL_HOURS") {
            let hours: i64 = hours
                .trim()
                .parse()
                .context("STORY_TTL_HOURS must be a whole number of hours")?;
            config.story_ttl = chrono::Duration::try_hours(hours)
                .filter(|ttl| *ttl > chrono::Duration::zero())
                .context("STORY_TTL_HOURS must be a positive number of hours in range")?;
        }
        Ok(config)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.bind_host, self.port)
    }

    pub fn normalizer(&self) -> FormatNormalizer {
        FormatNormalizer::new(&self.normalize_media_types)
    }
}

fn parse_bool(raw: &str) -> Result<bool> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => anyhow::bail!("invalid boolean: {other}"),
    }
}
