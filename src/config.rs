//! Configuration management with TOML, environment variables, and CLI overrides.

use crate::competitors::Competitor;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Application configuration with layered loading.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Shared secret validated against the `x-api-key` request header.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Address the HTTP server binds to.
    #[serde(default = "default_listen_address")]
    pub listen_address: String,

    /// Upstream request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Upstream connect timeout in seconds
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// Base delay between upstream requests in milliseconds
    #[serde(default)]
    pub delay_ms: u64,

    /// Random jitter added to delay (0 to this value)
    #[serde(default)]
    pub delay_jitter_ms: u64,

    /// Lifetime of cached lookups in seconds
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,

    /// Storefront base URLs, overridable per competitor
    #[serde(default)]
    pub bases: Bases,
}

fn default_listen_address() -> String {
    "0.0.0.0:8000".to_string()
}

fn default_timeout_secs() -> u64 {
    15
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_cache_ttl_secs() -> u64 {
    6 * 3600
}

/// Storefront base URLs for each supported competitor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bases {
    #[serde(default = "default_tata_base")]
    pub tata: String,
    #[serde(default = "default_eldorado_base")]
    pub eldorado: String,
    #[serde(default = "default_elclon_base")]
    pub elclon: String,
    #[serde(default = "default_mily_base")]
    pub mily: String,
}

fn default_tata_base() -> String {
    Competitor::Tata.default_base_url().to_string()
}

fn default_eldorado_base() -> String {
    Competitor::ElDorado.default_base_url().to_string()
}

fn default_elclon_base() -> String {
    Competitor::ElClon.default_base_url().to_string()
}

fn default_mily_base() -> String {
    Competitor::Mily.default_base_url().to_string()
}

impl Default for Bases {
    fn default() -> Self {
        Self {
            tata: default_tata_base(),
            eldorado: default_eldorado_base(),
            elclon: default_elclon_base(),
            mily: default_mily_base(),
        }
    }
}

impl Bases {
    /// Returns the base URL for a competitor, without a trailing slash.
    pub fn get(&self, competitor: Competitor) -> &str {
        let base = match competitor {
            Competitor::Tata => &self.tata,
            Competitor::ElDorado => &self.eldorado,
            Competitor::ElClon => &self.elclon,
            Competitor::Mily => &self.mily,
        };
        base.trim_end_matches('/')
    }

    fn set(&mut self, competitor: Competitor, base: String) {
        match competitor {
            Competitor::Tata => self.tata = base,
            Competitor::ElDorado => self.eldorado = base,
            Competitor::ElClon => self.elclon = base,
            Competitor::Mily => self.mily = base,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            listen_address: default_listen_address(),
            timeout_secs: default_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
            delay_ms: 0,
            delay_jitter_ms: 0,
            cache_ttl_secs: default_cache_ttl_secs(),
            bases: Bases::default(),
        }
    }
}

impl Config {
    /// Creates a new default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!("Loading config from: {}", path.display());

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Loads configuration with fallback to default locations.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        // 1. Explicit path takes precedence
        if let Some(path) = explicit_path {
            return Self::from_file(path);
        }

        // 2. Try current directory
        let local_config = Path::new("config.toml");
        if local_config.exists() {
            debug!("Found config.toml in current directory");
            return Self::from_file(local_config);
        }

        // 3. Try XDG config directory
        if let Some(config_dir) = dirs::config_dir() {
            let xdg_config = config_dir.join("comparador").join("config.toml");
            if xdg_config.exists() {
                debug!("Found config in XDG config directory");
                return Self::from_file(xdg_config);
            }
        }

        // 4. Return default config
        debug!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Applies environment variable overrides.
    ///
    /// `API_KEY` sets the shared secret, `PORT` rebinds the listener to
    /// `0.0.0.0:$PORT` (hosting platforms inject it), and `TATA_BASE` /
    /// `ELDORADO_BASE` / `ELCLON_BASE` / `MILY_BASE` swap storefront domains
    /// without touching the config file.
    pub fn with_env(mut self) -> Self {
        if let Ok(key) = std::env::var("API_KEY") {
            if !key.is_empty() {
                self.api_key = Some(key);
            }
        }

        if let Ok(port) = std::env::var("PORT") {
            if port.parse::<u16>().is_ok() {
                self.listen_address = format!("0.0.0.0:{}", port);
            }
        }

        for &competitor in Competitor::all() {
            if let Ok(base) = std::env::var(competitor.base_env_var()) {
                if !base.is_empty() {
                    self.bases.set(competitor, base);
                }
            }
        }

        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.api_key.is_none());
        assert_eq!(config.listen_address, "0.0.0.0:8000");
        assert_eq!(config.timeout_secs, 15);
        assert_eq!(config.connect_timeout_secs, 10);
        assert_eq!(config.delay_ms, 0);
        assert_eq!(config.delay_jitter_ms, 0);
        assert_eq!(config.cache_ttl_secs, 21600);
        assert_eq!(config.bases.get(Competitor::Tata), "https://tata.com.uy");
        assert_eq!(config.bases.get(Competitor::Mily), "https://www.mily.com.uy");
    }

    #[test]
    fn test_bases_trailing_slash_trimmed() {
        let mut config = Config::default();
        config.bases.tata = "http://localhost:9000/".to_string();
        assert_eq!(config.bases.get(Competitor::Tata), "http://localhost:9000");
    }

    #[test]
    fn test_config_from_toml() {
        let toml = r#"
            api_key = "s3cret"
            listen_address = "127.0.0.1:3000"
            delay_ms = 250
            cache_ttl_secs = 60

            [bases]
            tata = "http://tata.test"
        "#;

        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.api_key.as_deref(), Some("s3cret"));
        assert_eq!(config.listen_address, "127.0.0.1:3000");
        assert_eq!(config.delay_ms, 250);
        assert_eq!(config.cache_ttl_secs, 60);
        assert_eq!(config.bases.get(Competitor::Tata), "http://tata.test");
        // Unset bases keep their defaults
        assert_eq!(config.bases.get(Competitor::ElClon), "https://www.elclon.com.uy");
    }

    #[test]
    fn test_config_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
            api_key = "from-file"
            timeout_secs = 30
            "#
        )
        .unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.api_key.as_deref(), Some("from-file"));
        assert_eq!(config.timeout_secs, 30);
    }

    #[test]
    fn test_config_from_file_not_found() {
        let result = Config::from_file("/nonexistent/path/config.toml");
        assert!(result.is_err());
        let err = result.unwrap_err().to_string();
        assert!(err.contains("Failed to read config file"));
    }

    #[test]
    fn test_config_from_file_invalid_toml() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "not valid toml {{{{").unwrap();

        let result = Config::from_file(file.path());
        assert!(result.is_err());
        let err = result.unwrap_err().to_string();
        assert!(err.contains("Failed to parse config file"));
    }

    #[test]
    fn test_config_load_explicit_path() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
            delay_ms = 100
            "#
        )
        .unwrap();

        let config = Config::load(Some(file.path())).unwrap();
        assert_eq!(config.delay_ms, 100);
    }

    #[test]
    fn test_config_with_env() {
        // Save original env vars
        let orig_key = std::env::var("API_KEY").ok();
        let orig_port = std::env::var("PORT").ok();
        let orig_tata = std::env::var("TATA_BASE").ok();

        std::env::set_var("API_KEY", "env-secret");
        std::env::set_var("PORT", "9090");
        std::env::set_var("TATA_BASE", "http://tata.local");

        let config = Config::new().with_env();
        assert_eq!(config.api_key.as_deref(), Some("env-secret"));
        assert_eq!(config.listen_address, "0.0.0.0:9090");
        assert_eq!(config.bases.get(Competitor::Tata), "http://tata.local");

        // Restore original env vars
        match orig_key {
            Some(v) => std::env::set_var("API_KEY", v),
            None => std::env::remove_var("API_KEY"),
        }
        match orig_port {
            Some(v) => std::env::set_var("PORT", v),
            None => std::env::remove_var("PORT"),
        }
        match orig_tata {
            Some(v) => std::env::set_var("TATA_BASE", v),
            None => std::env::remove_var("TATA_BASE"),
        }
    }

    #[test]
    fn test_config_with_env_invalid_port() {
        let orig_port = std::env::var("PORT").ok();

        std::env::set_var("PORT", "not_a_port");

        let config = Config::new().with_env();
        // Invalid port is ignored, keeping the default listener
        assert_eq!(config.listen_address, "0.0.0.0:8000");

        match orig_port {
            Some(v) => std::env::set_var("PORT", v),
            None => std::env::remove_var("PORT"),
        }
    }

    #[test]
    fn test_config_serde_roundtrip() {
        let mut config = Config::default();
        config.api_key = Some("k".to_string());
        config.delay_ms = 42;

        let json = serde_json::to_string(&config).unwrap();
        let parsed: Config = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed.api_key, config.api_key);
        assert_eq!(parsed.delay_ms, 42);
        assert_eq!(parsed.bases.get(Competitor::Mily), config.bases.get(Competitor::Mily));
    }
}
