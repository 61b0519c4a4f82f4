//! # Configuration Management
//!
//! Configuration is resolved once at startup and is read-only afterwards.
//! Sources, from lowest to highest priority:
//!
//! 1. Built-in defaults (the `Default` impl below)
//! 2. `config.toml` in the working directory, or the file given with `--config`
//! 3. Environment variables with the `APP_` prefix (`APP_STORAGE__LOCAL_DIR`, ...)
//! 4. The short deployment variables `SERVER_ADDR` and `AUDIO_STORAGE_DIR`
//! 5. Command line flags (`--addr`, `--remote-url`, `--remote-path`, ...)
//!
//! ## Key Rust Concepts Used:
//! - **Serde**: the `config` crate deserializes the merged sources into our structs
//! - **clap derive**: command line flags are declared as struct fields
//! - **Option<T>**: a flag that was not passed is `None` and leaves config untouched

use anyhow::{bail, Result};
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

/// Command line flags.
#[derive(Debug, Default, Parser)]
#[command(name = "audio-ingest", version, about = "Receives raw PCM audio over HTTP and stores it as WAV files")]
pub struct Cli {
    /// Listen address, e.g. ":8080" or "127.0.0.1:9000"
    #[arg(long)]
    pub addr: Option<String>,

    /// Base URL of the remote blob store. Remote storage is disabled without it.
    #[arg(long)]
    pub remote_url: Option<String>,

    /// Folder inside the remote store that uploads are written to
    #[arg(long)]
    pub remote_path: Option<String>,

    /// Timeout for a single remote write, in seconds (0 = no timeout)
    #[arg(long)]
    pub remote_timeout_secs: Option<u64>,

    /// Path to a TOML configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
}

/// ## Fields:
/// - `addr`: listen address; a bare `:port` means every interface
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub addr: String,
}

/// Where uploads go.
///
/// ## Fields:
/// - `local_dir`: permanent local directory, created on first upload
/// - `temp_dir`: where each upload is staged before routing
/// - `remote`: optional remote blob store tried before `local_dir`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub local_dir: String,
    pub temp_dir: String,
    pub remote: RemoteConfig,
}

/// Remote blob store settings. An empty `endpoint` disables remote storage.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RemoteConfig {
    pub endpoint: String,
    /// Empty means the bucket root.
    pub path_prefix: String,
    /// 0 means no timeout.
    pub timeout_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                addr: ":8080".to_string(),  // Every interface, port 8080
            },
            storage: StorageConfig::default(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            local_dir: "./audio_files".to_string(),
            temp_dir: env::temp_dir().to_string_lossy().into_owned(),
            remote: RemoteConfig::default(),
        }
    }
}

impl RemoteConfig {
    pub fn is_enabled(&self) -> bool {
        !self.endpoint.trim().is_empty()
    }
}

impl ServerConfig {
    /// Address in the form `HttpServer::bind` accepts.
    ///
    /// `":8080"` becomes `"0.0.0.0:8080"`; anything else is passed through.
    pub fn bind_address(&self) -> String {
        if self.addr.starts_with(':') {
            format!("0.0.0.0{}", self.addr)
        } else {
            self.addr.clone()
        }
    }
}

impl AppConfig {
    /// Load configuration from every source, flags last.
    pub fn load(cli: &Cli) -> Result<Self> {
        let file = match &cli.config {
            Some(path) => config::File::from(path.as_path()).required(true),
            None => config::File::with_name("config").required(false),
        };

        let mut settings = config::Config::builder()
            .add_source(config::Config::try_from(&AppConfig::default())?)
            .add_source(file)
            // APP_SERVER__ADDR becomes server.addr
            .add_source(
                config::Environment::with_prefix("APP")
                    .prefix_separator("_")
                    .separator("__"),
            );

        if let Some(addr) = non_empty_env("SERVER_ADDR") {
            settings = settings.set_override("server.addr", addr)?;
        }

        if let Some(dir) = non_empty_env("AUDIO_STORAGE_DIR") {
            settings = settings.set_override("storage.local_dir", dir)?;
        }

        let mut config: AppConfig = settings.build()?.try_deserialize()?;
        config.apply_cli(cli);
        Ok(config)
    }

    /// Overlay command line flags. Empty strings count as "not given".
    pub fn apply_cli(&mut self, cli: &Cli) {
        if let Some(addr) = cli.addr.as_deref().filter(|a| !a.is_empty()) {
            self.server.addr = addr.to_string();
        }
        if let Some(url) = cli.remote_url.as_deref().filter(|u| !u.is_empty()) {
            self.storage.remote.endpoint = url.to_string();
        }
        if let Some(prefix) = &cli.remote_path {
            self.storage.remote.path_prefix = prefix.clone();
        }
        if let Some(secs) = cli.remote_timeout_secs {
            self.storage.remote.timeout_secs = secs;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.server.addr.trim().is_empty() {
            bail!("Listen address cannot be empty");
        }

        if self.storage.local_dir.trim().is_empty() {
            bail!("Local storage directory cannot be empty");
        }

        if self.storage.temp_dir.trim().is_empty() {
            bail!("Temp directory cannot be empty");
        }

        let endpoint = self.storage.remote.endpoint.trim();
        if !endpoint.is_empty()
            && !(endpoint.starts_with("http://") || endpoint.starts_with("https://"))
        {
            bail!("Remote endpoint must be an http(s) URL, got {:?}", endpoint);
        }

        Ok(())
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.is_empty())
}
