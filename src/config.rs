use serde::{Serialize, Deserialize};
use tracing::{error, info};
use url::Url;

// Sane defaults for castdir
const REFRESH_INTERVAL: u64 = 5 * 60;
const FETCH_TIMEOUT: u64    = 10000;
const HTTP_MAX_LEN: usize   = 8192;

/// What we present ourselves as to the feeds we poll
pub const AGENT: &str       = "castdir/0.1.0";

/// Directory configuration
#[derive(Serialize, Deserialize)]
pub struct DirectorySettings {
    /// Urls of the channel feed index endpoints to aggregate
    #[serde(default)]
    pub feeds: Vec<String>,
    /// Minimum interval in seconds between two refresh cycles
    #[serde(default = "default_val_refresh_interval")]
    pub refresh_interval: u64,
    /// Predefined limits a single feed fetch shall not surpass
    #[serde(default = "default_val_limits")]
    pub limits: FetchLimits
}

#[derive(Serialize, Deserialize, Clone)]
pub struct FetchLimits {
    /// Max time in millis we wait on any single network step of a fetch
    #[serde(default = "default_val_limit_timeout")]
    pub timeout: u64,
    /// Max http response header size in bytes we are willing to accept
    #[serde(default = "default_val_limit_http_max_len")]
    pub http_max_len: usize
}

impl Default for DirectorySettings {
    fn default() -> Self {
        DirectorySettings {
            feeds: Vec::new(),
            refresh_interval: default_val_refresh_interval(),
            limits: default_val_limits()
        }
    }
}

impl Default for FetchLimits {
    fn default() -> Self {
        FetchLimits {
            timeout: default_val_limit_timeout(),
            http_max_len: default_val_limit_http_max_len()
        }
    }
}

fn default_val_refresh_interval() -> u64 { REFRESH_INTERVAL }
fn default_val_limits() -> FetchLimits { FetchLimits::default() }

fn default_val_limit_timeout() -> u64 { FETCH_TIMEOUT }
fn default_val_limit_http_max_len() -> usize { HTTP_MAX_LEN }

impl DirectorySettings {
    pub fn load(config_path: &str) -> Self {
        match std::fs::read_to_string(config_path) {
            Ok(v) => {
                match serde_yaml::from_str::<DirectorySettings>(&v) {
                    Ok(v) => {
                        info!("Loaded configuration from {}", config_path);
                        v
                    },
                    Err(e) => {
                        error!("Loading config file {} failed: {}", config_path, e);
                        std::process::exit(1);
                    }
                }
            },
            Err(e) => {
                error!("Reading config file {} failed: {}", config_path, e);
                std::process::exit(1);
            }
        }
    }

    pub fn create_default(config_path: &str) {
        let settings = serde_yaml::to_string(&Self::default()).expect("Can't serialize directory settings");
        match std::fs::write(config_path, &settings) {
            Ok(_) => info!("Default config file written to {}", config_path),
            Err(e) => error!("Creating default config at {} failed: {}", config_path, e)
        }
    }

    /// Reject configs whose feed list holds anything but http URLs
    pub fn verify(&self) {
        for feed in &self.feeds {
            match Url::parse(feed) {
                Ok(u) if u.scheme() == "http" => {},
                _ => {
                    error!("Invalid feed URL {} in config", feed);
                    std::process::exit(1);
                }
            }
        }
    }
}
