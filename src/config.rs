//! Application configuration management.
//!
//! This module handles the persistent configuration for jly-fin: which
//! programs make up the decode/playback pipeline and how they are invoked,
//! the selector program, termination and polling timings, catalog client
//! settings, and where credentials and logs live. Configuration is stored in
//! the user's config directory (typically ~/.config/jly-fin/config.toml).

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::constants::URL_PLACEHOLDER;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_decoder")]
    pub decoder: String,
    #[serde(default = "default_decoder_args")]
    pub decoder_args: Vec<String>,
    #[serde(default = "default_player")]
    pub player: String,
    #[serde(default = "default_player_args")]
    pub player_args: Vec<String>,
    #[serde(default = "default_selector")]
    pub selector: String,
    #[serde(default)]
    pub selector_args: Vec<String>,
    #[serde(default = "default_selector_height")]
    pub selector_height: String,
    #[serde(default = "default_terminate_timeout_ms")]
    pub terminate_timeout_ms: u64,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_audio_bitrate")]
    pub audio_bitrate: u32,
    #[serde(default = "default_device_name")]
    pub device_name: String,
    #[serde(default = "default_verify_tls")]
    pub verify_tls: bool,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_servers_file")]
    pub servers_file: String,
    #[serde(default = "default_log_file")]
    pub log_file: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_decoder() -> String {
    "ffmpeg".to_string()
}

fn default_decoder_args() -> Vec<String> {
    vec![
        "-nostdin".to_string(),
        "-user_agent".to_string(),
        "JellyfinFZF/1.0.0".to_string(),
        "-headers".to_string(),
        "Accept: */*\r\n".to_string(),
        "-i".to_string(),
        URL_PLACEHOLDER.to_string(),
        "-vn".to_string(),
        "-f".to_string(),
        "wav".to_string(),
        "-".to_string(),
    ]
}

fn default_player() -> String {
    "ffplay".to_string()
}

fn default_player_args() -> Vec<String> {
    vec![
        "-autoexit".to_string(),
        "-nodisp".to_string(),
        "-loglevel".to_string(),
        "quiet".to_string(),
        "-".to_string(),
    ]
}

fn default_selector() -> String {
    "fzf".to_string()
}

fn default_selector_height() -> String {
    "40%".to_string()
}

fn default_terminate_timeout_ms() -> u64 {
    2000
}

fn default_poll_interval_ms() -> u64 {
    50
}

fn default_audio_bitrate() -> u32 {
    192_000
}

fn default_device_name() -> String {
    "jly-fin".to_string()
}

fn default_verify_tls() -> bool {
    true
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_servers_file() -> String {
    "~/.jellyfin_fzf_servers.json".to_string()
}

fn default_log_file() -> String {
    "/tmp/jly-fin.log".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    pub fn new() -> Self {
        Self {
            decoder: default_decoder(),
            decoder_args: default_decoder_args(),
            player: default_player(),
            player_args: default_player_args(),
            selector: default_selector(),
            selector_args: Vec::new(),
            selector_height: default_selector_height(),
            terminate_timeout_ms: default_terminate_timeout_ms(),
            poll_interval_ms: default_poll_interval_ms(),
            audio_bitrate: default_audio_bitrate(),
            device_name: default_device_name(),
            verify_tls: default_verify_tls(),
            request_timeout_secs: default_request_timeout_secs(),
            servers_file: default_servers_file(),
            log_file: default_log_file(),
            log_level: default_log_level(),
        }
    }

    pub fn config_dir() -> Result<PathBuf, Box<dyn Error>> {
        // XDG_CONFIG_HOME wins so tests can redirect it
        let config_dir = if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
            PathBuf::from(xdg_config).join("jly-fin")
        } else {
            dirs::config_dir()
                .ok_or("Unable to find config directory")?
                .join("jly-fin")
        };
        Ok(config_dir)
    }

    pub fn config_path() -> Result<PathBuf, Box<dyn Error>> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    pub fn load() -> Result<Self, Box<dyn Error>> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            return Ok(Default::default());
        }

        let contents = fs::read_to_string(&config_path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    pub fn save(&self) -> Result<(), Box<dyn Error>> {
        let config_dir = Self::config_dir()?;

        if !config_dir.exists() {
            fs::create_dir_all(&config_dir)?;
        }

        let config_path = Self::config_path()?;
        let toml_string = toml::to_string_pretty(self)?;
        fs::write(&config_path, toml_string)?;

        Ok(())
    }

    pub fn exists() -> Result<bool, Box<dyn Error>> {
        Ok(Self::config_path()?.exists())
    }

    /// Servers file path with `~` expanded
    pub fn servers_path(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.servers_file).as_ref())
    }

    pub fn terminate_timeout(&self) -> Duration {
        Duration::from_millis(self.terminate_timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn log_level_filter(&self) -> Result<log::LevelFilter, Box<dyn Error>> {
        self.log_level
            .parse::<log::LevelFilter>()
            .map_err(|_| format!("Invalid log level: {}", self.log_level).into())
    }

    pub fn set_value(&mut self, key: &str, value: &str) -> Result<(), Box<dyn Error>> {
        match key {
            "decoder" => self.decoder = value.to_string(),
            "player" => self.player = value.to_string(),
            "selector" => self.selector = value.to_string(),
            "selector_height" => self.selector_height = value.to_string(),
            "terminate_timeout_ms" => {
                self.terminate_timeout_ms = parse_number(value)?;
            }
            "poll_interval_ms" => {
                self.poll_interval_ms = parse_number(value)?;
            }
            "audio_bitrate" => {
                self.audio_bitrate = value
                    .parse::<u32>()
                    .map_err(|_| "Value must be a positive integer")?;
            }
            "device_name" => self.device_name = value.to_string(),
            "verify_tls" => {
                self.verify_tls = value
                    .parse::<bool>()
                    .map_err(|_| "Value must be 'true' or 'false'")?;
            }
            "request_timeout_secs" => {
                self.request_timeout_secs = parse_number(value)?;
            }
            "servers_file" => self.servers_file = value.to_string(),
            "log_file" => self.log_file = value.to_string(),
            "log_level" => {
                value
                    .parse::<log::LevelFilter>()
                    .map_err(|_| "Value must be one of off, error, warn, info, debug, trace")?;
                self.log_level = value.to_lowercase();
            }
            _ => return Err(format!("Unknown configuration key: {key}").into()),
        }
        Ok(())
    }
}

fn parse_number(value: &str) -> Result<u64, Box<dyn Error>> {
    value
        .parse::<u64>()
        .map_err(|_| "Value must be a positive integer".into())
}
