//! Application configuration management.

use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Watermark configuration for file downloads.
    #[serde(default)]
    pub watermark: WatermarkConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

/// Watermark stamped on downloads when the client asks for it.
///
/// Operators may tune these values; end users only toggle the watermark on
/// or off per request.
#[derive(Debug, Clone, Deserialize)]
pub struct WatermarkConfig {
    /// When false, the `watermark` query flag is ignored.
    #[serde(default = "default_watermark_enabled")]
    pub enabled: bool,
    /// Text to stamp.
    #[serde(default = "default_watermark_text")]
    pub text: String,
    /// Opacity from 0.0 (invisible) to 1.0 (opaque).
    #[serde(default = "default_watermark_opacity")]
    pub opacity: f32,
    /// Font size in points.
    #[serde(default = "default_watermark_font_size")]
    pub font_size: f32,
}

impl Default for WatermarkConfig {
    fn default() -> Self {
        Self {
            enabled: default_watermark_enabled(),
            text: default_watermark_text(),
            opacity: default_watermark_opacity(),
            font_size: default_watermark_font_size(),
        }
    }
}

fn default_watermark_enabled() -> bool {
    true
}

fn default_watermark_text() -> String {
    "123".to_string()
}

fn default_watermark_opacity() -> f32 {
    0.5
}

fn default_watermark_font_size() -> f32 {
    16.0
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("VITRINE").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}
