mod types;

pub use types::*;

use anyhow::{Context, Result};
use std::path::Path;

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    validate_config(&config)?;

    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    // Try default locations
    let default_paths = [
        "./vidtrack.toml",
        "~/.config/vidtrack/config.toml",
        "/etc/vidtrack/config.toml",
    ];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            return load_config(path);
        }
    }

    // Return default config if no file found
    Ok(Config::default())
}

/// Validate configuration
fn validate_config(config: &Config) -> Result<()> {
    if !config.api.base_url.starts_with("http://") && !config.api.base_url.starts_with("https://") {
        anyhow::bail!("api.base_url must be an http(s) URL: {}", config.api.base_url);
    }

    if config.poll.list_interval_secs == 0 || config.poll.detail_interval_secs == 0 {
        anyhow::bail!("Poll intervals cannot be 0");
    }

    if config.api.request_timeout_secs == 0 {
        anyhow::bail!("api.request_timeout_secs cannot be 0");
    }

    if config.upload.timeout_secs == 0 {
        anyhow::bail!("upload.timeout_secs cannot be 0");
    }

    if config.upload.max_file_size_bytes == 0 {
        anyhow::bail!("upload.max_file_size_bytes cannot be 0");
    }

    if config.upload.accepted_content_types.is_empty() {
        anyhow::bail!("upload.accepted_content_types cannot be empty");
    }

    Ok(())
}
