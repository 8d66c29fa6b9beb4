use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Remote store base URL. Absence means offline/local-only mode, which
    /// is a recognized operating mode, not an error.
    pub remote_url: Option<String>,
    pub remote_anon_key: Option<String>,
    /// API key for the Gemini summarizer.
    pub gemini_api_key: Option<String>,
    pub data_dir: PathBuf,

    /// Overall deadline for one summarizer call, in seconds. Past it the
    /// reveal falls back to the fixed summary.
    pub summarizer_timeout_secs: u64,

    /// How long transient warnings stay visible, in seconds.
    pub notice_ttl_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = directories::ProjectDirs::from("app", "vibecast", "vibecast")
            .map(|d| d.data_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from(".vibecast"));

        Self {
            remote_url: None,
            remote_anon_key: None,
            gemini_api_key: None,
            data_dir,
            summarizer_timeout_secs: 8,
            notice_ttl_secs: 5,
        }
    }
}

impl Config {
    /// Path to the persisted history mirror.
    pub fn mirror_db_path(&self) -> PathBuf {
        self.data_dir.join("history.db")
    }

    /// Both remote credentials present.
    pub fn is_remote_configured(&self) -> bool {
        self.remote_url.is_some() && self.remote_anon_key.is_some()
    }

    pub fn load() -> Result<Self, ConfigError> {
        let config_path = directories::ProjectDirs::from("app", "vibecast", "vibecast")
            .map(|d| d.config_dir().join("config.toml"))
            .unwrap_or_else(|| PathBuf::from(".vibecast/config.toml"));

        let mut config = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            toml::from_str(&content)?
        } else {
            Config::default()
        };
        config.apply_env();
        Ok(config)
    }

    /// Environment variables take precedence over the file, matching the
    /// deployment convention of the hosted app.
    fn apply_env(&mut self) {
        if let Ok(url) = std::env::var("SUPABASE_URL")
            && !url.is_empty()
        {
            self.remote_url = Some(url);
        }
        if let Ok(key) = std::env::var("SUPABASE_ANON_KEY")
            && !key.is_empty()
        {
            self.remote_anon_key = Some(key);
        }
        if let Ok(key) = std::env::var("GEMINI_API_KEY")
            && !key.is_empty()
        {
            self.gemini_api_key = Some(key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert!(!config.is_remote_configured());
        assert_eq!(config.summarizer_timeout_secs, 8);
        assert_eq!(config.notice_ttl_secs, 5);
        assert!(config.mirror_db_path().ends_with("history.db"));
    }

    #[test]
    fn test_remote_configured_requires_both() {
        let mut config = Config::default();
        config.remote_url = Some("https://example.supabase.co".to_string());
        assert!(!config.is_remote_configured());
        config.remote_anon_key = Some("anon".to_string());
        assert!(config.is_remote_configured());
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: Config = toml::from_str("remote_url = \"https://x.supabase.co\"").unwrap();
        assert_eq!(config.remote_url.as_deref(), Some("https://x.supabase.co"));
        assert_eq!(config.summarizer_timeout_secs, 8);
    }
}
