use anyhow::{Context, Result};
use dirs::config_dir;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const MIN_POLL_INTERVAL_MS: u64 = 250;

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub base_url: String,
    pub poll_interval_ms: u64,
    pub session_cookie_name: String,
    pub session_cookie: String,
    pub csrf_cookie_name: String,
    /// Seed for the anti-forgery cookie; the server may rotate it later.
    pub csrf_token: String,
    pub csrf_header: String,
    pub toast_visible_ms: u64,
    pub toast_fade_ms: u64,
    pub sound: bool,
    pub desktop_notifications: bool,
    /// Drop unread results that started before the last one applied.
    pub discard_stale_responses: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".to_string(),
            poll_interval_ms: 10_000,
            session_cookie_name: "sessionid".to_string(),
            session_cookie: String::new(),
            csrf_cookie_name: "csrftoken".to_string(),
            csrf_token: String::new(),
            csrf_header: "X-CSRFToken".to_string(),
            toast_visible_ms: 5_000,
            toast_fade_ms: 300,
            sound: true,
            desktop_notifications: false,
            discard_stale_responses: false,
            log_file: None,
        }
    }
}

impl Config {
    /// Loads the config from `path`, or from the per-user default location.
    /// A missing file is created with defaults first.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => config_path()?,
        };
        if !path.exists() {
            let toml = toml::to_string_pretty(&Config::default())?;
            if let Some(parent) = path.parent() { fs::create_dir_all(parent)?; }
            fs::write(&path, toml).with_context(|| format!("Writing default config {:?}", &path))?;
        }
        let content = fs::read_to_string(&path).with_context(|| format!("Reading {:?}", &path))?;
        let mut cfg: Config = toml::from_str(&content).with_context(|| "Parsing config TOML")?;
        cfg.apply_env(|key| std::env::var(key).ok());
        cfg.validate()?;
        Ok(cfg)
    }

    fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup("NOTIBELL_BASE_URL").filter(|v| !v.is_empty()) {
            self.base_url = url;
        }
        if let Some(session) = lookup("NOTIBELL_SESSION").filter(|v| !v.is_empty()) {
            self.session_cookie = session;
        }
    }

    pub fn validate(&self) -> Result<()> {
        reqwest::Url::parse(&self.base_url).with_context(|| format!("Invalid base_url {:?}", self.base_url))?;
        if self.poll_interval_ms < MIN_POLL_INTERVAL_MS {
            anyhow::bail!("poll_interval_ms must be at least {MIN_POLL_INTERVAL_MS}");
        }
        reqwest::header::HeaderName::from_bytes(self.csrf_header.as_bytes())
            .with_context(|| format!("Invalid csrf_header {:?}", self.csrf_header))?;
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration { Duration::from_millis(self.poll_interval_ms) }
    pub fn toast_visible(&self) -> Duration { Duration::from_millis(self.toast_visible_ms) }
    pub fn toast_fade(&self) -> Duration { Duration::from_millis(self.toast_fade_ms) }

    pub fn log_path(&self) -> Option<PathBuf> {
        self.log_file
            .clone()
            .or_else(|| dirs::data_local_dir().map(|d| d.join("notibell").join("notibell.log")))
    }
}

fn config_path() -> Result<PathBuf> {
    let base = config_dir().context("Could not determine config directory")?;
    Ok(base.join("notibell").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_defaults_when_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let cfg = Config::load(Some(&path)).unwrap();
        assert!(path.exists());
        assert_eq!(cfg.poll_interval(), Duration::from_secs(10));
        assert_eq!(cfg.csrf_cookie_name, "csrftoken");
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "base_url = \"https://shop.example\"\npoll_interval_ms = 2000\n").unwrap();
        let cfg = Config::load(Some(&path)).unwrap();
        assert_eq!(cfg.poll_interval_ms, 2000);
        assert_eq!(cfg.toast_visible_ms, 5000);
        assert!(cfg.sound);
    }

    #[test]
    fn rejects_tiny_interval_and_bad_url() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "poll_interval_ms = 10\n").unwrap();
        assert!(Config::load(Some(&path)).is_err());
        fs::write(&path, "base_url = \"not a url\"\n").unwrap();
        assert!(Config::load(Some(&path)).is_err());
    }

    #[test]
    fn rejects_unusable_csrf_header() {
        let mut cfg = Config::default();
        assert!(cfg.validate().is_ok());
        for bad in ["", "X CSRF Token", "X-CSRF:Token"] {
            cfg.csrf_header = bad.to_string();
            assert!(cfg.validate().is_err(), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn env_overrides_win() {
        let mut cfg = Config::default();
        cfg.apply_env(|key| match key {
            "NOTIBELL_SESSION" => Some("abc123".to_string()),
            "NOTIBELL_BASE_URL" => Some(String::new()),
            _ => None,
        });
        assert_eq!(cfg.session_cookie, "abc123");
        assert_eq!(cfg.base_url, "http://127.0.0.1:8000");
    }
}
