//! Monitor configuration: `vine_monitor.ron` plus environment overrides.
//!
//! Every field has a default, so a missing default config file is not an
//! error. A file that exists but does not parse, or values that make no
//! sense together, are fatal at startup.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::LevelFilter;
use serde::{Deserialize, Serialize};
use vine_core::{Category, IntervalMode};
use vine_engine::{
    CookieSource, Destinations, FetchSettings, FetcherSettings, MonitorSettings, SiteUrls,
    DEFAULT_STATE_FILE, DEFAULT_TERMS_FILE,
};

pub const DEFAULT_CONFIG_FILE: &str = "vine_monitor.ron";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("could not parse {path:?}: {reason}")]
    Parse { path: PathBuf, reason: String },
    #[error("invalid setting `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Where log lines go.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogDestination {
    File,
    Terminal,
    Both,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum IntervalConfig {
    Jittered { min_secs: u64, max_secs: u64 },
    Adaptive {
        fast_secs: u64,
        slow_secs: u64,
        quiet_threshold: u32,
    },
}

impl Default for IntervalConfig {
    fn default() -> Self {
        IntervalConfig::Jittered {
            min_secs: 240,
            max_secs: 400,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WebhookConfig {
    pub recommended: Option<String>,
    pub additional: Option<String>,
    pub available_for_all: Option<String>,
    pub priority: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MonitorConfig {
    pub site: String,
    pub state_file: PathBuf,
    pub priority_terms_file: PathBuf,
    pub log_file: PathBuf,
    pub log_level: String,
    pub log_destination: LogDestination,
    /// Raw `Cookie` header; takes precedence over `cookie_file`.
    pub cookie_header: Option<String>,
    /// Netscape `cookies.txt` export.
    pub cookie_file: PathBuf,
    pub user_agent: Option<String>,
    pub interval: IntervalConfig,
    pub reauth_min_secs: u64,
    pub reauth_max_secs: u64,
    pub resume_delay_secs: u64,
    pub page_delay_min_ms: u64,
    pub page_delay_max_ms: u64,
    pub request_timeout_secs: u64,
    pub max_page_bytes: u64,
    pub webhooks: WebhookConfig,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            site: SiteUrls::default().base().to_string(),
            state_file: PathBuf::from(DEFAULT_STATE_FILE),
            priority_terms_file: PathBuf::from(DEFAULT_TERMS_FILE),
            log_file: PathBuf::from("vine_monitor.log"),
            log_level: "info".to_string(),
            log_destination: LogDestination::Both,
            cookie_header: None,
            cookie_file: PathBuf::from("cookies.txt"),
            user_agent: None,
            interval: IntervalConfig::default(),
            reauth_min_secs: 120,
            reauth_max_secs: 300,
            resume_delay_secs: 5,
            page_delay_min_ms: 2_000,
            page_delay_max_ms: 4_000,
            request_timeout_secs: 20,
            max_page_bytes: 5 * 1024 * 1024,
            webhooks: WebhookConfig::default(),
        }
    }
}

/// Reads the config file. `explicit` must exist; the default file may be absent.
pub fn load(explicit: Option<&Path>) -> Result<MonitorConfig, ConfigError> {
    let (path, required) = match explicit {
        Some(path) => (path.to_path_buf(), true),
        None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
    };
    let text = match fs::read_to_string(&path) {
        Ok(text) => text,
        Err(err) if err.kind() == io::ErrorKind::NotFound && !required => {
            return Ok(MonitorConfig::default());
        }
        Err(source) => return Err(ConfigError::Io { path, source }),
    };
    parse(&text).map_err(|reason| ConfigError::Parse { path, reason })
}

pub fn parse(text: &str) -> Result<MonitorConfig, String> {
    ron::from_str(text).map_err(|err| err.to_string())
}

impl MonitorConfig {
    /// Applies environment overrides. `lookup` is `std::env::var` in production.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(url) = non_empty("DISCORD_WEBHOOK_RFY") {
            self.webhooks.recommended = Some(url);
        }
        if let Some(url) = non_empty("DISCORD_WEBHOOK_AFA") {
            self.webhooks.available_for_all = Some(url);
        }
        if let Some(url) = non_empty("DISCORD_WEBHOOK_AI") {
            self.webhooks.additional = Some(url);
        }
        if let Some(url) = non_empty("DISCORD_WEBHOOK_PRIORITY") {
            self.webhooks.priority = Some(url);
        }
        if let Some(cookie) = non_empty("VINE_COOKIE") {
            self.cookie_header = Some(cookie);
        }
        if let Some(file) = non_empty("VINE_COOKIE_FILE") {
            self.cookie_file = PathBuf::from(file);
            // An explicit file beats a header set in the config file.
            if lookup("VINE_COOKIE").is_none() {
                self.cookie_header = None;
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.site()?;
        self.level_filter()?;
        if let IntervalConfig::Jittered { min_secs, max_secs } = self.interval {
            if min_secs > max_secs {
                return Err(invalid("interval", "min_secs exceeds max_secs"));
            }
        }
        if let IntervalConfig::Adaptive { fast_secs, slow_secs, .. } = self.interval {
            if fast_secs > slow_secs {
                return Err(invalid("interval", "fast_secs exceeds slow_secs"));
            }
        }
        if self.reauth_min_secs > self.reauth_max_secs {
            return Err(invalid("reauth_min_secs", "exceeds reauth_max_secs"));
        }
        if self.page_delay_min_ms > self.page_delay_max_ms {
            return Err(invalid("page_delay_min_ms", "exceeds page_delay_max_ms"));
        }
        if self.request_timeout_secs == 0 {
            return Err(invalid("request_timeout_secs", "must be positive"));
        }
        if self.max_page_bytes == 0 {
            return Err(invalid("max_page_bytes", "must be positive"));
        }
        Ok(())
    }

    pub fn level_filter(&self) -> Result<LevelFilter, ConfigError> {
        self.log_level
            .parse::<LevelFilter>()
            .map_err(|_| invalid("log_level", format!("unknown level {:?}", self.log_level)))
    }

    pub fn site(&self) -> Result<SiteUrls, ConfigError> {
        SiteUrls::new(&self.site).map_err(|err| invalid("site", err.to_string()))
    }

    pub fn cookie_source(&self) -> CookieSource {
        match &self.cookie_header {
            Some(header) => CookieSource::Header(header.clone()),
            None => CookieSource::NetscapeFile(self.cookie_file.clone()),
        }
    }

    pub fn destinations(&self) -> Destinations {
        let mut destinations = Destinations::new();
        let hooks = [
            (Category::Recommended, &self.webhooks.recommended),
            (Category::Additional, &self.webhooks.additional),
            (Category::AvailableForAll, &self.webhooks.available_for_all),
            (Category::Priority, &self.webhooks.priority),
        ];
        for (category, url) in hooks {
            if let Some(url) = url {
                destinations.set(category, url.as_str());
            }
        }
        destinations
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn fetch_settings(&self) -> FetchSettings {
        let mut settings = FetchSettings {
            request_timeout: self.request_timeout(),
            max_bytes: self.max_page_bytes,
            ..FetchSettings::default()
        };
        if let Some(agent) = &self.user_agent {
            settings.user_agent = agent.clone();
        }
        settings
    }

    pub fn monitor_settings(&self) -> MonitorSettings {
        let interval = match self.interval {
            IntervalConfig::Jittered { min_secs, max_secs } => IntervalMode::Jittered {
                min: Duration::from_secs(min_secs),
                max: Duration::from_secs(max_secs),
            },
            IntervalConfig::Adaptive {
                fast_secs,
                slow_secs,
                quiet_threshold,
            } => IntervalMode::Adaptive {
                fast: Duration::from_secs(fast_secs),
                slow: Duration::from_secs(slow_secs),
                quiet_threshold,
            },
        };
        MonitorSettings {
            interval,
            reauth_min: Duration::from_secs(self.reauth_min_secs),
            reauth_max: Duration::from_secs(self.reauth_max_secs),
            resume_delay: Duration::from_secs(self.resume_delay_secs),
            fetcher: FetcherSettings {
                page_delay_min: Duration::from_millis(self.page_delay_min_ms),
                page_delay_max: Duration::from_millis(self.page_delay_max_ms),
                call_timeout: self.request_timeout(),
            },
            notify_timeout: self.request_timeout(),
        }
    }
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}
