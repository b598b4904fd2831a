//! Application configuration. Upstream credentials, property names, server settings.
//!
//! Loaded once in `main`; adapters receive the narrow config structs built here and
//! never read the environment themselves.

use serde::Deserialize;
use std::time::Duration;

/// Per-upstream-request timeout when `HTTP_TIMEOUT_SECS` is unset.
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";
pub const DEFAULT_DB_PATH: &str = "student_hub.sqlite";
pub const DEFAULT_GOOGLE_API_BASE: &str = "https://www.googleapis.com/calendar/v3";
pub const DEFAULT_NOTION_API_BASE: &str = "https://api.notion.com";

#[derive(Debug, Deserialize, Default)]
pub struct AppConfig {
    /// Shared secret expected in `X-API-Key`. Read from HUB_API_KEY.
    #[serde(default)]
    pub hub_api_key: Option<String>,

    /// Listen address. Read from HUB_BIND.
    #[serde(default)]
    pub hub_bind: Option<String>,

    /// libsql file holding the secret store. Read from HUB_DB_PATH.
    #[serde(default)]
    pub hub_db_path: Option<String>,

    /// Base64 key for encrypting stored credentials. Read from MASTER_KEY.
    #[serde(default)]
    pub master_key: Option<String>,

    /// "true" enables the reminder webhook. Read from ALLOW_WEBHOOKS.
    #[serde(default)]
    pub allow_webhooks: Option<String>,

    /// Read from HTTP_TIMEOUT_SECS.
    #[serde(default)]
    pub http_timeout_secs: Option<u64>,

    // ─────────────────────────────────────────────────────────────────────────
    // Assignments (Canvas)
    // ─────────────────────────────────────────────────────────────────────────
    #[serde(default)]
    pub canvas_base_url: Option<String>,

    #[serde(default)]
    pub canvas_token: Option<String>,

    // ─────────────────────────────────────────────────────────────────────────
    // Timetable feeds
    // ─────────────────────────────────────────────────────────────────────────
    /// Comma-separated iCalendar feed URLs. Read from WU_ICAL_URLS.
    #[serde(default)]
    pub wu_ical_urls: Option<String>,

    // ─────────────────────────────────────────────────────────────────────────
    // Personal calendar (Google)
    // ─────────────────────────────────────────────────────────────────────────
    #[serde(default)]
    pub google_calendar_id: Option<String>,

    #[serde(default)]
    pub google_api_base: Option<String>,

    // ─────────────────────────────────────────────────────────────────────────
    // Task board (Notion)
    // ─────────────────────────────────────────────────────────────────────────
    #[serde(default)]
    pub notion_token: Option<String>,

    #[serde(default)]
    pub notion_database_id: Option<String>,

    #[serde(default)]
    pub notion_api_base: Option<String>,

    #[serde(default)]
    pub notion_prop_title: Option<String>,

    #[serde(default)]
    pub notion_prop_status: Option<String>,

    #[serde(default)]
    pub notion_prop_due: Option<String>,

    #[serde(default)]
    pub notion_prop_est_min: Option<String>,

    #[serde(default)]
    pub notion_prop_course: Option<String>,
}

/// Assignments adapter settings. Missing values fail on use, not at startup.
#[derive(Debug, Clone, Default)]
pub struct CanvasConfig {
    pub base_url: Option<String>,
    pub token: Option<String>,
    pub timeout: Duration,
}

#[derive(Debug, Clone, Default)]
pub struct IcalConfig {
    pub feed_urls: Vec<String>,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct GoogleCalendarConfig {
    pub calendar_id: String,
    pub api_base: String,
    pub timeout: Duration,
}

/// Column names on the task board. Every read and write goes through these.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskBoardProperties {
    pub title: String,
    pub status: String,
    pub due: String,
    pub est_minutes: String,
    pub course: String,
}

impl Default for TaskBoardProperties {
    fn default() -> Self {
        Self {
            title: "Name".to_string(),
            status: "Status".to_string(),
            due: "Due".to_string(),
            est_minutes: "Est (min)".to_string(),
            course: "Course".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct NotionConfig {
    pub token: Option<String>,
    pub database_id: Option<String>,
    pub api_base: String,
    pub properties: TaskBoardProperties,
    pub timeout: Duration,
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenv::dotenv().ok();
        let mut c = config::Config::builder();
        c = c.add_source(config::Environment::default());
        if let Ok(path) = std::env::var("HUB_CONFIG") {
            c = c.add_source(config::File::with_name(&path));
        }
        let mut cfg: Self = c.build()?.try_deserialize()?;
        // Numeric values arrive as strings from the environment; parse them here.
        if let Ok(s) = std::env::var("HTTP_TIMEOUT_SECS") {
            if let Ok(n) = s.parse::<u64>() {
                cfg.http_timeout_secs = Some(n);
            }
        }
        Ok(cfg)
    }

    /// Returns the API key if configured and non-empty.
    pub fn api_key(&self) -> Option<String> {
        non_empty(&self.hub_api_key)
    }

    pub fn bind_addr_or_default(&self) -> String {
        non_empty(&self.hub_bind).unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
    }

    pub fn db_path_or_default(&self) -> String {
        non_empty(&self.hub_db_path).unwrap_or_else(|| DEFAULT_DB_PATH.to_string())
    }

    pub fn master_key(&self) -> Option<String> {
        non_empty(&self.master_key)
    }

    /// Webhooks are disabled unless ALLOW_WEBHOOKS is "true" (case-insensitive).
    pub fn webhooks_enabled(&self) -> bool {
        self.allow_webhooks
            .as_deref()
            .map(|v| v.trim().eq_ignore_ascii_case("true"))
            .unwrap_or(false)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs.unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Per-adapter configuration
    // ─────────────────────────────────────────────────────────────────────────

    pub fn canvas(&self) -> CanvasConfig {
        CanvasConfig {
            base_url: non_empty(&self.canvas_base_url).map(|u| u.trim_end_matches('/').to_string()),
            token: non_empty(&self.canvas_token),
            timeout: self.http_timeout(),
        }
    }

    pub fn ical(&self) -> IcalConfig {
        let feed_urls = self
            .wu_ical_urls
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .map(String::from)
            .collect();
        IcalConfig {
            feed_urls,
            timeout: self.http_timeout(),
        }
    }

    pub fn google_calendar(&self) -> GoogleCalendarConfig {
        GoogleCalendarConfig {
            calendar_id: non_empty(&self.google_calendar_id)
                .unwrap_or_else(|| "primary".to_string()),
            api_base: non_empty(&self.google_api_base)
                .unwrap_or_else(|| DEFAULT_GOOGLE_API_BASE.to_string())
                .trim_end_matches('/')
                .to_string(),
            timeout: self.http_timeout(),
        }
    }

    pub fn notion(&self) -> NotionConfig {
        let defaults = TaskBoardProperties::default();
        NotionConfig {
            token: non_empty(&self.notion_token),
            database_id: non_empty(&self.notion_database_id),
            api_base: non_empty(&self.notion_api_base)
                .unwrap_or_else(|| DEFAULT_NOTION_API_BASE.to_string())
                .trim_end_matches('/')
                .to_string(),
            properties: TaskBoardProperties {
                title: non_empty(&self.notion_prop_title).unwrap_or(defaults.title),
                status: non_empty(&self.notion_prop_status).unwrap_or(defaults.status),
                due: non_empty(&self.notion_prop_due).unwrap_or(defaults.due),
                est_minutes: non_empty(&self.notion_prop_est_min).unwrap_or(defaults.est_minutes),
                course: non_empty(&self.notion_prop_course).unwrap_or(defaults.course),
            },
            timeout: self.http_timeout(),
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ical_urls_split_and_trimmed() {
        let cfg = AppConfig {
            wu_ical_urls: Some(" https://a/feed.ics, ,https://b/feed.ics ".into()),
            ..Default::default()
        };
        assert_eq!(
            cfg.ical().feed_urls,
            vec!["https://a/feed.ics".to_string(), "https://b/feed.ics".to_string()]
        );
    }

    #[test]
    fn test_notion_property_defaults_and_overrides() {
        let cfg = AppConfig {
            notion_prop_due: Some("Deadline".into()),
            notion_prop_title: Some("   ".into()),
            ..Default::default()
        };
        let props = cfg.notion().properties;
        assert_eq!(props.due, "Deadline");
        assert_eq!(props.title, "Name");
        assert_eq!(props.est_minutes, "Est (min)");
    }

    #[test]
    fn test_defaults() {
        let cfg = AppConfig {
            canvas_base_url: Some("https://canvas.example/".into()),
            allow_webhooks: Some("TRUE".into()),
            ..Default::default()
        };
        assert_eq!(cfg.canvas().base_url.as_deref(), Some("https://canvas.example"));
        assert!(cfg.canvas().token.is_none());
        assert!(cfg.webhooks_enabled());
        assert_eq!(cfg.google_calendar().calendar_id, "primary");
        assert_eq!(cfg.http_timeout(), Duration::from_secs(30));
        assert_eq!(cfg.bind_addr_or_default(), "0.0.0.0:8000");
    }
}
