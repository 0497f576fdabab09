use crate::i18n::LocaleRegistry;
use anyhow::{Context, Result};
use std::time::Duration;

/// Template values that stand in for real Supabase credentials.
const SUPABASE_PLACEHOLDERS: &[&str] = &[
    "your_supabase_url_here",
    "your_supabase_anon_key_here",
    "temporary_key_will_be_replaced",
    "https://placeholder.supabase.co",
    "placeholder-key",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupabaseConfig {
    pub url: String,
    pub anon_key: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    // Server
    pub host: String,
    pub port: u16,
    pub site_name: String,

    // Locales
    pub default_locale: String,
    pub locale_detection: bool,

    // Contact form
    pub notice_duration_ms: u64,

    // Contact store (Postgres takes precedence over Supabase REST)
    pub database_url: Option<String>,
    pub supabase: Option<SupabaseConfig>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let default_locale =
            std::env::var("DEFAULT_LOCALE").unwrap_or_else(|_| "ja".to_string());
        LocaleRegistry::with_default(&default_locale).context("Invalid DEFAULT_LOCALE")?;

        Ok(Self {
            // Server
            host: std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: std::env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(8080),
            site_name: std::env::var("SITE_NAME").unwrap_or_else(|_| "Bayond LLC".to_string()),

            // Locales
            default_locale,
            locale_detection: std::env::var("LOCALE_DETECTION")
                .ok()
                .and_then(|v| parse_bool(&v))
                .unwrap_or(true),

            // Contact form
            notice_duration_ms: std::env::var("NOTICE_DURATION_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(5000),

            // Contact store
            database_url: non_empty_var("DATABASE_URL"),
            supabase: supabase_from_env(),
        })
    }

    /// Locale registry with the configured default.
    pub fn registry(&self) -> Result<LocaleRegistry> {
        LocaleRegistry::with_default(&self.default_locale).context("Invalid DEFAULT_LOCALE")
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn notice_ttl(&self) -> Duration {
        Duration::from_millis(self.notice_duration_ms)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            site_name: "Bayond LLC".to_string(),
            default_locale: "ja".to_string(),
            locale_detection: true,
            notice_duration_ms: 5000,
            database_url: None,
            supabase: None,
        }
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn supabase_from_env() -> Option<SupabaseConfig> {
    let url = non_empty_var("SUPABASE_URL")?;
    let anon_key = non_empty_var("SUPABASE_ANON_KEY")?;

    if is_placeholder(&url) || is_placeholder(&anon_key) {
        return None;
    }

    Some(SupabaseConfig { url, anon_key })
}

fn is_placeholder(value: &str) -> bool {
    SUPABASE_PLACEHOLDERS.contains(&value)
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
