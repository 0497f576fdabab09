//! Locale registry: single source of truth for the site's supported locales.
//!
//! The registry is an ordinary value built once at startup and handed to
//! whatever needs it. The current request locale is never stored here; it is
//! derived from the request path by the caller.

use crate::i18n::Locale;
use thiserror::Error;

/// Configuration for a supported locale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocaleConfig {
    /// Short locale code used in path prefixes (e.g., "ja", "en")
    pub code: &'static str,

    /// English name of the language (e.g., "Japanese")
    pub name: &'static str,

    /// Name shown in the language switcher (e.g., "日本語")
    pub native_name: &'static str,

    /// Value for `<html lang>` and `Content-Language`
    pub html_lang: &'static str,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("default locale '{0}' is not a supported locale")]
    UnsupportedDefault(String),
}

/// The fixed set of supported locales plus the default one.
///
/// The default locale is the only one whose paths carry no prefix segment.
#[derive(Debug, Clone)]
pub struct LocaleRegistry {
    locales: Vec<LocaleConfig>,
    default_code: &'static str,
}

impl LocaleRegistry {
    /// Registry with the built-in locales and Japanese as default.
    pub fn standard() -> Self {
        Self {
            locales: builtin_locales(),
            default_code: "ja",
        }
    }

    /// Registry with the built-in locales and `code` as default.
    pub fn with_default(code: &str) -> Result<Self, RegistryError> {
        let locales = builtin_locales();
        let default_code = locales
            .iter()
            .find(|config| config.code == code)
            .map(|config| config.code)
            .ok_or_else(|| RegistryError::UnsupportedDefault(code.to_string()))?;

        Ok(Self {
            locales,
            default_code,
        })
    }

    /// All supported locales in display order.
    pub fn supported(&self) -> Vec<Locale> {
        self.locales
            .iter()
            .map(|config| Locale::new(config.code))
            .collect()
    }

    /// Locale configs in display order.
    pub fn configs(&self) -> &[LocaleConfig] {
        &self.locales
    }

    pub fn default_locale(&self) -> Locale {
        Locale::new(self.default_code)
    }

    pub fn is_default(&self, locale: Locale) -> bool {
        locale.code() == self.default_code
    }

    /// Look up a supported locale by code.
    ///
    /// # Returns
    /// * `Some(Locale)` if `code` is exactly one of the supported codes
    /// * `None` otherwise (no case folding, no region stripping)
    pub fn get(&self, code: &str) -> Option<Locale> {
        self.config(code).map(|config| Locale::new(config.code))
    }

    pub fn is_supported(&self, code: &str) -> bool {
        self.config(code).is_some()
    }

    /// Resolve a code to a supported locale, falling back to the default.
    pub fn resolve(&self, code: &str) -> Locale {
        self.get(code).unwrap_or_else(|| self.default_locale())
    }

    /// Human-readable label for a locale code, or the code itself if unknown.
    pub fn display_name<'a>(&self, code: &'a str) -> &'a str {
        match self.config(code) {
            Some(config) => config.native_name,
            None => code,
        }
    }

    /// Every supported locale except `current`.
    pub fn others(&self, current: Locale) -> Vec<Locale> {
        self.supported()
            .into_iter()
            .filter(|locale| *locale != current)
            .collect()
    }

    pub fn config(&self, code: &str) -> Option<&LocaleConfig> {
        self.locales.iter().find(|config| config.code == code)
    }
}

impl Default for LocaleRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

fn builtin_locales() -> Vec<LocaleConfig> {
    vec![
        LocaleConfig {
            code: "ja",
            name: "Japanese",
            native_name: "日本語",
            html_lang: "ja",
        },
        LocaleConfig {
            code: "en",
            name: "English",
            native_name: "English",
            html_lang: "en",
        },
    ]
}
