//! Locale type: a code that has been checked against a `LocaleRegistry`.
//!
//! `Locale` values are only handed out by the registry, so holding one means
//! the code is supported. Unsupported input never becomes a `Locale`; callers
//! resolve it to the default instead.

use serde::{Serialize, Serializer};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Locale {
    code: &'static str,
}

impl Locale {
    pub(crate) const fn new(code: &'static str) -> Self {
        Self { code }
    }

    /// The locale code as used in path prefixes (e.g., "en").
    pub fn code(&self) -> &'static str {
        self.code
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code)
    }
}

impl Serialize for Locale {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.code)
    }
}

#[cfg(test)]
mod tests {
    use crate::i18n::LocaleRegistry;

    #[test]
    fn test_locale_display_is_code() {
        let locale = LocaleRegistry::standard().resolve("en");
        assert_eq!(locale.to_string(), "en");
    }

    #[test]
    fn test_locale_serializes_as_string() {
        let locale = LocaleRegistry::standard().resolve("ja");
        assert_eq!(serde_json::to_string(&locale).unwrap(), "\"ja\"");
    }

    #[test]
    fn test_locale_equality_by_code() {
        let registry = LocaleRegistry::standard();
        assert_eq!(registry.resolve("en"), registry.get("en").unwrap());
        assert_ne!(registry.resolve("en"), registry.resolve("ja"));
    }
}
