//! Bundle consistency checks.
//!
//! Every key shipped in any bundle should exist in every bundle. A key the
//! default locale lacks cannot fall back anywhere and renders literally, so
//! it is an error; a key only a secondary locale lacks falls back to the
//! default and is a warning.

use crate::i18n::{LocaleRegistry, Messages};
use std::collections::BTreeSet;

/// Validation report containing errors and warnings about the bundles.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    /// Problems that make a key render as its raw name
    pub errors: Vec<String>,

    /// Problems that degrade to the default locale
    pub warnings: Vec<String>,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    pub fn is_clean(&self) -> bool {
        !self.has_errors() && !self.has_warnings()
    }
}

/// Validator for translation bundles.
pub struct BundleValidator;

impl BundleValidator {
    /// Compare every supported locale's bundle against the union of all keys.
    pub fn validate(messages: &Messages, registry: &LocaleRegistry) -> ValidationReport {
        let mut report = ValidationReport::new();
        let locales = registry.supported();

        let all_keys: BTreeSet<&str> = locales
            .iter()
            .flat_map(|locale| messages.bundle(*locale).keys().map(String::as_str))
            .collect();

        for locale in &locales {
            let bundle = messages.bundle(*locale);
            let is_default = registry.is_default(*locale);

            for key in &all_keys {
                match bundle.get(*key) {
                    None if is_default => report.errors.push(format!(
                        "[{}] missing key '{}' (default locale, no fallback)",
                        locale, key
                    )),
                    None => report
                        .warnings
                        .push(format!("[{}] missing key '{}'", locale, key)),
                    Some(value) if value.trim().is_empty() => report
                        .warnings
                        .push(format!("[{}] empty value for '{}'", locale, key)),
                    Some(_) => {}
                }
            }
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> LocaleRegistry {
        LocaleRegistry::standard()
    }

    #[test]
    fn test_embedded_bundles_are_clean() {
        let registry = registry();
        let messages = Messages::embedded(&registry).unwrap();
        let report = BundleValidator::validate(&messages, &registry);
        assert!(report.is_clean(), "{:?}", report);
    }

    #[test]
    fn test_missing_in_secondary_is_warning() {
        let registry = registry();
        let messages = Messages::from_sources(
            &registry,
            &[("ja", r#"{"a": "1", "b": "2"}"#), ("en", r#"{"a": "1"}"#)],
        )
        .unwrap();
        let report = BundleValidator::validate(&messages, &registry);

        assert!(!report.has_errors());
        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].contains("[en]"));
        assert!(report.warnings[0].contains("'b'"));
    }

    #[test]
    fn test_missing_in_default_is_error() {
        let registry = registry();
        let messages = Messages::from_sources(
            &registry,
            &[("ja", r#"{"a": "1"}"#), ("en", r#"{"a": "1", "only_en": "x"}"#)],
        )
        .unwrap();
        let report = BundleValidator::validate(&messages, &registry);

        assert!(report.has_errors());
        assert!(report.errors[0].contains("only_en"));
        assert!(!report.has_warnings());
    }

    #[test]
    fn test_empty_value_is_warning() {
        let registry = registry();
        let messages = Messages::from_sources(
            &registry,
            &[("ja", r#"{"a": "1"}"#), ("en", r#"{"a": "  "}"#)],
        )
        .unwrap();
        let report = BundleValidator::validate(&messages, &registry);
        assert_eq!(report.warnings, vec!["[en] empty value for 'a'".to_string()]);
    }

    #[test]
    fn test_report_default_is_clean() {
        assert!(ValidationReport::default().is_clean());
    }
}
