//! Translation bundles and dotted-key lookup.
//!
//! Bundles live in `messages/{locale}.json` as nested objects and are
//! embedded at compile time. Nested keys are flattened, so
//! `{"contact": {"title": "..."}}` is looked up as `contact.title`.

use crate::i18n::{Locale, LocaleRegistry};
use anyhow::{Context, Result};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

/// Flattened bundle: dotted key -> translated string.
pub type TranslationMap = BTreeMap<String, String>;

const EMBEDDED: &[(&str, &str)] = &[
    ("ja", include_str!("../../messages/ja.json")),
    ("en", include_str!("../../messages/en.json")),
];

/// All loaded bundles, keyed by locale code.
#[derive(Debug, Clone)]
pub struct Messages {
    bundles: HashMap<&'static str, TranslationMap>,
    fallback: Locale,
}

impl Messages {
    /// Load the bundles compiled into the binary for every supported locale.
    pub fn embedded(registry: &LocaleRegistry) -> Result<Self> {
        Self::from_sources(registry, EMBEDDED)
    }

    /// Parse bundles from `(locale code, json)` pairs.
    ///
    /// Sources for codes the registry does not know are skipped. Supported
    /// locales without a source get an empty bundle and resolve through the
    /// default locale.
    pub fn from_sources(registry: &LocaleRegistry, sources: &[(&str, &str)]) -> Result<Self> {
        let mut bundles = HashMap::new();

        for locale in registry.supported() {
            let map = match sources.iter().find(|(code, _)| *code == locale.code()) {
                Some((_, raw)) => parse_bundle(raw)
                    .with_context(|| format!("Failed to parse messages for '{}'", locale))?,
                None => TranslationMap::new(),
            };
            bundles.insert(locale.code(), map);
        }

        Ok(Self {
            bundles,
            fallback: registry.default_locale(),
        })
    }

    /// Look up `key` for `locale`.
    ///
    /// Falls back to the default locale's bundle, then to the key itself, so
    /// an unresolved key renders literally instead of failing.
    pub fn translate(&self, locale: Locale, key: &str) -> String {
        if let Some(value) = self.lookup(locale, key) {
            return value.to_string();
        }

        if locale != self.fallback {
            if let Some(value) = self.lookup(self.fallback, key) {
                debug!(key, locale = %locale, "Translation missing, using default locale");
                return value.to_string();
            }
        }

        debug!(key, locale = %locale, "Missing translation key, rendering key");
        key.to_string()
    }

    /// Look up `key` and substitute `{name}` placeholders.
    pub fn translate_with(&self, locale: Locale, key: &str, args: &[(&str, &str)]) -> String {
        args.iter()
            .fold(self.translate(locale, key), |text, (name, value)| {
                text.replace(&format!("{{{name}}}"), value)
            })
    }

    /// The flattened bundle for `locale` (empty if none was loaded).
    pub fn bundle(&self, locale: Locale) -> &TranslationMap {
        static EMPTY: TranslationMap = TranslationMap::new();
        self.bundles.get(locale.code()).unwrap_or(&EMPTY)
    }

    fn lookup(&self, locale: Locale, key: &str) -> Option<&str> {
        self.bundles
            .get(locale.code())
            .and_then(|bundle| bundle.get(key))
            .map(String::as_str)
    }
}

fn parse_bundle(raw: &str) -> Result<TranslationMap> {
    let value: Value = serde_json::from_str(raw).context("Invalid JSON")?;
    let mut map = TranslationMap::new();
    flatten(&value, "", &mut map);
    Ok(map)
}

fn flatten(value: &Value, prefix: &str, out: &mut TranslationMap) {
    match value {
        Value::Object(entries) => {
            for (key, child) in entries {
                let path = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{prefix}.{key}")
                };
                flatten(child, &path, out);
            }
        }
        Value::String(text) => {
            out.insert(prefix.to_string(), text.clone());
        }
        Value::Null => {}
        // Numbers, booleans and arrays are kept in their JSON form
        other => {
            out.insert(prefix.to_string(), other.to_string());
        }
    }
}
