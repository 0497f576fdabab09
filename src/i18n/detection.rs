//! Preferred-locale detection for bare-path requests.
//!
//! An explicit choice (the cookie set by a locale switch) wins over the
//! browser's `Accept-Language` list.

use crate::i18n::{Locale, LocaleRegistry};
use std::cmp::Ordering;

/// Name of the cookie remembering the visitor's last explicit choice.
pub const LOCALE_COOKIE: &str = "site_locale";

/// Pick the visitor's preferred supported locale, if any can be told.
pub fn detect_preferred_locale(
    cookie_header: Option<&str>,
    accept_language: Option<&str>,
    registry: &LocaleRegistry,
) -> Option<Locale> {
    if let Some(locale) = cookie_header.and_then(|h| locale_from_cookie(h, registry)) {
        return Some(locale);
    }
    accept_language.and_then(|h| negotiate_accept_language(h, registry))
}

/// Read `site_locale` from a `Cookie` header. Unsupported values are ignored.
pub fn locale_from_cookie(cookie_header: &str, registry: &LocaleRegistry) -> Option<Locale> {
    cookie_header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == LOCALE_COOKIE)
        .and_then(|(_, value)| registry.get(value.trim()))
}

/// First supported locale in `Accept-Language`, honoring q-values.
///
/// Region subtags are dropped (`en-US` matches `en`); `q=0` entries and `*`
/// never match.
pub fn negotiate_accept_language(header: &str, registry: &LocaleRegistry) -> Option<Locale> {
    parse_accept_language(header)
        .into_iter()
        .filter(|tag| tag != "*")
        .find_map(|tag| {
            let primary = tag.split('-').next().unwrap_or(&tag);
            registry.get(primary)
        })
}

fn parse_accept_language(header: &str) -> Vec<String> {
    let mut entries: Vec<(String, f32, usize)> = header
        .split(',')
        .enumerate()
        .filter_map(|(position, part)| {
            let mut pieces = part.split(';');
            let tag = pieces.next()?.trim();
            if tag.is_empty() {
                return None;
            }
            let quality = pieces
                .find_map(|param| param.trim().strip_prefix("q="))
                .and_then(|q| q.trim().parse::<f32>().ok())
                .unwrap_or(1.0);
            Some((tag.to_ascii_lowercase(), quality, position))
        })
        .filter(|(_, quality, _)| *quality > 0.0)
        .collect();

    entries.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(Ordering::Equal)
            .then(a.2.cmp(&b.2))
    });

    entries.into_iter().map(|(tag, _, _)| tag).collect()
}
