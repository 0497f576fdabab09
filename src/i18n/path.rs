//! Path localization for path-prefix locale routing.
//!
//! Paths for the default locale are bare (`/contact`). Every other locale
//! carries its code as the first segment (`/en/contact`).

use crate::i18n::{Locale, LocaleRegistry};
use std::borrow::Cow;

/// Map `path` to the equivalent path for `target`.
///
/// Any leading locale segments are removed first, so the result never
/// depends on which locale `path` was already in. A bare `/` localizes to
/// `/{target}` rather than `/{target}/`.
pub fn localize(path: &str, target: Locale, registry: &LocaleRegistry) -> String {
    let bare = strip_locale_prefix(path, registry);

    if registry.is_default(target) {
        bare
    } else if bare == "/" {
        format!("/{}", target.code())
    } else {
        format!("/{}{}", target.code(), bare)
    }
}

/// Remove every leading supported-locale segment from `path`.
///
/// `/en` and `/en/` both strip to `/`. Matching is per segment, so
/// `/english` is left alone. A missing leading slash is added.
pub fn strip_locale_prefix(path: &str, registry: &LocaleRegistry) -> String {
    let normalized: Cow<'_, str> = if path.starts_with('/') {
        Cow::Borrowed(path)
    } else {
        Cow::Owned(format!("/{path}"))
    };

    let mut rest: &str = &normalized;
    while let Some((_, remainder)) = leading_locale(rest, registry) {
        rest = remainder;
    }

    if rest.is_empty() {
        "/".to_string()
    } else {
        rest.to_string()
    }
}

/// Detect the locale of `path` from its first segment and return it with
/// the bare path. Paths without a locale segment belong to the default.
pub fn split_locale(path: &str, registry: &LocaleRegistry) -> (Locale, String) {
    let locale = leading_locale(path, registry)
        .map(|(locale, _)| locale)
        .unwrap_or_else(|| registry.default_locale());

    (locale, strip_locale_prefix(path, registry))
}

fn leading_locale<'a>(path: &'a str, registry: &LocaleRegistry) -> Option<(Locale, &'a str)> {
    let after_slash = path.strip_prefix('/')?;
    let (segment, remainder) = match after_slash.find('/') {
        Some(idx) => after_slash.split_at(idx),
        None => (after_slash, ""),
    };
    registry.get(segment).map(|locale| (locale, remainder))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn registry() -> LocaleRegistry {
        LocaleRegistry::standard()
    }

    fn ja() -> Locale {
        registry().resolve("ja")
    }

    fn en() -> Locale {
        registry().resolve("en")
    }

    // ==================== Scenario Tests ====================

    #[test]
    fn test_prefixed_to_default() {
        assert_eq!(localize("/en/about", ja(), &registry()), "/about");
    }

    #[test]
    fn test_bare_to_prefixed() {
        assert_eq!(localize("/about", en(), &registry()), "/en/about");
    }

    #[test]
    fn test_locale_root_without_trailing_segment() {
        assert_eq!(localize("/en", ja(), &registry()), "/");
        assert_eq!(localize("/en/", ja(), &registry()), "/");
    }

    #[test]
    fn test_root_to_prefixed_has_no_trailing_slash() {
        assert_eq!(localize("/", en(), &registry()), "/en");
        assert_eq!(localize("/ja", en(), &registry()), "/en");
    }

    #[test]
    fn test_explicit_default_prefix_is_stripped() {
        assert_eq!(localize("/ja/contact", ja(), &registry()), "/contact");
        assert_eq!(localize("/ja/contact", en(), &registry()), "/en/contact");
    }

    #[test]
    fn test_segment_boundary_respected() {
        assert_eq!(localize("/english", ja(), &registry()), "/english");
        assert_eq!(localize("/english", en(), &registry()), "/en/english");
        assert_eq!(localize("/jam/x", en(), &registry()), "/en/jam/x");
    }

    #[test]
    fn test_stacked_prefixes_all_stripped() {
        assert_eq!(localize("/en/ja/en/about", ja(), &registry()), "/about");
    }

    #[test]
    fn test_trailing_slash_preserved_on_bare_path() {
        assert_eq!(localize("/en/about/", ja(), &registry()), "/about/");
    }

    #[test]
    fn test_missing_leading_slash_added() {
        assert_eq!(localize("about", ja(), &registry()), "/about");
        assert_eq!(localize("", en(), &registry()), "/en");
    }

    #[test]
    fn test_english_default_registry() {
        let registry = LocaleRegistry::with_default("en").unwrap();
        let ja = registry.resolve("ja");
        assert_eq!(localize("/about", ja, &registry), "/ja/about");
        assert_eq!(localize("/ja/about", registry.default_locale(), &registry), "/about");
    }

    // ==================== split_locale Tests ====================

    #[test]
    fn test_split_locale_prefixed() {
        let (locale, bare) = split_locale("/en/contact", &registry());
        assert_eq!(locale, en());
        assert_eq!(bare, "/contact");
    }

    #[test]
    fn test_split_locale_bare_is_default() {
        let (locale, bare) = split_locale("/contact", &registry());
        assert_eq!(locale, ja());
        assert_eq!(bare, "/contact");
    }

    #[test]
    fn test_split_locale_unsupported_prefix_is_part_of_path() {
        let (locale, bare) = split_locale("/fr/contact", &registry());
        assert_eq!(locale, ja());
        assert_eq!(bare, "/fr/contact");
    }

    // ==================== Property Tests ====================

    fn path_strategy() -> impl Strategy<Value = String> {
        let segment = prop::sample::select(vec![
            "en", "ja", "about", "contact", "english", "jp", "", "EN",
        ]);
        (prop::collection::vec(segment, 0..5), any::<bool>()).prop_map(|(segments, trailing)| {
            let mut path = format!("/{}", segments.join("/"));
            if trailing && !path.ends_with('/') {
                path.push('/');
            }
            path
        })
    }

    fn locale_strategy() -> impl Strategy<Value = Locale> {
        prop::sample::select(registry().supported())
    }

    proptest! {
        #[test]
        fn prop_localize_is_idempotent(path in path_strategy(), target in locale_strategy()) {
            let registry = registry();
            let once = localize(&path, target, &registry);
            prop_assert_eq!(localize(&once, target, &registry), once);
        }

        #[test]
        fn prop_relocalize_ignores_prior_locale(
            path in path_strategy(),
            first in locale_strategy(),
            second in locale_strategy(),
        ) {
            let registry = registry();
            let via_first = localize(&localize(&path, first, &registry), second, &registry);
            prop_assert_eq!(via_first, localize(&path, second, &registry));
        }

        #[test]
        fn prop_default_has_no_locale_prefix(path in path_strategy()) {
            let registry = registry();
            let localized = localize(&path, registry.default_locale(), &registry);
            prop_assert!(leading_locale(&localized, &registry).is_none());
        }

        #[test]
        fn prop_arbitrary_input_is_idempotent(path in "\\PC{0,24}", target in locale_strategy()) {
            let registry = registry();
            let once = localize(&path, target, &registry);
            prop_assert!(once.starts_with('/'));
            prop_assert_eq!(localize(&once, target, &registry), once);
        }
    }
}
