//! Internationalization (i18n) module for locale routing and translated text.
//!
//! # Architecture
//!
//! - `registry`: Supported locales, the default locale and display names
//! - `locale`: `Locale`, a code the registry has vouched for
//! - `path`: Mapping paths between locales under path-prefix routing
//! - `detection`: Preferred locale from the switch cookie or `Accept-Language`
//! - `messages`: Embedded JSON bundles with dotted-key lookup
//! - `validator`: Key parity checks across bundles
//!
//! # Example
//!
//! ```rust
//! use bayond_site::i18n::{localize, LocaleRegistry};
//!
//! let registry = LocaleRegistry::standard();
//! let en = registry.resolve("en");
//! assert_eq!(localize("/about", en, &registry), "/en/about");
//! assert_eq!(localize("/en/about", registry.default_locale(), &registry), "/about");
//! ```

mod detection;
mod locale;
mod messages;
mod path;
mod registry;
mod validator;

pub use detection::{
    detect_preferred_locale, locale_from_cookie, negotiate_accept_language, LOCALE_COOKIE,
};
pub use locale::Locale;
pub use messages::{Messages, TranslationMap};
pub use path::{localize, split_locale, strip_locale_prefix};
pub use registry::{LocaleConfig, LocaleRegistry, RegistryError};
pub use validator::{BundleValidator, ValidationReport};
