//! Check the embedded translation bundles for missing or empty keys.
//!
//! Usage: cargo run --bin check-messages
//!
//! Exits non-zero when the default bundle lacks a key another bundle has.

use anyhow::{bail, Result};
use bayond_site::i18n::{BundleValidator, LocaleRegistry, Messages};

fn main() -> Result<()> {
    let registry = LocaleRegistry::standard();
    let messages = Messages::embedded(&registry)?;
    let report = BundleValidator::validate(&messages, &registry);

    for locale in registry.supported() {
        println!("{}: {} keys", locale, messages.bundle(locale).len());
    }

    for warning in &report.warnings {
        println!("warning: {}", warning);
    }
    for error in &report.errors {
        println!("error: {}", error);
    }

    if report.has_errors() {
        bail!("{} translation error(s)", report.errors.len());
    }

    if report.is_clean() {
        println!("All bundles are consistent");
    }
    Ok(())
}
