//! Locale switching: the Idle -> Switching -> Idle controller and the
//! routing-layer seam it navigates through.

use crate::i18n::{localize, split_locale, Locale, LocaleRegistry};
use futures::future::BoxFuture;
use futures::FutureExt;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, error, info};

/// A route as seen by the routing layer: path plus optional query string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub path: String,
    pub query: Option<String>,
}

impl Location {
    /// Parse `"/path?query#fragment"`. The fragment is dropped and an empty
    /// path becomes `/`.
    pub fn parse(raw: &str) -> Self {
        let without_fragment = raw.split('#').next().unwrap_or_default();
        let (path, query) = match without_fragment.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (without_fragment, None),
        };

        Self {
            path: if path.is_empty() { "/".to_string() } else { path.to_string() },
            query: query.filter(|q| !q.is_empty()).map(str::to_string),
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.query {
            Some(query) => write!(f, "{}?{}", self.path, query),
            None => f.write_str(&self.path),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigateMode {
    Push,
    Replace,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum NavigationError {
    #[error("refusing to navigate off-site to '{0}'")]
    OffSite(String),

    #[error("navigation failed: {0}")]
    Failed(String),
}

/// The routing layer: knows where we are and can move somewhere else.
pub trait Navigator: Send + Sync {
    fn location(&self) -> Location;

    fn navigate<'a>(
        &'a self,
        target: &'a str,
        mode: NavigateMode,
    ) -> BoxFuture<'a, Result<(), NavigationError>>;
}

/// One locale switch: built when a switch starts, consumed by navigation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationRequest {
    pub target: Locale,
    pub current_path: String,
    pub query: Option<String>,
}

impl NavigationRequest {
    /// The localized path with the original query string carried over.
    pub fn destination(&self, registry: &LocaleRegistry) -> String {
        let location = Location {
            path: localize(&self.current_path, self.target, registry),
            query: self.query.clone(),
        };
        location.to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// The requested code is not in the registry
    Unsupported,
    /// The requested locale is already the current one
    AlreadyActive,
    /// Another switch has not finished yet
    InFlight,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SwitchOutcome {
    Navigated {
        locale: Locale,
        target: String,
    },
    Ignored(IgnoreReason),
    /// Navigation was attempted and failed; already logged.
    Failed {
        locale: Locale,
        target: String,
        error: NavigationError,
    },
}

/// Drives locale switches through a `Navigator`.
///
/// The controller owns the loading flag. It is raised for exactly the span
/// of one navigation and observers can follow it through `subscribe()`.
/// Only one switch runs at a time; overlapping requests are ignored.
pub struct LocaleSwitchController<N> {
    registry: Arc<LocaleRegistry>,
    navigator: N,
    in_flight: AtomicBool,
    loading: watch::Sender<bool>,
}

impl<N: Navigator> LocaleSwitchController<N> {
    pub fn new(registry: Arc<LocaleRegistry>, navigator: N) -> Self {
        let (loading, _) = watch::channel(false);
        Self {
            registry,
            navigator,
            in_flight: AtomicBool::new(false),
            loading,
        }
    }

    pub fn navigator(&self) -> &N {
        &self.navigator
    }

    /// The locale of the navigator's current path.
    pub fn current_locale(&self) -> Locale {
        split_locale(&self.navigator.location().path, &self.registry).0
    }

    pub fn is_loading(&self) -> bool {
        *self.loading.borrow()
    }

    /// Follow the loading flag.
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.loading.subscribe()
    }

    /// `path` localized for `target`, or for the current locale if `None`.
    pub fn localized_path(&self, path: &str, target: Option<Locale>) -> String {
        let target = target.unwrap_or_else(|| self.current_locale());
        localize(path, target, &self.registry)
    }

    /// Navigate to `path` in `locale` (default: current), adding history.
    pub async fn push(&self, path: &str, locale: Option<Locale>) -> Result<String, NavigationError> {
        self.go(path, locale, NavigateMode::Push).await
    }

    /// Navigate to `path` in `locale` (default: current), replacing history.
    pub async fn replace(
        &self,
        path: &str,
        locale: Option<Locale>,
    ) -> Result<String, NavigationError> {
        self.go(path, locale, NavigateMode::Replace).await
    }

    async fn go(
        &self,
        path: &str,
        locale: Option<Locale>,
        mode: NavigateMode,
    ) -> Result<String, NavigationError> {
        let target = self.localized_path(path, locale);
        self.navigator.navigate(&target, mode).await?;
        Ok(target)
    }

    /// Switch to the locale named by `requested`.
    ///
    /// Never returns an error: navigation failures are logged and reported
    /// as `SwitchOutcome::Failed`, and the loading flag is always lowered.
    pub async fn switch_locale(&self, requested: &str) -> SwitchOutcome {
        let Some(target) = self.registry.get(requested) else {
            debug!(requested, "Ignoring switch to unsupported locale");
            return SwitchOutcome::Ignored(IgnoreReason::Unsupported);
        };

        let location = self.navigator.location();
        let (current, _) = split_locale(&location.path, &self.registry);
        if target == current {
            return SwitchOutcome::Ignored(IgnoreReason::AlreadyActive);
        }

        let Some(_guard) = SwitchGuard::acquire(&self.in_flight, &self.loading) else {
            debug!(requested, "Ignoring switch while another is in flight");
            return SwitchOutcome::Ignored(IgnoreReason::InFlight);
        };

        let request = NavigationRequest {
            target,
            current_path: location.path,
            query: location.query,
        };
        let destination = request.destination(&self.registry);
        info!(from = %current, to = %target, %destination, "Switching locale");

        match self.navigator.navigate(&destination, NavigateMode::Push).await {
            Ok(()) => SwitchOutcome::Navigated {
                locale: target,
                target: destination,
            },
            Err(e) => {
                error!(error = %e, to = %target, %destination, "Failed to switch locale");
                SwitchOutcome::Failed {
                    locale: target,
                    target: destination,
                    error: e,
                }
            }
        }
    }
}

/// Holds the Switching state; dropping it returns the controller to Idle,
/// including when the switch future is cancelled.
struct SwitchGuard<'a> {
    in_flight: &'a AtomicBool,
    loading: &'a watch::Sender<bool>,
}

impl<'a> SwitchGuard<'a> {
    fn acquire(in_flight: &'a AtomicBool, loading: &'a watch::Sender<bool>) -> Option<Self> {
        in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()?;
        loading.send_replace(true);
        Some(Self { in_flight, loading })
    }
}

impl Drop for SwitchGuard<'_> {
    fn drop(&mut self) {
        self.loading.send_replace(false);
        self.in_flight.store(false, Ordering::Release);
    }
}

/// Routing layer for HTTP: navigation means answering with a redirect.
///
/// Only same-site absolute paths are accepted as targets, so a crafted
/// `path` parameter cannot turn the switch endpoint into an open redirect.
#[derive(Debug)]
pub struct RedirectNavigator {
    location: Mutex<Location>,
    redirect: Mutex<Option<(String, NavigateMode)>>,
}

impl RedirectNavigator {
    pub fn new(location: Location) -> Self {
        Self {
            location: Mutex::new(location),
            redirect: Mutex::new(None),
        }
    }

    /// The last accepted navigation target, if any.
    pub fn redirect(&self) -> Option<(String, NavigateMode)> {
        self.redirect
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Navigator for RedirectNavigator {
    fn location(&self) -> Location {
        self.location
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn navigate<'a>(
        &'a self,
        target: &'a str,
        mode: NavigateMode,
    ) -> BoxFuture<'a, Result<(), NavigationError>> {
        async move {
            if !is_same_site_path(target) {
                return Err(NavigationError::OffSite(target.to_string()));
            }

            *self.location.lock().unwrap_or_else(PoisonError::into_inner) = Location::parse(target);
            *self.redirect.lock().unwrap_or_else(PoisonError::into_inner) =
                Some((target.to_string(), mode));
            Ok(())
        }
        .boxed()
    }
}

pub(crate) fn is_same_site_path(target: &str) -> bool {
    target.starts_with('/')
        && !target.starts_with("//")
        && !target.contains('\\')
        && !target.chars().any(char::is_control)
}
