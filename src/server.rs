//! HTTP surface: localized pages, the locale switch endpoint, the contact
//! API, and a few JSON endpoints for health and translations.

use crate::config::Config;
use crate::contact::{
    ContactForm, ContactGateway, MetricsReport, Outcome, SubmissionMetrics, ValidationErrors,
};
use crate::i18n::{
    detect_preferred_locale, localize, split_locale, Locale, LocaleRegistry, Messages,
    LOCALE_COOKIE,
};
use crate::pages::{self, ContactView, Page, PageContext};
use crate::store::ContactStore;
use crate::switcher::{
    is_same_site_path, LocaleSwitchController, Location, Navigator, RedirectNavigator,
    SwitchOutcome,
};
use anyhow::{Context, Result};
use axum::async_trait;
use axum::extract::{FromRequest, Path, Query, Request, State};
use axum::http::{header, HeaderMap, HeaderValue, Method, StatusCode, Uri};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

const LOCALE_COOKIE_MAX_AGE_SECS: u64 = 60 * 60 * 24 * 365;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub registry: Arc<LocaleRegistry>,
    pub messages: Arc<Messages>,
    pub store: Arc<dyn ContactStore>,
    pub metrics: Arc<SubmissionMetrics>,
}

impl AppState {
    pub fn new(config: Config, store: Arc<dyn ContactStore>) -> Result<Self> {
        let registry = config.registry()?;
        let messages = Messages::embedded(&registry)?;

        Ok(Self {
            config: Arc::new(config),
            registry: Arc::new(registry),
            messages: Arc::new(messages),
            store,
            metrics: Arc::new(SubmissionMetrics::new()),
        })
    }

    /// A gateway per request, so status notices are never shared between
    /// visitors.
    fn gateway(&self) -> ContactGateway {
        ContactGateway::new(
            Arc::clone(&self.store),
            Arc::clone(&self.messages),
            Arc::clone(&self.metrics),
        )
        .with_notice_ttl(self.config.notice_ttl())
    }

    fn content_language(&self, locale: Locale) -> &'static str {
        self.registry
            .config(locale.code())
            .map(|config| config.html_lang)
            .unwrap_or(locale.code())
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/locales", get(locales))
        .route("/api/messages/:locale", get(messages_bundle))
        .route("/api/contact", post(submit_contact))
        .route("/switch-locale", get(switch_locale))
        .fallback(page)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind and serve until Ctrl-C.
pub async fn serve(state: AppState) -> Result<()> {
    let addr = state.config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    info!("Listening on http://{}", addr);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("Shutdown signal received");
}

// ==================== JSON endpoints ====================

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    store_backend: &'static str,
    submissions: MetricsReport,
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        store_backend: state.store.backend(),
        submissions: state.metrics.report(),
    })
}

#[derive(Serialize)]
struct LocaleInfo {
    code: &'static str,
    name: &'static str,
    native_name: &'static str,
    default: bool,
}

#[derive(Serialize)]
struct LocalesResponse {
    default: &'static str,
    locales: Vec<LocaleInfo>,
}

async fn locales(State(state): State<AppState>) -> Json<LocalesResponse> {
    let default = state.registry.default_locale().code();
    let locales = state
        .registry
        .configs()
        .iter()
        .map(|config| LocaleInfo {
            code: config.code,
            name: config.name,
            native_name: config.native_name,
            default: config.code == default,
        })
        .collect();

    Json(LocalesResponse { default, locales })
}

async fn messages_bundle(State(state): State<AppState>, Path(code): Path<String>) -> Response {
    let locale = state.registry.resolve(&code);
    (
        [(header::CONTENT_LANGUAGE, state.content_language(locale))],
        Json(state.messages.bundle(locale).clone()),
    )
        .into_response()
}

// ==================== Locale switch ====================

#[derive(Debug, Deserialize)]
struct SwitchParams {
    to: String,
    #[serde(default)]
    path: Option<String>,
}

async fn switch_locale(
    State(state): State<AppState>,
    Query(params): Query<SwitchParams>,
) -> Response {
    let current = Location::parse(params.path.as_deref().unwrap_or("/"));
    let controller =
        LocaleSwitchController::new(Arc::clone(&state.registry), RedirectNavigator::new(current));

    match controller.switch_locale(&params.to).await {
        SwitchOutcome::Navigated { locale, target } => {
            info!(locale = %locale, target = %target, "Locale switched");
            with_locale_cookie(Redirect::to(&target).into_response(), locale)
        }
        SwitchOutcome::Ignored(reason) => {
            debug!(?reason, requested = %params.to, "Locale switch ignored");
            let back = controller.navigator().location().to_string();
            let back = if is_same_site_path(&back) {
                back
            } else {
                "/".to_string()
            };
            Redirect::to(&back).into_response()
        }
        SwitchOutcome::Failed { locale, .. } => {
            let root = localize("/", locale, &state.registry);
            with_locale_cookie(Redirect::to(&root).into_response(), locale)
        }
    }
}

fn with_locale_cookie(mut response: Response, locale: Locale) -> Response {
    let cookie = format!(
        "{LOCALE_COOKIE}={}; Path=/; Max-Age={LOCALE_COOKIE_MAX_AGE_SECS}; SameSite=Lax",
        locale.code()
    );
    if let Ok(value) = HeaderValue::from_str(&cookie) {
        response.headers_mut().append(header::SET_COOKIE, value);
    }
    response
}

// ==================== Contact ====================

/// Contact form fields plus the locale the visitor submitted from.
#[derive(Debug, Default, Deserialize)]
pub struct ContactRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub locale: Option<String>,
}

impl ContactRequest {
    fn into_form(self) -> ContactForm {
        ContactForm {
            name: self.name,
            email: self.email,
            company: self.company,
            message: self.message,
        }
    }
}

/// A contact submission from script (JSON) or from a plain HTML form.
enum ContactPayload {
    Json(ContactRequest),
    Form(ContactRequest),
}

#[async_trait]
impl<S> FromRequest<S> for ContactPayload
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_ascii_lowercase();

        if content_type.starts_with("application/json") {
            let Json(body) = Json::<ContactRequest>::from_request(req, state)
                .await
                .map_err(IntoResponse::into_response)?;
            Ok(Self::Json(body))
        } else if content_type.starts_with("application/x-www-form-urlencoded") {
            let Form(body) = Form::<ContactRequest>::from_request(req, state)
                .await
                .map_err(IntoResponse::into_response)?;
            Ok(Self::Form(body))
        } else {
            Err(StatusCode::UNSUPPORTED_MEDIA_TYPE.into_response())
        }
    }
}

#[derive(Serialize)]
struct ContactResponse {
    outcome: Outcome,
    notice: String,
    clear_form: bool,
    notice_ttl_ms: u64,
}

#[derive(Serialize)]
struct FieldErrorBody {
    field: &'static str,
    problem: String,
    message: String,
}

#[derive(Serialize)]
struct ValidationResponse {
    errors: Vec<FieldErrorBody>,
}

async fn submit_contact(State(state): State<AppState>, payload: ContactPayload) -> Response {
    let (request, wants_json) = match payload {
        ContactPayload::Json(request) => (request, true),
        ContactPayload::Form(request) => (request, false),
    };
    let locale = state
        .registry
        .resolve(request.locale.as_deref().unwrap_or_default());
    let mut form = request.into_form();
    let gateway = state.gateway();

    let outcome = match gateway.submit_form(&mut form, locale).await {
        Ok(outcome) => outcome,
        Err(errors) => return validation_failure(&state, locale, form, &errors, wants_json),
    };

    let notice = gateway
        .current_notice()
        .map(|notice| notice.text)
        .unwrap_or_else(|| state.messages.translate(locale, outcome.notice_key()));

    if wants_json {
        return Json(ContactResponse {
            outcome,
            notice,
            clear_form: outcome.clears_form(),
            notice_ttl_ms: gateway.notice_ttl().as_millis() as u64,
        })
        .into_response();
    }

    if outcome.clears_form() {
        let target = format!(
            "{}?submitted={}",
            localize("/contact", locale, &state.registry),
            outcome.as_str()
        );
        return Redirect::to(&target).into_response();
    }

    // Fallback notice: the visitor keeps what they typed. The page script
    // replaces this POST's history entry, so a reload does not re-submit.
    let view = ContactView {
        notice: Some(notice),
        notice_ttl_ms: state.config.notice_duration_ms,
        errors: Vec::new(),
        form,
    };
    render_page(&state, Page::Contact, locale, "/contact", None, &view, StatusCode::OK)
}

fn validation_failure(
    state: &AppState,
    locale: Locale,
    form: ContactForm,
    errors: &ValidationErrors,
    wants_json: bool,
) -> Response {
    debug!(errors = %errors, "Contact form rejected");

    if wants_json {
        let body = ValidationResponse {
            errors: errors
                .0
                .iter()
                .map(|e| FieldErrorBody {
                    field: e.field.as_str(),
                    problem: e.problem.to_string(),
                    message: e.localized(&state.messages, locale),
                })
                .collect(),
        };
        return (StatusCode::UNPROCESSABLE_ENTITY, Json(body)).into_response();
    }

    let view = ContactView {
        notice: None,
        notice_ttl_ms: state.config.notice_duration_ms,
        errors: errors
            .0
            .iter()
            .map(|e| e.localized(&state.messages, locale))
            .collect(),
        form,
    };
    render_page(
        state,
        Page::Contact,
        locale,
        "/contact",
        None,
        &view,
        StatusCode::UNPROCESSABLE_ENTITY,
    )
}

// ==================== Pages ====================

#[derive(Debug, Default, Deserialize)]
struct PageParams {
    submitted: Option<String>,
}

async fn page(
    State(state): State<AppState>,
    method: Method,
    headers: HeaderMap,
    uri: Uri,
    params: Option<Query<PageParams>>,
) -> Response {
    if method != Method::GET && method != Method::HEAD {
        return StatusCode::METHOD_NOT_ALLOWED.into_response();
    }

    let path = uri.path();
    let query = uri.query();
    let (locale, bare) = split_locale(path, &state.registry);

    let canonical = localize(&bare, locale, &state.registry);
    if canonical != path && is_same_site_path(&canonical) {
        return Redirect::permanent(&with_query(&canonical, query)).into_response();
    }

    if state.config.locale_detection && state.registry.is_default(locale) {
        let cookie = headers.get(header::COOKIE).and_then(|v| v.to_str().ok());
        let accept = headers
            .get(header::ACCEPT_LANGUAGE)
            .and_then(|v| v.to_str().ok());

        if let Some(preferred) = detect_preferred_locale(cookie, accept, &state.registry) {
            if !state.registry.is_default(preferred) {
                let target = localize(&bare, preferred, &state.registry);
                debug!(locale = %preferred, target = %target, "Redirecting to detected locale");
                return Redirect::temporary(&with_query(&target, query)).into_response();
            }
        }
    }

    let page = Page::route(&bare);
    // A malformed query string only loses the notice, never the page
    let submitted = params.and_then(|Query(params)| params.submitted);
    let notice = submitted
        .as_deref()
        .and_then(|value| value.parse::<Outcome>().ok())
        .filter(|_| page == Page::Contact)
        .map(|outcome| state.messages.translate(locale, outcome.notice_key()));
    let view = ContactView {
        notice,
        notice_ttl_ms: state.config.notice_duration_ms,
        ..ContactView::default()
    };
    let status = if page == Page::NotFound {
        StatusCode::NOT_FOUND
    } else {
        StatusCode::OK
    };

    render_page(&state, page, locale, &bare, query, &view, status)
}

fn render_page(
    state: &AppState,
    page: Page,
    locale: Locale,
    bare_path: &str,
    query: Option<&str>,
    view: &ContactView,
    status: StatusCode,
) -> Response {
    let ctx = PageContext {
        registry: &state.registry,
        messages: &state.messages,
        locale,
        bare_path,
        query,
        site_name: &state.config.site_name,
    };
    let html = pages::render(page, &ctx, view);

    (
        status,
        [(header::CONTENT_LANGUAGE, state.content_language(locale))],
        Html(html),
    )
        .into_response()
}

fn with_query(path: &str, query: Option<&str>) -> String {
    match query {
        Some(q) if !q.is_empty() => format!("{path}?{q}"),
        _ => path.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::UnconfiguredStore;

    #[test]
    fn test_with_query() {
        assert_eq!(with_query("/en", Some("a=1")), "/en?a=1");
        assert_eq!(with_query("/en", Some("")), "/en");
        assert_eq!(with_query("/", None), "/");
    }

    #[test]
    fn test_locale_cookie_header() {
        let registry = LocaleRegistry::standard();
        let response = with_locale_cookie(StatusCode::OK.into_response(), registry.resolve("en"));
        let cookie = response.headers().get(header::SET_COOKIE).unwrap();
        assert_eq!(
            cookie.to_str().unwrap(),
            "site_locale=en; Path=/; Max-Age=31536000; SameSite=Lax"
        );
    }

    #[test]
    fn test_state_uses_configured_default_locale() {
        let config = Config {
            default_locale: "en".to_string(),
            ..Config::default()
        };
        let state = AppState::new(config, Arc::new(UnconfiguredStore)).unwrap();
        assert_eq!(state.registry.default_locale().code(), "en");
        assert_eq!(state.content_language(state.registry.resolve("ja")), "ja");
    }

    #[test]
    fn test_contact_request_into_form() {
        let request = ContactRequest {
            name: "A".to_string(),
            email: "a@b.com".to_string(),
            locale: Some("en".to_string()),
            ..ContactRequest::default()
        };
        let form = request.into_form();
        assert_eq!(form.name, "A");
        assert!(form.company.is_empty());
    }
}
