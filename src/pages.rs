//! Server-rendered HTML for the site's pages.
//!
//! Markup is deliberately bare: a layout shell with the localized nav, the
//! language switcher, and the body of one page. Every piece of dynamic text
//! goes through `escape_html`.

use crate::contact::{ContactForm, Field};
use crate::i18n::{localize, Locale, LocaleRegistry, Messages};
use std::fmt::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Home,
    Contact,
    NotFound,
}

impl Page {
    /// Route a locale-free path to a page.
    pub fn route(bare_path: &str) -> Self {
        match bare_path {
            "/" => Page::Home,
            "/contact" | "/contact/" => Page::Contact,
            _ => Page::NotFound,
        }
    }

    fn title_key(self) -> &'static str {
        match self {
            Page::Home => "hero.title",
            Page::Contact => "contact.title",
            Page::NotFound => "notFound.title",
        }
    }
}

/// State of the contact page beyond the empty form.
#[derive(Debug, Clone, Default)]
pub struct ContactView {
    /// Status notice text from the last submission
    pub notice: Option<String>,
    /// How long the notice stays on screen
    pub notice_ttl_ms: u64,
    /// Localized validation messages
    pub errors: Vec<String>,
    /// Values to refill the inputs with
    pub form: ContactForm,
}

pub struct PageContext<'a> {
    pub registry: &'a LocaleRegistry,
    pub messages: &'a Messages,
    pub locale: Locale,
    /// Path without any locale prefix
    pub bare_path: &'a str,
    /// Query string of the current request, carried into switcher links
    pub query: Option<&'a str>,
    pub site_name: &'a str,
}

impl PageContext<'_> {
    fn t(&self, key: &str) -> String {
        escape_html(&self.messages.translate(self.locale, key))
    }

    fn href(&self, path: &str) -> String {
        escape_html(&localize(path, self.locale, self.registry))
    }
}

pub fn render(page: Page, ctx: &PageContext<'_>, contact: &ContactView) -> String {
    let body = match page {
        Page::Home => home_body(ctx),
        Page::Contact => contact_body(ctx, contact),
        Page::NotFound => not_found_body(ctx),
    };
    layout(ctx, &ctx.t(page.title_key()), &body)
}

fn layout(ctx: &PageContext<'_>, title: &str, body: &str) -> String {
    let lang = ctx
        .registry
        .config(ctx.locale.code())
        .map(|c| c.html_lang)
        .unwrap_or(ctx.locale.code());
    let site = escape_html(ctx.site_name);

    let mut html = String::new();
    let _ = write!(
        html,
        "<!DOCTYPE html>\n<html lang=\"{lang}\">\n<head>\n<meta charset=\"utf-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n\
         <title>{title} | {site}</title>\n</head>\n<body>\n<header>\n\
         <a class=\"brand\" href=\"{home}\">{site}</a>\n<nav>\n",
        home = ctx.href("/"),
    );
    for (path, fragment, key) in [
        ("/", "", "nav.home"),
        ("/", "#about", "nav.about"),
        ("/", "#services", "nav.services"),
        ("/contact", "", "nav.contact"),
    ] {
        let _ = writeln!(
            html,
            "<a href=\"{}{fragment}\">{}</a>",
            ctx.href(path),
            ctx.t(key)
        );
    }
    html.push_str("</nav>\n");
    html.push_str(&switcher(ctx));
    let _ = write!(
        html,
        "</header>\n<main>\n{body}</main>\n<footer>{rights}</footer>\n</body>\n</html>\n",
        rights = ctx.t("footer.rights"),
    );
    html
}

/// One link per other locale, each going through `/switch-locale`.
fn switcher(ctx: &PageContext<'_>) -> String {
    let current_path = localize(ctx.bare_path, ctx.locale, ctx.registry);
    let current = match ctx.query {
        Some(q) if !q.is_empty() => format!("{current_path}?{q}"),
        _ => current_path,
    };

    let mut html = String::new();
    let _ = writeln!(
        html,
        "<div class=\"language-switcher\" aria-label=\"{}\">",
        ctx.t("switcher.label")
    );
    let _ = writeln!(
        html,
        "<span aria-current=\"true\">{}</span>",
        escape_html(ctx.registry.display_name(ctx.locale.code()))
    );
    for other in ctx.registry.others(ctx.locale) {
        let href = format!(
            "/switch-locale?to={}&path={}",
            other.code(),
            encode_query_component(&current)
        );
        let _ = writeln!(
            html,
            "<a href=\"{}\" hreflang=\"{}\">{}</a>",
            escape_html(&href),
            other.code(),
            escape_html(ctx.registry.display_name(other.code()))
        );
    }
    html.push_str("</div>\n");
    html
}

fn home_body(ctx: &PageContext<'_>) -> String {
    let mut html = String::new();
    let _ = write!(
        html,
        "<section class=\"hero\">\n<p class=\"badge\">{}</p>\n<h1>{}</h1>\n<p>{}</p>\n\
         <a href=\"{}\">{}</a>\n</section>\n",
        ctx.t("hero.badge"),
        ctx.t("hero.title"),
        ctx.t("hero.description"),
        ctx.href("/contact"),
        ctx.t("hero.cta"),
    );

    let _ = write!(
        html,
        "<section id=\"services\">\n<h2>{}</h2>\n<ul>\n",
        ctx.t("services.title")
    );
    for key in ["services.myond", "services.ai", "services.saas", "services.tech"] {
        let _ = writeln!(html, "<li>{}</li>", ctx.t(key));
    }
    html.push_str("</ul>\n</section>\n");

    let _ = write!(
        html,
        "<section id=\"about\">\n<h2>{}</h2>\n<p>{}</p>\n<p>{}</p>\n</section>\n",
        ctx.t("company.title"),
        ctx.t("company.subtitle"),
        ctx.t("company.headquarters"),
    );
    html
}

fn contact_body(ctx: &PageContext<'_>, view: &ContactView) -> String {
    let mut html = String::new();
    let _ = write!(
        html,
        "<section class=\"contact\">\n<h1>{}</h1>\n<p>{}</p>\n",
        ctx.t("contact.title"),
        ctx.t("contact.description"),
    );

    if let Some(notice) = &view.notice {
        let _ = writeln!(
            html,
            "<p class=\"notice\" role=\"status\" data-ttl-ms=\"{}\" data-location=\"{}\">{}</p>",
            view.notice_ttl_ms,
            ctx.href("/contact"),
            escape_html(notice)
        );
        html.push_str(NOTICE_SCRIPT);
    }
    if !view.errors.is_empty() {
        html.push_str("<ul class=\"errors\" role=\"alert\">\n");
        for error in &view.errors {
            let _ = writeln!(html, "<li>{}</li>", escape_html(error));
        }
        html.push_str("</ul>\n");
    }

    let _ = write!(
        html,
        "<form method=\"post\" action=\"/api/contact\">\n\
         <input type=\"hidden\" name=\"locale\" value=\"{}\">\n",
        ctx.locale.code()
    );
    for (field, kind, value) in [
        (Field::Name, "text", &view.form.name),
        (Field::Email, "email", &view.form.email),
        (Field::Company, "text", &view.form.company),
    ] {
        let required = if field == Field::Company { "" } else { " required" };
        let _ = writeln!(
            html,
            "<label>{label}<input type=\"{kind}\" name=\"{name}\" value=\"{value}\"{required}></label>",
            label = ctx.t(field.label_key()),
            name = field.as_str(),
            value = escape_html(value),
        );
    }
    let _ = write!(
        html,
        "<label>{}<textarea name=\"message\" rows=\"6\" required>{}</textarea></label>\n\
         <button type=\"submit\">{}</button>\n</form>\n</section>\n",
        ctx.t(Field::Message.label_key()),
        escape_html(&view.form.message),
        ctx.t("contact.submit"),
    );
    html
}

fn not_found_body(ctx: &PageContext<'_>) -> String {
    format!(
        "<section class=\"not-found\">\n<p class=\"code\">{}</p>\n<h1>{}</h1>\n<p>{}</p>\n\
         <a href=\"{}\">{}</a>\n</section>\n",
        ctx.t("notFound.code"),
        ctx.t("notFound.title"),
        ctx.t("notFound.description"),
        ctx.href("/"),
        ctx.t("notFound.home"),
    )
}

/// Hides the notice after its TTL and swaps the history entry for the bare
/// contact page, so a reload neither shows the notice again nor re-posts.
const NOTICE_SCRIPT: &str = "<script>
(function () {
  var notice = document.querySelector('.notice[data-ttl-ms]');
  if (!notice) return;
  history.replaceState(null, '', notice.dataset.location);
  setTimeout(function () { notice.remove(); }, Number(notice.dataset.ttlMs));
})();
</script>
";

pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Percent-encode everything outside the RFC 3986 unreserved set.
fn encode_query_component(value: &str) -> String {
    let mut encoded = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
                encoded.push(byte as char)
            }
            _ => {
                let _ = write!(encoded, "%{byte:02X}");
            }
        }
    }
    encoded
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render_page(page: Page, code: &str, bare_path: &str, view: &ContactView) -> String {
        let registry = LocaleRegistry::standard();
        let messages = Messages::embedded(&registry).unwrap();
        let ctx = PageContext {
            registry: &registry,
            messages: &messages,
            locale: registry.resolve(code),
            bare_path,
            query: None,
            site_name: "Bayond LLC",
        };
        render(page, &ctx, view)
    }

    // ==================== Routing Tests ====================

    #[test]
    fn test_route() {
        assert_eq!(Page::route("/"), Page::Home);
        assert_eq!(Page::route("/contact"), Page::Contact);
        assert_eq!(Page::route("/contact/"), Page::Contact);
        assert_eq!(Page::route("/missing"), Page::NotFound);
    }

    #[test]
    fn test_route_rejects_empty_segments() {
        assert_eq!(Page::route("//"), Page::NotFound);
        assert_eq!(Page::route("/contact//"), Page::NotFound);
        assert_eq!(Page::route(""), Page::NotFound);
    }

    // ==================== Layout Tests ====================

    #[test]
    fn test_layout_sets_lang_and_localized_links() {
        let html = render_page(Page::Home, "en", "/", &ContactView::default());
        assert!(html.contains("<html lang=\"en\">"));
        assert!(html.contains("href=\"/en/contact\""));
        assert!(html.contains("/switch-locale?to=ja&amp;path=%2Fen"));
        assert!(html.contains("日本語"));
    }

    #[test]
    fn test_default_locale_links_have_no_prefix() {
        let html = render_page(Page::Contact, "ja", "/contact", &ContactView::default());
        assert!(html.contains("<html lang=\"ja\">"));
        assert!(html.contains("href=\"/contact\""));
        assert!(html.contains("/switch-locale?to=en&amp;path=%2Fcontact"));
        assert!(html.contains("name=\"locale\" value=\"ja\""));
    }

    #[test]
    fn test_nav_fragments_follow_localized_root() {
        let html = render_page(Page::Contact, "en", "/contact", &ContactView::default());
        assert!(html.contains("href=\"/en#about\""));
        assert!(html.contains("href=\"/en#services\""));
        assert!(!html.contains("/en/#"));

        let html = render_page(Page::Home, "ja", "/", &ContactView::default());
        assert!(html.contains("href=\"/#about\""));
    }

    #[test]
    fn test_not_found_links_home_in_locale() {
        let html = render_page(Page::NotFound, "en", "/nope", &ContactView::default());
        assert!(html.contains("404"));
        assert!(html.contains("href=\"/en\""));
    }

    // ==================== Contact Page Tests ====================

    #[test]
    fn test_contact_view_is_escaped() {
        let view = ContactView {
            notice: Some("Thanks <b>".to_string()),
            notice_ttl_ms: 5000,
            errors: vec!["bad \"email\"".to_string()],
            form: ContactForm {
                name: "<script>".to_string(),
                message: "a & b".to_string(),
                ..ContactForm::default()
            },
        };
        let html = render_page(Page::Contact, "en", "/contact", &view);
        assert!(html.contains("Thanks &lt;b&gt;"));
        assert!(html.contains("bad &quot;email&quot;"));
        assert!(html.contains("value=\"&lt;script&gt;\""));
        assert!(html.contains(">a &amp; b</textarea>"));
        assert!(!html.contains("value=\"<script>"));
    }

    #[test]
    fn test_notice_carries_ttl_and_expiry_script() {
        let view = ContactView {
            notice: Some("Thanks".to_string()),
            notice_ttl_ms: 5000,
            ..ContactView::default()
        };
        let html = render_page(Page::Contact, "en", "/contact", &view);
        assert!(html.contains("data-ttl-ms=\"5000\""));
        assert!(html.contains("data-location=\"/en/contact\""));
        assert!(html.contains("notice.remove()"));
        assert!(html.contains("history.replaceState"));
    }

    #[test]
    fn test_no_notice_no_script() {
        let html = render_page(Page::Contact, "ja", "/contact", &ContactView::default());
        assert!(!html.contains("data-ttl-ms"));
        assert!(!html.contains("<script>"));
    }

    // ==================== Helper Tests ====================

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("<a href='x'>&</a>"), "&lt;a href=&#39;x&#39;&gt;&amp;&lt;/a&gt;");
        assert_eq!(escape_html("日本語"), "日本語");
    }

    #[test]
    fn test_encode_query_component() {
        assert_eq!(encode_query_component("/en/contact?a=1&b"), "%2Fen%2Fcontact%3Fa%3D1%26b");
        assert_eq!(encode_query_component("/é"), "%2F%C3%A9");
    }
}
