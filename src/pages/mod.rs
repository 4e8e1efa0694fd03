//! Server-rendered HTML for the public site and the admin area.
//!
//! Markup is assembled with `format!` and every interpolated value goes
//! through [`escape`]. Forms marked `data-api` are submitted by the shared
//! inline script with `fetch`; `data-json` forms send a JSON object, the
//! rest send multipart so file inputs travel with the document.

pub mod admin;
pub mod public;

use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    Router,
};

use crate::config::SiteConfig;
use crate::schema::FooterSettings;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    public::router().merge(admin::router())
}

pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

const FORM_SCRIPT: &str = r#"<script>
document.addEventListener('submit', async (event) => {
  const form = event.target;
  if (!form.dataset.api) return;
  event.preventDefault();
  const init = { method: form.dataset.method || 'POST', credentials: 'same-origin' };
  if ('json' in form.dataset) {
    init.headers = { 'Content-Type': 'application/json' };
    init.body = JSON.stringify(Object.fromEntries(new FormData(form)));
  } else {
    init.body = new FormData(form);
  }
  const out = form.querySelector('.result');
  const res = await fetch(form.dataset.api, init);
  if (res.ok) {
    if (form.dataset.redirect) { location.href = form.dataset.redirect; } else { location.reload(); }
    return;
  }
  const body = await res.json().catch(() => ({}));
  if (out) out.textContent = (body.error || 'Request failed') + (body.message ? ': ' + body.message : '');
});
</script>"#;

const STYLE: &str = r#"<style>
body{font-family:system-ui,sans-serif;margin:0;color:#1d1d1f}
header,main,footer{padding:1rem 2rem}
header nav a{margin-right:1rem}
main{max-width:64rem}
.cards{display:grid;grid-template-columns:repeat(auto-fill,minmax(16rem,1fr));gap:1rem}
.card{border:1px solid #ddd;border-radius:6px;padding:1rem}
.card img,.hero img{max-width:100%}
.result{color:#b00020}
table{border-collapse:collapse;width:100%}
td,th{border-bottom:1px solid #eee;padding:.4rem;text-align:left;vertical-align:top}
textarea{width:100%;min-height:12rem;font-family:monospace}
footer{background:#f4f4f6;margin-top:2rem}
</style>"#;

/// Full HTML document around `main`.
pub fn document(title: &str, site: &SiteConfig, nav: &str, main: &str, footer: &str) -> String {
    format!(
        "<!doctype html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n\
         <title>{} | {}</title>\n\
         <link rel=\"alternate\" type=\"application/rss+xml\" href=\"/rss.xml\">\n{STYLE}\n</head>\n\
         <body>\n<header><nav>{nav}</nav></header>\n<main>\n{main}\n</main>\n{footer}\n{FORM_SCRIPT}\n</body>\n</html>\n",
        escape(title),
        escape(&site.title),
    )
}

pub fn render_footer(footer: &FooterSettings) -> String {
    let mut html = String::from("<footer>");

    if !footer.branding.logo.is_empty() {
        html.push_str(&format!(
            "<img src=\"{}\" alt=\"logo\" height=\"40\">",
            escape(&footer.branding.logo)
        ));
    }
    if !footer.branding.tagline.is_empty() {
        html.push_str(&format!("<p>{}</p>", escape(&footer.branding.tagline)));
    }

    if !footer.links.is_empty() {
        html.push_str("<nav>");
        for link in &footer.links {
            html.push_str(&format!(
                "<a href=\"{}\">{}</a> ",
                escape(&link.href),
                escape(&link.label)
            ));
        }
        html.push_str("</nav>");
    }

    for cert in &footer.certifications {
        if cert.image.is_empty() {
            html.push_str(&format!("<span>{}</span> ", escape(&cert.name)));
        } else {
            html.push_str(&format!(
                "<img src=\"{}\" alt=\"{}\" height=\"32\"> ",
                escape(&cert.image),
                escape(&cert.name)
            ));
        }
    }

    let contact = &footer.contact;
    if !contact.email.is_empty() || !contact.phone.is_empty() {
        html.push_str(&format!(
            "<p>{} {}</p>",
            escape(&contact.email),
            escape(&contact.phone)
        ));
    }

    let address: Vec<&str> = [
        footer.address.line1.as_str(),
        footer.address.line2.as_str(),
        footer.address.city.as_str(),
        footer.address.country.as_str(),
    ]
    .into_iter()
    .filter(|s| !s.is_empty())
    .collect();
    if !address.is_empty() {
        html.push_str(&format!("<address>{}</address>", escape(&address.join(", "))));
    }

    html.push_str("</footer>");
    html
}

/// Pretty JSON for an editor textarea; falls back to `{}`.
pub fn pretty_json<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string())
}

pub fn html_response(status: StatusCode, html: String) -> Response {
    (status, Html(html)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::schema::singletons::FooterLink;

    #[test]
    fn test_escape() {
        assert_eq!(
            escape(r#"<a href="x">Tom & 'Jerry'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; &#39;Jerry&#39;&lt;/a&gt;"
        );
    }

    #[test]
    fn test_render_footer_escapes_links() {
        let footer = FooterSettings {
            links: vec![FooterLink {
                label: "<b>Home</b>".into(),
                href: "/".into(),
            }],
            ..Default::default()
        };
        let html = render_footer(&footer);
        assert!(html.contains("<a href=\"/\">&lt;b&gt;Home&lt;/b&gt;</a>"));
        assert!(!html.contains("<address>"));
    }

    #[test]
    fn test_document_carries_script_and_title() {
        let config = AppConfig::default();
        let html = document("Blog", &config.site, "", "<p>x</p>", "<footer></footer>");
        assert!(html.contains("<title>Blog | Sitedesk</title>"));
        assert!(html.contains("dataset.api"));
        assert!(html.contains("<footer></footer>"));
    }
}
