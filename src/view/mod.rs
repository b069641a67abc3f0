//! Server-side HTML rendering.
//!
//! Pages are assembled from `format!` templates around a shared layout. Every
//! value that originates from a user or the store goes through [`escape`].

use crate::config::AppConfig;

/// Ranked games page and its HTMX fragment.
pub mod games;
/// Home and animals pages, server time and users fragments.
pub mod home;

const HTMX_SCRIPT: &str = "https://unpkg.com/htmx.org@2.0.4";
const SORTABLE_SCRIPT: &str = "https://cdn.jsdelivr.net/npm/sortablejs@1.15.6/Sortable.min.js";

/// Title and navigation key of a full page.
pub struct PageMeta<'a> {
    pub title: &'a str,
    /// Matches the `data-page` of the active nav link.
    pub page: &'a str,
}

/// Escape text for use in element content and double-quoted attributes.
pub fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Wrap `body` in the document shell.
pub fn layout(config: &AppConfig, meta: &PageMeta<'_>, body: &str) -> String {
    let app_name = escape(&config.app_name);
    let title = escape(meta.title);
    let nav: String = [
        ("home", "/", "Home"),
        ("animals", "/animals", "Animals"),
        ("games", "/games", "Games"),
    ]
        .iter()
        .map(|(page, href, label)| {
            let current = if *page == meta.page {
                r#" aria-current="page""#
            } else {
                ""
            };
            format!(r#"<a href="{href}" data-page="{page}"{current}>{label}</a>"#)
        })
        .collect();
    let badge = if config.dev {
        r#"<span class="badge">dev</span>"#
    } else {
        ""
    };

    format!(
        r#"<!doctype html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1">
  <title>{title} | {app_name}</title>
  <link rel="stylesheet" href="/public/styles.css">
  <script src="{HTMX_SCRIPT}"></script>
  <script src="{SORTABLE_SCRIPT}"></script>
  <script src="/public/app.js" defer></script>
</head>
<body>
  <header>
    <strong>{app_name}</strong>{badge}
    <nav>{nav}</nav>
  </header>
  <main>
{body}
  </main>
</body>
</html>
"#
    )
}

/// Full page for unknown paths.
pub fn not_found_page(config: &AppConfig) -> String {
    let meta = PageMeta {
        title: "Not found",
        page: "404",
    };
    layout(
        config,
        &meta,
        r#"<h1>404</h1>
<p>Sorry, we couldn&#39;t find that page.</p>
<p><a href="/">Back home</a></p>"#,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_markup() {
        assert_eq!(
            escape(r#"<b class="x">Tom & Jerry's</b>"#),
            "&lt;b class=&quot;x&quot;&gt;Tom &amp; Jerry&#39;s&lt;/b&gt;"
        );
        assert_eq!(escape("Zelda"), "Zelda");
    }

    #[test]
    fn test_layout_marks_current_page_and_dev_badge() {
        let config = AppConfig {
            dev: true,
            ..AppConfig::default()
        };
        let html = layout(
            &config,
            &PageMeta {
                title: "Games",
                page: "games",
            },
            "<p>body</p>",
        );

        assert!(html.contains(r#"data-page="games" aria-current="page""#));
        assert!(!html.contains(r#"data-page="home" aria-current"#));
        assert!(html.contains(r#"<span class="badge">dev</span>"#));
        assert!(html.contains("<title>Games | Game Rank</title>"));
        assert!(html.contains("<p>body</p>"));
    }

    #[test]
    fn test_not_found_page() {
        let html = not_found_page(&AppConfig::default());
        assert!(html.contains("<h1>404</h1>"));
        assert!(!html.contains("badge"));
    }
}
