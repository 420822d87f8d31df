// src/digest/render.rs
//! HTML / plain-text rendering of the digest.
//!
//! Every interpolated field is escaped; links are limited to http(s) and mailto.
//! Output depends only on the items, the timestamp and the options.

use chrono::NaiveDateTime;
use html_escape::{encode_double_quoted_attribute, encode_text};
use std::collections::BTreeSet;
use std::fmt::Write as _;

use super::DigestItem;

/// User-visible labels and formats. All text is escaped on output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOptions {
    pub heading: String,
    pub app_name: String,
    pub story_header: String,
    pub importance_header: String,
    pub link_text: String,
    /// chrono `strftime` pattern for the header date.
    pub date_format: String,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            heading: "Daily News Digest".into(),
            app_name: format!("News Digest v{}", env!("CARGO_PKG_VERSION")),
            story_header: "Story".into(),
            importance_header: "Why it matters".into(),
            link_text: "Read the article".into(),
            date_format: "%A, %-d %B %Y".into(),
        }
    }
}

impl RenderOptions {
    /// Czech labels; weekday and month names are not localized by chrono, so the date is numeric.
    pub fn czech() -> Self {
        Self {
            heading: "Denní přehled zpráv".into(),
            story_header: "Shrnutí zprávy".into(),
            importance_header: "Proč je to důležité".into(),
            link_text: "Číst článek".into(),
            date_format: "%-d. %-m. %Y".into(),
            ..Self::default()
        }
    }
}

const STYLE: &str = r#"
body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Arial, sans-serif; max-width: 800px; margin: 0 auto; padding: 20px; background: #f5f5f5; color: #333; }
.container { background: white; border-radius: 12px; overflow: hidden; box-shadow: 0 4px 12px rgba(0,0,0,0.1); }
.header { background: linear-gradient(135deg, #667eea 0%, #764ba2 100%); color: white; padding: 30px; text-align: center; }
.header h1 { margin: 0; font-size: 2.2em; font-weight: 300; }
.header p { margin: 10px 0 0 0; opacity: 0.9; font-size: 1.1em; }
.news-table { width: 100%; border-collapse: collapse; margin: 0; }
.news-table th { background: #34495e; color: white; padding: 18px; text-align: left; font-weight: 600; font-size: 1.1em; }
.news-table td { padding: 20px 18px; border-bottom: 1px solid #eee; vertical-align: top; }
.news-table tr:last-child td { border-bottom: none; }
.news-table tr:nth-child(even) { background: #fafafa; }
.news-title { font-weight: 600; color: #2c3e50; margin-bottom: 10px; font-size: 1.1em; line-height: 1.3; }
.news-context { color: #555; margin-bottom: 12px; line-height: 1.5; }
.news-meta { display: flex; justify-content: space-between; align-items: center; margin-top: 8px; }
.news-source { color: #3498db; text-decoration: none; font-size: 0.9em; font-weight: 500; }
.source-name { color: #7f8c8d; font-size: 0.85em; font-style: italic; }
.score { color: #95a5a6; font-size: 0.8em; }
.importance { color: #e67e22; font-weight: 500; line-height: 1.5; }
.footer { text-align: center; color: #7f8c8d; padding: 25px; background: #f8f9fa; font-size: 0.9em; }
.footer strong { color: #2c3e50; }
@media (max-width: 600px) {
  .news-table, .news-table tbody, .news-table tr, .news-table td { display: block; width: 100%; }
  .news-table th { display: none; }
}
"#;

/// Allow only http(s) and mailto links; anything else becomes "#".
pub fn safe_href(link: &str) -> &str {
    let l = link.trim();
    let lower = l.to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") || lower.starts_with("mailto:")
    {
        l
    } else {
        "#"
    }
}

fn long_date(at: &NaiveDateTime, format: &str) -> String {
    use chrono::format::{Item, StrftimeItems};
    // invalid patterns would make `Display` fail, so check them first
    if StrftimeItems::new(format).any(|i| matches!(i, Item::Error)) {
        return at.format("%Y-%m-%d").to_string();
    }
    at.format(format).to_string()
}

pub fn distinct_sources(items: &[DigestItem]) -> usize {
    items
        .iter()
        .map(|i| i.source_name.as_str())
        .collect::<BTreeSet<_>>()
        .len()
}

pub fn subject_line(count: usize, at: &NaiveDateTime) -> String {
    let noun = if count == 1 { "article" } else { "articles" };
    format!(
        "Daily news digest ({count} {noun}) - {}",
        at.format("%Y-%m-%d")
    )
}

pub fn render_html(items: &[DigestItem], generated_at: &NaiveDateTime, opts: &RenderOptions) -> String {
    let date = encode_text(&long_date(generated_at, &opts.date_format)).into_owned();
    let heading = encode_text(&opts.heading);

    let mut html = String::with_capacity(4096 + items.len() * 512);
    html.push_str("<!DOCTYPE html>\n<html>\n<head>\n");
    html.push_str("<meta charset=\"UTF-8\">\n");
    html.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n");
    let _ = writeln!(html, "<title>{heading} - {date}</title>");
    let _ = writeln!(html, "<style>{STYLE}</style>");
    html.push_str("</head>\n<body>\n<div class=\"container\">\n");
    let _ = writeln!(
        html,
        "<div class=\"header\">\n<h1>{heading}</h1>\n<p>{date}</p>\n</div>"
    );

    html.push_str("<table class=\"news-table\">\n<thead>\n<tr>\n");
    let _ = writeln!(html, "<th style=\"width: 60%;\">{}</th>", encode_text(&opts.story_header));
    let _ = writeln!(html, "<th style=\"width: 40%;\">{}</th>", encode_text(&opts.importance_header));
    html.push_str("</tr>\n</thead>\n<tbody>\n");

    let link_text = encode_text(&opts.link_text);
    for item in items {
        let href = encode_double_quoted_attribute(safe_href(&item.link));
        html.push_str("<tr>\n<td>\n");
        let _ = writeln!(html, "<div class=\"news-title\">{}</div>", encode_text(&item.title));
        let _ = writeln!(html, "<div class=\"news-context\">{}</div>", encode_text(&item.context));
        html.push_str("<div class=\"news-meta\">\n");
        let _ = writeln!(
            html,
            "<a href=\"{href}\" class=\"news-source\" target=\"_blank\" rel=\"noopener noreferrer\">{link_text} &rarr;</a>"
        );
        let _ = writeln!(html, "<span class=\"source-name\">{}</span>", encode_text(&item.source_name));
        if let Some(score) = item.score {
            let _ = writeln!(html, "<span class=\"score\">score {score}</span>");
        }
        html.push_str("</div>\n</td>\n<td>\n");
        let _ = writeln!(html, "<div class=\"importance\">{}</div>", encode_text(&item.importance));
        html.push_str("</td>\n</tr>\n");
    }

    html.push_str("</tbody>\n</table>\n");
    let _ = writeln!(
        html,
        "<div class=\"footer\">\n<strong>Stats:</strong> {} articles from {} sources<br>\n<strong>Prepared:</strong> {} | <strong>{}</strong>\n</div>",
        items.len(),
        distinct_sources(items),
        generated_at.format("%H:%M:%S"),
        encode_text(&opts.app_name)
    );
    html.push_str("</div>\n</body>\n</html>\n");
    html
}

/// text/plain alternative for mail clients without HTML.
pub fn render_plain_text(items: &[DigestItem], generated_at: &NaiveDateTime, opts: &RenderOptions) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} - {}", opts.heading, long_date(generated_at, &opts.date_format));
    out.push('\n');
    for (i, item) in items.iter().enumerate() {
        let _ = writeln!(out, "{}. {}", i + 1, item.title);
        let _ = writeln!(out, "   {}", item.context);
        let _ = writeln!(out, "   {} ({})", safe_href(&item.link), item.source_name);
        let _ = writeln!(out, "   {}: {}", opts.importance_header, item.importance);
        out.push('\n');
    }
    let _ = writeln!(
        out,
        "{} articles from {} sources | {}",
        items.len(),
        distinct_sources(items),
        opts.app_name
    );
    out
}
