// BSD 3-Clause License
// Copyright (c) 2025, ENVGATE
//
//! Configuration-error page

use axum::{
    extract::Query,
    http::StatusCode,
    response::{Html, IntoResponse},
};
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
pub struct ConfigErrorQuery {
    pub errors: Option<String>,
    pub warnings: Option<String>,
    pub production: Option<String>,
    pub timestamp: Option<String>,
}

impl ConfigErrorQuery {
    fn is_production(&self) -> bool {
        self.production.as_deref() == Some("true")
    }
}

/// JSON list of messages; anything else is kept as one raw message.
pub fn parse_list(raw: Option<&str>) -> Vec<String> {
    match raw.map(str::trim) {
        None | Some("") => Vec::new(),
        Some(value) => serde_json::from_str::<Vec<String>>(value)
            .unwrap_or_else(|_| vec![value.to_string()]),
    }
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn list_section(title: &str, class: &str, items: &[String]) -> String {
    if items.is_empty() {
        return String::new();
    }
    let entries: String = items
        .iter()
        .map(|item| format!("<li>{}</li>", escape_html(item)))
        .collect();
    format!(
        "<section class=\"{}\"><h2>{} ({})</h2><ul>{}</ul></section>",
        class,
        title,
        items.len(),
        entries
    )
}

fn page(body: &str) -> String {
    format!(
        "<!DOCTYPE html><html lang=\"en\"><head><meta charset=\"utf-8\">\
         <title>Configuration error</title></head><body>{}</body></html>",
        body
    )
}

pub fn render(query: &ConfigErrorQuery) -> String {
    let timestamp = query
        .timestamp
        .as_deref()
        .map(|t| format!("<p class=\"timestamp\">Detected at {}</p>", escape_html(t)))
        .unwrap_or_default();

    if query.is_production() {
        return page(&format!(
            "<h1>Service temporarily unavailable</h1>\
             <p>The application is not configured correctly. \
             The administrators have been notified; please try again later.</p>{}",
            timestamp
        ));
    }

    let errors = parse_list(query.errors.as_deref());
    let warnings = parse_list(query.warnings.as_deref());
    page(&format!(
        "<h1>Configuration error</h1>\
         <p>The environment failed validation. Fix the issues below and restart the server.</p>\
         {}{}{}\
         <p>Run <code>envgate-check</code> for a full report.</p>",
        list_section("Errors", "errors", &errors),
        list_section("Warnings", "warnings", &warnings),
        timestamp
    ))
}

pub async fn config_error_page(Query(query): Query<ConfigErrorQuery>) -> impl IntoResponse {
    (StatusCode::SERVICE_UNAVAILABLE, Html(render(&query)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_list() {
        assert_eq!(parse_list(Some(r#"["a","b"]"#)), vec!["a", "b"]);
        assert_eq!(parse_list(Some("not json")), vec!["not json"]);
        assert!(parse_list(None).is_empty());
        assert!(parse_list(Some("")).is_empty());
    }

    #[test]
    fn test_development_page_lists_everything() {
        let query = ConfigErrorQuery {
            errors: Some(r#"["DATABASE_URL is required but not set"]"#.to_string()),
            warnings: Some(r#"["STRIPE_SECRET looks like a secret"]"#.to_string()),
            production: Some("false".to_string()),
            timestamp: Some("2025-01-01T00:00:00Z".to_string()),
        };
        let html = render(&query);
        assert!(html.contains("Errors (1)"));
        assert!(html.contains("DATABASE_URL is required but not set"));
        assert!(html.contains("STRIPE_SECRET"));
        assert!(html.contains("2025-01-01T00:00:00Z"));
    }

    #[test]
    fn test_production_page_is_generic() {
        let query = ConfigErrorQuery {
            errors: Some(r#"["NEXTAUTH_SECRET must be at least 32 characters"]"#.to_string()),
            production: Some("true".to_string()),
            ..Default::default()
        };
        let html = render(&query);
        assert!(html.contains("temporarily unavailable"));
        assert!(!html.contains("NEXTAUTH_SECRET"));
    }

    #[test]
    fn test_messages_are_escaped() {
        let query = ConfigErrorQuery {
            errors: Some(r#"["<script>alert('x') & \"y\"</script>"]"#.to_string()),
            ..Default::default()
        };
        let html = render(&query);
        assert!(!html.contains("<script>"));
        assert!(html.contains(
            "&lt;script&gt;alert(&#39;x&#39;) &amp; &quot;y&quot;&lt;/script&gt;"
        ));
    }
}
