//! Web search provider for live questions (variant A).

use async_trait::async_trait;
use pathway_core::{AppError, AppResult};
use std::time::Duration;

/// External search over the public web.
///
/// `Err` means the provider was unreachable; an empty result set is a
/// normal `Ok` outcome with an explanatory message.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    async fn search(&self, query: &str) -> AppResult<String>;
}

/// Scrapes the DuckDuckGo HTML endpoint. No API key required.
pub struct DuckDuckGoSearch {
    client: reqwest::Client,
    max_results: usize,
}

impl DuckDuckGoSearch {
    pub fn new(timeout: Duration) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent("Mozilla/5.0 (X11; Linux x86_64) pathway/0.1")
            .build()
            .map_err(|e| AppError::Other(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            max_results: 5,
        })
    }
}

#[async_trait]
impl SearchProvider for DuckDuckGoSearch {
    async fn search(&self, query: &str) -> AppResult<String> {
        tracing::info!("Web search: {}", query);

        let response = self
            .client
            .get("https://html.duckduckgo.com/html/")
            .query(&[("q", query)])
            .send()
            .await
            .map_err(|e| AppError::Other(format!("Web search request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::Other(format!(
                "Web search returned HTTP {}",
                response.status()
            )));
        }

        let html = response
            .text()
            .await
            .map_err(|e| AppError::Other(format!("Failed to read search response: {}", e)))?;

        let results = parse_results(&html, self.max_results);
        if results.is_empty() {
            return Ok(format!("No web results found for: {}", query));
        }
        Ok(results.join("\n\n"))
    }
}

/// Pull result titles and snippets out of the DuckDuckGo HTML page.
fn parse_results(html: &str, max_results: usize) -> Vec<String> {
    let mut results = Vec::new();
    let mut rest = html;

    while results.len() < max_results {
        let Some(anchor_start) = rest.find("result__a") else {
            break;
        };
        rest = &rest[anchor_start..];

        let Some(title) = extract_between(rest, ">", "</a>") else {
            break;
        };
        let snippet = rest
            .find("result__snippet")
            .and_then(|i| extract_between(&rest[i..], ">", "</a>"))
            .unwrap_or_default();

        let title = strip_tags(&title);
        let snippet = strip_tags(&snippet);
        if !title.trim().is_empty() {
            results.push(format!(
                "{}. {}\n   {}",
                results.len() + 1,
                title.trim(),
                snippet.trim()
            ));
        }

        // Advance past this result block
        match rest.find("</a>") {
            Some(i) => rest = &rest[i + 4..],
            None => break,
        }
    }

    results
}

fn extract_between(text: &str, start: &str, end: &str) -> Option<String> {
    let from = text.find(start)? + start.len();
    let to = text[from..].find(end)? + from;
    Some(text[from..to].to_string())
}

fn strip_tags(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut in_tag = false;
    for ch in html.chars() {
        match ch {
            '<' => in_tag = true,
            '>' => in_tag = false,
            c if !in_tag => out.push(c),
            _ => {}
        }
    }
    out.replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&#x27;", "'")
        .replace("&quot;", "\"")
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
        <a class="result__a" href="https://example.com">Visa <b>processing</b> times</a>
        <a class="result__snippet">Current processing is <b>8 weeks</b> for standard cases.</a>
        <a class="result__a" href="https://example.org">Office status</a>
        <a class="result__snippet">The office is open today.</a>
    "#;

    #[test]
    fn test_parse_results_extracts_title_and_snippet() {
        let results = parse_results(SAMPLE, 5);
        assert_eq!(results.len(), 2);
        assert!(results[0].contains("Visa processing times"));
        assert!(results[0].contains("8 weeks"));
        assert!(results[1].starts_with("2. Office status"));
    }

    #[test]
    fn test_parse_results_respects_limit() {
        let results = parse_results(SAMPLE, 1);
        assert_eq!(results.len(), 1);
    }

    #[test]
    fn test_parse_results_empty_page() {
        assert!(parse_results("<html><body>no results</body></html>", 5).is_empty());
    }

    #[test]
    fn test_strip_tags_and_entities() {
        assert_eq!(strip_tags("a <b>bold</b> &amp; plain"), "a bold & plain");
    }
}
