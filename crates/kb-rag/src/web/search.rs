//! HTML-scrape web search
//!
//! Queries a DuckDuckGo-style HTML results page (no API key) and pulls the
//! top organic result links out of it.

use scraper::{Html, Selector};
use std::time::Duration;
use tracing::debug;

use crate::config::WebConfig;
use crate::error::{Error, Result};

/// Finds result URLs for a search query
pub struct WebSearcher {
    client: reqwest::Client,
    endpoint: String,
    max_results: usize,
}

impl WebSearcher {
    pub fn new(config: &WebConfig) -> Self {
        let client = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_default();
        Self {
            client,
            endpoint: config.search_endpoint.clone(),
            max_results: config.max_results,
        }
    }

    /// Return up to `max_results` result URLs for `query`, best first.
    pub async fn search(&self, query: &str) -> Result<Vec<String>> {
        let url = format!("{}/?q={}", self.endpoint, urlencoding::encode(query));
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::fetch_failed(&url, e.to_string()))?;
        if !response.status().is_success() {
            return Err(Error::fetch_failed(
                &url,
                format!("search returned {}", response.status()),
            ));
        }
        let html = response
            .text()
            .await
            .map_err(|e| Error::fetch_failed(&url, e.to_string()))?;

        let urls = parse_result_links(&html, self.max_results);
        debug!(query, found = urls.len(), "web search complete");
        Ok(urls)
    }
}

/// Extract organic result links from a DuckDuckGo HTML results page.
///
/// Result anchors carry class `result__a`; their hrefs are redirect links
/// with the real target URL-encoded in a `uddg` query parameter. Direct
/// http(s) hrefs are accepted as-is.
fn parse_result_links(html: &str, max: usize) -> Vec<String> {
    let document = Html::parse_document(html);
    let selector = match Selector::parse("a.result__a") {
        Ok(s) => s,
        Err(_) => return Vec::new(),
    };

    let mut urls = Vec::new();
    for anchor in document.select(&selector) {
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        if let Some(target) = resolve_redirect(href) {
            if !urls.contains(&target) {
                urls.push(target);
            }
        }
        if urls.len() >= max {
            break;
        }
    }
    urls
}

fn resolve_redirect(href: &str) -> Option<String> {
    if let Some(pos) = href.find("uddg=") {
        let encoded = &href[pos + 5..];
        let encoded = encoded.split('&').next().unwrap_or(encoded);
        return urlencoding::decode(encoded).ok().map(|s| s.into_owned());
    }
    if href.starts_with("http://") || href.starts_with("https://") {
        return Some(href.to_string());
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const RESULTS_PAGE: &str = r#"
        <html><body>
        <div class="result">
            <a class="result__a" href="//duckduckgo.com/l/?uddg=https%3A%2F%2Fexample.com%2Fone&rut=abc">One</a>
        </div>
        <div class="result">
            <a class="result__a" href="https://example.com/two">Two</a>
        </div>
        <div class="result">
            <a class="result__a" href="https://example.com/three">Three</a>
        </div>
        <a href="https://example.com/not-a-result">skip me</a>
        </body></html>
    "#;

    #[test]
    fn parses_redirect_and_direct_links() {
        let urls = parse_result_links(RESULTS_PAGE, 10);
        assert_eq!(
            urls,
            vec![
                "https://example.com/one".to_string(),
                "https://example.com/two".to_string(),
                "https://example.com/three".to_string(),
            ]
        );
    }

    #[test]
    fn respects_max_results() {
        let urls = parse_result_links(RESULTS_PAGE, 2);
        assert_eq!(urls.len(), 2);
    }

    #[test]
    fn no_results_yields_empty_vec() {
        assert!(parse_result_links("<html><body>nothing</body></html>", 3).is_empty());
    }
}
