//! Source page snapshot and "last updated" date extraction.

use chrono::NaiveDate;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use crate::error::{DateParseError, InvalidSelector, SourceUnavailable};

/// Element wrapping the "last updated" notice. Only the first match is used.
pub const DEFAULT_DATE_SELECTOR: &str = ".last-updated";

/// The date sits in the first child of the first child of the notice.
pub const DEFAULT_CHILD_DEPTH: usize = 2;

/// Human-readable date as printed on the page, e.g. `10 March 2021`.
pub const DEFAULT_DATE_FORMAT: &str = "%d %B %Y";

/// Parsed source page as it was when it was retrieved.
pub struct PageSnapshot {
    html: Html,
}

impl PageSnapshot {
    pub fn parse(html: &str) -> Self {
        Self {
            html: Html::parse_document(html),
        }
    }
}

/// Where the "last updated" date lives on the page and how it is written.
///
/// The first element matching `selector` is located, then its first element
/// child is followed `child_depth` times.
#[derive(Clone, Debug)]
pub struct ExtractionRule {
    selector_source: String,
    selector: Selector,
    child_depth: usize,
    format: String,
}

impl ExtractionRule {
    pub fn new(selector: &str, child_depth: usize, format: &str) -> Result<Self, InvalidSelector> {
        let parsed = Selector::parse(selector).map_err(|e| InvalidSelector {
            selector: selector.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            selector_source: selector.to_string(),
            selector: parsed,
            child_depth,
            format: format.to_string(),
        })
    }

    pub fn selector(&self) -> &str {
        &self.selector_source
    }

    pub fn child_depth(&self) -> usize {
        self.child_depth
    }

    pub fn format(&self) -> &str {
        &self.format
    }
}

impl Default for ExtractionRule {
    fn default() -> Self {
        Self::new(DEFAULT_DATE_SELECTOR, DEFAULT_CHILD_DEPTH, DEFAULT_DATE_FORMAT)
            .expect("default date selector")
    }
}

/// Reads the page-reported "last updated" date from `snapshot`.
pub fn extract(snapshot: &PageSnapshot, rule: &ExtractionRule) -> Result<NaiveDate, DateParseError> {
    let missing = || DateParseError::MissingElement {
        selector: rule.selector_source.clone(),
        depth: rule.child_depth,
    };

    let mut element = snapshot.html.select(&rule.selector).next().ok_or_else(missing)?;
    for _ in 0..rule.child_depth {
        element = first_element_child(element).ok_or_else(missing)?;
    }

    let raw: String = element.text().collect();
    let text = raw.split_whitespace().collect::<Vec<_>>().join(" ");

    NaiveDate::parse_from_str(&text, &rule.format).map_err(|source| DateParseError::InvalidDate {
        text,
        format: rule.format.clone(),
        source,
    })
}

fn first_element_child(element: ElementRef<'_>) -> Option<ElementRef<'_>> {
    element.children().find_map(ElementRef::wrap)
}

/// Retrieves and parses the source page. Any failure means the source is
/// unavailable for this cycle.
pub async fn fetch_snapshot(client: &Client, url: &str) -> Result<PageSnapshot, SourceUnavailable> {
    let unavailable = |reason: String| SourceUnavailable {
        url: url.to_string(),
        reason,
    };

    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| unavailable(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        return Err(unavailable(format!("status {}", status)));
    }

    let body = response.text().await.map_err(|e| unavailable(e.to_string()))?;
    debug!(url, bytes = body.len(), "retrieved source page");

    Ok(PageSnapshot::parse(&body))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{client, refused_url, serve};

    const PAGE: &str = r#"
        <html><body>
          <div class="last-updated">
            <p>Last updated: <span>
              10   March
              2021
            </span></p>
          </div>
        </body></html>"#;

    #[test]
    fn test_extract_default_rule() {
        let snapshot = PageSnapshot::parse(PAGE);
        let date = extract(&snapshot, &ExtractionRule::default()).unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2021, 3, 10).unwrap());
    }

    #[test]
    fn test_extract_single_digit_day() {
        let snapshot = PageSnapshot::parse(
            r#"<div class="last-updated"><p><strong>9 March 2021</strong></p></div>"#,
        );
        let date = extract(&snapshot, &ExtractionRule::default()).unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2021, 3, 9).unwrap());
    }

    #[test]
    fn test_extract_missing_element() {
        let snapshot = PageSnapshot::parse("<html><body><p>nothing here</p></body></html>");
        let err = extract(&snapshot, &ExtractionRule::default()).unwrap_err();
        match err {
            DateParseError::MissingElement { selector, .. } => {
                assert_eq!(selector, DEFAULT_DATE_SELECTOR)
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_extract_malformed_date() {
        let snapshot = PageSnapshot::parse(
            r#"<div class="last-updated"><p><strong>N/A</strong></p></div>"#,
        );
        let err = extract(&snapshot, &ExtractionRule::default()).unwrap_err();
        match err {
            DateParseError::InvalidDate { text, .. } => assert_eq!(text, "N/A"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_extract_custom_rule() {
        let snapshot = PageSnapshot::parse(r#"<time id="updated">2021-03-10</time>"#);
        let rule = ExtractionRule::new("#updated", 0, "%Y-%m-%d").unwrap();
        assert_eq!(rule.selector(), "#updated");
        assert_eq!(rule.child_depth(), 0);
        assert_eq!(rule.format(), "%Y-%m-%d");

        let date = extract(&snapshot, &rule).unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2021, 3, 10).unwrap());
    }

    #[test]
    fn test_extract_uses_only_first_notice() {
        let snapshot = PageSnapshot::parse(
            r#"<div class="last-updated"><p>pending</p></div>
               <div class="last-updated"><p><strong>10 March 2021</strong></p></div>"#,
        );
        let err = extract(&snapshot, &ExtractionRule::default()).unwrap_err();
        match err {
            DateParseError::MissingElement { depth, .. } => assert_eq!(depth, DEFAULT_CHILD_DEPTH),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_extract_skips_text_before_first_child() {
        let snapshot = PageSnapshot::parse(
            r#"<div class="last-updated">Updated <p>on <strong>10 March 2021</strong></p></div>"#,
        );
        let date = extract(&snapshot, &ExtractionRule::default()).unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2021, 3, 10).unwrap());
    }

    #[test]
    fn test_invalid_selector() {
        let err = ExtractionRule::new("div[", DEFAULT_CHILD_DEPTH, DEFAULT_DATE_FORMAT).unwrap_err();
        assert_eq!(err.selector, "div[");
    }

    #[tokio::test]
    async fn test_fetch_snapshot() {
        let server = serve(200, PAGE).await;
        let snapshot = fetch_snapshot(&client(), &server.url).await.unwrap();
        let date = extract(&snapshot, &ExtractionRule::default()).unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2021, 3, 10).unwrap());
    }

    #[tokio::test]
    async fn test_fetch_snapshot_error_status() {
        let server = serve(404, "not found").await;
        let err = fetch_snapshot(&client(), &server.url).await.err().unwrap();
        assert_eq!(err.reason, "status 404 Not Found");
    }

    #[tokio::test]
    async fn test_fetch_snapshot_unreachable() {
        let url = refused_url().await;
        assert!(fetch_snapshot(&client(), &url).await.is_err());
    }
}
