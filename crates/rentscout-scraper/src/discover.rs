//! Listing discovery on a broker's search-results page.
//!
//! Applies the broker's declarative CSS selector to the fetched page and
//! emits one [`RawListing`] per matching node, in document order. No
//! de-duplication happens here; the persistence layer upserts by URL.
//!
//! Parsing is synchronous on an already-fetched body so the parsed DOM is
//! never held across an await point.

use scraper::{Html, Selector};

use crate::error::ScraperError;

/// One listing node found on the results page. Transient: lives only for
/// the duration of a single scrape pass.
#[derive(Debug, Clone)]
pub struct RawListing {
    /// Full HTML subtree of the matched node.
    pub html_content: String,

    /// Detail URL from the first anchor in the node (or the node itself when
    /// it is an anchor). Possibly relative, possibly empty.
    pub listing_url: String,
}

/// Extracts listing fragments from a results-page body.
///
/// Returns listings in document order. A selector that matches nothing
/// yields an empty vector; the caller is responsible for archiving the raw
/// page body for operator inspection in that case.
///
/// # Errors
///
/// Returns [`ScraperError::Selector`] when `listing_selector` is not a valid
/// CSS selector.
pub fn discover_listings(
    page_html: &str,
    listing_selector: &str,
) -> Result<Vec<RawListing>, ScraperError> {
    let selector = Selector::parse(listing_selector).map_err(|e| ScraperError::Selector {
        selector: listing_selector.to_string(),
        reason: e.to_string(),
    })?;

    let anchor = Selector::parse("a").map_err(|e| ScraperError::Selector {
        selector: "a".to_string(),
        reason: e.to_string(),
    })?;

    let document = Html::parse_document(page_html);

    let listings = document
        .select(&selector)
        .map(|node| {
            let listing_url = if node.value().name() == "a" {
                node.value().attr("href").unwrap_or_default().to_string()
            } else {
                node.select(&anchor)
                    .find_map(|a| a.value().attr("href"))
                    .unwrap_or_default()
                    .to_string()
            };

            RawListing {
                html_content: node.html(),
                listing_url,
            }
        })
        .collect();

    Ok(listings)
}

#[cfg(test)]
mod tests {
    use super::*;

    const RESULTS_PAGE: &str = r#"
        <html><body>
          <div class="listing-card" id="one">
            <a href="/listing/1">Oudegracht 1</a>
            <span class="price">€1.250</span>
          </div>
          <div class="listing-card" id="two">
            <a href="https://yourhouse.example/listing/2">Biltstraat 2</a>
          </div>
          <div class="listing-card" id="three">
            <span>No link here</span>
          </div>
          <div class="other">not a listing</div>
        </body></html>
    "#;

    #[test]
    fn discovers_listings_in_document_order() {
        let listings = discover_listings(RESULTS_PAGE, "div.listing-card").unwrap();
        assert_eq!(listings.len(), 3);
        assert!(listings[0].html_content.contains("Oudegracht 1"));
        assert!(listings[1].html_content.contains("Biltstraat 2"));
        assert!(listings[2].html_content.contains("No link here"));
    }

    #[test]
    fn extracts_relative_and_absolute_anchor_urls() {
        let listings = discover_listings(RESULTS_PAGE, "div.listing-card").unwrap();
        assert_eq!(listings[0].listing_url, "/listing/1");
        assert_eq!(listings[1].listing_url, "https://yourhouse.example/listing/2");
    }

    #[test]
    fn missing_anchor_yields_empty_url() {
        let listings = discover_listings(RESULTS_PAGE, "div.listing-card").unwrap();
        assert_eq!(listings[2].listing_url, "");
    }

    #[test]
    fn anchor_selector_uses_own_href() {
        let page = r#"<ul><li><a class="item" href="/l/9">Nine</a></li></ul>"#;
        let listings = discover_listings(page, "a.item").unwrap();
        assert_eq!(listings.len(), 1);
        assert_eq!(listings[0].listing_url, "/l/9");
    }

    #[test]
    fn no_matches_returns_empty() {
        let listings = discover_listings(RESULTS_PAGE, "section.absent").unwrap();
        assert!(listings.is_empty());
    }

    #[test]
    fn invalid_selector_is_a_typed_error() {
        let result = discover_listings(RESULTS_PAGE, "div..broken");
        assert!(
            matches!(result, Err(ScraperError::Selector { ref selector, .. }) if selector == "div..broken"),
            "expected ScraperError::Selector, got: {result:?}"
        );
    }
}
