//! HTML parser for extracting links
//!
//! Every `<a href="...">` of a rendered document becomes a candidate
//! resource, resolved against the URI the document was served from.
//! Candidates are not filtered here beyond obviously unusable hrefs;
//! deduplication and scope belong to the coordinator and the verifiers.

use crate::crawler::{Extractor, HtmlDocument, IdGenerator};
use crate::model::Resource;
use scraper::{Html, Selector};
use std::sync::Arc;

/// Extracts anchor targets, assigning each a fresh id
pub struct AnchorExtractor {
    id_generator: Arc<IdGenerator>,
}

impl AnchorExtractor {
    pub fn new(id_generator: Arc<IdGenerator>) -> Self {
        Self { id_generator }
    }
}

impl Extractor for AnchorExtractor {
    /// # Link Extraction Rules
    ///
    /// **Include:**
    /// - `<a href="...">` anywhere in the document, relative or absolute
    /// - `mailto:`, `tel:` and other schemes (flagged as unsupported on
    ///   construction, so they are reported but never fetched)
    ///
    /// **Exclude:**
    /// - Empty or whitespace-only hrefs
    /// - `javascript:` pseudo links
    fn extract(&self, document: &HtmlDocument) -> Vec<Resource> {
        let Ok(selector) = Selector::parse("a[href]") else {
            return Vec::new();
        };
        let html = Html::parse_document(&document.text);

        html.select(&selector)
            .filter_map(|element| element.value().attr("href"))
            .map(str::trim)
            .filter(|href| is_followable(href))
            .map(|href| {
                Resource::new(
                    self.id_generator.next_id(),
                    href,
                    Some(&document.uri),
                    true,
                )
            })
            .collect()
    }
}

/// Returns false for hrefs that do not point at a resource
fn is_followable(href: &str) -> bool {
    if href.is_empty() {
        return false;
    }

    let is_javascript = href
        .get(..11)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("javascript:"));
    !is_javascript
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::StatusCode;
    use url::Url;

    fn document(text: &str) -> HtmlDocument {
        HtmlDocument {
            uri: Url::parse("https://example.com/docs/index.html").unwrap(),
            text: text.to_string(),
        }
    }

    fn extractor() -> AnchorExtractor {
        AnchorExtractor::new(Arc::new(IdGenerator::new()))
    }

    #[test]
    fn test_extract_relative_and_absolute() {
        let html = r#"
            <html>
            <body>
                <a href="/about">About</a>
                <a href="guide.html#install">Guide</a>
                <a href="https://other.com/page">External</a>
            </body>
            </html>
        "#;

        let resources = extractor().extract(&document(html));
        let uris: Vec<_> = resources
            .iter()
            .map(|r| r.uri().unwrap().as_str().to_string())
            .collect();

        assert_eq!(
            uris,
            vec![
                "https://example.com/about",
                "https://example.com/docs/guide.html",
                "https://other.com/page",
            ]
        );
        assert!(resources.iter().all(|r| r.is_extracted_from_html_document()));
        assert!(resources
            .iter()
            .all(|r| r.parent_uri().unwrap().as_str() == "https://example.com/docs/index.html"));
    }

    #[test]
    fn test_fresh_ids() {
        let html = r#"<a href="/a">A</a><a href="/a">A again</a>"#;
        let resources = extractor().extract(&document(html));

        let ids: Vec<_> = resources.iter().map(Resource::id).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn test_skips_javascript_and_empty() {
        let html = r#"
            <a href="javascript:void(0)">JS</a>
            <a href="JavaScript:alert(1)">JS</a>
            <a href="   ">Blank</a>
            <a>No href</a>
            <a href="/kept">Kept</a>
        "#;

        let resources = extractor().extract(&document(html));
        assert_eq!(resources.len(), 1);
        assert_eq!(resources[0].uri().unwrap().path(), "/kept");
    }

    #[test]
    fn test_unsupported_schemes_are_flagged() {
        let html = r#"<a href="mailto:someone@example.com">Mail</a>"#;
        let resources = extractor().extract(&document(html));

        assert_eq!(resources.len(), 1);
        assert_eq!(resources[0].status_code, StatusCode::UriSchemeNotSupported);
    }

    #[test]
    fn test_is_followable() {
        assert!(is_followable("/page"));
        assert!(is_followable("#top"));
        assert!(!is_followable(""));
        assert!(!is_followable("javascript:void(0)"));
    }
}
