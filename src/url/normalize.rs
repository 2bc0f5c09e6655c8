use crate::UrlError;
use url::Url;

/// Returns `true` for the schemes the crawler can verify
pub fn is_supported_scheme(url: &Url) -> bool {
    matches!(url.scheme(), "http" | "https")
}

/// Removes the fragment from a URL
///
/// # Examples
///
/// ```
/// use linkscout::url::strip_fragment;
/// use url::Url;
///
/// let url = strip_fragment(Url::parse("http://x.com/a#frag").unwrap());
/// assert_eq!(url.fragment(), None);
/// assert_eq!(url.as_str(), "http://x.com/a");
/// ```
pub fn strip_fragment(mut url: Url) -> Url {
    if url.fragment().is_some() {
        url.set_fragment(None);
    }
    url
}

/// Resolves a raw URL string against an optional parent
///
/// Absolute input is parsed as is; relative input is joined onto `parent`.
/// The fragment is always stripped from the result.
pub fn resolve_url(raw: &str, parent: Option<&Url>) -> Result<Url, UrlError> {
    let raw = raw.trim();
    match Url::parse(raw) {
        Ok(url) => Ok(strip_fragment(url)),
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            let parent = parent.ok_or_else(|| UrlError::Orphaned(raw.to_string()))?;
            parent
                .join(raw)
                .map(strip_fragment)
                .map_err(|e| UrlError::Parse(e.to_string()))
        }
        Err(e) => Err(UrlError::Parse(e.to_string())),
    }
}

/// Normalizes a URL into the key used for deduplication
///
/// # Normalization Steps
///
/// 1. Parse the URL; reject if malformed or relative
/// 2. Reject schemes other than `http` and `https`
/// 3. Reject URLs without a host
/// 4. Remove fragment (everything after #)
///
/// Host lowercasing, default port removal and the empty path becoming `/`
/// come from URL parsing itself.
///
/// # Examples
///
/// ```
/// use linkscout::url::normalize_url;
///
/// let url = normalize_url("http://EXAMPLE.com/a#section").unwrap();
/// assert_eq!(url.as_str(), "http://example.com/a");
/// ```
pub fn normalize_url(url_str: &str) -> Result<Url, UrlError> {
    let url = Url::parse(url_str.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;

    if !is_supported_scheme(&url) {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    if url.host_str().is_none() {
        return Err(UrlError::MissingHost);
    }

    Ok(strip_fragment(url))
}
