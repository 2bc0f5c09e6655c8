use crate::model::StatusCode;
use crate::url::{is_supported_scheme, resolve_url, strip_fragment};
use crate::UrlError;
use serde::Serialize;
use url::Url;

/// Kind of content a resource turned out to be
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum ResourceType {
    Html,
    Css,
    Script,
    Image,
    Audio,
    Video,
    Font,
    Other,
    #[default]
    Unknown,
}

impl ResourceType {
    /// Derives the resource type from a `Content-Type` header value
    pub fn from_content_type(content_type: &str) -> Self {
        let mime = content_type
            .split(';')
            .next()
            .unwrap_or("")
            .trim()
            .to_ascii_lowercase();

        match mime.as_str() {
            "" => Self::Unknown,
            "text/html" | "application/xhtml+xml" => Self::Html,
            "text/css" => Self::Css,
            "application/javascript" | "application/ecmascript" | "text/javascript" => {
                Self::Script
            }
            m if m.starts_with("image/") => Self::Image,
            m if m.starts_with("audio/") => Self::Audio,
            m if m.starts_with("video/") => Self::Video,
            m if m.starts_with("font/") => Self::Font,
            _ => Self::Other,
        }
    }
}

/// A discovered URL under evaluation
///
/// Construction never fails: a raw URL that cannot be resolved to an absolute
/// http/https URI is encoded in `status_code` instead. `uri` and
/// `original_uri` never carry a fragment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Resource {
    id: u64,
    original_url: String,
    original_uri: Option<Url>,
    uri: Option<Url>,
    parent_uri: Option<Url>,
    is_extracted_from_html_document: bool,

    /// Whether the resource lives on the crawled site
    pub is_internal: bool,
    pub resource_type: ResourceType,
    /// Size in bytes, when known
    pub size: Option<u64>,
    pub status_code: StatusCode,
}

impl Resource {
    /// Creates a resource from a raw URL as it was discovered
    ///
    /// # Arguments
    ///
    /// * `id` - Unique, monotonically increasing id
    /// * `original_url` - The raw string as discovered
    /// * `parent_uri` - URI of the document the URL was found in (none for the seed)
    /// * `is_extracted_from_html_document` - Whether it came from an anchor
    ///
    /// # Example
    ///
    /// ```
    /// use linkscout::{Resource, StatusCode};
    ///
    /// let resource = Resource::new(1, "http://x.com/a#frag", None, false);
    /// assert_eq!(resource.uri().unwrap().as_str(), "http://x.com/a");
    /// assert_eq!(resource.status_code, StatusCode::Unverified);
    ///
    /// let orphan = Resource::new(2, "/relative", None, true);
    /// assert_eq!(orphan.status_code, StatusCode::OrphanedUri);
    /// ```
    pub fn new(
        id: u64,
        original_url: &str,
        parent_uri: Option<&Url>,
        is_extracted_from_html_document: bool,
    ) -> Self {
        let mut status_code = StatusCode::Unverified;
        let original_uri = match resolve_url(original_url, parent_uri) {
            Ok(uri) => {
                if !is_supported_scheme(&uri) {
                    status_code = StatusCode::UriSchemeNotSupported;
                }
                Some(uri)
            }
            Err(UrlError::Orphaned(_)) => {
                status_code = StatusCode::OrphanedUri;
                None
            }
            Err(_) => {
                status_code = StatusCode::MalformedUri;
                None
            }
        };

        Self {
            id,
            original_url: original_url.to_string(),
            uri: original_uri.clone(),
            original_uri,
            parent_uri: parent_uri.cloned().map(strip_fragment),
            is_extracted_from_html_document,
            is_internal: false,
            resource_type: ResourceType::Unknown,
            size: None,
            status_code,
        }
    }

    /// Marks the resource as internal (builder style)
    pub fn internal(mut self) -> Self {
        self.is_internal = true;
        self
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// The raw string as discovered
    pub fn original_url(&self) -> &str {
        &self.original_url
    }

    /// The absolute URI the raw string resolved to
    pub fn original_uri(&self) -> Option<&Url> {
        self.original_uri.as_ref()
    }

    /// The current URI, differs from the original one after a redirect
    pub fn uri(&self) -> Option<&Url> {
        self.uri.as_ref()
    }

    pub fn parent_uri(&self) -> Option<&Url> {
        self.parent_uri.as_ref()
    }

    pub fn is_extracted_from_html_document(&self) -> bool {
        self.is_extracted_from_html_document
    }

    /// Replaces the current URI, stripping its fragment
    pub fn set_uri(&mut self, uri: Url) {
        self.uri = Some(strip_fragment(uri));
    }

    /// Returns true if the current URI differs from the original one
    pub fn redirected(&self) -> bool {
        self.uri != self.original_uri
    }

    /// Key under which the resource is deduplicated
    ///
    /// The original absolute URI without fragment; resources that never
    /// resolved fall back to their trimmed raw string.
    pub fn dedup_key(&self) -> &str {
        match &self.original_uri {
            Some(uri) => uri.as_str(),
            None => self.original_url.trim(),
        }
    }
}
