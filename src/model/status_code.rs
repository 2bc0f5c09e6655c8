use serde::{Serialize, Serializer};
use std::fmt;

/// Outcome code of a resource
///
/// Codes in the -1xx range are assigned while parsing a discovered URL and
/// mean the resource never reached verification. Verification sets either an
/// HTTP code or [`StatusCode::Unreachable`] when no response came back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StatusCode {
    /// The raw URL could not be resolved to an absolute URI
    MalformedUri,
    /// The URI resolved but its scheme is neither http nor https
    UriSchemeNotSupported,
    /// A relative URL was found with no parent to resolve it against
    OrphanedUri,
    /// No HTTP response: the host did not resolve, refused the connection or
    /// redirected too many times
    Unreachable,
    /// Not verified yet
    #[default]
    Unverified,
    /// HTTP status returned by verification
    Http(u16),
}

impl StatusCode {
    /// Returns true for codes assigned while parsing the raw URL
    pub fn is_parse_error(&self) -> bool {
        matches!(
            self,
            Self::MalformedUri | Self::UriSchemeNotSupported | Self::OrphanedUri
        )
    }

    /// Returns true if the resource should be reported as broken
    ///
    /// Unsupported schemes (mailto:, tel:, ...) are skipped rather than broken.
    pub fn is_broken(&self) -> bool {
        match self {
            Self::MalformedUri | Self::OrphanedUri | Self::Unreachable => true,
            Self::UriSchemeNotSupported | Self::Unverified => false,
            Self::Http(code) => *code >= 400,
        }
    }

    /// Numeric representation, negative when no HTTP code applies and 0 when unverified
    pub fn as_i32(&self) -> i32 {
        match self {
            Self::MalformedUri => -100,
            Self::UriSchemeNotSupported => -101,
            Self::OrphanedUri => -102,
            Self::Unreachable => -200,
            Self::Unverified => 0,
            Self::Http(code) => i32::from(*code),
        }
    }
}

impl From<u16> for StatusCode {
    fn from(code: u16) -> Self {
        Self::Http(code)
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Http(code) => write!(f, "{}", code),
            other => write!(f, "{:?} ({})", other, other.as_i32()),
        }
    }
}

impl Serialize for StatusCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i32(self.as_i32())
    }
}
