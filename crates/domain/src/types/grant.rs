//! Single-use authorization code

use serde::{Deserialize, Serialize};
use url::Url;

use crate::constants::PARAM_CODE;

/// Authorization code obtained from an acquisition strategy
///
/// Consumed by exactly one code exchange, then cleared.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grant {
    code: String,
}

impl Grant {
    #[must_use]
    pub fn new(code: impl Into<String>) -> Self {
        Self { code: code.into() }
    }

    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Extract the `code` query parameter of a redirect URL
    ///
    /// Returns an empty grant when the URL cannot be parsed or carries no code.
    #[must_use]
    pub fn from_redirect_url(redirect_url: &str) -> Self {
        Url::parse(redirect_url)
            .ok()
            .and_then(|url| {
                url.query_pairs()
                    .find(|(key, _)| key == PARAM_CODE)
                    .map(|(_, value)| value.into_owned())
            })
            .map_or_else(Self::empty, Self::new)
    }

    #[must_use]
    pub fn is_present(&self) -> bool {
        !self.code.is_empty()
    }

    #[must_use]
    pub fn code(&self) -> &str {
        &self.code
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for types::grant.
    use super::*;

    /// Validates `Grant::from_redirect_url` behavior for custom-scheme
    /// redirects.
    ///
    /// Assertions:
    /// - Confirms the code parameter is extracted and percent-decoded.
    /// - Ensures a redirect without a code yields an absent grant.
    /// - Ensures an unparsable URL yields an absent grant.
    #[test]
    fn test_from_redirect_url() {
        let grant = Grant::from_redirect_url("grantflowabc://oauth?state=x&code=a%2Fb");
        assert!(grant.is_present());
        assert_eq!(grant.code(), "a/b");

        assert!(!Grant::from_redirect_url("grantflowabc://oauth?error=denied").is_present());
        assert!(!Grant::from_redirect_url("not a url").is_present());
        assert!(!Grant::from_redirect_url("grantflowabc://oauth?code=").is_present());
    }
}
