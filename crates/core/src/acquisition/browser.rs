//! Embedded browser strategy
//!
//! Last resort of the standard chain: loads the authorize page and waits
//! for the redirect. Needs network access.

use std::sync::Arc;

use grantflow_domain::constants::{
    PARAM_CLIENT_ID, PARAM_REDIRECT_URI, PARAM_RESPONSE_TYPE, RESPONSE_TYPE_CODE,
};
use grantflow_domain::GrantRequest;
use url::Url;

use super::ports::{BrowserFlow, BrowserOutcome};
use super::strategy::{AcquisitionStrategy, Launch, StrategyOutcome};

/// Strategy driving a [`BrowserFlow`] through the authorize endpoint
pub struct EmbeddedBrowserStrategy {
    browser: Arc<dyn BrowserFlow>,
    authorize_url: String,
}

impl EmbeddedBrowserStrategy {
    /// Create a strategy for the given authorize endpoint
    #[must_use]
    pub fn new(browser: Arc<dyn BrowserFlow>, authorize_url: impl Into<String>) -> Self {
        Self { browser, authorize_url: authorize_url.into() }
    }

    /// Full authorize URL for `request`
    ///
    /// # Errors
    /// Returns the parse error when the endpoint is not an absolute URL
    pub fn authorize_url_for(&self, request: &GrantRequest) -> Result<Url, url::ParseError> {
        let mut url = Url::parse(&self.authorize_url)?;
        url.query_pairs_mut()
            .append_pair(PARAM_CLIENT_ID, &request.app_key)
            .append_pair(PARAM_REDIRECT_URI, &request.redirect_uri)
            .append_pair(PARAM_RESPONSE_TYPE, RESPONSE_TYPE_CODE);
        Ok(url)
    }
}

impl AcquisitionStrategy for EmbeddedBrowserStrategy {
    fn name(&self) -> &'static str {
        "embedded-browser"
    }

    fn requires_network(&self) -> bool {
        true
    }

    fn try_acquire(&self, request: &GrantRequest) -> Launch {
        let url = match self.authorize_url_for(request) {
            Ok(url) => url,
            Err(e) => {
                return Launch::ready(StrategyOutcome::Error(format!(
                    "invalid authorize url {}: {e}",
                    self.authorize_url
                )));
            }
        };

        match self.browser.open(&url, &request.redirect_uri) {
            Ok(flow) => Launch::pending(async move {
                match flow.await {
                    BrowserOutcome::Redirected(redirect_url) => {
                        StrategyOutcome::Success(redirect_url)
                    }
                    BrowserOutcome::Dismissed => {
                        StrategyOutcome::Cancel("user closed the login page".to_string())
                    }
                    BrowserOutcome::Failed(reason) => StrategyOutcome::Error(reason),
                }
            }),
            Err(reason) => Launch::ready(StrategyOutcome::Error(reason)),
        }
    }

    fn cancel(&self) {
        self.browser.dismiss();
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for acquisition::browser.
    use grantflow_domain::AppIdentity;

    use super::*;
    use crate::testing::FakeBrowser;

    const AUTHORIZE: &str = "https://auth.example.com/oauth/authorize";

    /// Validates `EmbeddedBrowserStrategy::authorize_url_for` for the query
    /// composition scenario.
    ///
    /// Assertions:
    /// - Confirms client id, redirect uri and response type are encoded.
    #[test]
    fn test_authorize_url_carries_client_and_redirect() {
        let strategy = EmbeddedBrowserStrategy::new(Arc::new(FakeBrowser::new()), AUTHORIZE);
        let request = AppIdentity::new("abc").unwrap().grant_request();

        let url = strategy.authorize_url_for(&request).unwrap();
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();

        assert_eq!(url.path(), "/oauth/authorize");
        assert_eq!(
            pairs,
            vec![
                ("client_id".to_string(), "abc".to_string()),
                ("redirect_uri".to_string(), "grantflowabc://oauth".to_string()),
                ("response_type".to_string(), "code".to_string()),
            ]
        );
    }

    /// Validates `EmbeddedBrowserStrategy::try_acquire` for the browser
    /// outcome mapping scenario.
    ///
    /// Assertions:
    /// - Confirms a redirect maps to `Success`.
    /// - Confirms a dismissal maps to `Cancel`.
    /// - Confirms a browser failure maps to `Error`.
    #[tokio::test]
    async fn test_browser_outcomes_are_mapped() {
        let request = AppIdentity::new("abc").unwrap().grant_request();
        let cases = [
            (
                BrowserOutcome::Redirected("grantflowabc://oauth?code=C".into()),
                StrategyOutcome::Success("grantflowabc://oauth?code=C".into()),
            ),
            (
                BrowserOutcome::Dismissed,
                StrategyOutcome::Cancel("user closed the login page".into()),
            ),
            (BrowserOutcome::Failed("offline".into()), StrategyOutcome::Error("offline".into())),
        ];

        for (browser_outcome, expected) in cases {
            let browser = Arc::new(FakeBrowser::new());
            browser.queue_outcome(browser_outcome);
            let strategy = EmbeddedBrowserStrategy::new(browser.clone(), AUTHORIZE);

            let Launch::Pending(outcome) = strategy.try_acquire(&request) else {
                panic!("browser strategy is always pending");
            };
            assert_eq!(outcome.await, expected);
            assert_eq!(browser.opened_urls().len(), 1);
        }
    }

    /// Validates `EmbeddedBrowserStrategy::cancel` for the open browser
    /// scenario.
    ///
    /// Assertions:
    /// - Ensures cancel dismisses the browser and the flow resolves to
    ///   `Cancel`.
    #[tokio::test]
    async fn test_cancel_dismisses_browser() {
        let browser = Arc::new(FakeBrowser::new());
        let strategy = EmbeddedBrowserStrategy::new(browser.clone(), AUTHORIZE);
        let request = AppIdentity::new("abc").unwrap().grant_request();

        let Launch::Pending(outcome) = strategy.try_acquire(&request) else {
            panic!("browser strategy is always pending");
        };
        strategy.cancel();

        assert!(matches!(outcome.await, StrategyOutcome::Cancel(_)));
        assert_eq!(browser.dismiss_count(), 1);
    }
}
