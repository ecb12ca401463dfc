//! Platform ports used by the built-in strategies
//!
//! The companion app and the embedded browser are owned by the host
//! platform; strategies only see these narrow interfaces.

use futures::future::BoxFuture;
use grantflow_domain::constants::COMPANION_PROTOCOL_VERSION;
use grantflow_domain::GrantRequest;
use url::Url;

/// Which companion login flow to launch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompanionMode {
    /// The user is already signed in to the companion app
    SignedIn,
    /// The companion app asks for an account first
    SignedOut,
}

/// Installed companion package as reported by the platform
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageInfo {
    pub package_name: String,
    pub version_code: u32,
    /// DER-encoded signing certificates
    pub signing_certificates: Vec<Vec<u8>>,
}

/// Parameters handed to the companion app
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompanionLaunch {
    pub mode: CompanionMode,
    pub protocol_version: u32,
    pub app_key: String,
    pub redirect_uri: String,
}

impl CompanionLaunch {
    #[must_use]
    pub fn new(mode: CompanionMode, request: &GrantRequest) -> Self {
        Self {
            mode,
            protocol_version: COMPANION_PROTOCOL_VERSION,
            app_key: request.app_key.clone(),
            redirect_uri: request.redirect_uri.clone(),
        }
    }
}

/// Result code of a companion activity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyStatus {
    Ok,
    Canceled,
    Other(i32),
}

/// Data returned by the companion app
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompanionReply {
    pub status: ReplyStatus,
    pub protocol_version: Option<u32>,
    pub redirect_url: Option<String>,
    pub error_type: Option<String>,
    pub error_description: Option<String>,
}

impl CompanionReply {
    /// Successful reply carrying a redirect URL
    #[must_use]
    pub fn redirect(url: impl Into<String>) -> Self {
        Self {
            status: ReplyStatus::Ok,
            protocol_version: Some(COMPANION_PROTOCOL_VERSION),
            redirect_url: Some(url.into()),
            error_type: None,
            error_description: None,
        }
    }

    /// OK reply describing an error
    #[must_use]
    pub fn error(error_type: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            status: ReplyStatus::Ok,
            protocol_version: Some(COMPANION_PROTOCOL_VERSION),
            redirect_url: None,
            error_type: Some(error_type.into()),
            error_description: Some(description.into()),
        }
    }

    #[must_use]
    pub fn with_status(status: ReplyStatus) -> Self {
        Self {
            status,
            protocol_version: None,
            redirect_url: None,
            error_type: None,
            error_description: None,
        }
    }
}

/// Bridge to the companion app
pub trait CompanionApp: Send + Sync {
    /// Package able to serve `mode`, if installed
    fn installed_package(&self, mode: CompanionMode) -> Option<PackageInfo>;

    /// Start the companion activity
    ///
    /// The future resolves to `None` when the activity returned no data.
    ///
    /// # Errors
    /// Returns a reason when the activity could not be started
    fn launch(
        &self,
        launch: CompanionLaunch,
    ) -> Result<BoxFuture<'static, Option<CompanionReply>>, String>;

    /// Abort a running activity
    fn cancel(&self, mode: CompanionMode);
}

/// Result of an embedded browser flow
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrowserOutcome {
    /// The browser reached the redirect URI
    Redirected(String),
    /// The user closed the browser
    Dismissed,
    Failed(String),
}

/// Bridge to an embedded browser able to follow the authorize page
pub trait BrowserFlow: Send + Sync {
    /// Load `authorize_url` and stop at the first navigation to
    /// `redirect_uri`
    ///
    /// # Errors
    /// Returns a reason when the browser could not be shown
    fn open(
        &self,
        authorize_url: &Url,
        redirect_uri: &str,
    ) -> Result<BoxFuture<'static, BrowserOutcome>, String>;

    /// Close the browser; the pending flow resolves to `Dismissed`
    fn dismiss(&self);
}
