//! Companion app strategy
//!
//! Delegates consent to an installed companion app. The package must be
//! recent enough and signed by a trusted certificate, otherwise the strategy
//! is not applicable and the chain moves on.

use std::sync::Arc;

use grantflow_common::fingerprint_matches;
use grantflow_domain::constants::{COMPANION_NOT_SUPPORTED_ERROR, COMPANION_PROTOCOL_VERSION};
use grantflow_domain::{CompanionConfig, GrantRequest};
use tracing::debug;

use super::ports::{
    CompanionApp, CompanionLaunch, CompanionMode, CompanionReply, PackageInfo, ReplyStatus,
};
use super::strategy::{AcquisitionStrategy, Launch, StrategyOutcome};

const USER_CANCELED_MESSAGE: &str =
    "pressed back button or cancel button during requesting authorization code";

/// Strategy launching the companion app in one [`CompanionMode`]
pub struct CompanionAppStrategy {
    mode: CompanionMode,
    app: Arc<dyn CompanionApp>,
    config: CompanionConfig,
}

impl CompanionAppStrategy {
    #[must_use]
    pub fn new(mode: CompanionMode, app: Arc<dyn CompanionApp>, config: CompanionConfig) -> Self {
        Self { mode, app, config }
    }

    #[must_use]
    pub fn signed_in(app: Arc<dyn CompanionApp>, config: CompanionConfig) -> Self {
        Self::new(CompanionMode::SignedIn, app, config)
    }

    #[must_use]
    pub fn signed_out(app: Arc<dyn CompanionApp>, config: CompanionConfig) -> Self {
        Self::new(CompanionMode::SignedOut, app, config)
    }

    #[must_use]
    pub fn mode(&self) -> CompanionMode {
        self.mode
    }

    fn verify(&self, package: &PackageInfo) -> Result<(), String> {
        if package.version_code < self.config.min_version_code {
            return Err(format!(
                "{} version {} is older than required {}",
                package.package_name, package.version_code, self.config.min_version_code
            ));
        }

        let trusted = package
            .signing_certificates
            .iter()
            .any(|certificate| fingerprint_matches(certificate, &self.config.trusted_fingerprints));
        if !trusted {
            return Err(format!("{} is not signed by a trusted certificate", package.package_name));
        }

        Ok(())
    }
}

impl AcquisitionStrategy for CompanionAppStrategy {
    fn name(&self) -> &'static str {
        match self.mode {
            CompanionMode::SignedIn => "companion-signed-in",
            CompanionMode::SignedOut => "companion-signed-out",
        }
    }

    fn try_acquire(&self, request: &GrantRequest) -> Launch {
        let Some(package) = self.app.installed_package(self.mode) else {
            return Launch::not_applicable("companion app is not installed");
        };

        if let Err(reason) = self.verify(&package) {
            debug!(strategy = self.name(), %reason, "Companion package rejected");
            return Launch::not_applicable(reason);
        }

        match self.app.launch(CompanionLaunch::new(self.mode, request)) {
            Ok(reply) => Launch::pending(async move { map_reply(reply.await) }),
            Err(reason) => Launch::not_applicable(reason),
        }
    }

    fn cancel(&self) {
        self.app.cancel(self.mode);
    }
}

/// Translate a companion reply into a strategy outcome
#[must_use]
pub fn map_reply(reply: Option<CompanionReply>) -> StrategyOutcome {
    let Some(reply) = reply else {
        return StrategyOutcome::Cancel(USER_CANCELED_MESSAGE.to_string());
    };

    match reply.status {
        ReplyStatus::Canceled => return StrategyOutcome::Cancel(USER_CANCELED_MESSAGE.to_string()),
        ReplyStatus::Other(code) => {
            return StrategyOutcome::Error(format!("got unexpected result code {code}"));
        }
        ReplyStatus::Ok => {}
    }

    if let Some(version) = reply.protocol_version {
        if version != COMPANION_PROTOCOL_VERSION {
            return StrategyOutcome::Error(format!(
                "mismatched protocol version: expected {COMPANION_PROTOCOL_VERSION}, got {version}"
            ));
        }
    }

    match (reply.redirect_url, reply.error_type) {
        (Some(url), None) if !url.is_empty() => StrategyOutcome::Success(url),
        (_, Some(error_type)) if error_type == COMPANION_NOT_SUPPORTED_ERROR => {
            StrategyOutcome::Pass
        }
        (url, error_type) => StrategyOutcome::Error(format!(
            "redirectURL={}, {} : {}",
            url.unwrap_or_default(),
            error_type.unwrap_or_default(),
            reply.error_description.unwrap_or_default()
        )),
    }
}
