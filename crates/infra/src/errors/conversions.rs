//! Conversions from external infrastructure errors into domain errors.

use grantflow_common::KeychainError;
use grantflow_domain::{ExchangeError, GrantflowError, TokenCacheError};
use reqwest::Error as ReqwestError;

use super::HttpError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub GrantflowError);

impl From<InfraError> for GrantflowError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<GrantflowError> for InfraError {
    fn from(value: GrantflowError) -> Self {
        Self(value)
    }
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → HttpError */
/* -------------------------------------------------------------------------- */

impl From<ReqwestError> for HttpError {
    fn from(err: ReqwestError) -> Self {
        if err.is_timeout() {
            return Self::Timeout;
        }

        if err.is_builder() {
            return Self::Builder(err.to_string());
        }

        #[cfg(not(target_arch = "wasm32"))]
        if err.is_connect() {
            return Self::Connect(err.to_string());
        }

        if err.is_decode() {
            return Self::Decode(err.to_string());
        }

        if let Some(status) = err.status() {
            return Self::Status {
                status: status.as_u16(),
                message: status.canonical_reason().unwrap_or("unknown status").to_string(),
            };
        }

        Self::Request(err.to_string())
    }
}

/* -------------------------------------------------------------------------- */
/* HttpError → domain */
/* -------------------------------------------------------------------------- */

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        match value {
            HttpError::Builder(message) => Self(GrantflowError::MissConfiguration(message)),
            other => Self(GrantflowError::AuthorizationFailed(other.to_string())),
        }
    }
}

impl HttpError {
    /// Completion error of an exchange that failed in transport
    #[must_use]
    pub fn into_exchange_error(self, refresh: bool) -> ExchangeError {
        match self {
            Self::Decode(message) => ExchangeError::invalid_response(message, refresh),
            other => ExchangeError::transport(other.to_string(), refresh),
        }
    }
}

/* -------------------------------------------------------------------------- */
/* KeychainError → TokenCacheError */
/* -------------------------------------------------------------------------- */

/// Conversion of secret store failures into cache failures
pub trait IntoCacheError {
    fn into_cache_error(self) -> TokenCacheError;
}

impl IntoCacheError for KeychainError {
    fn into_cache_error(self) -> TokenCacheError {
        match self {
            Self::AccessFailed(message) => TokenCacheError::Unavailable(message),
            Self::NotFound => TokenCacheError::Unavailable("keychain entry not found".into()),
        }
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */

#[cfg(test)]
mod tests {
    //! Unit tests for errors::conversions.
    use reqwest::{Client, StatusCode};
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    /// Validates `HttpError` conversion for the error status scenario.
    ///
    /// Assertions:
    /// - Confirms the status code is kept.
    /// - Confirms the exchange error is a transport error for a refresh.
    #[tokio::test]
    async fn test_status_error_maps_to_transport() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(StatusCode::SERVICE_UNAVAILABLE))
            .mount(&server)
            .await;

        let client = Client::builder().no_proxy().build().unwrap();
        let error = client.get(server.uri()).send().await.unwrap().error_for_status().unwrap_err();

        let mapped = HttpError::from(error);
        assert!(matches!(mapped, HttpError::Status { status: 503, .. }));

        let exchange = mapped.into_exchange_error(true);
        assert_eq!(exchange.kind, grantflow_domain::ExchangeErrorKind::Transport);
        assert!(exchange.refresh);
    }

    /// Validates `InfraError` conversion for the builder failure scenario.
    ///
    /// Assertions:
    /// - Ensures builder errors surface as `MISS_CONFIGURATION`.
    #[test]
    fn test_builder_error_is_miss_configuration() {
        let mapped: GrantflowError =
            InfraError::from(HttpError::Builder("bad proxy".into())).into();
        assert!(matches!(mapped, GrantflowError::MissConfiguration(_)));
    }

    /// Validates `KeychainError` conversion for the locked keychain scenario.
    ///
    /// Assertions:
    /// - Ensures access failures become `Unavailable`.
    #[test]
    fn test_keychain_access_failure_is_unavailable() {
        let mapped = KeychainError::AccessFailed("locked".into()).into_cache_error();
        assert_eq!(mapped, TokenCacheError::Unavailable("locked".into()));
    }
}
