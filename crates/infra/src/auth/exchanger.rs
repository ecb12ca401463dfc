//! Token endpoint client
//!
//! Implements [`TokenExchanger`] by POSTing a form to `{base_url}/oauth/token`.
//! A success body carries `access_token` and `expires_in`, optionally
//! `refresh_token` and `refresh_token_expires_in`; an error body carries
//! `{code, msg}`.

use async_trait::async_trait;
use grantflow_core::{Credential, ExchangeRequest, TokenExchanger};
use grantflow_domain::constants::{
    GRANT_TYPE_AUTHORIZATION_CODE, GRANT_TYPE_REFRESH_TOKEN, PARAM_CLIENT_ID,
    PARAM_CLIENT_INTEGRITY_HASH, PARAM_CODE, PARAM_GRANT_TYPE, PARAM_REDIRECT_URI,
    PARAM_REFRESH_TOKEN,
};
use grantflow_domain::{ExchangeError, Token};
use reqwest::Method;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::errors::HttpError;
use crate::http::HttpClient;

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    refresh_token_expires_in: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    code: i32,
    #[serde(default)]
    msg: String,
}

/// [`TokenExchanger`] backed by the authorization server's token endpoint
#[derive(Clone)]
pub struct HttpTokenExchanger {
    client: HttpClient,
    token_url: String,
}

impl HttpTokenExchanger {
    #[must_use]
    pub fn new(client: HttpClient, token_url: impl Into<String>) -> Self {
        Self { client, token_url: token_url.into() }
    }

    #[must_use]
    pub fn token_url(&self) -> &str {
        &self.token_url
    }

    fn form_params(request: &ExchangeRequest) -> Vec<(&'static str, String)> {
        let identity = &request.identity;
        let mut params = vec![(PARAM_CLIENT_ID, identity.app_key().to_string())];

        match &request.credential {
            Credential::AuthorizationCode(code) => {
                params.push((PARAM_GRANT_TYPE, GRANT_TYPE_AUTHORIZATION_CODE.to_string()));
                params.push((PARAM_CODE, code.clone()));
            }
            Credential::RefreshToken(refresh_token) => {
                params.push((PARAM_GRANT_TYPE, GRANT_TYPE_REFRESH_TOKEN.to_string()));
                params.push((PARAM_REFRESH_TOKEN, refresh_token.clone()));
            }
        }

        params.push((PARAM_REDIRECT_URI, identity.redirect_uri().to_string()));
        if let Some(hash) = identity.client_integrity_hash() {
            params.push((PARAM_CLIENT_INTEGRITY_HASH, hash.to_string()));
        }
        params
    }

    /// Interpret a token endpoint response body
    fn parse_body(status: u16, body: &str, refresh: bool) -> Result<Token, ExchangeError> {
        let success = (200..300).contains(&status);

        if success {
            if let Ok(parsed) = serde_json::from_str::<TokenResponse>(body) {
                if parsed.access_token.is_empty() {
                    return Err(ExchangeError::invalid_response("access token is empty", refresh));
                }
                return Ok(Token::from_response(
                    parsed.access_token,
                    parsed.expires_in,
                    parsed.refresh_token,
                    parsed.refresh_token_expires_in,
                ));
            }
        }

        if let Ok(error) = serde_json::from_str::<ErrorResponse>(body) {
            return Err(ExchangeError::rejected(error.code, error.msg, refresh));
        }

        if success {
            Err(ExchangeError::invalid_response("token response could not be decoded", refresh))
        } else {
            let message = body.chars().take(200).collect();
            Err(HttpError::Status { status, message }.into_exchange_error(refresh))
        }
    }
}

#[async_trait]
impl TokenExchanger for HttpTokenExchanger {
    async fn exchange(&self, request: ExchangeRequest) -> Result<Token, ExchangeError> {
        let refresh = request.is_refresh();
        let params = Self::form_params(&request);

        debug!(url = %self.token_url, refresh, "requesting token");
        let builder = self.client.request(Method::POST, &self.token_url).form(&params);

        let response = self.client.send(builder).await.map_err(|err| {
            warn!(error = %err, refresh, "token request failed");
            err.into_exchange_error(refresh)
        })?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|err| HttpError::from(err).into_exchange_error(refresh))?;

        let result = Self::parse_body(status, &body, refresh);
        if let Err(err) = &result {
            warn!(status, refresh, error = %err, "token endpoint did not issue a token");
        }
        result
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for auth::exchanger.
    use grantflow_domain::{AppIdentity, ExchangeErrorKind};

    use super::*;

    fn identity() -> AppIdentity {
        AppIdentity::new("demo").unwrap()
    }

    /// Validates `form_params` for the authorization code scenario.
    ///
    /// Assertions:
    /// - Confirms the code grant type and the default redirect uri are sent.
    /// - Ensures the integrity hash is omitted when not configured.
    #[test]
    fn test_code_exchange_params() {
        let request = ExchangeRequest::with_code(identity(), "c0de");
        let params = HttpTokenExchanger::form_params(&request);

        assert!(params.contains(&(PARAM_GRANT_TYPE, "authorization_code".to_string())));
        assert!(params.contains(&(PARAM_CODE, "c0de".to_string())));
        assert!(params.contains(&(PARAM_REDIRECT_URI, "grantflowdemo://oauth".to_string())));
        assert!(!params.iter().any(|(key, _)| *key == PARAM_CLIENT_INTEGRITY_HASH));
    }

    /// Validates `form_params` for the refresh with integrity hash scenario.
    ///
    /// Assertions:
    /// - Confirms the refresh grant type and token are sent.
    /// - Confirms the configured integrity hash is sent.
    #[test]
    fn test_refresh_exchange_params() {
        let identity = identity().with_client_integrity_hash("h4sh");
        let request = ExchangeRequest::with_refresh_token(identity, "r1");
        let params = HttpTokenExchanger::form_params(&request);

        assert!(params.contains(&(PARAM_GRANT_TYPE, "refresh_token".to_string())));
        assert!(params.contains(&(PARAM_REFRESH_TOKEN, "r1".to_string())));
        assert!(params.contains(&(PARAM_CLIENT_INTEGRITY_HASH, "h4sh".to_string())));
    }

    /// Validates `parse_body` for the access token only response scenario.
    ///
    /// Assertions:
    /// - Confirms a token is issued without a refresh token.
    #[test]
    fn test_parse_minimal_success() {
        let body = r#"{"access_token":"a","expires_in":60}"#;
        let token = HttpTokenExchanger::parse_body(200, body, false).unwrap();

        assert!(token.is_valid());
        assert!(!token.has_refresh_token());
    }

    /// Validates `parse_body` for the error body scenario.
    ///
    /// Assertions:
    /// - Confirms `{code, msg}` becomes a rejection carrying both.
    /// - Confirms the refresh flag is kept.
    #[test]
    fn test_parse_error_body() {
        let body = r#"{"code":-401,"msg":"invalid grant"}"#;
        let err = HttpTokenExchanger::parse_body(401, body, true).unwrap_err();

        assert_eq!(err.kind, ExchangeErrorKind::Rejected { code: -401 });
        assert_eq!(err.message, "invalid grant");
        assert!(err.refresh);
    }

    /// Validates `parse_body` for the malformed responses scenario.
    ///
    /// Assertions:
    /// - Ensures an empty access token is an invalid response.
    /// - Ensures an undecodable error page is a transport error.
    #[test]
    fn test_parse_malformed_bodies() {
        let body = r#"{"access_token":"","expires_in":60}"#;
        let empty = HttpTokenExchanger::parse_body(200, body, false).unwrap_err();
        assert_eq!(empty.kind, ExchangeErrorKind::InvalidResponse);

        let page =
            HttpTokenExchanger::parse_body(502, "<html>bad gateway</html>", false).unwrap_err();
        assert_eq!(page.kind, ExchangeErrorKind::Transport);
    }
}
