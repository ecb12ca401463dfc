//! Protocol constants
//!
//! Endpoint paths, request parameter names and persisted key names shared by
//! the session core and its adapters.

// Authorization server endpoints (relative to the configured base URL)
pub const AUTHORIZE_PATH: &str = "oauth/authorize";
pub const TOKEN_PATH: &str = "oauth/token";

// Request parameters
pub const PARAM_CLIENT_ID: &str = "client_id";
pub const PARAM_REDIRECT_URI: &str = "redirect_uri";
pub const PARAM_RESPONSE_TYPE: &str = "response_type";
pub const PARAM_GRANT_TYPE: &str = "grant_type";
pub const PARAM_CODE: &str = "code";
pub const PARAM_REFRESH_TOKEN: &str = "refresh_token";
pub const PARAM_CLIENT_INTEGRITY_HASH: &str = "client_integrity_hash";

pub const RESPONSE_TYPE_CODE: &str = "code";
pub const GRANT_TYPE_AUTHORIZATION_CODE: &str = "authorization_code";
pub const GRANT_TYPE_REFRESH_TOKEN: &str = "refresh_token";

// Default redirect target: grantflow{app_key}://oauth
pub const REDIRECT_SCHEME_PREFIX: &str = "grantflow";
pub const REDIRECT_SUFFIX: &str = "://oauth";

// Companion app protocol
pub const COMPANION_PROTOCOL_VERSION: u32 = 1;
pub const COMPANION_MIN_VERSION_CODE: u32 = 139;
pub const COMPANION_NOT_SUPPORTED_ERROR: &str = "NotSupportError";

// Token cache keys (namespaced per identity by the cache backend)
pub const CACHE_KEY_ACCESS_TOKEN: &str = "grantflow.token.AccessToken";
pub const CACHE_KEY_ACCESS_EXPIRES_AT: &str = "grantflow.token.AccessToken.ExpiresAt";
pub const CACHE_KEY_REFRESH_TOKEN: &str = "grantflow.token.RefreshToken";
pub const CACHE_KEY_REFRESH_EXPIRES_AT: &str = "grantflow.token.RefreshToken.ExpiresAt";

/// All token cache keys, in persistence order
pub const CACHE_KEYS: [&str; 4] = [
    CACHE_KEY_ACCESS_TOKEN,
    CACHE_KEY_ACCESS_EXPIRES_AT,
    CACHE_KEY_REFRESH_TOKEN,
    CACHE_KEY_REFRESH_EXPIRES_AT,
];

// Infrastructure defaults
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_HTTP_MAX_ATTEMPTS: usize = 1;
pub const DEFAULT_KEYCHAIN_SERVICE: &str = "grantflow.session";
pub const DEFAULT_LOG_LEVEL: &str = "info";
