//! Access/refresh credential pair and its persisted form
//!
//! A [`Token`] is replaced wholesale on every exchange, refresh or close. The
//! only partial update is [`Token::merge_refreshed`]: refresh responses do not
//! always reissue a refresh token, and when they don't the previous one (and
//! its expiry) stays.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::{
    CACHE_KEY_ACCESS_EXPIRES_AT, CACHE_KEY_ACCESS_TOKEN, CACHE_KEY_REFRESH_EXPIRES_AT,
    CACHE_KEY_REFRESH_TOKEN,
};

/// Opaque key/value pairs as stored by a token cache
///
/// Absence of a key is equivalent to an empty string (tokens) or the infinite
/// past (timestamps).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenFields(BTreeMap<String, String>);

impl TokenFields {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.0.remove(key)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for TokenFields {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Access token, optional refresh token, and their expiries
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    access_token: String,
    access_expires_at: DateTime<Utc>,
    refresh_token: String,
    refresh_expires_at: DateTime<Utc>,
}

impl Token {
    /// Create a token from explicit parts
    #[must_use]
    pub fn new(
        access_token: impl Into<String>,
        access_expires_at: DateTime<Utc>,
        refresh_token: impl Into<String>,
        refresh_expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            access_token: access_token.into(),
            access_expires_at,
            refresh_token: refresh_token.into(),
            refresh_expires_at,
        }
    }

    /// The canonical "no credentials" token: both strings empty, both expiries
    /// in the infinite past
    #[must_use]
    pub fn empty() -> Self {
        Self::new("", DateTime::<Utc>::MIN_UTC, "", DateTime::<Utc>::MIN_UTC)
    }

    /// Build a token from a token endpoint response received now
    ///
    /// # Arguments
    /// * `access_token` - Issued access token
    /// * `expires_in` - Access token lifetime in seconds
    /// * `refresh_token` - Refresh token, if the server issued one
    /// * `refresh_expires_in` - Refresh token lifetime in seconds; when absent
    ///   an issued refresh token never expires
    #[must_use]
    pub fn from_response(
        access_token: impl Into<String>,
        expires_in: i64,
        refresh_token: Option<String>,
        refresh_expires_in: Option<i64>,
    ) -> Self {
        Self::from_response_at(
            Utc::now(),
            access_token,
            expires_in,
            refresh_token,
            refresh_expires_in,
        )
    }

    /// Same as [`Token::from_response`] with an explicit reception time
    #[must_use]
    pub fn from_response_at(
        now: DateTime<Utc>,
        access_token: impl Into<String>,
        expires_in: i64,
        refresh_token: Option<String>,
        refresh_expires_in: Option<i64>,
    ) -> Self {
        let refresh_token = refresh_token.unwrap_or_default();
        let refresh_expires_at = if refresh_token.is_empty() {
            DateTime::<Utc>::MIN_UTC
        } else {
            refresh_expires_in.map_or(DateTime::<Utc>::MAX_UTC, |secs| offset_from(now, secs))
        };

        Self::new(access_token, offset_from(now, expires_in), refresh_token, refresh_expires_at)
    }

    #[must_use]
    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    #[must_use]
    pub const fn access_expires_at(&self) -> DateTime<Utc> {
        self.access_expires_at
    }

    #[must_use]
    pub fn refresh_token(&self) -> &str {
        &self.refresh_token
    }

    #[must_use]
    pub const fn refresh_expires_at(&self) -> DateTime<Utc> {
        self.refresh_expires_at
    }

    /// Whether the access token is non-empty and not yet expired
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.is_valid_at(Utc::now())
    }

    /// Validity check against an explicit instant
    #[must_use]
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        !self.access_token.is_empty() && now < self.access_expires_at
    }

    /// Whether a refresh exchange can be attempted
    #[must_use]
    pub fn has_refresh_token(&self) -> bool {
        !self.refresh_token.is_empty()
    }

    /// Fold a freshly exchanged token into this one
    ///
    /// A fresh token without a refresh token only replaces the access token
    /// and its expiry. Otherwise every field is replaced.
    pub fn merge_refreshed(&mut self, fresh: Self) {
        if fresh.refresh_token.is_empty() {
            self.access_token = fresh.access_token;
            self.access_expires_at = fresh.access_expires_at;
        } else {
            *self = fresh;
        }
    }

    /// Serialize into cache fields; timestamps are epoch milliseconds
    #[must_use]
    pub fn to_fields(&self) -> TokenFields {
        let mut fields = TokenFields::new();
        fields.insert(CACHE_KEY_ACCESS_TOKEN, self.access_token.clone());
        fields.insert(
            CACHE_KEY_ACCESS_EXPIRES_AT,
            self.access_expires_at.timestamp_millis().to_string(),
        );
        fields.insert(CACHE_KEY_REFRESH_TOKEN, self.refresh_token.clone());
        fields.insert(
            CACHE_KEY_REFRESH_EXPIRES_AT,
            self.refresh_expires_at.timestamp_millis().to_string(),
        );
        fields
    }

    /// Rebuild a token from cache fields
    ///
    /// Missing token keys read as empty strings; missing or unparsable
    /// timestamps read as the infinite past.
    #[must_use]
    pub fn from_fields(fields: &TokenFields) -> Self {
        let text = |key: &str| fields.get(key).unwrap_or_default().to_string();
        let instant = |key: &str| {
            fields
                .get(key)
                .and_then(|raw| raw.trim().parse::<i64>().ok())
                .and_then(DateTime::<Utc>::from_timestamp_millis)
                .unwrap_or(DateTime::<Utc>::MIN_UTC)
        };

        Self::new(
            text(CACHE_KEY_ACCESS_TOKEN),
            instant(CACHE_KEY_ACCESS_EXPIRES_AT),
            text(CACHE_KEY_REFRESH_TOKEN),
            instant(CACHE_KEY_REFRESH_EXPIRES_AT),
        )
    }
}

impl Default for Token {
    fn default() -> Self {
        Self::empty()
    }
}

fn offset_from(now: DateTime<Utc>, secs: i64) -> DateTime<Utc> {
    Duration::try_seconds(secs).and_then(|delta| now.checked_add_signed(delta)).unwrap_or(
        if secs < 0 {
            DateTime::<Utc>::MIN_UTC
        } else {
            DateTime::<Utc>::MAX_UTC
        },
    )
}
