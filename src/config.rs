//! Configuration options for the Rita client.

/// Configuration for a [`RitaClient`](crate::RitaClient).
///
/// Both fields are required. They are validated on every call rather than at
/// construction, so a client can be built before its configuration is
/// complete; missing values surface as
/// [`ServerNotConfigured`](crate::Error::ServerNotConfigured) or
/// [`ApiKeyNotConfigured`](crate::Error::ApiKeyNotConfigured).
#[derive(Clone, Debug, Default)]
pub struct RitaConfig {
    /// Base URL of the Rita server (e.g. "https://rita.example.com").
    pub url: String,
    /// API key sent verbatim in the `Authorization` header.
    pub api_key: String,
}

impl RitaConfig {
    /// Creates a configuration from a server base URL and an API key.
    pub fn new(url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            api_key: api_key.into(),
        }
    }
}
