use thiserror::Error;

/// A specialized `Result` type for the Rita client crate.
pub type Result<T> = std::result::Result<T, Error>;

/// The error type for the Rita client crate.
///
/// Every variant is terminal: the client never retries internally. Transport
/// failures (connection refused, DNS, body reads) propagate through the
/// [`Request`](Error::Request) variant and are kept distinct from the service
/// taxonomy above it.
#[derive(Debug, Error)]
pub enum Error {
    /// The channel name is empty after trimming and lowercasing.
    #[error("the channel name is not valid")]
    ChannelInvalid,

    /// The server base URL is missing from the configuration.
    #[error("the server url is not set")]
    ServerNotConfigured,

    /// The API key is missing from the configuration.
    #[error("the api key is not set")]
    ApiKeyNotConfigured,

    /// The outbound event payload could not be serialized as JSON.
    #[error("the object sent is not a json")]
    JsonInvalid,

    /// The configured server base URL could not be parsed.
    #[error("the server url is not valid")]
    ServerUrlInvalid,

    /// The server answered HTTP 401.
    #[error("not authorized")]
    NotAuthorized,

    /// The server answered HTTP 403 or 404.
    #[error("forbidden")]
    Forbidden,

    /// Any other non-success HTTP status.
    #[error("unknown error (status {0})")]
    Unknown(reqwest::StatusCode),

    /// Opaque transport-level failure.
    #[error("request error: {0}")]
    Request(#[from] reqwest::Error),
}
