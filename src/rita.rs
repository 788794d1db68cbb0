//! # Rita Client
//!
//! This module implements the Rita HTTP client. It mirrors the service's
//! event-channel API, supporting:
//! - Cursor fetch (the last event id of a channel)
//! - Event send (JSON payload, returns the assigned event id)
//! - Historical fetch (a list of events, optionally since a cursor)
//! - Live subscriptions over a server-sent-events style stream
//!
//! The stream parser reads the response body line by line: `data:` lines
//! carry one JSON-encoded event each, a `ping` payload is a heartbeat, and
//! every other line is protocol framing to be ignored. A malformed event
//! payload is dropped without terminating the stream; only a read error or
//! the server closing the connection ends a subscription.

use futures::{Stream, StreamExt, TryStreamExt};
use reqwest::{
    header::{ACCEPT, ACCEPT_ENCODING, AUTHORIZATION, CONNECTION, CONTENT_TYPE},
    Client, StatusCode,
};
use serde::Serialize;
use std::{
    pin::Pin,
    task::{Context, Poll},
};
use tokio::sync::mpsc;
use tokio_util::codec::{FramedRead, LinesCodec};
use tokio_util::io::StreamReader;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::{
    config::RitaConfig,
    error::{Error, Result},
    event::{CursorResponse, Event, EventsResponse},
    utils::build_url,
};

/// Sentinel cursor meaning "the most recently delivered position".
///
/// Pass it to [`RitaClient::subscribe_since`] or
/// [`RitaClient::get_events_since`] instead of a literal event id.
pub const LAST_EVENT: &str = "$";

const URL_EVENT_SEND: &str = "/v1/event/$";
const URL_EVENT_SUB: &str = "/v1/event/$";
const URL_GET_CURSOR: &str = "/v1/event/$/last";

/// The prefix of a stream line that carries an event payload.
const DATA_PREFIX: &str = "data:";
/// Heartbeat payload sent by the server to keep the connection alive.
const KEEPALIVE: &str = "ping";

/// The main Rita client struct.
pub struct RitaClient {
    /// Underlying HTTP client, shared by all operations.
    client: Client,
    /// Base URL of the Rita server, trimmed.
    server: String,
    /// API key, trimmed, sent verbatim in the `Authorization` header.
    apikey: String,
}

impl RitaClient {
    /// Creates a new client from the given configuration.
    ///
    /// The configuration is not validated here; missing fields are reported
    /// by the individual calls so a client can be constructed eagerly.
    pub fn new(config: &RitaConfig) -> Result<Self> {
        let client = Client::builder().build().map_err(Error::Request)?;
        Ok(Self {
            client,
            server: config.url.trim().to_string(),
            apikey: config.api_key.trim().to_string(),
        })
    }

    /// Returns the last event id of the given channel.
    ///
    /// The returned id can be used as a cursor for the `*_since` calls.
    pub async fn get_cursor(&self, channel: &str) -> Result<String> {
        let channel = self.ensure_can(channel)?;
        let url = build_url(&self.server, &channel, URL_GET_CURSOR, &[])?;

        let resp = self
            .client
            .get(url)
            .header(AUTHORIZATION, &self.apikey)
            .header(CONTENT_TYPE, "application/json")
            .send()
            .await?;

        match resp.status() {
            StatusCode::OK => {
                let body = resp.json::<CursorResponse>().await?;
                Ok(body.event_id)
            }
            status => Err(status_error(status)),
        }
    }

    /// Sends an event to the given channel and returns its assigned id.
    ///
    /// `data` may be any serializable value; a serialization failure is
    /// reported as [`Error::JsonInvalid`] before any request is issued.
    pub async fn send_event<T>(&self, channel: &str, data: &T) -> Result<String>
    where
        T: Serialize + ?Sized,
    {
        let channel = self.ensure_can(channel)?;
        let url = build_url(&self.server, &channel, URL_EVENT_SEND, &[])?;

        let payload = serde_json::to_vec(data).map_err(|_| Error::JsonInvalid)?;

        let resp = self
            .client
            .post(url)
            .header(AUTHORIZATION, &self.apikey)
            .header(CONTENT_TYPE, "application/json")
            .body(payload)
            .send()
            .await?;

        match resp.status() {
            StatusCode::OK => {
                let body = resp.json::<CursorResponse>().await?;
                Ok(body.event_id)
            }
            status => Err(status_error(status)),
        }
    }

    /// Returns the events of the given channel from the beginning visible to
    /// the server.
    pub async fn get_events(&self, channel: &str) -> Result<Vec<Event>> {
        self.get_events_since(channel, "").await
    }

    /// Returns the events of the given channel starting after `event_id`.
    ///
    /// An empty `event_id` means "from the beginning"; [`LAST_EVENT`] means
    /// "from the server's last-known position".
    pub async fn get_events_since(&self, channel: &str, event_id: &str) -> Result<Vec<Event>> {
        let channel = self.ensure_can(channel)?;
        let query = since_query(false, event_id);
        let url = build_url(&self.server, &channel, URL_EVENT_SUB, &query)?;

        let resp = self
            .client
            .get(url)
            .header(AUTHORIZATION, &self.apikey)
            .header(ACCEPT, "application/json")
            .send()
            .await?;

        match resp.status() {
            StatusCode::OK => {
                let body = resp.json::<EventsResponse>().await?;
                Ok(body.events)
            }
            status => Err(status_error(status)),
        }
    }

    /// Subscribes to the given channel from the beginning visible to the
    /// server.
    pub async fn subscribe(&self, channel: &str) -> Result<Subscription> {
        self.subscribe_since(channel, "").await
    }

    /// Subscribes to the given channel starting after `event_id`.
    ///
    /// An empty `event_id` means "from the beginning"; [`LAST_EVENT`] means
    /// "from the server's last-known position". On HTTP 200 this returns
    /// immediately with an open [`Subscription`]; a background task then
    /// reads the stream until the connection closes, a read error occurs, or
    /// the subscription is cancelled. There is no automatic reconnect: when
    /// the delivery channel closes, the caller must subscribe again, passing
    /// the last processed event id (or [`LAST_EVENT`]) to resume.
    pub async fn subscribe_since(&self, channel: &str, event_id: &str) -> Result<Subscription> {
        let channel = self.ensure_can(channel)?;
        let query = since_query(true, event_id);
        let url = build_url(&self.server, &channel, URL_EVENT_SUB, &query)?;

        let resp = self
            .client
            .get(url)
            .header(AUTHORIZATION, &self.apikey)
            .header(CONNECTION, "keep-alive")
            .header(ACCEPT, "text/event-stream")
            // The stream must be read incrementally, never buffered for
            // decompression.
            .header(ACCEPT_ENCODING, "identity")
            .send()
            .await?;

        match resp.status() {
            StatusCode::OK => {
                let (tx, rx) = mpsc::channel(1);
                let cancel = CancellationToken::new();
                let reader_cancel = cancel.clone();
                tokio::spawn(async move {
                    let stream = resp
                        .bytes_stream()
                        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e));
                    let mut lines = FramedRead::new(StreamReader::new(stream), LinesCodec::new());
                    pump_lines(&mut lines, &tx, &reader_cancel).await;
                    // Dropping the frame reader here closes the connection;
                    // dropping `tx` closes the delivery channel.
                });
                Ok(Subscription { events: rx, cancel })
            }
            status => Err(status_error(status)),
        }
    }

    /// Normalizes the channel name and checks the configuration.
    ///
    /// The check order is fixed for deterministic error reporting: server,
    /// then key, then channel.
    fn ensure_can(&self, channel: &str) -> Result<String> {
        let channel = channel.trim().to_lowercase();

        if self.server.is_empty() {
            return Err(Error::ServerNotConfigured);
        }
        if self.apikey.is_empty() {
            return Err(Error::ApiKeyNotConfigured);
        }
        if channel.is_empty() {
            return Err(Error::ChannelInvalid);
        }

        Ok(channel)
    }
}

/// A live subscription to a Rita channel.
///
/// Holds the delivery channel fed by the background reader and a cancellation
/// token bound to it. The delivery channel closing (via [`recv`] returning
/// `None` or the [`Stream`] ending) is the only termination signal; it fires
/// exactly once, whether the server closed the connection, a read error
/// occurred, or the subscription was cancelled.
///
/// [`recv`]: Subscription::recv
#[derive(Debug)]
pub struct Subscription {
    events: mpsc::Receiver<Event>,
    cancel: CancellationToken,
}

impl Subscription {
    /// Receives the next event, blocking on the background reader.
    ///
    /// Returns `None` once the subscription has terminated.
    pub async fn recv(&mut self) -> Option<Event> {
        self.events.recv().await
    }

    /// Stops the background reader and releases the connection.
    ///
    /// Events already delivered remain readable; the delivery channel closes
    /// after the reader observes the cancellation.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

impl Stream for Subscription {
    type Item = Event;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Event>> {
        self.events.poll_recv(cx)
    }
}

/// Maps a non-success HTTP status to the service error taxonomy.
fn status_error(status: StatusCode) -> Error {
    match status {
        StatusCode::UNAUTHORIZED => Error::NotAuthorized,
        StatusCode::FORBIDDEN | StatusCode::NOT_FOUND => Error::Forbidden,
        other => Error::Unknown(other),
    }
}

/// Builds the query pairs for the subscription/historical endpoint.
///
/// `eventId` is omitted entirely when the since-value is blank.
fn since_query(sub: bool, event_id: &str) -> Vec<(&'static str, String)> {
    let mut query = vec![("sub", sub.to_string())];
    let event_id = event_id.trim();
    if !event_id.is_empty() {
        query.push(("eventId", event_id.to_string()));
    }
    query
}

/// Reads stream lines until cancellation, a read error, or EOF, delivering
/// each decoded event on `tx`.
///
/// The send blocks on a slow consumer; backpressure propagates from the
/// caller through this task down to the socket reads.
async fn pump_lines<R>(
    lines: &mut FramedRead<R, LinesCodec>,
    tx: &mpsc::Sender<Event>,
    cancel: &CancellationToken,
) where
    R: tokio::io::AsyncRead + Unpin,
{
    loop {
        let line = tokio::select! {
            _ = cancel.cancelled() => return,
            next = lines.next() => match next {
                Some(Ok(line)) => line,
                Some(Err(err)) => {
                    debug!("subscription stream read failed: {err}");
                    return;
                }
                None => return,
            },
        };

        if let Some(event) = parse_stream_line(&line) {
            tokio::select! {
                _ = cancel.cancelled() => return,
                sent = tx.send(event) => {
                    if sent.is_err() {
                        // Receiver dropped; no consumer left.
                        return;
                    }
                }
            }
        }
    }
}

/// Decodes a single stream line into an event, if it carries one.
///
/// Framing lines, blanks, comments, heartbeats, and malformed payloads all
/// yield `None`.
fn parse_stream_line(line: &str) -> Option<Event> {
    let line = line.trim();
    let payload = line.strip_prefix(DATA_PREFIX)?.trim();

    if payload.is_empty() || payload == KEEPALIVE {
        return None;
    }

    match serde_json::from_str::<Event>(payload) {
        Ok(event) => Some(event),
        Err(err) => {
            warn!("dropping malformed event payload: {err}");
            None
        }
    }
}
