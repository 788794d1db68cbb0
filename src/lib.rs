//! # Rita Client
//!
//! This crate is an idiomatic Rust client for the Rita event-channel
//! service. It supports:
//!
//! - Sending events to a named channel (`send_event`)
//! - Fetching the resumption cursor of a channel (`get_cursor`)
//! - Fetching historical events (`get_events` / `get_events_since`)
//! - Live subscriptions over a server-sent-events style stream
//!   (`subscribe` / `subscribe_since`), delivered through a cancellable
//!   [`Subscription`] handle
//!
//! ```no_run
//! use rita_client::{RitaClient, RitaConfig};
//!
//! #[tokio::main]
//! async fn main() -> rita_client::Result<()> {
//!     let config = RitaConfig::new("https://rita.example.com", "my-api-key");
//!     let client = RitaClient::new(&config)?;
//!
//!     let id = client.send_event("orders", &serde_json::json!({"total": 42})).await?;
//!     println!("sent event {id}");
//!
//!     let mut subscription = client.subscribe("orders").await?;
//!     while let Some(event) = subscription.recv().await {
//!         println!("{}: {}", event.id, event.data);
//!     }
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod event;
pub mod rita;
pub mod utils;

pub use config::RitaConfig;
pub use error::{Error, Result};
pub use event::Event;
pub use rita::{RitaClient, Subscription, LAST_EVENT};
