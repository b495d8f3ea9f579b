//! NUT Protocol Client
//!
//! Minimal client for the Network UPS Tools network protocol, as spoken by
//! `upsd` on TCP port 3493. Only the read-only list commands used for metric
//! collection are implemented.
//!
//! # Components
//!
//! - [`Client`]: one connection, `LIST UPS` and `LIST VAR <device>`
//! - [`ClientOptions`]: connect and per-operation I/O deadlines
//! - [`ClientError`]: transport, grammar and value-decode failures
//! - [`quote`] / [`unquote`]: value quoting rules
//!
//! # Example
//!
//! ```rust,no_run
//! use nut_exporter::protocol::{Client, ClientOptions};
//!
//! # async fn run() -> Result<(), nut_exporter::protocol::ClientError> {
//! let mut client = Client::dial("localhost", &ClientOptions::default()).await?;
//! for device in client.list_devices().await? {
//!     let vars = client.list_variables(&device).await?;
//!     println!("{device}: {:?}", vars.get("battery.charge"));
//! }
//! client.close().await?;
//! # Ok(())
//! # }
//! ```

use std::collections::BTreeMap;

mod client;
mod error;
mod quote;

pub use client::{Client, ClientOptions, DEFAULT_PORT, with_default_port};
pub use error::ClientError;
pub use quote::{UnquoteError, quote, unquote};

/// Variables of one device: name to unquoted value, ordered by name.
pub type VariableSet = BTreeMap<String, String>;
