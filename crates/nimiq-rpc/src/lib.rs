//! JSON-RPC 2.0 client for the Nimiq node RPC interface.
//!
//! One typed method per remote RPC call, built on a single `request` core
//! that frames the envelope, posts it over HTTP and splits results from
//! remote errors. No retries, no caching, no batching; exactly one HTTP
//! round trip per call.
//!
//! ```no_run
//! use nimiq_rpc::{Client, Config};
//!
//! # async fn run() -> Result<(), nimiq_rpc::Error> {
//! let client = Client::new(Config::default())?;
//! let height = client.block_number().await?;
//! println!("chain height: {height}");
//! # Ok(())
//! # }
//! ```

mod client;
mod config;
mod error;
mod protocol;
pub mod types;

pub use client::Client;
pub use config::{Config, Credentials};
pub use error::Error;
