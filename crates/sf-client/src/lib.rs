//! # playforce-sf-client
//!
//! HTTP transport for the Playforce Salesforce engine.
//!
//! This crate provides the layer every other Playforce crate talks through:
//! - Request building with bearer auth and JSON bodies
//! - Compression and connection pooling via reqwest
//! - Salesforce error payload parsing into typed [`ErrorKind`]s
//! - Session-expiry classification ([`ErrorKind::SessionExpired`]) decided
//!   from the HTTP status and `errorCode`, never from message text
//! - SOQL query paging primitives ([`QueryResult`], `nextRecordsUrl`)
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Engine Layer                             │
//! │  (sf-rest: RequestExecutor, QueryEngine)                    │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   SalesforceClient                          │
//! │  - Holds instance URL + access token + API version          │
//! │  - query / query_more / send_json                           │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    SfHttpClient                             │
//! │  - Raw HTTP, compression, error classification              │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use playforce_sf_client::SalesforceClient;
//!
//! let client = SalesforceClient::new(instance_url, access_token)?
//!     .with_api_version("57.0");
//! let page: QueryResult<serde_json::Value> = client.query("SELECT Id FROM Account").await?;
//! if let Some(next) = page.next_records_url.as_deref() {
//!     let more: QueryResult<serde_json::Value> = client.query_more(next).await?;
//! }
//! ```

mod client;
mod config;
mod error;
mod request;
mod response;
mod salesforce_client;
pub mod security;

pub use client::SfHttpClient;
pub use config::{ClientConfig, ClientConfigBuilder};
pub use error::{Error, ErrorKind, Result};
pub use request::{RequestBuilder, RequestMethod};
pub use response::{Response, ResponseExt};
pub use salesforce_client::{normalize_api_version, QueryResult, SalesforceClient};

/// Default Salesforce API version.
pub const DEFAULT_API_VERSION: &str = "57.0";

/// User-Agent string for the client
pub const USER_AGENT: &str = concat!("playforce/", env!("CARGO_PKG_VERSION"));
