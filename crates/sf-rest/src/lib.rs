//! # playforce-sf-rest
//!
//! Session-aware SOQL and REST execution for Playforce.
//!
//! ## Features
//!
//! - **Retry on expiry** - A rejected session is re-authenticated and the
//!   call retried once
//! - **SOQL queries** - `SELECT *` expansion and transparent paging with
//!   progress events and cancellation
//! - **sObjects REST** - Any method, with writes gated by the license
//! - **Describe** - Global and per-object metadata, plus field summaries
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use futures::StreamExt;
//! use playforce_sf_rest::{QueryEngine, QueryEvent, RequestExecutor};
//!
//! let executor = Arc::new(RequestExecutor::new(auth, license, ClientConfig::default())?);
//! let engine = QueryEngine::new(executor);
//!
//! let mut events = engine.stream("q-1", "SELECT * FROM Account");
//! while let Some(event) = events.next().await {
//!     match event? {
//!         QueryEvent::Progress(p) => println!("{} of {}", p.fetched, p.total_size),
//!         QueryEvent::Completed(outcome) => println!("{outcome:?}"),
//!     }
//! }
//! ```

mod describe;
mod error;
mod executor;
pub mod expand;
mod query;
mod registry;

pub use describe::{
    ChildRelationship, DescribeGlobalResult, DescribeSObjectResult, FieldDescribe, FieldSummary,
    PicklistValue, SObjectBasicInfo,
};
pub use error::{Error, ErrorKind, Result};
pub use executor::RequestExecutor;
pub use query::{QueryEngine, QueryEvent, QueryOutcome, QueryProgress, QueryRecords};

// Re-export sf-client types that callers need
pub use playforce_sf_client::{ClientConfig, ClientConfigBuilder, RequestMethod};
