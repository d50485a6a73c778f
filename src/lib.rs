//! Rate-limited Reddit lead scout: token-bucket pacing, throttle-aware retries, OAuth
//! client-credentials transport, channel search fan-out, and intent filtering in one crate.
//!
//! The pipeline is leaf-first: [`rate_limit::RateLimiter`] paces every outbound call,
//! [`retry::RetryingExecutor`] wraps attempts with backoff and throttle compliance,
//! [`transport::AuthenticatedTransport`] keeps a single OAuth session fresh,
//! [`search::SearchAggregator`] fans a keyword out across channels, and
//! [`collect::Collector`] turns the results into deduplicated, intent-filtered
//! [`lead::Lead`]s.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod clock;
pub mod collect;
pub mod config;
pub mod error;
pub mod http;
pub mod intent;
pub mod lead;
pub mod oauth;
pub mod obs;
pub mod rate_limit;
pub mod retry;
pub mod search;
pub mod transport;

mod _prelude {
	pub use std::{
		collections::HashSet,
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
		time::Duration as StdDuration,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::Mutex;
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _, tracing_subscriber as _};
