//! # guidesync-client
//!
//! Fail-soft access to the remote help-center store.
//!
//! [`ContentApi`] is the raw capability contract (every call may fail);
//! [`HttpContentApi`] implements it over the REST API. [`ResilientClient`]
//! wraps every operation in a [`RetryPolicy`] and never returns an error:
//! exhausted retries surface as an absent result so a tree walk can continue
//! past one failed entity.

pub mod api;
pub mod client;
pub mod error;
pub mod http;
#[cfg(any(test, feature = "testing"))]
pub mod memory;
pub mod retry;

pub use api::ContentApi;
pub use client::{Lookup, ResilientClient};
pub use error::RemoteError;
pub use http::HttpContentApi;
pub use retry::{FlatRetry, RetryPolicy, Sleeper, ThreadSleeper};
