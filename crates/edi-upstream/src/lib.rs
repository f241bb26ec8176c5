//! # edi-upstream
//!
//! Outbound HTTP client for the upstream agent gateway.
//!
//! - [`client::UpstreamClient`] — `/hooks/agent` and `/tools/invoke` calls.
//! - [`client::UpstreamResponse`] — the folded `{ok, result, runId?, error?}` envelope.

#![deny(unsafe_code)]

pub mod client;

pub use client::{UpstreamClient, UpstreamResponse};
