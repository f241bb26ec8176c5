//! # edi-server
//!
//! HTTP surface, observability wiring, and CLI entrypoint for the EDI
//! dispatch gateway: the `/health`, `/metrics`, `/tasks`, `/thread`, `/ask`,
//! `/dispatch`, and `/github-webhook` routes.
//!
//! [`router::build_router`] assembles the full `axum::Router` from
//! [`state::AppState`]; the binary entrypoint in `main.rs` is the only piece
//! not re-exported here, since it owns process bootstrap rather than
//! testable logic.

#![deny(unsafe_code)]

pub mod auth;
pub mod cli;
pub mod errors;
pub mod handlers;
pub mod observability;
pub mod payload;
pub mod router;
pub mod state;

pub use cli::Cli;
pub use router::build_router;
pub use state::AppState;
