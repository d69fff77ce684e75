//! # Pharmtrace Service - Request Façade
//!
//! Maps the external request vocabulary (`register`, `registerWithSig`,
//! `updateLocation`, `nonce`, `verify`, `authorizeManufacturer`,
//! `revokeManufacturer`, `status`) onto [`TransitionEngine`] calls and renders
//! the JSON responses clients already consume (`{ok, msg}`, `{ok, nonce}`,
//! `{ok:false, error}`, and the verify payload).
//!
//! Transport-agnostic: the binary feeds it newline-delimited JSON, but any
//! router can call [`LedgerService::handle`] directly.
//!
//! [`TransitionEngine`]: pharmtrace_ledger::TransitionEngine

#![forbid(unsafe_code)]
#![warn(missing_docs)]

/// Request types
pub mod request;

/// Response types
pub mod response;

/// Request dispatch
pub mod service;

pub use request::{LedgerRequest, TimestampValue};
pub use response::{BatchView, LedgerResponse};
pub use service::LedgerService;
