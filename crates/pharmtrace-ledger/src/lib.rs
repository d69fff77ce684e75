//! # Pharmtrace Ledger - Provenance State Machine
//!
//! **Purpose**: Validate and apply one state-changing request at a time,
//! deterministically, and serve reads of committed state.
//!
//! The [`TransitionEngine`] is the only mutation entry point. Each write
//! stages a list of [`LedgerFact`]s against the current state, appends them
//! to the [`Journal`] as one commit, then applies them. A rejected write
//! stages nothing and leaves both the journal and the state untouched.
//!
//! ## Components
//!
//! - [`AuthorizationRegistry`] and [`AdminSet`]: who may write
//! - [`NonceTable`]: per-identity replay protection for signed writes
//! - [`BatchLedger`]: immutable batch records plus append-only histories
//! - [`Journal`]: durable, replayable log of committed facts
//!
//! ## What's NOT in this crate
//!
//! - Request parsing and response shaping (that's `pharmtrace-service`)
//! - Consensus or replication; a single process is the sequencer

#![forbid(unsafe_code)]
#![warn(missing_docs)]

/// Admin set and manufacturer authorization registry
pub mod authorization;

/// Batch records and checkpoint histories
pub mod batches;

/// Ledger configuration and write policies
pub mod config;

/// Transition engine (single-writer façade over all components)
pub mod engine;

/// Facts produced by committed transitions
pub mod facts;

/// Durable journal of commits
pub mod journal;

/// Replay-protection counters
pub mod nonce;

/// Aggregate in-memory state
pub mod state;

pub use authorization::{AdminSet, AuthorizationRegistry};
pub use batches::{BatchLedger, BatchProvenance};
pub use config::{CheckpointPolicy, ConfigError, LedgerConfig, RegistrationPolicy};
pub use engine::{SignedRegistration, TransitionEngine};
pub use facts::{Commit, LedgerFact};
pub use journal::{FileJournal, Journal, JournalError, MemoryJournal};
pub use nonce::NonceTable;
pub use state::LedgerState;
