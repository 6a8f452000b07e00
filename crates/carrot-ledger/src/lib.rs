//! Token budget checks and usage accounting
//!
//! User accounts live behind the [`UserStore`] trait. The [`TokenLedger`]
//! applies the usage of a finished chat turn to the caller's account and
//! appends one [`UsageRecord`] per application.

#![allow(clippy::missing_errors_doc, clippy::must_use_candidate)]

pub mod error;
pub mod ledger;
pub mod store;
pub mod types;

pub use error::LedgerError;
pub use ledger::TokenLedger;
pub use store::{InMemoryUserStore, UserStore};
pub use types::{UsageDelta, UsageRecord, UserAccount};
