//! # tenz-core
//! Ledger, transfer gate and emission schedule for the TENZ token.
//!
//! The [`Token`](token::Token) aggregate owns every piece of contract state:
//! - [`ledger::Ledger`] — balances and total supply, capped at `MAX_SUPPLY`
//! - [`gate::TransferGate`] — `Locked`/`Open` phase plus pre-launch grants
//! - [`schedule::EmissionSchedule`] — closed-form cumulative supply ceiling per period
//! - [`allowance::Allowances`] — delegated transfer bookkeeping
//! - [`owners::OwnerSet`] — multi-owner access control
//!
//! [`host::Host`] models the execution environment: caller identity, a
//! monotonic clock, all-or-nothing operations, native value and the
//! cross-ledger asset recovery paths.
//!
//! All supply arithmetic is integer-only and checked; nothing wraps.

pub mod address;
pub mod allowance;
pub mod amount;
pub mod config;
pub mod constants;
pub mod error;
pub mod gate;
pub mod host;
pub mod ledger;
pub mod owners;
pub mod schedule;
pub mod token;
pub mod traits;

pub use address::Address;
pub use amount::Amount;
pub use config::TokenParams;
pub use error::{ConfigError, HostError, TenzError, TokenError};
pub use host::Host;
pub use schedule::EmissionCurve;
pub use token::{CallContext, Token, TokenEvent};
