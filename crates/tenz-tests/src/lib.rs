//! Integration test suite for the TENZ token.
//!
//! Drives deployed tokens through the [`Host`](tenz_core::Host) the way
//! external callers would: full lifecycles, asset recovery across ledgers,
//! and property tests over the emission curve and supply conservation.

pub mod helpers;
