//! Automated claiming of an on-chain reward by replaying a learned
//! transaction pattern.
//!
//! The crate learns a reusable instruction template from one historical
//! reference transaction (resolving address-table lookups first), then
//! rebuilds, signs, simulates and submits a fresh claim transaction on a
//! randomized schedule so repeated attempts never land on a fixed grid.

pub mod claim;
pub mod config;
pub mod constants;
pub mod errors;
pub mod logging;
pub mod rpc;
pub mod schedule;
pub mod template;
pub mod wallet;

/// Version of the auto-claimer
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
