//! Loyalty tier and promotion eligibility engine for the spa booking platform.
//!
//! The crate owns the single authoritative implementation of the eligibility
//! predicate and the tier upgrade walk; every client (web, mobile, staff
//! portal) consumes them through the JSON API exposed by [`loyalty::loyalty_router`]
//! rather than re-deriving the rules locally.

pub mod config;
pub mod error;
pub mod loyalty;
pub mod telemetry;
