//! colscan-core: foundational types for the columnar scan operator.
//!
//! This crate is pure data and contracts: strongly-typed identifiers, key
//! spans over the distributed store's ordered key space, logical column types
//! with a hydration contract, the columnar batch shape, and the abstract
//! memory-budget interfaces. No I/O, no async, no execution logic.

pub mod batch;
pub mod budget;
pub mod catalog;
pub mod config;
pub mod error;
pub mod id;
pub mod prelude;
pub mod schema;
pub mod span;
pub mod time;
