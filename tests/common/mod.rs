//! Shared test utilities for bpx integration harnesses.
//!
//! Import everything you need via `mod common; use common::*;` at the top of
//! each harness file. Every fixture is deterministic: GUIDs come from
//! [`guid`], payloads are built in a fixed member order.

#![allow(dead_code)]

pub mod assertions;
pub mod builders;
pub mod fixtures;

pub use assertions::*;
pub use builders::*;
pub use fixtures::*;
