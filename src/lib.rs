//! bpx: blueprint explorer
//!
//! Command-line front end over [`bpx_core`]: loads a blueprint dump, runs
//! ranked searches against it and prints record trees and reference lists.
//! The modules are public so that the integration tests can drive the same
//! code paths as the binary.
//!
//! # Architecture
//!
//! ```text
//! main ──► cli ──► bpx_core (load, search, graph)
//!           │
//!           ├──► command (interactive `:` commands)
//!           └──► render  (plain-text output)
//! ```

pub mod cli;
pub mod command;
pub mod render;
