//! Shared utilities for the idobata binaries.
//!
//! Holds the pieces both the server and the client need: logger setup and
//! wall-clock helpers.

pub mod logger;
pub mod time;
