//! Clinic - appointment booking for a small clinic
//!
//! This library provides the roster model, its binary data file format and
//! the interactive shell used by the `clinic` binary.

pub mod cli;
pub mod codec;
pub mod config;
pub mod model;
pub mod roster;
pub mod session;
pub mod store;
pub mod transcript;
pub mod utils;

#[cfg(test)]
mod test_utils;
