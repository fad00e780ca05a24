//! Multitool Client Library
//!
//! Network services and the command-line front end. Exposed as a library so
//! integration tests can drive commands against local mock servers.

pub mod args;
pub mod commands;
pub mod logging;
pub mod services;
