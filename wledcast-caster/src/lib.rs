//! # wledcast-caster
//!
//! Command-line caster that streams generated frames onto WLED (or any
//! DDP receiver) through a `wledcast-core` mapping.
//!
//! Configuration comes from a TOML file (see [`config::CasterConfig`]);
//! a few settings can be overridden on the command line.

pub mod config;
pub mod service;
