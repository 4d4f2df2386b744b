//! Core gchat library (dispatcher, providers, config, logging).

pub mod config;
pub mod core;
pub mod logging;
pub mod providers;
