//! Configuration validation
//!
//! This module provides validation logic for all configuration structures.
//!
//! - `trait_def`: Core Validate trait definition
//! - `config_validators`: Gateway, server and provider validators
//! - `pipeline_validators`: Storage, queue and pipeline validators
//! - `tests`: Test suite for all validators

mod config_validators;
mod pipeline_validators;
mod trait_def;

pub use trait_def::Validate;
