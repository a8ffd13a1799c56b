//! goalcore: category hierarchy and rate-limit aware API access for the
//! goal-tracking platform.
//!
//! Layers, innermost first:
//! - [`domain`]: categories, the category forest, outcomes and retry policy
//! - [`application`]: the retry executor and the category service
//! - [`infrastructure`]: HTTP transport, category sources, DI container
//! - [`cli`]: argument parsing and command handlers

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;
