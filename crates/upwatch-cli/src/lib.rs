//! # upwatch-cli
//!
//! Command-line front end for the upwatch monitoring API.
//!
//! Provides two live commands:
//! - `watch`: a refreshing status dashboard for one or all probes
//! - `follow`: a `tail -f` style stream of check results for one probe
//!
//! # Architecture
//!
//! The polling engine lives in `upwatch-core`. This crate supplies its two
//! plug points: [`client::ApiClient`] speaks the REST API, and
//! [`output::TerminalRenderer`] draws batches as tables, JSON, or YAML.
//!
//! ```text
//! ┌─────────────┐   HTTPS + JSON   ┌──────────────────┐
//! │ upwatch-cli │◄────────────────►│  monitoring API  │
//! └─────────────┘   (bearer auth)  └──────────────────┘
//! ```
//!
//! When stdout is not a terminal both commands print once and exit, so they
//! compose with pipes and scripts.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cli;
pub mod client;
pub mod commands;
pub mod error;
pub mod output;

pub use cli::{Cli, Commands, FollowArgs, Format, WatchArgs};
pub use client::{ApiClient, ClientConfig};
pub use error::CliError;
pub use output::{OutputFormat, TerminalRenderer};
