//! # upwatch-core
//!
//! Live polling and incremental-streaming engine behind `upwatch watch` and
//! `upwatch follow`.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐  resolve once  ┌───────────────┐
//! │   selector   │───────────────►│ ItemDirectory │
//! └──────────────┘                └───────────────┘
//! ┌──────────────┐  every tick    ┌───────────────┐   ┌──────────┐
//! │   PollLoop   │───────────────►│SnapshotFetcher│──►│ Status   │
//! │ (watermark)  │                │  (timeout)    │   │ Provider │
//! └──────┬───────┘                └───────────────┘   └──────────┘
//!        │ batch / error
//!        ▼
//! ┌──────────────┐
//! │   Renderer   │
//! └──────────────┘
//! ```
//!
//! The backend and the output are traits ([`StatusProvider`],
//! [`ItemDirectory`], [`Renderer`]); this crate performs no I/O of its own
//! beyond checking whether stdout is a terminal.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod fetcher;
pub mod interactive;
pub mod poll;
pub mod provider;
pub mod selector;
pub mod types;
pub mod watermark;
pub mod window;

pub use error::{FetchError, RenderError, Result, WatchError};
pub use fetcher::{PollResult, SnapshotFetcher};
pub use interactive::{Mode, is_interactive};
pub use poll::{Batch, DisplayMode, PollConfig, PollLoop, Records, Renderer, StopReason};
pub use provider::{ItemDirectory, StatusProvider};
pub use selector::{TargetSelector, resolve};
pub use types::{CheckOutcome, Event, ItemStatus, ItemSummary, ProbeStatus, StableId};
pub use watermark::Watermark;
pub use window::{TimeWindow, parse_time_expr};
