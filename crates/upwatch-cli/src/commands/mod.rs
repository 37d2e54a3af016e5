//! Command implementations.
//!
//! Each command validates its arguments before touching the network, then
//! resolves the target once and hands off to the poll loop.

mod follow;
mod watch;

pub use follow::FollowCommand;
pub use watch::WatchCommand;

#[cfg(test)]
pub(crate) mod fake;
