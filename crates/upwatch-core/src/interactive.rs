//! Interactive vs. non-interactive execution.

use std::io::{self, IsTerminal};

/// How a polling command runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// One fetch and one render, then exit. Used when stdout is piped.
    OneShot,
    /// Poll on an interval until cancelled.
    Continuous,
}

impl Mode {
    /// Picks the mode for the current process.
    #[must_use]
    pub fn detect() -> Self {
        Self::from_interactive(is_interactive())
    }

    /// Maps an interactivity decision to a mode.
    #[must_use]
    pub const fn from_interactive(interactive: bool) -> Self {
        if interactive {
            Self::Continuous
        } else {
            Self::OneShot
        }
    }

    /// True for [`Mode::Continuous`].
    #[must_use]
    pub const fn is_continuous(self) -> bool {
        matches!(self, Self::Continuous)
    }
}

/// Returns true only if stdout is attached to a terminal.
///
/// Any platform that cannot tell reports `false`, so a command exits after one
/// snapshot instead of hanging on a pipe.
#[must_use]
pub fn is_interactive() -> bool {
    io::stdout().is_terminal()
}
