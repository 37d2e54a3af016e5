//! Check-result tailing for one probe.

use std::io::Write;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;
use tracing::debug;
use upwatch_core::{
    CheckOutcome, ItemDirectory, Mode, PollConfig, PollLoop, Renderer, StatusProvider,
    StopReason, TargetSelector, TimeWindow, resolve,
};

use crate::cli::FollowArgs;
use crate::client::{ApiClient, ClientConfig};
use crate::error::CliError;
use crate::output::{OutputFormat, TerminalRenderer};

/// Follow command executor.
pub struct FollowCommand {
    client: ClientConfig,
}

impl FollowCommand {
    /// Create a new follow command.
    #[must_use]
    pub const fn new(client: ClientConfig) -> Self {
        Self { client }
    }

    /// Execute the follow command against the configured API.
    ///
    /// # Errors
    ///
    /// Returns an error for invalid arguments, an unresolvable target, or a
    /// failed one-shot fetch.
    pub async fn execute<W: Write, E: Write>(
        &self,
        writer: &mut W,
        errors: &mut E,
        format: &OutputFormat,
        args: &FollowArgs,
        mode: Mode,
        cancel: CancellationToken,
    ) -> Result<StopReason, CliError> {
        let config = Self::config(args, self.client.timeout, Utc::now())?;
        let client = ApiClient::new(&self.client)?;
        let renderer = TerminalRenderer::new(writer, errors, format.clone(), mode.is_continuous());
        Self::run(client, renderer, &args.target, args.outcome, config, mode, cancel).await
    }

    /// Validate arguments into a poll configuration. No network access.
    ///
    /// The selector is a placeholder until [`FollowCommand::run`] resolves
    /// the target.
    ///
    /// # Errors
    ///
    /// Returns an error for a short interval, an unparseable or inverted
    /// window, or a zero limit.
    pub fn config(
        args: &FollowArgs,
        fetch_timeout: Duration,
        now: DateTime<Utc>,
    ) -> Result<PollConfig, CliError> {
        let window = TimeWindow::parse(args.since.as_deref(), args.until.as_deref(), now)?;
        let config = PollConfig::new(args.interval, TargetSelector::All { status: None }, window)?
            .with_fetch_timeout(fetch_timeout)?
            .with_event_limit(args.limit)?;
        Ok(config)
    }

    /// Resolve the target and tail its results.
    ///
    /// # Errors
    ///
    /// Returns an error if the target cannot be resolved or a one-shot poll
    /// fails.
    pub async fn run<P, R>(
        provider: P,
        renderer: R,
        target: &str,
        outcome: Option<CheckOutcome>,
        config: PollConfig,
        mode: Mode,
        cancel: CancellationToken,
    ) -> Result<StopReason, CliError>
    where
        P: StatusProvider + ItemDirectory,
        R: Renderer,
    {
        let id = resolve(&provider, target).await?;
        debug!(%id, target, "resolved follow target");
        let config = config.with_selector(TargetSelector::Item(id));
        let mut poll = PollLoop::new(provider, renderer, config, cancel).with_outcome_filter(outcome);
        Ok(poll.follow(mode).await?)
    }
}
