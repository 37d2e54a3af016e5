//! Live status dashboard.

use std::io::Write;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::debug;
use upwatch_core::{
    ItemDirectory, Mode, PollConfig, PollLoop, Renderer, StatusProvider, StopReason,
    TargetSelector, TimeWindow, resolve,
};

use crate::cli::WatchArgs;
use crate::client::{ApiClient, ClientConfig};
use crate::error::CliError;
use crate::output::{OutputFormat, TerminalRenderer};

/// Watch command executor.
pub struct WatchCommand {
    client: ClientConfig,
}

impl WatchCommand {
    /// Create a new watch command.
    #[must_use]
    pub const fn new(client: ClientConfig) -> Self {
        Self { client }
    }

    /// Execute the watch command against the configured API.
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
        args: &WatchArgs,
        mode: Mode,
        cancel: CancellationToken,
    ) -> Result<StopReason, CliError> {
        let config = Self::config(args, self.client.timeout)?;
        let client = ApiClient::new(&self.client)?;
        let renderer = TerminalRenderer::new(writer, errors, format.clone(), mode.is_continuous());
        Self::run(client, renderer, args.target.as_deref(), config, mode, cancel).await
    }

    /// Validate arguments into a poll configuration. No network access.
    ///
    /// # Errors
    ///
    /// Returns an error if the interval is below the minimum or a probe
    /// target is combined with a status filter.
    pub fn config(args: &WatchArgs, fetch_timeout: Duration) -> Result<PollConfig, CliError> {
        if let (Some(target), Some(status)) = (&args.target, args.status) {
            return Err(CliError::Config(format!(
                "--status {status} filters all probes and cannot be combined with target '{target}'"
            )));
        }
        let selector = TargetSelector::All {
            status: args.status,
        };
        let config = PollConfig::new(args.interval, selector, TimeWindow::unbounded())?
            .with_fetch_timeout(fetch_timeout)?;
        Ok(config)
    }

    /// Resolve the target, if any, and run the dashboard.
    ///
    /// # Errors
    ///
    /// Returns an error if the target cannot be resolved or a one-shot poll
    /// fails.
    pub async fn run<P, R>(
        provider: P,
        renderer: R,
        target: Option<&str>,
        config: PollConfig,
        mode: Mode,
        cancel: CancellationToken,
    ) -> Result<StopReason, CliError>
    where
        P: StatusProvider + ItemDirectory,
        R: Renderer,
    {
        let config = match target {
            Some(target) => {
                let id = resolve(&provider, target).await?;
                debug!(%id, target, "resolved watch target");
                config.with_selector(TargetSelector::Item(id))
            }
            None => config,
        };
        let mut poll = PollLoop::new(provider, renderer, config, cancel);
        Ok(poll.watch(mode).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Format;
    use crate::commands::fake::{FakeApi, id, probe};
    use upwatch_core::{ProbeStatus, WatchError};

    fn args(target: Option<&str>, status: Option<ProbeStatus>, secs: u64) -> WatchArgs {
        WatchArgs {
            target: target.map(String::from),
            status,
            interval: Duration::from_secs(secs),
        }
    }

    fn renderer(format: Format) -> TerminalRenderer<Vec<u8>, Vec<u8>> {
        TerminalRenderer::new(Vec::new(), Vec::new(), OutputFormat::new(format), false)
    }

    #[test]
    fn config_rejects_target_with_status() {
        let err = WatchCommand::config(&args(Some("api"), Some(ProbeStatus::Down), 5), Duration::from_secs(10))
            .expect_err("should reject");
        assert!(matches!(err, CliError::Config(_)));
        assert!(err.to_string().contains("--status down"));
    }

    #[test]
    fn config_rejects_short_interval() {
        let mut a = args(None, None, 0);
        a.interval = Duration::from_millis(500);
        let err = WatchCommand::config(&a, Duration::from_secs(10)).expect_err("should reject");
        assert!(matches!(err, CliError::Watch(WatchError::IntervalTooShort { .. })));
    }

    #[test]
    fn config_carries_status_filter() {
        let config = WatchCommand::config(&args(None, Some(ProbeStatus::Down), 30), Duration::from_secs(3))
            .expect("valid");
        assert_eq!(
            *config.selector(),
            TargetSelector::All {
                status: Some(ProbeStatus::Down)
            }
        );
        assert_eq!(config.interval(), Duration::from_secs(30));
        assert_eq!(config.fetch_timeout(), Duration::from_secs(3));
    }

    #[tokio::test]
    async fn one_shot_lists_all_probes() {
        let api = FakeApi::with_probes(&["api", "web"]);
        let config = WatchCommand::config(&args(None, None, 5), Duration::from_secs(1)).expect("valid");
        let mut out = Vec::new();
        let mut err = Vec::new();
        let renderer = TerminalRenderer::new(&mut out, &mut err, OutputFormat::new(Format::Json), false);

        let reason = WatchCommand::run(&api, renderer, None, config, Mode::OneShot, CancellationToken::new())
            .await
            .expect("should run");

        assert_eq!(reason, StopReason::Completed);
        let parsed: serde_json::Value = serde_json::from_slice(&out).expect("json");
        assert_eq!(parsed.as_array().map(Vec::len), Some(2));
        assert!(api.searches.lock().is_empty());
    }

    #[tokio::test]
    async fn named_target_is_resolved_once() {
        let api = FakeApi::with_probes(&["checkout", "web"]);
        let config = WatchCommand::config(&args(Some("checkout"), None, 5), Duration::from_secs(1)).expect("valid");

        WatchCommand::run(&api, renderer(Format::Table), Some("checkout"), config, Mode::OneShot, CancellationToken::new())
            .await
            .expect("should run");

        assert_eq!(*api.searches.lock(), vec!["checkout".to_string()]);
        assert_eq!(*api.snapshots.lock(), vec![TargetSelector::Item(id(1))]);
    }

    #[tokio::test]
    async fn uuid_target_skips_search() {
        let api = FakeApi::with_probes(&["checkout"]);
        let target = id(1).to_string();
        let config = WatchCommand::config(&args(Some(&target), None, 5), Duration::from_secs(1)).expect("valid");

        WatchCommand::run(&api, renderer(Format::Table), Some(&target), config, Mode::OneShot, CancellationToken::new())
            .await
            .expect("should run");

        assert!(api.searches.lock().is_empty());
    }

    #[tokio::test]
    async fn ambiguous_target_fails_before_polling() {
        let api = FakeApi::with_probes(&["api-gateway", "api-server"]);
        let config = WatchCommand::config(&args(Some("api"), None, 5), Duration::from_secs(1)).expect("valid");

        let err = WatchCommand::run(&api, renderer(Format::Table), Some("api"), config, Mode::OneShot, CancellationToken::new())
            .await
            .expect_err("should fail");

        assert!(matches!(err, CliError::Watch(WatchError::Ambiguous { .. })));
        assert!(api.snapshots.lock().is_empty());
    }

    #[tokio::test]
    async fn status_filter_reaches_provider() {
        let mut api = FakeApi::with_probes(&["api"]);
        api.probes.push(probe(2, "web", ProbeStatus::Down));
        let config = WatchCommand::config(&args(None, Some(ProbeStatus::Down), 5), Duration::from_secs(1)).expect("valid");
        let mut out = Vec::new();
        let mut err = Vec::new();
        let renderer = TerminalRenderer::new(&mut out, &mut err, OutputFormat::new(Format::Table), false);

        WatchCommand::run(&api, renderer, None, config, Mode::OneShot, CancellationToken::new())
            .await
            .expect("should run");

        let text = String::from_utf8(out).expect("utf8");
        assert!(text.contains("web"));
        assert!(text.contains("1 probe: 1 down"));
    }

    #[tokio::test]
    async fn cancelled_before_start_does_nothing() {
        let api = FakeApi::with_probes(&["api"]);
        let config = WatchCommand::config(&args(None, None, 5), Duration::from_secs(1)).expect("valid");
        let cancel = CancellationToken::new();
        cancel.cancel();

        let reason = WatchCommand::run(&api, renderer(Format::Table), None, config, Mode::Continuous, cancel)
            .await
            .expect("should stop");

        assert_eq!(reason, StopReason::Cancelled);
        assert!(api.snapshots.lock().is_empty());
    }
}
