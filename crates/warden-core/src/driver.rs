//! The fixed-rate tick driver.
//!
//! [`run_tick_driver`] calls [`SessionManager::tick`] once per interval
//! until a [`DriverControl`] stop is requested or the configured tick limit
//! is reached. Late ticks are skipped rather than bunched up, so a slow
//! tick never causes a burst of catch-up ticks.
//!
//! The driver must run on the thread the session manager was built on
//! (a current-thread runtime, or `block_on` from that thread), because
//! sessions are only created there.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use tokio::sync::Notify;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, info};
use warden_session::SessionManager;

use crate::config::DriverConfig;

/// Errors that prevent the driver from running.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DriverError {
    /// A zero tick interval would spin.
    #[error("tick interval must be greater than zero")]
    ZeroInterval,
}

/// Why the driver returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverEndReason {
    /// The configured `max_ticks` were run.
    MaxTicksReached,
    /// A stop was requested through [`DriverControl`].
    Stopped,
}

/// Totals over a driver run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriverSummary {
    /// Why the driver returned.
    pub end_reason: DriverEndReason,
    /// Ticks executed.
    pub total_ticks: u64,
    /// Actor ticks that failed, summed over all ticks.
    pub failed_actor_ticks: u64,
    /// Handler failures, summed over all ticks.
    pub handler_failures: u64,
}

/// Shared stop switch for a running driver.
#[derive(Debug, Default)]
pub struct DriverControl {
    stop_requested: AtomicBool,
    stop_notify: Notify,
    ticks: AtomicU64,
}

impl DriverControl {
    /// A control with no stop requested.
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask the driver to stop before its next tick.
    pub fn request_stop(&self) {
        self.stop_requested.store(true, Ordering::Release);
        self.stop_notify.notify_one();
    }

    /// Whether a stop has been requested.
    pub fn is_stop_requested(&self) -> bool {
        self.stop_requested.load(Ordering::Acquire)
    }

    /// Ticks completed so far.
    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::Acquire)
    }
}

/// Tick `manager` at the configured rate until stopped.
///
/// # Errors
///
/// Returns [`DriverError::ZeroInterval`] if the interval is zero.
pub async fn run_tick_driver(
    manager: &SessionManager,
    control: &DriverControl,
    config: &DriverConfig,
) -> Result<DriverSummary, DriverError> {
    let period = config.tick_interval();
    if period.is_zero() {
        return Err(DriverError::ZeroInterval);
    }

    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut summary = DriverSummary {
        end_reason: DriverEndReason::Stopped,
        total_ticks: 0,
        failed_actor_ticks: 0,
        handler_failures: 0,
    };

    info!(
        tick_interval_ms = config.tick_interval_ms,
        max_ticks = config.max_ticks,
        "tick driver starting"
    );

    loop {
        if control.is_stop_requested() {
            break;
        }
        tokio::select! {
            _ = ticker.tick() => {}
            () = control.stop_notify.notified() => continue,
        }
        if control.is_stop_requested() {
            break;
        }

        let report = manager.tick();
        summary.total_ticks = summary.total_ticks.saturating_add(1);
        summary.failed_actor_ticks = summary
            .failed_actor_ticks
            .saturating_add(u64::try_from(report.failed).unwrap_or(u64::MAX));
        summary.handler_failures = summary
            .handler_failures
            .saturating_add(u64::try_from(report.handler_failures).unwrap_or(u64::MAX));
        control.ticks.store(summary.total_ticks, Ordering::Release);

        debug!(
            tick = summary.total_ticks,
            ticked = report.ticked,
            failed = report.failed,
            handler_failures = report.handler_failures,
            evicted = report.evicted,
            "tick complete"
        );

        if config.max_ticks > 0 && summary.total_ticks >= config.max_ticks {
            summary.end_reason = DriverEndReason::MaxTicksReached;
            break;
        }
    }

    info!(
        end_reason = ?summary.end_reason,
        total_ticks = summary.total_ticks,
        failed_actor_ticks = summary.failed_actor_ticks,
        handler_failures = summary.handler_failures,
        "tick driver stopped"
    );
    Ok(summary)
}
