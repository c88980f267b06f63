//! Runs the auto-pay sweep once a day at a fixed local hour.

use std::sync::{Arc, Mutex};

use rusqlite::Connection;
use time::{Duration, OffsetDateTime, PrimitiveDateTime, Time};
use time_tz::{Offset, PrimitiveDateTimeExt, TimeZone};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::{
    Error,
    auto_pay::sweep::sweep_due_transactions,
    timezone::{get_timezone, local_today},
};

/// Settings for the daily auto-pay sweep.
#[derive(Debug, Clone, PartialEq)]
pub struct AutoPayConfig {
    /// Whether the sweep runs at all.
    pub enabled: bool,
    /// The local hour of the day, 0 to 23, at which the sweep runs.
    pub run_at_hour: u8,
}

impl Default for AutoPayConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            run_at_hour: 3,
        }
    }
}

/// Owns the background task that runs the auto-pay sweep every day.
pub struct AutoPayScheduler {
    db_connection: Arc<Mutex<Connection>>,
    local_timezone: String,
    config: AutoPayConfig,
    shutdown_token: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl AutoPayScheduler {
    /// Create a stopped scheduler that sweeps `db_connection` at the configured
    /// hour in `local_timezone`.
    pub fn new(
        db_connection: Arc<Mutex<Connection>>,
        local_timezone: &str,
        config: AutoPayConfig,
    ) -> Self {
        Self {
            db_connection,
            local_timezone: local_timezone.to_owned(),
            config,
            shutdown_token: CancellationToken::new(),
            task: None,
        }
    }

    /// Spawn the background task. Does nothing if the sweep is disabled or the
    /// task is already running.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    /// Returns [Error::InvalidTimezoneError] if the configured timezone is not
    /// a known timezone, or [Error::InvalidInput] if the hour is out of range.
    pub fn start(&mut self) -> Result<(), Error> {
        if !self.config.enabled {
            tracing::info!("Auto-pay disabled by configuration");
            return Ok(());
        }

        if self.is_running() {
            return Ok(());
        }

        if self.config.run_at_hour > 23 {
            return Err(Error::InvalidInput(format!(
                "auto-pay hour must be from 0 to 23, got {}",
                self.config.run_at_hour
            )));
        }

        let timezone = get_timezone(&self.local_timezone)?;

        let db_connection = self.db_connection.clone();
        let local_timezone = self.local_timezone.clone();
        let run_at_hour = self.config.run_at_hour;
        let shutdown = self.shutdown_token.clone();

        tracing::info!(run_at_hour, timezone = %local_timezone, "Starting auto-pay scheduler");

        self.task = Some(tokio::spawn(async move {
            loop {
                let wait = time_until_next_run(OffsetDateTime::now_utc(), timezone, run_at_hour);

                tracing::debug!("Next auto-pay sweep in {} seconds", wait.as_secs());

                tokio::select! {
                    _ = shutdown.cancelled() => {
                        tracing::info!("Auto-pay scheduler shutting down");
                        break;
                    }
                    _ = tokio::time::sleep(wait) => {
                        if let Err(error) = run_sweep(&db_connection, &local_timezone) {
                            tracing::error!("Auto-pay sweep failed: {error}");
                        }
                    }
                }
            }
        }));

        Ok(())
    }

    /// Stop the background task and wait for it to finish.
    ///
    /// A sweep that is already running completes first.
    pub async fn stop(&mut self) {
        self.shutdown_token.cancel();

        if let Some(task) = self.task.take()
            && let Err(error) = task.await
        {
            tracing::error!("Auto-pay scheduler task failed: {error}");
        }
    }

    /// Whether the background task is alive.
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Run the sweep immediately, whether or not the scheduler is enabled.
    ///
    /// Returns the number of transactions that were marked as paid.
    ///
    /// # Errors
    /// Returns an error if the timezone is invalid, the database lock cannot be
    /// acquired or the update fails.
    pub fn run_once(&self) -> Result<usize, Error> {
        run_sweep(&self.db_connection, &self.local_timezone)
    }
}

fn run_sweep(db_connection: &Mutex<Connection>, local_timezone: &str) -> Result<usize, Error> {
    let today = local_today(local_timezone)?;

    let connection = db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let count = sweep_due_transactions(today, &connection)?;
    tracing::info!("Auto-pay marked {count} transactions as paid for {today}");

    Ok(count)
}

/// How long to wait from `now` until the wall clock in `timezone` next reads
/// `run_at_hour:00`.
///
/// If that time has already passed today, or is exactly now, the next run is
/// tomorrow. The UTC offset is resolved for the day of the run, so a daylight
/// saving change in between does not shift the run by an hour. When the hour
/// is skipped by a daylight saving change, the offset from before the change
/// is used, and when it happens twice, the first one counts.
pub fn time_until_next_run<T: TimeZone>(
    now: OffsetDateTime,
    timezone: &T,
    run_at_hour: u8,
) -> std::time::Duration {
    let run_at = Time::from_hms(run_at_hour.min(23), 0, 0).unwrap_or(Time::MIDNIGHT);
    let local_date = now.to_offset(timezone.get_offset_utc(&now).to_utc()).date();

    let next_run = [local_date, local_date + Duration::days(1), local_date + Duration::days(2)]
        .into_iter()
        .map(|date| resolve_local(PrimitiveDateTime::new(date, run_at), timezone))
        .find(|candidate| *candidate > now)
        .unwrap_or(now + Duration::days(1));

    (next_run - now).unsigned_abs()
}

fn resolve_local<T: TimeZone>(local: PrimitiveDateTime, timezone: &T) -> OffsetDateTime {
    local.assume_timezone(timezone).take_first().unwrap_or_else(|| {
        let offset_before = timezone.get_offset_utc(&local.assume_utc()).to_utc();
        local.assume_offset(offset_before)
    })
}
