//! Scheduler for running periodic tasks.
//!
//! The scheduler can be configured with a start time and execution frequency,
//! and aligns every run with that schedule.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use time::OffsetDateTime;
use tracing::{Instrument as _, Level, event, span};

/// Configuration for scheduling a periodic task.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Scheduler {
    /// An RFC3339 timestamp to start the schedule from (if omitted or empty, defaults to now)
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub from: Option<time::OffsetDateTime>,
    /// How often to run the task
    #[serde(default, with = "humantime_serde::option")]
    pub every: Option<Duration>,
}

impl Scheduler {
    /// The first run time at or after `now`.
    pub fn first_run(&self, now: OffsetDateTime, every: Duration) -> OffsetDateTime {
        match self.from {
            Some(mut from) if from < now => {
                let x = ((now - from) / every).ceil() as u32;
                from += every * x;
                from
            }
            Some(from) => from,
            None => now,
        }
    }

    /// Run `f` at every scheduled time, until it fails.
    ///
    /// Returns `Ok(())` immediately if no (or a zero) interval is configured.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use std::time::Duration;
    /// use time::OffsetDateTime;
    /// use adxdemo::Scheduler;
    ///
    /// # fn main() -> Result<(), String> {
    /// let scheduler = Scheduler {
    ///     from: Some(OffsetDateTime::now_utc()),
    ///     every: Some(Duration::from_secs(60)),
    /// };
    ///
    /// # tokio_test::block_on(async {
    /// scheduler.schedule(async |timestamp| {
    ///     println!("Sweeping at {}", timestamp);
    ///     Ok::<(), String>(())
    /// }).await?;
    /// # Ok(())
    /// # })
    /// # }
    /// ```
    pub async fn schedule<T, E>(
        &self,
        f: impl AsyncFn(OffsetDateTime) -> Result<T, E>,
    ) -> Result<(), E> {
        let Some(delta) = self.every.filter(|every| !every.is_zero()) else {
            return Ok(());
        };

        let now = OffsetDateTime::now_utc();
        let mut anchor = self.first_run(now, delta);

        // align the clocks as best we can
        let sleepy = Duration::try_from(anchor - now).unwrap_or_default();
        tokio::time::sleep(sleepy).await;

        let mut interval = tokio::time::interval(delta);

        loop {
            interval.tick().await;

            let span = span!(Level::INFO, "running scheduled task");
            async {
                event!(Level::DEBUG, %anchor, "scheduled run");
                f(anchor).await
            }
            .instrument(span)
            .await?;

            anchor += delta;
        }
    }
}
