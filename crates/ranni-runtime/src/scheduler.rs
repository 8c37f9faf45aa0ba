//! Cron jobs.
//!
//! Each registered job gets its own task that sleeps until the next instant
//! of its schedule, starts the job, and repeats until shutdown. Jobs are
//! spawned, so a slow run never delays the next tick.
//!
//! Expressions use the `cron` crate syntax with a leading seconds field:
//! `"0 30 8 * * *"` fires every day at 08:30:00 UTC.

use std::future::Future;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use cron::Schedule;
use futures::future::BoxFuture;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, info, info_span};

use ranni_framework::Gateway;

use crate::error::{RuntimeError, RuntimeResult};

/// A job body. Receives the gateway so it can send on its own.
pub type CronJob = Arc<dyn Fn(Gateway) -> BoxFuture<'static, ()> + Send + Sync>;

/// A parsed schedule plus the job it drives.
#[derive(Clone)]
pub struct CronTask {
    expr: String,
    schedule: Schedule,
    job: CronJob,
}

impl CronTask {
    /// Parses `expr`; an invalid expression is an error, not a panic.
    pub fn new<F, Fut>(expr: &str, job: F) -> RuntimeResult<Self>
    where
        F: Fn(Gateway) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let schedule = Schedule::from_str(expr).map_err(|e| RuntimeError::InvalidCron {
            expr: expr.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            expr: expr.to_string(),
            schedule,
            job: Arc::new(move |gateway| Box::pin(job(gateway))),
        })
    }

    pub fn expr(&self) -> &str {
        &self.expr
    }

    /// The first instant strictly after `now`, if the schedule has one.
    pub fn next_after(&self, now: &DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.schedule.after(now).next()
    }

    async fn run(self, gateway: Gateway, shutdown: CancellationToken) {
        loop {
            let now = Utc::now();
            let Some(next) = self.next_after(&now) else {
                debug!("Schedule has no upcoming instant");
                break;
            };
            let wait = (next - now).to_std().unwrap_or(Duration::ZERO);

            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = tokio::time::sleep(wait) => {}
            }

            debug!(at = %next, "Cron job fired");
            tokio::spawn((self.job)(gateway.clone()).in_current_span());
        }
    }
}

impl std::fmt::Debug for CronTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CronTask").field("expr", &self.expr).finish()
    }
}

/// The set of registered cron jobs.
#[derive(Debug, Default, Clone)]
pub struct Scheduler {
    tasks: Vec<CronTask>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, task: CronTask) {
        self.tasks.push(task);
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Starts one task per job. They all stop when `shutdown` is cancelled;
    /// job runs already in flight are left to finish.
    pub fn start(&self, gateway: &Gateway, shutdown: &CancellationToken) -> Vec<JoinHandle<()>> {
        if !self.tasks.is_empty() {
            info!(jobs = self.tasks.len(), "Starting cron scheduler");
        }
        self.tasks
            .iter()
            .cloned()
            .map(|task| {
                let span = info_span!("cron", expr = %task.expr);
                tokio::spawn(task.run(gateway.clone(), shutdown.clone()).instrument(span))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;
    use chrono::TimeZone;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn noop(_gateway: Gateway) -> impl Future<Output = ()> + Send {
        async {}
    }

    #[test]
    fn invalid_expression_is_error() {
        let err = CronTask::new("every minute", noop).unwrap_err();
        assert!(matches!(err, RuntimeError::InvalidCron { ref expr, .. } if expr == "every minute"));
    }

    #[test]
    fn next_after_follows_schedule() {
        let task = CronTask::new("0 30 8 * * *", noop).unwrap();
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap();
        assert_eq!(
            task.next_after(&now),
            Some(Utc.with_ymd_and_hms(2024, 5, 2, 8, 30, 0).unwrap())
        );
    }

    #[tokio::test]
    async fn job_fires_and_stops_on_shutdown() {
        let counter = Arc::new(AtomicUsize::new(0));
        let counter_clone = Arc::clone(&counter);
        let task = CronTask::new("* * * * * *", move |gateway: Gateway| {
            let counter = Arc::clone(&counter_clone);
            async move {
                let _ = gateway.send_to_group(1, &"tick".into()).await;
                counter.fetch_add(1, Ordering::SeqCst);
            }
        })
        .unwrap();

        let mut scheduler = Scheduler::new();
        scheduler.add(task);
        assert_eq!(scheduler.len(), 1);

        let (caller, gateway) = testing::gateway();
        let shutdown = CancellationToken::new();
        let handles = scheduler.start(&gateway, &shutdown);

        tokio::time::timeout(Duration::from_secs(3), async {
            while counter.load(Ordering::SeqCst) == 0 {
                tokio::time::sleep(Duration::from_millis(20)).await;
            }
        })
        .await
        .unwrap();
        assert!(!caller.posts_to("/send_msg").is_empty());

        shutdown.cancel();
        for handle in handles {
            tokio::time::timeout(Duration::from_secs(1), handle)
                .await
                .unwrap()
                .unwrap();
        }
    }
}
