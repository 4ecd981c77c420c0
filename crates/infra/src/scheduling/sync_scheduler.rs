//! Cron-driven scheduler for calendar sync cycles.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use slotwise_core::SyncService;
//! use slotwise_infra::scheduling::{SchedulerResult, SyncScheduler};
//!
//! # async fn example(service: Arc<SyncService>) -> SchedulerResult<()> {
//! let mut scheduler = SyncScheduler::new(service);
//! scheduler.start().await?;
//! // ... application runs ...
//! scheduler.stop().await?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::time::{Duration, Instant};

use slotwise_core::SyncService;
use tokio::task::JoinHandle;
use tokio_cron_scheduler::{Job, JobScheduler};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use crate::scheduling::error::{SchedulerError, SchedulerResult};

const SECONDS_PER_HOUR: u64 = 3600;
const HOURLY_CRON: &str = "0 0 * * * *";

/// Six-field cron expression (with seconds) for a sync interval.
///
/// Sub-minute intervals tick on a seconds step, whole minutes below an hour
/// tick on a minutes step, anything else runs hourly.
pub fn cron_for_interval(interval_seconds: u64) -> String {
    match interval_seconds {
        0 => "*/1 * * * * *".to_string(),
        secs if secs < 60 => format!("*/{secs} * * * * *"),
        secs if secs % 60 == 0 && secs < SECONDS_PER_HOUR => format!("0 */{} * * * *", secs / 60),
        _ => HOURLY_CRON.to_string(),
    }
}

#[derive(Debug, Clone)]
pub struct SyncSchedulerConfig {
    pub cron_expression: String,
    /// Upper bound for a single sync cycle
    pub job_timeout: Duration,
    pub start_timeout: Duration,
    pub stop_timeout: Duration,
    pub join_timeout: Duration,
}

impl SyncSchedulerConfig {
    pub fn from_interval(interval_seconds: u64) -> Self {
        Self { cron_expression: cron_for_interval(interval_seconds), ..Self::default() }
    }
}

impl Default for SyncSchedulerConfig {
    fn default() -> Self {
        Self {
            cron_expression: cron_for_interval(60),
            job_timeout: Duration::from_secs(300),
            start_timeout: Duration::from_secs(5),
            stop_timeout: Duration::from_secs(5),
            join_timeout: Duration::from_secs(5),
        }
    }
}

/// Runs `SyncService::run_cycle` on a cron schedule
pub struct SyncScheduler {
    scheduler: Option<JobScheduler>,
    config: SyncSchedulerConfig,
    monitor_handle: Option<JoinHandle<()>>,
    cancellation: CancellationToken,
    service: Arc<SyncService>,
}

impl SyncScheduler {
    /// Scheduler whose cron follows the service's `interval_seconds`.
    pub fn new(service: Arc<SyncService>) -> Self {
        let config = SyncSchedulerConfig::from_interval(service.config().interval_seconds);
        Self::with_config(config, service)
    }

    pub fn with_config(config: SyncSchedulerConfig, service: Arc<SyncService>) -> Self {
        Self {
            scheduler: None,
            config,
            monitor_handle: None,
            cancellation: CancellationToken::new(),
            service,
        }
    }

    pub fn config(&self) -> &SyncSchedulerConfig {
        &self.config
    }

    /// Register the sync job and start ticking.
    ///
    /// # Errors
    ///
    /// `AlreadyRunning` when started twice; `JobRegistrationFailed` for an
    /// invalid cron expression.
    #[instrument(skip(self), fields(cron = %self.config.cron_expression))]
    pub async fn start(&mut self) -> SchedulerResult<()> {
        if self.is_running() {
            return Err(SchedulerError::AlreadyRunning);
        }

        self.cancellation = CancellationToken::new();

        let scheduler_instance = self.build_scheduler().await?;
        let start_timeout = self.config.start_timeout;

        tokio::time::timeout(start_timeout, scheduler_instance.start())
            .await
            .map_err(|_| SchedulerError::Timeout { seconds: start_timeout.as_secs() })?
            .map_err(|err| SchedulerError::StartFailed(err.to_string()))?;

        self.scheduler = Some(scheduler_instance);

        let cancel = self.cancellation.clone();
        self.monitor_handle = Some(tokio::spawn(async move {
            cancel.cancelled().await;
            debug!("Sync scheduler monitor cancelled");
        }));

        info!("Sync scheduler started");
        Ok(())
    }

    /// Shut the cron scheduler down and wait for the monitor task.
    #[instrument(skip(self))]
    pub async fn stop(&mut self) -> SchedulerResult<()> {
        let Some(mut scheduler) = self.scheduler.take() else {
            return Err(SchedulerError::NotRunning);
        };

        self.cancellation.cancel();

        let stop_timeout = self.config.stop_timeout;
        tokio::time::timeout(stop_timeout, async move { scheduler.shutdown().await })
            .await
            .map_err(|_| SchedulerError::Timeout { seconds: stop_timeout.as_secs() })?
            .map_err(|err| SchedulerError::StopFailed(err.to_string()))?;

        if let Some(handle) = self.monitor_handle.take() {
            let join_timeout = self.config.join_timeout;
            tokio::time::timeout(join_timeout, handle)
                .await
                .map_err(|_| SchedulerError::Timeout { seconds: join_timeout.as_secs() })??;
        }

        info!("Sync scheduler stopped");
        self.cancellation = CancellationToken::new();
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.scheduler.is_some()
    }

    async fn build_scheduler(&self) -> SchedulerResult<JobScheduler> {
        let scheduler = JobScheduler::new()
            .await
            .map_err(|err| SchedulerError::CreationFailed(err.to_string()))?;
        let service = Arc::clone(&self.service);
        let job_timeout = self.config.job_timeout;

        let job = Job::new_async(self.config.cron_expression.as_str(), move |_id, _lock| {
            let service = Arc::clone(&service);
            Box::pin(async move {
                Self::run_job(service, job_timeout).await;
            })
        })
        .map_err(|err| SchedulerError::JobRegistrationFailed(err.to_string()))?;

        let job_id = job.guid();
        scheduler
            .add(job)
            .await
            .map_err(|err| SchedulerError::JobRegistrationFailed(err.to_string()))?;

        debug!(cron = %self.config.cron_expression, job_id = %job_id, "Registered sync job");
        Ok(scheduler)
    }

    async fn run_job(service: Arc<SyncService>, job_timeout: Duration) {
        let started = Instant::now();
        match tokio::time::timeout(job_timeout, service.run_cycle()).await {
            Ok(Ok(report)) if report.skipped => debug!("Sync disabled; cycle skipped"),
            Ok(Ok(report)) => debug!(
                users = report.users_processed,
                failed_users = report.users_failed,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Sync cycle completed"
            ),
            Ok(Err(err)) => error!(error = %err, "Sync cycle failed"),
            Err(_) => warn!(timeout_secs = job_timeout.as_secs(), "Sync cycle timed out"),
        }
    }
}

impl Drop for SyncScheduler {
    fn drop(&mut self) {
        if self.is_running() {
            warn!("SyncScheduler dropped while running; cancelling tasks");
            self.cancellation.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use slotwise_core::{CalendarClient, CalendarGateway, UserRepository};
    use slotwise_domain::{GoogleTokens, NewUser, SyncConfig, User};
    use tempfile::TempDir;

    use super::*;
    use crate::database::{DbManager, SqliteBookingRepository, SqliteUserRepository};

    #[derive(Default)]
    struct CountingGateway {
        lookups: AtomicUsize,
    }

    impl CalendarGateway for CountingGateway {
        fn client_for(&self, _user: &User) -> Option<Arc<dyn CalendarClient>> {
            self.lookups.fetch_add(1, Ordering::SeqCst);
            None
        }
    }

    struct Fixture {
        _dir: TempDir,
        users: Arc<SqliteUserRepository>,
        gateway: Arc<CountingGateway>,
        service: Arc<SyncService>,
    }

    fn fixture(sync: SyncConfig) -> Fixture {
        let dir = TempDir::new().unwrap();
        let db = Arc::new(DbManager::new(dir.path().join("sync.db"), 2).unwrap());
        db.run_migrations().unwrap();
        let users = Arc::new(SqliteUserRepository::new(Arc::clone(&db)));
        let bookings = Arc::new(SqliteBookingRepository::new(db));
        let gateway = Arc::new(CountingGateway::default());
        let service = Arc::new(SyncService::new(users.clone(), bookings, gateway.clone(), sync));
        Fixture { _dir: dir, users, gateway, service }
    }

    fn fast_config() -> SyncSchedulerConfig {
        SyncSchedulerConfig {
            cron_expression: cron_for_interval(1),
            job_timeout: Duration::from_secs(5),
            ..SyncSchedulerConfig::default()
        }
    }

    #[test]
    fn cron_follows_interval() {
        assert_eq!(cron_for_interval(15), "*/15 * * * * *");
        assert_eq!(cron_for_interval(60), "0 */1 * * * *");
        assert_eq!(cron_for_interval(900), "0 */15 * * * *");
        assert_eq!(cron_for_interval(90), HOURLY_CRON);
        assert_eq!(cron_for_interval(7200), HOURLY_CRON);
    }

    #[test]
    fn new_uses_service_interval() {
        let f = fixture(SyncConfig { interval_seconds: 300, ..SyncConfig::default() });
        let scheduler = SyncScheduler::new(f.service);
        assert_eq!(scheduler.config().cron_expression, "0 */5 * * * *");
        assert!(!scheduler.is_running());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn lifecycle_rejects_double_start_and_stop() {
        let f = fixture(SyncConfig::default());
        let mut scheduler = SyncScheduler::with_config(fast_config(), f.service);

        assert!(matches!(scheduler.stop().await, Err(SchedulerError::NotRunning)));

        scheduler.start().await.expect("start succeeds");
        assert!(scheduler.is_running());
        assert!(matches!(scheduler.start().await, Err(SchedulerError::AlreadyRunning)));

        scheduler.stop().await.expect("stop succeeds");
        assert!(!scheduler.is_running());

        scheduler.start().await.expect("restart succeeds");
        scheduler.stop().await.expect("stop again");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn invalid_cron_is_a_registration_failure() {
        let f = fixture(SyncConfig::default());
        let config = SyncSchedulerConfig { cron_expression: "not a cron".into(), ..fast_config() };
        let mut scheduler = SyncScheduler::with_config(config, f.service);

        let err = scheduler.start().await.unwrap_err();
        assert!(matches!(err, SchedulerError::JobRegistrationFailed(_)));
        assert!(!scheduler.is_running());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn ticks_run_sync_cycles() {
        let f = fixture(SyncConfig::default());
        let user = NewUser {
            email: "host@example.com".into(),
            scheduling_slug: "host".into(),
            ..NewUser::default()
        };
        let user = f.users.create(user).await.unwrap();
        let tokens = GoogleTokens {
            access_token: "at".into(),
            refresh_token: Some("rt".into()),
            expires_in: None,
        };
        f.users.connect_google(user.id, Some("gid"), &tokens).await.unwrap();

        let mut scheduler = SyncScheduler::with_config(fast_config(), Arc::clone(&f.service));
        scheduler.start().await.unwrap();
        tokio::time::sleep(Duration::from_millis(2500)).await;
        scheduler.stop().await.unwrap();

        assert!(f.gateway.lookups.load(Ordering::SeqCst) >= 1);
    }
}
