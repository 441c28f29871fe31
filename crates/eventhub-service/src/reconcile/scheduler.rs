//! Cron schedule for the reconciliation pass.

use std::sync::Arc;

use tokio_cron_scheduler::{Job as CronJob, JobScheduler};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use eventhub_core::config::ReconcilerConfig;
use eventhub_core::error::AppError;

use super::reconciler::MembershipReconciler;
use crate::context::RequestContext;

/// Runs [`MembershipReconciler::reconcile_all`] on a cron schedule.
pub struct ReconcileScheduler {
    scheduler: JobScheduler,
    reconciler: Arc<MembershipReconciler>,
    shutdown: CancellationToken,
}

impl std::fmt::Debug for ReconcileScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReconcileScheduler").finish()
    }
}

impl ReconcileScheduler {
    /// Create a scheduler with no jobs registered yet.
    pub async fn new(reconciler: Arc<MembershipReconciler>) -> Result<Self, AppError> {
        let scheduler = JobScheduler::new()
            .await
            .map_err(|e| AppError::internal(format!("Failed to create scheduler: {e}")))?;

        Ok(Self {
            scheduler,
            reconciler,
            shutdown: CancellationToken::new(),
        })
    }

    /// Register the reconciliation job with the configured cron expression.
    pub async fn register(&self, config: &ReconcilerConfig) -> Result<(), AppError> {
        let reconciler = Arc::clone(&self.reconciler);
        let shutdown = self.shutdown.clone();

        let job = CronJob::new_async(config.schedule.as_str(), move |_uuid, _lock| {
            let reconciler = Arc::clone(&reconciler);
            let shutdown = shutdown.clone();
            Box::pin(async move {
                let ctx = RequestContext::system().with_cancellation(shutdown);
                if let Err(e) = reconciler.reconcile_all(&ctx).await {
                    error!(error = %e, "Scheduled reconciliation failed");
                }
            })
        })
        .map_err(|e| {
            AppError::configuration(format!(
                "Invalid reconciler schedule '{}': {e}",
                config.schedule
            ))
        })?;

        self.scheduler
            .add(job)
            .await
            .map_err(|e| AppError::internal(format!("Failed to add reconcile schedule: {e}")))?;

        info!(schedule = %config.schedule, "Registered: membership reconciliation");
        Ok(())
    }

    /// Start firing jobs.
    pub async fn start(&self) -> Result<(), AppError> {
        self.scheduler
            .start()
            .await
            .map_err(|e| AppError::internal(format!("Failed to start scheduler: {e}")))?;

        info!("Reconcile scheduler started");
        Ok(())
    }

    /// Cancel a running pass and stop the scheduler.
    pub async fn shutdown(&mut self) -> Result<(), AppError> {
        self.shutdown.cancel();
        self.scheduler
            .shutdown()
            .await
            .map_err(|e| AppError::internal(format!("Failed to shutdown scheduler: {e}")))?;

        info!("Reconcile scheduler shut down");
        Ok(())
    }
}
