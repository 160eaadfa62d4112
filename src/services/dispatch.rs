//! Bounded background pool for work that runs after a request has been
//! answered, such as announcing a new ride to nearby captains.

use std::sync::Arc;
use std::time::Duration;

use sea_orm::{DatabaseConnection, EntityTrait};
use tokio::sync::{mpsc, Mutex};
use uuid::Uuid;

use crate::entities::ride;
use crate::error::{AppError, AppResult};
use crate::realtime::registry::ActorKey;
use crate::services::geocoding::Geocoder;
use crate::services::notifier::{Notifier, RideEvent};
use crate::services::{proximity, rides, trip_metrics};

#[derive(Debug, Clone)]
pub enum DispatchJob {
    /// Tell every captain near the pickup about a freshly created ride.
    NewRide { ride_id: Uuid, pickup: String },
}

/// Everything a worker needs, without the queue itself.
#[derive(Clone)]
pub struct DispatchContext {
    pub db: DatabaseConnection,
    pub geocoder: Arc<dyn Geocoder>,
    pub notifier: Notifier,
    pub radius_km: f64,
    pub lookup_timeout: Duration,
}

impl DispatchContext {
    pub async fn run(&self, job: DispatchJob) -> AppResult<usize> {
        match job {
            DispatchJob::NewRide { ride_id, pickup } => self.announce_new_ride(ride_id, &pickup).await,
        }
    }

    /// Returns how many captains the event was queued for.
    async fn announce_new_ride(&self, ride_id: Uuid, pickup: &str) -> AppResult<usize> {
        let center = trip_metrics::resolve_point(self.geocoder.as_ref(), pickup, self.lookup_timeout).await?;
        let captains = proximity::captains_within_radius(&self.db, center, self.radius_km).await?;

        let ride = ride::Entity::find_by_id(ride_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::RideNotFound(format!("Ride {} vanished before fan-out", ride_id)))?;
        let view = rides::project(&self.db, &ride).await?;

        let delivered = captains
            .iter()
            .filter(|c| {
                self.notifier
                    .notify(ActorKey::captain(c.id), RideEvent::NewRide, &view)
            })
            .count();

        tracing::info!(
            ride_id = %ride_id,
            matched = captains.len(),
            delivered,
            radius_km = self.radius_km,
            "New ride announced"
        );

        Ok(delivered)
    }
}

#[derive(Clone)]
pub struct DispatchQueue {
    tx: mpsc::Sender<DispatchJob>,
}

impl DispatchQueue {
    /// Spawn `workers` tasks draining a queue of at most `queue_size` jobs.
    /// Must be called inside a tokio runtime.
    pub fn start(context: DispatchContext, workers: usize, queue_size: usize) -> Self {
        let (tx, rx) = mpsc::channel::<DispatchJob>(queue_size.max(1));
        let rx = Arc::new(Mutex::new(rx));

        for worker in 0..workers.max(1) {
            let rx = rx.clone();
            let context = context.clone();

            tokio::spawn(async move {
                loop {
                    let job = rx.lock().await.recv().await;
                    let Some(job) = job else { break };

                    if let Err(e) = context.run(job.clone()).await {
                        tracing::warn!(worker, job = ?job, error = %e, "Dispatch job failed");
                    }
                }
                tracing::debug!(worker, "Dispatch worker stopped");
            });
        }

        Self { tx }
    }

    /// Enqueue without waiting. A full or closed queue drops the job.
    pub fn submit(&self, job: DispatchJob) -> bool {
        match self.tx.try_send(job) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = %e, "Dispatch queue rejected job");
                false
            }
        }
    }
}
