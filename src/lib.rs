pub mod config;
pub mod db;
pub mod entities;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod realtime;
pub mod routes;
pub mod services;
pub mod utils;

use std::sync::Arc;

use sea_orm::DatabaseConnection;

pub use config::Config;
pub use error::{AppError, AppResult};

use realtime::registry::ConnectionRegistry;
use services::dispatch::{DispatchContext, DispatchQueue};
use services::geocoding::Geocoder;
use services::notifier::Notifier;

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub config: Config,
    pub geocoder: Arc<dyn Geocoder>,
    pub registry: Arc<ConnectionRegistry>,
    pub notifier: Notifier,
    pub dispatch: DispatchQueue,
}

impl AppState {
    /// Wire the registry, notifier and dispatch pool around a database and a
    /// geocoder. Spawns the dispatch workers, so a tokio runtime must be running.
    pub fn new(db: DatabaseConnection, config: Config, geocoder: Arc<dyn Geocoder>) -> Self {
        let registry = Arc::new(ConnectionRegistry::new());
        let notifier = Notifier::new(registry.clone());

        let dispatch = DispatchQueue::start(
            DispatchContext {
                db: db.clone(),
                geocoder: geocoder.clone(),
                notifier: notifier.clone(),
                radius_km: config.matching_radius_km,
                lookup_timeout: config.geocoding_timeout(),
            },
            config.dispatch_workers,
            config.dispatch_queue_size,
        );

        Self {
            db,
            config,
            geocoder,
            registry,
            notifier,
            dispatch,
        }
    }
}
