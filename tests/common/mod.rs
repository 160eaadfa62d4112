#![allow(dead_code)]

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbBackend,
    Schema, Set,
};
use uuid::Uuid;

use ride_dispatch_backend::entities::captain::{self, CaptainStatus};
use ride_dispatch_backend::entities::ride::VehicleClass;
use ride_dispatch_backend::entities::{ride, user};
use ride_dispatch_backend::services::geocoding::{
    Coordinates, Geocoder, GeocodingError, RouteEstimate,
};
use ride_dispatch_backend::{AppState, Config};

pub const MG_ROAD: Coordinates = Coordinates {
    lat: 12.9756,
    lng: 77.6050,
};
pub const INDIRANAGAR: Coordinates = Coordinates {
    lat: 12.9784,
    lng: 77.6408,
};

/// In-process stand-in for the maps provider.
#[derive(Default)]
pub struct StubGeocoder {
    points: HashMap<String, Coordinates>,
    route: Option<RouteEstimate>,
    delay: Option<Duration>,
    fail_after: Option<usize>,
    pub geocode_calls: AtomicUsize,
    pub route_calls: AtomicUsize,
}

impl StubGeocoder {
    pub fn new() -> Self {
        Self::default()
            .with_point("MG Road", MG_ROAD)
            .with_point("Indiranagar", INDIRANAGAR)
    }

    pub fn with_point(mut self, address: &str, at: Coordinates) -> Self {
        self.points.insert(address.to_string(), at);
        self
    }

    pub fn with_route(mut self, meters: f64, seconds: f64) -> Self {
        self.route = Some(RouteEstimate { meters, seconds });
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Geocode lookups beyond the first `n` fail.
    pub fn failing_after(mut self, n: usize) -> Self {
        self.fail_after = Some(n);
        self
    }
}

#[async_trait]
impl Geocoder for StubGeocoder {
    async fn geocode(&self, address: &str) -> Result<Coordinates, GeocodingError> {
        let call = self.geocode_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_after.is_some_and(|n| call >= n) {
            return Err(GeocodingError::NoResult(address.to_string()));
        }

        self.points
            .get(address)
            .copied()
            .ok_or_else(|| GeocodingError::NoResult(address.to_string()))
    }

    async fn distance_and_duration(
        &self,
        _origin: Coordinates,
        _destination: Coordinates,
    ) -> Result<RouteEstimate, GeocodingError> {
        self.route_calls.fetch_add(1, Ordering::SeqCst);
        self.route.ok_or(GeocodingError::NoRoute)
    }
}

pub fn test_config() -> Config {
    Config {
        database_url: "sqlite::memory:".to_string(),
        jwt_secret: "test-secret".to_string(),
        jwt_expiration_hours: 1,
        server_host: "127.0.0.1".to_string(),
        server_port: 0,
        maps_api_key: "unused".to_string(),
        maps_base_url: "http://localhost".to_string(),
        geocoding_timeout_secs: 1,
        matching_radius_km: 50.0,
        dispatch_workers: 2,
        dispatch_queue_size: 16,
        connection_buffer: 8,
    }
}

/// Fresh in-memory SQLite database with the ride tables. Single connection, so
/// statements from concurrent tasks run one after another.
pub async fn setup_db() -> DatabaseConnection {
    let mut options = ConnectOptions::new("sqlite::memory:".to_string());
    options.max_connections(1).min_connections(1).sqlx_logging(false);
    let db = Database::connect(options).await.expect("connect sqlite");
    create_tables(&db).await;
    db
}

/// File-backed SQLite database behind a pool of several connections, so
/// concurrent statements really contend. Remove the file with `PooledDb::cleanup`.
pub struct PooledDb {
    pub db: DatabaseConnection,
    path: PathBuf,
}

impl PooledDb {
    pub async fn cleanup(self) {
        let _ = self.db.close().await;
        for suffix in ["", "-journal", "-wal", "-shm"] {
            let _ = std::fs::remove_file(format!("{}{}", self.path.display(), suffix));
        }
    }
}

pub async fn setup_pooled_db(connections: u32) -> PooledDb {
    let path = std::env::temp_dir().join(format!("ride-dispatch-{}.db", Uuid::new_v4()));
    let mut options = ConnectOptions::new(format!("sqlite://{}?mode=rwc", path.display()));
    options
        .max_connections(connections)
        .min_connections(connections)
        .sqlx_logging(false);
    let db = Database::connect(options).await.expect("connect sqlite file");
    create_tables(&db).await;
    PooledDb { db, path }
}

async fn create_tables(db: &DatabaseConnection) {
    let schema = Schema::new(DbBackend::Sqlite);
    let backend = db.get_database_backend();
    for stmt in [
        schema.create_table_from_entity(user::Entity),
        schema.create_table_from_entity(captain::Entity),
        schema.create_table_from_entity(ride::Entity),
    ] {
        db.execute(backend.build(&stmt)).await.expect("create table");
    }
}

pub async fn setup_state(geocoder: StubGeocoder) -> (AppState, Arc<StubGeocoder>) {
    let db = setup_db().await;
    state_on(db, geocoder)
}

pub fn state_on(db: DatabaseConnection, geocoder: StubGeocoder) -> (AppState, Arc<StubGeocoder>) {
    let geocoder = Arc::new(geocoder);
    let state = AppState::new(db, test_config(), geocoder.clone());
    (state, geocoder)
}

pub async fn seed_rider(db: &DatabaseConnection) -> user::Model {
    let id = Uuid::new_v4();
    user::ActiveModel {
        id: Set(id),
        email: Set(format!("rider-{}@example.com", id)),
        first_name: Set("Asha".to_string()),
        last_name: Set(Some("Rao".to_string())),
        socket_id: Set(None),
        created_at: Set(Utc::now().into()),
    }
    .insert(db)
    .await
    .expect("insert rider")
}

pub async fn seed_captain(db: &DatabaseConnection, location: Option<Coordinates>) -> captain::Model {
    let id = Uuid::new_v4();
    captain::ActiveModel {
        id: Set(id),
        email: Set(format!("captain-{}@example.com", id)),
        first_name: Set("Ravi".to_string()),
        last_name: Set(None),
        socket_id: Set(None),
        status: Set(CaptainStatus::Active),
        vehicle_color: Set("White".to_string()),
        vehicle_plate: Set("KA01AB1234".to_string()),
        vehicle_capacity: Set(4),
        vehicle_type: Set(VehicleClass::Car),
        location_ltd: Set(location.map(|c| c.lat)),
        location_lng: Set(location.map(|c| c.lng)),
        created_at: Set(Utc::now().into()),
    }
    .insert(db)
    .await
    .expect("insert captain")
}
