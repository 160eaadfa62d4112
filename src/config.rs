use std::env;
use std::time::Duration;

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub jwt_expiration_hours: i64,
    pub server_host: String,
    pub server_port: u16,
    pub maps_api_key: String,
    pub maps_base_url: String,
    pub geocoding_timeout_secs: u64,
    pub matching_radius_km: f64,
    pub dispatch_workers: usize,
    pub dispatch_queue_size: usize,
    pub connection_buffer: usize,
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Self {
            database_url: env::var("DATABASE_URL")
                .expect("DATABASE_URL must be set"),
            jwt_secret: env::var("JWT_SECRET")
                .expect("JWT_SECRET must be set"),
            jwt_expiration_hours: env::var("JWT_EXPIRATION_HOURS")
                .unwrap_or_else(|_| "24".to_string())
                .parse()
                .expect("JWT_EXPIRATION_HOURS must be a number"),
            server_host: env::var("SERVER_HOST")
                .unwrap_or_else(|_| "0.0.0.0".to_string()),
            server_port: env::var("SERVER_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .expect("SERVER_PORT must be a number"),
            maps_api_key: env::var("MAPS_API_KEY")
                .expect("MAPS_API_KEY must be set"),
            maps_base_url: env::var("MAPS_BASE_URL")
                .unwrap_or_else(|_| "https://api.olamaps.io".to_string()),
            geocoding_timeout_secs: env::var("GEOCODING_TIMEOUT_SECS")
                .unwrap_or_else(|_| "5".to_string())
                .parse()
                .expect("GEOCODING_TIMEOUT_SECS must be a number"),
            matching_radius_km: env::var("MATCHING_RADIUS_KM")
                .unwrap_or_else(|_| "50".to_string())
                .parse()
                .expect("MATCHING_RADIUS_KM must be a number"),
            dispatch_workers: env::var("DISPATCH_WORKERS")
                .unwrap_or_else(|_| "4".to_string())
                .parse()
                .expect("DISPATCH_WORKERS must be a number"),
            dispatch_queue_size: env::var("DISPATCH_QUEUE_SIZE")
                .unwrap_or_else(|_| "256".to_string())
                .parse()
                .expect("DISPATCH_QUEUE_SIZE must be a number"),
            connection_buffer: env::var("CONNECTION_BUFFER")
                .unwrap_or_else(|_| "32".to_string())
                .parse()
                .expect("CONNECTION_BUFFER must be a number"),
        }
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }

    pub fn geocoding_timeout(&self) -> Duration {
        Duration::from_secs(self.geocoding_timeout_secs)
    }
}
