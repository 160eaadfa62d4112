pub mod dispatch;
pub mod fare;
pub mod geocoding;
pub mod notifier;
pub mod proximity;
pub mod rides;
pub mod trip_metrics;
