pub mod geocode;
pub mod server;
pub mod telemetry;
