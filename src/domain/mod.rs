// Domain layer - Pure types and functions of the telemetry pipeline
pub mod alert;
pub mod errors;
pub mod forecast;
pub mod insight;
pub mod ring_buffer;
pub mod session;
pub mod telemetry;
