pub mod routing;
pub mod time;
pub mod tracing;
