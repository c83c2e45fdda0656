// Application layer - use cases over the domain core
pub mod analytics_service;
pub mod record_source;
pub mod streaming_service;
pub mod view_tracker;

#[cfg(test)]
pub mod testing;
