/// Bot Dashboard - live state client library
/// Mirrors a trading bot's activity stream into an always-current view
/// with an HTTP fallback path for when the stream is down.

pub mod api;
pub mod backoff;
pub mod client;
pub mod fallback;
pub mod models;
pub mod settings;
pub mod view;
