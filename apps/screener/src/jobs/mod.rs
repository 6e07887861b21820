//! Background jobs started alongside the HTTP server.

pub mod watch_renewal;
