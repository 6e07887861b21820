//! OAuth consent flow, logout, and the status endpoint.

pub mod handlers;
