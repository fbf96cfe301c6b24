//! HTTP API: router, auth middleware, and the form-request pipeline wiring.

pub mod app;
pub mod authz;
pub mod context;
pub mod middleware;
