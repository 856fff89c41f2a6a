//! Shared host-environment helpers: logging setup and the lightweight
//! admin HTTP endpoint.

pub mod admin_http;
pub mod utils;
