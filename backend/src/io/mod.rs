//! # IO Module
//!
//! The boundary layer: axum handlers, identity extraction, the response
//! envelope, and the fire-and-forget alerting/notification hooks. Nothing
//! below this layer knows about HTTP.

pub mod alerting;
pub mod auth;
pub mod response;
pub mod rest;
