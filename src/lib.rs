//! Uniform JSON envelopes, API version negotiation, ETag caching and JSONP
//! for axum controllers.

pub mod application;
pub mod cache;
pub mod config;
pub mod domain;
pub mod infra;
