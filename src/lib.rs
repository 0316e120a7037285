//! Budget-constrained outfit assembly service
//!
//! Picks at most one product per clothing category so that the outfit stays within
//! a budget while total similarity to the request is maximized, and suggests the
//! best complete outfit regardless of budget alongside it.

pub mod config;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
