//! API handlers for the finance service.
//!
//! The ledger and graph endpoints are public and answer with HTML fragments;
//! everything under `auth` handles sessions and the admin-only user endpoints.

pub mod auth;
pub mod fragments;
pub mod graph;
pub mod health;
pub mod ledger;
