//! Mobistore storefront library.
//!
//! This crate provides the storefront functionality as a library,
//! allowing it to be tested and reused.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod backend;
pub mod chat;
pub mod config;
pub mod error;
pub mod filters;
pub mod middleware;
pub mod models;
pub mod payment;
pub mod routes;
pub mod state;

pub use state::AppState;
