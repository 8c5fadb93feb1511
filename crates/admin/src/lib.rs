//! Mobistore admin library.
//!
//! Internal panel for shop staff: dashboard, statistics charts, news
//! management and order/installment updates. All data is read from and
//! written to the commerce backend with the signed-in admin's token.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod backend;
pub mod config;
pub mod error;
pub mod filters;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod state;
pub mod statistics;

pub use state::AppState;
