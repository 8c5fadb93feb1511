//! Mobistore Core - Shared types library.
//!
//! This crate provides common types used across all Mobistore components:
//! - `storefront` - Public-facing phone shop
//! - `admin` - Internal administration panel
//!
//! # Architecture
//!
//! The core crate contains only types, pure arithmetic and body parsing - no
//! I/O, no HTTP clients. Every durable entity lives in the backend API; what is here is
//! the logic both binaries need to display and validate that data.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, money, emails, phone numbers and statuses
//! - [`pricing`] - Cart line totals, variant/discount price computation, installment plans
//! - [`transport`] - Backend response envelope and error body parsing
//! - [`validation`] - Form validation with per-field error collection

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod pricing;
pub mod transport;
pub mod types;
pub mod validation;

pub use types::*;
