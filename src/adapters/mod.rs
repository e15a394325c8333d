//! Infrastructure adapters. Implement the ports.
//!
//! HTTP backend, in-memory backend, terminal UI. Map errors to ApiError/DomainError.

pub mod http;
pub mod memory;
pub mod ui;
