//! REST adapter. HTTP client plus the typed ExpenseApi implementation.

pub mod client;
pub mod rest_api;
pub mod url;

pub use client::{ApiResponse, DEFAULT_TIMEOUT, HttpClient, RequestBody, RequestOptions};
pub use rest_api::RestExpenseApi;
pub use url::{join_url, resolve_base_url};
