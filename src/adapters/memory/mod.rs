//! In-memory backend. Offline demo mode and page tests.

pub mod in_memory_api;

pub use in_memory_api::InMemoryExpenseApi;
