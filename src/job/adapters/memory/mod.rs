//! In-memory adapters for tests and single-process deployments.

mod store;

pub use store::InMemoryJobStore;
