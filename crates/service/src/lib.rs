//! Service layer for the version counter.
//! - `counter` holds the domain types and the `CounterService` operations.
//! - `store` abstracts the external key-value store behind `CounterStore`.
//! - `errors` defines the error kinds surfaced to the request layer.

pub mod errors;
pub mod counter;
pub mod store;
