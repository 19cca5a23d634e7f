//! Repository layer for the `people` collection.
//!
//! # Responsibility
//! - Define the store-facing document contract.
//! - Keep SQL and JSON-path details inside the persistence boundary.
//!
//! # Invariants
//! - Write paths validate records before any SQL mutation.
//! - "Not found" is `None`; errors are reserved for failures.

pub mod person_repo;
