//! Document model for the `people` collection.
//!
//! # Responsibility
//! - Define the typed records exchanged with the document store.
//! - Own the JSON body shape stored for every person document.
//!
//! # Invariants
//! - Every persisted document is identified by a store-generated `PersonId`.
//! - Required fields are validated when a record is constructed, not on read.

pub mod person;
