//! Use-case façade over the person repository.
//!
//! # Responsibility
//! - Expose the named document operations to callers.
//! - Report each outcome to an injected observer.
//!
//! # Invariants
//! - Services never bypass repository validation/persistence contracts.
//! - Errors are reported and then returned unchanged.

pub mod observer;
pub mod person_service;
