//! Contact domain model.
//!
//! # Responsibility
//! - Define the canonical contact record and its validation rules.
//! - Stay free of storage and presentation concerns.
//!
//! # Invariants
//! - Every contact is identified by a stable `ContactId`.
//! - Deletion is a hard delete; there are no tombstones.

pub mod contact;
