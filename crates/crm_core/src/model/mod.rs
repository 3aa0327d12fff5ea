//! CRM domain model.
//!
//! # Responsibility
//! - Define the four flat CRM entities and their caller-facing drafts.
//! - Own the mapping tables between domain names and `<field>_c` storage
//!   names used by the record store.
//!
//! # Invariants
//! - Every persisted entity is identified by a store-assigned `RecordId`.
//! - Deletion is a hard delete; there is no tombstone state.

pub mod activity;
pub mod company;
pub mod contact;
pub mod deal;
pub mod record;
