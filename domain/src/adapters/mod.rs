//! In-process adapters for the directory port.
//!
//! The memory store is the only backing in scope: collections living for the
//! process lifetime, mimicking relational tables. A database-backed adapter
//! would live in a separate crate.

pub mod memory_store;
