//! Domain models shared across the catalog crates.

pub mod auth;
