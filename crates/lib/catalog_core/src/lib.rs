//! # catalog_core
//!
//! Authentication core for the catalog backend: credential checks, access
//! tokens, single-use refresh tokens and role-based authorization, over a
//! pluggable user/refresh-token store.

pub mod auth;
pub mod config;
pub mod migrate;
pub mod models;
pub mod store;
pub mod uuid;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_matches_manifest() {
        assert_eq!(version(), env!("CARGO_PKG_VERSION"));
    }
}
