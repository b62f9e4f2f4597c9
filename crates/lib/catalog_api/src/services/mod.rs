//! Auth use cases shaped for the HTTP layer.

pub mod auth;
