//! Types and traits that are used across multiple components of the crate.
//!
//! Types specific to a single component, such as the nodes of the Range Validation Tree, live in
//! that component's module, e.g., [`crate::rvt::node`].

pub mod basic;

pub mod crypto_primitives;
