//! Infrastructure adapters. Implement the ports.
//!
//! Upstream providers, secret persistence, encryption and the HTTP surface.
//! Errors are mapped to DomainError at this boundary.

pub mod crypto;
pub mod http;
pub mod integrations;
pub mod persistence;
pub mod upstream;
