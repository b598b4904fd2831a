//! Cross-cutting helpers: configuration and date/time normalization.

pub mod config;
pub mod datetime;
