//! student-hub: one HTTP API over a student's calendar, task board and academic providers.

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod shared;
pub mod usecases;
