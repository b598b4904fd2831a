//! Core domain layer. No external I/O dependencies.
//!
//! Normalized item model and the error taxonomy. Dependencies flow inward.

pub mod entities;
pub mod errors;

pub use entities::{
    AcademicItem, CalendarEvent, CalendarEventCreate, CalendarEventPatch, DailyOverview, Instant,
    Metadata, Task, TaskCreate, TaskPatch,
};
pub use errors::DomainError;
