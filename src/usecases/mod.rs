//! Application use cases. Orchestrate providers via ports.

pub mod overview_service;
pub mod reminder_intake;

pub use overview_service::OverviewService;
pub use reminder_intake::{ReminderIntake, ReminderOutcome};
