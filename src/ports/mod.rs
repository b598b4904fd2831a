//! Port traits. API boundaries for the hexagon.
//!
//! - Providers: the four upstream capability interfaces
//! - Outbound: secret persistence and encryption

pub mod outbound;
pub mod providers;

pub use outbound::{CipherPort, SecretStorePort};
pub use providers::{
    AssignmentQuery, AssignmentsPort, CalendarPort, EventQuery, ItemSource, ItemWriter,
    TaskBoardPort, TaskQuery, TimetablePort, TimetableQuery,
};
