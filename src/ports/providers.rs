//! Provider ports. One capability interface, four independent implementations.
//!
//! Every upstream adapter is an [`ItemSource`]; the calendar and task board are
//! also [`ItemWriter`]s. The per-provider traits below pin the associated types
//! so use cases can hold `Arc<dyn CalendarPort>` and friends.

use crate::domain::{
    AcademicItem, CalendarEvent, CalendarEventCreate, CalendarEventPatch, DomainError, Instant,
    Task, TaskCreate, TaskPatch,
};
use crate::shared::datetime::TimeWindow;

/// Fetch raw upstream records and map them into normalized items.
#[async_trait::async_trait]
pub trait ItemSource: Send + Sync {
    type Query: Send + 'static;
    type Item: Send + 'static;

    async fn list_items(&self, query: Self::Query) -> Result<Vec<Self::Item>, DomainError>;
}

/// Map normalized write shapes back into the upstream schema.
#[async_trait::async_trait]
pub trait ItemWriter: ItemSource {
    type Create: Send + 'static;
    type Patch: Send + 'static;

    async fn create(&self, body: Self::Create) -> Result<Self::Item, DomainError>;

    /// Write only the fields present in `patch`; everything else stays as it is upstream.
    async fn patch(&self, id: &str, patch: Self::Patch) -> Result<Self::Item, DomainError>;
}

/// Upcoming assignments query. Items without a due date ignore `window`.
#[derive(Debug, Clone, PartialEq)]
pub struct AssignmentQuery {
    pub window: TimeWindow,
    pub limit: usize,
}

impl Default for AssignmentQuery {
    fn default() -> Self {
        Self {
            window: TimeWindow::default(),
            limit: 50,
        }
    }
}

/// Timetable query. `window` filters on the entry start.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimetableQuery {
    pub window: TimeWindow,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EventQuery {
    pub window: TimeWindow,
    pub max_results: u32,
}

impl Default for EventQuery {
    fn default() -> Self {
        Self {
            window: TimeWindow::default(),
            max_results: 20,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TaskQuery {
    pub status: Option<String>,
    pub due_before: Option<Instant>,
    pub due_after: Option<Instant>,
    pub limit: usize,
}

impl Default for TaskQuery {
    fn default() -> Self {
        Self {
            status: None,
            due_before: None,
            due_after: None,
            limit: 50,
        }
    }
}

/// Learning-management assignments.
pub trait AssignmentsPort: ItemSource<Query = AssignmentQuery, Item = AcademicItem> {}
impl<T> AssignmentsPort for T where T: ItemSource<Query = AssignmentQuery, Item = AcademicItem> {}

/// Institutional timetable feeds.
pub trait TimetablePort: ItemSource<Query = TimetableQuery, Item = AcademicItem> {}
impl<T> TimetablePort for T where T: ItemSource<Query = TimetableQuery, Item = AcademicItem> {}

/// Task-tracking workspace.
pub trait TaskBoardPort:
    ItemWriter<Query = TaskQuery, Item = Task, Create = TaskCreate, Patch = TaskPatch>
{
}
impl<T> TaskBoardPort for T where
    T: ItemWriter<Query = TaskQuery, Item = Task, Create = TaskCreate, Patch = TaskPatch>
{
}

/// Personal calendar. The only provider that supports deletion.
#[async_trait::async_trait]
pub trait CalendarPort:
    ItemWriter<
        Query = EventQuery,
        Item = CalendarEvent,
        Create = CalendarEventCreate,
        Patch = CalendarEventPatch,
    >
{
    /// Delete an event. A missing id surfaces the upstream not-found error.
    async fn delete(&self, id: &str) -> Result<(), DomainError>;
}
