//! Personal calendar (Google Calendar) integration.

pub mod calendar;
pub mod credentials;

pub use calendar::GoogleCalendarAdapter;
pub use credentials::{CredentialVault, GoogleCredential};
