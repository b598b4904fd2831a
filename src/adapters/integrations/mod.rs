//! Upstream provider adapters. Each implements one provider port.

pub mod canvas;
pub mod google;
pub mod ical;
pub mod notion;

pub use canvas::CanvasAdapter;
pub use google::{CredentialVault, GoogleCalendarAdapter};
pub use ical::IcalFeedAdapter;
pub use notion::NotionTaskAdapter;
