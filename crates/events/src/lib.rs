//! Event domain module.
//!
//! Managed events (weddings, conferences, ...) with their lifecycle status,
//! plus the pure calendar/count views derived from them.

pub mod calendar;
pub mod event;

pub use calendar::{monthly_counts, monthly_view, status_counts, CalendarDay};
pub use event::{Assignees, Event, EventDraft, EventStatus, EventUpdate};
