//! Announcement scheduling
//!
//! Owns the mapping from "flight + departure time" to "set of future
//! announcement firings," guarantees each firing happens at most once,
//! and keeps the mapping consistent as the flight set changes.

pub mod schedule;
pub mod scheduler;

pub use schedule::{next_announcement, AnnouncementKey, NextAnnouncement, ScheduleEntry};
pub use scheduler::{AnnouncementScheduler, SchedulerHandle};
