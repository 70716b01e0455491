//! Mirrors a student's weekly class schedule into a Google Calendar.
//!
//! The entry point is [`ScheduleSyncService::prepare`], which either yields a
//! ready [`SyncRun`] or a [`PendingSync`] waiting for the caller to resolve a
//! conflict with an existing calendar for the same semester.

pub mod application;
pub mod domain;
pub mod infrastructure;

pub use application::calendar_directory::CalendarDirectory;
pub use application::commands::AppState;
pub use application::credential::CalendarCredential;
pub use application::error::SyncError;
pub use application::event_writer::{EventRef, EventWriter};
pub use application::schedule_source::ScheduleSource;
pub use application::schedule_sync::{
    ConflictResolution, PendingSync, ScheduleSyncService, SyncPhase, SyncPreparation, SyncRun,
};
pub use domain::models::{
    CalendarCheck, ClassSession, ScheduleWeek, SemesterIdentity, SyncProgress, SyncSummary,
    WeeklySchedule,
};
pub use domain::period_time::{PeriodTable, PeriodTimeError, PeriodTimeResolver, ResolvedTimeRange};
pub use infrastructure::config::SyncConfig;
pub use infrastructure::error::InfraError;
