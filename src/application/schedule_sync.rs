use crate::application::calendar_directory::CalendarDirectory;
use crate::application::credential::CalendarCredential;
use crate::application::error::SyncError;
use crate::application::event_writer::{EventRef, EventWriter};
use crate::domain::models::{
    CalendarCheck, ClassSession, SemesterIdentity, SyncProgress, SyncSummary, WeeklySchedule,
};
use crate::domain::period_time::PeriodTimeResolver;
use crate::infrastructure::config::SyncConfig;
use crate::infrastructure::google_calendar_client::GoogleCalendarClient;
use futures::stream::{self, Stream};
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictResolution {
    DeleteAndResync,
    Append,
    Cancel,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncPhase {
    Idle,
    CheckingCalendar,
    AwaitingUserChoice { calendar_id: String },
    Syncing,
    Completed(SyncSummary),
    Aborted(String),
}

struct SyncComponents<C>
where
    C: GoogleCalendarClient,
{
    directory: CalendarDirectory<C>,
    writer: EventWriter<C>,
    resolver: PeriodTimeResolver,
    reminder_minutes_before: u32,
    phase: watch::Sender<SyncPhase>,
}

impl<C> SyncComponents<C>
where
    C: GoogleCalendarClient,
{
    fn publish(&self, phase: SyncPhase) {
        self.phase.send_replace(phase);
    }
}

pub struct ScheduleSyncService<C>
where
    C: GoogleCalendarClient,
{
    components: Arc<SyncComponents<C>>,
}

impl<C> ScheduleSyncService<C>
where
    C: GoogleCalendarClient,
{
    pub fn new(calendar_client: Arc<C>) -> Self {
        Self::from_config(calendar_client, &SyncConfig::default())
    }

    pub fn from_config(calendar_client: Arc<C>, config: &SyncConfig) -> Self {
        let directory = CalendarDirectory::new(Arc::clone(&calendar_client))
            .with_time_zone(config.time_zone.name())
            .with_clear_events_max_results(config.clear_events_max_results);
        Self {
            components: Arc::new(SyncComponents {
                directory,
                writer: EventWriter::new(calendar_client),
                resolver: PeriodTimeResolver::new(config.period_table.clone(), config.time_zone),
                reminder_minutes_before: config.reminder_minutes_before,
                phase: watch::Sender::new(SyncPhase::Idle),
            }),
        }
    }

    /// Latest phase published by `prepare`, `resolve` or a run.
    pub fn current_phase(&self) -> SyncPhase {
        self.components.phase.borrow().clone()
    }

    pub fn subscribe_phase(&self) -> watch::Receiver<SyncPhase> {
        self.components.phase.subscribe()
    }

    pub async fn check_calendar(
        &self,
        credential: &CalendarCredential,
        semester: &SemesterIdentity,
    ) -> CalendarCheck {
        self.components
            .directory
            .check(credential, &semester.calendar_title())
            .await
    }

    /// Checks for an existing calendar and stops there if one is found.
    ///
    /// Nothing is deleted or written before the returned value is driven.
    pub async fn prepare(
        &self,
        credential: CalendarCredential,
        semester: SemesterIdentity,
        schedule: WeeklySchedule,
    ) -> SyncPreparation<C> {
        let request = SyncRequest {
            components: Arc::clone(&self.components),
            credential,
            semester,
            schedule,
        };

        self.components.publish(SyncPhase::CheckingCalendar);
        match self.check_calendar(&request.credential, &request.semester).await {
            CalendarCheck::HasEvent(calendar_id) => {
                info!(
                    semester_code = request.semester.code,
                    calendar_id = %calendar_id,
                    "sync_awaiting_user_choice"
                );
                let pending = PendingSync {
                    calendar_id,
                    request,
                };
                self.components.publish(pending.phase());
                SyncPreparation::AwaitingUserChoice(pending)
            }
            CalendarCheck::CalendarNotFound | CalendarCheck::Error(_) => {
                SyncPreparation::Ready(SyncRun::new(request, false))
            }
        }
    }
}

struct SyncRequest<C>
where
    C: GoogleCalendarClient,
{
    components: Arc<SyncComponents<C>>,
    credential: CalendarCredential,
    semester: SemesterIdentity,
    schedule: WeeklySchedule,
}

pub enum SyncPreparation<C>
where
    C: GoogleCalendarClient,
{
    Ready(SyncRun<C>),
    AwaitingUserChoice(PendingSync<C>),
}

impl<C> SyncPreparation<C>
where
    C: GoogleCalendarClient,
{
    pub fn phase(&self) -> SyncPhase {
        match self {
            Self::Ready(run) => run.phase().clone(),
            Self::AwaitingUserChoice(pending) => pending.phase(),
        }
    }

    pub fn into_ready(self) -> Option<SyncRun<C>> {
        match self {
            Self::Ready(run) => Some(run),
            Self::AwaitingUserChoice(_) => None,
        }
    }

    pub fn into_pending(self) -> Option<PendingSync<C>> {
        match self {
            Self::Ready(_) => None,
            Self::AwaitingUserChoice(pending) => Some(pending),
        }
    }
}

/// A sync suspended on an existing calendar for the same semester title.
pub struct PendingSync<C>
where
    C: GoogleCalendarClient,
{
    calendar_id: String,
    request: SyncRequest<C>,
}

impl<C> PendingSync<C>
where
    C: GoogleCalendarClient,
{
    pub fn calendar_id(&self) -> &str {
        &self.calendar_id
    }

    pub fn phase(&self) -> SyncPhase {
        SyncPhase::AwaitingUserChoice {
            calendar_id: self.calendar_id.clone(),
        }
    }

    /// `Cancel` returns `None` without touching the calendar service.
    pub fn resolve(self, resolution: ConflictResolution) -> Option<SyncRun<C>> {
        info!(
            semester_code = self.request.semester.code,
            calendar_id = %self.calendar_id,
            resolution = ?resolution,
            "sync_conflict_resolved"
        );
        match resolution {
            ConflictResolution::DeleteAndResync => Some(SyncRun::new(self.request, true)),
            ConflictResolution::Append => Some(SyncRun::new(self.request, false)),
            ConflictResolution::Cancel => {
                self.request.components.publish(SyncPhase::Idle);
                None
            }
        }
    }
}

/// One single-use synchronization pass, driven one session per poll.
pub struct SyncRun<C>
where
    C: GoogleCalendarClient,
{
    components: Arc<SyncComponents<C>>,
    credential: CalendarCredential,
    semester: SemesterIdentity,
    delete_if_exists: bool,
    sessions: VecDeque<ClassSession>,
    calendar_id: Option<String>,
    total: i32,
    skipped_count: i32,
    index: i32,
    success_count: i32,
    error_count: i32,
    phase: SyncPhase,
}

impl<C> SyncRun<C>
where
    C: GoogleCalendarClient,
{
    fn new(request: SyncRequest<C>, delete_if_exists: bool) -> Self {
        let (sessions, skipped): (VecDeque<_>, VecDeque<_>) = request
            .schedule
            .flatten_sessions()
            .into_iter()
            .partition(|session| session.study_date.is_some());
        request.components.publish(SyncPhase::Syncing);

        Self {
            components: request.components,
            credential: request.credential,
            semester: request.semester,
            delete_if_exists,
            total: count_as_i32(sessions.len()),
            skipped_count: count_as_i32(skipped.len()),
            sessions,
            calendar_id: None,
            index: 0,
            success_count: 0,
            error_count: 0,
            phase: SyncPhase::Syncing,
        }
    }

    pub fn phase(&self) -> &SyncPhase {
        &self.phase
    }

    pub fn total(&self) -> i32 {
        self.total
    }

    /// Sessions without a study date; they are not part of `total`.
    pub fn skipped_count(&self) -> i32 {
        self.skipped_count
    }

    pub fn deletes_existing(&self) -> bool {
        self.delete_if_exists
    }

    pub fn calendar_id(&self) -> Option<&str> {
        self.calendar_id.as_deref()
    }

    pub fn summary(&self) -> Option<SyncSummary> {
        match &self.phase {
            SyncPhase::Completed(summary) => Some(summary.clone()),
            _ => None,
        }
    }

    /// Processes the next session and reports it.
    ///
    /// The first call obtains the calendar; if that fails a single fatal
    /// progress value is returned and the run ends.
    pub async fn next_progress(&mut self) -> Option<SyncProgress> {
        if self.phase != SyncPhase::Syncing {
            return None;
        }

        let calendar_id = match self.calendar_id.clone() {
            Some(calendar_id) => calendar_id,
            None => match self.open_calendar().await {
                Ok(calendar_id) => {
                    self.calendar_id = Some(calendar_id.clone());
                    calendar_id
                }
                Err(failure) => {
                    let message = failure.to_string();
                    error!(
                        semester_code = self.semester.code,
                        error = %message,
                        "sync_aborted"
                    );
                    self.set_phase(SyncPhase::Aborted(message.clone()));
                    return Some(SyncProgress::fatal(message));
                }
            },
        };

        let Some(class_session) = self.sessions.pop_front() else {
            self.complete();
            return None;
        };

        self.index += 1;
        let event_title = class_session.event_title();
        let outcome = self.sync_session(&calendar_id, &class_session).await;
        let error_message = match outcome {
            Ok(event_ref) => {
                self.success_count += 1;
                debug!(
                    index = self.index,
                    total = self.total,
                    event_id = %event_ref.event_id,
                    "session_synced"
                );
                None
            }
            Err(failure) => {
                self.error_count += 1;
                warn!(
                    index = self.index,
                    total = self.total,
                    title = %event_title,
                    error = %failure,
                    "session_sync_failed"
                );
                Some(failure.to_string())
            }
        };

        let progress = SyncProgress {
            index: self.index,
            total: self.total,
            event_title,
            is_success: error_message.is_none(),
            error_message,
            success_count: self.success_count,
            error_count: self.error_count,
        };
        if self.sessions.is_empty() {
            self.complete();
        }
        Some(progress)
    }

    /// Cold progress stream: nothing runs until polled, dropping it stops the run.
    pub fn into_stream(self) -> impl Stream<Item = SyncProgress> + Send {
        stream::unfold(self, |mut run| async move {
            let progress = run.next_progress().await?;
            Some((progress, run))
        })
    }

    pub async fn run_to_completion<F>(mut self, mut on_progress: F) -> SyncPhase
    where
        F: FnMut(&SyncProgress),
    {
        while let Some(progress) = self.next_progress().await {
            on_progress(&progress);
        }
        self.phase
    }

    async fn open_calendar(&self) -> Result<String, SyncError> {
        let directory = &self.components.directory;
        let title = self.semester.calendar_title();
        let calendar_id = directory
            .get_or_create(&self.credential, &title, self.delete_if_exists)
            .await?;

        if self.delete_if_exists && !directory.clear_events(&self.credential, &calendar_id).await {
            warn!(calendar_id = %calendar_id, "calendar_clear_incomplete");
        }

        info!(
            semester_code = self.semester.code,
            calendar_id = %calendar_id,
            total = self.total,
            skipped = self.skipped_count,
            "sync_started"
        );
        Ok(calendar_id)
    }

    async fn sync_session(
        &self,
        calendar_id: &str,
        class_session: &ClassSession,
    ) -> Result<EventRef, SyncError> {
        let date = class_session
            .study_date
            .ok_or(SyncError::MissingStudyDate)?;
        let range = self.components.resolver.resolve(
            class_session.start_period_or_default(),
            class_session.period_count_or_default(),
            date,
        )?;

        self.components
            .writer
            .write(
                &self.credential,
                calendar_id,
                class_session,
                self.semester.code,
                &range,
                self.components.reminder_minutes_before,
            )
            .await
    }

    fn complete(&mut self) {
        let summary = SyncSummary {
            total: self.total,
            success_count: self.success_count,
            error_count: self.error_count,
            skipped_count: self.skipped_count,
        };
        info!(
            semester_code = self.semester.code,
            total = summary.total,
            success = summary.success_count,
            errors = summary.error_count,
            skipped = summary.skipped_count,
            "sync_completed"
        );
        self.set_phase(SyncPhase::Completed(summary));
    }

    fn set_phase(&mut self, phase: SyncPhase) {
        self.components.publish(phase.clone());
        self.phase = phase;
    }
}

fn count_as_i32(count: usize) -> i32 {
    i32::try_from(count).unwrap_or(i32::MAX)
}
