use crate::application::bootstrap::bootstrap_workspace;
use crate::application::credential::CalendarCredential;
use crate::application::error::SyncError;
use crate::application::schedule_source::ScheduleSource;
use crate::application::schedule_sync::{
    ConflictResolution, ScheduleSyncService, SyncPhase, SyncPreparation, SyncRun,
};
use crate::domain::models::{CalendarCheck, SemesterIdentity, SyncProgress};
use crate::infrastructure::config::SyncConfig;
use crate::infrastructure::credential_store::{CredentialStore, KeyringCredentialStore};
use crate::infrastructure::error::InfraError;
use crate::infrastructure::google_calendar_client::{
    GoogleCalendarClient, ReqwestGoogleCalendarClient,
};
use crate::infrastructure::logging::init_logging;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info};

pub struct AppState<C = ReqwestGoogleCalendarClient>
where
    C: GoogleCalendarClient,
{
    config_dir: PathBuf,
    credential_store: Arc<dyn CredentialStore>,
    sync_service: ScheduleSyncService<C>,
}

impl AppState<ReqwestGoogleCalendarClient> {
    pub fn new(workspace_root: PathBuf) -> Result<Self, InfraError> {
        let bootstrap = bootstrap_workspace(&workspace_root)?;
        init_logging(&bootstrap.logs_dir)?;

        let calendar_client = match bootstrap.config.calendar_api_base.as_deref() {
            Some(api_base) => ReqwestGoogleCalendarClient::with_api_base(api_base)?,
            None => ReqwestGoogleCalendarClient::new(),
        };
        info!(
            workspace_root = %bootstrap.workspace_root.display(),
            time_zone = bootstrap.config.time_zone.name(),
            "app_state_initialized"
        );

        Ok(Self::with_parts(
            bootstrap.config_dir,
            &bootstrap.config,
            Arc::new(KeyringCredentialStore::default()),
            Arc::new(calendar_client),
        ))
    }
}

impl<C> AppState<C>
where
    C: GoogleCalendarClient,
{
    pub fn with_parts(
        config_dir: PathBuf,
        config: &SyncConfig,
        credential_store: Arc<dyn CredentialStore>,
        calendar_client: Arc<C>,
    ) -> Self {
        Self {
            config_dir,
            credential_store,
            sync_service: ScheduleSyncService::from_config(calendar_client, config),
        }
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn sync_service(&self) -> &ScheduleSyncService<C> {
        &self.sync_service
    }

    pub fn credential(&self) -> Result<CalendarCredential, SyncError> {
        CalendarCredential::from_store(self.credential_store.as_ref())
    }

    pub fn command_error(&self, command: &str, failure: &SyncError) -> String {
        error!(command, error = %failure, "command_failed");
        failure.to_string()
    }
}

pub async fn check_semester_calendar_impl<C>(
    state: &AppState<C>,
    semester: &SemesterIdentity,
) -> Result<CalendarCheck, SyncError>
where
    C: GoogleCalendarClient,
{
    let credential = state.credential()?;
    Ok(state.sync_service.check_calendar(&credential, semester).await)
}

pub async fn prepare_semester_sync_impl<C, S>(
    state: &AppState<C>,
    source: &S,
    semester: SemesterIdentity,
) -> Result<SyncPreparation<C>, SyncError>
where
    C: GoogleCalendarClient,
    S: ScheduleSource + ?Sized,
{
    let credential = state.credential()?;
    let schedule = source
        .get_weekly_schedule(semester.code)
        .await
        .map_err(|failure| SyncError::ScheduleFetch(failure.to_string()))?;
    info!(
        semester_code = semester.code,
        sessions = schedule.session_count(),
        "schedule_loaded"
    );
    Ok(state.sync_service.prepare(credential, semester, schedule).await)
}

/// Drains a run, returning every progress value and the final phase.
pub async fn collect_progress<C>(run: SyncRun<C>) -> (Vec<SyncProgress>, SyncPhase)
where
    C: GoogleCalendarClient,
{
    let mut progress = Vec::new();
    let phase = run.run_to_completion(|value| progress.push(value.clone())).await;
    (progress, phase)
}

/// Full flow: fetch, ask `decide` on conflict, then drive the run to its end.
///
/// A cancelled conflict yields `SyncPhase::Idle`.
pub async fn sync_semester_schedule_impl<C, S, D, F>(
    state: &AppState<C>,
    source: &S,
    semester: SemesterIdentity,
    decide: D,
    on_progress: F,
) -> Result<SyncPhase, SyncError>
where
    C: GoogleCalendarClient,
    S: ScheduleSource + ?Sized,
    D: FnOnce(&str) -> ConflictResolution,
    F: FnMut(&SyncProgress),
{
    let started_at = Instant::now();
    let semester_code = semester.code;
    let run = match prepare_semester_sync_impl(state, source, semester).await? {
        SyncPreparation::Ready(run) => run,
        SyncPreparation::AwaitingUserChoice(pending) => {
            let resolution = decide(pending.calendar_id());
            match pending.resolve(resolution) {
                Some(run) => run,
                None => return Ok(SyncPhase::Idle),
            }
        }
    };

    let phase = run.run_to_completion(on_progress).await;
    info!(
        semester_code,
        duration_ms = duration_ms(started_at.elapsed()),
        completed = matches!(phase, SyncPhase::Completed(_)),
        "sync_command_finished"
    );
    Ok(phase)
}

fn duration_ms(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
}
