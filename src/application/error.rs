use crate::domain::period_time::PeriodTimeError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncError {
    #[error("no calendar access token is available")]
    NoCredential,
    #[error("credential store error: {0}")]
    Credential(String),
    #[error("schedule fetch failed: {0}")]
    ScheduleFetch(String),
    #[error("calendar directory error: {0}")]
    Directory(String),
    #[error(transparent)]
    InvalidPeriod(#[from] PeriodTimeError),
    #[error("failed to write calendar event: {0}")]
    RemoteWrite(String),
    #[error("session has no study date")]
    MissingStudyDate,
}
