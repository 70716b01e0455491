use crate::application::credential::CalendarCredential;
use crate::application::error::SyncError;
use crate::domain::models::CalendarCheck;
use crate::infrastructure::config::DEFAULT_CLEAR_EVENTS_MAX_RESULTS;
use crate::infrastructure::google_calendar_client::GoogleCalendarClient;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Looks up, creates and clears calendars identified by title.
pub struct CalendarDirectory<C>
where
    C: GoogleCalendarClient,
{
    calendar_client: Arc<C>,
    time_zone: Option<String>,
    clear_events_max_results: u32,
}

impl<C> CalendarDirectory<C>
where
    C: GoogleCalendarClient,
{
    pub fn new(calendar_client: Arc<C>) -> Self {
        Self {
            calendar_client,
            time_zone: None,
            clear_events_max_results: DEFAULT_CLEAR_EVENTS_MAX_RESULTS,
        }
    }

    pub fn with_time_zone(mut self, time_zone: impl Into<String>) -> Self {
        self.time_zone = Some(time_zone.into());
        self
    }

    pub fn with_clear_events_max_results(mut self, max_results: u32) -> Self {
        self.clear_events_max_results = max_results.max(1);
        self
    }

    pub async fn find(
        &self,
        credential: &CalendarCredential,
        title: &str,
    ) -> Result<Option<String>, SyncError> {
        let calendars = self
            .calendar_client
            .list_calendars(credential.access_token())
            .await
            .map_err(|error| SyncError::Directory(error.to_string()))?;
        let found = calendars
            .into_iter()
            .find(|calendar| calendar.summary == title)
            .map(|calendar| calendar.id);
        debug!(title, found = found.is_some(), "calendar_lookup");
        Ok(found)
    }

    /// Reports calendar existence only; the event count is not inspected.
    pub async fn check(&self, credential: &CalendarCredential, title: &str) -> CalendarCheck {
        match self.find(credential, title).await {
            Ok(Some(calendar_id)) => CalendarCheck::HasEvent(calendar_id),
            Ok(None) => CalendarCheck::CalendarNotFound,
            Err(error) => {
                warn!(title, error = %error, "calendar_check_failed");
                CalendarCheck::Error(error.to_string())
            }
        }
    }

    pub async fn get_or_create(
        &self,
        credential: &CalendarCredential,
        title: &str,
        delete_if_exists: bool,
    ) -> Result<String, SyncError> {
        if let Some(existing) = self.find(credential, title).await? {
            if !delete_if_exists {
                info!(title, calendar_id = %existing, "calendar_reused");
                return Ok(existing);
            }
            self.calendar_client
                .delete_calendar(credential.access_token(), &existing)
                .await
                .map_err(|error| SyncError::Directory(error.to_string()))?;
            info!(title, calendar_id = %existing, "calendar_deleted");
        }

        let created = self
            .calendar_client
            .create_calendar(credential.access_token(), title, self.time_zone.as_deref())
            .await
            .map_err(|error| SyncError::Directory(error.to_string()))?;
        info!(title, calendar_id = %created.id, "calendar_created");
        Ok(created.id)
    }

    /// Best-effort removal of one bounded page of events.
    ///
    /// A failed deletion is logged and skipped. Returns `true` when the
    /// listing succeeded and every listed event was deleted.
    pub async fn clear_events(&self, credential: &CalendarCredential, calendar_id: &str) -> bool {
        let events = match self
            .calendar_client
            .list_events(
                credential.access_token(),
                calendar_id,
                self.clear_events_max_results,
            )
            .await
        {
            Ok(events) => events,
            Err(error) => {
                warn!(calendar_id, error = %error, "clear_events_listing_failed");
                return false;
            }
        };

        let mut deleted = 0usize;
        let mut failed = 0usize;
        for event_id in events
            .iter()
            .filter_map(|event| event.id.as_deref())
            .map(str::trim)
            .filter(|id| !id.is_empty())
        {
            match self
                .calendar_client
                .delete_event(credential.access_token(), calendar_id, event_id)
                .await
            {
                Ok(()) => deleted += 1,
                Err(error) => {
                    failed += 1;
                    warn!(calendar_id, event_id, error = %error, "clear_event_failed");
                }
            }
        }

        info!(calendar_id, deleted, failed, "calendar_events_cleared");
        failed == 0
    }
}
