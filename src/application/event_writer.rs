use crate::application::credential::CalendarCredential;
use crate::application::error::SyncError;
use crate::domain::models::ClassSession;
use crate::domain::period_time::ResolvedTimeRange;
use crate::infrastructure::event_mapper::encode_session_event;
use crate::infrastructure::google_calendar_client::GoogleCalendarClient;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventRef {
    pub calendar_id: String,
    pub event_id: String,
}

/// Writes one calendar event per class session. A failed write is not retried.
pub struct EventWriter<C>
where
    C: GoogleCalendarClient,
{
    calendar_client: Arc<C>,
}

impl<C> EventWriter<C>
where
    C: GoogleCalendarClient,
{
    pub fn new(calendar_client: Arc<C>) -> Self {
        Self { calendar_client }
    }

    pub async fn write(
        &self,
        credential: &CalendarCredential,
        calendar_id: &str,
        class_session: &ClassSession,
        semester_code: i64,
        range: &ResolvedTimeRange,
        reminder_minutes_before: u32,
    ) -> Result<EventRef, SyncError> {
        let event = encode_session_event(
            class_session,
            semester_code,
            &range.start,
            &range.end,
            reminder_minutes_before,
        );
        let event_id = self
            .calendar_client
            .create_event(credential.access_token(), calendar_id, &event)
            .await
            .map_err(|error| SyncError::RemoteWrite(error.to_string()))?;

        Ok(EventRef {
            calendar_id: calendar_id.to_string(),
            event_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::test_support::{FakeGoogleCalendarClient, class_session};
    use crate::domain::period_time::PeriodTimeResolver;
    use crate::infrastructure::event_mapper::decode_correlation;
    use chrono::NaiveDate;

    fn range() -> ResolvedTimeRange {
        PeriodTimeResolver::default()
            .resolve(1, 2, NaiveDate::from_ymd_opt(2023, 11, 15).expect("valid date"))
            .expect("valid range")
    }

    #[tokio::test]
    async fn write_creates_event_in_target_calendar() {
        let client = Arc::new(FakeGoogleCalendarClient::default());
        let writer = EventWriter::new(Arc::clone(&client));
        let credential = CalendarCredential::new("token").expect("credential");
        let session = class_session("PHY101", Some((2023, 11, 15)), 1, 2);

        let event_ref = writer
            .write(&credential, "cal-1", &session, 20231, &range(), 10)
            .await
            .expect("write event");

        assert_eq!(event_ref.calendar_id, "cal-1");
        let created = client.created_events();
        assert_eq!(created.len(), 1);
        let (calendar_id, event) = &created[0];
        assert_eq!(calendar_id, "cal-1");
        assert_eq!(event.start.date_time, "2023-11-15T07:00:00+07:00");
        assert_eq!(event.end.date_time, "2023-11-15T08:40:00+07:00");
        assert_eq!(
            event.reminders.as_ref().map(|reminders| reminders.overrides[0].minutes),
            Some(10)
        );
        let correlation = decode_correlation(event).expect("correlation");
        assert_eq!(correlation.semester_code, 20231);
        assert_eq!(correlation.schedule_slot_id.as_deref(), Some("slot-PHY101"));
    }

    #[tokio::test]
    async fn transport_failure_becomes_remote_write_error() {
        let client = Arc::new(FakeGoogleCalendarClient::default());
        client.fail_event("Subject PHY101 - PHY101");
        let writer = EventWriter::new(Arc::clone(&client));
        let credential = CalendarCredential::new("token").expect("credential");
        let session = class_session("PHY101", Some((2023, 11, 15)), 1, 2);

        let result = writer
            .write(&credential, "cal-1", &session, 20231, &range(), 10)
            .await;

        assert!(matches!(result, Err(SyncError::RemoteWrite(message)) if message.contains("503")));
        assert_eq!(client.count("create_event"), 1);
    }
}
