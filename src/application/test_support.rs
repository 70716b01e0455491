use crate::application::schedule_sync::SyncPhase;
use crate::domain::models::ClassSession;
use crate::infrastructure::error::InfraError;
use crate::infrastructure::event_mapper::GoogleCalendarEvent;
use crate::infrastructure::google_calendar_client::{GoogleCalendarClient, GoogleCalendarSummary};
use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::HashSet;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::watch;

/// Records every call in order and fails on demand.
#[derive(Debug, Default)]
pub struct FakeGoogleCalendarClient {
    pub calendars: Mutex<Vec<GoogleCalendarSummary>>,
    pub listed_events: Mutex<Vec<GoogleCalendarEvent>>,
    pub created_events: Mutex<Vec<(String, GoogleCalendarEvent)>>,
    pub calls: Mutex<Vec<String>>,
    pub fail_list_calendars: AtomicBool,
    pub fail_create_calendar: AtomicBool,
    pub fail_delete_calendar: AtomicBool,
    pub fail_list_events: AtomicBool,
    pub failing_event_summaries: Mutex<HashSet<String>>,
    pub failing_event_deletions: Mutex<HashSet<String>>,
    pub last_list_events_max_results: Mutex<Option<u32>>,
    pub phase_during_lookup: Mutex<Option<watch::Receiver<SyncPhase>>>,
    pub phases_seen_by_lookup: Mutex<Vec<SyncPhase>>,
    next_id: AtomicUsize,
}

impl FakeGoogleCalendarClient {
    pub fn with_calendars(calendars: Vec<(&str, &str)>) -> Self {
        Self {
            calendars: Mutex::new(
                calendars
                    .into_iter()
                    .map(|(id, summary)| GoogleCalendarSummary {
                        id: id.to_string(),
                        summary: summary.to_string(),
                    })
                    .collect(),
            ),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("calls mutex poisoned").clone()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.calls()
            .iter()
            .filter(|call| call.starts_with(prefix))
            .count()
    }

    pub fn fail_event(&self, summary: &str) {
        self.failing_event_summaries
            .lock()
            .expect("failing events mutex poisoned")
            .insert(summary.to_string());
    }

    pub fn created_events(&self) -> Vec<(String, GoogleCalendarEvent)> {
        self.created_events
            .lock()
            .expect("created events mutex poisoned")
            .clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().expect("calls mutex poisoned").push(call);
    }

    fn next_id(&self, prefix: &str) -> String {
        format!("{prefix}-{}", self.next_id.fetch_add(1, Ordering::SeqCst) + 1)
    }
}

#[async_trait]
impl GoogleCalendarClient for FakeGoogleCalendarClient {
    async fn list_calendars(
        &self,
        _access_token: &str,
    ) -> Result<Vec<GoogleCalendarSummary>, InfraError> {
        self.record("list_calendars".to_string());
        if let Some(phase) = self
            .phase_during_lookup
            .lock()
            .expect("phase mutex poisoned")
            .as_ref()
        {
            self.phases_seen_by_lookup
                .lock()
                .expect("seen phases mutex poisoned")
                .push(phase.borrow().clone());
        }
        if self.fail_list_calendars.load(Ordering::SeqCst) {
            return Err(InfraError::Api("network error while listing calendars".to_string()));
        }
        Ok(self.calendars.lock().expect("calendars mutex poisoned").clone())
    }

    async fn create_calendar(
        &self,
        _access_token: &str,
        summary: &str,
        _time_zone: Option<&str>,
    ) -> Result<GoogleCalendarSummary, InfraError> {
        self.record(format!("create_calendar:{summary}"));
        if self.fail_create_calendar.load(Ordering::SeqCst) {
            return Err(InfraError::Api("google calendar api error: http 403".to_string()));
        }
        let created = GoogleCalendarSummary {
            id: self.next_id("calendar"),
            summary: summary.to_string(),
        };
        self.calendars
            .lock()
            .expect("calendars mutex poisoned")
            .push(created.clone());
        Ok(created)
    }

    async fn delete_calendar(
        &self,
        _access_token: &str,
        calendar_id: &str,
    ) -> Result<(), InfraError> {
        self.record(format!("delete_calendar:{calendar_id}"));
        if self.fail_delete_calendar.load(Ordering::SeqCst) {
            return Err(InfraError::Api("google calendar api error: http 500".to_string()));
        }
        self.calendars
            .lock()
            .expect("calendars mutex poisoned")
            .retain(|calendar| calendar.id != calendar_id);
        Ok(())
    }

    async fn list_events(
        &self,
        _access_token: &str,
        calendar_id: &str,
        max_results: u32,
    ) -> Result<Vec<GoogleCalendarEvent>, InfraError> {
        self.record(format!("list_events:{calendar_id}"));
        *self
            .last_list_events_max_results
            .lock()
            .expect("max results mutex poisoned") = Some(max_results);
        if self.fail_list_events.load(Ordering::SeqCst) {
            return Err(InfraError::Api("network error while listing calendar events".to_string()));
        }
        Ok(self
            .listed_events
            .lock()
            .expect("listed events mutex poisoned")
            .clone())
    }

    async fn create_event(
        &self,
        _access_token: &str,
        calendar_id: &str,
        event: &GoogleCalendarEvent,
    ) -> Result<String, InfraError> {
        let summary = event.summary.clone().unwrap_or_default();
        self.record(format!("create_event:{summary}"));
        if self
            .failing_event_summaries
            .lock()
            .expect("failing events mutex poisoned")
            .contains(&summary)
        {
            return Err(InfraError::Api("google calendar api error: http 503".to_string()));
        }
        self.created_events
            .lock()
            .expect("created events mutex poisoned")
            .push((calendar_id.to_string(), event.clone()));
        Ok(self.next_id("event"))
    }

    async fn delete_event(
        &self,
        _access_token: &str,
        _calendar_id: &str,
        event_id: &str,
    ) -> Result<(), InfraError> {
        self.record(format!("delete_event:{event_id}"));
        if self
            .failing_event_deletions
            .lock()
            .expect("failing deletions mutex poisoned")
            .contains(event_id)
        {
            return Err(InfraError::Api("google calendar api error: http 404".to_string()));
        }
        Ok(())
    }
}

pub fn class_session(subject_code: &str, date: Option<(i32, u32, u32)>, start: i32, count: i32) -> ClassSession {
    ClassSession {
        study_date: date.and_then(|(year, month, day)| NaiveDate::from_ymd_opt(year, month, day)),
        start_period: Some(start),
        period_count: Some(count),
        subject_name: format!("Subject {subject_code}"),
        subject_code: subject_code.to_string(),
        room_code: "A1-101".to_string(),
        campus_code: "CS1".to_string(),
        teacher_name: "Teacher".to_string(),
        class_group_id: Some(format!("group-{subject_code}")),
        schedule_slot_id: Some(format!("slot-{subject_code}")),
        self_created_id: None,
    }
}

pub fn listed_event(id: &str) -> GoogleCalendarEvent {
    serde_json::from_value(serde_json::json!({
        "id": id,
        "start": { "dateTime": "2023-11-14T07:00:00+07:00" },
        "end": { "dateTime": "2023-11-14T07:50:00+07:00" }
    }))
    .expect("event fixture")
}
