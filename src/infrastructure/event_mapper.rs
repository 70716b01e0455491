use crate::domain::models::ClassSession;
use chrono::DateTime;
use chrono_tz::Tz;
use std::collections::HashMap;

const KEY_SUBJECT_CODE: &str = "subjectCode";
const KEY_CLASS_GROUP_ID: &str = "classGroupId";
const KEY_SCHEDULE_SLOT_ID: &str = "scheduleSlotId";
const KEY_SELF_CREATED_ID: &str = "selfCreatedId";
const KEY_SEMESTER_CODE: &str = "semesterCode";
const REMINDER_METHOD_POPUP: &str = "popup";

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq, Default)]
pub struct CalendarEventDateTime {
    #[serde(rename = "dateTime", default, skip_serializing_if = "String::is_empty")]
    pub date_time: String,
    /// All-day events carry a date instead of a date-time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(rename = "timeZone", skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq, Default)]
pub struct CalendarEventExtendedProperties {
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub private: HashMap<String, String>,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct CalendarEventReminderOverride {
    pub method: String,
    pub minutes: u32,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq, Default)]
pub struct CalendarEventReminders {
    #[serde(rename = "useDefault")]
    pub use_default: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub overrides: Vec<CalendarEventReminderOverride>,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct GoogleCalendarEvent {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default)]
    pub start: CalendarEventDateTime,
    #[serde(default)]
    pub end: CalendarEventDateTime,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reminders: Option<CalendarEventReminders>,
    #[serde(rename = "extendedProperties", skip_serializing_if = "Option::is_none")]
    pub extended_properties: Option<CalendarEventExtendedProperties>,
}

/// Identifiers attached to every event written by a schedule sync.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SessionCorrelation {
    pub subject_code: String,
    pub class_group_id: Option<String>,
    pub schedule_slot_id: Option<String>,
    pub self_created_id: Option<String>,
    pub semester_code: i64,
}

pub fn encode_session_event(
    session: &ClassSession,
    semester_code: i64,
    start: &DateTime<Tz>,
    end: &DateTime<Tz>,
    reminder_minutes_before: u32,
) -> GoogleCalendarEvent {
    let mut private = HashMap::new();
    private.insert(KEY_SUBJECT_CODE.to_string(), session.subject_code.clone());
    private.insert(KEY_SEMESTER_CODE.to_string(), semester_code.to_string());
    for (key, value) in [
        (KEY_CLASS_GROUP_ID, &session.class_group_id),
        (KEY_SCHEDULE_SLOT_ID, &session.schedule_slot_id),
        (KEY_SELF_CREATED_ID, &session.self_created_id),
    ] {
        if let Some(value) = value.as_deref().map(str::trim).filter(|id| !id.is_empty()) {
            private.insert(key.to_string(), value.to_string());
        }
    }

    GoogleCalendarEvent {
        id: None,
        summary: Some(session.event_title()),
        location: Some(session.event_location()),
        description: Some(session.teacher_name.clone()),
        status: None,
        start: event_date_time(start),
        end: event_date_time(end),
        reminders: Some(CalendarEventReminders {
            use_default: false,
            overrides: vec![CalendarEventReminderOverride {
                method: REMINDER_METHOD_POPUP.to_string(),
                minutes: reminder_minutes_before,
            }],
        }),
        extended_properties: Some(CalendarEventExtendedProperties { private }),
    }
}

/// Reads back the correlation properties; `None` for events not written by a sync.
pub fn decode_correlation(event: &GoogleCalendarEvent) -> Option<SessionCorrelation> {
    let private = &event.extended_properties.as_ref()?.private;
    let subject_code = private.get(KEY_SUBJECT_CODE)?.clone();
    let semester_code = private.get(KEY_SEMESTER_CODE)?.trim().parse::<i64>().ok()?;
    let optional = |key: &str| {
        private
            .get(key)
            .map(|value| value.trim())
            .filter(|value| !value.is_empty())
            .map(ToOwned::to_owned)
    };

    Some(SessionCorrelation {
        subject_code,
        class_group_id: optional(KEY_CLASS_GROUP_ID),
        schedule_slot_id: optional(KEY_SCHEDULE_SLOT_ID),
        self_created_id: optional(KEY_SELF_CREATED_ID),
        semester_code,
    })
}

fn event_date_time(value: &DateTime<Tz>) -> CalendarEventDateTime {
    CalendarEventDateTime {
        date_time: value.to_rfc3339(),
        date: None,
        time_zone: Some(value.timezone().name().to_string()),
    }
}
