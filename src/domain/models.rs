use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub const FATAL_PROGRESS_INDEX: i32 = -1;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ClassSession {
    #[serde(default)]
    pub study_date: Option<NaiveDate>,
    #[serde(default)]
    pub start_period: Option<i32>,
    #[serde(default)]
    pub period_count: Option<i32>,
    #[serde(default)]
    pub subject_name: String,
    #[serde(default)]
    pub subject_code: String,
    #[serde(default)]
    pub room_code: String,
    #[serde(default)]
    pub campus_code: String,
    #[serde(default)]
    pub teacher_name: String,
    #[serde(default)]
    pub class_group_id: Option<String>,
    #[serde(default)]
    pub schedule_slot_id: Option<String>,
    #[serde(default)]
    pub self_created_id: Option<String>,
}

impl ClassSession {
    pub fn start_period_or_default(&self) -> i32 {
        self.start_period.unwrap_or(1)
    }

    pub fn period_count_or_default(&self) -> i32 {
        self.period_count.unwrap_or(1)
    }

    pub fn event_title(&self) -> String {
        format!("{} - {}", self.subject_name, self.subject_code)
    }

    pub fn event_location(&self) -> String {
        format!("{} - {}", self.room_code, self.campus_code)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleWeek {
    #[serde(default)]
    pub from_date: Option<NaiveDate>,
    #[serde(default)]
    pub to_date: Option<NaiveDate>,
    #[serde(default)]
    pub sessions: Vec<ClassSession>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct WeeklySchedule {
    #[serde(default)]
    pub weeks: Vec<ScheduleWeek>,
}

impl WeeklySchedule {
    pub fn from_sessions(sessions: Vec<ClassSession>) -> Self {
        Self {
            weeks: vec![ScheduleWeek {
                from_date: None,
                to_date: None,
                sessions,
            }],
        }
    }

    /// All sessions of every week in their original order.
    pub fn flatten_sessions(self) -> Vec<ClassSession> {
        self.weeks
            .into_iter()
            .flat_map(|week| week.sessions)
            .collect()
    }

    pub fn session_count(&self) -> usize {
        self.weeks.iter().map(|week| week.sessions.len()).sum()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SemesterIdentity {
    pub code: i64,
    pub name: String,
}

impl SemesterIdentity {
    pub fn new(code: i64, name: impl Into<String>) -> Self {
        Self {
            code,
            name: name.into(),
        }
    }

    /// Directory lookup key. Two semesters with the same title collide.
    pub fn calendar_title(&self) -> String {
        format!("{} - {}", self.name, self.code)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CalendarCheck {
    HasEvent(String),
    CalendarNotFound,
    Error(String),
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SyncProgress {
    pub index: i32,
    pub total: i32,
    pub event_title: String,
    pub is_success: bool,
    pub error_message: Option<String>,
    pub success_count: i32,
    pub error_count: i32,
}

impl SyncProgress {
    pub fn fatal(message: impl Into<String>) -> Self {
        Self {
            index: FATAL_PROGRESS_INDEX,
            total: FATAL_PROGRESS_INDEX,
            event_title: String::new(),
            is_success: false,
            error_message: Some(message.into()),
            success_count: 0,
            error_count: 0,
        }
    }

    pub fn is_fatal(&self) -> bool {
        self.index == FATAL_PROGRESS_INDEX && self.total == FATAL_PROGRESS_INDEX
    }

    /// True on the last value of a run that reached its loop.
    pub fn is_terminal(&self) -> bool {
        !self.is_fatal() && self.success_count + self.error_count == self.total
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct SyncSummary {
    pub total: i32,
    pub success_count: i32,
    pub error_count: i32,
    pub skipped_count: i32,
}

impl SyncSummary {
    pub fn from_terminal(progress: &SyncProgress, skipped_count: i32) -> Option<Self> {
        if !progress.is_terminal() {
            return None;
        }
        Some(Self {
            total: progress.total,
            success_count: progress.success_count,
            error_count: progress.error_count,
            skipped_count,
        })
    }
}
