use crate::domain::models::WeeklySchedule;
use crate::infrastructure::error::InfraError;
use async_trait::async_trait;

/// Provides an already-fetched, already-validated weekly schedule.
#[async_trait]
pub trait ScheduleSource: Send + Sync {
    async fn get_weekly_schedule(&self, semester_code: i64) -> Result<WeeklySchedule, InfraError>;
}
