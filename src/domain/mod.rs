pub mod models;
pub mod period_time;
