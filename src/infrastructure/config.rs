use crate::domain::period_time::{DEFAULT_TIME_ZONE, PeriodSlot, PeriodTable};
use crate::infrastructure::error::InfraError;
use chrono::NaiveTime;
use chrono_tz::Tz;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

const APP_JSON: &str = "app.json";
const PERIODS_JSON: &str = "periods.json";
const PERIOD_TIME_FORMAT: &str = "%H:%M";

pub const DEFAULT_REMINDER_MINUTES_BEFORE: u32 = 15;
pub const DEFAULT_CLEAR_EVENTS_MAX_RESULTS: u32 = 2500;

#[derive(Debug, Clone)]
pub struct SyncConfig {
    pub time_zone: Tz,
    pub reminder_minutes_before: u32,
    pub clear_events_max_results: u32,
    pub calendar_api_base: Option<String>,
    pub period_table: PeriodTable,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            time_zone: DEFAULT_TIME_ZONE,
            reminder_minutes_before: DEFAULT_REMINDER_MINUTES_BEFORE,
            clear_events_max_results: DEFAULT_CLEAR_EVENTS_MAX_RESULTS,
            calendar_api_base: None,
            period_table: PeriodTable::default(),
        }
    }
}

fn default_periods() -> serde_json::Value {
    let periods: Vec<serde_json::Value> = PeriodTable::default()
        .slots()
        .iter()
        .map(|slot| {
            serde_json::json!({
                "start": slot.start.format(PERIOD_TIME_FORMAT).to_string(),
                "end": slot.end.format(PERIOD_TIME_FORMAT).to_string(),
            })
        })
        .collect();
    serde_json::json!({
        "schema": 1,
        "periods": periods
    })
}

fn default_files() -> HashMap<&'static str, serde_json::Value> {
    HashMap::from([
        (
            APP_JSON,
            serde_json::json!({
                "schema": 1,
                "appName": "StudentPortal",
                "timezone": DEFAULT_TIME_ZONE.name(),
                "reminderMinutesBefore": DEFAULT_REMINDER_MINUTES_BEFORE,
                "clearEventsMaxResults": DEFAULT_CLEAR_EVENTS_MAX_RESULTS,
                "calendarApiBase": null
            }),
        ),
        (PERIODS_JSON, default_periods()),
    ])
}

pub fn ensure_default_configs(config_dir: &Path) -> Result<(), InfraError> {
    for (name, value) in default_files() {
        let path = config_dir.join(name);
        if !path.exists() {
            let formatted = serde_json::to_string_pretty(&value)?;
            fs::write(path, format!("{formatted}\n"))?;
        }
    }
    Ok(())
}

fn read_config(path: &Path) -> Result<serde_json::Value, InfraError> {
    let raw = fs::read_to_string(path)?;
    let parsed: serde_json::Value = serde_json::from_str(&raw)?;
    let schema = parsed
        .get("schema")
        .and_then(serde_json::Value::as_u64)
        .ok_or_else(|| InfraError::InvalidConfig(format!("missing schema in {}", path.display())))?;
    if schema != 1 {
        return Err(InfraError::InvalidConfig(format!(
            "unsupported schema {} in {}",
            schema,
            path.display()
        )));
    }
    Ok(parsed)
}

fn read_u32(app: &serde_json::Value, key: &str, default: u32) -> Result<u32, InfraError> {
    match app.get(key) {
        None | Some(serde_json::Value::Null) => Ok(default),
        Some(value) => value
            .as_u64()
            .and_then(|value| u32::try_from(value).ok())
            .ok_or_else(|| InfraError::InvalidConfig(format!("{key} must be a non-negative integer"))),
    }
}

fn parse_period_time(value: Option<&serde_json::Value>, field: &str) -> Result<NaiveTime, InfraError> {
    let raw = value
        .and_then(serde_json::Value::as_str)
        .map(str::trim)
        .ok_or_else(|| InfraError::InvalidConfig(format!("missing {field}")))?;
    NaiveTime::parse_from_str(raw, PERIOD_TIME_FORMAT)
        .map_err(|error| InfraError::InvalidConfig(format!("invalid {field} '{raw}': {error}")))
}

pub fn read_period_table(config_dir: &Path) -> Result<PeriodTable, InfraError> {
    let path = config_dir.join(PERIODS_JSON);
    if !path.exists() {
        return Ok(PeriodTable::default());
    }
    let periods = read_config(&path)?;
    let entries = periods
        .get("periods")
        .and_then(serde_json::Value::as_array)
        .ok_or_else(|| InfraError::InvalidConfig(format!("missing periods array in {}", path.display())))?;

    let slots = entries
        .iter()
        .enumerate()
        .map(|(index, entry)| {
            let period = index + 1;
            Ok(PeriodSlot {
                start: parse_period_time(entry.get("start"), &format!("period {period} start"))?,
                end: parse_period_time(entry.get("end"), &format!("period {period} end"))?,
            })
        })
        .collect::<Result<Vec<_>, InfraError>>()?;

    PeriodTable::new(slots).map_err(|error| InfraError::InvalidConfig(error.to_string()))
}

pub fn load_sync_config(config_dir: &Path) -> Result<SyncConfig, InfraError> {
    let app = read_config(&config_dir.join(APP_JSON))?;

    let time_zone = match app
        .get("timezone")
        .and_then(serde_json::Value::as_str)
        .map(str::trim)
        .filter(|value| !value.is_empty())
    {
        Some(name) => name
            .parse::<Tz>()
            .map_err(|error| InfraError::InvalidConfig(format!("invalid timezone '{name}': {error}")))?,
        None => DEFAULT_TIME_ZONE,
    };

    let clear_events_max_results =
        read_u32(&app, "clearEventsMaxResults", DEFAULT_CLEAR_EVENTS_MAX_RESULTS)?;
    if clear_events_max_results == 0 {
        return Err(InfraError::InvalidConfig(
            "clearEventsMaxResults must be positive".to_string(),
        ));
    }

    let calendar_api_base = app
        .get("calendarApiBase")
        .and_then(serde_json::Value::as_str)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(ToOwned::to_owned);

    Ok(SyncConfig {
        time_zone,
        reminder_minutes_before: read_u32(
            &app,
            "reminderMinutesBefore",
            DEFAULT_REMINDER_MINUTES_BEFORE,
        )?,
        clear_events_max_results,
        calendar_api_base,
        period_table: read_period_table(config_dir)?,
    })
}
