use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone};
use chrono_tz::Tz;
use thiserror::Error;

pub const DEFAULT_TIME_ZONE: Tz = chrono_tz::Asia::Ho_Chi_Minh;

const DEFAULT_BELL_SCHEDULE: [((u32, u32), (u32, u32)); 15] = [
    ((7, 0), (7, 50)),
    ((7, 50), (8, 40)),
    ((8, 50), (9, 40)),
    ((9, 50), (10, 40)),
    ((10, 40), (11, 30)),
    ((11, 30), (12, 20)),
    ((13, 0), (13, 50)),
    ((13, 50), (14, 40)),
    ((14, 50), (15, 40)),
    ((15, 40), (16, 30)),
    ((16, 30), (17, 20)),
    ((17, 20), (18, 10)),
    ((18, 15), (19, 0)),
    ((19, 0), (19, 45)),
    ((19, 45), (20, 30)),
];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PeriodTimeError {
    #[error("invalid period range: start period {start_period}, period count {period_count}")]
    InvalidPeriod { start_period: i32, period_count: i32 },
    #[error("local time {time} does not exist on {date} in {time_zone}")]
    NonexistentLocalTime {
        date: NaiveDate,
        time: NaiveTime,
        time_zone: String,
    },
    #[error("invalid period table: {0}")]
    InvalidTable(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeriodSlot {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

/// Bell schedule, indexed by 1-based period number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeriodTable {
    slots: Vec<PeriodSlot>,
}

impl PeriodTable {
    pub fn new(slots: Vec<PeriodSlot>) -> Result<Self, PeriodTimeError> {
        if slots.is_empty() {
            return Err(PeriodTimeError::InvalidTable(
                "period table must not be empty".to_string(),
            ));
        }
        for (index, slot) in slots.iter().enumerate() {
            if slot.end <= slot.start {
                return Err(PeriodTimeError::InvalidTable(format!(
                    "period {} ends at {} which is not after its start {}",
                    index + 1,
                    slot.end,
                    slot.start
                )));
            }
        }
        Ok(Self { slots })
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn slot(&self, period: i32) -> Option<PeriodSlot> {
        let index = usize::try_from(period.checked_sub(1)?).ok()?;
        self.slots.get(index).copied()
    }

    pub fn slots(&self) -> &[PeriodSlot] {
        &self.slots
    }
}

impl Default for PeriodTable {
    fn default() -> Self {
        let slots = DEFAULT_BELL_SCHEDULE
            .iter()
            .filter_map(|&((start_h, start_m), (end_h, end_m))| {
                Some(PeriodSlot {
                    start: NaiveTime::from_hms_opt(start_h, start_m, 0)?,
                    end: NaiveTime::from_hms_opt(end_h, end_m, 0)?,
                })
            })
            .collect();
        Self { slots }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTimeRange {
    pub start: DateTime<Tz>,
    pub end: DateTime<Tz>,
}

#[derive(Debug, Clone)]
pub struct PeriodTimeResolver {
    table: PeriodTable,
    time_zone: Tz,
}

impl PeriodTimeResolver {
    pub fn new(table: PeriodTable, time_zone: Tz) -> Self {
        Self { table, time_zone }
    }

    pub fn time_zone(&self) -> Tz {
        self.time_zone
    }

    pub fn table(&self) -> &PeriodTable {
        &self.table
    }

    pub fn resolve(
        &self,
        start_period: i32,
        period_count: i32,
        date: NaiveDate,
    ) -> Result<ResolvedTimeRange, PeriodTimeError> {
        let invalid = || PeriodTimeError::InvalidPeriod {
            start_period,
            period_count,
        };
        if period_count < 1 {
            return Err(invalid());
        }
        let end_period = start_period
            .checked_add(period_count - 1)
            .ok_or_else(invalid)?;
        let first = self.table.slot(start_period).ok_or_else(invalid)?;
        let last = self.table.slot(end_period).ok_or_else(invalid)?;

        Ok(ResolvedTimeRange {
            start: self.localize(date, first.start)?,
            end: self.localize(date, last.end)?,
        })
    }

    fn localize(&self, date: NaiveDate, time: NaiveTime) -> Result<DateTime<Tz>, PeriodTimeError> {
        self.time_zone
            .from_local_datetime(&date.and_time(time))
            .earliest()
            .ok_or_else(|| PeriodTimeError::NonexistentLocalTime {
                date,
                time,
                time_zone: self.time_zone.name().to_string(),
            })
    }
}

impl Default for PeriodTimeResolver {
    fn default() -> Self {
        Self::new(PeriodTable::default(), DEFAULT_TIME_ZONE)
    }
}
