use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::employee::EmployeeSummary;
use super::user::UserInfo;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct TimesheetEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub clock_in_time: DateTime<Utc>,
    pub clock_out_time: Option<DateTime<Utc>>,
    /// Whole seconds between clock-in and clock-out, set when the shift closes.
    pub working_seconds: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClockInInput {
    pub clock_in_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClockOutInput {
    pub clock_out_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimesheetEntryView {
    pub id: Uuid,
    pub user_id: Uuid,
    pub clock_in_time: DateTime<Utc>,
    pub clock_out_time: Option<DateTime<Utc>>,
    pub working_seconds: Option<i64>,
    /// `HH:MM:SS`, null while the shift is open.
    pub working_hours: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamTimesheetEntry {
    #[serde(flatten)]
    pub entry: TimesheetEntryView,
    pub requester: UserInfo,
    pub employee: Option<EmployeeSummary>,
}

impl TimesheetEntry {
    pub fn open(user_id: Uuid, clock_in_time: DateTime<Utc>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            clock_in_time,
            clock_out_time: None,
            working_seconds: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_open(&self) -> bool {
        self.clock_out_time.is_none()
    }

    pub fn working_hours(&self) -> Option<Duration> {
        self.clock_out_time.map(|out| out - self.clock_in_time)
    }

    pub fn close(&mut self, clock_out_time: DateTime<Utc>) {
        self.clock_out_time = Some(clock_out_time);
        self.working_seconds = self.working_hours().map(|d| d.num_seconds());
        self.updated_at = Utc::now();
    }
}

pub fn format_duration(duration: Duration) -> String {
    let total = duration.num_seconds().max(0);
    format!(
        "{:02}:{:02}:{:02}",
        total / 3600,
        (total % 3600) / 60,
        total % 60
    )
}

impl From<TimesheetEntry> for TimesheetEntryView {
    fn from(entry: TimesheetEntry) -> Self {
        let working_hours = entry.working_hours().map(format_duration);
        Self {
            id: entry.id,
            user_id: entry.user_id,
            clock_in_time: entry.clock_in_time,
            clock_out_time: entry.clock_out_time,
            working_seconds: entry.working_seconds,
            working_hours,
        }
    }
}
