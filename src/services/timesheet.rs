use chrono::Utc;

use crate::database::models::{
    ClockInInput, ClockOutInput, TeamTimesheetEntry, TimesheetEntryView,
};
use crate::database::repositories::Stores;
use crate::error::AppError;
use crate::services::actor::Actor;
use crate::services::policy;

#[derive(Clone)]
pub struct TimesheetService {
    stores: Stores,
}

impl TimesheetService {
    pub fn new(stores: Stores) -> Self {
        Self { stores }
    }

    pub async fn clock_in(
        &self,
        actor: &Actor,
        input: ClockInInput,
    ) -> Result<TimesheetEntryView, AppError> {
        let user_id = actor.user_id();

        if self.stores.timesheets.find_open(user_id).await?.is_some() {
            return Err(AppError::invalid("You have already clocked in."));
        }

        let clock_in_time = input.clock_in_time.unwrap_or_else(Utc::now);
        // The open-shift unique index catches a racing second clock-in
        let entry = self
            .stores
            .timesheets
            .clock_in(user_id, clock_in_time)
            .await?;

        log::info!("User {} clocked in at {}", user_id, entry.clock_in_time);
        Ok(entry.into())
    }

    pub async fn clock_out(
        &self,
        actor: &Actor,
        input: ClockOutInput,
    ) -> Result<TimesheetEntryView, AppError> {
        let no_open_entry = || AppError::invalid("No active clock-in found.");
        let user_id = actor.user_id();

        let mut entry = self
            .stores
            .timesheets
            .find_open(user_id)
            .await?
            .ok_or_else(no_open_entry)?;

        let clock_out_time = input.clock_out_time.unwrap_or_else(Utc::now);
        if clock_out_time < entry.clock_in_time {
            return Err(AppError::validation(
                "clock_out_time",
                "Clock-out time must be after clock-in time.",
            ));
        }

        entry.close(clock_out_time);
        let working_seconds = entry.working_seconds.unwrap_or_default();

        let entry = self
            .stores
            .timesheets
            .clock_out(entry.id, clock_out_time, working_seconds)
            .await?
            .ok_or_else(no_open_entry)?;

        log::info!(
            "User {} clocked out after {} seconds",
            user_id,
            working_seconds
        );
        Ok(entry.into())
    }

    pub async fn list_mine(&self, actor: &Actor) -> Result<Vec<TimesheetEntryView>, AppError> {
        let entries = self
            .stores
            .timesheets
            .list_for_user(actor.user_id())
            .await?;

        Ok(entries.into_iter().map(TimesheetEntryView::from).collect())
    }

    pub async fn list_team(&self, actor: &Actor) -> Result<Vec<TeamTimesheetEntry>, AppError> {
        let scope = policy::team_scope(actor)?;
        Ok(self.stores.timesheets.list_for_team(scope).await?)
    }
}
