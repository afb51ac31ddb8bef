use chrono::{DateTime, Duration, NaiveDate, TimeZone, Timelike};
use uuid::Uuid;

use crate::constants::{
    HIDALGO_FOR_DATE_FIRST, HIDALGO_FOR_DATE_LAST, HIDALGO_VALIDATION_DEADLINE_DAYS,
};
use crate::models::HidalgoCheckin;

/// The morning question shows up from 10:00, local to the caller.
pub const HIDALGO_PROMPT_HOUR: u32 = 10;

/// The night a prompt shown at `now` asks about: yesterday.
pub fn prompt_for_date<Tz: TimeZone>(now: &DateTime<Tz>) -> NaiveDate {
    (now.clone() - Duration::days(1)).date_naive()
}

pub fn in_checkin_window(for_date: NaiveDate) -> bool {
    for_date >= *HIDALGO_FOR_DATE_FIRST && for_date <= *HIDALGO_FOR_DATE_LAST
}

/// Whether to confront a player with the morning question right now.
pub fn should_prompt<Tz: TimeZone>(now: &DateTime<Tz>, already_answered: bool) -> bool {
    now.hour() >= HIDALGO_PROMPT_HOUR
        && !already_answered
        && in_checkin_window(prompt_for_date(now))
}

/// Validations close one calendar day after the night in question.
/// Date comparison only, clock time never matters.
pub fn is_past_validation_deadline(for_date: NaiveDate, today: NaiveDate) -> bool {
    today > for_date + Duration::days(HIDALGO_VALIDATION_DEADLINE_DAYS)
}

/// Check-ins teammates can still act on: confessed, inside the weekend,
/// deadline not yet passed, and at least one empty slot.
pub fn pending_validations<'a>(
    checkins: &'a [HidalgoCheckin],
    today: NaiveDate,
) -> Vec<&'a HidalgoCheckin> {
    checkins
        .iter()
        .filter(|c| {
            c.said_yes
                && in_checkin_window(c.for_date)
                && !is_past_validation_deadline(c.for_date, today)
                && (c.validated_by_same_team_id.is_none()
                    || c.validated_by_opposite_team_id.is_none())
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationSlot {
    SameTeam,
    OppositeTeam,
}

impl ValidationSlot {
    pub fn column(&self) -> &'static str {
        match self {
            ValidationSlot::SameTeam => "validated_by_same_team_id",
            ValidationSlot::OppositeTeam => "validated_by_opposite_team_id",
        }
    }
}

/// Which slot a given validator may sign, based on whose team the
/// check-in owner is on. Validators without a team sign nothing.
pub fn slot_for_validator(
    owner_team: Option<Uuid>,
    validator_team: Option<Uuid>,
) -> Option<ValidationSlot> {
    let validator_team = validator_team?;
    if owner_team == Some(validator_team) {
        Some(ValidationSlot::SameTeam)
    } else {
        Some(ValidationSlot::OppositeTeam)
    }
}
