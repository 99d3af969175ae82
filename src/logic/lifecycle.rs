//! Post-creation rules: who may rate, record a result, or delete a match, and when.

use crate::models::{Match, ScheduleError};
use chrono::NaiveDate;

/// A rating is set once, by the assigned arbiter, after the match date.
pub fn check_rating(m: &Match, arbiter: &str, today: NaiveDate) -> Result<(), ScheduleError> {
    check_assigned_arbiter(m, arbiter)?;
    if m.date >= today {
        return Err(ScheduleError::NotYetPlayed);
    }
    if m.rating.is_some() {
        return Err(ScheduleError::AlreadyRated);
    }
    Ok(())
}

/// Same window as ratings; a result is also attached once.
pub fn check_result(m: &Match, arbiter: &str, today: NaiveDate) -> Result<(), ScheduleError> {
    check_assigned_arbiter(m, arbiter)?;
    if m.date >= today {
        return Err(ScheduleError::NotYetPlayed);
    }
    if m.result.is_some() {
        return Err(ScheduleError::AlreadyRecorded);
    }
    Ok(())
}

/// Only a coach of one of the two teams, and only while the date is still ahead.
///
/// `team_coaches` are the coach usernames of team 1 and team 2.
pub fn check_deletion(
    m: &Match,
    coach: &str,
    team_coaches: &[&str],
    today: NaiveDate,
) -> Result<(), ScheduleError> {
    if !team_coaches.contains(&coach) {
        return Err(ScheduleError::Forbidden(
            "You can only delete matches involving your team".to_string(),
        ));
    }
    if m.date <= today {
        return Err(ScheduleError::DeletionClosed);
    }
    Ok(())
}

fn check_assigned_arbiter(m: &Match, arbiter: &str) -> Result<(), ScheduleError> {
    if m.arbiter_username != arbiter {
        return Err(ScheduleError::Forbidden(
            "You can only update matches you are assigned to".to_string(),
        ));
    }
    Ok(())
}
