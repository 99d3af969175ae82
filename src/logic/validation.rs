//! Input validation: everything that can be rejected before touching the store.

use crate::models::{HallId, NewMatch, ScheduleError, SlotSpan, TableId, TeamId};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::Value;

/// Longest hall name the schema accepts.
pub const MAX_HALL_NAME_LEN: usize = 50;

pub const MIN_RATING: i64 = 1;
pub const MAX_RATING: i64 = 10;

/// Raw match-creation body as submitted by a coach.
///
/// The date stays a string here so that a malformed date is reported as
/// `invalid-date` instead of a generic JSON error.
#[derive(Clone, Debug, Deserialize)]
pub struct MatchRequest {
    pub date: String,
    pub time_slot: i64,
    pub hall_id: HallId,
    pub table_id: TableId,
    pub team1_id: TeamId,
    pub team2_id: TeamId,
    pub white_player_username: String,
    pub black_player_username: String,
    pub arbiter_username: String,
}

impl MatchRequest {
    /// Decode a creation body. A missing or mistyped `date` or `time_slot` is
    /// reported under its own category; any other decoding failure is `invalid-body`.
    pub fn from_json(body: Value) -> Result<Self, ScheduleError> {
        if !body.is_object() {
            return Err(malformed("invalid-body", "expected a JSON object".to_string()));
        }
        match body.get("date") {
            Some(Value::String(_)) => {}
            Some(other) => {
                return Err(ScheduleError::InvalidDate(format!("{} is not a YYYY-MM-DD string", other)))
            }
            None => return Err(ScheduleError::InvalidDate("date is missing".to_string())),
        }
        match body.get("time_slot") {
            Some(slot) if slot.is_i64() => {}
            Some(other) => {
                return Err(malformed("invalid-slot", format!("time_slot {} is not an integer", other)))
            }
            None => return Err(malformed("invalid-slot", "time_slot is missing".to_string())),
        }
        serde_json::from_value(body).map_err(|e| malformed("invalid-body", e.to_string()))
    }
}

fn malformed(kind: &'static str, reason: String) -> ScheduleError {
    ScheduleError::MalformedBody { kind, reason }
}

/// Parse an ISO `YYYY-MM-DD` date.
pub fn parse_date(text: &str) -> Result<NaiveDate, ScheduleError> {
    NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d")
        .map_err(|_| ScheduleError::InvalidDate(format!("'{}' is not a YYYY-MM-DD date", text)))
}

/// Check date and slot, producing a typed request. Today is a valid match date.
pub fn validate_request(request: &MatchRequest, today: NaiveDate) -> Result<NewMatch, ScheduleError> {
    let date = parse_date(&request.date)?;
    if date < today {
        return Err(ScheduleError::InvalidDate(format!("{} is in the past", date)));
    }
    let time_slot = SlotSpan::starting_at(request.time_slot)?;
    Ok(NewMatch {
        date,
        time_slot,
        hall_id: request.hall_id,
        table_id: request.table_id,
        team1_id: request.team1_id,
        team2_id: request.team2_id,
        white_player_username: request.white_player_username.trim().to_string(),
        black_player_username: request.black_player_username.trim().to_string(),
        arbiter_username: request.arbiter_username.trim().to_string(),
    })
}

/// The integer inside a JSON `rating` field; anything else is `invalid-rating`.
pub fn rating_from_json(value: &Value) -> Result<i64, ScheduleError> {
    value
        .as_i64()
        .ok_or_else(|| malformed("invalid-rating", format!("rating {} is not an integer", value)))
}

pub fn validate_rating(rating: i64) -> Result<u8, ScheduleError> {
    if !(MIN_RATING..=MAX_RATING).contains(&rating) {
        return Err(ScheduleError::InvalidRating(rating));
    }
    Ok(rating as u8)
}

/// Trimmed hall name, non-empty and within the column width.
pub fn validate_hall_name(name: &str) -> Result<String, ScheduleError> {
    let trimmed = name.trim();
    if trimmed.is_empty() || trimmed.chars().count() > MAX_HALL_NAME_LEN {
        return Err(ScheduleError::InvalidName);
    }
    Ok(trimmed.to_string())
}
