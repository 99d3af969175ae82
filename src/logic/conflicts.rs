//! Overlap detection across the three conflict dimensions: location, arbiter, player.

use crate::models::{Match, NewMatch, ScheduleError};

/// Find the conflict a candidate match would create against already-booked matches.
///
/// Only matches on the same date whose slot spans overlap the candidate's are
/// considered. Each dimension is evaluated independently over those matches
/// and the first conflict is reported in the order location, arbiter, player,
/// naming the earliest conflicting match by (time slot, id).
///
/// A player is checked across both colors: being white in one match and black
/// in an overlapping one is still a conflict.
pub fn find_conflict<'a, I>(candidate: &NewMatch, existing: I) -> Option<ScheduleError>
where
    I: IntoIterator<Item = &'a Match>,
{
    let mut overlapping: Vec<&Match> = existing
        .into_iter()
        .filter(|m| m.date == candidate.date && m.time_slot.overlaps(&candidate.time_slot))
        .collect();
    overlapping.sort_by_key(|m| (m.time_slot, m.id));

    if let Some(m) = overlapping
        .iter()
        .find(|m| m.hall_id == candidate.hall_id && m.table_id == candidate.table_id)
    {
        return Some(ScheduleError::LocationConflict { match_id: m.id });
    }

    if let Some(m) = overlapping
        .iter()
        .find(|m| m.arbiter_username == candidate.arbiter_username)
    {
        return Some(ScheduleError::ArbiterConflict { match_id: m.id });
    }

    overlapping.iter().find_map(|m| {
        candidate
            .players()
            .into_iter()
            .find(|p| m.involves_player(p))
            .map(|username| ScheduleError::PlayerConflict {
                match_id: m.id,
                username: username.to_string(),
            })
    })
}
