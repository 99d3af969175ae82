//! Existence and team-membership checks for a creation request.
//!
//! Stores perform the lookups inside their transaction and hand the answers
//! over as [`References`]; the rules themselves live here so every store
//! applies them identically.

use crate::models::{MembershipViolation, NewMatch, Reference, ScheduleError, TeamId};

/// Answers to the lookups a creation request needs.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct References {
    pub hall: bool,
    /// The table exists within the requested hall.
    pub table: bool,
    pub team1: bool,
    pub team2: bool,
    pub arbiter: bool,
    /// Teams the white player belongs to; `None` if the user is not a player.
    pub white_teams: Option<Vec<TeamId>>,
    /// Teams the black player belongs to; `None` if the user is not a player.
    pub black_teams: Option<Vec<TeamId>>,
}

/// First unresolved reference in order hall, table, team 1, team 2, white, black, arbiter.
pub fn check_references(request: &NewMatch, refs: &References) -> Result<(), ScheduleError> {
    let missing = if !refs.hall {
        Some(Reference::Hall(request.hall_id))
    } else if !refs.table {
        Some(Reference::Table {
            hall_id: request.hall_id,
            table_id: request.table_id,
        })
    } else if !refs.team1 {
        Some(Reference::Team(request.team1_id))
    } else if !refs.team2 {
        Some(Reference::Team(request.team2_id))
    } else if refs.white_teams.is_none() {
        Some(Reference::Player(request.white_player_username.clone()))
    } else if refs.black_teams.is_none() {
        Some(Reference::Player(request.black_player_username.clone()))
    } else if !refs.arbiter {
        Some(Reference::Arbiter(request.arbiter_username.clone()))
    } else {
        None
    };
    match missing {
        Some(reference) => Err(ScheduleError::UnknownReference(reference)),
        None => Ok(()),
    }
}

/// Distinct teams, distinct players, white on team 1, black on team 2.
pub fn check_membership(request: &NewMatch, refs: &References) -> Result<(), ScheduleError> {
    let violation = if request.team1_id == request.team2_id {
        Some(MembershipViolation::SameTeam(request.team1_id))
    } else if request.white_player_username == request.black_player_username {
        Some(MembershipViolation::SamePlayer(request.white_player_username.clone()))
    } else if !plays_for(&refs.white_teams, request.team1_id) {
        Some(MembershipViolation::NotOnTeam {
            username: request.white_player_username.clone(),
            team_id: request.team1_id,
        })
    } else if !plays_for(&refs.black_teams, request.team2_id) {
        Some(MembershipViolation::NotOnTeam {
            username: request.black_player_username.clone(),
            team_id: request.team2_id,
        })
    } else {
        None
    };
    match violation {
        Some(v) => Err(ScheduleError::TeamMembership(v)),
        None => Ok(()),
    }
}

fn plays_for(teams: &Option<Vec<TeamId>>, team_id: TeamId) -> bool {
    teams.as_ref().is_some_and(|t| t.contains(&team_id))
}
