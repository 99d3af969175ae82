//! Everything that can reject a scheduling, rating, result, or deletion request.

use crate::models::chess_match::MatchId;
use crate::models::reference::{HallId, TableId, TeamId};

/// A reference in a request that did not resolve to an existing record.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Reference {
    Hall(HallId),
    Table { hall_id: HallId, table_id: TableId },
    Team(TeamId),
    Player(String),
    Arbiter(String),
}

impl std::fmt::Display for Reference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Reference::Hall(id) => write!(f, "hall {}", id),
            Reference::Table { hall_id, table_id } => write!(f, "table {} in hall {}", table_id, hall_id),
            Reference::Team(id) => write!(f, "team {}", id),
            Reference::Player(username) => write!(f, "player '{}'", username),
            Reference::Arbiter(username) => write!(f, "arbiter '{}'", username),
        }
    }
}

/// Which membership rule a creation request broke.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum MembershipViolation {
    /// Both sides name the same team.
    SameTeam(TeamId),
    /// White and black are the same user.
    SamePlayer(String),
    /// The player is not on the team whose color they were given.
    NotOnTeam { username: String, team_id: TeamId },
}

impl std::fmt::Display for MembershipViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MembershipViolation::SameTeam(id) => write!(f, "Team {} cannot play against itself", id),
            MembershipViolation::SamePlayer(username) => {
                write!(f, "Player '{}' cannot play both colors", username)
            }
            MembershipViolation::NotOnTeam { username, team_id } => {
                write!(f, "Player '{}' is not a member of team {}", username, team_id)
            }
        }
    }
}

/// Rejections, grouped roughly as: input, reference, conflict, authorization, lifecycle, infrastructure.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ScheduleError {
    /// Date is malformed or before today.
    InvalidDate(String),
    /// Slot start whose two-slot span does not fit in the day.
    InvalidSlot(i64),
    /// Rating outside 1..=10.
    InvalidRating(i64),
    /// Empty or oversized hall name.
    InvalidName,
    /// A JSON body that could not be decoded. `kind` names the category of the offending field.
    MalformedBody { kind: &'static str, reason: String },
    UnknownReference(Reference),
    TeamMembership(MembershipViolation),
    /// The hall/table is already booked in an overlapping span.
    LocationConflict { match_id: MatchId },
    /// The arbiter already officiates an overlapping match.
    ArbiterConflict { match_id: MatchId },
    /// A selected player already plays (either color) in an overlapping match.
    PlayerConflict { match_id: MatchId, username: String },
    /// The store refused the write (serialization failure or uniqueness safety net).
    Conflict,
    MatchNotFound(MatchId),
    HallNotFound(HallId),
    /// Requester is not the assigned arbiter or not a coach of the teams involved.
    Forbidden(String),
    /// Rating or result submitted before the match date has passed.
    NotYetPlayed,
    AlreadyRated,
    AlreadyRecorded,
    /// Deletion requested on or after the match date.
    DeletionClosed,
    /// The store did not answer in time; nothing was written.
    Timeout,
    Storage(String),
}

impl ScheduleError {
    /// Stable machine-readable category, used as the `error` field of API responses.
    pub fn kind(&self) -> &'static str {
        use ScheduleError::*;
        match self {
            InvalidDate(_) => "invalid-date",
            InvalidSlot(_) => "invalid-slot",
            InvalidRating(_) => "invalid-rating",
            InvalidName => "invalid-name",
            MalformedBody { kind, .. } => *kind,
            UnknownReference(_) => "unknown-reference",
            TeamMembership(_) => "team-membership-violation",
            LocationConflict { .. } => "location-conflict",
            ArbiterConflict { .. } => "arbiter-conflict",
            PlayerConflict { .. } => "player-conflict",
            Conflict => "conflict",
            MatchNotFound(_) | HallNotFound(_) => "not-found",
            Forbidden(_) => "forbidden",
            NotYetPlayed => "not-yet-played",
            AlreadyRated => "already-rated",
            AlreadyRecorded => "already-recorded",
            DeletionClosed => "deletion-closed",
            Timeout => "timeout",
            Storage(_) => "storage",
        }
    }

    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            ScheduleError::LocationConflict { .. }
                | ScheduleError::ArbiterConflict { .. }
                | ScheduleError::PlayerConflict { .. }
                | ScheduleError::Conflict
        )
    }
}

impl std::fmt::Display for ScheduleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use ScheduleError::*;
        match self {
            InvalidDate(reason) => write!(f, "Invalid match date: {}", reason),
            InvalidSlot(start) => write!(f, "Time slot {} cannot start a two-slot match", start),
            InvalidRating(rating) => write!(f, "Rating must be between 1 and 10 (got {})", rating),
            InvalidName => write!(f, "Hall name must be between 1 and 50 characters"),
            MalformedBody { reason, .. } => write!(f, "Malformed request body: {}", reason),
            UnknownReference(reference) => write!(f, "Unknown {}", reference),
            TeamMembership(violation) => write!(f, "{}", violation),
            LocationConflict { match_id } => {
                write!(f, "Table is already booked at an overlapping time by match {}", match_id)
            }
            ArbiterConflict { match_id } => {
                write!(f, "Arbiter is already assigned at an overlapping time in match {}", match_id)
            }
            PlayerConflict { match_id, username } => write!(
                f,
                "Player '{}' already plays at an overlapping time in match {}",
                username, match_id
            ),
            Conflict => write!(f, "A conflicting match was scheduled concurrently, please retry"),
            MatchNotFound(id) => write!(f, "Match {} not found", id),
            HallNotFound(id) => write!(f, "Hall {} not found", id),
            Forbidden(reason) => write!(f, "{}", reason),
            NotYetPlayed => write!(f, "Only matches that have already taken place can be updated"),
            AlreadyRated => write!(f, "This match has already been rated"),
            AlreadyRecorded => write!(f, "This match already has a result"),
            DeletionClosed => write!(f, "Matches can only be deleted before their date"),
            Timeout => write!(f, "The request timed out before it could be saved"),
            Storage(e) => write!(f, "Storage error: {}", e),
        }
    }
}

impl std::error::Error for ScheduleError {}
