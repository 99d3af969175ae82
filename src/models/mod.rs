//! Data structures for the chess tournament: matches, slot spans, reference data, users.

mod chess_match;
mod error;
mod reference;
mod schedule;
mod user;

pub use chess_match::{Match, MatchFilter, MatchId, MatchResult, MatchState, MatchSummary, NewMatch};
pub use error::{MembershipViolation, Reference, ScheduleError};
pub use reference::{Arbiter, Hall, HallId, Player, Table, TableId, Team, TeamId, Title, TitleId};
pub use schedule::{SlotSpan, MATCH_LENGTH, SLOTS_PER_DAY};
pub use user::{Identity, Role, User};
