//! Chess tournament web app: library with models, scheduling rules, stores, and the REST API.

pub mod api;
pub mod auth;
pub mod config;
pub mod logic;
pub mod models;
pub mod scheduler;
pub mod store;

pub use logic::{find_conflict, MatchRequest};
pub use models::{
    Identity, Match, MatchFilter, MatchId, MatchResult, MatchState, MatchSummary, NewMatch, Role,
    ScheduleError, SlotSpan,
};
pub use scheduler::{Clock, Scheduler};
pub use store::{MatchStore, MemoryStore, PgStore};
