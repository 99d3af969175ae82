//! Persistent store behind the scheduler.
//!
//! The scheduler receives an explicit [`MatchStore`] handle at construction.
//! Every write method is one atomic unit: its lookups, policy checks, and the
//! final write are serialized against all other writes, so two overlapping
//! requests can never both commit.

mod memory;
mod postgres;
mod seed;

pub use memory::MemoryStore;
pub use postgres::PgStore;
pub use seed::SeedError;

use crate::models::{
    Arbiter, Hall, HallId, Match, MatchFilter, MatchId, MatchResult, NewMatch, Player,
    ScheduleError, Table, Team, TeamId, Title, User,
};
use async_trait::async_trait;
use chrono::NaiveDate;

pub type StoreResult<T> = Result<T, ScheduleError>;

#[async_trait]
pub trait MatchStore: Send + Sync {
    async fn find_user(&self, username: &str) -> StoreResult<Option<User>>;

    async fn halls(&self) -> StoreResult<Vec<Hall>>;

    /// Tables of a hall, or `None` if the hall does not exist.
    async fn hall_tables(&self, hall_id: HallId) -> StoreResult<Option<Vec<Table>>>;

    /// Rename a hall; `None` if it does not exist.
    async fn rename_hall(&self, hall_id: HallId, name: &str) -> StoreResult<Option<Hall>>;

    async fn teams(&self) -> StoreResult<Vec<Team>>;

    /// Current members of a team, or `None` if the team does not exist.
    async fn team_players(&self, team_id: TeamId) -> StoreResult<Option<Vec<Player>>>;

    /// The team coached by `coach`, if any.
    async fn coached_team(&self, coach: &str) -> StoreResult<Option<Team>>;

    async fn arbiters(&self) -> StoreResult<Vec<Arbiter>>;

    async fn titles(&self) -> StoreResult<Vec<Title>>;

    /// Matches accepted by the filter, newest date first, then by slot.
    async fn matches(&self, filter: &MatchFilter) -> StoreResult<Vec<Match>>;

    async fn find_match(&self, id: MatchId) -> StoreResult<Option<Match>>;

    /// Check references, conflicts, and membership, then insert. Atomic.
    async fn create_match(&self, request: &NewMatch) -> StoreResult<Match>;

    /// Attach a rating if the lifecycle rules allow it. Atomic.
    async fn rate_match(
        &self,
        id: MatchId,
        arbiter: &str,
        rating: u8,
        today: NaiveDate,
    ) -> StoreResult<Match>;

    /// Attach a result if the lifecycle rules allow it. Atomic.
    async fn record_result(
        &self,
        id: MatchId,
        arbiter: &str,
        result: MatchResult,
        today: NaiveDate,
    ) -> StoreResult<Match>;

    /// Delete a match if the lifecycle rules allow it, returning the removed row. Atomic.
    async fn delete_match(&self, id: MatchId, coach: &str, today: NaiveDate) -> StoreResult<Match>;
}
