//! In-memory store: every table behind a single RwLock.
//!
//! Writes hold the write lock for their whole check-then-write sequence, which
//! makes them trivially serializable. Used for development (seeded from CSV)
//! and in tests.

use crate::logic::{self, References};
use crate::models::{
    Arbiter, Hall, HallId, Match, MatchFilter, MatchId, MatchResult, NewMatch, Player,
    ScheduleError, Table, Team, TeamId, Title, TitleId, User,
};
use crate::store::{MatchStore, StoreResult};
use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Debug, Default)]
struct Tables {
    users: HashMap<String, User>,
    players: BTreeMap<String, Player>,
    arbiters: BTreeMap<String, Arbiter>,
    halls: BTreeMap<HallId, Hall>,
    tables: BTreeSet<Table>,
    teams: BTreeMap<TeamId, Team>,
    titles: BTreeMap<TitleId, Title>,
    /// (team, player username) membership pairs.
    memberships: BTreeSet<(TeamId, String)>,
    matches: HashMap<MatchId, Match>,
}

impl Tables {
    fn references(&self, request: &NewMatch) -> References {
        References {
            hall: self.halls.contains_key(&request.hall_id),
            table: self.tables.contains(&Table {
                hall_id: request.hall_id,
                table_id: request.table_id,
            }),
            team1: self.teams.contains_key(&request.team1_id),
            team2: self.teams.contains_key(&request.team2_id),
            arbiter: self.arbiters.contains_key(&request.arbiter_username),
            white_teams: self.teams_of(&request.white_player_username),
            black_teams: self.teams_of(&request.black_player_username),
        }
    }

    fn teams_of(&self, username: &str) -> Option<Vec<TeamId>> {
        if !self.players.contains_key(username) {
            return None;
        }
        Some(
            self.memberships
                .iter()
                .filter(|(_, member)| member == username)
                .map(|(team_id, _)| *team_id)
                .collect(),
        )
    }

    fn match_mut(&mut self, id: MatchId) -> Result<&mut Match, ScheduleError> {
        self.matches.get_mut(&id).ok_or(ScheduleError::MatchNotFound(id))
    }

    fn coach_of(&self, team_id: TeamId) -> Option<&str> {
        self.teams.get(&team_id).map(|t| t.coach_username.as_str())
    }
}

/// Lock-serialized store held entirely in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    // Every write validates before mutating, so a poisoned lock never guards half-applied state.
    fn read(&self) -> RwLockReadGuard<'_, Tables> {
        self.tables.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Tables> {
        self.tables.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn add_user(&self, user: User) {
        self.write().users.insert(user.username.clone(), user);
    }

    pub fn add_player(&self, player: Player) {
        self.write().players.insert(player.username.clone(), player);
    }

    pub fn add_arbiter(&self, arbiter: Arbiter) {
        self.write().arbiters.insert(arbiter.username.clone(), arbiter);
    }

    pub fn add_hall(&self, hall: Hall) {
        self.write().halls.insert(hall.hall_id, hall);
    }

    pub fn add_table(&self, table: Table) {
        self.write().tables.insert(table);
    }

    pub fn add_team(&self, team: Team) {
        self.write().teams.insert(team.team_id, team);
    }

    pub fn add_title(&self, title: Title) {
        self.write().titles.insert(title.title_id, title);
    }

    pub fn add_member(&self, team_id: TeamId, username: impl Into<String>) {
        self.write().memberships.insert((team_id, username.into()));
    }

    /// Insert a match row as-is, without any scheduling checks (imports and fixtures).
    pub fn import_match(&self, m: Match) {
        self.write().matches.insert(m.id, m);
    }

    pub fn match_count(&self) -> usize {
        self.read().matches.len()
    }
}

#[async_trait]
impl MatchStore for MemoryStore {
    async fn find_user(&self, username: &str) -> StoreResult<Option<User>> {
        Ok(self.read().users.get(username).cloned())
    }

    async fn halls(&self) -> StoreResult<Vec<Hall>> {
        Ok(self.read().halls.values().cloned().collect())
    }

    async fn hall_tables(&self, hall_id: HallId) -> StoreResult<Option<Vec<Table>>> {
        let t = self.read();
        if !t.halls.contains_key(&hall_id) {
            return Ok(None);
        }
        Ok(Some(
            t.tables.iter().filter(|table| table.hall_id == hall_id).copied().collect(),
        ))
    }

    async fn rename_hall(&self, hall_id: HallId, name: &str) -> StoreResult<Option<Hall>> {
        let mut t = self.write();
        Ok(t.halls.get_mut(&hall_id).map(|hall| {
            hall.hall_name = name.to_string();
            hall.clone()
        }))
    }

    async fn teams(&self) -> StoreResult<Vec<Team>> {
        Ok(self.read().teams.values().cloned().collect())
    }

    async fn team_players(&self, team_id: TeamId) -> StoreResult<Option<Vec<Player>>> {
        let t = self.read();
        if !t.teams.contains_key(&team_id) {
            return Ok(None);
        }
        Ok(Some(
            t.memberships
                .iter()
                .filter(|(team, _)| *team == team_id)
                .filter_map(|(_, username)| t.players.get(username).cloned())
                .collect(),
        ))
    }

    async fn coached_team(&self, coach: &str) -> StoreResult<Option<Team>> {
        Ok(self.read().teams.values().find(|team| team.coach_username == coach).cloned())
    }

    async fn arbiters(&self) -> StoreResult<Vec<Arbiter>> {
        Ok(self.read().arbiters.values().cloned().collect())
    }

    async fn titles(&self) -> StoreResult<Vec<Title>> {
        Ok(self.read().titles.values().cloned().collect())
    }

    async fn matches(&self, filter: &MatchFilter) -> StoreResult<Vec<Match>> {
        let mut matches: Vec<Match> = self
            .read()
            .matches
            .values()
            .filter(|m| filter.accepts(m))
            .cloned()
            .collect();
        matches.sort_by(Match::listing_order);
        Ok(matches)
    }

    async fn find_match(&self, id: MatchId) -> StoreResult<Option<Match>> {
        Ok(self.read().matches.get(&id).cloned())
    }

    async fn create_match(&self, request: &NewMatch) -> StoreResult<Match> {
        let mut t = self.write();
        let refs = t.references(request);
        logic::check_references(request, &refs)?;
        if let Some(conflict) = logic::find_conflict(request, t.matches.values()) {
            return Err(conflict);
        }
        logic::check_membership(request, &refs)?;

        let created = Match::from_request(request);
        t.matches.insert(created.id, created.clone());
        Ok(created)
    }

    async fn rate_match(
        &self,
        id: MatchId,
        arbiter: &str,
        rating: u8,
        today: NaiveDate,
    ) -> StoreResult<Match> {
        let mut t = self.write();
        let m = t.match_mut(id)?;
        logic::check_rating(m, arbiter, today)?;
        m.rating = Some(rating);
        Ok(m.clone())
    }

    async fn record_result(
        &self,
        id: MatchId,
        arbiter: &str,
        result: MatchResult,
        today: NaiveDate,
    ) -> StoreResult<Match> {
        let mut t = self.write();
        let m = t.match_mut(id)?;
        logic::check_result(m, arbiter, today)?;
        m.result = Some(result);
        Ok(m.clone())
    }

    async fn delete_match(&self, id: MatchId, coach: &str, today: NaiveDate) -> StoreResult<Match> {
        let mut t = self.write();
        let m = t.matches.get(&id).ok_or(ScheduleError::MatchNotFound(id))?;
        let coaches: Vec<&str> = [m.team1_id, m.team2_id]
            .iter()
            .filter_map(|team_id| t.coach_of(*team_id))
            .collect();
        logic::check_deletion(m, coach, &coaches, today)?;
        t.matches.remove(&id).ok_or(ScheduleError::MatchNotFound(id))
    }
}
