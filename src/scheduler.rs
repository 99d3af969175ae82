//! The scheduling service: input validation, authorization, then one atomic store call.

use crate::logic::{self, MatchRequest};
use crate::models::{
    Arbiter, Hall, HallId, Identity, Match, MatchFilter, MatchId, MatchResult, MatchSummary, Player,
    Reference, ScheduleError, Table, Team, TeamId, Title,
};
use crate::store::MatchStore;
use chrono::{Local, NaiveDate};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Where "today" comes from.
#[derive(Clone, Copy, Debug)]
pub enum Clock {
    /// The server's local date.
    System,
    Fixed(NaiveDate),
}

impl Clock {
    pub fn today(&self) -> NaiveDate {
        match self {
            Clock::System => Local::now().date_naive(),
            Clock::Fixed(date) => *date,
        }
    }
}

/// Shared by all request handlers; cheap to clone.
#[derive(Clone)]
pub struct Scheduler {
    store: Arc<dyn MatchStore>,
    clock: Clock,
    store_timeout: Duration,
}

impl Scheduler {
    pub fn new(store: Arc<dyn MatchStore>, clock: Clock, store_timeout: Duration) -> Self {
        Self {
            store,
            clock,
            store_timeout,
        }
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    /// Run a store call under the timeout. Dropping the future on timeout drops any open
    /// transaction with it, so a timed-out write never commits.
    async fn with_timeout<T, F>(&self, call: F) -> Result<T, ScheduleError>
    where
        F: Future<Output = Result<T, ScheduleError>>,
    {
        match tokio::time::timeout(self.store_timeout, call).await {
            Ok(result) => result,
            Err(_) => {
                log::warn!("Store call timed out after {:?}", self.store_timeout);
                Err(ScheduleError::Timeout)
            }
        }
    }

    /// Match identity against stored credentials. Returns `None` on any mismatch.
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<Option<Identity>, ScheduleError> {
        let user = self.with_timeout(self.store.find_user(username.trim())).await?;
        Ok(user.filter(|u| u.password == password).map(|u| u.identity()))
    }

    /// Validate and book a new match for the requesting coach's team.
    ///
    /// Date and slot are checked before any store access. The coach must coach
    /// team 1 (the side that plays white). References, overlaps, and membership
    /// are then checked and the row inserted in one atomic store call.
    pub async fn create_match(&self, coach: &Identity, request: &MatchRequest) -> Result<Match, ScheduleError> {
        let new_match = logic::validate_request(request, self.today())?;

        let own_team = self.with_timeout(self.store.coached_team(&coach.username)).await?;
        if own_team.map(|t| t.team_id) != Some(new_match.team1_id) {
            return Err(ScheduleError::Forbidden(
                "You can only schedule matches for the team you coach".to_string(),
            ));
        }

        match self.with_timeout(self.store.create_match(&new_match)).await {
            Ok(created) => {
                log::info!(
                    "Match {} scheduled on {} ({}) at hall {} table {} by {}",
                    created.id,
                    created.date,
                    created.time_slot,
                    created.hall_id,
                    created.table_id,
                    coach.username
                );
                Ok(created)
            }
            Err(e) => {
                log::debug!("Match request from {} rejected: {}", coach.username, e);
                Err(e)
            }
        }
    }

    pub async fn rate_match(&self, arbiter: &Identity, id: MatchId, rating: i64) -> Result<Match, ScheduleError> {
        let rating = logic::validate_rating(rating)?;
        let rated = self
            .with_timeout(self.store.rate_match(id, &arbiter.username, rating, self.today()))
            .await?;
        log::info!("Match {} rated {} by {}", id, rating, arbiter.username);
        Ok(rated)
    }

    pub async fn record_result(
        &self,
        arbiter: &Identity,
        id: MatchId,
        result: MatchResult,
    ) -> Result<Match, ScheduleError> {
        let updated = self
            .with_timeout(self.store.record_result(id, &arbiter.username, result, self.today()))
            .await?;
        log::info!("Match {} result {} recorded by {}", id, result.as_str(), arbiter.username);
        Ok(updated)
    }

    pub async fn delete_match(&self, coach: &Identity, id: MatchId) -> Result<Match, ScheduleError> {
        let deleted = self
            .with_timeout(self.store.delete_match(id, &coach.username, self.today()))
            .await?;
        log::info!("Match {} deleted by {}", id, coach.username);
        Ok(deleted)
    }

    pub async fn matches(&self, filter: MatchFilter) -> Result<Vec<MatchSummary>, ScheduleError> {
        let today = self.today();
        let matches = self.with_timeout(self.store.matches(&filter)).await?;
        Ok(matches.into_iter().map(|m| MatchSummary::new(m, today)).collect())
    }

    pub async fn find_match(&self, id: MatchId) -> Result<MatchSummary, ScheduleError> {
        self.with_timeout(self.store.find_match(id))
            .await?
            .map(|m| MatchSummary::new(m, self.today()))
            .ok_or(ScheduleError::MatchNotFound(id))
    }

    pub async fn halls(&self) -> Result<Vec<Hall>, ScheduleError> {
        self.with_timeout(self.store.halls()).await
    }

    pub async fn hall_tables(&self, hall_id: HallId) -> Result<Vec<Table>, ScheduleError> {
        self.with_timeout(self.store.hall_tables(hall_id))
            .await?
            .ok_or(ScheduleError::HallNotFound(hall_id))
    }

    pub async fn rename_hall(&self, manager: &Identity, hall_id: HallId, name: &str) -> Result<Hall, ScheduleError> {
        let name = logic::validate_hall_name(name)?;
        let hall = self
            .with_timeout(self.store.rename_hall(hall_id, &name))
            .await?
            .ok_or(ScheduleError::HallNotFound(hall_id))?;
        log::info!("Hall {} renamed to '{}' by {}", hall_id, hall.hall_name, manager.username);
        Ok(hall)
    }

    pub async fn teams(&self) -> Result<Vec<Team>, ScheduleError> {
        self.with_timeout(self.store.teams()).await
    }

    /// Members of a team; an unknown team is a reference error.
    pub async fn team_players(&self, team_id: TeamId) -> Result<Vec<Player>, ScheduleError> {
        self.with_timeout(self.store.team_players(team_id))
            .await?
            .ok_or(ScheduleError::UnknownReference(Reference::Team(team_id)))
    }

    pub async fn coached_team(&self, coach: &Identity) -> Result<Option<Team>, ScheduleError> {
        self.with_timeout(self.store.coached_team(&coach.username)).await
    }

    pub async fn arbiters(&self) -> Result<Vec<Arbiter>, ScheduleError> {
        self.with_timeout(self.store.arbiters()).await
    }

    pub async fn titles(&self) -> Result<Vec<Title>, ScheduleError> {
        self.with_timeout(self.store.titles()).await
    }
}
