//! Shared fixture: two halls, three teams, four players, two arbiters.
#![allow(dead_code)]

use async_trait::async_trait;
use chess_tournament_web::models::{Arbiter, Hall, HallId, Player, Table, Team, TeamId, Title, User};
use chess_tournament_web::store::StoreResult;
use chess_tournament_web::{
    Clock, Identity, Match, MatchFilter, MatchId, MatchRequest, MatchResult, MatchStore, MemoryStore, NewMatch,
    Role, Scheduler, SlotSpan,
};
use chrono::NaiveDate;
use std::sync::Arc;
use std::time::Duration;

pub fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 5, 20).unwrap()
}

pub fn match_day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()
}

pub fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn user(username: &str, role: Role) -> User {
    User {
        username: username.to_string(),
        password: format!("{username}-pw"),
        name: username.to_uppercase(),
        surname: "Test".to_string(),
        nationality: "TR".to_string(),
        role,
    }
}

fn player(store: &MemoryStore, username: &str, elo: i32) {
    store.add_user(user(username, Role::Player));
    store.add_player(Player {
        username: username.to_string(),
        name: username.to_uppercase(),
        surname: "Test".to_string(),
        elo_rating: elo,
        fide_id: format!("FIDE-{username}"),
        title: None,
    });
}

fn arbiter(store: &MemoryStore, username: &str) {
    store.add_user(user(username, Role::Arbiter));
    store.add_arbiter(Arbiter {
        username: username.to_string(),
        name: username.to_uppercase(),
        surname: "Test".to_string(),
        experience_level: "advanced".to_string(),
    });
}

fn team(store: &MemoryStore, team_id: i32, name: &str, coach: &str) {
    store.add_user(user(coach, Role::Coach));
    store.add_team(Team {
        team_id,
        team_name: name.to_string(),
        coach_username: coach.to_string(),
        sponsor_name: "Acme".to_string(),
    });
}

/// Hall 1 has tables 1 and 2, hall 2 has table 5.
/// Team 1 (coach_anna): alice, carla. Team 2 (coach_omar): bob, deniz.
/// Team 3 (coach_zoe): erin, and alice also plays for it.
pub fn store() -> Arc<MemoryStore> {
    let store = MemoryStore::new();
    store.add_hall(Hall {
        hall_id: 1,
        hall_name: "Grand Hall".to_string(),
        hall_country: "Turkey".to_string(),
        hall_capacity: 200,
    });
    store.add_hall(Hall {
        hall_id: 2,
        hall_name: "Corner Room".to_string(),
        hall_country: "Turkey".to_string(),
        hall_capacity: 40,
    });
    for (title_id, title_name) in [(1, "GM"), (2, "IM")] {
        store.add_title(Title {
            title_id,
            title_name: title_name.to_string(),
        });
    }
    for (hall_id, table_id) in [(1, 1), (1, 2), (2, 5)] {
        store.add_table(Table { hall_id, table_id });
    }

    team(&store, 1, "Knights", "coach_anna");
    team(&store, 2, "Rooks", "coach_omar");
    team(&store, 3, "Bishops", "coach_zoe");
    for (username, elo) in [("alice", 2200), ("bob", 2100), ("carla", 2400), ("deniz", 1900), ("erin", 2000)] {
        player(&store, username, elo);
    }
    store.add_member(1, "alice");
    store.add_member(1, "carla");
    store.add_member(2, "bob");
    store.add_member(2, "deniz");
    store.add_member(3, "erin");
    store.add_member(3, "alice");

    arbiter(&store, "arb_lee");
    arbiter(&store, "arb_mia");
    store.add_user(user("manager", Role::Manager));
    Arc::new(store)
}

pub fn scheduler(store: &Arc<MemoryStore>) -> Scheduler {
    Scheduler::new(store.clone(), Clock::Fixed(today()), Duration::from_secs(5))
}

/// How long [`SlowStore`] holds every insert before handing it on.
pub const SLOW_INSERT: Duration = Duration::from_millis(300);

/// Delegates to a [`MemoryStore`], but sleeps before each insert.
pub struct SlowStore(pub Arc<MemoryStore>);

#[async_trait]
impl MatchStore for SlowStore {
    async fn find_user(&self, username: &str) -> StoreResult<Option<User>> {
        self.0.find_user(username).await
    }

    async fn halls(&self) -> StoreResult<Vec<Hall>> {
        self.0.halls().await
    }

    async fn hall_tables(&self, hall_id: HallId) -> StoreResult<Option<Vec<Table>>> {
        self.0.hall_tables(hall_id).await
    }

    async fn rename_hall(&self, hall_id: HallId, name: &str) -> StoreResult<Option<Hall>> {
        self.0.rename_hall(hall_id, name).await
    }

    async fn teams(&self) -> StoreResult<Vec<Team>> {
        self.0.teams().await
    }

    async fn team_players(&self, team_id: TeamId) -> StoreResult<Option<Vec<Player>>> {
        self.0.team_players(team_id).await
    }

    async fn coached_team(&self, coach: &str) -> StoreResult<Option<Team>> {
        self.0.coached_team(coach).await
    }

    async fn arbiters(&self) -> StoreResult<Vec<Arbiter>> {
        self.0.arbiters().await
    }

    async fn titles(&self) -> StoreResult<Vec<Title>> {
        self.0.titles().await
    }

    async fn matches(&self, filter: &MatchFilter) -> StoreResult<Vec<Match>> {
        self.0.matches(filter).await
    }

    async fn find_match(&self, id: MatchId) -> StoreResult<Option<Match>> {
        self.0.find_match(id).await
    }

    async fn create_match(&self, request: &NewMatch) -> StoreResult<Match> {
        tokio::time::sleep(SLOW_INSERT).await;
        self.0.create_match(request).await
    }

    async fn rate_match(&self, id: MatchId, arbiter: &str, rating: u8, today: NaiveDate) -> StoreResult<Match> {
        self.0.rate_match(id, arbiter, rating, today).await
    }

    async fn record_result(
        &self,
        id: MatchId,
        arbiter: &str,
        result: MatchResult,
        today: NaiveDate,
    ) -> StoreResult<Match> {
        self.0.record_result(id, arbiter, result, today).await
    }

    async fn delete_match(&self, id: MatchId, coach: &str, today: NaiveDate) -> StoreResult<Match> {
        self.0.delete_match(id, coach, today).await
    }
}

/// A scheduler whose store timeout is far shorter than [`SLOW_INSERT`].
pub fn slow_scheduler(store: &Arc<MemoryStore>) -> Scheduler {
    Scheduler::new(
        Arc::new(SlowStore(store.clone())),
        Clock::Fixed(today()),
        Duration::from_millis(20),
    )
}

pub fn identity(username: &str, role: Role) -> Identity {
    Identity {
        username: username.to_string(),
        role,
    }
}

pub fn coach(username: &str) -> Identity {
    identity(username, Role::Coach)
}

pub fn arbiter_id(username: &str) -> Identity {
    identity(username, Role::Arbiter)
}

/// Team 1 vs team 2 on the match day.
pub fn request(slot: i64, hall_id: i32, table_id: i32, white: &str, black: &str, arbiter: &str) -> MatchRequest {
    MatchRequest {
        date: "2025-06-01".to_string(),
        time_slot: slot,
        hall_id,
        table_id,
        team1_id: 1,
        team2_id: 2,
        white_player_username: white.to_string(),
        black_player_username: black.to_string(),
        arbiter_username: arbiter.to_string(),
    }
}

/// A typed request, for exercising the pure rules directly.
pub fn new_match(date: NaiveDate, slot: i64, table: (i32, i32), players: (&str, &str), arbiter: &str) -> NewMatch {
    NewMatch {
        date,
        time_slot: SlotSpan::starting_at(slot).unwrap(),
        hall_id: table.0,
        table_id: table.1,
        team1_id: 1,
        team2_id: 2,
        white_player_username: players.0.to_string(),
        black_player_username: players.1.to_string(),
        arbiter_username: arbiter.to_string(),
    }
}

/// An already-booked match row (any date, bypassing validation).
pub fn booked(date: NaiveDate, slot: i64, table: (i32, i32), players: (&str, &str), arbiter: &str) -> Match {
    Match::from_request(&new_match(date, slot, table, players, arbiter))
}
