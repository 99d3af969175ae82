//! Match, MatchResult, and the read-time MatchState.

use crate::models::reference::{HallId, TableId, TeamId};
use crate::models::schedule::SlotSpan;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

/// Unique identifier for a match.
pub type MatchId = Uuid;

/// Outcome of a played match.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchResult {
    WhiteWins,
    BlackWins,
    Draw,
}

impl MatchResult {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchResult::WhiteWins => "white_wins",
            MatchResult::BlackWins => "black_wins",
            MatchResult::Draw => "draw",
        }
    }
}

impl FromStr for MatchResult {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "white_wins" => Ok(MatchResult::WhiteWins),
            "black_wins" => Ok(MatchResult::BlackWins),
            "draw" => Ok(MatchResult::Draw),
            other => Err(format!("unknown match result '{}'", other)),
        }
    }
}

/// Derived lifecycle phase. Never stored; computed from the date and rating.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchState {
    /// Date is today or later.
    Scheduled,
    /// Date has passed, no rating yet.
    Played,
    /// Arbiter submitted a rating. Terminal.
    Rated,
}

/// One scheduled chess game.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Match {
    pub id: MatchId,
    pub date: NaiveDate,
    pub time_slot: SlotSpan,
    pub hall_id: HallId,
    pub table_id: TableId,
    pub team1_id: TeamId,
    pub team2_id: TeamId,
    pub white_player_username: String,
    pub black_player_username: String,
    pub arbiter_username: String,
    pub result: Option<MatchResult>,
    pub rating: Option<u8>,
}

impl Match {
    /// A freshly created match: new id, no result, no rating.
    pub fn from_request(request: &NewMatch) -> Self {
        Self {
            id: Uuid::new_v4(),
            date: request.date,
            time_slot: request.time_slot,
            hall_id: request.hall_id,
            table_id: request.table_id,
            team1_id: request.team1_id,
            team2_id: request.team2_id,
            white_player_username: request.white_player_username.clone(),
            black_player_username: request.black_player_username.clone(),
            arbiter_username: request.arbiter_username.clone(),
            result: None,
            rating: None,
        }
    }

    /// White then black username.
    pub fn players(&self) -> [&str; 2] {
        [&self.white_player_username, &self.black_player_username]
    }

    /// True if the user plays in this match with either color.
    pub fn involves_player(&self, username: &str) -> bool {
        self.players().contains(&username)
    }

    pub fn state(&self, today: NaiveDate) -> MatchState {
        if self.rating.is_some() {
            MatchState::Rated
        } else if self.date < today {
            MatchState::Played
        } else {
            MatchState::Scheduled
        }
    }

    /// Ordering used by every listing: newest date first, then by slot.
    pub fn listing_order(a: &Match, b: &Match) -> std::cmp::Ordering {
        b.date
            .cmp(&a.date)
            .then(a.time_slot.cmp(&b.time_slot))
            .then(a.id.cmp(&b.id))
    }
}

/// A match with its derived state, as returned by listings.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct MatchSummary {
    #[serde(flatten)]
    pub details: Match,
    pub state: MatchState,
}

impl MatchSummary {
    pub fn new(details: Match, today: NaiveDate) -> Self {
        let state = details.state(today);
        Self { details, state }
    }
}

/// A creation request that passed input validation (typed date and slot span).
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct NewMatch {
    pub date: NaiveDate,
    pub time_slot: SlotSpan,
    pub hall_id: HallId,
    pub table_id: TableId,
    pub team1_id: TeamId,
    pub team2_id: TeamId,
    pub white_player_username: String,
    pub black_player_username: String,
    pub arbiter_username: String,
}

impl NewMatch {
    pub fn players(&self) -> [&str; 2] {
        [&self.white_player_username, &self.black_player_username]
    }
}

/// Which matches a listing returns.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum MatchFilter {
    All,
    /// Matches where the user plays either color.
    Player(String),
    /// Matches the user officiates.
    Arbiter(String),
    /// Matches where the team is team 1 or team 2.
    Team(TeamId),
}

impl MatchFilter {
    pub fn accepts(&self, m: &Match) -> bool {
        match self {
            MatchFilter::All => true,
            MatchFilter::Player(username) => m.involves_player(username),
            MatchFilter::Arbiter(username) => &m.arbiter_username == username,
            MatchFilter::Team(team_id) => m.team1_id == *team_id || m.team2_id == *team_id,
        }
    }
}
