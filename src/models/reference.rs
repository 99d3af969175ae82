//! Read-mostly reference entities: halls, tables, teams, titles, players, arbiters.

use serde::{Deserialize, Serialize};

pub type HallId = i32;
pub type TableId = i32;
pub type TeamId = i32;
pub type TitleId = i32;

/// A physical venue.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Hall {
    pub hall_id: HallId,
    pub hall_name: String,
    pub hall_country: String,
    pub hall_capacity: i32,
}

/// A bookable board, scoped to its hall.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Table {
    pub hall_id: HallId,
    pub table_id: TableId,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Team {
    pub team_id: TeamId,
    pub team_name: String,
    /// Each coach owns exactly one team.
    pub coach_username: String,
    pub sponsor_name: String,
}

/// A chess title players may hold (GM, IM, FM...).
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Title {
    pub title_id: TitleId,
    pub title_name: String,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub username: String,
    pub name: String,
    pub surname: String,
    pub elo_rating: i32,
    pub fide_id: String,
    /// GM, IM, FM... if any.
    pub title: Option<String>,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Arbiter {
    pub username: String,
    pub name: String,
    pub surname: String,
    pub experience_level: String,
}
