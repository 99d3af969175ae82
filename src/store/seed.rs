//! Load reference data for the in-memory store from a directory of CSV files.
//!
//! Files (all optional, each with a header row):
//! `users.csv`, `titles.csv`, `players.csv`, `arbiters.csv`, `halls.csv`,
//! `tables.csv`, `teams.csv`, `team_players.csv`.
//!
//! Rows that point at a user, title, hall or team the files do not define are rejected.

use crate::models::{Arbiter, Hall, HallId, Player, Role, Table, Team, TeamId, Title, User};
use crate::store::MemoryStore;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::path::Path;

#[derive(Debug)]
pub enum SeedError {
    Csv { file: String, source: csv::Error },
    /// A row refers to something missing, or to a user with the wrong role.
    Invalid { file: String, reason: String },
}

impl std::fmt::Display for SeedError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SeedError::Csv { file, source } => write!(f, "{}: {}", file, source),
            SeedError::Invalid { file, reason } => write!(f, "{}: {}", file, reason),
        }
    }
}

impl std::error::Error for SeedError {}

#[derive(Deserialize)]
struct PlayerRow {
    username: String,
    elo_rating: i32,
    fide_id: String,
    title: Option<String>,
}

#[derive(Deserialize)]
struct ArbiterRow {
    username: String,
    experience_level: String,
}

#[derive(Deserialize)]
struct MembershipRow {
    team_id: TeamId,
    username: String,
}

fn read_rows<T: DeserializeOwned>(dir: &Path, file: &str) -> Result<Vec<T>, SeedError> {
    let path = dir.join(file);
    if !path.exists() {
        log::warn!("Seed file {} not found, skipping", path.display());
        return Ok(Vec::new());
    }
    let csv_err = |source| SeedError::Csv {
        file: file.to_string(),
        source,
    };
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(&path)
        .map_err(csv_err)?;
    reader
        .deserialize()
        .collect::<Result<Vec<T>, _>>()
        .map_err(csv_err)
}

fn user_with_role<'a>(
    users: &'a HashMap<String, User>,
    file: &str,
    username: &str,
    role: Role,
) -> Result<&'a User, SeedError> {
    match users.get(username) {
        Some(user) if user.role == role => Ok(user),
        Some(user) => Err(SeedError::Invalid {
            file: file.to_string(),
            reason: format!("user '{}' is a {}, not a {}", username, user.role, role),
        }),
        None => Err(SeedError::Invalid {
            file: file.to_string(),
            reason: format!("unknown user '{}'", username),
        }),
    }
}

fn invalid(file: &str, reason: String) -> SeedError {
    SeedError::Invalid {
        file: file.to_string(),
        reason,
    }
}

impl MemoryStore {
    /// Build a store from the CSV files in `dir`.
    pub fn from_csv_dir(dir: impl AsRef<Path>) -> Result<Self, SeedError> {
        let dir = dir.as_ref();
        let store = MemoryStore::new();

        let users: HashMap<String, User> = read_rows::<User>(dir, "users.csv")?
            .into_iter()
            .map(|u| (u.username.clone(), u))
            .collect();

        let mut titles = HashSet::new();
        for title in read_rows::<Title>(dir, "titles.csv")? {
            titles.insert(title.title_name.clone());
            store.add_title(title);
        }

        for row in read_rows::<PlayerRow>(dir, "players.csv")? {
            let user = user_with_role(&users, "players.csv", &row.username, Role::Player)?;
            let title = row.title.filter(|t| !t.is_empty());
            if let Some(name) = &title {
                if !titles.contains(name) {
                    return Err(invalid("players.csv", format!("unknown title '{}'", name)));
                }
            }
            store.add_player(Player {
                username: row.username,
                name: user.name.clone(),
                surname: user.surname.clone(),
                elo_rating: row.elo_rating,
                fide_id: row.fide_id,
                title,
            });
        }

        for row in read_rows::<ArbiterRow>(dir, "arbiters.csv")? {
            let user = user_with_role(&users, "arbiters.csv", &row.username, Role::Arbiter)?;
            store.add_arbiter(Arbiter {
                username: row.username,
                name: user.name.clone(),
                surname: user.surname.clone(),
                experience_level: row.experience_level,
            });
        }

        let mut halls: HashSet<HallId> = HashSet::new();
        for hall in read_rows::<Hall>(dir, "halls.csv")? {
            halls.insert(hall.hall_id);
            store.add_hall(hall);
        }
        for table in read_rows::<Table>(dir, "tables.csv")? {
            if !halls.contains(&table.hall_id) {
                return Err(invalid("tables.csv", format!("unknown hall {}", table.hall_id)));
            }
            store.add_table(table);
        }

        let mut teams: HashSet<TeamId> = HashSet::new();
        for team in read_rows::<Team>(dir, "teams.csv")? {
            user_with_role(&users, "teams.csv", &team.coach_username, Role::Coach)?;
            teams.insert(team.team_id);
            store.add_team(team);
        }
        for row in read_rows::<MembershipRow>(dir, "team_players.csv")? {
            if !teams.contains(&row.team_id) {
                return Err(invalid("team_players.csv", format!("unknown team {}", row.team_id)));
            }
            user_with_role(&users, "team_players.csv", &row.username, Role::Player)?;
            store.add_member(row.team_id, row.username);
        }

        let user_count = users.len();
        for user in users.into_values() {
            store.add_user(user);
        }
        log::info!("Seeded {} users from {}", user_count, dir.display());
        Ok(store)
    }
}
