//! PostgreSQL store.
//!
//! Every write runs in its own SERIALIZABLE transaction: the lookups and the
//! conflict query take predicate locks, the insert/update/delete is the last
//! statement, and a concurrent overlapping write makes one of the two commits
//! fail with a serialization error, which surfaces as `ScheduleError::Conflict`.
//! The `unique_match_schedule` constraint stays in the schema as a last-resort net.

use crate::logic::{self, References};
use crate::models::{
    Arbiter, Hall, HallId, Match, MatchFilter, MatchId, MatchResult, NewMatch, Player, Role,
    ScheduleError, SlotSpan, Table, Team, TeamId, Title, User,
};
use crate::store::{MatchStore, StoreResult};
use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::postgres::{PgConnection, PgPool, PgPoolOptions};
use sqlx::{FromRow, Postgres, Transaction};
use uuid::Uuid;

/// SQLSTATEs that mean "another transaction got there first".
const SERIALIZATION_FAILURE: &str = "40001";
const DEADLOCK_DETECTED: &str = "40P01";
const UNIQUE_VIOLATION: &str = "23505";

const MATCH_COLUMNS: &str = "match_id, match_date, time_slot, hall_id, table_id, team1_id, team2_id, \
     white_player_username, black_player_username, arbiter_username, result, rating";

const TEAM_QUERY: &str = "SELECT t.team_id, t.team_name, t.coach_username, s.sponsor_name \
     FROM teams t JOIN sponsors s ON s.sponsor_id = t.sponsor_id";

impl From<sqlx::Error> for ScheduleError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if let Some(code) = db_err.code() {
                if [SERIALIZATION_FAILURE, DEADLOCK_DETECTED, UNIQUE_VIOLATION].contains(&&*code) {
                    log::debug!("Write rejected by the database ({}): {}", code, db_err.message());
                    return ScheduleError::Conflict;
                }
            }
        }
        log::error!("Database error: {}", err);
        ScheduleError::Storage(err.to_string())
    }
}

#[derive(FromRow)]
struct MatchRow {
    match_id: Uuid,
    match_date: NaiveDate,
    time_slot: i16,
    hall_id: i32,
    table_id: i32,
    team1_id: i32,
    team2_id: i32,
    white_player_username: String,
    black_player_username: String,
    arbiter_username: String,
    result: Option<String>,
    rating: Option<i16>,
}

impl TryFrom<MatchRow> for Match {
    type Error = ScheduleError;

    fn try_from(row: MatchRow) -> Result<Self, Self::Error> {
        let result = row
            .result
            .map(|r| r.parse::<MatchResult>())
            .transpose()
            .map_err(ScheduleError::Storage)?;
        Ok(Match {
            id: row.match_id,
            date: row.match_date,
            time_slot: SlotSpan::starting_at(i64::from(row.time_slot))?,
            hall_id: row.hall_id,
            table_id: row.table_id,
            team1_id: row.team1_id,
            team2_id: row.team2_id,
            white_player_username: row.white_player_username,
            black_player_username: row.black_player_username,
            arbiter_username: row.arbiter_username,
            result,
            rating: row.rating.map(|r| r as u8),
        })
    }
}

#[derive(FromRow)]
struct UserRow {
    username: String,
    password: String,
    name: String,
    surname: String,
    nationality: String,
    role: String,
}

#[derive(FromRow)]
struct TeamRow {
    team_id: i32,
    team_name: String,
    coach_username: String,
    sponsor_name: String,
}

impl From<TeamRow> for Team {
    fn from(row: TeamRow) -> Self {
        Team {
            team_id: row.team_id,
            team_name: row.team_name,
            coach_username: row.coach_username,
            sponsor_name: row.sponsor_name,
        }
    }
}

#[derive(FromRow)]
struct HallRow {
    hall_id: i32,
    hall_name: String,
    hall_country: String,
    hall_capacity: i32,
}

impl From<HallRow> for Hall {
    fn from(row: HallRow) -> Self {
        Hall {
            hall_id: row.hall_id,
            hall_name: row.hall_name,
            hall_country: row.hall_country,
            hall_capacity: row.hall_capacity,
        }
    }
}

fn into_matches(rows: Vec<MatchRow>) -> StoreResult<Vec<Match>> {
    rows.into_iter().map(Match::try_from).collect()
}

/// The Postgres-backed store.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        log::info!("Successfully connected to the database.");
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Apply pending schema migrations. Called once at startup, never implicitly.
    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        log::info!("Database migrations are up to date.");
        Ok(())
    }

    async fn begin_serializable(&self) -> StoreResult<Transaction<'static, Postgres>> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL SERIALIZABLE")
            .execute(&mut *tx)
            .await?;
        Ok(tx)
    }

    async fn references(conn: &mut PgConnection, request: &NewMatch) -> StoreResult<References> {
        let hall = sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM halls WHERE hall_id = $1)")
            .bind(request.hall_id)
            .fetch_one(&mut *conn)
            .await?;
        let table = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM hall_tables WHERE hall_id = $1 AND table_id = $2)",
        )
        .bind(request.hall_id)
        .bind(request.table_id)
        .fetch_one(&mut *conn)
        .await?;
        let team1 = Self::team_exists(conn, request.team1_id).await?;
        let team2 = Self::team_exists(conn, request.team2_id).await?;
        let arbiter =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM arbiters WHERE username = $1)")
                .bind(&request.arbiter_username)
                .fetch_one(&mut *conn)
                .await?;
        let white_teams = Self::teams_of(conn, &request.white_player_username).await?;
        let black_teams = Self::teams_of(conn, &request.black_player_username).await?;
        Ok(References {
            hall,
            table,
            team1,
            team2,
            arbiter,
            white_teams,
            black_teams,
        })
    }

    async fn team_exists(conn: &mut PgConnection, team_id: TeamId) -> StoreResult<bool> {
        Ok(
            sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM teams WHERE team_id = $1)")
                .bind(team_id)
                .fetch_one(&mut *conn)
                .await?,
        )
    }

    async fn teams_of(conn: &mut PgConnection, username: &str) -> StoreResult<Option<Vec<TeamId>>> {
        let is_player =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM players WHERE username = $1)")
                .bind(username)
                .fetch_one(&mut *conn)
                .await?;
        if !is_player {
            return Ok(None);
        }
        let teams = sqlx::query_scalar::<_, i32>("SELECT team_id FROM player_teams WHERE username = $1")
            .bind(username)
            .fetch_all(&mut *conn)
            .await?;
        Ok(Some(teams))
    }

    async fn lock_match(conn: &mut PgConnection, id: MatchId) -> StoreResult<Match> {
        let row = sqlx::query_as::<_, MatchRow>(&format!(
            "SELECT {} FROM matches WHERE match_id = $1 FOR UPDATE",
            MATCH_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
        row.ok_or(ScheduleError::MatchNotFound(id))?.try_into()
    }
}

#[async_trait]
impl MatchStore for PgStore {
    async fn find_user(&self, username: &str) -> StoreResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT username, password, name, surname, nationality, role FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        row.map(|r| {
            let role = r.role.parse::<Role>().map_err(ScheduleError::Storage)?;
            Ok(User {
                username: r.username,
                password: r.password,
                name: r.name,
                surname: r.surname,
                nationality: r.nationality,
                role,
            })
        })
        .transpose()
    }

    async fn halls(&self) -> StoreResult<Vec<Hall>> {
        let rows = sqlx::query_as::<_, HallRow>(
            "SELECT hall_id, hall_name, hall_country, hall_capacity FROM halls ORDER BY hall_id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Hall::from).collect())
    }

    async fn hall_tables(&self, hall_id: HallId) -> StoreResult<Option<Vec<Table>>> {
        let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM halls WHERE hall_id = $1)")
            .bind(hall_id)
            .fetch_one(&self.pool)
            .await?;
        if !exists {
            return Ok(None);
        }
        let rows = sqlx::query_as::<_, (i32, i32)>(
            "SELECT hall_id, table_id FROM hall_tables WHERE hall_id = $1 ORDER BY table_id",
        )
        .bind(hall_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(Some(
            rows.into_iter()
                .map(|(hall_id, table_id)| Table { hall_id, table_id })
                .collect(),
        ))
    }

    async fn rename_hall(&self, hall_id: HallId, name: &str) -> StoreResult<Option<Hall>> {
        let row = sqlx::query_as::<_, HallRow>(
            "UPDATE halls SET hall_name = $2 WHERE hall_id = $1 \
             RETURNING hall_id, hall_name, hall_country, hall_capacity",
        )
        .bind(hall_id)
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Hall::from))
    }

    async fn teams(&self) -> StoreResult<Vec<Team>> {
        let rows = sqlx::query_as::<_, TeamRow>(&format!("{} ORDER BY t.team_id", TEAM_QUERY))
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Team::from).collect())
    }

    async fn team_players(&self, team_id: TeamId) -> StoreResult<Option<Vec<Player>>> {
        let mut conn = self.pool.acquire().await?;
        if !Self::team_exists(&mut conn, team_id).await? {
            return Ok(None);
        }
        let rows = sqlx::query_as::<_, (String, String, String, i32, String, Option<String>)>(
            "SELECT p.username, u.name, u.surname, p.elo_rating, p.fide_id, ti.title_name \
             FROM player_teams pt \
             JOIN players p ON p.username = pt.username \
             JOIN users u ON u.username = p.username \
             LEFT JOIN titles ti ON ti.title_id = p.title_id \
             WHERE pt.team_id = $1 ORDER BY p.username",
        )
        .bind(team_id)
        .fetch_all(&mut *conn)
        .await?;
        Ok(Some(
            rows.into_iter()
                .map(|(username, name, surname, elo_rating, fide_id, title)| Player {
                    username,
                    name,
                    surname,
                    elo_rating,
                    fide_id,
                    title,
                })
                .collect(),
        ))
    }

    async fn coached_team(&self, coach: &str) -> StoreResult<Option<Team>> {
        let row = sqlx::query_as::<_, TeamRow>(&format!("{} WHERE t.coach_username = $1", TEAM_QUERY))
            .bind(coach)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Team::from))
    }

    async fn arbiters(&self) -> StoreResult<Vec<Arbiter>> {
        let rows = sqlx::query_as::<_, (String, String, String, String)>(
            "SELECT a.username, u.name, u.surname, a.experience_level \
             FROM arbiters a JOIN users u ON u.username = a.username ORDER BY a.username",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows
            .into_iter()
            .map(|(username, name, surname, experience_level)| Arbiter {
                username,
                name,
                surname,
                experience_level,
            })
            .collect())
    }

    async fn titles(&self) -> StoreResult<Vec<Title>> {
        let rows = sqlx::query_as::<_, (i32, String)>("SELECT title_id, title_name FROM titles ORDER BY title_id")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows
            .into_iter()
            .map(|(title_id, title_name)| Title { title_id, title_name })
            .collect())
    }

    async fn matches(&self, filter: &MatchFilter) -> StoreResult<Vec<Match>> {
        let order = "ORDER BY match_date DESC, time_slot, match_id";
        let rows = match filter {
            MatchFilter::All => {
                sqlx::query_as::<_, MatchRow>(&format!("SELECT {} FROM matches {}", MATCH_COLUMNS, order))
                    .fetch_all(&self.pool)
                    .await?
            }
            MatchFilter::Player(username) => {
                sqlx::query_as::<_, MatchRow>(&format!(
                    "SELECT {} FROM matches WHERE white_player_username = $1 OR black_player_username = $1 {}",
                    MATCH_COLUMNS, order
                ))
                .bind(username)
                .fetch_all(&self.pool)
                .await?
            }
            MatchFilter::Arbiter(username) => {
                sqlx::query_as::<_, MatchRow>(&format!(
                    "SELECT {} FROM matches WHERE arbiter_username = $1 {}",
                    MATCH_COLUMNS, order
                ))
                .bind(username)
                .fetch_all(&self.pool)
                .await?
            }
            MatchFilter::Team(team_id) => {
                sqlx::query_as::<_, MatchRow>(&format!(
                    "SELECT {} FROM matches WHERE team1_id = $1 OR team2_id = $1 {}",
                    MATCH_COLUMNS, order
                ))
                .bind(team_id)
                .fetch_all(&self.pool)
                .await?
            }
        };
        into_matches(rows)
    }

    async fn find_match(&self, id: MatchId) -> StoreResult<Option<Match>> {
        let row = sqlx::query_as::<_, MatchRow>(&format!(
            "SELECT {} FROM matches WHERE match_id = $1",
            MATCH_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Match::try_from).transpose()
    }

    async fn create_match(&self, request: &NewMatch) -> StoreResult<Match> {
        let mut tx = self.begin_serializable().await?;

        let refs = Self::references(&mut tx, request).await?;
        logic::check_references(request, &refs)?;

        let same_day = sqlx::query_as::<_, MatchRow>(&format!(
            "SELECT {} FROM matches WHERE match_date = $1",
            MATCH_COLUMNS
        ))
        .bind(request.date)
        .fetch_all(&mut *tx)
        .await?;
        let same_day = into_matches(same_day)?;
        if let Some(conflict) = logic::find_conflict(request, &same_day) {
            return Err(conflict);
        }
        logic::check_membership(request, &refs)?;

        let created = Match::from_request(request);
        sqlx::query(
            "INSERT INTO matches (match_id, match_date, time_slot, hall_id, table_id, team1_id, team2_id, \
             white_player_username, black_player_username, arbiter_username) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
        )
        .bind(created.id)
        .bind(created.date)
        .bind(i16::from(created.time_slot.start()))
        .bind(created.hall_id)
        .bind(created.table_id)
        .bind(created.team1_id)
        .bind(created.team2_id)
        .bind(&created.white_player_username)
        .bind(&created.black_player_username)
        .bind(&created.arbiter_username)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(created)
    }

    async fn rate_match(
        &self,
        id: MatchId,
        arbiter: &str,
        rating: u8,
        today: NaiveDate,
    ) -> StoreResult<Match> {
        let mut tx = self.begin_serializable().await?;
        let mut m = Self::lock_match(&mut tx, id).await?;
        logic::check_rating(&m, arbiter, today)?;
        sqlx::query("UPDATE matches SET rating = $2 WHERE match_id = $1")
            .bind(id)
            .bind(i16::from(rating))
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        m.rating = Some(rating);
        Ok(m)
    }

    async fn record_result(
        &self,
        id: MatchId,
        arbiter: &str,
        result: MatchResult,
        today: NaiveDate,
    ) -> StoreResult<Match> {
        let mut tx = self.begin_serializable().await?;
        let mut m = Self::lock_match(&mut tx, id).await?;
        logic::check_result(&m, arbiter, today)?;
        sqlx::query("UPDATE matches SET result = $2 WHERE match_id = $1")
            .bind(id)
            .bind(result.as_str())
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        m.result = Some(result);
        Ok(m)
    }

    async fn delete_match(&self, id: MatchId, coach: &str, today: NaiveDate) -> StoreResult<Match> {
        let mut tx = self.begin_serializable().await?;
        let m = Self::lock_match(&mut tx, id).await?;
        let coaches = sqlx::query_scalar::<_, String>(
            "SELECT coach_username FROM teams WHERE team_id = $1 OR team_id = $2",
        )
        .bind(m.team1_id)
        .bind(m.team2_id)
        .fetch_all(&mut *tx)
        .await?;
        let coaches: Vec<&str> = coaches.iter().map(String::as_str).collect();
        logic::check_deletion(&m, coach, &coaches, today)?;
        sqlx::query("DELETE FROM matches WHERE match_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(m)
    }
}
