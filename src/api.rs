//! REST API: route handlers and the HTTP mapping of scheduling errors.

use crate::auth::{self, AnyRole, Arbitrating, Authorized, Coaching, Managing, Playing};
use crate::logic::{self, MatchRequest};
use crate::models::{HallId, MatchFilter, MatchId, MatchResult, ScheduleError, TeamId};
use crate::scheduler::Scheduler;
use actix_session::Session;
use actix_web::error::JsonPayloadError;
use actix_web::http::StatusCode;
use actix_web::{
    delete, get, post, put,
    web::{self, Data, Json, Path},
    HttpRequest, HttpResponse, ResponseError,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

type AppState = Data<Scheduler>;

type ApiResult = Result<HttpResponse, ScheduleError>;

impl ResponseError for ScheduleError {
    fn status_code(&self) -> StatusCode {
        use ScheduleError::*;
        match self {
            LocationConflict { .. } | ArbiterConflict { .. } | PlayerConflict { .. } | Conflict => {
                StatusCode::CONFLICT
            }
            MatchNotFound(_) | HallNotFound(_) => StatusCode::NOT_FOUND,
            Forbidden(_) => StatusCode::FORBIDDEN,
            Timeout => StatusCode::GATEWAY_TIMEOUT,
            Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            InvalidDate(_) | InvalidSlot(_) | InvalidRating(_) | InvalidName | MalformedBody { .. }
            | UnknownReference(_) | TeamMembership(_) | NotYetPlayed | AlreadyRated | AlreadyRecorded | DeletionClosed => {
                StatusCode::BAD_REQUEST
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        // Storage details stay in the server log.
        let message = match self {
            ScheduleError::Storage(_) => "An internal error occurred".to_string(),
            other => other.to_string(),
        };
        HttpResponse::build(self.status_code())
            .json(serde_json::json!({ "error": self.kind(), "message": message }))
    }
}

#[derive(Serialize)]
struct HealthResponse {
    ok: bool,
    service: &'static str,
}

#[derive(Deserialize)]
struct LoginBody {
    username: String,
    password: String,
}

#[derive(Deserialize)]
struct RenameHallBody {
    new_name: String,
}

#[derive(Deserialize)]
struct RateBody {
    #[serde(default)]
    rating: Value,
}

#[derive(Deserialize)]
struct ResultBody {
    result: MatchResult,
}

#[derive(Deserialize)]
struct MatchPath {
    id: MatchId,
}

#[derive(Deserialize)]
struct HallPath {
    id: HallId,
}

#[derive(Deserialize)]
struct TeamPath {
    id: TeamId,
}

#[get("/api/health")]
async fn api_health() -> HttpResponse {
    HttpResponse::Ok().json(HealthResponse {
        ok: true,
        service: "chess-tournament-web",
    })
}

/// Sign in: puts the user's identity into the session cookie.
#[post("/api/auth/login")]
async fn api_login(state: AppState, session: Session, body: Json<LoginBody>) -> Result<HttpResponse, actix_web::Error> {
    match state.authenticate(&body.username, &body.password).await? {
        Some(identity) => {
            auth::remember(&session, &identity)?;
            log::info!("{} signed in as {}", identity.username, identity.role);
            Ok(HttpResponse::Ok().json(identity))
        }
        None => Ok(HttpResponse::Unauthorized()
            .json(serde_json::json!({ "error": "unauthenticated", "message": "Invalid username or password" }))),
    }
}

#[post("/api/auth/logout")]
async fn api_logout(session: Session) -> HttpResponse {
    auth::forget(&session);
    HttpResponse::Ok().json(serde_json::json!({ "ok": true }))
}

/// Who is signed in (401 if nobody).
#[get("/api/auth/status")]
async fn api_auth_status(user: Authorized<AnyRole>) -> HttpResponse {
    HttpResponse::Ok().json(&user.identity)
}

#[get("/api/halls")]
async fn api_halls(state: AppState, _user: Authorized<AnyRole>) -> ApiResult {
    Ok(HttpResponse::Ok().json(state.halls().await?))
}

#[get("/api/halls/{id}/tables")]
async fn api_hall_tables(state: AppState, _user: Authorized<AnyRole>, path: Path<HallPath>) -> ApiResult {
    Ok(HttpResponse::Ok().json(state.hall_tables(path.id).await?))
}

/// Rename a hall (managers only).
#[put("/api/halls/{id}/rename")]
async fn api_rename_hall(
    state: AppState,
    user: Authorized<Managing>,
    path: Path<HallPath>,
    body: Json<RenameHallBody>,
) -> ApiResult {
    Ok(HttpResponse::Ok().json(state.rename_hall(&user, path.id, &body.new_name).await?))
}

#[get("/api/teams")]
async fn api_teams(state: AppState, _user: Authorized<AnyRole>) -> ApiResult {
    Ok(HttpResponse::Ok().json(state.teams().await?))
}

/// The signed-in coach's team (404 if they have none).
#[get("/api/teams/coach")]
async fn api_coach_team(state: AppState, user: Authorized<Coaching>) -> ApiResult {
    match state.coached_team(&user).await? {
        Some(team) => Ok(HttpResponse::Ok().json(team)),
        None => Ok(HttpResponse::NotFound()
            .json(serde_json::json!({ "error": "not-found", "message": "You do not coach a team" }))),
    }
}

#[get("/api/teams/{id}/players")]
async fn api_team_players(state: AppState, _user: Authorized<AnyRole>, path: Path<TeamPath>) -> ApiResult {
    Ok(HttpResponse::Ok().json(state.team_players(path.id).await?))
}

#[get("/api/arbiters")]
async fn api_arbiters(state: AppState, _user: Authorized<AnyRole>) -> ApiResult {
    Ok(HttpResponse::Ok().json(state.arbiters().await?))
}

#[get("/api/titles")]
async fn api_titles(state: AppState, _user: Authorized<AnyRole>) -> ApiResult {
    Ok(HttpResponse::Ok().json(state.titles().await?))
}

/// Every match with its derived state, newest first.
#[get("/api/matches")]
async fn api_matches(state: AppState, _user: Authorized<AnyRole>) -> ApiResult {
    Ok(HttpResponse::Ok().json(state.matches(MatchFilter::All).await?))
}

/// Schedule a match for the coach's team. 201 with the created match, or a rejection naming the rule.
#[post("/api/matches")]
async fn api_create_match(state: AppState, user: Authorized<Coaching>, body: Json<Value>) -> ApiResult {
    let request = MatchRequest::from_json(body.into_inner())?;
    let created = state.create_match(&user, &request).await?;
    Ok(HttpResponse::Created().json(created))
}

/// Matches the signed-in player plays in.
#[get("/api/matches/player")]
async fn api_player_matches(state: AppState, user: Authorized<Playing>) -> ApiResult {
    let filter = MatchFilter::Player(user.username.clone());
    Ok(HttpResponse::Ok().json(state.matches(filter).await?))
}

/// Matches the signed-in arbiter officiates.
#[get("/api/matches/arbiter")]
async fn api_arbiter_matches(state: AppState, user: Authorized<Arbitrating>) -> ApiResult {
    let filter = MatchFilter::Arbiter(user.username.clone());
    Ok(HttpResponse::Ok().json(state.matches(filter).await?))
}

#[get("/api/matches/{id}")]
async fn api_get_match(state: AppState, _user: Authorized<AnyRole>, path: Path<MatchPath>) -> ApiResult {
    Ok(HttpResponse::Ok().json(state.find_match(path.id).await?))
}

/// Delete a future match involving the coach's team.
#[delete("/api/matches/{id}")]
async fn api_delete_match(state: AppState, user: Authorized<Coaching>, path: Path<MatchPath>) -> ApiResult {
    Ok(HttpResponse::Ok().json(state.delete_match(&user, path.id).await?))
}

/// Rate a past match (assigned arbiter only, once).
#[post("/api/matches/{id}/rate")]
async fn api_rate_match(
    state: AppState,
    user: Authorized<Arbitrating>,
    path: Path<MatchPath>,
    body: Json<RateBody>,
) -> ApiResult {
    let rating = logic::rating_from_json(&body.rating)?;
    Ok(HttpResponse::Ok().json(state.rate_match(&user, path.id, rating).await?))
}

/// Record the result of a past match (assigned arbiter only, once).
#[post("/api/matches/{id}/result")]
async fn api_record_result(
    state: AppState,
    user: Authorized<Arbitrating>,
    path: Path<MatchPath>,
    body: Json<ResultBody>,
) -> ApiResult {
    Ok(HttpResponse::Ok().json(state.record_result(&user, path.id, body.result).await?))
}

/// Undecodable JSON bodies get the same `{"error", "message"}` shape as every other rejection.
fn json_error(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    ScheduleError::MalformedBody {
        kind: "invalid-body",
        reason: err.to_string(),
    }
    .into()
}

/// Register every API route. Fixed `/api/matches/...` paths go before `/api/matches/{id}`.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(json_error))
        .service(api_health)
        .service(api_login)
        .service(api_logout)
        .service(api_auth_status)
        .service(api_halls)
        .service(api_hall_tables)
        .service(api_rename_hall)
        .service(api_teams)
        .service(api_coach_team)
        .service(api_team_players)
        .service(api_arbiters)
        .service(api_titles)
        .service(api_matches)
        .service(api_create_match)
        .service(api_player_matches)
        .service(api_arbiter_matches)
        .service(api_get_match)
        .service(api_delete_match)
        .service(api_rate_match)
        .service(api_record_result);
}
