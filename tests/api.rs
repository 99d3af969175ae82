//! HTTP surface: session login, capability checks, status codes, and error bodies.

mod common;

use actix_web::cookie::Key;
use actix_web::http::StatusCode;
use actix_web::{test, web::Data, App};
use chess_tournament_web::{api, auth};
use common::{booked, day, scheduler, slow_scheduler, store};
use serde_json::{json, Value};

/// Sign in and return the session cookie.
macro_rules! login {
    ($app:expr, $user:expr) => {{
        let req = test::TestRequest::post()
            .uri("/api/auth/login")
            .set_json(json!({ "username": $user, "password": format!("{}-pw", $user) }))
            .to_request();
        let resp = test::call_service(&$app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        resp.response()
            .cookies()
            .find(|c| c.name() == auth::SESSION_COOKIE)
            .expect("session cookie")
            .into_owned()
    }};
}

macro_rules! app {
    ($store:expr) => {
        app!(with scheduler(&$store))
    };
    (with $scheduler:expr) => {
        test::init_service(
            App::new()
                .app_data(Data::new($scheduler))
                .wrap(auth::session_middleware(Key::generate(), false))
                .configure(api::configure),
        )
        .await
    };
}

fn match_body(slot: i64, table: i32, white: &str, black: &str, arbiter: &str) -> Value {
    json!({
        "date": "2025-06-01",
        "time_slot": slot,
        "hall_id": 1,
        "table_id": table,
        "team1_id": 1,
        "team2_id": 2,
        "white_player_username": white,
        "black_player_username": black,
        "arbiter_username": arbiter,
    })
}

#[actix_web::test]
async fn health_needs_no_session() {
    let store = store();
    let app = app!(store);
    let req = test::TestRequest::get().uri("/api/health").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["ok"], true);
}

#[actix_web::test]
async fn requests_without_a_session_are_unauthenticated() {
    let store = store();
    let app = app!(store);

    let req = test::TestRequest::get().uri("/api/matches").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "unauthenticated");
}

#[actix_web::test]
async fn wrong_password_is_rejected() {
    let store = store();
    let app = app!(store);
    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(json!({ "username": "alice", "password": "nope" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn session_carries_the_identity() {
    let store = store();
    let app = app!(store);
    let cookie = login!(app, "coach_anna");

    let req = test::TestRequest::get()
        .uri("/api/auth/status")
        .cookie(cookie.clone())
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["username"], "coach_anna");
    assert_eq!(body["role"], "coach");

    let req = test::TestRequest::get().uri("/api/teams/coach").cookie(cookie).to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["team_name"], "Knights");
}

#[actix_web::test]
async fn only_coaches_create_matches() {
    let store = store();
    let app = app!(store);
    let cookie = login!(app, "alice");

    let req = test::TestRequest::post()
        .uri("/api/matches")
        .cookie(cookie)
        .set_json(match_body(1, 1, "alice", "bob", "arb_lee"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "forbidden");
    assert_eq!(store.match_count(), 0);
}

#[actix_web::test]
async fn create_then_conflict() {
    let store = store();
    let app = app!(store);
    let cookie = login!(app, "coach_anna");

    let req = test::TestRequest::post()
        .uri("/api/matches")
        .cookie(cookie.clone())
        .set_json(match_body(1, 1, "alice", "bob", "arb_lee"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created: Value = test::read_body_json(resp).await;
    assert_eq!(created["time_slot"], 1);
    let id = created["id"].as_str().unwrap().to_string();

    let req = test::TestRequest::post()
        .uri("/api/matches")
        .cookie(cookie.clone())
        .set_json(match_body(2, 1, "carla", "deniz", "arb_mia"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "location-conflict");
    assert!(body["message"].as_str().unwrap().contains(&id));

    let req = test::TestRequest::get()
        .uri(&format!("/api/matches/{}", id))
        .cookie(cookie)
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["state"], "scheduled");
    assert_eq!(body["arbiter_username"], "arb_lee");
}

#[actix_web::test]
async fn invalid_input_is_a_bad_request() {
    let store = store();
    let app = app!(store);
    let cookie = login!(app, "coach_anna");

    let mut bad_date = match_body(1, 1, "alice", "bob", "arb_lee");
    bad_date["date"] = json!("2025-13-01");
    let cases = [
        (bad_date, "invalid-date"),
        (match_body(3, 1, "alice", "bob", "arb_lee"), "invalid-slot"),
        (match_body(1, 9, "alice", "bob", "arb_lee"), "unknown-reference"),
        (match_body(1, 1, "bob", "alice", "arb_lee"), "team-membership-violation"),
    ];
    for (body, kind) in cases {
        let req = test::TestRequest::post()
            .uri("/api/matches")
            .cookie(cookie.clone())
            .set_json(body)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{}", kind);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], kind);
    }
    assert_eq!(store.match_count(), 0);
}

#[actix_web::test]
async fn arbiter_rates_past_matches() {
    let store = store();
    let played = booked(day(2025, 5, 10), 1, (1, 1), ("alice", "bob"), "arb_lee");
    store.import_match(played.clone());
    let app = app!(store);

    let mia = login!(app, "arb_mia");
    let req = test::TestRequest::post()
        .uri(&format!("/api/matches/{}/rate", played.id))
        .cookie(mia)
        .set_json(json!({ "rating": 7 }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);

    let lee = login!(app, "arb_lee");
    let req = test::TestRequest::post()
        .uri(&format!("/api/matches/{}/rate", played.id))
        .cookie(lee.clone())
        .set_json(json!({ "rating": 7 }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["rating"], 7);

    let req = test::TestRequest::post()
        .uri(&format!("/api/matches/{}/rate", played.id))
        .cookie(lee.clone())
        .set_json(json!({ "rating": 9 }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "already-rated");

    let req = test::TestRequest::get().uri("/api/matches/arbiter").cookie(lee).to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body[0]["state"], "rated");
}

#[actix_web::test]
async fn coach_deletes_upcoming_match() {
    let store = store();
    let upcoming = booked(day(2025, 6, 1), 1, (1, 1), ("alice", "bob"), "arb_lee");
    store.import_match(upcoming.clone());
    let app = app!(store);

    let zoe = login!(app, "coach_zoe");
    let req = test::TestRequest::delete()
        .uri(&format!("/api/matches/{}", upcoming.id))
        .cookie(zoe)
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);

    let omar = login!(app, "coach_omar");
    let req = test::TestRequest::delete()
        .uri(&format!("/api/matches/{}", upcoming.id))
        .cookie(omar.clone())
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
    assert_eq!(store.match_count(), 0);

    let req = test::TestRequest::delete()
        .uri(&format!("/api/matches/{}", upcoming.id))
        .cookie(omar)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn player_sees_own_matches() {
    let store = store();
    store.import_match(booked(day(2025, 6, 1), 1, (1, 1), ("alice", "bob"), "arb_lee"));
    store.import_match(booked(day(2025, 6, 1), 1, (1, 2), ("carla", "deniz"), "arb_mia"));
    let app = app!(store);

    let cookie = login!(app, "deniz");
    let req = test::TestRequest::get().uri("/api/matches/player").cookie(cookie).to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let listed = body.as_array().unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["black_player_username"], "deniz");
}

#[actix_web::test]
async fn manager_renames_halls() {
    let store = store();
    let app = app!(store);

    let anna = login!(app, "coach_anna");
    let req = test::TestRequest::put()
        .uri("/api/halls/1/rename")
        .cookie(anna)
        .set_json(json!({ "new_name": "Main Hall" }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);

    let manager = login!(app, "manager");
    let req = test::TestRequest::put()
        .uri("/api/halls/1/rename")
        .cookie(manager.clone())
        .set_json(json!({ "new_name": "Main Hall" }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["hall_name"], "Main Hall");

    let req = test::TestRequest::put()
        .uri("/api/halls/1/rename")
        .cookie(manager.clone())
        .set_json(json!({ "new_name": "" }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::get().uri("/api/halls/8/tables").cookie(manager).to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn undecodable_fields_name_their_category() {
    let store = store();
    let app = app!(store);
    let cookie = login!(app, "coach_anna");

    let mut word_slot = match_body(1, 1, "alice", "bob", "arb_lee");
    word_slot["time_slot"] = json!("first");
    let mut fractional_slot = match_body(1, 1, "alice", "bob", "arb_lee");
    fractional_slot["time_slot"] = json!(1.5);
    let mut no_date = match_body(1, 1, "alice", "bob", "arb_lee");
    no_date.as_object_mut().unwrap().remove("date");
    let mut numeric_date = match_body(1, 1, "alice", "bob", "arb_lee");
    numeric_date["date"] = json!(20250601);
    let mut no_arbiter = match_body(1, 1, "alice", "bob", "arb_lee");
    no_arbiter.as_object_mut().unwrap().remove("arbiter_username");
    let cases = [
        (word_slot, "invalid-slot"),
        (fractional_slot, "invalid-slot"),
        (no_date, "invalid-date"),
        (numeric_date, "invalid-date"),
        (no_arbiter, "invalid-body"),
        (json!([1, 2, 3]), "invalid-body"),
    ];
    for (body, kind) in cases {
        let req = test::TestRequest::post()
            .uri("/api/matches")
            .cookie(cookie.clone())
            .set_json(body)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{}", kind);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], kind);
        assert!(body["message"].is_string(), "{}", kind);
    }
    assert_eq!(store.match_count(), 0);
}

#[actix_web::test]
async fn non_integer_rating_is_an_invalid_rating() {
    let store = store();
    let played = booked(day(2025, 5, 10), 1, (1, 1), ("alice", "bob"), "arb_lee");
    store.import_match(played.clone());
    let app = app!(store);
    let lee = login!(app, "arb_lee");

    for rating in [json!("seven"), json!(7.5), json!(null)] {
        let req = test::TestRequest::post()
            .uri(&format!("/api/matches/{}/rate", played.id))
            .cookie(lee.clone())
            .set_json(json!({ "rating": rating }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{}", rating);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "invalid-rating");
    }

    let req = test::TestRequest::post()
        .uri(&format!("/api/matches/{}/rate", played.id))
        .cookie(lee)
        .set_json(json!({ "rating": 7 }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["rating"], 7);
}

#[actix_web::test]
async fn unparseable_json_keeps_the_error_shape() {
    let store = store();
    let app = app!(store);
    let cookie = login!(app, "coach_anna");

    let req = test::TestRequest::post()
        .uri("/api/matches")
        .cookie(cookie.clone())
        .insert_header(("content-type", "application/json"))
        .set_payload("{\"date\": \"2025-06-01\",")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "invalid-body");

    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(json!({ "username": "coach_anna" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "invalid-body");
}

#[actix_web::test]
async fn slow_store_is_a_gateway_timeout() {
    let store = store();
    let app = app!(with slow_scheduler(&store));
    let cookie = login!(app, "coach_anna");

    let req = test::TestRequest::post()
        .uri("/api/matches")
        .cookie(cookie)
        .set_json(match_body(1, 1, "alice", "bob", "arb_lee"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::GATEWAY_TIMEOUT);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "timeout");
    assert_eq!(store.match_count(), 0);
}

#[actix_web::test]
async fn titles_are_listed_for_any_signed_in_user() {
    let store = store();
    let app = app!(store);

    let req = test::TestRequest::get().uri("/api/titles").to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);

    let cookie = login!(app, "deniz");
    let req = test::TestRequest::get().uri("/api/titles").cookie(cookie).to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body, json!([
        { "title_id": 1, "title_name": "GM" },
        { "title_id": 2, "title_name": "IM" },
    ]));
}
