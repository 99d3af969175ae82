//! Session identity and the per-request capability check.
//!
//! Handlers ask for `Authorized<C>`; extraction fails with 401 when no identity is
//! in the session and 403 when the identity's role is not one of `C::ROLES`. No
//! handler compares roles itself.

use crate::models::{Identity, Role};
use actix_session::config::PersistentSession;
use actix_session::storage::CookieSessionStore;
use actix_session::{Session, SessionExt, SessionMiddleware};
use actix_web::cookie::{time, Key};
use actix_web::dev::Payload;
use actix_web::http::StatusCode;
use actix_web::{FromRequest, HttpRequest, HttpResponse, ResponseError};
use std::future::{ready, Ready};
use std::marker::PhantomData;

/// Session key holding the serialized [`Identity`].
pub const IDENTITY_KEY: &str = "identity";

pub const SESSION_COOKIE: &str = "auth_session";

/// Session lifetime in hours.
const SESSION_TTL_HOURS: i64 = 12;

/// Cookie-backed session middleware shared by the server and tests.
pub fn session_middleware(key: Key, secure: bool) -> SessionMiddleware<CookieSessionStore> {
    SessionMiddleware::builder(CookieSessionStore::default(), key)
        .cookie_name(SESSION_COOKIE.to_string())
        .cookie_secure(secure)
        .cookie_http_only(true)
        .session_lifecycle(PersistentSession::default().session_ttl(time::Duration::hours(SESSION_TTL_HOURS)))
        .build()
}

pub fn remember(session: &Session, identity: &Identity) -> Result<(), AuthError> {
    session.renew();
    session
        .insert(IDENTITY_KEY, identity)
        .map_err(|e| AuthError::Session(e.to_string()))
}

pub fn forget(session: &Session) {
    session.purge();
}

#[derive(Debug)]
pub enum AuthError {
    Unauthenticated,
    Forbidden(&'static [Role]),
    Session(String),
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::Unauthenticated => write!(f, "Authentication required"),
            AuthError::Forbidden(roles) => {
                let names: Vec<&str> = roles.iter().map(Role::as_str).collect();
                write!(f, "Only {} users can do this", names.join(" or "))
            }
            AuthError::Session(e) => write!(f, "Session error: {}", e),
        }
    }
}

impl ResponseError for AuthError {
    fn status_code(&self) -> StatusCode {
        match self {
            AuthError::Unauthenticated => StatusCode::UNAUTHORIZED,
            AuthError::Forbidden(_) => StatusCode::FORBIDDEN,
            AuthError::Session(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let kind = match self {
            AuthError::Unauthenticated => "unauthenticated",
            AuthError::Forbidden(_) => "forbidden",
            AuthError::Session(_) => "session",
        };
        HttpResponse::build(self.status_code())
            .json(serde_json::json!({ "error": kind, "message": self.to_string() }))
    }
}

/// A set of roles allowed to perform some group of operations.
pub trait Capability {
    const ROLES: &'static [Role];
}

/// Any signed-in user.
pub struct AnyRole;
pub struct Coaching;
pub struct Arbitrating;
pub struct Playing;
pub struct Managing;

impl Capability for AnyRole {
    const ROLES: &'static [Role] = &[Role::Player, Role::Coach, Role::Arbiter, Role::Manager];
}

impl Capability for Coaching {
    const ROLES: &'static [Role] = &[Role::Coach];
}

impl Capability for Arbitrating {
    const ROLES: &'static [Role] = &[Role::Arbiter];
}

impl Capability for Playing {
    const ROLES: &'static [Role] = &[Role::Player];
}

impl Capability for Managing {
    const ROLES: &'static [Role] = &[Role::Manager];
}

/// The session's identity, checked against capability `C`.
pub struct Authorized<C: Capability> {
    pub identity: Identity,
    _capability: PhantomData<C>,
}

impl<C: Capability> Authorized<C> {
    /// Check an identity (if any) against `C`.
    pub fn check(identity: Option<Identity>) -> Result<Self, AuthError> {
        let identity = identity.ok_or(AuthError::Unauthenticated)?;
        if !C::ROLES.contains(&identity.role) {
            log::debug!("{} ({}) denied, needs {:?}", identity.username, identity.role, C::ROLES);
            return Err(AuthError::Forbidden(C::ROLES));
        }
        Ok(Self {
            identity,
            _capability: PhantomData,
        })
    }
}

impl<C: Capability> std::ops::Deref for Authorized<C> {
    type Target = Identity;

    fn deref(&self) -> &Identity {
        &self.identity
    }
}

impl<C: Capability> FromRequest for Authorized<C> {
    type Error = AuthError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        // An unreadable identity is treated like no identity at all.
        let identity = req.get_session().get::<Identity>(IDENTITY_KEY).ok().flatten();
        ready(Self::check(identity))
    }
}
