//! The auth store, held per request instead of as a process-wide singleton.
//!
//! A [SessionStore] owns the current [Session] and notifies subscribers on every change, which is
//! what the HTTP layer uses to write the session back into the auth cookie.

use axum_extra::extract::cookie::{Cookie, SameSite};
use chrono::{DateTime, Utc};
use derive_new::new;
use jsonwebtoken::{DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use snafu::{Location, ResultExt as _, Snafu};
use time::OffsetDateTime;
use tokio::sync::watch;

use crate::model::User;

pub const DEFAULT_COOKIE_NAME: &str = "pb_auth";

/// Browsers drop cookies larger than this.
const MAX_COOKIE_SIZE: usize = 4096;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum SessionError {
    #[snafu(display("no `{name}` cookie in the request"))]
    MissingCookie {
        name: String,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("`{name}` cookie does not hold a session: {source}"))]
    MalformedCookie {
        name: String,
        source: serde_json::Error,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("failed to encode the session: {source}"))]
    EncodeSession {
        source: serde_json::Error,
        #[snafu(implicit)]
        location: Location,
    },
}

/// The token and user model of whoever is signed in. An empty token means nobody is.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, new)]
pub struct Session {
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub model: Option<User>,
}

#[derive(Debug, Deserialize)]
struct Claims {
    exp: i64,
}

impl Session {
    pub fn token(&self) -> Option<&str> {
        (!self.token.is_empty()).then_some(self.token.as_str())
    }

    pub fn model(&self) -> Option<&User> {
        self.model.as_ref()
    }

    /// Expiry read from the token's `exp` claim.
    ///
    /// The signature is not checked: only the backend can do that, this is just to avoid
    /// sending requests with a token that is already dead.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        let token = self.token()?;

        let mut validation = Validation::default();
        validation.insecure_disable_signature_validation();
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();

        let data = jsonwebtoken::decode::<Claims>(token, &DecodingKey::from_secret(&[]), &validation).ok()?;
        DateTime::from_timestamp(data.claims.exp, 0)
    }

    pub fn is_valid(&self) -> bool {
        self.is_valid_at(Utc::now())
    }

    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at().is_some_and(|exp| exp > now)
    }
}

/// Attributes of the auth cookie.
#[derive(Debug, Clone, PartialEq, Eq, new)]
pub struct CookieOptions {
    pub name: String,
    pub secure: bool,
    pub http_only: bool,
}

impl Default for CookieOptions {
    fn default() -> Self {
        Self::new(DEFAULT_COOKIE_NAME.into(), true, true)
    }
}

#[derive(Debug)]
pub struct SessionStore {
    cookie_name: String,
    state: watch::Sender<Session>,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(DEFAULT_COOKIE_NAME)
    }
}

impl SessionStore {
    pub fn new(cookie_name: impl Into<String>) -> Self {
        let (state, _) = watch::channel(Session::default());

        Self {
            cookie_name: cookie_name.into(),
            state,
        }
    }

    pub fn session(&self) -> Session {
        self.state.borrow().clone()
    }

    pub fn is_valid(&self) -> bool {
        self.state.borrow().is_valid()
    }

    pub fn model(&self) -> Option<User> {
        self.state.borrow().model.clone()
    }

    pub fn token(&self) -> String {
        self.state.borrow().token.clone()
    }

    /// Receive every future change to the session.
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.state.subscribe()
    }

    pub fn save(&self, token: impl Into<String>, model: Option<User>) {
        self.state.send_replace(Session::new(token.into(), model));
    }

    pub fn clear(&self) {
        self.state.send_replace(Session::default());
    }

    /// Restore the session from a raw `Cookie` header.
    ///
    /// When the auth cookie is absent or unreadable the store is left cleared and the reason is
    /// returned.
    pub fn load_from_cookie(&self, header: &str) -> Result<(), SessionError> {
        let raw = Cookie::split_parse_encoded(header)
            .filter_map(Result::ok)
            .find(|cookie| cookie.name() == self.cookie_name)
            .map(|cookie| cookie.value().to_owned());

        let Some(raw) = raw else {
            self.clear();
            return MissingCookieSnafu {
                name: &self.cookie_name,
            }
            .fail();
        };

        match serde_json::from_str::<Session>(&raw) {
            Ok(session) => {
                self.state.send_replace(session);
                Ok(())
            }
            Err(source) => {
                self.clear();
                Err(source).context(MalformedCookieSnafu {
                    name: &self.cookie_name,
                })
            }
        }
    }

    /// Serialize the session into the auth cookie, expiring together with the token.
    pub fn export_to_cookie(&self, options: &CookieOptions) -> Result<Cookie<'static>, SessionError> {
        let mut session = self.session();

        let mut cookie = build_cookie(&session, options)?;
        if cookie.encoded().to_string().len() > MAX_COOKIE_SIZE {
            tracing::debug!(name = %options.name, "session cookie too large, trimming the user model");
            session.model = session.model.as_ref().map(User::trimmed);
            cookie = build_cookie(&session, options)?;
        }

        Ok(cookie)
    }
}

fn build_cookie(session: &Session, options: &CookieOptions) -> Result<Cookie<'static>, SessionError> {
    let value = serde_json::to_string(session).context(EncodeSessionSnafu)?;

    let mut cookie = Cookie::build((options.name.clone(), value))
        .path("/")
        .same_site(SameSite::Strict)
        .secure(options.secure)
        .http_only(options.http_only);

    let expires = session
        .expires_at()
        .and_then(|exp| OffsetDateTime::from_unix_timestamp(exp.timestamp()).ok());
    if let Some(expires) = expires {
        cookie = cookie.expires(expires);
    }

    Ok(cookie.build())
}
