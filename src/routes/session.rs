use axum::http::{header, HeaderMap};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use tokio::sync::watch;

use super::layout::{load_layout, LayoutData};
use crate::session::{CookieOptions, Session, SessionError, SessionStore};

/// The session of a single request, restored from its `Cookie` header.
///
/// Changes made after the restore are written back to the response by [RequestSession::persist].
#[derive(Debug)]
pub struct RequestSession {
    store: SessionStore,
    changes: watch::Receiver<Session>,
    layout: LayoutData,
    cookie_sent: bool,
}

impl RequestSession {
    pub fn restore(headers: &HeaderMap, options: &CookieOptions) -> Self {
        let store = SessionStore::new(options.name.clone());

        let header = headers
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .collect::<Vec<_>>()
            .join("; ");
        let layout = load_layout(&store, (!header.is_empty()).then_some(header.as_str()));
        let cookie_sent = Cookie::split_parse(header.as_str())
            .filter_map(Result::ok)
            .any(|cookie| cookie.name() == options.name);

        let changes = store.subscribe();

        Self {
            store,
            changes,
            layout,
            cookie_sent,
        }
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub fn session(&self) -> Session {
        self.store.session()
    }

    pub fn layout(&self) -> &LayoutData {
        &self.layout
    }

    /// Drop a session that was refused, so a stale auth cookie is removed on [RequestSession::persist].
    /// Requests that sent no auth cookie stay untouched.
    pub fn discard(&self) {
        if self.cookie_sent {
            self.store.clear();
        }
    }

    /// Write the session into `jar` if it changed since the restore: a valid session sets the
    /// auth cookie, anything else removes it.
    pub fn persist(&mut self, jar: CookieJar, options: &CookieOptions) -> Result<CookieJar, SessionError> {
        if !self.changes.has_changed().unwrap_or(false) {
            return Ok(jar);
        }
        self.changes.borrow_and_update();

        if self.store.is_valid() {
            let cookie = self.store.export_to_cookie(options)?;
            tracing::debug!(name = %options.name, "persisting session cookie");
            Ok(jar.add(cookie))
        } else {
            tracing::debug!(name = %options.name, "removing session cookie");
            Ok(jar.remove(Cookie::build((options.name.clone(), "")).path("/")))
        }
    }
}
