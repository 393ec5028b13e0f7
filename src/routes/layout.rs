use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::session::RequestSession;
use super::App;
use crate::model::User;
use crate::session::SessionStore;

/// Data every page receives: who is signed in, if anyone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutData {
    pub user: Option<User>,
    pub is_authenticated: bool,
}

impl LayoutData {
    pub fn anonymous() -> Self {
        Self::default()
    }
}

/// Restore the session from the request's cookies. A missing or unreadable cookie is not an
/// error for the page: it simply renders signed out.
#[instrument(skip_all)]
pub fn load_layout(store: &SessionStore, cookie_header: Option<&str>) -> LayoutData {
    match store.load_from_cookie(cookie_header.unwrap_or_default()) {
        Ok(()) => LayoutData {
            user: store.model(),
            is_authenticated: store.is_valid(),
        },
        Err(err) => {
            tracing::debug!(%err, "could not restore session from cookie");
            LayoutData::anonymous()
        }
    }
}

pub async fn handler(State(app): State<App>, headers: HeaderMap) -> Json<LayoutData> {
    let request = RequestSession::restore(&headers, &app.cookie);
    Json(request.layout().clone())
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::session::tests::{cookie_header, token, user};

    #[test]
    fn restores_signed_in_user() {
        let saved = SessionStore::default();
        saved.save(token(Duration::hours(1)), Some(user()));

        let data = load_layout(&SessionStore::default(), Some(&cookie_header(&saved)));
        assert_eq!(data.user, Some(user()));
        assert!(data.is_authenticated);
    }

    #[test]
    fn expired_session_keeps_user_but_is_not_authenticated() {
        let saved = SessionStore::default();
        saved.save(token(Duration::hours(-1)), Some(user()));

        let data = load_layout(&SessionStore::default(), Some(&cookie_header(&saved)));
        assert_eq!(data.user, Some(user()));
        assert!(!data.is_authenticated);
    }

    #[test]
    fn degrades_without_cookie() {
        assert_eq!(load_layout(&SessionStore::default(), None), LayoutData::anonymous());
    }

    #[test]
    fn degrades_on_malformed_cookie() {
        let data = load_layout(&SessionStore::default(), Some("pb_auth=garbage"));
        assert_eq!(data, LayoutData::anonymous());

        let json = serde_json::to_value(&data).unwrap();
        assert_eq!(json, serde_json::json!({ "user": null, "isAuthenticated": false }));
    }
}
