use axum::extract::State;
use axum::http::HeaderMap;
use axum::Form;
use axum_extra::extract::cookie::CookieJar;
use secrecy::SecretString;
use serde::Deserialize;
use snafu::ResultExt as _;

use super::error::{ApiError, CookieSnafu, SignInSnafu};
use super::session::RequestSession;
use super::{App, Redirect, DASHBOARD_ROUTE, LOGIN_ROUTE};
use crate::model::{Record as _, User};

#[derive(Debug, Deserialize)]
pub struct Credentials {
    pub identity: String,
    pub password: SecretString,
}

/// Sign in with a username or email and send the user to their dashboard.
pub async fn login(
    State(app): State<App>,
    headers: HeaderMap,
    jar: CookieJar,
    Form(credentials): Form<Credentials>,
) -> Result<(CookieJar, Redirect), ApiError> {
    let mut request = RequestSession::restore(&headers, &app.cookie);

    let auth = app
        .backend
        .auth_with_password(User::collection(), &credentials.identity, &credentials.password)
        .await
        .context(SignInSnafu {
            identity: &credentials.identity,
        })?;

    tracing::info!(user_id = %auth.record.id, "signed in");
    request.store().save(auth.token, Some(auth.record));

    let jar = request.persist(jar, &app.cookie).context(CookieSnafu)?;
    Ok((jar, Redirect::see_other(DASHBOARD_ROUTE)))
}

pub async fn logout(
    State(app): State<App>,
    headers: HeaderMap,
    jar: CookieJar,
) -> Result<(CookieJar, Redirect), ApiError> {
    let mut request = RequestSession::restore(&headers, &app.cookie);

    if let Some(user) = request.store().model() {
        tracing::info!(user_id = %user.id, "signed out");
    }
    request.store().clear();

    let jar = request.persist(jar, &app.cookie).context(CookieSnafu)?;
    Ok((jar, Redirect::see_other(LOGIN_ROUTE)))
}
