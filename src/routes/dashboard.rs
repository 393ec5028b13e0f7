use axum::extract::State;
use axum::http::HeaderMap;
use axum_extra::extract::cookie::CookieJar;
use serde::Serialize;
use snafu::ResultExt as _;
use tracing::instrument;

use super::error::{ApiError, CookieSnafu, LoadSnafu};
use super::session::RequestSession;
use super::{App, Load, Redirect, DASHBOARD_ROUTE, LOGIN_ROUTE};
use crate::aggregate::{aggregate, Enriched};
use crate::backend::{self, Backend, BackendError, ListQuery};
use crate::filter::{Filter, Sort};
use crate::model::{Post, Turd, User};
use crate::session::Session;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DashboardData {
    pub user: User,
    pub posts: Vec<Enriched<Post>>,
}

/// Load the signed-in user's latest posts, each with the total of the turds left on it.
///
/// Anyone without a valid session is sent to the login page before anything is fetched.
#[instrument(skip(session, backend))]
pub async fn load_dashboard(
    session: &Session,
    backend: &dyn Backend,
    page_size: u32,
) -> Result<Load<DashboardData>, BackendError> {
    let user = match session.model() {
        Some(user) if session.is_valid() => user.clone(),
        _ => {
            tracing::info!("session is not authenticated, redirecting to login");
            return Ok(Load::Redirect(Redirect::see_other(LOGIN_ROUTE)));
        }
    };

    let query = ListQuery::new()
        .filter(Filter::eq("creatorId", &user.id))
        .sort(Sort::descending("created"))
        .expand("creatorId");
    let posts: Vec<Post> = backend::list(backend, 1, page_size, &query, session).await?;

    let turds: Vec<Turd> = if posts.is_empty() {
        Vec::new()
    } else {
        let ids = posts.iter().map(|post| post.id.clone());
        let query = ListQuery::new()
            .filter(Filter::any_of("postId", ids))
            .fields("postId,count");
        backend::full_list(backend, &query, session).await?
    };

    tracing::debug!(user_id = %user.id, posts = posts.len(), turds = turds.len(), "loaded dashboard records");

    Ok(Load::Data(DashboardData {
        user,
        posts: aggregate(posts, &turds),
    }))
}

pub async fn handler(
    State(app): State<App>,
    headers: HeaderMap,
    jar: CookieJar,
) -> Result<(CookieJar, Load<DashboardData>), ApiError> {
    let mut request = RequestSession::restore(&headers, &app.cookie);

    let loaded = load_dashboard(&request.session(), app.backend.as_ref(), app.page_size)
        .await
        .context(LoadSnafu {
            route: DASHBOARD_ROUTE,
        })?;
    if matches!(loaded, Load::Redirect(_)) {
        request.discard();
    }

    let jar = request.persist(jar, &app.cookie).context(CookieSnafu)?;
    Ok((jar, loaded))
}
