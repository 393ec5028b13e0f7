//! Route loaders and the HTTP surface around them.

use std::sync::Arc;

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use derive_new::new;
use serde::Serialize;
use tower_http::trace::TraceLayer;

use crate::backend::Backend;
use crate::session::CookieOptions;

pub use dashboard::{load_dashboard, DashboardData};
pub use error::ApiError;
pub use layout::{load_layout, LayoutData};
pub use session::RequestSession;

pub mod auth;
pub mod dashboard;
pub mod error;
pub mod layout;
pub mod session;

pub const LOGIN_ROUTE: &str = "/login";
pub const DASHBOARD_ROUTE: &str = "/dashboard";

/// Shared, read-only state of the router.
#[derive(Clone, new)]
pub struct App {
    pub backend: Arc<dyn Backend>,
    pub cookie: CookieOptions,
    pub page_size: u32,
}

pub fn router(app: App) -> Router {
    Router::new()
        .route("/", get(layout::handler))
        .route(DASHBOARD_ROUTE, get(dashboard::handler))
        .route(LOGIN_ROUTE, post(auth::login))
        .route("/logout", post(auth::logout))
        .layer(TraceLayer::new_for_http())
        .with_state(app)
}

/// Tells the client to go elsewhere instead of rendering the page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Redirect {
    pub status: u16,
    pub location: String,
}

impl Redirect {
    /// `303 See Other`: the follow-up request is always a `GET`.
    pub fn see_other(location: impl Into<String>) -> Self {
        Self {
            status: StatusCode::SEE_OTHER.as_u16(),
            location: location.into(),
        }
    }
}

impl IntoResponse for Redirect {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::SEE_OTHER);
        (status, [(header::LOCATION, self.location)]).into_response()
    }
}

/// The outcome of a route loader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Load<T> {
    Data(T),
    Redirect(Redirect),
}

impl<T: Serialize> IntoResponse for Load<T> {
    fn into_response(self) -> Response {
        match self {
            Self::Data(data) => Json(data).into_response(),
            Self::Redirect(redirect) => redirect.into_response(),
        }
    }
}
