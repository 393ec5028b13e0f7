use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use snafu::{Location, Snafu};

use crate::backend::BackendError;
use crate::session::SessionError;

#[derive(Debug, Snafu, Serialize)]
#[snafu(visibility(pub(crate)))]
#[serde(tag = "error", content = "data")]
pub enum ApiError {
    #[snafu(display("failed to load `{route}`"))]
    Load {
        route: String,

        #[serde(skip)]
        source: BackendError,

        #[serde(skip)]
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("invalid login for '{identity}'"))]
    SignIn {
        identity: String,

        #[serde(skip)]
        source: BackendError,

        #[serde(skip)]
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("failed to write the session cookie"))]
    Cookie {
        #[serde(skip)]
        source: SessionError,

        #[serde(skip)]
        #[snafu(implicit)]
        location: Location,
    },
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::SignIn { source, .. } if source.is_unauthorized() => StatusCode::UNAUTHORIZED,
            Self::Load { .. } | Self::SignIn { .. } => StatusCode::BAD_GATEWAY,
            Self::Cookie { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    message: String,
    #[serde(flatten)]
    data: ApiError,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            Self::Load { source, location, .. } | Self::SignIn { source, location, .. } => {
                tracing::warn!(%location, error = %source, "{self}");
            }
            Self::Cookie { source, location } => {
                tracing::error!(%location, error = %source, "{self}");
            }
        }

        let content = ErrorResponse {
            message: self.to_string(),
            data: self,
        };

        (status, Json(content)).into_response()
    }
}
