use snafu::{Location, Snafu};

pub type Result<T, E = BackendError> = std::result::Result<T, E>;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum BackendError {
    #[snafu(display("cannot build the endpoint for collection `{collection}`: {source}"))]
    Endpoint {
        collection: String,
        source: url::ParseError,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("failed to reach the backend: {source}"))]
    Request {
        source: reqwest::Error,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("filter value `{value}` ends with a backslash and cannot be quoted"))]
    UnquotableFilter {
        value: String,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("backend answered with status {status}: {message}"))]
    Status {
        status: u16,
        message: String,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("failed to decode records of collection `{collection}`: {source}"))]
    Decode {
        collection: String,
        source: serde_json::Error,
        #[snafu(implicit)]
        location: Location,
    },
}

impl BackendError {
    /// Whether the backend refused the credentials or token rather than failing.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Status { status: 400 | 401 | 403, .. })
    }
}
