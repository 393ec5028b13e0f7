//! The backend's collection query API.
//!
//! [Backend] is the seam between the route loaders and the hosted record store: [HttpBackend]
//! talks to the real service, tests use an in-memory implementation.

use async_trait::async_trait;
use derive_new::new;
use secrecy::SecretString;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use snafu::ResultExt as _;

use crate::filter::{Filter, Sort};
use crate::model::{Record, User};
use crate::session::Session;

pub use error::*;
pub use http::HttpBackend;

mod error;
mod http;

#[cfg(test)]
pub(crate) mod memory;

/// Page size used when walking a whole collection.
pub const FULL_LIST_BATCH: u32 = 500;

/// Options shared by the list endpoints.
#[derive(Debug, Clone, Default, PartialEq, Eq, new)]
pub struct ListQuery {
    #[new(default)]
    pub filter: Option<Filter>,
    #[new(default)]
    pub sort: Option<Sort>,
    #[new(default)]
    pub expand: Option<String>,
    #[new(default)]
    pub fields: Option<String>,
    /// Ask the backend not to count the matching records.
    #[new(default)]
    pub skip_total: bool,
}

impl ListQuery {
    pub fn filter(mut self, filter: Filter) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn sort(mut self, sort: Sort) -> Self {
        self.sort = Some(sort);
        self
    }

    pub fn expand(mut self, expand: impl Into<String>) -> Self {
        self.expand = Some(expand.into());
        self
    }

    pub fn fields(mut self, fields: impl Into<String>) -> Self {
        self.fields = Some(fields.into());
        self
    }

    pub fn skip_total(mut self) -> Self {
        self.skip_total = true;
        self
    }

    /// True when the filter can never match, so there is nothing to ask the backend for.
    pub fn matches_nothing(&self) -> bool {
        self.filter.as_ref().is_some_and(Filter::matches_nothing)
    }
}

/// One page of a collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListResult<T = Value> {
    pub page: u32,
    pub per_page: u32,
    pub total_items: i64,
    pub total_pages: i64,
    pub items: Vec<T>,
}

impl<T> ListResult<T> {
    pub fn empty(page: u32, per_page: u32) -> Self {
        Self {
            page,
            per_page,
            total_items: 0,
            total_pages: 0,
            items: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub record: User,
}

#[async_trait]
pub trait Backend: Send + Sync {
    /// Fetch one page of `collection`. Pages start at 1.
    async fn get_list(
        &self,
        collection: &str,
        page: u32,
        per_page: u32,
        query: &ListQuery,
        session: &Session,
    ) -> Result<ListResult>;

    /// Sign in against an auth collection.
    async fn auth_with_password(
        &self,
        collection: &str,
        identity: &str,
        password: &SecretString,
    ) -> Result<AuthResponse>;

    /// Fetch every record of `collection` matching `query`, one batch at a time.
    ///
    /// The walk stops at the first short batch, so the backend is never asked for totals.
    async fn get_full_list(
        &self,
        collection: &str,
        query: &ListQuery,
        session: &Session,
    ) -> Result<Vec<Value>> {
        let mut records = Vec::new();

        if query.matches_nothing() {
            return Ok(records);
        }

        let query = query.clone().skip_total();
        for page in 1.. {
            let ListResult { items, .. } = self
                .get_list(collection, page, FULL_LIST_BATCH, &query, session)
                .await?;

            let done = items.len() < FULL_LIST_BATCH as usize;
            records.extend(items);

            if done {
                break;
            }
        }

        Ok(records)
    }
}

/// Fetch one page of `T`'s collection.
pub async fn list<T>(
    backend: &dyn Backend,
    page: u32,
    per_page: u32,
    query: &ListQuery,
    session: &Session,
) -> Result<Vec<T>>
where
    T: Record + DeserializeOwned,
{
    if query.matches_nothing() {
        return Ok(Vec::new());
    }

    let result = backend
        .get_list(T::collection(), page, per_page, query, session)
        .await?;
    decode(result.items)
}

/// Fetch every record of `T`'s collection matching `query`.
pub async fn full_list<T>(backend: &dyn Backend, query: &ListQuery, session: &Session) -> Result<Vec<T>>
where
    T: Record + DeserializeOwned,
{
    if query.matches_nothing() {
        return Ok(Vec::new());
    }

    let items = backend
        .get_full_list(T::collection(), query, session)
        .await?;
    decode(items)
}

fn decode<T>(items: Vec<Value>) -> Result<Vec<T>>
where
    T: Record + DeserializeOwned,
{
    items
        .into_iter()
        .map(serde_json::from_value)
        .collect::<Result<Vec<T>, _>>()
        .context(DecodeSnafu {
            collection: T::collection(),
        })
}
