use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use secrecy::{ExposeSecret as _, SecretString};

use super::*;

/// A [Backend] over in-memory collections that counts the requests it serves.
#[derive(Debug, Default)]
pub(crate) struct MemoryBackend {
    collections: HashMap<String, Vec<Value>>,
    accounts: HashMap<String, (String, AuthResponse)>,
    requests: Mutex<HashMap<String, usize>>,
    queries: Mutex<HashMap<String, ListQuery>>,
}

impl MemoryBackend {
    pub(crate) fn with_records(mut self, collection: &str, records: impl IntoIterator<Item = Value>) -> Self {
        self.collections
            .entry(collection.to_string())
            .or_default()
            .extend(records);
        self
    }

    pub(crate) fn with_account(mut self, identity: &str, password: &str, auth: AuthResponse) -> Self {
        self.accounts
            .insert(identity.to_string(), (password.to_string(), auth));
        self
    }

    pub(crate) fn requests(&self, collection: &str) -> usize {
        let requests = self.requests.lock().unwrap();
        requests.get(collection).copied().unwrap_or_default()
    }

    pub(crate) fn last_query(&self, collection: &str) -> Option<ListQuery> {
        self.queries.lock().unwrap().get(collection).cloned()
    }
}

#[async_trait]
impl Backend for MemoryBackend {
    async fn get_list(
        &self,
        collection: &str,
        page: u32,
        per_page: u32,
        query: &ListQuery,
        _session: &Session,
    ) -> Result<ListResult> {
        *self
            .requests
            .lock()
            .unwrap()
            .entry(collection.to_string())
            .or_default() += 1;
        self.queries
            .lock()
            .unwrap()
            .insert(collection.to_string(), query.clone());

        let mut matching: Vec<Value> = self
            .collections
            .get(collection)
            .into_iter()
            .flatten()
            .filter(|record| query.filter.as_ref().map_or(true, |f| f.matches(record)))
            .cloned()
            .collect();

        if let Some(sort) = &query.sort {
            matching.sort_by(|a, b| sort.compare(a, b));
        }

        let (total_items, total_pages) = if query.skip_total {
            (-1, -1)
        } else {
            let total_items = matching.len() as i64;
            (total_items, (total_items + i64::from(per_page) - 1) / i64::from(per_page.max(1)))
        };
        let items = matching
            .into_iter()
            .skip((page.saturating_sub(1) * per_page) as usize)
            .take(per_page as usize)
            .collect();

        Ok(ListResult {
            page,
            per_page,
            total_items,
            total_pages,
            items,
        })
    }

    async fn auth_with_password(
        &self,
        _collection: &str,
        identity: &str,
        password: &SecretString,
    ) -> Result<AuthResponse> {
        match self.accounts.get(identity) {
            Some((expected, auth)) if expected == password.expose_secret() => Ok(auth.clone()),
            _ => StatusSnafu {
                status: 400u16,
                message: "Failed to authenticate.",
            }
            .fail(),
        }
    }
}
