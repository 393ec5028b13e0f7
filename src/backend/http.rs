use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use secrecy::{ExposeSecret as _, SecretString};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use snafu::ResultExt as _;
use tracing::instrument;
use url::Url;

use super::*;

/// [Backend] over the hosted service's REST API.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    base: Url,
}

impl HttpBackend {
    pub fn new(mut base: Url) -> Self {
        // `Url::join` replaces the last segment unless the path ends with a slash
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        Self {
            client: reqwest::Client::new(),
            base,
        }
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    fn endpoint(&self, collection: &str, action: &str) -> Result<Url> {
        self.base
            .join(&format!("api/collections/{collection}/{action}"))
            .context(EndpointSnafu { collection })
    }
}

/// Query parameters understood by the records endpoint.
fn list_params(page: u32, per_page: u32, query: &ListQuery) -> Vec<(&'static str, String)> {
    let mut params = vec![("page", page.to_string()), ("perPage", per_page.to_string())];

    if let Some(filter) = query
        .filter
        .as_ref()
        .and_then(Filter::to_expression)
        .filter(|expression| !expression.is_empty())
    {
        params.push(("filter", filter));
    }
    if let Some(sort) = &query.sort {
        params.push(("sort", sort.to_expression()));
    }
    if let Some(expand) = &query.expand {
        params.push(("expand", expand.clone()));
    }
    if let Some(fields) = &query.fields {
        params.push(("fields", fields.clone()));
    }
    if query.skip_total {
        params.push(("skipTotal", "1".to_string()));
    }

    params
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
}

async fn read<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let status = response.status();

    if !status.is_success() {
        let message = match response.json::<ErrorBody>().await {
            Ok(body) if !body.message.is_empty() => body.message,
            _ => status.canonical_reason().unwrap_or("unknown error").to_string(),
        };

        return StatusSnafu {
            status: status.as_u16(),
            message,
        }
        .fail();
    }

    response.json().await.context(RequestSnafu)
}

#[async_trait]
impl Backend for HttpBackend {
    #[instrument(skip(self, query, session), fields(filter = ?query.filter))]
    async fn get_list(
        &self,
        collection: &str,
        page: u32,
        per_page: u32,
        query: &ListQuery,
        session: &Session,
    ) -> Result<ListResult> {
        if query.matches_nothing() {
            tracing::debug!("filter matches nothing, skipping request");
            return Ok(ListResult::empty(page, per_page));
        }
        if let Some(value) = query.filter.as_ref().and_then(Filter::unquotable_value) {
            return UnquotableFilterSnafu { value }.fail();
        }

        let url = self.endpoint(collection, "records")?;
        let mut request = self.client.get(url).query(&list_params(page, per_page, query));
        if let Some(token) = session.token() {
            request = request.header(AUTHORIZATION, token);
        }

        let response = request.send().await.context(RequestSnafu)?;
        read(response).await
    }

    #[instrument(skip(self, password))]
    async fn auth_with_password(
        &self,
        collection: &str,
        identity: &str,
        password: &SecretString,
    ) -> Result<AuthResponse> {
        let url = self.endpoint(collection, "auth-with-password")?;
        let body = json!({
            "identity": identity,
            "password": password.expose_secret(),
        });

        let response = self
            .client
            .post(url)
            .json(&body)
            .send()
            .await
            .context(RequestSnafu)?;
        read(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend(base: &str) -> HttpBackend {
        HttpBackend::new(Url::parse(base).unwrap())
    }

    #[test]
    fn endpoints_keep_base_path() {
        let root = backend("https://pley.pockethost.io");
        assert_eq!(
            root.endpoint("posts", "records").unwrap().as_str(),
            "https://pley.pockethost.io/api/collections/posts/records"
        );

        let nested = backend("http://localhost:8090/pb");
        assert_eq!(
            nested.endpoint("users", "auth-with-password").unwrap().as_str(),
            "http://localhost:8090/pb/api/collections/users/auth-with-password"
        );
    }

    #[test]
    fn list_params_include_only_what_is_set() {
        let bare = list_params(1, 10, &ListQuery::new());
        assert_eq!(bare, vec![("page", "1".to_string()), ("perPage", "10".to_string())]);

        let query = ListQuery::new()
            .filter(Filter::eq("creatorId", "u1"))
            .sort(Sort::descending("created"))
            .expand("creatorId")
            .fields("id,title");
        let params = list_params(2, 10, &query);

        assert!(params.contains(&("filter", r#"creatorId = "u1""#.to_string())));
        assert!(params.contains(&("sort", "-created".to_string())));
        assert!(params.contains(&("expand", "creatorId".to_string())));
        assert!(params.contains(&("fields", "id,title".to_string())));
        assert!(params.contains(&("page", "2".to_string())));
        assert!(params.iter().all(|(key, _)| *key != "skipTotal"));

        let walk = list_params(1, FULL_LIST_BATCH, &ListQuery::new().skip_total());
        assert!(walk.contains(&("skipTotal", "1".to_string())));
    }

    #[test]
    fn unrestricted_filter_is_omitted() {
        let params = list_params(1, 10, &ListQuery::new().filter(Filter::all([])));
        assert!(params.iter().all(|(key, _)| *key != "filter"));
    }

    #[tokio::test]
    async fn empty_filter_never_reaches_the_network() {
        // nothing listens here; a request would fail
        let backend = backend("http://127.0.0.1:9");
        let query = ListQuery::new().filter(Filter::any_of("postId", Vec::<String>::new()));

        let result = backend
            .get_list("turds", 1, 500, &query, &Session::default())
            .await
            .unwrap();
        assert!(result.items.is_empty());
    }

    #[tokio::test]
    async fn trailing_backslash_is_refused_before_sending() {
        let backend = backend("http://127.0.0.1:9");
        let query = ListQuery::new().filter(Filter::eq("title", r"path\"));

        let err = backend
            .get_list("posts", 1, 10, &query, &Session::default())
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::UnquotableFilter { ref value, .. } if value == r"path\"));
    }
}
