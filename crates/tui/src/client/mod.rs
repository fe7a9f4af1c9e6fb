use std::marker::PhantomData;

use api_types::{criteria::Criteria, page::Page};
use engine::{EngineError, Entity, Resource, ResultEngine};
use reqwest::{Method, RequestBuilder, Response, StatusCode, Url};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("server unreachable: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("{status}: {message}")]
    Status { status: StatusCode, message: String },
    #[error("invalid response body: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("invalid base_url: {0}")]
    Url(String),
}

impl From<ClientError> for EngineError {
    fn from(err: ClientError) -> Self {
        EngineError::request_failed(err)
    }
}

/// Error body of the API. Depending on the failing layer the text is in
/// `message` or in `error`.
#[derive(Debug, Deserialize)]
struct ErrorResponse {
    message: Option<String>,
    error: Option<String>,
}

#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone)]
pub struct Client {
    base_url: String,
    http: reqwest::Client,
    credentials: Option<Credentials>,
}

impl Client {
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        Url::parse(base_url).map_err(|err| ClientError::Url(format!("{base_url}: {err}")))?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
            credentials: None,
        })
    }

    /// Copy of this client authenticating as `credentials`.
    pub fn with_credentials(&self, credentials: Credentials) -> Self {
        Self {
            credentials: Some(credentials),
            ..self.clone()
        }
    }

    pub fn clear_credentials(&mut self) {
        self.credentials = None;
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn categories(&self) -> Collection<'_, api_types::category::Category> {
        Collection::new(self)
    }

    pub fn expenses(&self) -> Collection<'_, api_types::expense::Expense> {
        Collection::new(self)
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let req = self.http.request(method, self.url(path));
        match &self.credentials {
            Some(credentials) => {
                req.basic_auth(&credentials.username, Some(&credentials.password))
            }
            None => req,
        }
    }

    async fn send(&self, req: RequestBuilder) -> Result<Response, ClientError> {
        let res = req.send().await?;
        let status = res.status();
        tracing::debug!(url = %res.url(), %status, "response");
        if status.is_success() {
            return Ok(res);
        }

        let body = res.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorResponse>(&body)
            .ok()
            .and_then(|err| err.message.or(err.error))
            .or_else(|| (!body.trim().is_empty()).then(|| body.trim().to_string()))
            .unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("unknown error")
                    .to_string()
            });
        Err(ClientError::Status { status, message })
    }
}

/// One REST collection, named after the entity's plural label.
#[derive(Debug)]
pub struct Collection<'a, T> {
    client: &'a Client,
    _item: PhantomData<T>,
}

impl<'a, T> Collection<'a, T>
where
    T: Entity + DeserializeOwned,
    T::Upsert: Serialize,
{
    fn new(client: &'a Client) -> Self {
        Self {
            client,
            _item: PhantomData,
        }
    }

    /// `GET /{collection}` with paging and filters.
    pub async fn get_page(&self, criteria: &Criteria) -> Result<Page<T>, ClientError> {
        let req = self
            .client
            .request(Method::GET, T::PLURAL)
            .query(&criteria.query_pairs());
        let res = self.client.send(req).await?;
        Ok(res.json::<Page<T>>().await?)
    }

    /// `GET /v2/{collection}`: everything matching, no envelope.
    pub async fn get_all(&self, criteria: &Criteria) -> Result<Vec<T>, ClientError> {
        let req = self
            .client
            .request(Method::GET, &format!("v2/{}", T::PLURAL))
            .query(&criteria.filter_pairs());
        let res = self.client.send(req).await?;
        Ok(res.json::<Vec<T>>().await?)
    }

    /// `PUT /{collection}`. An empty success body yields `None`.
    pub async fn put(&self, body: &T::Upsert) -> Result<Option<T>, ClientError> {
        let req = self.client.request(Method::PUT, T::PLURAL).json(body);
        let res = self.client.send(req).await?;
        let bytes = res.bytes().await?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(None);
        }
        Ok(Some(serde_json::from_slice(&bytes)?))
    }

    /// `DELETE /{collection}/{id}`.
    pub async fn delete(&self, id: Uuid) -> Result<(), ClientError> {
        let req = self
            .client
            .request(Method::DELETE, &format!("{}/{id}", T::PLURAL));
        self.client.send(req).await?;
        Ok(())
    }
}

impl<T> Resource for Collection<'_, T>
where
    T: Entity + DeserializeOwned,
    T::Upsert: Serialize,
{
    type Item = T;

    async fn fetch_page(&self, criteria: &Criteria) -> ResultEngine<Page<T>> {
        Ok(self.get_page(criteria).await?)
    }

    async fn fetch_all(&self, criteria: &Criteria) -> ResultEngine<Vec<T>> {
        Ok(self.get_all(criteria).await?)
    }

    async fn upsert(&self, body: &T::Upsert) -> ResultEngine<Option<T>> {
        Ok(self.put(body).await?)
    }

    async fn delete_by_id(&self, id: Uuid) -> ResultEngine<()> {
        Ok(self.delete(id).await?)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use api_types::{
        Sort, YearMonth,
        category::{Category, CategoryUpsert},
        expense::ExpenseUpsert,
    };
    use axum::{
        Json, Router,
        extract::{Path, RawQuery, State},
        http::{HeaderMap, StatusCode},
        routing::{delete, get},
    };
    use chrono::NaiveDate;
    use serde_json::{Value, json};

    use super::*;

    /// Requests seen by the test server, as `"<METHOD> <path>?<query>"`.
    #[derive(Clone, Default)]
    struct Seen(Arc<Mutex<Vec<String>>>);

    impl Seen {
        fn push(&self, entry: String) {
            self.0.lock().unwrap().push(entry);
        }

        fn all(&self) -> Vec<String> {
            self.0.lock().unwrap().clone()
        }
    }

    async fn list_categories(
        State(seen): State<Seen>,
        headers: HeaderMap,
        RawQuery(query): RawQuery,
    ) -> Json<Value> {
        let auth = headers.contains_key("authorization");
        seen.push(format!(
            "GET categories?{} auth={auth}",
            query.unwrap_or_default()
        ));
        Json(json!({
            "content": [{ "id": "00000000-0000-0000-0000-000000000001", "name": "Food" }],
            "last": true
        }))
    }

    async fn all_categories(State(seen): State<Seen>, RawQuery(query): RawQuery) -> Json<Value> {
        seen.push(format!("GET v2/categories?{}", query.unwrap_or_default()));
        Json(json!([
            { "id": "00000000-0000-0000-0000-000000000001", "name": "Food" },
            { "id": "00000000-0000-0000-0000-000000000002", "name": "Rent" }
        ]))
    }

    async fn put_category(State(seen): State<Seen>, Json(body): Json<Value>) -> Json<Value> {
        seen.push(format!("PUT categories {body}"));
        Json(json!({ "id": "00000000-0000-0000-0000-000000000009", "name": body["name"] }))
    }

    async fn put_expense(State(seen): State<Seen>, Json(body): Json<Value>) -> StatusCode {
        seen.push(format!("PUT expenses {body}"));
        StatusCode::OK
    }

    async fn delete_category(State(seen): State<Seen>, Path(id): Path<String>) -> StatusCode {
        seen.push(format!("DELETE categories/{id}"));
        StatusCode::NO_CONTENT
    }

    async fn failing_expenses() -> (StatusCode, Json<Value>) {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "message": "database down" })),
        )
    }

    async fn spawn_server(seen: Seen) -> String {
        let router = Router::new()
            .route("/api/categories", get(list_categories).put(put_category))
            .route("/api/categories/{id}", delete(delete_category))
            .route("/api/v2/categories", get(all_categories))
            .route("/api/expenses", get(failing_expenses).put(put_expense))
            .with_state(seen);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}/api/")
    }

    fn credentials() -> Credentials {
        Credentials {
            username: "alice".to_string(),
            password: "secret".to_string(),
        }
    }

    #[tokio::test]
    async fn page_query_omits_blank_filters() {
        let seen = Seen::default();
        let client = Client::new(&spawn_server(seen.clone()).await).unwrap();

        let criteria = Criteria {
            name: Some(String::new()),
            ..Criteria::default()
        };
        let page = client.categories().fetch_page(&criteria).await.unwrap();

        assert!(page.last);
        assert_eq!(page.content[0].name, "Food");
        assert_eq!(
            seen.all(),
            ["GET categories?page=0&size=25&sort=name%2Casc auth=false"]
        );
    }

    #[tokio::test]
    async fn credentials_are_sent_as_basic_auth() {
        let seen = Seen::default();
        let client = Client::new(&spawn_server(seen.clone()).await)
            .unwrap()
            .with_credentials(credentials());

        client
            .categories()
            .fetch_page(&Criteria::with_size(1))
            .await
            .unwrap();

        assert!(seen.all()[0].ends_with("auth=true"));
    }

    #[tokio::test]
    async fn fetch_all_uses_v2_without_paging() {
        let seen = Seen::default();
        let client = Client::new(&spawn_server(seen.clone()).await).unwrap();

        let criteria = Criteria {
            page: 3,
            sort: Sort::asc("name"),
            ..Criteria::default()
        };
        let all = client.categories().fetch_all(&criteria).await.unwrap();

        assert_eq!(all.len(), 2);
        assert_eq!(seen.all(), ["GET v2/categories?sort=name%2Casc"]);
    }

    #[tokio::test]
    async fn upsert_decodes_echoed_entity_or_empty_body() {
        let seen = Seen::default();
        let client = Client::new(&spawn_server(seen.clone()).await).unwrap();

        let stored = client
            .categories()
            .upsert(&CategoryUpsert {
                id: None,
                name: "Travel".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(
            stored,
            Some(Category {
                id: Some(Uuid::from_u128(9)),
                name: "Travel".to_string(),
            })
        );

        let stored = client
            .expenses()
            .upsert(&ExpenseUpsert {
                id: None,
                name: "Taxi".to_string(),
                amount: 20.0,
                date: NaiveDate::from_ymd_opt(2024, 2, 29).unwrap(),
                category_id: None,
            })
            .await
            .unwrap();
        assert_eq!(stored, None);

        let seen = seen.all();
        assert_eq!(seen[0], r#"PUT categories {"name":"Travel"}"#);
        assert!(seen[1].contains(r#""date":"2024-02-29""#));
    }

    #[tokio::test]
    async fn delete_targets_entity_path() {
        let seen = Seen::default();
        let client = Client::new(&spawn_server(seen.clone()).await).unwrap();

        client
            .categories()
            .delete_by_id(Uuid::from_u128(5))
            .await
            .unwrap();

        assert_eq!(
            seen.all(),
            ["DELETE categories/00000000-0000-0000-0000-000000000005"]
        );
    }

    #[tokio::test]
    async fn http_failure_becomes_request_failed() {
        let seen = Seen::default();
        let client = Client::new(&spawn_server(seen).await).unwrap();

        let criteria = Criteria {
            year_month: YearMonth::new(2024, 1),
            ..Criteria::default()
        };
        let err = client.expenses().fetch_page(&criteria).await.unwrap_err();

        assert!(matches!(err, EngineError::RequestFailed(_)));
        assert_eq!(
            err.to_string(),
            "request failed: 500 Internal Server Error: database down"
        );
    }

    #[tokio::test]
    async fn unreachable_server_becomes_request_failed() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = Client::new(&format!("http://{addr}/api")).unwrap();
        let err = client
            .categories()
            .fetch_page(&Criteria::default())
            .await
            .unwrap_err();

        assert!(err.to_string().starts_with("request failed: server unreachable"));
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        assert!(matches!(
            Client::new("not a url"),
            Err(ClientError::Url(_))
        ));
    }
}
