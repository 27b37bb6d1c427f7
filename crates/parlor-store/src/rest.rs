use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde_json::Value;
use tracing::debug;

use crate::error::{Result, StoreError};
use crate::table::{Order, Select, TableBackend};

/// PostgREST-style table store reached over HTTPS.
///
/// Every request carries the access key both as `apikey` and as a bearer
/// token, which is what hosted PostgREST gateways expect.
pub struct RestBackend {
    client: Client,
    base_url: String,
    key: String,
}

impl RestBackend {
    /// `timeout` of `None` leaves requests unbounded.
    pub fn new(base_url: &str, key: &str, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            base_url: base_url.trim_end_matches('/').to_string(),
            key: key.to_string(),
        })
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request.header("apikey", &self.key).bearer_auth(&self.key)
    }
}

#[async_trait]
impl TableBackend for RestBackend {
    async fn select(&self, query: &Select) -> Result<Vec<Value>> {
        let params = query_params(query);
        debug!("select from {} {:?}", query.table(), params);

        let response = self
            .authorized(self.client.get(self.table_url(query.table())))
            .query(&params)
            .send()
            .await?;

        rows_from(query.table(), response).await
    }

    async fn insert(&self, table: &str, row: Value) -> Result<Vec<Value>> {
        debug!("insert into {}", table);

        let response = self
            .authorized(self.client.post(self.table_url(table)))
            .header("Prefer", "return=representation")
            .json(&row)
            .send()
            .await?;

        rows_from(table, response).await
    }
}

/// Translate a [`Select`] into PostgREST query parameters.
pub(crate) fn query_params(query: &Select) -> Vec<(String, String)> {
    let columns = query.column_names();
    let mut params = vec![(
        "select".to_string(),
        if columns.is_empty() { "*".to_string() } else { columns.join(",") },
    )];

    for (column, value) in query.filters() {
        params.push((column.clone(), filter_value(value)));
    }

    if let Some((column, order)) = query.ordering() {
        let direction = match order {
            Order::Ascending => "asc",
            Order::Descending => "desc",
        };
        params.push(("order".to_string(), format!("{column}.{direction}")));
    }

    params
}

fn filter_value(value: &Value) -> String {
    match value {
        Value::Null => "is.null".to_string(),
        Value::String(s) => format!("eq.{s}"),
        other => format!("eq.{other}"),
    }
}

async fn rows_from(table: &str, response: Response) -> Result<Vec<Value>> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(StoreError::Api {
            status: status.as_u16(),
            message: error_message(&body)
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown error").to_string()),
        });
    }

    // An insert without a representation comes back with an empty body.
    let body = response.bytes().await?;
    if body.is_empty() {
        return Ok(Vec::new());
    }

    let decode_error = |source: serde_json::Error| StoreError::Decode {
        table: table.to_string(),
        source,
    };
    match serde_json::from_slice::<Value>(&body).map_err(&decode_error)? {
        Value::Array(rows) => Ok(rows),
        row @ Value::Object(_) => Ok(vec![row]),
        other => Err(decode_error(<serde_json::Error as serde::de::Error>::custom(
            format!("expected rows, got {other}"),
        ))),
    }
}

/// PostgREST errors are `{ "message": ..., "code": ..., ... }`.
fn error_message(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }
    match serde_json::from_str::<Value>(trimmed) {
        Ok(json) => json
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string)
            .or_else(|| Some(trimmed.to_string())),
        Err(_) => Some(trimmed.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn backend(server: &MockServer) -> RestBackend {
        RestBackend::new(&format!("{}/", server.uri()), "service-key", None).unwrap()
    }

    #[test]
    fn params_cover_projection_filters_and_order() {
        let q = Select::from("meseges")
            .columns("meseg_id, meseg")
            .eq("chat_id", 0)
            .eq("username", "alice")
            .order("meseg_id", Order::Ascending);

        assert_eq!(
            query_params(&q),
            vec![
                ("select".to_string(), "meseg_id,meseg".to_string()),
                ("chat_id".to_string(), "eq.0".to_string()),
                ("username".to_string(), "eq.alice".to_string()),
                ("order".to_string(), "meseg_id.asc".to_string()),
            ]
        );
    }

    #[test]
    fn error_message_prefers_service_message() {
        let body = r#"{"code":"23505","message":"duplicate key value","details":null}"#;
        assert_eq!(error_message(body).as_deref(), Some("duplicate key value"));
        assert_eq!(error_message("gateway timeout").as_deref(), Some("gateway timeout"));
        assert_eq!(error_message("  "), None);
    }

    #[tokio::test]
    async fn select_sends_key_and_filters() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/users"))
            .and(query_param("select", "*"))
            .and(query_param("username", "eq.alice"))
            .and(header("apikey", "service-key"))
            .and(header("authorization", "Bearer service-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "user_id": 1, "username": "alice", "password_hash": "h" }
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let rows = backend(&server)
            .select(&Select::from("users").eq("username", "alice"))
            .await
            .unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["username"], "alice");
    }

    #[tokio::test]
    async fn insert_asks_for_representation() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/chats"))
            .and(header("prefer", "return=representation"))
            .and(body_json(json!({ "chat_id": 0, "name": "General chat" })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!([
                { "chat_id": 0, "name": "General chat" }
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let rows = backend(&server)
            .insert("chats", json!({ "chat_id": 0, "name": "General chat" }))
            .await
            .unwrap();

        assert_eq!(rows, vec![json!({ "chat_id": 0, "name": "General chat" })]);
    }

    #[tokio::test]
    async fn empty_insert_body_yields_no_rows() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/meseges"))
            .respond_with(ResponseTemplate::new(201))
            .mount(&server)
            .await;

        let rows = backend(&server)
            .insert("meseges", json!({ "sender": 1, "chat_id": 0, "meseg": "hi" }))
            .await
            .unwrap();

        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn conflict_is_reported_with_service_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/users"))
            .respond_with(ResponseTemplate::new(409).set_body_json(json!({
                "code": "23505",
                "message": "duplicate key value violates unique constraint"
            })))
            .mount(&server)
            .await;

        let err = backend(&server)
            .insert("users", json!({ "username": "alice", "password_hash": "h" }))
            .await
            .unwrap_err();

        assert!(err.is_conflict());
        assert_eq!(
            err.to_string(),
            "table store returned 409: duplicate key value violates unique constraint"
        );
    }

    #[tokio::test]
    async fn malformed_success_body_is_a_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/users"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>proxy page</html>"))
            .mount(&server)
            .await;

        let err = backend(&server).select(&Select::from("users")).await.unwrap_err();
        assert!(matches!(err, StoreError::Decode { ref table, .. } if table == "users"), "{err}");
    }

    #[tokio::test]
    async fn scalar_success_body_is_a_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/users"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!(42)))
            .mount(&server)
            .await;

        let err = backend(&server).select(&Select::from("users")).await.unwrap_err();
        assert!(matches!(err, StoreError::Decode { .. }), "{err}");
    }

    #[tokio::test]
    async fn server_error_without_body_uses_reason() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let err = backend(&server).select(&Select::from("users")).await.unwrap_err();
        match err {
            StoreError::Api { status, message } => {
                assert_eq!(status, 503);
                assert_eq!(message, "Service Unavailable");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
