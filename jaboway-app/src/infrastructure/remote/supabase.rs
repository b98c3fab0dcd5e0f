use super::{AuthProvider, Order, Procedure, Query, RemoteError, RemoteStore, Table, NO_ROWS_CODE};
use crate::domain::AuthUser;
use async_trait::async_trait;
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use url::Url;

#[derive(Deserialize)]
struct PostgrestError {
    code: Option<String>,
    message: Option<String>,
}

/// PostgREST client for the hosted database.
///
/// Every request carries the configured key as both `apikey` and bearer, so
/// the key must be a service-role key. Row-level security never sees the end
/// user; the authorization checks in the application layer are the only gate.
pub struct SupabaseStore {
    http_client: reqwest::Client,
    base_url: Url,
    api_key: String,
}

impl SupabaseStore {
    pub fn new(base_url: Url, api_key: String) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            base_url,
            api_key,
        }
    }

    fn endpoint(&self, path: &str) -> Result<Url, RemoteError> {
        self.base_url
            .join(path)
            .map_err(|e| RemoteError::new(format!("URL tidak valid: {e}")))
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
    }

    fn representation(&self, request: RequestBuilder) -> RequestBuilder {
        self.authorized(request)
            .header("Prefer", "return=representation")
    }
}

async fn read_json(response: Response) -> Result<Value, RemoteError> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| RemoteError::new(e.to_string()))?;

    if !status.is_success() {
        tracing::error!("Supabase error: {} - {}", status, body);
        let parsed: Option<PostgrestError> = serde_json::from_str(&body).ok();
        return Err(match parsed {
            Some(PostgrestError {
                code: Some(code),
                message,
            }) => RemoteError::with_code(code, message.unwrap_or_else(|| status.to_string())),
            _ => RemoteError::new(format!("API error: {status}")),
        });
    }

    if body.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(&body).map_err(|e| RemoteError::new(e.to_string()))
}

fn single_row(value: Value, table: Table) -> Result<Value, RemoteError> {
    match value {
        Value::Array(rows) => rows.into_iter().next().ok_or_else(|| {
            RemoteError::with_code(NO_ROWS_CODE, format!("tidak ada baris {}", table.as_str()))
        }),
        row => Ok(row),
    }
}

fn transport(e: reqwest::Error) -> RemoteError {
    RemoteError::new(e.to_string())
}

#[async_trait]
impl RemoteStore for SupabaseStore {
    async fn select(&self, table: Table, query: Query) -> Result<Vec<Value>, RemoteError> {
        let mut url = self.endpoint(&format!("rest/v1/{}", table.as_str()))?;
        {
            let mut params = url.query_pairs_mut();
            params.append_pair("select", "*");
            for (column, value) in &query.eq {
                params.append_pair(column, &format!("eq.{value}"));
            }
            match query.order {
                Some(Order::Ascending(column)) => {
                    params.append_pair("order", &format!("{column}.asc"));
                }
                Some(Order::Descending(column)) => {
                    params.append_pair("order", &format!("{column}.desc"));
                }
                None => {}
            }
        }

        let response = self
            .authorized(self.http_client.get(url))
            .send()
            .await
            .map_err(transport)?;
        match read_json(response).await? {
            Value::Array(rows) => Ok(rows),
            Value::Null => Ok(Vec::new()),
            other => Ok(vec![other]),
        }
    }

    async fn insert(&self, table: Table, row: Value) -> Result<Value, RemoteError> {
        let url = self.endpoint(&format!("rest/v1/{}", table.as_str()))?;
        let response = self
            .representation(self.http_client.post(url))
            .json(&row)
            .send()
            .await
            .map_err(transport)?;
        single_row(read_json(response).await?, table)
    }

    async fn update(&self, table: Table, id: &str, patch: Value) -> Result<Value, RemoteError> {
        let mut url = self.endpoint(&format!("rest/v1/{}", table.as_str()))?;
        url.query_pairs_mut().append_pair("id", &format!("eq.{id}"));
        let response = self
            .representation(self.http_client.patch(url))
            .json(&patch)
            .send()
            .await
            .map_err(transport)?;
        single_row(read_json(response).await?, table)
    }

    async fn rpc(&self, procedure: Procedure, args: Value) -> Result<Value, RemoteError> {
        let url = self.endpoint(&format!("rest/v1/rpc/{}", procedure.name()))?;
        let response = self
            .authorized(self.http_client.post(url))
            .json(&args)
            .send()
            .await
            .map_err(transport)?;
        read_json(response).await
    }
}

#[derive(Deserialize)]
struct UserResponse {
    id: uuid::Uuid,
    email: Option<String>,
    #[serde(default)]
    user_metadata: UserMetadata,
}

#[derive(Deserialize, Default)]
struct UserMetadata {
    full_name: Option<String>,
}

/// Resolves access tokens through the hosted auth service.
pub struct SupabaseAuth {
    http_client: reqwest::Client,
    base_url: Url,
    api_key: String,
}

impl SupabaseAuth {
    pub fn new(base_url: Url, api_key: String) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            base_url,
            api_key,
        }
    }
}

#[async_trait]
impl AuthProvider for SupabaseAuth {
    async fn user_for_token(&self, access_token: &str) -> Result<Option<AuthUser>, RemoteError> {
        let url = self
            .base_url
            .join("auth/v1/user")
            .map_err(|e| RemoteError::new(format!("URL tidak valid: {e}")))?;
        let response = self
            .http_client
            .get(url)
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {access_token}"))
            .send()
            .await
            .map_err(transport)?;

        if matches!(
            response.status(),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN
        ) {
            return Ok(None);
        }
        let user: UserResponse = serde_json::from_value(read_json(response).await?)
            .map_err(|e| RemoteError::new(e.to_string()))?;
        Ok(Some(AuthUser {
            id: user.id,
            email: user.email,
            full_name: user.user_metadata.full_name,
        }))
    }
}
