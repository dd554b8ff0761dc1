//! HTTP client for the hosted auth and row APIs.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::ChatError;
use crate::query::{Filter, Order};
use crate::types::Profile;

/// An authenticated session.
#[derive(Debug, Clone)]
pub struct Session {
    pub access_token: String,
    pub user_id: String,
    pub email: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    user: TokenUser,
}

#[derive(Debug, Deserialize)]
struct TokenUser {
    id: String,
    #[serde(default)]
    email: String,
}

/// Client for the row API. All list/insert/update/delete calls take
/// structured [`Filter`] values; rendering to the wire form happens in one
/// place and caller data is always escaped.
pub struct RestClient {
    http: reqwest::Client,
    base_url: String,
    anon_key: String,
    session: Option<Session>,
}

impl RestClient {
    pub fn new(base_url: &str, anon_key: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key: anon_key.to_string(),
            session: None,
        }
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn user_id(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.user_id.as_str())
    }

    fn bearer(&self) -> &str {
        self.session
            .as_ref()
            .map(|s| s.access_token.as_str())
            .unwrap_or(&self.anon_key)
    }

    fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.base_url, path)
    }

    fn rest_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    /// Websocket endpoint for the realtime channel, derived from the base
    /// URL.
    pub fn realtime_url(&self) -> String {
        let ws_base = if let Some(rest) = self.base_url.strip_prefix("https://") {
            format!("wss://{}", rest)
        } else if let Some(rest) = self.base_url.strip_prefix("http://") {
            format!("ws://{}", rest)
        } else {
            self.base_url.clone()
        };
        format!("{}/realtime/v1", ws_base)
    }

    async fn finish(&self, response: reqwest::Response) -> Result<reqwest::Response, ChatError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN
        {
            return Err(ChatError::Unauthorized);
        }
        let body = response.text().await.unwrap_or_default();
        Err(ChatError::Backend(format!("{}: {}", status, body)))
    }

    // Auth

    pub async fn sign_in(&mut self, email: &str, password: &str) -> Result<Profile, ChatError> {
        let response = self
            .http
            .post(self.auth_url("token?grant_type=password"))
            .header("apikey", &self.anon_key)
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;
        let token: TokenResponse = self.finish(response).await?.json().await?;
        self.session = Some(Session {
            access_token: token.access_token,
            user_id: token.user.id,
            email: token.user.email,
        });
        self.own_profile().await
    }

    pub async fn sign_up(
        &mut self,
        email: &str,
        password: &str,
        full_name: &str,
    ) -> Result<Profile, ChatError> {
        let response = self
            .http
            .post(self.auth_url("signup"))
            .header("apikey", &self.anon_key)
            .json(&json!({
                "email": email,
                "password": password,
                "data": { "full_name": full_name },
            }))
            .send()
            .await?;
        let token: TokenResponse = self.finish(response).await?.json().await?;
        self.session = Some(Session {
            access_token: token.access_token,
            user_id: token.user.id,
            email: token.user.email,
        });
        self.own_profile().await
    }

    pub async fn sign_out(&mut self) -> Result<(), ChatError> {
        if self.session.is_some() {
            let response = self
                .http
                .post(self.auth_url("logout"))
                .header("apikey", &self.anon_key)
                .bearer_auth(self.bearer())
                .send()
                .await?;
            self.finish(response).await?;
        }
        self.session = None;
        Ok(())
    }

    async fn own_profile(&self) -> Result<Profile, ChatError> {
        let user_id = self
            .user_id()
            .ok_or_else(|| ChatError::Backend("no active session".into()))?
            .to_string();
        self.fetch_one("profiles", &Filter::eq("id", user_id))
            .await?
            .ok_or(ChatError::NotFound)
    }

    // Rows

    pub async fn list(
        &self,
        table: &str,
        filter: Option<&Filter>,
        order: Option<&Order>,
        limit: Option<usize>,
    ) -> Result<Vec<Value>, ChatError> {
        let mut request = self
            .http
            .get(self.rest_url(table))
            .header("apikey", &self.anon_key)
            .bearer_auth(self.bearer());
        if let Some(filter) = filter {
            request = request.query(&[("filter", filter.render())]);
        }
        if let Some(order) = order {
            request = request.query(&[("order", order.to_string())]);
        }
        if let Some(limit) = limit {
            request = request.query(&[("limit", limit.to_string())]);
        }
        let response = request.send().await?;
        Ok(self.finish(response).await?.json().await?)
    }

    pub async fn list_as<T: DeserializeOwned>(
        &self,
        table: &str,
        filter: Option<&Filter>,
        order: Option<&Order>,
        limit: Option<usize>,
    ) -> Result<Vec<T>, ChatError> {
        let rows = self.list(table, filter, order, limit).await?;
        rows.into_iter()
            .map(|row| {
                serde_json::from_value(row)
                    .map_err(|e| ChatError::Backend(format!("malformed {} row: {}", table, e)))
            })
            .collect()
    }

    pub async fn fetch_one<T: DeserializeOwned>(
        &self,
        table: &str,
        filter: &Filter,
    ) -> Result<Option<T>, ChatError> {
        let mut rows: Vec<T> = self.list_as(table, Some(filter), None, Some(1)).await?;
        Ok(rows.pop())
    }

    pub async fn insert(&self, table: &str, row: &Value) -> Result<Value, ChatError> {
        let response = self
            .http
            .post(self.rest_url(table))
            .header("apikey", &self.anon_key)
            .header("Prefer", "return=representation")
            .bearer_auth(self.bearer())
            .json(row)
            .send()
            .await?;
        let mut rows: Vec<Value> = self.finish(response).await?.json().await?;
        rows.pop()
            .ok_or_else(|| ChatError::Backend("insert returned no row".into()))
    }

    pub async fn update(
        &self,
        table: &str,
        filter: &Filter,
        patch: &Value,
    ) -> Result<(), ChatError> {
        let response = self
            .http
            .patch(self.rest_url(table))
            .header("apikey", &self.anon_key)
            .bearer_auth(self.bearer())
            .query(&[("filter", filter.render())])
            .json(patch)
            .send()
            .await?;
        self.finish(response).await?;
        Ok(())
    }

    pub async fn delete(&self, table: &str, filter: &Filter) -> Result<(), ChatError> {
        let response = self
            .http
            .delete(self.rest_url(table))
            .header("apikey", &self.anon_key)
            .bearer_auth(self.bearer())
            .query(&[("filter", filter.render())])
            .send()
            .await?;
        self.finish(response).await?;
        Ok(())
    }

    /// Exact row count for `filter`, without fetching the rows.
    pub async fn count(&self, table: &str, filter: &Filter) -> Result<u64, ChatError> {
        let response = self
            .http
            .get(self.rest_url(table))
            .header("apikey", &self.anon_key)
            .header("Prefer", "count=exact")
            .header("Range", "0-0")
            .bearer_auth(self.bearer())
            .query(&[("filter", filter.render())])
            .send()
            .await?;
        let response = self.finish(response).await?;
        let header = response
            .headers()
            .get("content-range")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| ChatError::Backend("count response missing content-range".into()))?;
        parse_content_range(header)
            .ok_or_else(|| ChatError::Backend(format!("bad content-range: {}", header)))
    }
}

/// Pull the total out of a `Content-Range` header like `0-0/42` or `*/0`.
fn parse_content_range(header: &str) -> Option<u64> {
    header.rsplit('/').next()?.trim().parse().ok()
}
