use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE},
    Client, Method, Response,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error};

use shared_config::AppConfig;

/// Errors surfaced by the record store. Conflict and Unavailable are the two
/// kinds callers branch on: a Conflict is a uniqueness violation reported at
/// commit time, Unavailable is a transient infrastructure failure the caller
/// may retry.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Uniqueness conflict: {0}")]
    Conflict(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Malformed store response: {0}")]
    Decode(String),

    #[error("Store error ({status}): {message}")]
    Api { status: u16, message: String },
}

/// Generic record-store client over a PostgREST-compatible API.
///
/// Records live in tables addressed by name; filters use the PostgREST
/// operator syntax ("eq.", "neq.", ...). Uniqueness constraints declared on
/// the backing tables are enforced at commit time and reported as
/// `StoreError::Conflict`.
pub struct SupabaseStore {
    client: Client,
    base_url: String,
    anon_key: String,
}

impl SupabaseStore {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.store_url.clone(),
            anon_key: config.store_anon_key.clone(),
        }
    }

    /// Fetch all records of `table` matching `filters`, optionally ordered.
    pub async fn find<T>(
        &self,
        table: &str,
        filters: &[(&str, String)],
        order: Option<&str>,
        auth_token: Option<&str>,
    ) -> Result<Vec<T>, StoreError>
    where
        T: DeserializeOwned,
    {
        let path = Self::filter_path(table, filters, order);
        let response = self
            .send(Method::GET, &path, auth_token, None, false)
            .await?;

        response
            .json::<Vec<T>>()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))
    }

    /// Fetch at most one record of `table` matching `filters`.
    pub async fn find_one<T>(
        &self,
        table: &str,
        filters: &[(&str, String)],
        auth_token: Option<&str>,
    ) -> Result<Option<T>, StoreError>
    where
        T: DeserializeOwned,
    {
        let records = self.find(table, filters, None, auth_token).await?;
        Ok(records.into_iter().next())
    }

    /// Insert a record and return its stored representation. A uniqueness
    /// violation in the backing table surfaces as `StoreError::Conflict`.
    pub async fn create<T>(
        &self,
        table: &str,
        record: Value,
        auth_token: Option<&str>,
    ) -> Result<T, StoreError>
    where
        T: DeserializeOwned,
    {
        let path = format!("/rest/v1/{}", table);
        let response = self
            .send(Method::POST, &path, auth_token, Some(record), true)
            .await?;

        let mut created: Vec<T> = response
            .json()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))?;

        if created.is_empty() {
            return Err(StoreError::Decode(format!(
                "create on {} returned no representation",
                table
            )));
        }

        Ok(created.remove(0))
    }

    /// Patch all records matching `filters` and return their new
    /// representations. An empty result means no record matched.
    pub async fn update<T>(
        &self,
        table: &str,
        filters: &[(&str, String)],
        patch: Value,
        auth_token: Option<&str>,
    ) -> Result<Vec<T>, StoreError>
    where
        T: DeserializeOwned,
    {
        let path = Self::filter_path(table, filters, None);
        let response = self
            .send(Method::PATCH, &path, auth_token, Some(patch), true)
            .await?;

        response
            .json::<Vec<T>>()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))
    }

    /// Delete all records matching `filters`, returning how many were
    /// removed.
    pub async fn delete_many(
        &self,
        table: &str,
        filters: &[(&str, String)],
        auth_token: Option<&str>,
    ) -> Result<u64, StoreError> {
        let path = Self::filter_path(table, filters, None);
        let response = self
            .send(Method::DELETE, &path, auth_token, None, true)
            .await?;

        let deleted: Vec<Value> = response
            .json()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))?;

        Ok(deleted.len() as u64)
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        auth_token: Option<&str>,
        body: Option<Value>,
        representation: bool,
    ) -> Result<Response, StoreError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("Store request: {} {}", method, url);

        let mut req = self
            .client
            .request(method, &url)
            .headers(self.headers(auth_token, representation));

        if let Some(body_data) = body {
            req = req.json(&body_data);
        }

        let response = req
            .send()
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = response.text().await.unwrap_or_default();
        error!("Store error ({}): {}", status, message);

        Err(match status.as_u16() {
            401 | 403 => StoreError::Auth(message),
            404 => StoreError::NotFound(message),
            409 => StoreError::Conflict(message),
            s if s >= 500 => StoreError::Unavailable(message),
            s => StoreError::Api { status: s, message },
        })
    }

    fn headers(&self, auth_token: Option<&str>, representation: bool) -> HeaderMap {
        let mut headers = HeaderMap::new();

        headers.insert("apikey", HeaderValue::from_str(&self.anon_key).unwrap());
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        if representation {
            headers.insert("Prefer", HeaderValue::from_static("return=representation"));
        }

        // Anonymous requests fall back to the anon key alone.
        let bearer = auth_token.unwrap_or(&self.anon_key);
        if let Ok(value) = HeaderValue::from_str(&format!("Bearer {}", bearer)) {
            headers.insert(AUTHORIZATION, value);
        }

        headers
    }

    fn filter_path(table: &str, filters: &[(&str, String)], order: Option<&str>) -> String {
        let mut parts: Vec<String> = filters
            .iter()
            .map(|(column, value)| format!("{}={}", column, urlencoding::encode(value)))
            .collect();

        if let Some(order) = order {
            parts.push(format!("order={}", order));
        }

        if parts.is_empty() {
            format!("/rest/v1/{}", table)
        } else {
            format!("/rest/v1/{}?{}", table, parts.join("&"))
        }
    }
}
