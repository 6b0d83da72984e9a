use anyhow::{anyhow, Result};
use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE},
    Client, Method,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, error};

use shared_config::AppConfig;

/// Thin PostgREST client. One row-scoped request per operation; the store's
/// per-row atomicity is the only concurrency control this service relies on.
pub struct SupabaseClient {
    client: Client,
    base_url: String,
    anon_key: String,
}

impl SupabaseClient {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.supabase_url.clone(),
            anon_key: config.supabase_anon_key.clone(),
        }
    }

    fn get_headers(&self, auth_token: Option<&str>, returning: bool) -> HeaderMap {
        let mut headers = HeaderMap::new();

        headers.insert("apikey", HeaderValue::from_str(&self.anon_key).unwrap());
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        if returning {
            headers.insert("Prefer", HeaderValue::from_static("return=representation"));
        }

        if let Some(token) = auth_token {
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
            );
        }

        headers
    }

    pub async fn request<T>(
        &self,
        method: Method,
        path: &str,
        auth_token: Option<&str>,
        body: Option<Value>,
    ) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        debug!("Making request to {}", url);

        // Writes ask PostgREST to echo the affected rows back.
        let returning = method == Method::POST || method == Method::PATCH;
        let headers = self.get_headers(auth_token, returning);

        let mut req = self.client.request(method, &url).headers(headers);

        if let Some(body_data) = body {
            req = req.json(&body_data);
        }

        let response = req.send().await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await?;
            error!("API error ({}): {}", status, error_text);

            return Err(match status.as_u16() {
                401 | 403 => anyhow!("Authentication error: {}", error_text),
                404 => anyhow!("Resource not found: {}", error_text),
                _ => anyhow!("API error ({}): {}", status, error_text),
            });
        }

        let data = response.json::<T>().await?;
        Ok(data)
    }

    /// Select rows from `table` with a raw PostgREST filter string.
    pub async fn select<T>(&self, table: &str, filter: &str, auth_token: &str) -> Result<Vec<T>>
    where
        T: DeserializeOwned,
    {
        let path = format!("/rest/v1/{}?{}", table, filter);
        self.request(Method::GET, &path, Some(auth_token), None).await
    }

    /// Insert one row and return it as stored.
    pub async fn insert<T>(&self, table: &str, row: Value, auth_token: &str) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let path = format!("/rest/v1/{}", table);
        let mut rows: Vec<T> = self
            .request(Method::POST, &path, Some(auth_token), Some(row))
            .await?;

        rows.pop()
            .ok_or_else(|| anyhow!("Insert into {} returned no rows", table))
    }

    /// Patch the row matching `id` and return the updated representation.
    pub async fn update_by_id<T>(
        &self,
        table: &str,
        id: &str,
        patch: Value,
        auth_token: &str,
    ) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let path = format!("/rest/v1/{}?id=eq.{}", table, id);
        let mut rows: Vec<T> = self
            .request(Method::PATCH, &path, Some(auth_token), Some(patch))
            .await?;

        rows.pop()
            .ok_or_else(|| anyhow!("Update of {} {} matched no rows", table, id))
    }

    pub fn get_base_url(&self) -> &str {
        &self.base_url
    }
}
