use reqwest::{
    Client,
    header::{HeaderMap, HeaderValue, CONTENT_TYPE, AUTHORIZATION},
    Method,
};
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::Value;
use tracing::{debug, error, warn};

use shared_config::AppConfig;

use crate::store::StoreError;

/// SQLSTATE codes PostgREST forwards for rejected writes that mean "slot taken".
const CONFLICT_SQLSTATES: [&str; 2] = [
    "23P01", // exclusion_violation
    "23505", // unique_violation
];

/// PostgREST error body.
#[derive(Debug, Deserialize)]
struct PostgrestError {
    code: Option<String>,
    message: Option<String>,
    details: Option<String>,
}

pub struct SupabaseClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl SupabaseClient {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.supabase_url.trim_end_matches('/').to_string(),
            api_key: config.store_api_key().to_string(),
        }
    }

    fn get_headers(&self) -> Result<HeaderMap, StoreError> {
        let mut headers = HeaderMap::new();

        let api_key = HeaderValue::from_str(&self.api_key)
            .map_err(|_| StoreError::Configuration("API key is not a valid header value".to_string()))?;
        let bearer = HeaderValue::from_str(&format!("Bearer {}", self.api_key))
            .map_err(|_| StoreError::Configuration("API key is not a valid header value".to_string()))?;

        headers.insert("apikey", api_key);
        headers.insert(AUTHORIZATION, bearer);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        Ok(headers)
    }

    pub async fn request<T>(&self, method: Method, path: &str, body: Option<Value>) -> Result<T, StoreError>
    where
        T: DeserializeOwned,
    {
        self.request_with_headers(method, path, body, None).await
    }

    pub async fn request_with_headers<T>(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        extra_headers: Option<HeaderMap>,
    ) -> Result<T, StoreError>
    where
        T: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        debug!("Making {} request to {}", method, url);

        let mut headers = self.get_headers()?;
        if let Some(extra) = extra_headers {
            headers.extend(extra);
        }

        let mut req = self.client.request(method, &url).headers(headers);

        if let Some(body_data) = body {
            req = req.json(&body_data);
        }

        let response = req.send().await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await?;
            return Err(Self::map_error(status.as_u16(), &error_text));
        }

        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// `request_with_headers` asking PostgREST to return the written rows.
    pub async fn request_representation<T>(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<T, StoreError>
    where
        T: DeserializeOwned,
    {
        let mut headers = HeaderMap::new();
        headers.insert("Prefer", HeaderValue::from_static("return=representation"));
        self.request_with_headers(method, path, body, Some(headers)).await
    }

    fn map_error(status: u16, error_text: &str) -> StoreError {
        let parsed: Option<PostgrestError> = serde_json::from_str(error_text).ok();
        let code = parsed.as_ref().and_then(|e| e.code.clone());
        let message = parsed
            .as_ref()
            .and_then(|e| {
                e.message.clone().map(|message| match &e.details {
                    Some(details) => format!("{} ({})", message, details),
                    None => message,
                })
            })
            .unwrap_or_else(|| error_text.to_string());

        if code.as_deref().is_some_and(|c| CONFLICT_SQLSTATES.contains(&c)) {
            warn!("Store rejected write ({}): {}", code.as_deref().unwrap_or_default(), message);
            return StoreError::Conflict(message);
        }

        error!("API error ({}): {}", status, message);
        StoreError::Api { status, code, message }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exclusion_violation_maps_to_conflict() {
        let body = r#"{"code":"23P01","message":"conflicting key value violates exclusion constraint \"appointments_no_overlap\"","details":null,"hint":null}"#;
        match SupabaseClient::map_error(409, body) {
            StoreError::Conflict(message) => assert!(message.contains("appointments_no_overlap")),
            other => panic!("expected conflict, got {:?}", other),
        }
    }

    #[test]
    fn test_other_errors_keep_status_and_code() {
        let body = r#"{"code":"42P01","message":"relation does not exist","details":null,"hint":null}"#;
        match SupabaseClient::map_error(404, body) {
            StoreError::Api { status, code, .. } => {
                assert_eq!(status, 404);
                assert_eq!(code.as_deref(), Some("42P01"));
            }
            other => panic!("expected api error, got {:?}", other),
        }
    }

    #[test]
    fn test_unparseable_error_body_is_kept_verbatim() {
        match SupabaseClient::map_error(502, "Bad Gateway") {
            StoreError::Api { message, code, .. } => {
                assert_eq!(message, "Bad Gateway");
                assert!(code.is_none());
            }
            other => panic!("expected api error, got {:?}", other),
        }
    }
}
