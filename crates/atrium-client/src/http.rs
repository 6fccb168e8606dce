//! Authenticated HTTP client for the admin API
//!
//! Every request goes through [`HttpClient::execute`], which attaches the
//! bearer token, classifies the response and clears the session when the
//! backend rejects the token.

use crate::error::{ClientError, ClientResult, GENERIC_FAILURE};
use crate::session::SessionStore;
use atrium_core::config::ApiConfig;
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

/// Whose credentials a request runs under
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthScope {
    /// The stored session; a 401 expires it
    Session,
    /// Anonymous login/signup call; a 401 means bad credentials, not expiry
    LoginFlow,
}

/// HTTP client bound to a base URL and a session store
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    base_url: String,
    session: SessionStore,
}

impl HttpClient {
    /// Create a client from API configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(config: &ApiConfig, session: SessionStore) -> ClientResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim().trim_end_matches('/').to_string(),
            session,
        })
    }

    /// Session store this client reads the token from
    #[must_use]
    pub const fn session(&self) -> &SessionStore {
        &self.session
    }

    /// Base URL without a trailing slash
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL for an API path
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// `GET` a resource
    ///
    /// # Errors
    ///
    /// Returns the classified failure; see [`execute`](Self::execute).
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> ClientResult<T> {
        let builder = self.client.get(self.url(path)).query(query);
        self.execute(builder, &Method::GET, path, AuthScope::Session).await
    }

    /// Send a JSON body
    ///
    /// # Errors
    ///
    /// Returns the classified failure; see [`execute`](Self::execute).
    pub async fn send_json<B, T>(
        &self,
        method: Method,
        path: &str,
        body: &B,
        scope: AuthScope,
    ) -> ClientResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let builder = self.client.request(method.clone(), self.url(path)).json(body);
        self.execute(builder, &method, path, scope).await
    }

    /// Send a multipart body
    ///
    /// # Errors
    ///
    /// Returns the classified failure; see [`execute`](Self::execute).
    pub async fn send_multipart<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        form: reqwest::multipart::Form,
    ) -> ClientResult<T> {
        let builder = self.client.request(method.clone(), self.url(path)).multipart(form);
        self.execute(builder, &method, path, AuthScope::Session).await
    }

    /// Send a request without a body
    ///
    /// # Errors
    ///
    /// Returns the classified failure; see [`execute`](Self::execute).
    pub async fn send_empty<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
    ) -> ClientResult<T> {
        let builder = self.client.request(method.clone(), self.url(path));
        self.execute(builder, &method, path, AuthScope::Session).await
    }

    /// Attach credentials, send, and classify the response
    ///
    /// A 401 under [`AuthScope::Session`] clears the session that sent the
    /// request and broadcasts [`crate::SessionEvent::Expired`].
    ///
    /// # Errors
    ///
    /// - [`ClientError::Unauthenticated`] on 401
    /// - [`ClientError::Forbidden`] on 403
    /// - [`ClientError::NotFound`] on 404
    /// - [`ClientError::Api`] on any other non-success status
    /// - [`ClientError::Network`] when no response arrived
    /// - [`ClientError::Decode`] when a success body has the wrong shape
    pub async fn execute<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
        method: &Method,
        path: &str,
        scope: AuthScope,
    ) -> ClientResult<T> {
        let token = match scope {
            AuthScope::Session => self.session.token(),
            AuthScope::LoginFlow => None,
        };
        let builder = match &token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        };

        let response = builder.send().await.map_err(|err| {
            warn!(%method, path, error = %err, "Request failed before a response");
            ClientError::Network(err)
        })?;
        let status = response.status();
        let body = response.bytes().await?;

        debug!(%method, path, status = status.as_u16(), bytes = body.len(), "API response");

        if status.is_success() {
            return Ok(decode_payload(&body)?);
        }

        let message = extract_message(&body);
        let error = classify(status, message);

        if status == StatusCode::UNAUTHORIZED
            && let Some(token) = token
            && self.session.expire(&token)
        {
            warn!(%method, path, "Session expired");
        }

        Err(error)
    }
}

fn classify(status: StatusCode, message: Option<String>) -> ClientError {
    match status {
        StatusCode::UNAUTHORIZED => ClientError::Unauthenticated {
            message: message
                .unwrap_or_else(|| "Your session has expired. Please log in again.".to_string()),
        },
        StatusCode::FORBIDDEN => ClientError::Forbidden {
            message: message
                .unwrap_or_else(|| "You do not have permission to perform this action.".to_string()),
        },
        StatusCode::NOT_FOUND => ClientError::NotFound {
            message: message.unwrap_or_else(|| "The requested resource was not found.".to_string()),
        },
        other => ClientError::Api {
            status: other.as_u16(),
            message: message.unwrap_or_else(|| GENERIC_FAILURE.to_string()),
        },
    }
}

/// Decode a success body, bare or wrapped in `{"data": ...}`
///
/// An object carrying a record id (`_id` or `id`) is a bare record unless it
/// also has a `success` flag; its own `data` field is then never unwrapped.
/// An empty body decodes as JSON `null`.
///
/// # Errors
///
/// Returns an error if neither shape matches `T`.
pub fn decode_payload<T: DeserializeOwned>(body: &[u8]) -> Result<T, serde_json::Error> {
    let value: Value = if body.iter().all(u8::is_ascii_whitespace) {
        Value::Null
    } else {
        serde_json::from_slice(body)?
    };

    if let Value::Object(map) = &value
        && is_envelope(map)
        && let Some(data) = map.get("data")
        && let Ok(inner) = T::deserialize(data)
    {
        return Ok(inner);
    }

    serde_json::from_value(value)
}

fn is_envelope(map: &serde_json::Map<String, Value>) -> bool {
    map.contains_key("success") || !(map.contains_key("_id") || map.contains_key("id"))
}

/// Human readable message from an error body, if the server sent one
///
/// Looks at `message`, then `error` (a string or an object with its own
/// `message`).
#[must_use]
pub fn extract_message(body: &[u8]) -> Option<String> {
    let value: Value = serde_json::from_slice(body).ok()?;

    let candidate = value
        .get("message")
        .and_then(Value::as_str)
        .or_else(|| match value.get("error")? {
            Value::String(text) => Some(text.as_str()),
            Value::Object(inner) => inner.get("message").and_then(Value::as_str),
            _ => None,
        })?;

    let trimmed = candidate.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

#[cfg(test)]
#[allow(clippy::missing_panics_doc, clippy::unwrap_used)]
mod tests {
    use super::*;
    use atrium_core::Event;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use serde_json::json;

    #[test]
    fn test_decode_bare_and_wrapped() {
        let bare: Vec<Event> = decode_payload(br#"[{"_id":"1","title":"A"}]"#).unwrap();
        let wrapped: Vec<Event> =
            decode_payload(br#"{"success":true,"data":[{"_id":"1","title":"A"}]}"#).unwrap();
        assert_eq!(bare, wrapped);
        assert_eq!(bare.len(), 1);
    }

    #[test]
    fn test_decode_object_with_unrelated_data_field() {
        let value: Value = decode_payload(br#"{"data":1,"title":"x"}"#).unwrap();
        assert_eq!(value, json!(1));

        let event: Event = decode_payload(br#"{"_id":"7","title":"x","data":"note"}"#).unwrap();
        assert_eq!(event.id, "7");
    }

    #[test]
    fn test_record_with_object_data_field_is_not_unwrapped() {
        let body = br#"{"_id":"7","title":"Outer","data":{"title":"Inner"}}"#;
        let event: Event = decode_payload(body).unwrap();
        assert_eq!(event.id, "7");
        assert_eq!(event.title, "Outer");

        let value: Value = decode_payload(body).unwrap();
        assert_eq!(value.get("title"), Some(&json!("Outer")));

        let wrapped: Event =
            decode_payload(br#"{"success":true,"_id":"x","data":{"_id":"8","title":"Inner"}}"#)
                .unwrap();
        assert_eq!(wrapped.id, "8");
    }

    #[test]
    fn test_empty_body_is_null() {
        let value: Value = decode_payload(b"").unwrap();
        assert_eq!(value, Value::Null);
        let unit: Option<Event> = decode_payload(b"  \n").unwrap();
        assert_eq!(unit, None);
    }

    #[rstest]
    #[case(br#"{"message":"Slug already exists"}"#.as_slice(), Some("Slug already exists"))]
    #[case(br#"{"error":"Invalid token"}"#.as_slice(), Some("Invalid token"))]
    #[case(br#"{"error":{"message":"Nested"}}"#.as_slice(), Some("Nested"))]
    #[case(br#"{"message":"  "}"#.as_slice(), None)]
    #[case(b"<html>502 Bad Gateway</html>".as_slice(), None)]
    #[case(b"".as_slice(), None)]
    fn test_extract_message(#[case] body: &[u8], #[case] expected: Option<&str>) {
        assert_eq!(extract_message(body).as_deref(), expected);
    }

    #[test]
    fn test_classify_falls_back_to_generic_text() {
        let err = classify(StatusCode::INTERNAL_SERVER_ERROR, None);
        assert_eq!(err.user_message(), GENERIC_FAILURE);
        assert_eq!(err.status(), Some(500));

        let err = classify(StatusCode::FORBIDDEN, Some("Admins only".into()));
        assert!(matches!(err, ClientError::Forbidden { .. }));
    }

    #[test]
    fn test_url_joining() {
        let config = ApiConfig {
            base_url: "http://localhost:5000/api/".to_string(),
            ..ApiConfig::default()
        };
        let client = HttpClient::new(&config, SessionStore::in_memory()).unwrap();
        assert_eq!(client.url("/events"), "http://localhost:5000/api/events");
        assert_eq!(client.url("events/soft/1"), "http://localhost:5000/api/events/soft/1");
    }
}
