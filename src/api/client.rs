use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE, COOKIE};
use reqwest::{Method, RequestBuilder};
use serde::{Deserialize, Serialize};

use crate::config::Settings;
use crate::error::{ClientError, Result};

/// Header the server reads the anti-forgery token from (`X-CSRFToken`)
const CSRF_HEADER: HeaderName = HeaderName::from_static("x-csrftoken");

/// One entry of the unread-notifications listing. Only presence matters to
/// the client, so every field is optional.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnreadNotification {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub read: Option<bool>,
}

/// Read side of the notification REST API
#[async_trait]
pub trait NotificationsApi: Send + Sync {
    /// Notifications the user has not read yet
    async fn unread_notifications(&self, user_id: &str) -> Result<Vec<UnreadNotification>>;
}

/// HTTP client authenticated with the page's existing session
#[derive(Clone)]
pub struct RestClient {
    http: reqwest::Client,
    base_url: String,
    csrf_token: String,
    session_cookie: String,
}

impl RestClient {
    pub fn new(
        base_url: impl Into<String>,
        csrf_token: impl Into<String>,
        session_cookie: impl Into<String>,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            csrf_token: csrf_token.into(),
            session_cookie: session_cookie.into(),
        })
    }

    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Self::new(
            settings.api_base(),
            settings.session.csrf_token.clone(),
            settings.session.session_cookie.clone(),
        )
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Session headers every request carries. `Content-Type` is only
    /// declared when there is a body.
    fn session_headers(&self, has_body: bool) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Ok(token) = HeaderValue::from_str(&self.csrf_token) {
            headers.insert(CSRF_HEADER, token);
        }
        if !self.session_cookie.is_empty() {
            if let Ok(cookie) = HeaderValue::from_str(&format!("sessionid={}", self.session_cookie)) {
                headers.insert(COOKIE, cookie);
            }
        }
        if has_body {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        }
        headers
    }

    fn request(&self, method: Method, path: &str, has_body: bool) -> RequestBuilder {
        self.http
            .request(method, self.url(path))
            .headers(self.session_headers(has_body))
    }
}

#[async_trait]
impl NotificationsApi for RestClient {
    #[tracing::instrument(name = "api.unread_notifications", skip(self))]
    async fn unread_notifications(&self, user_id: &str) -> Result<Vec<UnreadNotification>> {
        let path = format!("/api/get_notifications/{}/", user_id);
        let response = self.request(Method::GET, &path, false).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::from_response(status.as_u16(), &body));
        }

        Ok(response.json::<Vec<UnreadNotification>>().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_headers_without_body() {
        let client = RestClient::new("https://school.example/", "tok123", "abc").unwrap();
        let headers = client.session_headers(false);

        assert_eq!(headers.get(&CSRF_HEADER).unwrap(), "tok123");
        assert_eq!(headers.get(COOKIE).unwrap(), "sessionid=abc");
        assert!(headers.get(CONTENT_TYPE).is_none());
    }

    #[test]
    fn test_session_headers_with_body() {
        let client = RestClient::new("https://school.example", "tok123", "").unwrap();
        let headers = client.session_headers(true);

        assert_eq!(headers.get(CONTENT_TYPE).unwrap(), "application/json");
        assert!(headers.get(COOKIE).is_none());
    }

    #[test]
    fn test_url_joins_base_and_path() {
        let client = RestClient::new("https://school.example/", "", "").unwrap();
        assert_eq!(
            client.url("/api/get_notifications/7/"),
            "https://school.example/api/get_notifications/7/"
        );
    }

    #[test]
    fn test_unread_notification_is_lenient() {
        let list: Vec<UnreadNotification> = serde_json::from_str(
            r#"[{"notification_id": 3, "title": "New Enrollment", "message": "x", "read": false}, {}]"#,
        )
        .unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].title.as_deref(), Some("New Enrollment"));
        assert_eq!(list[1], UnreadNotification { title: None, message: None, read: None });
    }

    #[test]
    fn test_unreachable_server_is_request_error() {
        let client = RestClient::new("http://127.0.0.1:1", "", "").unwrap();
        let result = tokio_test::block_on(client.unread_notifications("7"));

        match result {
            Err(ClientError::Request { status, field, .. }) => {
                assert!(status.is_none());
                assert!(field.is_none());
            }
            other => panic!("expected request error, got {:?}", other),
        }
    }
}
