//! JSON-over-HTTP plumbing shared by both service clients.

use std::time::Duration;

use reqwest::header::{ACCEPT, HeaderValue};
use reqwest::{Method, RequestBuilder, Response};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::instrument;
use url::Url;

use crate::error::{ApiError, Result};

/// A base URL plus a configured `reqwest::Client`.
///
/// Paths passed to the request methods are relative (`"api/products/3"`) and
/// are joined onto the base URL, which always ends in `/`.
pub(crate) struct HttpClient {
    client: reqwest::Client,
    base_url: Url,
    token: Option<SecretString>,
}

impl HttpClient {
    /// Build a client for one backend.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub(crate) fn new(
        base_url: Url,
        timeout: Option<Duration>,
        token: Option<SecretString>,
    ) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            base_url,
            token: token.filter(|t| !t.expose_secret().is_empty()),
        })
    }

    pub(crate) const fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder> {
        let url = self.base_url.join(path)?;
        let mut request = self
            .client
            .request(method, url)
            .header(ACCEPT, HeaderValue::from_static("application/json"));
        if let Some(token) = &self.token {
            request = request.bearer_auth(token.expose_secret());
        }
        Ok(request)
    }

    /// `GET path` and decode the JSON body.
    #[instrument(skip(self), fields(base = %self.base_url))]
    pub(crate) async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self.request(Method::GET, path)?.send().await?;
        decode(response).await
    }

    /// Send a JSON body and decode the JSON response.
    #[instrument(skip(self, body), fields(base = %self.base_url))]
    pub(crate) async fn send<B, T>(&self, method: Method, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.request(method, path)?.json(body).send().await?;
        decode(response).await
    }

    /// Send a JSON body and ignore whatever the server answers on success.
    #[instrument(skip(self, body), fields(base = %self.base_url))]
    pub(crate) async fn send_discarding<B>(&self, method: Method, path: &str, body: &B) -> Result<()>
    where
        B: Serialize + ?Sized,
    {
        let response = self.request(method, path)?.json(body).send().await?;
        check(response).await.map(drop)
    }

    /// `DELETE path`; any success status counts, the body is ignored.
    #[instrument(skip(self), fields(base = %self.base_url))]
    pub(crate) async fn delete(&self, path: &str) -> Result<()> {
        let response = self.request(Method::DELETE, path)?.send().await?;
        check(response).await.map(drop)
    }
}

/// Turn a non-success response into an [`ApiError`].
async fn check(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let err = ApiError::from_status(status, &body);
    tracing::warn!(status = status.as_u16(), error = %err, "Request failed");
    Err(err)
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
    let response = check(response).await?;
    let body = response.text().await?;
    serde_json::from_str(&body).map_err(|e| {
        tracing::warn!(error = %e, "Unexpected response body");
        ApiError::Decode(e)
    })
}

/// Percent-encode one path segment.
pub(crate) fn segment(raw: &str) -> String {
    url::form_urlencoded::byte_serialize(raw.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_segment_escapes_reserved_characters() {
        assert_eq!(segment("65a1b2"), "65a1b2");
        assert_eq!(segment("a/b c"), "a%2Fb%20c");
    }

    #[test]
    fn test_blank_token_is_dropped() {
        let base = Url::parse("http://localhost:5000/").unwrap();
        let client = HttpClient::new(base, None, Some(SecretString::from(""))).unwrap();
        assert!(client.token.is_none());
    }

    #[test]
    fn test_request_joins_base_url() {
        let base = Url::parse("http://localhost:8000/catalog/").unwrap();
        let client = HttpClient::new(base, None, None).unwrap();
        let request = client
            .request(Method::GET, "api/products/3")
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(
            request.url().as_str(),
            "http://localhost:8000/catalog/api/products/3"
        );
    }

    #[test]
    fn test_request_sends_bearer_token() {
        let base = Url::parse("http://localhost:5000/").unwrap();
        let client =
            HttpClient::new(base, None, Some(SecretString::from("tok-123".to_string()))).unwrap();
        let request = client
            .request(Method::GET, "api/users")
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(
            request.headers().get("authorization").unwrap(),
            "Bearer tok-123"
        );
    }
}
