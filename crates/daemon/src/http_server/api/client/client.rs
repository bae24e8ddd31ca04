use bytes::Bytes;
use reqwest::{header::HeaderMap, header::HeaderValue, Client, RequestBuilder};
use url::Url;

use super::error::ApiError;
use super::ApiRequest;

#[derive(Debug, Clone)]
pub struct ApiClient {
    pub remote: Url,
    client: Client,
}

impl ApiClient {
    pub fn new(remote: &Url) -> Result<Self, ApiError> {
        let mut default_headers = HeaderMap::new();
        default_headers.insert("Accept", HeaderValue::from_static("application/json"));
        let client = Client::builder().default_headers(default_headers).build()?;

        Ok(Self {
            remote: remote.clone(),
            client,
        })
    }

    pub async fn call<T: ApiRequest>(&self, request: T) -> Result<T::Response, ApiError> {
        let response = Self::send(request.build_request(&self.remote, &self.client)).await?;
        Ok(response.json::<T::Response>().await?)
    }

    /// Like [`ApiClient::call`] but returns the raw body.
    pub async fn call_raw(&self, request_builder: RequestBuilder) -> Result<Bytes, ApiError> {
        let response = Self::send(request_builder).await?;
        Ok(response.bytes().await?)
    }

    async fn send(request_builder: RequestBuilder) -> Result<reqwest::Response, ApiError> {
        let response = request_builder.send().await?;

        if response.status().is_success() {
            Ok(response)
        } else {
            Err(ApiError::HttpStatus(
                response.status(),
                response.text().await?,
            ))
        }
    }

    /// Get the base URL for API requests
    pub fn base_url(&self) -> &Url {
        &self.remote
    }

    /// Get the underlying HTTP client for custom requests
    pub fn http_client(&self) -> &Client {
        &self.client
    }
}
