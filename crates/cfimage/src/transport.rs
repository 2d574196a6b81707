//! HTTP transport used by the client
//!
//! The client only describes requests ([`ApiRequest`]) and interprets
//! responses ([`ApiResponse`]). Sending them is delegated to a [`Transport`],
//! which lets tests substitute an in-memory fake.

use crate::error::{ConfigError, Result};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Delete,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestBody {
    Empty,
    Multipart {
        field: String,
        file_name: String,
        bytes: Vec<u8>,
    },
}

/// Outbound request description
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiRequest {
    pub method: HttpMethod,
    pub url: String,
    /// Bearer token for the `Authorization` header
    pub bearer: Option<String>,
    pub body: RequestBody,
}

impl ApiRequest {
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            bearer: None,
            body: RequestBody::Empty,
        }
    }

    pub fn bearer(mut self, token: impl Into<String>) -> Self {
        self.bearer = Some(token.into());
        self
    }

    pub fn multipart(
        mut self,
        field: impl Into<String>,
        file_name: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        self.body = RequestBody::Multipart {
            field: field.into(),
            file_name: file_name.into(),
            bytes,
        };
        self
    }
}

/// Raw response. A non-2xx status is a valid response, not a transport error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
}

impl ApiResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Sends one request and returns its response
#[async_trait]
pub trait Transport: Send + Sync {
    /// Fails only when no response was received (connection, TLS, timeout)
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse>;
}

/// reqwest-backed transport
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> std::result::Result<Self, ConfigError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("cfimage/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse> {
        let mut builder = match request.method {
            HttpMethod::Get => self.client.get(&request.url),
            HttpMethod::Post => self.client.post(&request.url),
            HttpMethod::Delete => self.client.delete(&request.url),
        };

        if let Some(token) = &request.bearer {
            builder = builder.bearer_auth(token);
        }

        if let RequestBody::Multipart {
            field,
            file_name,
            bytes,
        } = request.body
        {
            let form = Form::new().part(field, Part::bytes(bytes).file_name(file_name));
            builder = builder.multipart(form);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;

        Ok(ApiResponse { status, body })
    }
}
