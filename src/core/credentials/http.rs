//! Vault HTTP client.

use std::time::Duration;

use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::{Method, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::trace;
use zeroize::Zeroizing;

use super::vault::{VaultApi, VaultResponse};
use crate::error::{ProviderError, Result};

const TIMEOUT: Duration = Duration::from_secs(30);
const TOKEN_HEADER: &str = "X-Vault-Token";

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    errors: Vec<String>,
}

/// Blocking client for the Vault HTTP API (`/v1/...`).
pub struct HttpVault {
    client: Client,
    address: String,
    token: Option<Zeroizing<String>>,
}

impl HttpVault {
    /// Create an unauthenticated client for `address`.
    pub fn new(address: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(TIMEOUT)
            .build()
            .map_err(|e| ProviderError::Request(e.to_string()))?;

        Ok(Self {
            client,
            address: address.trim_end_matches('/').to_string(),
            token: None,
        })
    }

    #[cfg(test)]
    fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(Zeroizing::new(token.into()));
        self
    }

    /// Log in with an AppRole and keep the resulting client token.
    pub fn login(&mut self, role_id: &str, secret_id: &str) -> Result<()> {
        let path = "auth/approle/login";
        let body = json!({ "role_id": role_id, "secret_id": secret_id });

        let auth = self
            .write(path, &body)?
            .and_then(|response| response.auth)
            .ok_or_else(|| ProviderError::MissingField {
                path: path.to_string(),
                field: "auth",
            })?;

        self.token = Some(Zeroizing::new(auth.client_token));
        trace!("logged in to credential backend");
        Ok(())
    }

    /// Check `sys/health`; active (200) and standby (429) nodes are healthy.
    pub fn health(&self) -> Result<()> {
        let response = self.send(self.request(Method::GET, "sys/health"), "sys/health")?;
        match response.status().as_u16() {
            200 | 429 => Ok(()),
            status => Err(ProviderError::Unhealthy(status).into()),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/v1/{}", self.address, path.trim_start_matches('/'))
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.client.request(method, self.url(path));
        match &self.token {
            Some(token) => builder.header(TOKEN_HEADER, token.as_str()),
            None => builder,
        }
    }

    fn send(&self, builder: RequestBuilder, path: &str) -> Result<Response> {
        trace!(path, "credential backend request");
        builder
            .send()
            .map_err(|e| ProviderError::Request(e.to_string()).into())
    }

    /// Decode a response, mapping 404 to `None` when `missing_ok`.
    fn decode(&self, response: Response, path: &str, missing_ok: bool) -> Result<Option<VaultResponse>> {
        let status = response.status();
        trace!(path, status = status.as_u16(), "credential backend response");

        if status == StatusCode::NOT_FOUND && missing_ok {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(status_error(response, path));
        }

        let body = response
            .text()
            .map_err(|e| ProviderError::Request(e.to_string()))?;
        if body.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_str(&body)?))
    }

    fn expect_success(&self, response: Response, path: &str) -> Result<()> {
        if response.status().is_success() {
            Ok(())
        } else {
            Err(status_error(response, path))
        }
    }
}

fn status_error(response: Response, path: &str) -> crate::error::Error {
    let status = response.status().as_u16();
    let body = response.text().unwrap_or_default();
    let message = match serde_json::from_str::<ErrorBody>(&body) {
        Ok(parsed) if !parsed.errors.is_empty() => parsed.errors.join("; "),
        _ => body,
    };
    ProviderError::Status {
        status,
        path: path.to_string(),
        message,
    }
    .into()
}

impl VaultApi for HttpVault {
    fn read(&self, path: &str) -> Result<Option<VaultResponse>> {
        let response = self.send(self.request(Method::GET, path), path)?;
        self.decode(response, path, true)
    }

    fn write(&self, path: &str, data: &Value) -> Result<Option<VaultResponse>> {
        let response = self.send(self.request(Method::POST, path).json(data), path)?;
        self.decode(response, path, false)
    }

    fn list(&self, path: &str) -> Result<Option<VaultResponse>> {
        let builder = self
            .request(Method::GET, path)
            .query(&[("list", "true")]);
        let response = self.send(builder, path)?;
        self.decode(response, path, true)
    }

    fn delete(&self, path: &str) -> Result<()> {
        let response = self.send(self.request(Method::DELETE, path), path)?;
        self.expect_success(response, path)
    }

    fn put_policy(&self, name: &str, rules: &str) -> Result<()> {
        let path = format!("sys/policies/acl/{}", name);
        let builder = self
            .request(Method::PUT, &path)
            .json(&json!({ "policy": rules }));
        let response = self.send(builder, &path)?;
        self.expect_success(response, &path)
    }

    fn delete_policy(&self, name: &str) -> Result<()> {
        let path = format!("sys/policies/acl/{}", name);
        let response = self.send(self.request(Method::DELETE, &path), &path)?;
        self.expect_success(response, &path)
    }
}
