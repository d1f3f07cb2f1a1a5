use crate::config::Config;
use crate::http_client::HttpClient;
use crate::registry::register_body;
use crate::resource_server::ResourceServer;
use crate::types::{
    RegistrationRequest, RemoteProfile, TokenGrantType, TokenRequestParameters, TokenResponse,
};
use http::{header, Method, Request, StatusCode};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("token endpoint returned {0}: {1}")]
    TokenExchange(StatusCode, String),
    #[error("profile fetch returned {0}")]
    Profile(StatusCode),
    #[error(transparent)]
    Http(#[from] http::Error),
    #[error("http client error: {0}")]
    HttpClient(Box<dyn std::error::Error + Send + Sync + 'static>),
    #[error(transparent)]
    SerdeHtmlForm(#[from] serde_html_form::ser::Error),
    #[error(transparent)]
    SerdeJson(#[from] serde_json::Error),
}

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Serialize)]
struct TokenRequestPayload {
    client_id: String,
    client_secret: String,
    #[serde(flatten)]
    parameters: TokenRequestParameters,
    #[serde(flatten)]
    proof: RegistrationRequest,
}

/// Executes token operations against one registered pod.
pub struct ServerAgent<T>
where
    T: HttpClient + Send + Sync + 'static,
{
    config: Arc<Config>,
    server: ResourceServer,
    http_client: Arc<T>,
}

impl<T> ServerAgent<T>
where
    T: HttpClient + Send + Sync + 'static,
{
    pub fn new(config: Arc<Config>, server: ResourceServer, http_client: Arc<T>) -> Self {
        Self { config, server, http_client }
    }
    /// Exchanges an authorization code for a token. The body carries the
    /// standard code-grant fields plus the same self-signed proof fields sent
    /// at registration, so the pod can re-authenticate the application.
    pub async fn exchange_code(&self, code: &str, redirect_uri: &str) -> Result<TokenResponse> {
        let body = serde_html_form::to_string(TokenRequestPayload {
            client_id: self.server.client_id.clone(),
            client_secret: self.server.client_secret.clone(),
            parameters: TokenRequestParameters {
                grant_type: TokenGrantType::AuthorizationCode,
                code: code.into(),
                redirect_uri: redirect_uri.into(),
            },
            proof: register_body(&self.config, &self.server),
        })?;
        let request = Request::builder()
            .uri(self.server.token_endpoint(&self.config))
            .method(Method::POST)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(body.into_bytes())?;
        let response = self.http_client.send_http(request).await.map_err(Error::HttpClient)?;
        if response.status() != StatusCode::OK {
            return Err(Error::TokenExchange(
                response.status(),
                String::from_utf8_lossy(response.body()).into_owned(),
            ));
        }
        serde_json::from_slice(response.body()).map_err(|_| {
            Error::TokenExchange(
                response.status(),
                String::from_utf8_lossy(response.body()).into_owned(),
            )
        })
    }
    /// Fetches the remote user profile with a freshly issued access token.
    pub async fn fetch_profile(&self, access_token: &str) -> Result<RemoteProfile> {
        let request = Request::builder()
            .uri(format!("{}/me", self.server.api_route(&self.config)))
            .method(Method::GET)
            .header(header::AUTHORIZATION, format!("Bearer {access_token}"))
            .body(Vec::new())?;
        let response = self.http_client.send_http(request).await.map_err(Error::HttpClient)?;
        if response.status() != StatusCode::OK {
            return Err(Error::Profile(response.status()));
        }
        Ok(serde_json::from_slice(response.body())?)
    }
}
