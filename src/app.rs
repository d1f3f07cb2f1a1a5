use crate::config::{AppConfig, Config};
use crate::error::{Error, Result};
use crate::http_client::HttpClient;
use crate::manifest::Manifest;
use crate::registry::Registry;
use crate::server_agent::ServerAgent;
use crate::store::{AccessTokenStore, AccountStore, ResourceServerStore};
use crate::types::{
    AccessToken, AccountId, AuthorizationRequestParameters, AuthorizationResponseType,
    CallbackParams,
};
use chrono::{TimeDelta, Utc};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;

/// Path on the application host that pods redirect back to.
pub const CALLBACK_PATH: &str = "/auth/lygneo/callback";
/// Where the user lands once the authorization dance is over.
pub const LANDING_PATH: &str = "/";

#[derive(Serialize)]
struct CallbackQuery<'a> {
    lygneo_id: &'a str,
}

#[derive(Serialize)]
struct ErrorQuery<'a> {
    #[serde(rename = "lygneo-client-error")]
    message: &'a str,
}

/// Result of the authorize phase. Failures are folded into a redirect back to
/// the caller; this phase never raises past its boundary.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AuthorizeOutcome {
    /// Send the user to the pod's authorize endpoint.
    Redirect(String),
    /// Send the user back where they came from, with the diagnostic attached.
    ErrorRedirect(String),
}

impl AuthorizeOutcome {
    pub fn location(&self) -> &str {
        match self {
            Self::Redirect(url) | Self::ErrorRedirect(url) => url,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CallbackOutcome {
    /// The code exchange succeeded and a token is stored for `account`.
    TokenAcquired { account: AccountId, redirect: String },
    /// The pod rejected our credentials; a fresh registration was performed
    /// and the user should restart the flow with the same handle.
    Retry { redirect: String },
    /// The pod reported some other error; no token was created.
    Landing { redirect: String },
}

impl CallbackOutcome {
    pub fn redirect(&self) -> &str {
        match self {
            Self::TokenAcquired { redirect, .. }
            | Self::Retry { redirect }
            | Self::Landing { redirect } => redirect,
        }
    }
}

/// Drives the user-facing flow: handle → pod resolution → authorize redirect,
/// then the callback's code-for-token exchange, then revocation.
#[cfg(feature = "default-client")]
pub struct App<S, K, A, T = crate::http_client::default::DefaultHttpClient>
where
    S: ResourceServerStore,
    K: AccessTokenStore,
    A: AccountStore,
    T: HttpClient + Send + Sync + 'static,
{
    config: Arc<Config>,
    registry: Registry<S, T>,
    tokens: K,
    accounts: A,
    http_client: Arc<T>,
}

#[cfg(not(feature = "default-client"))]
pub struct App<S, K, A, T>
where
    S: ResourceServerStore,
    K: AccessTokenStore,
    A: AccountStore,
    T: HttpClient + Send + Sync + 'static,
{
    config: Arc<Config>,
    registry: Registry<S, T>,
    tokens: K,
    accounts: A,
    http_client: Arc<T>,
}

#[cfg(feature = "default-client")]
impl<S, K, A> App<S, K, A>
where
    S: ResourceServerStore + Send + Sync,
    K: AccessTokenStore + Send + Sync,
    A: AccountStore + Send + Sync,
{
    pub fn new(config: AppConfig, resource_servers: S, tokens: K, accounts: A) -> Result<Self> {
        Self::with_http_client(
            config,
            resource_servers,
            tokens,
            accounts,
            crate::http_client::default::DefaultHttpClient::default(),
        )
    }
}

impl<S, K, A, T> App<S, K, A, T>
where
    S: ResourceServerStore + Send + Sync,
    K: AccessTokenStore + Send + Sync,
    A: AccountStore + Send + Sync,
    T: HttpClient + Send + Sync + 'static,
{
    /// Validates the configuration and, outside test mode, checks that the
    /// published manifest still matches it. A mismatch is fatal here: the
    /// host must re-publish before serving requests.
    pub fn with_http_client(
        config: AppConfig,
        resource_servers: S,
        tokens: K,
        accounts: A,
        http_client: T,
    ) -> Result<Self> {
        let config: Config = config.try_into()?;
        if !config.test_mode {
            if let Some(path) = config.manifest_path.clone() {
                let published = std::fs::read_to_string(&path).unwrap_or_default();
                if !Manifest::from_config(&config).verify(&published, config.key()) {
                    return Err(Error::ManifestMismatch(path.display().to_string()));
                }
            }
        }
        let config = Arc::new(config);
        let http_client = Arc::new(http_client);
        Ok(Self {
            registry: Registry::new(config.clone(), resource_servers, http_client.clone()),
            config,
            tokens,
            accounts,
            http_client,
        })
    }
    /// Starts the flow for `lygneo_id`, registering its pod first if unknown.
    /// Every failure becomes an error redirect to `back_url`; this method
    /// never returns an `Err`.
    pub async fn authorize(&self, lygneo_id: &str, back_url: &str) -> AuthorizeOutcome {
        match self.authorize_url(lygneo_id.trim()).await {
            Ok(url) => AuthorizeOutcome::Redirect(url),
            Err(e) => AuthorizeOutcome::ErrorRedirect(error_redirect(back_url, &e.to_string())),
        }
    }
    async fn authorize_url(&self, lygneo_id: &str) -> Result<String> {
        let (uid, host) = split_handle(lygneo_id)?;
        let server = self.registry.resolve(host).await?;
        let parameters = AuthorizationRequestParameters {
            client_id: server.client_id.clone(),
            response_type: AuthorizationResponseType::Code,
            redirect_uri: self.redirect_uri(lygneo_id)?,
            scope: self.config.scope.clone(),
            uid: uid.into(),
        };
        Ok(format!(
            "{}?{}",
            server.authorize_endpoint(&self.config),
            serde_html_form::to_string(parameters)?
        ))
    }
    /// Completes (or restarts) the flow when the pod redirects back.
    pub async fn callback(&self, params: CallbackParams) -> Result<CallbackOutcome> {
        let lygneo_id = params.lygneo_id.trim();
        match params.error.as_deref() {
            None => {
                let Some(code) = params.code.as_deref() else {
                    return Err(Error::Callback(String::from("missing `code` parameter")));
                };
                let account = self.acquire_token(lygneo_id, code).await?;
                Ok(CallbackOutcome::TokenAcquired {
                    account,
                    redirect: String::from(LANDING_PATH),
                })
            }
            // Our stored credentials were rejected (the pod may have been
            // reset). Register once and send the user back to the start.
            Some("invalid_client") => {
                let (_, host) = split_handle(lygneo_id)?;
                self.registry.register(host).await?;
                let query = serde_html_form::to_string(CallbackQuery { lygneo_id })?;
                Ok(CallbackOutcome::Retry { redirect: format!("/?{query}") })
            }
            Some(_) => Ok(CallbackOutcome::Landing { redirect: String::from(LANDING_PATH) }),
        }
    }
    async fn acquire_token(&self, lygneo_id: &str, code: &str) -> Result<AccountId> {
        let (_, host) = split_handle(lygneo_id)?;
        let server = self.registry.resolve(host).await?;
        let agent =
            ServerAgent::new(self.config.clone(), server.clone(), self.http_client.clone());
        let token_response = agent.exchange_code(code, &self.redirect_uri(lygneo_id)?).await?;
        let profile = agent.fetch_profile(&token_response.access_token).await?;

        let handle = format!("{}@{}", profile.uid, server.host);
        let account = self
            .accounts
            .find_or_create_by_handle(&handle)
            .await
            .map_err(|e| Error::AccountStore(Box::new(e)))?;

        // at most one token per account: drop the previous one first
        self.tokens.del(&account).await.map_err(|e| Error::AccessTokenStore(Box::new(e)))?;
        let expires_at = token_response
            .expires_in
            .and_then(|seconds| Utc::now().checked_add_signed(TimeDelta::seconds(seconds)));
        let token = AccessToken {
            uid: profile.uid,
            host: server.host,
            access_token: token_response.access_token,
            refresh_token: token_response.refresh_token,
            expires_at,
        };
        self.tokens
            .set(account.clone(), token)
            .await
            .map_err(|e| Error::AccessTokenStore(Box::new(e)))?;
        Ok(account)
    }
    pub async fn access_token(&self, account: &AccountId) -> Result<Option<AccessToken>> {
        self.tokens.get(account).await.map_err(|e| Error::AccessTokenStore(Box::new(e)))
    }
    /// Destroys the account's token if it holds one. Safe to call when none
    /// exists; the caller redirects to [`LANDING_PATH`] afterwards.
    pub async fn revoke(&self, account: &AccountId) -> Result<()> {
        self.tokens.del(account).await.map_err(|e| Error::AccessTokenStore(Box::new(e)))
    }
    pub fn manifest(&self) -> Manifest {
        Manifest::from_config(&self.config)
    }
    /// Writes the signed manifest package where a pod directory can fetch it.
    pub fn publish_manifest(&self, path: &Path) -> Result<()> {
        Ok(self.manifest().write_to(path, self.config.key())?)
    }
    fn redirect_uri(&self, lygneo_id: &str) -> Result<String> {
        let query = serde_html_form::to_string(CallbackQuery { lygneo_id })?;
        Ok(format!(
            "{}{}?{query}",
            self.config.base_url().trim_end_matches('/'),
            CALLBACK_PATH
        ))
    }
}

fn split_handle(handle: &str) -> Result<(&str, &str)> {
    handle.split_once('@').ok_or_else(|| Error::MalformedHandle(handle.into()))
}

fn error_redirect(back_url: &str, message: &str) -> String {
    let message = message.chars().take(800).collect::<String>();
    let separator = if back_url.contains('?') { '&' } else { '?' };
    let query = serde_html_form::to_string(ErrorQuery { message: &message }).unwrap_or_default();
    format!("{back_url}{separator}{query}")
}
