use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("malformed lygneo id: no `@` in `{0}`")]
    MalformedHandle(String),
    #[error(transparent)]
    Key(#[from] crate::keys::Error),
    #[error(transparent)]
    Manifest(#[from] crate::manifest::Error),
    #[error(transparent)]
    ServerAgent(#[from] crate::server_agent::Error),
    #[error("registration rejected by pod: {0}")]
    Registration(String),
    #[error("callback error: {0}")]
    Callback(String),
    #[error("published manifest at {0} does not match the current configuration")]
    ManifestMismatch(String),
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error(transparent)]
    Http(#[from] http::Error),
    #[error("http client error: {0}")]
    HttpClient(Box<dyn std::error::Error + Send + Sync + 'static>),
    #[error(transparent)]
    SerdeHtmlForm(#[from] serde_html_form::ser::Error),
    #[error(transparent)]
    SerdeJson(#[from] serde_json::Error),
    #[error("resource server store error: {0}")]
    ResourceServerStore(Box<dyn std::error::Error + Send + Sync + 'static>),
    #[error("access token store error: {0}")]
    AccessTokenStore(Box<dyn std::error::Error + Send + Sync + 'static>),
    #[error("account store error: {0}")]
    AccountStore(Box<dyn std::error::Error + Send + Sync + 'static>),
}

pub type Result<T> = core::result::Result<T, Error>;
