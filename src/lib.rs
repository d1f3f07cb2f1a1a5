#![doc = include_str!("../README.md")]
mod app;
mod config;
mod error;
pub mod http_client;
mod keys;
mod manifest;
mod registry;
mod resource_server;
mod server_agent;
pub mod store;
mod types;
mod utils;

pub use app::{App, AuthorizeOutcome, CallbackOutcome, CALLBACK_PATH, LANDING_PATH};
pub use config::{Access, AppConfig, Config, PermissionRequest};
pub use error::{Error, Result};
pub use keys::ApplicationKey;
pub use manifest::{Manifest, Permission};
pub use registry::Registry;
pub use resource_server::ResourceServer;
pub use server_agent::ServerAgent;
pub use types::{AccessToken, AccountId, CallbackParams, RemoteProfile, TokenResponse};
