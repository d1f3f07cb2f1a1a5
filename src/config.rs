use crate::error::Error;
use crate::keys::ApplicationKey;
use crate::manifest::Permission;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Access {
    Read,
    Write,
}

/// A permission the application asks pods to grant, declared at startup.
#[derive(Clone, Debug)]
pub struct PermissionRequest {
    pub name: String,
    pub access: Access,
    pub r#type: String,
    pub description: String,
}

/// Host-supplied configuration, assembled once at startup.
///
/// Validation happens in [`App::new`](crate::App::new) via the
/// `TryInto<Config>` conversion: the base URL is normalized, the signing key
/// pair is read from disk (failing fast if unreadable), and the manifest
/// declarations are collapsed into their canonical maps.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub application_base_url: String,
    pub private_key_path: PathBuf,
    pub public_key_path: PathBuf,
    /// Location of the published manifest package, checked at startup
    /// outside test mode. `None` skips the check.
    pub manifest_path: Option<PathBuf>,
    /// Manifest field declarations; later entries overwrite earlier ones of
    /// the same name.
    pub manifest_fields: Vec<(String, String)>,
    pub permissions: Vec<PermissionRequest>,
    /// Scope string sent with every authorize redirect.
    pub scope: String,
    /// Talk to pods over plain `http` instead of `https`.
    pub test_mode: bool,
}

pub struct Config {
    pub(crate) base_url: String,
    pub(crate) key: ApplicationKey,
    pub(crate) manifest_path: Option<PathBuf>,
    pub(crate) manifest_fields: BTreeMap<String, String>,
    pub(crate) permissions: BTreeMap<String, Permission>,
    pub(crate) scope: String,
    pub(crate) test_mode: bool,
}

impl Config {
    pub fn scheme(&self) -> &'static str {
        if self.test_mode {
            "http"
        } else {
            "https"
        }
    }
    /// The normalized application base URL, always with a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
    pub fn key(&self) -> &ApplicationKey {
        &self.key
    }
}

impl TryFrom<AppConfig> for Config {
    type Error = Error;

    fn try_from(config: AppConfig) -> Result<Self, Self::Error> {
        if config.application_base_url.trim().is_empty() {
            return Err(Error::Config(String::from("application_base_url must be set")));
        }
        let scheme = if config.test_mode { "http" } else { "https" };
        let base_url = normalize_base_url(&config.application_base_url, scheme);
        let key = ApplicationKey::load(&config.private_key_path, &config.public_key_path)?;
        let manifest_fields = config.manifest_fields.into_iter().collect();
        let permissions = config
            .permissions
            .into_iter()
            .map(|p| {
                (
                    p.name,
                    Permission { access: p.access, r#type: p.r#type, description: p.description },
                )
            })
            .collect();
        Ok(Self {
            base_url,
            key,
            manifest_path: config.manifest_path,
            manifest_fields,
            permissions,
            scope: config.scope,
            test_mode: config.test_mode,
        })
    }
}

/// Normalizes a host-supplied base URL: supplies the scheme if missing, the
/// default `:443` port for https, and a trailing slash.
fn normalize_base_url(raw: &str, scheme: &str) -> String {
    let trimmed = raw.trim().trim_end_matches('/');
    let (scheme, authority) = match trimmed.split_once("://") {
        Some((s, rest)) => (s, rest),
        None => (scheme, trimmed),
    };
    if authority.contains(':') || scheme != "https" {
        format!("{scheme}://{authority}/")
    } else {
        format!("{scheme}://{authority}:443/")
    }
}

/// A fully populated configuration backed by the fixture key pair, shared by
/// the module tests.
#[cfg(test)]
pub(crate) fn test_config(test_mode: bool) -> Config {
    test_app_config(test_mode).try_into().expect("test config should validate")
}

#[cfg(test)]
pub(crate) fn test_app_config(test_mode: bool) -> AppConfig {
    let fixtures = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures");
    AppConfig {
        application_base_url: String::from("chubbi.es"),
        private_key_path: fixtures.join("app.private.pem"),
        public_key_path: fixtures.join("app.public.pem"),
        manifest_path: None,
        manifest_fields: vec![
            (String::from("name"), String::from("Chubbies")),
            (String::from("description"), String::from("The best way to chub.")),
            (String::from("icon_url"), String::from("#")),
        ],
        permissions: vec![
            PermissionRequest {
                name: String::from("profile"),
                access: Access::Read,
                r#type: String::from("profile"),
                description: String::from("Chubbi.es wants to view your profile."),
            },
            PermissionRequest {
                name: String::from("photos"),
                access: Access::Write,
                r#type: String::from("photos"),
                description: String::from("Chubbi.es wants to write to your photos."),
            },
        ],
        scope: String::from("profile,AS_photo:post"),
        test_mode,
    }
}
