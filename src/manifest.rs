use crate::config::{Access, Config};
use crate::keys::ApplicationKey;
use jsonwebtoken::{Algorithm, Header};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("failed to sign manifest: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),
    #[error(transparent)]
    SerdeJson(#[from] serde_json::Error),
    #[error("failed to write manifest `{0}`: {1}")]
    Write(PathBuf, #[source] std::io::Error),
}

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
    pub access: Access,
    pub r#type: String,
    pub description: String,
}

#[derive(Serialize)]
struct Package<'a> {
    public_key: &'a str,
    #[serde(flatten)]
    fields: &'a BTreeMap<String, String>,
    permissions: &'a BTreeMap<String, Permission>,
    jwt: String,
}

/// The application's declared identity and permission set, projected from the
/// configuration.
///
/// [`package`](Manifest::package) is deterministic: maps are sorted and the
/// RS256 signature is deterministic per key, so identical configuration
/// yields byte-identical output. That property is what makes
/// [`verify`](Manifest::verify) a plain string comparison.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Manifest {
    pub application_base_url: String,
    pub fields: BTreeMap<String, String>,
    pub permissions: BTreeMap<String, Permission>,
}

impl Manifest {
    pub fn from_config(config: &Config) -> Self {
        Self {
            application_base_url: config.base_url().to_string(),
            fields: config.manifest_fields.clone(),
            permissions: config.permissions.clone(),
        }
    }
    /// Serializes the signed, publishable form: the public key, the manifest
    /// fields, the permission map, and a JWT of fields + permissions that a
    /// remote party can verify with the embedded key.
    pub fn package(&self, key: &ApplicationKey) -> Result<String> {
        let mut claims = serde_json::Map::new();
        for (name, value) in &self.fields {
            claims.insert(name.clone(), serde_json::Value::String(value.clone()));
        }
        claims.insert(String::from("permissions"), serde_json::to_value(&self.permissions)?);
        let jwt = jsonwebtoken::encode(&Header::new(Algorithm::RS256), &claims, key.encoding_key())?;
        Ok(serde_json::to_string(&Package {
            public_key: key.public_key_pem(),
            fields: &self.fields,
            permissions: &self.permissions,
            jwt,
        })?)
    }
    /// Compares a previously published package against the current
    /// configuration. Any failure to produce the current package counts as
    /// "not verified" rather than an error.
    pub fn verify(&self, published: &str, key: &ApplicationKey) -> bool {
        self.package(key).map_or(false, |current| current == published)
    }
    pub fn write_to(&self, path: &Path, key: &ApplicationKey) -> Result<()> {
        let package = self.package(key)?;
        std::fs::write(path, package).map_err(|e| Error::Write(path.to_path_buf(), e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_config;
    use jsonwebtoken::{DecodingKey, Validation};

    fn decode_claims(jwt: &str, public_key_pem: &str) -> serde_json::Value {
        let mut validation = Validation::new(Algorithm::RS256);
        validation.validate_exp = false;
        validation.required_spec_claims.clear();
        jsonwebtoken::decode::<serde_json::Value>(
            jwt,
            &DecodingKey::from_rsa_pem(public_key_pem.as_bytes()).expect("public key should parse"),
            &validation,
        )
        .expect("jwt should decode with the embedded key")
        .claims
    }

    #[test]
    fn generated_manifest_carries_the_base_url() {
        let config = test_config(false);
        let manifest = Manifest::from_config(&config);
        assert_eq!(manifest.application_base_url, "https://chubbi.es:443/");
    }

    #[test]
    fn package_embeds_the_public_key() {
        let config = test_config(false);
        let package = Manifest::from_config(&config).package(config.key()).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&package).unwrap();
        let public_key = parsed["public_key"].as_str().unwrap();
        assert!(public_key.starts_with("-----BEGIN PUBLIC KEY-----"));
        assert!(!parsed["jwt"].as_str().unwrap().is_empty());
    }

    #[test]
    fn jwt_claims_contain_every_field_and_permission() {
        let config = test_config(false);
        let manifest = Manifest::from_config(&config);
        let package = manifest.package(config.key()).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&package).unwrap();
        let claims = decode_claims(parsed["jwt"].as_str().unwrap(), config.key().public_key_pem());

        for (name, value) in &manifest.fields {
            assert_eq!(claims[name].as_str(), Some(value.as_str()), "field {name}");
        }
        let permissions = claims["permissions"].as_object().unwrap();
        assert_eq!(permissions.len(), manifest.permissions.len());
        for (name, permission) in &manifest.permissions {
            assert_eq!(permissions[name], serde_json::to_value(permission).unwrap());
        }
    }

    #[test]
    fn package_is_deterministic() {
        let config = test_config(false);
        let manifest = Manifest::from_config(&config);
        assert_eq!(
            manifest.package(config.key()).unwrap(),
            manifest.package(config.key()).unwrap()
        );
    }

    #[test]
    fn verify_accepts_its_own_output() {
        let config = test_config(false);
        let manifest = Manifest::from_config(&config);
        let package = manifest.package(config.key()).unwrap();
        assert!(manifest.verify(&package, config.key()));
    }

    #[test]
    fn verify_rejects_a_different_document() {
        let config = test_config(false);
        let manifest = Manifest::from_config(&config);
        assert!(!manifest.verify(r#"{"a":"b"}"#, config.key()));
    }
}
