use rsa::pkcs1::DecodeRsaPrivateKey;
use rsa::pkcs1v15::SigningKey;
use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey};
use rsa::sha2::Sha256;
use rsa::signature::{SignatureEncoding, Signer};
use rsa::{RsaPrivateKey, RsaPublicKey};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("failed to read key file `{0}`: {1}")]
    Unreadable(PathBuf, #[source] std::io::Error),
    #[error("invalid RSA private key: {0}")]
    PrivateKey(#[from] rsa::pkcs1::Error),
    #[error("invalid RSA public key: {0}")]
    PublicKey(#[from] rsa::pkcs8::spki::Error),
    #[error("signing key rejected for JWT use: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),
}

pub type Result<T> = core::result::Result<T, Error>;

/// The application's RSA key pair, read once at configuration time.
///
/// Signatures are PKCS#1 v1.5 over SHA-256 and therefore deterministic per
/// key and message.
pub struct ApplicationKey {
    signing_key: SigningKey<Sha256>,
    encoding_key: jsonwebtoken::EncodingKey,
    public_key_pem: String,
}

impl std::fmt::Debug for ApplicationKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApplicationKey")
            .field("public_key_pem", &self.public_key_pem)
            .finish_non_exhaustive()
    }
}

impl ApplicationKey {
    pub fn load(private_key_path: &Path, public_key_path: &Path) -> Result<Self> {
        let private_pem = std::fs::read_to_string(private_key_path)
            .map_err(|e| Error::Unreadable(private_key_path.to_path_buf(), e))?;
        let public_key_pem = std::fs::read_to_string(public_key_path)
            .map_err(|e| Error::Unreadable(public_key_path.to_path_buf(), e))?;
        let private_key = RsaPrivateKey::from_pkcs8_pem(&private_pem)
            .or_else(|_| RsaPrivateKey::from_pkcs1_pem(&private_pem))?;
        // fail fast on a mismatched or corrupt public key file
        RsaPublicKey::from_public_key_pem(&public_key_pem)?;
        let encoding_key = jsonwebtoken::EncodingKey::from_rsa_pem(private_pem.as_bytes())?;
        Ok(Self { signing_key: SigningKey::new(private_key), encoding_key, public_key_pem })
    }
    pub fn sign(&self, bytes: &[u8]) -> Vec<u8> {
        self.signing_key.sign(bytes).to_vec()
    }
    pub fn public_key_pem(&self) -> &str {
        &self.public_key_pem
    }
    pub(crate) fn encoding_key(&self) -> &jsonwebtoken::EncodingKey {
        &self.encoding_key
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rsa::pkcs1v15::{Signature, VerifyingKey};
    use rsa::signature::Verifier;

    fn fixture_path(name: &str) -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures").join(name)
    }

    fn load_fixture_key() -> ApplicationKey {
        ApplicationKey::load(&fixture_path("app.private.pem"), &fixture_path("app.public.pem"))
            .expect("fixture keys should load")
    }

    #[test]
    fn sign_is_deterministic_and_verifiable() {
        let key = load_fixture_key();
        let first = key.sign(b"cats");
        let second = key.sign(b"cats");
        assert_eq!(first, second);

        let public_key = RsaPublicKey::from_public_key_pem(key.public_key_pem())
            .expect("public pem should parse");
        let signature = Signature::try_from(first.as_slice()).expect("signature bytes");
        VerifyingKey::<Sha256>::new(public_key)
            .verify(b"cats", &signature)
            .expect("signature should verify");
    }

    #[test]
    fn public_key_pem_returns_file_contents() {
        let key = load_fixture_key();
        let pem = std::fs::read_to_string(fixture_path("app.public.pem")).unwrap();
        assert_eq!(key.public_key_pem(), pem);
    }

    #[test]
    fn load_fails_for_missing_file() {
        let err = ApplicationKey::load(
            &fixture_path("no-such.private.pem"),
            &fixture_path("app.public.pem"),
        )
        .expect_err("missing key file should fail");
        assert!(matches!(err, Error::Unreadable(..)));
    }
}
