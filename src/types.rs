use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

/// Identifier of a local account in the host application's account store.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccountId(String);

impl AccountId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Query parameters delivered to the callback endpoint by the pod's redirect.
#[derive(Clone, Debug, Deserialize)]
pub struct CallbackParams {
    pub lygneo_id: String,
    pub code: Option<String>,
    pub error: Option<String>,
}

#[derive(Clone, Debug, Serialize)]
pub enum AuthorizationResponseType {
    #[serde(rename = "code")]
    Code,
}

#[derive(Clone, Debug, Serialize)]
pub enum TokenGrantType {
    #[serde(rename = "authorization_code")]
    AuthorizationCode,
}

#[derive(Clone, Debug, Serialize)]
pub enum RegistrationType {
    #[serde(rename = "client_associate")]
    ClientAssociate,
}

/// Self-signed body proving the application's identity to a pod that has
/// never seen it before. Sent at registration and re-sent at token exchange.
#[derive(Clone, Debug, Serialize)]
pub struct RegistrationRequest {
    pub r#type: RegistrationType,
    pub signed_string: String,
    pub signature: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct RegistrationResponse {
    pub client_id: String,
    pub client_secret: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct AuthorizationRequestParameters {
    pub client_id: String,
    pub response_type: AuthorizationResponseType,
    pub redirect_uri: String,
    pub scope: String,
    pub uid: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct TokenRequestParameters {
    pub grant_type: TokenGrantType,
    pub code: String,
    pub redirect_uri: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: Option<String>,
    pub expires_in: Option<i64>,
    pub refresh_token: Option<String>,
    pub scope: Option<String>,
}

/// The remote user profile returned by `GET {api_route}/me`.
#[derive(Clone, Debug, Deserialize)]
pub struct RemoteProfile {
    pub uid: String,
}

/// A credential bound to one (local account, pod) pair. The owning account is
/// the key under which the token is stored.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessToken {
    /// The user's identifier on the remote pod.
    pub uid: String,
    /// Host of the issuing [`ResourceServer`](crate::ResourceServer).
    pub host: String,
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl AccessToken {
    /// Time until expiry, recomputed from the current clock on every call.
    pub fn expires_in(&self) -> Option<TimeDelta> {
        self.expires_at.map(|at| at - Utc::now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serialize_registration_request() {
        let body = RegistrationRequest {
            r#type: RegistrationType::ClientAssociate,
            signed_string: String::from("c2lnbmVk"),
            signature: String::from("c2ln"),
        };
        let json = serde_json::to_string(&body).expect("failed to serialize body");
        assert_eq!(
            json,
            r#"{"type":"client_associate","signed_string":"c2lnbmVk","signature":"c2ln"}"#
        );
    }

    #[test]
    fn expires_in_tracks_the_clock() {
        let token = AccessToken {
            uid: String::from("bob"),
            host: String::from("pod.example"),
            access_token: String::from("at"),
            refresh_token: None,
            expires_at: Some(Utc::now() + TimeDelta::seconds(3600)),
        };
        let remaining = token.expires_in().expect("expiry should be set");
        assert!(remaining <= TimeDelta::seconds(3600));
        assert!(remaining > TimeDelta::seconds(3590));
    }

    #[test]
    fn expires_in_is_none_without_expiry() {
        let token = AccessToken {
            uid: String::from("bob"),
            host: String::from("pod.example"),
            access_token: String::from("at"),
            refresh_token: None,
            expires_at: None,
        };
        assert_eq!(token.expires_in(), None);
    }
}
