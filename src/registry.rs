use crate::config::Config;
use crate::error::{Error, Result};
use crate::http_client::HttpClient;
use crate::resource_server::ResourceServer;
use crate::store::ResourceServerStore;
use crate::types::{RegistrationRequest, RegistrationResponse, RegistrationType};
use crate::utils::generate_nonce;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::Utc;
use http::{header, Method, Request};
use std::sync::Arc;

/// Looks up known pods by host and performs the registration handshake with
/// unknown ones, persisting the issued client credentials.
pub struct Registry<S, T>
where
    S: ResourceServerStore,
    T: HttpClient + Send + Sync + 'static,
{
    config: Arc<Config>,
    store: S,
    http_client: Arc<T>,
}

impl<S, T> Registry<S, T>
where
    S: ResourceServerStore + Send + Sync,
    T: HttpClient + Send + Sync + 'static,
{
    pub fn new(config: Arc<Config>, store: S, http_client: Arc<T>) -> Self {
        Self { config, store, http_client }
    }
    /// Returns the stored record for `host`, registering first if none exists.
    pub async fn resolve(&self, host: &str) -> Result<ResourceServer> {
        if let Some(server) = self
            .store
            .get(&host.to_string())
            .await
            .map_err(|e| Error::ResourceServerStore(Box::new(e)))?
        {
            return Ok(server);
        }
        self.register(host).await
    }
    /// Performs the `client_associate` handshake with `host` and persists the
    /// resulting credential pair, replacing any previously stored pair.
    pub async fn register(&self, host: &str) -> Result<ResourceServer> {
        let mut server = ResourceServer::new(host);
        let body = register_body(&self.config, &server);
        let request = Request::builder()
            .uri(server.registration_endpoint(&self.config))
            .method(Method::POST)
            .header(header::CONTENT_TYPE, "application/json")
            .body(serde_json::to_vec(&body)?)?;
        let response = self.http_client.send_http(request).await.map_err(Error::HttpClient)?;
        if !response.status().is_success() {
            return Err(Error::Registration(
                String::from_utf8_lossy(response.body()).into_owned(),
            ));
        }
        let Ok(credentials) = serde_json::from_slice::<RegistrationResponse>(response.body())
        else {
            return Err(Error::Registration(
                String::from_utf8_lossy(response.body()).into_owned(),
            ));
        };
        server.client_id = credentials.client_id;
        server.client_secret = credentials.client_secret;
        server.registered_at = Some(Utc::now());
        self.store
            .set(server.host.clone(), server.clone())
            .await
            .map_err(|e| Error::ResourceServerStore(Box::new(e)))?;
        Ok(server)
    }
}

/// The canonical byte sequence a pod verifies against the signature to
/// authenticate the application without a prior shared secret. The timestamp
/// and nonce bound replay; checking them is the pod's responsibility.
pub(crate) fn signable_string(
    config: &Config,
    server: &ResourceServer,
    at: i64,
    nonce: &str,
) -> String {
    [config.base_url(), &server.url(config), &at.to_string(), nonce].join(";")
}

/// A registration body with a fresh timestamp and nonce.
pub(crate) fn register_body(config: &Config, server: &ResourceServer) -> RegistrationRequest {
    let signable = signable_string(config, server, Utc::now().timestamp(), &generate_nonce());
    register_body_for(config, &signable)
}

fn register_body_for(config: &Config, signable: &str) -> RegistrationRequest {
    RegistrationRequest {
        r#type: RegistrationType::ClientAssociate,
        signed_string: STANDARD.encode(signable),
        signature: STANDARD.encode(config.key().sign(signable.as_bytes())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_config;
    use crate::store::memory::MemoryResourceServerStore;
    use crate::store::SimpleStore;
    use http::{Response, StatusCode};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct MockClient {
        status: StatusCode,
        body: Vec<u8>,
        requests: Mutex<Vec<Request<Vec<u8>>>>,
        calls: AtomicUsize,
    }

    impl MockClient {
        fn returning(status: StatusCode, body: impl Into<Vec<u8>>) -> Self {
            Self {
                status,
                body: body.into(),
                requests: Mutex::new(Vec::new()),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait::async_trait]
    impl HttpClient for MockClient {
        async fn send_http(
            &self,
            request: Request<Vec<u8>>,
        ) -> core::result::Result<
            Response<Vec<u8>>,
            Box<dyn std::error::Error + Send + Sync + 'static>,
        > {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.requests.lock().unwrap().push(request);
            Response::builder().status(self.status).body(self.body.clone()).map_err(Into::into)
        }
    }

    fn registry(
        client: Arc<MockClient>,
        store: MemoryResourceServerStore,
    ) -> Registry<MemoryResourceServerStore, MockClient> {
        Registry::new(Arc::new(test_config(false)), store, client)
    }

    #[tokio::test]
    async fn register_posts_to_the_token_endpoint_and_persists() {
        let client = Arc::new(MockClient::returning(
            StatusCode::OK,
            r#"{"client_id":"aofosdjfg","client_secret":"aosfjosdigh"}"#,
        ));
        let store = MemoryResourceServerStore::default();
        let registry = registry(client.clone(), store);

        let server = registry.register("lygneop.od").await.expect("registration should succeed");
        assert_eq!(server.client_id, "aofosdjfg");
        assert_eq!(server.client_secret, "aosfjosdigh");
        assert!(server.registered_at.is_some());

        let requests = client.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].uri().to_string(), "https://lygneop.od:443/oauth/token");
        assert_eq!(requests[0].method(), Method::POST);
        let body: serde_json::Value = serde_json::from_slice(requests[0].body()).unwrap();
        assert_eq!(body["type"], "client_associate");
    }

    #[tokio::test]
    async fn register_surfaces_the_pod_error_body() {
        let client = Arc::new(MockClient::returning(
            StatusCode::UNPROCESSABLE_ENTITY,
            "Error message from the pod",
        ));
        let registry = registry(client, MemoryResourceServerStore::default());

        let err = registry.register("lygneop.od").await.expect_err("registration should fail");
        match err {
            Error::Registration(message) => assert_eq!(message, "Error message from the pod"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn register_rejects_a_malformed_success_body() {
        let client = Arc::new(MockClient::returning(StatusCode::OK, "not json"));
        let registry = registry(client, MemoryResourceServerStore::default());

        let err = registry.register("lygneop.od").await.expect_err("registration should fail");
        assert!(matches!(err, Error::Registration(_)));
    }

    #[tokio::test]
    async fn resolve_skips_the_network_for_a_known_host() {
        let client = Arc::new(MockClient::returning(StatusCode::OK, ""));
        let store = MemoryResourceServerStore::default();
        let mut registered = ResourceServer::new("pod.example");
        registered.client_id = String::from("id");
        registered.client_secret = String::from("secret");
        registered.registered_at = Some(Utc::now());
        store.set(registered.host.clone(), registered.clone()).await.unwrap();
        let registry = registry(client.clone(), store);

        let server = registry.resolve("pod.example").await.expect("lookup should succeed");
        assert_eq!(server, registered);
        assert_eq!(client.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn signable_string_shape() {
        let config = test_config(false);
        let server = ResourceServer::new("pod.example");
        assert_eq!(
            signable_string(&config, &server, 1_234_567, "nonce"),
            "https://chubbi.es:443/;https://pod.example:443;1234567;nonce"
        );
    }

    #[test]
    fn register_body_encodes_string_and_signature() {
        let config = test_config(false);
        let body = register_body_for(&config, "asdfas");
        assert!(matches!(body.r#type, RegistrationType::ClientAssociate));
        assert_eq!(body.signed_string, STANDARD.encode("asdfas"));
        assert_eq!(body.signature, STANDARD.encode(config.key().sign(b"asdfas")));
    }

    #[test]
    fn register_body_uses_fresh_nonces() {
        let config = test_config(false);
        let server = ResourceServer::new("pod.example");
        let first = register_body(&config, &server);
        let second = register_body(&config, &server);
        assert_ne!(first.signed_string, second.signed_string);
    }
}
